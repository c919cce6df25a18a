use anyhow::{Context, Result};
use clap::Parser;
use fireside::{agent::ChatAgent, api, config};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "fireside")]
#[command(about = "Tool-augmented chat agent", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Override log format (pretty, json)
    #[arg(long)]
    log_format: Option<String>,

    /// Serve the agent over HTTP instead of the interactive prompt
    #[arg(long)]
    serve: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = config::load_config(&cli.config).with_context(|| {
        format!(
            "Failed to load configuration from: {}",
            cli.config.display()
        )
    })?;

    // Apply CLI overrides
    if let Some(log_level) = cli.log_level {
        config.logging.level = log_level;
    }
    if let Some(log_format) = cli.log_format {
        config.logging.format = log_format;
    }

    // Initialize logging
    init_logging(&config.logging)?;

    print_banner(&config);

    info!("Opening agent session...");
    let agent = Arc::new(
        ChatAgent::open(&config)
            .await
            .context("Failed to open agent session")?,
    );

    if cli.serve {
        api::start_server(&config, agent).await?;
    } else {
        let result = chat_loop(&agent).await;
        if let Err(e) = agent.close().await {
            tracing::error!("Error closing agent session: {}", e);
        }
        result?;
    }

    Ok(())
}

/// Interactive prompt on stdin. Type `quit` or `exit` to leave.
async fn chat_loop(agent: &ChatAgent) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(b"Connected. Type your message (quit to exit).\n> ")
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
            continue;
        }
        if text.eq_ignore_ascii_case("quit") || text.eq_ignore_ascii_case("exit") {
            break;
        }

        let answer = agent.submit(text).await;
        stdout
            .write_all(format!("\n{}\n\n> ", answer).as_bytes())
            .await?;
        stdout.flush().await?;
    }

    Ok(())
}

fn init_logging(config: &config::LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Default to pretty format
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

fn print_banner(config: &config::AppConfig) {
    let version = env!("CARGO_PKG_VERSION");

    info!("fireside v{}", version);
    info!("  → Model: {}", config.llm.model);
    info!("  → Endpoint: {}", config.llm.base_url);
    info!("  → Tool server: {}", config.tool_server.command);
    info!("  → Log Level: {}", config.logging.level);
    info!("  → Log Format: {}", config.logging.format);
    info!("");
}
