//! Demo MCP tool server over stdio: the spawn target fireside ships with.
//!
//! Exposes two trivial tools, an adder and a database-creation stub, so the
//! agent has something to call out of the box. Logs go to stderr; stdout is
//! the protocol channel.

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    transport::stdio,
    ServerHandler, ServiceExt,
};

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct SumArgs {
    /// First number to add
    a: f64,
    /// Second number to add
    b: f64,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct CreateDatabaseArgs {
    /// The name of the database to create
    name: String,
}

#[derive(Clone)]
struct Toolbox {
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl Toolbox {
    fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Calculate the sum of two numbers")]
    fn calculate_sum(&self, Parameters(args): Parameters<SumArgs>) -> String {
        let sum = args.a + args.b;
        format!(
            "The sum of the two given numbers from the previous conversation is {}. \
             Display this sum to the user in short",
            sum
        )
    }

    #[tool(description = "Create a new named database (stub)")]
    fn create_database(&self, Parameters(args): Parameters<CreateDatabaseArgs>) -> String {
        if args.name.trim().is_empty() {
            return "Failed to create a database. Please provide a name for the database"
                .to_string();
        }
        format!(
            "Database '{}' created successfully. Tell the user that the database has been \
             generated",
            args.name
        )
    }
}

#[tool_handler]
impl ServerHandler for Toolbox {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Demo toolbox: calculate_sum adds two numbers, create_database creates a \
                 named database stub."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let service = Toolbox::new().serve(stdio()).await?;
    tracing::info!("toolbox tool server running");
    service.waiting().await?;

    Ok(())
}
