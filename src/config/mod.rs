pub mod types;

use anyhow::{Context, Result};
use config::{Config, File};
use std::path::Path;
pub use types::*;

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();

    let config = Config::builder()
        .add_source(File::from(path))
        .build()
        .with_context(|| format!("Failed to load config from: {}", path.display()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Validate the loaded configuration
fn validate_config(config: &AppConfig) -> Result<()> {
    if config.tool_server.command.trim().is_empty() {
        anyhow::bail!("tool_server.command must not be empty");
    }

    if config.llm.model.trim().is_empty() {
        anyhow::bail!("llm.model must not be empty");
    }

    if config.llm.api_key_env.trim().is_empty() {
        anyhow::bail!("llm.api_key_env must not be empty");
    }

    if !config.llm.base_url.starts_with("http://") && !config.llm.base_url.starts_with("https://")
    {
        anyhow::bail!(
            "llm.base_url '{}' must be an http(s) URL",
            config.llm.base_url
        );
    }

    if config.llm.request_timeout_secs == 0 {
        anyhow::bail!("llm.request_timeout_secs must be greater than zero");
    }

    // Validate log level
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        anyhow::bail!(
            "Invalid log level '{}'. Valid levels: {}",
            config.logging.level,
            valid_levels.join(", ")
        );
    }

    // Validate log format
    let valid_formats = ["pretty", "json"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        anyhow::bail!(
            "Invalid log format '{}'. Valid formats: {}",
            config.logging.format,
            valid_formats.join(", ")
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[http]
host = "0.0.0.0"
port = 8080

[logging]
level = "debug"
format = "json"

[llm]
base_url = "https://openrouter.ai/api/v1"
model = "google/gemini-2.0-flash-001"
api_key_env = "OPENROUTER_API_KEY"
request_timeout_secs = 45

[tool_server]
command = "node"
args = ["build/index.js"]
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.llm.model, "google/gemini-2.0-flash-001");
        assert_eq!(config.llm.request_timeout_secs, 45);
        assert_eq!(config.tool_server.command, "node");
        assert_eq!(config.tool_server.args, vec!["build/index.js"]);
    }

    #[test]
    fn test_load_config_with_defaults() {
        let config_content = r#"
[llm]
model = "google/gemini-2.0-flash-001"

[tool_server]
command = "toolbox"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.http.host, "127.0.0.1");
        assert_eq!(config.http.port, 3000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.llm.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.llm.api_key_env, "OPENROUTER_API_KEY");
        assert_eq!(config.llm.request_timeout_secs, 60);
        assert_eq!(config.tool_server.handshake_timeout_secs, 30);
        assert_eq!(config.tool_server.call_timeout_secs, 60);
    }

    #[test]
    fn test_validate_empty_command() {
        let config_content = r#"
[llm]
model = "google/gemini-2.0-flash-001"

[tool_server]
command = ""
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        assert!(load_config(temp_file.path()).is_err());
    }

    #[test]
    fn test_validate_bad_base_url() {
        let config_content = r#"
[llm]
model = "google/gemini-2.0-flash-001"
base_url = "openrouter.ai/api/v1"

[tool_server]
command = "toolbox"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        assert!(load_config(temp_file.path()).is_err());
    }

    #[test]
    fn test_validate_bad_log_level() {
        let config_content = r#"
[logging]
level = "verbose"
format = "pretty"

[llm]
model = "google/gemini-2.0-flash-001"

[tool_server]
command = "toolbox"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        assert!(load_config(temp_file.path()).is_err());
    }
}
