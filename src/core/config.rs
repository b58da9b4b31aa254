use anyhow::Result;

use super::cli::CliConfig;
use super::constants::{DEFAULT_HOST, DEFAULT_PORT};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub log_filter: Option<String>,
}

impl AppConfig {
    /// Load configuration from CLI arguments (env-var fallbacks are baked in
    /// by clap) layered over built-in defaults. There is no config file: the
    /// broker's entire footprint is the listen address and the log filter.
    pub fn load(cli: &CliConfig) -> Result<Self> {
        let host = cli.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.unwrap_or(DEFAULT_PORT);

        let config = Self {
            server: ServerConfig { host, port },
            log_filter: cli.log.clone(),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }
        Ok(())
    }
}

/// Whether a host string means "bind to all interfaces" (for banner display).
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_cli_empty() {
        let cli = CliConfig::default();
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
    }

    #[test]
    fn cli_overrides_defaults() {
        let cli = CliConfig {
            host: Some("0.0.0.0".to_string()),
            port: Some(9000),
            log: Some("debug".to_string()),
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn rejects_zero_port() {
        let cli = CliConfig {
            port: Some(0),
            ..Default::default()
        };
        assert!(AppConfig::load(&cli).is_err());
    }

    #[test]
    fn rejects_empty_host() {
        let cli = CliConfig {
            host: Some(String::new()),
            ..Default::default()
        };
        assert!(AppConfig::load(&cli).is_err());
    }

    #[test]
    fn detects_all_interfaces() {
        assert!(is_all_interfaces("0.0.0.0"));
        assert!(is_all_interfaces("::"));
        assert!(!is_all_interfaces("127.0.0.1"));
        assert!(!is_all_interfaces("localhost"));
    }
}
