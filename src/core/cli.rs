use clap::Parser;

use super::constants::{ENV_HOST, ENV_LOG, ENV_PORT};

#[derive(Parser)]
#[command(name = "relay-broker")]
#[command(version, about = "In-memory pub/sub message broker", long_about = None)]
pub struct Cli {
    /// Server host address
    #[arg(long, short = 'H', env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', env = ENV_PORT)]
    pub port: Option<u16>,

    /// Log filter override (passed straight to tracing-subscriber's EnvFilter)
    #[arg(long, env = ENV_LOG)]
    pub log: Option<String>,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log: Option<String>,
}

/// Parse CLI arguments into a `CliConfig`
pub fn parse() -> CliConfig {
    let cli = Cli::parse();
    CliConfig {
        host: cli.host,
        port: cli.port,
        log: cli.log,
    }
}
