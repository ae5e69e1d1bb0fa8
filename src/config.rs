//! Server configuration via CLI args and environment variables.

use clap::Parser;

/// HTTP server that translates Synapse queries and classifies failures.
#[derive(Parser, Debug, Clone)]
#[command(name = "synapse-server", version, about)]
pub struct Config {
    /// Bind address.
    #[arg(long, default_value = "0.0.0.0", env = "SYNAPSE_HOST")]
    pub host: String,

    /// Bind port.
    #[arg(long, default_value_t = 8080, env = "SYNAPSE_PORT")]
    pub port: u16,

    /// CORS allowed origins (comma-separated). Empty for no CORS.
    #[arg(long, env = "SYNAPSE_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Log level, used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info", env = "SYNAPSE_LOG_LEVEL")]
    pub log_level: String,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, env = "SYNAPSE_LOG_FORMAT")]
    pub log_format: LogFormat,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Parses configuration from CLI args and env vars.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
