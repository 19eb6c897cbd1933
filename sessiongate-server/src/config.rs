//! Command-line and environment configuration

use clap::Parser;
use sessiongate_core::{AuthConfig, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sessiongate-server", version, about = "Token-authenticated user and project API")]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "SESSIONGATE_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Data directory path
    #[arg(long, env = "SESSIONGATE_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// HMAC key used to sign access tokens
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    pub signing_key: String,

    /// Access token lifetime in seconds
    #[arg(
        long,
        env = "SESSIONGATE_TOKEN_TTL_SECS",
        default_value_t = 3600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub token_ttl_secs: u64,

    /// Seconds between sweeps of expired revocations
    #[arg(
        long,
        env = "SESSIONGATE_SWEEP_INTERVAL_SECS",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sweep_interval_secs: u64,

    /// Emit logs as JSON lines
    #[arg(long, env = "SESSIONGATE_LOG_JSON")]
    pub log_json: bool,
}

impl ServerArgs {
    pub fn auth_config(&self) -> Result<AuthConfig> {
        AuthConfig::new(self.signing_key.as_bytes(), Duration::from_secs(self.token_ttl_secs))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
