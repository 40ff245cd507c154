use std::net::SocketAddr;

use envconfig::Envconfig;
use tracing::Level;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(default = "127.0.0.1:3000")]
    pub address: SocketAddr,

    // Logs entries instead of storing them, for local debugging
    #[envconfig(default = "false")]
    pub print_sink: bool,

    #[envconfig(default = "")]
    pub database_url: String,

    #[envconfig(default = "10")]
    pub max_pg_connections: u32,

    // Used for integration tests
    #[envconfig(default = "true")]
    pub export_prometheus: bool,

    #[envconfig(default = "33554432")] // 32MB
    pub max_request_body_size_bytes: usize,

    #[envconfig(default = "info")]
    pub log_level: Level,
}

impl Config {
    pub fn init_with_defaults() -> Result<Self, envconfig::Error> {
        let res = Self::init_from_env()?;
        Ok(res)
    }
}
