use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Server configuration. Every flag can also be set through the
/// environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "produce_store", version, about = "In-memory fruit and vegetable inventory")]
pub struct Config {
    /// Address to bind
    #[arg(long, env = "PRODUCE_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PRODUCE_PORT", default_value_t = 8000)]
    pub port: u16,

    /// JSON dataset imported on the first request
    #[arg(long, env = "PRODUCE_DATASET", default_value = "var/data/request.json")]
    pub dataset: PathBuf,

    /// Attempt the bootstrap import again after a failure
    #[arg(long, env = "PRODUCE_RETRY_BOOTSTRAP")]
    pub retry_bootstrap: bool,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
