//! Serve command implementation

use super::{load_checked, EXIT_CONFIG, EXIT_OK};
use crate::server;
use clap::Args;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override `server.host`
    #[arg(long)]
    pub host: Option<String>,

    /// Override `server.port`
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let Some(mut config) = load_checked(config_path) else {
            return Ok(EXIT_CONFIG);
        };
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }

        println!("🚀 Serving export pages on http://{}", config.server.bind_address());
        server::serve(&config).await?;
        Ok(EXIT_OK)
    }
}
