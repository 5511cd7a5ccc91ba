use clap::Parser;
use log::info;
use tokio::net::TcpListener;

use crate::cli::{SubCommandExtend, open_service};
use crate::config::Opts;
use crate::server;

#[derive(Parser, Debug, Clone)]
pub struct ServerCommand {
    /// Listen address
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub addr: String,
}

impl SubCommandExtend for ServerCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let service = open_service(opts).await?;

        let state = server::AppState::new(service);
        let app = server::create_app(state);

        info!("listening on http://{}", &self.addr);
        let listener = TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
