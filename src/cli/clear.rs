use clap::Parser;
use log::info;

use crate::cli::{SubCommandExtend, open_service};
use crate::config::Opts;

#[derive(Parser, Debug, Clone)]
pub struct ClearCommand;

impl SubCommandExtend for ClearCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let service = open_service(opts).await?;
        service.clear_cache().await?;
        info!("image cache cleared");
        Ok(())
    }
}
