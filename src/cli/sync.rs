use clap::Parser;

use crate::cli::{SubCommandExtend, open_service};
use crate::config::Opts;

#[derive(Parser, Debug, Clone)]
pub struct SyncCommand;

impl SubCommandExtend for SyncCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let service = open_service(opts).await?;
        service.initialize().await?;
        println!("{} images cached", service.cached_image_count().await?);
        Ok(())
    }
}
