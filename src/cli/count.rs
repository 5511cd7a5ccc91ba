use clap::Parser;

use crate::cli::{SubCommandExtend, open_service};
use crate::config::Opts;

#[derive(Parser, Debug, Clone)]
pub struct CountCommand;

impl SubCommandExtend for CountCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let service = open_service(opts).await?;
        println!("{}", service.cached_image_count().await?);
        Ok(())
    }
}
