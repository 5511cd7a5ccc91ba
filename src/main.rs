use anyhow::Result;
use clap::Parser;

use offsearch::Opts;
use offsearch::cli::SubCommandExtend;
use offsearch::config::SubCommand;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let opts = Opts::parse();
    match &opts.subcmd {
        SubCommand::Sync(cmd) => cmd.run(&opts).await,
        SubCommand::Search(cmd) => cmd.run(&opts).await,
        SubCommand::Count(cmd) => cmd.run(&opts).await,
        SubCommand::Clear(cmd) => cmd.run(&opts).await,
        SubCommand::Server(cmd) => cmd.run(&opts).await,
    }
}
