use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::cli::{SubCommandExtend, open_service};
use crate::config::{Opts, SearchOptions};
use crate::db::SearchResult;

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub search: SearchOptions,
    /// Path of the query image
    pub image: String,
    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let query = tokio::fs::read(&self.image).await?;
        let service = open_service(opts).await?;
        let results =
            service.search(query, self.search.max_distance, self.search.limit).await?;
        print_results(&results, self)
    }
}

fn print_results(results: &[SearchResult], opts: &SearchCommand) -> Result<()> {
    match opts.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results)?)
        }
        OutputFormat::Table => {
            for result in results {
                println!("{}\t{}\t{}", result.distance, result.id, result.title);
            }
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Table,
}
