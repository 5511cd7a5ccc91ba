use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;

use crate::cli::*;

static CONF_DIR: LazyLock<ConfDir> = LazyLock::new(|| {
    let proj_dirs = ProjectDirs::from("", "", "offsearch").expect("failed to get project dir");
    ConfDir { path: proj_dirs.data_dir().to_path_buf() }
});

fn default_conf_dir() -> &'static str {
    CONF_DIR.path().to_str().unwrap()
}

#[derive(Parser, Debug, Clone)]
#[command(name = "offsearch", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// Directory holding the local image cache
    #[arg(short, long, default_value = default_conf_dir())]
    pub conf_dir: ConfDir,
    /// Base URL of the remote catalog API
    #[arg(
        long,
        value_name = "URL",
        env = "OFFSEARCH_API_URL",
        default_value = "http://127.0.0.1:8080/api"
    )]
    pub api_url: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// Mirror the remote catalog into the local cache
    Sync(SyncCommand),
    /// Search the cache for images similar to a query image
    Search(SearchCommand),
    /// Print the number of cached images
    Count(CountCommand),
    /// Delete all cached images
    Clear(ClearCommand),
    /// Start the HTTP search service
    Server(ServerCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// Maximum hamming distance for a cached image to count as a match
    #[arg(long, value_name = "N", default_value_t = 30, value_parser = clap::value_parser!(u32).range(0..=64))]
    pub max_distance: u32,
    /// Maximum number of results
    #[arg(long, value_name = "COUNT", default_value_t = 20)]
    pub limit: usize,
}

#[derive(Debug, Clone)]
pub struct ConfDir {
    path: PathBuf,
}

impl ConfDir {
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Path of the image cache database.
    pub fn database(&self) -> PathBuf {
        self.path.join("offsearch.db")
    }
}

impl FromStr for ConfDir {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { path: PathBuf::from(s) })
    }
}
