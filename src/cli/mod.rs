mod clear;
mod count;
mod search;
mod server;
mod sync;

pub use clear::*;
pub use count::*;
pub use search::*;
pub use server::*;
pub use sync::*;

use crate::catalog::HttpCatalog;
use crate::config::Opts;
use crate::db;
use crate::service::OfflineSearch;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}

pub(crate) async fn open_service(opts: &Opts) -> anyhow::Result<OfflineSearch<HttpCatalog>> {
    std::fs::create_dir_all(opts.conf_dir.path())?;
    let db = db::init_db(opts.conf_dir.database()).await?;
    let api = HttpCatalog::new(&opts.api_url)?;
    Ok(OfflineSearch::new(db, api))
}
