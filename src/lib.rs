pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod hamming;
pub mod phash;
mod server;
pub mod service;

pub use config::Opts;
pub use service::{OfflineSearch, SearchError};
