pub mod config;
pub mod error;
pub mod sparql;
pub mod graphdb;
pub mod cache;
pub mod services;
pub mod api;

pub use config::Config;
pub use error::{ChemkgError, Result};
pub use graphdb::Repository;
pub use sparql::{build_multi_set_path_query, build_path_summary_query};
