mod config;
mod engine;
mod error;
mod observations;
mod output;
mod pipeline;
mod stations;
mod types;
mod utils;

pub use config::*;
pub use error::{ConfigError, GridTempError};
pub use pipeline::*;
pub use utils::LoadSummary;

pub use types::period::*;
pub use types::station::*;

pub use stations::catalog::StationCatalog;
pub use stations::error::RecordError;
pub use stations::inventory::*;

pub use observations::error::LoadError;
pub use observations::ghcn::*;
pub use observations::parquet::*;
pub use observations::store::*;

pub use engine::aggregator::*;
pub use engine::baseline::*;
pub use engine::grid::*;
pub use engine::summarizer::*;

pub use output::*;
