pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{JsonFileStore, ManualClock, MemoryStore, SystemClock};
pub use config::AppConfig;
pub use crate::core::{
    catalog::Catalog,
    ledger::PoolLedger,
    registry::{CommitmentRegistry, RequestListing},
    service::PoolService,
};
pub use domain::model::{
    NewPool, NewProduct, NewRequest, Pool, PoolAggregate, PoolPatch, PoolState, PoolView,
    Product, ProductPatch, Request,
};
pub use utils::error::{ErrorKind, PoolError, Result};
