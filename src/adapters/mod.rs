// Adapters layer: concrete implementations of the domain ports (stores, clocks).

pub mod clock;
pub mod file;
pub mod memory;
pub mod state;

pub use clock::{ManualClock, SystemClock};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::domain::ports::PoolStore;
use crate::utils::error::{PoolError, Result};
use std::sync::Arc;

/// 依設定建立 store
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn PoolStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::debug!("Using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::File => {
            let path = config.path.as_deref().ok_or_else(|| PoolError::ConfigError {
                message: "store.path is required for the file backend".to_string(),
            })?;
            tracing::debug!("Using JSON file store: {}", path);
            Ok(Arc::new(JsonFileStore::open(path).await?))
        }
    }
}
