use crate::adapters::{self, SystemClock};
use crate::config::AppConfig;
use crate::core::catalog::Catalog;
use crate::core::ledger::PoolLedger;
use crate::core::registry::{CommitmentRegistry, RequestListing};
use crate::core::{Clock, PoolStore};
use crate::domain::model::{NewPool, NewRequest, PoolId, PoolView, ProductId, Request};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::sync::Arc;

/// 給外部傳輸層 (HTTP、RPC、CLI) 呼叫的窄介面
#[derive(Clone)]
pub struct PoolService {
    catalog: Catalog,
    ledger: PoolLedger,
    registry: CommitmentRegistry,
}

impl PoolService {
    pub fn new(store: Arc<dyn PoolStore>, clock: Arc<dyn Clock>) -> Self {
        let catalog = Catalog::new(store.clone(), clock.clone());
        let ledger = PoolLedger::new(store.clone(), clock.clone());
        let registry = CommitmentRegistry::new(store, clock, ledger.clone());
        Self {
            catalog,
            ledger,
            registry,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.registry = self.registry.with_page_size(page_size);
        self
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let store = adapters::open_store(&config.store).await?;
        Ok(Self::new(store, Arc::new(SystemClock)).with_page_size(config.page_size()))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &PoolLedger {
        &self.ledger
    }

    pub fn registry(&self) -> &CommitmentRegistry {
        &self.registry
    }

    pub async fn create_pool(&self, input: NewPool) -> Result<PoolView> {
        let pool = self.ledger.create_pool(input).await?;
        let aggregate = self.ledger.aggregate(&pool).await?;
        Ok(PoolView { pool, aggregate })
    }

    pub async fn get_pool(&self, id: PoolId) -> Result<PoolView> {
        self.ledger.view(id).await
    }

    pub async fn list_pools(&self, product_id: Option<ProductId>) -> Result<Vec<PoolView>> {
        self.ledger.list_views(product_id).await
    }

    pub async fn submit_request(&self, input: NewRequest) -> Result<Request> {
        self.registry.submit_request(input).await
    }

    pub async fn list_requests(&self, pool_id: PoolId) -> Result<RequestListing> {
        self.registry.list_requests(pool_id).await
    }
}
