use crate::adapters::state::StoreState;
use crate::domain::model::{
    Pool, PoolChanges, PoolDraft, PoolId, Product, ProductChanges, ProductDraft, ProductId,
    Request, RequestCursor, RequestDraft, RequestId, RequestTotals,
};
use crate::domain::ports::{Clock, PoolStore};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// 單一把鎖保護全部資料，每個操作都是一個臨界區
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PoolStore for MemoryStore {
    async fn insert_product(&self, draft: ProductDraft) -> Result<Product> {
        Ok(self.state.lock().await.insert_product(draft))
    }

    async fn update_product(&self, id: ProductId, changes: ProductChanges) -> Result<Product> {
        self.state.lock().await.update_product(id, &changes)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.lock().await.get_product(id))
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(self.state.lock().await.list_products())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        Ok(self.state.lock().await.delete_product(id))
    }

    async fn insert_pool(&self, draft: PoolDraft) -> Result<Pool> {
        self.state.lock().await.insert_pool(draft)
    }

    async fn update_pool(&self, id: PoolId, changes: PoolChanges) -> Result<Pool> {
        self.state.lock().await.update_pool(id, &changes)
    }

    async fn get_pool(&self, id: PoolId) -> Result<Option<Pool>> {
        Ok(self.state.lock().await.get_pool(id))
    }

    async fn list_pools(&self, product_id: Option<ProductId>) -> Result<Vec<Pool>> {
        Ok(self.state.lock().await.list_pools(product_id))
    }

    async fn delete_pool(&self, id: PoolId) -> Result<bool> {
        Ok(self.state.lock().await.delete_pool(id))
    }

    async fn insert_request(&self, draft: RequestDraft, clock: Arc<dyn Clock>) -> Result<Request> {
        let mut state = self.state.lock().await;
        state.insert_request(draft, clock.now())
    }

    async fn get_request(&self, pool_id: PoolId, id: RequestId) -> Result<Option<Request>> {
        Ok(self.state.lock().await.get_request(pool_id, id))
    }

    async fn requests_page(
        &self,
        pool_id: PoolId,
        after: Option<RequestCursor>,
        limit: usize,
    ) -> Result<Vec<Request>> {
        Ok(self.state.lock().await.requests_page(pool_id, after, limit))
    }

    async fn request_totals(&self, pool_id: PoolId) -> Result<RequestTotals> {
        Ok(self.state.lock().await.request_totals(pool_id))
    }
}
