use crate::domain::model::{
    Pool, PoolChanges, PoolDraft, PoolId, Product, ProductChanges, ProductDraft, ProductId,
    Request, RequestCursor, RequestDraft, RequestId, RequestTotals,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// 持久層介面。每個寫入操作都必須是單一原子步驟：
/// 檢查 (存在、時間窗、唯一性) 與寫入在同一個臨界區或交易內完成。
#[async_trait]
pub trait PoolStore: Send + Sync {
    async fn insert_product(&self, draft: ProductDraft) -> Result<Product>;
    async fn update_product(&self, id: ProductId, changes: ProductChanges) -> Result<Product>;
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;
    async fn list_products(&self) -> Result<Vec<Product>>;
    /// 連帶刪除該商品的所有 pool 與 request，回傳是否存在
    async fn delete_product(&self, id: ProductId) -> Result<bool>;

    /// 商品不存在時回傳 `ValidationError` (欄位 `product`)
    async fn insert_pool(&self, draft: PoolDraft) -> Result<Pool>;
    async fn update_pool(&self, id: PoolId, changes: PoolChanges) -> Result<Pool>;
    async fn get_pool(&self, id: PoolId) -> Result<Option<Pool>>;
    async fn list_pools(&self, product_id: Option<ProductId>) -> Result<Vec<Pool>>;
    /// 連帶刪除該 pool 的所有 request，回傳是否存在
    async fn delete_pool(&self, id: PoolId) -> Result<bool>;

    /// 原子條件寫入：pool 存在、目前時間落在時間窗內、(pool, email) 未被佔用。
    /// 時鐘在臨界區內讀取，作為 `created_at`。
    async fn insert_request(&self, draft: RequestDraft, clock: Arc<dyn Clock>)
        -> Result<Request>;
    async fn get_request(&self, pool_id: PoolId, id: RequestId) -> Result<Option<Request>>;
    /// 依 (created_at, id) 遞增，回傳游標之後最多 `limit` 筆
    async fn requests_page(
        &self,
        pool_id: PoolId,
        after: Option<RequestCursor>,
        limit: usize,
    ) -> Result<Vec<Request>>;
    /// 每次都從儲存的 request 重新加總
    async fn request_totals(&self, pool_id: PoolId) -> Result<RequestTotals>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
