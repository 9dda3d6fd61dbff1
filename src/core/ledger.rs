use crate::core::{Clock, PoolStore};
use crate::domain::model::{
    ensure_window, NewPool, Pool, PoolAggregate, PoolChanges, PoolDraft, PoolId, PoolPatch,
    PoolView, ProductId,
};
use crate::utils::error::{PoolError, Result};
use crate::utils::validation::validate_quantity;
use std::sync::Arc;

/// Pool 的時間窗與門檻。彙總永遠由儲存的 request 即時計算，不另存計數器。
#[derive(Clone)]
pub struct PoolLedger {
    store: Arc<dyn PoolStore>,
    clock: Arc<dyn Clock>,
}

impl PoolLedger {
    pub fn new(store: Arc<dyn PoolStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create_pool(&self, input: NewPool) -> Result<Pool> {
        tracing::debug!(
            "Creating pool for product {} ({} -> {}, min {})",
            input.product_id,
            input.start_at,
            input.end_at,
            input.min_quantity
        );

        ensure_window("end_at", input.start_at, input.end_at)?;
        let min_quantity = validate_quantity("min_quantity", input.min_quantity)?;

        let pool = self
            .store
            .insert_pool(PoolDraft {
                product_id: input.product_id,
                start_at: input.start_at,
                end_at: input.end_at,
                min_quantity,
                created_at: self.clock.now(),
            })
            .await?;

        tracing::info!(
            "🆕 Pool {} opened for product {} (min {})",
            pool.id,
            pool.product_id,
            pool.min_quantity
        );
        Ok(pool)
    }

    pub async fn get_pool(&self, id: PoolId) -> Result<Pool> {
        self.store
            .get_pool(id)
            .await?
            .ok_or_else(|| PoolError::not_found("Pool", id))
    }

    pub async fn list_pools(&self, product_id: Option<ProductId>) -> Result<Vec<Pool>> {
        self.store.list_pools(product_id).await
    }

    /// 時間窗可調整但不可倒退，也必須涵蓋既有 request；已有 request 後門檻不可改
    pub async fn update_pool(&self, id: PoolId, patch: PoolPatch) -> Result<Pool> {
        let changes = PoolChanges {
            start_at: patch.start_at,
            end_at: patch.end_at,
            min_quantity: patch
                .min_quantity
                .map(|value| validate_quantity("min_quantity", value))
                .transpose()?,
            now: self.clock.now(),
        };

        let pool = self.store.update_pool(id, changes).await.inspect_err(|e| {
            tracing::warn!("⚠️ Pool {} update rejected: {}", id, e);
        })?;
        tracing::info!("🔧 Pool {} updated", pool.id);
        Ok(pool)
    }

    /// 刪除 pool 與其所有 request，store 內單一原子步驟
    pub async fn delete_pool(&self, id: PoolId) -> Result<()> {
        if !self.store.delete_pool(id).await? {
            return Err(PoolError::not_found("Pool", id));
        }
        tracing::info!("🗑️ Pool {} deleted with its requests", id);
        Ok(())
    }

    pub async fn aggregate(&self, pool: &Pool) -> Result<PoolAggregate> {
        let totals = self.store.request_totals(pool.id).await?;
        Ok(PoolAggregate::compute(pool, totals, self.clock.now()))
    }

    pub async fn get_aggregate(&self, id: PoolId) -> Result<PoolAggregate> {
        let pool = self.get_pool(id).await?;
        self.aggregate(&pool).await
    }

    pub async fn view(&self, id: PoolId) -> Result<PoolView> {
        let pool = self.get_pool(id).await?;
        let aggregate = self.aggregate(&pool).await?;
        Ok(PoolView { pool, aggregate })
    }

    pub async fn list_views(&self, product_id: Option<ProductId>) -> Result<Vec<PoolView>> {
        let pools = self.list_pools(product_id).await?;
        let mut views = Vec::with_capacity(pools.len());
        for pool in pools {
            let aggregate = self.aggregate(&pool).await?;
            views.push(PoolView { pool, aggregate });
        }
        Ok(views)
    }
}
