use crate::core::ledger::PoolLedger;
use crate::core::{Clock, PoolStore};
use crate::domain::model::{NewRequest, PoolId, Request, RequestCursor, RequestDraft, RequestId};
use crate::utils::error::{PoolError, Result};
use crate::utils::validation::{validate_email, validate_quantity};
use std::collections::VecDeque;
use std::sync::Arc;

pub const DEFAULT_PAGE_SIZE: usize = 50;

/// 買家在 pool 內的承諾。只新增，不修改也不刪除 (除非 pool 被刪)。
#[derive(Clone)]
pub struct CommitmentRegistry {
    store: Arc<dyn PoolStore>,
    clock: Arc<dyn Clock>,
    ledger: PoolLedger,
    page_size: usize,
}

impl CommitmentRegistry {
    pub fn new(store: Arc<dyn PoolStore>, clock: Arc<dyn Clock>, ledger: PoolLedger) -> Self {
        Self {
            store,
            clock,
            ledger,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// 檢查順序：pool 存在 -> 時間窗 -> 輸入格式 -> 唯一性 (store 原子寫入)
    pub async fn submit_request(&self, input: NewRequest) -> Result<Request> {
        let now = self.clock.now();
        tracing::debug!(
            "Submitting request to pool {} for {} (qty {})",
            input.pool_id,
            input.email,
            input.quantity
        );

        let pool = self.ledger.get_pool(input.pool_id).await?;
        pool.ensure_accepting(now).inspect_err(|e| {
            tracing::warn!("⏰ Rejected request for pool {}: {}", pool.id, e);
        })?;

        let quantity = validate_quantity("quantity", input.quantity)?;
        let email = validate_email("email", &input.email)?;

        // 上面的時間檢查只決定錯誤順序；store 在鎖內重新取時間並檢查
        let draft = RequestDraft {
            pool_id: pool.id,
            email,
            quantity,
        };

        match self.store.insert_request(draft, self.clock.clone()).await {
            Ok(request) => {
                tracing::info!(
                    "✅ Request {} recorded: {} x{} in pool {}",
                    request.id,
                    request.email,
                    request.quantity,
                    request.pool_id
                );
                Ok(request)
            }
            Err(e) => {
                tracing::warn!("❌ Request for pool {} rejected: {}", pool.id, e);
                Err(e)
            }
        }
    }

    /// 回傳可重複走訪的延遲序列，依 (created_at, id) 遞增
    pub async fn list_requests(&self, pool_id: PoolId) -> Result<RequestListing> {
        self.ledger.get_pool(pool_id).await?;
        Ok(RequestListing::new(self.store.clone(), pool_id, self.page_size))
    }

    pub async fn get_request(&self, pool_id: PoolId, id: RequestId) -> Result<Request> {
        self.ledger.get_pool(pool_id).await?;
        self.store
            .get_request(pool_id, id)
            .await?
            .ok_or_else(|| PoolError::not_found("Request", id))
    }
}

/// 以 keyset 游標分頁讀取 request；`rewind` 後可從頭再讀
pub struct RequestListing {
    store: Arc<dyn PoolStore>,
    pool_id: PoolId,
    page_size: usize,
    cursor: Option<RequestCursor>,
    buffer: VecDeque<Request>,
    exhausted: bool,
}

impl RequestListing {
    fn new(store: Arc<dyn PoolStore>, pool_id: PoolId, page_size: usize) -> Self {
        Self {
            store,
            pool_id,
            page_size,
            cursor: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    pub fn pool_id(&self) -> PoolId {
        self.pool_id
    }

    pub async fn next_page(&mut self) -> Result<Option<Vec<Request>>> {
        if !self.buffer.is_empty() {
            return Ok(Some(self.buffer.drain(..).collect()));
        }
        if self.exhausted {
            return Ok(None);
        }

        let page = self
            .store
            .requests_page(self.pool_id, self.cursor, self.page_size)
            .await?;
        if page.len() < self.page_size {
            self.exhausted = true;
        }

        match page.last() {
            Some(last) => {
                self.cursor = Some(RequestCursor::from(last));
                Ok(Some(page))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    pub async fn next(&mut self) -> Result<Option<Request>> {
        if self.buffer.is_empty() {
            match self.next_page().await? {
                Some(page) => self.buffer.extend(page),
                None => return Ok(None),
            }
        }
        Ok(self.buffer.pop_front())
    }

    pub fn rewind(&mut self) {
        self.cursor = None;
        self.buffer.clear();
        self.exhausted = false;
    }

    /// 從頭讀完全部
    pub async fn collect_all(&mut self) -> Result<Vec<Request>> {
        self.rewind();
        let mut requests = Vec::new();
        while let Some(page) = self.next_page().await? {
            requests.extend(page);
        }
        Ok(requests)
    }
}
