use crate::domain::model::{
    Pool, PoolChanges, PoolDraft, PoolId, Product, ProductChanges, ProductDraft, ProductId,
    Request, RequestCursor, RequestDraft, RequestId, RequestSpan, RequestTotals,
};
use crate::utils::error::{PoolError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::Bound;

/// 記憶體中的資料表與索引。呼叫端負責加鎖，
/// 每個方法在同一把鎖內完成檢查與寫入。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    next_product_id: ProductId,
    next_pool_id: PoolId,
    next_request_id: RequestId,
    products: BTreeMap<ProductId, Product>,
    pools: BTreeMap<PoolId, Pool>,
    requests: BTreeMap<RequestId, Request>,

    // 以下索引不寫入快照，載入後重建
    #[serde(skip)]
    pool_requests: HashMap<PoolId, BTreeSet<(DateTime<Utc>, RequestId)>>,
    #[serde(skip)]
    commitments: HashSet<(PoolId, String)>,
}

fn next_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

impl StoreState {
    pub fn rebuild_indexes(&mut self) {
        self.pool_requests.clear();
        self.commitments.clear();
        for request in self.requests.values() {
            self.pool_requests
                .entry(request.pool_id)
                .or_default()
                .insert((request.created_at, request.id));
            self.commitments
                .insert((request.pool_id, request.email.clone()));
        }
    }

    pub fn insert_product(&mut self, draft: ProductDraft) -> Product {
        let product = Product {
            id: next_id(&mut self.next_product_id),
            name: draft.name,
            description: draft.description,
            unit_price: draft.unit_price,
            created_at: draft.created_at,
            updated_at: draft.created_at,
        };
        self.products.insert(product.id, product.clone());
        product
    }

    pub fn update_product(&mut self, id: ProductId, changes: &ProductChanges) -> Result<Product> {
        let product = self
            .products
            .get_mut(&id)
            .ok_or_else(|| PoolError::not_found("Product", id))?;
        *product = product.apply_changes(changes);
        Ok(product.clone())
    }

    pub fn get_product(&self, id: ProductId) -> Option<Product> {
        self.products.get(&id).cloned()
    }

    pub fn list_products(&self) -> Vec<Product> {
        self.products.values().cloned().collect()
    }

    pub fn delete_product(&mut self, id: ProductId) -> bool {
        if self.products.remove(&id).is_none() {
            return false;
        }
        let pool_ids: Vec<PoolId> = self
            .pools
            .values()
            .filter(|pool| pool.product_id == id)
            .map(|pool| pool.id)
            .collect();
        for pool_id in pool_ids {
            self.delete_pool(pool_id);
        }
        true
    }

    pub fn insert_pool(&mut self, draft: PoolDraft) -> Result<Pool> {
        if !self.products.contains_key(&draft.product_id) {
            return Err(PoolError::validation(
                "product",
                format!("Invalid product id {} - object does not exist", draft.product_id),
            ));
        }
        let pool = Pool {
            id: next_id(&mut self.next_pool_id),
            product_id: draft.product_id,
            start_at: draft.start_at,
            end_at: draft.end_at,
            min_quantity: draft.min_quantity,
            created_at: draft.created_at,
            updated_at: draft.created_at,
        };
        self.pools.insert(pool.id, pool.clone());
        Ok(pool)
    }

    pub fn update_pool(&mut self, id: PoolId, changes: &PoolChanges) -> Result<Pool> {
        let committed = self.request_span(id);
        let pool = self
            .pools
            .get_mut(&id)
            .ok_or_else(|| PoolError::not_found("Pool", id))?;
        *pool = pool.apply_changes(changes, committed)?;
        Ok(pool.clone())
    }

    fn request_span(&self, pool_id: PoolId) -> Option<RequestSpan> {
        let entries = self.pool_requests.get(&pool_id)?;
        let (first, _) = entries.first()?;
        let (last, _) = entries.last()?;
        Some(RequestSpan {
            first: *first,
            last: *last,
        })
    }

    pub fn get_pool(&self, id: PoolId) -> Option<Pool> {
        self.pools.get(&id).cloned()
    }

    pub fn list_pools(&self, product_id: Option<ProductId>) -> Vec<Pool> {
        self.pools
            .values()
            .filter(|pool| product_id.map_or(true, |wanted| pool.product_id == wanted))
            .cloned()
            .collect()
    }

    pub fn delete_pool(&mut self, id: PoolId) -> bool {
        if self.pools.remove(&id).is_none() {
            return false;
        }
        if let Some(entries) = self.pool_requests.remove(&id) {
            for (_, request_id) in entries {
                if let Some(request) = self.requests.remove(&request_id) {
                    self.commitments.remove(&(id, request.email));
                }
            }
        }
        true
    }

    /// `now` 必須在持有鎖之後才讀取，時間檢查、created_at 與排序才會一致
    pub fn insert_request(&mut self, draft: RequestDraft, now: DateTime<Utc>) -> Result<Request> {
        let pool = self
            .pools
            .get(&draft.pool_id)
            .ok_or_else(|| PoolError::not_found("Pool", draft.pool_id))?;
        pool.ensure_accepting(now)?;

        let key = (draft.pool_id, draft.email);
        if self.commitments.contains(&key) {
            return Err(PoolError::DuplicateCommitmentError {
                pool_id: key.0,
                email: key.1,
            });
        }

        let request = Request {
            id: next_id(&mut self.next_request_id),
            pool_id: key.0,
            email: key.1.clone(),
            quantity: draft.quantity,
            created_at: now,
        };
        self.pool_requests
            .entry(request.pool_id)
            .or_default()
            .insert((request.created_at, request.id));
        self.commitments.insert(key);
        self.requests.insert(request.id, request.clone());
        Ok(request)
    }

    pub fn get_request(&self, pool_id: PoolId, id: RequestId) -> Option<Request> {
        self.requests
            .get(&id)
            .filter(|request| request.pool_id == pool_id)
            .cloned()
    }

    pub fn requests_page(
        &self,
        pool_id: PoolId,
        after: Option<RequestCursor>,
        limit: usize,
    ) -> Vec<Request> {
        let Some(entries) = self.pool_requests.get(&pool_id) else {
            return Vec::new();
        };
        let lower = match after {
            Some(cursor) => Bound::Excluded((cursor.created_at, cursor.id)),
            None => Bound::Unbounded,
        };
        entries
            .range((lower, Bound::Unbounded))
            .take(limit)
            .filter_map(|(_, request_id)| self.requests.get(request_id).cloned())
            .collect()
    }

    pub fn request_totals(&self, pool_id: PoolId) -> RequestTotals {
        let Some(entries) = self.pool_requests.get(&pool_id) else {
            return RequestTotals::default();
        };
        entries
            .iter()
            .filter_map(|(_, request_id)| self.requests.get(request_id))
            .fold(RequestTotals::default(), |mut totals, request| {
                totals.committed_quantity += u64::from(request.quantity);
                totals.request_count += 1;
                totals
            })
    }
}
