use crate::utils::error::{PoolError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ProductId = u64;
pub type PoolId = u64;
pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 商品建立輸入 (尚未驗證)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<Decimal>,
}

/// 已驗證、等待 store 指派 id 的商品
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn apply_changes(&self, changes: &ProductChanges) -> Product {
        let mut updated = self.clone();
        if let Some(name) = &changes.name {
            updated.name = name.clone();
        }
        if let Some(description) = &changes.description {
            updated.description = description.clone();
        }
        if let Some(price) = changes.unit_price {
            updated.unit_price = price;
        }
        updated.updated_at = changes.updated_at;
        updated
    }
}

/// Pool 的生命週期，由時間推導而來，不落地儲存
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolState {
    Pending,
    Open,
    Closed,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PoolState::Pending => "pending",
            PoolState::Open => "open",
            PoolState::Closed => "closed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub product_id: ProductId,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub min_quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPool {
    pub product_id: ProductId,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub min_quantity: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolPatch {
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub min_quantity: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct PoolDraft {
    pub product_id: ProductId,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub min_quantity: u32,
    pub created_at: DateTime<Utc>,
}

/// 已驗證的 pool 修改，`now` 是判斷狀態用的時間點
#[derive(Debug, Clone)]
pub struct PoolChanges {
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub min_quantity: Option<u32>,
    pub now: DateTime<Utc>,
}

impl Pool {
    pub fn state_at(&self, now: DateTime<Utc>) -> PoolState {
        if now < self.start_at {
            PoolState::Pending
        } else if now <= self.end_at {
            PoolState::Open
        } else {
            PoolState::Closed
        }
    }

    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now) == PoolState::Open
    }

    /// 送出 request 前的時間檢查，submit 時間即 commit 時間
    pub fn ensure_accepting(&self, now: DateTime<Utc>) -> Result<()> {
        let state = self.state_at(now);
        if state != PoolState::Open {
            return Err(PoolError::PoolClosedError {
                pool_id: self.id,
                state: state.to_string(),
            });
        }
        Ok(())
    }

    /// 套用修改並檢查規則；store 必須在同一個臨界區內呼叫。
    /// `committed` 為既有 request 的時間範圍，新時間窗必須涵蓋它。
    pub fn apply_changes(
        &self,
        changes: &PoolChanges,
        committed: Option<RequestSpan>,
    ) -> Result<Pool> {
        let current_state = self.state_at(changes.now);
        if current_state == PoolState::Closed {
            return Err(PoolError::PoolClosedError {
                pool_id: self.id,
                state: current_state.to_string(),
            });
        }

        let mut updated = self.clone();
        if let Some(start_at) = changes.start_at {
            updated.start_at = start_at;
        }
        if let Some(end_at) = changes.end_at {
            updated.end_at = end_at;
        }
        ensure_window("end_at", updated.start_at, updated.end_at)?;

        if updated.state_at(changes.now) < current_state {
            return Err(PoolError::validation(
                "start_at",
                format!(
                    "Rescheduling would move the pool from {} back to {}",
                    current_state,
                    updated.state_at(changes.now)
                ),
            ));
        }

        if let Some(span) = committed {
            if updated.start_at > span.first {
                return Err(PoolError::validation(
                    "start_at",
                    format!("start_at cannot move past the first request at {}", span.first),
                ));
            }
            if updated.end_at < span.last {
                return Err(PoolError::validation(
                    "end_at",
                    format!("end_at cannot move before the last request at {}", span.last),
                ));
            }
        }

        if let Some(min_quantity) = changes.min_quantity {
            if min_quantity != self.min_quantity && committed.is_some() {
                return Err(PoolError::validation(
                    "min_quantity",
                    "Threshold cannot change once requests exist",
                ));
            }
            updated.min_quantity = min_quantity;
        }

        updated.updated_at = changes.now;
        Ok(updated)
    }
}

pub fn ensure_window(field_name: &str, start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Result<()> {
    if end_at <= start_at {
        return Err(PoolError::validation(
            field_name,
            format!("end_at ({}) must be after start_at ({})", end_at, start_at),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub pool_id: PoolId,
    pub email: String,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRequest {
    pub pool_id: PoolId,
    pub email: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

impl NewRequest {
    pub fn new(pool_id: PoolId, email: impl Into<String>) -> Self {
        Self {
            pool_id,
            email: email.into(),
            quantity: default_quantity(),
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }
}

/// 已驗證的 request；email 已正規化，`created_at` 由 store 在臨界區內取時鐘
#[derive(Debug, Clone)]
pub struct RequestDraft {
    pub pool_id: PoolId,
    pub email: String,
    pub quantity: u32,
}

/// 某個 pool 內最早與最晚的 request 時間
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSpan {
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
}

/// keyset 分頁游標：(created_at, id) 嚴格遞增
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestCursor {
    pub created_at: DateTime<Utc>,
    pub id: RequestId,
}

impl From<&Request> for RequestCursor {
    fn from(request: &Request) -> Self {
        Self {
            created_at: request.created_at,
            id: request.id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestTotals {
    pub committed_quantity: u64,
    pub request_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolAggregate {
    pub committed_quantity: u64,
    pub request_count: usize,
    pub state: PoolState,
    pub is_open: bool,
    pub is_fulfilled: bool,
}

impl PoolAggregate {
    pub fn compute(pool: &Pool, totals: RequestTotals, now: DateTime<Utc>) -> Self {
        let state = pool.state_at(now);
        Self {
            committed_quantity: totals.committed_quantity,
            request_count: totals.request_count,
            state,
            is_open: state == PoolState::Open,
            is_fulfilled: totals.committed_quantity >= u64::from(pool.min_quantity),
        }
    }
}

/// 對外回傳的 pool + 即時彙總
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolView {
    #[serde(flatten)]
    pub pool: Pool,
    #[serde(flatten)]
    pub aggregate: PoolAggregate,
}
