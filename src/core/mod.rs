pub mod catalog;
pub mod ledger;
pub mod registry;
pub mod service;

pub use crate::domain::model::{Pool, PoolAggregate, PoolState, PoolView, Product, Request};
pub use crate::domain::ports::{Clock, PoolStore};
pub use crate::utils::error::Result;
