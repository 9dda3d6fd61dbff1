use crate::core::{Clock, PoolStore};
use crate::domain::model::{NewProduct, Product, ProductChanges, ProductDraft, ProductId, ProductPatch};
use crate::utils::error::{PoolError, Result};
use crate::utils::validation::{validate_max_length, validate_non_empty_string, validate_price, MAX_NAME_LENGTH};
use std::sync::Arc;

/// 商品只做簡單的屬性儲存
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn PoolStore>,
    clock: Arc<dyn Clock>,
}

fn validate_name(name: &str) -> Result<String> {
    validate_non_empty_string("name", name)?;
    let name = name.trim();
    validate_max_length("name", name, MAX_NAME_LENGTH)?;
    Ok(name.to_string())
}

impl Catalog {
    pub fn new(store: Arc<dyn PoolStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create_product(&self, input: NewProduct) -> Result<Product> {
        let draft = ProductDraft {
            name: validate_name(&input.name)?,
            description: input.description,
            unit_price: validate_price("unit_price", input.unit_price)?,
            created_at: self.clock.now(),
        };

        let product = self.store.insert_product(draft).await?;
        tracing::info!("🛒 Product {} created: {}", product.id, product.name);
        Ok(product)
    }

    /// 修改價格或描述不影響既有 pool
    pub async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        let changes = ProductChanges {
            name: patch.name.as_deref().map(validate_name).transpose()?,
            description: patch.description,
            unit_price: patch
                .unit_price
                .map(|price| validate_price("unit_price", price))
                .transpose()?,
            updated_at: self.clock.now(),
        };

        let product = self.store.update_product(id, changes).await?;
        tracing::info!("🛒 Product {} updated", product.id);
        Ok(product)
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| PoolError::not_found("Product", id))
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.store.list_products().await
    }

    /// 連帶刪除該商品的 pool 與 request
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        if !self.store.delete_product(id).await? {
            return Err(PoolError::not_found("Product", id));
        }
        tracing::info!("🗑️ Product {} deleted with its pools", id);
        Ok(())
    }
}
