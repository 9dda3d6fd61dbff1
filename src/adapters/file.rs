use crate::adapters::state::StoreState;
use crate::domain::model::{
    Pool, PoolChanges, PoolDraft, PoolId, Product, ProductChanges, ProductDraft, ProductId,
    Request, RequestCursor, RequestDraft, RequestId, RequestTotals,
};
use crate::domain::ports::{Clock, PoolStore};
use crate::utils::error::{PoolError, Result};
use async_trait::async_trait;
use fd_lock::RwLock;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 以 JSON 快照檔持久化的 store，可由多個行程共用同一個檔案。
///
/// 每個操作都先取得旁邊 `.lock` 檔的 OS 檔案鎖 (讀取為共享、寫入為獨佔)，
/// 在鎖內重新讀檔，寫入時套用變更後整份寫回。失敗的變更不會寫檔。
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileStore {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let store = Self {
            lock_path: sibling(&path, ".lock"),
            path,
        };
        // 損壞的快照在開啟時就回報
        store.read(|_| ()).await?;

        tracing::debug!("Opened JSON store at {}", store.path.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read<T: Send + 'static>(
        &self,
        view: impl FnOnce(&StoreState) -> T + Send + 'static,
    ) -> Result<T> {
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();
        run_blocking(move || {
            let lock = RwLock::new(open_lock_file(&lock_path)?);
            let _guard = lock.read()?;
            let state = load_snapshot(&path)?;
            Ok(view(&state))
        })
        .await
    }

    async fn mutate<T: Send + 'static>(
        &self,
        apply: impl FnOnce(&mut StoreState) -> Result<T> + Send + 'static,
    ) -> Result<T> {
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();
        run_blocking(move || {
            let mut lock = RwLock::new(open_lock_file(&lock_path)?);
            let _guard = lock.write()?;
            // 其他行程可能已寫入，持鎖後一定要重新讀檔
            let mut state = load_snapshot(&path)?;
            let output = apply(&mut state)?;
            persist_snapshot(&path, &state)?;
            Ok(output)
        })
        .await
    }
}

// 快照檔會被 rename 取代，鎖必須放在不會被換掉的檔案上
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

fn open_lock_file(lock_path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)?;
    Ok(file)
}

fn load_snapshot(path: &Path) -> Result<StoreState> {
    let mut state = match fs::read(path) {
        Ok(data) => serde_json::from_slice::<StoreState>(&data)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => StoreState::default(),
        Err(e) => return Err(e.into()),
    };
    state.rebuild_indexes();
    Ok(state)
}

fn persist_snapshot(path: &Path, state: &StoreState) -> Result<()> {
    // 先寫暫存檔再 rename，避免留下寫到一半的快照
    let tmp_path = sibling(path, ".tmp");
    let data = serde_json::to_vec_pretty(state)?;
    fs::write(&tmp_path, data)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

async fn run_blocking<T: Send + 'static>(
    task: impl FnOnce() -> Result<T> + Send + 'static,
) -> Result<T> {
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| PoolError::StorageError {
            message: format!("Store task failed: {}", e),
        })?
}

#[async_trait]
impl PoolStore for JsonFileStore {
    async fn insert_product(&self, draft: ProductDraft) -> Result<Product> {
        self.mutate(move |state| Ok(state.insert_product(draft))).await
    }

    async fn update_product(&self, id: ProductId, changes: ProductChanges) -> Result<Product> {
        self.mutate(move |state| state.update_product(id, &changes)).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        self.read(move |state| state.get_product(id)).await
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        self.read(|state| state.list_products()).await
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        self.mutate(move |state| Ok(state.delete_product(id))).await
    }

    async fn insert_pool(&self, draft: PoolDraft) -> Result<Pool> {
        self.mutate(move |state| state.insert_pool(draft)).await
    }

    async fn update_pool(&self, id: PoolId, changes: PoolChanges) -> Result<Pool> {
        self.mutate(move |state| state.update_pool(id, &changes)).await
    }

    async fn get_pool(&self, id: PoolId) -> Result<Option<Pool>> {
        self.read(move |state| state.get_pool(id)).await
    }

    async fn list_pools(&self, product_id: Option<ProductId>) -> Result<Vec<Pool>> {
        self.read(move |state| state.list_pools(product_id)).await
    }

    async fn delete_pool(&self, id: PoolId) -> Result<bool> {
        self.mutate(move |state| Ok(state.delete_pool(id))).await
    }

    async fn insert_request(&self, draft: RequestDraft, clock: Arc<dyn Clock>) -> Result<Request> {
        self.mutate(move |state| state.insert_request(draft, clock.now()))
            .await
    }

    async fn get_request(&self, pool_id: PoolId, id: RequestId) -> Result<Option<Request>> {
        self.read(move |state| state.get_request(pool_id, id)).await
    }

    async fn requests_page(
        &self,
        pool_id: PoolId,
        after: Option<RequestCursor>,
        limit: usize,
    ) -> Result<Vec<Request>> {
        self.read(move |state| state.requests_page(pool_id, after, limit))
            .await
    }

    async fn request_totals(&self, pool_id: PoolId) -> Result<RequestTotals> {
        self.read(move |state| state.request_totals(pool_id)).await
    }
}
