//! The external, durable key-value store behind index snapshots (spec §1,
//! §6 "External store"): out of scope as a concrete implementation — an
//! embedded indexed database in one deployment, a memory map in another —
//! and modeled here only through the trait interface the façade consumes.
//!
//! The trait is deliberately synchronous (see DESIGN.md, "ExternalStore
//! async shape"): the teacher has no `async_trait` dependency, and spec §5
//! only requires that the façade's *public* operations suspend at I/O, not
//! that every collaborator be `async fn`. `SearchEngine` calls these methods
//! inside `tokio::task::spawn_blocking` so a real disk- or network-backed
//! implementation never blocks the runtime, while this trait stays as plain
//! and dependency-free as the teacher's own `StorageLayout`.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::core::error::{Error, Result};

/// `{config, lastUpdated}` from spec §6 `getMetadata`, kept as the
/// snapshot's JSON `config` payload plus the store-observed write time.
#[derive(Debug, Clone)]
pub struct StoredMetadata {
    pub config_json: String,
    pub last_updated: i64,
}

/// External store interface consumed by the façade (spec §6). Every method
/// may fail; a failure must never poison the in-memory mutation that
/// triggered it (spec §7) — callers fall back to `MemoryStore` and keep
/// serving from the index already held.
pub trait ExternalStore: Send + Sync {
    fn initialize(&self) -> Result<()>;
    /// `payload` is the JSON-serialized snapshot (spec §6), stored verbatim
    /// under `name`.
    fn store_index(&self, name: &str, payload: &str) -> Result<()>;
    fn get_index(&self, name: &str) -> Result<Option<String>>;
    fn update_metadata(&self, config_json: &str, now_ms: i64) -> Result<()>;
    fn get_metadata(&self) -> Result<Option<StoredMetadata>>;
    fn clear_indices(&self) -> Result<()>;
    fn delete_index(&self, name: &str) -> Result<()>;
    fn close(&self) -> Result<()>;
}

#[derive(Default)]
struct MemoryStoreInner {
    indices: HashMap<String, String>,
    metadata: Option<StoredMetadata>,
    closed: bool,
}

/// In-process fallback used when the real external store fails to
/// initialize, or by callers that never configure one (spec §4.8
/// `initialize`: "if that fails, emit `storage:error`, fall back to
/// in-process memory store"). Grounded on the teacher's in-memory
/// collections guarded by `parking_lot::Mutex`/`RwLock` throughout
/// `core::database::Database`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn guard(&self, op: &str) -> Result<parking_lot::MutexGuard<'_, MemoryStoreInner>> {
        let guard = self.inner.lock();
        if guard.closed {
            return Err(Error::not_ready(format!(
                "memory store is closed, cannot {op}"
            )));
        }
        Ok(guard)
    }
}

impl ExternalStore for MemoryStore {
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn store_index(&self, name: &str, payload: &str) -> Result<()> {
        let mut guard = self.guard("store_index")?;
        guard.indices.insert(name.to_string(), payload.to_string());
        Ok(())
    }

    fn get_index(&self, name: &str) -> Result<Option<String>> {
        let guard = self.guard("get_index")?;
        Ok(guard.indices.get(name).cloned())
    }

    fn update_metadata(&self, config_json: &str, now_ms: i64) -> Result<()> {
        let mut guard = self.guard("update_metadata")?;
        guard.metadata = Some(StoredMetadata {
            config_json: config_json.to_string(),
            last_updated: now_ms,
        });
        Ok(())
    }

    fn get_metadata(&self) -> Result<Option<StoredMetadata>> {
        let guard = self.guard("get_metadata")?;
        Ok(guard.metadata.clone())
    }

    fn clear_indices(&self) -> Result<()> {
        let mut guard = self.guard("clear_indices")?;
        guard.indices.clear();
        Ok(())
    }

    fn delete_index(&self, name: &str) -> Result<()> {
        let mut guard = self.guard("delete_index")?;
        guard.indices.remove(name);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut guard = self.inner.lock();
        guard.closed = true;
        Ok(())
    }
}
