//! Per-node persistent key-value state backed by sled.
//!
//! Writes carry the revision assigned by the primary. A member applies a
//! write only when its revision is newer than the last one applied, so a
//! duplicate or reordered replication frame never rolls a key back.

use std::path::Path;

use sled::Db;
use sled::Tree;
use tokio::sync::Mutex;
use tracing::debug;

use super::init_sled_kv_db;
use crate::constants::KV_TREE;
use crate::constants::META_KEY_LAST_REVISION;
use crate::constants::META_TREE;
use crate::safe_kv;
use crate::safe_vk;
use crate::Result;

pub struct KvStore {
    db: Db,
    kv_tree: Tree,
    meta_tree: Tree,
    apply_lock: Mutex<()>,
}

impl KvStore {
    pub fn open(db_path: impl AsRef<Path> + std::fmt::Debug) -> Result<Self> {
        let db = init_sled_kv_db(db_path)?;
        let kv_tree = db.open_tree(KV_TREE)?;
        let meta_tree = db.open_tree(META_TREE)?;
        Ok(Self {
            db,
            kv_tree,
            meta_tree,
            apply_lock: Mutex::new(()),
        })
    }

    /// Applies `key=value` at `revision`
    ///
    /// # Returns
    /// `false` when the revision is not newer than the last applied one
    pub async fn apply(
        &self,
        revision: u64,
        key: &[u8],
        value: &[u8],
    ) -> Result<bool> {
        let _guard = self.apply_lock.lock().await;

        let last = self.last_revision()?;
        if revision <= last {
            debug!(revision, last, "skip stale revision");
            return Ok(false);
        }

        self.kv_tree.insert(key, value)?;
        self.meta_tree.insert(META_KEY_LAST_REVISION, safe_kv(revision).to_vec())?;
        Ok(true)
    }

    pub fn get(
        &self,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>> {
        Ok(self.kv_tree.get(key)?.map(|v| v.to_vec()))
    }

    /// Last applied revision, 0 for a fresh store
    pub fn last_revision(&self) -> Result<u64> {
        match self.meta_tree.get(META_KEY_LAST_REVISION)? {
            Some(bytes) => safe_vk(bytes),
            None => Ok(0),
        }
    }

    pub fn len(&self) -> usize {
        self.kv_tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kv_tree.is_empty()
    }

    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }
}
