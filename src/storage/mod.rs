mod kv_store;

pub use kv_store::*;


use std::path::Path;

use tracing::debug;
use tracing::warn;

use crate::Result;

pub fn init_sled_kv_db(db_path: impl AsRef<Path> + std::fmt::Debug) -> Result<sled::Db> {
    debug!("init_sled_kv_db from path: {:?}", &db_path);

    sled::Config::default()
        .path(db_path.as_ref())
        .cache_capacity(64 * 1024 * 1024)
        .flush_every_ms(Some(10))
        .mode(sled::Mode::LowSpace)
        .open()
        .map_err(|e| {
            warn!("Try to open DB at this location: {:?} and failed: {:?}", db_path, e);
            e.into()
        })
}
