//! Init-once application context.
//!
//! Everything the request surface needs lives here: the selected backend,
//! the snapshot cache, the settings store, and the command tracker. It is
//! constructed exactly once in `main`, after the data directory resolves,
//! and shared from then on; there is no teardown beyond process exit.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::git::{BackendKind, CommandTracker};
use crate::store::{SnapshotCache, SettingsStore};

pub struct AppContext {
    pub backend: BackendKind,
    pub cache: SnapshotCache,
    pub settings: SettingsStore,
    pub tracker: CommandTracker,
}

impl AppContext {
    pub fn new(data_dir: PathBuf, backend: BackendKind) -> Result<Self> {
        Ok(Self {
            cache: SnapshotCache::new(&data_dir)?,
            settings: SettingsStore::new(&data_dir)?,
            tracker: CommandTracker::new(),
            backend,
        })
    }
}

pub type SharedContext = Arc<AppContext>;
