//! `StateManager` (spec.md §4.7): owns `state.json`, serializes every
//! mutation through an advisory file lock, and writes via temp-file +
//! rename so a reader never observes a partial write. Grounded in
//! `vx-core::global_tool_manager`'s load/save-JSON shape, made atomic via
//! `anvil-cache`'s `atomic_write_*` helpers and schema-versioned via
//! `migration.rs`.

use std::time::Duration;

use anvil_cache::{read_json_file, write_json_file};
use anvil_paths::HomeLayout;
use tracing::debug;

use crate::error::Result;
use crate::migration::migrate_to_current;
use crate::model::StateDocument;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

pub struct StateManager {
    layout: HomeLayout,
    lock_timeout: Duration,
}

impl StateManager {
    pub fn new(layout: HomeLayout) -> Self {
        Self {
            layout,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Read-only snapshot. No lock is taken (spec.md §4.7: "a reader takes
    /// no lock but may observe a previously committed snapshot"); a
    /// missing file reads as an empty, current-schema document.
    pub fn load(&self) -> Result<StateDocument> {
        let path = self.layout.state_file();
        if !path.exists() {
            return Ok(StateDocument::default());
        }
        let raw: serde_json::Value = read_json_file(&path)?;
        let migrated = migrate_to_current(raw)?;
        Ok(serde_json::from_value(migrated)?)
    }

    /// Perform one read-modify-write cycle under the advisory lock:
    /// acquire the lock, re-read the current document (so two processes
    /// never clobber each other's writes), run `f`, persist the result.
    /// `f`'s own `Err` short-circuits before anything is written.
    pub fn mutate<T>(&self, f: impl FnOnce(&mut StateDocument) -> Result<T>) -> Result<T> {
        let _lock = crate::lock::FileLock::acquire(&self.layout.state_lock_file(), self.lock_timeout)?;
        let mut doc = self.load()?;
        let result = f(&mut doc)?;
        write_json_file(&self.layout.state_file(), &doc)?;
        debug!(path = %self.layout.state_file().display(), "state.json written");
        Ok(result)
    }
}
