//! Advisory file lock on `state.json.lock` (spec.md §4.7/§5): every
//! mutation acquires it; a reader takes no lock and may observe a
//! previously committed snapshot. Grounded in `fs2`'s cross-platform
//! advisory locking, used here (rather than a library-level mutex, which
//! wouldn't coordinate two separate `anvil` processes) since spec.md §5
//! requires installs of unrelated tools to be possible from separate
//! invocations.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{Result, StateError};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Held for the duration of one `StateManager::mutate` call. Unlocks on
/// drop; the lock file itself is left in place (its presence isn't the
/// signal, the OS lock on it is).
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Blocks (polling, since `fs2` has no async API) until the exclusive
    /// lock is acquired or `timeout` elapses, whichever comes first.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).write(true).truncate(false).open(path)?;

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(Self { file }),
                Err(_) if Instant::now() < deadline => std::thread::sleep(DEFAULT_POLL_INTERVAL),
                Err(_) => return Err(StateError::Busy),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquires_an_uncontended_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json.lock");
        let lock = FileLock::acquire(&path, Duration::from_millis(100));
        assert!(lock.is_ok());
    }

    #[test]
    fn second_exclusive_lock_on_same_file_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json.lock");
        let _held = FileLock::acquire(&path, Duration::from_millis(100)).unwrap();

        let file = OpenOptions::new().create(true).write(true).open(&path).unwrap();
        let err = file.try_lock_exclusive();
        assert!(err.is_err());
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json.lock");
        {
            let _held = FileLock::acquire(&path, Duration::from_millis(100)).unwrap();
        }
        let second = FileLock::acquire(&path, Duration::from_millis(100));
        assert!(second.is_ok());
    }
}
