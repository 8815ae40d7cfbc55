use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::error::{Result, TodoError};

pub const LOCK_FILE: &str = "todolist.lock";

/// Exclusive advisory lock held by the single writer of a data directory.
/// Released when dropped.
pub struct WriterLock {
    file: File,
}

impl WriterLock {
    /// Take the writer lock for `data_dir`, failing fast if another process holds it.
    pub fn acquire(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        file.try_lock_exclusive()
            .map_err(|_| TodoError::Locked(path.display().to_string()))?;

        Ok(Self { file })
    }

    /// Release the lock explicitly (normally handled by Drop).
    pub fn release(self) -> Result<()> {
        FileExt::unlock(&self.file)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquire_and_release() {
        let dir = tempdir().unwrap();
        let lock = WriterLock::acquire(dir.path()).unwrap();
        assert!(dir.path().join(LOCK_FILE).exists());
        lock.release().unwrap();
    }

    #[test]
    fn second_writer_is_rejected() {
        let dir = tempdir().unwrap();
        let _held = WriterLock::acquire(dir.path()).unwrap();
        let err = WriterLock::acquire(dir.path()).err().unwrap();
        assert!(matches!(err, TodoError::Locked(_)));
    }

    #[test]
    fn lock_is_reacquirable_after_drop() {
        let dir = tempdir().unwrap();
        {
            let _held = WriterLock::acquire(dir.path()).unwrap();
        }
        WriterLock::acquire(dir.path()).unwrap();
    }
}
