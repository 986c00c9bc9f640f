use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const LOCK_FILE: &str = ".lock";

/// Advisory lock held for the whole load → mutate → save cycle of a write
/// command, so two `lm` processes never interleave their saves.
pub struct DataDirLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not acquire lock on {path}: another lm process may be writing")]
    Timeout { path: PathBuf },
}

impl DataDirLock {
    /// Block up to `timeout` waiting for the lock on `data_dir`.
    pub fn acquire(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = data_dir.join(LOCK_FILE);
        let file = fs::create_dir_all(data_dir)
            .and_then(|_| {
                OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(false)
                    .open(&lock_path)
            })
            .map_err(|e| LockError::CreateError {
                path: lock_path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        loop {
            match try_lock(&file) {
                Ok(()) => {
                    return Ok(DataDirLock {
                        _file: file,
                        path: lock_path,
                    });
                }
                Err(_) if start.elapsed() < timeout => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    tracing::debug!(error = %e, "lock wait timed out");
                    return Err(LockError::Timeout { path: lock_path });
                }
            }
        }
    }

    /// Acquire with default timeout (5 seconds)
    pub fn acquire_default(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(data_dir, Duration::from_secs(5))
    }
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        // flock is released with the file
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn acquire_and_release() {
        let tmp = TempDir::new().unwrap();
        let lock = DataDirLock::acquire_default(tmp.path());
        assert!(lock.is_ok());
        drop(lock);
        assert!(!tmp.path().join(LOCK_FILE).exists());
        assert!(DataDirLock::acquire_default(tmp.path()).is_ok());
    }

    #[test]
    fn creates_missing_data_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("data");
        let _lock = DataDirLock::acquire_default(&dir).unwrap();
        assert!(dir.join(LOCK_FILE).exists());
    }

    #[cfg(unix)]
    #[test]
    fn contention_times_out() {
        let tmp = TempDir::new().unwrap();
        let _held = DataDirLock::acquire_default(tmp.path()).unwrap();
        let second = DataDirLock::acquire(tmp.path(), Duration::from_millis(50));
        assert!(matches!(second, Err(LockError::Timeout { .. })));
    }
}
