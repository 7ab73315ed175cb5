use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::core::error::{LauncherError, LauncherResult};

/// Append-mode log file that can be reopened in place for rotation.
///
/// Exactly one handle is open at any time. Writes and [`LogSink::reopen`]
/// take the same lock, so no write ever lands on a handle that is being
/// replaced.
#[derive(Debug)]
pub struct LogSink {
    path: PathBuf,
    file: Mutex<File>,
    /// Whether the process standard streams follow this sink.
    std_streams: bool,
}

impl LogSink {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> LauncherResult<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(open_append(path)?),
            std_streams: false,
        })
    }

    /// Like [`LogSink::open`], and also points the process standard
    /// output and error at the file, now and after every reopen.
    pub(crate) fn open_for_process(path: &Path) -> LauncherResult<Self> {
        let file = open_append(path)?;
        point_std_streams_at(&file).map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            std_streams: true,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, File> {
        // A panic mid-write leaves the file usable; keep logging.
        self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Close the current handle and open a fresh one at the same path.
    ///
    /// If the path cannot be opened the previous handle stays in place.
    pub fn reopen(&self) -> LauncherResult<()> {
        let mut current = self.lock();
        let fresh = open_append(&self.path)?;
        if self.std_streams {
            point_std_streams_at(&fresh).map_err(|source| LauncherError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        let _ = current.flush();
        // The old handle is closed when it is dropped here.
        *current = fresh;
        Ok(())
    }

    /// Write the whole buffer under the lock.
    pub fn write_bytes(&self, buf: &[u8]) -> io::Result<()> {
        self.lock().write_all(buf)
    }

    pub fn flush(&self) -> io::Result<()> {
        self.lock().flush()
    }
}

fn open_append(path: &Path) -> LauncherResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(unix)]
fn point_std_streams_at(file: &File) -> io::Result<()> {
    use std::os::fd::AsRawFd;

    io::stdout().flush()?;
    for fd in [1, 2] {
        nix::unistd::dup2(file.as_raw_fd(), fd).map_err(io::Error::from)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn point_std_streams_at(_file: &File) -> io::Result<()> {
    Ok(())
}
