use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::LogSink;
use crate::core::error::LauncherResult;

/// A registered SIGALRM listener, not yet tied to a sink.
///
/// Registering replaces the default action of SIGALRM (terminate), so it
/// happens before the log file takes over the standard streams.
#[cfg(unix)]
pub struct Rotation {
    alarms: tokio::signal::unix::Signal,
}

#[cfg(not(unix))]
pub struct Rotation;

/// Start listening for the rotation signal on behalf of the log at `path`.
///
/// Must be called from within a tokio runtime.
#[cfg(unix)]
pub fn listen(path: &Path) -> LauncherResult<Rotation> {
    use tokio::signal::unix::{signal, SignalKind};

    use crate::core::error::LauncherError;

    let alarms = signal(SignalKind::alarm()).map_err(|source| LauncherError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Reopening {:?} on SIGALRM", path);
    Ok(Rotation { alarms })
}

/// No rotation signal exists on this platform.
#[cfg(not(unix))]
pub fn listen(path: &Path) -> LauncherResult<Rotation> {
    debug!("No rotation signal on this platform for {:?}", path);
    Ok(Rotation)
}

impl Rotation {
    /// Reopen `sink` on every signal, so external rotation tools can
    /// rename or truncate the file.
    #[cfg(unix)]
    pub fn follow(self, sink: Arc<LogSink>) {
        use tracing::{error, info};

        let Rotation { mut alarms } = self;
        tokio::spawn(async move {
            while alarms.recv().await.is_some() {
                let target = Arc::clone(&sink);
                // Logging happens after the sink lock is released.
                match tokio::task::spawn_blocking(move || target.reopen()).await {
                    Ok(Ok(())) => info!("Reopened log file {:?}", sink.path()),
                    Ok(Err(e)) => error!("Log file reopen failed, keeping old handle: {}", e),
                    Err(e) => error!("Log file reopen task failed: {}", e),
                }
            }
        });
    }

    #[cfg(not(unix))]
    pub fn follow(self, _sink: Arc<LogSink>) {}
}
