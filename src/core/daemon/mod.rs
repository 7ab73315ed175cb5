// ─── Daemonizer ───
// Detaches the launcher from its controlling terminal. The helper
// libraries are extracted from the archive and must provide the daemon
// class before the process is allowed to fork.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::core::archive::{ExtractedFiles, ResourceExtractor};
use crate::core::config::{HelperCoordinate, LauncherConfig};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::loader::ArtifactLoader;
use crate::core::maven::{artifact_filename, DependencyVersionTable};

/// A bound daemon capability.
pub trait Daemonizable {
    /// Whether this process is already the detached child.
    fn is_daemonized(&self) -> bool;

    /// Become a background process. Returns in the detached process only;
    /// the original foreground process exits with status 0. `close_stdio`
    /// points the standard streams at the null device.
    fn detach(&self, close_stdio: bool) -> LauncherResult<()>;
}

/// Extract one helper library named by its coordinate.
pub fn load_helper(
    helper: &HelperCoordinate,
    table: &DependencyVersionTable,
    extractor: &ResourceExtractor<'_>,
    files: &mut ExtractedFiles,
    config: &LauncherConfig,
) -> LauncherResult<PathBuf> {
    let unavailable = |reason: String| LauncherError::DaemonHelperUnavailable {
        helper: helper.to_string(),
        reason,
    };

    let version = table
        .version(&helper.group_id, &helper.artifact_id)
        .ok_or_else(|| {
            let expected = artifact_filename(&helper.artifact_id, "?", "jar");
            unavailable(
                LauncherError::ResourceNotFound(format!(
                    "{} (no version recorded for {})",
                    config.library_resource(&expected),
                    helper
                ))
                .to_string(),
            )
        })?;

    let resource =
        config.library_resource(&artifact_filename(&helper.artifact_id, version, "jar"));
    let extracted = extractor
        .extract(&resource, &helper.artifact_id, ".jar", files)
        .map_err(|e| unavailable(e.to_string()))?;
    Ok(extracted.destination)
}

/// Extract every configured helper, in order.
pub fn load_helpers(
    table: &DependencyVersionTable,
    extractor: &ResourceExtractor<'_>,
    files: &mut ExtractedFiles,
    config: &LauncherConfig,
) -> LauncherResult<ArtifactLoader> {
    let archives = config
        .daemon_helpers
        .iter()
        .map(|helper| load_helper(helper, table, extractor, files, config))
        .collect::<LauncherResult<Vec<_>>>()?;
    Ok(ArtifactLoader::new(archives))
}

/// Run the daemon step: load the helpers, announce the fork and detach.
#[cfg(unix)]
pub fn daemonize(
    table: &DependencyVersionTable,
    extractor: &ResourceExtractor<'_>,
    files: &mut ExtractedFiles,
    config: &LauncherConfig,
    has_logfile: bool,
) -> LauncherResult<()> {
    use std::io::Write;

    let helpers = load_helpers(table, extractor, files, config)?;
    let daemon = ForkDaemon::bind(&helpers, config)?;

    if !daemon.is_daemonized() {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "Forking into background to run as a daemon.");
        if !has_logfile {
            let _ = writeln!(out, "Use --logfile to redirect output to a file");
        }
        let _ = out.flush();
    }
    daemon.detach(true)
}

#[cfg(not(unix))]
pub fn daemonize(
    _table: &DependencyVersionTable,
    _extractor: &ResourceExtractor<'_>,
    _files: &mut ExtractedFiles,
    _config: &LauncherConfig,
    _has_logfile: bool,
) -> LauncherResult<()> {
    info!("Daemon mode is not available on this platform, staying in the foreground");
    Ok(())
}

/// Classic double-step detach: fork, new session, neutral working
/// directory and umask, standard streams on the null device.
#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct ForkDaemon {
    marker_env: String,
}

#[cfg(unix)]
impl ForkDaemon {
    /// Bind the daemon capability from the loaded helpers.
    pub fn bind(helpers: &ArtifactLoader, config: &LauncherConfig) -> LauncherResult<Self> {
        let archive = helpers
            .load_class(&config.daemon_class)
            .map_err(|e| LauncherError::DaemonHelperUnavailable {
                helper: config.daemon_class.clone(),
                reason: e.to_string(),
            })?;
        debug!("Daemon support bound from {:?}", archive);
        Ok(Self {
            marker_env: config.daemon_marker_env.clone(),
        })
    }
}

#[cfg(unix)]
impl Daemonizable for ForkDaemon {
    fn is_daemonized(&self) -> bool {
        std::env::var_os(&self.marker_env).is_some()
    }

    fn detach(&self, close_stdio: bool) -> LauncherResult<()> {
        use nix::sys::stat::{umask, Mode};
        use nix::unistd::{chdir, fork, setsid, ForkResult};

        let errno = |what: &str, e: nix::errno::Errno| {
            LauncherError::Other(format!("{} failed: {}", what, e))
        };

        if !self.is_daemonized() {
            // SAFETY: the bootstrap calls this before any other thread exists.
            match unsafe { fork() }.map_err(|e| errno("fork", e))? {
                ForkResult::Parent { child } => {
                    debug!("Daemon child is {}", child);
                    // Skip destructors: extracted files now belong to the child.
                    std::process::exit(0);
                }
                ForkResult::Child => {
                    setsid().map_err(|e| errno("setsid", e))?;
                }
            }
        } else if let Err(e) = setsid() {
            // Already a session leader.
            debug!("setsid skipped: {}", e);
        }

        chdir("/").map_err(|e| errno("chdir", e))?;
        umask(Mode::from_bits_truncate(0o022));
        if close_stdio {
            redirect_stdio_to_null()?;
        }
        std::env::set_var(&self.marker_env, "1");
        info!("Running as daemon, pid {}", std::process::id());
        Ok(())
    }
}

#[cfg(unix)]
fn redirect_stdio_to_null() -> LauncherResult<()> {
    use std::fs::OpenOptions;
    use std::os::fd::AsRawFd;

    let null = OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/null")
        .map_err(|source| LauncherError::Io {
            path: PathBuf::from("/dev/null"),
            source,
        })?;
    for fd in [0, 1, 2] {
        nix::unistd::dup2(null.as_raw_fd(), fd)
            .map_err(|e| LauncherError::Other(format!("dup2 onto {} failed: {}", fd, e)))?;
    }
    Ok(())
}
