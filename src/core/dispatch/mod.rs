// ─── Entry Point Dispatch ───
// Hands control to the bundled runtime. The runtime's launcher class is
// bound from the extracted runtime archive, configuration hooks travel as
// JVM system properties, and the launcher waits for the runtime to exit.
// A shutdown signal is passed on to the runtime, which gets a grace period
// to stop before it is killed.

mod usage;

pub use usage::{session_cookie_name, usage_banner};

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::core::config::{LauncherConfig, ProcessProperties};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::java::JavaInstallation;
use crate::core::loader::ArtifactLoader;
use crate::core::logging::Console;
use crate::core::shutdown::Shutdown;

/// A runtime that can be configured and started.
#[async_trait]
pub trait EntryPoint: Send {
    /// Help text the runtime prints for `--usage`.
    fn set_usage(&mut self, usage: String);

    /// Name of the HTTP session cookie. Fails with
    /// [`LauncherError::HookUnsupported`] when the runtime has no such hook.
    fn set_session_cookie_name(&mut self, name: String) -> LauncherResult<()>;

    /// Run to completion and return the exit code. A signal from
    /// `shutdown` stops the run with `128 + signal`.
    async fn run(&mut self, args: Vec<String>, shutdown: &mut Shutdown) -> LauncherResult<i32>;
}

/// Inject the hooks, then run the entry point with `args`.
pub async fn dispatch<E>(
    entry: &mut E,
    usage: String,
    cookie_prefix: &str,
    args: Vec<String>,
    shutdown: &mut Shutdown,
) -> LauncherResult<i32>
where
    E: EntryPoint + ?Sized,
{
    entry.set_usage(usage);
    match entry.set_session_cookie_name(session_cookie_name(cookie_prefix)) {
        Ok(()) => {}
        Err(LauncherError::HookUnsupported(hook)) => {
            debug!("Runtime has no {} hook, keeping its default", hook);
        }
        Err(e) => return Err(e),
    }
    entry.run(args, shutdown).await
}

/// System properties every runtime start carries.
pub fn prepare_properties(properties: &mut ProcessProperties, warfile: &Path) {
    properties.set("java.awt.headless", "true");
    properties.set_if_absent("hudson.diyChunking", "true");
    properties.set("executable-war", warfile.display().to_string());
}

/// Remove `<temp_root>/<work_dir>/<archive file name>`, the exploded
/// copy a previous run of the runtime may have left behind.
pub fn clear_stale_work_dir(temp_root: &Path, work_dir: &str, warfile: &Path) -> Option<PathBuf> {
    let stale = temp_root.join(work_dir).join(warfile.file_name()?);
    if !stale.exists() {
        return None;
    }
    match std::fs::remove_dir_all(&stale) {
        Ok(()) => debug!("Removed stale work directory {:?}", stale),
        Err(e) => warn!("Cannot remove stale work directory {:?}: {}", stale, e),
    }
    Some(stale)
}

/// The runtime launched as a Java child process.
#[derive(Debug, Clone)]
pub struct JavaEntryPoint {
    java: PathBuf,
    classpath: OsString,
    main_class: String,
    /// Set when the runtime archive provides the session class.
    session_class: Option<String>,
    properties: ProcessProperties,
    console: Console,
    /// Time between passing on a shutdown signal and killing the runtime.
    grace: Duration,
}

impl JavaEntryPoint {
    /// Bind the runtime's launcher class from `loader`.
    pub fn bind(
        loader: &ArtifactLoader,
        config: &LauncherConfig,
        java: &JavaInstallation,
        properties: ProcessProperties,
        console: Console,
    ) -> LauncherResult<Self> {
        let archive = loader.load_class(&config.runtime_main_class)?;
        debug!("Runtime launcher {} bound from {:?}", config.runtime_main_class, archive);

        let session_class = loader
            .find_class(&config.runtime_session_class)?
            .map(|_| config.runtime_session_class.clone());

        Ok(Self {
            java: java.path.clone(),
            classpath: loader.classpath()?,
            main_class: config.runtime_main_class.clone(),
            session_class,
            properties,
            console,
            grace: Duration::from_secs(config.shutdown_grace_secs),
        })
    }

    pub fn properties(&self) -> &ProcessProperties {
        &self.properties
    }

    /// Everything after the Java binary on the command line.
    pub fn command_line(&self, args: &[String]) -> Vec<OsString> {
        let mut line: Vec<OsString> = Vec::new();
        line.extend(self.properties.jvm_args().iter().map(OsString::from));
        line.extend(self.properties.as_jvm_definitions().into_iter().map(OsString::from));
        line.push("-cp".into());
        line.push(self.classpath.clone());
        line.push(self.main_class.clone().into());
        line.extend(args.iter().map(OsString::from));
        line
    }
}

#[async_trait]
impl EntryPoint for JavaEntryPoint {
    fn set_usage(&mut self, usage: String) {
        let name = format!("{}.USAGE", self.main_class);
        self.properties.set(&name, usage);
    }

    fn set_session_cookie_name(&mut self, name: String) -> LauncherResult<()> {
        let class = self
            .session_class
            .as_deref()
            .ok_or_else(|| LauncherError::HookUnsupported("SESSION_COOKIE_NAME".into()))?;
        let property = format!("{}.SESSION_COOKIE_NAME", class);
        self.properties.set(&property, name);
        Ok(())
    }

    async fn run(&mut self, args: Vec<String>, shutdown: &mut Shutdown) -> LauncherResult<i32> {
        let redirected = self.console.is_redirected();
        let output = || if redirected { Stdio::piped() } else { Stdio::inherit() };

        let mut cmd = Command::new(&self.java);
        cmd.args(self.command_line(&args))
            .stdin(Stdio::inherit())
            .stdout(output())
            .stderr(output())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            LauncherError::JavaExecution(format!("cannot start {}: {}", self.java.display(), e))
        })?;
        info!("Started {} (pid {:?})", self.main_class, child.id());

        let mut pumps = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            pumps.push(tokio::spawn(pump(stdout, self.console.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(tokio::spawn(pump(stderr, self.console.clone())));
        }

        let outcome = tokio::select! {
            status = child.wait() => Ok(status),
            signal = shutdown.recv() => Err(signal),
        };
        let code = match outcome {
            Ok(status) => {
                exit_code(status.map_err(|e| LauncherError::JavaExecution(e.to_string()))?)
            }
            Err(signal) => {
                warn!("Received signal {}, stopping {}", signal, self.main_class);
                self.stop(&mut child, signal).await;
                128 + signal
            }
        };

        for task in pumps {
            let _ = task.await;
        }
        info!("{} exited with code {}", self.main_class, code);
        Ok(code)
    }
}

impl JavaEntryPoint {
    /// Pass `signal` on to the runtime and wait for it to exit, killing it
    /// once the grace period is over.
    async fn stop(&self, child: &mut Child, signal: i32) {
        if let Err(e) = forward(child, signal) {
            warn!("Cannot pass signal {} to the runtime: {}", signal, e);
        }
        match tokio::time::timeout(self.grace, child.wait()).await {
            Ok(Ok(status)) => debug!("{} stopped: {}", self.main_class, status),
            Ok(Err(e)) => warn!("Cannot wait for the runtime: {}", e),
            Err(_) => {
                warn!(
                    "{} still running after {:?}, killing it",
                    self.main_class, self.grace
                );
                if let Err(e) = child.kill().await {
                    warn!("Cannot kill the runtime: {}", e);
                }
            }
        }
    }
}

#[cfg(unix)]
fn forward(child: &Child, signal: i32) -> std::io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    // No id once the child has been reaped.
    let Some(id) = child.id() else {
        return Ok(());
    };
    let signal = Signal::try_from(signal)?;
    kill(Pid::from_raw(id as i32), signal)?;
    Ok(())
}

#[cfg(not(unix))]
fn forward(child: &mut Child, _signal: i32) -> std::io::Result<()> {
    child.start_kill()
}

/// Copy child output line by line, so stdout and stderr lines never
/// interleave mid-line in the log.
async fn pump<R>(reader: R, console: Console)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                if let Err(e) = console.write_output(&line) {
                    warn!("Dropping runtime output: {}", e);
                }
            }
            Err(e) => {
                debug!("Runtime output closed: {}", e);
                break;
            }
        }
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
