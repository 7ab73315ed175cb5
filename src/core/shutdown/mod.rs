// ─── Shutdown Signals ───
// Hangup, interrupt and terminate end the launcher through its normal
// return path, so extracted files are deleted and the runtime is stopped.
// The signals stay blocked from the first bootstrap step until the async
// listeners exist; anything that arrives in between is held pending and
// handed to the listeners.

use tracing::debug;

use crate::core::error::LauncherResult;

/// Signals that stop the launcher.
#[cfg(unix)]
const SHUTDOWN_SIGNALS: [nix::sys::signal::Signal; 3] = [
    nix::sys::signal::Signal::SIGHUP,
    nix::sys::signal::Signal::SIGINT,
    nix::sys::signal::Signal::SIGTERM,
];

#[cfg(unix)]
fn shutdown_set() -> nix::sys::signal::SigSet {
    let mut set = nix::sys::signal::SigSet::empty();
    for signal in SHUTDOWN_SIGNALS {
        set.add(signal);
    }
    set
}

/// Holds the shutdown signals blocked on the calling thread until dropped.
///
/// Threads started while the guard is alive inherit the blocked mask, so
/// pending signals can only be taken by this thread once it unblocks.
/// Child processes start with an empty mask.
#[derive(Debug)]
pub struct SignalGuard {
    _private: (),
}

impl SignalGuard {
    #[cfg(unix)]
    pub fn block() -> LauncherResult<Self> {
        use crate::core::error::LauncherError;

        shutdown_set().thread_block().map_err(|e| {
            LauncherError::Other(format!("cannot block shutdown signals: {}", e))
        })?;
        Ok(Self { _private: () })
    }

    #[cfg(not(unix))]
    pub fn block() -> LauncherResult<Self> {
        Ok(Self { _private: () })
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Err(e) = shutdown_set().thread_unblock() {
            tracing::warn!("Cannot unblock shutdown signals: {}", e);
        }
    }
}

/// Listener for the shutdown signals. Signals received after
/// [`Shutdown::install`] are kept until [`Shutdown::recv`] is awaited.
#[cfg(unix)]
#[derive(Debug)]
pub struct Shutdown {
    hangup: tokio::signal::unix::Signal,
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Shutdown {
    /// Register the listeners. Must be called from within a tokio runtime.
    pub fn install() -> LauncherResult<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let shutdown = Self {
            hangup: signal(SignalKind::hangup())?,
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        };
        debug!("Listening for SIGHUP, SIGINT and SIGTERM");
        Ok(shutdown)
    }

    /// Wait for the next shutdown signal and return its number.
    pub async fn recv(&mut self) -> i32 {
        use nix::sys::signal::Signal;

        tokio::select! {
            Some(()) = self.hangup.recv() => Signal::SIGHUP as i32,
            Some(()) = self.interrupt.recv() => Signal::SIGINT as i32,
            Some(()) = self.terminate.recv() => Signal::SIGTERM as i32,
            else => std::future::pending().await,
        }
    }
}

/// Ctrl-C is the only shutdown signal on this platform.
#[cfg(not(unix))]
#[derive(Debug)]
pub struct Shutdown {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(not(unix))]
impl Shutdown {
    pub fn install() -> LauncherResult<Self> {
        let shutdown = Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        };
        debug!("Listening for Ctrl-C");
        Ok(shutdown)
    }

    pub async fn recv(&mut self) -> i32 {
        match self.ctrl_c.recv().await {
            Some(()) => 2,
            None => std::future::pending().await,
        }
    }
}

impl Shutdown {
    /// A signal that already arrived, without waiting for one.
    pub async fn pending(&mut self) -> Option<i32> {
        // Lets the signal driver hand over anything it has already read.
        tokio::task::yield_now().await;
        tokio::select! {
            biased;
            signal = self.recv() => Some(signal),
            () = std::future::ready(()) => None,
        }
    }
}
