// ─── Log Redirection ───
// Structured logging setup plus the rotation-aware log file that replaces
// the terminal when `--logfile` is given.

mod console;
mod rotation;
mod sink;

pub use console::{Console, ConsoleWriter};
pub use sink::LogSink;

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::core::error::{LauncherError, LauncherResult};

/// Install the global tracing subscriber writing through `console`.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(console: &Console) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(console.clone())
        .with_ansi(false)
        .try_init();
}

/// Replace the process standard output and error with an append-mode
/// log file at `path`, reopened on SIGALRM. Performed once per process.
///
/// Must be called from within a tokio runtime: the rotation listener is
/// registered before the file is opened.
pub fn redirect(console: &Console, path: &Path) -> LauncherResult<Arc<LogSink>> {
    if console.is_redirected() {
        return Err(LauncherError::Other("output is already redirected".into()));
    }
    let rotation = rotation::listen(path)?;
    console.preserve_stderr();
    let sink = Arc::new(LogSink::open_for_process(path)?);
    console.attach(Arc::clone(&sink))?;
    rotation.follow(Arc::clone(&sink));
    Ok(sink)
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use nix::sys::signal::{raise, Signal};

    use super::*;
    use crate::core::testing::{in_isolation, run_isolated};

    #[test]
    fn process_output_follows_the_log_file_across_rotation() {
        if !in_isolation() {
            run_isolated(
                module_path!(),
                "process_output_follows_the_log_file_across_rotation",
            );
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jenkins.log");
        let rotated = dir.path().join("jenkins.log.1");
        let console = Console::new();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            redirect(&console, &path).unwrap();
            println!("stdout before rotation");
            eprintln!("stderr before rotation");
            console.write_output(b"runtime before rotation\n").unwrap();

            std::fs::rename(&path, &rotated).unwrap();
            raise(Signal::SIGALRM).unwrap();
            for _ in 0..100 {
                if path.exists() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            assert!(path.exists(), "log file was not reopened");

            // Waits on the sink lock until the descriptors are switched.
            console.write_output(b"runtime after rotation\n").unwrap();
            println!("stdout after rotation");
            eprintln!("stderr after rotation");
            assert!(redirect(&console, &path).is_err());
        });

        let before = std::fs::read_to_string(&rotated).unwrap();
        let after = std::fs::read_to_string(&path).unwrap();
        for line in ["stdout", "stderr", "runtime"] {
            assert!(before.contains(&format!("{line} before rotation\n")), "{before}");
            assert!(!before.contains(&format!("{line} after rotation")), "{before}");
            assert!(after.contains(&format!("{line} after rotation\n")), "{after}");
            assert!(!after.contains(&format!("{line} before rotation")), "{after}");
        }
    }
}
