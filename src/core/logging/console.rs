use std::fs::File;
use std::io::{self, Write};
use std::sync::{Arc, OnceLock};

use tracing_subscriber::fmt::MakeWriter;

use super::LogSink;
use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Default)]
struct ConsoleState {
    sink: OnceLock<Arc<LogSink>>,
    original_stderr: OnceLock<File>,
}

/// Where the launcher's own output goes.
///
/// Starts out on the terminal and is switched to a [`LogSink`] at most
/// once. Cloning shares the same state, so every component holding a
/// handle follows the switch.
#[derive(Debug, Clone, Default)]
pub struct Console {
    state: Arc<ConsoleState>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route all further output through `sink`.
    pub fn attach(&self, sink: Arc<LogSink>) -> LauncherResult<()> {
        self.state
            .sink
            .set(sink)
            .map_err(|_| LauncherError::Other("output is already redirected".into()))
    }

    pub fn sink(&self) -> Option<&Arc<LogSink>> {
        self.state.sink.get()
    }

    pub fn is_redirected(&self) -> bool {
        self.state.sink.get().is_some()
    }

    /// Keep a handle on the terminal's error stream before it is replaced.
    pub(crate) fn preserve_stderr(&self) {
        if self.state.original_stderr.get().is_some() {
            return;
        }
        if let Some(file) = duplicate_stderr() {
            let _ = self.state.original_stderr.set(file);
        }
    }

    /// Raw bytes on behalf of the runtime (its stdout/stderr).
    pub fn write_output(&self, bytes: &[u8]) -> io::Result<()> {
        match self.sink() {
            Some(sink) => sink.write_bytes(bytes),
            None => {
                let mut out = io::stdout().lock();
                out.write_all(bytes)?;
                out.flush()
            }
        }
    }

    /// One line on the pre-redirection error stream, whenever it is still
    /// reachable.
    pub fn report_fatal(&self, message: &str) {
        let line = format!("{}\n", message);
        if let Some(mut original) = self.state.original_stderr.get() {
            let _ = original.write_all(line.as_bytes());
        } else {
            let _ = io::stderr().write_all(line.as_bytes());
        }
    }
}

#[cfg(unix)]
fn duplicate_stderr() -> Option<File> {
    use std::os::fd::AsFd;

    io::stderr()
        .as_fd()
        .try_clone_to_owned()
        .ok()
        .map(File::from)
}

#[cfg(not(unix))]
fn duplicate_stderr() -> Option<File> {
    // Standard streams are never replaced at the OS level here.
    None
}

/// Writer handed to the tracing formatter for one event.
pub enum ConsoleWriter {
    Stdout(io::Stdout),
    Sink(Arc<LogSink>),
}

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ConsoleWriter::Stdout(out) => out.write(buf),
            ConsoleWriter::Sink(sink) => sink.write_bytes(buf).map(|()| buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ConsoleWriter::Stdout(out) => out.flush(),
            ConsoleWriter::Sink(sink) => sink.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for Console {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        match self.sink() {
            Some(sink) => ConsoleWriter::Sink(Arc::clone(sink)),
            None => ConsoleWriter::Stdout(io::stdout()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writers_follow_the_switch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let console = Console::new();
        let shared = console.clone();
        assert!(matches!(shared.make_writer(), ConsoleWriter::Stdout(_)));

        console
            .attach(Arc::new(LogSink::open(&path).unwrap()))
            .unwrap();
        shared.write_output(b"runtime line\n").unwrap();
        let mut writer = shared.make_writer();
        writer.write_all(b"log line\n").unwrap();
        writer.flush().unwrap();

        assert!(shared.is_redirected());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "runtime line\nlog line\n"
        );
    }

    #[test]
    fn redirect_happens_once() {
        let dir = tempfile::tempdir().unwrap();
        let console = Console::new();
        console
            .attach(Arc::new(LogSink::open(&dir.path().join("a.log")).unwrap()))
            .unwrap();
        let second = console.attach(Arc::new(LogSink::open(&dir.path().join("b.log")).unwrap()));
        assert!(second.is_err());
        assert_eq!(console.sink().unwrap().path(), dir.path().join("a.log"));
    }
}
