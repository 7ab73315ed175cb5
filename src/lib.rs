pub mod bootstrap;
pub mod core;

use crate::core::logging::{self, Console};

/// Launcher entry: set up logging, run the bootstrap, return the exit code.
pub fn run() -> i32 {
    let console = Console::new();
    logging::init_tracing(&console);

    tracing::debug!("jenkins-launcher {} starting", env!("CARGO_PKG_VERSION"));

    bootstrap::Bootstrap::new(console).run_to_exit(std::env::args().skip(1))
}
