// ─── Jenkins Launcher Core ───
// Building blocks of the bootstrap sequence for the self-contained server
// archive.
//
// Architecture:
//   core/
//     args/     : launcher options, runtime argument list
//     archive/  : zip view of the running image, extraction, self location
//     maven/    : dependency manifest, version table
//     home/     : home directory lookup chain, naming context
//     daemon/   : helper loading, fork into background
//     logging/  : tracing setup, redirected log file, rotation
//     loader/   : class lookup in extracted archives
//     java/     : Java runtime detection
//     dispatch/ : runtime entry point, hooks, child process
//     config/   : launcher settings, process properties
//     shutdown/ : termination signals, blocked until listened for

pub mod archive;
pub mod args;
pub mod config;
pub mod daemon;
pub mod dispatch;
pub mod error;
pub mod home;
pub mod java;
pub mod loader;
pub mod logging;
pub mod maven;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod testing;
