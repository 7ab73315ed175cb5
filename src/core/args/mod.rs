// ─── Argument Router ───
// Splits launcher-private options off the command line and rebuilds the
// argument list handed to the runtime.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::core::home::HomeDirectory;

const EXTRACTED_FILES_FOLDER: &str = "--extractedFilesFolder";
const DAEMON: &str = "--daemon";
const LOGFILE: &str = "--logfile";
const WEBROOT: &str = "--webroot=";
const WARFILE: &str = "--warfile=";
const VERSION: &str = "--version";

/// Launcher options parsed from the raw command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Where extracted files go instead of the temp directory.
    pub extracted_files_folder: Option<PathBuf>,
    pub daemon: bool,
    pub logfile: Option<PathBuf>,
    pub version_requested: bool,
    /// Arguments for the runtime, launcher options removed, order kept.
    residual: Vec<String>,
}

impl LaunchOptions {
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let raw: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut options = Self::default();

        for arg in &raw {
            if let Some(dir) = arg.strip_prefix("--extractedFilesFolder=") {
                options.extracted_files_folder = validate_folder(dir);
            } else if arg.starts_with(DAEMON) {
                options.daemon = true;
            } else if let Some(path) = arg.strip_prefix("--logfile=") {
                if options.logfile.is_none() {
                    options.logfile = Some(absolute(Path::new(path)));
                }
            }
        }

        options.residual = raw
            .into_iter()
            .filter(|arg| !is_launcher_option(arg))
            .collect();
        options.version_requested = options.residual.iter().any(|arg| arg == VERSION);
        options
    }

    pub fn has_webroot(&self) -> bool {
        self.residual.iter().any(|arg| arg.starts_with(WEBROOT))
    }

    /// Final runtime arguments: `--warfile=` first, the residual options,
    /// and `--webroot=<home>/war` when none was given.
    ///
    /// `home` is only consulted when a webroot has to be synthesized.
    pub fn runtime_arguments<F>(&self, warfile: &Path, home: F) -> Vec<String>
    where
        F: FnOnce() -> HomeDirectory,
    {
        let mut arguments = Vec::with_capacity(self.residual.len() + 2);
        arguments.push(format!("{}{}", WARFILE, warfile.display()));
        arguments.extend(self.residual.iter().cloned());
        if !self.has_webroot() {
            let home = home();
            arguments.push(format!("{}{}", WEBROOT, home.path.join("war").display()));
        }
        arguments
    }
}

fn is_launcher_option(arg: &str) -> bool {
    arg.starts_with(DAEMON) || arg.starts_with(LOGFILE) || arg.starts_with(EXTRACTED_FILES_FOLDER)
}

fn validate_folder(raw: &str) -> Option<PathBuf> {
    let dir = absolute(Path::new(raw));
    if dir.is_dir() {
        Some(dir)
    } else {
        warn!(
            "The extractedFilesFolder value {:?} is not a directory. Ignoring.",
            raw
        );
        None
    }
}

/// Daemon detachment moves the working directory to `/`, so relative
/// launcher paths are pinned now.
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> HomeDirectory {
        HomeDirectory::new("/var/lib/jenkins", "test")
    }

    #[test]
    fn launcher_options_are_consumed() {
        let dir = tempfile::tempdir().unwrap();
        let folder = format!("--extractedFilesFolder={}", dir.path().display());
        let opts = LaunchOptions::parse([
            "--httpPort=9090",
            "--daemon",
            folder.as_str(),
            "--logfile=/tmp/out.log",
            "--prefix=/ci",
        ]);

        assert!(opts.daemon);
        assert_eq!(opts.logfile, Some(PathBuf::from("/tmp/out.log")));
        assert_eq!(opts.extracted_files_folder.as_deref(), Some(dir.path()));
        assert_eq!(opts.residual, ["--httpPort=9090", "--prefix=/ci"]);
    }

    #[test]
    fn logfile_never_reaches_the_runtime() {
        let opts = LaunchOptions::parse(["--logfile=/tmp/x.log", "--logfile", "--httpPort=1"]);
        let args = opts.runtime_arguments(Path::new("/opt/jenkins.war"), home);
        assert!(args.iter().all(|a| !a.starts_with("--logfile") && !a.contains("/tmp/x.log")));
        assert_eq!(opts.logfile, Some(PathBuf::from("/tmp/x.log")));
    }

    #[test]
    fn first_logfile_wins() {
        let opts = LaunchOptions::parse(["--logfile=/tmp/a.log", "--logfile=/tmp/b.log"]);
        assert_eq!(opts.logfile, Some(PathBuf::from("/tmp/a.log")));
    }

    #[test]
    fn invalid_extraction_folder_is_discarded() {
        let opts = LaunchOptions::parse([
            "--extractedFilesFolder=/not/a/dir",
            "--logfile=/tmp/out.log",
        ]);
        assert_eq!(opts.extracted_files_folder, None);
        assert!(opts.residual.is_empty());
    }

    #[test]
    fn relative_logfile_is_made_absolute() {
        let opts = LaunchOptions::parse(["--logfile=logs/jenkins.log"]);
        let path = opts.logfile.unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("logs/jenkins.log"));
    }

    #[test]
    fn warfile_first_and_webroot_synthesized() {
        let opts = LaunchOptions::parse(["--httpPort=8081"]);
        let args = opts.runtime_arguments(Path::new("/opt/jenkins.war"), home);
        assert_eq!(
            args,
            [
                "--warfile=/opt/jenkins.war".to_string(),
                "--httpPort=8081".to_string(),
                format!("--webroot={}", Path::new("/var/lib/jenkins").join("war").display()),
            ]
        );
    }

    #[test]
    fn explicit_webroot_is_not_duplicated() {
        let opts = LaunchOptions::parse(["--webroot=/srv/war"]);
        let args = opts.runtime_arguments(Path::new("/opt/jenkins.war"), || {
            panic!("home directory must not be resolved")
        });
        assert_eq!(
            args.iter().filter(|a| a.starts_with("--webroot=")).count(),
            1
        );
        assert!(args.contains(&"--webroot=/srv/war".to_string()));
    }

    #[test]
    fn version_flag_is_detected() {
        assert!(LaunchOptions::parse(["--version"]).version_requested);
        assert!(!LaunchOptions::parse(["--versions"]).version_requested);
    }
}
