use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, instrument};

use crate::core::config::LauncherConfig;
use crate::core::error::{LauncherError, LauncherResult};

/// A Java runtime found on this machine.
#[derive(Debug, Clone)]
pub struct JavaInstallation {
    pub path: PathBuf,
    pub version: String,
    pub major: u32,
    pub vendor: String,
}

fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// `$JAVA_HOME/bin/java`, else the first `java` on `PATH`.
pub fn find_java_binary() -> Option<PathBuf> {
    find_java_binary_in(
        std::env::var_os("JAVA_HOME").map(PathBuf::from),
        std::env::var_os("PATH"),
    )
}

fn find_java_binary_in(java_home: Option<PathBuf>, path_var: Option<OsString>) -> Option<PathBuf> {
    if let Some(home) = java_home.filter(|h| !h.as_os_str().is_empty()) {
        let candidate = home.join("bin").join(java_exe());
        if candidate.is_file() {
            return Some(candidate);
        }
        debug!("JAVA_HOME has no {:?}", candidate);
    }
    std::env::split_paths(&path_var?)
        .map(|dir| dir.join(java_exe()))
        .find(|candidate| candidate.is_file())
}

/// Run `java -version` and parse what it reports.
#[instrument]
pub fn probe_java(path: &Path) -> LauncherResult<JavaInstallation> {
    let output = Command::new(path)
        .arg("-version")
        .output()
        .map_err(|e| LauncherError::JavaExecution(format!("{}: {}", path.display(), e)))?;

    let version_output = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );
    parse_output(path, &version_output).ok_or_else(|| {
        LauncherError::JavaExecution(format!(
            "{} reported no version: {}",
            path.display(),
            version_output.lines().next().unwrap_or("").trim()
        ))
    })
}

/// Locate and probe Java, refusing runtimes older than the configured minimum.
pub fn require_java(config: &LauncherConfig) -> LauncherResult<JavaInstallation> {
    let path = find_java_binary()
        .ok_or_else(|| LauncherError::JavaNotFound(PathBuf::from(java_exe())))?;
    let java = probe_java(&path)?;
    if java.major < config.min_java_major {
        return Err(LauncherError::UnsupportedJava {
            product: config.product_name.clone(),
            path: java.path,
            found: java.major,
            required: config.min_java_major,
        });
    }
    info!("Using Java {} ({}) at {:?}", java.version, java.vendor, java.path);
    Ok(java)
}

fn parse_output(path: &Path, version_output: &str) -> Option<JavaInstallation> {
    debug!(
        "Probing {:?}: {}",
        path,
        version_output.trim_start().lines().next().unwrap_or("")
    );
    let version = parse_version_string(version_output)?;
    let major = parse_major_version(&version);
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

    Some(JavaInstallation {
        path: canonical,
        major,
        vendor: parse_vendor(version_output),
        version,
    })
}

fn parse_major_version(version: &str) -> u32 {
    let first_part = version.split('.').next().unwrap_or("0");
    let major: u32 = first_part.parse().unwrap_or(0);

    if major == 1 {
        version
            .split('.')
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(major)
    } else {
        major
    }
}

/// First double-quoted token, e.g. `openjdk version "17.0.8" 2023-07-18`.
fn parse_version_string(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let start = line.find('"')?;
        let end = line[start + 1..].find('"')?;
        Some(line[start + 1..start + 1 + end].to_string())
    })
}

fn parse_vendor(output: &str) -> String {
    for line in output.lines() {
        if line.contains("Temurin") {
            return "Temurin".to_string();
        }
        if line.contains("OpenJDK") {
            return "OpenJDK".to_string();
        }
        if line.contains("HotSpot") {
            return "HotSpot".to_string();
        }
    }
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_major_modern() {
        assert_eq!(parse_major_version("17.0.8"), 17);
        assert_eq!(parse_major_version("21"), 21);
    }

    #[test]
    fn test_parse_major_legacy() {
        assert_eq!(parse_major_version("1.8.0_392"), 8);
    }

    #[test]
    fn version_string_from_probe_output() {
        let output = "openjdk version \"11.0.21\" 2023-10-17\n\
                      OpenJDK Runtime Environment Temurin-11.0.21+9 (build 11.0.21+9)\n";
        let java = parse_output(Path::new("/nonexistent/java"), output).unwrap();
        assert_eq!(java.version, "11.0.21");
        assert_eq!(java.major, 11);
        assert_eq!(java.vendor, "Temurin");
        assert!(parse_output(Path::new("java"), "Error: no JVM").is_none());
    }

    #[test]
    fn java_home_wins_over_path() {
        let home = tempfile::tempdir().unwrap();
        let on_path = tempfile::tempdir().unwrap();
        std::fs::create_dir(home.path().join("bin")).unwrap();
        std::fs::write(home.path().join("bin").join(java_exe()), "").unwrap();
        std::fs::write(on_path.path().join(java_exe()), "").unwrap();
        let path_var = std::env::join_paths([on_path.path()]).unwrap();

        assert_eq!(
            find_java_binary_in(Some(home.path().to_path_buf()), Some(path_var.clone())),
            Some(home.path().join("bin").join(java_exe()))
        );
        assert_eq!(
            find_java_binary_in(Some(PathBuf::from("/nonexistent")), Some(path_var)),
            Some(on_path.path().join(java_exe()))
        );
        assert_eq!(find_java_binary_in(None, None), None);
    }
}
