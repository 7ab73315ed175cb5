mod properties;

pub use properties::ProcessProperties;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::core::archive::SelfArchive;

/// Archive entry holding optional overrides for [`LauncherConfig`].
pub const CONFIG_RESOURCE: &str = "META-INF/launcher.json";

/// A `group:artifact` pair naming one helper library in the dependency manifest.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HelperCoordinate {
    pub group_id: String,
    pub artifact_id: String,
}

impl HelperCoordinate {
    pub fn new(group_id: &str, artifact_id: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
        }
    }
}

impl std::fmt::Display for HelperCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// Everything about the packaged product that the bootstrap needs to know.
///
/// Defaults describe the stock archive layout; an archive may ship
/// `META-INF/launcher.json` to override individual fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub product_name: String,
    /// Main manifest attribute carrying the product version.
    pub version_attribute: String,
    /// Home variable names, primary first.
    pub home_names: Vec<String>,
    pub legacy_home_dir: String,
    pub default_home_dir: String,
    /// File next to the archive providing naming-context bindings.
    pub naming_context_file: String,
    pub dependency_manifest: String,
    pub library_dir: String,
    pub runtime_resource: String,
    pub runtime_main_class: String,
    pub runtime_session_class: String,
    pub runtime_work_dir: String,
    pub session_cookie_prefix: String,
    pub daemon_helpers: Vec<HelperCoordinate>,
    pub daemon_class: String,
    pub daemon_marker_env: String,
    /// Prefix for temp copies of the archive itself.
    pub self_copy_prefix: String,
    pub java_opts_env: String,
    pub min_java_major: u32,
    /// Seconds the runtime gets to exit after a forwarded shutdown signal.
    pub shutdown_grace_secs: u64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            product_name: "Jenkins".to_string(),
            version_attribute: "Jenkins-Version".to_string(),
            home_names: vec!["JENKINS_HOME".to_string(), "HUDSON_HOME".to_string()],
            legacy_home_dir: ".hudson".to_string(),
            default_home_dir: ".jenkins".to_string(),
            naming_context_file: "naming-context.json".to_string(),
            dependency_manifest: "WEB-INF/classes/dependencies.txt".to_string(),
            library_dir: "WEB-INF/lib".to_string(),
            runtime_resource: "winstone.jar".to_string(),
            runtime_main_class: "winstone.Launcher".to_string(),
            runtime_session_class: "winstone.WinstoneSession".to_string(),
            runtime_work_dir: "winstone".to_string(),
            session_cookie_prefix: "JSESSIONID.".to_string(),
            daemon_helpers: vec![
                HelperCoordinate::new("net.java.dev.jna", "jna"),
                HelperCoordinate::new("org.kohsuke", "akuma"),
            ],
            daemon_class: "com.sun.akuma.Daemon".to_string(),
            daemon_marker_env: "JENKINS_LAUNCHER_DAEMONIZED".to_string(),
            self_copy_prefix: "jenkins".to_string(),
            java_opts_env: "JAVA_OPTS".to_string(),
            min_java_major: 8,
            shutdown_grace_secs: 30,
        }
    }
}

impl LauncherConfig {
    /// Load overrides shipped inside the archive, falling back to defaults.
    ///
    /// A malformed override file is reported and ignored rather than
    /// blocking startup.
    pub fn load(archive: &SelfArchive) -> Self {
        match archive.read_to_string(CONFIG_RESOURCE) {
            Ok(Some(raw)) => match serde_json::from_str::<LauncherConfig>(&raw) {
                Ok(config) => {
                    debug!("Loaded launcher overrides from {}", CONFIG_RESOURCE);
                    config
                }
                Err(e) => {
                    warn!("Ignoring malformed {}: {}", CONFIG_RESOURCE, e);
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("Cannot read {}: {}", CONFIG_RESOURCE, e);
                Self::default()
            }
        }
    }

    /// Archive path of a library jar, e.g. `WEB-INF/lib/akuma-1.9.jar`.
    pub fn library_resource(&self, file_name: &str) -> String {
        format!("{}/{}", self.library_dir.trim_end_matches('/'), file_name)
    }
}
