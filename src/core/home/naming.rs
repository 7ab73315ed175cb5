use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

/// Namespace holding per-application environment entries.
pub const ENV_NAMESPACE: &str = "java:comp/env";

/// A host-provided naming service mapping names to string values.
pub trait NamingContext {
    /// Look a name up under `namespace`, or at the root when `None`.
    fn lookup(&self, namespace: Option<&str>, name: &str) -> LauncherResult<Option<String>>;
}

/// Bindings read from a JSON document placed next to the archive:
///
/// ```json
/// { "java:comp/env": { "JENKINS_HOME": "/srv/jenkins" }, "HUDSON_HOME": "/srv/hudson" }
/// ```
///
/// Top-level string members are root bindings; top-level objects are
/// namespaces.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct JsonNamingContext {
    bindings: HashMap<String, Value>,
}

impl JsonNamingContext {
    pub fn parse(raw: &str) -> LauncherResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// `None` when the host provides no bindings file.
    pub fn discover(path: &Path) -> Option<Self> {
        let raw = std::fs::read_to_string(path).ok()?;
        match Self::parse(&raw) {
            Ok(ctx) => {
                debug!("Using naming context from {:?}", path);
                Some(ctx)
            }
            Err(e) => {
                debug!("Ignoring naming context {:?}: {}", path, e);
                None
            }
        }
    }
}

impl NamingContext for JsonNamingContext {
    fn lookup(&self, namespace: Option<&str>, name: &str) -> LauncherResult<Option<String>> {
        let scope = match namespace {
            Some(ns) => match self.bindings.get(ns) {
                Some(Value::Object(entries)) => entries.get(name),
                Some(_) => {
                    return Err(LauncherError::Other(format!("{} is not a namespace", ns)))
                }
                None => None,
            },
            None => self.bindings.get(name),
        };

        match scope {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(LauncherError::Other(format!(
                "{} is bound to a non-string value {}",
                name, other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_and_root_bindings() {
        let ctx = JsonNamingContext::parse(
            r#"{ "java:comp/env": { "JENKINS_HOME": "/srv/env" }, "HUDSON_HOME": "/srv/root" }"#,
        )
        .unwrap();
        assert_eq!(
            ctx.lookup(Some(ENV_NAMESPACE), "JENKINS_HOME").unwrap().as_deref(),
            Some("/srv/env")
        );
        assert_eq!(ctx.lookup(None, "HUDSON_HOME").unwrap().as_deref(), Some("/srv/root"));
        assert_eq!(ctx.lookup(None, "JENKINS_HOME").unwrap(), None);
    }

    #[test]
    fn wrong_binding_types_are_errors() {
        let ctx = JsonNamingContext::parse(r#"{ "java:comp/env": 3, "JENKINS_HOME": 4 }"#).unwrap();
        assert!(ctx.lookup(Some(ENV_NAMESPACE), "JENKINS_HOME").is_err());
        assert!(ctx.lookup(None, "JENKINS_HOME").is_err());
    }

    #[test]
    fn missing_file_means_no_context() {
        let dir = tempfile::tempdir().unwrap();
        assert!(JsonNamingContext::discover(&dir.path().join("naming-context.json")).is_none());
    }
}
