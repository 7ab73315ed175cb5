use std::collections::BTreeMap;

use tracing::warn;

/// Process-level configuration properties.
///
/// Seeded from the `-Dname=value` entries of the JVM options variable and
/// forwarded to the runtime as system properties. Everything else in that
/// variable is kept as a plain JVM argument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessProperties {
    values: BTreeMap<String, String>,
    jvm_args: Vec<String>,
}

impl ProcessProperties {
    /// Read and split the given environment variable (e.g. `JAVA_OPTS`).
    pub fn from_env(var: &str) -> Self {
        match std::env::var(var) {
            Ok(raw) => Self::parse(&raw).unwrap_or_else(|| {
                warn!("Cannot split {} (unbalanced quotes), ignoring it", var);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Split a shell-style option string. `None` on unbalanced quoting.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut props = Self::default();
        for token in shlex::split(raw)? {
            match token.strip_prefix("-D") {
                Some(definition) if !definition.is_empty() => {
                    let (name, value) = definition.split_once('=').unwrap_or((definition, ""));
                    props.values.insert(name.to_string(), value.to_string());
                }
                _ => props.jvm_args.push(token),
            }
        }
        Some(props)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn set_if_absent(&mut self, name: &str, value: impl Into<String>) {
        self.values
            .entry(name.to_string())
            .or_insert_with(|| value.into());
    }

    pub fn jvm_args(&self) -> &[String] {
        &self.jvm_args
    }

    /// `-Dname=value` arguments in name order.
    pub fn as_jvm_definitions(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|(name, value)| format!("-D{}={}", name, value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_definitions_from_jvm_args() {
        let props =
            ProcessProperties::parse(r#"-Xmx1g -DJENKINS_HOME="/srv/ci home" -Dflag -server"#)
                .unwrap();
        assert_eq!(props.get("JENKINS_HOME"), Some("/srv/ci home"));
        assert_eq!(props.get("flag"), Some(""));
        assert_eq!(props.jvm_args(), ["-Xmx1g", "-server"]);
    }

    #[test]
    fn set_if_absent_keeps_user_value() {
        let mut props = ProcessProperties::parse("-Dhudson.diyChunking=false").unwrap();
        props.set_if_absent("hudson.diyChunking", "true");
        props.set_if_absent("java.awt.headless", "true");
        assert_eq!(
            props.as_jvm_definitions(),
            ["-Dhudson.diyChunking=false", "-Djava.awt.headless=true"]
        );
    }

    #[test]
    fn unbalanced_quotes_are_rejected() {
        assert!(ProcessProperties::parse("-Dx=\"open").is_none());
    }
}
