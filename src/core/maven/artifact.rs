/// One resolved dependency as listed in the embedded dependency manifest.
///
/// Line format (as written by `mvn dependency:list`):
///   `groupId:artifactId:packaging:version:scope`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyEntry {
    pub group_id: String,
    pub artifact_id: String,
    pub packaging: String,
    pub version: String,
    pub scope: String,
}

impl DependencyEntry {
    /// Parse one manifest line. Lines with any other field count are not
    /// dependency entries (headers, classifier variants) and yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.trim().split(':').collect();
        match parts.as_slice() {
            [group_id, artifact_id, packaging, version, scope] => Some(Self {
                group_id: group_id.to_string(),
                artifact_id: artifact_id.to_string(),
                packaging: packaging.to_string(),
                version: version.to_string(),
                scope: scope.to_string(),
            }),
            _ => None,
        }
    }

    /// `groupId:artifactId`, the version table key.
    pub fn key(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }
}

/// `artifactId-version.packaging`, the layout of bundled library jars.
pub fn artifact_filename(artifact_id: &str, version: &str, packaging: &str) -> String {
    format!("{}-{}.{}", artifact_id, version, packaging)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_manifest_line() {
        let e = DependencyEntry::parse("  org.kohsuke:akuma:jar:1.9:compile ").unwrap();
        assert_eq!(e.group_id, "org.kohsuke");
        assert_eq!(e.artifact_id, "akuma");
        assert_eq!(e.packaging, "jar");
        assert_eq!(e.version, "1.9");
        assert_eq!(e.scope, "compile");
        assert_eq!(e.key(), "org.kohsuke:akuma");
        assert_eq!(artifact_filename(&e.artifact_id, &e.version, &e.packaging), "akuma-1.9.jar");
    }

    #[test]
    fn other_field_counts_are_skipped() {
        assert_eq!(DependencyEntry::parse("The following files have been resolved:"), None);
        assert_eq!(DependencyEntry::parse("org.jvnet:foo:jar:linux:1.0:compile"), None);
        assert_eq!(DependencyEntry::parse(""), None);
    }
}
