use std::collections::HashMap;

use tracing::{debug, warn};

use super::artifact::DependencyEntry;
use crate::core::archive::SelfArchive;

/// Immutable `groupId:artifactId` → version mapping for the bundled libraries.
#[derive(Debug, Clone, Default)]
pub struct DependencyVersionTable {
    versions: HashMap<String, String>,
}

impl DependencyVersionTable {
    /// Build the table from manifest text.
    pub fn parse(manifest: &str) -> Self {
        let versions = manifest
            .lines()
            .filter_map(DependencyEntry::parse)
            .map(|entry| (entry.key(), entry.version))
            .collect();
        Self { versions }
    }

    /// Read `manifest_path` from the archive.
    ///
    /// A missing or unreadable manifest yields an empty table; lookups
    /// then miss and the caller reports the library it could not find.
    pub fn load(archive: &SelfArchive, manifest_path: &str) -> Self {
        match archive.read_to_string(manifest_path) {
            Ok(Some(manifest)) => {
                let table = Self::parse(&manifest);
                debug!("Loaded {} dependency versions", table.len());
                table
            }
            Ok(None) => {
                warn!("Dependency manifest {} not found in archive", manifest_path);
                Self::default()
            }
            Err(e) => {
                warn!("Cannot read dependency manifest {}: {}", manifest_path, e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Exact `group:artifact` lookup, then any key ending in `:artifact`
    /// (libraries that moved to another group keep their artifact name).
    pub fn version(&self, group_id: &str, artifact_id: &str) -> Option<&str> {
        if let Some(v) = self.versions.get(&format!("{}:{}", group_id, artifact_id)) {
            return Some(v.as_str());
        }

        let suffix = format!(":{}", artifact_id);
        let mut matches: Vec<(&String, &String)> = self
            .versions
            .iter()
            .filter(|(key, _)| key.ends_with(&suffix))
            .collect();
        // HashMap order is arbitrary; pick the lowest key so repeated
        // lookups agree.
        matches.sort();
        let (key, version) = matches.into_iter().next()?;
        debug!(
            "No version for {}:{}, using {} from {}",
            group_id, artifact_id, version, key
        );
        Some(version.as_str())
    }
}
