// ─── Artifact Loader ───
// Binds extracted jar archives to the classes they provide. A capability
// (daemon helper, runtime entry point) is only handed out once the class
// backing it has been found in one of the loader's archives.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::archive::SelfArchive;
use crate::core::error::{LauncherError, LauncherResult};

/// Archive entry name of a class: `winstone.Launcher` → `winstone/Launcher.class`.
pub fn class_entry(class_name: &str) -> String {
    format!("{}.class", class_name.replace('.', "/"))
}

/// An ordered set of jar archives searched like a class path.
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    archives: Vec<PathBuf>,
}

impl ArtifactLoader {
    pub fn new(archives: Vec<PathBuf>) -> Self {
        Self { archives }
    }

    pub fn archives(&self) -> &[PathBuf] {
        &self.archives
    }

    /// First archive containing `class_name`, if any.
    pub fn find_class(&self, class_name: &str) -> LauncherResult<Option<&Path>> {
        let entry = class_entry(class_name);
        for archive in &self.archives {
            if SelfArchive::new(archive).contains(&entry)? {
                debug!("Found {} in {:?}", class_name, archive);
                return Ok(Some(archive));
            }
        }
        Ok(None)
    }

    /// Like [`ArtifactLoader::find_class`], but a missing class is an error.
    pub fn load_class(&self, class_name: &str) -> LauncherResult<&Path> {
        self.find_class(class_name)?
            .ok_or_else(|| LauncherError::ClassNotFound {
                class: class_name.to_string(),
                archives: self.archives.clone(),
            })
    }

    /// The archives joined with the platform path separator.
    pub fn classpath(&self) -> LauncherResult<OsString> {
        std::env::join_paths(&self.archives)
            .map_err(|e| LauncherError::Other(format!("Invalid class path entry: {}", e)))
    }
}
