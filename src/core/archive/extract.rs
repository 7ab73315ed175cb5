use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempPath};
use tracing::{debug, warn};
use zip::result::ZipError;

use super::SelfArchive;
use crate::core::error::{LauncherError, LauncherResult};

/// An embedded resource copied to a real file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedResource {
    pub source_name: String,
    pub destination: PathBuf,
    /// Removed when the launcher exits.
    pub temporary: bool,
}

/// Files scheduled for deletion when the launcher exits.
///
/// Owned by the bootstrap sequence and only appended to from it, so no
/// lock is needed. Dropping the list removes every registered file,
/// which covers normal return, error return and panic unwinding.
#[derive(Debug, Default)]
pub struct ExtractedFiles {
    paths: Vec<TempPath>,
}

impl ExtractedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, path: TempPath) {
        self.paths.push(path);
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Delete everything registered so far.
    pub fn cleanup(&mut self) {
        for path in self.paths.drain(..) {
            let shown = path.to_path_buf();
            if let Err(e) = path.close() {
                warn!("Cannot delete {:?}: {}", shown, e);
            } else {
                debug!("Deleted {:?}", shown);
            }
        }
    }
}

impl Drop for ExtractedFiles {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Copies embedded resources out of the archive.
pub struct ResourceExtractor<'a> {
    archive: &'a SelfArchive,
    directory: Option<PathBuf>,
}

impl<'a> ResourceExtractor<'a> {
    /// `directory` of `None` means the platform temp directory.
    pub fn new(archive: &'a SelfArchive, directory: Option<&Path>) -> Self {
        Self {
            archive,
            directory: directory.map(Path::to_path_buf),
        }
    }

    /// Copy `resource` into a uniquely named `<prefix>*<suffix>` file and
    /// register it for deletion at exit.
    pub fn extract(
        &self,
        resource: &str,
        prefix: &str,
        suffix: &str,
        files: &mut ExtractedFiles,
    ) -> LauncherResult<ExtractedResource> {
        let mut archive = self.archive.open()?;
        let mut entry = match archive.by_name(resource) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                return Err(LauncherError::ResourceNotFound(resource.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let mut tmp = create_temp_file(self.directory.as_deref(), prefix, suffix)?;
        // On failure `tmp` is dropped here, which removes the partial file.
        copy_into(&mut entry, &mut tmp)?;

        let path = tmp.into_temp_path();
        let destination = path.to_path_buf();
        files.register(path);
        debug!("Extracted {} to {:?}", resource, destination);

        Ok(ExtractedResource {
            source_name: resource.to_string(),
            destination,
            temporary: true,
        })
    }
}

fn target_dir(directory: Option<&Path>) -> PathBuf {
    directory
        .map(Path::to_path_buf)
        .unwrap_or_else(std::env::temp_dir)
}

/// Create `<prefix>*<suffix>` in `directory` (or the temp directory).
pub(crate) fn create_temp_file(
    directory: Option<&Path>,
    prefix: &str,
    suffix: &str,
) -> LauncherResult<NamedTempFile> {
    let dir = target_dir(directory);
    tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile_in(&dir)
        .map_err(|source| LauncherError::ExtractionFailed { dir, source })
}

/// Stream `reader` into the temp file and flush it.
pub(crate) fn copy_into(
    reader: &mut impl io::Read,
    tmp: &mut NamedTempFile,
) -> LauncherResult<u64> {
    let path = tmp.path().to_path_buf();
    let written = io::copy(reader, tmp.as_file_mut())
        .and_then(|n| tmp.as_file_mut().flush().map(|()| n))
        .map_err(|source| LauncherError::Io { path, source })?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::write_archive;
    use super::*;

    #[test]
    fn extracts_resource_into_requested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let archive = SelfArchive::new(write_archive(
            dir.path(),
            b"",
            &[("WEB-INF/lib/akuma-1.9.jar", b"akuma bytes")],
        ));
        let mut files = ExtractedFiles::new();

        let extracted = ResourceExtractor::new(&archive, Some(out.path()))
            .extract("WEB-INF/lib/akuma-1.9.jar", "akuma", ".jar", &mut files)
            .unwrap();

        assert!(extracted.temporary);
        assert_eq!(extracted.destination.parent(), Some(out.path()));
        let name = extracted.destination.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("akuma") && name.ends_with(".jar"), "{name}");
        assert_eq!(std::fs::read(&extracted.destination).unwrap(), b"akuma bytes");
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn missing_resource_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = SelfArchive::new(write_archive(dir.path(), b"", &[("a.txt", b"a")]));
        let mut files = ExtractedFiles::new();

        let err = ResourceExtractor::new(&archive, Some(dir.path()))
            .extract("winstone.jar", "winstone", ".jar", &mut files)
            .unwrap_err();

        assert!(matches!(err, LauncherError::ResourceNotFound(ref name) if name == "winstone.jar"));
        assert!(files.is_empty());
    }

    #[test]
    fn unusable_directory_names_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let archive = SelfArchive::new(write_archive(dir.path(), b"", &[("a.txt", b"a")]));
        let missing = dir.path().join("does-not-exist");
        let mut files = ExtractedFiles::new();

        let err = ResourceExtractor::new(&archive, Some(&missing))
            .extract("a.txt", "a", ".txt", &mut files)
            .unwrap_err();

        match err {
            LauncherError::ExtractionFailed { dir, .. } => assert_eq!(dir, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn dropping_the_registry_deletes_extracted_files() {
        let dir = tempfile::tempdir().unwrap();
        let archive = SelfArchive::new(write_archive(dir.path(), b"", &[("a.txt", b"a")]));
        let mut files = ExtractedFiles::new();
        let extracted = ResourceExtractor::new(&archive, Some(dir.path()))
            .extract("a.txt", "a", ".txt", &mut files)
            .unwrap();
        assert!(extracted.destination.exists());

        drop(files);
        assert!(!extracted.destination.exists());
    }
}
