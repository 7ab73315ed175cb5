mod extract;
mod locate;
mod manifest;

pub use extract::{ExtractedFiles, ExtractedResource, ResourceExtractor};
pub use locate::{ImageSource, ProcessImage, SelfLocator};
pub use manifest::main_attributes;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::core::error::{LauncherError, LauncherResult};

/// Archive entry holding the main manifest.
pub const MANIFEST_RESOURCE: &str = "META-INF/MANIFEST.MF";

/// Read-only view of the zip payload carried by the running image.
///
/// The payload may be appended to the launcher binary; the zip reader
/// locates the central directory from the end of the file, so any
/// leading executable bytes are skipped.
#[derive(Debug, Clone)]
pub struct SelfArchive {
    path: PathBuf,
}

impl SelfArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh reader; entries are read sequentially per call.
    pub(crate) fn open(&self) -> LauncherResult<ZipArchive<File>> {
        let file = File::open(&self.path).map_err(|source| LauncherError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(ZipArchive::new(file)?)
    }

    pub fn contains(&self, name: &str) -> LauncherResult<bool> {
        let archive = self.open()?;
        let found = archive.index_for_name(name).is_some();
        Ok(found)
    }

    /// Entry content as UTF-8, `None` when the entry does not exist.
    pub fn read_to_string(&self, name: &str) -> LauncherResult<Option<String>> {
        let mut archive = self.open()?;
        let mut entry = match archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|source| LauncherError::Io {
                path: self.path.join(name),
                source,
            })?;
        Ok(Some(content))
    }

    /// Product version from the main manifest attribute.
    pub fn product_version(&self, attribute: &str) -> Option<String> {
        let manifest = self.read_to_string(MANIFEST_RESOURCE).ok()??;
        main_attributes(&manifest).remove(attribute)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Write a zip archive with the given entries, optionally behind a
    /// fake executable prefix.
    pub fn write_archive(dir: &Path, prefix: &[u8], entries: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.join("jenkins.war");
        let mut buffer = std::io::Cursor::new(Vec::new());
        {
            let mut writer = ZipWriter::new(&mut buffer);
            for (name, content) in entries {
                writer
                    .start_file(*name, SimpleFileOptions::default())
                    .unwrap();
                writer.write_all(content).unwrap();
            }
            writer.finish().unwrap();
        }
        let mut bytes = prefix.to_vec();
        bytes.extend_from_slice(buffer.get_ref());
        std::fs::write(&path, bytes).unwrap();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::write_archive;
    use super::*;

    #[test]
    fn reads_version_from_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(
            dir.path(),
            b"",
            &[(
                MANIFEST_RESOURCE,
                b"Manifest-Version: 1.0\r\nJenkins-Version: 1.554.2\r\n\r\n",
            )],
        );
        let archive = SelfArchive::new(path);
        assert_eq!(
            archive.product_version("Jenkins-Version").as_deref(),
            Some("1.554.2")
        );
        assert_eq!(archive.product_version("Hudson-Version"), None);
    }

    #[test]
    fn payload_behind_executable_prefix_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(
            dir.path(),
            b"\x7fELF not really an executable",
            &[("winstone.jar", b"runtime")],
        );
        let archive = SelfArchive::new(path);
        assert!(archive.contains("winstone.jar").unwrap());
        assert_eq!(
            archive.read_to_string("winstone.jar").unwrap().as_deref(),
            Some("runtime")
        );
        assert_eq!(archive.read_to_string("missing.txt").unwrap(), None);
    }
}
