use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::warn;

use super::extract::{copy_into, create_temp_file};
use super::ExtractedFiles;
use crate::core::error::{LauncherError, LauncherResult};

/// Where the bytes of the running image can be found.
pub trait ImageSource {
    /// Concrete path of the running image, if the platform can name it.
    fn direct_path(&self) -> io::Result<PathBuf>;

    /// Byte stream of the running image, used when no path is available.
    fn open_stream(&self) -> io::Result<Box<dyn Read>>;
}

/// The image of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessImage;

impl ImageSource for ProcessImage {
    fn direct_path(&self) -> io::Result<PathBuf> {
        let exe = std::env::current_exe()?;
        // A replaced or deleted binary fails to canonicalize on Linux
        // ("/path (deleted)").
        let canonical = std::fs::canonicalize(&exe)?;
        if !canonical.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{:?} is not a regular file", canonical),
            ));
        }
        Ok(canonical)
    }

    fn open_stream(&self) -> io::Result<Box<dyn Read>> {
        #[cfg(target_os = "linux")]
        {
            Ok(Box::new(File::open("/proc/self/exe")?))
        }

        #[cfg(not(target_os = "linux"))]
        {
            let argv0 = std::env::args_os()
                .next()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "argv[0] is empty"))?;
            Ok(Box::new(File::open(argv0)?))
        }
    }
}

/// Finds the archive the launcher is running from.
pub struct SelfLocator<S = ProcessImage> {
    source: S,
    copy_prefix: String,
}

impl<S: ImageSource> SelfLocator<S> {
    pub fn with_source(source: S, copy_prefix: &str) -> Self {
        Self {
            source,
            copy_prefix: copy_prefix.to_string(),
        }
    }

    /// Absolute path of the running archive.
    ///
    /// Falls back to copying the image into `directory` (or the temp
    /// directory) when the direct lookup fails; the copy is registered in
    /// `files` for deletion at exit.
    pub fn locate(
        &self,
        directory: Option<&Path>,
        files: &mut ExtractedFiles,
    ) -> LauncherResult<PathBuf> {
        let direct_err = match self.source.direct_path() {
            Ok(path) => return Ok(path),
            Err(e) => e,
        };
        warn!(
            "Direct self location did not work, using fallback: {}",
            direct_err
        );

        let mut stream = self.source.open_stream().map_err(|e| {
            LauncherError::SelfLocation(format!(
                "direct lookup failed ({}), image stream unavailable ({})",
                direct_err, e
            ))
        })?;
        let mut tmp = create_temp_file(directory, &self.copy_prefix, ".war")?;
        copy_into(&mut stream, &mut tmp)?;

        let path = tmp.into_temp_path();
        let location = std::path::absolute(&path).map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        files.register(path);
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeImage {
        direct: Option<PathBuf>,
        bytes: Option<&'static [u8]>,
    }

    impl ImageSource for FakeImage {
        fn direct_path(&self) -> io::Result<PathBuf> {
            self.direct
                .clone()
                .ok_or_else(|| io::Error::new(io::ErrorKind::Unsupported, "nested loader"))
        }

        fn open_stream(&self) -> io::Result<Box<dyn Read>> {
            match self.bytes {
                Some(bytes) => Ok(Box::new(bytes)),
                None => Err(io::Error::new(io::ErrorKind::NotFound, "gone")),
            }
        }
    }

    #[test]
    fn direct_path_wins() {
        let image = FakeImage {
            direct: Some(PathBuf::from("/opt/jenkins/jenkins.war")),
            bytes: Some(b"unused"),
        };
        let mut files = ExtractedFiles::new();
        let path = SelfLocator::with_source(image, "jenkins")
            .locate(None, &mut files)
            .unwrap();
        assert_eq!(path, PathBuf::from("/opt/jenkins/jenkins.war"));
        assert!(files.is_empty());
    }

    #[test]
    fn fallback_copies_the_image_stream() {
        let dir = tempfile::tempdir().unwrap();
        let image = FakeImage {
            direct: None,
            bytes: Some(b"PK archive bytes"),
        };
        let mut files = ExtractedFiles::new();
        let path = SelfLocator::with_source(image, "jenkins")
            .locate(Some(dir.path()), &mut files)
            .unwrap();

        assert!(path.is_absolute());
        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(std::fs::read(&path).unwrap(), b"PK archive bytes");
        assert_eq!(files.len(), 1);

        drop(files);
        assert!(!path.exists());
    }

    #[test]
    fn both_strategies_failing_is_fatal() {
        let image = FakeImage {
            direct: None,
            bytes: None,
        };
        let mut files = ExtractedFiles::new();
        let err = SelfLocator::with_source(image, "jenkins")
            .locate(None, &mut files)
            .unwrap_err();
        assert!(matches!(err, LauncherError::SelfLocation(_)));
    }

    #[test]
    fn process_image_resolves_to_a_file() {
        let path = ProcessImage.direct_path().unwrap();
        assert!(path.is_file());
    }
}
