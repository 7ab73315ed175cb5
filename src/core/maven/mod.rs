mod artifact;
mod versions;

pub use artifact::{artifact_filename, DependencyEntry};
pub use versions::DependencyVersionTable;
