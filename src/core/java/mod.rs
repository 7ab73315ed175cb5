pub mod runtime;

pub use runtime::find_java_binary;
pub use runtime::probe_java;
pub use runtime::require_java;
pub use runtime::JavaInstallation;
