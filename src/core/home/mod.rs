// ─── Home Directory Resolver ───
// Picks the persistent data directory from an ordered chain of sources.
// Every source is tried for all home variable names before the next one;
// lookups never fail, they only miss.

mod naming;

pub use naming::{JsonNamingContext, NamingContext, ENV_NAMESPACE};

use std::path::PathBuf;

use tracing::debug;

use crate::core::config::{LauncherConfig, ProcessProperties};

/// The chosen home directory and a human-readable note on where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeDirectory {
    pub path: PathBuf,
    pub origin: String,
}

impl HomeDirectory {
    pub fn new(path: impl Into<PathBuf>, origin: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            origin: origin.into(),
        }
    }
}

/// One tier of the chain, consulted once per home variable name.
pub trait HomeLookup {
    fn lookup(&self, name: &str) -> Option<HomeDirectory>;
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Naming-context bindings: the environment namespace first, then the root.
struct NamingLookup<'a>(&'a dyn NamingContext);

impl HomeLookup for NamingLookup<'_> {
    fn lookup(&self, name: &str) -> Option<HomeDirectory> {
        for namespace in [Some(ENV_NAMESPACE), None] {
            let origin = match namespace {
                Some(ns) => format!("naming context {}/{}", ns, name),
                None => format!("naming context {}", name),
            };
            match self.0.lookup(namespace, name) {
                Ok(value) => {
                    if let Some(value) = non_blank(value) {
                        return Some(HomeDirectory::new(value, origin));
                    }
                }
                Err(e) => {
                    debug!("{} lookup failed: {}", origin, e);
                    return None;
                }
            }
        }
        None
    }
}

struct PropertyLookup<'a>(&'a ProcessProperties);

impl HomeLookup for PropertyLookup<'_> {
    fn lookup(&self, name: &str) -> Option<HomeDirectory> {
        let value = non_blank(self.0.get(name).map(str::to_string))?;
        Some(HomeDirectory::new(value, format!("property {}", name)))
    }
}

struct EnvLookup<F>(F);

impl<F> HomeLookup for EnvLookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, name: &str) -> Option<HomeDirectory> {
        let value = non_blank((self.0)(name))?;
        let path = PathBuf::from(&value);
        let path = std::path::absolute(&path).unwrap_or(path);
        Some(HomeDirectory::new(path, format!("environment variable {}", name)))
    }
}

/// Resolves the home directory through the configured tiers, then the
/// legacy and new defaults under the user's home directory.
pub struct HomeDirectoryResolver<'a> {
    names: Vec<String>,
    tiers: Vec<Box<dyn HomeLookup + 'a>>,
    user_home: PathBuf,
    legacy_dir: String,
    default_dir: String,
}

impl<'a> HomeDirectoryResolver<'a> {
    /// A resolver with no tiers yet; tiers are consulted in the order they
    /// are added.
    pub fn new(config: &LauncherConfig, user_home: PathBuf) -> Self {
        Self {
            names: config.home_names.clone(),
            tiers: Vec::new(),
            user_home,
            legacy_dir: config.legacy_home_dir.clone(),
            default_dir: config.default_home_dir.clone(),
        }
    }

    pub fn with_lookup(mut self, lookup: impl HomeLookup + 'a) -> Self {
        self.tiers.push(Box::new(lookup));
        self
    }

    pub fn with_naming(self, context: &'a dyn NamingContext) -> Self {
        self.with_lookup(NamingLookup(context))
    }

    pub fn with_properties(self, properties: &'a ProcessProperties) -> Self {
        self.with_lookup(PropertyLookup(properties))
    }

    pub fn with_env<F>(self, getenv: F) -> Self
    where
        F: Fn(&str) -> Option<String> + 'a,
    {
        self.with_lookup(EnvLookup(getenv))
    }

    /// Process environment variables.
    pub fn with_process_env(self) -> Self {
        self.with_env(|name| std::env::var(name).ok())
    }

    pub fn resolve(&self) -> HomeDirectory {
        let configured = self
            .tiers
            .iter()
            .find_map(|tier| self.names.iter().find_map(|name| tier.lookup(name)));
        if let Some(home) = configured {
            return home;
        }

        let legacy = self.user_home.join(&self.legacy_dir);
        if legacy.exists() {
            return HomeDirectory::new(
                legacy,
                format!("$HOME/{} (legacy default)", self.legacy_dir),
            );
        }

        HomeDirectory::new(
            self.user_home.join(&self.default_dir),
            format!("$HOME/{} (home directory fallback)", self.default_dir),
        )
    }
}

/// The current user's home directory, or the working directory when the
/// platform cannot name one.
pub fn user_home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}
