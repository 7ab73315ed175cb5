// ─── Bootstrap Sequence ───
// Runs every launcher step strictly in order. Termination signals are
// blocked from the start, and everything up to the daemon fork happens on
// the main thread before any other thread exists. The async runtime starts
// right after the fork; once its signal listeners are in place the signals
// are unblocked, so any of them ends the run through the normal return
// path and the extracted files are deleted.

use std::path::Path;

use tracing::{error, info, warn};

use crate::core::archive::{
    ExtractedFiles, ImageSource, ProcessImage, ResourceExtractor, SelfArchive, SelfLocator,
};
use crate::core::args::LaunchOptions;
use crate::core::config::{LauncherConfig, ProcessProperties};
use crate::core::daemon;
use crate::core::dispatch::{
    clear_stale_work_dir, dispatch, prepare_properties, usage_banner, JavaEntryPoint,
};
use crate::core::error::{LauncherError, LauncherResult, Stage};
use crate::core::home::{user_home, HomeDirectoryResolver, JsonNamingContext};
use crate::core::java;
use crate::core::loader::ArtifactLoader;
use crate::core::logging::{self, Console};
use crate::core::maven::DependencyVersionTable;
use crate::core::shutdown::{Shutdown, SignalGuard};

/// Exit code for a fatal bootstrap error.
pub const FATAL_EXIT_CODE: i32 = 1;

/// One launcher run over a process image.
pub struct Bootstrap<S = ProcessImage> {
    image: S,
    console: Console,
}

impl Bootstrap<ProcessImage> {
    pub fn new(console: Console) -> Self {
        Self::with_image(ProcessImage, console)
    }
}

impl<S: ImageSource> Bootstrap<S> {
    pub fn with_image(image: S, console: Console) -> Self {
        Self { image, console }
    }

    /// Run and map the outcome to a process exit code.
    pub fn run_to_exit<I, A>(self, args: I) -> i32
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let console = self.console.clone();
        match self.run(args) {
            Ok(code) => code,
            Err(e) => {
                error!("{}", e);
                console.report_fatal(&e.to_string());
                FATAL_EXIT_CODE
            }
        }
    }

    pub fn run<I, A>(self, args: I) -> LauncherResult<i32>
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let options = LaunchOptions::parse(args);
        if options.version_requested {
            println!("{}", self.version_line());
            return Ok(0);
        }

        let Self { image, console } = self;

        let guard = SignalGuard::block().map_err(|e| e.at(Stage::Signals))?;
        // Dropped at the end of the run: removes every extracted file.
        let mut files = ExtractedFiles::new();
        let folder = options.extracted_files_folder.as_deref();

        let defaults = LauncherConfig::default();
        let warfile = SelfLocator::with_source(image, &defaults.self_copy_prefix)
            .locate(folder, &mut files)
            .map_err(|e| e.at(Stage::SelfLocation))?;
        let archive = SelfArchive::new(&warfile);
        let config = LauncherConfig::load(&archive);
        let table = DependencyVersionTable::load(&archive, &config.dependency_manifest);
        let extractor = ResourceExtractor::new(&archive, folder);

        if options.daemon {
            daemon::daemonize(
                &table,
                &extractor,
                &mut files,
                &config,
                options.logfile.is_some(),
            )
            .map_err(|e| e.at(Stage::Daemon))?;
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| LauncherError::from(e).at(Stage::Signals))?;
        runtime.block_on(async {
            let mut shutdown = Shutdown::install().map_err(|e| e.at(Stage::Signals))?;
            drop(guard);

            if let Some(path) = &options.logfile {
                logging::redirect(&console, path).map_err(|e| e.at(Stage::LogRedirect))?;
            }
            info!("Running from: {}", warfile.display());

            let mut properties = ProcessProperties::from_env(&config.java_opts_env);
            prepare_properties(&mut properties, &warfile);

            let naming = warfile.parent().and_then(|dir| {
                JsonNamingContext::discover(&dir.join(&config.naming_context_file))
            });
            let arguments = options.runtime_arguments(&warfile, || {
                let mut resolver = HomeDirectoryResolver::new(&config, user_home());
                if let Some(context) = &naming {
                    resolver = resolver.with_naming(context);
                }
                let home = resolver
                    .with_properties(&properties)
                    .with_process_env()
                    .resolve();
                info!("webroot: {}", home.origin);
                home
            });

            let runtime_jar = extractor
                .extract(
                    &config.runtime_resource,
                    resource_stem(&config.runtime_resource),
                    ".jar",
                    &mut files,
                )
                .map_err(|e| e.at(Stage::Extraction))?;
            clear_stale_work_dir(&std::env::temp_dir(), &config.runtime_work_dir, &warfile);

            let java = java::require_java(&config).map_err(|e| e.at(Stage::EntryPoint))?;
            let loader = ArtifactLoader::new(vec![runtime_jar.destination]);
            let mut entry =
                JavaEntryPoint::bind(&loader, &config, &java, properties, console.clone())
                    .map_err(|e| e.at(Stage::EntryPoint))?;
            let usage = usage_banner(
                &config.product_name,
                &archive
                    .product_version(&config.version_attribute)
                    .unwrap_or_default(),
            );

            if let Some(signal) = shutdown.pending().await {
                warn!("Received signal {} before {} started", signal, config.runtime_main_class);
                return Ok(128 + signal);
            }
            dispatch(
                &mut entry,
                usage,
                &config.session_cookie_prefix,
                arguments,
                &mut shutdown,
            )
            .await
            .map_err(|e| e.at(Stage::EntryPoint))
        })
    }

    /// The product version for `--version`, `?` when unknown. Only the
    /// direct image path is consulted; nothing is copied or extracted.
    fn version_line(&self) -> String {
        let Ok(path) = self.image.direct_path() else {
            return "?".to_string();
        };
        let archive = SelfArchive::new(path);
        let config = LauncherConfig::load(&archive);
        archive
            .product_version(&config.version_attribute)
            .unwrap_or_else(|| "?".to_string())
    }
}

/// `winstone.jar` → `winstone`, used as the extracted file prefix.
fn resource_stem(resource: &str) -> &str {
    Path::new(resource)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(resource)
}
