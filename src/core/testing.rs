//! Helpers for tests that change process-wide state (signal dispositions,
//! standard stream descriptors). Such a test re-runs itself alone in a
//! fresh copy of the test binary so the rest of the suite is unaffected.

use std::process::Command;

const ISOLATED_ENV: &str = "JENKINS_LAUNCHER_ISOLATED_TEST";

/// Whether this process is the isolated copy running a single test.
pub(crate) fn in_isolation() -> bool {
    std::env::var_os(ISOLATED_ENV).is_some()
}

/// Run `module::test` in a child test process and fail unless it passes.
pub(crate) fn run_isolated(module: &str, test: &str) {
    // Test names are paths below the crate root.
    let module = module.split_once("::").map_or("", |(_, rest)| rest);
    let name = format!("{}::{}", module, test);
    let exe = std::env::current_exe().unwrap();

    let output = Command::new(exe)
        .args([name.as_str(), "--exact", "--nocapture", "--test-threads=1"])
        .env(ISOLATED_ENV, &name)
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "{} failed in isolation ({})\nstdout:\n{}\nstderr:\n{}",
        name,
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        !stdout.contains("running 0 tests"),
        "{} matched no test in {}",
        name,
        stdout
    );
}
