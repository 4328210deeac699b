//! Task runner constants.

use std::path::{Path, PathBuf};

pub struct TasksConfig;

impl TasksConfig {
    /// Generated metadata rewritten on release, relative to the workspace root.
    pub const ABOUT_PATH: &'static str = "crates/warehouse-core/src/about.rs";
    pub const RELEASE_REF: &'static str = "refs/heads/master";
    pub const RELEASE_BRANCH: &'static str = "master";
    pub const REMOTE: &'static str = "origin";
    /// Crate published on release.
    pub const PUBLISH_PACKAGE: &'static str = "warehouse-core";
    /// Minimum line coverage for the `coverage` suite, in percent.
    pub const COVERAGE_THRESHOLD: f64 = 100.0;
    pub const COMPILE_COMMAND: &'static [&'static str] =
        &["bundle", "exec", "compass", "compile", "--force", "warehouse/static"];
    pub const RUN_COMMAND: &'static [&'static str] =
        &["bundle", "exec", "foreman", "start", "-d", "devel", "-e", "devel/env"];
}

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> Option<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map(Path::to_path_buf)
}
