//! Release tagging and publishing.
//!
//! Versions are `<yy>.<m>.<n>`: two-digit year and month without leading
//! zeros, then a counter that restarts every month.

use crate::config::TasksConfig;
use crate::shell::{args, Shell};
use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use std::path::Path;
use tracing::info;

/// `<yy>.<m>` series for a date.
pub fn version_series(date: NaiveDate) -> String {
    format!("{}.{}", date.year() % 100, date.month())
}

/// Next version in `series` given the existing tags.
pub fn next_version(series: &str, tags: &[&str]) -> String {
    let prefix = format!("v{}.", series);
    let next = tags
        .iter()
        .filter_map(|tag| tag.strip_prefix(&prefix))
        .filter_map(|counter| counter.parse::<u64>().ok())
        .max()
        .map_or(0, |highest| highest + 1);
    format!("{}.{}", series, next)
}

/// Contents of the generated about module.
pub fn render_about(version: &str) -> String {
    format!(
        r#"// THIS FILE IS AUTOMATICALLY GENERATED, To edit it, see the release task in warehouse-tasks
pub const TITLE: &str = "warehouse";
pub const SUMMARY: &str = "Next Generation Python Package Index";
pub const URI: &str = "https://github.com/dstufft/warehouse";

pub const VERSION: &str = "{version}";

pub const AUTHOR: &str = "Donald Stufft";
pub const EMAIL: &str = "donald@stufft.io";

pub const LICENSE: &str = "Apache License, Version 2.0";
pub const COPYRIGHT: &str = "Copyright 2013 Donald Stufft";
"#
    )
}

fn write_about(root: &Path, version: &str) -> Result<()> {
    let path = root.join(TasksConfig::ABOUT_PATH);
    std::fs::write(&path, render_about(version))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Tag, publish and push a new release from the release branch.
///
/// Steps are not rolled back on failure.
pub fn release(shell: &Shell) -> Result<String> {
    let head = shell.output("git", &args(&["symbolic-ref", "-q", "HEAD"]))?;
    if !head.contains(TasksConfig::RELEASE_REF) {
        bail!(
            "[ERROR] Can only make releases from the {} branch",
            TasksConfig::RELEASE_BRANCH
        );
    }

    let series = version_series(Utc::now().date_naive());
    let tag_list = shell.output("git", &args(&["tag", "-l", &format!("v{}.*", series)]))?;
    let tags: Vec<&str> = tag_list.split_whitespace().collect();
    let version = next_version(&series, &tags);
    let tag = format!("v{}", version);
    info!("Releasing version {}", version);

    write_about(shell.root(), &version)?;

    shell.run("git", &args(&["add", TasksConfig::ABOUT_PATH]))?;
    shell.run(
        "git",
        &args(&[
            "commit",
            "-m",
            &format!("Bumped version to {}", version),
            TasksConfig::ABOUT_PATH,
        ]),
    )?;

    shell.run(
        "git",
        &args(&["tag", "-s", &tag, "-m", &format!("Released version {}", version)]),
    )?;

    shell.run("git", &args(&["checkout", &tag]))?;

    // Build and publish from the tagged tree
    shell.run("cargo", &args(&["build", "--release", "--workspace"]))?;
    shell.run(
        "cargo",
        &args(&["publish", "-p", TasksConfig::PUBLISH_PACKAGE]),
    )?;

    shell.run("git", &args(&["checkout", TasksConfig::RELEASE_BRANCH]))?;

    shell.run(
        "git",
        &args(&["push", TasksConfig::REMOTE, TasksConfig::RELEASE_BRANCH]),
    )?;
    shell.run("git", &args(&["push", "--tags", TasksConfig::REMOTE]))?;

    Ok(version)
}
