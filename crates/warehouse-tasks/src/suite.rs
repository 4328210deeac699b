//! Test suite presets.

use crate::config::TasksConfig;
use crate::shell::{args, Shell};
use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use serde_json::Value;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Suite {
    /// Library and binary unit tests
    Unit,
    /// Integration tests under each crate's tests/ directory
    Functional,
    /// Unit tests that must reach full line coverage
    Coverage,
}

/// What a `tests` invocation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPlan {
    pub targets: Vec<String>,
    pub coverage: bool,
    pub enforce_coverage: bool,
    pub debugger: bool,
}

impl TestPlan {
    /// No suite runs everything with coverage. `coverage` always measures
    /// and enforces the threshold.
    pub fn new(suite: Option<Suite>, coverage: bool, debugger: bool) -> Self {
        let (targets, coverage) = match suite {
            None => (Vec::new(), true),
            Some(Suite::Unit) => (args(&["--lib", "--bins"]), coverage),
            Some(Suite::Functional) => (args(&["--test", "*"]), coverage),
            Some(Suite::Coverage) => (args(&["--lib", "--bins"]), true),
        };
        Self {
            targets,
            coverage,
            enforce_coverage: suite == Some(Suite::Coverage),
            debugger,
        }
    }

    /// Program arguments after `cargo`.
    pub fn cargo_args(&self) -> Vec<String> {
        let mut cargo_args = if self.coverage {
            args(&["llvm-cov", "--workspace"])
        } else {
            args(&["test", "--workspace"])
        };
        cargo_args.extend(self.targets.iter().cloned());
        if self.debugger {
            cargo_args.extend(args(&["--", "--nocapture", "--test-threads=1"]));
        }
        cargo_args
    }

    pub fn env(&self) -> Vec<(String, String)> {
        if self.debugger {
            vec![("RUST_BACKTRACE".to_string(), "full".to_string())]
        } else {
            Vec::new()
        }
    }
}

/// Line coverage percentage from a `cargo llvm-cov report --json --summary-only`
/// document.
pub fn parse_coverage_percent(summary: &str) -> Result<f64> {
    let document: Value =
        serde_json::from_str(summary).context("Coverage summary is not valid JSON")?;
    document
        .pointer("/data/0/totals/lines/percent")
        .and_then(Value::as_f64)
        .ok_or_else(|| anyhow!("Coverage summary has no line totals"))
}

pub fn run_tests(shell: &Shell, plan: &TestPlan) -> Result<()> {
    shell.run_with_env("cargo", &plan.cargo_args(), &plan.env())?;

    if plan.enforce_coverage {
        let summary = shell.output(
            "cargo",
            &args(&["llvm-cov", "report", "--json", "--summary-only"]),
        )?;
        let percent = parse_coverage_percent(&summary)?;
        info!("Line coverage: {:.2}%", percent);
        if percent < TasksConfig::COVERAGE_THRESHOLD {
            println!();
            bail!("[FAILED] Coverage is less than 100%");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan_runs_everything_with_coverage() {
        let plan = TestPlan::new(None, false, false);
        assert_eq!(plan.cargo_args(), args(&["llvm-cov", "--workspace"]));
        assert!(!plan.enforce_coverage);
    }

    #[test]
    fn test_unit_and_functional_plans() {
        let unit = TestPlan::new(Some(Suite::Unit), false, false);
        assert_eq!(
            unit.cargo_args(),
            args(&["test", "--workspace", "--lib", "--bins"])
        );

        let functional = TestPlan::new(Some(Suite::Functional), true, false);
        assert_eq!(
            functional.cargo_args(),
            args(&["llvm-cov", "--workspace", "--test", "*"])
        );
    }

    #[test]
    fn test_coverage_plan_enforces_threshold() {
        let plan = TestPlan::new(Some(Suite::Coverage), false, false);
        assert!(plan.coverage && plan.enforce_coverage);
        assert_eq!(
            plan.cargo_args(),
            args(&["llvm-cov", "--workspace", "--lib", "--bins"])
        );
    }

    #[test]
    fn test_debugger_plan() {
        let plan = TestPlan::new(Some(Suite::Unit), false, true);
        assert!(plan
            .cargo_args()
            .ends_with(&args(&["--", "--nocapture", "--test-threads=1"])));
        assert_eq!(plan.env()[0].0, "RUST_BACKTRACE");
    }

    #[test]
    fn test_parse_coverage_percent() {
        let summary = r#"{"data":[{"totals":{"lines":{"count":10,"covered":9,"percent":90.0}}}],"type":"llvm.coverage.json.export"}"#;
        assert_eq!(parse_coverage_percent(summary).unwrap(), 90.0);
        assert!(parse_coverage_percent("{}").is_err());
        assert!(parse_coverage_percent("not json").is_err());
    }
}
