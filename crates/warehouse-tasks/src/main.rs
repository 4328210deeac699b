//! Warehouse developer tasks.
//!
//! `warehouse-tasks tests [unit|functional|coverage] [--coverage] [--pdb]`,
//! `compile`, `run` and `release`, run from the workspace root.

mod config;
mod release;
mod shell;
mod suite;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use config::{workspace_root, TasksConfig};
use shell::{args, Shell, ShellError};
use std::process::ExitCode;
use suite::{Suite, TestPlan};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "warehouse-tasks")]
#[command(about = "Developer tasks for Warehouse")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Task {
    /// Run a test suite
    Tests {
        /// Suite to run; all tests with coverage when omitted
        #[arg(value_enum)]
        suite: Option<Suite>,
        /// Measure coverage
        #[arg(long)]
        coverage: bool,
        /// Debugger-friendly run: no output capture, one test thread,
        /// full backtraces
        #[arg(long)]
        pdb: bool,
    },
    /// Compile static assets
    Compile,
    /// Start the development processes
    Run,
    /// Tag, publish and push a new release
    Release,
}

fn run_task(shell: &Shell, task: Task) -> Result<()> {
    match task {
        Task::Tests {
            suite,
            coverage,
            pdb,
        } => suite::run_tests(shell, &TestPlan::new(suite, coverage, pdb)),
        Task::Compile => external(shell, TasksConfig::COMPILE_COMMAND),
        Task::Run => external(shell, TasksConfig::RUN_COMMAND),
        Task::Release => {
            let version = release::release(shell)?;
            info!("Released version {}", version);
            Ok(())
        }
    }
}

fn external(shell: &Shell, command: &[&str]) -> Result<()> {
    let (program, rest) = command
        .split_first()
        .ok_or_else(|| anyhow!("Empty command"))?;
    shell.run(program, &args(rest))?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let Some(root) = workspace_root() else {
        eprintln!("[ERROR] Could not locate the workspace root");
        return ExitCode::FAILURE;
    };
    let shell = Shell::new(root);

    match run_task(&shell, args.task) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ShellError>() {
            Some(shell_err) => {
                error!("{}", shell_err);
                ExitCode::from(shell_err.exit_code())
            }
            None => {
                eprintln!("{:#}", err);
                ExitCode::FAILURE
            }
        },
    }
}
