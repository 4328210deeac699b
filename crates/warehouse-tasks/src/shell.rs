//! Echoing subprocess runner.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::info;

/// A command that ran but did not succeed, or could not be started.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command failed ({}): {command}", exit_description(.code))]
    Failed { command: String, code: Option<i32> },
}

impl ShellError {
    /// Exit code to hand back to the caller's shell.
    pub fn exit_code(&self) -> u8 {
        match self {
            ShellError::Failed {
                code: Some(code), ..
            } => u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1),
            _ => 1,
        }
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;

/// Runs commands from a fixed working directory, logging each one first.
pub struct Shell {
    root: PathBuf,
}

impl Shell {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn command(&self, program: &str, args: &[String], envs: &[(String, String)]) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(&self.root);
        for (key, value) in envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run with inherited stdio.
    pub fn run(&self, program: &str, args: &[String]) -> Result<()> {
        self.run_with_env(program, args, &[])
    }

    pub fn run_with_env(
        &self,
        program: &str,
        args: &[String],
        envs: &[(String, String)],
    ) -> Result<()> {
        let shown = display_command(program, args);
        info!("$ {}", shown);

        let status = self
            .command(program, args, envs)
            .status()
            .map_err(|source| ShellError::Spawn {
                command: shown.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(ShellError::Failed {
                command: shown,
                code: status.code(),
            })
        }
    }

    /// Run and capture stdout.
    pub fn output(&self, program: &str, args: &[String]) -> Result<String> {
        let shown = display_command(program, args);
        info!("$ {}", shown);

        let output = self
            .command(program, args, &[])
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| ShellError::Spawn {
                command: shown.clone(),
                source,
            })?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(ShellError::Failed {
                command: shown,
                code: output.status.code(),
            })
        }
    }
}

/// Argument vector from string literals.
pub fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}

fn display_command(program: &str, args: &[String]) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(args.iter().map(|arg| {
        if arg.contains(char::is_whitespace) {
            format!("'{}'", arg)
        } else {
            arg.clone()
        }
    }));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_command_quotes_spaces() {
        assert_eq!(
            display_command("git", &args(&["commit", "-m", "Bumped version to 13.5.0"])),
            "git commit -m 'Bumped version to 13.5.0'"
        );
    }

    #[test]
    fn test_exit_code() {
        let failed = ShellError::Failed {
            command: "x".to_string(),
            code: Some(3),
        };
        assert_eq!(failed.exit_code(), 3);

        let signalled = ShellError::Failed {
            command: "x".to_string(),
            code: None,
        };
        assert_eq!(signalled.exit_code(), 1);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let shell = Shell::new(std::env::temp_dir());
        let err = shell
            .run("warehouse-tasks-no-such-program", &[])
            .unwrap_err();
        assert!(matches!(err, ShellError::Spawn { .. }));
    }

    #[test]
    fn test_run_reports_failed_command_and_code() {
        let shell = Shell::new(std::env::temp_dir());
        shell.run("sh", &args(&["-c", "exit 0"])).unwrap();

        let err = shell.run("sh", &args(&["-c", "exit 3"])).unwrap_err();
        match &err {
            ShellError::Failed { command, code } => {
                assert_eq!(command, "sh -c 'exit 3'");
                assert_eq!(*code, Some(3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_output_captures_stdout() {
        let shell = Shell::new(std::env::temp_dir());
        let out = shell.output("sh", &args(&["-c", "echo refs/heads/master"])).unwrap();
        assert_eq!(out.trim(), "refs/heads/master");
    }
}
