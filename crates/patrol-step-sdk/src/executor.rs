//! Process execution capability.
//!
//! Components that talk to external tools receive a `&dyn CommandExecutor`
//! explicitly. [`ProcessExecutor`] spawns real processes; tests use
//! [`ScriptedExecutor`](crate::fakes::ScriptedExecutor).

use std::io::{self, BufRead, BufReader, Read};
use std::process::{Command, Output, Stdio};
use std::thread;

use crate::commands::ExternalCommand;
use crate::types::StepError;

/// Runs [`ExternalCommand`]s on behalf of the step.
pub trait CommandExecutor {
    /// Runs the command to completion and returns its captured output
    /// (stdout followed by stderr). A non-zero exit is an error carrying that
    /// output.
    fn run(&self, command: &ExternalCommand) -> Result<String, StepError>;

    /// Runs the command while forwarding its stdout and stderr line by line.
    fn stream(&self, command: &ExternalCommand) -> Result<(), StepError>;
}

/// Executes commands as child processes of the step.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    working_dir: Option<std::path::PathBuf>,
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every command from `dir` instead of the current directory.
    pub fn working_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn command(&self, command: &ExternalCommand) -> Command {
        let mut cmd = Command::new(command.program());
        cmd.args(command.args());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl CommandExecutor for ProcessExecutor {
    fn run(&self, command: &ExternalCommand) -> Result<String, StepError> {
        tracing::debug!(command = %command, "running");
        let output = self
            .command(command)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| StepError::Spawn {
                command: command.to_string(),
                source,
            })?;
        captured_output(command, output)
    }

    fn stream(&self, command: &ExternalCommand) -> Result<(), StepError> {
        tracing::debug!(command = %command, "streaming");
        let mut child = self
            .command(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| StepError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Both forwarders are joined before the scope ends, on every path.
        let status = thread::scope(|scope| {
            if let Some(out) = stdout {
                scope.spawn(move || forward_lines(out, |line| println!("{}", line)));
            }
            if let Some(err) = stderr {
                scope.spawn(move || forward_lines(err, |line| eprintln!("{}", line)));
            }
            child.wait()
        })
        .map_err(|source| StepError::Spawn {
            command: command.to_string(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(StepError::ExternalCommandFailure {
                command: command.to_string(),
                status: status.to_string(),
                output: "see streamed output above".to_string(),
            })
        }
    }
}

/// Emits each line of `pipe`, decoding invalid UTF-8 lossily. The pipe is
/// always read to EOF, even after a read error.
fn forward_lines(pipe: impl Read, mut emit: impl FnMut(&str)) {
    let mut reader = BufReader::new(pipe);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => return,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                emit(text.trim_end_matches(['\n', '\r']));
            }
            Err(err) => {
                tracing::warn!(error = %err, "stopped forwarding command output");
                let _ = io::copy(&mut reader, &mut io::sink());
                return;
            }
        }
    }
}

fn captured_output(command: &ExternalCommand, output: Output) -> Result<String, StepError> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut combined = stdout.into_owned();
    if !stderr.trim().is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&stderr);
    }

    if output.status.success() {
        Ok(combined)
    } else {
        Err(StepError::ExternalCommandFailure {
            command: command.to_string(),
            status: output.status.to_string(),
            output: combined,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command_not_found() {
        let cmd = ExternalCommand::new("nonexistent-command-12345", Vec::<String>::new());
        let err = ProcessExecutor::new().run(&cmd).unwrap_err();
        assert!(matches!(err, StepError::Spawn { .. }));
        assert!(err.to_string().contains("failed to start"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_stdout_and_stderr() {
        let cmd = ExternalCommand::shell("echo out; echo err 1>&2");
        let output = ProcessExecutor::new().run(&cmd).unwrap();
        assert!(output.contains("out"));
        assert!(output.contains("err"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_failure_keeps_output() {
        let cmd = ExternalCommand::shell("echo broken tool; exit 3");
        let err = ProcessExecutor::new().run(&cmd).unwrap_err();
        match err {
            StepError::ExternalCommandFailure { output, .. } => {
                assert!(output.contains("broken tool"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_stream_reports_exit_status() {
        let executor = ProcessExecutor::new();
        assert!(executor.stream(&ExternalCommand::shell("echo streaming")).is_ok());
        assert!(matches!(
            executor.stream(&ExternalCommand::shell("exit 1")),
            Err(StepError::ExternalCommandFailure { .. })
        ));
    }

    #[test]
    fn test_forward_lines_decodes_invalid_utf8() {
        let input: &[u8] = b"ok\n\xff\xfe\r\nlast";
        let mut lines = Vec::new();
        forward_lines(input, |line| lines.push(line.to_string()));
        assert_eq!(lines, ["ok", "\u{fffd}\u{fffd}", "last"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_stream_survives_invalid_utf8_followed_by_bulk_output() {
        let script = "printf 'ok\\n\\377\\376\\n'; \
                      i=0; while [ $i -lt 20000 ]; do echo \"line $i\"; i=$((i+1)); done; \
                      exit 0";
        let result = ProcessExecutor::new().stream(&ExternalCommand::shell(script));
        assert!(result.is_ok(), "{:?}", result);
    }

    #[cfg(unix)]
    #[test]
    fn test_working_dir_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let executor = ProcessExecutor::new().working_dir(dir.path());
        executor.run(&ExternalCommand::shell("touch marker")).unwrap();
        assert!(dir.path().join("marker").exists());
    }
}
