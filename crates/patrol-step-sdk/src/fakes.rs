//! In-memory test doubles for the executor and export sink.
//!
//! These are used by the unit tests of this crate and by the integration
//! tests of the `patrol-step` binary.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use crate::commands::ExternalCommand;
use crate::executor::CommandExecutor;
use crate::exporters::ArtifactSink;
use crate::types::StepError;

type Scripted = Result<String, String>;

/// Executor that answers from a script instead of spawning processes.
///
/// Each command can be given a queue of answers. Answers are consumed in
/// order; the last one repeats. Commands without a script succeed with empty
/// output unless the executor is [`strict`](ScriptedExecutor::strict).
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    script: RefCell<HashMap<ExternalCommand, VecDeque<Scripted>>>,
    calls: RefCell<Vec<ExternalCommand>>,
    streamed: RefCell<Vec<ExternalCommand>>,
    strict: bool,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unscripted commands fail instead of succeeding silently.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Queues a successful answer for `command`.
    pub fn respond(self, command: ExternalCommand, output: impl Into<String>) -> Self {
        self.push(command, Ok(output.into()));
        self
    }

    /// Queues a failing answer for `command`.
    pub fn fail(self, command: ExternalCommand, output: impl Into<String>) -> Self {
        self.push(command, Err(output.into()));
        self
    }

    fn push(&self, command: ExternalCommand, answer: Scripted) {
        self.script
            .borrow_mut()
            .entry(command)
            .or_default()
            .push_back(answer);
    }

    /// Every command passed to [`CommandExecutor::run`] or
    /// [`CommandExecutor::stream`], in call order.
    pub fn calls(&self) -> Vec<ExternalCommand> {
        self.calls.borrow().clone()
    }

    /// Commands passed to [`CommandExecutor::stream`] only.
    pub fn streamed(&self) -> Vec<ExternalCommand> {
        self.streamed.borrow().clone()
    }

    pub fn call_count(&self, command: &ExternalCommand) -> usize {
        self.calls.borrow().iter().filter(|c| *c == command).count()
    }

    /// Calls whose program is `program`.
    pub fn calls_to(&self, program: &str) -> Vec<ExternalCommand> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.program() == program)
            .cloned()
            .collect()
    }

    fn answer(&self, command: &ExternalCommand) -> Result<String, StepError> {
        self.calls.borrow_mut().push(command.clone());
        let mut script = self.script.borrow_mut();
        let answer = match script.get_mut(command) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        match answer {
            Some(Ok(output)) => Ok(output),
            Some(Err(output)) => Err(StepError::ExternalCommandFailure {
                command: command.to_string(),
                status: "exit status: 1".to_string(),
                output,
            }),
            None if self.strict => Err(StepError::Spawn {
                command: command.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not scripted"),
            }),
            None => Ok(String::new()),
        }
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn run(&self, command: &ExternalCommand) -> Result<String, StepError> {
        self.answer(command)
    }

    fn stream(&self, command: &ExternalCommand) -> Result<(), StepError> {
        self.streamed.borrow_mut().push(command.clone());
        self.answer(command).map(|_| ())
    }
}

/// Export sink that records every published key.
#[derive(Debug, Default)]
pub struct RecordingSink {
    exports: RefCell<Vec<(String, PathBuf)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exports(&self) -> Vec<(String, PathBuf)> {
        self.exports.borrow().clone()
    }

    pub fn get(&self, key: &str) -> Option<PathBuf> {
        self.exports
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }
}

impl ArtifactSink for RecordingSink {
    fn export(&self, key: &str, path: &Path) -> Result<(), StepError> {
        self.exports
            .borrow_mut()
            .push((key.to_string(), path.to_path_buf()));
        Ok(())
    }
}
