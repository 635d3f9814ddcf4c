//! External command descriptors.
//!
//! The step never runs tools directly; it builds an [`ExternalCommand`] and
//! hands it to a [`CommandExecutor`](crate::executor::CommandExecutor).
//! Descriptors are immutable values. Overrides go through the `with_*`
//! methods, which return a new command and leave the original untouched.

use std::fmt;
use std::path::Path;

/// A program name and its ordered argument list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
}

impl ExternalCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Wraps a full shell line in `sh -c`.
    pub fn shell(line: impl Into<String>) -> Self {
        Self::new("sh", ["-c".to_string(), line.into()])
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Copy with a different program.
    pub fn with_program(&self, program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: self.args.clone(),
        }
    }

    /// Copy with the argument list replaced.
    pub fn with_args<I, S>(&self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: self.program.clone(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Copy with one more trailing argument.
    pub fn with_arg(&self, arg: impl Into<String>) -> Self {
        let mut args = self.args.clone();
        args.push(arg.into());
        Self {
            program: self.program.clone(),
            args,
        }
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Compares two commands by program and full ordered argument list.
pub fn is_same_command(a: &ExternalCommand, b: &ExternalCommand) -> bool {
    a.program == b.program && a.args == b.args
}

/// `flutter --version`
pub fn flutter_version() -> ExternalCommand {
    ExternalCommand::new("flutter", ["--version"])
}

/// `flutter pub deps --style=compact`
pub fn flutter_pub_dependencies() -> ExternalCommand {
    ExternalCommand::new("flutter", ["pub", "deps", "--style=compact"])
}

/// `patrol doctor --verbose`, whose banner carries the CLI version.
pub fn patrol_doctor() -> ExternalCommand {
    ExternalCommand::new("patrol", ["doctor", "--verbose"])
}

/// `dart pub global activate patrol_cli [version]`
pub fn patrol_install(version: Option<&str>) -> ExternalCommand {
    let base = ExternalCommand::new("dart", ["pub", "global", "activate", "patrol_cli"]);
    match version.map(str::trim).filter(|v| !v.is_empty()) {
        Some(version) => base.with_arg(version),
        None => base,
    }
}

/// `mkdir -p <folder>`
pub fn create_folder(folder: &Path) -> ExternalCommand {
    ExternalCommand::new("mkdir", ["-p".to_string(), path_arg(folder)])
}

/// `cp -R <source> <destination>`; `-R` so `.app` bundles copy as directories.
pub fn copy_to(source: &Path, destination: &Path) -> ExternalCommand {
    ExternalCommand::new(
        "cp",
        ["-R".to_string(), path_arg(source), path_arg(destination)],
    )
}

/// `zip -r <archive> <inputs...>`
pub fn zip_recursive(archive: &Path, inputs: &[impl AsRef<Path>]) -> ExternalCommand {
    let mut args = vec!["-r".to_string(), path_arg(archive)];
    args.extend(inputs.iter().map(|p| path_arg(p.as_ref())));
    ExternalCommand::new("zip", args)
}

/// `envman add --key <key> --value <value>`
pub fn envman_add(key: &str, value: &str) -> ExternalCommand {
    ExternalCommand::new("envman", ["add", "--key", key, "--value", value])
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
