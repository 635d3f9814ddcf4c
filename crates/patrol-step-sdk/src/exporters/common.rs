//! Helpers shared by the Android and iOS exporters.
//!
//! Discovery reads the filesystem directly; every mutation (folder creation,
//! copying, archiving) goes through the executor.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use super::ArtifactSink;
use crate::commands;
use crate::executor::CommandExecutor;
use crate::print::Printer;
use crate::types::{ArtifactDescriptor, StepError};

/// Ensures `folder` exists (`mkdir -p`).
pub fn create_folder(executor: &dyn CommandExecutor, folder: &Path) -> Result<(), StepError> {
    executor.run(&commands::create_folder(folder)).map(|_| ())
}

/// Copies each artifact into its destination folder and publishes its key.
///
/// Destination folders are created first. Returns the absolute destination
/// paths in input order.
pub fn copy_artifacts(
    executor: &dyn CommandExecutor,
    sink: &dyn ArtifactSink,
    printer: Printer,
    artifacts: &[ArtifactDescriptor],
) -> Result<Vec<PathBuf>, StepError> {
    let mut folders: Vec<&Path> = Vec::new();
    for artifact in artifacts {
        if !folders.contains(&artifact.destination_folder.as_path()) {
            folders.push(&artifact.destination_folder);
        }
    }
    for folder in folders {
        create_folder(executor, folder)?;
    }

    let mut exported = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let destination = absolute(&artifact.destination())?;
        executor.run(&commands::copy_to(&artifact.source, &destination))?;
        printer.success(&format!("Copied to {}", destination.display()));

        if let Some(key) = artifact.export_key {
            sink.export(key, &destination)?;
            printer.success(&format!(
                "Artifact: {} exported into: {}",
                destination.display(),
                key
            ));
        }
        exported.push(destination);
    }
    Ok(exported)
}

/// Archives `inputs` into `archive` with `zip -r`.
pub fn zip_files(
    executor: &dyn CommandExecutor,
    archive: &Path,
    inputs: &[PathBuf],
) -> Result<PathBuf, StepError> {
    if archive.as_os_str().is_empty() {
        return Err(StepError::NotFound("zip archive path is empty".to_string()));
    }
    if inputs.is_empty() {
        return Err(StepError::NotFound(format!(
            "no input paths to zip into {}",
            archive.display()
        )));
    }
    executor.run(&commands::zip_recursive(archive, inputs))?;
    Ok(archive.to_path_buf())
}

/// Walks `root` depth-first in name order and returns the first file whose
/// name matches `pattern`. A missing `root` yields `None`.
pub fn find_first_file(root: &Path, pattern: &Regex) -> Result<Option<PathBuf>, StepError> {
    if !root.exists() {
        return Ok(None);
    }
    for entry in sorted_entries(root)? {
        if entry.is_dir() {
            if let Some(found) = find_first_file(&entry, pattern)? {
                return Ok(Some(found));
            }
        } else if entry
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| pattern.is_match(name))
        {
            return Ok(Some(entry));
        }
    }
    Ok(None)
}

/// Direct children of `dir` with the given extension, sorted by path.
pub fn find_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, StepError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(extension))
        .collect())
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, StepError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| StepError::io(dir, e))? {
        entries.push(entry.map_err(|e| StepError::io(dir, e))?.path());
    }
    entries.sort();
    Ok(entries)
}

fn absolute(path: &Path) -> Result<PathBuf, StepError> {
    std::path::absolute(path).map_err(|e| StepError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{RecordingSink, ScriptedExecutor};

    #[test]
    fn test_find_first_file_walks_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("b/app-debug.apk"), b"").unwrap();
        fs::write(dir.path().join("a/app-debug.apk"), b"").unwrap();
        fs::write(dir.path().join("a/notes.txt"), b"").unwrap();

        let pattern = Regex::new(r"^app-debug\.apk$").unwrap();
        let found = find_first_file(dir.path(), &pattern).unwrap();
        assert_eq!(found, Some(dir.path().join("a/app-debug.apk")));
    }

    #[test]
    fn test_find_first_file_missing_root() {
        let pattern = Regex::new(".*").unwrap();
        let found = find_first_file(Path::new("/nonexistent/patrol/outputs"), &pattern).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_find_with_extension_is_sorted_and_shallow() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.xctestrun"), b"").unwrap();
        fs::write(dir.path().join("a.xctestrun"), b"").unwrap();
        fs::write(dir.path().join("c.zip"), b"").unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/d.xctestrun"), b"").unwrap();

        let found = find_with_extension(dir.path(), "xctestrun").unwrap();
        assert_eq!(
            found,
            vec![dir.path().join("a.xctestrun"), dir.path().join("b.xctestrun")]
        );
    }

    #[test]
    fn test_zip_files_rejects_empty_inputs() {
        let executor = ScriptedExecutor::new();
        assert!(zip_files(&executor, Path::new("out.zip"), &[]).is_err());
        assert!(zip_files(&executor, Path::new(""), &[PathBuf::from("a")]).is_err());
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn test_zip_files_propagates_failure() {
        let archive = Path::new("out.zip");
        let inputs = vec![PathBuf::from("Debug-iphonesimulator")];
        let executor = ScriptedExecutor::new()
            .fail(commands::zip_recursive(archive, &inputs), "zip error: Nothing to do!");
        let err = zip_files(&executor, archive, &inputs).unwrap_err();
        assert!(err.to_string().contains("Nothing to do"));
    }

    #[test]
    fn test_copy_artifacts_creates_folder_then_copies_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("patrol/android");
        let artifacts = vec![
            ArtifactDescriptor::new("in/app-debug.apk", &dest, Some("ANDROID_APK_PATH")),
            ArtifactDescriptor::new("in/notes.txt", &dest, None),
        ];
        let executor = ScriptedExecutor::new();
        let sink = RecordingSink::new();

        let exported = copy_artifacts(&executor, &sink, Printer::plain(), &artifacts).unwrap();

        let calls = executor.calls();
        assert_eq!(calls[0], commands::create_folder(&dest));
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].program(), "cp");
        assert_eq!(exported[0], dest.join("app-debug.apk"));
        assert_eq!(sink.exports(), vec![("ANDROID_APK_PATH".to_string(), dest.join("app-debug.apk"))]);
    }

    #[test]
    fn test_copy_artifacts_stops_on_copy_failure() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("patrol/ios");
        let artifact = ArtifactDescriptor::new("Runner.app", &dest, Some("IOS_APP_UNDER_TEST"));
        let executor = ScriptedExecutor::new().fail(
            commands::copy_to(Path::new("Runner.app"), &dest.join("Runner.app")),
            "cp: Runner.app: No such file or directory",
        );
        let sink = RecordingSink::new();

        assert!(copy_artifacts(&executor, &sink, Printer::plain(), &[artifact]).is_err());
        assert!(sink.exports().is_empty());
    }
}
