/*
 * Copyright 2022 Collabora, Ltd.
 *
 * SPDX-License-Identifier: MIT
 */
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallSpecError {
    #[error("IO error opening manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("a manifest must list at least one file")]
    NoFiles,
    #[error("the manifest entry {0} was specified multiple times")]
    DuplicateEntry(String),
}

/// A manifest enumerating the files to install.
///
/// Alternative to discovering `*.py` files in the working directory; paths
/// are taken relative to the working directory or the manifest itself.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct InstallSpec {
    pub files: Vec<String>,
}

impl InstallSpec {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<InstallSpec, InstallSpecError> {
        let file = File::open(path.as_ref())?;
        Ok(serde_yaml::from_reader(file)?)
    }

    pub fn check(spec: &InstallSpec) -> Result<(), InstallSpecError> {
        if spec.files.is_empty() {
            return Err(InstallSpecError::NoFiles);
        }

        for (i, file) in spec.files.iter().enumerate() {
            if spec.files[..i].contains(file) {
                return Err(InstallSpecError::DuplicateEntry(file.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempdir::TempDir;

    use super::*;

    fn write_manifest(dir: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("install.yaml");
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn load_lists_files_in_order() {
        let dir = TempDir::new("pylib-install").unwrap();
        let path = write_manifest(
            &dir,
            "Files:\n  - htmlbuilder.py\n  - persist.py\n  - coh_utils.py\n",
        );

        let spec = InstallSpec::load(&path).unwrap();
        assert_eq!(spec.files, ["htmlbuilder.py", "persist.py", "coh_utils.py"]);
        assert!(InstallSpec::check(&spec).is_ok());
    }

    #[test]
    fn empty_manifest_is_rejected() {
        let dir = TempDir::new("pylib-install").unwrap();
        let path = write_manifest(&dir, "Files: []\n");

        let spec = InstallSpec::load(&path).unwrap();
        assert!(matches!(
            InstallSpec::check(&spec),
            Err(InstallSpecError::NoFiles)
        ));
    }

    #[test]
    fn repeated_entries_are_rejected() {
        let dir = TempDir::new("pylib-install").unwrap();
        let path = write_manifest(&dir, "Files:\n  - persist.py\n  - persist.py\n");

        let spec = InstallSpec::load(&path).unwrap();
        match InstallSpec::check(&spec) {
            Err(InstallSpecError::DuplicateEntry(name)) => assert_eq!(name, "persist.py"),
            other => panic!("expected duplicate entry error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = TempDir::new("pylib-install").unwrap();
        let path = write_manifest(&dir, "Files:\n  - persist.py\nOwner: nobody\n");

        assert!(matches!(
            InstallSpec::load(&path),
            Err(InstallSpecError::Yaml(_))
        ));
    }

    #[test]
    fn missing_manifest_is_an_io_error() {
        let dir = TempDir::new("pylib-install").unwrap();
        let path = dir.path().join("absent.yaml");

        assert!(matches!(
            InstallSpec::load(&path),
            Err(InstallSpecError::Io(_))
        ));
    }
}
