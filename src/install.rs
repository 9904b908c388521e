/*
 * Copyright 2022 Collabora, Ltd.
 *
 * SPDX-License-Identifier: MIT
 */
use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use log::{trace, warn};
use thiserror::Error;

use crate::config::{InstallSpec, InstallSpecError};
use crate::InstallTarget;

/// The system package directory everything is installed into.
pub const LIB_DIR: &str = "/usr/lib/python3/dist-packages";

/// The owner every installed file is assigned, as `user:group`.
pub const OWNER: &str = "root:root";

/// The permission mode every installed file is assigned.
pub const MODE: u32 = 0o775;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("could not find file {}", .0.to_string_lossy())]
    Find(PathBuf),
    #[error("IO error while installing {}: {}", .0.to_string_lossy(), .1)]
    IO(PathBuf, std::io::Error),
    #[error("IO error finding current directory: {0}")]
    EnvIO(std::io::Error),
    #[error("unable to change ownership of {}: {}", .0.to_string_lossy(), .1)]
    Chown(PathBuf, std::io::Error),
    #[error("a file was expected for {}", .0.to_string_lossy())]
    ExpectedFile(PathBuf),
    #[error("cannot find parent directory of {}", .0.to_string_lossy())]
    NoParent(PathBuf),
    #[error("error reading install manifest: {0}")]
    InstallSpec(#[from] InstallSpecError),
    #[error("malformed owner {0}; expected user:group")]
    BadOwner(String),
    #[error("cannot find requested user {0}")]
    UnknownUser(String),
    #[error("cannot find requested group {0}")]
    UnknownGroup(String),
    #[error("the files {} and {} would both install as {}", .0.to_string_lossy(), .1.to_string_lossy(), .2)]
    ConflictingTargets(PathBuf, PathBuf, String),
}

type InstallResult<T> = Result<T, InstallError>;

/// The uid/gid pair installed files are handed over to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ownership {
    pub uid: u32,
    pub gid: u32,
}

impl Ownership {
    /// Resolve a `user:group` string against the system account databases.
    pub fn resolve(owner: &str) -> InstallResult<Ownership> {
        let (user, group) = owner
            .split_once(':')
            .ok_or_else(|| InstallError::BadOwner(owner.to_string()))?;
        let user = users::get_user_by_name(user)
            .ok_or_else(|| InstallError::UnknownUser(user.to_string()))?;
        let group = users::get_group_by_name(group)
            .ok_or_else(|| InstallError::UnknownGroup(group.to_string()))?;
        Ok(Ownership {
            uid: user.uid(),
            gid: group.gid(),
        })
    }
}

struct PathContext {
    locations: Vec<PathBuf>,
}

impl PathContext {
    pub fn new(locations: Vec<PathBuf>) -> Self {
        Self { locations }
    }

    fn find_path<P: AsRef<Path>>(&self, target: P) -> InstallResult<PathBuf> {
        for loc in &self.locations {
            let p = loc.join(target.as_ref());
            if p.exists() {
                return Ok(p);
            }
        }
        Err(InstallError::Find(target.as_ref().to_path_buf()))
    }
}

/// Find the `*.py` files directly under `dir`, sorted by name so the
/// install order is deterministic.
pub fn discover_sources<P: AsRef<Path>>(dir: P) -> InstallResult<Vec<PathBuf>> {
    trace!("discovering *.py files under {:?}", dir.as_ref());
    let mut sources = Vec::new();
    for entry in dir
        .as_ref()
        .read_dir()
        .map_err(|e| InstallError::IO(dir.as_ref().to_path_buf(), e))?
    {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.extension().map_or(true, |ext| ext != "py") {
                    continue;
                }
                let kind = entry
                    .metadata()
                    .map_err(|e| InstallError::IO(path.clone(), e))?
                    .file_type();
                if kind.is_file() {
                    sources.push(path);
                } else {
                    warn!("skipped {}: not a regular file", path.to_string_lossy());
                }
            }
            Err(e) => {
                warn!("skipped entry: {}", e);
            }
        }
    }
    sources.sort();
    Ok(sources)
}

/// Map each source onto its destination under `lib_dir`.
///
/// The destination is always the library directory joined with the source's
/// base name, so two different sources sharing a base name are an error.
pub fn plan_targets<P, Q>(sources: &[P], lib_dir: Q) -> InstallResult<Vec<InstallTarget>>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut seen = BTreeMap::new();
    let mut targets = Vec::new();

    for source in sources {
        let source = source.as_ref();
        let filename = source
            .file_name()
            .ok_or_else(|| InstallError::ExpectedFile(source.to_path_buf()))?;
        let name = filename.to_string_lossy().to_string();

        if let Some(old_source) = seen.insert(name.clone(), source.to_path_buf()) {
            if old_source.as_path() != source {
                return Err(InstallError::ConflictingTargets(
                    old_source,
                    source.to_path_buf(),
                    name,
                ));
            }
            continue;
        }

        targets.push(InstallTarget {
            source: source.to_path_buf(),
            destination: lib_dir.as_ref().join(filename),
        });
    }

    Ok(targets)
}

fn install_file(target: &InstallTarget, owner: Ownership, mode: u32) -> InstallResult<()> {
    if !target.source.is_file() {
        return Err(InstallError::Find(target.source.clone()));
    }

    trace!(
        "install {} -> {}",
        target.source.to_string_lossy(),
        target.destination.to_string_lossy()
    );

    fs::copy(&target.source, &target.destination)
        .map_err(|e| InstallError::IO(target.destination.clone(), e))?;
    std::os::unix::fs::chown(&target.destination, Some(owner.uid), Some(owner.gid))
        .map_err(|e| InstallError::Chown(target.destination.clone(), e))?;
    fs::set_permissions(&target.destination, fs::Permissions::from_mode(mode))
        .map_err(|e| InstallError::IO(target.destination.clone(), e))?;

    Ok(())
}

/// Install each target in list order, stopping at the first failure.
///
/// Files are written in place with no staging: a failure part way through
/// leaves the targets before it installed and the rest untouched.
pub fn install(targets: &[InstallTarget], owner: Ownership, mode: u32) -> InstallResult<()> {
    for target in targets {
        install_file(target, owner, mode)?;
    }
    Ok(())
}

/// Run a whole installation against the fixed system constants.
///
/// With a manifest, its file list is resolved against the working directory
/// and the manifest's own directory; without one, `*.py` files are taken
/// from the working directory. Returns the installed targets.
pub fn run<P: AsRef<Path>>(manifest: Option<P>) -> InstallResult<Vec<InstallTarget>> {
    let wd = std::env::current_dir().map_err(InstallError::EnvIO)?;

    let sources = match manifest {
        Some(ref arg) => {
            let path = PathBuf::from(arg.as_ref().as_os_str());
            let spec_dir = fs::canonicalize(&path)
                .map_err(|e| InstallError::IO(arg.as_ref().to_path_buf(), e))
                .and_then(|p| {
                    p.parent()
                        .map(Path::to_path_buf)
                        .ok_or(InstallError::NoParent(p))
                })?;

            let pc = PathContext::new(vec![wd, spec_dir]);

            let spec = InstallSpec::load(arg)?;
            InstallSpec::check(&spec)?;

            spec.files
                .iter()
                .map(|f| pc.find_path(f))
                .collect::<InstallResult<Vec<_>>>()?
        }
        None => discover_sources(&wd)?,
    };

    let targets = plan_targets(&sources, LIB_DIR)?;
    let owner = Ownership::resolve(OWNER)?;
    install(&targets, owner, MODE)?;

    Ok(targets)
}
