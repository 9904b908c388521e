/*
 * Copyright 2022 Collabora, Ltd.
 *
 * SPDX-License-Identifier: MIT
 */
use std::path::PathBuf;

pub mod config;
pub mod install;

/// A file waiting to be installed into the library directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallTarget {
    /// The location on disk of the file
    pub source: PathBuf,
    /// The file's destination path under the library directory
    pub destination: PathBuf,
}
