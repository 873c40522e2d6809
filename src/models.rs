// ==============================================================================
// models.rs - Fileset Naming and Shared Data Models
// ==============================================================================
// Description: PLINK binary fileset paths, derived output names, shared enums
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================
// Naming conventions (all derived by appending to the dataset root, never by
// replacing an extension, since dataset roots often contain dots):
//   <root>.bed / <root>.bim / <root>.fam     binary fileset
//   <root>_RS_ONLY                            rsID-only filtered dataset
//   <root>_RS_UPDATED                         SNP IDs relabelled to rsIDs
//   <root>_exc_missnp_log                     dataset after exclusion
//   <out>.log / <out>-merge.missnp            PLINK merge side effects
//   <out>_MERGED_LOG_MISSNP.txt               combined exclusion list
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const RS_ONLY_SUFFIX: &str = "_RS_ONLY";
pub const RS_UPDATED_SUFFIX: &str = "_RS_UPDATED";
pub const EXCLUDED_SUFFIX: &str = "_exc_missnp_log";
pub const LOG_SUFFIX: &str = ".log";
pub const MISSNP_SUFFIX: &str = "-merge.missnp";
pub const MERGED_EXCLUSIONS_SUFFIX: &str = "_MERGED_LOG_MISSNP.txt";
pub const UNMAPPED_SUFFIX: &str = "_unmapped_snpIDs.txt";

/// Append a literal suffix to the final component of a path.
///
/// `Path::with_extension` would truncate roots such as `1kg.phase1`, so every
/// derived name in this crate goes through here instead.
pub fn append_to_path(path: &Path, suffix: &str) -> PathBuf {
    let mut joined: OsString = path.as_os_str().to_os_string();
    joined.push(suffix);
    PathBuf::from(joined)
}

/// A PLINK binary fileset addressed by its root (path without extension)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryFileset {
    root: PathBuf,
}

impl BinaryFileset {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bed(&self) -> PathBuf {
        append_to_path(&self.root, ".bed")
    }

    /// Marker file: one variant per line, identifier in column 2
    pub fn bim(&self) -> PathBuf {
        append_to_path(&self.root, ".bim")
    }

    pub fn fam(&self) -> PathBuf {
        append_to_path(&self.root, ".fam")
    }

    /// File name component of the root (e.g. "hapmap3" for "data/hapmap3")
    pub fn file_name(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Directory holding the fileset; "." when the root has no parent
    pub fn directory(&self) -> PathBuf {
        match self.root.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Derived fileset living next to this one
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self::new(append_to_path(&self.root, suffix))
    }

    /// True when .bed, .bim and .fam are all present
    pub fn is_complete(&self) -> bool {
        self.bed().is_file() && self.bim().is_file() && self.fam().is_file()
    }
}

impl std::fmt::Display for BinaryFileset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root.display())
    }
}

/// How the manifest and log blocks are combined into one exclusion list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Concatenate both sources as-is; an identifier in both appears twice
    #[default]
    Preserve,
    /// Keep only the first occurrence of each identifier line
    Dedup,
}

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Relabel,
    Extract,
    FirstMerge,
    Reconcile,
    Exclude,
    FinalMerge,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Relabel => "relabel",
            Stage::Extract => "extract",
            Stage::FirstMerge => "first_merge",
            Stage::Reconcile => "reconcile",
            Stage::Exclude => "exclude",
            Stage::FinalMerge => "final_merge",
        }
    }
}
