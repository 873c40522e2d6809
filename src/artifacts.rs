// ==============================================================================
// artifacts.rs - Temporary Artifact Cleanup
// ==============================================================================
// Description: Scoped removal of intermediate files handed to PLINK
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Intermediate file removed when the guard goes out of scope.
///
/// Removal happens on every exit path, including early returns from a failed
/// PLINK run. A guard created with `keep = true` leaves the file in place.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
    keep: bool,
}

impl TempArtifact {
    pub fn new(path: impl Into<PathBuf>, keep: bool) -> Self {
        Self {
            path: path.into(),
            keep,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Leave the file on disk after the guard is dropped
    pub fn persist(&mut self) {
        self.keep = true;
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if self.keep {
            debug!("Keeping intermediate file: {:?}", self.path);
            return;
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed intermediate file: {:?}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove intermediate file {:?}: {}", self.path, e),
        }
    }
}
