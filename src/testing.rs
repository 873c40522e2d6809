// ==============================================================================
// testing.rs - Test Doubles
// ==============================================================================
// Description: Recording PLINK stand-in that mimics merge side effects
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================

use std::sync::Mutex;

use crate::models::{append_to_path, LOG_SUFFIX, MISSNP_SUFFIX};
use crate::plink::{PlinkArgs, PlinkError, PlinkOutput, PlinkRunner};

/// Records every invocation and, on the first --bmerge, writes the scripted
/// log and missnp files next to `--out` the way PLINK would. PLINK 1.9 only
/// writes a missnp when the merge fails, so `merge_fails` makes that first
/// merge exit non-zero after its side effects are on disk.
#[derive(Default)]
pub(crate) struct RecordingPlink {
    pub calls: Mutex<Vec<(PlinkArgs, String)>>,
    /// Contents of every --extract / --update-name file at the time of the call
    pub list_files: Mutex<Vec<String>>,
    pub merge_log: Option<String>,
    pub merge_missnp: Option<String>,
    /// Fail any invocation whose label contains this text
    pub fail_on: Option<String>,
    pub merge_fails: bool,
}

impl RecordingPlink {
    pub fn with_merge_output(log: Option<&str>, missnp: Option<&str>) -> Self {
        Self {
            merge_log: log.map(str::to_string),
            merge_missnp: missnp.map(str::to_string),
            ..Default::default()
        }
    }

    /// First merge writes its log/missnp and then exits non-zero, as PLINK 1.9 does
    pub fn with_failed_merge(log: Option<&str>, missnp: Option<&str>) -> Self {
        Self {
            merge_fails: true,
            ..Self::with_merge_output(log, missnp)
        }
    }

    pub fn calls(&self) -> Vec<(PlinkArgs, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_files(&self) -> Vec<String> {
        self.list_files.lock().unwrap().clone()
    }
}

impl PlinkRunner for RecordingPlink {
    async fn run(&self, args: &PlinkArgs, label: &str) -> Result<PlinkOutput, PlinkError> {
        let merges_before = self
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(call, _)| call.bmerge.is_some())
            .count();
        self.calls
            .lock()
            .unwrap()
            .push((args.clone(), label.to_string()));

        for list in [&args.extract, &args.update_name].into_iter().flatten() {
            let contents = std::fs::read_to_string(list).unwrap_or_default();
            self.list_files.lock().unwrap().push(contents);
        }

        if let Some(needle) = &self.fail_on {
            if label.contains(needle.as_str()) {
                return Err(PlinkError::Failed {
                    label: label.to_string(),
                    code: Some(2),
                    message: "Error: simulated failure".to_string(),
                });
            }
        }

        if args.bmerge.is_some() && merges_before == 0 {
            if let Some(out) = &args.out {
                if let Some(log) = &self.merge_log {
                    std::fs::write(append_to_path(out, LOG_SUFFIX), log)?;
                }
                if let Some(missnp) = &self.merge_missnp {
                    std::fs::write(append_to_path(out, MISSNP_SUFFIX), missnp)?;
                }
            }
            if self.merge_fails {
                return Err(PlinkError::Failed {
                    label: label.to_string(),
                    code: Some(3),
                    message: "Error: 1 variant with 3+ alleles present.".to_string(),
                });
            }
        }

        Ok(PlinkOutput::default())
    }
}
