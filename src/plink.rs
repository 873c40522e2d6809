// ==============================================================================
// plink.rs - PLINK Invocation
// ==============================================================================
// Description: Typed PLINK argument set, command-line rendering, process runner
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================
// PLINK 1.9 reference: https://www.cog-genomics.org/plink/1.9/
// Side effects relied upon by this crate:
//   <out>.log             always written
//   <out>-merge.missnp    written when --bmerge hits strand/allele conflicts;
//                         PLINK then exits non-zero
// ==============================================================================

use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Flags understood by this wrapper, in rendering order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlinkFlag {
    BFile,
    BMerge,
    Extract,
    Exclude,
    UpdateName,
    MakeBed,
    NoWeb,
    AllowNoSex,
    Out,
}

impl PlinkFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlinkFlag::BFile => "--bfile",
            PlinkFlag::BMerge => "--bmerge",
            PlinkFlag::Extract => "--extract",
            PlinkFlag::Exclude => "--exclude",
            PlinkFlag::UpdateName => "--update-name",
            PlinkFlag::MakeBed => "--make-bed",
            PlinkFlag::NoWeb => "--noweb",
            PlinkFlag::AllowNoSex => "--allow-no-sex",
            PlinkFlag::Out => "--out",
        }
    }
}

/// One PLINK invocation.
///
/// Path-valued keys render as `--flag value`; boolean keys render as a bare
/// `--flag` when set and are omitted otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlinkArgs {
    pub bfile: Option<PathBuf>,
    pub bmerge: Option<PathBuf>,
    pub extract: Option<PathBuf>,
    pub exclude: Option<PathBuf>,
    pub update_name: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub make_bed: bool,
    pub noweb: bool,
    pub allow_no_sex: bool,
}

impl PlinkArgs {
    /// Arguments for an invocation that reads `bfile` and writes a new binary fileset
    pub fn dataset(bfile: impl AsRef<Path>, out: impl AsRef<Path>) -> Self {
        Self {
            bfile: Some(bfile.as_ref().to_path_buf()),
            out: Some(out.as_ref().to_path_buf()),
            make_bed: true,
            ..Default::default()
        }
    }

    /// Copy the session-wide switches (`noweb`, `allow_no_sex`) from `base`
    pub fn inherit(mut self, base: &PlinkArgs) -> Self {
        self.noweb = base.noweb;
        self.allow_no_sex = base.allow_no_sex;
        self
    }

    /// Flag/value pairs in rendering order
    pub fn entries(&self) -> Vec<(PlinkFlag, Option<&Path>)> {
        let valued = [
            (PlinkFlag::BFile, &self.bfile),
            (PlinkFlag::BMerge, &self.bmerge),
            (PlinkFlag::Extract, &self.extract),
            (PlinkFlag::Exclude, &self.exclude),
            (PlinkFlag::UpdateName, &self.update_name),
        ];
        let switches = [
            (PlinkFlag::MakeBed, self.make_bed),
            (PlinkFlag::NoWeb, self.noweb),
            (PlinkFlag::AllowNoSex, self.allow_no_sex),
        ];

        let mut entries: Vec<(PlinkFlag, Option<&Path>)> = valued
            .into_iter()
            .filter_map(|(flag, value)| value.as_deref().map(|path| (flag, Some(path))))
            .collect();
        entries.extend(
            switches
                .into_iter()
                .filter(|(_, enabled)| *enabled)
                .map(|(flag, _)| (flag, None)),
        );
        if let Some(out) = self.out.as_deref() {
            entries.push((PlinkFlag::Out, Some(out)));
        }
        entries
    }

    /// Render to process arguments
    pub fn render(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        for (flag, value) in self.entries() {
            args.push(OsString::from(flag.as_str()));
            if let Some(path) = value {
                args.push(path.as_os_str().to_os_string());
            }
        }
        args
    }
}

impl std::fmt::Display for PlinkArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self
            .render()
            .iter()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect();
        write!(f, "{}", rendered.join(" "))
    }
}

/// Errors surfaced from running PLINK
#[derive(Error, Debug)]
pub enum PlinkError {
    #[error("PLINK executable not found: {0}")]
    NotFound(String),

    #[error("Failed to start {binary}: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error while waiting for PLINK: {0}")]
    Io(#[from] std::io::Error),

    /// `message` is stderr, or the tail of stdout when stderr is empty
    /// (PLINK 1.9 prints its "Error:" lines to stdout)
    #[error("PLINK failed during '{label}' (exit code {code:?}): {message}")]
    Failed {
        label: String,
        code: Option<i32>,
        message: String,
    },

    #[error("PLINK timed out after {after:?} during '{label}'")]
    TimedOut { label: String, after: Duration },
}

/// Captured output of a successful run
#[derive(Debug, Clone, Default)]
pub struct PlinkOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Something that can execute a PLINK invocation to completion
#[allow(async_fn_in_trait)]
pub trait PlinkRunner {
    /// Run PLINK with `args` and wait for it. `label` describes the step for logs.
    async fn run(&self, args: &PlinkArgs, label: &str) -> Result<PlinkOutput, PlinkError>;
}

/// Runs the real PLINK binary as a child process
#[derive(Debug, Clone)]
pub struct SystemPlink {
    binary: PathBuf,
    timeout: Option<Duration>,
}

impl SystemPlink {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
        }
    }

    /// Use `explicit` if given, otherwise search `PATH` for `plink`
    pub fn locate(explicit: Option<&Path>) -> Result<Self, PlinkError> {
        match explicit {
            Some(path) => Ok(Self::new(path)),
            None => which::which("plink")
                .map(Self::new)
                .map_err(|e| PlinkError::NotFound(format!("plink: {e}"))),
        }
    }

    /// Kill PLINK if a single invocation runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl PlinkRunner for SystemPlink {
    async fn run(&self, args: &PlinkArgs, label: &str) -> Result<PlinkOutput, PlinkError> {
        info!("{}", label);
        debug!("Running '{} {}'", self.binary.display(), args);

        let child = tokio::process::Command::new(&self.binary)
            .args(args.render())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PlinkError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        // Dropping the wait future on timeout drops the child, which kills it
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| PlinkError::TimedOut {
                    label: label.to_string(),
                    after: limit,
                })??,
            None => child.wait_with_output().await?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            debug!("{}", stdout);
            return Err(PlinkError::Failed {
                label: label.to_string(),
                code: output.status.code(),
                message: failure_message(&stdout, &stderr),
            });
        }

        if let Some(text) = reported_output(&stdout) {
            debug!("PLINK output for '{}':\n{}", label, text);
        }

        Ok(PlinkOutput { stdout, stderr })
    }
}

const STDOUT_TAIL_LINES: usize = 20;

/// Trimmed stdout, None when PLINK printed nothing
fn reported_output(stdout: &str) -> Option<&str> {
    let text = stdout.trim_end();
    (!text.trim_start().is_empty()).then_some(text)
}

/// What PLINK said about a failure: stderr if any, else the last lines of stdout
pub fn failure_message(stdout: &str, stderr: &str) -> String {
    if !stderr.trim().is_empty() {
        return stderr.trim_end().to_string();
    }

    let lines: Vec<&str> = stdout.trim_end().lines().collect();
    let start = lines.len().saturating_sub(STDOUT_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(args: &PlinkArgs) -> Vec<String> {
        args.render()
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_render_merge_order() {
        let args = PlinkArgs {
            out: Some(PathBuf::from("merged")),
            bmerge: Some(PathBuf::from("hapmap_RS_ONLY")),
            bfile: Some(PathBuf::from("dset_RS_ONLY")),
            make_bed: true,
            noweb: true,
            ..Default::default()
        };

        assert_eq!(
            rendered(&args),
            vec![
                "--bfile",
                "dset_RS_ONLY",
                "--bmerge",
                "hapmap_RS_ONLY",
                "--make-bed",
                "--noweb",
                "--out",
                "merged"
            ]
        );
    }

    #[test]
    fn test_unset_switches_are_omitted() {
        let args = PlinkArgs::dataset("in", "out");
        let args = PlinkArgs {
            make_bed: false,
            ..args
        };

        assert_eq!(rendered(&args), vec!["--bfile", "in", "--out", "out"]);
    }

    #[test]
    fn test_inherit_copies_session_switches() {
        let base = PlinkArgs {
            noweb: true,
            bfile: Some(PathBuf::from("ignored")),
            ..Default::default()
        };
        let args = PlinkArgs::dataset("a", "b").inherit(&base);

        assert!(args.noweb);
        assert_eq!(args.bfile, Some(PathBuf::from("a")));
    }

    #[test]
    fn test_display_joins_arguments() {
        let mut args = PlinkArgs::dataset("a", "b");
        args.exclude = Some(PathBuf::from("x.txt"));

        assert_eq!(args.to_string(), "--bfile a --exclude x.txt --make-bed --out b");
    }

    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-plink");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_plink_passes_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let plink = SystemPlink::new(script(dir.path(), "echo \"$@\""));

        let output = plink
            .run(&PlinkArgs::dataset("in", "out"), "echo")
            .await
            .unwrap();

        assert_eq!(output.stdout.trim(), "--bfile in --make-bed --out out");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_plink_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let plink = SystemPlink::new(script(dir.path(), "echo 'Error: bad' >&2\nexit 3"));

        let err = plink
            .run(&PlinkArgs::default(), "failing step")
            .await
            .unwrap_err();

        match err {
            PlinkError::Failed { label, code, message } => {
                assert_eq!(label, "failing step");
                assert_eq!(code, Some(3));
                assert!(message.contains("Error: bad"));
            }
            other => panic!("Expected Failed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_plink_reports_stdout_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let plink = SystemPlink::new(script(
            dir.path(),
            "echo 'Performing single-pass merge (2 people, 3 variants).'\n\
             echo 'Error: 2 variants with 3+ alleles present.'\n\
             exit 3",
        ));

        let err = plink.run(&PlinkArgs::default(), "merge").await.unwrap_err();

        match &err {
            PlinkError::Failed { message, .. } => {
                assert!(message.contains("Error: 2 variants with 3+ alleles present."));
            }
            other => panic!("Expected Failed, got {other:?}"),
        }
        assert!(err.to_string().ends_with("Error: 2 variants with 3+ alleles present."));
    }

    #[test]
    fn test_reported_output() {
        assert_eq!(reported_output(" \n\n"), None);
        assert_eq!(
            reported_output("PLINK v1.90\n--make-bed to out.bed ... done.\n"),
            Some("PLINK v1.90\n--make-bed to out.bed ... done.")
        );
    }

    #[test]
    fn test_failure_message_prefers_stderr() {
        assert_eq!(failure_message("noise\n", "Error: bad\n"), "Error: bad");
        assert_eq!(failure_message("a\nb\nError: x\n", "  \n"), "a\nb\nError: x");

        let long: String = (0..30).map(|i| format!("line {i}\n")).collect();
        let tail = failure_message(&long, "");
        assert_eq!(tail.lines().count(), 20);
        assert!(tail.starts_with("line 10"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_plink_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let plink = SystemPlink::new(script(dir.path(), "sleep 5"))
            .with_timeout(Some(Duration::from_millis(100)));

        let err = plink.run(&PlinkArgs::default(), "slow").await.unwrap_err();
        assert!(matches!(err, PlinkError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let plink = SystemPlink::new("/nonexistent/plink-binary");
        let err = plink.run(&PlinkArgs::default(), "missing").await.unwrap_err();
        assert!(matches!(err, PlinkError::Spawn { .. }));
    }
}
