//! Stages and commits every checkout in a workspace with one message.

use crate::git::{commit, has_staged_changes, is_valid_git, stage_all, GitError};
use derive_more::Display;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Checkouts living next to each other in the workspace root. The
/// root itself is visited after these.
pub const CHECKOUTS: &[&str] = &["dashboard", "server", "curriculum", "exercises"];

/// What happened to a single directory during a batch commit
#[derive(Debug, Display, PartialEq, Eq)]
pub enum CommitOutcome {
    #[display(fmt = "committed")]
    Committed,
    #[display(fmt = "nothing to commit")]
    NothingToCommit,
    #[display(fmt = "skipped ({})", _0)]
    Skipped(SkipReason),
    #[display(fmt = "commit failed with exit code {}", _0)]
    Failed(i32),
}

#[derive(Debug, Display, PartialEq, Eq, Clone, Copy)]
pub enum SkipReason {
    #[display(fmt = "directory missing")]
    Missing,
    #[display(fmt = "not a git checkout")]
    NotGit,
}

/// One visited directory and its outcome
#[derive(Debug)]
pub struct CommitReport {
    pub path: PathBuf,
    pub outcome: Result<CommitOutcome, GitError>,
}

impl CommitReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Ok(CommitOutcome::Failed(_)) | Err(_))
    }
}

/// Stages and commits all changes in `path`. Directories which are
/// missing or not under git are skipped rather than treated as errors
pub async fn commit_checkout(path: &Path, message: &str) -> Result<CommitOutcome, GitError> {
    if !path.is_dir() {
        debug!("{path:?} does not exist, skipping");
        return Ok(CommitOutcome::Skipped(SkipReason::Missing));
    }
    if !is_valid_git(path) {
        debug!("{path:?} is not a git checkout, skipping");
        return Ok(CommitOutcome::Skipped(SkipReason::NotGit));
    }

    stage_all(path).await?;
    if !has_staged_changes(path).await? {
        info!("{path:?}: nothing to commit");
        return Ok(CommitOutcome::NothingToCommit);
    }

    match commit(path, message).await? {
        0 => {
            info!("{path:?}: committed");
            Ok(CommitOutcome::Committed)
        }
        code => {
            warn!("{path:?}: git commit exited with code {code}");
            Ok(CommitOutcome::Failed(code))
        }
    }
}

/// Visits each named subdirectory of `root` in order and then `root`
/// itself. Directories are processed one at a time and a failure in
/// one does not stop the others
pub async fn commit_all(root: &Path, names: &[&str], message: &str) -> Vec<CommitReport> {
    let paths = names
        .iter()
        .map(|name| root.join(name))
        .chain(std::iter::once(root.to_path_buf()));

    let mut reports = Vec::with_capacity(names.len() + 1);
    for path in paths {
        let outcome = commit_checkout(&path, message).await;
        if let Err(err) = &outcome {
            warn!("{path:?}: {err}");
        }
        reports.push(CommitReport { path, outcome });
    }
    reports
}
