use crate::cmd::{exit_code, run_command, run_command_checked, CommandError};
use derive_more::{Display, From};
use std::path::Path;

#[derive(Debug, From, Display)]
pub enum GitError {
    #[display(fmt = "Unable to execute git command: {}", _0)]
    CommandError(CommandError),
    #[display(fmt = "git diff exited with unexpected code {}", _0)]
    UnexpectedDiffStatus(i32),
}

impl std::error::Error for GitError {}

pub type GitResult<T> = Result<T, GitError>;

const GIT: &str = "git";

/// Checks whether the provided path contains a git directory
pub fn is_valid_git(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref().join(".git");
    path.exists() && path.is_dir()
}

/// Stages every change in the working tree including deletions
/// and untracked files
pub async fn stage_all(path: &Path) -> GitResult<()> {
    run_command_checked(path, GIT, &["add", "-A"]).await?;
    Ok(())
}

/// Whether the index differs from HEAD. `git diff --quiet` exits
/// with 1 when there are differences and 0 when there are none
pub async fn has_staged_changes(path: &Path) -> GitResult<bool> {
    let status = run_command(path, GIT, &["diff", "--cached", "--quiet"]).await?;
    match exit_code(status) {
        0 => Ok(false),
        1 => Ok(true),
        code => Err(GitError::UnexpectedDiffStatus(code)),
    }
}

/// Commits the staged changes returning the exit code of `git commit`
pub async fn commit(path: &Path, message: &str) -> GitResult<i32> {
    let status = run_command(path, GIT, &["commit", "-m", message]).await?;
    Ok(exit_code(status))
}

/// Whether a usable git binary is on the path
pub async fn git_available() -> bool {
    match run_command(".", GIT, &["--version"]).await {
        Ok(status) => status.success(),
        Err(_) => false,
    }
}
