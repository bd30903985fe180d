//! Version-control collaborator: the system `git` binary, behind a trait so
//! the emitter can be driven against a fake in tests.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::error::GitError;

#[cfg_attr(test, mockall::automock)]
pub trait Vcs {
    /// Stage a path in the working tree.
    fn stage(&mut self, path: &Path) -> Result<(), GitError>;
    /// Commit the index with `date` as both author and committer date.
    fn commit(&mut self, message: &str, date: &str) -> Result<(), GitError>;
    /// Push to the configured remote/branch.
    fn push(&mut self) -> Result<(), GitError>;
}

pub struct GitCli {
    workdir: PathBuf,
    remote: Option<String>,
    branch: Option<String>,
}

impl GitCli {
    /// Bind to `workdir` without checking it. Dry runs use this; nothing
    /// is run until a `Vcs` method is called.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self { workdir: workdir.into(), remote: None, branch: None }
    }

    /// Bind to `workdir`, which must be inside a git work tree.
    pub fn open(workdir: impl Into<PathBuf>) -> Result<Self, GitError> {
        let workdir = workdir.into();
        let out = Command::new("git")
            .args(["rev-parse", "--is-inside-work-tree"])
            .current_dir(&workdir)
            .output()
            .map_err(|source| GitError::Spawn { operation: "rev-parse", source })?;
        if !out.status.success() || String::from_utf8_lossy(&out.stdout).trim() != "true" {
            return Err(GitError::NotARepository(workdir.display().to_string()));
        }
        Ok(Self::new(workdir))
    }

    pub fn with_destination(mut self, remote: Option<String>, branch: Option<String>) -> Self {
        self.remote = remote;
        self.branch = branch;
        self
    }

    fn run(&self, args: &[&str], envs: &[(&str, &str)], operation: &'static str) -> Result<(), GitError> {
        debug!(?args, "git");
        let out = Command::new("git")
            .args(args)
            .envs(envs.iter().copied())
            .current_dir(&self.workdir)
            .output()
            .map_err(|source| GitError::Spawn { operation, source })?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let stdout = String::from_utf8_lossy(&out.stdout);
            // "nothing to commit" lands on stdout
            let msg = if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() };
            return Err(GitError::Failed { operation, stderr: msg.to_string() });
        }
        Ok(())
    }
}

impl Vcs for GitCli {
    fn stage(&mut self, path: &Path) -> Result<(), GitError> {
        let path = path.to_string_lossy();
        self.run(&["add", "--", &*path], &[], "add")
    }

    fn commit(&mut self, message: &str, date: &str) -> Result<(), GitError> {
        self.run(
            &["commit", "--allow-empty", "-m", message, "--date", date],
            &[("GIT_AUTHOR_DATE", date), ("GIT_COMMITTER_DATE", date)],
            "commit",
        )
    }

    fn push(&mut self) -> Result<(), GitError> {
        let mut args = vec!["push"];
        if let Some(remote) = self.remote.as_deref() {
            args.push(remote);
            if let Some(branch) = self.branch.as_deref() {
                args.push(branch);
            }
        }
        self.run(&args, &[], "push")
    }
}
