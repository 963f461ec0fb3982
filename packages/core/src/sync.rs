//! Propagating the state file to shared storage.
//!
//! The job runs from a checkout of its own repository, so the default
//! mechanism is to commit the state file and push it. Sync is best-effort:
//! the caller logs a failure and moves on. The caller also bounds the
//! call with the request timeout; git never prompts for credentials and a
//! child still running when the call is dropped is killed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::{Config, StateSync};
use crate::error::AppError;
use crate::provider::DurableSync;

/// Commit the state file and push it with git.
#[derive(Debug, Clone)]
pub struct GitSync {
    committer_name: String,
    committer_email: String,
    repo_dir: Option<PathBuf>,
}

impl GitSync {
    pub fn new(committer_name: String, committer_email: String) -> Self {
        Self {
            committer_name,
            committer_email,
            repo_dir: None,
        }
    }

    /// Run git in `dir` instead of the current directory.
    pub fn with_repo_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.repo_dir = Some(dir.into());
        self
    }

    async fn git(&self, args: &[&str]) -> Result<(), AppError> {
        let mut command = Command::new("git");
        command
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);
        if let Some(dir) = &self.repo_dir {
            command.current_dir(dir);
        }

        let output = command.output().await.map_err(|err| {
            AppError::Persistence(format!("failed to run git {}: {}", args.join(" "), err))
        })?;

        if !output.status.success() {
            return Err(AppError::Persistence(format!(
                "git {} exited with {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl DurableSync for GitSync {
    async fn sync(&self, path: &Path, description: &str) -> Result<(), AppError> {
        let path = path.to_string_lossy();

        self.git(&["config", "user.name", self.committer_name.as_str()]).await?;
        self.git(&["config", "user.email", self.committer_email.as_str()]).await?;
        self.git(&["add", &*path]).await?;
        self.git(&["commit", "-m", description]).await?;
        self.git(&["push"]).await?;

        tracing::info!("State committed and pushed");
        Ok(())
    }
}

/// Sync disabled: the state file stays local.
#[derive(Debug, Clone, Default)]
pub struct NoopSync;

#[async_trait]
impl DurableSync for NoopSync {
    async fn sync(&self, path: &Path, _description: &str) -> Result<(), AppError> {
        tracing::info!("State sync disabled; {} saved locally only", path.display());
        Ok(())
    }
}

/// Pick the sync mechanism named in the config.
pub fn from_config(config: &Config) -> Box<dyn DurableSync + Send + Sync> {
    match config.state_sync {
        StateSync::Git => Box::new(GitSync::new(
            config.git_commit_name.clone(),
            config.git_commit_email.clone(),
        )),
        StateSync::Disabled => Box::new(NoopSync),
    }
}
