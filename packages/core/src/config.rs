use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;

pub const DEFAULT_FEED_URL: &str = "https://receivecoupons.com/api/my_api.php";
pub const DEFAULT_STATE_FILE: &str = "state.json";
pub const DEFAULT_GRAPH_API_URL: &str = "https://graph.facebook.com/v21.0";
pub const DEFAULT_SITE_URL: &str = "https://receivecoupons.com/";
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 15;
pub const DEFAULT_MESSAGE_MAX_LENGTH: usize = 60_000;
pub const DEFAULT_GIT_COMMIT_NAME: &str = "github-actions[bot]";
pub const DEFAULT_GIT_COMMIT_EMAIL: &str =
    "41898282+github-actions[bot]@users.noreply.github.com";

#[derive(Clone)]
pub struct Config {
    pub feed_url: String,
    pub state_file: PathBuf,
    pub page_id: String,
    pub access_token: String,
    pub graph_api_url: String,
    pub site_url: String,
    pub request_timeout_seconds: u64,
    pub message_max_length: usize,
    pub state_sync: StateSync,
    pub git_commit_name: String,
    pub git_commit_email: String,
}

/// How the state file is propagated after a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateSync {
    Git,
    Disabled,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key/value source. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let page_id = var("FACEBOOK_PAGE_ID").ok_or("FACEBOOK_PAGE_ID is required")?;
        let access_token =
            var("FACEBOOK_ACCESS_TOKEN").ok_or("FACEBOOK_ACCESS_TOKEN is required")?;

        let request_timeout_seconds = match var("REQUEST_TIMEOUT_SECONDS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or("REQUEST_TIMEOUT_SECONDS must be a positive number")?,
            None => DEFAULT_REQUEST_TIMEOUT_SECONDS,
        };

        let message_max_length = match var("MESSAGE_MAX_LENGTH") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|len| *len > 0)
                .ok_or("MESSAGE_MAX_LENGTH must be a positive number")?,
            None => DEFAULT_MESSAGE_MAX_LENGTH,
        };

        let state_sync = match var("STATE_SYNC").as_deref().map(str::trim) {
            None | Some("git") => StateSync::Git,
            Some("none") => StateSync::Disabled,
            Some(other) => return Err(format!("Invalid STATE_SYNC: {}", other)),
        };

        Ok(Self {
            feed_url: var("COUPONS_API_URL").unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
            state_file: var("STATE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
            page_id,
            access_token,
            graph_api_url: var("GRAPH_API_URL")
                .unwrap_or_else(|| DEFAULT_GRAPH_API_URL.to_string()),
            site_url: var("SITE_URL").unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
            request_timeout_seconds,
            message_max_length,
            state_sync,
            git_commit_name: var("GIT_COMMIT_NAME")
                .unwrap_or_else(|| DEFAULT_GIT_COMMIT_NAME.to_string()),
            git_commit_email: var("GIT_COMMIT_EMAIL")
                .unwrap_or_else(|| DEFAULT_GIT_COMMIT_EMAIL.to_string()),
        })
    }

    /// Command-line flags win over the environment.
    pub fn apply_cli(mut self, cli: &Cli) -> Result<Self, String> {
        if let Some(url) = &cli.feed_url {
            self.feed_url = url.clone();
        }
        if let Some(path) = &cli.state_file {
            self.state_file = path.clone();
        }
        if let Some(timeout) = cli.timeout {
            if timeout == 0 {
                return Err("--timeout must be a positive number".into());
            }
            self.request_timeout_seconds = timeout;
        }
        if let Some(max) = cli.max_message_length {
            if max == 0 {
                return Err("--max-message-length must be a positive number".into());
            }
            self.message_max_length = max;
        }
        if cli.no_sync {
            self.state_sync = StateSync::Disabled;
        }
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

// The access token must never reach the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("feed_url", &self.feed_url)
            .field("state_file", &self.state_file)
            .field("page_id", &self.page_id)
            .field("access_token", &"<redacted>")
            .field("graph_api_url", &self.graph_api_url)
            .field("site_url", &self.site_url)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("message_max_length", &self.message_max_length)
            .field("state_sync", &self.state_sync)
            .finish()
    }
}
