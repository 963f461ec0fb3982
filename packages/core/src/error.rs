use thiserror::Error;

/// Unified application error.
///
/// Every collaborator (config, feed, posting API, state file, sync)
/// reports through one of these variants so the run controller can decide
/// which failures degrade and which end the run.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// A single coupon record that cannot be used.
///
/// Raised at the feed boundary; the offending coupon is skipped and the
/// run carries on with the rest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("coupon record is not a JSON object")]
    NotAnObject,

    #[error("invalid coupon identifier {value}")]
    InvalidId { value: String },

    #[error("invalid expiry timestamp '{value}'")]
    InvalidExpiry { value: String },
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl AppError {
    /// Process exit code for an error that ends the run.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 2,
            _ => 1,
        }
    }
}
