//! Collaborator interfaces
//!
//! The run controller only talks to the outside world through these
//! traits, so each remote can be swapped for an in-memory double in tests.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;

/// Source of raw coupon records.
#[async_trait]
pub trait CouponSource {
    /// Fetch the current feed as untyped JSON records.
    async fn fetch_coupons(&self) -> Result<Vec<Value>, AppError>;

    /// Name of this source for logging.
    fn source_name(&self) -> &str;
}

/// Confirmed post on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostResult {
    pub post_id: String,
}

/// Page posting API. One call per run: photo or text, never both.
#[async_trait]
pub trait PostingApi {
    async fn post_photo(&self, photo_url: &str, message: &str) -> Result<PostResult, AppError>;

    async fn post_text(&self, message: &str) -> Result<PostResult, AppError>;
}

/// Propagates the saved state file to durable shared storage.
#[async_trait]
pub trait DurableSync {
    async fn sync(&self, path: &Path, description: &str) -> Result<(), AppError>;
}
