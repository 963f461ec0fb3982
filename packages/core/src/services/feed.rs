use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::AppError;
use crate::provider::CouponSource;

/// HTTP client for the coupon feed.
#[derive(Clone)]
pub struct FeedClient {
    url: String,
    http: Client,
}

impl FeedClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Config(format!("Failed to build feed client: {}", err)))?;

        Ok(Self { url, http })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CouponSource for FeedClient {
    async fn fetch_coupons(&self) -> Result<Vec<Value>, AppError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|err| AppError::Fetch(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Fetch(format!(
                "Feed returned HTTP {}: {}",
                status, body
            )));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|err| AppError::Fetch(format!("Feed body is not JSON: {}", err)))?;

        Ok(extract_coupon_list(body))
    }

    fn source_name(&self) -> &str {
        "coupon feed"
    }
}

/// Pull the coupon list out of a feed body.
///
/// Accepts a bare array, or an object holding the array under `data` or,
/// failing that, under its first array-valued field. Any other shape
/// yields no coupons.
pub fn extract_coupon_list(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut fields) => {
            if let Some(Value::Array(items)) = fields.get_mut("data") {
                return std::mem::take(items);
            }
            fields
                .into_iter()
                .find_map(|(_, value)| match value {
                    Value::Array(items) => Some(items),
                    _ => None,
                })
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}
