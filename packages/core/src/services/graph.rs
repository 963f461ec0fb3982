//! Graph API client for posting to a page.
//!
//! Photo posts go to `/{page_id}/photos`, text posts to `/{page_id}/feed`.
//! A post only counts as published when the response body carries a post
//! identifier; anything else is a [`AppError::Publish`] with the body
//! attached so the failure can be diagnosed from the logs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::AppError;
use crate::provider::{PostResult, PostingApi};

#[derive(Clone)]
pub struct GraphClient {
    base_url: String,
    page_id: String,
    access_token: String,
    http: Client,
}

impl GraphClient {
    pub fn new(
        base_url: String,
        page_id: String,
        access_token: String,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Config(format!("Failed to build Graph API client: {}", err)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            page_id,
            access_token,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_form(&self, edge: &str, form: &[(&str, &str)]) -> Result<PostResult, AppError> {
        let url = format!("{}/{}/{}", self.base_url, self.page_id, edge);

        let response = self
            .http
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|err| AppError::Publish(format!("Request to /{} failed: {}", edge, err)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AppError::Publish(format!("Failed to read /{} response: {}", edge, err)))?;

        if !status.is_success() {
            return Err(AppError::Publish(format!(
                "Graph API returned HTTP {} for /{}. Response: {}",
                status, edge, body
            )));
        }

        let value: Value = serde_json::from_str(&body).map_err(|err| {
            AppError::Publish(format!(
                "Graph API response is not JSON ({}). Response: {}",
                err, body
            ))
        })?;

        post_id_from(&value)
            .map(|post_id| PostResult { post_id })
            .ok_or_else(|| {
                AppError::Publish(format!(
                    "Graph API response has no id or post_id. Response: {}",
                    body
                ))
            })
    }
}

#[async_trait]
impl PostingApi for GraphClient {
    async fn post_photo(&self, photo_url: &str, message: &str) -> Result<PostResult, AppError> {
        self.post_form(
            "photos",
            &[
                ("url", photo_url),
                ("message", message),
                ("access_token", self.access_token.as_str()),
            ],
        )
        .await
    }

    async fn post_text(&self, message: &str) -> Result<PostResult, AppError> {
        self.post_form(
            "feed",
            &[
                ("message", message),
                ("access_token", self.access_token.as_str()),
            ],
        )
        .await
    }
}

/// Success signal: a string or numeric `post_id`, else `id`.
pub fn post_id_from(body: &Value) -> Option<String> {
    ["post_id", "id"].iter().find_map(|key| match body.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
