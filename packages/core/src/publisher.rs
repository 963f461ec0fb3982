//! Publishing a chosen coupon.

use crate::coupon::Coupon;
use crate::error::AppError;
use crate::provider::{PostResult, PostingApi};

/// Post `message` for `coupon`: a photo post when the coupon has a logo,
/// otherwise a text post. Exactly one API call is made.
pub async fn publish(
    api: &(dyn PostingApi + Send + Sync),
    coupon: &Coupon,
    message: &str,
) -> Result<PostResult, AppError> {
    match coupon.photo_url() {
        Some(photo_url) => {
            tracing::debug!("Posting coupon {} with photo {}", coupon.id, photo_url);
            api.post_photo(photo_url, message).await
        }
        None => {
            tracing::debug!("Posting coupon {} as text", coupon.id);
            api.post_text(message).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupon::parse_coupon;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PostingApi for RecordingApi {
        async fn post_photo(&self, photo_url: &str, _message: &str) -> Result<PostResult, AppError> {
            self.calls.lock().unwrap().push(format!("photo:{}", photo_url));
            Ok(PostResult { post_id: "p1".into() })
        }

        async fn post_text(&self, _message: &str) -> Result<PostResult, AppError> {
            self.calls.lock().unwrap().push("text".into());
            Ok(PostResult { post_id: "t1".into() })
        }
    }

    #[tokio::test]
    async fn coupon_with_logo_is_posted_as_photo() {
        let api = RecordingApi::default();
        let coupon = parse_coupon(&json!({
            "id": 1,
            "store": { "logo_url": "https://cdn.example/store.png" }
        }))
        .unwrap();

        let result = publish(&api, &coupon, "hello").await.unwrap();

        assert_eq!(result.post_id, "p1");
        assert_eq!(
            *api.calls.lock().unwrap(),
            vec!["photo:https://cdn.example/store.png".to_string()]
        );
    }

    #[tokio::test]
    async fn coupon_without_logo_is_posted_as_text() {
        let api = RecordingApi::default();
        let coupon = parse_coupon(&json!({ "id": 1, "logo_url": "" })).unwrap();

        let result = publish(&api, &coupon, "hello").await.unwrap();

        assert_eq!(result.post_id, "t1");
        assert_eq!(*api.calls.lock().unwrap(), vec!["text".to_string()]);
    }
}
