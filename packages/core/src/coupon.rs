//! Typed coupon records.
//!
//! The feed hands back loosely-shaped JSON. [`parse_coupon`] turns one raw
//! record into a [`Coupon`] at the feed boundary, so nothing downstream
//! touches untyped data.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// A validated coupon from the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Coupon {
    pub id: u64,
    pub is_visible: bool,
    /// Kept in the feed's own offset so the post shows the feed's date.
    pub expires_at: Option<DateTime<FixedOffset>>,
    pub created_at: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub code: Option<String>,
    pub discount_text: Option<String>,
    pub note: Option<String>,
    pub countries: Option<String>,
    pub purchase_link: Option<String>,
    pub logo_url: Option<String>,
    pub store_logo_url: Option<String>,
}

impl Coupon {
    /// Logo used for a photo post: the coupon's own logo, then the store's.
    pub fn photo_url(&self) -> Option<&str> {
        self.logo_url
            .as_deref()
            .or(self.store_logo_url.as_deref())
    }

    /// Ordering key: creation time, else expiry, else `now`.
    pub fn effective_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.created_at
            .or_else(|| self.expires_at.map(|expires| expires.with_timezone(&Utc)))
            .unwrap_or(now)
    }
}

/// Parse one raw feed record.
pub fn parse_coupon(raw: &Value) -> Result<Coupon, ValidationError> {
    let obj = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    let id = resolve_id(obj)?;

    let expires_at = match text_field(obj, "expires_at") {
        Some(value) => Some(
            parse_timestamp(&value).ok_or(ValidationError::InvalidExpiry { value })?,
        ),
        None => None,
    };

    let created_at = text_field(obj, "created_at").and_then(|value| {
        let parsed = parse_timestamp(&value);
        if parsed.is_none() {
            tracing::debug!("Coupon {}: ignoring unparseable created_at '{}'", id, value);
        }
        parsed.map(|dt| dt.with_timezone(&Utc))
    });

    let store_logo_url = obj
        .get("store")
        .and_then(Value::as_object)
        .and_then(|store| text_field(store, "logo_url"));

    Ok(Coupon {
        id,
        is_visible: is_visible(obj.get("is_visible")),
        expires_at,
        created_at,
        title: text_field(obj, "title"),
        code: text_field(obj, "code"),
        discount_text: text_field(obj, "discount_text"),
        note: text_field(obj, "note"),
        countries: countries_field(obj),
        purchase_link: text_field(obj, "purchase_link"),
        logo_url: text_field(obj, "logo_url"),
        store_logo_url,
    })
}

/// Resolve the identifier from `coupon_id`, falling back to `id`.
///
/// Null, blank or zero values fall through to the next key. When neither
/// key yields an identifier the coupon gets id 0, so several id-less
/// coupons share one slot in the published set.
fn resolve_id(obj: &Map<String, Value>) -> Result<u64, ValidationError> {
    for key in ["coupon_id", "id"] {
        if let Some(id) = id_value(obj.get(key))? {
            return Ok(id);
        }
    }

    tracing::warn!("Coupon has neither coupon_id nor id; using id 0");
    Ok(0)
}

fn id_value(value: Option<&Value>) -> Result<Option<u64>, ValidationError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let invalid = || ValidationError::InvalidId { value: raw.to_string() };

    match raw {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::Number(n) => match n.as_u64().or_else(|| whole_f64(n.as_f64()?)) {
            Some(0) => Ok(None),
            Some(id) => Ok(Some(id)),
            None => Err(invalid()),
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match trimmed.parse::<u64>() {
                Ok(0) => Ok(None),
                Ok(id) => Ok(Some(id)),
                Err(_) => Err(invalid()),
            }
        }
        _ => Err(invalid()),
    }
}

/// `3.0` is a valid id, `3.5` and `-3.0` are not.
fn whole_f64(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64)
        .then(|| value as u64)
}

fn is_visible(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true"),
        _ => false,
    }
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn countries_field(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("countries")? {
        Value::Array(items) => {
            let names: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .collect();
            (!names.is_empty()).then(|| names.join(", "))
        }
        _ => text_field(obj, "countries"),
    }
}

/// Parse a feed timestamp, keeping its offset. Naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}
