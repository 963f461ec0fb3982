//! Feed filtering.
//!
//! Turns the raw feed into the ordered list of postable coupons: visible,
//! not expired, oldest first.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::coupon::{parse_coupon, Coupon};

/// Parse, validate and order raw feed records.
///
/// Records that fail to parse are logged and skipped. The sort is stable,
/// so coupons with equal timestamps keep their feed order. An empty result
/// means there is nothing to post this run.
pub fn filter_and_sort(raw: &[Value], now: DateTime<Utc>) -> Vec<Coupon> {
    let mut valid: Vec<Coupon> = raw
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match parse_coupon(record) {
            Ok(coupon) => Some(coupon),
            Err(err) => {
                tracing::warn!("Skipping feed record #{}: {}", index, err);
                None
            }
        })
        .filter(|coupon| is_valid(coupon, now))
        .collect();

    valid.sort_by_key(|coupon| coupon.effective_timestamp(now));

    tracing::debug!(
        "{} of {} feed records are postable",
        valid.len(),
        raw.len()
    );

    valid
}

/// Visible, and either no expiry or an expiry strictly after `now`.
pub fn is_valid(coupon: &Coupon, now: DateTime<Utc>) -> bool {
    coupon.is_visible
        && coupon
            .expires_at
            .map_or(true, |expires| expires.with_timezone(&Utc) > now)
}
