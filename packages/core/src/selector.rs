//! Next-coupon selection.
//!
//! Walks the ordered postable coupons and picks the first one not yet
//! published. Once every postable coupon has been published the cycle
//! restarts: the published set is cleared and the earliest coupon is
//! picked again, so the page keeps posting instead of going quiet.

use std::collections::BTreeSet;

use crate::coupon::Coupon;

/// Result of a selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    pub coupon: &'a Coupon,
    /// Published set to carry forward. Empty when the cycle was reset.
    pub published: BTreeSet<u64>,
    pub reset: bool,
}

/// Pick the next coupon to publish from an ordered, already-filtered list.
///
/// Returns `None` only when `ordered` is empty.
pub fn select<'a>(ordered: &'a [Coupon], published: &BTreeSet<u64>) -> Option<Selection<'a>> {
    if let Some(coupon) = ordered.iter().find(|c| !published.contains(&c.id)) {
        return Some(Selection {
            coupon,
            published: published.clone(),
            reset: false,
        });
    }

    let first = ordered.first()?;
    tracing::info!(
        "All {} postable coupons already published; restarting the cycle",
        ordered.len()
    );

    Some(Selection {
        coupon: first,
        published: BTreeSet::new(),
        reset: true,
    })
}
