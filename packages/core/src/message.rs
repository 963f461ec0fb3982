//! Post text for a coupon.

use crate::coupon::Coupon;

/// Appended when a message is cut to the length ceiling.
pub const TRUNCATION_MARKER: &str = "...";

/// Format the announcement for `coupon`.
///
/// Only fields the coupon actually has produce a section. The footer
/// pointing at `site_url` is always present. The result never exceeds
/// `max_chars` characters.
pub fn build_message(coupon: &Coupon, site_url: &str, max_chars: usize) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(title) = &coupon.title {
        sections.push(format!("🎉 {}", title));
    }
    if let Some(discount) = &coupon.discount_text {
        sections.push(format!("🔥 {}", discount));
    }
    if let Some(code) = &coupon.code {
        sections.push(format!("🎁 الكوبون: {}", code));
    }
    if let Some(countries) = &coupon.countries {
        sections.push(format!("🌍 صالح لـ: {}", countries));
    }
    if let Some(note) = &coupon.note {
        sections.push(format!("📌 ملاحظة: {}", note));
    }
    if let Some(expires) = coupon.expires_at {
        sections.push(format!("⏳ ينتهي في: {}", expires.format("%d-%m-%Y")));
    }
    if let Some(link) = &coupon.purchase_link {
        sections.push(format!("🛒 رابط الشراء: {}", link));
    }

    sections.push(format!("💎 لمزيد من الكوبونات زوروا موقعنا:\n{}", site_url));

    truncate(sections.join("\n\n"), max_chars)
}

/// Cut `message` to at most `max_chars` characters, ending in
/// [`TRUNCATION_MARKER`] when there is room for it.
pub fn truncate(message: String, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message;
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_chars < marker_len {
        return message.chars().take(max_chars).collect();
    }

    let mut cut: String = message.chars().take(max_chars - marker_len).collect();
    cut.push_str(TRUNCATION_MARKER);
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupon::parse_coupon;
    use proptest::prelude::*;
    use serde_json::json;

    const SITE: &str = "https://receivecoupons.com/";

    #[test]
    fn full_coupon_renders_every_section_in_order() {
        let coupon = parse_coupon(&json!({
            "id": 1,
            "title": "Big sale",
            "discount_text": "50% off",
            "code": "HALF",
            "countries": "SA",
            "note": "New users only",
            "expires_at": "2030-03-09 10:00:00",
            "purchase_link": "https://shop.example"
        }))
        .unwrap();

        let message = build_message(&coupon, SITE, 60_000);
        let expected = [
            "🎉 Big sale",
            "🔥 50% off",
            "🎁 الكوبون: HALF",
            "🌍 صالح لـ: SA",
            "📌 ملاحظة: New users only",
            "⏳ ينتهي في: 09-03-2030",
            "🛒 رابط الشراء: https://shop.example",
            "💎 لمزيد من الكوبونات زوروا موقعنا:\nhttps://receivecoupons.com/",
        ]
        .join("\n\n");
        assert_eq!(message, expected);
    }

    #[test]
    fn expiry_date_is_shown_in_feed_offset() {
        let coupon = parse_coupon(&json!({
            "id": 1,
            "expires_at": "2030-03-09T01:00:00+05:00"
        }))
        .unwrap();

        let message = build_message(&coupon, SITE, 60_000);
        assert!(message.contains("⏳ ينتهي في: 09-03-2030"));
        assert!(!message.contains("08-03-2030"));
    }

    #[test]
    fn absent_fields_produce_no_lines() {
        let coupon = parse_coupon(&json!({ "id": 1, "code": "ONLY", "note": "  " })).unwrap();
        let message = build_message(&coupon, SITE, 60_000);

        assert_eq!(
            message,
            "🎁 الكوبون: ONLY\n\n💎 لمزيد من الكوبونات زوروا موقعنا:\nhttps://receivecoupons.com/"
        );
        assert!(!message.contains("ملاحظة"));
        assert!(!message.contains("🎉"));
    }

    #[test]
    fn bare_coupon_still_gets_footer() {
        let coupon = parse_coupon(&json!({ "id": 1 })).unwrap();
        let message = build_message(&coupon, "https://example.org/", 60_000);
        assert!(message.ends_with("https://example.org/"));
        assert!(!message.starts_with('\n'));
    }

    #[test]
    fn long_message_is_truncated_with_marker() {
        let coupon = parse_coupon(&json!({ "id": 1, "title": "x".repeat(500) })).unwrap();
        let message = build_message(&coupon, SITE, 100);

        assert_eq!(message.chars().count(), 100);
        assert!(message.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let message = "ملاحظة".repeat(10);
        let cut = truncate(message, 8);
        assert_eq!(cut.chars().count(), 8);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn tiny_ceiling_cuts_without_marker() {
        assert_eq!(truncate("abcdef".to_string(), 2), "ab");
        assert_eq!(truncate("abc".to_string(), 3), "abc");
    }

    proptest! {
        #[test]
        fn never_exceeds_ceiling(title in ".{0,300}", max in 1usize..400) {
            let coupon = parse_coupon(&json!({ "id": 1, "title": title })).unwrap();
            let message = build_message(&coupon, SITE, max);
            prop_assert!(message.chars().count() <= max);
        }
    }
}
