//! Property-based tests for the input boundary.

use proptest::prelude::*;

use todo_service::config::RateLimitConfig;
use todo_service::security::sanitize::{sanitize_str, QUERY_OPERATORS};
use todo_service::security::FixedWindowLimiter;
use todo_service::todos::is_valid_id;

proptest! {
    #[test]
    fn prop_sanitize_is_idempotent(input in ".*") {
        let once = sanitize_str(&input);
        prop_assert_eq!(sanitize_str(&once), once);
    }

    #[test]
    fn prop_sanitize_leaves_no_raw_markup(input in ".*") {
        let out = sanitize_str(&input);
        prop_assert!(!out.contains('<'));
        prop_assert!(!out.contains('>'));
        prop_assert!(!out.contains('"'));
        prop_assert!(!out.contains('\''));
    }

    #[test]
    fn prop_operators_always_escaped(
        prefix in "[a-z ]{0,8}",
        op in proptest::sample::select(QUERY_OPERATORS.to_vec()),
    ) {
        let out = sanitize_str(&format!("{prefix}${op}"));
        let expected = format!("\\${op}");
        prop_assert!(out.ends_with(&expected));
    }

    #[test]
    fn prop_hex_ids_accepted(id in "[0-9a-fA-F]{24}") {
        prop_assert!(is_valid_id(&id));
    }

    #[test]
    fn prop_wrong_length_rejected(id in "[0-9a-f]{0,23}|[0-9a-f]{25,40}") {
        prop_assert!(!is_valid_id(&id));
    }

    #[test]
    fn prop_limiter_admits_exactly_max(max in 1u32..20, extra in 1u32..10, start in 0u64..1_000_000) {
        let limiter = FixedWindowLimiter::new(&RateLimitConfig {
            max_requests: max,
            window_ms: 10_000,
            ..RateLimitConfig::default()
        });
        // Stay inside one window.
        let t = start - start % 10_000;

        let admitted = (0..max + extra)
            .filter(|_| !limiter.check_at("client", t).limited)
            .count() as u32;
        prop_assert_eq!(admitted, max);
    }
}
