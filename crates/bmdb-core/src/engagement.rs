//! Normalized engagement metric.

use rust_decimal::{Decimal, RoundingStrategy};

/// Engagement rate: `(likes + comments) / views × 100`, rounded to two
/// decimal places.
///
/// Returns zero when `view_count` is 0, regardless of the other counters.
/// Rounding is half-to-even (banker's), computed exactly in decimal so the
/// `.005` boundary is stable across platforms.
#[must_use]
pub fn engagement_rate(view_count: u64, like_count: u64, comment_count: u64) -> Decimal {
    if view_count == 0 {
        return Decimal::ZERO;
    }
    let interactions = Decimal::from(like_count) + Decimal::from(comment_count);
    let rate = interactions / Decimal::from(view_count) * Decimal::ONE_HUNDRED;
    rate.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}
