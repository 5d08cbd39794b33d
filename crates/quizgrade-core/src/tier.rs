//! Result tier classification.

use crate::model::{clamp_percentage, ResultTier};

/// Lowest percentage that can ever classify as `high`.
pub const HIGH_TIER_FLOOR: f64 = 80.0;

/// Margin above the pass bar required for `high`.
pub const HIGH_TIER_MARGIN: f64 = 20.0;

/// Classify a score relative to the quiz's pass bar.
///
/// A zero (or negative) total classifies as `medium`. Otherwise the
/// percentage is compared against `max(80, pass + 20)` for `high` and
/// against `pass` for `low`.
pub fn classify_tier(obtained: f64, total: f64, pass_percentage: f64) -> ResultTier {
    if total.is_nan() || total <= 0.0 {
        return ResultTier::Medium;
    }

    let pass = clamp_percentage(pass_percentage);
    let percentage = obtained / total * 100.0;
    let high_threshold = HIGH_TIER_FLOOR.max(pass + HIGH_TIER_MARGIN);

    if percentage >= high_threshold {
        ResultTier::High
    } else if percentage < pass {
        ResultTier::Low
    } else {
        ResultTier::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_at_threshold() {
        assert_eq!(classify_tier(85.0, 100.0, 60.0), ResultTier::High);
        assert_eq!(classify_tier(80.0, 100.0, 60.0), ResultTier::High);
    }

    #[test]
    fn low_below_pass() {
        assert_eq!(classify_tier(55.0, 100.0, 60.0), ResultTier::Low);
    }

    #[test]
    fn medium_between() {
        assert_eq!(classify_tier(60.0, 100.0, 60.0), ResultTier::Medium);
        assert_eq!(classify_tier(79.99, 100.0, 60.0), ResultTier::Medium);
    }

    #[test]
    fn high_threshold_rises_with_pass_bar() {
        // pass 70 → high needs 90
        assert_eq!(classify_tier(85.0, 100.0, 70.0), ResultTier::Medium);
        assert_eq!(classify_tier(90.0, 100.0, 70.0), ResultTier::High);
        // pass 95 → high needs 115, unreachable
        assert_eq!(classify_tier(100.0, 100.0, 95.0), ResultTier::Medium);
    }

    #[test]
    fn zero_total_is_medium() {
        for pass in [0.0, 50.0, 100.0] {
            for obtained in [0.0, 5.0, -1.0] {
                assert_eq!(classify_tier(obtained, 0.0, pass), ResultTier::Medium);
            }
        }
        assert_eq!(classify_tier(1.0, f64::NAN, 50.0), ResultTier::Medium);
    }

    #[test]
    fn monotonic_in_percentage() {
        for pass in [0.0, 30.0, 50.0, 60.0, 75.0, 90.0, 100.0] {
            let mut previous = ResultTier::Low;
            for step in 0..=1000 {
                let obtained = step as f64 / 10.0;
                let tier = classify_tier(obtained, 100.0, pass);
                assert!(tier >= previous, "pass {pass}, obtained {obtained}");
                previous = tier;
            }
        }
    }

    #[test]
    fn zero_pass_bar_never_low() {
        assert_eq!(classify_tier(0.0, 10.0, 0.0), ResultTier::Medium);
    }
}
