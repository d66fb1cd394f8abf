//! Dynamic pricing from freshness scores.
//!
//! Tiered discounts push less-fresh inventory out the door before it spoils.
//! The same tiers drive the status label and discount percentage shown in
//! the freshness overview.

use serde::Serialize;
use std::fmt;

const FRESH_THRESHOLD: i32 = 80;
const GOOD_THRESHOLD: i32 = 60;
const MODERATE_THRESHOLD: i32 = 40;
const LOW_THRESHOLD: i32 = 20;

/// Compute the dynamic price for a unit given its product's season-adjusted
/// base price and the latest freshness score. Rounded to 2 decimal places.
pub fn dynamic_price(base_price: f64, freshness_score: i32) -> f64 {
    (base_price * price_multiplier(freshness_score) * 100.0).round() / 100.0
}

fn price_multiplier(freshness_score: i32) -> f64 {
    if freshness_score >= FRESH_THRESHOLD {
        1.0
    } else if freshness_score >= GOOD_THRESHOLD {
        0.90
    } else if freshness_score >= MODERATE_THRESHOLD {
        0.75
    } else if freshness_score >= LOW_THRESHOLD {
        0.50
    } else {
        0.25
    }
}

/// Discount percentage matching the price tiers, for display.
pub fn discount_percentage(freshness_score: i32) -> i32 {
    if freshness_score >= FRESH_THRESHOLD {
        0
    } else if freshness_score >= GOOD_THRESHOLD {
        10
    } else if freshness_score >= MODERATE_THRESHOLD {
        25
    } else if freshness_score >= LOW_THRESHOLD {
        50
    } else {
        75
    }
}

/// Human-readable freshness tier, mirroring the price multiplier bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FreshnessStatus {
    Fresh,
    Good,
    Moderate,
    Low,
    Critical,
}

impl FreshnessStatus {
    pub fn from_score(freshness_score: i32) -> Self {
        if freshness_score >= FRESH_THRESHOLD {
            Self::Fresh
        } else if freshness_score >= GOOD_THRESHOLD {
            Self::Good
        } else if freshness_score >= MODERATE_THRESHOLD {
            Self::Moderate
        } else if freshness_score >= LOW_THRESHOLD {
            Self::Low
        } else {
            Self::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "Fresh",
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for FreshnessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_tiers() {
        assert_eq!(dynamic_price(100.0, 85), 100.00);
        assert_eq!(dynamic_price(100.0, 65), 90.00);
        assert_eq!(dynamic_price(100.0, 45), 75.00);
        assert_eq!(dynamic_price(100.0, 25), 50.00);
        assert_eq!(dynamic_price(100.0, 10), 25.00);
    }

    #[test]
    fn test_tier_lower_bounds_are_inclusive() {
        assert_eq!(dynamic_price(100.0, 80), 100.00);
        assert_eq!(dynamic_price(100.0, 79), 90.00);
        assert_eq!(dynamic_price(100.0, 60), 90.00);
        assert_eq!(dynamic_price(100.0, 40), 75.00);
        assert_eq!(dynamic_price(100.0, 20), 50.00);
        assert_eq!(dynamic_price(100.0, 19), 25.00);
        assert_eq!(dynamic_price(100.0, 0), 25.00);
    }

    #[test]
    fn test_price_rounds_to_two_decimals() {
        // 9.99 * 0.75 = 7.4925 -> 7.49
        assert_eq!(dynamic_price(9.99, 45), 7.49);
        // 3.33 * 0.90 = 2.997 -> 3.00
        assert_eq!(dynamic_price(3.33, 65), 3.00);
        // 0.05 * 0.50 = 0.025 -> 0.03 (half rounds up)
        assert_eq!(dynamic_price(0.05, 25), 0.03);
    }

    #[test]
    fn test_price_monotone_in_score() {
        for s1 in 0..100 {
            for s2 in (s1 + 1)..=100 {
                assert!(
                    dynamic_price(100.0, s1) <= dynamic_price(100.0, s2),
                    "price({}) > price({})",
                    s1,
                    s2
                );
            }
        }
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(FreshnessStatus::from_score(100), FreshnessStatus::Fresh);
        assert_eq!(FreshnessStatus::from_score(80), FreshnessStatus::Fresh);
        assert_eq!(FreshnessStatus::from_score(79), FreshnessStatus::Good);
        assert_eq!(FreshnessStatus::from_score(60), FreshnessStatus::Good);
        assert_eq!(FreshnessStatus::from_score(59), FreshnessStatus::Moderate);
        assert_eq!(FreshnessStatus::from_score(40), FreshnessStatus::Moderate);
        assert_eq!(FreshnessStatus::from_score(39), FreshnessStatus::Low);
        assert_eq!(FreshnessStatus::from_score(20), FreshnessStatus::Low);
        assert_eq!(FreshnessStatus::from_score(19), FreshnessStatus::Critical);
        assert_eq!(FreshnessStatus::from_score(0), FreshnessStatus::Critical);
    }

    #[test]
    fn test_discount_matches_status() {
        assert_eq!(discount_percentage(85), 0);
        assert_eq!(discount_percentage(65), 10);
        assert_eq!(discount_percentage(45), 25);
        assert_eq!(discount_percentage(25), 50);
        assert_eq!(discount_percentage(5), 75);
    }
}
