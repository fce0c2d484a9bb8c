//! Expiration and waste risk scoring.

use serde::{Deserialize, Serialize};

use demandcast_core::round_to;

/// Derived risk figures for a stocked product (not persisted).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub expiration_risk_score: f64,
    pub waste_risk_score: f64,
    pub days_of_inventory: f64,
}

/// Closed-form risk formulas.
#[derive(Debug, Default, Clone, Copy)]
pub struct RiskEngine;

impl RiskEngine {
    /// Sales velocity floor, avoids dividing by zero for slow movers.
    pub const MIN_DAILY_SALES: f64 = 0.1;
    /// Risk when stock sells through but expiry is less than this many days away.
    pub const IMMINENT_EXPIRY_DAYS: i64 = 3;

    /// Estimated days until stockout at the current pace.
    pub fn days_of_inventory(stock: f64, avg_daily_sales: f64) -> f64 {
        stock.max(0.0) / avg_daily_sales.max(Self::MIN_DAILY_SALES)
    }

    /// Probability-like score in `[0, 1]` that stock is still on hand at expiry.
    pub fn expiration_risk(stock: f64, days_to_expiry: i64, avg_daily_sales: f64) -> f64 {
        let doi = Self::days_of_inventory(stock, avg_daily_sales);
        let horizon = days_to_expiry as f64;

        let risk = if days_to_expiry <= 0 {
            1.0
        } else if doi > horizon {
            ((doi - horizon) / doi + 0.5).min(1.0)
        } else if days_to_expiry < Self::IMMINENT_EXPIRY_DAYS {
            0.7
        } else {
            0.1
        };
        risk.clamp(0.0, 1.0)
    }

    /// Waste risk: expiration risk amplified by product cost, capped at 2×.
    pub fn waste_risk(expiration_risk: f64, product_cost: f64) -> f64 {
        let amplifier = (1.0 + product_cost.max(0.0) / 100.0).min(2.0);
        round_to(expiration_risk * amplifier, 2).clamp(0.0, 1.0)
    }

    pub fn assess(stock: f64, days_to_expiry: i64, avg_daily_sales: f64, product_cost: f64) -> RiskAssessment {
        let expiration = Self::expiration_risk(stock, days_to_expiry, avg_daily_sales);
        RiskAssessment {
            expiration_risk_score: round_to(expiration, 2),
            waste_risk_score: Self::waste_risk(expiration, product_cost),
            days_of_inventory: round_to(Self::days_of_inventory(stock, avg_daily_sales), 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn expired_stock_is_maximum_risk() {
        assert_eq!(RiskEngine::expiration_risk(0.0, 0, 5.0), 1.0);
        assert_eq!(RiskEngine::expiration_risk(40.0, -2, 5.0), 1.0);
    }

    #[test]
    fn fast_moving_stock_far_from_expiry_is_safe() {
        assert_eq!(RiskEngine::expiration_risk(100.0, 365, 10.0), 0.1);
    }

    #[test]
    fn overstock_scales_with_excess_days() {
        // 100 units at 15/day = 6.67 days of stock vs 5 days to expiry.
        let risk = RiskEngine::expiration_risk(100.0, 5, 15.0);
        let doi = 100.0 / 15.0;
        assert!((risk - ((doi - 5.0) / doi + 0.5)).abs() < 1e-12);
    }

    #[test]
    fn imminent_expiry_with_enough_velocity() {
        assert_eq!(RiskEngine::expiration_risk(2.0, 2, 5.0), 0.7);
    }

    #[test]
    fn zero_sales_uses_velocity_floor() {
        assert_eq!(RiskEngine::days_of_inventory(1.0, 0.0), 10.0);
        assert_eq!(RiskEngine::expiration_risk(1.0, 30, 0.0), 0.1);
    }

    #[test]
    fn waste_risk_is_amplified_by_cost_and_capped() {
        assert_eq!(RiskEngine::waste_risk(0.4, 50.0), 0.6);
        assert_eq!(RiskEngine::waste_risk(0.4, 500.0), 0.8);
        assert_eq!(RiskEngine::waste_risk(0.7, 100.0), 1.0);
        assert_eq!(RiskEngine::waste_risk(0.1, 0.0), 0.1);
    }

    #[test]
    fn assessment_rounds_figures() {
        let a = RiskEngine::assess(100.0, 5, 15.0, 2.5);
        assert_eq!(a.days_of_inventory, 6.7);
        assert_eq!(a.expiration_risk_score, 0.75);
        assert_eq!(a.waste_risk_score, 0.77);
    }

    proptest! {
        #[test]
        fn scores_stay_in_unit_interval(
            stock in 0.0f64..10_000.0,
            days in -30i64..400,
            sales in 0.0f64..500.0,
            cost in 0.0f64..1_000.0,
        ) {
            let a = RiskEngine::assess(stock, days, sales, cost);
            prop_assert!((0.0..=1.0).contains(&a.expiration_risk_score));
            prop_assert!((0.0..=1.0).contains(&a.waste_risk_score));
            prop_assert!(a.days_of_inventory >= 0.0);
        }
    }
}
