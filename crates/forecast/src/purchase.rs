//! Replenishment advice from stock policy and forecast demand.

use serde::{Deserialize, Serialize};

use demandcast_core::round_to;

/// Stock policy thresholds for a single product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockPolicy {
    pub min_stock: f64,
    pub max_stock: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecommendation {
    /// Whole units, never negative.
    pub recommended_purchase_qty: f64,
    pub reason: String,
    pub projected_stock_7d: f64,
}

impl PurchaseRecommendation {
    pub fn is_needed(&self) -> bool {
        self.recommended_purchase_qty > 0.0
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PurchaseAdvisor;

impl PurchaseAdvisor {
    pub const ADEQUATE_REASON: &'static str = "Projected stock adequate";

    /// Share of the min..max band to refill on top of the deficit.
    pub const FILL_RATIO: f64 = 0.5;

    pub fn recommend(current_stock: f64, policy: StockPolicy, predicted_demand_next_7d: f64) -> PurchaseRecommendation {
        let projected = current_stock - predicted_demand_next_7d;
        let deficit = (policy.min_stock - projected).max(0.0);
        let fill_to_max = if deficit > 0.0 {
            Self::FILL_RATIO * (policy.max_stock - policy.min_stock)
        } else {
            0.0
        };
        let qty = round_to(deficit + fill_to_max, 0).max(0.0);

        let reason = if qty > 0.0 {
            format!(
                "Projected stock ({}) below min ({})",
                round_to(projected, 0),
                policy.min_stock
            )
        } else {
            Self::ADEQUATE_REASON.to_string()
        };

        PurchaseRecommendation {
            recommended_purchase_qty: qty,
            reason,
            projected_stock_7d: round_to(projected, 2),
        }
    }
}
