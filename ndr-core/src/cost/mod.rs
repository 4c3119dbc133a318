//! Cost Estimator
//!
//! Money is `Decimal`, rounded to 2 dp. Genuine NDRs carry no exposure.

use crate::error::{NdrError, NdrResult};
use crate::policy::{CostPolicy, RtoCostPolicy};
use crate::types::{CostImpact, OrderInfo, Verdict};
use rust_decimal::Decimal;

/// Cost estimator
#[derive(Clone, Debug, Default)]
pub struct CostEstimator {
    policy: CostPolicy,
}

impl CostEstimator {
    pub fn new(policy: CostPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &CostPolicy {
        &self.policy
    }

    /// Exposure of an NDR on `order` with the given verdict
    pub fn estimate(&self, order: &OrderInfo, verdict: &Verdict) -> NdrResult<CostImpact> {
        let order_value = self.order_value(order)?;

        if verdict.is_genuine() {
            return Ok(CostImpact::zero(order_value));
        }

        let delivery_cost = match order.delivery_cost {
            Some(cost) if cost.is_sign_negative() => {
                return Err(NdrError::InvalidOrderValue {
                    order_id: order.order_id.to_string(),
                    reason: format!("delivery cost {} is negative", cost),
                });
            }
            Some(cost) => cost,
            None => self.policy.default_delivery_cost,
        }
        .round_dp(2);

        let potential_rto_cost = match &self.policy.rto_cost {
            RtoCostPolicy::Flat(amount) => *amount,
            RtoCostPolicy::PercentOfOrderValue(pct) => order_value * *pct / Decimal::ONE_HUNDRED,
        }
        .round_dp(2);

        Ok(CostImpact {
            order_value,
            delivery_cost,
            potential_rto_cost,
            total_risk: delivery_cost + potential_rto_cost,
        })
    }

    fn order_value(&self, order: &OrderInfo) -> NdrResult<Decimal> {
        match order.order_value {
            None => Err(NdrError::InvalidOrderValue {
                order_id: order.order_id.to_string(),
                reason: "order value missing".to_string(),
            }),
            Some(value) if value.is_sign_negative() && !value.is_zero() => {
                Err(NdrError::InvalidOrderValue {
                    order_id: order.order_id.to_string(),
                    reason: format!("order value {} is negative", value),
                })
            }
            Some(value) => Ok(value.round_dp(2)),
        }
    }
}
