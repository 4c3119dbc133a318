//! Engine Policy
//!
//! Thresholds and money constants the engine evaluates against. Every
//! section deserializes with defaults so a policy file only needs the
//! values it overrides.

use crate::error::{NdrError, NdrResult};
use crate::types::{CallOutcome, NdrReasonCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Complete engine policy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnginePolicy {
    pub proof: ProofPolicy,
    pub cost: CostPolicy,
    pub challenge: ChallengePolicy,
    pub resolution: ResolutionPolicy,
    pub alerts: AlertPolicy,
    /// Reasons that may be verified as genuine
    pub accepted_reasons: Vec<NdrReasonCode>,
}

impl EnginePolicy {
    /// Parse and validate a JSON policy document
    pub fn from_json_str(raw: &str) -> NdrResult<Self> {
        let policy: EnginePolicy = serde_json::from_str(raw)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Reject values the engine cannot evaluate against
    pub fn validate(&self) -> NdrResult<()> {
        self.proof.validate()?;
        self.cost.validate()?;
        self.challenge.validate()?;
        self.resolution.validate()?;
        self.alerts.validate()?;
        if self.accepted_reasons.is_empty() {
            return Err(NdrError::invalid_policy(
                "accepted_reasons must not be empty",
            ));
        }
        Ok(())
    }

    pub fn accepts_reason(&self, reason: &NdrReasonCode) -> bool {
        self.accepted_reasons.contains(reason)
    }
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            proof: ProofPolicy::default(),
            cost: CostPolicy::default(),
            challenge: ChallengePolicy::default(),
            resolution: ResolutionPolicy::default(),
            alerts: AlertPolicy::default(),
            accepted_reasons: vec![
                NdrReasonCode::CustomerUnavailable,
                NdrReasonCode::CustomerRefused,
                NdrReasonCode::AddressIncorrect,
                NdrReasonCode::PremisesClosed,
                NdrReasonCode::CodNotReady,
            ],
        }
    }
}

/// Proof thresholds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofPolicy {
    pub max_gps_distance_meters: u64,
    pub min_call_duration_secs: u32,
    pub accepted_call_outcomes: Vec<CallOutcome>,
}

impl Default for ProofPolicy {
    fn default() -> Self {
        Self {
            max_gps_distance_meters: 200,
            min_call_duration_secs: 10,
            accepted_call_outcomes: CallOutcome::all().to_vec(),
        }
    }
}

impl ProofPolicy {
    fn validate(&self) -> NdrResult<()> {
        if self.max_gps_distance_meters == 0 {
            return Err(NdrError::invalid_policy(
                "proof.max_gps_distance_meters must be positive",
            ));
        }
        if self.accepted_call_outcomes.is_empty() {
            return Err(NdrError::invalid_policy(
                "proof.accepted_call_outcomes must not be empty",
            ));
        }
        Ok(())
    }
}

/// How the potential RTO cost is derived
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum RtoCostPolicy {
    /// Fixed amount per NDR
    Flat(Decimal),
    /// Percentage of the order value
    PercentOfOrderValue(Decimal),
}

/// Money constants
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostPolicy {
    /// Used when the order does not carry its own delivery cost
    pub default_delivery_cost: Decimal,
    pub rto_cost: RtoCostPolicy,
}

impl Default for CostPolicy {
    fn default() -> Self {
        Self {
            default_delivery_cost: Decimal::new(50, 0),
            rto_cost: RtoCostPolicy::Flat(Decimal::new(200, 0)),
        }
    }
}

impl CostPolicy {
    fn validate(&self) -> NdrResult<()> {
        if self.default_delivery_cost.is_sign_negative() {
            return Err(NdrError::invalid_policy(
                "cost.default_delivery_cost must not be negative",
            ));
        }
        match &self.rto_cost {
            RtoCostPolicy::Flat(amount) if amount.is_sign_negative() => {
                return Err(NdrError::invalid_policy(
                    "cost.rto_cost flat amount must not be negative",
                ));
            }
            RtoCostPolicy::PercentOfOrderValue(pct)
                if pct.is_sign_negative() || *pct > Decimal::ONE_HUNDRED =>
            {
                return Err(NdrError::invalid_policy(
                    "cost.rto_cost percentage must be within 0..=100",
                ));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Challenge workflow limits
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengePolicy {
    /// Cap on evidence items attached to one challenge
    pub max_evidence_items: usize,
}

impl Default for ChallengePolicy {
    fn default() -> Self {
        Self {
            max_evidence_items: 10,
        }
    }
}

impl ChallengePolicy {
    fn validate(&self) -> NdrResult<()> {
        if self.max_evidence_items == 0 {
            return Err(NdrError::invalid_policy(
                "challenge.max_evidence_items must be positive",
            ));
        }
        Ok(())
    }
}

/// Customer resolution window
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionPolicy {
    pub default_ttl_minutes: i64,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            default_ttl_minutes: 120,
        }
    }
}

impl ResolutionPolicy {
    /// Zero when out of range, which opening a window rejects
    pub fn default_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_minutes(self.default_ttl_minutes)
            .unwrap_or_else(chrono::Duration::zero)
    }

    fn validate(&self) -> NdrResult<()> {
        if self.default_ttl_minutes <= 0 {
            return Err(NdrError::invalid_policy(
                "resolution.default_ttl_minutes must be positive",
            ));
        }
        if chrono::Duration::try_minutes(self.default_ttl_minutes).is_none() {
            return Err(NdrError::invalid_policy(
                "resolution.default_ttl_minutes is out of range",
            ));
        }
        Ok(())
    }
}

/// Alert thresholds
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPolicy {
    /// Suspicious NDRs in a group must exceed this count
    pub suspicious_count_threshold: u64,
    /// Suspicious ratio above which the alert is high severity, medium otherwise
    pub high_watermark: Decimal,
    /// RTO percentage above which a high RTO alert fires
    pub rto_rate_threshold_pct: Decimal,
    /// Group suspicious patterns by destination bucket
    pub group_by_destination: bool,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            suspicious_count_threshold: 5,
            high_watermark: Decimal::new(50, 2),
            rto_rate_threshold_pct: Decimal::new(15, 0),
            group_by_destination: false,
        }
    }
}

impl AlertPolicy {
    fn validate(&self) -> NdrResult<()> {
        if !(Decimal::ZERO..=Decimal::ONE).contains(&self.high_watermark) {
            return Err(NdrError::invalid_policy(
                "alerts.high_watermark must be within 0..=1",
            ));
        }
        if self.rto_rate_threshold_pct.is_sign_negative()
            || self.rto_rate_threshold_pct > Decimal::ONE_HUNDRED
        {
            return Err(NdrError::invalid_policy(
                "alerts.rto_rate_threshold_pct must be within 0..=100",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = EnginePolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.proof.max_gps_distance_meters, 200);
        assert_eq!(policy.proof.min_call_duration_secs, 10);
        assert_eq!(policy.resolution.default_ttl_minutes, 120);
        assert!(policy.accepts_reason(&NdrReasonCode::CustomerUnavailable));
    }

    #[test]
    fn test_partial_policy_file() {
        let policy = EnginePolicy::from_json_str(
            r#"{"proof": {"max_gps_distance_meters": 150}, "cost": {"rto_cost": {"mode": "percent_of_order_value", "value": "12.5"}}}"#,
        )
        .unwrap();
        assert_eq!(policy.proof.max_gps_distance_meters, 150);
        assert_eq!(policy.proof.min_call_duration_secs, 10);
        assert_eq!(
            policy.cost.rto_cost,
            RtoCostPolicy::PercentOfOrderValue(Decimal::new(125, 1))
        );
    }

    #[test]
    fn test_invalid_watermark_rejected() {
        let mut policy = EnginePolicy::default();
        policy.alerts.high_watermark = Decimal::new(150, 2);
        let err = policy.validate().unwrap_err();
        assert_eq!(err.code(), "NDR-POLICY-001");
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let mut policy = EnginePolicy::default();
        policy.resolution.default_ttl_minutes = 0;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_out_of_range_ttl_rejected() {
        let mut policy = EnginePolicy::default();
        policy.resolution.default_ttl_minutes = i64::MAX;
        assert!(policy.validate().is_err());
        assert_eq!(policy.resolution.default_ttl(), chrono::Duration::zero());
    }
}
