//! NDR Records and Verdicts
//!
//! Core invariants:
//! - A verdict carries violations iff it is not `GENUINE`
//! - Records are immutable; corrections append a superseding record

use super::attempt::NdrReasonCode;
use super::common::*;
use super::proof::{ProofBundle, ProofValidation};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Classification verdict
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Proof checks passed and the stated reason is acceptable
    Genuine,
    /// At least one proof check failed
    Suspicious { violations: Vec<String> },
    /// No usable proof, no determination possible
    Unverified { violations: Vec<String> },
}

impl Verdict {
    pub fn kind(&self) -> VerdictKind {
        match self {
            Verdict::Genuine => VerdictKind::Genuine,
            Verdict::Suspicious { .. } => VerdictKind::Suspicious,
            Verdict::Unverified { .. } => VerdictKind::Unverified,
        }
    }

    pub fn violations(&self) -> &[String] {
        match self {
            Verdict::Genuine => &[],
            Verdict::Suspicious { violations } | Verdict::Unverified { violations } => violations,
        }
    }

    pub fn is_genuine(&self) -> bool {
        matches!(self, Verdict::Genuine)
    }

    /// Violations present iff not genuine
    pub fn is_consistent(&self) -> bool {
        self.is_genuine() == self.violations().is_empty()
    }
}

/// Verdict without payload, for grouping and filters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictKind {
    Genuine,
    Suspicious,
    Unverified,
}

impl VerdictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictKind::Genuine => "GENUINE",
            VerdictKind::Suspicious => "SUSPICIOUS",
            VerdictKind::Unverified => "UNVERIFIED",
        }
    }

    /// Verdicts that carry RTO exposure
    pub fn carries_risk(&self) -> bool {
        !matches!(self, VerdictKind::Genuine)
    }
}

impl std::fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Financial exposure of an NDR
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostImpact {
    pub order_value: Decimal,
    pub delivery_cost: Decimal,
    pub potential_rto_cost: Decimal,
    pub total_risk: Decimal,
}

impl CostImpact {
    /// No exposure
    pub fn zero(order_value: Decimal) -> Self {
        Self {
            order_value,
            delivery_cost: Decimal::ZERO,
            potential_rto_cost: Decimal::ZERO,
            total_risk: Decimal::ZERO,
        }
    }
}

/// How a record came to exist
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordOrigin {
    Classification,
    ChallengeOverturn { challenge_id: ChallengeId },
}

/// One non-delivery report version
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NdrRecord {
    pub ndr_id: NdrRecordId,
    pub order_id: OrderId,
    pub seller_id: SellerId,
    pub carrier: String,
    pub destination: String,
    pub attempt_sequence: u32,
    pub attempted_at: DateTime<Utc>,
    pub reason: NdrReasonCode,
    pub proof: Option<ProofBundle>,
    pub validation: Option<ProofValidation>,
    #[serde(flatten)]
    pub verdict: Verdict,
    pub cost_impact: CostImpact,
    #[serde(flatten)]
    pub origin: RecordOrigin,
    /// Record this one replaces
    pub supersedes: Option<NdrRecordId>,
    pub recorded_at: DateTime<Utc>,
}

impl NdrRecord {
    pub fn verdict_kind(&self) -> VerdictKind {
        self.verdict.kind()
    }

    pub fn is_overturn(&self) -> bool {
        matches!(self.origin, RecordOrigin::ChallengeOverturn { .. })
    }

    /// Version number parsed from the deterministic id, 1 when absent
    pub fn version(&self) -> u32 {
        self.ndr_id
            .as_str()
            .rsplit(":v")
            .next()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1)
    }

    /// Superseding genuine-equivalent record produced by an overturned challenge
    pub fn overturned_by(&self, challenge_id: ChallengeId, now: DateTime<Utc>) -> NdrRecord {
        NdrRecord {
            ndr_id: NdrRecordId::for_attempt(
                &self.order_id,
                self.attempt_sequence,
                self.version() + 1,
            ),
            order_id: self.order_id.clone(),
            seller_id: self.seller_id.clone(),
            carrier: self.carrier.clone(),
            destination: self.destination.clone(),
            attempt_sequence: self.attempt_sequence,
            attempted_at: self.attempted_at,
            reason: self.reason.clone(),
            proof: self.proof.clone(),
            validation: self.validation.clone(),
            verdict: Verdict::Genuine,
            cost_impact: CostImpact::zero(self.cost_impact.order_value),
            origin: RecordOrigin::ChallengeOverturn { challenge_id },
            supersedes: Some(self.ndr_id.clone()),
            recorded_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_consistency() {
        assert!(Verdict::Genuine.is_consistent());
        assert!(Verdict::Suspicious {
            violations: vec!["x".to_string()]
        }
        .is_consistent());
        assert!(!Verdict::Unverified { violations: vec![] }.is_consistent());
    }

    #[test]
    fn test_verdict_serialization_is_tagged() {
        let verdict = Verdict::Suspicious {
            violations: vec!["Call duration 8s (min: 10s)".to_string()],
        };
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["verdict"], "SUSPICIOUS");
        assert_eq!(json["violations"][0], "Call duration 8s (min: 10s)");
    }

    #[test]
    fn test_record_id_versions() {
        let id = NdrRecordId::for_attempt(&OrderId::new("ORD-9"), 2, 1);
        assert_eq!(id.as_str(), "ndr:ORD-9:2:v1");
    }
}
