//! Challenge Types
//!
//! Seller-initiated disputes of an NDR verdict.

use super::common::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Evidence a seller can request from the carrier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceType {
    GpsProof,
    CallRecording,
}

impl EvidenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceType::GpsProof => "GPS_PROOF",
            EvidenceType::CallRecording => "CALL_RECORDING",
        }
    }
}

/// One attached evidence item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub evidence_type: EvidenceType,
    /// Opaque locator of the artefact (URL, storage key)
    pub reference: String,
    pub attached_at: DateTime<Utc>,
}

/// Challenge lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeStatus {
    Submitted,
    EvidenceRequested,
    ResolvedUpheld,
    ResolvedOverturned,
}

impl ChallengeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChallengeStatus::ResolvedUpheld | ChallengeStatus::ResolvedOverturned
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeStatus::Submitted => "SUBMITTED",
            ChallengeStatus::EvidenceRequested => "EVIDENCE_REQUESTED",
            ChallengeStatus::ResolvedUpheld => "RESOLVED_UPHELD",
            ChallengeStatus::ResolvedOverturned => "RESOLVED_OVERTURNED",
        }
    }
}

impl std::fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Adjudicator's decision
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjudicationDecision {
    /// Original verdict stands
    Uphold,
    /// Original verdict replaced by a genuine-equivalent record
    Overturn,
}

/// Explicit adjudication input
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjudication {
    pub decision: AdjudicationDecision,
    pub adjudicator: String,
    #[serde(default)]
    pub note: Option<String>,
}

impl Adjudication {
    pub fn uphold(adjudicator: impl Into<String>) -> Self {
        Self {
            decision: AdjudicationDecision::Uphold,
            adjudicator: adjudicator.into(),
            note: None,
        }
    }

    pub fn overturn(adjudicator: impl Into<String>) -> Self {
        Self {
            decision: AdjudicationDecision::Overturn,
            adjudicator: adjudicator.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Recorded adjudication
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeOutcome {
    pub adjudication: Adjudication,
    pub decided_at: DateTime<Utc>,
    /// Superseding record created by an overturn
    pub superseding_ndr_id: Option<NdrRecordId>,
}

/// Challenge reason used when a customer disputes an NDR from the resolution window
pub const CUSTOMER_DISPUTE_REASON: &str = "CUSTOMER_DISPUTE";

/// Seller challenge against one NDR record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub challenge_id: ChallengeId,
    pub ndr_id: NdrRecordId,
    pub order_id: OrderId,
    pub seller_id: SellerId,
    pub reason: String,
    pub comments: Option<String>,
    pub requested_evidence: BTreeSet<EvidenceType>,
    pub evidence: Vec<EvidenceItem>,
    pub status: ChallengeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub outcome: Option<ChallengeOutcome>,
}

impl Challenge {
    pub fn is_customer_dispute(&self) -> bool {
        self.reason == CUSTOMER_DISPUTE_REASON
    }

    /// Evidence types attached so far
    pub fn attached_evidence(&self) -> BTreeSet<EvidenceType> {
        self.evidence.iter().map(|e| e.evidence_type).collect()
    }

    /// Requested evidence still outstanding
    pub fn missing_evidence(&self) -> BTreeSet<EvidenceType> {
        let attached = self.attached_evidence();
        self.requested_evidence
            .difference(&attached)
            .copied()
            .collect()
    }

    pub fn is_pending(&self) -> bool {
        !self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_evidence() {
        let now = Utc::now();
        let challenge = Challenge {
            challenge_id: ChallengeId::new("challenge:ndr:ORD-1:1:v1:1"),
            ndr_id: NdrRecordId::new("ndr:ORD-1:1:v1"),
            order_id: OrderId::new("ORD-1"),
            seller_id: SellerId::new("SELLER-1"),
            reason: "FAKE_ATTEMPT".to_string(),
            comments: None,
            requested_evidence: [EvidenceType::GpsProof, EvidenceType::CallRecording]
                .into_iter()
                .collect(),
            evidence: vec![EvidenceItem {
                evidence_type: EvidenceType::GpsProof,
                reference: "gps://fix/1".to_string(),
                attached_at: now,
            }],
            status: ChallengeStatus::EvidenceRequested,
            created_at: now,
            updated_at: now,
            outcome: None,
        };

        let missing = challenge.missing_evidence();
        assert_eq!(missing.len(), 1);
        assert!(missing.contains(&EvidenceType::CallRecording));
        assert!(challenge.is_pending());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ChallengeStatus::EvidenceRequested).unwrap();
        assert_eq!(json, "\"EVIDENCE_REQUESTED\"");
        assert!(ChallengeStatus::ResolvedOverturned.is_terminal());
    }
}
