//! Challenge Workflow
//!
//! ```text
//! NONE ──submit──▶ SUBMITTED ◀──evidence complete── EVIDENCE_REQUESTED
//!          │            │                                  │
//!          └────────────┼──────────submit (missing)────────┘
//!                       ▼
//!           RESOLVED_UPHELD | RESOLVED_OVERTURNED
//! ```
//!
//! One non-terminal challenge per NDR record. Nothing here cancels a
//! challenge on its own; resolution always needs an adjudication.

use crate::error::{NdrError, NdrResult};
use crate::policy::ChallengePolicy;
use crate::types::{
    Adjudication, AdjudicationDecision, Challenge, ChallengeId, ChallengeOutcome,
    ChallengeStatus, EvidenceItem, EvidenceType, NdrRecord, NdrRecordId,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

/// Challenge manager
pub struct ChallengeManager {
    /// All challenges by id
    challenges: HashMap<ChallengeId, Challenge>,
    /// Challenge ids per NDR record, in submission order
    by_ndr: HashMap<NdrRecordId, Vec<ChallengeId>>,
    counter: u64,
    policy: ChallengePolicy,
}

impl ChallengeManager {
    /// Create new manager
    pub fn new() -> Self {
        Self {
            challenges: HashMap::new(),
            by_ndr: HashMap::new(),
            counter: 0,
            policy: ChallengePolicy::default(),
        }
    }

    /// With custom policy
    pub fn with_policy(mut self, policy: ChallengePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Submit a challenge against `record`
    pub fn submit(
        &mut self,
        record: &NdrRecord,
        reason: &str,
        requested_evidence: BTreeSet<EvidenceType>,
        comments: Option<String>,
        now: DateTime<Utc>,
    ) -> NdrResult<Challenge> {
        if record.verdict.is_genuine() {
            return Err(NdrError::GenuineNotChallengeable {
                ndr_id: record.ndr_id.to_string(),
            });
        }

        if let Some(active) = self.active_for(&record.ndr_id) {
            return Err(NdrError::ChallengeAlreadyPending {
                ndr_id: record.ndr_id.to_string(),
                challenge_id: active.challenge_id.to_string(),
            });
        }

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(NdrError::MissingReason);
        }

        self.counter += 1;
        let challenge_id = ChallengeId::new(format!(
            "challenge:{}:{}",
            record.ndr_id.as_str(),
            self.counter
        ));

        // GPS already carried by the proof bundle counts as attached
        let mut evidence = Vec::new();
        let gps_on_file = record
            .proof
            .as_ref()
            .map(|p| p.has_gps())
            .unwrap_or(false);
        if requested_evidence.contains(&EvidenceType::GpsProof) && gps_on_file {
            evidence.push(EvidenceItem {
                evidence_type: EvidenceType::GpsProof,
                reference: format!("proof:{}", record.ndr_id.as_str()),
                attached_at: now,
            });
        }

        let mut challenge = Challenge {
            challenge_id: challenge_id.clone(),
            ndr_id: record.ndr_id.clone(),
            order_id: record.order_id.clone(),
            seller_id: record.seller_id.clone(),
            reason: reason.to_string(),
            comments: comments.filter(|c| !c.trim().is_empty()),
            requested_evidence,
            evidence,
            status: ChallengeStatus::Submitted,
            created_at: now,
            updated_at: now,
            outcome: None,
        };
        if !challenge.missing_evidence().is_empty() {
            challenge.status = ChallengeStatus::EvidenceRequested;
        }

        self.by_ndr
            .entry(record.ndr_id.clone())
            .or_default()
            .push(challenge_id.clone());
        self.challenges.insert(challenge_id, challenge.clone());
        Ok(challenge)
    }

    /// Attach one evidence item
    pub fn provide_evidence(
        &mut self,
        challenge_id: &ChallengeId,
        evidence_type: EvidenceType,
        reference: &str,
        now: DateTime<Utc>,
    ) -> NdrResult<Challenge> {
        let max_items = self.policy.max_evidence_items;
        let challenge = self.get_mut(challenge_id)?;

        if challenge.status.is_terminal() {
            return Err(NdrError::InvalidChallengeTransition {
                from: challenge.status.to_string(),
                to: ChallengeStatus::Submitted.to_string(),
            });
        }
        if reference.trim().is_empty() {
            return Err(NdrError::validation("evidence reference is required"));
        }
        if challenge.evidence.len() >= max_items {
            return Err(NdrError::validation(format!(
                "challenge {} already carries {} evidence items",
                challenge_id, max_items
            )));
        }

        challenge.evidence.push(EvidenceItem {
            evidence_type,
            reference: reference.trim().to_string(),
            attached_at: now,
        });
        challenge.updated_at = now;

        if challenge.status == ChallengeStatus::EvidenceRequested
            && challenge.missing_evidence().is_empty()
        {
            challenge.status = ChallengeStatus::Submitted;
        }

        Ok(challenge.clone())
    }

    /// Check that `challenge_id` may be adjudicated with `adjudication`
    pub fn ensure_adjudicable(
        &self,
        challenge_id: &ChallengeId,
        adjudication: &Adjudication,
    ) -> NdrResult<&Challenge> {
        let challenge = self.get_or_not_found(challenge_id)?;
        if challenge.status.is_terminal() {
            return Err(NdrError::InvalidChallengeTransition {
                from: challenge.status.to_string(),
                to: "RESOLVED".to_string(),
            });
        }
        if adjudication.adjudicator.trim().is_empty() {
            return Err(NdrError::validation("adjudicator is required"));
        }
        Ok(challenge)
    }

    /// Record an adjudication
    ///
    /// An overturn must name the superseding record the caller appended;
    /// an uphold must not.
    pub fn adjudicate(
        &mut self,
        challenge_id: &ChallengeId,
        adjudication: Adjudication,
        superseding_ndr_id: Option<NdrRecordId>,
        now: DateTime<Utc>,
    ) -> NdrResult<Challenge> {
        self.ensure_adjudicable(challenge_id, &adjudication)?;

        let status = match (adjudication.decision, &superseding_ndr_id) {
            (AdjudicationDecision::Uphold, None) => ChallengeStatus::ResolvedUpheld,
            (AdjudicationDecision::Overturn, Some(_)) => ChallengeStatus::ResolvedOverturned,
            (AdjudicationDecision::Uphold, Some(_)) => {
                return Err(NdrError::LedgerConflict {
                    reason: "upheld challenge cannot supersede a record".to_string(),
                });
            }
            (AdjudicationDecision::Overturn, None) => {
                return Err(NdrError::LedgerConflict {
                    reason: "overturned challenge needs a superseding record".to_string(),
                });
            }
        };

        let challenge = self.get_mut(challenge_id)?;
        challenge.status = status;
        challenge.updated_at = now;
        challenge.outcome = Some(ChallengeOutcome {
            adjudication,
            decided_at: now,
            superseding_ndr_id,
        });

        Ok(challenge.clone())
    }

    /// Get challenge
    pub fn get(&self, challenge_id: &ChallengeId) -> Option<&Challenge> {
        self.challenges.get(challenge_id)
    }

    /// Challenges raised against a record, oldest first
    pub fn for_ndr(&self, ndr_id: &NdrRecordId) -> Vec<&Challenge> {
        self.by_ndr
            .get(ndr_id)
            .map(|ids| ids.iter().filter_map(|id| self.challenges.get(id)).collect())
            .unwrap_or_default()
    }

    /// The non-terminal challenge on a record, if any
    pub fn active_for(&self, ndr_id: &NdrRecordId) -> Option<&Challenge> {
        self.for_ndr(ndr_id).into_iter().find(|c| c.is_pending())
    }

    /// All challenges, oldest first
    pub fn list(&self) -> Vec<&Challenge> {
        let mut all: Vec<&Challenge> = self.challenges.values().collect();
        all.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.challenge_id.cmp(&b.challenge_id))
        });
        all
    }

    /// Get open challenges count
    pub fn open_challenge_count(&self) -> usize {
        self.challenges.values().filter(|c| c.is_pending()).count()
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }

    fn get_or_not_found(&self, challenge_id: &ChallengeId) -> NdrResult<&Challenge> {
        self.challenges
            .get(challenge_id)
            .ok_or_else(|| NdrError::not_found("Challenge", challenge_id.as_str()))
    }

    fn get_mut(&mut self, challenge_id: &ChallengeId) -> NdrResult<&mut Challenge> {
        self.challenges
            .get_mut(challenge_id)
            .ok_or_else(|| NdrError::not_found("Challenge", challenge_id.as_str()))
    }
}

impl Default for ChallengeManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CostImpact, GeoPoint, NdrReasonCode, OrderId, ProofBundle, RecordOrigin, SellerId,
        Verdict,
    };
    use rust_decimal::Decimal;

    fn record(verdict: Verdict, with_gps: bool) -> NdrRecord {
        let now = Utc::now();
        let mut proof = ProofBundle::empty(now);
        if with_gps {
            proof = proof.with_gps(GeoPoint::new(12.98, 77.59), GeoPoint::new(12.97, 77.59));
        }
        let order_id = OrderId::new("ORD-1");
        NdrRecord {
            ndr_id: NdrRecordId::for_attempt(&order_id, 1, 1),
            order_id,
            seller_id: SellerId::new("SELLER-1"),
            carrier: "Delhivery".to_string(),
            destination: "560001".to_string(),
            attempt_sequence: 1,
            attempted_at: now,
            reason: NdrReasonCode::CustomerUnavailable,
            proof: Some(proof),
            validation: None,
            verdict,
            cost_impact: CostImpact::zero(Decimal::new(999, 0)),
            origin: RecordOrigin::Classification,
            supersedes: None,
            recorded_at: now,
        }
    }

    fn suspicious() -> Verdict {
        Verdict::Suspicious {
            violations: vec!["Call duration 8s (min: 10s)".to_string()],
        }
    }

    fn evidence(types: &[EvidenceType]) -> BTreeSet<EvidenceType> {
        types.iter().copied().collect()
    }

    #[test]
    fn test_submit_without_missing_evidence() {
        let mut manager = ChallengeManager::new();
        let challenge = manager
            .submit(
                &record(suspicious(), true),
                "FAKE_ATTEMPT",
                evidence(&[EvidenceType::GpsProof]),
                Some("Customer was home".to_string()),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(challenge.status, ChallengeStatus::Submitted);
        assert_eq!(challenge.challenge_id.as_str(), "challenge:ndr:ORD-1:1:v1:1");
        assert_eq!(challenge.evidence.len(), 1);
    }

    #[test]
    fn test_submit_requests_missing_evidence() {
        let mut manager = ChallengeManager::new();
        let challenge = manager
            .submit(
                &record(suspicious(), false),
                "FAKE_ATTEMPT",
                evidence(&[EvidenceType::GpsProof, EvidenceType::CallRecording]),
                None,
                Utc::now(),
            )
            .unwrap();
        assert_eq!(challenge.status, ChallengeStatus::EvidenceRequested);

        let id = challenge.challenge_id.clone();
        let partial = manager
            .provide_evidence(&id, EvidenceType::GpsProof, "gps://fix/9", Utc::now())
            .unwrap();
        assert_eq!(partial.status, ChallengeStatus::EvidenceRequested);

        let complete = manager
            .provide_evidence(&id, EvidenceType::CallRecording, "rec://call/9", Utc::now())
            .unwrap();
        assert_eq!(complete.status, ChallengeStatus::Submitted);
    }

    #[test]
    fn test_genuine_record_not_challengeable() {
        let mut manager = ChallengeManager::new();
        let err = manager
            .submit(
                &record(Verdict::Genuine, true),
                "FAKE_ATTEMPT",
                BTreeSet::new(),
                None,
                Utc::now(),
            )
            .unwrap_err();

        assert!(matches!(err, NdrError::GenuineNotChallengeable { .. }));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_second_challenge_rejected_while_pending() {
        let mut manager = ChallengeManager::new();
        let rec = record(suspicious(), true);
        manager
            .submit(&rec, "FAKE_ATTEMPT", BTreeSet::new(), None, Utc::now())
            .unwrap();

        let err = manager
            .submit(&rec, "WRONG_REASON", BTreeSet::new(), None, Utc::now())
            .unwrap_err();
        assert_eq!(err.code(), "NDR-CHAL-001");
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_blank_reason_rejected() {
        let mut manager = ChallengeManager::new();
        let err = manager
            .submit(&record(suspicious(), true), "   ", BTreeSet::new(), None, Utc::now())
            .unwrap_err();
        assert_eq!(err, NdrError::MissingReason);
    }

    #[test]
    fn test_adjudication_transitions() {
        let mut manager = ChallengeManager::new();
        let rec = record(suspicious(), true);
        let challenge = manager
            .submit(&rec, "FAKE_ATTEMPT", BTreeSet::new(), None, Utc::now())
            .unwrap();
        let id = challenge.challenge_id;

        let resolved = manager
            .adjudicate(
                &id,
                Adjudication::uphold("ops-lead").with_note("GPS trace confirms attempt"),
                None,
                Utc::now(),
            )
            .unwrap();
        assert_eq!(resolved.status, ChallengeStatus::ResolvedUpheld);

        // Terminal states are final
        let err = manager
            .adjudicate(&id, Adjudication::uphold("ops-lead"), None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, NdrError::InvalidChallengeTransition { .. }));

        // A new challenge is allowed once the previous one is resolved
        assert!(manager
            .submit(&rec, "NEW_EVIDENCE", BTreeSet::new(), None, Utc::now())
            .is_ok());
    }

    #[test]
    fn test_overturn_requires_superseding_record() {
        let mut manager = ChallengeManager::new();
        let rec = record(suspicious(), true);
        let id = manager
            .submit(&rec, "FAKE_ATTEMPT", BTreeSet::new(), None, Utc::now())
            .unwrap()
            .challenge_id;

        assert!(manager
            .adjudicate(&id, Adjudication::overturn("ops-lead"), None, Utc::now())
            .is_err());

        let superseding = NdrRecordId::for_attempt(&rec.order_id, 1, 2);
        let resolved = manager
            .adjudicate(
                &id,
                Adjudication::overturn("ops-lead"),
                Some(superseding.clone()),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(resolved.status, ChallengeStatus::ResolvedOverturned);
        assert_eq!(resolved.outcome.unwrap().superseding_ndr_id, Some(superseding));
    }

    #[test]
    fn test_unknown_challenge() {
        let mut manager = ChallengeManager::new();
        let err = manager
            .provide_evidence(
                &ChallengeId::new("challenge:none"),
                EvidenceType::GpsProof,
                "gps://x",
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, NdrError::NotFound { .. }));
    }
}
