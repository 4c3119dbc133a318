//! NDR Engine
//!
//! Owns the core state behind `tokio::sync::RwLock`s and runs the inbound
//! operations against it. Lock order is always orders, ledger, challenges,
//! resolutions. Operations on one NDR record or one (phone, order) pair are
//! additionally serialized through keyed locks.

use crate::clock::{Clock, SystemClock};
use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, EventSink, TracingSink};
use crate::gateway::{MessagingGateway, MockMessagingGateway};
use crate::locks::KeyedLocks;
use crate::query::{EngineStats, QueryFilter, ResolutionStatusFilter};
use chrono::{DateTime, Duration, Utc};
use ndr_core::{
    mask_phone, parse_reply, window_expiry, Adjudication, AdjudicationDecision, Alert,
    AlertGenerator, AlertInput, CarrierPeriodStat, Challenge, ChallengeId, ChallengeManager, CostEstimator,
    CustomerAction, DeliveryAttempt, EnginePolicy, EventCode, EvidenceType, NdrClassifier,
    NdrError, NdrLedger, NdrRecord, NdrRecordId, NotificationRequest, OrderHistory, OrderId,
    OrderInfo, PendingResolution, ProofBundle, RecordOrigin, ReplyIntent, ReportingPeriod,
    ResolutionKey, ResolutionStatus, ResolutionTracker, ScorecardAggregator, SellerDashboard,
    SellerId, TemplateKey, CUSTOMER_DISPUTE_REASON,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Order with its attempt history and submitted proofs
#[derive(Clone, Debug)]
struct OrderEntry {
    info: OrderInfo,
    attempts: Vec<DeliveryAttempt>,
    /// Proof per attempt sequence
    proofs: HashMap<u32, ProofBundle>,
}

impl OrderEntry {
    fn new(info: OrderInfo) -> Self {
        Self {
            info,
            attempts: Vec::new(),
            proofs: HashMap::new(),
        }
    }

    /// Most recent NDR attempt
    fn latest_ndr(&self) -> Option<&DeliveryAttempt> {
        self.attempts.iter().rev().find(|a| a.is_ndr())
    }

    fn has_rto(&self) -> bool {
        self.attempts.iter().any(|a| a.event_code == EventCode::Rto)
    }
}

/// Result of an adjudication
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdjudicationResult {
    pub challenge: Challenge,
    /// Present when the challenge was overturned
    pub superseding_record: Option<NdrRecord>,
}

/// What happened to an inbound customer reply
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReplyOutcome {
    Resolved { resolution: PendingResolution },
    HelpSent { order_id: OrderId },
    ClarificationSent { order_id: OrderId },
    /// No live window for the phone; a general greeting was sent
    NoPendingWindow,
}

/// NDR Engine - main orchestration engine
pub struct NdrEngine {
    policy: EnginePolicy,
    classifier: NdrClassifier,
    cost: CostEstimator,
    alerts: AlertGenerator,
    scorecard: ScorecardAggregator,
    /// Registered orders
    orders: RwLock<HashMap<OrderId, OrderEntry>>,
    /// Verdict ledger
    ledger: RwLock<NdrLedger>,
    /// Challenge workflow
    challenges: RwLock<ChallengeManager>,
    /// Customer resolution windows
    resolutions: RwLock<ResolutionTracker>,
    record_locks: KeyedLocks<NdrRecordId>,
    resolution_locks: KeyedLocks<ResolutionKey>,
    gateway: Arc<dyn MessagingGateway>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl NdrEngine {
    /// Create an engine with a validated policy, mock gateway, tracing sink
    /// and system clock
    pub fn new(policy: EnginePolicy) -> EngineResult<Self> {
        policy.validate()?;

        Ok(Self {
            classifier: NdrClassifier::from_policy(&policy),
            cost: CostEstimator::new(policy.cost.clone()),
            alerts: AlertGenerator::new(policy.alerts.clone()),
            scorecard: ScorecardAggregator::new(),
            orders: RwLock::new(HashMap::new()),
            ledger: RwLock::new(NdrLedger::new()),
            challenges: RwLock::new(
                ChallengeManager::new().with_policy(policy.challenge.clone()),
            ),
            resolutions: RwLock::new(ResolutionTracker::new()),
            record_locks: KeyedLocks::new(),
            resolution_locks: KeyedLocks::new(),
            gateway: Arc::new(MockMessagingGateway::new()),
            sink: Arc::new(TracingSink),
            clock: Arc::new(SystemClock),
            policy,
        })
    }

    /// Create with the default policy
    pub fn default_policy() -> EngineResult<Self> {
        Self::new(EnginePolicy::default())
    }

    /// With custom messaging gateway
    pub fn with_gateway(mut self, gateway: Arc<dyn MessagingGateway>) -> Self {
        self.gateway = gateway;
        self
    }

    /// With custom event sink
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// With custom clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ============================================================
    // Orders, attempts and proof
    // ============================================================

    /// Register the order NDRs will be reported against
    pub async fn register_order(&self, order: OrderInfo) -> EngineResult<OrderInfo> {
        if order.order_id.as_str().trim().is_empty() {
            return Err(NdrError::validation("order_id is required").into());
        }
        if let Some(value) = order.order_value {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(NdrError::InvalidOrderValue {
                    order_id: order.order_id.to_string(),
                    reason: format!("order value {} is negative", value),
                }
                .into());
            }
        }
        if let Some(coords) = &order.registered_coordinates {
            if !coords.is_well_formed() {
                return Err(NdrError::validation(format!(
                    "registered coordinates out of range ({}, {})",
                    coords.latitude, coords.longitude
                ))
                .into());
            }
        }

        {
            let mut orders = self.orders.write().await;
            if orders.contains_key(&order.order_id) {
                return Err(NdrError::validation(format!(
                    "order {} is already registered",
                    order.order_id
                ))
                .into());
            }
            orders.insert(order.order_id.clone(), OrderEntry::new(order.clone()));
        }

        info!(
            order_id = %order.order_id,
            seller_id = %order.seller_id,
            carrier = %order.carrier,
            "Order registered"
        );
        self.publish(EngineEvent::OrderRegistered {
            order_id: order.order_id.clone(),
        })
        .await;

        Ok(order)
    }

    /// Append a courier attempt; the sequence is assigned here
    pub async fn record_attempt(
        &self,
        order_id: &OrderId,
        mut attempt: DeliveryAttempt,
    ) -> EngineResult<DeliveryAttempt> {
        {
            let mut orders = self.orders.write().await;
            let entry = orders
                .get_mut(order_id)
                .ok_or_else(|| NdrError::not_found("Order", order_id.as_str()))?;

            attempt.sequence = entry.attempts.len() as u32 + 1;
            if !attempt.is_ndr() {
                attempt.ndr_reason = None;
            }
            entry.attempts.push(attempt.clone());
        }

        debug!(
            order_id = %order_id,
            sequence = attempt.sequence,
            event_code = %attempt.event_code,
            "Attempt recorded"
        );
        self.publish(EngineEvent::AttemptRecorded {
            order_id: order_id.clone(),
            sequence: attempt.sequence,
            event_code: attempt.event_code.clone(),
        })
        .await;

        Ok(attempt)
    }

    /// Attach proof to the latest NDR attempt of an order
    ///
    /// Missing registered coordinates are filled from the order.
    pub async fn submit_proof(
        &self,
        order_id: &OrderId,
        mut proof: ProofBundle,
    ) -> EngineResult<ProofBundle> {
        let sequence = {
            let mut orders = self.orders.write().await;
            let entry = orders
                .get_mut(order_id)
                .ok_or_else(|| NdrError::not_found("Order", order_id.as_str()))?;
            let sequence = entry
                .latest_ndr()
                .map(|a| a.sequence)
                .ok_or_else(|| NdrError::not_found("NdrAttempt", order_id.as_str()))?;

            let ledger = self.ledger.read().await;
            if ledger.current_for_attempt(order_id, sequence).is_some() {
                return Err(NdrError::ProofAlreadyClassified {
                    order_id: order_id.to_string(),
                    sequence,
                }
                .into());
            }
            drop(ledger);

            if proof.required_location.is_none() {
                proof.required_location = entry.info.registered_coordinates;
            }
            entry.proofs.insert(sequence, proof.clone());
            sequence
        };

        debug!(order_id = %order_id, sequence, "Proof submitted");
        self.publish(EngineEvent::ProofSubmitted {
            order_id: order_id.clone(),
            sequence,
        })
        .await;

        Ok(proof)
    }

    /// Classify the latest NDR attempt of an order
    ///
    /// Returns the current record unchanged when the attempt is already
    /// classified.
    pub async fn classify(&self, order_id: &OrderId) -> EngineResult<NdrRecord> {
        let orders = self.orders.read().await;
        let entry = orders
            .get(order_id)
            .ok_or_else(|| NdrError::not_found("Order", order_id.as_str()))?;
        let attempt = entry
            .latest_ndr()
            .ok_or_else(|| NdrError::not_found("NdrAttempt", order_id.as_str()))?;

        let mut ledger = self.ledger.write().await;
        if let Some(existing) = ledger.current_for_attempt(order_id, attempt.sequence) {
            return Ok(existing.clone());
        }

        let proof = entry.proofs.get(&attempt.sequence);
        let classification = self.classifier.classify(order_id, attempt, proof)?;
        let cost_impact = self.cost.estimate(&entry.info, &classification.verdict)?;

        let record = NdrRecord {
            ndr_id: NdrRecordId::for_attempt(order_id, attempt.sequence, 1),
            order_id: order_id.clone(),
            seller_id: entry.info.seller_id.clone(),
            carrier: entry.info.carrier.clone(),
            destination: entry.info.destination.clone(),
            attempt_sequence: attempt.sequence,
            attempted_at: attempt.attempted_at,
            reason: classification.reason,
            proof: proof.cloned(),
            validation: classification.validation,
            verdict: classification.verdict,
            cost_impact,
            origin: RecordOrigin::Classification,
            supersedes: None,
            recorded_at: self.clock.now(),
        };
        let record = ledger.append(record)?.clone();
        drop(ledger);
        drop(orders);

        info!(
            ndr_id = %record.ndr_id,
            verdict = %record.verdict_kind(),
            violations = record.verdict.violations().len(),
            total_risk = %record.cost_impact.total_risk,
            "NDR classified"
        );
        self.publish(EngineEvent::NdrRecorded {
            ndr_id: record.ndr_id.clone(),
            order_id: record.order_id.clone(),
            verdict: record.verdict_kind(),
            supersedes: None,
        })
        .await;

        Ok(record)
    }

    // ============================================================
    // Challenges
    // ============================================================

    /// Challenge the current NDR record of an order
    pub async fn submit_challenge(
        &self,
        order_id: &OrderId,
        reason: &str,
        requested_evidence: BTreeSet<EvidenceType>,
        comments: Option<String>,
    ) -> EngineResult<Challenge> {
        let ndr_id = self.current_ndr_id(order_id).await?;
        let _guard = self.record_locks.lock(&ndr_id).await;

        let challenge = {
            let ledger = self.ledger.read().await;
            let record = ledger
                .latest_current(order_id)
                .ok_or_else(|| NdrError::not_found("NdrRecord", order_id.as_str()))?;
            let mut challenges = self.challenges.write().await;
            challenges.submit(record, reason, requested_evidence, comments, self.clock.now())?
        };

        info!(
            challenge_id = %challenge.challenge_id,
            ndr_id = %challenge.ndr_id,
            status = %challenge.status,
            "Challenge submitted"
        );
        self.publish_challenge(&challenge).await;

        Ok(challenge)
    }

    /// Attach evidence to a challenge
    pub async fn provide_evidence(
        &self,
        challenge_id: &ChallengeId,
        evidence_type: EvidenceType,
        reference: &str,
    ) -> EngineResult<Challenge> {
        let ndr_id = self.challenge_ndr_id(challenge_id).await?;
        let _guard = self.record_locks.lock(&ndr_id).await;

        let challenge = self.challenges.write().await.provide_evidence(
            challenge_id,
            evidence_type,
            reference,
            self.clock.now(),
        )?;

        debug!(
            challenge_id = %challenge_id,
            evidence_type = evidence_type.as_str(),
            status = %challenge.status,
            "Evidence attached"
        );
        self.publish_challenge(&challenge).await;

        Ok(challenge)
    }

    /// Resolve a challenge with an explicit adjudication
    ///
    /// An overturn appends a genuine record with zero exposure that
    /// supersedes the challenged one.
    pub async fn adjudicate(
        &self,
        challenge_id: &ChallengeId,
        adjudication: Adjudication,
    ) -> EngineResult<AdjudicationResult> {
        let ndr_id = self.challenge_ndr_id(challenge_id).await?;
        let _guard = self.record_locks.lock(&ndr_id).await;
        let now = self.clock.now();

        let mut ledger = self.ledger.write().await;
        let mut challenges = self.challenges.write().await;
        challenges.ensure_adjudicable(challenge_id, &adjudication)?;

        let superseding = match adjudication.decision {
            AdjudicationDecision::Overturn => {
                let original = ledger
                    .get(&ndr_id)
                    .ok_or_else(|| NdrError::not_found("NdrRecord", ndr_id.as_str()))?;
                let record = original.overturned_by(challenge_id.clone(), now);
                ledger.check_append(&record)?;
                Some(record)
            }
            AdjudicationDecision::Uphold => None,
        };

        let challenge = challenges.adjudicate(
            challenge_id,
            adjudication,
            superseding.as_ref().map(|r| r.ndr_id.clone()),
            now,
        )?;
        let superseding_record = match superseding {
            Some(record) => Some(ledger.append(record)?.clone()),
            None => None,
        };
        drop(challenges);
        drop(ledger);

        info!(
            challenge_id = %challenge_id,
            ndr_id = %ndr_id,
            status = %challenge.status,
            "Challenge adjudicated"
        );
        self.publish_challenge(&challenge).await;
        if let Some(record) = &superseding_record {
            self.publish(EngineEvent::NdrRecorded {
                ndr_id: record.ndr_id.clone(),
                order_id: record.order_id.clone(),
                verdict: record.verdict_kind(),
                supersedes: record.supersedes.clone(),
            })
            .await;
        }

        Ok(AdjudicationResult {
            challenge,
            superseding_record,
        })
    }

    // ============================================================
    // Customer resolution
    // ============================================================

    /// Notify the customer and open a resolution window
    ///
    /// The phone defaults to the order's customer phone and the ttl to the
    /// policy default. Nothing is opened when the notification fails.
    pub async fn open_resolution_window(
        &self,
        order_id: &OrderId,
        phone: Option<String>,
        ttl: Option<Duration>,
    ) -> EngineResult<PendingResolution> {
        let phone = {
            let orders = self.orders.read().await;
            let entry = orders
                .get(order_id)
                .ok_or_else(|| NdrError::not_found("Order", order_id.as_str()))?;
            phone
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| entry.info.customer_phone.clone())
                .trim()
                .to_string()
        };
        let ttl = ttl.unwrap_or_else(|| self.policy.resolution.default_ttl());
        let now = self.clock.now();
        window_expiry(ttl, now)?;

        let key = ResolutionKey::new(phone.clone(), order_id.clone());
        let _guard = self.resolution_locks.lock(&key).await;

        if let Err(err) = self
            .notify(Some(order_id.clone()), &phone, TemplateKey::NdrResolutionOptions)
            .await
        {
            warn!(
                order_id = %order_id,
                phone = %mask_phone(&phone),
                error = %err,
                "Failed to send NDR resolution options"
            );
            return Err(err);
        }

        let entry = self.resolutions.write().await.open(
            &phone,
            order_id,
            TemplateKey::NdrResolutionOptions,
            ttl,
            now,
        )?;

        info!(
            order_id = %order_id,
            phone = %entry.masked_phone(),
            expires_at = %entry.expires_at,
            "Resolution window opened"
        );
        self.publish(EngineEvent::ResolutionOpened {
            order_id: order_id.clone(),
            expires_at: entry.expires_at,
        })
        .await;

        Ok(entry)
    }

    /// Record the customer's chosen action
    pub async fn resolve(
        &self,
        phone: &str,
        order_id: &OrderId,
        action: CustomerAction,
    ) -> EngineResult<PendingResolution> {
        let key = ResolutionKey::new(phone.trim(), order_id.clone());
        let _guard = self.resolution_locks.lock(&key).await;
        self.resolve_locked(&key, action).await
    }

    /// Route an inbound free-text reply
    pub async fn handle_customer_reply(&self, phone: &str, text: &str) -> EngineResult<ReplyOutcome> {
        let phone = phone.trim();
        let pending = self
            .resolutions
            .read()
            .await
            .pending_for_phone(phone, self.clock.now())
            .cloned();

        let Some(pending) = pending else {
            debug!(phone = %mask_phone(phone), "Reply without a live resolution window");
            self.notify(None, phone, TemplateKey::GeneralGreeting).await?;
            return Ok(ReplyOutcome::NoPendingWindow);
        };

        match parse_reply(text) {
            ReplyIntent::Action(action) => {
                let key = pending.key();
                let _guard = self.resolution_locks.lock(&key).await;
                let resolution = self.resolve_locked(&key, action).await?;
                Ok(ReplyOutcome::Resolved { resolution })
            }
            ReplyIntent::Help => {
                self.notify(Some(pending.order_id.clone()), phone, TemplateKey::Help)
                    .await?;
                Ok(ReplyOutcome::HelpSent {
                    order_id: pending.order_id,
                })
            }
            ReplyIntent::Unrecognised => {
                self.notify(Some(pending.order_id.clone()), phone, TemplateKey::Clarification)
                    .await?;
                Ok(ReplyOutcome::ClarificationSent {
                    order_id: pending.order_id,
                })
            }
        }
    }

    /// Escalate every window that expired unanswered by `now`
    ///
    /// Returns the entries escalated by this sweep, earliest expiry first.
    /// Entries reported by an earlier sweep are not returned again.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> EngineResult<Vec<PendingResolution>> {
        let escalated = {
            let mut tracker = self.resolutions.write().await;
            let expired: Vec<PendingResolution> = tracker
                .list_expired(now)
                .into_iter()
                .filter(|e| matches!(e.status, ResolutionStatus::Pending))
                .collect();

            let mut escalated = Vec::with_capacity(expired.len());
            for entry in expired {
                escalated.push(tracker.mark_escalated(&entry.key(), now)?);
            }
            escalated
        };

        if !escalated.is_empty() {
            warn!(
                count = escalated.len(),
                "Resolution windows expired without customer response"
            );
        }
        for entry in &escalated {
            self.publish(EngineEvent::ResolutionEscalated {
                order_id: entry.order_id.clone(),
                expired_at: entry.expires_at,
            })
            .await;
        }

        Ok(escalated)
    }

    // ============================================================
    // Queries
    // ============================================================

    /// Current NDR records, oldest attempt first
    pub async fn records(&self, filter: &QueryFilter) -> Vec<NdrRecord> {
        let ledger = self.ledger.read().await;
        let mut records: Vec<NdrRecord> = ledger
            .current_records()
            .filter(|r| filter.matches_seller(&r.seller_id) && filter.in_window(&r.attempted_at))
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.attempted_at
                .cmp(&b.attempted_at)
                .then_with(|| a.ndr_id.cmp(&b.ndr_id))
        });
        records
    }

    /// Every record version of an order, in append order
    pub async fn record_history(&self, order_id: &OrderId) -> EngineResult<Vec<NdrRecord>> {
        if !self.orders.read().await.contains_key(order_id) {
            return Err(EngineError::not_found("Order", order_id.as_str()));
        }
        let ledger = self.ledger.read().await;
        Ok(ledger.history_of(order_id).into_iter().cloned().collect())
    }

    pub async fn challenge(&self, challenge_id: &ChallengeId) -> EngineResult<Challenge> {
        self.challenges
            .read()
            .await
            .get(challenge_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("Challenge", challenge_id.as_str()))
    }

    /// Challenges, oldest first
    pub async fn challenges(&self, filter: &QueryFilter) -> Vec<Challenge> {
        self.challenges
            .read()
            .await
            .list()
            .into_iter()
            .filter(|c| filter.matches_seller(&c.seller_id) && filter.in_window(&c.created_at))
            .cloned()
            .collect()
    }

    /// Resolution windows, earliest expiry first
    pub async fn resolutions(
        &self,
        status: Option<ResolutionStatusFilter>,
    ) -> Vec<PendingResolution> {
        self.resolutions
            .read()
            .await
            .list()
            .into_iter()
            .filter(|e| status.map_or(true, |s| s.matches(&e.status)))
            .cloned()
            .collect()
    }

    /// Carrier scorecard over the filtered orders and records
    pub async fn scorecard(&self, filter: &QueryFilter) -> Vec<CarrierPeriodStat> {
        let orders = self.orders.read().await;
        let ledger = self.ledger.read().await;

        let selected: Vec<(&OrderInfo, Vec<DeliveryAttempt>)> = orders
            .values()
            .filter(|e| filter.matches_seller(&e.info.seller_id))
            .map(|e| {
                let attempts = e
                    .attempts
                    .iter()
                    .filter(|a| filter.in_window(&a.attempted_at))
                    .cloned()
                    .collect::<Vec<_>>();
                (&e.info, attempts)
            })
            .filter(|(info, attempts)| !attempts.is_empty() || filter.in_window(&info.created_at))
            .collect();
        let histories: Vec<OrderHistory<'_>> = selected
            .iter()
            .map(|(info, attempts)| OrderHistory::new(info, attempts))
            .collect();

        let records: Vec<NdrRecord> = ledger
            .records()
            .iter()
            .filter(|r| filter.matches_seller(&r.seller_id) && filter.in_window(&r.attempted_at))
            .cloned()
            .collect();

        self.scorecard.aggregate(&histories, &records)
    }

    /// Alerts for a seller over the period ending now
    pub async fn alerts(&self, seller_id: &SellerId, period: ReportingPeriod) -> Vec<Alert> {
        let window = period.window_ending(self.clock.now());
        let filter = QueryFilter::for_seller(seller_id.clone()).with_window(window);

        let (total_orders, rto_orders) = {
            let orders = self.orders.read().await;
            let in_period: Vec<&OrderEntry> = orders
                .values()
                .filter(|e| {
                    filter.matches_seller(&e.info.seller_id) && filter.in_window(&e.info.created_at)
                })
                .collect();
            let rto = in_period.iter().filter(|e| e.has_rto()).count();
            (in_period.len() as u64, rto as u64)
        };

        let records = self.record_versions(&filter).await;
        self.alerts.generate(&AlertInput {
            seller_id,
            period_label: period.name(),
            records: &records,
            total_orders,
            rto_orders,
        })
    }

    /// Seller KPI roll-up over the period ending now
    pub async fn seller_dashboard(
        &self,
        seller_id: &SellerId,
        period: ReportingPeriod,
    ) -> SellerDashboard {
        let window = period.window_ending(self.clock.now());
        let filter = QueryFilter::for_seller(seller_id.clone()).with_window(window);

        let records = self.record_versions(&filter).await;
        let disputes: Vec<Challenge> = self
            .challenges
            .read()
            .await
            .list()
            .into_iter()
            .filter(|c| c.is_customer_dispute() && filter.matches_seller(&c.seller_id))
            .cloned()
            .collect();
        let orders = self.orders.read().await;
        let mut entries: Vec<&OrderEntry> = orders
            .values()
            .filter(|e| {
                filter.matches_seller(&e.info.seller_id) && filter.in_window(&e.info.created_at)
            })
            .collect();
        entries.sort_by(|a, b| a.info.order_id.cmp(&b.info.order_id));
        let histories: Vec<OrderHistory<'_>> = entries
            .iter()
            .map(|e| OrderHistory::new(&e.info, &e.attempts))
            .collect();

        self.scorecard
            .seller_dashboard(seller_id, period, &histories, &records, &disputes)
    }

    /// Get engine statistics
    pub async fn stats(&self) -> EngineStats {
        let orders = self.orders.read().await;
        let ledger = self.ledger.read().await;
        let challenges = self.challenges.read().await;
        let resolutions = self.resolutions.read().await;

        EngineStats {
            orders: orders.len(),
            attempts: orders.values().map(|e| e.attempts.len()).sum(),
            ndr_records: ledger.len(),
            current_records: ledger.current_records().count(),
            open_challenges: challenges.open_challenge_count(),
            pending_resolutions: resolutions.pending_count(),
        }
    }

    /// Expired windows no sweep has escalated yet
    pub async fn overdue_resolution_count(&self) -> usize {
        self.resolutions
            .read()
            .await
            .list_expired(self.clock.now())
            .iter()
            .filter(|e| matches!(e.status, ResolutionStatus::Pending))
            .count()
    }

    // ============================================================
    // Internals
    // ============================================================

    async fn resolve_locked(
        &self,
        key: &ResolutionKey,
        action: CustomerAction,
    ) -> EngineResult<PendingResolution> {
        let entry = self.resolutions.write().await.resolve(
            &key.phone,
            &key.order_id,
            action,
            self.clock.now(),
        )?;

        info!(
            order_id = %key.order_id,
            phone = %entry.masked_phone(),
            action = %action,
            "Customer resolved NDR"
        );

        if action == CustomerAction::Dispute {
            self.raise_customer_dispute(&key.order_id).await;
        }

        // The choice is recorded even if the follow-up cannot be delivered
        if let Err(err) = self
            .notify(
                Some(key.order_id.clone()),
                &key.phone,
                action.follow_up_template(),
            )
            .await
        {
            warn!(order_id = %key.order_id, error = %err, "Failed to send follow-up message");
        }
        self.publish(EngineEvent::ResolutionResolved {
            order_id: key.order_id.clone(),
            action,
        })
        .await;

        Ok(entry)
    }

    /// Open a challenge against the order's current record for a customer
    /// dispute. Failures are logged; the customer's choice stands regardless.
    async fn raise_customer_dispute(&self, order_id: &OrderId) {
        match self
            .submit_challenge(
                order_id,
                CUSTOMER_DISPUTE_REASON,
                BTreeSet::new(),
                Some("Customer disputed the NDR from the resolution window".to_string()),
            )
            .await
        {
            Ok(challenge) => info!(
                order_id = %order_id,
                challenge_id = %challenge.challenge_id,
                "Customer dispute opened a challenge"
            ),
            Err(err) => warn!(
                order_id = %order_id,
                error = %err,
                "Customer dispute not raised as a challenge"
            ),
        }
    }

    /// Every record version in the filter, in append order
    async fn record_versions(&self, filter: &QueryFilter) -> Vec<NdrRecord> {
        self.ledger
            .read()
            .await
            .records()
            .iter()
            .filter(|r| filter.matches_seller(&r.seller_id) && filter.in_window(&r.attempted_at))
            .cloned()
            .collect()
    }

    async fn current_ndr_id(&self, order_id: &OrderId) -> EngineResult<NdrRecordId> {
        self.ledger
            .read()
            .await
            .latest_current(order_id)
            .map(|r| r.ndr_id.clone())
            .ok_or_else(|| EngineError::not_found("NdrRecord", order_id.as_str()))
    }

    async fn challenge_ndr_id(&self, challenge_id: &ChallengeId) -> EngineResult<NdrRecordId> {
        self.challenges
            .read()
            .await
            .get(challenge_id)
            .map(|c| c.ndr_id.clone())
            .ok_or_else(|| EngineError::not_found("Challenge", challenge_id.as_str()))
    }

    async fn notify(
        &self,
        order_id: Option<OrderId>,
        phone: &str,
        template: TemplateKey,
    ) -> EngineResult<String> {
        self.gateway
            .send(NotificationRequest::new(order_id, phone, template))
            .await
    }

    async fn publish_challenge(&self, challenge: &Challenge) {
        self.publish(EngineEvent::ChallengeUpdated {
            challenge_id: challenge.challenge_id.clone(),
            ndr_id: challenge.ndr_id.clone(),
            status: challenge.status,
        })
        .await;
    }

    async fn publish(&self, event: EngineEvent) {
        let name = event.name();
        if let Err(err) = self.sink.publish(event).await {
            warn!(event = name, error = %err, "Failed to publish engine event");
        }
    }
}
