//! NDR Error Codes Registry
//!
//! Error code format: NDR-{module}-{sequence}
//! - NDR-PROOF: Proof bundle and attempt errors
//! - NDR-COST: Cost exposure errors
//! - NDR-CHAL: Challenge workflow errors
//! - NDR-RES: Resolution channel errors
//! - NDR-LEDGER: Verdict ledger errors
//! - NDR-POLICY: Policy configuration errors

use thiserror::Error;

/// NDR Result type
pub type NdrResult<T> = Result<T, NdrError>;

/// NDR Error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NdrError {
    // ============================================================
    // Proof Errors (NDR-PROOF-*)
    // ============================================================
    /// [NDR-PROOF-001] Malformed or missing proof input
    #[error("[NDR-PROOF-001] Proof validation error: {reason}")]
    ValidationError { reason: String },

    /// [NDR-PROOF-002] Attempt is not a non-delivery report
    #[error("[NDR-PROOF-002] Attempt {sequence} on order {order_id} is not an NDR ({event_code})")]
    NotAnNdrAttempt {
        order_id: String,
        sequence: u32,
        event_code: String,
    },

    /// [NDR-PROOF-003] Proof submitted after classification
    #[error("[NDR-PROOF-003] Attempt {sequence} on order {order_id} is already classified")]
    ProofAlreadyClassified { order_id: String, sequence: u32 },

    // ============================================================
    // Cost Errors (NDR-COST-*)
    // ============================================================
    /// [NDR-COST-001] Order value negative or missing
    #[error("[NDR-COST-001] Invalid order value for order {order_id}: {reason}")]
    InvalidOrderValue { order_id: String, reason: String },

    // ============================================================
    // Challenge Errors (NDR-CHAL-*)
    // ============================================================
    /// [NDR-CHAL-001] A non-terminal challenge already exists
    #[error("[NDR-CHAL-001] Challenge {challenge_id} is still pending for NDR {ndr_id}")]
    ChallengeAlreadyPending { ndr_id: String, challenge_id: String },

    /// [NDR-CHAL-002] Challenge submitted without a reason
    #[error("[NDR-CHAL-002] Challenge reason is required")]
    MissingReason,

    /// [NDR-CHAL-003] Genuine verdicts cannot be challenged
    #[error("[NDR-CHAL-003] NDR {ndr_id} is verified genuine and cannot be challenged")]
    GenuineNotChallengeable { ndr_id: String },

    /// [NDR-CHAL-004] Illegal challenge state transition
    #[error("[NDR-CHAL-004] Invalid challenge transition: {from} -> {to}")]
    InvalidChallengeTransition { from: String, to: String },

    // ============================================================
    // Resolution Errors (NDR-RES-*)
    // ============================================================
    /// [NDR-RES-001] Resolution window expired
    #[error("[NDR-RES-001] Resolution window for order {order_id} expired at {expired_at}")]
    Expired { order_id: String, expired_at: String },

    /// [NDR-RES-002] Resolution window already resolved
    #[error("[NDR-RES-002] Resolution window for order {order_id} already resolved")]
    AlreadyResolved { order_id: String },

    /// [NDR-RES-003] Non-positive or out-of-range time-to-live
    #[error("[NDR-RES-003] Resolution ttl must be positive and in range, got {ttl_secs}s")]
    InvalidTtl { ttl_secs: i64 },

    // ============================================================
    // Ledger Errors (NDR-LEDGER-*)
    // ============================================================
    /// [NDR-LEDGER-001] Append would break the supersede chain
    #[error("[NDR-LEDGER-001] Ledger conflict: {reason}")]
    LedgerConflict { reason: String },

    // ============================================================
    // Policy Errors (NDR-POLICY-*)
    // ============================================================
    /// [NDR-POLICY-001] Policy values out of range
    #[error("[NDR-POLICY-001] Invalid policy: {reason}")]
    InvalidPolicy { reason: String },

    // ============================================================
    // General Errors
    // ============================================================
    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl NdrError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        NdrError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a validation error
    pub fn validation(reason: impl Into<String>) -> Self {
        NdrError::ValidationError {
            reason: reason.into(),
        }
    }

    /// Create a policy error
    pub fn invalid_policy(reason: impl Into<String>) -> Self {
        NdrError::InvalidPolicy {
            reason: reason.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            NdrError::ValidationError { .. } => "NDR-PROOF-001",
            NdrError::NotAnNdrAttempt { .. } => "NDR-PROOF-002",
            NdrError::ProofAlreadyClassified { .. } => "NDR-PROOF-003",
            NdrError::InvalidOrderValue { .. } => "NDR-COST-001",
            NdrError::ChallengeAlreadyPending { .. } => "NDR-CHAL-001",
            NdrError::MissingReason => "NDR-CHAL-002",
            NdrError::GenuineNotChallengeable { .. } => "NDR-CHAL-003",
            NdrError::InvalidChallengeTransition { .. } => "NDR-CHAL-004",
            NdrError::Expired { .. } => "NDR-RES-001",
            NdrError::AlreadyResolved { .. } => "NDR-RES-002",
            NdrError::InvalidTtl { .. } => "NDR-RES-003",
            NdrError::LedgerConflict { .. } => "NDR-LEDGER-001",
            NdrError::InvalidPolicy { .. } => "NDR-POLICY-001",
            NdrError::NotFound { .. } => "NDR-NOT-FOUND",
            NdrError::SerializationError(_) => "NDR-SERDE",
        }
    }
}

impl From<serde_json::Error> for NdrError {
    fn from(err: serde_json::Error) -> Self {
        NdrError::SerializationError(err.to_string())
    }
}
