//! NDR Core - Non-Delivery Report Verification & RTO Prevention
//!
//! Pure, synchronous domain logic for deciding whether a failed delivery
//! attempt was genuine, and for everything that follows from that verdict:
//! - **Verification**: Proof bundles (GPS fix, call telemetry) checked against policy
//! - **Classification**: `GENUINE` / `SUSPICIOUS` / `UNVERIFIED` verdicts
//! - **Exposure**: Delivery and RTO cost at risk per NDR
//! - **Disputes**: Seller challenges with explicit adjudication
//! - **Customer resolution**: Time-boxed windows with a computed expiry
//! - **Reporting**: Carrier scorecards, seller dashboards and alerts
//!
//! # Invariants
//!
//! | Invariant | Requirement |
//! |-----------|-------------|
//! | **Verdict consistency** | Violations are empty iff the verdict is `GENUINE` |
//! | **Append-only** | NDR records are never edited; overturns append a superseding record |
//! | **One live challenge** | At most one non-terminal challenge per NDR record |
//! | **Positive TTL** | A resolution window always expires after it was opened |
//!
//! Nothing in this crate reads a clock or performs I/O. Every operation that
//! depends on time takes `now` from the caller.

pub mod error;
pub mod types;
pub mod policy;
pub mod validator;
pub mod classifier;
pub mod cost;
pub mod challenge;
pub mod resolution;
pub mod alerts;
pub mod scorecard;
pub mod ledger;

// Re-export error types
pub use error::{NdrError, NdrResult};

// Re-export all types
pub use types::*;

// Re-export policy
pub use policy::{
    AlertPolicy, ChallengePolicy, CostPolicy, EnginePolicy, ProofPolicy, ResolutionPolicy,
    RtoCostPolicy,
};

// Re-export components
pub use alerts::{rto_savings, AlertGenerator, AlertInput};
pub use challenge::ChallengeManager;
pub use classifier::{Classification, NdrClassifier};
pub use cost::CostEstimator;
pub use ledger::NdrLedger;
pub use resolution::{is_expired, parse_reply, window_expiry, ReplyIntent, ResolutionTracker};
pub use scorecard::{OrderHistory, ScorecardAggregator};
pub use validator::ProofValidator;

/// NDR core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
