//! NDR Core Type Definitions
//!
//! All types follow these naming conventions:
//! - snake_case for field names
//! - *_id suffix for primary keys
//! - *_at suffix for timestamps

pub mod alert;
pub mod attempt;
pub mod challenge;
pub mod common;
pub mod ndr;
pub mod proof;
pub mod resolution;
pub mod scorecard;

// Re-export common types
pub use common::{
    // ID types
    ChallengeId, NdrRecordId, OrderId, SellerId,
    // Geography
    GeoPoint,
    // Reporting
    ReportingPeriod, ReportingWindow,
    // Helpers
    iso_week_label, mask_phone,
};

pub use alert::{Alert, AlertSeverity, AlertType};
pub use attempt::{DeliveryAttempt, EventCode, NdrReasonCode, OrderInfo, PaymentMode};
pub use challenge::{
    Adjudication, AdjudicationDecision, Challenge, ChallengeOutcome, ChallengeStatus,
    EvidenceItem, EvidenceType, CUSTOMER_DISPUTE_REASON,
};
pub use ndr::{CostImpact, NdrRecord, RecordOrigin, Verdict, VerdictKind};
pub use proof::{CallLog, CallOutcome, ProofBundle, ProofValidation};
pub use resolution::{
    CustomerAction, NotificationRequest, PendingResolution, ResolutionKey, ResolutionStatus,
    TemplateKey,
};
pub use scorecard::{CarrierBreakdown, CarrierPeriodStat, ScorecardBucket, SellerDashboard};
