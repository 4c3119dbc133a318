//! Scorecard and Dashboard Types

use super::common::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregation bucket key
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScorecardBucket {
    pub carrier: String,
    pub destination: String,
    /// ISO week label, e.g. `2024-W01`
    pub period: String,
}

/// Carrier performance over one bucket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierPeriodStat {
    #[serde(flatten)]
    pub bucket: ScorecardBucket,
    pub total_orders: u64,
    pub total_attempts: u64,
    pub successful_deliveries: u64,
    pub total_ndrs: u64,
    pub verified_ndrs: u64,
    pub suspicious_ndrs: u64,
    pub unverified_ndrs: u64,
    pub rto_prevented: u64,
    /// Percent, 2 dp
    pub success_rate: Decimal,
    /// Percent, 2 dp
    pub false_attempt_rate: Decimal,
}

/// Per-carrier row of a seller dashboard
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierBreakdown {
    pub carrier: String,
    pub total_orders: u64,
    pub success_rate: Decimal,
    pub verified_ndrs: u64,
    pub suspicious_ndrs: u64,
    pub rto_prevented: u64,
}

/// Seller KPI roll-up over a reporting period
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerDashboard {
    pub seller_id: SellerId,
    pub period: ReportingPeriod,
    pub total_orders: u64,
    pub successful_deliveries: u64,
    pub success_rate: Decimal,
    pub verified_ndrs: u64,
    pub suspicious_ndrs: u64,
    pub rto_prevented: u64,
    /// Disputes raised by customers from their resolution window
    pub customer_disputes: u64,
    pub cost_saved: Decimal,
    pub carrier_breakdown: Vec<CarrierBreakdown>,
}
