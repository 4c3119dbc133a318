//! Data Transfer Objects
//!
//! Request and response bodies for the NDR API. Domain types that already
//! serialize cleanly (records, challenges, alerts) are returned as-is.

use chrono::{DateTime, Duration, Utc};
use ndr_core::{
    CallLog, CustomerAction, DeliveryAttempt, EventCode, EvidenceType, GeoPoint, NdrReasonCode,
    OrderId, OrderInfo, PaymentMode, ProofBundle, ReportingPeriod, ReportingWindow, SellerId,
};
use ndr_engine::{EngineStats, QueryFilter, ResolutionStatusFilter};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{ApiError, ApiResult};

// ============================================
// Order intake DTOs
// ============================================

/// Request to register an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterOrderRequest {
    pub order_id: String,
    pub seller_id: String,
    pub carrier: String,
    /// Destination pincode
    pub destination: String,
    pub customer_phone: String,
    #[serde(default)]
    pub order_value: Option<Decimal>,
    #[serde(default)]
    pub delivery_cost: Option<Decimal>,
    #[serde(default)]
    pub payment_mode: PaymentMode,
    #[serde(default)]
    pub registered_coordinates: Option<GeoPoint>,
    /// Defaults to the time of the request
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl RegisterOrderRequest {
    pub fn into_order(self, now: DateTime<Utc>) -> OrderInfo {
        OrderInfo {
            order_id: OrderId::new(self.order_id),
            seller_id: SellerId::new(self.seller_id),
            carrier: self.carrier,
            destination: self.destination,
            customer_phone: self.customer_phone,
            order_value: self.order_value,
            delivery_cost: self.delivery_cost,
            payment_mode: self.payment_mode,
            registered_coordinates: self.registered_coordinates,
            created_at: self.created_at.unwrap_or(now),
        }
    }
}

/// Courier event for an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordAttemptRequest {
    pub event_code: EventCode,
    #[serde(default)]
    pub ndr_reason: Option<NdrReasonCode>,
    #[serde(default)]
    pub attempted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RecordAttemptRequest {
    pub fn into_attempt(self, now: DateTime<Utc>) -> DeliveryAttempt {
        let mut attempt = DeliveryAttempt::new(self.attempted_at.unwrap_or(now), self.event_code);
        attempt.ndr_reason = self.ndr_reason;
        attempt.location = self.location;
        attempt.description = self.description;
        attempt
    }
}

/// Proof for the latest NDR attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitProofRequest {
    #[serde(default)]
    pub provided_location: Option<GeoPoint>,
    /// Defaults to the order's registered coordinates
    #[serde(default)]
    pub required_location: Option<GeoPoint>,
    #[serde(default)]
    pub call_log: Option<CallLog>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl SubmitProofRequest {
    pub fn into_bundle(self, now: DateTime<Utc>) -> ProofBundle {
        ProofBundle {
            provided_location: self.provided_location,
            required_location: self.required_location,
            call_log: self.call_log,
            submitted_at: self.submitted_at.unwrap_or(now),
        }
    }
}

// ============================================
// Challenge DTOs
// ============================================

/// Seller challenge against an order's current NDR record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitChallengeRequest {
    pub order_id: String,
    pub reason: String,
    #[serde(default)]
    pub requested_evidence: BTreeSet<EvidenceType>,
    #[serde(default)]
    pub comments: Option<String>,
}

/// Evidence item for a challenge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvideEvidenceRequest {
    pub evidence_type: EvidenceType,
    pub reference: String,
}

// ============================================
// Resolution DTOs
// ============================================

/// Open a customer resolution window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenResolutionRequest {
    pub order_id: String,
    /// Defaults to the order's customer phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Defaults to the policy ttl
    #[serde(default)]
    pub ttl_minutes: Option<i64>,
}

impl OpenResolutionRequest {
    pub fn ttl(&self) -> ApiResult<Option<Duration>> {
        self.ttl_minutes
            .map(|minutes| {
                Duration::try_minutes(minutes).ok_or_else(|| {
                    ApiError::validation(format!("ttl_minutes {} is out of range", minutes))
                })
            })
            .transpose()
    }
}

/// Explicit customer choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub phone: String,
    pub order_id: String,
    pub action: CustomerAction,
}

/// Sweep instant, defaults to now
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepRequest {
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

/// Inbound messaging webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerReplyWebhook {
    pub phone_number: String,
    pub message: String,
    #[serde(default)]
    pub message_id: Option<String>,
}

// ============================================
// Query DTOs
// ============================================

/// Seller and period filter for list endpoints
///
/// An explicit `from`/`to` range wins over `period`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub seller_id: Option<String>,
    #[serde(default)]
    pub period: Option<ReportingPeriod>,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

impl ListQuery {
    pub fn into_filter(self, now: DateTime<Utc>) -> ApiResult<QueryFilter> {
        let mut filter = match self.seller_id {
            Some(seller) if !seller.trim().is_empty() => QueryFilter::for_seller(SellerId::new(seller)),
            _ => QueryFilter::all(),
        };

        let window = match (self.from, self.to, self.period) {
            (None, None, None) => None,
            (None, None, Some(period)) => Some(period.window_ending(now)),
            (from, to, _) => {
                let end = to.unwrap_or(now);
                let start = from.unwrap_or(DateTime::<Utc>::MIN_UTC);
                if start > end {
                    return Err(ApiError::validation("from must not be after to"));
                }
                Some(ReportingWindow::new(start, end))
            }
        };
        if let Some(window) = window {
            filter = filter.with_window(window);
        }
        Ok(filter)
    }
}

/// Status filter for resolution listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionQuery {
    #[serde(default)]
    pub status: Option<ResolutionStatusFilter>,
}

/// Reporting period for seller views
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodQuery {
    #[serde(default)]
    pub period: ReportingPeriod,
}

// ============================================
// Response DTOs
// ============================================

/// List response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

/// Health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub components: Vec<ComponentHealth>,
}

/// Component health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Engine statistics with service counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub engine: EngineStats,
    pub requests: u64,
    pub uptime_secs: u64,
}

/// Sweep result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResponse {
    pub swept_at: DateTime<Utc>,
    pub escalated: Vec<ndr_core::PendingResolution>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_register_order_defaults() {
        let request: RegisterOrderRequest = serde_json::from_value(serde_json::json!({
            "order_id": "ORD-1",
            "seller_id": "SELLER-1",
            "carrier": "Delhivery",
            "destination": "560001",
            "customer_phone": "+919876543210",
            "order_value": "1499"
        }))
        .unwrap();

        let order = request.into_order(now());
        assert_eq!(order.created_at, now());
        assert_eq!(order.payment_mode, PaymentMode::Cod);
        assert_eq!(order.order_value, Some(Decimal::new(1499, 0)));
    }

    #[test]
    fn test_list_query_period_window() {
        let query = ListQuery {
            seller_id: Some("SELLER-1".to_string()),
            period: Some(ReportingPeriod::Day),
            ..Default::default()
        };
        let filter = query.into_filter(now()).unwrap();
        assert!(filter.matches_seller(&SellerId::new("SELLER-1")));
        assert!(!filter.matches_seller(&SellerId::new("SELLER-2")));
        assert!(filter.in_window(&(now() - Duration::hours(3))));
        assert!(!filter.in_window(&(now() - Duration::days(2))));
    }

    #[test]
    fn test_list_query_rejects_inverted_range() {
        let query = ListQuery {
            from: Some(now()),
            to: Some(now() - Duration::days(1)),
            ..Default::default()
        };
        assert!(query.into_filter(now()).is_err());
    }

    #[test]
    fn test_list_response_counts_items() {
        let response = ListResponse::new(vec!["a", "b"]);
        assert_eq!(response.total, 2);
    }
}
