//! Orders and Delivery Attempts
//!
//! Attempts are append-only per order; the sequence is assigned on append.

use super::common::*;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order context the engine needs for cost and reporting
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderInfo {
    pub order_id: OrderId,
    pub seller_id: SellerId,
    pub carrier: String,
    /// Destination area bucket (pincode)
    pub destination: String,
    pub customer_phone: String,
    /// Missing when the upstream order feed omitted it
    #[serde(default)]
    pub order_value: Option<Decimal>,
    /// Falls back to the policy default when absent
    #[serde(default)]
    pub delivery_cost: Option<Decimal>,
    #[serde(default)]
    pub payment_mode: PaymentMode,
    /// Registered delivery address location
    #[serde(default)]
    pub registered_coordinates: Option<GeoPoint>,
    pub created_at: DateTime<Utc>,
}

/// Payment mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    #[default]
    Cod,
    Prepaid,
}

/// Courier event code
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventCode {
    Ndr,
    Delivered,
    OutForDelivery,
    InTransit,
    Rto,
    Other(String),
}

impl EventCode {
    pub fn as_str(&self) -> &str {
        match self {
            EventCode::Ndr => "NDR",
            EventCode::Delivered => "DELIVERED",
            EventCode::OutForDelivery => "OUT_FOR_DELIVERY",
            EventCode::InTransit => "IN_TRANSIT",
            EventCode::Rto => "RTO",
            EventCode::Other(code) => code,
        }
    }

    /// Counts towards the attempt total of a carrier scorecard
    pub fn is_delivery_attempt(&self) -> bool {
        matches!(self, EventCode::Ndr | EventCode::Delivered)
    }
}

impl From<String> for EventCode {
    fn from(s: String) -> Self {
        match s.to_uppercase().as_str() {
            "NDR" => EventCode::Ndr,
            "DELIVERED" => EventCode::Delivered,
            "OUT_FOR_DELIVERY" => EventCode::OutForDelivery,
            "IN_TRANSIT" => EventCode::InTransit,
            "RTO" | "RTO_INITIATED" => EventCode::Rto,
            _ => EventCode::Other(s),
        }
    }
}

impl From<EventCode> for String {
    fn from(code: EventCode) -> Self {
        code.as_str().to_string()
    }
}

impl std::fmt::Display for EventCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Courier-stated reason for a non-delivery
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NdrReasonCode {
    CustomerUnavailable,
    CustomerRefused,
    AddressIncorrect,
    PremisesClosed,
    CodNotReady,
    Other(String),
}

impl NdrReasonCode {
    pub fn as_str(&self) -> &str {
        match self {
            NdrReasonCode::CustomerUnavailable => "CUSTOMER_UNAVAILABLE",
            NdrReasonCode::CustomerRefused => "CUSTOMER_REFUSED",
            NdrReasonCode::AddressIncorrect => "ADDRESS_INCORRECT",
            NdrReasonCode::PremisesClosed => "PREMISES_CLOSED",
            NdrReasonCode::CodNotReady => "COD_NOT_READY",
            NdrReasonCode::Other(code) => code,
        }
    }
}

impl From<String> for NdrReasonCode {
    fn from(s: String) -> Self {
        match s.to_uppercase().as_str() {
            "CUSTOMER_UNAVAILABLE" => NdrReasonCode::CustomerUnavailable,
            "CUSTOMER_REFUSED" => NdrReasonCode::CustomerRefused,
            "ADDRESS_INCORRECT" => NdrReasonCode::AddressIncorrect,
            "PREMISES_CLOSED" => NdrReasonCode::PremisesClosed,
            "COD_NOT_READY" => NdrReasonCode::CodNotReady,
            _ => NdrReasonCode::Other(s),
        }
    }
}

impl From<NdrReasonCode> for String {
    fn from(code: NdrReasonCode) -> Self {
        code.as_str().to_string()
    }
}

impl std::fmt::Display for NdrReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One courier attempt on an order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    /// 1-based position in the order's history, 0 until appended
    #[serde(default)]
    pub sequence: u32,
    pub attempted_at: DateTime<Utc>,
    pub event_code: EventCode,
    #[serde(default)]
    pub ndr_reason: Option<NdrReasonCode>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl DeliveryAttempt {
    /// Create an attempt that has not been appended yet
    pub fn new(attempted_at: DateTime<Utc>, event_code: EventCode) -> Self {
        Self {
            sequence: 0,
            attempted_at,
            event_code,
            ndr_reason: None,
            location: None,
            description: None,
        }
    }

    /// NDR attempt with a stated reason
    pub fn ndr(attempted_at: DateTime<Utc>, reason: NdrReasonCode) -> Self {
        Self::new(attempted_at, EventCode::Ndr).with_reason(reason)
    }

    pub fn with_reason(mut self, reason: NdrReasonCode) -> Self {
        self.ndr_reason = Some(reason);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_ndr(&self) -> bool {
        self.event_code == EventCode::Ndr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_code_round_trip_through_strings() {
        let code: EventCode = serde_json::from_str("\"ndr\"").unwrap();
        assert_eq!(code, EventCode::Ndr);
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"NDR\"");

        let code: EventCode = serde_json::from_str("\"PICKED_UP\"").unwrap();
        assert_eq!(code, EventCode::Other("PICKED_UP".to_string()));
    }

    #[test]
    fn test_reason_code_parsing() {
        let reason = NdrReasonCode::from("customer_unavailable".to_string());
        assert_eq!(reason, NdrReasonCode::CustomerUnavailable);
        assert_eq!(reason.to_string(), "CUSTOMER_UNAVAILABLE");
    }

    #[test]
    fn test_delivery_attempt_classification_helpers() {
        let attempt = DeliveryAttempt::ndr(Utc::now(), NdrReasonCode::PremisesClosed);
        assert!(attempt.is_ndr());
        assert!(attempt.event_code.is_delivery_attempt());
        assert!(!EventCode::InTransit.is_delivery_attempt());
    }
}
