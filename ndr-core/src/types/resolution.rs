//! Customer Resolution Types

use super::common::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message template identifiers understood by the messaging gateway
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKey {
    /// Initial options message sent when the window opens
    NdrResolutionOptions,
    RescheduleSlots,
    AddressUpdateRequest,
    SelfPickupDetails,
    ReturnConfirmation,
    /// The customer's dispute was passed to the challenge workflow
    DisputeAcknowledged,
    Help,
    /// Reply could not be parsed
    Clarification,
    /// Message from a phone with no live window
    GeneralGreeting,
}

impl TemplateKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKey::NdrResolutionOptions => "ndr_resolution_options",
            TemplateKey::RescheduleSlots => "reschedule_slots",
            TemplateKey::AddressUpdateRequest => "address_update_request",
            TemplateKey::SelfPickupDetails => "self_pickup_details",
            TemplateKey::ReturnConfirmation => "return_confirmation",
            TemplateKey::DisputeAcknowledged => "dispute_acknowledged",
            TemplateKey::Help => "help",
            TemplateKey::Clarification => "clarification",
            TemplateKey::GeneralGreeting => "general_greeting",
        }
    }
}

impl std::fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Action chosen by the customer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerAction {
    Reschedule,
    ChangeAddress,
    SelfPickup,
    ReturnToOrigin,
    /// The customer says the attempt never happened
    Dispute,
}

impl CustomerAction {
    /// Follow-up template sent once the action is accepted
    pub fn follow_up_template(&self) -> TemplateKey {
        match self {
            CustomerAction::Reschedule => TemplateKey::RescheduleSlots,
            CustomerAction::ChangeAddress => TemplateKey::AddressUpdateRequest,
            CustomerAction::SelfPickup => TemplateKey::SelfPickupDetails,
            CustomerAction::ReturnToOrigin => TemplateKey::ReturnConfirmation,
            CustomerAction::Dispute => TemplateKey::DisputeAcknowledged,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerAction::Reschedule => "RESCHEDULE",
            CustomerAction::ChangeAddress => "CHANGE_ADDRESS",
            CustomerAction::SelfPickup => "SELF_PICKUP",
            CustomerAction::ReturnToOrigin => "RETURN_TO_ORIGIN",
            CustomerAction::Dispute => "DISPUTE",
        }
    }
}

impl std::fmt::Display for CustomerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Key of a resolution window
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResolutionKey {
    pub phone: String,
    pub order_id: OrderId,
}

impl ResolutionKey {
    pub fn new(phone: impl Into<String>, order_id: OrderId) -> Self {
        Self {
            phone: phone.into(),
            order_id,
        }
    }
}

impl std::fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", mask_phone(&self.phone), self.order_id)
    }
}

/// Resolution window status
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStatus {
    Pending,
    Resolved {
        action: CustomerAction,
        resolved_at: DateTime<Utc>,
    },
    /// Reported by an expiry sweep
    Escalated { escalated_at: DateTime<Utc> },
}

impl ResolutionStatus {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionStatus::Resolved { .. })
    }
}

/// Customer-facing resolution window
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingResolution {
    pub phone: String,
    pub order_id: OrderId,
    pub template: TemplateKey,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(flatten)]
    pub status: ResolutionStatus,
}

impl PendingResolution {
    pub fn key(&self) -> ResolutionKey {
        ResolutionKey::new(self.phone.clone(), self.order_id.clone())
    }

    /// Masked view of the phone for logs and API responses
    pub fn masked_phone(&self) -> String {
        mask_phone(&self.phone)
    }
}

/// Outbound request to the messaging gateway
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub order_id: Option<OrderId>,
    pub phone: String,
    pub template: TemplateKey,
}

impl NotificationRequest {
    pub fn new(order_id: Option<OrderId>, phone: impl Into<String>, template: TemplateKey) -> Self {
        Self {
            order_id,
            phone: phone.into(),
            template,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_up_templates() {
        assert_eq!(
            CustomerAction::SelfPickup.follow_up_template(),
            TemplateKey::SelfPickupDetails
        );
        assert_eq!(
            CustomerAction::ReturnToOrigin.follow_up_template(),
            TemplateKey::ReturnConfirmation
        );
        assert_eq!(
            CustomerAction::Dispute.follow_up_template(),
            TemplateKey::DisputeAcknowledged
        );
    }

    #[test]
    fn test_dispute_serde() {
        let json = serde_json::to_string(&CustomerAction::Dispute).unwrap();
        assert_eq!(json, "\"DISPUTE\"");
        let back: CustomerAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CustomerAction::Dispute);
    }

    #[test]
    fn test_key_display_masks_phone() {
        let key = ResolutionKey::new("+919876543210", OrderId::new("ORD-7"));
        assert_eq!(key.to_string(), "+9198765XXX/ORD-7");
    }
}
