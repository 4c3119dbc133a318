//! Alert Types

use super::common::*;
use serde::{Deserialize, Serialize};

/// Alert type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    HighRtoRate,
    SuspiciousNdrPattern,
    CostSavings,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::HighRtoRate => "HIGH_RTO_RATE",
            AlertType::SuspiciousNdrPattern => "SUSPICIOUS_NDR_PATTERN",
            AlertType::CostSavings => "COST_SAVINGS",
        }
    }

    /// Fixed remediation suggestions
    pub fn suggestions(&self) -> Vec<String> {
        let items: &[&str] = match self {
            AlertType::HighRtoRate => &[
                "Review delivery addresses for accuracy",
                "Check carrier performance",
                "Consider alternative delivery options",
            ],
            AlertType::SuspiciousNdrPattern => &[
                "Review NDR events for proof validation failures",
                "Consider challenging invalid NDRs",
                "Escalate to carrier management",
            ],
            AlertType::CostSavings => &[],
        };
        items.iter().map(|s| s.to_string()).collect()
    }
}

/// Alert severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    High,
    Medium,
    Info,
}

/// Seller-facing alert
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub seller_id: SellerId,
    pub title: String,
    pub message: String,
    pub action_required: bool,
    pub suggestions: Vec<String>,
    /// Destination bucket when alerts are grouped geographically
    pub destination: Option<String>,
}
