//! NDR Basic Types
//!
//! Naming conventions:
//! - `_id` suffix: Primary key identifiers
//! - `_ref` suffix: References or foreign keys

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

// ============================================================
// ID Types (newtype pattern, non-interchangeable)
// ============================================================

/// Order ID
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Seller (brand) ID
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SellerId(pub String);

impl SellerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SellerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// NDR record ID
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NdrRecordId(pub String);

impl NdrRecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Deterministic ID for a record version of an attempt
    pub fn for_attempt(order_id: &OrderId, sequence: u32, version: u32) -> Self {
        Self(format!("ndr:{}:{}:v{}", order_id.as_str(), sequence, version))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NdrRecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Challenge ID
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChallengeId(pub String);

impl ChallengeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================
// Geography
// ============================================================

/// WGS84 coordinate pair in decimal degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Coordinates are finite and inside the WGS84 ranges
    pub fn is_well_formed(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

// ============================================================
// Reporting windows
// ============================================================

/// Reporting period selector used by dashboards and alerts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportingPeriod {
    Day,
    #[default]
    Week,
    Month,
}

impl ReportingPeriod {
    /// Look-back length of the period
    pub fn length(&self) -> Duration {
        match self {
            ReportingPeriod::Day => Duration::days(1),
            ReportingPeriod::Week => Duration::days(7),
            ReportingPeriod::Month => Duration::days(30),
        }
    }

    /// Window ending at `now`
    pub fn window_ending(&self, now: DateTime<Utc>) -> ReportingWindow {
        ReportingWindow {
            start: now - self.length(),
            end: now,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportingPeriod::Day => "day",
            ReportingPeriod::Week => "week",
            ReportingPeriod::Month => "month",
        }
    }
}

impl std::str::FromStr for ReportingPeriod {
    type Err = crate::error::NdrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" => Ok(ReportingPeriod::Day),
            "week" => Ok(ReportingPeriod::Week),
            "month" => Ok(ReportingPeriod::Month),
            other => Err(crate::error::NdrError::validation(format!(
                "unknown reporting period: {}",
                other
            ))),
        }
    }
}

/// Closed time window `[start, end]`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportingWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        *ts >= self.start && *ts <= self.end
    }
}

/// ISO-8601 week label, e.g. `2024-W01`
pub fn iso_week_label(ts: &DateTime<Utc>) -> String {
    let week = ts.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Mask a phone number for logs and external views
pub fn mask_phone(phone: &str) -> String {
    let visible: String = phone.chars().take(8).collect();
    format!("{}XXX", visible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_geo_point_well_formed() {
        assert!(GeoPoint::new(12.9716, 77.5946).is_well_formed());
        assert!(!GeoPoint::new(91.0, 77.0).is_well_formed());
        assert!(!GeoPoint::new(f64::NAN, 77.0).is_well_formed());
    }

    #[test]
    fn test_iso_week_label() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap();
        assert_eq!(iso_week_label(&ts), "2024-W01");
    }

    #[test]
    fn test_reporting_window() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let window = ReportingPeriod::Week.window_ending(now);
        assert!(window.contains(&(now - Duration::days(3))));
        assert!(window.contains(&now));
        assert!(!window.contains(&(now - Duration::days(8))));
    }

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("+919876543210"), "+9198765XXX");
    }
}
