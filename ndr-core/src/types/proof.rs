//! Proof Bundles
//!
//! Evidence attached to an NDR attempt: courier GPS fix and call telemetry.

use super::common::*;
use crate::error::{NdrError, NdrResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the courier's call to the customer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallOutcome {
    Answered,
    NoResponse,
    Refused,
    Busy,
}

impl CallOutcome {
    pub fn all() -> [CallOutcome; 4] {
        [
            CallOutcome::Answered,
            CallOutcome::NoResponse,
            CallOutcome::Refused,
            CallOutcome::Busy,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Answered => "ANSWERED",
            CallOutcome::NoResponse => "NO_RESPONSE",
            CallOutcome::Refused => "REFUSED",
            CallOutcome::Busy => "BUSY",
        }
    }
}

impl std::fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Call-log record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLog {
    pub duration_secs: u32,
    pub outcome: CallOutcome,
}

impl CallLog {
    pub fn new(duration_secs: u32, outcome: CallOutcome) -> Self {
        Self {
            duration_secs,
            outcome,
        }
    }
}

/// Evidence for one attempt
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProofBundle {
    /// Courier GPS fix at attempt time
    #[serde(default)]
    pub provided_location: Option<GeoPoint>,
    /// Registered delivery address location
    #[serde(default)]
    pub required_location: Option<GeoPoint>,
    #[serde(default)]
    pub call_log: Option<CallLog>,
    pub submitted_at: DateTime<Utc>,
}

impl ProofBundle {
    /// Empty bundle (carrier sent no telemetry)
    pub fn empty(submitted_at: DateTime<Utc>) -> Self {
        Self {
            provided_location: None,
            required_location: None,
            call_log: None,
            submitted_at,
        }
    }

    pub fn with_gps(mut self, provided: GeoPoint, required: GeoPoint) -> Self {
        self.provided_location = Some(provided);
        self.required_location = Some(required);
        self
    }

    pub fn with_provided_location(mut self, provided: GeoPoint) -> Self {
        self.provided_location = Some(provided);
        self
    }

    pub fn with_required_location(mut self, required: GeoPoint) -> Self {
        self.required_location = Some(required);
        self
    }

    pub fn with_call(mut self, duration_secs: u32, outcome: CallOutcome) -> Self {
        self.call_log = Some(CallLog::new(duration_secs, outcome));
        self
    }

    /// No courier-side evidence at all
    pub fn is_absent(&self) -> bool {
        self.provided_location.is_none() && self.call_log.is_none()
    }

    pub fn has_gps(&self) -> bool {
        self.provided_location.is_some()
    }

    pub fn has_call_log(&self) -> bool {
        self.call_log.is_some()
    }

    /// Reject coordinates that cannot be measured
    pub fn check_well_formed(&self) -> NdrResult<()> {
        if let Some(p) = &self.provided_location {
            if !p.is_well_formed() {
                return Err(NdrError::validation(format!(
                    "provided coordinates out of range ({}, {})",
                    p.latitude, p.longitude
                )));
            }
        }
        if let Some(r) = &self.required_location {
            if !r.is_well_formed() {
                return Err(NdrError::validation(format!(
                    "registered coordinates out of range ({}, {})",
                    r.latitude, r.longitude
                )));
            }
        }
        Ok(())
    }
}

/// Structured validator output
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofValidation {
    pub gps_valid: bool,
    /// Present only when both coordinates exist
    pub gps_distance_meters: Option<u64>,
    pub call_valid: bool,
    /// One entry per failed check, GPS first
    pub violations: Vec<String>,
}

impl ProofValidation {
    pub fn passed(&self) -> bool {
        self.gps_valid && self.call_valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_bundle() {
        let bundle = ProofBundle::empty(Utc::now());
        assert!(bundle.is_absent());

        let bundle = bundle.with_call(12, CallOutcome::NoResponse);
        assert!(!bundle.is_absent());
        assert!(bundle.has_call_log());
        assert!(!bundle.has_gps());
    }

    #[test]
    fn test_malformed_coordinates_rejected() {
        let bundle = ProofBundle::empty(Utc::now())
            .with_gps(GeoPoint::new(12.97, 200.0), GeoPoint::new(12.97, 77.59));
        let err = bundle.check_well_formed().unwrap_err();
        assert_eq!(err.code(), "NDR-PROOF-001");
    }

    #[test]
    fn test_call_outcome_serialization() {
        let json = serde_json::to_string(&CallOutcome::NoResponse).unwrap();
        assert_eq!(json, "\"NO_RESPONSE\"");
    }
}
