//! Proof Validator
//!
//! Checks a proof bundle against the proof policy. GPS findings are always
//! reported before call findings, so violation lists are stable across runs.

pub mod geo;

pub use geo::{distance_meters, haversine_meters, EARTH_MEAN_RADIUS_METERS};

use crate::error::NdrResult;
use crate::policy::ProofPolicy;
use crate::types::{ProofBundle, ProofValidation};

/// Proof validator
#[derive(Clone, Debug, Default)]
pub struct ProofValidator {
    policy: ProofPolicy,
}

impl ProofValidator {
    pub fn new(policy: ProofPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ProofPolicy {
        &self.policy
    }

    /// Validate a bundle whose coordinates are known to be well formed
    pub fn validate(&self, bundle: &ProofBundle) -> ProofValidation {
        let mut violations = Vec::new();

        let (gps_valid, gps_distance_meters) =
            match (&bundle.provided_location, &bundle.required_location) {
                (None, _) => {
                    violations.push("No GPS evidence provided".to_string());
                    (false, None)
                }
                (Some(_), None) => {
                    violations.push("No registered coordinates for delivery address".to_string());
                    (false, None)
                }
                (Some(provided), Some(required)) => {
                    let d = distance_meters(provided, required);
                    let valid = d <= self.policy.max_gps_distance_meters;
                    if !valid {
                        violations.push(format!(
                            "GPS location {}m from delivery address (max: {}m)",
                            d, self.policy.max_gps_distance_meters
                        ));
                    }
                    (valid, Some(d))
                }
            };

        let call_valid = match &bundle.call_log {
            None => {
                violations.push("No call log provided".to_string());
                false
            }
            Some(call) => {
                let long_enough = call.duration_secs >= self.policy.min_call_duration_secs;
                if !long_enough {
                    violations.push(format!(
                        "Call duration {}s (min: {}s)",
                        call.duration_secs, self.policy.min_call_duration_secs
                    ));
                }
                let accepted = self.policy.accepted_call_outcomes.contains(&call.outcome);
                if !accepted {
                    violations.push(format!("Call outcome {} not accepted", call.outcome));
                }
                long_enough && accepted
            }
        };

        ProofValidation {
            gps_valid,
            gps_distance_meters,
            call_valid,
            violations,
        }
    }

    /// Validate after rejecting malformed coordinates
    pub fn validate_checked(&self, bundle: &ProofBundle) -> NdrResult<ProofValidation> {
        bundle.check_well_formed()?;
        Ok(self.validate(bundle))
    }
}
