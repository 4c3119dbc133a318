//! NDR Classifier
//!
//! Turns an NDR attempt and its proof into a verdict:
//!
//! | Proof                         | Reason accepted | Verdict      |
//! |-------------------------------|-----------------|--------------|
//! | absent or malformed           | any             | `UNVERIFIED` |
//! | any check failed              | any             | `SUSPICIOUS` |
//! | all checks passed             | yes             | `GENUINE`    |
//! | all checks passed             | no              | `SUSPICIOUS` |

use crate::error::{NdrError, NdrResult};
use crate::policy::EnginePolicy;
use crate::types::{
    DeliveryAttempt, NdrReasonCode, OrderId, ProofBundle, ProofValidation, Verdict,
};
use crate::validator::ProofValidator;

/// Classifier output
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub reason: NdrReasonCode,
    pub verdict: Verdict,
    /// Absent when the proof was missing or malformed
    pub validation: Option<ProofValidation>,
}

/// NDR classifier
#[derive(Clone, Debug)]
pub struct NdrClassifier {
    validator: ProofValidator,
    accepted_reasons: Vec<NdrReasonCode>,
}

impl NdrClassifier {
    pub fn new(validator: ProofValidator, accepted_reasons: Vec<NdrReasonCode>) -> Self {
        Self {
            validator,
            accepted_reasons,
        }
    }

    pub fn from_policy(policy: &EnginePolicy) -> Self {
        Self::new(
            ProofValidator::new(policy.proof.clone()),
            policy.accepted_reasons.clone(),
        )
    }

    pub fn validator(&self) -> &ProofValidator {
        &self.validator
    }

    /// Classify an NDR attempt
    ///
    /// Runs the proof through this classifier's own validator, so callers
    /// pass the raw bundle rather than a `ProofValidation`. The validation
    /// used is returned on the `Classification`.
    pub fn classify(
        &self,
        order_id: &OrderId,
        attempt: &DeliveryAttempt,
        proof: Option<&ProofBundle>,
    ) -> NdrResult<Classification> {
        if !attempt.is_ndr() {
            return Err(NdrError::NotAnNdrAttempt {
                order_id: order_id.to_string(),
                sequence: attempt.sequence,
                event_code: attempt.event_code.to_string(),
            });
        }

        let reason = stated_reason(attempt);

        let bundle = match proof {
            Some(bundle) if !bundle.is_absent() => bundle,
            _ => {
                return Ok(Classification {
                    reason,
                    verdict: Verdict::Unverified {
                        violations: vec![
                            "No GPS evidence provided".to_string(),
                            "No call log provided".to_string(),
                        ],
                    },
                    validation: None,
                });
            }
        };

        let validation = match self.validator.validate_checked(bundle) {
            Ok(validation) => validation,
            Err(NdrError::ValidationError { reason: detail }) => {
                return Ok(Classification {
                    reason,
                    verdict: Verdict::Unverified {
                        violations: vec![format!("Malformed proof: {}", detail)],
                    },
                    validation: None,
                });
            }
            Err(other) => return Err(other),
        };

        let verdict = if !validation.passed() {
            Verdict::Suspicious {
                violations: validation.violations.clone(),
            }
        } else if self.accepted_reasons.contains(&reason) {
            Verdict::Genuine
        } else {
            Verdict::Suspicious {
                violations: vec![format!(
                    "NDR reason {} not accepted for verification",
                    reason
                )],
            }
        };

        Ok(Classification {
            reason,
            verdict,
            validation: Some(validation),
        })
    }
}

impl Default for NdrClassifier {
    fn default() -> Self {
        Self::from_policy(&EnginePolicy::default())
    }
}

/// Reason carried by the attempt, `UNSPECIFIED` when the carrier sent none
pub fn stated_reason(attempt: &DeliveryAttempt) -> NdrReasonCode {
    attempt
        .ndr_reason
        .clone()
        .unwrap_or_else(|| NdrReasonCode::Other("UNSPECIFIED".to_string()))
}
