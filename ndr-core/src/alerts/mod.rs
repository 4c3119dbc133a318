//! Alert Generator
//!
//! Evaluates one seller's window of NDR records and order counts against the
//! alert policy. Output order is fixed: RTO rate, suspicious patterns (by
//! destination when grouped), cost savings.

use crate::policy::AlertPolicy;
use crate::types::{
    Alert, AlertSeverity, AlertType, NdrRecord, NdrRecordId, SellerId, VerdictKind,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};

/// Inputs for one alert evaluation
#[derive(Clone, Debug)]
pub struct AlertInput<'a> {
    pub seller_id: &'a SellerId,
    /// Human label used in messages, e.g. `week`
    pub period_label: &'a str,
    /// Every record version in the window
    pub records: &'a [NdrRecord],
    pub total_orders: u64,
    pub rto_orders: u64,
}

/// Alert generator
#[derive(Clone, Debug, Default)]
pub struct AlertGenerator {
    policy: AlertPolicy,
}

impl AlertGenerator {
    pub fn new(policy: AlertPolicy) -> Self {
        Self { policy }
    }

    pub fn generate(&self, input: &AlertInput<'_>) -> Vec<Alert> {
        let mut alerts = Vec::new();

        if let Some(alert) = self.rto_rate_alert(input) {
            alerts.push(alert);
        }
        alerts.extend(self.suspicious_pattern_alerts(input));
        if let Some(alert) = self.cost_savings_alert(input) {
            alerts.push(alert);
        }

        alerts
    }

    fn rto_rate_alert(&self, input: &AlertInput<'_>) -> Option<Alert> {
        if input.total_orders == 0 {
            return None;
        }
        let rate = Decimal::from(input.rto_orders) * Decimal::ONE_HUNDRED
            / Decimal::from(input.total_orders);
        if rate <= self.policy.rto_rate_threshold_pct {
            return None;
        }

        Some(Alert {
            alert_type: AlertType::HighRtoRate,
            severity: AlertSeverity::High,
            seller_id: input.seller_id.clone(),
            title: "High RTO Rate Alert".to_string(),
            message: format!(
                "Your RTO rate is {:.1}% this {} (threshold: {}%)",
                rate.round_dp(1),
                input.period_label,
                self.policy.rto_rate_threshold_pct.normalize()
            ),
            action_required: true,
            suggestions: AlertType::HighRtoRate.suggestions(),
            destination: None,
        })
    }

    fn suspicious_pattern_alerts(&self, input: &AlertInput<'_>) -> Vec<Alert> {
        // (total, suspicious) per destination bucket
        let mut groups: BTreeMap<Option<&str>, (u64, u64)> = BTreeMap::new();
        for record in current_records(input.records) {
            let bucket = if self.policy.group_by_destination {
                Some(record.destination.as_str())
            } else {
                None
            };
            let counts = groups.entry(bucket).or_insert((0, 0));
            counts.0 += 1;
            if record.verdict_kind() == VerdictKind::Suspicious {
                counts.1 += 1;
            }
        }

        groups
            .into_iter()
            .filter_map(|(bucket, (total, suspicious))| {
                if suspicious <= self.policy.suspicious_count_threshold || total == 0 {
                    return None;
                }
                let ratio = Decimal::from(suspicious) / Decimal::from(total);
                let severity = if ratio > self.policy.high_watermark {
                    AlertSeverity::High
                } else {
                    AlertSeverity::Medium
                };

                let mut message = format!(
                    "{} suspicious NDRs detected this {}",
                    suspicious, input.period_label
                );
                if let Some(destination) = bucket {
                    message.push_str(&format!(" for destination {}", destination));
                }

                Some(Alert {
                    alert_type: AlertType::SuspiciousNdrPattern,
                    severity,
                    seller_id: input.seller_id.clone(),
                    title: "Suspicious NDR Activity".to_string(),
                    message,
                    action_required: true,
                    suggestions: AlertType::SuspiciousNdrPattern.suggestions(),
                    destination: bucket.map(str::to_string),
                })
            })
            .collect()
    }

    fn cost_savings_alert(&self, input: &AlertInput<'_>) -> Option<Alert> {
        let (prevented, cost_saved) = rto_savings(input.records);
        if prevented == 0 {
            return None;
        }

        Some(Alert {
            alert_type: AlertType::CostSavings,
            severity: AlertSeverity::Info,
            seller_id: input.seller_id.clone(),
            title: "RTO Prevention Success".to_string(),
            message: format!(
                "₹{} saved by preventing {} RTOs this {}",
                cost_saved.normalize(),
                prevented,
                input.period_label
            ),
            action_required: false,
            suggestions: AlertType::CostSavings.suggestions(),
            destination: None,
        })
    }
}

/// Overturned records and the RTO cost they avoided, rounded to 2 dp
///
/// Each overturn is credited with the `potential_rto_cost` of the record it
/// supersedes. An original outside `records` contributes nothing.
pub fn rto_savings(records: &[NdrRecord]) -> (u64, Decimal) {
    let by_id: BTreeMap<&NdrRecordId, &NdrRecord> =
        records.iter().map(|r| (&r.ndr_id, r)).collect();

    let mut prevented = 0u64;
    let mut saved = Decimal::ZERO;
    for overturn in records.iter().filter(|r| r.is_overturn()) {
        prevented += 1;
        if let Some(original) = overturn.supersedes.as_ref().and_then(|id| by_id.get(id)) {
            saved += original.cost_impact.potential_rto_cost;
        }
    }
    (prevented, saved.round_dp(2))
}

/// Records not superseded by another record of the same slice
pub fn current_records(records: &[NdrRecord]) -> impl Iterator<Item = &NdrRecord> {
    let superseded: HashSet<&NdrRecordId> =
        records.iter().filter_map(|r| r.supersedes.as_ref()).collect();
    records
        .iter()
        .filter(move |r| !superseded.contains(&r.ndr_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ChallengeId, CostImpact, NdrReasonCode, OrderId, RecordOrigin, Verdict,
    };
    use chrono::Utc;

    fn record(n: usize, destination: &str, verdict: Verdict) -> NdrRecord {
        let order_id = OrderId::new(format!("ORD-{}", n));
        let now = Utc::now();
        let cost_impact = if verdict.is_genuine() {
            CostImpact::zero(Decimal::new(999, 0))
        } else {
            CostImpact {
                order_value: Decimal::new(999, 0),
                delivery_cost: Decimal::new(50, 0),
                potential_rto_cost: Decimal::new(200, 0),
                total_risk: Decimal::new(250, 0),
            }
        };
        NdrRecord {
            ndr_id: NdrRecordId::for_attempt(&order_id, 1, 1),
            order_id,
            seller_id: SellerId::new("SELLER-1"),
            carrier: "Delhivery".to_string(),
            destination: destination.to_string(),
            attempt_sequence: 1,
            attempted_at: now,
            reason: NdrReasonCode::CustomerUnavailable,
            proof: None,
            validation: None,
            verdict,
            cost_impact,
            origin: RecordOrigin::Classification,
            supersedes: None,
            recorded_at: now,
        }
    }

    fn suspicious() -> Verdict {
        Verdict::Suspicious {
            violations: vec!["No call log provided".to_string()],
        }
    }

    fn batch(suspicious_count: usize, genuine_count: usize) -> Vec<NdrRecord> {
        let mut records = Vec::new();
        for i in 0..suspicious_count {
            records.push(record(i, "560001", suspicious()));
        }
        for i in 0..genuine_count {
            records.push(record(1000 + i, "560001", Verdict::Genuine));
        }
        records
    }

    fn input<'a>(seller: &'a SellerId, records: &'a [NdrRecord]) -> AlertInput<'a> {
        AlertInput {
            seller_id: seller,
            period_label: "week",
            records,
            total_orders: 100,
            rto_orders: 5,
        }
    }

    #[test]
    fn test_high_ratio_is_high_severity() {
        let seller = SellerId::new("SELLER-1");
        let records = batch(6, 2);
        let alerts = AlertGenerator::default().generate(&input(&seller, &records));

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::SuspiciousNdrPattern);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert_eq!(alerts[0].message, "6 suspicious NDRs detected this week");
        assert_eq!(alerts[0].suggestions.len(), 3);
    }

    #[test]
    fn test_medium_ratio_is_medium_severity() {
        let seller = SellerId::new("SELLER-1");
        // 6 / 20 = 0.30
        let records = batch(6, 14);
        let alerts = AlertGenerator::default().generate(&input(&seller, &records));
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);
    }

    #[test]
    fn test_low_ratio_still_alerts_over_count() {
        let seller = SellerId::new("SELLER-1");
        // 6 / 40 = 0.15
        let records = batch(6, 34);
        let alerts = AlertGenerator::default().generate(&input(&seller, &records));

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::SuspiciousNdrPattern);
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);
        assert_eq!(alerts[0].message, "6 suspicious NDRs detected this week");
    }

    #[test]
    fn test_count_threshold_is_exclusive() {
        let seller = SellerId::new("SELLER-1");
        let records = batch(5, 0);
        assert!(AlertGenerator::default()
            .generate(&input(&seller, &records))
            .is_empty());
    }

    #[test]
    fn test_high_rto_rate() {
        let seller = SellerId::new("SELLER-1");
        let alerts = AlertGenerator::default().generate(&AlertInput {
            seller_id: &seller,
            period_label: "week",
            records: &[],
            total_orders: 40,
            rto_orders: 8,
        });

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::HighRtoRate);
        assert_eq!(
            alerts[0].message,
            "Your RTO rate is 20.0% this week (threshold: 15%)"
        );
    }

    #[test]
    fn test_cost_savings_from_overturns() {
        let seller = SellerId::new("SELLER-1");
        let original = record(1, "560001", suspicious());
        let overturn = original.overturned_by(ChallengeId::new("challenge:1"), Utc::now());
        let records = vec![original, overturn];

        let alerts = AlertGenerator::default().generate(&input(&seller, &records));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::CostSavings);
        assert_eq!(alerts[0].severity, AlertSeverity::Info);
        assert_eq!(alerts[0].message, "₹200 saved by preventing 1 RTOs this week");
        assert!(!alerts[0].action_required);
    }

    #[test]
    fn test_grouped_by_destination() {
        let seller = SellerId::new("SELLER-1");
        let mut records = batch(6, 0);
        for i in 0..6 {
            records.push(record(500 + i, "110001", Verdict::Genuine));
        }
        let generator = AlertGenerator::new(AlertPolicy {
            group_by_destination: true,
            ..AlertPolicy::default()
        });

        let alerts = generator.generate(&input(&seller, &records));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].destination.as_deref(), Some("560001"));
    }
}
