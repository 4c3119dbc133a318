//! Carrier Scorecard Aggregator
//!
//! Pure recompute over orders, their attempts and NDR records. Nothing is
//! cached; the same inputs always give the same buckets in the same order.

use crate::alerts::{current_records, rto_savings};
use crate::types::{
    iso_week_label, CarrierBreakdown, CarrierPeriodStat, Challenge, DeliveryAttempt, EventCode,
    NdrRecord, NdrRecordId, OrderId, OrderInfo, ReportingPeriod, ScorecardBucket,
    SellerDashboard, SellerId, VerdictKind,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// An order together with its attempts
#[derive(Clone, Copy, Debug)]
pub struct OrderHistory<'a> {
    pub order: &'a OrderInfo,
    pub attempts: &'a [DeliveryAttempt],
}

impl<'a> OrderHistory<'a> {
    pub fn new(order: &'a OrderInfo, attempts: &'a [DeliveryAttempt]) -> Self {
        Self { order, attempts }
    }

    pub fn delivered(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| a.event_code == EventCode::Delivered)
    }
}

/// Percentage rounded to 2 dp, zero when the denominator is zero
pub fn percentage(numerator: u64, denominator: u64) -> Decimal {
    if denominator == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(numerator) * Decimal::ONE_HUNDRED / Decimal::from(denominator)).round_dp(2)
}

#[derive(Default)]
struct BucketCounts {
    orders: BTreeSet<OrderId>,
    attempts: u64,
    delivered: u64,
    ndrs: u64,
    verified: u64,
    suspicious: u64,
    unverified: u64,
    overturned: u64,
}

/// Scorecard aggregator
#[derive(Clone, Debug, Default)]
pub struct ScorecardAggregator;

impl ScorecardAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Per (carrier, destination, ISO week) statistics, sorted by bucket
    pub fn aggregate(
        &self,
        histories: &[OrderHistory<'_>],
        records: &[NdrRecord],
    ) -> Vec<CarrierPeriodStat> {
        let mut buckets: BTreeMap<ScorecardBucket, BucketCounts> = BTreeMap::new();

        for history in histories {
            let order = history.order;
            if history.attempts.is_empty() {
                // Orders without attempts still count towards their creation week
                let bucket = bucket_for(&order.carrier, &order.destination, &order.created_at);
                buckets
                    .entry(bucket)
                    .or_default()
                    .orders
                    .insert(order.order_id.clone());
                continue;
            }

            for attempt in history.attempts {
                let bucket = bucket_for(&order.carrier, &order.destination, &attempt.attempted_at);
                let counts = buckets.entry(bucket).or_default();
                counts.orders.insert(order.order_id.clone());
                if attempt.event_code.is_delivery_attempt() {
                    counts.attempts += 1;
                }
                match attempt.event_code {
                    EventCode::Delivered => counts.delivered += 1,
                    EventCode::Ndr => counts.ndrs += 1,
                    _ => {}
                }
            }
        }

        for record in current_records(records) {
            let bucket = bucket_for(&record.carrier, &record.destination, &record.attempted_at);
            let counts = buckets.entry(bucket).or_default();
            if record.is_overturn() {
                counts.overturned += 1;
                continue;
            }
            match record.verdict_kind() {
                VerdictKind::Genuine => counts.verified += 1,
                VerdictKind::Suspicious => counts.suspicious += 1,
                VerdictKind::Unverified => counts.unverified += 1,
            }
        }

        buckets
            .into_iter()
            .map(|(bucket, c)| CarrierPeriodStat {
                bucket,
                total_orders: c.orders.len() as u64,
                total_attempts: c.attempts,
                successful_deliveries: c.delivered,
                total_ndrs: c.ndrs,
                verified_ndrs: c.verified,
                suspicious_ndrs: c.suspicious,
                unverified_ndrs: c.unverified,
                rto_prevented: c.overturned,
                success_rate: percentage(c.delivered, c.attempts),
                false_attempt_rate: percentage(c.suspicious + c.overturned, c.ndrs),
            })
            .collect()
    }

    /// Seller KPI roll-up
    ///
    /// Only customer disputes against one of `records` are counted.
    pub fn seller_dashboard(
        &self,
        seller_id: &SellerId,
        period: ReportingPeriod,
        histories: &[OrderHistory<'_>],
        records: &[NdrRecord],
        challenges: &[Challenge],
    ) -> SellerDashboard {
        #[derive(Default)]
        struct CarrierCounts {
            orders: u64,
            delivered: u64,
            verified: u64,
            suspicious: u64,
            prevented: u64,
        }

        let mut carriers: BTreeMap<&str, CarrierCounts> = BTreeMap::new();
        let mut delivered_total = 0u64;

        for history in histories {
            let counts = carriers.entry(history.order.carrier.as_str()).or_default();
            counts.orders += 1;
            if history.delivered() {
                counts.delivered += 1;
                delivered_total += 1;
            }
        }

        let (mut verified, mut suspicious, mut prevented) = (0u64, 0u64, 0u64);
        for record in current_records(records) {
            let counts = carriers.entry(record.carrier.as_str()).or_default();
            if record.is_overturn() {
                counts.prevented += 1;
                prevented += 1;
                continue;
            }
            match record.verdict_kind() {
                VerdictKind::Genuine => {
                    counts.verified += 1;
                    verified += 1;
                }
                VerdictKind::Suspicious => {
                    counts.suspicious += 1;
                    suspicious += 1;
                }
                VerdictKind::Unverified => {}
            }
        }

        let record_ids: BTreeSet<&NdrRecordId> = records.iter().map(|r| &r.ndr_id).collect();
        let customer_disputes = challenges
            .iter()
            .filter(|c| c.is_customer_dispute() && record_ids.contains(&c.ndr_id))
            .count() as u64;

        let total_orders = histories.len() as u64;
        SellerDashboard {
            seller_id: seller_id.clone(),
            period,
            total_orders,
            successful_deliveries: delivered_total,
            success_rate: percentage(delivered_total, total_orders),
            verified_ndrs: verified,
            suspicious_ndrs: suspicious,
            rto_prevented: prevented,
            customer_disputes,
            cost_saved: rto_savings(records).1,
            carrier_breakdown: carriers
                .into_iter()
                .map(|(carrier, c)| CarrierBreakdown {
                    carrier: carrier.to_string(),
                    total_orders: c.orders,
                    success_rate: percentage(c.delivered, c.orders),
                    verified_ndrs: c.verified,
                    suspicious_ndrs: c.suspicious,
                    rto_prevented: c.prevented,
                })
                .collect(),
        }
    }
}

fn bucket_for(
    carrier: &str,
    destination: &str,
    at: &chrono::DateTime<chrono::Utc>,
) -> ScorecardBucket {
    ScorecardBucket {
        carrier: carrier.to_string(),
        destination: destination.to_string(),
        period: iso_week_label(at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChallengeId, CostImpact, NdrReasonCode, PaymentMode, RecordOrigin, Verdict};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn order(id: &str, carrier: &str) -> OrderInfo {
        OrderInfo {
            order_id: OrderId::new(id),
            seller_id: SellerId::new("SELLER-1"),
            carrier: carrier.to_string(),
            destination: "560001".to_string(),
            customer_phone: "+919876543210".to_string(),
            order_value: Some(Decimal::new(999, 0)),
            delivery_cost: None,
            payment_mode: PaymentMode::Cod,
            registered_coordinates: None,
            created_at: monday(),
        }
    }

    fn attempt(sequence: u32, code: EventCode, at: DateTime<Utc>) -> DeliveryAttempt {
        let mut attempt = DeliveryAttempt::new(at, code);
        attempt.sequence = sequence;
        attempt
    }

    fn record(order: &OrderInfo, sequence: u32, verdict: Verdict) -> NdrRecord {
        NdrRecord {
            ndr_id: NdrRecordId::for_attempt(&order.order_id, sequence, 1),
            order_id: order.order_id.clone(),
            seller_id: order.seller_id.clone(),
            carrier: order.carrier.clone(),
            destination: order.destination.clone(),
            attempt_sequence: sequence,
            attempted_at: monday() + Duration::hours(1),
            reason: NdrReasonCode::CustomerUnavailable,
            proof: None,
            validation: None,
            verdict,
            cost_impact: CostImpact::zero(Decimal::new(999, 0)),
            origin: RecordOrigin::Classification,
            supersedes: None,
            recorded_at: monday(),
        }
    }

    #[test]
    fn test_zero_attempt_bucket_has_zero_success_rate() {
        let idle = order("ORD-1", "Delhivery");
        let histories = [OrderHistory::new(&idle, &[])];

        let stats = ScorecardAggregator::default().aggregate(&histories, &[]);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].total_orders, 1);
        assert_eq!(stats[0].total_attempts, 0);
        assert_eq!(stats[0].success_rate, Decimal::ZERO);
        assert_eq!(stats[0].false_attempt_rate, Decimal::ZERO);
        assert_eq!(stats[0].bucket.period, "2024-W01");
    }

    #[test]
    fn test_bucket_rates() {
        let a = order("ORD-1", "Delhivery");
        let b = order("ORD-2", "Delhivery");
        let t = monday() + Duration::hours(1);
        let a_attempts = vec![
            attempt(1, EventCode::OutForDelivery, t),
            attempt(2, EventCode::Ndr, t),
            attempt(3, EventCode::Delivered, t + Duration::hours(20)),
        ];
        let b_attempts = vec![attempt(1, EventCode::Ndr, t)];
        let histories = [
            OrderHistory::new(&a, &a_attempts),
            OrderHistory::new(&b, &b_attempts),
        ];

        let suspicious = record(
            &b,
            1,
            Verdict::Suspicious {
                violations: vec!["No call log provided".to_string()],
            },
        );
        let records = vec![record(&a, 2, Verdict::Genuine), suspicious];

        let stats = ScorecardAggregator::default().aggregate(&histories, &records);
        assert_eq!(stats.len(), 1);
        let stat = &stats[0];
        assert_eq!(stat.total_orders, 2);
        assert_eq!(stat.total_attempts, 3);
        assert_eq!(stat.successful_deliveries, 1);
        assert_eq!(stat.verified_ndrs, 1);
        assert_eq!(stat.suspicious_ndrs, 1);
        // 1 / 3
        assert_eq!(stat.success_rate, Decimal::new(3333, 2));
        // 1 / 2
        assert_eq!(stat.false_attempt_rate, Decimal::new(50, 0));
    }

    #[test]
    fn test_overturned_counts_as_prevented_not_verified() {
        let a = order("ORD-1", "Shiprocket");
        let t = monday() + Duration::hours(1);
        let attempts = vec![attempt(1, EventCode::Ndr, t)];
        let histories = [OrderHistory::new(&a, &attempts)];

        let original = record(
            &a,
            1,
            Verdict::Unverified {
                violations: vec!["No GPS evidence provided".to_string()],
            },
        );
        let overturn = original.overturned_by(ChallengeId::new("challenge:1"), t);
        let records = vec![original, overturn];

        let aggregator = ScorecardAggregator::default();
        let stats = aggregator.aggregate(&histories, &records);
        assert_eq!(stats[0].verified_ndrs, 0);
        assert_eq!(stats[0].unverified_ndrs, 0);
        assert_eq!(stats[0].rto_prevented, 1);
        assert_eq!(stats[0].false_attempt_rate, Decimal::new(100, 0));

        let dashboard = aggregator.seller_dashboard(
            &SellerId::new("SELLER-1"),
            ReportingPeriod::Week,
            &histories,
            &records,
            &[],
        );
        assert_eq!(dashboard.rto_prevented, 1);
        assert_eq!(dashboard.customer_disputes, 0);
        // Credited with the original's potential RTO cost, zero here
        assert_eq!(dashboard.cost_saved, Decimal::ZERO);
        assert_eq!(dashboard.success_rate, Decimal::ZERO);
        assert_eq!(dashboard.carrier_breakdown.len(), 1);
        assert_eq!(dashboard.carrier_breakdown[0].carrier, "Shiprocket");
    }

    #[test]
    fn test_buckets_sorted() {
        let a = order("ORD-1", "Xpress");
        let b = order("ORD-2", "Bluedart");
        let histories = [OrderHistory::new(&a, &[]), OrderHistory::new(&b, &[])];
        let stats = ScorecardAggregator::default().aggregate(&histories, &[]);
        assert_eq!(stats[0].bucket.carrier, "Bluedart");
        assert_eq!(stats[1].bucket.carrier, "Xpress");
    }
}
