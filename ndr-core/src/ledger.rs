//! Verdict Ledger
//!
//! Append-only store of NDR records. A record is never modified; a
//! correction is a new record whose `supersedes` names the record it
//! replaces, which must be the current one for that attempt.

use crate::error::{NdrError, NdrResult};
use crate::types::{NdrRecord, NdrRecordId, OrderId};
use std::collections::HashMap;

/// Verdict ledger
#[derive(Default)]
pub struct NdrLedger {
    /// Records in append order
    records: Vec<NdrRecord>,
    by_id: HashMap<NdrRecordId, usize>,
    by_order: HashMap<OrderId, Vec<usize>>,
    /// Current record per (order, attempt sequence)
    current: HashMap<(OrderId, u32), NdrRecordId>,
    /// Superseded record -> record that replaced it
    superseded_by: HashMap<NdrRecordId, NdrRecordId>,
}

impl NdrLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `record` can be appended without breaking the chain
    pub fn check_append(&self, record: &NdrRecord) -> NdrResult<()> {
        if !record.verdict.is_consistent() {
            return Err(NdrError::LedgerConflict {
                reason: format!(
                    "record {} has verdict {} with {} violations",
                    record.ndr_id,
                    record.verdict_kind(),
                    record.verdict.violations().len()
                ),
            });
        }
        if self.by_id.contains_key(&record.ndr_id) {
            return Err(NdrError::LedgerConflict {
                reason: format!("record {} already exists", record.ndr_id),
            });
        }

        let attempt_key = (record.order_id.clone(), record.attempt_sequence);
        match (&record.supersedes, self.current.get(&attempt_key)) {
            (None, None) => Ok(()),
            (None, Some(existing)) => Err(NdrError::LedgerConflict {
                reason: format!(
                    "attempt {} on order {} is already recorded as {}",
                    record.attempt_sequence, record.order_id, existing
                ),
            }),
            (Some(prev), Some(existing)) if prev == existing => Ok(()),
            (Some(prev), _) => Err(NdrError::LedgerConflict {
                reason: format!("record {} is not current and cannot be superseded", prev),
            }),
        }
    }

    /// Append a record
    pub fn append(&mut self, record: NdrRecord) -> NdrResult<&NdrRecord> {
        self.check_append(&record)?;

        let idx = self.records.len();
        let attempt_key = (record.order_id.clone(), record.attempt_sequence);

        if let Some(prev) = &record.supersedes {
            self.superseded_by
                .insert(prev.clone(), record.ndr_id.clone());
        }
        self.current.insert(attempt_key, record.ndr_id.clone());
        self.by_id.insert(record.ndr_id.clone(), idx);
        self.by_order
            .entry(record.order_id.clone())
            .or_default()
            .push(idx);
        self.records.push(record);

        Ok(&self.records[idx])
    }

    pub fn get(&self, ndr_id: &NdrRecordId) -> Option<&NdrRecord> {
        self.by_id.get(ndr_id).map(|&idx| &self.records[idx])
    }

    /// Current record for an attempt
    pub fn current_for_attempt(&self, order_id: &OrderId, sequence: u32) -> Option<&NdrRecord> {
        self.current
            .get(&(order_id.clone(), sequence))
            .and_then(|id| self.get(id))
    }

    /// Current record of the most recent classified attempt on an order
    pub fn latest_current(&self, order_id: &OrderId) -> Option<&NdrRecord> {
        self.history_of(order_id)
            .into_iter()
            .filter(|r| !self.is_superseded(&r.ndr_id))
            .max_by_key(|r| r.attempt_sequence)
    }

    /// All record versions of an order, in append order
    pub fn history_of(&self, order_id: &OrderId) -> Vec<&NdrRecord> {
        self.by_order
            .get(order_id)
            .map(|idxs| idxs.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    /// Supersede chain ending at `ndr_id`, oldest first
    pub fn chain_of(&self, ndr_id: &NdrRecordId) -> Vec<&NdrRecord> {
        let mut chain = Vec::new();
        let mut cursor = self.get(ndr_id);
        while let Some(record) = cursor {
            chain.push(record);
            cursor = record.supersedes.as_ref().and_then(|prev| self.get(prev));
        }
        chain.reverse();
        chain
    }

    pub fn is_superseded(&self, ndr_id: &NdrRecordId) -> bool {
        self.superseded_by.contains_key(ndr_id)
    }

    pub fn superseded_by(&self, ndr_id: &NdrRecordId) -> Option<&NdrRecordId> {
        self.superseded_by.get(ndr_id)
    }

    /// Records not superseded by any other record
    pub fn current_records(&self) -> impl Iterator<Item = &NdrRecord> {
        self.records
            .iter()
            .filter(move |r| !self.superseded_by.contains_key(&r.ndr_id))
    }

    /// Every record version, in append order
    pub fn records(&self) -> &[NdrRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ChallengeId, CostImpact, NdrReasonCode, RecordOrigin, SellerId, Verdict,
    };
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn suspicious_record(order: &str, sequence: u32) -> NdrRecord {
        let order_id = OrderId::new(order);
        let now = Utc::now();
        NdrRecord {
            ndr_id: NdrRecordId::for_attempt(&order_id, sequence, 1),
            order_id,
            seller_id: SellerId::new("SELLER-1"),
            carrier: "Delhivery".to_string(),
            destination: "560001".to_string(),
            attempt_sequence: sequence,
            attempted_at: now,
            reason: NdrReasonCode::CustomerUnavailable,
            proof: None,
            validation: None,
            verdict: Verdict::Suspicious {
                violations: vec!["No call log provided".to_string()],
            },
            cost_impact: CostImpact {
                order_value: Decimal::new(999, 0),
                delivery_cost: Decimal::new(50, 0),
                potential_rto_cost: Decimal::new(200, 0),
                total_risk: Decimal::new(250, 0),
            },
            origin: RecordOrigin::Classification,
            supersedes: None,
            recorded_at: now,
        }
    }

    #[test]
    fn test_append_and_supersede() {
        let mut ledger = NdrLedger::new();
        let original = suspicious_record("ORD-1", 1);
        ledger.append(original.clone()).unwrap();

        let overturn = original.overturned_by(ChallengeId::new("challenge:x:1"), Utc::now());
        assert_eq!(overturn.ndr_id.as_str(), "ndr:ORD-1:1:v2");
        ledger.append(overturn.clone()).unwrap();

        assert!(ledger.is_superseded(&original.ndr_id));
        assert_eq!(
            ledger.current_for_attempt(&original.order_id, 1).unwrap().ndr_id,
            overturn.ndr_id
        );
        assert_eq!(ledger.history_of(&original.order_id).len(), 2);
        assert_eq!(ledger.current_records().count(), 1);

        let chain = ledger.chain_of(&overturn.ndr_id);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].ndr_id, original.ndr_id);
        assert_eq!(chain[1].cost_impact.total_risk, Decimal::ZERO);
    }

    #[test]
    fn test_rejects_second_classification_of_attempt() {
        let mut ledger = NdrLedger::new();
        ledger.append(suspicious_record("ORD-1", 1)).unwrap();

        let mut again = suspicious_record("ORD-1", 1);
        again.ndr_id = NdrRecordId::new("ndr:ORD-1:1:other");
        let err = ledger.append(again).unwrap_err();
        assert_eq!(err.code(), "NDR-LEDGER-001");
    }

    #[test]
    fn test_rejects_superseding_stale_record() {
        let mut ledger = NdrLedger::new();
        let original = suspicious_record("ORD-1", 1);
        ledger.append(original.clone()).unwrap();
        ledger
            .append(original.overturned_by(ChallengeId::new("challenge:x:1"), Utc::now()))
            .unwrap();

        let mut stale = original.overturned_by(ChallengeId::new("challenge:x:2"), Utc::now());
        stale.ndr_id = NdrRecordId::new("ndr:ORD-1:1:v9");
        assert!(ledger.append(stale).is_err());
    }

    #[test]
    fn test_rejects_inconsistent_verdict() {
        let mut ledger = NdrLedger::new();
        let mut record = suspicious_record("ORD-2", 1);
        record.verdict = Verdict::Suspicious { violations: vec![] };
        assert!(ledger.append(record).is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_latest_current_picks_highest_attempt() {
        let mut ledger = NdrLedger::new();
        ledger.append(suspicious_record("ORD-3", 1)).unwrap();
        ledger.append(suspicious_record("ORD-3", 3)).unwrap();
        let latest = ledger.latest_current(&OrderId::new("ORD-3")).unwrap();
        assert_eq!(latest.attempt_sequence, 3);
    }
}
