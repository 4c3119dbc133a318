//! Resolution Channel Tracker
//!
//! Passive store of customer resolution windows keyed by (phone, order).
//! Expiry is computed against the `now` the caller passes in; nothing here
//! runs on a timer.

use crate::error::{NdrError, NdrResult};
use crate::types::{
    CustomerAction, OrderId, PendingResolution, ResolutionKey, ResolutionStatus, TemplateKey,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Parsed customer reply
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyIntent {
    Action(CustomerAction),
    Help,
    Unrecognised,
}

/// Parse a free-text reply (`1`-`5`, keywords, `help`)
pub fn parse_reply(text: &str) -> ReplyIntent {
    match text.trim().to_lowercase().as_str() {
        "1" | "reschedule" | "reschedule delivery" => {
            ReplyIntent::Action(CustomerAction::Reschedule)
        }
        "2" | "change address" | "change location" => {
            ReplyIntent::Action(CustomerAction::ChangeAddress)
        }
        "3" | "self pickup" | "pickup" | "collect" => {
            ReplyIntent::Action(CustomerAction::SelfPickup)
        }
        "4" | "cancel" | "cancel order" | "return" => {
            ReplyIntent::Action(CustomerAction::ReturnToOrigin)
        }
        "5" | "dispute" | "not attempted" | "wrong ndr" | "i was home" => {
            ReplyIntent::Action(CustomerAction::Dispute)
        }
        "help" | "?" => ReplyIntent::Help,
        _ => ReplyIntent::Unrecognised,
    }
}

/// Expiry predicate, monotonic in `now`
pub fn is_expired(entry: &PendingResolution, now: DateTime<Utc>) -> bool {
    now >= entry.expires_at
}

/// Expiry for a window opened at `now`
///
/// Rejects non-positive TTLs and TTLs that overflow the calendar.
pub fn window_expiry(ttl: Duration, now: DateTime<Utc>) -> NdrResult<DateTime<Utc>> {
    if ttl <= Duration::zero() {
        return Err(NdrError::InvalidTtl {
            ttl_secs: ttl.num_seconds(),
        });
    }
    now.checked_add_signed(ttl).ok_or(NdrError::InvalidTtl {
        ttl_secs: ttl.num_seconds(),
    })
}

/// Resolution tracker
#[derive(Default)]
pub struct ResolutionTracker {
    entries: HashMap<ResolutionKey, PendingResolution>,
}

impl ResolutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a window, replacing any prior entry for the key
    pub fn open(
        &mut self,
        phone: &str,
        order_id: &OrderId,
        template: TemplateKey,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> NdrResult<PendingResolution> {
        let expires_at = window_expiry(ttl, now)?;
        if phone.trim().is_empty() {
            return Err(NdrError::validation("customer phone is required"));
        }

        let entry = PendingResolution {
            phone: phone.trim().to_string(),
            order_id: order_id.clone(),
            template,
            created_at: now,
            expires_at,
            status: ResolutionStatus::Pending,
        };
        self.entries.insert(entry.key(), entry.clone());
        Ok(entry)
    }

    /// Record the customer's chosen action
    pub fn resolve(
        &mut self,
        phone: &str,
        order_id: &OrderId,
        action: CustomerAction,
        now: DateTime<Utc>,
    ) -> NdrResult<PendingResolution> {
        let key = ResolutionKey::new(phone.trim(), order_id.clone());
        let entry = self
            .entries
            .get_mut(&key)
            .ok_or_else(|| NdrError::not_found("PendingResolution", key.to_string()))?;

        if entry.status.is_resolved() {
            return Err(NdrError::AlreadyResolved {
                order_id: order_id.to_string(),
            });
        }
        if is_expired(entry, now) {
            return Err(NdrError::Expired {
                order_id: order_id.to_string(),
                expired_at: entry.expires_at.to_rfc3339(),
            });
        }

        entry.status = ResolutionStatus::Resolved {
            action,
            resolved_at: now,
        };
        Ok(entry.clone())
    }

    /// Unresolved expired entries, earliest expiry first
    pub fn list_expired(&self, now: DateTime<Utc>) -> Vec<PendingResolution> {
        let mut expired: Vec<PendingResolution> = self
            .entries
            .values()
            .filter(|e| !e.status.is_resolved() && is_expired(e, now))
            .cloned()
            .collect();
        expired.sort_by(|a, b| {
            a.expires_at
                .cmp(&b.expires_at)
                .then_with(|| a.key().cmp(&b.key()))
        });
        expired
    }

    /// Mark an expired entry as reported by a sweep
    pub fn mark_escalated(
        &mut self,
        key: &ResolutionKey,
        now: DateTime<Utc>,
    ) -> NdrResult<PendingResolution> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| NdrError::not_found("PendingResolution", key.to_string()))?;

        match entry.status {
            ResolutionStatus::Resolved { .. } => {
                return Err(NdrError::AlreadyResolved {
                    order_id: key.order_id.to_string(),
                });
            }
            ResolutionStatus::Escalated { .. } => return Ok(entry.clone()),
            ResolutionStatus::Pending => {}
        }
        if !is_expired(entry, now) {
            return Err(NdrError::validation(format!(
                "resolution window {} has not expired",
                key
            )));
        }

        entry.status = ResolutionStatus::Escalated { escalated_at: now };
        Ok(entry.clone())
    }

    /// Live window a reply from `phone` belongs to, newest first
    pub fn pending_for_phone(&self, phone: &str, now: DateTime<Utc>) -> Option<&PendingResolution> {
        let phone = phone.trim();
        self.entries
            .values()
            .filter(|e| {
                e.phone == phone
                    && matches!(e.status, ResolutionStatus::Pending)
                    && !is_expired(e, now)
            })
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.order_id.cmp(&b.order_id))
            })
    }

    pub fn get(&self, key: &ResolutionKey) -> Option<&PendingResolution> {
        self.entries.get(key)
    }

    /// All entries, earliest expiry first
    pub fn list(&self) -> Vec<&PendingResolution> {
        let mut all: Vec<&PendingResolution> = self.entries.values().collect();
        all.sort_by(|a, b| {
            a.expires_at
                .cmp(&b.expires_at)
                .then_with(|| a.key().cmp(&b.key()))
        });
        all
    }

    /// Pending (not resolved, not escalated) entry count
    pub fn pending_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e.status, ResolutionStatus::Pending))
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PHONE: &str = "+919876543210";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap()
    }

    fn order() -> OrderId {
        OrderId::new("ORD-42")
    }

    fn open_default(tracker: &mut ResolutionTracker) -> PendingResolution {
        tracker
            .open(
                PHONE,
                &order(),
                TemplateKey::NdrResolutionOptions,
                Duration::hours(2),
                t0(),
            )
            .unwrap()
    }

    #[test]
    fn test_parse_reply() {
        assert_eq!(parse_reply(" 1 "), ReplyIntent::Action(CustomerAction::Reschedule));
        assert_eq!(
            parse_reply("Change Location"),
            ReplyIntent::Action(CustomerAction::ChangeAddress)
        );
        assert_eq!(parse_reply("collect"), ReplyIntent::Action(CustomerAction::SelfPickup));
        assert_eq!(
            parse_reply("cancel order"),
            ReplyIntent::Action(CustomerAction::ReturnToOrigin)
        );
        assert_eq!(parse_reply("5"), ReplyIntent::Action(CustomerAction::Dispute));
        assert_eq!(
            parse_reply("I was home"),
            ReplyIntent::Action(CustomerAction::Dispute)
        );
        assert_eq!(parse_reply("?"), ReplyIntent::Help);
        assert_eq!(parse_reply("when will it arrive"), ReplyIntent::Unrecognised);
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let mut tracker = ResolutionTracker::new();
        let err = tracker
            .open(PHONE, &order(), TemplateKey::NdrResolutionOptions, Duration::zero(), t0())
            .unwrap_err();
        assert_eq!(err, NdrError::InvalidTtl { ttl_secs: 0 });
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_overflowing_ttl_rejected() {
        let mut tracker = ResolutionTracker::new();
        let ttl = Duration::days(1_000_000_000);
        let err = tracker
            .open(PHONE, &order(), TemplateKey::NdrResolutionOptions, ttl, t0())
            .unwrap_err();
        assert_eq!(
            err,
            NdrError::InvalidTtl {
                ttl_secs: ttl.num_seconds()
            }
        );
        assert!(tracker.is_empty());
        assert_eq!(window_expiry(Duration::hours(2), t0()).unwrap(), t0() + Duration::hours(2));
    }

    #[test]
    fn test_sweep_boundary() {
        let mut tracker = ResolutionTracker::new();
        open_default(&mut tracker);

        let before = t0() + Duration::hours(1) + Duration::minutes(59);
        assert!(tracker.list_expired(before).is_empty());

        let after = t0() + Duration::hours(2) + Duration::minutes(1);
        let expired = tracker.list_expired(after);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].order_id, order());
    }

    #[test]
    fn test_is_expired_monotonic() {
        let mut tracker = ResolutionTracker::new();
        let entry = open_default(&mut tracker);
        let mut seen_expired = false;
        for minutes in 0..240 {
            let expired = is_expired(&entry, t0() + Duration::minutes(minutes));
            assert!(!(seen_expired && !expired));
            seen_expired |= expired;
        }
        assert!(is_expired(&entry, entry.expires_at));
    }

    #[test]
    fn test_open_replaces_prior_entry() {
        let mut tracker = ResolutionTracker::new();
        open_default(&mut tracker);
        let later = t0() + Duration::minutes(30);
        let replaced = tracker
            .open(PHONE, &order(), TemplateKey::NdrResolutionOptions, Duration::hours(2), later)
            .unwrap();

        assert_eq!(tracker.len(), 1);
        let key = ResolutionKey::new(PHONE, order());
        assert_eq!(tracker.get(&key).unwrap().expires_at, replaced.expires_at);
    }

    #[test]
    fn test_resolve_outcomes() {
        let mut tracker = ResolutionTracker::new();

        let err = tracker
            .resolve(PHONE, &order(), CustomerAction::Reschedule, t0())
            .unwrap_err();
        assert!(matches!(err, NdrError::NotFound { .. }));

        open_default(&mut tracker);
        let resolved = tracker
            .resolve(PHONE, &order(), CustomerAction::Reschedule, t0() + Duration::minutes(5))
            .unwrap();
        assert!(resolved.status.is_resolved());

        let err = tracker
            .resolve(PHONE, &order(), CustomerAction::SelfPickup, t0() + Duration::minutes(6))
            .unwrap_err();
        assert!(matches!(err, NdrError::AlreadyResolved { .. }));
    }

    #[test]
    fn test_resolve_after_expiry() {
        let mut tracker = ResolutionTracker::new();
        open_default(&mut tracker);
        let err = tracker
            .resolve(PHONE, &order(), CustomerAction::Reschedule, t0() + Duration::hours(2))
            .unwrap_err();
        assert_eq!(err.code(), "NDR-RES-001");
    }

    #[test]
    fn test_mark_escalated_and_phone_lookup() {
        let mut tracker = ResolutionTracker::new();
        open_default(&mut tracker);
        assert!(tracker.pending_for_phone(PHONE, t0()).is_some());

        let key = ResolutionKey::new(PHONE, order());
        assert!(tracker.mark_escalated(&key, t0()).is_err());

        let late = t0() + Duration::hours(3);
        assert!(tracker.pending_for_phone(PHONE, late).is_none());
        let escalated = tracker.mark_escalated(&key, late).unwrap();
        assert!(matches!(escalated.status, ResolutionStatus::Escalated { .. }));
        assert_eq!(tracker.pending_count(), 0);
        assert_eq!(tracker.list_expired(late).len(), 1);
    }
}
