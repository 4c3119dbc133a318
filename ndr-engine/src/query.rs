//! Read-side filters and summaries

use chrono::{DateTime, Utc};
use ndr_core::{ReportingWindow, ResolutionStatus, SellerId};
use serde::{Deserialize, Serialize};

/// Filter for read-only queries
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub seller_id: Option<SellerId>,
    pub window: Option<ReportingWindow>,
}

impl QueryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_seller(seller_id: SellerId) -> Self {
        Self {
            seller_id: Some(seller_id),
            window: None,
        }
    }

    pub fn with_window(mut self, window: ReportingWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn matches_seller(&self, seller_id: &SellerId) -> bool {
        self.seller_id.as_ref().map_or(true, |s| s == seller_id)
    }

    pub fn in_window(&self, ts: &DateTime<Utc>) -> bool {
        self.window.as_ref().map_or(true, |w| w.contains(ts))
    }
}

/// Status filter for resolution window listings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatusFilter {
    Pending,
    Resolved,
    Escalated,
}

impl ResolutionStatusFilter {
    pub fn matches(&self, status: &ResolutionStatus) -> bool {
        matches!(
            (self, status),
            (ResolutionStatusFilter::Pending, ResolutionStatus::Pending)
                | (ResolutionStatusFilter::Resolved, ResolutionStatus::Resolved { .. })
                | (ResolutionStatusFilter::Escalated, ResolutionStatus::Escalated { .. })
        )
    }
}

/// Engine statistics
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub orders: usize,
    pub attempts: usize,
    /// Every record version in the ledger
    pub ndr_records: usize,
    /// Records not superseded
    pub current_records: usize,
    pub open_challenges: usize,
    pub pending_resolutions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_filter_matching() {
        let now = Utc::now();
        let filter = QueryFilter::for_seller(SellerId::new("SELLER-1"))
            .with_window(ReportingWindow::new(now - Duration::days(7), now));

        assert!(filter.matches_seller(&SellerId::new("SELLER-1")));
        assert!(!filter.matches_seller(&SellerId::new("SELLER-2")));
        assert!(filter.in_window(&(now - Duration::days(1))));
        assert!(!filter.in_window(&(now - Duration::days(8))));

        let open = QueryFilter::all();
        assert!(open.matches_seller(&SellerId::new("anyone")));
        assert!(open.in_window(&(now - Duration::days(365))));
    }

    #[test]
    fn test_resolution_status_filter() {
        let escalated = ResolutionStatus::Escalated {
            escalated_at: Utc::now(),
        };
        assert!(ResolutionStatusFilter::Pending.matches(&ResolutionStatus::Pending));
        assert!(!ResolutionStatusFilter::Pending.matches(&escalated));
        assert!(ResolutionStatusFilter::Escalated.matches(&escalated));

        let parsed: ResolutionStatusFilter = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, ResolutionStatusFilter::Pending);
    }
}
