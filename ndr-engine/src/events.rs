//! Engine Events
//!
//! Every state change is published to an [`EventSink`], the hand-off point
//! for whatever persistence the deployment uses.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ndr_core::{
    ChallengeId, ChallengeStatus, CustomerAction, EventCode, NdrRecordId, OrderId, VerdictKind,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::EngineResult;

/// State change emitted by the engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    OrderRegistered {
        order_id: OrderId,
    },
    AttemptRecorded {
        order_id: OrderId,
        sequence: u32,
        event_code: EventCode,
    },
    ProofSubmitted {
        order_id: OrderId,
        sequence: u32,
    },
    NdrRecorded {
        ndr_id: NdrRecordId,
        order_id: OrderId,
        verdict: VerdictKind,
        supersedes: Option<NdrRecordId>,
    },
    ChallengeUpdated {
        challenge_id: ChallengeId,
        ndr_id: NdrRecordId,
        status: ChallengeStatus,
    },
    ResolutionOpened {
        order_id: OrderId,
        expires_at: DateTime<Utc>,
    },
    ResolutionResolved {
        order_id: OrderId,
        action: CustomerAction,
    },
    ResolutionEscalated {
        order_id: OrderId,
        expired_at: DateTime<Utc>,
    },
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::OrderRegistered { .. } => "order_registered",
            EngineEvent::AttemptRecorded { .. } => "attempt_recorded",
            EngineEvent::ProofSubmitted { .. } => "proof_submitted",
            EngineEvent::NdrRecorded { .. } => "ndr_recorded",
            EngineEvent::ChallengeUpdated { .. } => "challenge_updated",
            EngineEvent::ResolutionOpened { .. } => "resolution_opened",
            EngineEvent::ResolutionResolved { .. } => "resolution_resolved",
            EngineEvent::ResolutionEscalated { .. } => "resolution_escalated",
        }
    }
}

/// Event hand-off
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: EngineEvent) -> EngineResult<()>;
}

/// Sink that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl EventSink for TracingSink {
    async fn publish(&self, event: EngineEvent) -> EngineResult<()> {
        debug!(event = event.name(), "engine event: {:?}", event);
        Ok(())
    }
}

/// In-memory sink, keeps every event
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: RwLock<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<EngineEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn publish(&self, event: EngineEvent) -> EngineResult<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}
