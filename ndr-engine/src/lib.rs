//! NDR Engine - async orchestration over `ndr-core`
//!
//! Wraps the synchronous domain components in shared state so the HTTP
//! surface and background sweeps can drive them concurrently:
//! - **Engine**: Order intake, classification, challenges, customer resolution
//! - **Ports**: `MessagingGateway` for outbound templates, `EventSink` for state changes
//! - **Clock**: Injected time source so expiry is testable
//! - **Keyed locks**: Serialize work per NDR record and per (phone, order)

pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod gateway;
pub mod locks;
pub mod query;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{AdjudicationResult, NdrEngine, ReplyOutcome};
pub use error::{EngineError, EngineResult};
pub use events::{EngineEvent, EventSink, RecordingSink, TracingSink};
pub use gateway::{MessagingGateway, MockMessagingGateway};
pub use locks::KeyedLocks;
pub use query::{EngineStats, QueryFilter, ResolutionStatusFilter};

/// NDR engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
