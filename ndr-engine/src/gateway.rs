//! Messaging Gateway Port
//!
//! The engine hands template keys to the gateway; rendering and transport
//! (WhatsApp, SMS) live behind the trait.

use async_trait::async_trait;
use ndr_core::{mask_phone, NotificationRequest};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Outbound messaging transport
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send a templated message, returning the transport message id
    async fn send(&self, request: NotificationRequest) -> EngineResult<String>;
}

/// Mock gateway for testing and local runs
#[derive(Debug, Default)]
pub struct MockMessagingGateway {
    sent: RwLock<Vec<NotificationRequest>>,
    next_id: AtomicU64,
    failing: AtomicBool,
}

impl MockMessagingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Requests accepted so far, in send order
    pub async fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl MessagingGateway for MockMessagingGateway {
    async fn send(&self, request: NotificationRequest) -> EngineResult<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EngineError::gateway(format!(
                "mock gateway rejected message to {}",
                mask_phone(&request.phone)
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let message_id = format!("mock-msg-{}", id);
        debug!(
            "Mock gateway: {} -> {} ({})",
            request.template,
            mask_phone(&request.phone),
            message_id
        );
        self.sent.write().await.push(request);
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndr_core::{OrderId, TemplateKey};

    #[tokio::test]
    async fn test_mock_gateway_records_sends() {
        let gateway = MockMessagingGateway::new();
        let id = gateway
            .send(NotificationRequest::new(
                Some(OrderId::new("ORD-1")),
                "+919876543210",
                TemplateKey::NdrResolutionOptions,
            ))
            .await
            .unwrap();

        assert_eq!(id, "mock-msg-1");
        assert_eq!(gateway.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_gateway_failure() {
        let gateway = MockMessagingGateway::new();
        gateway.set_failing(true);
        let err = gateway
            .send(NotificationRequest::new(None, "+919876543210", TemplateKey::Help))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(gateway.sent().await.is_empty());
    }
}
