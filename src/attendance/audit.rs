//! Audit sinks.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::models::AuditEvent;

/// Port receiving one event per state machine decision.
///
/// A failing sink never rolls back an accepted transition; callers log the
/// failure and carry on.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Records an event.
    async fn record(&self, event: AuditEvent) -> EngineResult<()>;
}

/// Writes audit events to the `audit` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) -> EngineResult<()> {
        let metadata = serde_json::to_string(&event.metadata).map_err(|e| {
            EngineError::Transient {
                message: format!("failed to encode audit metadata: {}", e),
            }
        })?;
        info!(
            target: "audit",
            event_id = %event.id,
            action = ?event.action,
            entity_type = %event.entity_type,
            entity_id = %event.entity_id,
            actor_id = %event.actor_id,
            timestamp = %event.timestamp,
            metadata = %metadata,
            "attendance decision"
        );
        Ok(())
    }
}

/// Keeps audit events in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded event, oldest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> EngineResult<()> {
        let mut events = self.events.lock().map_err(|_| EngineError::Transient {
            message: "audit log lock poisoned".to_string(),
        })?;
        events.push(event);
        Ok(())
    }
}
