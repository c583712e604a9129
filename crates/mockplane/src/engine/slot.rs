//! Atomically swappable reference to the currently connected engine.

use super::EngineGateway;
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// An engine that is currently connected.
pub struct ConnectedEngine {
    pub engine_id: String,
    pub connected_at: DateTime<Utc>,
    pub gateway: Arc<dyn EngineGateway>,
}

/// Holder for the connected engine, if any.
///
/// Connect and disconnect swap the pointer; readers take a snapshot and are
/// never blocked by a concurrent swap.
#[derive(Default)]
pub struct EngineSlot {
    current: ArcSwapOption<ConnectedEngine>,
}

impl EngineSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot with an engine already connected
    pub fn connected(engine_id: impl Into<String>, gateway: Arc<dyn EngineGateway>) -> Self {
        let slot = Self::new();
        slot.connect(engine_id, gateway);
        slot
    }

    /// Connect (or replace) the engine. The engine is expected to pull the full
    /// mock set from the store on connect; notifications missed while it was
    /// away are not replayed.
    pub fn connect(&self, engine_id: impl Into<String>, gateway: Arc<dyn EngineGateway>) {
        let engine_id = engine_id.into();
        info!(engine_id = %engine_id, "Engine connected");
        self.current.store(Some(Arc::new(ConnectedEngine {
            engine_id,
            connected_at: Utc::now(),
            gateway,
        })));
    }

    /// Disconnect the current engine, returning it if there was one
    pub fn disconnect(&self) -> Option<Arc<ConnectedEngine>> {
        let previous = self.current.swap(None);
        if let Some(engine) = &previous {
            info!(engine_id = %engine.engine_id, "Engine disconnected");
        }
        previous
    }

    /// Snapshot of the connected engine
    pub fn current(&self) -> Option<Arc<ConnectedEngine>> {
        self.current.load_full()
    }

    /// Gateway of the connected engine
    pub fn gateway(&self) -> Option<Arc<dyn EngineGateway>> {
        self.current().map(|engine| Arc::clone(&engine.gateway))
    }

    pub fn is_connected(&self) -> bool {
        self.current.load().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, EngineStatus};
    use crate::mock::Mock;
    use async_trait::async_trait;

    struct NullEngine;

    #[async_trait]
    impl EngineGateway for NullEngine {
        async fn create_mock(&self, _mock: &Mock) -> Result<(), EngineError> {
            Ok(())
        }
        async fn update_mock(&self, _id: &str, _mock: &Mock) -> Result<(), EngineError> {
            Ok(())
        }
        async fn delete_mock(&self, _id: &str) -> Result<(), EngineError> {
            Ok(())
        }
        async fn get_mock(&self, id: &str) -> Result<Mock, EngineError> {
            Err(EngineError::NotFound(id.to_string()))
        }
        async fn list_mocks(&self) -> Result<Vec<Mock>, EngineError> {
            Ok(vec![])
        }
        async fn status(&self) -> Result<EngineStatus, EngineError> {
            Ok(EngineStatus::default())
        }
    }

    #[test]
    fn test_slot_connect_and_disconnect() {
        let slot = EngineSlot::new();
        assert!(!slot.is_connected());
        assert!(slot.gateway().is_none());

        slot.connect("engine-1", Arc::new(NullEngine));
        assert!(slot.is_connected());
        assert_eq!(slot.current().unwrap().engine_id, "engine-1");

        slot.connect("engine-2", Arc::new(NullEngine));
        assert_eq!(slot.current().unwrap().engine_id, "engine-2");

        let previous = slot.disconnect().unwrap();
        assert_eq!(previous.engine_id, "engine-2");
        assert!(!slot.is_connected());
        assert!(slot.disconnect().is_none());
    }

    #[test]
    fn test_snapshot_survives_disconnect() {
        let slot = EngineSlot::connected("engine-1", Arc::new(NullEngine));
        let snapshot = slot.current().unwrap();
        slot.disconnect();
        assert_eq!(snapshot.engine_id, "engine-1");
    }
}
