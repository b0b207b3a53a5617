//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use agora_core::config::RealtimeConfig;
use agora_core::types::ConnectionId;

use crate::bridge::EventBridge;
use crate::connection::heartbeat::HeartbeatConfig;
use crate::connection::{ConnectionHandle, ConnectionPool, Frame};
use crate::error::RealtimeError;
use crate::metrics::RealtimeMetrics;
use crate::room::Registry;
use crate::router::EventRouter;

/// Central real-time engine that coordinates all WebSocket subsystems.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection/room registry.
    pub registry: Arc<Registry>,
    /// Open sockets and their outbound queues.
    pub pool: Arc<ConnectionPool>,
    /// Inbound dispatch and audience resolution.
    pub router: Arc<EventRouter>,
    /// Domain event bridge.
    pub bridge: Arc<EventBridge>,
    /// Metrics collector.
    pub metrics: Arc<RealtimeMetrics>,
    config: RealtimeConfig,
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("connections", &self.registry.connection_count())
            .field("rooms", &self.registry.room_count())
            .finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine with all subsystems.
    pub fn new(config: &RealtimeConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let metrics = Arc::new(RealtimeMetrics::new());
        let registry = Arc::new(Registry::new());
        let pool = Arc::new(ConnectionPool::new());
        let router = Arc::new(EventRouter::new(
            registry.clone(),
            pool.clone(),
            metrics.clone(),
            config,
        ));
        let bridge = Arc::new(EventBridge::new(router.clone()));

        info!(
            channel_buffer_size = config.channel_buffer_size,
            ping_interval_seconds = config.ping_interval_seconds,
            "Real-time engine initialized"
        );

        Self {
            registry,
            pool,
            router,
            bridge,
            metrics,
            config: config.clone(),
            shutdown_tx,
        }
    }

    /// Opens a connection: allocates its outbound queue and registers it.
    ///
    /// The returned receiver feeds the socket writer.
    pub fn open_connection(
        &self,
    ) -> Result<(Arc<ConnectionHandle>, mpsc::Receiver<Frame>), RealtimeError> {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(tx));
        self.pool.add(handle.clone());

        if let Err(e) = self.router.on_connect(handle.id) {
            self.pool.remove(&handle.id);
            handle.close();
            return Err(e);
        }
        Ok((handle, rx))
    }

    /// Closes a connection: drops its memberships, notifies rooms, and
    /// releases the socket. Idempotent.
    pub fn close_connection(&self, conn_id: &ConnectionId) {
        self.router.on_disconnect(*conn_id);
        if let Some(handle) = self.pool.remove(conn_id) {
            handle.close();
            debug!(conn_id = %conn_id, "Released connection handle");
        }
    }

    /// Heartbeat timing for new connections.
    pub fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig::from(&self.config)
    }

    /// Maximum inbound frame size in bytes.
    pub fn max_message_size(&self) -> usize {
        self.config.max_message_size
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown of the real-time engine.
    pub async fn shutdown(&self) {
        info!(
            connections = self.pool.connection_count(),
            "Shutting down real-time engine"
        );

        let _ = self.shutdown_tx.send(());
        // Unregister everyone first so no one is told about departing peers.
        let handles = self.pool.all_connections();
        for handle in &handles {
            self.router.forget(handle.id);
        }
        for handle in &handles {
            handle.close();
        }

        // Let socket writers flush their close frames.
        tokio::task::yield_now().await;
        info!("Real-time engine shut down");
    }
}
