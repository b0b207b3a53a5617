//! Event router: turns transport callbacks into registry operations and
//! resolves the audience of every outbound event.
//!
//! Inbound handlers and producers meet here. Registry failures go back to
//! the originating connection as an `error` event and never affect other
//! connections. Delivery failures during a fan-out are logged and skipped;
//! they never roll back the state change that triggered the broadcast.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use agora_core::config::RealtimeConfig;
use agora_core::types::ConnectionId;

use crate::error::{DeliveryError, RealtimeError};
use crate::message::serializer::deserialize_inbound;
use crate::message::types::{InboundMessage, OutboundEvent};
use crate::message::validator::{require_payload, require_room, validate_frame};
use crate::metrics::RealtimeMetrics;
use crate::room::registry::Registry;
use crate::transport::Transport;

/// Dispatches inbound client events and outbound broadcasts.
#[derive(Debug)]
pub struct EventRouter {
    /// Membership state.
    registry: Arc<Registry>,
    /// Per-connection send primitive.
    transport: Arc<dyn Transport>,
    /// Metrics.
    metrics: Arc<RealtimeMetrics>,
    /// Maximum inbound frame size in bytes.
    max_message_size: usize,
    /// Maximum room name length in bytes.
    max_room_name_length: usize,
}

impl EventRouter {
    /// Creates a router over a registry and a transport.
    pub fn new(
        registry: Arc<Registry>,
        transport: Arc<dyn Transport>,
        metrics: Arc<RealtimeMetrics>,
        config: &RealtimeConfig,
    ) -> Self {
        Self {
            registry,
            transport,
            metrics,
            max_message_size: config.max_message_size,
            max_room_name_length: config.max_room_name_length,
        }
    }

    /// Returns the registry this router mutates.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Transport callback: a connection was opened.
    pub fn on_connect(&self, conn_id: ConnectionId) -> Result<(), RealtimeError> {
        match self.registry.register(conn_id) {
            Ok(()) => {
                self.metrics.connection_opened();
                info!(conn_id = %conn_id, "Client connected");
                Ok(())
            }
            Err(e) => {
                error!(conn_id = %conn_id, error = %e, "Rejected duplicate connection identity");
                self.reject(conn_id, &e, None);
                Err(e)
            }
        }
    }

    /// Transport callback: a connection went away.
    ///
    /// Removes every membership in one registry step, then tells the
    /// remaining members of each former room. Safe to call more than once.
    pub fn on_disconnect(&self, conn_id: ConnectionId) {
        let Some(record) = self.registry.unregister(&conn_id) else {
            debug!(conn_id = %conn_id, "Disconnect for unregistered connection");
            return;
        };
        self.metrics.connection_closed();

        let mut rooms: Vec<String> = record.rooms.into_iter().collect();
        rooms.sort();
        for room in &rooms {
            self.send_to_room(room, None, &OutboundEvent::user_left(conn_id, room));
        }

        info!(conn_id = %conn_id, rooms_left = ?rooms, "Client disconnected");
    }

    /// Unregisters a connection without announcing `userLeft` to its rooms.
    ///
    /// Used on shutdown, where every peer is going away as well.
    pub fn forget(&self, conn_id: ConnectionId) -> bool {
        let forgotten = self.registry.unregister(&conn_id).is_some();
        if forgotten {
            self.metrics.connection_closed();
        }
        forgotten
    }

    /// Decodes one inbound text frame and dispatches it.
    pub fn handle_inbound(&self, conn_id: ConnectionId, raw: &str) -> Result<(), RealtimeError> {
        self.metrics.message_received();

        let parsed = validate_frame(raw, self.max_message_size).and_then(|()| {
            deserialize_inbound(raw)
                .map_err(|e| RealtimeError::invalid(format!("malformed frame: {e}")))
        });

        match parsed {
            Ok(InboundMessage::JoinRoom { room }) => {
                self.handle_join(conn_id, room.as_deref().unwrap_or_default())
            }
            Ok(InboundMessage::LeaveRoom { room }) => {
                self.handle_leave(conn_id, room.as_deref().unwrap_or_default())
            }
            Ok(InboundMessage::Message { room, message }) => {
                self.handle_message(conn_id, room.as_deref(), message.as_ref())
            }
            Err(e) => {
                self.reject(conn_id, &e, None);
                Err(e)
            }
        }
    }

    /// Joins `room` and tells its other members.
    ///
    /// Re-joining a room is a silent no-op.
    pub fn handle_join(&self, conn_id: ConnectionId, room: &str) -> Result<(), RealtimeError> {
        let joined = require_room(Some(room), self.max_room_name_length)
            .and_then(|room| self.registry.join(&conn_id, room));

        match joined {
            Ok(true) => {
                self.metrics.joined();
                let members = self.registry.members_of(room);
                info!(
                    conn_id = %conn_id,
                    room = %room,
                    room_size = members.len(),
                    "Client joined room"
                );
                let others: Vec<ConnectionId> =
                    members.into_iter().filter(|id| *id != conn_id).collect();
                self.fan_out(&others, &OutboundEvent::user_joined(conn_id, room));
                Ok(())
            }
            Ok(false) => {
                debug!(conn_id = %conn_id, room = %room, "Already a member of room");
                Ok(())
            }
            Err(e) => {
                self.reject(conn_id, &e, Some(room).filter(|r| !r.is_empty()));
                Err(e)
            }
        }
    }

    /// Leaves `room` and tells its remaining members.
    ///
    /// Leaving a room that was not joined is a silent no-op.
    pub fn handle_leave(&self, conn_id: ConnectionId, room: &str) -> Result<(), RealtimeError> {
        let left = require_room(Some(room), self.max_room_name_length)
            .and_then(|room| self.registry.leave(&conn_id, room));

        match left {
            Ok(true) => {
                info!(conn_id = %conn_id, room = %room, "Client left room");
                self.send_to_room(room, None, &OutboundEvent::user_left(conn_id, room));
                Ok(())
            }
            Ok(false) => {
                debug!(conn_id = %conn_id, room = %room, "Leave for room not joined");
                Ok(())
            }
            Err(e) => {
                self.reject(conn_id, &e, Some(room).filter(|r| !r.is_empty()));
                Err(e)
            }
        }
    }

    /// Relays a message to every other current member of `room`.
    ///
    /// The sender must be a member. The audience is the membership
    /// snapshot taken at delivery time.
    pub fn handle_message(
        &self,
        conn_id: ConnectionId,
        room: Option<&str>,
        payload: Option<&Value>,
    ) -> Result<(), RealtimeError> {
        match self.check_message(conn_id, room, payload) {
            Ok((room, payload)) => {
                let delivered = self.send_to_room(
                    room,
                    Some(conn_id),
                    &OutboundEvent::message(conn_id, room, payload.clone()),
                );
                debug!(
                    conn_id = %conn_id,
                    room = %room,
                    delivered,
                    "Broadcast message to room"
                );
                Ok(())
            }
            Err(e) => {
                self.reject(conn_id, &e, room.filter(|r| !r.is_empty()));
                Err(e)
            }
        }
    }

    fn check_message<'a>(
        &self,
        conn_id: ConnectionId,
        room: Option<&'a str>,
        payload: Option<&'a Value>,
    ) -> Result<(&'a str, &'a Value), RealtimeError> {
        let room = require_room(room, self.max_room_name_length)?;
        let payload = require_payload(payload)?;

        if !self.registry.rooms_of(&conn_id)?.contains(room) {
            return Err(RealtimeError::NotAMember(room.to_string()));
        }
        Ok((room, payload))
    }

    /// Producer API: deliver an event to every current member of `room`.
    ///
    /// Returns the number of recipients reached; zero if the room is empty.
    pub fn broadcast_to_room(&self, room: &str, event: &OutboundEvent) -> usize {
        let delivered = self.send_to_room(room, None, event);
        debug!(room = %room, event = event.name(), delivered, "Room broadcast");
        delivered
    }

    /// Producer API: deliver an event to every registered connection.
    pub fn broadcast_to_all(&self, event: &OutboundEvent) -> usize {
        let delivered = self.send_to_all(event);
        info!(event = event.name(), delivered, "Global broadcast");
        delivered
    }

    /// Delivers one event to one connection. Returns whether it was handed off.
    pub fn send_to(&self, conn_id: ConnectionId, event: &OutboundEvent) -> bool {
        self.fan_out(&[conn_id], event) == 1
    }

    /// Delivers to every current member of `room` except `exclude`.
    pub fn send_to_room(
        &self,
        room: &str,
        exclude: Option<ConnectionId>,
        event: &OutboundEvent,
    ) -> usize {
        let recipients: Vec<ConnectionId> = self
            .registry
            .members_of(room)
            .into_iter()
            .filter(|id| Some(*id) != exclude)
            .collect();
        self.fan_out(&recipients, event)
    }

    /// Delivers to every registered connection.
    pub fn send_to_all(&self, event: &OutboundEvent) -> usize {
        let recipients = self.registry.connected();
        self.fan_out(&recipients, event)
    }

    fn fan_out(&self, recipients: &[ConnectionId], event: &OutboundEvent) -> usize {
        if recipients.is_empty() {
            return 0;
        }

        let report = self.transport.send_many(recipients, event);
        for (conn_id, e) in &report.failed {
            match e {
                // Already on its way out; its own disconnect will clean up.
                DeliveryError::Closed(_) => debug!(
                    conn_id = %conn_id,
                    event = event.name(),
                    "Dropped event for closed recipient"
                ),
                _ => warn!(
                    conn_id = %conn_id,
                    event = event.name(),
                    error = %e,
                    "Dropped event for unreachable recipient"
                ),
            }
        }
        self.metrics.delivery(report.delivered, report.failed.len());
        report.delivered
    }

    fn reject(&self, conn_id: ConnectionId, err: &RealtimeError, room: Option<&str>) {
        warn!(
            conn_id = %conn_id,
            code = err.code(),
            error = %err,
            "Rejected client request"
        );
        self.metrics.error_reported();
        self.send_to(conn_id, &OutboundEvent::error(err, room));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use serde_json::json;

    #[derive(Debug, Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(ConnectionId, OutboundEvent)>>,
        unreachable: Mutex<HashSet<ConnectionId>>,
    }

    impl RecordingTransport {
        fn events_for(&self, conn_id: ConnectionId) -> Vec<OutboundEvent> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|(id, _)| *id == conn_id)
                .map(|(_, e)| e.clone())
                .collect()
        }

        fn recipients(&self) -> HashSet<ConnectionId> {
            self.sent.lock().unwrap().iter().map(|(id, _)| *id).collect()
        }

        fn clear(&self) {
            self.sent.lock().unwrap().clear();
        }

        fn cut(&self, conn_id: ConnectionId) {
            self.unreachable.lock().unwrap().insert(conn_id);
        }
    }

    impl Transport for RecordingTransport {
        fn send_to(
            &self,
            conn_id: ConnectionId,
            event: &OutboundEvent,
        ) -> Result<(), DeliveryError> {
            if self.unreachable.lock().unwrap().contains(&conn_id) {
                return Err(DeliveryError::Closed(conn_id));
            }
            self.sent.lock().unwrap().push((conn_id, event.clone()));
            Ok(())
        }
    }

    fn setup() -> (EventRouter, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let router = EventRouter::new(
            Arc::new(Registry::new()),
            transport.clone(),
            Arc::new(RealtimeMetrics::new()),
            &RealtimeConfig::default(),
        );
        (router, transport)
    }

    fn connect(router: &EventRouter) -> ConnectionId {
        let id = ConnectionId::new();
        router.on_connect(id).unwrap();
        id
    }

    fn error_code(event: &OutboundEvent) -> Option<&str> {
        match event {
            OutboundEvent::Error { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_second_joiner_is_announced_to_first() {
        let (router, transport) = setup();
        let a = connect(&router);
        router.handle_join(a, "topic1").unwrap();
        let b = connect(&router);
        router.handle_join(b, "topic1").unwrap();

        assert_eq!(router.registry().members_of("topic1"), HashSet::from([a, b]));

        let to_a = transport.events_for(a);
        assert_eq!(to_a.len(), 1);
        assert!(matches!(
            &to_a[0],
            OutboundEvent::UserJoined { socket_id, room, .. } if *socket_id == b && room == "topic1"
        ));
        assert!(transport.events_for(b).is_empty());
    }

    #[test]
    fn test_rejoin_does_not_reannounce() {
        let (router, transport) = setup();
        let a = connect(&router);
        let b = connect(&router);
        router.handle_join(a, "topic1").unwrap();
        router.handle_join(b, "topic1").unwrap();
        transport.clear();

        router.handle_join(b, "topic1").unwrap();

        assert!(transport.events_for(a).is_empty());
        assert_eq!(router.registry().members_of("topic1").len(), 2);
    }

    #[test]
    fn test_message_reaches_other_members_only() {
        let (router, transport) = setup();
        let a = connect(&router);
        let b = connect(&router);
        let c = connect(&router);
        let outsider = connect(&router);
        for id in [a, b, c] {
            router.handle_join(id, "topic1").unwrap();
        }
        router.handle_join(outsider, "topic2").unwrap();
        transport.clear();

        router
            .handle_message(a, Some("topic1"), Some(&json!("hello")))
            .unwrap();

        assert_eq!(transport.recipients(), HashSet::from([b, c]));
        for id in [b, c] {
            let events = transport.events_for(id);
            assert!(matches!(
                &events[..],
                [OutboundEvent::Message { socket_id, message, .. }]
                    if *socket_id == a && *message == json!("hello")
            ));
        }
    }

    #[test]
    fn test_non_member_message_is_refused_privately() {
        let (router, transport) = setup();
        let a = connect(&router);
        let b = connect(&router);
        router.handle_join(b, "topic1").unwrap();
        transport.clear();

        let err = router
            .handle_message(a, Some("topic1"), Some(&json!("sneaky")))
            .unwrap_err();

        assert_eq!(err, RealtimeError::NotAMember("topic1".into()));
        assert_eq!(transport.recipients(), HashSet::from([a]));
        assert_eq!(error_code(&transport.events_for(a)[0]), Some("NOT_A_MEMBER"));
    }

    #[test]
    fn test_message_missing_fields_is_invalid() {
        let (router, transport) = setup();
        let a = connect(&router);
        router.handle_join(a, "topic1").unwrap();

        let missing_payload = router.handle_message(a, Some("topic1"), None);
        let empty_room = router.handle_message(a, Some(""), Some(&json!("hi")));
        let missing_room = router.handle_message(a, None, Some(&json!("hi")));

        for result in [missing_payload, empty_room, missing_room] {
            assert!(matches!(result, Err(RealtimeError::InvalidMessage(_))));
        }
        let codes: Vec<_> = transport
            .events_for(a)
            .iter()
            .filter_map(|e| error_code(e).map(str::to_string))
            .collect();
        assert_eq!(codes, vec!["INVALID_MESSAGE"; 3]);
    }

    #[test]
    fn test_leave_notifies_remaining_members_once() {
        let (router, transport) = setup();
        let a = connect(&router);
        let b = connect(&router);
        router.handle_join(a, "topic1").unwrap();
        router.handle_join(b, "topic1").unwrap();
        transport.clear();

        router.handle_leave(a, "topic1").unwrap();
        router.handle_leave(a, "topic1").unwrap();

        let to_b = transport.events_for(b);
        assert_eq!(to_b.len(), 1);
        assert!(matches!(&to_b[0], OutboundEvent::UserLeft { socket_id, .. } if *socket_id == a));
        assert!(transport.events_for(a).is_empty());
    }

    #[test]
    fn test_disconnect_cleans_rooms_and_notifies() {
        let (router, transport) = setup();
        let a = connect(&router);
        let b = connect(&router);
        router.handle_join(a, "topic1").unwrap();
        router.handle_join(a, "topic2").unwrap();
        router.handle_join(b, "topic1").unwrap();
        transport.clear();

        router.on_disconnect(a);

        let registry = router.registry();
        assert_eq!(registry.members_of("topic1"), HashSet::from([b]));
        assert_eq!(registry.active_rooms(), vec!["topic1"]);
        assert!(registry.is_consistent());
        assert!(matches!(
            &transport.events_for(b)[..],
            [OutboundEvent::UserLeft { socket_id, room, .. }] if *socket_id == a && room == "topic1"
        ));

        router.on_disconnect(a);
        assert_eq!(transport.events_for(b).len(), 1);
    }

    #[test]
    fn test_requests_after_disconnect_are_unknown() {
        let (router, transport) = setup();
        let a = connect(&router);
        router.on_disconnect(a);

        assert_eq!(
            router.handle_join(a, "topic1"),
            Err(RealtimeError::UnknownConnection(a))
        );
        assert!(router.registry().active_rooms().is_empty());
        assert_eq!(
            error_code(&transport.events_for(a)[0]),
            Some("UNKNOWN_CONNECTION")
        );
    }

    #[test]
    fn test_duplicate_connect_is_reported() {
        let (router, transport) = setup();
        let a = connect(&router);

        assert_eq!(router.on_connect(a), Err(RealtimeError::DuplicateIdentity(a)));
        assert_eq!(router.registry().connection_count(), 1);
        assert_eq!(
            error_code(&transport.events_for(a)[0]),
            Some("DUPLICATE_IDENTITY")
        );
    }

    #[test]
    fn test_broadcast_to_all_ignores_rooms() {
        let (router, transport) = setup();
        let ids: Vec<_> = (0..3).map(|_| connect(&router)).collect();
        router.handle_join(ids[0], "topic1").unwrap();
        router.handle_join(ids[1], "topic2").unwrap();
        transport.clear();

        let event = OutboundEvent::NewPrompt { topic: "X".into() };
        assert_eq!(router.broadcast_to_all(&event), 3);

        for id in ids {
            assert_eq!(transport.events_for(id), vec![event.clone()]);
        }
    }

    #[test]
    fn test_broadcast_to_empty_room_is_noop() {
        let (router, transport) = setup();
        connect(&router);

        let event = OutboundEvent::NewPrompt { topic: "X".into() };
        assert_eq!(router.broadcast_to_room("nobody-here", &event), 0);
        assert!(transport.recipients().is_empty());
        assert!(router.registry().active_rooms().is_empty());
    }

    #[test]
    fn test_unreachable_recipient_does_not_block_others() {
        let (router, transport) = setup();
        let a = connect(&router);
        let b = connect(&router);
        let c = connect(&router);
        for id in [a, b, c] {
            router.handle_join(id, "topic1").unwrap();
        }
        transport.clear();
        transport.cut(b);

        router
            .handle_message(a, Some("topic1"), Some(&json!("hello")))
            .unwrap();

        assert_eq!(transport.recipients(), HashSet::from([c]));
        assert_eq!(router.registry().members_of("topic1").len(), 3);
        assert_eq!(router.metrics.snapshot().delivery_failures, 1);
    }

    #[test]
    fn test_inbound_frames_are_dispatched() {
        let (router, transport) = setup();
        let a = connect(&router);
        let b = connect(&router);

        router
            .handle_inbound(a, r#"{"type":"joinRoom","room":"topic1"}"#)
            .unwrap();
        router
            .handle_inbound(b, r#"{"type":"joinRoom","room":"topic1"}"#)
            .unwrap();
        transport.clear();

        router
            .handle_inbound(b, r#"{"type":"message","room":"topic1","message":"hi"}"#)
            .unwrap();
        router
            .handle_inbound(b, r#"{"type":"leaveRoom","room":"topic1"}"#)
            .unwrap();

        let to_a = transport.events_for(a);
        assert_eq!(to_a.len(), 2);
        assert_eq!(to_a[0].name(), "message");
        assert_eq!(to_a[1].name(), "userLeft");
    }

    #[test]
    fn test_malformed_frames_are_rejected() {
        let (router, transport) = setup();
        let a = connect(&router);

        for raw in [
            "not json",
            r#"{"type":"teleport"}"#,
            r#"{"type":"joinRoom"}"#,
            "",
        ] {
            assert!(matches!(
                router.handle_inbound(a, raw),
                Err(RealtimeError::InvalidMessage(_))
            ));
        }
        assert_eq!(transport.events_for(a).len(), 4);
        assert!(router.registry().active_rooms().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_connections_keep_registry_consistent() {
        let (router, _transport) = setup();
        let router = Arc::new(router);
        let rooms = ["topic1", "topic2", "topic3"];

        let tasks: Vec<_> = (0..32)
            .map(|n| {
                let router = Arc::clone(&router);
                tokio::spawn(async move {
                    let id = ConnectionId::new();
                    router.on_connect(id).unwrap();
                    for room in rooms.iter().take(1 + n % rooms.len()) {
                        router.handle_join(id, room).unwrap();
                        tokio::task::yield_now().await;
                    }
                    router
                        .handle_message(id, Some("topic1"), Some(&json!(n)))
                        .unwrap();
                    if n % 2 == 0 {
                        router.handle_leave(id, "topic1").unwrap();
                        router.on_disconnect(id);
                    }
                    id
                })
            })
            .collect();

        let mut survivors = HashSet::new();
        for (n, task) in tasks.into_iter().enumerate() {
            let id = task.await.unwrap();
            if n % 2 == 1 {
                survivors.insert(id);
            }
        }

        let registry = router.registry();
        assert!(registry.is_consistent());
        assert_eq!(registry.connected().into_iter().collect::<HashSet<_>>(), survivors);
        assert_eq!(registry.members_of("topic1"), survivors);
    }

    #[test]
    fn test_forget_drops_membership_without_announcing() {
        let (router, transport) = setup();
        let a = connect(&router);
        let b = connect(&router);
        router.handle_join(a, "topic1").unwrap();
        router.handle_join(b, "topic1").unwrap();
        transport.clear();

        assert!(router.forget(a));
        assert!(!router.forget(a));
        router.on_disconnect(a);

        assert!(transport.events_for(b).is_empty());
        assert_eq!(router.registry().members_of("topic1"), HashSet::from([b]));
        assert!(router.registry().is_consistent());
        assert_eq!(router.metrics.snapshot().connections_active, 1);
    }
}
