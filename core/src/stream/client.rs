use crate::prelude::{ClientConfig, FeedError, FeedResult};
use crate::stream::buffer::SampleBuffer;
use crate::stream::debounce::AlertDebouncer;
use crate::stream::events::FeedEvent;
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::MetricsRecorder;
use crate::wire::{Credentials, Sample};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Transport = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection lifecycle states, owned exclusively by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

#[derive(Debug, Clone)]
enum Command {
    Connect(Credentials),
    Disconnect,
    SetExpectDisconnect(bool),
}

/// How a live connection ended.
enum SessionEnd {
    /// Deliberately closed; no reconnect.
    Expected,
    /// Unrequested drop; the reconnect loop takes over.
    Dropped,
    /// Every control handle is gone; the event loop winds down.
    Shutdown,
}

/// Cloneable control surface for a running [`StreamClient`].
#[derive(Clone)]
pub struct ClientHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl ClientHandle {
    /// Opens a session with the given credentials. Valid only while the
    /// client is disconnected; otherwise logged and ignored.
    pub fn connect(&self, credentials: Credentials) {
        self.commands.send(Command::Connect(credentials)).ok();
    }

    /// Deliberately ends the session: courtesy `"close"` notice, transport
    /// close, and cancellation of any pending reconnect. Idempotent.
    pub fn disconnect(&self) {
        self.commands.send(Command::Disconnect).ok();
    }

    /// Pre-arms expected-close handling for a close triggered through
    /// another path, e.g. a re-authentication flow about to reconnect.
    pub fn set_expect_disconnect(&self, expected: bool) {
        self.commands
            .send(Command::SetExpectDisconnect(expected))
            .ok();
    }
}

/// Owns the socket lifecycle: dial, authenticated handshake, per-frame
/// decode, fixed-delay reconnect on unrequested drops, and deliberate
/// disconnect. All state transitions and buffer mutations happen inside
/// this client's event loop.
pub struct StreamClient {
    config: ClientConfig,
    state: ConnectionState,
    credentials: Option<Credentials>,
    expect_disconnect: bool,
    buffer: SampleBuffer,
    debouncer: AlertDebouncer,
    events: mpsc::UnboundedSender<FeedEvent>,
    commands: mpsc::UnboundedReceiver<Command>,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl StreamClient {
    pub fn new(
        config: ClientConfig,
        buffer: SampleBuffer,
        events: mpsc::UnboundedSender<FeedEvent>,
    ) -> (Self, ClientHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let debouncer = AlertDebouncer::new(
            config.alert_threshold,
            Duration::from_millis(config.alert_cooldown_ms),
        );
        let client = Self {
            config,
            state: ConnectionState::Disconnected,
            credentials: None,
            expect_disconnect: false,
            buffer,
            debouncer,
            events,
            commands: command_rx,
            metrics: Arc::new(MetricsRecorder::new()),
            logger: LogManager::new(),
        };
        (
            client,
            ClientHandle {
                commands: command_tx,
            },
        )
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }

    /// Event loop entry point. Runs until every [`ClientHandle`] is dropped.
    pub async fn run(mut self) -> FeedResult<()> {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    None => return Ok(()),
                    Some(Command::Connect(credentials)) => {
                        if self.state != ConnectionState::Disconnected {
                            self.logger.warn("connect ignored: session already active");
                            continue;
                        }
                        self.credentials = Some(credentials);
                        self.run_session().await;
                    }
                    Some(Command::Disconnect) => {
                        // already disconnected: no-op
                    }
                    Some(Command::SetExpectDisconnect(expected)) => {
                        self.expect_disconnect = expected;
                    }
                },
                _ = alert_cooldown(self.debouncer.deadline()) => self.clear_due_alert(),
            }
        }
    }

    /// One session: dial, then hand the live connection to the frame loop.
    /// Unrequested drops re-dial with the captured credentials after the
    /// fixed delay until connected or deliberately disconnected.
    async fn run_session(&mut self) {
        loop {
            self.set_state(ConnectionState::Connecting);
            let url = self.config.url.clone();
            let end = match connect_async(url.as_str()).await {
                Ok((transport, _)) => self.drive_connection(transport).await,
                Err(err) => {
                    self.logger.warn(&format!("dialing {} failed: {}", url, err));
                    if self.expect_disconnect {
                        SessionEnd::Expected
                    } else {
                        SessionEnd::Dropped
                    }
                }
            };

            match end {
                SessionEnd::Expected | SessionEnd::Shutdown => {
                    self.set_state(ConnectionState::Disconnected);
                    self.emit(FeedEvent::ConnectionClosed);
                    return;
                }
                SessionEnd::Dropped => {
                    self.set_state(ConnectionState::Reconnecting);
                    self.metrics.record_reconnect();
                    if !self.await_reconnect_window().await {
                        self.set_state(ConnectionState::Disconnected);
                        self.emit(FeedEvent::ConnectionClosed);
                        return;
                    }
                }
            }
        }
    }

    /// Single-shot reconnect timer. Returns false when a deliberate
    /// disconnect (or full shutdown) cancelled the pending re-dial.
    async fn await_reconnect_window(&mut self) -> bool {
        let redial_at =
            tokio::time::Instant::now() + Duration::from_millis(self.config.reconnect_delay_ms);
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(redial_at) => return true,
                _ = alert_cooldown(self.debouncer.deadline()) => self.clear_due_alert(),
                command = self.commands.recv() => match command {
                    None | Some(Command::Disconnect) => return false,
                    Some(Command::SetExpectDisconnect(expected)) => {
                        self.expect_disconnect = expected;
                    }
                    Some(Command::Connect(_)) => {
                        self.logger.warn("connect ignored: reconnect already scheduled");
                    }
                },
            }
        }
    }

    async fn drive_connection(&mut self, mut transport: Transport) -> SessionEnd {
        // a single handshake message immediately after the transport opens
        match self.handshake_payload() {
            Ok(payload) => {
                if let Err(err) = transport.send(Message::Text(payload)).await {
                    self.logger.warn(&format!("handshake send failed: {}", err));
                    return SessionEnd::Dropped;
                }
            }
            Err(err) => {
                self.logger.warn(&format!("handshake unavailable: {}", err));
                return SessionEnd::Dropped;
            }
        }
        self.set_state(ConnectionState::Connected);
        self.emit(FeedEvent::ConnectionEstablished);

        loop {
            tokio::select! {
                inbound = transport.next() => match inbound {
                    Some(Ok(Message::Text(raw))) => {
                        self.on_frame(&raw, Instant::now(), wall_clock_ms());
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return self.close_outcome();
                    }
                    Some(Ok(_)) => {
                        // binary frames and ping/pong carry no telemetry
                    }
                    Some(Err(err)) => {
                        self.logger.warn(&format!("transport error: {}", err));
                        return self.close_outcome();
                    }
                },
                _ = alert_cooldown(self.debouncer.deadline()) => self.clear_due_alert(),
                command = self.commands.recv() => match command {
                    Some(Command::Disconnect) => {
                        self.close_transport(&mut transport).await;
                        return SessionEnd::Expected;
                    }
                    Some(Command::SetExpectDisconnect(expected)) => {
                        self.expect_disconnect = expected;
                    }
                    Some(Command::Connect(_)) => {
                        self.logger.warn("connect ignored: already connected");
                    }
                    None => {
                        self.close_transport(&mut transport).await;
                        return SessionEnd::Shutdown;
                    }
                },
            }
        }
    }

    /// Decodes one inbound frame while connected. Malformed frames are
    /// dropped without touching the buffer and never end the session.
    fn on_frame(&mut self, raw: &str, now: Instant, time_ms: f64) {
        match Sample::decode(raw, time_ms) {
            Ok(sample) => {
                self.buffer.append(sample.clone());
                self.metrics.record_sample();
                let raised = self.debouncer.evaluate(sample.accel_magnitude, now);
                self.emit(FeedEvent::SampleReceived(sample));
                if raised {
                    self.emit(FeedEvent::AlertRaised);
                }
            }
            Err(err) => {
                self.metrics.record_decode_error();
                self.logger.warn(&format!("decode failed: {}", err));
                self.emit(FeedEvent::DecodeError(raw.to_string()));
            }
        }
    }

    fn close_outcome(&self) -> SessionEnd {
        if self.expect_disconnect {
            SessionEnd::Expected
        } else {
            SessionEnd::Dropped
        }
    }

    async fn close_transport(&mut self, transport: &mut Transport) {
        self.expect_disconnect = true;
        // courtesy notice the gateway understands, then the protocol close
        if let Err(err) = transport.send(Message::Text("close".into())).await {
            self.logger.warn(&format!("close notice failed: {}", err));
        }
        if let Err(err) = transport.close(None).await {
            self.logger.warn(&format!("transport close failed: {}", err));
        }
    }

    fn clear_due_alert(&mut self) {
        if self.debouncer.expire_due(Instant::now()) {
            self.emit(FeedEvent::AlertCleared);
        }
    }

    fn handshake_payload(&self) -> FeedResult<String> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| FeedError::InvalidState("no credentials captured".into()))?;
        credentials.to_handshake()
    }

    fn set_state(&mut self, next: ConnectionState) {
        if self.state != next {
            self.logger
                .record(&format!("connection {:?} -> {:?}", self.state, next));
            self.state = next;
        }
    }

    fn emit(&self, event: FeedEvent) {
        self.logger.event(&event);
        self.events.send(event).ok();
    }
}

async fn alert_cooldown(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

fn wall_clock_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as f64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio::time::timeout;
    use tokio_tungstenite::accept_async;

    const GOOD_FRAME: &str = r#"{"ax": 1.0, "ay": 2.0, "az": 2.0, "oa": 0.0, "ob": 0.0, "og": 0.0}"#;
    const SHAKY_FRAME: &str = r#"{"ax": 30.0, "ay": 0.0, "az": 0.0, "oa": 0.0, "ob": 0.0, "og": 0.0}"#;
    const BAD_FRAME: &str = r#"{"ax": "wobble", "ay": 0, "az": 0, "oa": 0, "ob": 0, "og": 0}"#;

    fn test_credentials() -> Credentials {
        Credentials::new("tester@example.com", "1234")
    }

    fn test_client(
        url: String,
        reconnect_delay_ms: u64,
    ) -> (
        StreamClient,
        ClientHandle,
        mpsc::UnboundedReceiver<FeedEvent>,
        SampleBuffer,
    ) {
        let mut config = ClientConfig::with_url(url);
        config.reconnect_delay_ms = reconnect_delay_ms;
        config.alert_cooldown_ms = 100;
        let buffer = SampleBuffer::with_capacity(8);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (client, handle) = StreamClient::new(config, buffer.clone(), events_tx);
        (client, handle, events_rx, buffer)
    }

    async fn next_event(events: &mut mpsc::UnboundedReceiver<FeedEvent>) -> FeedEvent {
        timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    #[test]
    fn malformed_frame_leaves_buffer_and_state_untouched() {
        let (mut client, _handle, mut events, buffer) =
            test_client("ws://127.0.0.1:1/websocket".into(), 20);
        client.state = ConnectionState::Connected;

        client.on_frame(BAD_FRAME, Instant::now(), 0.0);

        assert_eq!(client.state(), ConnectionState::Connected);
        assert!(buffer.is_empty());
        assert_eq!(client.metrics().snapshot(), (0, 1, 0));
        match events.try_recv().unwrap() {
            FeedEvent::DecodeError(raw) => assert_eq!(raw, BAD_FRAME),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn decoded_frame_is_buffered_and_announced() {
        let (mut client, _handle, mut events, buffer) =
            test_client("ws://127.0.0.1:1/websocket".into(), 20);
        client.state = ConnectionState::Connected;

        client.on_frame(GOOD_FRAME, Instant::now(), 7.0);

        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.snapshot()[0].time, 7.0);
        match events.try_recv().unwrap() {
            FeedEvent::SampleReceived(sample) => {
                assert!((sample.accel_magnitude - 3.0).abs() < 1e-9);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn connected_session_streams_frames_until_disconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(stream).await.unwrap();
            let handshake = socket.next().await.unwrap().unwrap().into_text().unwrap();
            socket.send(Message::Text(GOOD_FRAME.into())).await.unwrap();
            socket.send(Message::Text(BAD_FRAME.into())).await.unwrap();
            socket.send(Message::Text(GOOD_FRAME.into())).await.unwrap();
            while let Some(Ok(message)) = socket.next().await {
                if message.is_text() && message.into_text().unwrap() == "close" {
                    break;
                }
            }
            handshake
        });

        let (client, handle, mut events, buffer) =
            test_client(format!("ws://{}/websocket", addr), 20);
        let task = tokio::spawn(client.run());
        handle.connect(test_credentials());

        assert_eq!(next_event(&mut events).await, FeedEvent::ConnectionEstablished);
        assert!(matches!(
            next_event(&mut events).await,
            FeedEvent::SampleReceived(_)
        ));
        assert!(matches!(
            next_event(&mut events).await,
            FeedEvent::DecodeError(_)
        ));
        assert!(matches!(
            next_event(&mut events).await,
            FeedEvent::SampleReceived(_)
        ));

        handle.disconnect();
        assert_eq!(next_event(&mut events).await, FeedEvent::ConnectionClosed);
        assert_eq!(buffer.len(), 2);

        let handshake = server.await.unwrap();
        let echoed = Credentials::from_handshake(&handshake).unwrap();
        assert_eq!(echoed, test_credentials());

        drop(handle);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn unrequested_drop_redials_once_with_captured_credentials() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            // first session: take the handshake, then drop without warning
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(stream).await.unwrap();
            let first = socket.next().await.unwrap().unwrap().into_text().unwrap();
            drop(socket);

            // the redial arrives with the same credentials
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(stream).await.unwrap();
            let second = socket.next().await.unwrap().unwrap().into_text().unwrap();
            while let Some(Ok(message)) = socket.next().await {
                if message.is_text() && message.into_text().unwrap() == "close" {
                    break;
                }
            }
            (first, second)
        });

        let (client, handle, mut events, _buffer) =
            test_client(format!("ws://{}/websocket", addr), 20);
        let metrics = client.metrics();
        let task = tokio::spawn(client.run());
        handle.connect(test_credentials());

        assert_eq!(next_event(&mut events).await, FeedEvent::ConnectionEstablished);
        assert_eq!(next_event(&mut events).await, FeedEvent::ConnectionEstablished);

        handle.disconnect();
        assert_eq!(next_event(&mut events).await, FeedEvent::ConnectionClosed);

        let (first, second) = server.await.unwrap();
        assert_eq!(first, second);
        assert_eq!(metrics.snapshot().2, 1);

        drop(handle);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn explicit_disconnect_cancels_pending_reconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(stream).await.unwrap();
            let _ = socket.next().await;
            drop(socket);
            // a redial after the deliberate disconnect would show up here
            timeout(Duration::from_millis(250), listener.accept())
                .await
                .is_err()
        });

        let (client, handle, mut events, _buffer) =
            test_client(format!("ws://{}/websocket", addr), 500);
        let task = tokio::spawn(client.run());
        handle.connect(test_credentials());

        assert_eq!(next_event(&mut events).await, FeedEvent::ConnectionEstablished);
        // the drop lands the client in its reconnect window; cancel it there
        handle.disconnect();
        assert_eq!(next_event(&mut events).await, FeedEvent::ConnectionClosed);

        assert!(server.await.unwrap(), "reconnect fired after disconnect");

        drop(handle);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn vibration_alert_raises_once_and_clears_after_cooldown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(stream).await.unwrap();
            let _ = socket.next().await;
            socket.send(Message::Text(SHAKY_FRAME.into())).await.unwrap();
            socket.send(Message::Text(SHAKY_FRAME.into())).await.unwrap();
            while let Some(Ok(message)) = socket.next().await {
                if message.is_text() && message.into_text().unwrap() == "close" {
                    break;
                }
            }
        });

        let (client, handle, mut events, _buffer) =
            test_client(format!("ws://{}/websocket", addr), 20);
        let task = tokio::spawn(client.run());
        handle.connect(test_credentials());

        assert_eq!(next_event(&mut events).await, FeedEvent::ConnectionEstablished);
        assert!(matches!(
            next_event(&mut events).await,
            FeedEvent::SampleReceived(_)
        ));
        assert_eq!(next_event(&mut events).await, FeedEvent::AlertRaised);
        // the second shaky frame is suppressed by the cooldown
        assert!(matches!(
            next_event(&mut events).await,
            FeedEvent::SampleReceived(_)
        ));
        assert_eq!(next_event(&mut events).await, FeedEvent::AlertCleared);

        handle.disconnect();
        assert_eq!(next_event(&mut events).await, FeedEvent::ConnectionClosed);

        server.await.unwrap();
        drop(handle);
        task.await.unwrap().unwrap();
    }
}
