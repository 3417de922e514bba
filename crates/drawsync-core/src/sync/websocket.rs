//! WebSocket client for the relay.
//!
//! The socket lives on a background thread; the session drains what it
//! received through [`SyncChannel::poll_remote`] on its own thread.

use super::{ConnectionState, SyncChannel, SyncError, decode_message, encode_operation, preview};
use crate::operation::{DrawOperation, DrawingEvent};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tungstenite::{Message, connect};
use url::Url;

/// Commands sent to the WebSocket thread.
enum WsCommand {
    Send(String),
    Close,
}

/// Events sent from the WebSocket thread.
#[derive(Debug)]
enum WsEvent {
    Connected,
    Disconnected,
    Drawing(DrawingEvent),
    Error(String),
}

/// Relay client over a WebSocket.
///
/// Publishes issued before the connection is up are queued on the command
/// channel and sent once it is.
pub struct WebSocketChannel {
    state: ConnectionState,
    /// Channel to send commands to the WebSocket thread.
    cmd_tx: Option<Sender<WsCommand>>,
    /// Channel to receive events from the WebSocket thread.
    event_rx: Option<Receiver<WsEvent>>,
    /// Handle to the WebSocket thread.
    _thread: Option<JoinHandle<()>>,
}

impl WebSocketChannel {
    /// Create a new disconnected client.
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            cmd_tx: None,
            event_rx: None,
            _thread: None,
        }
    }

    /// Create a client and start connecting to `url`.
    pub fn connect_to(url: &str) -> Result<Self, SyncError> {
        let mut channel = Self::new();
        channel.connect(url)?;
        Ok(channel)
    }

    /// Start connecting to a relay (`ws://` or `wss://`).
    pub fn connect(&mut self, url: &str) -> Result<(), SyncError> {
        if self.cmd_tx.is_some() {
            return Err(SyncError::AlreadyConnected);
        }

        let parsed_url = Url::parse(url).map_err(|e| SyncError::InvalidUrl(e.to_string()))?;
        if parsed_url.scheme() != "ws" && parsed_url.scheme() != "wss" {
            return Err(SyncError::InvalidUrl(format!(
                "unsupported scheme: {}",
                parsed_url.scheme()
            )));
        }

        self.state = ConnectionState::Connecting;

        let (cmd_tx, cmd_rx) = channel::<WsCommand>();
        let (event_tx, event_rx) = channel::<WsEvent>();
        let url = url.to_string();

        let handle = thread::spawn(move || run_socket(&url, cmd_rx, event_tx));

        self.cmd_tx = Some(cmd_tx);
        self.event_rx = Some(event_rx);
        self._thread = Some(handle);

        Ok(())
    }

    /// Disconnect from the relay.
    pub fn disconnect(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(WsCommand::Close);
        }
        self.event_rx = None;
        self._thread = None;
        self.state = ConnectionState::Disconnected;
    }

    /// Get current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }
}

impl Default for WebSocketChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WebSocketChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl SyncChannel for WebSocketChannel {
    fn publish(&mut self, op: &DrawOperation) -> Result<(), SyncError> {
        let tx = self.cmd_tx.as_ref().ok_or(SyncError::NotConnected)?;
        let text = encode_operation(op)?;
        tx.send(WsCommand::Send(text))
            .map_err(|e| SyncError::Send(e.to_string()))
    }

    fn poll_remote(&mut self) -> Vec<DrawingEvent> {
        let mut drawings = Vec::new();
        let Some(rx) = self.event_rx.as_ref() else {
            return drawings;
        };
        while let Ok(event) = rx.try_recv() {
            match event {
                WsEvent::Connected => {
                    log::info!("Relay connected");
                    self.state = ConnectionState::Connected;
                }
                WsEvent::Disconnected => {
                    log::info!("Relay disconnected");
                    self.state = ConnectionState::Disconnected;
                }
                WsEvent::Error(message) => {
                    log::warn!("Relay error: {}", message);
                    self.state = ConnectionState::Error;
                }
                WsEvent::Drawing(drawing) => drawings.push(drawing),
            }
        }
        drawings
    }
}

fn run_socket(url: &str, cmd_rx: Receiver<WsCommand>, event_tx: Sender<WsEvent>) {
    log::info!("WebSocket thread: connecting to {}", url);

    let (mut socket, response) = match connect(url) {
        Ok(pair) => pair,
        Err(e) => {
            log::error!("WebSocket connection failed: {}", e);
            let _ = event_tx.send(WsEvent::Error(format!("Connection failed: {}", e)));
            return;
        }
    };
    log::info!("WebSocket connected, status: {}", response.status());
    let _ = event_tx.send(WsEvent::Connected);

    // Short read timeout so outgoing commands are not starved by a quiet relay
    match socket.get_mut() {
        tungstenite::stream::MaybeTlsStream::Plain(tcp) => {
            let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
            let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
        }
        #[allow(unreachable_patterns)]
        _ => {
            log::debug!("TLS or other stream - using default timeout handling");
        }
    }

    'session: loop {
        // Flush everything queued since the last read
        loop {
            match cmd_rx.try_recv() {
                Ok(WsCommand::Send(text)) => {
                    log::trace!("WebSocket sending: {}", preview(&text));
                    if let Err(e) = socket.send(Message::Text(text)) {
                        log::error!("WebSocket send error: {}", e);
                        break 'session;
                    }
                }
                Ok(WsCommand::Close) => {
                    log::info!("WebSocket close requested");
                    let _ = socket.close(None);
                    break 'session;
                }
                Err(TryRecvError::Disconnected) => {
                    log::info!("WebSocket command channel disconnected");
                    break 'session;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                log::trace!("WebSocket received: {}", preview(&text));
                if let Some(drawing) = decode_message(&text) {
                    if event_tx.send(WsEvent::Drawing(drawing)).is_err() {
                        break 'session;
                    }
                }
            }
            Ok(Message::Ping(data)) => {
                let _ = socket.send(Message::Pong(data));
            }
            Ok(Message::Close(_)) => {
                log::info!("WebSocket received close frame");
                break 'session;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => {
                log::error!("WebSocket read error: {}", e);
                break 'session;
            }
        }
    }

    log::info!("WebSocket thread exiting");
    let _ = event_tx.send(WsEvent::Disconnected);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::StrokeStyle;
    use kurbo::Point;
    use std::net::TcpListener;
    use std::time::Instant;

    #[test]
    fn test_rejects_non_websocket_url() {
        let mut channel = WebSocketChannel::new();
        assert!(matches!(
            channel.connect("http://localhost:3030"),
            Err(SyncError::InvalidUrl(_))
        ));
        assert!(matches!(channel.connect("not a url"), Err(SyncError::InvalidUrl(_))));
        assert_eq!(channel.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_publish_without_connection_fails() {
        let mut channel = WebSocketChannel::new();
        let op = DrawOperation::segment(Point::ZERO, Point::new(1.0, 1.0), StrokeStyle::default());
        assert!(matches!(channel.publish(&op), Err(SyncError::NotConnected)));
        assert!(channel.poll_remote().is_empty());
    }

    #[test]
    fn test_unreachable_relay_reports_error() {
        // Port 9 (discard) on loopback is closed on test machines
        let mut channel = WebSocketChannel::connect_to("ws://127.0.0.1:9").unwrap();
        assert_eq!(channel.state(), ConnectionState::Connecting);

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while channel.state() == ConnectionState::Connecting && std::time::Instant::now() < deadline {
            assert!(channel.poll_remote().is_empty());
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(channel.state(), ConnectionState::Error);
    }

    #[test]
    fn test_queued_segments_are_flushed_together() {
        const SEGMENTS: usize = 40;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (received_tx, received_rx) = channel();

        let relay = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut socket = tungstenite::accept(stream).unwrap();
            let mut received = 0;
            while received < SEGMENTS {
                if let Message::Text(text) = socket.read().unwrap() {
                    assert!(decode_message(&text).is_some());
                    received += 1;
                }
            }
            received_tx.send(received).unwrap();

            let reply = DrawOperation::segment(
                Point::new(7.0, 7.0),
                Point::new(8.0, 8.0),
                StrokeStyle::default(),
            );
            socket
                .send(Message::Text(encode_operation(&reply).unwrap()))
                .unwrap();
            while let Ok(message) = socket.read() {
                if message.is_close() {
                    break;
                }
            }
        });

        let started = Instant::now();
        let mut client = WebSocketChannel::connect_to(&format!("ws://{}", addr)).unwrap();
        for i in 0..SEGMENTS {
            let x = i as f64;
            let op = DrawOperation::segment(
                Point::new(x, 0.0),
                Point::new(x + 1.0, 0.0),
                StrokeStyle::default(),
            );
            client.publish(&op).unwrap();
        }

        let received = received_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(received, SEGMENTS);
        assert!(started.elapsed() < Duration::from_secs(1));

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut remote = Vec::new();
        while remote.is_empty() && Instant::now() < deadline {
            remote.extend(client.poll_remote());
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(remote.len(), 1);
        assert_eq!(client.state(), ConnectionState::Connected);

        client.disconnect();
        relay.join().unwrap();
    }
}
