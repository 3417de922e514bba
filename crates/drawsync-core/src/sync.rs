//! Publish/subscribe channel for drawing operations.
//!
//! A channel publishes local operations to every other participant and hands
//! back the operations other participants published. Nothing here orders,
//! acknowledges or deduplicates: the broker behind a channel is a plain
//! fan-out relay.

mod hub;
mod websocket;

pub use hub::{HubChannel, LocalHub};
pub use websocket::WebSocketChannel;

use crate::operation::{DrawOperation, DrawingEvent};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the single channel every participant of a session shares.
pub const DRAWING_CHANNEL: &str = "drawing";

/// Channel errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Not connected")]
    NotConnected,
    #[error("Already connected")]
    AlreadyConnected,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Send failed: {0}")]
    Send(String),
}

/// Messages exchanged with the relay, one per operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    /// A drawing operation on the shared channel.
    Drawing(DrawingEvent),
}

/// Encode an operation as a relay text frame.
pub fn encode_operation(op: &DrawOperation) -> Result<String, SyncError> {
    let message = WireMessage::Drawing(DrawingEvent::from(op));
    Ok(serde_json::to_string(&message)?)
}

/// Decode a relay text frame. Frames that are not drawing messages yield `None`.
pub fn decode_message(text: &str) -> Option<DrawingEvent> {
    match serde_json::from_str::<WireMessage>(text) {
        Ok(WireMessage::Drawing(event)) => Some(event),
        Err(e) => {
            log::debug!("Ignoring undecodable frame ({}): {}", e, preview(text));
            None
        }
    }
}

/// First 100 characters of a frame, for logging.
pub(crate) fn preview(text: &str) -> &str {
    match text.char_indices().nth(100) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Client side of the shared drawing channel.
pub trait SyncChannel {
    /// Send a local operation to every other participant.
    ///
    /// There is no acknowledgment; an error only means the operation could
    /// not be handed to the transport.
    fn publish(&mut self, op: &DrawOperation) -> Result<(), SyncError>;

    /// Take the events delivered since the last call, in transport order.
    ///
    /// Never includes this participant's own publications.
    fn poll_remote(&mut self) -> Vec<DrawingEvent>;

    /// Invoke `handler` once per delivered event, in transport order.
    fn drain_remote(&mut self, handler: &mut dyn FnMut(DrawingEvent)) {
        for event in self.poll_remote() {
            handler(event);
        }
    }
}

impl<C: SyncChannel + ?Sized> SyncChannel for Box<C> {
    fn publish(&mut self, op: &DrawOperation) -> Result<(), SyncError> {
        (**self).publish(op)
    }

    fn poll_remote(&mut self) -> Vec<DrawingEvent> {
        (**self).poll_remote()
    }
}

/// A channel connected to nobody: publishes go nowhere, nothing arrives.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineChannel;

impl SyncChannel for OfflineChannel {
    fn publish(&mut self, _op: &DrawOperation) -> Result<(), SyncError> {
        Ok(())
    }

    fn poll_remote(&mut self) -> Vec<DrawingEvent> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{ShapeKind, StrokeStyle};
    use kurbo::Point;

    #[test]
    fn test_wire_message_is_tagged_flat_object() {
        let op = DrawOperation::shape(
            ShapeKind::Line,
            Point::new(1.0, 2.0),
            Point::new(3.0, 4.0),
            StrokeStyle::default(),
        );
        let text = encode_operation(&op).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["type"], DRAWING_CHANNEL);
        assert_eq!(json["shape"], "line");
        assert_eq!(json["x1"], 3.0);
    }

    #[test]
    fn test_decode_message() {
        let text = r#"{"type":"drawing","x0":0,"y0":0,"x1":5,"y1":0,"color":"black","lineWidth":2,"opacity":1,"brushType":"normal"}"#;
        let event = decode_message(text).unwrap();
        let op = DrawOperation::try_from(event).unwrap();
        assert_eq!(op.endpoints(), (Point::new(0.0, 0.0), Point::new(5.0, 0.0)));
    }

    #[test]
    fn test_decode_ignores_other_frames() {
        assert!(decode_message(r#"{"type":"presence","user":"x"}"#).is_none());
        assert!(decode_message("not json").is_none());
    }

    #[test]
    fn test_offline_channel() {
        let mut channel = OfflineChannel;
        let op = DrawOperation::segment(Point::ZERO, Point::new(1.0, 0.0), StrokeStyle::default());
        channel.publish(&op).unwrap();
        assert!(channel.poll_remote().is_empty());
    }
}
