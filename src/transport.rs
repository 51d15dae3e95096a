//! Streaming transport collaborator.
//!
//! The adapter owns the actual connection (websocket, STOMP, ...). It pushes
//! everything it observes into the [`EventSink`] it was handed on connect;
//! the subscription manager drains the other end without blocking.

use crate::error::BoxError;
use crate::subscriptions::EventSink;
use crate::types::Topic;

/// Opens streaming connections.
pub trait Transport {
    /// Start connecting to `endpoint`.
    ///
    /// Returns immediately; the adapter reports `TransportEvent::Connected`
    /// through `sink` once the connection is usable.
    fn connect(&self, endpoint: &str, sink: EventSink) -> Result<Box<dyn Connection>, BoxError>;
}

/// An open (or opening) streaming connection.
pub trait Connection {
    /// Subscribe to a topic; its messages arrive as `TransportEvent::Message`.
    fn subscribe(&mut self, topic: &Topic) -> Result<(), BoxError>;

    /// Close the connection. Must be idempotent.
    fn disconnect(&mut self);
}
