//! Subscription types for the push channel.

use crate::config::SyncConfig;
use crate::reconcile::FrameEncoding;
use crate::types::{Topic, TweetId};
use crossbeam_channel::{Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Configuration for the subscription manager.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Endpoint handed to `Transport::connect`.
    pub endpoint: String,

    /// Prefix for per-tweet topics.
    pub topic_prefix: String,

    /// Max buffered events before the subscription is dropped.
    /// Default: 1000
    pub buffer_size: usize,

    /// Encoding of message bodies.
    pub frame_encoding: FrameEncoding,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        SyncConfig::default().subscription()
    }
}

/// Lifecycle of the manager's single subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionState {
    Idle,
    /// Connect requested, waiting for the transport to confirm.
    Connecting,
    /// Topic subscribed; messages are decoded into deltas.
    Subscribed,
}

/// What a transport adapter reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connection is usable; the manager subscribes its topic.
    Connected,

    /// A raw frame for `topic`.
    Message { topic: Topic, body: Vec<u8> },

    /// Connection lost or closed by the peer.
    Disconnected { reason: Option<String> },
}

/// Why the subscription went back to idle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// Explicitly closed (view exit or a different tweet opened).
    Closed,
    /// The transport reported a disconnect or dropped its sink.
    ConnectionLost(Option<String>),
    /// Event buffer overflowed (slow consumer).
    BufferOverflow,
    /// The transport refused the topic subscription.
    SubscribeFailed(String),
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Sending half handed to a transport adapter on connect.
///
/// Each subscription gets its own sink; once the subscription is closed,
/// delivery fails and the adapter may stop producing.
#[derive(Clone, Debug)]
pub struct EventSink {
    sender: Sender<TransportEvent>,
    overflowed: Arc<AtomicBool>,
}

impl EventSink {
    pub(crate) fn new(sender: Sender<TransportEvent>, overflowed: Arc<AtomicBool>) -> Self {
        Self { sender, overflowed }
    }

    /// Deliver an event. Returns false if the subscription is gone or its
    /// buffer is full; a full buffer drops the subscription.
    pub fn deliver(&self, event: TransportEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.overflowed.store(true, Ordering::SeqCst);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Convenience for delivering a message frame.
    pub fn message(&self, topic: &Topic, body: impl Into<Vec<u8>>) -> bool {
        self.deliver(TransportEvent::Message {
            topic: topic.clone(),
            body: body.into(),
        })
    }
}

/// Snapshot of the active subscription, for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionInfo {
    pub id: SubscriptionId,
    pub tweet_id: TweetId,
    pub topic: Topic,
    pub state: SubscriptionState,
}
