//! Subscription manager owning the single live push subscription.

use crate::error::{Result, SyncError};
use crate::reconcile::decode_delta;
use crate::transport::{Connection, Transport};
use crate::types::{Delta, Topic, TweetId};
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::types::{
    DropReason, EventSink, SubscriptionConfig, SubscriptionId, SubscriptionInfo,
    SubscriptionState, TransportEvent,
};

/// Internal subscription state.
struct ActiveSubscription {
    id: SubscriptionId,
    tweet_id: TweetId,
    topic: Topic,
    state: SubscriptionState,
    connection: Box<dyn Connection>,
    receiver: Receiver<TransportEvent>,
    /// Set by the sink when a delivery hit a full buffer.
    overflowed: Arc<AtomicBool>,
}

/// Owns the connection and subscription for the currently viewed tweet.
///
/// The connection handle lives here, not in ambient scope, so independent
/// managers never share a channel.
pub struct SubscriptionManager {
    transport: Box<dyn Transport>,
    config: SubscriptionConfig,
    next_id: u64,
    active: Option<ActiveSubscription>,
    last_drop: Option<DropReason>,
}

impl SubscriptionManager {
    /// Create a new subscription manager.
    pub fn new(transport: Box<dyn Transport>, config: SubscriptionConfig) -> Self {
        Self {
            transport,
            config,
            next_id: 1,
            active: None,
            last_drop: None,
        }
    }

    /// Open the subscription for `tweet_id`.
    ///
    /// Opening the tweet that is already active is a no-op. Any other active
    /// subscription is closed first, so at most one is ever live.
    pub fn open(&mut self, tweet_id: TweetId) -> Result<SubscriptionId> {
        if let Some(active) = &self.active {
            if active.tweet_id == tweet_id {
                return Ok(active.id);
            }
        }
        self.close();

        let topic = Topic::for_tweet(&self.config.topic_prefix, tweet_id);
        let (sender, receiver) = bounded(self.config.buffer_size);
        let overflowed = Arc::new(AtomicBool::new(false));
        let sink = EventSink::new(sender, Arc::clone(&overflowed));

        let connection = self
            .transport
            .connect(&self.config.endpoint, sink)
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        info!(tweet_id = %tweet_id, topic = %topic, "opening subscription");

        self.active = Some(ActiveSubscription {
            id,
            tweet_id,
            topic,
            state: SubscriptionState::Connecting,
            connection,
            receiver,
            overflowed,
        });
        self.last_drop = None;

        Ok(id)
    }

    /// Tear down the current subscription, if any.
    pub fn close(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.connection.disconnect();
            info!(tweet_id = %active.tweet_id, topic = %active.topic, "closed subscription");
            self.last_drop = Some(DropReason::Closed);
        }
    }

    /// Drain pending transport events without blocking.
    ///
    /// Returns the decoded deltas for the active topic in arrival order.
    /// Malformed frames and frames for other topics are dropped.
    pub fn pump(&mut self) -> Vec<Delta> {
        let mut deltas = Vec::new();
        let encoding = self.config.frame_encoding;

        let Some(active) = self.active.as_mut() else {
            return deltas;
        };

        let mut dropped = None;
        loop {
            let event = match active.receiver.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    dropped = Some(DropReason::ConnectionLost(None));
                    break;
                }
            };

            match event {
                TransportEvent::Connected => {
                    if active.state != SubscriptionState::Connecting {
                        debug!(topic = %active.topic, "ignoring repeated connect");
                        continue;
                    }
                    match active.connection.subscribe(&active.topic) {
                        Ok(()) => {
                            active.state = SubscriptionState::Subscribed;
                            info!(tweet_id = %active.tweet_id, topic = %active.topic, "subscribed");
                        }
                        Err(e) => {
                            dropped = Some(DropReason::SubscribeFailed(e.to_string()));
                            break;
                        }
                    }
                }

                TransportEvent::Message { topic, body } => {
                    if active.state != SubscriptionState::Subscribed {
                        debug!(topic = %topic, "dropping frame received before subscribe");
                        continue;
                    }
                    if topic != active.topic {
                        debug!(topic = %topic, active = %active.topic, "dropping frame for foreign topic");
                        continue;
                    }
                    match decode_delta(&body, encoding) {
                        Ok(delta) => deltas.push(delta),
                        Err(e) => warn!(topic = %topic, error = %e, "dropping malformed delta"),
                    }
                }

                TransportEvent::Disconnected { reason } => {
                    dropped = Some(DropReason::ConnectionLost(reason));
                    break;
                }
            }
        }

        if dropped.is_none() && active.overflowed.load(Ordering::SeqCst) {
            dropped = Some(DropReason::BufferOverflow);
        }

        if let Some(reason) = dropped {
            self.drop_active(reason);
        }

        deltas
    }

    fn drop_active(&mut self, reason: DropReason) {
        if let Some(mut active) = self.active.take() {
            active.connection.disconnect();
            warn!(tweet_id = %active.tweet_id, topic = %active.topic, reason = ?reason, "subscription dropped");
            self.last_drop = Some(reason);
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SubscriptionState {
        self.active
            .as_ref()
            .map(|a| a.state)
            .unwrap_or(SubscriptionState::Idle)
    }

    /// Tweet the live subscription belongs to.
    pub fn active_tweet(&self) -> Option<TweetId> {
        self.active.as_ref().map(|a| a.tweet_id)
    }

    pub fn info(&self) -> Option<SubscriptionInfo> {
        self.active.as_ref().map(|a| SubscriptionInfo {
            id: a.id,
            tweet_id: a.tweet_id,
            topic: a.topic.clone(),
            state: a.state,
        })
    }

    /// Why the last subscription ended (cleared by the next `open`).
    pub fn last_drop(&self) -> Option<&DropReason> {
        self.last_drop.as_ref()
    }

    pub fn config(&self) -> &SubscriptionConfig {
        &self.config
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        self.close();
    }
}
