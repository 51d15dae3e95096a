//! Push-channel subscription for the viewed tweet.
//!
//! At most one subscription is live at a time. Its lifecycle is
//! `Idle -> Connecting -> Subscribed -> Idle`; there is no automatic
//! reconnect. Events flow from the transport adapter through a bounded
//! channel and are drained without blocking:
//!
//! ```ignore
//! let mut manager = SubscriptionManager::new(Box::new(transport), SubscriptionConfig::default());
//! manager.open(TweetId(7))?;
//!
//! // On every turn of the host's event loop
//! for delta in manager.pump() {
//!     snapshot = merge(&snapshot, &delta)?;
//! }
//!
//! manager.close();
//! ```

mod manager;
mod types;

pub use manager::SubscriptionManager;
pub use types::{
    DropReason, EventSink, SubscriptionConfig, SubscriptionId, SubscriptionInfo,
    SubscriptionState, TransportEvent,
};
