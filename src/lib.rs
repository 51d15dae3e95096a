//! # Tweet Sync
//!
//! Keeps a local view of one tweet consistent while it is mutated by the
//! local user and by others at the same time.
//!
//! ## Core Concepts
//!
//! - **Snapshot**: Point-in-time state of the viewed tweet, fetched once
//! - **Delta**: Partial update pushed on the tweet's topic, merged field-wise
//! - **Subscription**: The single live push subscription for the viewed tweet
//! - **Draft**: Local, reversible edits of which lists hold a tweet or user
//!
//! Transport, fetching and persistence are collaborators behind the
//! [`Transport`], [`DetailFetcher`] and [`MembershipStore`] traits.
//!
//! ## Example
//!
//! ```ignore
//! use tweet_sync::{DetailController, SyncConfig, TweetId};
//!
//! let mut controller = DetailController::new(
//!     SyncConfig::default(),
//!     Box::new(transport),
//!     Box::new(fetcher),
//! )?;
//!
//! controller.enter(TweetId(7));
//!
//! // On every turn of the host's event loop
//! if controller.pump().changed() {
//!     render(controller.view());
//! }
//!
//! controller.exit();
//! ```

pub mod config;
pub mod detail;
pub mod error;
pub mod fetch;
pub mod membership;
pub mod reconcile;
pub mod subscriptions;
pub mod transport;
pub mod types;

// Re-exports
pub use config::SyncConfig;
pub use detail::{DetailController, DetailStatus, DetailView, PumpReport, ReplyFeed};
pub use error::{BoxError, Result, SyncError};
pub use fetch::{
    DetailFetcher, FetchCompletion, FetchOutcome, FetchTicket, ObjectResponder, RepliesResponder,
};
pub use membership::{
    CommitReceipt, CommitResponder, CommitState, Container, DraftEntry, MemberSet,
    MembershipChanges, MembershipEditor, MembershipStore, Subject, SubjectKind,
};
pub use reconcile::{decode_delta, merge, merge_all, FrameEncoding};
pub use subscriptions::{
    DropReason, EventSink, SubscriptionConfig, SubscriptionId, SubscriptionInfo,
    SubscriptionManager, SubscriptionState, TransportEvent,
};
pub use transport::{Connection, Transport};
pub use types::*;
