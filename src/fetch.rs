//! One-shot detail fetching.
//!
//! Fetches complete through responders: the fetcher receives a responder per
//! request and resolves it whenever the response arrives. Resolution only
//! enqueues a [`FetchCompletion`]; the controller applies it on its next pump.

use crate::error::BoxError;
use crate::types::{Snapshot, TweetId};
use crossbeam_channel::Sender;

/// Identifies the session a request was issued for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub tweet_id: TweetId,
    /// Session epoch; bumped on every `enter`.
    pub epoch: u64,
}

/// Result carried by a completion.
#[derive(Debug)]
pub enum FetchOutcome {
    Object(Result<Snapshot, BoxError>),
    Replies(Result<Vec<Snapshot>, BoxError>),
}

/// A resolved fetch, waiting to be applied.
#[derive(Debug)]
pub struct FetchCompletion {
    pub ticket: FetchTicket,
    pub outcome: FetchOutcome,
}

/// Resolves one `fetch_object` request.
#[derive(Debug)]
pub struct ObjectResponder {
    ticket: FetchTicket,
    sender: Sender<FetchCompletion>,
}

impl ObjectResponder {
    pub(crate) fn new(ticket: FetchTicket, sender: Sender<FetchCompletion>) -> Self {
        Self { ticket, sender }
    }

    /// Tweet the request is for.
    pub fn tweet_id(&self) -> TweetId {
        self.ticket.tweet_id
    }

    pub fn resolve(self, result: Result<Snapshot, BoxError>) {
        // Controller gone: nobody left to apply it.
        let _ = self.sender.send(FetchCompletion {
            ticket: self.ticket,
            outcome: FetchOutcome::Object(result),
        });
    }
}

/// Resolves one `fetch_replies` request.
#[derive(Debug)]
pub struct RepliesResponder {
    ticket: FetchTicket,
    sender: Sender<FetchCompletion>,
}

impl RepliesResponder {
    pub(crate) fn new(ticket: FetchTicket, sender: Sender<FetchCompletion>) -> Self {
        Self { ticket, sender }
    }

    /// Tweet whose replies are requested.
    pub fn tweet_id(&self) -> TweetId {
        self.ticket.tweet_id
    }

    pub fn resolve(self, result: Result<Vec<Snapshot>, BoxError>) {
        let _ = self.sender.send(FetchCompletion {
            ticket: self.ticket,
            outcome: FetchOutcome::Replies(result),
        });
    }
}

/// Performs the initial point-in-time fetches of a detail session.
pub trait DetailFetcher {
    /// Request the full current state of a tweet.
    fn fetch_object(&self, responder: ObjectResponder);

    /// Request the reply feed of a tweet.
    fn fetch_replies(&self, responder: RepliesResponder);
}
