//! Membership persistence and its completion queue.
//!
//! A commit hands the store a [`CommitResponder`]; the store resolves it
//! whenever persistence finishes. Resolution only enqueues the outcome; the
//! editor applies it on its next pump.

use crate::error::BoxError;
use crate::types::{ListId, SubjectId};
use crossbeam_channel::Sender;
use std::sync::Arc;

use super::types::{Container, Subject};

/// Persists the new membership of a subject.
///
/// Receives the declarative set of lists that hold the subject after the
/// edit; lists the viewer owns but that are missing from it no longer hold
/// the subject. Implementations return immediately and resolve the
/// responder later.
pub trait MembershipStore {
    fn commit_tweet_membership(
        &self,
        tweet_id: SubjectId,
        lists: &[Arc<Container>],
        responder: CommitResponder,
    );

    fn commit_user_membership(
        &self,
        user_id: SubjectId,
        lists: &[Arc<Container>],
        responder: CommitResponder,
    );
}

/// A resolved commit, waiting to be applied.
#[derive(Debug)]
pub(crate) struct CommitCompletion {
    pub(crate) attempt: u64,
    pub(crate) result: Result<(), BoxError>,
}

/// Resolves one commit request.
#[derive(Debug)]
pub struct CommitResponder {
    attempt: u64,
    subject_id: SubjectId,
    sender: Sender<CommitCompletion>,
}

impl CommitResponder {
    pub(crate) fn new(attempt: u64, subject_id: SubjectId, sender: Sender<CommitCompletion>) -> Self {
        Self {
            attempt,
            subject_id,
            sender,
        }
    }

    /// Subject whose membership is being persisted.
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    pub fn resolve(self, result: Result<(), BoxError>) {
        // Editor closed: the outcome has no draft to land on.
        let _ = self.sender.send(CommitCompletion {
            attempt: self.attempt,
            result,
        });
    }
}

/// Returned by a successful commit; the hosting view may close.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitReceipt {
    pub subject: Subject,
    /// Lists sent with the commit, in draft order.
    pub lists: Vec<ListId>,
}

/// Where the editor's latest commit stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitState {
    Idle,
    /// Sent to the store, not yet resolved.
    Pending,
    Committed(CommitReceipt),
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_resolve_enqueues_completion() {
        let (tx, rx) = unbounded();
        let responder = CommitResponder::new(3, SubjectId(42), tx);
        assert_eq!(responder.subject_id(), SubjectId(42));

        responder.resolve(Err("timeout".into()));

        let completion = rx.try_recv().unwrap();
        assert_eq!(completion.attempt, 3);
        assert_eq!(completion.result.unwrap_err().to_string(), "timeout");
    }

    #[test]
    fn test_resolve_after_receiver_dropped() {
        let (tx, rx) = unbounded();
        let responder = CommitResponder::new(1, SubjectId(42), tx);
        drop(rx);

        responder.resolve(Ok(()));
    }
}
