//! Detail view controller tying fetch, subscription and merge together.

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::fetch::{
    DetailFetcher, FetchCompletion, FetchOutcome, FetchTicket, ObjectResponder, RepliesResponder,
};
use crate::membership::Subject;
use crate::reconcile::merge;
use crate::subscriptions::{SubscriptionManager, SubscriptionState};
use crate::transport::Transport;
use crate::types::{Delta, Snapshot, TweetId};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Load state of the viewed tweet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DetailStatus {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// Load state of the reply feed.
#[derive(Clone, Debug, PartialEq)]
pub enum ReplyFeed {
    Idle,
    Loading,
    Loaded(Arc<[Snapshot]>),
    Failed(String),
}

/// What a pump did, so the render layer knows whether to repaint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Fetch responses applied to the live session.
    pub fetches_applied: usize,
    /// Deltas merged into the snapshot.
    pub deltas_applied: usize,
    /// Deltas refused by the merge (foreign id).
    pub deltas_rejected: usize,
    /// Responses for superseded sessions.
    pub stale_discarded: usize,
}

impl PumpReport {
    pub fn changed(&self) -> bool {
        self.fetches_applied > 0 || self.deltas_applied > 0
    }
}

/// Read-only projection for the render layer.
#[derive(Clone, Debug)]
pub struct DetailView {
    pub tweet_id: Option<TweetId>,
    pub status: DetailStatus,
    pub snapshot: Option<Arc<Snapshot>>,
    pub replies: ReplyFeed,
}

/// State owned by one `enter`..`exit` session.
struct Session {
    ticket: FetchTicket,
    status: DetailStatus,
    snapshot: Option<Arc<Snapshot>>,
    replies: ReplyFeed,
}

/// Sequences fetch -> subscribe -> replies for the viewed tweet.
///
/// Exactly one session is live at a time. Fetch responses come back through
/// a completion queue and are checked against the live session before they
/// are applied; pushed deltas are merged in arrival order.
pub struct DetailController {
    fetcher: Box<dyn DetailFetcher>,
    subscriptions: SubscriptionManager,
    completions_tx: Sender<FetchCompletion>,
    completions_rx: Receiver<FetchCompletion>,
    /// Last issued session epoch.
    epoch: u64,
    session: Option<Session>,
}

impl DetailController {
    /// Create a controller.
    pub fn new(
        config: SyncConfig,
        transport: Box<dyn Transport>,
        fetcher: Box<dyn DetailFetcher>,
    ) -> Result<Self> {
        config.validate()?;
        let (completions_tx, completions_rx) = unbounded();

        Ok(Self {
            fetcher,
            subscriptions: SubscriptionManager::new(transport, config.subscription()),
            completions_tx,
            completions_rx,
            epoch: 0,
            session: None,
        })
    }

    // --- Session Lifecycle ---

    /// Start viewing a tweet.
    ///
    /// A live session is torn down first; nothing from it carries over.
    pub fn enter(&mut self, tweet_id: TweetId) {
        if self.session.is_some() {
            self.exit();
        }

        self.epoch += 1;
        let ticket = FetchTicket {
            tweet_id,
            epoch: self.epoch,
        };

        info!(tweet_id = %tweet_id, epoch = ticket.epoch, "entering detail view");

        self.session = Some(Session {
            ticket,
            status: DetailStatus::Loading,
            snapshot: None,
            replies: ReplyFeed::Idle,
        });

        self.fetcher
            .fetch_object(ObjectResponder::new(ticket, self.completions_tx.clone()));
    }

    /// Stop viewing: close the subscription, then clear local state.
    pub fn exit(&mut self) {
        self.subscriptions.close();
        if let Some(session) = self.session.take() {
            info!(tweet_id = %session.ticket.tweet_id, epoch = session.ticket.epoch, "left detail view");
        }
    }

    /// Apply everything that arrived since the last pump.
    ///
    /// Fetch completions are applied first, then pushed deltas.
    pub fn pump(&mut self) -> PumpReport {
        let mut report = PumpReport::default();

        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply_completion(completion, &mut report);
        }

        for delta in self.subscriptions.pump() {
            self.apply_delta(delta, &mut report);
        }

        report
    }

    // --- Completions ---

    fn is_live(&self, ticket: FetchTicket) -> bool {
        self.session
            .as_ref()
            .map(|s| s.ticket == ticket)
            .unwrap_or(false)
    }

    fn apply_completion(&mut self, completion: FetchCompletion, report: &mut PumpReport) {
        let FetchCompletion { ticket, outcome } = completion;

        if !self.is_live(ticket) {
            debug!(
                error = %SyncError::StaleResponse(ticket.tweet_id),
                epoch = ticket.epoch,
                "discarding response"
            );
            report.stale_discarded += 1;
            return;
        }

        match outcome {
            FetchOutcome::Object(Ok(snapshot)) => self.on_object_loaded(ticket, snapshot, report),
            FetchOutcome::Object(Err(e)) => {
                let error = SyncError::FetchFailed {
                    id: ticket.tweet_id,
                    reason: e.to_string(),
                };
                warn!(error = %error, "detail fetch failed");
                if let Some(session) = self.session.as_mut() {
                    session.status = DetailStatus::Failed(error.to_string());
                }
                report.fetches_applied += 1;
            }
            FetchOutcome::Replies(result) => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                session.replies = match result {
                    Ok(replies) => {
                        debug!(tweet_id = %ticket.tweet_id, count = replies.len(), "replies loaded");
                        ReplyFeed::Loaded(replies.into())
                    }
                    Err(e) => {
                        let error = SyncError::FetchFailed {
                            id: ticket.tweet_id,
                            reason: e.to_string(),
                        };
                        warn!(error = %error, "reply fetch failed");
                        ReplyFeed::Failed(error.to_string())
                    }
                };
                report.fetches_applied += 1;
            }
        }
    }

    fn on_object_loaded(&mut self, ticket: FetchTicket, snapshot: Snapshot, report: &mut PumpReport) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if session.status != DetailStatus::Loading {
            debug!(tweet_id = %ticket.tweet_id, "ignoring repeated detail response");
            report.stale_discarded += 1;
            return;
        }
        // An answer for another tweet fails the live request.
        if snapshot.id != ticket.tweet_id {
            let error = SyncError::FetchFailed {
                id: ticket.tweet_id,
                reason: format!("response was for tweet {}", snapshot.id),
            };
            warn!(error = %error, "detail fetch failed");
            session.status = DetailStatus::Failed(error.to_string());
            report.fetches_applied += 1;
            return;
        }

        session.status = DetailStatus::Loaded;
        session.snapshot = Some(Arc::new(snapshot));
        session.replies = ReplyFeed::Loading;
        report.fetches_applied += 1;

        info!(tweet_id = %ticket.tweet_id, "detail loaded");

        if let Err(e) = self.subscriptions.open(ticket.tweet_id) {
            warn!(tweet_id = %ticket.tweet_id, error = %e, "live updates unavailable");
        }

        self.fetcher
            .fetch_replies(RepliesResponder::new(ticket, self.completions_tx.clone()));
    }

    // --- Deltas ---

    fn apply_delta(&mut self, delta: Delta, report: &mut PumpReport) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(current) = session.snapshot.as_ref() else {
            debug!("dropping delta before initial snapshot");
            return;
        };

        match merge(current, &delta) {
            Ok(next) => {
                debug!(tweet_id = %next.id, fields = ?delta.fields(), "merged delta");
                session.snapshot = Some(Arc::new(next));
                report.deltas_applied += 1;
            }
            Err(e) => {
                warn!(error = %e, "rejecting delta");
                report.deltas_rejected += 1;
            }
        }
    }

    // --- Projections ---

    /// Tweet of the live session.
    pub fn active_tweet(&self) -> Option<TweetId> {
        self.session.as_ref().map(|s| s.ticket.tweet_id)
    }

    pub fn status(&self) -> DetailStatus {
        self.session
            .as_ref()
            .map(|s| s.status.clone())
            .unwrap_or(DetailStatus::Idle)
    }

    /// Current snapshot; never a partially merged one.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.session.as_ref().and_then(|s| s.snapshot.clone())
    }

    pub fn replies(&self) -> ReplyFeed {
        self.session
            .as_ref()
            .map(|s| s.replies.clone())
            .unwrap_or(ReplyFeed::Idle)
    }

    pub fn view(&self) -> DetailView {
        DetailView {
            tweet_id: self.active_tweet(),
            status: self.status(),
            snapshot: self.snapshot(),
            replies: self.replies(),
        }
    }

    /// Subject for editing the loaded tweet's list membership.
    pub fn membership_subject(&self) -> Option<Subject> {
        self.snapshot().map(|s| Subject::tweet(s.id))
    }

    pub fn subscription_state(&self) -> SubscriptionState {
        self.subscriptions.state()
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }
}
