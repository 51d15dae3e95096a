//! Optimistic editing of a subject's list membership.

use crate::error::{Result, SyncError};
use crate::types::ListId;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::commit::{CommitCompletion, CommitReceipt, CommitResponder, CommitState, MembershipStore};
use super::types::{Container, Subject, SubjectKind};

/// One row of the draft, as shown to the user.
#[derive(Clone, Copy, Debug)]
pub struct DraftEntry<'a> {
    pub index: usize,
    pub container: &'a Container,
    pub checked: bool,
}

/// Lists whose membership differs from the seed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MembershipChanges {
    pub added: Vec<ListId>,
    pub removed: Vec<ListId>,
}

impl MembershipChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Working copy of "which of my lists hold this subject".
///
/// Seeded containers are shared, never mutated: a toggle swaps in a fresh
/// container for the toggled index only.
#[derive(Debug)]
pub struct MembershipEditor {
    subject: Subject,
    /// Containers as seeded, for restoring exact member order.
    seeded: Vec<Arc<Container>>,
    containers: Vec<Arc<Container>>,
    checked: BTreeSet<ListId>,
    commit_state: CommitState,
    /// Commit awaiting its completion.
    in_flight: Option<InFlight>,
    /// Last issued commit attempt.
    attempt: u64,
    commits_tx: Sender<CommitCompletion>,
    commits_rx: Receiver<CommitCompletion>,
}

#[derive(Clone, Debug)]
struct InFlight {
    attempt: u64,
    lists: Vec<ListId>,
}

/// A clone copies the draft and gets its own completion queue; a commit in
/// flight keeps reporting to the original.
impl Clone for MembershipEditor {
    fn clone(&self) -> Self {
        let (commits_tx, commits_rx) = unbounded();
        let commit_state = match &self.commit_state {
            CommitState::Pending => CommitState::Idle,
            other => other.clone(),
        };

        Self {
            subject: self.subject,
            seeded: self.seeded.clone(),
            containers: self.containers.clone(),
            checked: self.checked.clone(),
            commit_state,
            in_flight: None,
            attempt: self.attempt,
            commits_tx,
            commits_rx,
        }
    }
}

impl MembershipEditor {
    /// Build the draft for `subject` from the viewer's lists.
    ///
    /// A list starts checked iff the subject's id is among its members.
    /// Repeated list ids keep their first occurrence.
    pub fn seed(subject: Subject, containers: &[Arc<Container>]) -> Self {
        let mut seen = BTreeSet::new();
        let mut seeded = Vec::with_capacity(containers.len());

        for container in containers {
            if seen.insert(container.id) {
                seeded.push(Arc::clone(container));
            } else {
                warn!(list_id = %container.id, "ignoring repeated list");
            }
        }

        let checked = seeded
            .iter()
            .filter(|c| c.holds(&subject))
            .map(|c| c.id)
            .collect();

        let (commits_tx, commits_rx) = unbounded();

        Self {
            subject,
            containers: seeded.clone(),
            seeded,
            checked,
            commit_state: CommitState::Idle,
            in_flight: None,
            attempt: 0,
            commits_tx,
            commits_rx,
        }
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Flip membership for the list at `index`; returns the new checked state.
    ///
    /// Checking appends the subject as the newest member; unchecking removes
    /// it by id. Toggling back to the seeded state restores the seeded
    /// members exactly.
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        let subject_id = self.subject.id.ok_or(SyncError::MissingSubjectId)?;
        let kind = self.subject.kind;

        let len = self.containers.len();
        let current = self
            .containers
            .get(index)
            .ok_or(SyncError::ContainerIndexOutOfRange { index, len })?;

        let list_id = current.id;
        let now_checked = !self.checked.contains(&list_id);
        let seeded = &self.seeded[index];

        let next = if now_checked == seeded.holds(&self.subject) {
            Container::clone(seeded)
        } else {
            let mut next = Container::clone(current);
            let members = next.members_mut(kind);
            if now_checked {
                members.insert(subject_id);
            } else {
                members.remove(subject_id);
            }
            next
        };

        self.containers[index] = Arc::new(next);
        if now_checked {
            self.checked.insert(list_id);
        } else {
            self.checked.remove(&list_id);
        }

        debug!(list_id = %list_id, checked = now_checked, "toggled list membership");
        Ok(now_checked)
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.containers
            .get(index)
            .map(|c| self.checked.contains(&c.id))
            .unwrap_or(false)
    }

    /// Ids of the lists currently holding the subject.
    pub fn checked(&self) -> &BTreeSet<ListId> {
        &self.checked
    }

    /// Working copies of all lists, in seed order.
    pub fn containers(&self) -> &[Arc<Container>] {
        &self.containers
    }

    /// Rows for rendering.
    pub fn entries(&self) -> impl Iterator<Item = DraftEntry<'_>> + '_ {
        self.containers
            .iter()
            .enumerate()
            .map(move |(index, container)| DraftEntry {
                index,
                container: container.as_ref(),
                checked: self.checked.contains(&container.id),
            })
    }

    /// Differences from the seeded membership.
    pub fn changes(&self) -> MembershipChanges {
        let mut changes = MembershipChanges::default();
        for seeded in &self.seeded {
            let was = seeded.holds(&self.subject);
            let is = self.checked.contains(&seeded.id);
            match (was, is) {
                (false, true) => changes.added.push(seeded.id),
                (true, false) => changes.removed.push(seeded.id),
                _ => {}
            }
        }
        changes
    }

    /// Send the draft to `store`: every checked list, each holding the
    /// subject.
    ///
    /// Returns once the request is handed off; the outcome is applied by
    /// [`pump`](Self::pump). Toggles stay allowed meanwhile and do not
    /// affect what was sent.
    pub fn commit(&mut self, store: &dyn MembershipStore) -> Result<()> {
        let subject_id = self.subject.id.ok_or(SyncError::MissingSubjectId)?;
        if self.in_flight.is_some() {
            return Err(SyncError::CommitInFlight);
        }

        let lists: Vec<Arc<Container>> = self
            .containers
            .iter()
            .filter(|c| self.checked.contains(&c.id))
            .cloned()
            .collect();

        self.attempt += 1;
        self.in_flight = Some(InFlight {
            attempt: self.attempt,
            lists: lists.iter().map(|c| c.id).collect(),
        });
        self.commit_state = CommitState::Pending;

        debug!(
            subject_id = %subject_id,
            attempt = self.attempt,
            lists = lists.len(),
            "committing membership"
        );

        let responder = CommitResponder::new(self.attempt, subject_id, self.commits_tx.clone());
        match self.subject.kind {
            SubjectKind::Tweet => store.commit_tweet_membership(subject_id, &lists, responder),
            SubjectKind::User => store.commit_user_membership(subject_id, &lists, responder),
        }
        Ok(())
    }

    /// Apply a resolved commit, if any.
    ///
    /// Returns the receipt on success, or `CommitFailed` with the draft left
    /// as it was so the caller can retry. `None` while nothing resolved.
    pub fn pump(&mut self) -> Option<Result<CommitReceipt>> {
        let mut outcome = None;

        while let Ok(completion) = self.commits_rx.try_recv() {
            let matches = self
                .in_flight
                .as_ref()
                .map(|f| f.attempt == completion.attempt)
                .unwrap_or(false);
            if !matches {
                debug!(attempt = completion.attempt, "discarding unexpected commit completion");
                continue;
            }
            let Some(in_flight) = self.in_flight.take() else {
                continue;
            };

            outcome = Some(match completion.result {
                Ok(()) => {
                    let receipt = CommitReceipt {
                        subject: self.subject,
                        lists: in_flight.lists,
                    };
                    info!(
                        attempt = in_flight.attempt,
                        lists = receipt.lists.len(),
                        "membership committed"
                    );
                    self.commit_state = CommitState::Committed(receipt.clone());
                    Ok(receipt)
                }
                Err(e) => {
                    let error = SyncError::CommitFailed(e.to_string());
                    warn!(attempt = in_flight.attempt, error = %error, "membership commit failed");
                    self.commit_state = CommitState::Failed(error.to_string());
                    Err(error)
                }
            });
        }

        outcome
    }

    pub fn commit_state(&self) -> &CommitState {
        &self.commit_state
    }

    /// Discard the draft, committed or not.
    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::membership::MemberSet;
    use crate::types::{SubjectId, TweetId};
    use parking_lot::Mutex;

    fn list(id: u64, members: &[u64]) -> Arc<Container> {
        Arc::new(Container::new(ListId(id), format!("list {}", id)).with_members(
            SubjectKind::Tweet,
            members.iter().copied().map(SubjectId).collect(),
        ))
    }

    fn members(editor: &MembershipEditor, index: usize) -> Vec<u64> {
        editor.containers()[index]
            .tweets
            .iter()
            .map(|id| id.0)
            .collect()
    }

    #[test]
    fn test_seed_checks_lists_holding_subject() {
        let lists = vec![list(1, &[]), list(2, &[42])];
        let editor = MembershipEditor::seed(Subject::tweet(TweetId(42)), &lists);

        assert_eq!(editor.checked().iter().copied().collect::<Vec<_>>(), vec![ListId(2)]);
        assert!(!editor.is_checked(0));
        assert!(editor.is_checked(1));
    }

    #[test]
    fn test_toggle_on_and_off() {
        let lists = vec![list(1, &[]), list(2, &[42])];
        let mut editor = MembershipEditor::seed(Subject::tweet(TweetId(42)), &lists);

        assert!(editor.toggle(0).unwrap());
        assert_eq!(
            editor.checked().iter().copied().collect::<Vec<_>>(),
            vec![ListId(1), ListId(2)]
        );
        assert_eq!(members(&editor, 0), vec![42]);

        assert!(!editor.toggle(0).unwrap());
        assert_eq!(editor.checked().iter().copied().collect::<Vec<_>>(), vec![ListId(2)]);
        assert!(members(&editor, 0).is_empty());
    }

    #[test]
    fn test_toggle_appends_as_newest() {
        let lists = vec![list(1, &[5, 6])];
        let mut editor = MembershipEditor::seed(Subject::tweet(TweetId(42)), &lists);

        editor.toggle(0).unwrap();
        assert_eq!(members(&editor, 0), vec![5, 6, 42]);
    }

    #[test]
    fn test_off_then_on_restores_seed_order() {
        let lists = vec![list(1, &[5, 42, 6])];
        let mut editor = MembershipEditor::seed(Subject::tweet(TweetId(42)), &lists);

        editor.toggle(0).unwrap();
        assert_eq!(members(&editor, 0), vec![5, 6]);

        editor.toggle(0).unwrap();
        assert_eq!(members(&editor, 0), vec![5, 42, 6]);
    }

    #[test]
    fn test_seed_never_mutated() {
        let lists = vec![list(1, &[7])];
        let mut editor = MembershipEditor::seed(Subject::tweet(TweetId(42)), &lists);

        editor.toggle(0).unwrap();
        assert_eq!(lists[0].tweets, [SubjectId(7)].into_iter().collect::<MemberSet>());
    }

    #[test]
    fn test_toggle_replaces_only_toggled_entry() {
        let lists = vec![list(1, &[]), list(2, &[])];
        let mut editor = MembershipEditor::seed(Subject::tweet(TweetId(42)), &lists);

        let before = Arc::clone(&editor.containers()[0]);
        editor.toggle(0).unwrap();
        let after_first = Arc::clone(&editor.containers()[0]);
        editor.toggle(0).unwrap();

        assert!(!Arc::ptr_eq(&before, &editor.containers()[0]));
        assert!(!Arc::ptr_eq(&after_first, &editor.containers()[0]));
        assert!(Arc::ptr_eq(&lists[1], &editor.containers()[1]));
    }

    #[test]
    fn test_user_subject_edits_user_side() {
        let lists = vec![list(1, &[])];
        let mut editor = MembershipEditor::seed(Subject::user(crate::types::UserId(9)), &lists);

        editor.toggle(0).unwrap();
        assert!(editor.containers()[0].tweets.is_empty());
        assert!(editor.containers()[0].users.contains(SubjectId(9)));
    }

    #[test]
    fn test_missing_id_is_an_error() {
        let lists = vec![list(1, &[])];
        let mut editor = MembershipEditor::seed(Subject::unsaved(SubjectKind::Tweet), &lists);

        assert!(matches!(editor.toggle(0), Err(SyncError::MissingSubjectId)));
        assert!(editor.checked().is_empty());
    }

    #[test]
    fn test_index_out_of_range() {
        let lists = vec![list(1, &[])];
        let mut editor = MembershipEditor::seed(Subject::tweet(TweetId(42)), &lists);

        assert!(matches!(
            editor.toggle(3),
            Err(SyncError::ContainerIndexOutOfRange { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_repeated_list_ids_keep_first() {
        let lists = vec![list(1, &[42]), list(1, &[])];
        let editor = MembershipEditor::seed(Subject::tweet(TweetId(42)), &lists);

        assert_eq!(editor.containers().len(), 1);
        assert!(editor.is_checked(0));
    }

    #[test]
    fn test_changes_against_seed() {
        let lists = vec![list(1, &[]), list(2, &[42]), list(3, &[])];
        let mut editor = MembershipEditor::seed(Subject::tweet(TweetId(42)), &lists);
        assert!(editor.changes().is_empty());

        editor.toggle(0).unwrap();
        editor.toggle(1).unwrap();

        assert_eq!(
            editor.changes(),
            MembershipChanges {
                added: vec![ListId(1)],
                removed: vec![ListId(2)],
            }
        );
    }

    #[test]
    fn test_entries_projection() {
        let lists = vec![list(1, &[]), list(2, &[42])];
        let editor = MembershipEditor::seed(Subject::tweet(TweetId(42)), &lists);

        let rows: Vec<_> = editor
            .entries()
            .map(|e| (e.index, e.container.id, e.checked))
            .collect();
        assert_eq!(rows, vec![(0, ListId(1), false), (1, ListId(2), true)]);
    }

    /// Holds responders until the test resolves them.
    #[derive(Default)]
    struct HeldStore {
        held: Mutex<Vec<(Vec<ListId>, CommitResponder)>>,
    }

    impl HeldStore {
        fn take(&self) -> (Vec<ListId>, CommitResponder) {
            self.held.lock().remove(0)
        }
    }

    impl MembershipStore for HeldStore {
        fn commit_tweet_membership(
            &self,
            _tweet_id: SubjectId,
            lists: &[Arc<Container>],
            responder: CommitResponder,
        ) {
            self.held
                .lock()
                .push((lists.iter().map(|c| c.id).collect(), responder));
        }

        fn commit_user_membership(
            &self,
            user_id: SubjectId,
            lists: &[Arc<Container>],
            responder: CommitResponder,
        ) {
            self.commit_tweet_membership(user_id, lists, responder)
        }
    }

    #[test]
    fn test_commit_returns_before_store_resolves() {
        let lists = vec![list(1, &[]), list(2, &[42])];
        let mut editor = MembershipEditor::seed(Subject::tweet(TweetId(42)), &lists);
        let store = HeldStore::default();

        editor.toggle(0).unwrap();
        editor.commit(&store).unwrap();

        assert_eq!(editor.commit_state(), &CommitState::Pending);
        assert!(editor.pump().is_none());

        let (sent, responder) = store.take();
        assert_eq!(sent, vec![ListId(1), ListId(2)]);
        responder.resolve(Ok(()));

        let receipt = editor.pump().unwrap().unwrap();
        assert_eq!(receipt.lists, vec![ListId(1), ListId(2)]);
        assert_eq!(editor.commit_state(), &CommitState::Committed(receipt));
        assert!(editor.pump().is_none());
    }

    #[test]
    fn test_second_commit_while_pending() {
        let lists = vec![list(1, &[])];
        let mut editor = MembershipEditor::seed(Subject::tweet(TweetId(42)), &lists);
        let store = HeldStore::default();

        editor.commit(&store).unwrap();
        assert!(matches!(editor.commit(&store), Err(SyncError::CommitInFlight)));
        assert_eq!(store.held.lock().len(), 1);
    }

    #[test]
    fn test_failed_commit_leaves_draft() {
        let lists = vec![list(1, &[]), list(2, &[])];
        let mut editor = MembershipEditor::seed(Subject::tweet(TweetId(42)), &lists);
        let store = HeldStore::default();

        editor.toggle(1).unwrap();
        let before = editor.containers().to_vec();
        editor.commit(&store).unwrap();

        let (_, responder) = store.take();
        responder.resolve(Err(BoxError::from("409 Conflict")));

        let result = editor.pump().unwrap();
        assert!(matches!(result, Err(SyncError::CommitFailed(msg)) if msg.contains("409")));
        assert!(matches!(editor.commit_state(), CommitState::Failed(_)));
        assert_eq!(editor.containers(), &before[..]);
        assert_eq!(editor.checked().iter().copied().collect::<Vec<_>>(), vec![ListId(2)]);
    }

    #[test]
    fn test_clone_does_not_inherit_pending_commit() {
        let lists = vec![list(1, &[])];
        let mut editor = MembershipEditor::seed(Subject::tweet(TweetId(42)), &lists);
        let store = HeldStore::default();
        editor.commit(&store).unwrap();

        let mut copy = editor.clone();
        assert_eq!(copy.commit_state(), &CommitState::Idle);

        store.take().1.resolve(Ok(()));
        assert!(copy.pump().is_none());
        assert!(editor.pump().unwrap().is_ok());
    }
}
