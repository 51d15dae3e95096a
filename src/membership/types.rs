//! Subjects, member sets and list containers.

use crate::types::{ListId, SubjectId, TweetId, UserId};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Which side of a list a subject lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Tweet,
    User,
}

/// A tweet or user whose list membership is edited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub kind: SubjectKind,
    /// `None` until the subject has been created server-side.
    pub id: Option<SubjectId>,
}

impl Subject {
    pub fn tweet(id: TweetId) -> Self {
        Self {
            kind: SubjectKind::Tweet,
            id: Some(id.into()),
        }
    }

    pub fn user(id: UserId) -> Self {
        Self {
            kind: SubjectKind::User,
            id: Some(id.into()),
        }
    }

    /// A subject that has no id yet.
    pub fn unsaved(kind: SubjectKind) -> Self {
        Self { kind, id: None }
    }
}

/// Insertion-ordered set of member ids.
///
/// Equality is order-sensitive: two sets are equal only if they hold the
/// same ids in the same order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberSet(IndexSet<SubjectId>);

impl MemberSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: SubjectId) -> bool {
        self.0.contains(&id)
    }

    /// Append `id` as the newest member. Returns false if already present.
    pub fn insert(&mut self, id: SubjectId) -> bool {
        self.0.insert(id)
    }

    /// Remove `id`, keeping the order of the remaining members.
    pub fn remove(&mut self, id: SubjectId) -> bool {
        self.0.shift_remove(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SubjectId> + '_ {
        self.0.iter().copied()
    }
}

impl PartialEq for MemberSet {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().eq(other.0.iter())
    }
}

impl Eq for MemberSet {}

impl FromIterator<SubjectId> for MemberSet {
    fn from_iter<I: IntoIterator<Item = SubjectId>>(iter: I) -> Self {
        MemberSet(iter.into_iter().collect())
    }
}

/// A curated list owned by the viewer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: ListId,
    pub name: String,
    #[serde(default)]
    pub tweets: MemberSet,
    #[serde(default)]
    pub users: MemberSet,
}

impl Container {
    pub fn new(id: ListId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tweets: MemberSet::new(),
            users: MemberSet::new(),
        }
    }

    /// Builder-style helper setting the member set for `kind`.
    pub fn with_members(mut self, kind: SubjectKind, members: MemberSet) -> Self {
        *self.members_mut(kind) = members;
        self
    }

    pub fn members(&self, kind: SubjectKind) -> &MemberSet {
        match kind {
            SubjectKind::Tweet => &self.tweets,
            SubjectKind::User => &self.users,
        }
    }

    pub fn members_mut(&mut self, kind: SubjectKind) -> &mut MemberSet {
        match kind {
            SubjectKind::Tweet => &mut self.tweets,
            SubjectKind::User => &mut self.users,
        }
    }

    /// True if the subject is a member of this list.
    pub fn holds(&self, subject: &Subject) -> bool {
        subject
            .id
            .map(|id| self.members(subject.kind).contains(id))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(set: &MemberSet) -> Vec<u64> {
        set.iter().map(|id| id.0).collect()
    }

    #[test]
    fn test_member_set_is_a_set() {
        let mut set = MemberSet::new();
        assert!(set.insert(SubjectId(1)));
        assert!(set.insert(SubjectId(2)));
        assert!(!set.insert(SubjectId(1)));
        assert_eq!(ids(&set), vec![1, 2]);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut set: MemberSet = [3, 1, 2].into_iter().map(SubjectId).collect();
        assert!(set.remove(SubjectId(1)));
        assert!(!set.remove(SubjectId(1)));
        assert_eq!(ids(&set), vec![3, 2]);
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let a: MemberSet = [1, 2].into_iter().map(SubjectId).collect();
        let b: MemberSet = [2, 1].into_iter().map(SubjectId).collect();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_container_sides() {
        let list = Container::new(ListId(1), "Rust")
            .with_members(SubjectKind::User, [SubjectId(42)].into_iter().collect());

        assert!(list.holds(&Subject::user(UserId(42))));
        assert!(!list.holds(&Subject::tweet(TweetId(42))));
        assert!(!list.holds(&Subject::unsaved(SubjectKind::User)));
    }

    #[test]
    fn test_container_wire_shape() {
        let list: Container = serde_json::from_value(serde_json::json!({
            "id": 3,
            "name": "Reading",
            "tweets": [5, 6, 5]
        }))
        .unwrap();

        assert_eq!(ids(&list.tweets), vec![5, 6]);
        assert!(list.users.is_empty());
    }
}
