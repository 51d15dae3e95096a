//! Delta application.

use crate::error::{Result, SyncError};
use crate::types::{Delta, Snapshot};

/// Overwrite `slot` when the delta carries a value for it.
fn overwrite<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}

/// Merge a delta into a snapshot, producing a new snapshot.
///
/// Every field present in the delta replaces the snapshot's field; absent
/// fields are left untouched. A delta that names a different tweet id is
/// rejected instead of being merged.
pub fn merge(snapshot: &Snapshot, delta: &Delta) -> Result<Snapshot> {
    if let Some(id) = delta.id {
        if id != snapshot.id {
            return Err(SyncError::DeltaMismatch {
                expected: snapshot.id,
                got: id,
            });
        }
    }

    let mut next = snapshot.clone();

    overwrite(&mut next.text, &delta.text);
    overwrite(&mut next.date_time, &delta.date_time);
    overwrite(&mut next.author, &delta.author);
    overwrite(&mut next.like_count, &delta.like_count);
    overwrite(&mut next.retweet_count, &delta.retweet_count);
    overwrite(&mut next.reply_count, &delta.reply_count);
    overwrite(&mut next.quote_count, &delta.quote_count);
    overwrite(&mut next.is_liked, &delta.is_liked);
    overwrite(&mut next.is_retweeted, &delta.is_retweeted);
    overwrite(&mut next.is_bookmarked, &delta.is_bookmarked);
    overwrite(&mut next.images, &delta.images);
    overwrite(&mut next.poll, &delta.poll);
    overwrite(&mut next.quote_tweet, &delta.quote_tweet);
    overwrite(&mut next.link, &delta.link);
    overwrite(&mut next.addressed_username, &delta.addressed_username);
    overwrite(&mut next.addressed_tweet_id, &delta.addressed_tweet_id);

    Ok(next)
}

/// Merge a sequence of deltas in the given order.
///
/// Stops at the first rejected delta.
pub fn merge_all<'a, I>(snapshot: &Snapshot, deltas: I) -> Result<Snapshot>
where
    I: IntoIterator<Item = &'a Delta>,
{
    deltas
        .into_iter()
        .try_fold(snapshot.clone(), |state, delta| merge(&state, delta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Poll, TweetId};
    use serde_json::json;

    fn delta(value: serde_json::Value) -> Delta {
        serde_json::from_value(value).unwrap()
    }

    fn base() -> Snapshot {
        let mut snapshot = Snapshot::new(TweetId(7)).with_text("hi");
        snapshot.like_count = 3;
        snapshot
    }

    #[test]
    fn test_like_then_edit() {
        let state = merge(&base(), &delta(json!({"likeCount": 4}))).unwrap();
        assert_eq!(state.like_count, 4);
        assert_eq!(state.text, "hi");

        let state = merge(&state, &delta(json!({"text": "hi!"}))).unwrap();
        assert_eq!(state.id, TweetId(7));
        assert_eq!(state.like_count, 4);
        assert_eq!(state.text, "hi!");
    }

    #[test]
    fn test_empty_delta_is_identity() {
        let state = merge(&base(), &Delta::default()).unwrap();
        assert_eq!(state, base());
    }

    #[test]
    fn test_input_not_mutated() {
        let snapshot = base();
        let _ = merge(&snapshot, &delta(json!({"likeCount": 99}))).unwrap();
        assert_eq!(snapshot.like_count, 3);
    }

    #[test]
    fn test_null_clears_nullable_field() {
        let mut snapshot = base();
        snapshot.poll = Some(Poll {
            id: 1,
            date_time: None,
            choices: vec![],
        });

        let kept = merge(&snapshot, &delta(json!({"likeCount": 5}))).unwrap();
        assert!(kept.poll.is_some());

        let cleared = merge(&snapshot, &delta(json!({"poll": null}))).unwrap();
        assert!(cleared.poll.is_none());
    }

    #[test]
    fn test_matching_id_is_accepted() {
        let state = merge(&base(), &delta(json!({"id": 7, "replyCount": 2}))).unwrap();
        assert_eq!(state.reply_count, 2);
    }

    #[test]
    fn test_foreign_id_is_rejected() {
        let result = merge(&base(), &delta(json!({"id": 9, "likeCount": 100})));
        assert!(matches!(
            result,
            Err(SyncError::DeltaMismatch {
                expected: TweetId(7),
                got: TweetId(9)
            })
        ));
    }

    #[test]
    fn test_merge_all_respects_order() {
        let d1 = delta(json!({"likeCount": 10}));
        let d2 = delta(json!({"likeCount": 11}));

        let forward = merge_all(&base(), [&d1, &d2]).unwrap();
        let backward = merge_all(&base(), [&d2, &d1]).unwrap();

        assert_eq!(forward.like_count, 11);
        assert_eq!(backward.like_count, 10);
    }

    #[test]
    fn test_merge_all_stops_at_rejection() {
        let good = delta(json!({"likeCount": 10}));
        let bad = delta(json!({"id": 8}));
        assert!(merge_all(&base(), [&good, &bad]).is_err());
    }
}
