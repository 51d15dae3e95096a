//! Core types for tweet detail sync.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a tweet (the viewed object of a detail session).
    TweetId,
    "TweetId"
);
id_type!(
    /// Identifier of a user.
    UserId,
    "UserId"
);
id_type!(
    /// Identifier of a curated list.
    ListId,
    "ListId"
);
id_type!(
    /// Identifier of a list member (tweet or user, depending on the list side).
    SubjectId,
    "SubjectId"
);

impl From<TweetId> for SubjectId {
    fn from(id: TweetId) -> Self {
        SubjectId(id.0)
    }
}

impl From<UserId> for SubjectId {
    fn from(id: UserId) -> Self {
        SubjectId(id.0)
    }
}

/// Channel topic scoping push messages to one tweet.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Topic for a tweet under the given prefix, e.g. `/topic/tweet/7`.
    pub fn for_tweet(prefix: &str, id: TweetId) -> Self {
        Topic(format!("{}/{}", prefix, id))
    }

    /// Wrap an already-formatted topic name (as reported by a transport).
    pub fn new(name: impl Into<String>) -> Self {
        Topic(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Topic({})", self.0)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tweet author as embedded in a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: UserId,
    pub full_name: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: u64,
    pub src: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollChoice {
    pub id: u64,
    pub choice: String,
    #[serde(default)]
    pub voted_user_ids: Vec<UserId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: u64,
    /// Closing time, as sent by the server.
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub choices: Vec<PollChoice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTweet {
    pub id: TweetId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPreview {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
}

/// Authoritative local copy of one tweet's state.
///
/// Snapshots are immutable values: the reconciliation engine produces a new
/// one for every applied [`Delta`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: TweetId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub quote_count: u64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_retweeted: bool,
    #[serde(default)]
    pub is_bookmarked: bool,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub poll: Option<Poll>,
    #[serde(default)]
    pub quote_tweet: Option<QuoteTweet>,
    #[serde(default)]
    pub link: Option<LinkPreview>,
    #[serde(default)]
    pub addressed_username: Option<String>,
    #[serde(default)]
    pub addressed_tweet_id: Option<TweetId>,
}

impl Snapshot {
    /// Empty snapshot for a tweet id.
    pub fn new(id: TweetId) -> Self {
        Self {
            id,
            text: String::new(),
            date_time: None,
            author: None,
            like_count: 0,
            retweet_count: 0,
            reply_count: 0,
            quote_count: 0,
            is_liked: false,
            is_retweeted: false,
            is_bookmarked: false,
            images: Vec::new(),
            poll: None,
            quote_tweet: None,
            link: None,
            addressed_username: None,
            addressed_tweet_id: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

/// Keeps an explicit `null` apart from an absent key.
///
/// Used with `#[serde(default)]`: absent -> `None`, `null` -> `Some(None)`,
/// value -> `Some(Some(v))`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update pushed for the subscribed tweet.
///
/// Carries any subset of the snapshot's fields. Nullable snapshot fields are
/// tri-state so a pushed `null` clears them while an absent key leaves them
/// alone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delta {
    /// Only used to cross-check against the session; never merged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TweetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub date_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub author: Option<Option<Author>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweet_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_retweeted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_bookmarked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Image>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub poll: Option<Option<Poll>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub quote_tweet: Option<Option<QuoteTweet>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub link: Option<Option<LinkPreview>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub addressed_username: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub addressed_tweet_id: Option<Option<TweetId>>,
}

impl Delta {
    /// Wire names of the snapshot fields this delta carries.
    pub fn fields(&self) -> Vec<&'static str> {
        let present = [
            ("text", self.text.is_some()),
            ("dateTime", self.date_time.is_some()),
            ("author", self.author.is_some()),
            ("likeCount", self.like_count.is_some()),
            ("retweetCount", self.retweet_count.is_some()),
            ("replyCount", self.reply_count.is_some()),
            ("quoteCount", self.quote_count.is_some()),
            ("isLiked", self.is_liked.is_some()),
            ("isRetweeted", self.is_retweeted.is_some()),
            ("isBookmarked", self.is_bookmarked.is_some()),
            ("images", self.images.is_some()),
            ("poll", self.poll.is_some()),
            ("quoteTweet", self.quote_tweet.is_some()),
            ("link", self.link.is_some()),
            ("addressedUsername", self.addressed_username.is_some()),
            ("addressedTweetId", self.addressed_tweet_id.is_some()),
        ];
        present
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }

    /// True if the delta carries no snapshot field.
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}
