//! Decoding of pushed frame bodies into deltas.

use crate::error::{Result, SyncError};
use crate::types::Delta;
use serde::{Deserialize, Serialize};

/// Encoding of a pushed frame body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameEncoding {
    #[default]
    Json,
    MessagePack,
}

/// Decode a frame body into a delta.
///
/// The body must be a mapping of snapshot field names to values; anything
/// else is a [`SyncError::MalformedDelta`].
pub fn decode_delta(body: &[u8], encoding: FrameEncoding) -> Result<Delta> {
    if body.is_empty() {
        return Err(SyncError::MalformedDelta("empty frame".into()));
    }

    // Decode to a self-describing value first; a positional array must
    // never fill struct fields.
    let value: serde_json::Value = match encoding {
        FrameEncoding::Json => serde_json::from_slice(body)?,
        FrameEncoding::MessagePack => rmp_serde::from_slice(body)?,
    };

    if !value.is_object() {
        return Err(SyncError::MalformedDelta(format!(
            "expected a mapping, got {}",
            json_kind(&value)
        )));
    }
    Ok(serde_json::from_value(value)?)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_frame() {
        let delta = decode_delta(br#"{"likeCount": 4}"#, FrameEncoding::Json).unwrap();
        assert_eq!(delta.like_count, Some(4));
        assert_eq!(delta.fields(), vec!["likeCount"]);
    }

    #[test]
    fn test_message_pack_frame() {
        let body = rmp_serde::to_vec_named(&json!({"text": "edited", "poll": null})).unwrap();
        let delta = decode_delta(&body, FrameEncoding::MessagePack).unwrap();
        assert_eq!(delta.text.as_deref(), Some("edited"));
        assert_eq!(delta.poll, Some(None));
    }

    #[test]
    fn test_unparseable_frame() {
        let result = decode_delta(b"{not json", FrameEncoding::Json);
        assert!(matches!(result, Err(SyncError::MalformedDelta(_))));
    }

    #[test]
    fn test_non_object_frame() {
        let result = decode_delta(b"[1, 2]", FrameEncoding::Json);
        assert!(matches!(result, Err(SyncError::MalformedDelta(msg)) if msg.contains("an array")));
    }

    #[test]
    fn test_wrong_field_type() {
        let result = decode_delta(br#"{"likeCount": "many"}"#, FrameEncoding::Json);
        assert!(matches!(result, Err(SyncError::MalformedDelta(_))));
    }

    #[test]
    fn test_message_pack_array_frame() {
        let body = rmp_serde::to_vec(&(8u64, "edited")).unwrap();
        let result = decode_delta(&body, FrameEncoding::MessagePack);
        assert!(matches!(result, Err(SyncError::MalformedDelta(msg)) if msg.contains("an array")));
    }

    #[test]
    fn test_message_pack_empty_array_frame() {
        let body = rmp_serde::to_vec(&Vec::<u64>::new()).unwrap();
        let result = decode_delta(&body, FrameEncoding::MessagePack);
        assert!(matches!(result, Err(SyncError::MalformedDelta(_))));
    }

    #[test]
    fn test_message_pack_scalar_frame() {
        let body = rmp_serde::to_vec(&42u64).unwrap();
        let result = decode_delta(&body, FrameEncoding::MessagePack);
        assert!(matches!(result, Err(SyncError::MalformedDelta(msg)) if msg.contains("a number")));
    }

    #[test]
    fn test_default_encoding_is_json() {
        assert_eq!(FrameEncoding::default(), FrameEncoding::Json);
    }

    #[test]
    fn test_empty_frame() {
        let result = decode_delta(b"", FrameEncoding::MessagePack);
        assert!(matches!(result, Err(SyncError::MalformedDelta(_))));
    }
}
