//! Reconciliation of pushed deltas into the local snapshot.
//!
//! Merging is a pure field-wise overwrite applied strictly in arrival order:
//! no buffering, no reordering, no conflict resolution. Pushed values always
//! win for the fields they carry.

mod codec;
mod merge;

pub use codec::{decode_delta, FrameEncoding};
pub use merge::{merge, merge_all};
