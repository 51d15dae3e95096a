//! List membership editing for a tweet or user.
//!
//! The editor is seeded from the viewer's lists, applies toggles locally
//! and immediately, and sends the full declarative membership on commit.
//! Pushed changes to list contents are not merged into an open draft; the
//! last local edit set wins on commit.
//!
//! Commits never block: the store resolves a [`CommitResponder`] when
//! persistence finishes and [`MembershipEditor::pump`] applies the outcome.

mod commit;
mod editor;
mod types;

pub use commit::{CommitReceipt, CommitResponder, CommitState, MembershipStore};
pub use editor::{DraftEntry, MembershipChanges, MembershipEditor};
pub use types::{Container, MemberSet, Subject, SubjectKind};
