//! Core domain types for identify sessions.
//!
//! This crate contains the plain data carried between a verification pipeline
//! and an identify UI: no IO, no async, and minimal dependencies. Everything
//! here can be used from any layer of the application.

mod identity;
mod outcome;
mod proof;

pub use identity::{
    Cryptocurrency, IdentifyKey, IdentifyReason, IdentifyReasonType, Identity, TrackDiff,
    TrackDiffType, TrackSummary, TrackToken, User, UserCard,
};
pub use outcome::{
    ConfirmResult, DismissReason, DismissReasonType, IdentifyOutcome, TlfCreateWithInvite,
};
pub use proof::{LinkCheckResult, ProofKind, ProofState, ProofStatus, ProofType, RemoteProof};
