//! End-of-session types: the outcome shown to the user and their answer.

use serde::{Deserialize, Serialize};

use crate::{IdentifyReason, TrackSummary};

/// Summary of an identify session, presented when asking the user to confirm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifyOutcome {
    pub username: String,
    pub warnings: Vec<String>,
    pub track_used: Option<TrackSummary>,
    pub num_track_failures: u32,
    pub num_track_changes: u32,
    pub num_proof_failures: u32,
    pub num_revoked: u32,
    pub num_proof_successes: u32,
    pub reason: IdentifyReason,
}

/// The user's answer to a confirmation prompt.
///
/// Also used as the canned answer when the prompt is never shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmResult {
    pub identity_confirmed: bool,
    pub remote_confirmed: bool,
    pub expiring_local: bool,
    pub auto_confirmed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissReasonType {
    #[default]
    None,
    HandledElsewhere,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissReason {
    #[serde(rename = "type")]
    pub kind: DismissReasonType,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub resource: String,
}

/// Offer to create a shared folder with an invite for a not-yet-joined user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlfCreateWithInvite {
    pub folder_name: String,
    pub is_private: bool,
    pub assertion: String,
    pub social_assertion: Option<String>,
    pub invite_link: String,
    pub throttled: bool,
}
