//! Remote proofs and the result of checking them.

use serde::{Deserialize, Serialize};

use crate::TrackDiff;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofType {
    #[default]
    None,
    Keybase,
    Twitter,
    Github,
    Reddit,
    Coinbase,
    HackerNews,
    GenericWebSite,
    Dns,
    Rooter,
}

impl ProofType {
    /// Whether a proof of this type is checked as a social-network proof.
    ///
    /// Everything else (web sites, DNS) is checked as a web proof.
    #[must_use]
    pub const fn kind(self) -> ProofKind {
        match self {
            Self::GenericWebSite | Self::Dns => ProofKind::Web,
            _ => ProofKind::Social,
        }
    }
}

/// Which UI surface a proof check is reported on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofKind {
    Social,
    Web,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProof {
    pub proof_type: ProofType,
    /// Service-specific key, e.g. the hostname for a web proof.
    #[serde(default)]
    pub key: String,
    /// Service-specific value, e.g. the username on a social network.
    pub value: String,
    #[serde(default)]
    pub display_markup: String,
    #[serde(default)]
    pub sig_id: String,
    /// Unix seconds of the last modification.
    #[serde(default)]
    pub mtime: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofState {
    #[default]
    None,
    Ok,
    TempFailure,
    PermFailure,
    Looking,
    Superseded,
    Posted,
    Revoked,
    Deleted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStatus {
    pub state: ProofState,
    #[serde(default)]
    pub desc: String,
}

/// Outcome of checking one remote proof.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCheckResult {
    pub proof_id: u32,
    #[serde(default)]
    pub status: ProofStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<TrackDiff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_diff: Option<TrackDiff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint_url: Option<String>,
    /// Set when this result invalidates the user's previous track.
    #[serde(default)]
    pub breaks_tracking: bool,
}
