//! Who is being identified, and what the UI is told about them.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Reasons ──────────────────────────────────────────────────

/// Why an identify session was started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifyReasonType {
    #[default]
    None,
    Id,
    Track,
    Encrypt,
    Decrypt,
    Verify,
    Resource,
    Background,
}

impl IdentifyReasonType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Id => "id",
            Self::Track => "track",
            Self::Encrypt => "encrypt",
            Self::Decrypt => "decrypt",
            Self::Verify => "verify",
            Self::Resource => "resource",
            Self::Background => "background",
        }
    }
}

impl fmt::Display for IdentifyReasonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyReason {
    #[serde(rename = "type")]
    pub kind: IdentifyReasonType,
    /// Free-form explanation shown next to the prompt.
    #[serde(default)]
    pub reason: String,
    /// Resource the identify was performed for (a folder, a file), if any.
    #[serde(default)]
    pub resource: String,
}

impl IdentifyReason {
    #[must_use]
    pub fn new(kind: IdentifyReasonType, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            resource: String::new(),
        }
    }
}

// ── Track diffs ──────────────────────────────────────────────

/// How a piece of identity differs from what the user tracked last time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackDiffType {
    #[default]
    None,
    Error,
    Clash,
    Revoked,
    Upgraded,
    New,
    RemoteFail,
    RemoteWorking,
    RemoteChanged,
    NewEldest,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDiff {
    #[serde(rename = "type")]
    pub kind: TrackDiffType,
    #[serde(default)]
    pub display_markup: String,
}

// ── Keys and identity snapshots ──────────────────────────────

/// A key bound to the identified user, displayed during the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyKey {
    pub kid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pgp_fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_diff: Option<TrackDiff>,
}

/// Snapshot of the identified user's sigchain state when network checks start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unix seconds of the snapshot.
    #[serde(default)]
    pub when: i64,
    /// Set when the snapshot alone already invalidates the previous track.
    #[serde(default)]
    pub breaks_tracking: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revoked: Vec<TrackDiff>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub username: String,
}

/// Profile summary shown alongside proof results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserCard {
    pub uid: String,
    pub full_name: String,
    pub location: String,
    pub bio: String,
    pub website: String,
    pub twitter: String,
    pub following: u32,
    pub followers: u32,
    pub you_follow_them: bool,
    pub they_follow_you: bool,
}

// ── Tracking ─────────────────────────────────────────────────

/// The user's previous tracking statement for the identified user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub username: String,
    /// Unix seconds of the previous track.
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub is_remote: bool,
}

/// Opaque handle for a tracking statement the UI may later commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackToken(String);

impl TrackToken {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cryptocurrency {
    #[serde(default)]
    pub row_id: i64,
    /// Currency family, e.g. "bitcoin" or "zcash.t".
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
}
