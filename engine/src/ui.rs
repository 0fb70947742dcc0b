//! The identify UI capability set.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use identify_types::{
    ConfirmResult, Cryptocurrency, DismissReason, IdentifyKey, IdentifyOutcome, IdentifyReason,
    Identity, LinkCheckResult, RemoteProof, TlfCreateWithInvite, TrackSummary, TrackToken, User,
    UserCard,
};
use serde::{Deserialize, Serialize};

use crate::UiError;

/// Future returned by every [`IdentifyUi`] operation.
pub type UiFut<'a, T = ()> = Pin<Box<dyn Future<Output = Result<T, UiError>> + Send + 'a>>;

/// Everything a verification pipeline can tell (or ask) the user during one
/// identify session.
///
/// Implementations render prompts, relay them to a remote frontend, or, like
/// [`BufferedIdentifyUi`](crate::BufferedIdentifyUi), decide whether to show
/// them at all. Operations are called in pipeline order and may be called from
/// several tasks at once.
pub trait IdentifyUi: Send + Sync {
    /// Announce the session: who is identified and why.
    fn start(&self, subject: String, reason: IdentifyReason) -> UiFut<'_>;

    fn display_key(&self, key: IdentifyKey) -> UiFut<'_>;

    /// Report the previous track of the subject. `None` means there was none.
    fn report_last_track(&self, summary: Option<TrackSummary>) -> UiFut<'_>;

    fn launch_network_checks(&self, identity: Identity, user: User) -> UiFut<'_>;

    fn display_user_card(&self, card: UserCard) -> UiFut<'_>;

    fn finish_social_proof_check(&self, proof: RemoteProof, result: LinkCheckResult)
    -> UiFut<'_>;

    fn finish_web_proof_check(&self, proof: RemoteProof, result: LinkCheckResult) -> UiFut<'_>;

    fn display_cryptocurrency(&self, currency: Cryptocurrency) -> UiFut<'_>;

    fn display_track_statement(&self, statement: String) -> UiFut<'_>;

    fn display_tlf_create_with_invite(&self, invite: TlfCreateWithInvite) -> UiFut<'_>;

    /// Ask the user whether the identified user checks out.
    fn confirm(&self, outcome: IdentifyOutcome) -> UiFut<'_, ConfirmResult>;

    fn report_track_token(&self, token: TrackToken) -> UiFut<'_>;

    /// The session is over.
    fn finish(&self) -> UiFut<'_>;

    /// Close any UI still open for `username`, e.g. because another device
    /// handled it.
    fn dismiss(&self, username: String, reason: DismissReason) -> UiFut<'_>;
}

impl<T: IdentifyUi + ?Sized> IdentifyUi for Arc<T> {
    fn start(&self, subject: String, reason: IdentifyReason) -> UiFut<'_> {
        (**self).start(subject, reason)
    }

    fn display_key(&self, key: IdentifyKey) -> UiFut<'_> {
        (**self).display_key(key)
    }

    fn report_last_track(&self, summary: Option<TrackSummary>) -> UiFut<'_> {
        (**self).report_last_track(summary)
    }

    fn launch_network_checks(&self, identity: Identity, user: User) -> UiFut<'_> {
        (**self).launch_network_checks(identity, user)
    }

    fn display_user_card(&self, card: UserCard) -> UiFut<'_> {
        (**self).display_user_card(card)
    }

    fn finish_social_proof_check(
        &self,
        proof: RemoteProof,
        result: LinkCheckResult,
    ) -> UiFut<'_> {
        (**self).finish_social_proof_check(proof, result)
    }

    fn finish_web_proof_check(&self, proof: RemoteProof, result: LinkCheckResult) -> UiFut<'_> {
        (**self).finish_web_proof_check(proof, result)
    }

    fn display_cryptocurrency(&self, currency: Cryptocurrency) -> UiFut<'_> {
        (**self).display_cryptocurrency(currency)
    }

    fn display_track_statement(&self, statement: String) -> UiFut<'_> {
        (**self).display_track_statement(statement)
    }

    fn display_tlf_create_with_invite(&self, invite: TlfCreateWithInvite) -> UiFut<'_> {
        (**self).display_tlf_create_with_invite(invite)
    }

    fn confirm(&self, outcome: IdentifyOutcome) -> UiFut<'_, ConfirmResult> {
        (**self).confirm(outcome)
    }

    fn report_track_token(&self, token: TrackToken) -> UiFut<'_> {
        (**self).report_track_token(token)
    }

    fn finish(&self) -> UiFut<'_> {
        (**self).finish()
    }

    fn dismiss(&self, username: String, reason: DismissReason) -> UiFut<'_> {
        (**self).dismiss(username, reason)
    }
}

/// Names of the [`IdentifyUi`] operations, for logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiCallKind {
    Start,
    DisplayKey,
    ReportLastTrack,
    LaunchNetworkChecks,
    DisplayUserCard,
    FinishSocialProofCheck,
    FinishWebProofCheck,
    DisplayCryptocurrency,
    DisplayTrackStatement,
    DisplayTlfCreateWithInvite,
    Confirm,
    ReportTrackToken,
    Finish,
    Dismiss,
}

impl UiCallKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::DisplayKey => "display_key",
            Self::ReportLastTrack => "report_last_track",
            Self::LaunchNetworkChecks => "launch_network_checks",
            Self::DisplayUserCard => "display_user_card",
            Self::FinishSocialProofCheck => "finish_social_proof_check",
            Self::FinishWebProofCheck => "finish_web_proof_check",
            Self::DisplayCryptocurrency => "display_cryptocurrency",
            Self::DisplayTrackStatement => "display_track_statement",
            Self::DisplayTlfCreateWithInvite => "display_tlf_create_with_invite",
            Self::Confirm => "confirm",
            Self::ReportTrackToken => "report_track_token",
            Self::Finish => "finish",
            Self::Dismiss => "dismiss",
        }
    }
}

impl fmt::Display for UiCallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
