//! An identify UI that writes down what it was asked to show.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use identify_types::{
    ConfirmResult, Cryptocurrency, DismissReason, IdentifyKey, IdentifyOutcome, IdentifyReason,
    Identity, LinkCheckResult, RemoteProof, TlfCreateWithInvite, TrackSummary, TrackToken, User,
    UserCard,
};
use serde::{Deserialize, Serialize};

use crate::{IdentifyUi, UiCallKind, UiError, UiFut};

/// One call that reached a [`RecordingUi`], with its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum UiCall {
    Start {
        subject: String,
        reason: IdentifyReason,
    },
    DisplayKey {
        key: IdentifyKey,
    },
    ReportLastTrack {
        summary: Option<TrackSummary>,
    },
    LaunchNetworkChecks {
        identity: Identity,
        user: User,
    },
    DisplayUserCard {
        card: UserCard,
    },
    FinishSocialProofCheck {
        proof: RemoteProof,
        result: LinkCheckResult,
    },
    FinishWebProofCheck {
        proof: RemoteProof,
        result: LinkCheckResult,
    },
    DisplayCryptocurrency {
        currency: Cryptocurrency,
    },
    DisplayTrackStatement {
        statement: String,
    },
    DisplayTlfCreateWithInvite {
        invite: TlfCreateWithInvite,
    },
    Confirm {
        outcome: IdentifyOutcome,
    },
    ReportTrackToken {
        token: TrackToken,
    },
    Finish,
    Dismiss {
        username: String,
        reason: DismissReason,
    },
}

impl UiCall {
    #[must_use]
    pub fn kind(&self) -> UiCallKind {
        match self {
            Self::Start { .. } => UiCallKind::Start,
            Self::DisplayKey { .. } => UiCallKind::DisplayKey,
            Self::ReportLastTrack { .. } => UiCallKind::ReportLastTrack,
            Self::LaunchNetworkChecks { .. } => UiCallKind::LaunchNetworkChecks,
            Self::DisplayUserCard { .. } => UiCallKind::DisplayUserCard,
            Self::FinishSocialProofCheck { .. } => UiCallKind::FinishSocialProofCheck,
            Self::FinishWebProofCheck { .. } => UiCallKind::FinishWebProofCheck,
            Self::DisplayCryptocurrency { .. } => UiCallKind::DisplayCryptocurrency,
            Self::DisplayTrackStatement { .. } => UiCallKind::DisplayTrackStatement,
            Self::DisplayTlfCreateWithInvite { .. } => UiCallKind::DisplayTlfCreateWithInvite,
            Self::Confirm { .. } => UiCallKind::Confirm,
            Self::ReportTrackToken { .. } => UiCallKind::ReportTrackToken,
            Self::Finish => UiCallKind::Finish,
            Self::Dismiss { .. } => UiCallKind::Dismiss,
        }
    }
}

/// [`IdentifyUi`] that keeps a transcript of every call it accepted.
///
/// `confirm` answers with a fixed [`ConfirmResult`]. Operations registered
/// with [`RecordingUi::failing_on`] return the given error and are left out
/// of the transcript.
#[derive(Debug, Default)]
pub struct RecordingUi {
    transcript: Mutex<Vec<UiCall>>,
    confirm_result: ConfirmResult,
    failures: HashMap<UiCallKind, UiError>,
}

impl RecordingUi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_confirm_result(mut self, result: ConfirmResult) -> Self {
        self.confirm_result = result;
        self
    }

    pub fn failing_on(mut self, operation: UiCallKind, error: UiError) -> Self {
        self.failures.insert(operation, error);
        self
    }

    /// Calls accepted so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<UiCall> {
        self.lock().clone()
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<UiCallKind> {
        self.lock().iter().map(UiCall::kind).collect()
    }

    /// Take the transcript, leaving it empty.
    pub fn take_calls(&self) -> Vec<UiCall> {
        std::mem::take(&mut *self.lock())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UiCall>> {
        self.transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn accept(&self, call: UiCall) -> Result<(), UiError> {
        if let Some(error) = self.failures.get(&call.kind()) {
            return Err(error.clone());
        }
        self.lock().push(call);
        Ok(())
    }

    fn record(&self, call: UiCall) -> UiFut<'_> {
        let result = self.accept(call);
        Box::pin(std::future::ready(result))
    }
}

impl IdentifyUi for RecordingUi {
    fn start(&self, subject: String, reason: IdentifyReason) -> UiFut<'_> {
        self.record(UiCall::Start { subject, reason })
    }

    fn display_key(&self, key: IdentifyKey) -> UiFut<'_> {
        self.record(UiCall::DisplayKey { key })
    }

    fn report_last_track(&self, summary: Option<TrackSummary>) -> UiFut<'_> {
        self.record(UiCall::ReportLastTrack { summary })
    }

    fn launch_network_checks(&self, identity: Identity, user: User) -> UiFut<'_> {
        self.record(UiCall::LaunchNetworkChecks { identity, user })
    }

    fn display_user_card(&self, card: UserCard) -> UiFut<'_> {
        self.record(UiCall::DisplayUserCard { card })
    }

    fn finish_social_proof_check(
        &self,
        proof: RemoteProof,
        result: LinkCheckResult,
    ) -> UiFut<'_> {
        self.record(UiCall::FinishSocialProofCheck { proof, result })
    }

    fn finish_web_proof_check(&self, proof: RemoteProof, result: LinkCheckResult) -> UiFut<'_> {
        self.record(UiCall::FinishWebProofCheck { proof, result })
    }

    fn display_cryptocurrency(&self, currency: Cryptocurrency) -> UiFut<'_> {
        self.record(UiCall::DisplayCryptocurrency { currency })
    }

    fn display_track_statement(&self, statement: String) -> UiFut<'_> {
        self.record(UiCall::DisplayTrackStatement { statement })
    }

    fn display_tlf_create_with_invite(&self, invite: TlfCreateWithInvite) -> UiFut<'_> {
        self.record(UiCall::DisplayTlfCreateWithInvite { invite })
    }

    fn confirm(&self, outcome: IdentifyOutcome) -> UiFut<'_, ConfirmResult> {
        let result = self
            .accept(UiCall::Confirm { outcome })
            .map(|()| self.confirm_result);
        Box::pin(std::future::ready(result))
    }

    fn report_track_token(&self, token: TrackToken) -> UiFut<'_> {
        self.record(UiCall::ReportTrackToken { token })
    }

    fn finish(&self) -> UiFut<'_> {
        self.record(UiCall::Finish)
    }

    fn dismiss(&self, username: String, reason: DismissReason) -> UiFut<'_> {
        self.record(UiCall::Dismiss { username, reason })
    }
}
