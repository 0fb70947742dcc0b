//! Speculative identify UI.
//!
//! [`BufferedIdentifyUi`] records every progress notification of an identify
//! session instead of showing it. What happens to the recording depends on
//! how the session goes:
//!
//! - A proof check or identity snapshot that breaks tracking replays the whole
//!   recording to the inner UI, in canonical order, and from then on every
//!   notification is forwarded as it arrives.
//! - A confirmation request that arrives while nothing has broken is answered
//!   with the canned [`ConfirmResult`] without asking the inner UI, and the
//!   recording is thrown away. Recording carries on afresh: a later break
//!   still replays whatever arrived after the discard. Track token and finish
//!   calls are dropped for the rest of the session.
//!
//! Canonical replay order is: start, keys, last track, network-check launch,
//! user card, proof checks, cryptocurrencies. Repeated announcements (start,
//! last track, network checks, user card) keep only the latest value; the
//! others keep every value in call order.
//!
//! # Locking
//!
//! Recorded state lives behind one async mutex. Bufferable and suppressible
//! operations hold it for their whole duration, including calls into the
//! inner UI, so dispatch to the inner UI is serialized even when several
//! tasks report at once. Statement, invite, and dismiss calls skip the lock
//! and go straight through.

use identify_types::{
    ConfirmResult, Cryptocurrency, DismissReason, IdentifyKey, IdentifyOutcome, IdentifyReason,
    Identity, LinkCheckResult, ProofKind, RemoteProof, TlfCreateWithInvite, TrackSummary,
    TrackToken, User, UserCard,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{IdentifyUi, UiCallKind, UiError, UiFut};

/// Whether notifications are still being recorded.
///
/// Only moves forward, `Buffering -> Flushed`, at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Recording; nothing recorded has reached the inner UI yet.
    Buffering,
    /// The recording was replayed; notifications pass straight through.
    Flushed,
}

impl SessionPhase {
    #[must_use]
    pub const fn is_buffering(self) -> bool {
        matches!(self, Self::Buffering)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buffering => "buffering",
            Self::Flushed => "flushed",
        }
    }
}

/// Whether confirmation was answered with the canned result.
///
/// Only moves forward, `Normal -> Suppressed`, at most once. Independent of
/// [`SessionPhase`]: a suppressed session still records, and still flushes
/// when tracking breaks afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Suppression {
    #[default]
    Normal,
    /// Track token and finish calls are dropped from now on.
    Suppressed,
}

impl Suppression {
    #[must_use]
    pub const fn is_suppressed(self) -> bool {
        matches!(self, Self::Suppressed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Suppressed => "suppressed",
        }
    }
}

#[derive(Debug)]
struct ProofCheck {
    kind: ProofKind,
    proof: RemoteProof,
    result: LinkCheckResult,
}

/// One bufferable notification, as received.
#[derive(Debug)]
enum Notice {
    Start {
        subject: String,
        reason: IdentifyReason,
    },
    Key(IdentifyKey),
    LastTrack(Option<TrackSummary>),
    NetworkChecks {
        identity: Identity,
        user: User,
    },
    UserCard(UserCard),
    ProofCheck(ProofCheck),
    Cryptocurrency(Cryptocurrency),
}

impl Notice {
    fn kind(&self) -> UiCallKind {
        match self {
            Self::Start { .. } => UiCallKind::Start,
            Self::Key(_) => UiCallKind::DisplayKey,
            Self::LastTrack(_) => UiCallKind::ReportLastTrack,
            Self::NetworkChecks { .. } => UiCallKind::LaunchNetworkChecks,
            Self::UserCard(_) => UiCallKind::DisplayUserCard,
            Self::ProofCheck(check) => match check.kind {
                ProofKind::Social => UiCallKind::FinishSocialProofCheck,
                ProofKind::Web => UiCallKind::FinishWebProofCheck,
            },
            Self::Cryptocurrency(_) => UiCallKind::DisplayCryptocurrency,
        }
    }

    /// Whether this notification alone invalidates the previous track.
    fn breaks_tracking(&self) -> bool {
        match self {
            Self::NetworkChecks { identity, .. } => identity.breaks_tracking,
            Self::ProofCheck(check) => check.result.breaks_tracking,
            _ => false,
        }
    }
}

/// Notifications recorded but not yet shown.
#[derive(Debug, Default)]
struct Pending {
    start: Option<(String, IdentifyReason)>,
    keys: Vec<IdentifyKey>,
    // Outer `None`: never reported. `Some(None)`: reported, no previous track.
    last_track: Option<Option<TrackSummary>>,
    network_checks: Option<(Identity, User)>,
    user_card: Option<UserCard>,
    proof_checks: Vec<ProofCheck>,
    cryptocurrencies: Vec<Cryptocurrency>,
}

impl Pending {
    fn record(&mut self, notice: Notice) {
        match notice {
            Notice::Start { subject, reason } => self.start = Some((subject, reason)),
            Notice::Key(key) => self.keys.push(key),
            Notice::LastTrack(summary) => self.last_track = Some(summary),
            Notice::NetworkChecks { identity, user } => {
                self.network_checks = Some((identity, user));
            }
            Notice::UserCard(card) => self.user_card = Some(card),
            Notice::ProofCheck(check) => self.proof_checks.push(check),
            Notice::Cryptocurrency(currency) => self.cryptocurrencies.push(currency),
        }
    }

    /// Number of inner-UI calls a replay would make.
    fn len(&self) -> usize {
        usize::from(self.start.is_some())
            + self.keys.len()
            + usize::from(self.last_track.is_some())
            + usize::from(self.network_checks.is_some())
            + usize::from(self.user_card.is_some())
            + self.proof_checks.len()
            + self.cryptocurrencies.len()
    }
}

#[derive(Debug)]
struct Session {
    phase: SessionPhase,
    suppression: Suppression,
    pending: Pending,
}

/// Decorates an [`IdentifyUi`], showing nothing unless tracking breaks.
///
/// Build one per identify session; drop it when the session ends.
pub struct BufferedIdentifyUi<U> {
    inner: U,
    confirm_if_suppressed: ConfirmResult,
    session: Mutex<Session>,
}

impl<U: IdentifyUi> BufferedIdentifyUi<U> {
    /// Wrap `inner`. `confirm_if_suppressed` answers [`IdentifyUi::confirm`]
    /// when the session ends without anything breaking.
    pub fn new(inner: U, confirm_if_suppressed: ConfirmResult) -> Self {
        Self {
            inner,
            confirm_if_suppressed,
            session: Mutex::new(Session {
                phase: SessionPhase::Buffering,
                suppression: Suppression::Normal,
                pending: Pending::default(),
            }),
        }
    }

    #[must_use]
    pub fn inner(&self) -> &U {
        &self.inner
    }

    pub fn into_inner(self) -> U {
        self.inner
    }

    pub async fn phase(&self) -> SessionPhase {
        self.session.lock().await.phase
    }

    pub async fn suppression(&self) -> Suppression {
        self.session.lock().await.suppression
    }

    pub async fn is_buffering(&self) -> bool {
        self.phase().await.is_buffering()
    }

    pub async fn is_suppressed(&self) -> bool {
        self.suppression().await.is_suppressed()
    }

    /// Number of recorded notifications still waiting for a replay.
    pub async fn pending_len(&self) -> usize {
        self.session.lock().await.pending.len()
    }

    async fn notify(&self, notice: Notice) -> Result<(), UiError> {
        let mut session = self.session.lock().await;
        let operation = notice.kind();

        match session.phase {
            SessionPhase::Buffering => {
                let breaks = notice.breaks_tracking();
                session.pending.record(notice);
                if !breaks {
                    debug!(
                        %operation,
                        pending = session.pending.len(),
                        suppressed = session.suppression.is_suppressed(),
                        "Buffered identify notification"
                    );
                    return Ok(());
                }
                info!(
                    %operation,
                    pending = session.pending.len(),
                    "Tracking broke, replaying buffered identify notifications"
                );
            }
            SessionPhase::Flushed => session.pending.record(notice),
        }

        self.flush(&mut session).await
    }

    /// Replay everything recorded and leave the buffering phase.
    ///
    /// The recording is emptied and the phase set even if the replay fails;
    /// a failed replay is not retried.
    async fn flush(&self, session: &mut Session) -> Result<(), UiError> {
        let pending = std::mem::take(&mut session.pending);
        session.phase = SessionPhase::Flushed;

        let result = self.replay(pending).await;
        if let Err(err) = &result {
            warn!(error = %err, "Identify UI replay failed, dropping the rest of the recording");
        }
        result
    }

    async fn replay(&self, pending: Pending) -> Result<(), UiError> {
        let Pending {
            start,
            keys,
            last_track,
            network_checks,
            user_card,
            proof_checks,
            cryptocurrencies,
        } = pending;

        if let Some((subject, reason)) = start {
            self.inner.start(subject, reason).await?;
        }
        for key in keys {
            self.inner.display_key(key).await?;
        }
        if let Some(summary) = last_track {
            self.inner.report_last_track(summary).await?;
        }
        if let Some((identity, user)) = network_checks {
            self.inner.launch_network_checks(identity, user).await?;
        }
        if let Some(card) = user_card {
            self.inner.display_user_card(card).await?;
        }
        for check in proof_checks {
            match check.kind {
                ProofKind::Social => {
                    self.inner
                        .finish_social_proof_check(check.proof, check.result)
                        .await?;
                }
                ProofKind::Web => {
                    self.inner
                        .finish_web_proof_check(check.proof, check.result)
                        .await?;
                }
            }
        }
        for currency in cryptocurrencies {
            self.inner.display_cryptocurrency(currency).await?;
        }

        Ok(())
    }
}

impl<U: IdentifyUi> IdentifyUi for BufferedIdentifyUi<U> {
    fn start(&self, subject: String, reason: IdentifyReason) -> UiFut<'_> {
        Box::pin(self.notify(Notice::Start { subject, reason }))
    }

    fn display_key(&self, key: IdentifyKey) -> UiFut<'_> {
        Box::pin(self.notify(Notice::Key(key)))
    }

    fn report_last_track(&self, summary: Option<TrackSummary>) -> UiFut<'_> {
        Box::pin(self.notify(Notice::LastTrack(summary)))
    }

    fn launch_network_checks(&self, identity: Identity, user: User) -> UiFut<'_> {
        Box::pin(self.notify(Notice::NetworkChecks { identity, user }))
    }

    fn display_user_card(&self, card: UserCard) -> UiFut<'_> {
        Box::pin(self.notify(Notice::UserCard(card)))
    }

    fn finish_social_proof_check(
        &self,
        proof: RemoteProof,
        result: LinkCheckResult,
    ) -> UiFut<'_> {
        Box::pin(self.notify(Notice::ProofCheck(ProofCheck {
            kind: ProofKind::Social,
            proof,
            result,
        })))
    }

    fn finish_web_proof_check(&self, proof: RemoteProof, result: LinkCheckResult) -> UiFut<'_> {
        Box::pin(self.notify(Notice::ProofCheck(ProofCheck {
            kind: ProofKind::Web,
            proof,
            result,
        })))
    }

    fn display_cryptocurrency(&self, currency: Cryptocurrency) -> UiFut<'_> {
        Box::pin(self.notify(Notice::Cryptocurrency(currency)))
    }

    fn display_track_statement(&self, statement: String) -> UiFut<'_> {
        self.inner.display_track_statement(statement)
    }

    fn display_tlf_create_with_invite(&self, invite: TlfCreateWithInvite) -> UiFut<'_> {
        self.inner.display_tlf_create_with_invite(invite)
    }

    fn confirm(&self, outcome: IdentifyOutcome) -> UiFut<'_, ConfirmResult> {
        Box::pin(async move {
            let mut session = self.session.lock().await;
            match session.phase {
                SessionPhase::Buffering => {
                    let discarded = std::mem::take(&mut session.pending).len();
                    session.suppression = Suppression::Suppressed;
                    debug!(
                        discarded,
                        "Nothing broke tracking, answering confirm without the identify UI"
                    );
                    Ok(self.confirm_if_suppressed)
                }
                SessionPhase::Flushed => {
                    self.flush(&mut session).await?;
                    self.inner.confirm(outcome).await
                }
            }
        })
    }

    fn report_track_token(&self, token: TrackToken) -> UiFut<'_> {
        Box::pin(async move {
            let session = self.session.lock().await;
            if session.suppression.is_suppressed() {
                debug!(%token, "Identify UI suppressed, not reporting track token");
                return Ok(());
            }
            self.inner.report_track_token(token).await
        })
    }

    fn finish(&self) -> UiFut<'_> {
        Box::pin(async move {
            let session = self.session.lock().await;
            if session.suppression.is_suppressed() {
                debug!("Identify UI suppressed, not forwarding finish");
                return Ok(());
            }
            self.inner.finish().await
        })
    }

    fn dismiss(&self, username: String, reason: DismissReason) -> UiFut<'_> {
        self.inner.dismiss(username, reason)
    }
}
