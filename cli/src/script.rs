//! Scripted identify sessions.
//!
//! A script is a JSON array of steps, one per identify UI operation, played
//! in order against a [`RecordingUi`], optionally behind a
//! [`BufferedIdentifyUi`].

use std::path::Path;

use anyhow::{Context, Result};
use identify_config::IdentifyConfig;
use identify_engine::{
    BufferedIdentifyUi, IdentifyUi, RecordingUi, SessionPhase, Suppression, UiCall, UiCallKind,
    UiError,
};
use identify_types::{
    ConfirmResult, Cryptocurrency, DismissReason, IdentifyKey, IdentifyOutcome, IdentifyReason,
    Identity, LinkCheckResult, ProofKind, RemoteProof, TlfCreateWithInvite, TrackSummary,
    TrackToken, User, UserCard,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    Start {
        subject: String,
        #[serde(default)]
        reason: IdentifyReason,
    },
    DisplayKey {
        key: IdentifyKey,
    },
    ReportLastTrack {
        #[serde(default)]
        summary: Option<TrackSummary>,
    },
    LaunchNetworkChecks {
        identity: Identity,
        user: User,
    },
    DisplayUserCard {
        card: UserCard,
    },
    /// Reported as a social or web check; defaults to what the proof type implies.
    FinishProofCheck {
        proof: RemoteProof,
        result: LinkCheckResult,
        #[serde(default)]
        kind: Option<ProofKind>,
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
        #[serde(default)]
        outcome: IdentifyOutcome,
    },
    ReportTrackToken {
        token: TrackToken,
    },
    Finish,
    Dismiss {
        username: String,
        #[serde(default)]
        reason: DismissReason,
    },
}

impl ScriptStep {
    fn kind(&self) -> UiCallKind {
        match self {
            Self::Start { .. } => UiCallKind::Start,
            Self::DisplayKey { .. } => UiCallKind::DisplayKey,
            Self::ReportLastTrack { .. } => UiCallKind::ReportLastTrack,
            Self::LaunchNetworkChecks { .. } => UiCallKind::LaunchNetworkChecks,
            Self::DisplayUserCard { .. } => UiCallKind::DisplayUserCard,
            Self::FinishProofCheck { proof, kind, .. } => {
                match kind.unwrap_or_else(|| proof.proof_type.kind()) {
                    ProofKind::Social => UiCallKind::FinishSocialProofCheck,
                    ProofKind::Web => UiCallKind::FinishWebProofCheck,
                }
            }
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

/// What a confirm step got back, and from whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfirmAnswer {
    pub step: usize,
    pub result: ConfirmResult,
    /// False when the buffered UI answered with its canned result.
    pub asked_ui: bool,
}

#[derive(Debug)]
pub struct ReplayReport {
    pub transcript: Vec<UiCall>,
    pub buffered: bool,
    /// Final session latches; `None` when the script ran unbuffered.
    pub phase: Option<SessionPhase>,
    pub suppression: Option<Suppression>,
    pub confirms: Vec<ConfirmAnswer>,
}

impl ReplayReport {
    /// Transcript as JSON lines followed by a summary line.
    pub fn to_json_lines(&self) -> Result<String> {
        let mut out = String::new();
        for call in &self.transcript {
            out.push_str(&serde_json::to_string(call)?);
            out.push('\n');
        }
        let summary = serde_json::json!({
            "summary": {
                "buffered": self.buffered,
                "phase": self.phase.map(SessionPhase::as_str),
                "suppression": self.suppression.map(Suppression::as_str),
                "calls": self.transcript.len(),
                "confirms": self.confirms,
            }
        });
        out.push_str(&serde_json::to_string(&summary)?);
        out.push('\n');
        Ok(out)
    }
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    parse_script(&content).with_context(|| format!("failed to parse script {}", path.display()))
}

pub fn parse_script(content: &str) -> Result<Vec<ScriptStep>> {
    Ok(serde_json::from_str(content)?)
}

/// Play `steps` in order. Stops at the first step the UI fails.
pub async fn run_script(steps: Vec<ScriptStep>, config: &IdentifyConfig) -> Result<ReplayReport> {
    if !config.session.buffered {
        let ui = RecordingUi::new();
        let confirms = drive(&ui, &ui, steps).await?;
        return Ok(ReplayReport {
            transcript: ui.take_calls(),
            buffered: false,
            phase: None,
            suppression: None,
            confirms,
        });
    }

    let buffered = BufferedIdentifyUi::new(RecordingUi::new(), config.confirm);
    let confirms = drive(&buffered, buffered.inner(), steps).await?;
    let phase = buffered.phase().await;
    let suppression = buffered.suppression().await;

    Ok(ReplayReport {
        transcript: buffered.into_inner().take_calls(),
        buffered: true,
        phase: Some(phase),
        suppression: Some(suppression),
        confirms,
    })
}

async fn drive(
    target: &dyn IdentifyUi,
    recorder: &RecordingUi,
    steps: Vec<ScriptStep>,
) -> Result<Vec<ConfirmAnswer>> {
    let mut confirms = Vec::new();

    for (index, step) in steps.into_iter().enumerate() {
        let kind = step.kind();
        tracing::debug!(step = index, operation = %kind, "Playing script step");

        let seen_before = recorder.len();
        let confirmed = apply(target, step)
            .await
            .with_context(|| format!("step {index} ({kind}) failed"))?;

        if let Some(result) = confirmed {
            confirms.push(ConfirmAnswer {
                step: index,
                result,
                asked_ui: recorder.len() > seen_before,
            });
        }
    }

    Ok(confirms)
}

async fn apply(
    target: &dyn IdentifyUi,
    step: ScriptStep,
) -> Result<Option<ConfirmResult>, UiError> {
    match step {
        ScriptStep::Start { subject, reason } => target.start(subject, reason).await?,
        ScriptStep::DisplayKey { key } => target.display_key(key).await?,
        ScriptStep::ReportLastTrack { summary } => target.report_last_track(summary).await?,
        ScriptStep::LaunchNetworkChecks { identity, user } => {
            target.launch_network_checks(identity, user).await?;
        }
        ScriptStep::DisplayUserCard { card } => target.display_user_card(card).await?,
        ScriptStep::FinishProofCheck {
            proof,
            result,
            kind,
        } => match kind.unwrap_or_else(|| proof.proof_type.kind()) {
            ProofKind::Social => target.finish_social_proof_check(proof, result).await?,
            ProofKind::Web => target.finish_web_proof_check(proof, result).await?,
        },
        ScriptStep::DisplayCryptocurrency { currency } => {
            target.display_cryptocurrency(currency).await?;
        }
        ScriptStep::DisplayTrackStatement { statement } => {
            target.display_track_statement(statement).await?;
        }
        ScriptStep::DisplayTlfCreateWithInvite { invite } => {
            target.display_tlf_create_with_invite(invite).await?;
        }
        ScriptStep::Confirm { outcome } => return Ok(Some(target.confirm(outcome).await?)),
        ScriptStep::ReportTrackToken { token } => target.report_track_token(token).await?,
        ScriptStep::Finish => target.finish().await?,
        ScriptStep::Dismiss { username, reason } => target.dismiss(username, reason).await?,
    }
    Ok(None)
}
