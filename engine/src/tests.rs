//! Unit tests for the engine crate.

use std::sync::Arc;
use std::time::Duration;

use identify_types::{
    ConfirmResult, Cryptocurrency, DismissReason, DismissReasonType, IdentifyKey, IdentifyOutcome,
    IdentifyReason, IdentifyReasonType, Identity, LinkCheckResult, ProofType, RemoteProof,
    TlfCreateWithInvite, TrackSummary, TrackToken, User, UserCard,
};
use pretty_assertions::assert_eq;
use tokio::sync::Notify;
use tokio::time::timeout;

use super::*;

fn canned() -> ConfirmResult {
    ConfirmResult {
        identity_confirmed: true,
        auto_confirmed: true,
        ..ConfirmResult::default()
    }
}

fn session_with(ui: RecordingUi) -> (Arc<RecordingUi>, BufferedIdentifyUi<Arc<RecordingUi>>) {
    let ui = Arc::new(ui);
    let buffered = BufferedIdentifyUi::new(Arc::clone(&ui), canned());
    (ui, buffered)
}

fn session() -> (Arc<RecordingUi>, BufferedIdentifyUi<Arc<RecordingUi>>) {
    session_with(RecordingUi::new())
}

fn reason(kind: IdentifyReasonType) -> IdentifyReason {
    IdentifyReason::new(kind, "")
}

fn key(kid: &str) -> IdentifyKey {
    IdentifyKey {
        kid: kid.to_string(),
        ..IdentifyKey::default()
    }
}

fn proof(proof_type: ProofType, value: &str) -> RemoteProof {
    RemoteProof {
        proof_type,
        value: value.to_string(),
        ..RemoteProof::default()
    }
}

fn link(proof_id: u32, breaks_tracking: bool) -> LinkCheckResult {
    LinkCheckResult {
        proof_id,
        breaks_tracking,
        ..LinkCheckResult::default()
    }
}

fn coin(address: &str) -> Cryptocurrency {
    Cryptocurrency {
        row_id: 1,
        kind: "bitcoin".to_string(),
        address: address.to_string(),
    }
}

fn user(username: &str) -> User {
    User {
        uid: format!("uid-{username}"),
        username: username.to_string(),
    }
}

fn identity(breaks_tracking: bool) -> Identity {
    Identity {
        when: 1_700_000_000,
        breaks_tracking,
        revoked: Vec::new(),
    }
}

fn summary(username: &str) -> TrackSummary {
    TrackSummary {
        username: username.to_string(),
        time: 1_600_000_000,
        is_remote: true,
    }
}

// ── Scenarios ────────────────────────────────────────────────

#[tokio::test]
async fn clean_session_is_confirmed_without_the_ui() {
    let (ui, buffered) = session();

    buffered
        .start("alice".to_string(), reason(IdentifyReasonType::Id))
        .await
        .unwrap();
    buffered.display_key(key("K1")).await.unwrap();
    buffered
        .finish_web_proof_check(proof(ProofType::GenericWebSite, "alice.example"), link(1, false))
        .await
        .unwrap();

    let result = buffered.confirm(IdentifyOutcome::default()).await.unwrap();

    assert_eq!(result, canned());
    assert!(ui.is_empty());
    assert_eq!(buffered.suppression().await, Suppression::Suppressed);
    assert_eq!(buffered.phase().await, SessionPhase::Buffering);
    assert_eq!(buffered.pending_len().await, 0);

    buffered.finish().await.unwrap();
    buffered
        .report_track_token(TrackToken::new("tok"))
        .await
        .unwrap();
    assert!(ui.is_empty());
}

#[tokio::test]
async fn trust_break_replays_before_returning() {
    let (ui, buffered) = session();
    let bob_reason = reason(IdentifyReasonType::Track);

    buffered
        .start("bob".to_string(), bob_reason.clone())
        .await
        .unwrap();
    assert!(ui.is_empty());

    buffered
        .finish_social_proof_check(proof(ProofType::Twitter, "bob"), link(2, true))
        .await
        .unwrap();

    assert_eq!(
        ui.calls(),
        vec![
            UiCall::Start {
                subject: "bob".to_string(),
                reason: bob_reason,
            },
            UiCall::FinishSocialProofCheck {
                proof: proof(ProofType::Twitter, "bob"),
                result: link(2, true),
            },
        ]
    );
    assert!(!buffered.is_buffering().await);
    assert_eq!(buffered.phase().await, SessionPhase::Flushed);
}

#[tokio::test]
async fn notifications_after_flush_pass_through_one_at_a_time() {
    let (ui, buffered) = session();
    buffered
        .start("bob".to_string(), reason(IdentifyReasonType::Track))
        .await
        .unwrap();
    buffered
        .finish_social_proof_check(proof(ProofType::Twitter, "bob"), link(2, true))
        .await
        .unwrap();
    ui.take_calls();

    buffered.display_cryptocurrency(coin("C1")).await.unwrap();
    assert_eq!(
        ui.take_calls(),
        vec![UiCall::DisplayCryptocurrency {
            currency: coin("C1")
        }]
    );

    buffered.display_key(key("K2")).await.unwrap();
    buffered
        .finish_web_proof_check(proof(ProofType::Dns, "bob.example"), link(3, false))
        .await
        .unwrap();
    assert_eq!(
        ui.kinds(),
        vec![UiCallKind::DisplayKey, UiCallKind::FinishWebProofCheck]
    );
    assert_eq!(buffered.pending_len().await, 0);
}

// ── Replay order ─────────────────────────────────────────────

#[tokio::test]
async fn replay_uses_canonical_order_regardless_of_arrival() {
    let (ui, buffered) = session();

    buffered.display_cryptocurrency(coin("C1")).await.unwrap();
    buffered
        .finish_social_proof_check(proof(ProofType::Github, "carol"), link(1, false))
        .await
        .unwrap();
    buffered
        .display_user_card(UserCard {
            full_name: "Carol".to_string(),
            ..UserCard::default()
        })
        .await
        .unwrap();
    buffered
        .launch_network_checks(identity(false), user("carol"))
        .await
        .unwrap();
    buffered
        .report_last_track(Some(summary("carol")))
        .await
        .unwrap();
    buffered.display_key(key("K1")).await.unwrap();
    buffered.display_key(key("K2")).await.unwrap();
    buffered
        .start("carol".to_string(), reason(IdentifyReasonType::Id))
        .await
        .unwrap();
    buffered.display_cryptocurrency(coin("C2")).await.unwrap();
    assert!(ui.is_empty());
    assert_eq!(buffered.pending_len().await, 9);

    buffered
        .finish_web_proof_check(proof(ProofType::GenericWebSite, "carol.example"), link(2, true))
        .await
        .unwrap();

    assert_eq!(
        ui.kinds(),
        vec![
            UiCallKind::Start,
            UiCallKind::DisplayKey,
            UiCallKind::DisplayKey,
            UiCallKind::ReportLastTrack,
            UiCallKind::LaunchNetworkChecks,
            UiCallKind::DisplayUserCard,
            UiCallKind::FinishSocialProofCheck,
            UiCallKind::FinishWebProofCheck,
            UiCallKind::DisplayCryptocurrency,
            UiCallKind::DisplayCryptocurrency,
        ]
    );

    let calls = ui.calls();
    assert_eq!(calls[1], UiCall::DisplayKey { key: key("K1") });
    assert_eq!(calls[2], UiCall::DisplayKey { key: key("K2") });
    assert_eq!(
        calls[8],
        UiCall::DisplayCryptocurrency {
            currency: coin("C1")
        }
    );
    assert_eq!(
        calls[9],
        UiCall::DisplayCryptocurrency {
            currency: coin("C2")
        }
    );
}

#[tokio::test]
async fn repeated_announcements_keep_the_latest_value() {
    let (ui, buffered) = session();

    buffered
        .start("first".to_string(), reason(IdentifyReasonType::Id))
        .await
        .unwrap();
    buffered
        .start("second".to_string(), reason(IdentifyReasonType::Track))
        .await
        .unwrap();
    buffered
        .display_user_card(UserCard {
            bio: "old".to_string(),
            ..UserCard::default()
        })
        .await
        .unwrap();
    buffered
        .display_user_card(UserCard {
            bio: "new".to_string(),
            ..UserCard::default()
        })
        .await
        .unwrap();
    buffered
        .launch_network_checks(identity(true), user("second"))
        .await
        .unwrap();

    assert_eq!(
        ui.calls(),
        vec![
            UiCall::Start {
                subject: "second".to_string(),
                reason: reason(IdentifyReasonType::Track),
            },
            UiCall::LaunchNetworkChecks {
                identity: identity(true),
                user: user("second"),
            },
            UiCall::DisplayUserCard {
                card: UserCard {
                    bio: "new".to_string(),
                    ..UserCard::default()
                },
            },
        ]
    );
}

#[tokio::test]
async fn reported_empty_last_track_differs_from_never_reported() {
    let (ui, buffered) = session();
    buffered.report_last_track(None).await.unwrap();
    buffered
        .finish_social_proof_check(proof(ProofType::Reddit, "dave"), link(1, true))
        .await
        .unwrap();
    assert_eq!(
        ui.calls()[0],
        UiCall::ReportLastTrack { summary: None }
    );

    let (ui, buffered) = session();
    buffered
        .finish_social_proof_check(proof(ProofType::Reddit, "dave"), link(1, true))
        .await
        .unwrap();
    assert_eq!(ui.kinds(), vec![UiCallKind::FinishSocialProofCheck]);
}

// ── Trust-break signals ──────────────────────────────────────

#[tokio::test]
async fn only_proof_checks_and_network_checks_break_tracking() {
    let (ui, buffered) = session();

    buffered
        .start("erin".to_string(), reason(IdentifyReasonType::Id))
        .await
        .unwrap();
    buffered.display_key(key("K1")).await.unwrap();
    buffered.report_last_track(None).await.unwrap();
    buffered
        .launch_network_checks(identity(false), user("erin"))
        .await
        .unwrap();
    buffered.display_user_card(UserCard::default()).await.unwrap();
    buffered
        .finish_social_proof_check(proof(ProofType::Twitter, "erin"), link(1, false))
        .await
        .unwrap();
    buffered
        .finish_web_proof_check(proof(ProofType::Dns, "erin.example"), link(2, false))
        .await
        .unwrap();
    buffered.display_cryptocurrency(coin("C1")).await.unwrap();

    assert!(ui.is_empty());
    assert!(buffered.is_buffering().await);
    assert_eq!(buffered.pending_len().await, 8);
}

#[tokio::test]
async fn broken_identity_snapshot_triggers_replay() {
    let (ui, buffered) = session();
    buffered
        .start("frank".to_string(), reason(IdentifyReasonType::Id))
        .await
        .unwrap();
    buffered.display_key(key("K1")).await.unwrap();

    buffered
        .launch_network_checks(identity(true), user("frank"))
        .await
        .unwrap();

    assert_eq!(
        ui.kinds(),
        vec![
            UiCallKind::Start,
            UiCallKind::DisplayKey,
            UiCallKind::LaunchNetworkChecks,
        ]
    );
    assert_eq!(buffered.phase().await, SessionPhase::Flushed);
}

// ── Confirmation and completion ──────────────────────────────

#[tokio::test]
async fn confirm_after_flush_asks_the_ui() {
    let answer = ConfirmResult {
        remote_confirmed: true,
        ..ConfirmResult::default()
    };
    let (ui, buffered) = session_with(RecordingUi::new().with_confirm_result(answer));
    buffered
        .finish_social_proof_check(proof(ProofType::Twitter, "gina"), link(1, true))
        .await
        .unwrap();

    let outcome = IdentifyOutcome {
        username: "gina".to_string(),
        num_proof_failures: 1,
        ..IdentifyOutcome::default()
    };
    let result = buffered.confirm(outcome.clone()).await.unwrap();

    assert_eq!(result, answer);
    assert_eq!(ui.calls().last(), Some(&UiCall::Confirm { outcome }));
    assert!(!buffered.is_suppressed().await);

    buffered
        .report_track_token(TrackToken::new("tok"))
        .await
        .unwrap();
    buffered.finish().await.unwrap();
    assert_eq!(
        &ui.kinds()[2..],
        &[UiCallKind::ReportTrackToken, UiCallKind::Finish]
    );
}

#[tokio::test]
async fn finish_while_buffering_forwards_without_flushing() {
    let (ui, buffered) = session();
    buffered
        .start("hank".to_string(), reason(IdentifyReasonType::Id))
        .await
        .unwrap();
    buffered.display_key(key("K1")).await.unwrap();

    buffered
        .report_track_token(TrackToken::new("tok"))
        .await
        .unwrap();
    buffered.finish().await.unwrap();

    assert_eq!(
        ui.calls(),
        vec![
            UiCall::ReportTrackToken {
                token: TrackToken::new("tok"),
            },
            UiCall::Finish,
        ]
    );
    assert!(buffered.is_buffering().await);
    assert_eq!(buffered.pending_len().await, 2);
}

#[tokio::test]
async fn trust_break_after_suppression_replays_only_new_notifications() {
    let answer = ConfirmResult {
        remote_confirmed: true,
        ..ConfirmResult::default()
    };
    let (ui, buffered) = session_with(RecordingUi::new().with_confirm_result(answer));
    buffered.display_key(key("K1")).await.unwrap();
    assert_eq!(
        buffered.confirm(IdentifyOutcome::default()).await.unwrap(),
        canned()
    );

    buffered.display_key(key("K2")).await.unwrap();
    assert!(ui.is_empty());
    assert_eq!(buffered.pending_len().await, 1);

    buffered
        .finish_social_proof_check(proof(ProofType::Twitter, "ivy"), link(1, true))
        .await
        .unwrap();

    assert_eq!(
        ui.take_calls(),
        vec![
            UiCall::DisplayKey { key: key("K2") },
            UiCall::FinishSocialProofCheck {
                proof: proof(ProofType::Twitter, "ivy"),
                result: link(1, true),
            },
        ]
    );
    assert!(!buffered.is_buffering().await);
    assert!(buffered.is_suppressed().await);

    // Confirmation now reaches the UI, completion calls stay dropped.
    assert_eq!(
        buffered.confirm(IdentifyOutcome::default()).await.unwrap(),
        answer
    );
    buffered
        .report_track_token(TrackToken::new("tok"))
        .await
        .unwrap();
    buffered.finish().await.unwrap();
    assert_eq!(ui.kinds(), vec![UiCallKind::Confirm]);
}

#[tokio::test]
async fn repeated_confirm_while_buffering_stays_canned() {
    let (ui, buffered) = session();
    buffered.display_key(key("K1")).await.unwrap();
    buffered.confirm(IdentifyOutcome::default()).await.unwrap();

    buffered.display_cryptocurrency(coin("C1")).await.unwrap();
    assert_eq!(
        buffered.confirm(IdentifyOutcome::default()).await.unwrap(),
        canned()
    );

    assert!(ui.is_empty());
    assert_eq!(buffered.pending_len().await, 0);
    assert_eq!(buffered.phase().await, SessionPhase::Buffering);
}

// ── Passthrough ──────────────────────────────────────────────

#[tokio::test]
async fn passthrough_operations_are_never_buffered() {
    let (ui, buffered) = session();
    buffered
        .start("jill".to_string(), reason(IdentifyReasonType::Id))
        .await
        .unwrap();

    buffered
        .display_track_statement("jill is jill".to_string())
        .await
        .unwrap();
    buffered
        .display_tlf_create_with_invite(TlfCreateWithInvite {
            folder_name: "jill,kate@twitter".to_string(),
            ..TlfCreateWithInvite::default()
        })
        .await
        .unwrap();
    assert_eq!(
        ui.kinds(),
        vec![
            UiCallKind::DisplayTrackStatement,
            UiCallKind::DisplayTlfCreateWithInvite,
        ]
    );

    buffered.confirm(IdentifyOutcome::default()).await.unwrap();
    buffered
        .dismiss(
            "jill".to_string(),
            DismissReason {
                kind: DismissReasonType::HandledElsewhere,
                ..DismissReason::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(ui.kinds().last(), Some(&UiCallKind::Dismiss));
    assert_eq!(ui.len(), 3);
}

/// Delegates to a [`RecordingUi`], but holds every `display_key` until released.
#[derive(Default)]
struct GatedUi {
    recorder: RecordingUi,
    entered: Notify,
    release: Notify,
}

impl IdentifyUi for GatedUi {
    fn start(&self, subject: String, reason: IdentifyReason) -> UiFut<'_> {
        self.recorder.start(subject, reason)
    }

    fn display_key(&self, key: IdentifyKey) -> UiFut<'_> {
        Box::pin(async move {
            self.entered.notify_one();
            self.release.notified().await;
            self.recorder.display_key(key).await
        })
    }

    fn report_last_track(&self, summary: Option<TrackSummary>) -> UiFut<'_> {
        self.recorder.report_last_track(summary)
    }

    fn launch_network_checks(&self, identity: Identity, user: User) -> UiFut<'_> {
        self.recorder.launch_network_checks(identity, user)
    }

    fn display_user_card(&self, card: UserCard) -> UiFut<'_> {
        self.recorder.display_user_card(card)
    }

    fn finish_social_proof_check(
        &self,
        proof: RemoteProof,
        result: LinkCheckResult,
    ) -> UiFut<'_> {
        self.recorder.finish_social_proof_check(proof, result)
    }

    fn finish_web_proof_check(&self, proof: RemoteProof, result: LinkCheckResult) -> UiFut<'_> {
        self.recorder.finish_web_proof_check(proof, result)
    }

    fn display_cryptocurrency(&self, currency: Cryptocurrency) -> UiFut<'_> {
        self.recorder.display_cryptocurrency(currency)
    }

    fn display_track_statement(&self, statement: String) -> UiFut<'_> {
        self.recorder.display_track_statement(statement)
    }

    fn display_tlf_create_with_invite(&self, invite: TlfCreateWithInvite) -> UiFut<'_> {
        self.recorder.display_tlf_create_with_invite(invite)
    }

    fn confirm(&self, outcome: IdentifyOutcome) -> UiFut<'_, ConfirmResult> {
        self.recorder.confirm(outcome)
    }

    fn report_track_token(&self, token: TrackToken) -> UiFut<'_> {
        self.recorder.report_track_token(token)
    }

    fn finish(&self) -> UiFut<'_> {
        self.recorder.finish()
    }

    fn dismiss(&self, username: String, reason: DismissReason) -> UiFut<'_> {
        self.recorder.dismiss(username, reason)
    }
}

#[tokio::test]
async fn passthrough_operations_do_not_wait_for_a_replay() {
    let gated = Arc::new(GatedUi::default());
    let buffered = Arc::new(BufferedIdentifyUi::new(Arc::clone(&gated), canned()));
    buffered.display_key(key("K1")).await.unwrap();

    let replay = tokio::spawn({
        let buffered = Arc::clone(&buffered);
        async move {
            buffered
                .finish_social_proof_check(proof(ProofType::Twitter, "owen"), link(1, true))
                .await
        }
    });
    gated.entered.notified().await;

    // The replay holds the session lock while the UI is stuck on the key.
    assert!(
        timeout(Duration::from_millis(50), buffered.pending_len())
            .await
            .is_err()
    );

    let quick = Duration::from_secs(5);
    timeout(quick, buffered.display_track_statement("owen is owen".to_string()))
        .await
        .unwrap()
        .unwrap();
    timeout(
        quick,
        buffered.display_tlf_create_with_invite(TlfCreateWithInvite::default()),
    )
    .await
    .unwrap()
    .unwrap();
    timeout(
        quick,
        buffered.dismiss("owen".to_string(), DismissReason::default()),
    )
    .await
    .unwrap()
    .unwrap();

    gated.release.notify_one();
    replay.await.unwrap().unwrap();

    assert_eq!(
        gated.recorder.kinds(),
        vec![
            UiCallKind::DisplayTrackStatement,
            UiCallKind::DisplayTlfCreateWithInvite,
            UiCallKind::Dismiss,
            UiCallKind::DisplayKey,
            UiCallKind::FinishSocialProofCheck,
        ]
    );
}

// ── Errors ───────────────────────────────────────────────────

#[tokio::test]
async fn replay_failure_aborts_and_leaves_session_flushed() {
    let error = UiError::rejected(UiCallKind::DisplayKey, "key display unavailable");
    let (ui, buffered) =
        session_with(RecordingUi::new().failing_on(UiCallKind::DisplayKey, error.clone()));

    buffered
        .start("liam".to_string(), reason(IdentifyReasonType::Id))
        .await
        .unwrap();
    buffered.display_key(key("K1")).await.unwrap();
    buffered.display_cryptocurrency(coin("C1")).await.unwrap();

    let err = buffered
        .finish_social_proof_check(proof(ProofType::Twitter, "liam"), link(1, true))
        .await
        .unwrap_err();

    assert_eq!(err, error);
    assert_eq!(ui.kinds(), vec![UiCallKind::Start]);
    assert_eq!(buffered.phase().await, SessionPhase::Flushed);
    assert_eq!(buffered.pending_len().await, 0);

    // Nothing from the failed replay is retried.
    buffered.display_cryptocurrency(coin("C2")).await.unwrap();
    assert_eq!(
        ui.calls().last(),
        Some(&UiCall::DisplayCryptocurrency {
            currency: coin("C2")
        })
    );
    assert_eq!(ui.len(), 2);
}

#[tokio::test]
async fn passthrough_errors_surface_verbatim() {
    let error = UiError::Transport("frontend went away".to_string());
    let (_ui, buffered) = session_with(
        RecordingUi::new()
            .failing_on(UiCallKind::Finish, error.clone())
            .failing_on(
                UiCallKind::Dismiss,
                UiError::Canceled {
                    operation: UiCallKind::Dismiss,
                },
            ),
    );

    assert_eq!(buffered.finish().await.unwrap_err(), error);
    assert_eq!(
        buffered
            .dismiss("mia".to_string(), DismissReason::default())
            .await
            .unwrap_err()
            .to_string(),
        "UI prompt canceled during dismiss"
    );
    assert!(buffered.is_buffering().await);
}

// ── Concurrency ──────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_producers_reach_the_ui_exactly_once() {
    let (ui, buffered) = session();
    let buffered = Arc::new(buffered);

    let mut handles = Vec::new();
    for i in 0..16 {
        let buffered = Arc::clone(&buffered);
        handles.push(tokio::spawn(async move {
            buffered.display_key(key(&format!("before-{i}"))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert!(ui.is_empty());

    buffered
        .finish_social_proof_check(proof(ProofType::Twitter, "nora"), link(1, true))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let buffered = Arc::clone(&buffered);
        handles.push(tokio::spawn(async move {
            buffered.display_key(key(&format!("after-{i}"))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let kinds = ui.kinds();
    assert_eq!(kinds.len(), 33);
    assert!(kinds[..16].iter().all(|k| *k == UiCallKind::DisplayKey));
    assert_eq!(kinds[16], UiCallKind::FinishSocialProofCheck);

    let mut kids: Vec<String> = ui
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            UiCall::DisplayKey { key } => Some(key.kid),
            _ => None,
        })
        .collect();
    kids.sort();
    kids.dedup();
    assert_eq!(kids.len(), 32);
}

#[tokio::test]
async fn buffered_ui_is_usable_as_a_trait_object() {
    let ui = Arc::new(RecordingUi::new());
    let buffered: Box<dyn IdentifyUi> =
        Box::new(BufferedIdentifyUi::new(Arc::clone(&ui), canned()));

    buffered.display_key(key("K1")).await.unwrap();
    buffered
        .finish_web_proof_check(proof(ProofType::GenericWebSite, "o.example"), link(1, true))
        .await
        .unwrap();

    assert_eq!(
        ui.kinds(),
        vec![UiCallKind::DisplayKey, UiCallKind::FinishWebProofCheck]
    );
}
