use crate::harness::{Harness, ScriptedProvider, at};
use chrono::Duration;
use spark::scheduler::{SuppressReason, TickOutcome};
use spark::session::SessionState;

fn yes() -> std::sync::Arc<ScriptedProvider> {
    ScriptedProvider::texts(&[r#"{"should_message": true, "message": "yo"}"#])
}

#[tokio::test]
async fn quiet_hours_wrap_midnight() {
    let h = Harness::new(ScriptedProvider::texts(&[]), yes());
    for hour in [23, 0, 3, 7] {
        let outcome = h.runtime.scheduler.run_tick(at(hour, 15)).await;
        assert_eq!(
            outcome,
            TickOutcome::Suppressed(SuppressReason::QuietHours),
            "hour {hour}"
        );
    }
    assert_eq!(h.proactive.calls(), 0);

    assert!(h.runtime.scheduler.run_tick(at(8, 0)).await.was_sent());
}

#[tokio::test]
async fn every_tick_is_suppressed_while_user_is_interacting() {
    let h = Harness::new(ScriptedProvider::texts(&[]), yes());
    let coordinator = &h.runtime.shared.coordinator;
    coordinator.begin_user_interaction();

    for minute in [0, 10, 20, 30] {
        let outcome = h.runtime.scheduler.run_tick(at(10, minute)).await;
        assert_eq!(outcome, TickOutcome::Suppressed(SuppressReason::UserInteracting));
    }
    assert_eq!(h.proactive.calls(), 0);
    assert!(h.channel.sent().is_empty());

    coordinator.end_user_interaction(1);
    assert!(h.runtime.scheduler.run_tick(at(10, 40)).await.was_sent());
}

#[tokio::test]
async fn cooldown_blocks_back_to_back_messages() {
    let h = Harness::with_config(ScriptedProvider::texts(&[]), yes(), |c| {
        c.scheduler.cooldown_minutes = 30;
    });
    h.set_state(&SessionState {
        last_proactive_message: Some(at(9, 45)),
        ..SessionState::default()
    })
    .await;

    let outcome = h.runtime.scheduler.run_tick(at(10, 0)).await;
    assert_eq!(outcome, TickOutcome::Suppressed(SuppressReason::Cooldown));
    assert!(h.runtime.scheduler.run_tick(at(10, 20)).await.was_sent());
}

#[tokio::test]
async fn test_mode_turns_cooldown_off() {
    let h = Harness::with_config(ScriptedProvider::texts(&[]), yes(), |c| {
        c.scheduler.cooldown_minutes = 30;
        c.test_mode = true;
    });
    h.set_state(&SessionState {
        last_proactive_message: Some(at(9, 59)),
        ..SessionState::default()
    })
    .await;

    assert!(h.runtime.scheduler.run_tick(at(10, 0)).await.was_sent());
    let (min, max) = h.runtime.scheduler.interval().bounds();
    assert_eq!(min.as_secs(), 10);
    assert_eq!(max.as_secs(), 20);
}

#[tokio::test]
async fn working_deadline_suppresses_until_it_passes() {
    let h = Harness::new(ScriptedProvider::texts(&[]), yes());
    let until = at(10, 0) + Duration::minutes(30);
    h.set_state(&SessionState {
        working_until: Some(until),
        ..SessionState::default()
    })
    .await;

    let outcome = h.runtime.scheduler.run_tick(at(10, 10)).await;
    assert_eq!(outcome, TickOutcome::Suppressed(SuppressReason::WorkingUntil));
    assert_eq!(h.state().await.working_until, Some(until));

    assert!(h.runtime.scheduler.run_tick(at(10, 30)).await.was_sent());
    assert_eq!(h.state().await.working_until, None);
}
