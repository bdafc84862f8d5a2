use crate::harness::{Harness, ScriptedProvider, USER_ID, at, tool_use};
use spark::history::Role;
use spark::oracle::ProviderResponse;
use spark::scheduler::{SkipReason, TickOutcome};
use spark::session::SessionState;

#[tokio::test]
async fn declined_decision_sends_nothing_and_keeps_state() {
    let h = Harness::new(
        ScriptedProvider::texts(&[]),
        ScriptedProvider::texts(&[r#"{"should_message": false, "rationale": "they just replied"}"#]),
    );
    let before = h.state().await;

    let outcome = h.runtime.scheduler.run_tick(at(10, 0)).await;

    assert_eq!(outcome, TickOutcome::Skipped(SkipReason::Declined));
    assert!(h.channel.sent().is_empty());
    assert_eq!(h.state().await, before);
    assert!(h.runtime.shared.history.is_empty());
    assert_eq!(h.proactive.calls(), 1);
}

#[tokio::test]
async fn positive_decision_dispatches_and_records() {
    let h = Harness::new(
        ScriptedProvider::texts(&[]),
        ScriptedProvider::texts(&[
            "thinking...\n```json\n{\"should_message\": true, \"message\": \"bruhh\"}\n```",
        ]),
    );
    assert_eq!(h.state().await.unanswered_count, 0);

    let outcome = h.runtime.scheduler.run_tick(at(10, 0)).await;

    assert_eq!(
        outcome,
        TickOutcome::Sent {
            message: "bruhh".into()
        }
    );
    assert_eq!(h.channel.sent(), vec![(USER_ID.to_string(), "bruhh".to_string())]);

    let state = h.state().await;
    assert_eq!(state.unanswered_count, 1);
    assert_eq!(state.last_proactive_message, Some(at(10, 0)));

    let history = h.runtime.shared.history.snapshot();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, Role::Agent);
    assert_eq!(history[0].content, "bruhh");
}

#[tokio::test]
async fn unanswered_count_grows_by_one_per_dispatch() {
    let h = Harness::new(
        ScriptedProvider::texts(&[]),
        ScriptedProvider::texts(&[
            r#"{"should_message": true, "message": "yo"}"#,
            r#"{"should_message": true, "message": "still there?"}"#,
            r#"{"should_message": false}"#,
        ]),
    );
    h.set_state(&SessionState {
        unanswered_count: 3,
        ..SessionState::default()
    })
    .await;

    h.runtime.scheduler.run_tick(at(10, 0)).await;
    assert_eq!(h.state().await.unanswered_count, 4);
    h.clock.set(at(10, 30));
    h.runtime.scheduler.run_tick(at(10, 30)).await;
    assert_eq!(h.state().await.unanswered_count, 5);
    h.runtime.scheduler.run_tick(at(11, 0)).await;
    assert_eq!(h.state().await.unanswered_count, 5);
}

#[tokio::test]
async fn malformed_output_never_dispatches() {
    let outputs = [
        "sure, I'll message them",
        r#"{"message": "hi"}"#,
        r#"{"should_message": "yes", "message": "hi"}"#,
        r#"{"should_message": true, "message": 7}"#,
        "{\"should_message\": true, \"message\": \"hi\"",
    ];
    for output in outputs {
        let h = Harness::new(
            ScriptedProvider::texts(&[]),
            ScriptedProvider::texts(&[output]),
        );
        let outcome = h.runtime.scheduler.run_tick(at(10, 0)).await;
        assert!(
            matches!(
                outcome,
                TickOutcome::Skipped(SkipReason::MalformedDecision)
            ),
            "{output:?} gave {outcome:?}"
        );
        assert!(h.channel.sent().is_empty(), "{output:?} dispatched");
        assert_eq!(h.state().await.unanswered_count, 0);
    }
}

#[tokio::test]
async fn empty_message_is_not_sent() {
    let h = Harness::new(
        ScriptedProvider::texts(&[]),
        ScriptedProvider::texts(&[r#"{"should_message": true, "message": "   "}"#]),
    );
    let outcome = h.runtime.scheduler.run_tick(at(10, 0)).await;
    assert_eq!(outcome, TickOutcome::Skipped(SkipReason::EmptyMessage));
    assert!(h.channel.sent().is_empty());
}

#[tokio::test]
async fn oracle_failure_is_a_skip() {
    let h = Harness::new(ScriptedProvider::texts(&[]), ScriptedProvider::texts(&[]));
    let outcome = h.runtime.scheduler.run_tick(at(10, 0)).await;
    assert_eq!(outcome, TickOutcome::Skipped(SkipReason::OracleFailure));
    assert!(h.channel.sent().is_empty());
}

#[tokio::test]
async fn transport_failure_leaves_state_alone() {
    let h = Harness::new(
        ScriptedProvider::texts(&[]),
        ScriptedProvider::texts(&[r#"{"should_message": true, "message": "yo"}"#]),
    );
    h.channel.fail_sends(true);
    let outcome = h.runtime.scheduler.run_tick(at(10, 0)).await;
    assert_eq!(outcome, TickOutcome::Skipped(SkipReason::DispatchFailed));
    assert_eq!(h.state().await.unanswered_count, 0);
    assert!(h.runtime.shared.history.is_empty());
}

#[tokio::test]
async fn decision_can_consult_knowledge_first() {
    let proactive = ScriptedProvider::new(vec![
        tool_use("t1", "read_knowledge", serde_json::json!({"path": "now.md"})),
        ProviderResponse::text_only(r#"{"should_message": true, "message": "how's the essay"}"#),
    ]);
    let h = Harness::new(ScriptedProvider::texts(&[]), proactive);
    h.write_file("now.md", "- finish the essay draft");

    let outcome = h.runtime.scheduler.run_tick(at(10, 0)).await;
    assert!(outcome.was_sent());

    let requests = h.proactive.requests();
    assert_eq!(requests.len(), 2);
    let second = &requests[1].1;
    let tool_output = serde_json::to_string(second).unwrap();
    assert!(tool_output.contains("finish the essay draft"));
}

#[tokio::test]
async fn decision_context_carries_time_and_unanswered_count() {
    let h = Harness::new(
        ScriptedProvider::texts(&[]),
        ScriptedProvider::texts(&[r#"{"should_message": false}"#]),
    );
    h.set_state(&SessionState {
        unanswered_count: 2,
        ..SessionState::default()
    })
    .await;
    h.runtime.shared.history.append(Role::User, "ok doing it", at(9, 30));

    h.runtime.scheduler.run_tick(at(10, 0)).await;

    let (system, messages) = h.proactive.requests().remove(0);
    assert!(system.contains("should_message"));
    let payload = messages[0].text();
    assert!(payload.contains("ok doing it"), "{payload}");
    assert!(payload.contains("10:00"), "{payload}");
    assert!(payload.contains("Unanswered proactive messages: 2"), "{payload}");
}
