use crate::harness::{Harness, ScriptedProvider, USER_ID, at};
use spark::history::Role;
use spark::reactive::Accepted;
use spark::scheduler::{SuppressReason, TickOutcome};
use spark::session::SessionState;

#[tokio::test]
async fn reply_resets_unanswered_and_releases_the_signal() {
    let h = Harness::new(
        ScriptedProvider::texts(&["nice\ngo crush it"]),
        ScriptedProvider::texts(&[]),
    );
    h.set_state(&SessionState {
        unanswered_count: 5,
        ..SessionState::default()
    })
    .await;

    let accepted = h.runtime.intake.accept(h.message("ok doing it")).await.unwrap();
    assert_eq!(accepted, Accepted::Queued);
    assert!(h.runtime.shared.coordinator.is_user_interacting());

    let handles = h.start();
    h.settle().await;

    assert_eq!(
        h.channel.sent(),
        vec![
            (USER_ID.to_string(), "nice".to_string()),
            (USER_ID.to_string(), "go crush it".to_string()),
        ]
    );
    let state = h.state().await;
    assert_eq!(state.unanswered_count, 0);
    assert_eq!(state.last_interaction, Some(at(10, 0)));
    assert!(!h.runtime.shared.coordinator.is_user_interacting());

    let history = h.runtime.shared.history.snapshot();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content, "ok doing it");
    assert_eq!(history[1].role, Role::Agent);
    assert_eq!(history[1].content, "nice\ngo crush it");

    for handle in handles {
        handle.abort();
    }
}

#[tokio::test]
async fn burst_is_collapsed_into_one_turn() {
    let h = Harness::new(ScriptedProvider::texts(&["ok"]), ScriptedProvider::texts(&[]));
    for text in ["ok", "doing it", "now"] {
        h.runtime.intake.accept(h.message(text)).await.unwrap();
    }
    assert_eq!(h.runtime.shared.coordinator.pending(), 3);

    let handles = h.start();
    h.settle().await;

    assert_eq!(h.reactive.calls(), 1);
    let (_, messages) = h.reactive.requests().remove(0);
    let last = messages.last().unwrap().text();
    assert!(last.ends_with("ok\ndoing it\nnow"), "{last}");
    assert_eq!(h.runtime.shared.coordinator.pending(), 0);

    for handle in handles {
        handle.abort();
    }
}

#[tokio::test]
async fn messages_through_the_listener_path_get_answered() {
    let h = Harness::new(ScriptedProvider::texts(&["yo"]), ScriptedProvider::texts(&[]));
    let handles = h.start();

    h.runtime.inbound().send(h.message("hey")).await.unwrap();
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while h.channel.sent().is_empty() {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    h.settle().await;

    assert_eq!(h.channel.texts(), vec!["yo"]);
    for handle in handles {
        handle.abort();
    }
}

#[tokio::test]
async fn ticks_are_suppressed_while_a_reply_is_pending() {
    let h = Harness::new(
        ScriptedProvider::texts(&[]),
        ScriptedProvider::texts(&[r#"{"should_message": true, "message": "yo"}"#]),
    );
    h.runtime.intake.accept(h.message("one sec")).await.unwrap();

    let outcome = h.runtime.scheduler.run_tick(at(10, 0)).await;
    assert_eq!(outcome, TickOutcome::Suppressed(SuppressReason::UserInteracting));
    assert_eq!(h.proactive.calls(), 0);
}

#[tokio::test]
async fn oracle_failure_sends_fallback_and_still_resets() {
    let h = Harness::new(ScriptedProvider::texts(&[]), ScriptedProvider::texts(&[]));
    h.set_state(&SessionState {
        unanswered_count: 2,
        ..SessionState::default()
    })
    .await;

    let report = h.runtime.reactive.handle_turn(&[h.message("u there")]).await;

    assert!(report.fallback);
    assert!(report.delivered);
    assert_eq!(h.channel.texts(), vec!["hold on"]);
    assert_eq!(h.state().await.unanswered_count, 0);
    let history = h.runtime.shared.history.snapshot();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, Role::User);
}

#[tokio::test]
async fn empty_reply_becomes_fallback() {
    let h = Harness::new(ScriptedProvider::texts(&["   "]), ScriptedProvider::texts(&[]));
    let report = h.runtime.reactive.handle_turn(&[h.message("hi")]).await;
    assert!(report.fallback);
    assert_eq!(report.lines, vec!["hold on"]);
}

#[tokio::test]
async fn stated_duration_sets_working_deadline() {
    let h = Harness::new(
        ScriptedProvider::texts(&["bet", "ok"]),
        ScriptedProvider::texts(&[]),
    );

    let report = h.runtime.reactive.handle_turn(&[h.message("ok 30 min")]).await;
    assert_eq!(report.working_minutes, Some(30));
    assert_eq!(h.state().await.working_until, Some(at(10, 30)));

    h.set_state(&SessionState::default()).await;
    let report = h.runtime.reactive.handle_turn(&[h.message("back in 2 min")]).await;
    assert_eq!(report.working_minutes, None);
    assert_eq!(h.state().await.working_until, None);
}

#[tokio::test]
async fn absurd_duration_is_capped_and_still_answered() {
    let h = Harness::new(ScriptedProvider::texts(&["lol ok"]), ScriptedProvider::texts(&[]));
    h.runtime
        .intake
        .accept(h.message("brb 9999999999 hours"))
        .await
        .unwrap();

    let handles = h.start();
    h.settle().await;

    assert_eq!(h.channel.texts(), vec!["lol ok"]);
    let until = h.state().await.working_until.unwrap();
    assert_eq!(until, at(10, 0) + chrono::Duration::hours(24));
    assert!(!h.runtime.shared.coordinator.is_user_interacting());

    for handle in handles {
        handle.abort();
    }
}

#[tokio::test]
async fn user_entry_keeps_its_arrival_time() {
    let h = Harness::new(ScriptedProvider::texts(&["here"]), ScriptedProvider::texts(&[]));
    let early = spark::channels::ChannelMessage::new(USER_ID, "you there?", "recording", at(9, 58));
    h.runtime
        .shared
        .history
        .append(Role::Agent, "checking in", at(9, 59));

    h.runtime.reactive.handle_turn(&[early]).await;

    let history = h.runtime.shared.history.snapshot();
    let contents: Vec<_> = history.iter().map(|e| e.content.as_str()).collect();
    assert_eq!(contents, vec!["you there?", "checking in", "here"]);
    assert_eq!(history[0].timestamp, at(9, 58));
}

#[tokio::test]
async fn replies_are_split_capped_and_unannotated() {
    let h = Harness::new(
        ScriptedProvider::texts(&["[10:01] a\nb\n\nc\nd\ne\nf"]),
        ScriptedProvider::texts(&[]),
    );
    let report = h.runtime.reactive.handle_turn(&[h.message("talk to me")]).await;
    assert_eq!(report.lines, vec!["a", "b", "c", "d\ne\nf"]);
    assert_eq!(h.channel.texts().len(), 4);
    assert!(h.channel.typing_count() >= 4);
}

#[tokio::test]
async fn history_rolls_over_at_midnight() {
    let h = Harness::new(
        ScriptedProvider::texts(&["night", "morning"]),
        ScriptedProvider::texts(&[]),
    );
    h.clock.set(at(22, 0));
    h.runtime.reactive.handle_turn(&[h.message("done for today")]).await;
    assert_eq!(h.runtime.shared.history.len(), 2);

    h.clock.set(at(22, 0) + chrono::Duration::hours(11));
    h.runtime.reactive.handle_turn(&[h.message("gm")]).await;

    let history = h.runtime.shared.history.snapshot();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "gm");
    assert_eq!(history[1].content, "morning");
}
