use crate::harness::{Harness, ScriptedProvider, USER_ID, at};
use spark::config::CheckinConfig;
use spark::history::Role;
use spark::scheduler::{SuppressReason, TickOutcome};

#[tokio::test]
async fn checkin_is_sent_and_counted_without_the_oracle() {
    let h = Harness::new(ScriptedProvider::texts(&[]), ScriptedProvider::texts(&[]));

    let outcome = h
        .runtime
        .scheduler
        .send_checkin("gm, what's on the agenda today?")
        .await;

    assert!(outcome.was_sent());
    assert_eq!(h.proactive.calls(), 0);
    assert_eq!(
        h.channel.sent(),
        vec![(USER_ID.to_string(), "gm, what's on the agenda today?".to_string())]
    );
    assert_eq!(h.state().await.unanswered_count, 1);
    assert_eq!(h.runtime.shared.history.snapshot()[0].role, Role::Agent);
}

#[tokio::test]
async fn checkin_respects_interaction_signal() {
    let h = Harness::new(ScriptedProvider::texts(&[]), ScriptedProvider::texts(&[]));
    let ticket = h.runtime.shared.coordinator.ticket();

    let outcome = h.runtime.scheduler.send_checkin("how'd today go?").await;
    assert_eq!(outcome, TickOutcome::Suppressed(SuppressReason::UserInteracting));
    assert!(h.channel.sent().is_empty());

    drop(ticket);
    assert!(h.runtime.scheduler.send_checkin("how'd today go?").await.was_sent());
}

#[test]
fn default_plan_fires_morning_and_evening() {
    let h = Harness::new(ScriptedProvider::texts(&[]), ScriptedProvider::texts(&[]));
    let plan = h.runtime.scheduler.checkins();

    let (due, checkin) = plan.next_after(at(10, 0)).unwrap();
    assert_eq!(due, at(21, 0));
    assert_eq!(checkin.message(), "how'd today go?");

    let (due, checkin) = plan.next_after(at(7, 30)).unwrap();
    assert_eq!(due, at(8, 0));
    assert_eq!(checkin.message(), "gm, what's on the agenda today?");
}

#[test]
fn custom_checkins_replace_defaults() {
    let h = Harness::with_config(
        ScriptedProvider::texts(&[]),
        ScriptedProvider::texts(&[]),
        |c| {
            c.scheduler.checkins = vec![CheckinConfig {
                schedule: "30 13 * * *".into(),
                message: "lunch done?".into(),
            }];
        },
    );
    let plan = h.runtime.scheduler.checkins();
    assert_eq!(plan.checkins().len(), 1);
    let (due, checkin) = plan.next_after(at(10, 0)).unwrap();
    assert_eq!(due, at(13, 30));
    assert_eq!(checkin.message(), "lunch done?");
}
