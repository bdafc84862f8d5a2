use crate::harness::{Harness, ScriptedProvider, at, tool_use};
use spark::session::SessionState;
use spark::config::AckRemediation;
use spark::oracle::ProviderResponse;

const TODO: &str = "memory/timeline/todo/2026-10-16.md";

#[tokio::test]
async fn warn_keeps_the_reply() {
    let h = Harness::new(
        ScriptedProvider::texts(&["noted, laundry later"]),
        ScriptedProvider::texts(&[]),
    );
    let report = h.runtime.reactive.handle_turn(&[h.message("laundry later")]).await;
    assert_eq!(report.lines, vec!["noted, laundry later"]);
    assert_eq!(h.reactive.calls(), 1);
}

#[tokio::test]
async fn strip_drops_unbacked_claims() {
    let h = Harness::with_config(
        ScriptedProvider::texts(&["noted\nnow go fold it"]),
        ScriptedProvider::texts(&[]),
        |c| c.conversation.ack_remediation = AckRemediation::Strip,
    );
    let report = h.runtime.reactive.handle_turn(&[h.message("laundry later")]).await;
    assert_eq!(report.lines, vec!["now go fold it"]);
}

#[tokio::test]
async fn retry_gives_the_oracle_a_chance_to_write() {
    let reactive = ScriptedProvider::new(vec![
        ProviderResponse::text_only("saved!"),
        tool_use(
            "w1",
            "write_knowledge",
            serde_json::json!({"path": TODO, "content": "- laundry", "mode": "append"}),
        ),
        ProviderResponse::text_only("saved for real"),
    ]);
    let h = Harness::with_config(reactive, ScriptedProvider::texts(&[]), |c| {
        c.conversation.ack_remediation = AckRemediation::Retry;
    });

    let report = h.runtime.reactive.handle_turn(&[h.message("add laundry")]).await;

    assert_eq!(report.lines, vec!["saved for real"]);
    assert_eq!(h.reactive.calls(), 3);
    assert!(h.read_file(TODO).unwrap().contains("- laundry"));
}

#[tokio::test]
async fn real_write_needs_no_remediation() {
    let reactive = ScriptedProvider::new(vec![
        tool_use(
            "w1",
            "write_knowledge",
            serde_json::json!({"path": TODO, "content": "- call mom"}),
        ),
        ProviderResponse::text_only("added"),
    ]);
    let h = Harness::with_config(reactive, ScriptedProvider::texts(&[]), |c| {
        c.conversation.ack_remediation = AckRemediation::Retry;
    });

    let report = h.runtime.reactive.handle_turn(&[h.message("remind me to call mom")]).await;
    assert_eq!(report.lines, vec!["added"]);
    assert_eq!(h.reactive.calls(), 2);
}

#[tokio::test]
async fn denied_write_is_reported_to_the_oracle() {
    let reactive = ScriptedProvider::new(vec![
        tool_use(
            "w1",
            "write_knowledge",
            serde_json::json!({"path": "now.md", "content": "hijack"}),
        ),
        ProviderResponse::text_only("can't touch that one"),
    ]);
    let h = Harness::new(reactive, ScriptedProvider::texts(&[]));

    h.runtime.reactive.handle_turn(&[h.message("overwrite now.md")]).await;

    assert!(h.read_file("now.md").is_none());
    let (_, messages) = h.reactive.requests().remove(1);
    let wire = serde_json::to_string(&messages).unwrap();
    assert!(wire.contains("\"is_error\":true"), "{wire}");
}

#[tokio::test]
async fn oracle_cannot_overwrite_session_state() {
    let reactive = ScriptedProvider::new(vec![
        tool_use(
            "w1",
            "write_knowledge",
            serde_json::json!({"path": "memory/spark/state.json", "content": "oops not json"}),
        ),
        ProviderResponse::text_only("saved"),
    ]);
    let h = Harness::new(reactive, ScriptedProvider::texts(&[]));
    h.set_state(&SessionState {
        working_until: Some(at(11, 0)),
        last_proactive_message: Some(at(9, 0)),
        current_focus: Some("essay".into()),
        ..SessionState::default()
    })
    .await;

    h.runtime.reactive.handle_turn(&[h.message("update my state")]).await;

    let state = h.state().await;
    assert_eq!(state.working_until, Some(at(11, 0)));
    assert_eq!(state.last_proactive_message, Some(at(9, 0)));
    assert_eq!(state.current_focus.as_deref(), Some("essay"));
    assert_eq!(state.last_interaction, Some(at(10, 0)));

    let (_, messages) = h.reactive.requests().remove(1);
    let wire = serde_json::to_string(&messages).unwrap();
    assert!(wire.contains("managed by Spark"), "{wire}");
}

#[tokio::test]
async fn rewriting_the_protocol_refreshes_the_persona() {
    let reactive = ScriptedProvider::new(vec![
        tool_use(
            "w1",
            "write_knowledge",
            serde_json::json!({"path": "memory/spark/protocol.md", "content": "be gentle today"}),
        ),
        ProviderResponse::text_only("updated"),
        ProviderResponse::text_only("hey"),
    ]);
    let h = Harness::new(reactive, ScriptedProvider::texts(&[]));

    h.runtime.reactive.handle_turn(&[h.message("go easy on me")]).await;
    assert!(!h.reactive.requests()[0].0.contains("be gentle today"));

    h.runtime.reactive.handle_turn(&[h.message("hi")]).await;
    assert!(h.reactive.requests()[2].0.contains("be gentle today"));
}
