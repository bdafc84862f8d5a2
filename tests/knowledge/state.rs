use chrono::{Local, TimeZone};
use spark::history::{HistoryBuffer, Role};
use spark::knowledge::LocalStorage;
use spark::session::{SessionState, SessionStore};
use std::sync::Arc;
use tempfile::TempDir;

const STATE: &str = "memory/spark/state.json";

#[tokio::test]
async fn concurrent_updates_are_serialized() {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(SessionStore::new(
        Arc::new(LocalStorage::new(tmp.path())),
        STATE,
    ));
    let now = Local::now();

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            store.update(|s| s.record_proactive_message(now)).await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(store.load().await.unanswered_count, 20);

    store.update(|s| s.record_interaction(now)).await;
    assert_eq!(store.load().await.unanswered_count, 0);
}

#[tokio::test]
async fn state_survives_a_restart() {
    let tmp = TempDir::new().unwrap();
    let at = Local.with_ymd_and_hms(2026, 10, 16, 14, 5, 0).unwrap();
    {
        let store = SessionStore::new(Arc::new(LocalStorage::new(tmp.path())), STATE);
        store
            .update(|s| {
                s.record_proactive_message(at);
                s.current_focus = Some("thesis".into());
            })
            .await;
    }

    let reopened = SessionStore::new(Arc::new(LocalStorage::new(tmp.path())), STATE);
    let state = reopened.load().await;
    assert_eq!(state.unanswered_count, 1);
    assert_eq!(state.last_proactive_message, Some(at));
    assert_eq!(state.current_focus.as_deref(), Some("thesis"));
}

#[tokio::test]
async fn corrupt_state_file_is_preserved_before_defaults_are_saved() {
    let tmp = TempDir::new().unwrap();
    let full = tmp.path().join(STATE);
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(&full, "{not json").unwrap();

    let store = SessionStore::new(Arc::new(LocalStorage::new(tmp.path())), STATE);
    assert_eq!(store.load().await, SessionState::default());

    let at = Local.with_ymd_and_hms(2026, 10, 16, 14, 5, 0).unwrap();
    store.update(|s| s.record_interaction(at)).await;

    let backup = tmp.path().join(store.backup_path());
    assert_eq!(std::fs::read_to_string(backup).unwrap(), "{not json");
    assert_eq!(store.load().await.last_interaction, Some(at));
}

#[test]
fn history_is_cleared_once_per_day() {
    let day = |d: u32, h: u32| Local.with_ymd_and_hms(2026, 10, d, h, 0, 0).unwrap();
    let history = HistoryBuffer::new();
    history.append(Role::User, "thu morning", day(15, 9));
    history.append(Role::Agent, "thu night", day(15, 23));

    history.append(Role::User, "fri early", day(16, 0));
    history.append(Role::Agent, "fri later", day(16, 10));

    let contents: Vec<String> = history.snapshot().into_iter().map(|e| e.content).collect();
    assert_eq!(contents, vec!["fri early", "fri later"]);

    assert!(!history.roll_over(day(16, 22)));
    assert_eq!(history.len(), 2);
    assert!(history.roll_over(day(17, 1)));
    assert!(history.is_empty());
}
