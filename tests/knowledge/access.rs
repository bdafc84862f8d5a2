use spark::config::KnowledgeConfig;
use spark::knowledge::{AccessMode, AccessRules, KnowledgeGateway, ReadOutcome, WriteMode};
use spark::SparkError;
use tempfile::TempDir;

fn default_rules() -> AccessRules {
    AccessRules::from_config(&KnowledgeConfig::default()).unwrap()
}

#[test]
fn recursive_glob_reaches_any_depth() {
    let rules = default_rules();
    for path in [
        "tinker/notes.md",
        "tinker/robot/log.md",
        "tinker/robot/arm/servo.md",
        "tinker/a/b/c/d/e.md",
    ] {
        assert!(rules.permits(path, AccessMode::Read), "{path}");
    }
    assert!(!rules.permits("tinker/robot/arm/servo.md", AccessMode::Write));
    assert!(!rules.permits("tinkering/robot/log.md", AccessMode::Read));
}

#[test]
fn single_star_stays_inside_one_directory() {
    let rules = default_rules();
    assert!(rules.permits("memory/people/sam.md", AccessMode::Read));
    assert!(!rules.permits("memory/people/family/sam.md", AccessMode::Read));
    assert!(rules.permits("memory/timeline/daily/2026-10-16.md", AccessMode::Write));
    assert!(!rules.permits("memory/timeline/daily/old/2026-10-16.md", AccessMode::Write));
}

#[test]
fn paths_matching_no_rule_are_denied_in_both_modes() {
    let rules = default_rules();
    let strays = [
        "README.md",
        "now.txt",
        "memory/profile.txt",
        "memory/timeline/weekly/2026-w42.md",
        "projects/thesis.md",
        "memory/people",
        "notes/today.md",
    ];
    for path in strays {
        for mode in [AccessMode::Read, AccessMode::Write] {
            assert!(!rules.permits(path, mode), "{mode} {path}");
            assert!(rules.check(path, mode).is_err(), "{mode} {path}");
        }
    }
}

#[test]
fn blocked_patterns_beat_allow_rules() {
    let rules = default_rules();
    assert!(rules.permits("memory/spark/notes.md", AccessMode::Write));
    assert!(!rules.permits("memory/spark/keys.secret.md", AccessMode::Write));
    assert!(!rules.permits("memory/spark/keys.secret.md", AccessMode::Read));
    assert!(rules.is_blocked("private/diary.md"));
    assert!(rules.is_blocked(".git/config"));
}

#[tokio::test]
async fn gateway_lists_readable_directories() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("tinker/robot")).unwrap();
    std::fs::write(tmp.path().join("tinker/ideas.md"), "x").unwrap();
    let gateway = KnowledgeGateway::local(tmp.path(), &KnowledgeConfig::default()).unwrap();

    match gateway.read("tinker").await.unwrap() {
        ReadOutcome::Directory(entries) => {
            assert_eq!(entries, vec!["ideas.md".to_string(), "robot/".to_string()]);
        }
        other => panic!("expected a listing, got {other:?}"),
    }
}

#[tokio::test]
async fn denied_writes_leave_the_tree_untouched() {
    let tmp = TempDir::new().unwrap();
    let gateway = KnowledgeGateway::local(tmp.path(), &KnowledgeConfig::default()).unwrap();

    for path in ["now.md", "memory/profile.md", "private/x.md", "../outside.md"] {
        let err = gateway
            .write(path, "nope", WriteMode::Overwrite)
            .await
            .unwrap_err();
        assert!(matches!(err, SparkError::Access(_)), "{path}: {err}");
    }
    assert!(std::fs::read_dir(tmp.path()).unwrap().next().is_none());
    assert!(!tmp.path().parent().unwrap().join("outside.md").exists());
}

#[tokio::test]
async fn append_extends_on_a_new_line() {
    let tmp = TempDir::new().unwrap();
    let gateway = KnowledgeGateway::local(tmp.path(), &KnowledgeConfig::default()).unwrap();
    let path = "memory/timeline/todo/2026-10-16.md";

    gateway.write(path, "- essay", WriteMode::Append).await.unwrap();
    gateway.write(path, "- laundry", WriteMode::Append).await.unwrap();

    let text = std::fs::read_to_string(tmp.path().join(path)).unwrap();
    assert_eq!(text, "- essay\n- laundry");
}
