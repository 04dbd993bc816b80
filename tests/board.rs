mod support;

use support::TestBoard;
use taskboard::api::Method;
use taskboard::model::{ProjectStatus, TaskStatus};

#[tokio::test]
async fn load_fills_every_store() {
    let t = TestBoard::new();
    t.seed_project("p1", ProjectStatus::New);
    t.seed_task("t1", "p1", TaskStatus::New);
    t.seed_user("u1", "Ann");

    t.board.load().await;

    assert_eq!(t.board.projects().projects().len(), 1);
    assert_eq!(t.board.tasks().tasks().len(), 1);
    assert_eq!(t.board.users().users().len(), 1);
    assert!(t.board.errors().is_empty());
}

#[tokio::test]
async fn errors_collects_failed_fetches() {
    let t = TestBoard::new();
    t.backend.fail_next(Method::Get, "/users", 500).expect("inject");
    t.backend.fail_next(Method::Get, "/tasks", 500).expect("inject");

    t.board.load().await;

    assert_eq!(
        t.board.errors(),
        vec![
            "Failed to fetch users".to_string(),
            "Failed to fetch tasks".to_string(),
        ]
    );
    assert!(t.board.projects().error().is_none());
}

#[tokio::test]
async fn summaries_count_tasks_and_flag_drift() {
    let t = TestBoard::new();
    t.seed_project("p1", ProjectStatus::InProgress);
    t.seed_project("p2", ProjectStatus::New);
    t.seed_task("t1", "p1", TaskStatus::InProgress);
    t.seed_task("t2", "p1", TaskStatus::Done);
    t.seed_task("t3", "p2", TaskStatus::Done);
    t.board.load().await;

    let summaries = t.board.project_summaries();
    let rows: Vec<_> = summaries
        .iter()
        .map(|summary| {
            (
                summary.project.id.as_str(),
                summary.task_count,
                summary.derived_status,
                summary.is_drifted(),
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            ("p1", 2, ProjectStatus::InProgress, false),
            ("p2", 1, ProjectStatus::Completed, true),
        ]
    );

    let value = serde_json::to_value(&summaries[1]).expect("json");
    assert_eq!(value["id"], "p2");
    assert_eq!(value["taskCount"], 1);
    assert_eq!(value["derivedStatus"], "completed");
}

#[tokio::test]
async fn reconcile_all_reports_each_project() {
    let t = TestBoard::new();
    t.seed_project("p1", ProjectStatus::InProgress);
    t.seed_project("p2", ProjectStatus::Completed);
    t.seed_task("t1", "p1", TaskStatus::InProgress);
    t.board.load().await;

    let results = t.board.reconcile_all().await;

    assert_eq!(results.len(), 2);
    assert!(!results[0].outcome.is_updated());
    assert!(results[1].outcome.is_updated());
    assert_eq!(
        t.board.projects().get_by_id("p2").map(|p| p.status),
        Some(ProjectStatus::New)
    );

    let value = serde_json::to_value(&results[1]).expect("json");
    assert_eq!(value["project_id"], "p2");
    assert_eq!(value["outcome"], "updated");
    assert_eq!(value["from"], "completed");
    assert_eq!(value["to"], "new");
}

#[tokio::test]
async fn clear_empties_every_store() {
    let t = TestBoard::new();
    t.seed_project("p1", ProjectStatus::New);
    t.seed_user("u1", "Ann");
    t.board.load().await;

    t.board.clear();

    assert!(t.board.projects().projects().is_empty());
    assert!(t.board.tasks().tasks().is_empty());
    assert!(t.board.users().users().is_empty());
}
