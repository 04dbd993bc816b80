mod support;

use support::TestBoard;
use taskboard::api::Method;

#[tokio::test]
async fn fetch_all_loads_users() {
    let t = TestBoard::new();
    t.seed_user("u1", "Ann");
    t.seed_user("u2", "Bo");
    let users = t.board.users();

    users.fetch_all().await;

    assert_eq!(users.users().len(), 2);
    assert_eq!(users.get_by_id("u2").map(|user| user.name), Some("Bo".to_string()));
    assert!(users.get_by_id("u3").is_none());
    assert!(!users.is_loading());
}

#[tokio::test]
async fn fetch_failure_keeps_previous_users() {
    let t = TestBoard::new();
    t.seed_user("u1", "Ann");
    let users = t.board.users();
    users.fetch_all().await;

    t.backend.fail_next(Method::Get, "/users", 500).expect("inject");
    users.fetch_all().await;

    assert_eq!(users.error().as_deref(), Some("Failed to fetch users"));
    assert_eq!(users.users().len(), 1);

    users.clear();
    assert!(users.users().is_empty());
    assert!(users.error().is_none());
}
