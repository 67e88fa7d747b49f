use shared::domain::StudentProfile;
use storage::{load_session, save_session, KeyValueStore, SqliteStore};

#[tokio::test]
async fn session_survives_reopening_the_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!(
        "sqlite://{}",
        dir.path()
            .join("student.db")
            .to_string_lossy()
            .replace('\\', "/")
    );

    {
        let store = SqliteStore::new(&url).await.expect("open");
        save_session(
            &store,
            "mock-student-token",
            Some(&StudentProfile::with_email("omar@example.com")),
        )
        .await
        .expect("save");
        store.pool().close().await;
    }

    let reopened = SqliteStore::new(&url).await.expect("reopen");
    let session = load_session(&reopened)
        .await
        .expect("load")
        .expect("session present");
    assert_eq!(session.access_token, "mock-student-token");
    assert_eq!(
        session.profile.map(|p| p.email).as_deref(),
        Some("omar@example.com")
    );
    assert!(reopened.get("unrelated").await.expect("get").is_none());
}
