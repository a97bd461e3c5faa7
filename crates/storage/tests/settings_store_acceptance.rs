use serde_json::json;
use storage::{SettingsStore, SqliteSettingsStore};

#[tokio::test]
async fn values_survive_reopening_the_database() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("settings.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    {
        let store = SqliteSettingsStore::new(&database_url).await.expect("open");
        store
            .set("phraseapp.domain", json!("phraseapp.com"))
            .await
            .expect("set domain");
        store
            .set("phraseapp.project", json!({"id": "7", "name": "Web"}))
            .await
            .expect("set project");
        store.close().await;
    }

    let reopened = SqliteSettingsStore::new(&database_url).await.expect("reopen");
    assert_eq!(
        reopened.get("phraseapp.domain").await.expect("get"),
        Some(json!("phraseapp.com"))
    );
    assert_eq!(
        reopened.get("phraseapp.project").await.expect("get"),
        Some(json!({"id": "7", "name": "Web"}))
    );
}
