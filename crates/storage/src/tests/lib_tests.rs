use super::*;

fn sample_user() -> UserProfile {
    UserProfile {
        name: "Jean Kandu".into(),
        balance: 120.5,
        airtime_balance: 30.0,
        data_balance: 2048.0,
    }
}

#[tokio::test]
async fn stores_and_clears_token() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert_eq!(storage.token().await.expect("token"), None);

    storage.save_token("abc").await.expect("save");
    assert_eq!(storage.token().await.expect("token").as_deref(), Some("abc"));

    storage.save_token("def").await.expect("overwrite");
    assert_eq!(storage.token().await.expect("token").as_deref(), Some("def"));

    storage.clear_token().await.expect("clear");
    assert_eq!(storage.token().await.expect("token"), None);
}

#[tokio::test]
async fn blank_token_counts_as_missing() {
    let storage = MemoryStore::with_token("  ");
    assert_eq!(storage.token().await.expect("token"), None);
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn round_trips_cached_user() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.save_user(&sample_user()).await.expect("save user");
    assert_eq!(
        storage.cached_user().await.expect("user"),
        Some(sample_user())
    );
    storage.clear_user().await.expect("clear user");
    assert_eq!(storage.cached_user().await.expect("user"), None);
}

#[tokio::test]
async fn unreadable_cached_user_is_ignored() {
    let storage = MemoryStore::new();
    storage.set(USER_KEY, "{not json").await.expect("set");
    assert_eq!(storage.cached_user().await.expect("user"), None);
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("wallet_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("wallet.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    storage.save_token("persisted").await.expect("save");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    let reopened = Storage::new(&database_url).await.expect("reopen");
    assert_eq!(
        reopened.token().await.expect("token").as_deref(),
        Some("persisted")
    );
    drop(reopened);

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn memory_url_has_no_parent_dir() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/wallet.db?mode=rwc"),
        Some(PathBuf::from("./data/wallet.db"))
    );
}

#[test]
fn bare_paths_become_sqlite_urls() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(normalize_database_url("sqlite:data\\w.db"), "sqlite://data/w.db");
    assert_eq!(normalize_database_url("  "), DEFAULT_DATABASE_URL);
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("sqlite:///var/lib/wallet.db"),
        "sqlite:///var/lib/wallet.db"
    );
}

#[test]
fn absolute_sqlite_url_keeps_its_root() {
    assert_eq!(
        sqlite_path("sqlite:///var/lib/wallet.db"),
        Some(PathBuf::from("/var/lib/wallet.db"))
    );
    assert_eq!(sqlite_path("postgres://localhost/db"), None);
}
