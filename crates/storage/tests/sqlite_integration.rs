use std::sync::Arc;

use quiz_core::QuestionBank;
use quiz_core::model::{ModuleId, ModuleNumber, QuizState};
use storage::repository::{KeyValueStore, Storage, StorageError};
use storage::snapshot::{QuizStateStore, STATE_KEY};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_kv_round_trips_and_overwrites() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert_eq!(repo.get("missing").await.unwrap(), None);

    repo.set("k", "first").await.unwrap();
    repo.set("k", "second").await.unwrap();
    assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("second"));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.set("k", "kept").await.unwrap();
    repo.migrate().await.expect("second migrate");
    assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("kept"));
}

#[tokio::test]
async fn quiz_state_survives_a_new_connection() {
    let url = "sqlite:file:memdb_snapshot?mode=memory&cache=shared";
    let first = Storage::sqlite(url).await.expect("open");
    let mut state = QuizState::fresh([ModuleNumber::new(1), ModuleNumber::new(2)]);
    state.select_module(ModuleId::ordinary(2)).unwrap();
    first.quiz_state().save(&state).await.unwrap();

    let second = Storage::sqlite(url).await.expect("reopen");
    let restored = second.quiz_state().load().await.unwrap();
    assert_eq!(restored, Some(state));
    drop(first);
}

#[tokio::test]
async fn corrupt_snapshot_surfaces_as_serialization_error() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_corrupt?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo.set(STATE_KEY, "{\"selectedModuleId\": 5").await.unwrap();

    let kv: Arc<dyn KeyValueStore> = Arc::new(repo);
    let err = QuizStateStore::new(kv).load().await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn fresh_bank_state_persists_every_module() {
    let storage = Storage::in_memory();
    let bank = QuestionBank::default();
    let state = QuizState::for_bank(&bank);
    storage.quiz_state().save(&state).await.unwrap();

    let restored = storage.quiz_state().load().await.unwrap().unwrap();
    assert_eq!(restored.selected_module_id(), ModuleId::RandomMix);
    assert_eq!(restored.progressions().len(), 1);
}
