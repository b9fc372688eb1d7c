//! Integration test: the engine over a sled-backed store.
//!
//! Verifies that command side effects and the emotion log land in sled under
//! the caller's scope and are visible to a second engine sharing the store.

mod common;

use common::{memory_config, Script, ScriptedModel};
use haven_core::{ChatRequest, CompanionEngine, CompanionStore, Emotion, SledStore, Trend};
use std::sync::Arc;

fn engine_over(store: Arc<SledStore>) -> CompanionEngine {
    CompanionEngine::new(store, Arc::new(ScriptedModel::new(Script::Echo)), memory_config())
}

#[tokio::test]
async fn turns_write_through_to_sled() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SledStore::open(Some(dir.path())).unwrap());
    let engine = engine_over(store.clone());

    engine
        .handle_turn(ChatRequest::new("Remember I walk at 7am").for_user("ana"))
        .await
        .unwrap();
    engine
        .handle_turn(ChatRequest::new("set safe word to harbor").for_user("ana"))
        .await
        .unwrap();
    engine
        .handle_turn(ChatRequest::new("I feel sad").for_user("ana"))
        .await
        .unwrap();

    assert_eq!(store.load_memory("ana").unwrap(), vec!["I walk at 7am".to_string()]);
    assert_eq!(store.load_safe_word("ana").unwrap().as_deref(), Some("harbor"));
    let log = store.load_emotion_log("ana").unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].emotion, Emotion::Sadness);
    assert!(store.load_memory("default").unwrap().is_empty());
}

#[tokio::test]
async fn second_engine_sees_persisted_state() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SledStore::open(Some(dir.path())).unwrap());

    let first = engine_over(store.clone());
    for _ in 0..3 {
        first.handle_turn(ChatRequest::new("I'm worried")).await.unwrap();
    }
    first.handle_turn(ChatRequest::new("my safe word is lighthouse")).await.unwrap();

    let second = engine_over(store);
    let (log, trend) = second.emotion_history("default").unwrap();
    assert_eq!(log.len(), 3);
    assert_eq!(trend, Trend::AnxiousStreak);

    let reply = second.handle_turn(ChatRequest::new("Lighthouse")).await.unwrap();
    assert!(reply.safe_word_triggered);
    assert!(reply.safe_word_set);
}
