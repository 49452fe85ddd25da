//! Engine adapter tests against a scripted UCI engine (`fixtures/fake_uci.sh`)

use std::sync::Arc;
use std::time::Duration;

use chess_coach_core::{EngineConfig, EngineError, EngineManager, Evaluation};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

fn fake_engine(mode: &str) -> EngineConfig {
    EngineConfig {
        path: "sh".to_string(),
        args: vec![
            format!("{}/tests/fixtures/fake_uci.sh", env!("CARGO_MANIFEST_DIR")),
            mode.to_string(),
        ],
        movetime: Duration::from_millis(100),
        startup_timeout: Duration::from_secs(5),
        queue_timeout: Duration::from_secs(10),
    }
}

#[tokio::test]
async fn analyzes_with_white_to_move() {
    let manager = EngineManager::new(fake_engine("normal"));
    let analysis = manager.analyze(START_FEN).await.unwrap();

    assert_eq!(analysis.best_move, "e2e4");
    assert_eq!(analysis.evaluation, Evaluation::Centipawns(35));
    assert_eq!(analysis.evaluation.to_string(), "+0.35");
    assert_eq!(analysis.depth, 12);
    assert_eq!(analysis.pv, vec!["e2e4", "e7e5"]);

    manager.release().await;
}

#[tokio::test]
async fn score_is_reported_from_whites_side() {
    let manager = EngineManager::new(fake_engine("normal"));

    // The engine says +35 for the side to move, which is Black here
    let analysis = manager.analyze(AFTER_E4).await.unwrap();
    assert_eq!(analysis.best_move, "e7e5");
    assert_eq!(analysis.evaluation, Evaluation::Centipawns(-35));

    manager.release().await;
}

#[tokio::test]
async fn process_is_started_once_and_reused() {
    let manager = EngineManager::new(fake_engine("normal"));
    assert!(!manager.is_running().await);

    manager.analyze(START_FEN).await.unwrap();
    assert!(manager.is_running().await);
    manager.analyze(AFTER_E4).await.unwrap();
    assert!(manager.is_running().await);

    manager.release().await;
    assert!(!manager.is_running().await);
    manager.release().await;
}

#[tokio::test]
async fn invalid_fen_keeps_engine() {
    let manager = EngineManager::new(fake_engine("normal"));
    manager.analyze(START_FEN).await.unwrap();

    let err = manager.analyze("not/a/fen w - - 0 1").await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidPosition(_)));
    assert!(manager.is_running().await);

    manager.release().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_analyses_do_not_interleave() {
    let manager = Arc::new(EngineManager::new(fake_engine("normal")));

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let manager = Arc::clone(&manager);
            let fen = if i % 2 == 0 { START_FEN } else { AFTER_E4 };
            tokio::spawn(async move { (fen, manager.analyze(fen).await) })
        })
        .collect();

    for task in tasks {
        let (fen, result) = task.await.unwrap();
        let analysis = result.unwrap();
        let expected = if fen == START_FEN { "e2e4" } else { "e7e5" };
        assert_eq!(analysis.best_move, expected);
        assert_eq!(analysis.pv.len(), 2);
    }

    manager.release().await;
}

#[tokio::test]
async fn waiting_past_queue_timeout_is_busy() {
    let manager = EngineManager::new(EngineConfig {
        queue_timeout: Duration::from_millis(50),
        ..fake_engine("normal")
    });

    let lease = manager.acquire().await.unwrap();
    let err = manager.acquire().await.err().unwrap();
    assert!(matches!(err, EngineError::Busy));
    drop(lease);

    assert!(manager.acquire().await.is_ok());
    manager.release().await;
}

#[tokio::test]
async fn crash_during_search_is_a_protocol_error() {
    let manager = EngineManager::new(fake_engine("crash"));

    let err = manager.analyze(START_FEN).await.unwrap_err();
    assert!(matches!(err, EngineError::Protocol(_)), "got {:?}", err);

    manager.release().await;
}

#[tokio::test]
async fn engine_that_died_between_analyses_is_restarted() {
    let manager = EngineManager::new(fake_engine("once"));

    let first = manager.analyze(START_FEN).await.unwrap();
    assert_eq!(first.best_move, "e2e4");

    // The process exits right after its first answer
    tokio::time::sleep(Duration::from_millis(300)).await;

    let second = manager.analyze(AFTER_E4).await.unwrap();
    assert_eq!(second.best_move, "e7e5");
    assert_eq!(second.evaluation, Evaluation::Centipawns(-35));

    manager.release().await;
}

#[tokio::test]
async fn unresponsive_engine_times_out() {
    let manager = EngineManager::new(fake_engine("slow"));

    let err = manager.analyze(START_FEN).await.unwrap_err();
    assert!(matches!(err, EngineError::Timeout(_)), "got {:?}", err);
    assert!(!manager.is_running().await);
}

#[tokio::test]
async fn slow_handshake_is_a_start_error() {
    let manager = EngineManager::new(EngineConfig {
        startup_timeout: Duration::from_millis(200),
        ..fake_engine("mute")
    });

    let err = manager.acquire().await.err().unwrap();
    assert!(matches!(err, EngineError::Spawn(_)), "got {:?}", err);
    assert!(err.is_unavailable());
    assert!(!manager.is_running().await);
}
