//! Batch evaluation over HTTP

use crate::mock_server::MockServerFixture;
use sandbox_classify::batch::{
    BatchExecutor, BatchExecutorConfig, BatchReport, BatchStrategy, Dataset,
};
use sandbox_classify::{ClassifyOptions, TaskKind};
use std::time::Duration;

const DATASET: &str = r#"[
    {"character_information": "國小老師",
     "sentences": [
        {"emotion_label": "悲傷", "emotion_sentences": ["我真的好想念他。", "一切都沒有意義了。"]},
        {"emotion_label": "喜悅", "emotion_sentences": ["今天終於放假了！"]}
     ]}
]"#;

#[tokio::test]
async fn test_batch_execution_order_preserving() {
    let fixture = MockServerFixture::new().await;
    let emotion = fixture
        .mock_function_times("emotion-classify", "情緒：悲傷", 3)
        .await;
    let tension = fixture
        .mock_function_times("tension-measure", "Tension：0.25", 3)
        .await;

    let client = fixture.create_test_client().unwrap();
    let dataset = Dataset::from_json_str(DATASET).unwrap();
    let config = BatchExecutorConfig::new()
        .with_strategy(BatchStrategy::Concurrent { max_concurrency: 2 });
    let run = BatchExecutor::with_config(&client, config)
        .run(dataset.samples())
        .await;

    emotion.assert_async().await;
    tension.assert_async().await;
    assert_eq!(run.total_samples, 3);
    assert_eq!(run.success_count(), 3);
    let indexes: Vec<usize> = run.records.iter().map(|r| r.index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);

    let report = BatchReport::from_records(&run.records);
    assert_eq!(report.valid_predictions, 3);
    assert!((report.accuracy.unwrap() - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(report.top_confusions[0].expected, "喜悅");
    assert_eq!(report.tension.unwrap().mean, 0.25);
    let kinds: Vec<TaskKind> = report.latency_ms.iter().map(|(k, _)| *k).collect();
    assert_eq!(kinds, vec![TaskKind::Emotion, TaskKind::Tension]);
}

#[tokio::test]
async fn test_batch_with_failures_continues_and_writes_jsonl() {
    let fixture = MockServerFixture::new().await;
    fixture
        .mock_raw("emotion-classify", 503, r#"{"detail": "sandbox busy"}"#)
        .await;

    let client = fixture.create_test_client().unwrap();
    let dataset = Dataset::from_json_str(DATASET).unwrap();
    let config = BatchExecutorConfig::new()
        .with_pause(Duration::from_millis(1))
        .with_options(ClassifyOptions::new());
    let run = BatchExecutor::with_config(&client, config)
        .run(dataset.samples())
        .await;

    assert_eq!(run.records.len(), 3);
    assert_eq!(run.failure_count(), 3);
    assert_eq!(run.records[0].error.as_deref(), Some("sandbox busy"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.jsonl");
    run.write_jsonl(std::fs::File::create(&path).unwrap()).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 3);
    let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
    assert_eq!(first["expected_label"], "悲傷");
    assert_eq!(first["error"], "sandbox busy");

    let report = BatchReport::from_records(&run.records);
    assert_eq!(report.failed, 3);
    assert_eq!(report.accuracy, None);
}

#[tokio::test]
async fn test_batch_stops_after_first_failure_when_requested() {
    let fixture = MockServerFixture::new().await;
    let failing = fixture
        .mock_raw("emotion-classify", 500, r#"{"detail": "boom"}"#)
        .await;

    let client = fixture.create_test_client().unwrap();
    let dataset = Dataset::from_json_str(DATASET).unwrap();
    let config = BatchExecutorConfig::new()
        .with_continue_on_error(false)
        .with_options(ClassifyOptions::new());
    let run = BatchExecutor::with_config(&client, config)
        .run(dataset.samples())
        .await;

    assert_eq!(run.records.len(), 1);
    assert_eq!(run.total_samples, 3);
    failing.assert_async().await;
}
