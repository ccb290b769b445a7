//! HTTP round trips through the classification client

use crate::mock_server::{MockServerFixture, TEST_TOKEN};
use mockito::Matcher;
use sandbox_classify::{
    ClassifyOptions, ClientError, Error, HistoryDepth, Label, TaskKind, Verdict,
};
use serde_json::json;
use std::time::Duration;

const DIALOGUE: &str = "我今天真的好累，什麼都不想做。";
const TENSION_ANSWER: &str = "Modifier：1\nIdiom：0\nDegreeHead：0\nWordCount：6\nTension：0.17";

#[tokio::test]
async fn test_emotion_and_tension_round_trip() {
    let fixture = MockServerFixture::new().await;
    let emotion = fixture.mock_function("emotion-classify", "情緒：悲傷").await;
    let tension = fixture.mock_function("tension-measure", TENSION_ANSWER).await;

    let client = fixture.create_test_client().unwrap();
    let result = client
        .classify(DIALOGUE, &ClassifyOptions::emotion_and_tension())
        .await
        .unwrap();

    emotion.assert_async().await;
    tension.assert_async().await;
    assert_eq!(result.raw(TaskKind::Emotion), Some("情緒：悲傷"));
    assert_eq!(result.raw(TaskKind::Tension), Some(TENSION_ANSWER));
    assert_eq!(result.label(), Some(&Label::Known("悲傷".into())));
    assert_eq!(result.tension(), Some(0.17));
    assert!(result.is_complete());
    assert_eq!(result.summary(), format!("情緒：悲傷\n{}", TENSION_ANSWER));

    let value = serde_json::to_value(&result).unwrap();
    assert!(value["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn test_example_sentence_returns_both_raw_strings() {
    let fixture = MockServerFixture::new().await;
    fixture.mock_function("emotion-classify", "情緒：悲傷").await;
    fixture.mock_function("tension-measure", "Tension：0.17").await;

    let client = fixture.create_test_client().unwrap();
    let before = chrono::Utc::now();
    let result = client
        .classify(
            "今天小明哭著說他不想上學，我聽了心好酸，還是忍不住陪他坐了一整節課。",
            &ClassifyOptions::emotion_and_tension(),
        )
        .await
        .unwrap();

    assert_eq!(result.raw(TaskKind::Emotion), Some("情緒：悲傷"));
    assert_eq!(result.raw(TaskKind::Tension), Some("Tension：0.17"));
    assert!(result.timestamp >= before);
}

#[tokio::test]
async fn test_request_carries_headers_and_wire_fields() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/invoke")
            .match_header("x-function-name", "emotion-classify")
            .match_header("x-platform-id", "123")
            .match_header("authorization", format!("Bearer {}", TEST_TOKEN).as_str())
            .match_header("content-type", "application/json")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({
                    "user_prompt": DIALOGUE,
                    "model_name": "gpt-4.1",
                    "history_steps": 3
                })),
                Matcher::Regex(r#""instance_id":"[0-9a-f-]{36}""#.to_string()),
                Matcher::Regex(r#""developer_prompt":""#.to_string()),
            ]))
            .with_status(200)
            .with_body(json!({ "response": "情緒：喜悅" }).to_string())
            .create_async()
            .await
    };

    let client = fixture.create_test_client().unwrap();
    let options = ClassifyOptions::new().history(HistoryDepth::Steps(3));
    let result = client.classify(DIALOGUE, &options).await.unwrap();

    mock.assert_async().await;
    assert_eq!(result.label(), Some(&Label::Known("喜悅".into())));
}

#[tokio::test]
async fn test_history_all_and_omitted() {
    let fixture = MockServerFixture::new().await;
    let all = fixture
        .mock_matching_body("emotion-classify", json!({ "history_steps": "all" }), "情緒：平靜")
        .await;

    let client = fixture.create_test_client().unwrap();
    let options = ClassifyOptions::new().history(HistoryDepth::All);
    client.classify(DIALOGUE, &options).await.unwrap();
    all.assert_async().await;

    let fixture = MockServerFixture::new().await;
    let omitted = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/invoke")
            .match_body(Matcher::Regex("history_steps".to_string()))
            .expect(0)
            .create_async()
            .await
    };
    let fallback = fixture.mock_function("emotion-classify", "情緒：平靜").await;
    let client = fixture.create_test_client().unwrap();
    client.classify(DIALOGUE, &ClassifyOptions::new()).await.unwrap();
    omitted.assert_async().await;
    fallback.assert_async().await;
}

#[tokio::test]
async fn test_empty_dialogue_sends_nothing() {
    let fixture = MockServerFixture::new().await;
    let guard = fixture.mock_no_requests().await;
    let client = fixture.create_test_client().unwrap();

    for input in ["", "   \n\t"] {
        let err = client
            .classify(input, &ClassifyOptions::emotion_and_tension())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }), "got {:?}", err);
    }
    guard.assert_async().await;
}

#[tokio::test]
async fn test_remote_detail_is_surfaced_verbatim() {
    let fixture = MockServerFixture::new().await;
    fixture
        .mock_raw(
            "emotion-classify",
            400,
            r#"{"detail": "Invalid model_name: gpt-x"}"#,
        )
        .await;

    let client = fixture.create_test_client().unwrap();
    let err = client
        .classify(DIALOGUE, &ClassifyOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.message(), "Invalid model_name: gpt-x");
    assert_eq!(err.task(), Some(TaskKind::Emotion));
    let client_error = ClientError::from(&err);
    assert!(client_error.error);
    assert_eq!(client_error.message, "Invalid model_name: gpt-x");
}

#[tokio::test]
async fn test_status_without_detail_uses_generic_message() {
    let fixture = MockServerFixture::new().await;
    fixture.mock_raw("emotion-classify", 502, "Bad Gateway").await;

    let client = fixture.create_test_client().unwrap();
    let value = client
        .classify_to_value(DIALOGUE, &ClassifyOptions::new())
        .await;

    assert_eq!(value["error"], json!(true));
    assert_eq!(value["message"], json!("Request failed with status code 502"));
}

#[tokio::test]
async fn test_fail_fast_when_one_task_fails() {
    let fixture = MockServerFixture::new().await;
    fixture.mock_function("emotion-classify", "情緒：悲傷").await;
    fixture
        .mock_raw("tension-measure", 500, r#"{"detail": "model overloaded"}"#)
        .await;

    let client = fixture.create_test_client().unwrap();
    let err = client
        .classify(DIALOGUE, &ClassifyOptions::emotion_and_tension())
        .await
        .unwrap_err();

    assert_eq!(err.task(), Some(TaskKind::Tension));
    assert_eq!(err.message(), "model overloaded");
}

#[tokio::test]
async fn test_partial_policy_keeps_successful_tasks() {
    let fixture = MockServerFixture::new().await;
    fixture.mock_function("emotion-classify", "情緒：悲傷").await;
    fixture
        .mock_raw("tension-measure", 500, r#"{"detail": "model overloaded"}"#)
        .await;

    let client = fixture.create_test_client().unwrap();
    let result = client
        .classify(DIALOGUE, &ClassifyOptions::emotion_and_tension().partial())
        .await
        .unwrap();

    assert!(!result.is_complete());
    assert_eq!(result.outputs.len(), 1);
    assert_eq!(result.failures[0].kind, TaskKind::Tension);
    assert_eq!(result.failures[0].message, "model overloaded");
    assert_eq!(result.summary(), "情緒：悲傷");
}

#[tokio::test]
async fn test_missing_response_field_is_malformed() {
    let fixture = MockServerFixture::new().await;
    fixture
        .mock_raw("emotion-classify", 200, r#"{"status": "ok"}"#)
        .await;

    let client = fixture.create_test_client().unwrap();
    let err = client
        .classify(DIALOGUE, &ClassifyOptions::new())
        .await
        .unwrap_err();

    assert!(
        matches!(&err, Error::TaskFailed { source, .. } if matches!(**source, Error::MalformedResponse(_))),
        "got {:?}",
        err
    );
}

#[tokio::test]
async fn test_label_outside_closed_set_is_undeterminable() {
    let fixture = MockServerFixture::new().await;
    fixture.mock_function("tone-classify", "「困惑」").await;
    fixture
        .mock_function("emotion-intensity", "情緒：憤怒\n強度：High")
        .await;

    let client = fixture.create_test_client().unwrap();
    let options = ClassifyOptions::new().tasks([TaskKind::Tone, TaskKind::Intensity]);
    let result = client.classify(DIALOGUE, &options).await.unwrap();

    let tone = result.output(TaskKind::Tone).unwrap();
    assert_eq!(
        tone.verdict,
        Verdict::Label {
            label: Label::Undeterminable
        }
    );
    assert_eq!(
        result.intensity(),
        Some(sandbox_classify::IntensityLevel::High)
    );
}

#[tokio::test]
async fn test_per_call_timeout_can_exceed_config_timeout() {
    let fixture = MockServerFixture::new().await;
    fixture
        .mock_delayed("emotion-classify", "情緒：悲傷", Duration::from_millis(900))
        .await;

    let client = sandbox_classify::ClassificationClient::builder()
        .config(fixture.config().with_timeout(Duration::from_millis(300)))
        .build()
        .unwrap();
    let options = ClassifyOptions::new().timeout(Duration::from_secs(10));
    let result = client.classify(DIALOGUE, &options).await.unwrap();

    assert_eq!(result.label(), Some(&Label::Known("悲傷".into())));
}

#[tokio::test]
async fn test_slow_sandbox_reports_task_timeout() {
    let fixture = MockServerFixture::new().await;
    fixture
        .mock_delayed("emotion-classify", "情緒：悲傷", Duration::from_millis(900))
        .await;

    let client = fixture.create_test_client().unwrap();
    let options = ClassifyOptions::new().timeout(Duration::from_millis(200));
    let err = client.classify(DIALOGUE, &options).await.unwrap_err();

    assert!(err.is_timeout());
    assert!(
        matches!(
            err,
            Error::Timeout {
                task: TaskKind::Emotion,
                after_ms: 200
            }
        ),
        "got {:?}",
        err
    );
}
