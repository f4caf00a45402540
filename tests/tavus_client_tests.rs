//! Unit and mock HTTP tests for TavusClient.
//!
//! These tests cover:
//! - Video creation request formatting and error extraction
//! - Status parsing
//! - The polling stream: termination, timeout and laziness

use std::time::{Duration, Instant};

use futures_util::StreamExt;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use avatar_chat::config::TavusConfig;
use avatar_chat::tavus::{
    TavusClient, VideoCreationOutcome, VideoStatus, VideoStatusKind, TIMEOUT_DETAILS,
};

fn client_for(server: &MockServer) -> TavusClient {
    let mut config = TavusConfig::new("test-api-key", "r-test");
    config.base_url = server.uri();
    config.request_timeout = Duration::from_secs(5);
    config.poll_interval = Duration::from_millis(50);
    config.max_wait = Duration::from_secs(5);
    TavusClient::new(&config).unwrap()
}

fn json(status: u16, body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body)
}

// === Video Creation Tests ===

#[tokio::test]
async fn test_create_video_returns_job_handle_and_status_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/videos"))
        .and(header("x-api-key", "test-api-key"))
        .and(body_json(serde_json::json!({
            "replica_id": "r-test",
            "script": "Hello world"
        })))
        .respond_with(json(
            200,
            serde_json::json!({"status": "queued", "video_id": "abc123"}),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = client.create_video("Hello world").await;

    assert_eq!(outcome.video_id(), Some("abc123"));
    assert_eq!(outcome.error(), None);
    assert_eq!(
        outcome.status_url(),
        Some(format!("{}/v2/videos/abc123", mock_server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_create_video_trims_script() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_json(serde_json::json!({
            "replica_id": "r-test",
            "script": "Hi there."
        })))
        .respond_with(json(
            200,
            serde_json::json!({"status": "queued", "video_id": "v1"}),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = client.create_video("  Hi there.\n").await;
    assert_eq!(outcome.video_id(), Some("v1"));
}

#[tokio::test]
async fn test_create_video_with_blank_script_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(json(
            200,
            serde_json::json!({"status": "queued", "video_id": "never"}),
        ))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    for script in ["", "   ", "\n\t"] {
        let outcome = client.create_video(script).await;
        assert_eq!(outcome, VideoCreationOutcome::failed("Script is empty"));
    }
}

#[tokio::test]
async fn test_create_video_rejects_non_queued_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(json(
            200,
            serde_json::json!({"status": "processing", "video_id": "abc123"}),
        ))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = client.create_video("Hello world").await;

    assert_eq!(outcome.video_id(), None);
    assert_eq!(outcome.error(), Some("Unexpected status: processing"));
}

#[tokio::test]
async fn test_create_video_non_queued_prefers_body_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(json(
            200,
            serde_json::json!({"status": "error", "message": "replica is not trained"}),
        ))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = client.create_video("Hello world").await;

    assert_eq!(outcome.video_id(), None);
    assert_eq!(outcome.error(), Some("replica is not trained"));
}

#[tokio::test]
async fn test_create_video_missing_video_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(json(200, serde_json::json!({"status": "queued"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = client.create_video("Hello world").await;

    assert_eq!(outcome.error(), Some("no job handle in response"));
}

#[tokio::test]
async fn test_create_video_http_error_uses_error_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(json(
            400,
            serde_json::json!({"error": "Invalid replica_id", "message": "Bad request"}),
        ))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = client.create_video("Hello world").await;
    assert_eq!(outcome.error(), Some("Invalid replica_id"));
}

#[tokio::test]
async fn test_create_video_http_error_uses_message_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(json(
            401,
            serde_json::json!({"message": "Invalid access token"}),
        ))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = client.create_video("Hello world").await;
    assert_eq!(outcome.error(), Some("Invalid access token"));
}

#[tokio::test]
async fn test_create_video_http_error_falls_back_to_reason_phrase() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>down</html>"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = client.create_video("Hello world").await;
    assert_eq!(outcome.error(), Some("Service Unavailable"));
}

#[tokio::test]
async fn test_create_video_http_error_falls_back_to_status_code() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(599))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = client.create_video("Hello world").await;
    assert_eq!(outcome.error(), Some("HTTP 599"));
}

#[tokio::test]
async fn test_create_video_accepts_numeric_video_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(json(
            200,
            serde_json::json!({"status": "queued", "video_id": 12345}),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = client.create_video("Hello world").await;
    assert_eq!(outcome.video_id(), Some("12345"));
    assert_eq!(
        outcome.status_url(),
        Some(format!("{}/v2/videos/12345", mock_server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_create_video_http_error_reads_nested_error_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(json(
            400,
            serde_json::json!({"error": {"message": "replica not found", "code": 40}}),
        ))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = client.create_video("Hello world").await;
    assert_eq!(outcome.error(), Some("replica not found"));
}

#[tokio::test]
async fn test_create_video_transport_error_is_reported_not_raised() {
    let mut config = TavusConfig::new("test-api-key", "r-test");
    // Port 1 is reserved and nothing listens there
    config.base_url = "http://127.0.0.1:1".to_string();
    config.request_timeout = Duration::from_secs(2);
    let client = TavusClient::new(&config).unwrap();

    let outcome = client.create_video("Hello world").await;
    assert_eq!(outcome.video_id(), None);
    assert!(!outcome.error().unwrap_or_default().is_empty());
}

// === Status Tests ===

#[tokio::test]
async fn test_get_status_generating() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/videos/abc123"))
        .and(header("x-api-key", "test-api-key"))
        .respond_with(json(200, serde_json::json!({"status": "generating"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let status = client.get_status(&client.status_url("abc123")).await;

    assert_eq!(status, VideoStatus::Generating);
    assert_eq!(status.download_url(), None);
}

#[tokio::test]
async fn test_get_status_ready_with_download_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/videos/abc123"))
        .respond_with(json(
            200,
            serde_json::json!({
                "video_id": "abc123",
                "status": "ready",
                "download_url": "https://x/y.mp4",
                "hosted_url": "https://videos.tavus.io/video/abc123"
            }),
        ))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let status = client.get_status(&client.status_url("abc123")).await;
    assert_eq!(status.download_url(), Some("https://x/y.mp4"));
}

#[tokio::test]
async fn test_get_status_error_carries_status_details() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(json(
            200,
            serde_json::json!({"status": "error", "status_details": "Script too long"}),
        ))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let status = client.get_status(&client.status_url("abc123")).await;
    assert_eq!(
        status,
        VideoStatus::Error {
            details: "Script too long".to_string()
        }
    );
}

#[tokio::test]
async fn test_get_status_http_failure_is_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let status = client.get_status(&client.status_url("missing")).await;

    assert_eq!(status.kind(), VideoStatusKind::Error);
    assert!(status.details().unwrap_or_default().contains("404"));
}

#[tokio::test]
async fn test_get_status_invalid_body_is_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let status = client.get_status(&client.status_url("abc123")).await;
    assert_eq!(
        status,
        VideoStatus::Error {
            details: "invalid response body".to_string()
        }
    );
}

#[tokio::test]
async fn test_get_status_unknown_value_is_not_terminal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(json(200, serde_json::json!({"status": "transcoding"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let status = client.get_status(&client.status_url("abc123")).await;

    assert_eq!(status.kind(), VideoStatusKind::Unknown);
    assert!(!status.is_terminal());
}

// === Polling Stream Tests ===

mod wait_for_video_tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_ends_sequence_after_one_element() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/videos/abc123"))
            .respond_with(json(
                200,
                serde_json::json!({"status": "ready", "download_url": "https://x/y.mp4"}),
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let statuses: Vec<VideoStatus> = client
            .wait_for_video(&client.status_url("abc123"), None, None)
            .collect()
            .await;

        assert_eq!(
            statuses,
            vec![VideoStatus::Ready {
                download_url: "https://x/y.mp4".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_all_generating_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(json(200, serde_json::json!({"status": "generating"})))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let poll_interval = Duration::from_millis(300);
        let max_wait = Duration::from_millis(600);
        let statuses: Vec<VideoStatus> = client
            .wait_for_video(
                &client.status_url("abc123"),
                Some(poll_interval),
                Some(max_wait),
            )
            .collect()
            .await;

        assert_eq!(
            statuses,
            vec![
                VideoStatus::Generating,
                VideoStatus::Generating,
                VideoStatus::Timeout {
                    details: TIMEOUT_DETAILS.to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_sequence_length_is_bounded() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(json(200, serde_json::json!({"status": "queued"})))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let poll_interval = Duration::from_millis(100);
        let max_wait = Duration::from_millis(500);
        let statuses: Vec<VideoStatus> = client
            .wait_for_video(
                &client.status_url("abc123"),
                Some(poll_interval),
                Some(max_wait),
            )
            .collect()
            .await;

        let bound = (max_wait.as_millis() / poll_interval.as_millis()) as usize + 1;
        assert!(statuses.len() <= bound, "{} > {}", statuses.len(), bound);
        assert_eq!(statuses.last().map(VideoStatus::kind), Some(VideoStatusKind::Timeout));
        assert!(statuses[..statuses.len() - 1]
            .iter()
            .all(|s| !s.is_terminal()));
    }

    #[tokio::test]
    async fn test_generating_then_ready() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(json(200, serde_json::json!({"status": "generating"})))
            .up_to_n_times(2)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(json(
                200,
                serde_json::json!({"status": "ready", "download_url": "https://x/y.mp4"}),
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let statuses: Vec<VideoStatus> = client
            .wait_for_video(&client.status_url("abc123"), None, None)
            .collect()
            .await;

        let kinds: Vec<VideoStatusKind> = statuses.iter().map(VideoStatus::kind).collect();
        assert_eq!(
            kinds,
            vec![
                VideoStatusKind::Generating,
                VideoStatusKind::Generating,
                VideoStatusKind::Ready
            ]
        );
        assert_eq!(statuses[2].download_url(), Some("https://x/y.mp4"));
    }

    #[tokio::test]
    async fn test_unknown_status_keeps_polling() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(json(200, serde_json::json!({"status": "transcoding"})))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(json(
                200,
                serde_json::json!({"status": "deleted", "status_details": "Removed"}),
            ))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let statuses: Vec<VideoStatus> = client
            .wait_for_video(&client.status_url("abc123"), None, None)
            .collect()
            .await;

        assert_eq!(
            statuses,
            vec![
                VideoStatus::Unknown {
                    status: "transcoding".to_string()
                },
                VideoStatus::Deleted {
                    details: "Removed".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_poll_failure_ends_sequence_with_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let statuses: Vec<VideoStatus> = client
            .wait_for_video(&client.status_url("abc123"), None, None)
            .collect()
            .await;

        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].kind(), VideoStatusKind::Error);
    }

    #[tokio::test]
    async fn test_ready_without_download_url_still_ends_sequence() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(json(200, serde_json::json!({"status": "ready"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let statuses: Vec<VideoStatus> = client
            .wait_for_video(&client.status_url("abc123"), None, None)
            .collect()
            .await;

        assert_eq!(
            statuses,
            vec![VideoStatus::Ready {
                download_url: String::new()
            }]
        );
        assert_eq!(statuses[0].download_url(), None);
    }

    #[tokio::test]
    async fn test_zero_durations_fall_back_to_configured_values() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(json(200, serde_json::json!({"status": "generating"})))
            .expect(1..=3)
            .mount(&mock_server)
            .await;

        let mut config = TavusConfig::new("test-api-key", "r-test");
        config.base_url = mock_server.uri();
        config.poll_interval = Duration::from_millis(200);
        config.max_wait = Duration::from_millis(500);
        let client = TavusClient::new(&config).unwrap();

        let statuses: Vec<VideoStatus> = client
            .wait_for_video(
                &client.status_url("abc123"),
                Some(Duration::ZERO),
                Some(Duration::ZERO),
            )
            .collect()
            .await;

        // 500ms / 200ms + 1 elements at most, and the job was polled before giving up
        assert!(statuses.len() <= 4, "got {} statuses", statuses.len());
        assert_eq!(statuses[0], VideoStatus::Generating);
        assert_eq!(statuses.last().map(VideoStatus::kind), Some(VideoStatusKind::Timeout));
    }

    #[tokio::test]
    async fn test_stream_is_lazy() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(json(200, serde_json::json!({"status": "generating"})))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let stream = client.wait_for_video(&client.status_url("abc123"), None, None);
        drop(stream);
    }

    #[tokio::test]
    async fn test_abandoning_stream_stops_polling() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(json(200, serde_json::json!({"status": "generating"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let started = Instant::now();
        let first: Vec<VideoStatus> = client
            .wait_for_video(
                &client.status_url("abc123"),
                Some(Duration::from_secs(30)),
                Some(Duration::from_secs(300)),
            )
            .take(1)
            .collect()
            .await;

        assert_eq!(first, vec![VideoStatus::Generating]);
        // The 30s pause only starts when a second element is requested
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
