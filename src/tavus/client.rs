//! TavusClient - handles communication with the Tavus video API.

use std::time::Duration;

use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

use super::status::{VideoCreationOutcome, VideoStatus};
use crate::config::TavusConfig;

/// Header carrying the Tavus API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Queue status the creation endpoint reports for an accepted job.
const QUEUED_STATUS: &str = "queued";

/// Request body for video creation.
#[derive(Debug, Serialize)]
struct CreateVideoRequest<'a> {
    replica_id: &'a str,
    script: &'a str,
}

/// Fields read from the creation endpoint's body.
///
/// Error bodies share the shape, so every field is optional. Each field is
/// read on its own so one oddly typed value does not discard the others.
#[derive(Debug, Default)]
struct CreateVideoResponse {
    status: Option<String>,
    video_id: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

impl CreateVideoResponse {
    fn parse(body: &str) -> Self {
        let value: Value = serde_json::from_str(body).unwrap_or(Value::Null);
        Self {
            status: value.get("status").and_then(text),
            video_id: value.get("video_id").and_then(text),
            error: value.get("error").and_then(error_text),
            message: value.get("message").and_then(text),
        }
    }

    /// First non-empty error text the service put in the body.
    fn message(&self) -> Option<String> {
        [&self.error, &self.message]
            .into_iter()
            .flatten()
            .map(|m| m.trim())
            .find(|m| !m.is_empty())
            .map(str::to_string)
    }
}

/// String or number as text.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `error` is either a string or an object carrying `message`.
fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(fields) => fields.get("message").and_then(text),
        other => text(other),
    }
}

/// Response from the status endpoint.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    status_details: Option<String>,
}

impl StatusResponse {
    fn into_status(self) -> VideoStatus {
        let status = self.status.unwrap_or_default().trim().to_ascii_lowercase();
        let details = |fallback: &str| {
            self.status_details
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        match status.as_str() {
            "queued" => VideoStatus::Queued,
            "generating" => VideoStatus::Generating,
            "ready" => VideoStatus::Ready {
                download_url: self.download_url.clone().unwrap_or_default(),
            },
            "error" => VideoStatus::Error {
                details: details("Video error"),
            },
            "deleted" => VideoStatus::Deleted {
                details: details("Video deleted"),
            },
            "" => VideoStatus::Unknown {
                status: "unknown".to_string(),
            },
            _ => VideoStatus::Unknown { status },
        }
    }
}

/// Client for the Tavus create/poll protocol.
///
/// Cloning is cheap and clones share one connection pool.
#[derive(Clone)]
pub struct TavusClient {
    api_key: String,
    replica_id: String,
    videos_url: String,
    poll_interval: Duration,
    max_wait: Duration,
    http_client: reqwest::Client,
}

impl TavusClient {
    /// Create a client from the Tavus section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns `TavusError::MissingApiKey` or `TavusError::MissingReplicaId`
    /// when either value is blank, or `TavusError::Http` if the HTTP client
    /// cannot be built.
    pub fn new(config: &TavusConfig) -> Result<Self, TavusError> {
        if config.api_key.trim().is_empty() {
            return Err(TavusError::MissingApiKey);
        }
        if config.replica_id.trim().is_empty() {
            return Err(TavusError::MissingReplicaId);
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(config.request_timeout))
            .build()?;

        Ok(Self {
            api_key: config.api_key.trim().to_string(),
            replica_id: config.replica_id.trim().to_string(),
            videos_url: config.videos_url(),
            poll_interval: config.poll_interval,
            max_wait: config.max_wait,
            http_client,
        })
    }

    pub fn replica_id(&self) -> &str {
        &self.replica_id
    }

    /// Endpoint videos are created on.
    pub fn videos_url(&self) -> &str {
        &self.videos_url
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Status URL for a job handle.
    pub fn status_url(&self, video_id: &str) -> String {
        format!("{}/{}", self.videos_url, video_id)
    }

    /// Request generation of a video in which the replica speaks `script`.
    ///
    /// Issues exactly one POST, or none when the script is blank. Failures of
    /// any kind are reported through [`VideoCreationOutcome::Failed`].
    pub async fn create_video(&self, script: &str) -> VideoCreationOutcome {
        match self.submit(script).await {
            Ok(video_id) => {
                log::info!("Video queued: {}", video_id);
                let status_url = self.status_url(&video_id);
                VideoCreationOutcome::Queued {
                    video_id,
                    status_url,
                }
            }
            Err(e) => {
                log::warn!("Video creation failed: {}", e);
                VideoCreationOutcome::failed(e.to_string())
            }
        }
    }

    async fn submit(&self, script: &str) -> Result<String, TavusError> {
        let script = script.trim();
        if script.is_empty() {
            return Err(TavusError::EmptyScript);
        }

        let request_body = CreateVideoRequest {
            replica_id: &self.replica_id,
            script,
        };

        let response = self
            .http_client
            .post(&self.videos_url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let data = CreateVideoResponse::parse(&body);

        if !status.is_success() {
            let message = data
                .message()
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(TavusError::Api(message));
        }

        if data.status.as_deref() != Some(QUEUED_STATUS) {
            let message = data.message().unwrap_or_else(|| {
                format!(
                    "Unexpected status: {}",
                    data.status.as_deref().unwrap_or("missing")
                )
            });
            return Err(TavusError::Protocol(message));
        }

        data.video_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| TavusError::Protocol("no job handle in response".to_string()))
    }

    /// Fetch the current status of a job.
    ///
    /// Issues exactly one GET. Transport failures, non-2xx responses and
    /// unparsable bodies come back as [`VideoStatus::Error`].
    pub async fn get_status(&self, status_url: &str) -> VideoStatus {
        match self.fetch_status(status_url).await {
            Ok(VideoStatus::Unknown { status }) => {
                log::warn!("Unrecognized video status '{}', still waiting", status);
                VideoStatus::Unknown { status }
            }
            Ok(status) => status,
            Err(e) => {
                log::warn!("Status check failed: {}", e);
                VideoStatus::Error {
                    details: e.to_string(),
                }
            }
        }
    }

    async fn fetch_status(&self, status_url: &str) -> Result<VideoStatus, TavusError> {
        let response = self
            .http_client
            .get(status_url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let status_response: StatusResponse = serde_json::from_str(&body)
            .map_err(|_| TavusError::Protocol("invalid response body".to_string()))?;

        Ok(status_response.into_status())
    }

    /// Poll `status_url` until the job reaches a terminal state or `max_wait`
    /// elapses.
    ///
    /// The returned stream is lazy: no request is made until it is polled, the
    /// deadline is fixed on the first poll, and the pause between requests only
    /// starts when the next element is requested. Dropping the stream cancels
    /// whatever request or sleep is in flight.
    ///
    /// Every observed status is yielded. The stream ends after the first
    /// `ready`, `error` or `deleted` status, or with a single `timeout` status
    /// once the deadline passes. `None` or a zero value for either duration
    /// means the value from the configuration.
    pub fn wait_for_video(
        &self,
        status_url: &str,
        poll_interval: Option<Duration>,
        max_wait: Option<Duration>,
    ) -> impl Stream<Item = VideoStatus> + Send + '_ {
        let poller = StatusPoller {
            client: self,
            status_url: status_url.to_string(),
            poll_interval: poll_interval
                .filter(|d| !d.is_zero())
                .unwrap_or(self.poll_interval),
            max_wait: max_wait.filter(|d| !d.is_zero()).unwrap_or(self.max_wait),
            phase: PollPhase::NotStarted,
        };

        stream::unfold(poller, |mut poller| async move {
            let status = poller.next_status().await?;
            Some((status, poller))
        })
    }
}

/// Where a [`StatusPoller`] is in its lifecycle.
#[derive(Debug, Clone, Copy)]
enum PollPhase {
    NotStarted,
    Waiting { deadline: Instant },
    Finished,
}

struct StatusPoller<'a> {
    client: &'a TavusClient,
    status_url: String,
    poll_interval: Duration,
    max_wait: Duration,
    phase: PollPhase,
}

impl StatusPoller<'_> {
    async fn next_status(&mut self) -> Option<VideoStatus> {
        let deadline = match self.phase {
            PollPhase::Finished => return None,
            PollPhase::NotStarted => Instant::now() + self.max_wait,
            PollPhase::Waiting { deadline } => {
                let wake = (Instant::now() + self.poll_interval).min(deadline);
                tokio::time::sleep_until(wake).await;
                deadline
            }
        };

        if Instant::now() >= deadline {
            log::warn!("Gave up on {} after {:?}", self.status_url, self.max_wait);
            self.phase = PollPhase::Finished;
            return Some(VideoStatus::timeout());
        }

        let status = self.client.get_status(&self.status_url).await;
        log::debug!("Video status: {}", status.kind());

        self.phase = if status.is_terminal() {
            PollPhase::Finished
        } else {
            PollPhase::Waiting { deadline }
        };
        Some(status)
    }
}

/// Errors that can occur while talking to Tavus.
///
/// The public video operations fold these into [`VideoCreationOutcome`] and
/// [`VideoStatus`] values; their display text is what the user sees.
#[derive(Debug, thiserror::Error)]
pub enum TavusError {
    #[error("Tavus API key not configured")]
    MissingApiKey,

    #[error("Tavus replica id not configured")]
    MissingReplicaId,

    #[error("Script is empty")]
    EmptyScript,

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Api(String),

    #[error("{0}")]
    Protocol(String),
}
