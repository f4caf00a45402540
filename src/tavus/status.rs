//! Values produced by the Tavus create/poll protocol.

use std::fmt;

/// Detail attached to the status emitted when polling hits its deadline.
pub const TIMEOUT_DETAILS: &str = "Video generation timed out.";

/// Result of requesting video creation.
///
/// Exactly one of a job handle (with its status URL) or an error is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoCreationOutcome {
    /// The job was accepted and queued.
    Queued { video_id: String, status_url: String },
    /// The job could not be created.
    Failed { error: String },
}

impl VideoCreationOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn video_id(&self) -> Option<&str> {
        match self {
            Self::Queued { video_id, .. } => Some(video_id),
            Self::Failed { .. } => None,
        }
    }

    pub fn status_url(&self) -> Option<&str> {
        match self {
            Self::Queued { status_url, .. } => Some(status_url),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Queued { .. } => None,
            Self::Failed { error } => Some(error),
        }
    }
}

/// Discriminant of a [`VideoStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoStatusKind {
    Queued,
    Generating,
    Ready,
    Error,
    Deleted,
    Timeout,
    Unknown,
}

impl VideoStatusKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Generating => "generating",
            Self::Ready => "ready",
            Self::Error => "error",
            Self::Deleted => "deleted",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }

    /// Whether polling stops after a status of this kind.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Ready | Self::Error | Self::Deleted | Self::Timeout
        )
    }
}

impl fmt::Display for VideoStatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a video job as observed by one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoStatus {
    Queued,
    Generating,
    /// The video is rendered. `download_url` is empty when the service
    /// reported `ready` without a download location.
    Ready { download_url: String },
    Error { details: String },
    Deleted { details: String },
    /// Our own deadline passed before the job reached a terminal state.
    Timeout { details: String },
    /// A status value this client does not recognize.
    Unknown { status: String },
}

impl VideoStatus {
    pub fn kind(&self) -> VideoStatusKind {
        match self {
            Self::Queued => VideoStatusKind::Queued,
            Self::Generating => VideoStatusKind::Generating,
            Self::Ready { .. } => VideoStatusKind::Ready,
            Self::Error { .. } => VideoStatusKind::Error,
            Self::Deleted { .. } => VideoStatusKind::Deleted,
            Self::Timeout { .. } => VideoStatusKind::Timeout,
            Self::Unknown { .. } => VideoStatusKind::Unknown,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }

    pub fn timeout() -> Self {
        Self::Timeout {
            details: TIMEOUT_DETAILS.to_string(),
        }
    }

    /// Download location, if this is a `ready` status carrying a non-empty one.
    pub fn download_url(&self) -> Option<&str> {
        match self {
            Self::Ready { download_url } if !download_url.is_empty() => Some(download_url),
            _ => None,
        }
    }

    /// Human-readable detail for failure kinds.
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Error { details } | Self::Deleted { details } | Self::Timeout { details } => {
                Some(details)
            }
            _ => None,
        }
    }
}
