//! One conversational turn: model reply, then optionally an avatar video of it.
//!
//! [`Conversation::turn`] returns a stream of [`TurnUpdate`]s for the
//! presentation layer. The reply text rides along on every update so a video
//! failure can never hide it.

use std::fmt;
use std::sync::Arc;

use futures_util::stream::{self, BoxStream, Stream, StreamExt};

use crate::chat::ChatModel;
use crate::tavus::{TavusClient, VideoCreationOutcome, VideoStatus};

/// Text shown when the model returns an empty reply.
pub const EMPTY_REPLY_TEXT: &str = "No response from the model.";

/// Loading message shown while a video is rendering.
pub const GENERATING_MESSAGE: &str = "Video is being generated, please wait...";

/// Label used when the service says `ready` but gives no download URL.
pub const MISSING_DOWNLOAD_URL_LABEL: &str = "Video is ready but no download URL was returned.";

/// Tone the model is asked to answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    Friendly,
    Formal,
    Casual,
    #[default]
    Neutral,
    Professional,
    Empathetic,
    Humorous,
    Angry,
    Romantic,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Friendly => "Friendly",
            Tone::Formal => "Formal",
            Tone::Casual => "Casual",
            Tone::Neutral => "Neutral",
            Tone::Professional => "Professional",
            Tone::Empathetic => "Empathetic",
            Tone::Humorous => "Humorous",
            Tone::Angry => "Angry",
            Tone::Romantic => "Romantic",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for one turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub user_input: String,
    pub system_context: String,
    pub tone: Tone,
    pub generate_video: bool,
}

impl TurnRequest {
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            system_context: String::new(),
            tone: Tone::default(),
            generate_video: true,
        }
    }

    /// System message sent to the model: the context followed by the tone.
    pub fn system_message(&self) -> String {
        format!("{}\nTone: {}", self.system_context, self.tone)
            .trim()
            .to_string()
    }
}

/// What the video area should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoView {
    /// No video for this turn.
    Hidden,
    /// Loading indicator.
    Generating { message: String },
    /// A playable video.
    Ready { url: String },
    /// A labeled error in place of the video.
    Failed { label: String },
}

impl VideoView {
    /// View for one polled status.
    pub fn for_status(status: &VideoStatus) -> Self {
        match status {
            VideoStatus::Ready { download_url } if download_url.is_empty() => VideoView::Failed {
                label: MISSING_DOWNLOAD_URL_LABEL.to_string(),
            },
            VideoStatus::Ready { download_url } => VideoView::Ready {
                url: download_url.clone(),
            },
            VideoStatus::Error { details }
            | VideoStatus::Deleted { details }
            | VideoStatus::Timeout { details } => VideoView::Failed {
                label: details.clone(),
            },
            VideoStatus::Queued | VideoStatus::Generating | VideoStatus::Unknown { .. } => {
                VideoView::Generating {
                    message: GENERATING_MESSAGE.to_string(),
                }
            }
        }
    }
}

/// One step of progress within a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnUpdate {
    pub text: String,
    pub video: VideoView,
    /// The polled status this update was derived from, if any.
    pub status: Option<VideoStatus>,
}

impl TurnUpdate {
    fn new(text: impl Into<String>, video: VideoView) -> Self {
        Self {
            text: text.into(),
            video,
            status: None,
        }
    }

    /// Whether the turn ends with this update.
    pub fn is_final(&self) -> bool {
        !matches!(self.video, VideoView::Generating { .. })
    }
}

/// Drives turns against an injected chat model and a Tavus client.
pub struct Conversation {
    chat: Arc<dyn ChatModel>,
    video: TavusClient,
}

enum TurnState<'a> {
    Start(TurnRequest),
    Polling {
        text: String,
        statuses: BoxStream<'a, VideoStatus>,
    },
    Done,
}

impl Conversation {
    pub fn new(chat: Arc<dyn ChatModel>, video: TavusClient) -> Self {
        Self { chat, video }
    }

    /// Run one turn.
    ///
    /// The stream yields the reply (with a final video state when no video is
    /// produced), then a loading update and one update per polled status when
    /// a video job was queued. It ends at the first terminal status. Nothing
    /// happens until the stream is polled; dropping it stops the turn.
    pub fn turn(&self, request: TurnRequest) -> impl Stream<Item = TurnUpdate> + Send + '_ {
        stream::unfold(TurnState::Start(request), move |state| async move {
            match state {
                TurnState::Start(request) => Some(self.start(request).await),
                TurnState::Polling { text, mut statuses } => {
                    let status = statuses.next().await?;
                    let mut update = TurnUpdate::new(text.clone(), VideoView::for_status(&status));
                    let next = if status.is_terminal() {
                        if let VideoView::Failed { label } = &update.video {
                            log::warn!("Video failed: {}", label);
                        }
                        TurnState::Done
                    } else {
                        TurnState::Polling { text, statuses }
                    };
                    update.status = Some(status);
                    Some((update, next))
                }
                TurnState::Done => None,
            }
        })
    }

    async fn start(&self, request: TurnRequest) -> (TurnUpdate, TurnState<'_>) {
        let reply = match self
            .chat
            .reply(&request.system_message(), &request.user_input)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("Conversation failed: {}", e);
                let message = e.to_string();
                let update = TurnUpdate::new(
                    message.clone(),
                    VideoView::Failed { label: message },
                );
                return (update, TurnState::Done);
            }
        };

        if reply.trim().is_empty() {
            return (
                TurnUpdate::new(EMPTY_REPLY_TEXT, VideoView::Hidden),
                TurnState::Done,
            );
        }

        if !request.generate_video {
            return (TurnUpdate::new(reply, VideoView::Hidden), TurnState::Done);
        }

        match self.video.create_video(&reply).await {
            VideoCreationOutcome::Failed { error } => {
                let label = format!("Video: {}", error);
                (
                    TurnUpdate::new(reply, VideoView::Failed { label }),
                    TurnState::Done,
                )
            }
            VideoCreationOutcome::Queued { status_url, .. } => {
                let statuses = self.video.wait_for_video(&status_url, None, None).boxed();
                let update = TurnUpdate::new(
                    reply.clone(),
                    VideoView::Generating {
                        message: GENERATING_MESSAGE.to_string(),
                    },
                );
                (
                    update,
                    TurnState::Polling {
                        text: reply,
                        statuses,
                    },
                )
            }
        }
    }
}
