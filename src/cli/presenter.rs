//! Renders turn updates as plain terminal lines.

use std::io::{self, Write};

use avatar_chat::conversation::{TurnUpdate, VideoView};

/// Prints each [`TurnUpdate`] as it arrives.
///
/// The reply text is printed once per turn; video progress, the final URL or
/// the error label follow on their own lines.
pub struct TerminalPresenter<W: Write> {
    out: W,
    shown_text: Option<String>,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown_text: None,
        }
    }

    /// Forget the previous turn's text.
    pub fn reset(&mut self) {
        self.shown_text = None;
    }

    pub fn present(&mut self, update: &TurnUpdate) -> io::Result<()> {
        if self.shown_text.as_deref() != Some(update.text.as_str()) {
            writeln!(self.out, "{}", update.text)?;
            self.shown_text = Some(update.text.clone());
        }

        match (&update.video, &update.status) {
            (VideoView::Hidden, _) => {}
            (VideoView::Generating { message }, None) => writeln!(self.out, "[video] {}", message)?,
            (VideoView::Generating { .. }, Some(status)) => {
                writeln!(self.out, "[video] status: {}", status.kind())?
            }
            (VideoView::Ready { url }, _) => writeln!(self.out, "[video] ready: {}", url)?,
            (VideoView::Failed { label }, _) => writeln!(self.out, "[video] {}", label)?,
        }

        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
