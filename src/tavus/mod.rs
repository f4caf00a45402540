//! Tavus avatar video integration.
//!
//! A video is created from the reply text, then its status URL is polled until
//! the service reports a terminal state or our own deadline passes.

mod client;
mod status;

pub use client::{TavusClient, TavusError};
pub use status::{VideoCreationOutcome, VideoStatus, VideoStatusKind, TIMEOUT_DETAILS};
