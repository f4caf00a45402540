//! avatar-chat library crate.
//!
//! Talks to a hosted chat model and turns its replies into speaking-avatar
//! videos through the Tavus create/poll API.

pub mod chat;
pub mod config;
pub mod conversation;
pub mod tavus;
