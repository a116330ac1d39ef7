//! Client library for streaming search exports from a remote search service.
//!
//! A [`SessionController`](controller::SessionController) drives one
//! [`SearchExportSession`](session::SearchExportSession) at a time. The session
//! re-issues export requests through a [`Transport`](client::Transport) until
//! the server marks the job's output final, numbering records as they arrive.

pub mod cli;
pub mod client;
pub mod config;
pub mod controller;
pub mod export;
pub mod session;
