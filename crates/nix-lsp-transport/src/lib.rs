//! Content-Length message framing shared by the client LSP transport and the
//! evaluator worker transport (`spec.md` §4.7: "identical to LSP").
//!
//! - [`read_message`] reads one framed `JsonRpcRequest`.
//! - [`read_value`] reads one framed message as a raw [`serde_json::Value`],
//!   for peers (the evaluator worker) whose replies aren't request-shaped.
//! - [`write_message`] writes a framed `JsonRpcResponse`, logging it first.
//! - [`write_notification`]/[`write_framed`] write any other framed,
//!   serializable outgoing message (outgoing requests, notifications).

pub mod framing;

pub use framing::{log_response, read_message, read_value, write_framed, write_message, write_notification};
