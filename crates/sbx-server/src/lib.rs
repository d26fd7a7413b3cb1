//! Sandbox workspace server. Routes JSON-RPC requests to services.
//!
//! The server owns all services and implements [`RequestHandler`] for the
//! stdio transport, which reads one request per line and writes one
//! response per line.

pub mod router;
pub mod stdio;

pub use router::SandboxServer;
pub use stdio::{RequestHandler, handle_message, serve_lines, serve_stdio};
