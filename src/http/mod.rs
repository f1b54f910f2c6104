//! HTTP server module.
//!
//! The server includes:
//! - Plain HTTP listener (TLS is terminated in front of the service)
//! - Graceful shutdown on SIGTERM/SIGINT

mod server;
mod shutdown;

pub use server::{bind_address, start_server, ServerError};
