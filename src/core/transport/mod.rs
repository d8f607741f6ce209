//! Transport layer for the MCP server.
//!
//! This module provides two transport implementations:
//! - **SSE**: event stream push channel plus a POST message endpoint, one
//!   session per stream (default) - feature: `sse`
//! - **STDIO**: standard input/output - feature: `stdio`
//!
//! Each transport handles the connection lifecycle and delegates
//! message processing to the MCP server handler.
//!
//! # Feature Flags
//!
//! - `sse` (default): SSE transport - adds axum, tower, tower-http, uuid
//! - `stdio` (default): STDIO transport - minimal dependencies

mod config;
mod error;
mod service;

#[cfg(feature = "sse")]
pub mod jsonrpc;

#[cfg(feature = "sse")]
pub mod session;

#[cfg(feature = "sse")]
pub mod sse;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "sse")]
pub use config::{DEFAULT_PORT, SseConfig};
