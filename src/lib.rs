//! Activities MCP Server Library
//!
//! Fetches the public Chengdu youth activity listing, extracts one record
//! per listed activity and exposes the result to MCP clients as the
//! `fetch_activities` tool.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the MCP server handler and the
//!   SSE / STDIO transports
//! - **domains**: business logic organized by bounded contexts
//!   - **activities**: page fetching and HTML extraction
//!   - **tools**: the `fetch_activities` tool definition and routing
//!
//! # Example
//!
//! ```rust,no_run
//! use activities_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
pub use domains::activities::{Activity, ActivityQuery};
