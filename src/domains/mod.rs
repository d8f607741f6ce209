//! Domain modules containing business logic.
//!
//! - **activities**: Fetching and extracting the public activity listing
//! - **tools**: MCP tools exposed to clients

pub mod activities;
pub mod tools;
