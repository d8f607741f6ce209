//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file.

pub mod fetch_activities;

pub use fetch_activities::{
    FetchActivitiesOutput, FetchActivitiesParams, FetchActivitiesTool, MAX_LIMIT, MIN_LIMIT,
};
