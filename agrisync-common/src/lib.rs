//! # AgriSync Common Library
//!
//! Shared code for the AgriSync services:
//! - Error type and result alias
//! - Configuration resolution (environment → TOML → compiled default)
//! - Slack Web API client (messages and Home tab views)
//! - Job request and trigger-source types exchanged between relay and scraper

pub mod config;
pub mod error;
pub mod job;
pub mod slack;

pub use error::{Error, Result};
pub use job::{JobRequest, SyncOutcome, TriggerSource};
