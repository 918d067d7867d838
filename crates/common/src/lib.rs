//! Shared building blocks for the MindMend backend: configuration,
//! database/Redis connection helpers, the common error type, and the
//! domain types used across crates.

pub mod config;
pub mod db;
pub mod error;
pub mod redis_pool;
pub mod types;
