//! Client-side state for the MindMend notification feed.

pub mod cache;
