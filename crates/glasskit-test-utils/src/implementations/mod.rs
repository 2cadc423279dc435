//! Fake implementations of queue collaborators

pub mod sinks;
pub mod storage;
