//! Testing utilities for the Glasskit crates.
//!
//! Fakes for the event queue's collaborators (sinks and storage) and
//! fixture flows and events shared by the integration tests.

pub mod data_generators;
pub mod implementations;

pub use data_generators::events::{events, sample_event};
pub use data_generators::flows::{conditional_flow, linear_flow, payload};
pub use implementations::sinks::{BlockingSink, RecordingSink};
pub use implementations::storage::FailingStorage;
