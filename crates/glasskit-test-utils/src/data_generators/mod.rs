//! Fixture data

pub mod events;
pub mod flows;
