//! Glasskit Flow
//!
//! A synchronous state machine walking a statically defined graph of named
//! steps. It keeps a linear history for back-navigation, accumulates flow
//! data through shallow merges, and supports data-dependent branching.
//! Presentation layers observe it through [`FlowEngine::subscribe`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod domain;
pub mod engine;
pub mod error;
pub mod observer;
pub mod tracking;

pub use domain::flow_definition::{Flow, FlowStep, StepEdge, StepResolver};
pub use domain::ids::{FlowId, StepId};
pub use domain::{merge_data, FlowData};
pub use engine::FlowEngine;
pub use error::FlowError;
pub use observer::{FlowListener, FlowTransition, Subscription, TransitionKind};
pub use tracking::{FlowTracking, FLOW_COMPLETED, FLOW_STEP_VIEWED};
