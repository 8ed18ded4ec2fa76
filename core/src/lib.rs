// stepflow/src/lib.rs

//! Stepflow: named-step asynchronous pipelines.
//!
//! A [`Pipeline`] is an ordered list of named steps. Each step may carry `before`, `on` and
//! `after` handlers, may be optional, and may be skipped by a predicate evaluated against the
//! request context. Handlers receive a cloned [`ContextData`] handle and return a
//! [`PipelineControl`] telling the pipeline whether to go on or halt.
//!
//! Pipelines are registered once in a [`FlowRegistry`], keyed by the type of data they run
//! over, and dispatched per request with [`FlowRegistry::run`].

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::FlowRegistry;
