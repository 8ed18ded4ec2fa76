// stepflow/src/pipeline/mod.rs

//! `Pipeline` construction (`definition`), handler registration (`hooks`) and the run loop
//! (`execution`).

pub mod definition;
pub mod execution;
pub mod hooks;

pub use definition::Pipeline;
