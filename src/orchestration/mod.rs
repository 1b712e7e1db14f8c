//! Orchestration layer for the release pipeline
//!
//! Drives the build and publication stages in order and records progress
//! in the pipeline state machine.

pub mod pipeline;

pub use pipeline::{PipelineOptions, PublishReport, ReleasePipeline};
