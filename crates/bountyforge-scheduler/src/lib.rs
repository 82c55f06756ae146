//! The scan pipeline engine for BountyForge.
//!
//! `pipeline` runs the fixed stage order against the Adapter Registry
//! and projects the working target set forward after each stage.
//! `runner` wraps a pipeline run with durable persistence and event
//! publishing. `bus` is the in-process `EventBus` implementation these
//! pieces publish through.

pub mod bus;
pub mod pipeline;
pub mod projection;
pub mod runner;
pub mod worker;

pub use bus::InMemoryEventBus;
pub use pipeline::{PipelineConfig, PipelineEngine, PipelineEvent, PipelineRunResult};
pub use runner::JobRunner;
pub use worker::Worker;
