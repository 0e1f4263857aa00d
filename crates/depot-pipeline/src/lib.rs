//! Depot Pipeline
//!
//! Wires the content store, characterization, derivative generation, version
//! import and fixity auditing behind one [`Pipeline`] value. Jobs are executed
//! by the worker pool from `depot-worker`, which calls back into the pipeline
//! through its `JobHandlerContext` implementation.

pub mod fixity;
mod job_dispatch;
pub mod job_handlers;
pub mod pipeline;
pub mod telemetry;

pub use fixity::FixityService;
pub use pipeline::{DepositOutcome, Pipeline, PipelineComponents};
pub use telemetry::init_telemetry;
