// src/pipeline/mod.rs

pub mod diagnostics;
pub mod metrics;
pub mod runner;
pub mod servo;

pub use diagnostics::SnapshotWriter;
pub use metrics::PipelineMetrics;
pub use runner::{run_loop, LoopOptions};
pub use servo::ServoPipeline;
