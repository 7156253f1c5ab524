//! Pipeline module
//!
//! Assembles the aggregation for one page.
//!
//! # Overview
//!
//! The pipeline module provides:
//! - `PipelineBuilder` - validates a request and orders its stages
//! - `PipelinePlan` - the immutable result: stages, count filter and the
//!   bookkeeping the result builder needs
//!
//! ```text
//! $match ─▶ [$project] ─▶ [$sort ─▶ $group] ─▶ $sort ─▶ $limit n+1 ─▶ [$lookup ...] ─▶ [$match]
//! ```

mod builder;
mod plan;

#[cfg(test)]
mod tests;

pub use builder::PipelineBuilder;
pub use plan::PipelinePlan;
