//! minjs optimization framework
//!
//! This crate provides the remove-undefined transform, the analyses it relies
//! on, and a pipeline that runs passes to a fixpoint.

#![warn(missing_docs)]

pub mod analysis;
pub mod passes;
pub mod pipeline;
pub mod stats;
pub mod visitor;

pub use analysis::{has_violation, is_pure_and_undefined, ClassifyOptions};
pub use passes::remove_undefined::{RemoveUndefinedOptions, RemoveUndefinedPass};
pub use passes::OptimizationPass;
pub use pipeline::{ConfigError, OptimizationConfig, OptimizationPipeline};
pub use stats::OptimizationStats;
