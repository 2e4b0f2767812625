//! Optimization pipeline management

use crate::passes::remove_undefined::{RemoveUndefinedOptions, RemoveUndefinedPass};
use crate::passes::OptimizationPass;
use crate::stats::OptimizationStats;
use anyhow::Result;
use minjs_core::ast::Graph;
use minjs_core::printer::print;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// Errors in a host-supplied configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The JSON could not be parsed into a configuration
    #[error("invalid optimizer configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The pipeline would never run a pass
    #[error("max_iterations must be at least 1")]
    NoIterations,
}

/// Optimization configuration
///
/// Missing fields take their default, so hosts can pass only the options
/// they care about, e.g. `{"tdz": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    /// Enable the remove-undefined pass
    pub remove_undefined: bool,
    /// Let constant evaluation reason about the temporal dead zone
    pub tdz: bool,
    /// Maximum optimization iterations
    pub max_iterations: usize,
}

impl OptimizationConfig {
    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.max_iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        Ok(config)
    }

    /// Options for the remove-undefined pass
    pub fn remove_undefined_options(&self) -> RemoveUndefinedOptions {
        RemoveUndefinedOptions { tdz: self.tdz }
    }
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            remove_undefined: true,
            tdz: false,
            max_iterations: 4,
        }
    }
}

/// Optimization pipeline
pub struct OptimizationPipeline {
    config: OptimizationConfig,
    stats: OptimizationStats,
    passes: Vec<Box<dyn OptimizationPass>>,
}

impl OptimizationPipeline {
    /// Create new optimization pipeline
    pub fn new(config: OptimizationConfig) -> Self {
        let mut pipeline = Self {
            config,
            stats: OptimizationStats::new(),
            passes: Vec::new(),
        };

        // Add passes based on configuration
        pipeline.configure_passes();

        pipeline
    }

    /// Configure passes based on config
    fn configure_passes(&mut self) {
        self.passes.clear();

        if self.config.remove_undefined {
            self.passes.push(Box::new(RemoveUndefinedPass::new(
                self.config.remove_undefined_options(),
            )));
        }
    }

    /// Run every pass until an iteration changes nothing or
    /// `max_iterations` is reached. Each pass builds its own scope index from
    /// the graph it is given.
    pub fn optimize(&mut self, graph: &Graph) -> Result<Graph> {
        let start = Instant::now();
        self.stats = OptimizationStats::new();
        self.stats.nodes_before = graph.nodes.len();

        let mut optimized = graph.clone();

        for iteration in 0..self.config.max_iterations {
            let mut round = OptimizationStats::new();

            for pass in &mut self.passes {
                if !pass.is_applicable(&optimized) {
                    continue;
                }
                optimized = pass.run(&optimized)?;
                debug!(iteration, pass = pass.name(), "{}", pass.stats());
                round.merge(&pass.counters());
            }
            self.stats.merge(&round);
            // Rejections describe the latest graph, not a running total
            self.stats.declarations_skipped = round.declarations_skipped;
            self.stats.unsafe_violations = round.unsafe_violations;
            self.stats.iterations += 1;

            // Stop if no changes
            if round.total_optimizations() == 0 {
                break;
            }
        }

        self.stats.nodes_after = optimized.nodes.len();
        self.stats.optimization_time_us = start.elapsed().as_micros() as u64;

        Ok(optimized)
    }

    /// Parse, optimize and print `source`
    pub fn optimize_source(&mut self, source: &str) -> Result<String> {
        let graph = minjs_parser::parse(source)?;
        let optimized = self.optimize(&graph)?;
        Ok(print(&optimized)?)
    }

    /// Get optimization statistics
    pub fn stats(&self) -> &OptimizationStats {
        &self.stats
    }

    /// Configuration the pipeline was built from
    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    /// Add custom pass
    pub fn add_pass(&mut self, pass: Box<dyn OptimizationPass>) {
        self.passes.push(pass);
    }

    /// Remove all passes
    pub fn clear_passes(&mut self) {
        self.passes.clear();
    }
}

impl Default for OptimizationPipeline {
    fn default() -> Self {
        Self::new(OptimizationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_partial_json() {
        let config = OptimizationConfig::from_json(r#"{"tdz": true}"#).unwrap();
        assert!(config.tdz);
        assert!(config.remove_undefined);
        assert_eq!(config.max_iterations, OptimizationConfig::default().max_iterations);
        assert_eq!(config.remove_undefined_options(), RemoveUndefinedOptions { tdz: true });
    }

    #[test]
    fn test_config_rejects_bad_input() {
        assert!(matches!(
            OptimizationConfig::from_json("{\"tdz\": 1}"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            OptimizationConfig::from_json(r#"{"max_iterations": 0}"#),
            Err(ConfigError::NoIterations)
        ));
    }

    #[test]
    fn test_disabled_pass_leaves_graph_alone() {
        let config = OptimizationConfig {
            remove_undefined: false,
            ..OptimizationConfig::default()
        };
        let mut pipeline = OptimizationPipeline::new(config);
        assert_eq!(pipeline.optimize_source("let x = undefined;").unwrap(), "let x = undefined;");
        assert_eq!(pipeline.stats().iterations, 1);
        assert_eq!(pipeline.stats().total_optimizations(), 0);
    }

    #[test]
    fn test_pipeline_stops_at_fixpoint() {
        let mut pipeline = OptimizationPipeline::default();
        let output = pipeline.optimize_source("let x = undefined; a, void 0, b;").unwrap();
        assert_eq!(output, "let x; a, b;");

        let stats = pipeline.stats();
        assert_eq!(stats.initializers_removed, 1);
        assert_eq!(stats.sequence_elements_removed, 1);
        assert_eq!(stats.iterations, 2);
        assert!(stats.nodes_after < stats.nodes_before);
    }
}
