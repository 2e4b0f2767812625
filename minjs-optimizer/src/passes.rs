//! Individual optimization passes

pub mod remove_undefined;

use crate::stats::OptimizationStats;
use anyhow::Result;
use minjs_core::ast::{Graph, Node};

/// Trait for optimization passes
pub trait OptimizationPass: Send + Sync {
    /// Name of the optimization pass
    fn name(&self) -> &str;

    /// Run the optimization pass
    fn run(&mut self, graph: &Graph) -> Result<Graph>;

    /// Check if the pass is applicable
    fn is_applicable(&self, graph: &Graph) -> bool {
        graph
            .root_id
            .and_then(|root| graph.get_node(root))
            .map_or(false, |root| matches!(root, Node::Program { .. }))
    }

    /// Get statistics about the pass
    fn stats(&self) -> String {
        format!("{} pass completed", self.name())
    }

    /// Counters from the most recent run
    fn counters(&self) -> OptimizationStats {
        OptimizationStats::new()
    }
}

#[cfg(test)]
#[path = "passes_tests.rs"]
mod passes_tests;
