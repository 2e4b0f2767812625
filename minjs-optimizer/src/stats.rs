//! Optimization statistics tracking

use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistics about optimizations performed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationStats {
    /// Sub-expressions dropped from sequence expressions
    pub sequence_elements_removed: usize,
    /// Return statements whose argument was dropped
    pub return_arguments_removed: usize,
    /// Declarator initializers dropped
    pub initializers_removed: usize,
    /// `return (effect, undefined)` statements split in two
    pub returns_split: usize,
    /// `var` declarations without a source position
    pub declarations_skipped: usize,
    /// `var` initializers kept because a reassignment may be observed
    pub unsafe_violations: usize,
    /// Pipeline iterations run
    pub iterations: usize,
    /// Number of nodes before optimization
    pub nodes_before: usize,
    /// Number of nodes after optimization
    pub nodes_after: usize,
    /// Time spent optimizing (microseconds)
    pub optimization_time_us: u64,
}

impl OptimizationStats {
    /// Create new statistics tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate reduction percentage
    pub fn reduction_percentage(&self) -> f64 {
        if self.nodes_before == 0 {
            0.0
        } else {
            (self.nodes_before.saturating_sub(self.nodes_after) as f64 / self.nodes_before as f64)
                * 100.0
        }
    }

    /// Get total rewrites performed
    pub fn total_optimizations(&self) -> usize {
        self.sequence_elements_removed
            + self.return_arguments_removed
            + self.initializers_removed
            + self.returns_split
    }

    /// Merge stats from another instance
    pub fn merge(&mut self, other: &OptimizationStats) {
        self.sequence_elements_removed += other.sequence_elements_removed;
        self.return_arguments_removed += other.return_arguments_removed;
        self.initializers_removed += other.initializers_removed;
        self.returns_split += other.returns_split;
        self.declarations_skipped += other.declarations_skipped;
        self.unsafe_violations += other.unsafe_violations;
        self.optimization_time_us += other.optimization_time_us;
    }
}

impl fmt::Display for OptimizationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Statistics:")?;
        writeln!(
            f,
            "  Nodes: {} -> {} ({:.1}% reduction)",
            self.nodes_before,
            self.nodes_after,
            self.reduction_percentage()
        )?;
        writeln!(f, "  Sequence elements removed: {}", self.sequence_elements_removed)?;
        writeln!(f, "  Return arguments removed: {}", self.return_arguments_removed)?;
        writeln!(f, "  Initializers removed: {}", self.initializers_removed)?;
        writeln!(f, "  Returns split: {}", self.returns_split)?;
        writeln!(f, "  Declarations skipped: {}", self.declarations_skipped)?;
        writeln!(f, "  Unsafe violations: {}", self.unsafe_violations)?;
        writeln!(f, "  Total optimizations: {}", self.total_optimizations())?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Time: {:.3}ms", self.optimization_time_us as f64 / 1000.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_counts_rewrites_only() {
        let stats = OptimizationStats {
            sequence_elements_removed: 2,
            initializers_removed: 1,
            unsafe_violations: 5,
            declarations_skipped: 3,
            ..OptimizationStats::default()
        };
        assert_eq!(stats.total_optimizations(), 3);
    }

    #[test]
    fn test_merge_and_reduction() {
        let mut total = OptimizationStats {
            nodes_before: 10,
            nodes_after: 7,
            ..OptimizationStats::default()
        };
        let run = OptimizationStats {
            return_arguments_removed: 1,
            returns_split: 1,
            ..OptimizationStats::default()
        };
        total.merge(&run);
        total.merge(&run);
        assert_eq!(total.total_optimizations(), 4);
        assert!((total.reduction_percentage() - 30.0).abs() < 1e-9);
        assert!(total.to_string().contains("Returns split: 2"));
    }
}
