//! Program analysis infrastructure for optimizations
//!
//! Both analyses are read-only over a graph and its [`ScopeTree`]. They
//! answer conservatively: a `false` from the classifier or a `true` from the
//! violation check only ever costs an optimization, never correctness.
//!
//! [`ScopeTree`]: minjs_core::scope::ScopeTree

pub mod classifier;
pub mod violations;

pub use classifier::{is_pure_and_undefined, ClassifyOptions};
pub use violations::{function_references, has_violation, scope_parent};

#[cfg(test)]
#[path = "analysis_tests.rs"]
mod analysis_tests;
