//! Core types and data structures for minjs
//!
//! This crate provides the building blocks shared by the parser and the
//! optimizer:
//! - AST representation as an arena graph
//! - Scope and binding index
//! - Purity predicate and constant evaluator
//! - Compact source printer

pub mod ast;
pub mod error;
pub mod evaluate;
pub mod printer;
pub mod purity;
pub mod scope;
pub mod value;

pub use error::{Error, Result};
