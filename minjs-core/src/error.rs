//! Error types for minjs

use crate::ast::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Graph node ID overflow: maximum number of nodes reached")]
    GraphNodeIdOverflow,

    #[error("Node {0} not found in graph")]
    MissingNode(NodeId),

    #[error("Graph has no root node")]
    MissingRoot,

    #[error("Invalid tree: {0}")]
    InvalidTree(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
