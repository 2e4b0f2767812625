//! Parser error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token at position {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input")]
    UnexpectedEof,

    #[error("Invalid number literal: {0}")]
    InvalidNumber(String),

    #[error("Unclosed delimiter: {0}")]
    UnclosedDelimiter(String),

    #[error("Invalid syntax: {0}")]
    InvalidSyntax(String),

    #[error("Maximum parsing depth exceeded: depth {depth} exceeds limit of {max_depth}")]
    MaxDepthExceeded { depth: usize, max_depth: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnexpectedToken,
    UnexpectedEof,
    InvalidNumber,
    UnclosedDelimiter,
    InvalidSyntax,
    MaxDepthExceeded,
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::UnexpectedToken { .. } => ErrorKind::UnexpectedToken,
            ParseError::UnexpectedEof => ErrorKind::UnexpectedEof,
            ParseError::InvalidNumber(_) => ErrorKind::InvalidNumber,
            ParseError::UnclosedDelimiter(_) => ErrorKind::UnclosedDelimiter,
            ParseError::InvalidSyntax(_) => ErrorKind::InvalidSyntax,
            ParseError::MaxDepthExceeded { .. } => ErrorKind::MaxDepthExceeded,
        }
    }
}

impl From<minjs_core::Error> for ParseError {
    fn from(err: minjs_core::Error) -> Self {
        match err {
            minjs_core::Error::GraphNodeIdOverflow => ParseError::InvalidSyntax(
                "Graph node ID overflow - maximum number of nodes reached".to_string(),
            ),
            _ => ParseError::InvalidSyntax(format!("Core error: {}", err)),
        }
    }
}
