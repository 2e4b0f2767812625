//! Parser for the JavaScript subset handled by minjs
//!
//! - Optimized lexer using logos
//! - Recursive descent with a depth limit
//! - Every node carries its source byte range, which downstream analyses
//!   use to order reads and writes

pub mod error;
pub mod lexer;
pub mod parser;


pub use error::{ErrorKind, ParseError};
pub use parser::{ParseResult, Parser};

use minjs_core::ast::Graph;

/// Parse source text into a program graph
pub fn parse(source: &str) -> Result<Graph, ParseError> {
    Parser::new(source).parse()
}

/// Parse with custom depth limit to prevent stack overflow
pub fn parse_with_depth_limit(source: &str, max_depth: usize) -> Result<Graph, ParseError> {
    Parser::new(source).with_max_depth(max_depth).parse()
}
