//! Recognizes expressions that are `undefined` without side effects

use minjs_core::ast::{Graph, NodeId};
use minjs_core::evaluate::{evaluate, EvaluateOptions};
use minjs_core::purity::is_pure;
use minjs_core::scope::{ScopeId, ScopeTree};
use tracing::trace;

/// Options for [`is_pure_and_undefined`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Forwarded to the constant evaluator
    pub tdz: bool,
    /// Scope used to detect a shadowed `undefined`. `None` means no bindings
    /// are visible, so callers without scope context must not pass names
    /// that could be shadowed.
    pub scope: Option<ScopeId>,
}

/// Whether dropping `expr` in favor of an implicit `undefined` preserves
/// behavior.
pub fn is_pure_and_undefined(
    graph: &Graph,
    scopes: &ScopeTree,
    expr: NodeId,
    options: ClassifyOptions,
) -> bool {
    let Some(node) = graph.get_node(expr) else {
        return false;
    };

    if node.is_identifier_named("undefined") {
        let shadowed = options
            .scope
            .map_or(false, |scope| scopes.has_binding(scope, "undefined", true));
        if shadowed {
            trace!(node = %expr, "`undefined` is a local binding");
        }
        return !shadowed;
    }

    if !is_pure(graph, scopes, expr) {
        return false;
    }

    evaluate(graph, scopes, expr, EvaluateOptions { tdz: options.tdz }).is_undefined()
}
