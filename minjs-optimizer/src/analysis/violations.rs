//! Reassignment safety for hoisted bindings
//!
//! Dropping the initializer of `var x = undefined` is only sound when nothing
//! can assign `x` before the declaration runs and have that value survive.
//! Positions are compared as source offsets, so the check is textual:
//!
//! - a write that starts before the declaration is unsafe
//! - a write inside a named function is unsafe if that function, or any
//!   function enclosing it, is referenced before the declaration
//! - a write inside a loop that also encloses the declaration is unsafe,
//!   since a previous iteration may have run it
//!
//! Missing positions are unsafe; they are never inferred.

use minjs_core::ast::{Graph, Node, NodeId};
use minjs_core::scope::{Binding, BindingId, ScopeId, ScopeTree};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use tracing::debug;

/// Function or program node owning the declarations that hoist out of
/// `node`'s position.
pub fn scope_parent(graph: &Graph, node: NodeId) -> Option<NodeId> {
    graph
        .function_parent(node)
        .or_else(|| graph.program_parent(node))
}

fn loop_parent(graph: &Graph, node: NodeId, scope_parent: NodeId) -> Option<NodeId> {
    graph
        .find_parent(node, |id, data| data.is_loop() || id == scope_parent)
        .filter(|found| *found != scope_parent)
}

fn function_parent(graph: &Graph, node: NodeId, scope_parent: NodeId) -> Option<NodeId> {
    graph
        .function_parent(node)
        .filter(|found| *found != scope_parent)
}

/// Binding through which a named function can be called.
///
/// A declaration is bound in the scope around it, a named function
/// expression only inside itself. Arrows and anonymous functions have none.
fn function_binding(graph: &Graph, scopes: &ScopeTree, func: NodeId) -> Option<BindingId> {
    let own = scopes.scope_for_node(func)?;
    match graph.get_node(func)? {
        Node::FunctionDeclaration { id, .. } => {
            let outer = scopes.scope(own).parent?;
            scopes.get_binding(outer, identifier_name(graph, *id)?)
        }
        Node::FunctionExpression { id: Some(id), .. } => {
            scopes.get_binding(own, identifier_name(graph, *id)?)
        }
        _ => None,
    }
}

fn identifier_name(graph: &Graph, id: NodeId) -> Option<&str> {
    match graph.get_node(id)? {
        Node::Identifier { name } => Some(name),
        _ => None,
    }
}

/// Every reference that can invoke one of the named functions enclosing
/// `node`, stopping at `scope_parent`.
///
/// Calling a function from a reference also runs the functions around that
/// reference, so references are followed transitively. The walk is
/// breadth-first with a visited set; mutual recursion terminates.
pub fn function_references(
    graph: &Graph,
    scopes: &ScopeTree,
    node: NodeId,
    scope_parent: NodeId,
) -> Vec<NodeId> {
    let mut references = Vec::new();
    let mut visited = FxHashSet::default();
    let mut worklist = VecDeque::from([node]);

    while let Some(path) = worklist.pop_front() {
        let mut func = function_parent(graph, path, scope_parent);
        while let Some(current) = func {
            if let Some(binding) = function_binding(graph, scopes, current) {
                for reference in &scopes.binding(binding).references {
                    if visited.insert(*reference) {
                        references.push(*reference);
                        worklist.push_back(*reference);
                    }
                }
            }
            func = function_parent(graph, current, scope_parent);
        }
    }

    references
}

/// Whether some write to the binding declared by `declarator` could be
/// observed before the declaration at offset `start` runs.
///
/// `scope` is the scope the declaration appears in. Returns `true` (unsafe)
/// when the name does not resolve to this declarator's binding.
pub fn has_violation(
    graph: &Graph,
    scopes: &ScopeTree,
    declarator: NodeId,
    scope: ScopeId,
    start: usize,
) -> bool {
    let Some(Node::VariableDeclarator { id, .. }) = graph.get_node(declarator) else {
        return true;
    };
    let Some(name) = identifier_name(graph, *id) else {
        return true;
    };
    let Some(binding) = scopes.get_binding(scope, name) else {
        debug!(%name, "binding not found");
        return true;
    };
    let binding = scopes.binding(binding);
    if binding.path != declarator && !binding.constant_violations.contains(&declarator) {
        debug!(%name, "name resolves to a different binding");
        return true;
    }
    let Some(scope_parent) = scope_parent(graph, declarator) else {
        return true;
    };

    writes(graph, binding, declarator)
        .any(|write| is_unsafe_write(graph, scopes, declarator, scope_parent, write, start))
}

/// Sites other than `declarator` that give the binding a value.
///
/// The declaring site is one of them unless it is a bare `var x;`: a
/// parameter, a function, or an earlier `var x = 1` all assign.
fn writes<'b>(
    graph: &'b Graph,
    binding: &'b Binding,
    declarator: NodeId,
) -> impl Iterator<Item = NodeId> + 'b {
    let declaring = (binding.path != declarator
        && !matches!(
            graph.get_node(binding.path),
            Some(Node::VariableDeclarator { init: None, .. })
        ))
    .then_some(binding.path);

    declaring.into_iter().chain(
        binding
            .constant_violations
            .iter()
            .copied()
            .filter(move |write| *write != declarator),
    )
}

fn is_unsafe_write(
    graph: &Graph,
    scopes: &ScopeTree,
    declarator: NodeId,
    scope_parent: NodeId,
    write: NodeId,
    start: usize,
) -> bool {
    let Some(node) = graph.get_node(write) else {
        debug!(write = %write, "write is no longer in the graph");
        return true;
    };
    // Function declarations are initialized when their scope is entered
    if matches!(node, Node::FunctionDeclaration { .. }) {
        debug!(write = %write, "hoisted function redeclares the binding");
        return true;
    }

    let write_start = match graph.start(write) {
        Some(offset) if offset >= start => offset,
        _ => {
            debug!(write = %write, start, "write may run before the declaration");
            return true;
        }
    };

    let early_call = function_references(graph, scopes, write, scope_parent)
        .into_iter()
        .find(|reference| graph.start(*reference).map_or(true, |offset| offset < start));
    if let Some(reference) = early_call {
        debug!(write = %write, reference = %reference, "enclosing function is referenced before the declaration");
        return true;
    }

    let mut current = loop_parent(graph, declarator, scope_parent);
    while let Some(loop_node) = current {
        if graph.end(loop_node).map_or(true, |end| end > write_start) {
            debug!(write = %write, loop_node = %loop_node, "write may run on an earlier iteration");
            return true;
        }
        current = loop_parent(graph, loop_node, scope_parent);
    }

    false
}
