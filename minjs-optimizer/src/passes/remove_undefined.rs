//! Remove explicit `undefined`
//!
//! Values that are provably `undefined` and free of side effects are dropped
//! where an implicit `undefined` means the same thing:
//!
//! - `a, void 0, b;` becomes `a, b;`
//! - `return undefined;` becomes `return;`
//! - `return (f(), undefined);` becomes `f(); return;`
//! - `let x = undefined;` becomes `let x;`
//! - `var x = void 0;` becomes `var x;` unless a reassignment of `x` could be
//!   observed before the declaration runs
//!
//! Each sweep decides its edits against an unmodified graph and a fresh
//! [`ScopeTree`], then applies them. Sweeps repeat until one finds nothing,
//! since unwrapping a sequence can expose a new candidate.

use crate::analysis::{has_violation, is_pure_and_undefined, ClassifyOptions};
use crate::passes::OptimizationPass;
use crate::stats::OptimizationStats;
use crate::visitor::{walk, NodeVisitor};
use anyhow::Result;
use minjs_core::ast::{DeclarationKind, Graph, Node, NodeId, UnaryOperator};
use minjs_core::scope::{ScopeId, ScopeTree};
use minjs_core::Error;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, trace};

/// Options for [`RemoveUndefinedPass`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoveUndefinedOptions {
    /// Let the constant evaluator reason about the temporal dead zone
    pub tdz: bool,
}

/// A rewrite decided against one snapshot of the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Drop elements of a sequence expression
    TrimSequence {
        /// The sequence
        sequence: NodeId,
        /// Elements to drop
        remove: Vec<NodeId>,
    },
    /// Drop the argument of a return statement
    ClearArgument {
        /// The return statement
        statement: NodeId,
    },
    /// Move the effects of `return (effects, undefined)` into a statement of
    /// their own, leaving a bare `return`
    SplitReturn {
        /// The return statement
        statement: NodeId,
        /// Its sequence argument
        sequence: NodeId,
        /// Elements that run before the return
        keep: Vec<NodeId>,
        /// Elements that are dropped
        drop: Vec<NodeId>,
    },
    /// Drop declarator initializers
    ClearInitializers {
        /// The declarators
        declarators: Vec<NodeId>,
    },
}

/// Decides the edits for one sweep
pub struct UndefinedVisitor<'a> {
    scopes: &'a ScopeTree,
    options: RemoveUndefinedOptions,
    skipped: usize,
    unsafe_violations: usize,
}

impl<'a> UndefinedVisitor<'a> {
    /// Create a visitor over a graph whose scopes are `scopes`
    pub fn new(scopes: &'a ScopeTree, options: RemoveUndefinedOptions) -> Self {
        Self {
            scopes,
            options,
            skipped: 0,
            unsafe_violations: 0,
        }
    }

    fn classify(&self, graph: &Graph, expr: NodeId, scope: Option<ScopeId>) -> bool {
        is_pure_and_undefined(
            graph,
            self.scopes,
            expr,
            ClassifyOptions {
                tdz: self.options.tdz,
                scope,
            },
        )
    }

    fn initializer_is_undefined(
        &self,
        graph: &Graph,
        declarator: NodeId,
        scope: Option<ScopeId>,
    ) -> bool {
        match graph.get_node(declarator) {
            Some(Node::VariableDeclarator {
                init: Some(init), ..
            }) => self.classify(graph, *init, scope),
            _ => false,
        }
    }
}

impl NodeVisitor for UndefinedVisitor<'_> {
    type Result = Option<Edit>;

    fn visit_sequence(&mut self, graph: &Graph, node_id: NodeId, expressions: &[NodeId]) -> Option<Edit> {
        let last = expressions.len().checked_sub(1)?;
        let scope = self.scopes.scope_of(graph, node_id);
        let discarded = graph
            .parent(node_id)
            .and_then(|parent| graph.get_node(parent))
            .map_or(false, |parent| matches!(parent, Node::ExpressionStatement { .. }));

        let remove: Vec<NodeId> = expressions
            .iter()
            .enumerate()
            .filter(|(index, _)| *index < last || discarded)
            .map(|(_, expr)| *expr)
            .filter(|expr| self.classify(graph, *expr, scope))
            .collect();
        if remove.is_empty() {
            return None;
        }

        if let [only] = remaining(expressions, &remove).as_slice() {
            if !can_unwrap(graph, node_id, *only) {
                trace!(sequence = %node_id, "unwrapping would change the meaning of the remaining element");
                return None;
            }
        }

        Some(Edit::TrimSequence {
            sequence: node_id,
            remove,
        })
    }

    fn visit_return(&mut self, graph: &Graph, node_id: NodeId, argument: Option<NodeId>) -> Option<Edit> {
        let argument = argument?;
        let scope = self.scopes.scope_of(graph, node_id);
        if self.classify(graph, argument, scope) {
            return Some(Edit::ClearArgument { statement: node_id });
        }

        let Some(Node::Sequence { expressions }) = graph.get_node(argument) else {
            return None;
        };
        let (last, rest) = expressions.split_last()?;
        if statement_index(graph, node_id).is_none() || !self.classify(graph, *last, scope) {
            return None;
        }

        let (mut drop, keep): (Vec<NodeId>, Vec<NodeId>) = rest
            .iter()
            .copied()
            .partition(|expr| self.classify(graph, *expr, scope));
        drop.push(*last);
        Some(Edit::SplitReturn {
            statement: node_id,
            sequence: argument,
            keep,
            drop,
        })
    }

    fn visit_variable_declaration(
        &mut self,
        graph: &Graph,
        node_id: NodeId,
        kind: DeclarationKind,
        declarations: &[NodeId],
    ) -> Option<Edit> {
        let scope = self.scopes.scope_of(graph, node_id);
        let declarators: Vec<NodeId> = match kind {
            DeclarationKind::Const => return None,
            DeclarationKind::Let => declarations
                .iter()
                .copied()
                .filter(|declarator| self.initializer_is_undefined(graph, *declarator, scope))
                .collect(),
            DeclarationKind::Var => {
                let Some(start) = graph.start(node_id) else {
                    trace!(declaration = %node_id, "skipping declaration without a source position");
                    self.skipped += 1;
                    return None;
                };
                let scope = scope?;
                let mut safe = Vec::new();
                for declarator in declarations {
                    if !self.initializer_is_undefined(graph, *declarator, Some(scope)) {
                        continue;
                    }
                    if has_violation(graph, self.scopes, *declarator, scope, start) {
                        self.unsafe_violations += 1;
                        continue;
                    }
                    safe.push(*declarator);
                }
                safe
            }
        };

        (!declarators.is_empty()).then_some(Edit::ClearInitializers { declarators })
    }

    fn visit_default(&mut self, _graph: &Graph, _node_id: NodeId, _node: &Node) -> Option<Edit> {
        None
    }

    fn visit_missing(&mut self, _graph: &Graph, _node_id: NodeId) -> Option<Edit> {
        None
    }
}

fn remaining(expressions: &[NodeId], remove: &[NodeId]) -> Vec<NodeId> {
    expressions
        .iter()
        .copied()
        .filter(|expr| !remove.contains(expr))
        .collect()
}

/// Whether `only` can stand in for `sequence` in its parent.
///
/// `(0, o.f)()` calls `f` without `o` as receiver, `(0, eval)(s)` is an
/// indirect eval, and `typeof (0, x)` or `delete (0, x)` treat an identifier
/// operand specially.
fn can_unwrap(graph: &Graph, sequence: NodeId, only: NodeId) -> bool {
    let Some(parent) = graph.parent(sequence).and_then(|parent| graph.get_node(parent)) else {
        return false;
    };
    let only = graph.get_node(only);
    match parent {
        Node::Call { callee, .. } if *callee == sequence => match only {
            Some(Node::Member { .. }) => false,
            Some(node) => !node.is_identifier_named("eval"),
            None => false,
        },
        Node::Unary {
            operator: UnaryOperator::TypeOf | UnaryOperator::Delete,
            ..
        } => !matches!(only, Some(Node::Identifier { .. } | Node::Member { .. })),
        _ => true,
    }
}

/// Position of `statement` in the body of the program or block holding it
fn statement_index(graph: &Graph, statement: NodeId) -> Option<usize> {
    match graph.get_node(graph.parent(statement)?)? {
        Node::Program { body } | Node::Block { body } => {
            body.iter().position(|candidate| *candidate == statement)
        }
        _ => None,
    }
}

/// Removes a sequence node whose elements now live elsewhere
fn remove_shell(graph: &mut Graph, sequence: NodeId) {
    if let Some(Node::Sequence { expressions }) = graph.get_node_mut(sequence) {
        expressions.clear();
    }
    graph.remove_subtree(sequence);
}

/// Removes a statement from its parent, leaving an empty statement where a
/// statement list is not available.
fn remove_statement(graph: &mut Graph, statement: NodeId) -> Result<()> {
    let parent = graph
        .parent(statement)
        .ok_or_else(|| Error::InvalidTree(format!("{statement} has no parent")))?;
    match statement_index(graph, statement) {
        Some(index) => {
            if let Some(Node::Program { body } | Node::Block { body }) = graph.get_node_mut(parent) {
                body.remove(index);
            }
        }
        None => {
            let empty = graph.add_node(Node::Empty)?;
            graph.replace_child(parent, statement, empty)?;
        }
    }
    graph.remove_subtree(statement);
    Ok(())
}

fn apply(graph: &mut Graph, edit: Edit, stats: &mut OptimizationStats) -> Result<()> {
    match edit {
        Edit::TrimSequence { sequence, remove } => {
            let Some(Node::Sequence { expressions }) = graph.get_node(sequence) else {
                return Ok(());
            };
            let present: Vec<NodeId> = remove
                .into_iter()
                .filter(|expr| expressions.contains(expr))
                .collect();
            if present.is_empty() {
                return Ok(());
            }
            let kept = remaining(expressions, &present);

            for expr in &present {
                graph.remove_subtree(*expr);
            }
            stats.sequence_elements_removed += present.len();

            let parent = graph
                .parent(sequence)
                .ok_or_else(|| Error::InvalidTree(format!("{sequence} has no parent")))?;
            match kept.len() {
                0 => remove_statement(graph, parent)?,
                1 => {
                    graph.replace_child(parent, sequence, kept[0])?;
                    remove_shell(graph, sequence);
                }
                _ => {
                    if let Some(Node::Sequence { expressions }) = graph.get_node_mut(sequence) {
                        *expressions = kept;
                    }
                }
            }
        }
        Edit::ClearArgument { statement } => {
            let argument = match graph.get_node_mut(statement) {
                Some(Node::Return { argument }) => argument.take(),
                _ => None,
            };
            if let Some(argument) = argument {
                graph.remove_subtree(argument);
                stats.return_arguments_removed += 1;
            }
        }
        Edit::SplitReturn {
            statement,
            sequence,
            keep,
            drop,
        } => {
            let current = match graph.get_node(statement) {
                Some(Node::Return { argument }) => *argument,
                _ => None,
            };
            if current != Some(sequence) || !graph.contains(sequence) {
                return Ok(());
            }
            let (Some(parent), Some(index)) =
                (graph.parent(statement), statement_index(graph, statement))
            else {
                return Ok(());
            };

            for expr in &drop {
                graph.remove_subtree(*expr);
            }
            stats.sequence_elements_removed += drop.len();

            let effects = match keep.len() {
                0 => {
                    remove_shell(graph, sequence);
                    None
                }
                1 => {
                    remove_shell(graph, sequence);
                    Some(keep[0])
                }
                _ => {
                    if let Some(Node::Sequence { expressions }) = graph.get_node_mut(sequence) {
                        *expressions = keep;
                    }
                    Some(sequence)
                }
            };

            if let Some(Node::Return { argument }) = graph.get_node_mut(statement) {
                *argument = None;
            }
            match effects {
                Some(expression) => {
                    let effect = graph.add_node(Node::ExpressionStatement { expression })?;
                    if let Some(Node::Program { body } | Node::Block { body }) = graph.get_node_mut(parent) {
                        body.insert(index, effect);
                    }
                    stats.returns_split += 1;
                }
                None => stats.return_arguments_removed += 1,
            }
        }
        Edit::ClearInitializers { declarators } => {
            for declarator in declarators {
                let init = match graph.get_node_mut(declarator) {
                    Some(Node::VariableDeclarator { init, .. }) => init.take(),
                    _ => None,
                };
                if let Some(init) = init {
                    graph.remove_subtree(init);
                    stats.initializers_removed += 1;
                }
            }
        }
    }
    Ok(())
}

/// Remove-undefined pass
pub struct RemoveUndefinedPass {
    options: RemoveUndefinedOptions,
    stats: OptimizationStats,
}

impl RemoveUndefinedPass {
    /// Create new remove-undefined pass
    pub fn new(options: RemoveUndefinedOptions) -> Self {
        Self {
            options,
            stats: OptimizationStats::new(),
        }
    }

    /// Options the pass was created with
    pub fn options(&self) -> RemoveUndefinedOptions {
        self.options
    }

    /// One sweep: returns whether anything changed
    fn sweep(&mut self, graph: &mut Graph, root: NodeId) -> Result<bool> {
        let scopes = ScopeTree::build(graph)?;
        let mut visitor = UndefinedVisitor::new(&scopes, self.options);
        let edits: Vec<Edit> = walk(&mut visitor, graph, root).into_iter().flatten().collect();

        // Rejections are recounted every sweep; keep the latest
        self.stats.declarations_skipped = visitor.skipped;
        self.stats.unsafe_violations = visitor.unsafe_violations;
        if edits.is_empty() {
            return Ok(false);
        }

        let before = self.stats.total_optimizations();
        for edit in edits {
            apply(graph, edit, &mut self.stats)?;
        }
        graph.rebuild_parents();
        Ok(self.stats.total_optimizations() > before)
    }
}

impl Default for RemoveUndefinedPass {
    fn default() -> Self {
        Self::new(RemoveUndefinedOptions::default())
    }
}

impl OptimizationPass for RemoveUndefinedPass {
    fn name(&self) -> &str {
        "Remove Undefined"
    }

    fn run(&mut self, graph: &Graph) -> Result<Graph> {
        let start = Instant::now();
        self.stats = OptimizationStats::new();
        self.stats.nodes_before = graph.nodes.len();

        let mut optimized = graph.clone();
        optimized.rebuild_parents();
        let root = optimized.root_id.ok_or(Error::MissingRoot)?;

        let mut sweeps = 0;
        loop {
            sweeps += 1;
            if !self.sweep(&mut optimized, root)? {
                break;
            }
        }

        self.stats.nodes_after = optimized.nodes.len();
        self.stats.optimization_time_us = start.elapsed().as_micros() as u64;
        debug!(
            sweeps,
            removed = self.stats.total_optimizations(),
            unsafe_violations = self.stats.unsafe_violations,
            skipped = self.stats.declarations_skipped,
            "remove-undefined finished"
        );
        Ok(optimized)
    }

    fn stats(&self) -> String {
        format!(
            "{} pass: {} values removed, {} initializers kept as unsafe",
            self.name(),
            self.stats.total_optimizations(),
            self.stats.unsafe_violations
        )
    }

    fn counters(&self) -> OptimizationStats {
        self.stats.clone()
    }
}
