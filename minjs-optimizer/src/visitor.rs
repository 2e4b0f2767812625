//! Visitor pattern infrastructure for AST traversal

use minjs_core::ast::{DeclarationKind, Graph, Node, NodeId};

/// Trait for visiting AST nodes
pub trait NodeVisitor {
    /// The result type produced by this visitor
    type Result;

    /// Visit any node - dispatches to specific visit methods
    fn visit_node(&mut self, graph: &Graph, node_id: NodeId) -> Self::Result {
        match graph.get_node(node_id) {
            Some(node) => match node {
                Node::Sequence { expressions } => self.visit_sequence(graph, node_id, expressions),
                Node::Return { argument } => self.visit_return(graph, node_id, *argument),
                Node::VariableDeclaration { kind, declarations } => {
                    self.visit_variable_declaration(graph, node_id, *kind, declarations)
                }
                _ => self.visit_default(graph, node_id, node),
            },
            None => self.visit_missing(graph, node_id),
        }
    }

    /// Visit a sequence expression
    fn visit_sequence(&mut self, graph: &Graph, node_id: NodeId, expressions: &[NodeId]) -> Self::Result;

    /// Visit a return statement
    fn visit_return(&mut self, graph: &Graph, node_id: NodeId, argument: Option<NodeId>) -> Self::Result;

    /// Visit a `var`, `let` or `const` declaration
    fn visit_variable_declaration(
        &mut self,
        graph: &Graph,
        node_id: NodeId,
        kind: DeclarationKind,
        declarations: &[NodeId],
    ) -> Self::Result;

    /// Visit a default node (for unhandled node types)
    fn visit_default(&mut self, graph: &Graph, node_id: NodeId, node: &Node) -> Self::Result;

    /// Visit a missing node (node ID not found in graph)
    fn visit_missing(&mut self, graph: &Graph, node_id: NodeId) -> Self::Result;
}

/// Visits every node under `root` in pre-order and collects the results.
///
/// Traversal order comes from [`Graph::descendants`], so it is iterative and
/// safe on deeply nested programs.
pub fn walk<V: NodeVisitor>(visitor: &mut V, graph: &Graph, root: NodeId) -> Vec<V::Result> {
    graph
        .descendants(root)
        .into_iter()
        .map(|node_id| visitor.visit_node(graph, node_id))
        .collect()
}
