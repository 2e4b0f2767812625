//! Side-effect freedom of expressions

use crate::ast::{Graph, Node, NodeId, UnaryOperator};
use crate::scope::ScopeTree;

/// Whether evaluating `node` can have no observable effect.
///
/// Identifiers are pure only when they resolve to a declared binding: reading
/// an undeclared global may throw. Calls, assignments, updates and member
/// accesses are never pure.
pub fn is_pure(graph: &Graph, scopes: &ScopeTree, node: NodeId) -> bool {
    let Some(data) = graph.get_node(node) else {
        return false;
    };

    match data {
        Node::Literal(_)
        | Node::This
        | Node::FunctionExpression { .. }
        | Node::ArrowFunction { .. }
        | Node::FunctionDeclaration { .. } => true,
        Node::Identifier { name } => scopes
            .scope_of(graph, node)
            .and_then(|scope| scopes.get_binding(scope, name))
            .is_some(),
        Node::Array { elements } => elements.iter().all(|e| is_pure(graph, scopes, *e)),
        Node::Unary {
            operator: UnaryOperator::Delete,
            ..
        } => false,
        Node::Unary { argument, .. } => is_pure(graph, scopes, *argument),
        Node::Binary { left, right, .. } | Node::Logical { left, right, .. } => {
            is_pure(graph, scopes, *left) && is_pure(graph, scopes, *right)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DeclarationKind, Literal};

    fn build(graph: &mut Graph, body: Vec<NodeId>) -> ScopeTree {
        let root = graph.add_node(Node::Program { body }).unwrap();
        graph.root_id = Some(root);
        ScopeTree::build(graph).unwrap()
    }

    fn expression_statement(graph: &mut Graph, expression: NodeId) -> NodeId {
        graph
            .add_node(Node::ExpressionStatement { expression })
            .unwrap()
    }

    #[test]
    fn test_literals_and_void() {
        let mut graph = Graph::new();
        let zero = graph.add_node(Node::Literal(Literal::Number(0.0))).unwrap();
        let void = graph
            .add_node(Node::Unary {
                operator: UnaryOperator::Void,
                argument: zero,
            })
            .unwrap();
        let stmt = expression_statement(&mut graph, void);
        let scopes = build(&mut graph, vec![stmt]);

        assert!(is_pure(&graph, &scopes, zero));
        assert!(is_pure(&graph, &scopes, void));
    }

    #[test]
    fn test_identifiers_need_a_binding() {
        let mut graph = Graph::new();
        let id = graph
            .add_node(Node::Identifier {
                name: "x".to_string(),
            })
            .unwrap();
        let declarator = graph
            .add_node(Node::VariableDeclarator { id, init: None })
            .unwrap();
        let decl = graph
            .add_node(Node::VariableDeclaration {
                kind: DeclarationKind::Let,
                declarations: vec![declarator],
            })
            .unwrap();
        let read_x = graph
            .add_node(Node::Identifier {
                name: "x".to_string(),
            })
            .unwrap();
        let read_global = graph
            .add_node(Node::Identifier {
                name: "undefined".to_string(),
            })
            .unwrap();
        let first = expression_statement(&mut graph, read_x);
        let second = expression_statement(&mut graph, read_global);
        let scopes = build(&mut graph, vec![decl, first, second]);

        assert!(is_pure(&graph, &scopes, read_x));
        assert!(!is_pure(&graph, &scopes, read_global));
    }

    #[test]
    fn test_calls_and_delete_are_impure() {
        let mut graph = Graph::new();
        let callee = graph
            .add_node(Node::Identifier {
                name: "f".to_string(),
            })
            .unwrap();
        let call = graph
            .add_node(Node::Call {
                callee,
                arguments: vec![],
            })
            .unwrap();
        let one = graph.add_node(Node::Literal(Literal::Number(1.0))).unwrap();
        let delete = graph
            .add_node(Node::Unary {
                operator: UnaryOperator::Delete,
                argument: one,
            })
            .unwrap();
        let first = expression_statement(&mut graph, call);
        let second = expression_statement(&mut graph, delete);
        let scopes = build(&mut graph, vec![first, second]);

        assert!(!is_pure(&graph, &scopes, call));
        assert!(!is_pure(&graph, &scopes, delete));
    }

    #[test]
    fn test_missing_node_is_impure() {
        let graph = Graph::new();
        let scopes = ScopeTree::default();
        assert!(!is_pure(&graph, &scopes, NodeId::new(1).unwrap()));
    }
}
