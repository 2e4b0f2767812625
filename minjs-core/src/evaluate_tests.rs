use super::*;
use crate::ast::DeclarationKind;

fn literal(graph: &mut Graph, literal: Literal) -> NodeId {
    graph.add_node(Node::Literal(literal)).unwrap()
}

fn ident_at(graph: &mut Graph, name: &str, start: usize) -> NodeId {
    graph
        .add_node_with_span(
            Node::Identifier {
                name: name.to_string(),
            },
            start,
            start + name.len(),
        )
        .unwrap()
}

/// Wraps `expressions` as statements of a program and indexes its scopes.
fn program(graph: &mut Graph, mut body: Vec<NodeId>, expressions: &[NodeId]) -> ScopeTree {
    for expression in expressions {
        let stmt = graph
            .add_node(Node::ExpressionStatement {
                expression: *expression,
            })
            .unwrap();
        body.push(stmt);
    }
    let root = graph.add_node(Node::Program { body }).unwrap();
    graph.root_id = Some(root);
    ScopeTree::build(graph).unwrap()
}

/// `<kind> name = init;` spanning `start..end`
fn declare(
    graph: &mut Graph,
    kind: DeclarationKind,
    name: &str,
    init: NodeId,
    start: usize,
    end: usize,
) -> NodeId {
    let id = ident_at(graph, name, start + kind.as_str().len() + 1);
    let declarator = graph
        .add_node_with_span(Node::VariableDeclarator { id, init: Some(init) }, start + 4, end - 1)
        .unwrap();
    graph
        .add_node_with_span(
            Node::VariableDeclaration {
                kind,
                declarations: vec![declarator],
            },
            start,
            end,
        )
        .unwrap()
}

#[test]
fn test_literals() {
    let mut graph = Graph::new();
    let n = literal(&mut graph, Literal::Number(4.0));
    let s = literal(&mut graph, Literal::String("a".to_string()));
    let scopes = program(&mut graph, vec![], &[n, s]);

    let result = evaluate(&graph, &scopes, n, EvaluateOptions::default());
    assert!(result.confident);
    assert_eq!(result.value, Some(Value::Number(4.0)));
    assert_eq!(
        evaluate(&graph, &scopes, s, EvaluateOptions::default()).value,
        Some(Value::String("a".to_string()))
    );
}

#[test]
fn test_void_is_always_undefined() {
    let mut graph = Graph::new();
    let callee = ident_at(&mut graph, "f", 5);
    let call = graph
        .add_node(Node::Call {
            callee,
            arguments: vec![],
        })
        .unwrap();
    let void = graph
        .add_node(Node::Unary {
            operator: UnaryOperator::Void,
            argument: call,
        })
        .unwrap();
    let scopes = program(&mut graph, vec![], &[void]);

    assert!(evaluate(&graph, &scopes, void, EvaluateOptions::default()).is_undefined());
    assert!(!evaluate(&graph, &scopes, call, EvaluateOptions::default()).confident);
}

#[test]
fn test_global_undefined() {
    let mut graph = Graph::new();
    let undefined = ident_at(&mut graph, "undefined", 0);
    let nan = ident_at(&mut graph, "NaN", 11);
    let other = ident_at(&mut graph, "window", 16);
    let scopes = program(&mut graph, vec![], &[undefined, nan, other]);

    assert!(evaluate(&graph, &scopes, undefined, EvaluateOptions::default()).is_undefined());
    let nan_value = evaluate(&graph, &scopes, nan, EvaluateOptions::default());
    assert!(matches!(nan_value.value, Some(Value::Number(n)) if n.is_nan()));
    let deopt = evaluate(&graph, &scopes, other, EvaluateOptions::default());
    assert!(!deopt.confident);
    assert_eq!(deopt.deopt, Some(other));
}

#[test]
fn test_logical_short_circuit() {
    let mut graph = Graph::new();
    let falsy = literal(&mut graph, Literal::Boolean(false));
    let unknown = ident_at(&mut graph, "g", 9);
    let and = graph
        .add_node(Node::Logical {
            operator: LogicalOperator::And,
            left: falsy,
            right: unknown,
        })
        .unwrap();
    let scopes = program(&mut graph, vec![], &[and]);

    let result = evaluate(&graph, &scopes, and, EvaluateOptions::default());
    assert!(result.confident);
    assert_eq!(result.value, Some(Value::Boolean(false)));
}

#[test]
fn test_binary_arithmetic_and_concat() {
    let mut graph = Graph::new();
    let one = literal(&mut graph, Literal::Number(1.0));
    let two = literal(&mut graph, Literal::Number(2.0));
    let sum = graph
        .add_node(Node::Binary {
            operator: BinaryOperator::Add,
            left: one,
            right: two,
        })
        .unwrap();
    let text = literal(&mut graph, Literal::String("n".to_string()));
    let three = literal(&mut graph, Literal::Number(3.0));
    let concat = graph
        .add_node(Node::Binary {
            operator: BinaryOperator::Add,
            left: text,
            right: three,
        })
        .unwrap();
    let scopes = program(&mut graph, vec![], &[sum, concat]);

    assert_eq!(
        evaluate(&graph, &scopes, sum, EvaluateOptions::default()).value,
        Some(Value::Number(3.0))
    );
    assert_eq!(
        evaluate(&graph, &scopes, concat, EvaluateOptions::default()).value,
        Some(Value::String("n3".to_string()))
    );
}

#[test]
fn test_constant_binding_after_declaration() {
    // const a = void 0; a;
    let mut graph = Graph::new();
    let zero = literal(&mut graph, Literal::Number(0.0));
    let void = graph
        .add_node(Node::Unary {
            operator: UnaryOperator::Void,
            argument: zero,
        })
        .unwrap();
    let decl = declare(&mut graph, DeclarationKind::Const, "a", void, 0, 17);
    let read = ident_at(&mut graph, "a", 18);
    let scopes = program(&mut graph, vec![decl], &[read]);

    assert!(evaluate(&graph, &scopes, read, EvaluateOptions::default()).is_undefined());
    assert!(evaluate(&graph, &scopes, read, EvaluateOptions { tdz: true }).is_undefined());
}

#[test]
fn test_read_before_declaration() {
    // a; var a = 1;
    let mut graph = Graph::new();
    let read = ident_at(&mut graph, "a", 0);
    let one = literal(&mut graph, Literal::Number(1.0));
    let decl = declare(&mut graph, DeclarationKind::Var, "a", one, 3, 13);
    let stmt = graph
        .add_node(Node::ExpressionStatement { expression: read })
        .unwrap();
    let scopes = program(&mut graph, vec![stmt, decl], &[]);

    // Without TDZ awareness the read is simply not provable
    assert!(!evaluate(&graph, &scopes, read, EvaluateOptions::default()).confident);
    // A hoisted var read before its declaration holds undefined
    assert!(evaluate(&graph, &scopes, read, EvaluateOptions { tdz: true }).is_undefined());
}

#[test]
fn test_read_before_declaration_in_loop() {
    // while (c) { a; var a = 1; }
    let mut graph = Graph::new();
    let test = ident_at(&mut graph, "c", 7);
    let read = ident_at(&mut graph, "a", 12);
    let stmt = graph
        .add_node_with_span(Node::ExpressionStatement { expression: read }, 12, 14)
        .unwrap();
    let one = literal(&mut graph, Literal::Number(1.0));
    let decl = declare(&mut graph, DeclarationKind::Var, "a", one, 15, 25);
    let block = graph
        .add_node_with_span(Node::Block { body: vec![stmt, decl] }, 10, 27)
        .unwrap();
    let loop_node = graph
        .add_node_with_span(Node::While { test, body: block }, 0, 27)
        .unwrap();
    let scopes = program(&mut graph, vec![loop_node], &[]);

    // The second iteration sees the first iteration's value
    let result = evaluate(&graph, &scopes, read, EvaluateOptions { tdz: true });
    assert!(!result.confident);
    assert_eq!(result.deopt, Some(read));
}

#[test]
fn test_let_read_in_tdz_deopts() {
    // a; let a = 1;
    let mut graph = Graph::new();
    let read = ident_at(&mut graph, "a", 0);
    let one = literal(&mut graph, Literal::Number(1.0));
    let decl = declare(&mut graph, DeclarationKind::Let, "a", one, 3, 13);
    let stmt = graph
        .add_node(Node::ExpressionStatement { expression: read })
        .unwrap();
    let scopes = program(&mut graph, vec![stmt, decl], &[]);

    assert!(!evaluate(&graph, &scopes, read, EvaluateOptions { tdz: true }).confident);
}

#[test]
fn test_reassigned_binding_deopts() {
    // var a = 1; a = 2; a;
    let mut graph = Graph::new();
    let one = literal(&mut graph, Literal::Number(1.0));
    let decl = declare(&mut graph, DeclarationKind::Var, "a", one, 0, 10);
    let target = ident_at(&mut graph, "a", 11);
    let two = literal(&mut graph, Literal::Number(2.0));
    let assign = graph
        .add_node(Node::Assignment {
            operator: crate::ast::AssignmentOperator::Assign,
            target,
            value: two,
        })
        .unwrap();
    let read = ident_at(&mut graph, "a", 18);
    let scopes = program(&mut graph, vec![decl], &[assign, read]);

    let result = evaluate(&graph, &scopes, read, EvaluateOptions::default());
    assert!(!result.confident);
    assert_eq!(result.deopt, Some(graph.children(decl)[0]));
}
