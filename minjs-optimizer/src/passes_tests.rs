#[cfg(test)]
mod tests {
    use crate::passes::remove_undefined::{RemoveUndefinedOptions, RemoveUndefinedPass};
    use crate::passes::*;
    use minjs_core::ast::{Graph, Node};
    use minjs_core::printer::print;
    use minjs_parser::parse;
    use pretty_assertions::assert_eq;

    // ===== Helper Functions =====

    fn optimize_with(source: &str, options: RemoveUndefinedOptions) -> String {
        let graph = parse(source).unwrap();
        let mut pass = RemoveUndefinedPass::new(options);
        let optimized = pass.run(&graph).unwrap();
        print(&optimized).unwrap()
    }

    fn optimize(source: &str) -> String {
        optimize_with(source, RemoveUndefinedOptions::default())
    }

    // ===== Sequence Tests =====

    #[test]
    fn test_sequence_drops_inner_undefined() {
        assert_eq!(optimize("a, void 0, b;"), "a, b;");
        assert_eq!(optimize("a, undefined, void 0, b, c;"), "a, b, c;");
    }

    #[test]
    fn test_sequence_result_used() {
        assert_eq!(optimize("x = (a, void 0);"), "x = (a, void 0);");
        assert_eq!(optimize("x = (void 0, a, undefined);"), "x = (a, undefined);");
        assert_eq!(optimize("f((a, void 0));"), "f((a, void 0));");
    }

    #[test]
    fn test_sequence_result_discarded() {
        assert_eq!(optimize("a, void 0;"), "a;");
        assert_eq!(optimize("x = (void 0, a);"), "x = a;");
    }

    #[test]
    fn test_emptied_sequence_removes_statement() {
        assert_eq!(optimize("a(); void 0, undefined; b();"), "a(); b();");
        assert_eq!(optimize("if (c) void 0, undefined;"), "if (c) ;");
    }

    #[test]
    fn test_sequence_keeps_receiver_sensitive_operands() {
        assert_eq!(optimize("(void 0, o.f)();"), "(void 0, o.f)();");
        assert_eq!(optimize("typeof (void 0, x);"), "typeof (void 0, x);");
        assert_eq!(optimize("(void 0, f)();"), "f();");
    }

    #[test]
    fn test_sequence_keeps_indirect_eval() {
        assert_eq!(optimize("(void 0, eval)(s);"), "(void 0, eval)(s);");
        assert_eq!(optimize("(void 0, evaluate)(s);"), "evaluate(s);");
    }

    #[test]
    fn test_sequence_respects_shadowing() {
        assert_eq!(
            optimize("function f(undefined) { a, undefined, b; }"),
            "function f(undefined) { a, undefined, b; }"
        );
    }

    // ===== Return Tests =====

    #[test]
    fn test_return_undefined() {
        assert_eq!(optimize("function f() { return undefined; }"), "function f() { return; }");
        assert_eq!(optimize("function f() { return void 0; }"), "function f() { return; }");
        assert_eq!(optimize("function f() { return 1; }"), "function f() { return 1; }");
        assert_eq!(optimize("function f() { return null; }"), "function f() { return null; }");
    }

    #[test]
    fn test_return_shadowed_undefined() {
        let source = "function f(undefined) { return undefined; }";
        assert_eq!(optimize(source), source);
    }

    #[test]
    fn test_return_sequence_split() {
        assert_eq!(
            optimize("function f() { return (g(), undefined); }"),
            "function f() { g(); return; }"
        );
        assert_eq!(
            optimize("function f() { return (g(), h(), void 0); }"),
            "function f() { g(), h(); return; }"
        );
        assert_eq!(
            optimize("function f() { return (void 0, g(), undefined); }"),
            "function f() { g(); return; }"
        );
        assert_eq!(
            optimize("function f() { return (void 0, undefined); }"),
            "function f() { return; }"
        );
    }

    #[test]
    fn test_return_sequence_outside_statement_list() {
        assert_eq!(
            optimize("function f() { if (c) return (g(), undefined); }"),
            "function f() { if (c) return g(), undefined; }"
        );
    }

    // ===== Declaration Tests =====

    #[test]
    fn test_let_and_const() {
        assert_eq!(optimize("let x = undefined;"), "let x;");
        assert_eq!(optimize("let a = 1, b = void 0;"), "let a = 1, b;");
        assert_eq!(optimize("const x = undefined;"), "const x = undefined;");
    }

    #[test]
    fn test_let_respects_shadowing() {
        let source = "function f(undefined) { let x = undefined; }";
        assert_eq!(optimize(source), source);
    }

    #[test]
    fn test_var_with_safe_binding() {
        assert_eq!(optimize("var x = undefined; x = 1;"), "var x; x = 1;");
    }

    #[test]
    fn test_var_with_early_write() {
        assert_eq!(optimize("x = 1; var x = undefined;"), "x = 1; var x = undefined;");
    }

    #[test]
    fn test_var_per_declarator() {
        assert_eq!(
            optimize("x = 1; var x = void 0, y = void 0;"),
            "x = 1; var x = void 0, y;"
        );
    }

    #[test]
    fn test_nested_candidates_reach_fixpoint() {
        assert_eq!(optimize("var y = (void 0, void 0);"), "var y;");
        assert_eq!(optimize("function f() { return (void 0, void 0); }"), "function f() { return; }");
    }

    #[test]
    fn test_tdz_option() {
        let source = "function f() { var y = a; var a = 1; }";
        assert_eq!(optimize(source), source);
        assert_eq!(
            optimize_with(source, RemoveUndefinedOptions { tdz: true }),
            "function f() { var y; var a = 1; }"
        );
    }

    // ===== Pass Behavior Tests =====

    #[test]
    fn test_synthetic_var_declaration_is_skipped() {
        let mut graph = parse("var x = undefined; let y = undefined;").unwrap();
        let var_declaration = graph
            .descendants(graph.root_id.unwrap())
            .into_iter()
            .find(|id| {
                matches!(
                    graph.get_node(*id),
                    Some(Node::VariableDeclaration { kind, .. }) if kind.as_str() == "var"
                )
            })
            .unwrap();
        graph.metadata.remove(&var_declaration);

        let mut pass = RemoveUndefinedPass::default();
        let optimized = pass.run(&graph).unwrap();
        assert_eq!(print(&optimized).unwrap(), "var x = undefined; let y;");
        assert_eq!(pass.counters().declarations_skipped, 1);
        assert_eq!(pass.counters().initializers_removed, 1);
    }

    #[test]
    fn test_input_graph_is_not_mutated() {
        let graph = parse("let x = undefined; a, void 0;").unwrap();
        let before = print(&graph).unwrap();
        let mut pass = RemoveUndefinedPass::default();
        pass.run(&graph).unwrap();
        assert_eq!(print(&graph).unwrap(), before);
    }

    #[test]
    fn test_counters_and_stats() {
        let graph = parse(
            "let a = undefined; x = 1; var x = void 0; b, void 0, c; function f() { return undefined; }",
        )
        .unwrap();
        let mut pass = RemoveUndefinedPass::default();
        let optimized = pass.run(&graph).unwrap();

        let counters = pass.counters();
        assert_eq!(counters.initializers_removed, 1);
        assert_eq!(counters.unsafe_violations, 1);
        assert_eq!(counters.sequence_elements_removed, 1);
        assert_eq!(counters.return_arguments_removed, 1);
        assert_eq!(counters.nodes_after, optimized.nodes.len());
        assert_eq!(
            pass.stats(),
            "Remove Undefined pass: 3 values removed, 1 initializers kept as unsafe"
        );
    }

    #[test]
    fn test_applicability() {
        let pass = RemoveUndefinedPass::default();
        assert!(!pass.is_applicable(&Graph::new()));
        assert!(pass.is_applicable(&parse("").unwrap()));

        let mut bare = Graph::new();
        let literal = bare.add_node(Node::Literal(minjs_core::ast::Literal::Null)).unwrap();
        bare.root_id = Some(literal);
        assert!(!pass.is_applicable(&bare));
        assert!(RemoveUndefinedPass::default().run(&bare).is_err());
    }

    #[test]
    fn test_duplicate_let_is_an_error() {
        let graph = parse("let a; let a = undefined;").unwrap();
        assert!(RemoveUndefinedPass::default().run(&graph).is_err());
    }

    #[test]
    fn test_graph_without_parent_links() {
        let graph = parse("a, void 0, b;").unwrap();
        let json = serde_json::to_string(&graph).unwrap();
        let restored: Graph = serde_json::from_str(&json).unwrap();

        let optimized = RemoveUndefinedPass::default().run(&restored).unwrap();
        assert_eq!(print(&optimized).unwrap(), "a, b;");
    }
}
