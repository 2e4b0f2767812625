use minjs_optimizer::{OptimizationConfig, OptimizationPipeline};
use pretty_assertions::assert_eq;
use tracing_subscriber::EnvFilter;

/// Pass decisions are logged at debug level; run with
/// `RUST_LOG=minjs_optimizer=trace` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn optimize(source: &str) -> String {
    init_tracing();
    let mut pipeline = OptimizationPipeline::default();
    pipeline.optimize_source(source).unwrap()
}

fn assert_unchanged(source: &str) {
    assert_eq!(optimize(source), source);
}

#[test]
fn test_let_initializer_removed() {
    assert_eq!(optimize("let x = undefined;"), "let x;");
    assert_eq!(optimize("{ let x = void 0; }"), "{ let x; }");
}

#[test]
fn test_var_reassigned_before_declaration() {
    assert_unchanged("x = 1; var x = undefined;");
    assert_eq!(optimize("var x = undefined; x = 1;"), "var x; x = 1;");
}

#[test]
fn test_var_reassigned_by_closure() {
    assert_eq!(
        optimize("var x = undefined; function f() { x = 1; } f();"),
        "var x; function f() { x = 1; } f();"
    );
    assert_unchanged("f(); var x = undefined; function f() { x = 1; }");
}

#[test]
fn test_var_in_loop_header() {
    assert_unchanged("for (var i = undefined; i < 3; i = i + 1) {}");
    assert_unchanged("while (c) { var x = undefined; x = 1; }");
}

#[test]
fn test_var_in_loop_reassigned_after_loop() {
    assert_eq!(
        optimize("while (c) { var x = undefined; } x = 1;"),
        "while (c) { var x; } x = 1;"
    );
}

#[test]
fn test_return_sequence_split() {
    assert_eq!(
        optimize("function f() { return (doSomething(), undefined); }"),
        "function f() { doSomething(); return; }"
    );
}

#[test]
fn test_shadowed_undefined_is_kept() {
    assert_unchanged("function f(undefined) { return undefined; }");
    assert_unchanged("function f(undefined) { let x = undefined; a, undefined, b; }");
    assert_unchanged("var undefined = 1; let x = undefined;");
}

#[test]
fn test_mutual_recursion() {
    assert_eq!(
        optimize("var x = undefined; function f() { x = 1; g(); } function g() { f(); } f();"),
        "var x; function f() { x = 1; g(); } function g() { f(); } f();"
    );
    assert_unchanged("g(); var x = undefined; function f() { x = 1; g(); } function g() { f(); }");
}

#[test]
fn test_nested_function_scope() {
    assert_eq!(
        optimize("function outer() { var y = void 0; y = 2; return y; }"),
        "function outer() { var y; y = 2; return y; }"
    );
    assert_unchanged("function outer(y) { var y = void 0; return y; }");
}

#[test]
fn test_loop_around_enclosing_function() {
    let output = optimize("while (c) { (function () { var x = undefined; x = 1; })(); }");
    assert!(output.contains("var x;"), "unexpected output: {output}");
}

#[test]
fn test_arrow_function_return() {
    assert_eq!(
        optimize("const g = () => { return void 0; };"),
        "const g = () => { return; };"
    );
}

#[test]
fn test_sequences() {
    assert_eq!(optimize("a, void 0, b;"), "a, b;");
    assert_eq!(optimize("a(); void 0, undefined; b();"), "a(); b();");
    assert_unchanged("x = (a, void 0);");
    assert_unchanged("(void 0, o.f)();");
}

#[test]
fn test_side_effects_are_kept() {
    assert_unchanged("let x = void f();");
    assert_unchanged("function f() { return void g(); }");
    assert_unchanged("let x = y;");
    assert_unchanged("const x = undefined;");
}

#[test]
fn test_tdz_config_from_json() {
    let source = "function f() { var y = a; var a = 1; }";
    assert_unchanged(source);

    let config = OptimizationConfig::from_json(r#"{"tdz": true}"#).unwrap();
    let mut pipeline = OptimizationPipeline::new(config);
    assert_eq!(
        pipeline.optimize_source(source).unwrap(),
        "function f() { var y; var a = 1; }"
    );
}

#[test]
fn test_tdz_read_inside_loop_is_kept() {
    let config = OptimizationConfig {
        tdz: true,
        ..OptimizationConfig::default()
    };
    let mut pipeline = OptimizationPipeline::new(config);
    let source = "function f() { while (c()) { var b = a; use(b); var a = 5; } }";
    assert_eq!(pipeline.optimize_source(source).unwrap(), source);
}

#[test]
fn test_pipeline_stats() {
    let mut pipeline = OptimizationPipeline::default();
    pipeline
        .optimize_source("let a = undefined; x = 1; var x = void 0; function f() { return (g(), void 0); }")
        .unwrap();

    let stats = pipeline.stats();
    assert_eq!(stats.initializers_removed, 1);
    assert_eq!(stats.returns_split, 1);
    assert_eq!(stats.sequence_elements_removed, 1);
    assert_eq!(stats.unsafe_violations, 1);
    assert_eq!(stats.iterations, 2);
    assert_eq!(stats.total_optimizations(), 3);
    assert!(stats.to_string().contains("Initializers removed: 1"));
}

#[test]
fn test_parse_error_is_reported() {
    let mut pipeline = OptimizationPipeline::default();
    assert!(pipeline.optimize_source("let = ;").is_err());
}
