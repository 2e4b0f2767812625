use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use minjs_optimizer::{OptimizationPass, OptimizationPipeline, RemoveUndefinedPass};
use minjs_parser::parse;

fn create_test_programs() -> Vec<(&'static str, String)> {
    vec![
        ("let", "let a = undefined, b = void 0; let c = 1;".to_string()),
        ("sequence", "a(), void 0, b(), undefined, c();".to_string()),
        (
            "return_split",
            "function f() { return (g(), h(), void 0); } function k() { return undefined; }"
                .to_string(),
        ),
        (
            "closures",
            r#"
            g();
            var x = undefined;
            function f() { x = 1; g(); }
            function g() { f(); }
            "#
            .to_string(),
        ),
        ("many_vars", many_vars(200)),
    ]
}

/// `count` var declarations, each reassigned by a closure called later
fn many_vars(count: usize) -> String {
    (0..count)
        .map(|i| format!("var v{i} = void 0; function set{i}() {{ v{i} = {i}; }} set{i}();"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn benchmark_remove_undefined(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_undefined");

    for (name, program) in create_test_programs() {
        let graph = parse(&program).expect("Failed to parse program");

        group.bench_with_input(BenchmarkId::new("pass", name), &graph, |b, graph| {
            b.iter(|| {
                let mut pass = RemoveUndefinedPass::default();
                black_box(pass.run(graph).expect("pass failed"))
            });
        });

        group.bench_with_input(BenchmarkId::new("pipeline", name), &graph, |b, graph| {
            b.iter(|| {
                let mut pipeline = OptimizationPipeline::default();
                black_box(pipeline.optimize(graph).expect("pipeline failed"))
            });
        });
    }

    group.finish();
}

fn benchmark_parse_and_print(c: &mut Criterion) {
    let source = many_vars(200);
    c.bench_function("optimize_source", |b| {
        b.iter(|| {
            let mut pipeline = OptimizationPipeline::default();
            black_box(pipeline.optimize_source(black_box(&source)).expect("optimize failed"))
        });
    });
}

criterion_group!(benches, benchmark_remove_undefined, benchmark_parse_and_print);
criterion_main!(benches);
