use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use loglift_core::ast::types;
use loglift_core::ast::MethodType;
use loglift_core::message::{compile, flatten};
use loglift_core::{classify_call, emit_log_call, Expr, JavaType, LoggingFramework, SeverityPolicy};

/// `"part 0 " + v0 + " part 1 " + v1 + ...` with `operands` variables.
fn concatenation(operands: usize) -> Expr {
    let parts = (0..operands).flat_map(|i| {
        [
            Expr::string(format!("part {i} ")),
            Expr::ident(format!("v{i}"), JavaType::string()),
        ]
    });
    Expr::concat_all(parts).unwrap_or_else(|| Expr::string(""))
}

fn log_call(message: Expr) -> Expr {
    let logger = Expr::ident("logger", JavaType::class("org.apache.log4j.Logger"));
    let error = Expr::ident("e", JavaType::Class(types::exception()));
    Expr::call(
        logger,
        "error",
        vec![message, error],
        MethodType::instance("org.apache.log4j.Logger", "error"),
    )
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for operands in [1, 4, 16, 64] {
        let message = concatenation(operands);
        group.bench_with_input(BenchmarkId::from_parameter(operands), &message, |b, message| {
            b.iter(|| compile(&flatten(black_box(message))))
        });
    }
    group.finish();
}

fn bench_classify_and_emit(c: &mut Criterion) {
    let call = log_call(concatenation(8));
    let receiver = Expr::ident("logger", JavaType::class("org.slf4j.Logger"));
    let policy = SeverityPolicy::default();

    c.bench_function("classify_log4j_call", |b| b.iter(|| classify_call(black_box(&call))));

    let record = classify_call(&call).expect("log4j call classifies");
    for target in [LoggingFramework::Slf4j, LoggingFramework::Jul, LoggingFramework::Commons] {
        c.bench_function(&format!("emit_{}", target.name()), |b| {
            b.iter(|| emit_log_call(black_box(&record), target, &policy, receiver.clone()))
        });
    }
}

criterion_group!(benches, bench_compile, bench_classify_and_emit);
criterion_main!(benches);
