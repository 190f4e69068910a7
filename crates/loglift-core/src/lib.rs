//! # Loglift Core
//!
//! Log call normalization engine for Java sources, including:
//! - A typed source tree and its source rendering
//! - Message classification, flattening and template compilation
//! - Call-site recognition across SLF4J, Log4j 1/2, JUL and Commons Logging
//! - Rewrite rules and the fixed-point engine that applies them
//!
//! The tree comes from an external parser; this crate only inspects it and
//! replaces subtrees.

#![warn(clippy::all)]

pub mod ast;
pub mod callsite;
pub mod config;
pub mod emit;
pub mod error;
pub mod framework;
pub mod logger_field;
pub mod message;
pub mod tracer;

// Re-export commonly used types
pub use ast::{CompilationUnit, Expr, JavaType, Statement, ToSource};
pub use callsite::{classify_call, classify_factory, CallSiteRecord, CallSource};
pub use config::LogliftConfig;
pub use emit::{emit_log_call, Effects, Replacement};
pub use error::{LogliftError, Result};
pub use framework::{LoggingFramework, Severity, SeverityPolicy};
pub use message::{compile, CanonicalMessage, Segment};
pub use tracer::{RewriteEngine, RewriteRule, TransformationContext};

/// Loglift version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for loglift components
pub fn init_tracing() {
    init_tracing_with("loglift_core=info,loglift_cli=info");
}

/// Initialize tracing with explicit default directives, e.g.
/// `loglift_core=debug,loglift_cli=info`.
pub fn init_tracing_with(directives: &str) {
    let filter = directives
        .split(',')
        .filter_map(|directive| directive.trim().parse().ok())
        .fold(tracing_subscriber::EnvFilter::from_default_env(), |filter, directive| {
            filter.add_directive(directive)
        });
    // A subscriber may already be installed by the embedding program.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
