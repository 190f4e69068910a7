// Tree builders shared by the rule tests.

use crate::ast::types::{self, PRINT_STREAM, SYSTEM, THROWABLE};
use crate::ast::{ClassDecl, Expr, FieldDecl, JavaType, MethodType, Modifiers};
use crate::framework::LoggingFramework;
use crate::logger_field::ClassScope;
use crate::tracer::TransformationContext;

pub fn logger(framework: LoggingFramework) -> Expr {
    Expr::ident("logger", JavaType::class(framework.logger_type()))
}

pub fn log_call(framework: LoggingFramework, method: &str, args: Vec<Expr>) -> Expr {
    Expr::call(
        logger(framework),
        method,
        args,
        MethodType::instance(framework.logger_type(), method),
    )
}

pub fn error() -> Expr {
    Expr::ident("e", JavaType::Class(types::exception()))
}

pub fn get_message(receiver: Expr) -> Expr {
    Expr::call(
        receiver,
        "getMessage",
        Vec::new(),
        MethodType::instance(THROWABLE, "getMessage").returning(JavaType::string()),
    )
}

pub fn print_stack_trace(receiver: Expr) -> Expr {
    Expr::call(
        receiver,
        "printStackTrace",
        Vec::new(),
        MethodType::instance(THROWABLE, "printStackTrace"),
    )
}

pub fn println(stream: &str, arg: Expr) -> Expr {
    let stream = Expr::field(Expr::type_ref(SYSTEM), stream, JavaType::class(PRINT_STREAM));
    Expr::call(stream, "println", vec![arg], MethodType::instance(PRINT_STREAM, "println"))
}

pub fn logger_field(framework: LoggingFramework) -> FieldDecl {
    FieldDecl {
        name: "logger".to_string(),
        ty: JavaType::class(framework.logger_type()),
        modifiers: Modifiers::private_static_final(),
        initializer: None,
    }
}

pub fn context() -> TransformationContext {
    TransformationContext::new().with_scope(ClassScope::of(&ClassDecl::new("com.example.Test")))
}

pub fn context_with_logger(framework: LoggingFramework) -> TransformationContext {
    let mut context = context();
    context.scope.fields.push(logger_field(framework));
    context
}
