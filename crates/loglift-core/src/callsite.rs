/*!
# Call-Site Classification

Recognizes logging calls, stack-trace prints, console writes and logger
factory calls, and records what a rewrite needs to know about them.
Anything that cannot be recognized with confidence is a miss (`None`).
*/

use crate::ast::types::{CLASS, SYSTEM};
use crate::ast::{Expr, MethodType};
use crate::framework::{lookup_signature, LoggingFramework, Severity, Signature, SignatureKind};
use crate::message::classify::is_throwable;
use crate::message::template::extract_message;
use crate::message::{CanonicalMessage, CompileOptions, TemplateStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Out,
    Err,
}

/// Where a recognized call comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallSource {
    Framework(LoggingFramework),
    StackTrace,
    Console(ConsoleStream),
}

impl CallSource {
    pub fn framework(&self) -> Option<LoggingFramework> {
        match self {
            CallSource::Framework(framework) => Some(*framework),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallSiteRecord {
    /// Logger expression for framework calls, the throwable for stack-trace
    /// prints, the stream for console writes.
    pub receiver: Option<Expr>,
    pub source: CallSource,
    pub severity: Severity,
    pub message: CanonicalMessage,
    pub is_already_canonical: bool,
    pub marker: Option<Expr>,
    pub method_type: Option<MethodType>,
    /// Severity was given as a `Level` argument instead of by method name.
    pub level_argument: bool,
}

#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    /// Severity assigned to `System.out` writes.
    pub console_severity: Severity,
    pub compile: CompileOptions,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            console_severity: Severity::Info,
            compile: CompileOptions::default(),
        }
    }
}

pub fn classify_call(expr: &Expr) -> Option<CallSiteRecord> {
    classify_call_with(expr, &ClassifyOptions::default())
}

pub fn classify_call_with(expr: &Expr, options: &ClassifyOptions) -> Option<CallSiteRecord> {
    let Expr::MethodCall { select, name, args, method_type } = expr else {
        return None;
    };
    let method_type = method_type.as_ref()?;
    let select = select.as_deref();
    let signature = resolve_signature(select, name, method_type)?;

    match signature.kind {
        SignatureKind::Leveled(severity) => {
            let framework = signature.framework?;
            framework_call(framework, severity, false, select?, args, method_type, options)
        }
        SignatureKind::LevelArgument => {
            let framework = signature.framework?;
            let (level, rest) = args.split_first()?;
            let severity = level_constant(level, framework)?;
            framework_call(framework, severity, true, select?, rest, method_type, options)
        }
        SignatureKind::StackTrace => stack_trace(select?, args, method_type),
        SignatureKind::Console => console(select?, args, method_type, options),
        SignatureKind::Factory | SignatureKind::EnabledCheck(_) | SignatureKind::LevelCheck => None,
    }
}

/// Registry signature of an invocation, if it is one we know.
pub fn call_signature(expr: &Expr) -> Option<Signature> {
    let Expr::MethodCall { select, name, method_type, .. } = expr else {
        return None;
    };
    resolve_signature(select.as_deref(), name, method_type.as_ref()?)
}

/// Find the signature by declaring type, falling back to the receiver's
/// ancestors for overrides and subtypes.
fn resolve_signature(select: Option<&Expr>, name: &str, method_type: &MethodType) -> Option<Signature> {
    if let Some(signature) = lookup_signature(&method_type.declaring_type, name) {
        return Some(signature);
    }
    let receiver_type = select?.static_type()?;
    let class = receiver_type.as_class()?;
    class.ancestry().find_map(|ty| lookup_signature(&ty.fqn, name))
}

fn framework_call(
    framework: LoggingFramework,
    severity: Severity,
    level_argument: bool,
    receiver: &Expr,
    args: &[Expr],
    method_type: &MethodType,
    options: &ClassifyOptions,
) -> Option<CallSiteRecord> {
    receiver.static_type()?;

    let (marker, rest) = split_marker(framework, args);
    let (message, trailing) = rest.split_first()?;
    let extracted = extract_message(message, trailing, framework.template_style(), &options.compile)?;

    Some(CallSiteRecord {
        receiver: Some(receiver.clone()),
        source: CallSource::Framework(framework),
        severity,
        message: extracted.message,
        is_already_canonical: extracted.is_already_canonical,
        marker,
        method_type: Some(method_type.clone()),
        level_argument,
    })
}

fn split_marker(framework: LoggingFramework, args: &[Expr]) -> (Option<Expr>, &[Expr]) {
    let Some(marker_type) = framework.marker_type() else {
        return (None, args);
    };
    match args.split_first() {
        Some((first, rest)) if first.static_type().is_some_and(|ty| ty.is_assignable_to(marker_type)) => {
            (Some(first.clone()), rest)
        }
        _ => (None, args),
    }
}

/// Severity named by a `Level.X` argument.
fn level_constant(level: &Expr, framework: LoggingFramework) -> Option<Severity> {
    let level_type = framework.level_type()?;
    match level.unparenthesized() {
        Expr::FieldAccess { target, name, ty } => {
            let target_is_level = matches!(target.as_ref(), Expr::TypeRef { fqn } if fqn == level_type);
            let typed_level = ty.as_ref().is_some_and(|ty| ty.type_name() == level_type);
            if target_is_level || typed_level {
                framework.severity_of_level(name)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn stack_trace(receiver: &Expr, args: &[Expr], method_type: &MethodType) -> Option<CallSiteRecord> {
    // printStackTrace(PrintStream) writes elsewhere.
    if !args.is_empty() {
        return None;
    }
    let ty = receiver.static_type()?;
    if !is_throwable(&ty) {
        return None;
    }
    Some(CallSiteRecord {
        receiver: Some(receiver.clone()),
        source: CallSource::StackTrace,
        severity: Severity::Error,
        message: CanonicalMessage::new("Exception", Vec::new()).with_error(receiver.clone()),
        is_already_canonical: false,
        marker: None,
        method_type: Some(method_type.clone()),
        level_argument: false,
    })
}

/// `System.out` or `System.err`
pub fn console_stream(expr: &Expr) -> Option<ConsoleStream> {
    match expr.unparenthesized() {
        Expr::FieldAccess { target, name, .. } => match target.as_ref() {
            Expr::TypeRef { fqn } if fqn == SYSTEM => match name.as_str() {
                "out" => Some(ConsoleStream::Out),
                "err" => Some(ConsoleStream::Err),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}

fn console(
    receiver: &Expr,
    args: &[Expr],
    method_type: &MethodType,
    options: &ClassifyOptions,
) -> Option<CallSiteRecord> {
    let stream = console_stream(receiver)?;
    let [arg] = args else {
        return None;
    };
    // print(char[]) writes the characters, not the array.
    let ty = arg.static_type()?;
    if matches!(ty, crate::ast::JavaType::Array(_)) {
        return None;
    }

    let extracted = extract_message(arg, &[], TemplateStyle::Anonymous, &options.compile)?;
    let severity = match stream {
        ConsoleStream::Out => options.console_severity,
        ConsoleStream::Err => Severity::Error,
    };
    Some(CallSiteRecord {
        receiver: Some(receiver.clone()),
        source: CallSource::Console(stream),
        severity,
        message: extracted.message,
        is_already_canonical: false,
        marker: None,
        method_type: Some(method_type.clone()),
        level_argument: false,
    })
}

/// `logger.isDebugEnabled()` or `logger.isLoggable(Level.FINE)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelCheck {
    pub framework: LoggingFramework,
    pub severity: Severity,
    pub receiver: Expr,
    /// Severity was given as a `Level` argument.
    pub level_argument: bool,
}

pub fn classify_level_check(expr: &Expr) -> Option<LevelCheck> {
    let Expr::MethodCall { select, name, args, method_type } = expr else {
        return None;
    };
    let receiver = select.as_deref()?;
    receiver.static_type()?;
    let signature = resolve_signature(Some(receiver), name, method_type.as_ref()?)?;
    let framework = signature.framework?;
    let (severity, level_argument) = match (signature.kind, args.as_slice()) {
        (SignatureKind::EnabledCheck(severity), []) => (severity, false),
        (SignatureKind::LevelCheck, [level]) => (level_constant(level, framework)?, true),
        _ => return None,
    };
    Some(LevelCheck {
        framework,
        severity,
        receiver: receiver.clone(),
        level_argument,
    })
}

/// How a logger factory call names its logger.
#[derive(Debug, Clone, PartialEq)]
pub enum FactoryKey {
    /// `Foo.class`
    Class(String),
    /// `Foo.class.getName()` or `Foo.class.getCanonicalName()`
    ClassName(String),
    /// Any other `Class`-typed expression, e.g. `getClass()`.
    ClassExpr(Expr),
    /// A logger name string.
    Name(Expr),
    /// No argument; the calling class is used.
    Caller,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactoryCall {
    pub framework: LoggingFramework,
    pub key: FactoryKey,
    pub method_type: MethodType,
}

pub fn classify_factory(expr: &Expr) -> Option<FactoryCall> {
    let Expr::MethodCall { select, name, args, method_type } = expr else {
        return None;
    };
    let method_type = method_type.as_ref()?;
    let signature = resolve_signature(select.as_deref(), name, method_type)?;
    if signature.kind != SignatureKind::Factory {
        return None;
    }
    let framework = signature.framework?;

    let key = match args.as_slice() {
        [] => FactoryKey::Caller,
        [key] => factory_key(key)?,
        _ => return None,
    };
    Some(FactoryCall {
        framework,
        key,
        method_type: method_type.clone(),
    })
}

fn factory_key(expr: &Expr) -> Option<FactoryKey> {
    match expr.unparenthesized() {
        Expr::ClassLiteral { fqn } => Some(FactoryKey::Class(fqn.clone())),
        Expr::MethodCall { select: Some(select), name, args, .. }
            if args.is_empty() && (name == "getName" || name == "getCanonicalName") =>
        {
            match select.unparenthesized() {
                Expr::ClassLiteral { fqn } => Some(FactoryKey::ClassName(fqn.clone())),
                _ => string_or_class_key(expr),
            }
        }
        _ => string_or_class_key(expr),
    }
}

fn string_or_class_key(expr: &Expr) -> Option<FactoryKey> {
    let ty = expr.static_type()?;
    if ty.is_string() {
        Some(FactoryKey::Name(expr.clone()))
    } else if ty.type_name() == CLASS {
        Some(FactoryKey::ClassExpr(expr.clone()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{self, THROWABLE};
    use crate::ast::JavaType;

    fn slf4j_logger() -> Expr {
        Expr::ident("logger", JavaType::class("org.slf4j.Logger"))
    }

    fn slf4j_call(method: &str, args: Vec<Expr>) -> Expr {
        Expr::call(slf4j_logger(), method, args, MethodType::instance("org.slf4j.Logger", method))
    }

    #[test]
    fn test_classify_concatenated_slf4j_call() {
        let name = Expr::ident("name", JavaType::string());
        let call = slf4j_call("info", vec![Expr::concat(Expr::string("Hello "), name.clone())]);
        let record = classify_call(&call).unwrap();
        assert_eq!(record.source, CallSource::Framework(LoggingFramework::Slf4j));
        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.message.template, "Hello {}");
        assert_eq!(record.message.arguments, vec![name]);
        assert!(!record.is_already_canonical);
    }

    #[test]
    fn test_marker_is_kept_aside() {
        let marker = Expr::ident("AUDIT", JavaType::class("org.slf4j.Marker"));
        let call = slf4j_call("warn", vec![marker.clone(), Expr::string("done")]);
        let record = classify_call(&call).unwrap();
        assert_eq!(record.marker, Some(marker));
        assert!(record.is_already_canonical);
    }

    #[test]
    fn test_untyped_receiver_is_a_miss() {
        let call = Expr::call(
            Expr::untyped_ident("logger"),
            "info",
            vec![Expr::string("x")],
            MethodType::instance("org.slf4j.Logger", "info"),
        );
        assert!(classify_call(&call).is_none());
    }

    #[test]
    fn test_stack_trace_on_subclass() {
        let e = Expr::ident("e", types::unchecked_exception("java.lang.IllegalStateException"));
        let call = Expr::call(
            e.clone(),
            "printStackTrace",
            Vec::new(),
            MethodType::instance("java.lang.IllegalStateException", "printStackTrace"),
        );
        let record = classify_call(&call).unwrap();
        assert_eq!(record.source, CallSource::StackTrace);
        assert_eq!(record.message.template, "Exception");
        assert_eq!(record.message.trailing_error, Some(e));
    }

    #[test]
    fn test_console_err_is_error() {
        let err = Expr::field(Expr::type_ref(SYSTEM), "err", JavaType::class(types::PRINT_STREAM));
        let call = Expr::call(
            err,
            "println",
            vec![Expr::string("boom")],
            MethodType::instance(types::PRINT_STREAM, "println"),
        );
        let record = classify_call(&call).unwrap();
        assert_eq!(record.source, CallSource::Console(ConsoleStream::Err));
        assert_eq!(record.severity, Severity::Error);
    }

    #[test]
    fn test_jul_level_argument() {
        let logger = Expr::ident("log", JavaType::class("java.util.logging.Logger"));
        let level = Expr::field(
            Expr::type_ref("java.util.logging.Level"),
            "WARNING",
            JavaType::class("java.util.logging.Level"),
        );
        let call = Expr::call(
            logger,
            "log",
            vec![level, Expr::string("careful")],
            MethodType::instance("java.util.logging.Logger", "log"),
        );
        let record = classify_call(&call).unwrap();
        assert_eq!(record.severity, Severity::Warn);
        assert!(record.level_argument);
    }

    #[test]
    fn test_level_checks() {
        let check = slf4j_call("isDebugEnabled", Vec::new());
        let level_check = classify_level_check(&check).unwrap();
        assert_eq!(level_check.severity, Severity::Debug);
        assert!(!level_check.level_argument);
        assert!(classify_call(&check).is_none());

        let logger = Expr::ident("log", JavaType::class("java.util.logging.Logger"));
        let level = Expr::field(
            Expr::type_ref("java.util.logging.Level"),
            "FINEST",
            JavaType::class("java.util.logging.Level"),
        );
        let call = Expr::call(
            logger,
            "isLoggable",
            vec![level],
            MethodType::instance("java.util.logging.Logger", "isLoggable"),
        );
        let level_check = classify_level_check(&call).unwrap();
        assert_eq!(level_check.framework, LoggingFramework::Jul);
        assert_eq!(level_check.severity, Severity::Trace);
        assert!(level_check.level_argument);

        // A level held in a variable names no tier.
        let logger = Expr::ident("log", JavaType::class("java.util.logging.Logger"));
        let call = Expr::call(
            logger,
            "isLoggable",
            vec![Expr::ident("level", JavaType::class("java.util.logging.Level"))],
            MethodType::instance("java.util.logging.Logger", "isLoggable"),
        );
        assert!(classify_level_check(&call).is_none());
    }

    #[test]
    fn test_classify_factory_keys() {
        let class_name = Expr::call(
            Expr::class_literal("com.example.Test"),
            "getName",
            Vec::new(),
            MethodType::instance(CLASS, "getName").returning(JavaType::string()),
        );
        let call = Expr::static_call(
            "java.util.logging.Logger",
            "getLogger",
            vec![class_name],
            JavaType::class("java.util.logging.Logger"),
        );
        let factory = classify_factory(&call).unwrap();
        assert_eq!(factory.framework, LoggingFramework::Jul);
        assert_eq!(factory.key, FactoryKey::ClassName("com.example.Test".to_string()));

        let not_factory = Expr::call(
            Expr::ident("e", JavaType::Class(types::exception())),
            "printStackTrace",
            Vec::new(),
            MethodType::instance(THROWABLE, "printStackTrace"),
        );
        assert!(classify_factory(&not_factory).is_none());
    }
}
