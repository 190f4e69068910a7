/*!
# Call Emission

Builds replacement calls for a target framework from a classified call site.
Pure: nothing here touches the tree being rewritten.
*/

use crate::ast::types::CLASS;
use crate::ast::{Expr, JavaType, MethodType};
use crate::ast::types::Primitive;
use crate::callsite::{CallSiteRecord, FactoryKey};
use crate::framework::{LoggingFramework, Severity, SeverityPolicy};
use crate::logger_field::LoggerFieldSpec;
use crate::message::template::{anonymous_to_indexed, to_concatenation};
use crate::message::{CanonicalMessage, TemplateStyle};

/// Side effects a replacement needs applied to the enclosing unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
    pub add_imports: Vec<String>,
    /// Removed only if the type is no longer referenced anywhere.
    pub remove_imports: Vec<String>,
    pub add_field: Option<LoggerFieldSpec>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_import(mut self, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        if !self.add_imports.contains(&type_name) {
            self.add_imports.push(type_name);
        }
        self
    }

    pub fn remove_import(mut self, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        if !self.remove_imports.contains(&type_name) {
            self.remove_imports.push(type_name);
        }
        self
    }

    pub fn with_field(mut self, spec: LoggerFieldSpec) -> Self {
        for import in spec.imports() {
            self = self.add_import(import);
        }
        self.add_field = Some(spec);
        self
    }

    pub fn merge(&mut self, other: Effects) {
        for import in other.add_imports {
            if !self.add_imports.contains(&import) {
                self.add_imports.push(import);
            }
        }
        for import in other.remove_imports {
            if !self.remove_imports.contains(&import) {
                self.remove_imports.push(import);
            }
        }
        if other.add_field.is_some() {
            self.add_field = other.add_field;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.add_imports.is_empty() && self.remove_imports.is_empty() && self.add_field.is_none()
    }
}

/// A new subtree plus what the unit needs to stay consistent with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    pub expr: Expr,
    pub effects: Effects,
}

impl Replacement {
    pub fn new(expr: Expr) -> Self {
        Self {
            expr,
            effects: Effects::default(),
        }
    }

    pub fn with_effects(mut self, effects: Effects) -> Self {
        self.effects.merge(effects);
        self
    }
}

/// Emit `receiver.<level>(..)` for `target`.
pub fn emit_log_call(
    record: &CallSiteRecord,
    target: LoggingFramework,
    policy: &SeverityPolicy,
    receiver: Expr,
) -> Replacement {
    let severity = policy.resolve(record.severity, target);
    let message = &record.message;
    match target.template_style() {
        TemplateStyle::Anonymous => {
            let mut args = Vec::new();
            if let Some(marker) = &record.marker {
                args.push(marker.clone());
            }
            args.extend(template_args(message));
            if let Some(error) = &message.trailing_error {
                args.push(error.clone());
            }
            Replacement::new(leveled_call(receiver, target, severity, args))
        }
        TemplateStyle::Concatenation => {
            let mut args = vec![to_concatenation(message)];
            if let Some(error) = &message.trailing_error {
                args.push(error.clone());
            }
            Replacement::new(leveled_call(receiver, target, severity, args))
        }
        TemplateStyle::Indexed => emit_jul(message, target, severity, receiver),
    }
}

/// Message plus placeholder arguments in anonymous-template form.
fn template_args(message: &CanonicalMessage) -> Vec<Expr> {
    if let Some(single) = single_string(message) {
        return vec![single.clone()];
    }
    if message.arguments.is_empty() {
        return vec![verbatim(message)];
    }
    let mut args = vec![Expr::string(message.template.clone())];
    match message.arguments.as_slice() {
        // A lone array would be spread over the varargs parameter.
        [argument] if message.trailing_error.is_none() && is_array(argument) => {
            args.push(Expr::object_array(vec![argument.clone()]));
        }
        arguments => args.extend(arguments.iter().cloned()),
    }
    args
}

fn is_array(expr: &Expr) -> bool {
    matches!(expr.static_type(), Some(JavaType::Array(_)))
}

/// A `"{}"` message around one String is just that String.
fn single_string(message: &CanonicalMessage) -> Option<&Expr> {
    message
        .as_single_expr()
        .filter(|expr| expr.static_type().is_some_and(|ty| ty.is_string()))
}

/// Message without arguments is never formatted, so escapes come off.
fn verbatim(message: &CanonicalMessage) -> Expr {
    Expr::string(message.pieces().concat())
}

fn leveled_call(receiver: Expr, target: LoggingFramework, severity: Severity, args: Vec<Expr>) -> Expr {
    let method = target.method_for(severity);
    Expr::call(receiver, method, args, MethodType::instance(target.logger_type(), method))
}

fn emit_jul(message: &CanonicalMessage, target: LoggingFramework, severity: Severity, receiver: Expr) -> Replacement {
    let plain = message.trailing_error.is_none() && (message.arguments.is_empty() || single_string(message).is_some());
    if plain {
        let arg = single_string(message).cloned().unwrap_or_else(|| verbatim(message));
        return Replacement::new(leveled_call(receiver, target, severity, vec![arg]));
    }

    let level_type = target.level_type().unwrap_or("java.util.logging.Level");
    let constant = target.level_constant(severity).unwrap_or("SEVERE");
    let mut args = vec![Expr::field(Expr::type_ref(level_type), constant, JavaType::class(level_type))];

    match (single_string(message), &message.trailing_error) {
        (Some(single), Some(error)) => {
            args.push(single.clone());
            args.push(error.clone());
        }
        (_, Some(error)) if message.arguments.is_empty() => {
            args.push(verbatim(message));
            args.push(error.clone());
        }
        // Only log(Level, String, Throwable) records the stack trace, and it
        // takes no parameters.
        (_, Some(error)) => {
            let text = to_concatenation(message);
            if text.static_type().is_some_and(|ty| ty.is_string()) {
                args.push(text);
            } else {
                args.push(Expr::concat(Expr::string(""), text));
            }
            args.push(error.clone());
        }
        (_, None) => {
            let params = &message.arguments;
            args.push(Expr::string(anonymous_to_indexed(message)));
            // A lone Throwable would select the Throwable overload, a lone array
            // would be taken as the parameter array itself.
            let lone_plain_param = params.len() == 1
                && !params[0].static_type().is_some_and(|ty| ty.is_throwable())
                && !is_array(&params[0]);
            if lone_plain_param {
                args.extend(params.iter().cloned());
            } else {
                args.push(Expr::object_array(params.clone()));
            }
        }
    }

    let call = Expr::call(receiver, "log", args, MethodType::instance(target.logger_type(), "log"));
    Replacement::new(call).with_effects(Effects::new().add_import(level_type))
}

/// Enablement check for `severity` on `target`: `isDebugEnabled()` where the
/// target has one, otherwise its `Level`-argument check.
pub fn emit_level_check(
    severity: Severity,
    target: LoggingFramework,
    policy: &SeverityPolicy,
    receiver: Expr,
) -> Option<Replacement> {
    let severity = policy.resolve(severity, target);
    let boolean = JavaType::Primitive(Primitive::Boolean);
    if let Some(method) = target.enabled_method(severity) {
        let method_type = MethodType::instance(target.logger_type(), method).returning(boolean);
        return Some(Replacement::new(Expr::call(receiver, method, Vec::new(), method_type)));
    }

    let method = target.level_check_method()?;
    let level_type = target.level_type()?;
    let level = Expr::field(
        Expr::type_ref(level_type),
        target.level_constant(severity)?,
        JavaType::class(level_type),
    );
    let method_type = MethodType::instance(target.logger_type(), method).returning(boolean);
    let call = Expr::call(receiver, method, vec![level], method_type);
    Some(Replacement::new(call).with_effects(Effects::new().add_import(level_type)))
}

/// Idiomatic logger accessor for `target`, keeping the original key.
/// `owner` names the class a keyless accessor resolves to.
pub fn factory_call(target: LoggingFramework, key: &FactoryKey, owner: &str) -> Expr {
    let args = if target.keyed_by_name() {
        match key {
            FactoryKey::Class(fqn) | FactoryKey::ClassName(fqn) => vec![class_name(Expr::class_literal(fqn.clone()))],
            FactoryKey::ClassExpr(expr) => vec![class_name(expr.clone())],
            FactoryKey::Name(expr) => vec![expr.clone()],
            FactoryKey::Caller => vec![class_name(Expr::class_literal(owner))],
        }
    } else {
        match key {
            FactoryKey::Class(fqn) | FactoryKey::ClassName(fqn) => vec![Expr::class_literal(fqn.clone())],
            FactoryKey::ClassExpr(expr) | FactoryKey::Name(expr) => vec![expr.clone()],
            FactoryKey::Caller if target == LoggingFramework::Log4j2 => Vec::new(),
            FactoryKey::Caller => vec![Expr::class_literal(owner)],
        }
    };
    Expr::static_call(
        target.factory_type(),
        target.factory_method(),
        args,
        JavaType::class(target.logger_type()),
    )
}

fn class_name(class: Expr) -> Expr {
    Expr::call(
        class,
        "getName",
        Vec::new(),
        MethodType::instance(CLASS, "getName").returning(JavaType::string()),
    )
}

/// Factory call replacement, with the accessor's type imported.
pub fn emit_factory_call(target: LoggingFramework, key: &FactoryKey, owner: &str) -> Replacement {
    Replacement::new(factory_call(target, key, owner))
        .with_effects(Effects::new().add_import(target.factory_type()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types;
    use crate::ast::ToSource;
    use crate::callsite::CallSource;

    fn record(message: CanonicalMessage, severity: Severity) -> CallSiteRecord {
        CallSiteRecord {
            receiver: None,
            source: CallSource::StackTrace,
            severity,
            message,
            is_already_canonical: false,
            marker: None,
            method_type: None,
            level_argument: false,
        }
    }

    fn logger(framework: LoggingFramework) -> Expr {
        Expr::ident("logger", JavaType::class(framework.logger_type()))
    }

    fn error() -> Expr {
        Expr::ident("e", JavaType::Class(types::exception()))
    }

    fn render(message: CanonicalMessage, severity: Severity, target: LoggingFramework) -> Replacement {
        emit_log_call(&record(message, severity), target, &SeverityPolicy::default(), logger(target))
    }

    #[test]
    fn test_slf4j_shape_with_error() {
        let user = Expr::ident("user", JavaType::string());
        let message = CanonicalMessage::new("login failed for {}", vec![user]).with_error(error());
        let replacement = render(message, Severity::Fatal, LoggingFramework::Slf4j);
        assert_eq!(replacement.expr.to_source(), "logger.error(\"login failed for {}\", user, e)");
        assert!(replacement.effects.is_empty());
    }

    #[test]
    fn test_verbatim_message_drops_escapes() {
        let message = CanonicalMessage::new("use \\\\{} here", Vec::new());
        let replacement = render(message, Severity::Info, LoggingFramework::Slf4j);
        assert_eq!(replacement.expr.to_source(), "logger.info(\"use {} here\")");
    }

    #[test]
    fn test_log4j1_renders_concatenation() {
        let count = Expr::ident("count", JavaType::int());
        let message = CanonicalMessage::new("{} items", vec![count]).with_error(error());
        let replacement = render(message, Severity::Warn, LoggingFramework::Log4j1);
        assert_eq!(replacement.expr.to_source(), "logger.warn(\"\" + count + \" items\", e)");
    }

    #[test]
    fn test_jul_shapes() {
        let plain = render(CanonicalMessage::new("ready", Vec::new()), Severity::Debug, LoggingFramework::Jul);
        assert_eq!(plain.expr.to_source(), "logger.fine(\"ready\")");

        let a = Expr::ident("a", JavaType::string());
        let b = Expr::ident("b", JavaType::int());
        let message = CanonicalMessage::new("{} and {}", vec![a.clone(), b.clone()]);
        let replacement = render(message, Severity::Error, LoggingFramework::Jul);
        assert_eq!(
            replacement.expr.to_source(),
            "logger.log(Level.SEVERE, \"{0} and {1}\", new Object[]{a, b})"
        );
        assert_eq!(replacement.effects.add_imports, vec!["java.util.logging.Level"]);

        // The throwable stays a Throwable so the stack trace is recorded.
        let message = CanonicalMessage::new("{} and {}", vec![a, b]).with_error(error());
        let replacement = render(message, Severity::Error, LoggingFramework::Jul);
        assert_eq!(
            replacement.expr.to_source(),
            "logger.log(Level.SEVERE, a + \" and \" + b, e)"
        );

        let count = Expr::ident("count", JavaType::int());
        let message = CanonicalMessage::new("{}", vec![count]).with_error(error());
        let replacement = render(message, Severity::Warn, LoggingFramework::Jul);
        assert_eq!(replacement.expr.to_source(), "logger.log(Level.WARNING, \"\" + count, e)");

        let with_error = render(
            CanonicalMessage::new("Exception", Vec::new()).with_error(error()),
            Severity::Error,
            LoggingFramework::Jul,
        );
        assert_eq!(with_error.expr.to_source(), "logger.log(Level.SEVERE, \"Exception\", e)");
    }

    #[test]
    fn test_lone_array_argument_is_wrapped() {
        let ids = Expr::ident("ids", JavaType::Array(Box::new(JavaType::string())));
        let message = CanonicalMessage::new("ids {}", vec![ids.clone()]);
        let replacement = render(message.clone(), Severity::Info, LoggingFramework::Slf4j);
        assert_eq!(replacement.expr.to_source(), "logger.info(\"ids {}\", new Object[]{ids})");

        let replacement = render(message, Severity::Info, LoggingFramework::Jul);
        assert_eq!(
            replacement.expr.to_source(),
            "logger.log(Level.INFO, \"ids {0}\", new Object[]{ids})"
        );

        // Next to another argument the array is an ordinary parameter.
        let count = Expr::ident("count", JavaType::int());
        let message = CanonicalMessage::new("{} of {}", vec![ids, count]);
        let replacement = render(message, Severity::Info, LoggingFramework::Slf4j);
        assert_eq!(replacement.expr.to_source(), "logger.info(\"{} of {}\", ids, count)");
    }

    #[test]
    fn test_level_checks() {
        let policy = SeverityPolicy::default();
        let check = emit_level_check(Severity::Debug, LoggingFramework::Slf4j, &policy, logger(LoggingFramework::Slf4j))
            .unwrap();
        assert_eq!(check.expr.to_source(), "logger.isDebugEnabled()");
        assert!(check.effects.is_empty());

        let check = emit_level_check(Severity::Trace, LoggingFramework::Jul, &policy, logger(LoggingFramework::Jul))
            .unwrap();
        assert_eq!(check.expr.to_source(), "logger.isLoggable(Level.FINER)");
        assert_eq!(check.effects.add_imports, vec!["java.util.logging.Level"]);

        let check =
            emit_level_check(Severity::Warn, LoggingFramework::Log4j1, &policy, logger(LoggingFramework::Log4j1))
                .unwrap();
        assert_eq!(check.expr.to_source(), "logger.isEnabledFor(Level.WARN)");
        assert_eq!(check.effects.add_imports, vec!["org.apache.log4j.Level"]);
    }

    #[test]
    fn test_factory_remap() {
        let key = FactoryKey::ClassName("com.example.Test".to_string());
        assert_eq!(
            factory_call(LoggingFramework::Slf4j, &key, "com.example.Test").to_source(),
            "LoggerFactory.getLogger(Test.class)"
        );
        let key = FactoryKey::Class("com.example.Test".to_string());
        assert_eq!(
            factory_call(LoggingFramework::Jul, &key, "com.example.Test").to_source(),
            "Logger.getLogger(Test.class.getName())"
        );
        assert_eq!(
            factory_call(LoggingFramework::Log4j2, &FactoryKey::Caller, "com.example.Test").to_source(),
            "LogManager.getLogger()"
        );
    }
}
