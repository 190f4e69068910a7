/*!
# Logging Rules

Rewrite rules that normalize logging call sites, plus `build_rules` which
assembles them by name from a `LogliftConfig`.

| Name | Rule |
|---|---|
| `parameterize-messages` | [`ParameterizeMessages`] |
| `print-stack-trace` | [`PrintStackTraceToLog`] |
| `console` | [`ConsoleToLog`] |
| `system-print` | console and stack-trace rules bundled |
| `migrate` | [`MigrateFramework`] |
| `enclosing-class` | [`LoggerNamedForEnclosingClass`] |
| `complete-exception` | [`CompleteExceptionLogging`] |
| `change-level` | [`ChangeLogLevel`] |
| `level-method` | [`LevelArgumentToMethod`] |
| `constant-message` | [`ConstantLogMessage`] |
| `array-to-varargs` | [`ArgumentArrayToVarargs`] |
| `private-loggers` | [`LoggersToPrivate`] |
*/

pub mod array_to_varargs;
pub mod change_level;
pub mod complete_exception;
pub mod console;
pub mod constant_message;
pub mod enclosing_class;
pub mod level_method;
pub mod migrate;
pub mod parameterize;
pub mod print_stack_trace;
pub mod private_loggers;

pub use array_to_varargs::ArgumentArrayToVarargs;
pub use change_level::ChangeLogLevel;
pub use complete_exception::CompleteExceptionLogging;
pub use console::ConsoleToLog;
pub use constant_message::ConstantLogMessage;
pub use enclosing_class::LoggerNamedForEnclosingClass;
pub use level_method::LevelArgumentToMethod;
pub use migrate::MigrateFramework;
pub use parameterize::ParameterizeMessages;
pub use print_stack_trace::PrintStackTraceToLog;
pub use private_loggers::LoggersToPrivate;

#[cfg(test)]
pub(crate) mod test_support;

use crate::ast::{Expr, JavaType};
use crate::callsite::{CallSiteRecord, ClassifyOptions};
use crate::config::LogliftConfig;
use crate::emit::{emit_log_call, Effects, Replacement};
use crate::error::{LogliftError, Result};
use crate::framework::{LoggingFramework, SeverityPolicy};
use crate::logger_field::{resolve, ClassScope, LoggerPolicy};
use crate::message::CompileOptions;
use crate::tracer::patterns::MethodMatcher;
use crate::tracer::rules::{CompositeRule, RewriteRule};

pub const RULE_NAMES: [&str; 12] = [
    "parameterize-messages",
    "print-stack-trace",
    "console",
    "system-print",
    "migrate",
    "enclosing-class",
    "complete-exception",
    "change-level",
    "level-method",
    "constant-message",
    "array-to-varargs",
    "private-loggers",
];

/// Instantiate the rules `config.rules` names, in that order.
pub fn build_rules(config: &LogliftConfig) -> Result<Vec<Box<dyn RewriteRule>>> {
    config.rules.iter().map(|name| build_rule(name, config)).collect()
}

fn build_rule(name: &str, config: &LogliftConfig) -> Result<Box<dyn RewriteRule>> {
    let rule: Box<dyn RewriteRule> = match name {
        "parameterize-messages" => {
            let mut rule = ParameterizeMessages::new()
                .with_options(classify_options(config))
                .strip_to_string(config.strip_to_string);
            if let Some(pattern) = &config.method_pattern {
                rule = rule.with_method_pattern(MethodMatcher::parse(pattern)?);
            }
            Box::new(rule)
        }
        "print-stack-trace" => Box::new(PrintStackTraceToLog::from_config(config)),
        "console" => Box::new(ConsoleToLog::from_config(config)),
        "system-print" => Box::new(
            CompositeRule::new("system-print", "Routes console writes and stack-trace prints to the logger")
                .add_rule(Box::new(ConsoleToLog::from_config(config)))
                .add_rule(Box::new(PrintStackTraceToLog::from_config(config))),
        ),
        "migrate" => Box::new(MigrateFramework::from_config(config)),
        "enclosing-class" => Box::new(LoggerNamedForEnclosingClass::new()),
        "complete-exception" => Box::new(CompleteExceptionLogging::new()),
        "change-level" => {
            let settings = config
                .change_level
                .as_ref()
                .ok_or_else(|| LogliftError::Config("change-level needs a change_level section".to_string()))?;
            let mut rule = ChangeLogLevel::new(settings.from, settings.to);
            if let Some(prefix) = &settings.starts_with {
                rule = rule.starting_with(prefix.clone());
            }
            Box::new(rule)
        }
        "level-method" => Box::new(LevelArgumentToMethod::new()),
        "constant-message" => Box::new(ConstantLogMessage::new()),
        "array-to-varargs" => Box::new(ArgumentArrayToVarargs::new()),
        "private-loggers" => Box::new(LoggersToPrivate::new()),
        other => return Err(LogliftError::UnknownRule(other.to_string())),
    };
    Ok(rule)
}

pub(crate) fn classify_options(config: &LogliftConfig) -> ClassifyOptions {
    ClassifyOptions {
        console_severity: config.console_severity,
        compile: CompileOptions {
            explicit_error: None,
            collapse_error_accessors: config.collapse_error_accessors,
        },
    }
}

pub(crate) fn logger_policy(config: &LogliftConfig) -> LoggerPolicy {
    LoggerPolicy {
        field_name: config.logger_name.clone(),
        add_if_missing: config.add_logger_if_missing,
    }
}

/// Emit `record` through the logger `scope` has, or one injected into it.
/// `None` when the class has no usable logger and may not get one.
pub(crate) fn log_through_scope(
    record: &CallSiteRecord,
    target: LoggingFramework,
    logger_policy: &LoggerPolicy,
    severity_policy: &SeverityPolicy,
    scope: &ClassScope,
) -> Option<Replacement> {
    let resolved = resolve(scope, target, logger_policy)?;
    let replacement = emit_log_call(record, target, severity_policy, resolved.receiver());
    Some(match resolved.field_to_add() {
        Some(spec) => replacement.with_effects(Effects::new().with_field(spec.clone())),
        None => replacement,
    })
}

/// The same receiver, typed as `framework`'s logger.
pub(crate) fn retype_receiver(receiver: &Expr, framework: LoggingFramework) -> Option<Expr> {
    let ty = Some(JavaType::class(framework.logger_type()));
    match receiver {
        Expr::Identifier { name, .. } => Some(Expr::Identifier { name: name.clone(), ty }),
        Expr::FieldAccess { target, name, .. } => Some(Expr::FieldAccess {
            target: target.clone(),
            name: name.clone(),
            ty,
        }),
        _ => None,
    }
}

/// Leftmost string literal of a message, looking through concatenations.
pub(crate) fn leftmost_literal(expr: &Expr) -> Option<&str> {
    match expr.unparenthesized() {
        Expr::Binary { left, .. } => leftmost_literal(left),
        other => other.as_string_literal(),
    }
}
