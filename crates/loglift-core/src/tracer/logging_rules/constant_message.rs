/*!
# Constant Log Message

Log calls on template frameworks should start with a constant message:

- `logger.info(String.format("%s of %d", a, b))` becomes `logger.info("{} of {}", a, b)`
- `logger.error(String.valueOf(e))` becomes `logger.error("Exception", e)`
- `logger.debug(x.toString())` becomes `logger.debug("{}", x)`

Format strings using anything other than plain `%s`-style specifiers are
left alone.
*/

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::types::STRING;
use crate::ast::{Expr, JavaType};
use crate::callsite::call_signature;
use crate::emit::Replacement;
use crate::framework::{LoggingFramework, SignatureKind};
use crate::message::TemplateStyle;
use crate::tracer::patterns::{ExprPattern, PatternMatcher};
use crate::tracer::rules::RewriteRule;
use crate::tracer::{TransformResult, TransformationContext};

static FORMAT_SPECIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%[\d.]*[dfscbBhH]").expect("format specifier pattern must compile"));

pub struct ConstantLogMessage;

impl ConstantLogMessage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConstantLogMessage {
    fn default() -> Self {
        Self::new()
    }
}

impl RewriteRule for ConstantLogMessage {
    fn name(&self) -> &'static str {
        "constant-message"
    }

    fn description(&self) -> &'static str {
        "Replaces String.format, String.valueOf and toString() messages with constant templates"
    }

    fn matches(&self, expr: &Expr, _context: &TransformationContext) -> bool {
        PatternMatcher::typed_method_call().matches(expr)
    }

    fn try_rewrite(&self, expr: &Expr, _context: &TransformationContext) -> TransformResult<Option<Replacement>> {
        let Some(framework) = template_framework(expr) else {
            return Ok(None);
        };
        let Expr::MethodCall { select, name, args, method_type } = expr else {
            return Ok(None);
        };
        let message_index = match (args.first(), framework.marker_type()) {
            (Some(first), Some(marker_type))
                if first.static_type().is_some_and(|ty| ty.is_assignable_to(marker_type)) =>
            {
                1
            }
            _ => 0,
        };
        let Some(message) = args.get(message_index) else {
            return Ok(None);
        };
        let trailing = &args[message_index + 1..];

        let Some(replaced) = from_format(message)
            .or_else(|| trailing.is_empty().then(|| from_value_of(message)).flatten())
            .or_else(|| trailing.is_empty().then(|| from_to_string(message)).flatten())
        else {
            return Ok(None);
        };

        let mut new_args = args[..message_index].to_vec();
        new_args.extend(replaced);
        new_args.extend(trailing.iter().cloned());
        Ok(Some(Replacement::new(Expr::MethodCall {
            select: select.clone(),
            name: name.clone(),
            args: new_args,
            method_type: method_type.clone(),
        })))
    }
}

/// Framework of a leveled call whose messages are `{}` templates.
fn template_framework(expr: &Expr) -> Option<LoggingFramework> {
    let signature = call_signature(expr)?;
    let framework = signature.framework?;
    let leveled = matches!(signature.kind, SignatureKind::Leveled(_));
    (leveled && framework.template_style() == TemplateStyle::Anonymous).then_some(framework)
}

/// `String.<name>(..)`
fn string_call<'e>(expr: &'e Expr, method: &str) -> Option<&'e [Expr]> {
    match expr.unparenthesized() {
        Expr::MethodCall { name, args, method_type: Some(method_type), .. }
            if name == method && method_type.declaring_type == STRING =>
        {
            Some(args)
        }
        _ => None,
    }
}

fn from_format(message: &Expr) -> Option<Vec<Expr>> {
    let (format, params) = string_call(message, "format")?.split_first()?;
    let raw = format.unparenthesized().as_string_literal()?;

    // `{}` already means something, `\{}` escapes it, and every `%` must be
    // a plain specifier.
    let specifiers = FORMAT_SPECIFIER.find_iter(raw).count();
    if raw.contains("{}") || raw.contains('\\') || raw.matches('%').count() != specifiers {
        return None;
    }
    if specifiers != params.len() {
        return None;
    }
    // String.format spreads a lone array over its varargs.
    if let [only] = params {
        if !matches!(only.static_type(), Some(ty) if !matches!(ty, JavaType::Array(_))) {
            return None;
        }
    }

    let template = FORMAT_SPECIFIER.replace_all(raw, "{}").into_owned();
    let mut args = vec![Expr::string(template)];
    args.extend(params.iter().cloned());
    Some(args)
}

fn from_value_of(message: &Expr) -> Option<Vec<Expr>> {
    let [value] = string_call(message, "valueOf")? else {
        return None;
    };
    let is_throwable = value.static_type().is_some_and(|ty| ty.is_throwable());
    is_throwable.then(|| vec![Expr::string("Exception"), value.clone()])
}

fn from_to_string(message: &Expr) -> Option<Vec<Expr>> {
    let Expr::MethodCall { select: Some(receiver), name, args, .. } = message.unparenthesized() else {
        return None;
    };
    if name != "toString" || !args.is_empty() {
        return None;
    }
    match receiver.static_type()? {
        JavaType::Array(_) => None,
        _ => Some(vec![Expr::string("{}"), receiver.as_ref().clone()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{MethodType, ToSource};
    use crate::tracer::logging_rules::test_support::{context, error, log_call};
    use pretty_assertions::assert_eq;

    fn rewrite(call: &Expr) -> Option<String> {
        let rule = ConstantLogMessage::new();
        assert!(rule.matches(call, &context()));
        rule.try_rewrite(call, &context())
            .unwrap()
            .map(|replacement| replacement.expr.to_source())
    }

    fn format(raw: &str, params: Vec<Expr>) -> Expr {
        let mut args = vec![Expr::string(raw)];
        args.extend(params);
        Expr::static_call(STRING, "format", args, JavaType::string())
    }

    fn user() -> Expr {
        Expr::ident("user", JavaType::string())
    }

    fn count() -> Expr {
        Expr::ident("count", JavaType::int())
    }

    #[test]
    fn test_string_format_becomes_template() {
        let call = log_call(
            LoggingFramework::Slf4j,
            "info",
            vec![format("%s has %d items", vec![user(), count()])],
        );
        assert_eq!(rewrite(&call).unwrap(), "logger.info(\"{} has {} items\", user, count)");

        let with_error = log_call(
            LoggingFramework::Log4j2,
            "error",
            vec![format("failed for %s", vec![user()]), error()],
        );
        assert_eq!(rewrite(&with_error).unwrap(), "logger.error(\"failed for {}\", user, e)");
    }

    #[test]
    fn test_unusual_format_strings_are_kept() {
        for raw in ["%2$s then %1$s", "%s%n", "100%% of %s", "{} and %s", "%-10s"] {
            let call = log_call(LoggingFramework::Slf4j, "info", vec![format(raw, vec![user()])]);
            assert_eq!(rewrite(&call), None, "{raw}");
        }

        let call = log_call(LoggingFramework::Slf4j, "info", vec![format("%s and %s", vec![user()])]);
        assert_eq!(rewrite(&call), None);

        let names = Expr::ident("names", JavaType::Array(Box::new(JavaType::string())));
        let call = log_call(LoggingFramework::Slf4j, "info", vec![format("%s", vec![names])]);
        assert_eq!(rewrite(&call), None);
    }

    #[test]
    fn test_value_of_throwable() {
        let value_of = Expr::static_call(STRING, "valueOf", vec![error()], JavaType::string());
        let call = log_call(LoggingFramework::Slf4j, "error", vec![value_of]);
        assert_eq!(rewrite(&call).unwrap(), "logger.error(\"Exception\", e)");

        let value_of = Expr::static_call(STRING, "valueOf", vec![count()], JavaType::string());
        let call = log_call(LoggingFramework::Slf4j, "error", vec![value_of]);
        assert_eq!(rewrite(&call), None);
    }

    #[test]
    fn test_to_string_message() {
        let order = Expr::ident("order", JavaType::class("com.example.Order"));
        let to_string = Expr::call(
            order,
            "toString",
            Vec::new(),
            MethodType::instance("com.example.Order", "toString").returning(JavaType::string()),
        );
        let call = log_call(LoggingFramework::Slf4j, "debug", vec![to_string]);
        assert_eq!(rewrite(&call).unwrap(), "logger.debug(\"{}\", order)");
    }

    #[test]
    fn test_concatenation_frameworks_untouched() {
        let call = log_call(LoggingFramework::Log4j1, "info", vec![format("%s", vec![user()])]);
        assert_eq!(rewrite(&call), None);
    }
}
