/*!
# Complete Exception Logging

Logging only `e.getMessage()` drops the exception's type and stack trace.
When a leveled call ends with an error accessor, the exception itself is
passed as the trailing argument: appended after the accessor when the
template has a placeholder for it, substituted for it otherwise.
*/

use crate::ast::Expr;
use crate::callsite::call_signature;
use crate::emit::Replacement;
use crate::framework::SignatureKind;
use crate::message::classify::error_accessor_receiver;
use crate::message::{placeholder_count, TemplateStyle};
use crate::tracer::patterns::{ExprPattern, PatternMatcher};
use crate::tracer::rules::RewriteRule;
use crate::tracer::{TransformResult, TransformationContext};

pub struct CompleteExceptionLogging;

impl CompleteExceptionLogging {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CompleteExceptionLogging {
    fn default() -> Self {
        Self::new()
    }
}

impl RewriteRule for CompleteExceptionLogging {
    fn name(&self) -> &'static str {
        "complete-exception"
    }

    fn description(&self) -> &'static str {
        "Logs the exception rather than only its message"
    }

    fn matches(&self, expr: &Expr, _context: &TransformationContext) -> bool {
        PatternMatcher::typed_method_call().matches(expr)
    }

    fn try_rewrite(&self, expr: &Expr, _context: &TransformationContext) -> TransformResult<Option<Replacement>> {
        let Some(signature) = call_signature(expr) else {
            return Ok(None);
        };
        let Some(framework) = signature.framework else {
            return Ok(None);
        };
        if !matches!(signature.kind, SignatureKind::Leveled(_))
            || framework.template_style() != TemplateStyle::Anonymous
        {
            return Ok(None);
        }
        let Expr::MethodCall { select, name, args, method_type } = expr else {
            return Ok(None);
        };

        let marked = framework.marker_type().is_some_and(|marker_type| {
            args.first()
                .and_then(Expr::static_type)
                .is_some_and(|ty| ty.is_assignable_to(marker_type))
        });
        let (leading, message_args) = args.split_at(usize::from(marked));
        let Some(error) = message_args.last().and_then(error_accessor_receiver) else {
            return Ok(None);
        };

        let mut rewritten = message_args.to_vec();
        if let [_] = message_args {
            rewritten = vec![Expr::string(""), error.clone()];
        } else {
            let Some(template) = message_args.first().and_then(Expr::as_string_literal) else {
                return Ok(None);
            };
            if placeholder_count(template) >= message_args.len() - 1 {
                rewritten.push(error.clone());
            } else if let Some(last) = rewritten.last_mut() {
                *last = error.clone();
            }
        }

        let mut new_args = leading.to_vec();
        new_args.extend(rewritten);
        Ok(Some(Replacement::new(Expr::MethodCall {
            select: select.clone(),
            name: name.clone(),
            args: new_args,
            method_type: method_type.clone(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{JavaType, ToSource};
    use crate::framework::LoggingFramework;
    use crate::tracer::logging_rules::test_support::{context, error, get_message, log_call};
    use pretty_assertions::assert_eq;

    fn rewrite(call: &Expr) -> Option<String> {
        CompleteExceptionLogging::new()
            .try_rewrite(call, &context())
            .unwrap()
            .map(|replacement| replacement.expr.to_source())
    }

    #[test]
    fn test_message_only() {
        let call = log_call(LoggingFramework::Slf4j, "error", vec![get_message(error())]);
        assert_eq!(rewrite(&call).unwrap(), "logger.error(\"\", e)");
    }

    #[test]
    fn test_accessor_counted_by_placeholder_is_kept() {
        let call = log_call(
            LoggingFramework::Slf4j,
            "warn",
            vec![Expr::string("save failed: {}"), get_message(error())],
        );
        assert_eq!(rewrite(&call).unwrap(), "logger.warn(\"save failed: {}\", e.getMessage(), e)");
    }

    #[test]
    fn test_unplaced_accessor_is_replaced() {
        let id = Expr::ident("id", JavaType::string());
        let call = log_call(
            LoggingFramework::Slf4j,
            "error",
            vec![Expr::string("save {} failed"), id, get_message(error())],
        );
        assert_eq!(rewrite(&call).unwrap(), "logger.error(\"save {} failed\", id, e)");

        // Once the exception trails, there is nothing left to do.
        let done = log_call(
            LoggingFramework::Slf4j,
            "error",
            vec![Expr::string("save failed"), error()],
        );
        assert_eq!(rewrite(&done), None);
    }

    #[test]
    fn test_marker_kept_in_front() {
        let marker = Expr::ident("AUDIT", JavaType::class("org.slf4j.Marker"));
        let call = log_call(
            LoggingFramework::Slf4j,
            "error",
            vec![marker, Expr::string("failed"), get_message(error())],
        );
        assert_eq!(rewrite(&call).unwrap(), "logger.error(AUDIT, \"failed\", e)");
    }

    #[test]
    fn test_skips_other_styles_and_dynamic_templates() {
        let jul = log_call(LoggingFramework::Jul, "severe", vec![get_message(error())]);
        assert_eq!(rewrite(&jul), None);

        let template = Expr::ident("template", JavaType::string());
        let call = log_call(LoggingFramework::Slf4j, "error", vec![template, get_message(error())]);
        assert_eq!(rewrite(&call), None);
    }
}
