/*!
# Parameterize Messages

Turns concatenated log messages into templates for frameworks that have
them: `logger.info("Hello " + name)` becomes `logger.info("Hello {}", name)`.
*/

use tracing::trace;

use crate::ast::Expr;
use crate::callsite::{classify_call_with, CallSiteRecord, CallSource, ClassifyOptions};
use crate::emit::{emit_log_call, Replacement};
use crate::framework::{LoggingFramework, SeverityPolicy};
use crate::message::TemplateStyle;
use crate::tracer::patterns::{ExprPattern, MethodMatcher, PatternMatcher};
use crate::tracer::rules::RewriteRule;
use crate::tracer::{TransformResult, TransformationContext};

pub struct ParameterizeMessages {
    method_pattern: Option<MethodMatcher>,
    strip_to_string: bool,
    options: ClassifyOptions,
}

impl ParameterizeMessages {
    pub fn new() -> Self {
        Self {
            method_pattern: None,
            strip_to_string: false,
            options: ClassifyOptions::default(),
        }
    }

    /// Only rewrite calls matching `pattern`.
    pub fn with_method_pattern(mut self, pattern: MethodMatcher) -> Self {
        self.method_pattern = Some(pattern);
        self
    }

    /// Pass `x` rather than `x.toString()` as a template argument.
    pub fn strip_to_string(mut self, enabled: bool) -> Self {
        self.strip_to_string = enabled;
        self
    }

    pub fn with_options(mut self, options: ClassifyOptions) -> Self {
        self.options = options;
        self
    }
}

impl Default for ParameterizeMessages {
    fn default() -> Self {
        Self::new()
    }
}

impl RewriteRule for ParameterizeMessages {
    fn name(&self) -> &'static str {
        "parameterize-messages"
    }

    fn description(&self) -> &'static str {
        "Replaces concatenated log messages with parameterized templates"
    }

    fn matches(&self, expr: &Expr, _context: &TransformationContext) -> bool {
        PatternMatcher::typed_method_call().matches(expr)
            && self.method_pattern.as_ref().map_or(true, |pattern| pattern.matches(expr))
    }

    fn try_rewrite(&self, expr: &Expr, _context: &TransformationContext) -> TransformResult<Option<Replacement>> {
        let Some(record) = classify_call_with(expr, &self.options) else {
            return Ok(None);
        };
        let CallSource::Framework(framework) = record.source else {
            return Ok(None);
        };
        if framework.template_style() == TemplateStyle::Concatenation || has_lossy_level(expr, framework) {
            return Ok(None);
        }
        // JUL only records a stack trace through log(Level, String, Throwable),
        // which takes no template parameters.
        if framework.template_style() == TemplateStyle::Indexed
            && record.message.trailing_error.is_some()
            && !record.message.arguments.is_empty()
        {
            return Ok(None);
        }
        let Some(receiver) = record.receiver.clone() else {
            return Ok(None);
        };

        let mut message = record.message.clone();
        let stripped = self.strip_to_string && strip_to_string(&mut message.arguments);
        if record.is_already_canonical && !stripped {
            return Ok(None);
        }
        if let Some(pattern) = &self.method_pattern {
            trace!(pattern = pattern.as_str(), "Parameterizing matched call");
        }

        let record = CallSiteRecord { message, ..record };
        Ok(Some(emit_log_call(&record, framework, &SeverityPolicy::default(), receiver)))
    }
}

/// Levels with no severity tier of their own would change on re-emission.
fn has_lossy_level(expr: &Expr, framework: LoggingFramework) -> bool {
    let Expr::MethodCall { name, args, .. } = expr else {
        return false;
    };
    match framework {
        LoggingFramework::Jul if name == "finest" || name == "config" => true,
        LoggingFramework::Jul | LoggingFramework::Log4j2 if name == "log" => matches!(
            args.first().map(Expr::unparenthesized),
            Some(Expr::FieldAccess { name, .. }) if name == "ALL" || name == "FINEST" || name == "CONFIG"
        ),
        _ => false,
    }
}

fn strip_to_string(arguments: &mut [Expr]) -> bool {
    let mut changed = false;
    for arg in arguments {
        if let Expr::MethodCall { select: Some(select), name, args, .. } = arg {
            if name == "toString" && args.is_empty() && select.static_type().is_some() {
                let receiver = select.as_ref().clone();
                *arg = receiver;
                changed = true;
            }
        }
    }
    changed
}
