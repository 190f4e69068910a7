/*!
# Change Log Level

Moves leveled calls from one severity to another, e.g. every
`logger.info("LaunchDarkly ...")` to `logger.debug(..)`. Only calls whose
message starts with a string literal are touched, optionally filtered by a
prefix of that literal.
*/

use crate::ast::{Expr, MethodType};
use crate::callsite::call_signature;
use crate::emit::Replacement;
use crate::framework::{Severity, SignatureKind};
use crate::tracer::patterns::{ExprPattern, PatternMatcher};
use crate::tracer::rules::RewriteRule;
use crate::tracer::{TransformResult, TransformationContext};

use super::leftmost_literal;

pub struct ChangeLogLevel {
    from: Severity,
    to: Severity,
    starts_with: Option<String>,
}

impl ChangeLogLevel {
    pub fn new(from: Severity, to: Severity) -> Self {
        Self {
            from,
            to,
            starts_with: None,
        }
    }

    /// Only change calls whose message literal starts with `prefix`.
    /// A blank prefix filters nothing.
    pub fn starting_with(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.starts_with = (!prefix.trim().is_empty()).then_some(prefix);
        self
    }

    fn accepts_message(&self, message: &Expr) -> bool {
        match leftmost_literal(message) {
            Some(literal) => self
                .starts_with
                .as_deref()
                .map_or(true, |prefix| literal.starts_with(prefix)),
            None => false,
        }
    }
}

impl RewriteRule for ChangeLogLevel {
    fn name(&self) -> &'static str {
        "change-level"
    }

    fn description(&self) -> &'static str {
        "Changes the severity of matching log calls"
    }

    fn matches(&self, expr: &Expr, _context: &TransformationContext) -> bool {
        self.from != self.to && PatternMatcher::typed_method_call().matches(expr)
    }

    fn try_rewrite(&self, expr: &Expr, _context: &TransformationContext) -> TransformResult<Option<Replacement>> {
        let Some(signature) = call_signature(expr) else {
            return Ok(None);
        };
        let (Some(framework), SignatureKind::Leveled(severity)) = (signature.framework, signature.kind) else {
            return Ok(None);
        };
        let Expr::MethodCall { select, name, args, method_type } = expr else {
            return Ok(None);
        };
        if severity != self.from || *name != framework.method_for(self.from) || !framework.supports(self.to) {
            return Ok(None);
        }

        let marked = framework.marker_type().is_some_and(|marker_type| {
            args.first()
                .and_then(Expr::static_type)
                .is_some_and(|ty| ty.is_assignable_to(marker_type))
        });
        let Some(message) = args.get(usize::from(marked)) else {
            return Ok(None);
        };
        if !self.accepts_message(message) {
            return Ok(None);
        }

        let method = framework.method_for(self.to);
        Ok(Some(Replacement::new(Expr::MethodCall {
            select: select.clone(),
            name: method.to_string(),
            args: args.clone(),
            method_type: method_type.as_ref().map(|method_type| MethodType {
                name: method.to_string(),
                ..method_type.clone()
            }),
        })))
    }
}
