/*!
# Argument Array To Varargs

`logger.info("{} of {}", new Object[]{a, b})` becomes
`logger.info("{} of {}", a, b)` on frameworks whose parameterized methods
take varargs. An empty array is dropped.
*/

use crate::ast::types::OBJECT;
use crate::ast::{Expr, JavaType};
use crate::callsite::call_signature;
use crate::emit::Replacement;
use crate::framework::SignatureKind;
use crate::message::TemplateStyle;
use crate::tracer::patterns::{ExprPattern, PatternMatcher};
use crate::tracer::rules::RewriteRule;
use crate::tracer::{TransformResult, TransformationContext};

pub struct ArgumentArrayToVarargs;

impl ArgumentArrayToVarargs {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ArgumentArrayToVarargs {
    fn default() -> Self {
        Self::new()
    }
}

impl RewriteRule for ArgumentArrayToVarargs {
    fn name(&self) -> &'static str {
        "array-to-varargs"
    }

    fn description(&self) -> &'static str {
        "Passes an explicit Object[] of log parameters as varargs"
    }

    fn matches(&self, expr: &Expr, _context: &TransformationContext) -> bool {
        PatternMatcher::typed_method_call().matches(expr)
            && matches!(expr, Expr::MethodCall { args, .. } if matches!(args.last(), Some(Expr::NewArray { .. })))
    }

    fn try_rewrite(&self, expr: &Expr, _context: &TransformationContext) -> TransformResult<Option<Replacement>> {
        let Some(message_index) = message_index(expr) else {
            return Ok(None);
        };
        let Expr::MethodCall { select, name, args, method_type } = expr else {
            return Ok(None);
        };
        let Some((Expr::NewArray { element, elements }, leading)) = args.split_last() else {
            return Ok(None);
        };
        if leading.len() <= message_index || element.type_name() != OBJECT {
            return Ok(None);
        }
        // A lone array or untyped element would bind to the varargs itself.
        if let [only] = elements.as_slice() {
            if !matches!(only.static_type(), Some(ty) if !matches!(ty, JavaType::Array(_))) {
                return Ok(None);
            }
        }

        let mut new_args = leading.to_vec();
        new_args.extend(elements.iter().cloned());
        Ok(Some(Replacement::new(Expr::MethodCall {
            select: select.clone(),
            name: name.clone(),
            args: new_args,
            method_type: method_type.clone(),
        })))
    }
}

/// Position of the message argument of a `{}` template call.
fn message_index(expr: &Expr) -> Option<usize> {
    let signature = call_signature(expr)?;
    let framework = signature.framework?;
    if framework.template_style() != TemplateStyle::Anonymous {
        return None;
    }
    let level_offset = match signature.kind {
        SignatureKind::Leveled(_) => 0,
        SignatureKind::LevelArgument => 1,
        _ => return None,
    };
    let Expr::MethodCall { args, .. } = expr else {
        return None;
    };
    let has_marker = match (args.get(level_offset), framework.marker_type()) {
        (Some(first), Some(marker_type)) => first
            .static_type()
            .is_some_and(|ty| ty.is_assignable_to(marker_type)),
        _ => false,
    };
    Some(level_offset + usize::from(has_marker))
}
