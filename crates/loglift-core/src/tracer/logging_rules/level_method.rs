/*!
# Level Argument To Method

`logger.log(Level.INFO, message)` on a JUL logger becomes
`logger.info(message)`. Applies to plain string messages and
`Supplier<String>` messages, for each level JUL has a method for.
*/

use crate::ast::{Expr, MethodType};
use crate::emit::{Effects, Replacement};
use crate::framework::LoggingFramework;
use crate::tracer::rules::RewriteRule;
use crate::tracer::{TransformResult, TransformationContext};

const SUPPLIER: &str = "java.util.function.Supplier";

/// JUL level constants with a method of the same name.
const LEVEL_METHODS: [(&str, &str); 7] = [
    ("FINEST", "finest"),
    ("FINER", "finer"),
    ("FINE", "fine"),
    ("CONFIG", "config"),
    ("INFO", "info"),
    ("WARNING", "warning"),
    ("SEVERE", "severe"),
];

pub struct LevelArgumentToMethod;

impl LevelArgumentToMethod {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LevelArgumentToMethod {
    fn default() -> Self {
        Self::new()
    }
}

impl RewriteRule for LevelArgumentToMethod {
    fn name(&self) -> &'static str {
        "level-method"
    }

    fn description(&self) -> &'static str {
        "Replaces JUL log(Level, message) with the level's own method"
    }

    fn matches(&self, expr: &Expr, _context: &TransformationContext) -> bool {
        matches!(
            expr,
            Expr::MethodCall { name, args, method_type: Some(method_type), .. }
                if name == "log"
                    && args.len() == 2
                    && method_type.declaring_type == LoggingFramework::Jul.logger_type()
        )
    }

    fn try_rewrite(&self, expr: &Expr, _context: &TransformationContext) -> TransformResult<Option<Replacement>> {
        let Expr::MethodCall { select, args, method_type: Some(method_type), .. } = expr else {
            return Ok(None);
        };
        let [level, message] = args.as_slice() else {
            return Ok(None);
        };
        let Some(method) = level_method(level) else {
            return Ok(None);
        };
        if !is_plain_message(message) {
            return Ok(None);
        }

        let Some(level_type) = LoggingFramework::Jul.level_type() else {
            return Ok(None);
        };
        let call = Expr::MethodCall {
            select: select.clone(),
            name: method.to_string(),
            args: vec![message.clone()],
            method_type: Some(MethodType {
                name: method.to_string(),
                ..method_type.clone()
            }),
        };
        Ok(Some(
            Replacement::new(call).with_effects(Effects::new().remove_import(level_type)),
        ))
    }
}

fn level_method(level: &Expr) -> Option<&'static str> {
    let level_type = LoggingFramework::Jul.level_type()?;
    let Expr::FieldAccess { target, name, ty } = level.unparenthesized() else {
        return None;
    };
    let is_level = matches!(target.as_ref(), Expr::TypeRef { fqn } if fqn == level_type)
        || ty.as_ref().is_some_and(|ty| ty.type_name() == level_type);
    if !is_level {
        return None;
    }
    LEVEL_METHODS
        .iter()
        .find(|(constant, _)| constant == name)
        .map(|(_, method)| *method)
}

/// A `String` or `Supplier<String>` message; anything else picks another overload.
fn is_plain_message(message: &Expr) -> bool {
    if matches!(message.unparenthesized(), Expr::Lambda { params, .. } if params.is_empty()) {
        return true;
    }
    message
        .static_type()
        .is_some_and(|ty| ty.is_string() || ty.type_name() == SUPPLIER)
}
