/*!
# Logger Named For Enclosing Class

Rekeys logger factory calls to the class they appear in, fixing loggers
copied from another class: inside `Orders`, `LoggerFactory.getLogger(Users.class)`
becomes `LoggerFactory.getLogger(Orders.class)`. The factory itself and the
form of the key (`X.class` or `X.class.getName()`) are kept.
*/

use crate::ast::Expr;
use crate::callsite::{classify_factory, FactoryKey};
use crate::emit::Replacement;
use crate::tracer::patterns::{ExprPattern, PatternMatcher};
use crate::tracer::rules::RewriteRule;
use crate::tracer::{TransformResult, TransformationContext};

pub struct LoggerNamedForEnclosingClass;

impl LoggerNamedForEnclosingClass {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoggerNamedForEnclosingClass {
    fn default() -> Self {
        Self::new()
    }
}

impl RewriteRule for LoggerNamedForEnclosingClass {
    fn name(&self) -> &'static str {
        "enclosing-class"
    }

    fn description(&self) -> &'static str {
        "Names loggers after the class that declares them"
    }

    fn matches(&self, expr: &Expr, context: &TransformationContext) -> bool {
        !context.scope.fqn.is_empty() && PatternMatcher::typed_method_call().matches(expr)
    }

    fn try_rewrite(&self, expr: &Expr, context: &TransformationContext) -> TransformResult<Option<Replacement>> {
        let Some(factory) = classify_factory(expr) else {
            return Ok(None);
        };
        let owner = &context.scope.fqn;
        let stale = match &factory.key {
            FactoryKey::Class(fqn) | FactoryKey::ClassName(fqn) => fqn != owner,
            FactoryKey::ClassExpr(_) => true,
            FactoryKey::Name(_) | FactoryKey::Caller => false,
        };
        if !stale {
            return Ok(None);
        }

        let Expr::MethodCall { select, name, args, method_type } = expr else {
            return Ok(None);
        };
        let key = match (&factory.key, args.first().map(Expr::unparenthesized)) {
            (FactoryKey::ClassName(_), Some(Expr::MethodCall { name, method_type, .. })) => Expr::MethodCall {
                select: Some(Box::new(Expr::class_literal(owner.as_str()))),
                name: name.clone(),
                args: Vec::new(),
                method_type: method_type.clone(),
            },
            // `X.class` and `getClass()` alike
            _ => Expr::class_literal(owner.as_str()),
        };
        Ok(Some(Replacement::new(Expr::MethodCall {
            select: select.clone(),
            name: name.clone(),
            args: vec![key],
            method_type: method_type.clone(),
        })))
    }
}
