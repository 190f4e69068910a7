/*!
# Migrate Framework

Moves a class from one logging framework to another: logger field types,
their factory initializers, logging calls and enablement checks on those
fields.

A logger field is migrated as a unit. Its type changes only when its
initializer is a known factory call and every use of it in the class is a
call this rule can carry over; otherwise the field and all of its calls are
left alone. Calls are then migrated once their receiver's field has the
target type. Calls carrying a `Marker` never migrate, since no other
framework has one.
*/

use tracing::debug;

use crate::ast::{ClassDecl, Expr, FieldDecl, JavaType, Statement};
use crate::callsite::{classify_call_with, classify_factory, classify_level_check, CallSiteRecord, ClassifyOptions, LevelCheck};
use crate::config::LogliftConfig;
use crate::emit::{emit_factory_call, emit_level_check, emit_log_call, Effects, Replacement};
use crate::framework::{LoggingFramework, SeverityPolicy};
use crate::tracer::patterns::{ExprPattern, PatternMatcher};
use crate::tracer::rules::{FieldReplacement, RewriteRule};
use crate::tracer::{TransformResult, TransformationContext};

use super::{classify_options, retype_receiver};

pub struct MigrateFramework {
    sources: Vec<LoggingFramework>,
    target: LoggingFramework,
    severity_policy: SeverityPolicy,
    options: ClassifyOptions,
}

/// A call on a logger that has a counterpart in the target framework.
enum Migration {
    Log(CallSiteRecord),
    Check(LevelCheck),
}

impl Migration {
    fn receiver(&self) -> Option<&Expr> {
        match self {
            Migration::Log(record) => record.receiver.as_ref(),
            Migration::Check(check) => Some(&check.receiver),
        }
    }
}

impl MigrateFramework {
    /// Migrate from every other framework to `target`.
    pub fn new(target: LoggingFramework) -> Self {
        Self {
            sources: LoggingFramework::ALL.into_iter().filter(|f| *f != target).collect(),
            target,
            severity_policy: SeverityPolicy::default(),
            options: ClassifyOptions::default(),
        }
    }

    pub fn from_config(config: &LogliftConfig) -> Self {
        Self {
            severity_policy: config.severity_policy.clone(),
            options: classify_options(config),
            ..Self::new(config.target)
        }
    }

    /// Only migrate from these frameworks.
    pub fn with_sources(mut self, sources: Vec<LoggingFramework>) -> Self {
        self.sources = sources;
        self
    }

    fn migrates(&self, framework: LoggingFramework) -> bool {
        framework != self.target && self.sources.contains(&framework)
    }

    fn plan(&self, expr: &Expr) -> Option<Migration> {
        if let Some(record) = classify_call_with(expr, &self.options) {
            let framework = record.source.framework()?;
            let receiver = record.receiver.as_ref()?;
            if !self.migrates(framework) || record.marker.is_some() {
                return None;
            }
            retype_receiver(receiver, self.target)?;
            return Some(Migration::Log(record));
        }
        let check = classify_level_check(expr)?;
        if !self.migrates(check.framework) {
            return None;
        }
        retype_receiver(&check.receiver, self.target)?;
        Some(Migration::Check(check))
    }

    fn emit(&self, migration: &Migration) -> Option<Replacement> {
        let receiver = retype_receiver(migration.receiver()?, self.target)?;
        let (replacement, framework, level_argument) = match migration {
            Migration::Log(record) => (
                emit_log_call(record, self.target, &self.severity_policy, receiver),
                record.source.framework()?,
                record.level_argument,
            ),
            Migration::Check(check) => (
                emit_level_check(check.severity, self.target, &self.severity_policy, receiver)?,
                check.framework,
                check.level_argument,
            ),
        };
        Some(match framework.level_type() {
            Some(level_type) if level_argument => replacement.with_effects(Effects::new().remove_import(level_type)),
            _ => replacement,
        })
    }

    fn migrate_call(&self, expr: &Expr, context: &TransformationContext) -> Option<Replacement> {
        let migration = self.plan(expr)?;
        let field = context.scope.field_for(migration.receiver()?)?;
        if field.ty.type_name() != self.target.logger_type() {
            return None;
        }
        self.emit(&migration)
    }

    /// Factory initializer rewritten for the target, with the source
    /// accessor's imports released.
    fn migrate_initializer(
        &self,
        initializer: &Expr,
        framework: LoggingFramework,
        owner: &str,
    ) -> Option<Replacement> {
        let factory = classify_factory(initializer)?;
        if factory.framework != framework {
            return None;
        }
        let removed = Effects::new()
            .remove_import(factory.method_type.declaring_type.clone())
            .remove_import(framework.factory_type());
        Some(emit_factory_call(self.target, &factory.key, owner).with_effects(removed))
    }
}

impl RewriteRule for MigrateFramework {
    fn name(&self) -> &'static str {
        "migrate"
    }

    fn description(&self) -> &'static str {
        "Migrates logger fields, factories and calls to the target logging framework"
    }

    fn priority(&self) -> u32 {
        200
    }

    fn matches(&self, expr: &Expr, _context: &TransformationContext) -> bool {
        PatternMatcher::typed_method_call().matches(expr)
    }

    fn try_rewrite(&self, expr: &Expr, context: &TransformationContext) -> TransformResult<Option<Replacement>> {
        Ok(self.migrate_call(expr, context))
    }

    fn rewrite_field(
        &self,
        field: &FieldDecl,
        class: &ClassDecl,
        context: &TransformationContext,
    ) -> TransformResult<Option<FieldReplacement>> {
        let Some(framework) = LoggingFramework::from_logger_type(&field.ty.type_name()) else {
            return Ok(None);
        };
        if !self.migrates(framework) {
            return Ok(None);
        }
        let Some(initializer) = field
            .initializer
            .as_ref()
            .and_then(|initializer| self.migrate_initializer(initializer, framework, &context.scope.fqn))
        else {
            debug!(field = %field.name, class = %class.fqn, "Logger field has no known factory initializer");
            return Ok(None);
        };
        let uses = FieldUses {
            rule: self,
            owner: &class.fqn,
            name: &field.name,
        };
        if !uses.all_migrate(class) {
            debug!(field = %field.name, class = %class.fqn, "Logger field has uses with no counterpart");
            return Ok(None);
        }

        let effects = initializer
            .effects
            .clone()
            .add_import(self.target.logger_type())
            .remove_import(framework.logger_type());
        Ok(Some(FieldReplacement {
            field: FieldDecl {
                ty: JavaType::class(self.target.logger_type()),
                initializer: Some(initializer.expr),
                ..field.clone()
            },
            effects,
        }))
    }
}

/// Walks a class checking that every reference to one logger field is the
/// receiver of a call that migrates.
struct FieldUses<'a> {
    rule: &'a MigrateFramework,
    /// Class declaring the field.
    owner: &'a str,
    name: &'a str,
}

impl FieldUses<'_> {
    fn all_migrate(&self, class: &ClassDecl) -> bool {
        self.class(class, false)
    }

    /// `shadowed` is set inside nested classes declaring a field of the same
    /// name, where only qualified references reach the logger.
    fn class(&self, class: &ClassDecl, shadowed: bool) -> bool {
        let declaring = class.fqn == self.owner;
        let fields_ok = class
            .fields
            .iter()
            .filter(|field| !(declaring && field.name == self.name))
            .all(|field| field.initializer.as_ref().map_or(true, |init| self.expr(init, shadowed)));
        let methods_ok = class.methods.iter().all(|method| {
            !method.params.iter().any(|param| param.name == self.name) && self.block(&method.body, shadowed)
        });
        let nested_ok = class.nested.iter().all(|nested| {
            let shadows = nested.fields.iter().any(|field| field.name == self.name);
            self.class(nested, shadowed || shadows)
        });
        fields_ok && methods_ok && nested_ok
    }

    fn block(&self, statements: &[Statement], shadowed: bool) -> bool {
        statements.iter().all(|statement| self.statement(statement, shadowed))
    }

    fn statement(&self, statement: &Statement, shadowed: bool) -> bool {
        match statement {
            Statement::Expr(expr) | Statement::Return(Some(expr)) => self.expr(expr, shadowed),
            Statement::Return(None) => true,
            Statement::Local { name, init, .. } => {
                (shadowed || name != self.name) && init.as_ref().map_or(true, |init| self.expr(init, shadowed))
            }
            Statement::Block(body) => self.block(body, shadowed),
            Statement::If { condition, then_branch, else_branch } => {
                self.expr(condition, shadowed)
                    && self.block(then_branch, shadowed)
                    && else_branch.as_ref().map_or(true, |branch| self.block(branch, shadowed))
            }
            Statement::Try { body, catches, finally } => {
                self.block(body, shadowed)
                    && catches
                        .iter()
                        .all(|catch| (shadowed || catch.param != self.name) && self.block(&catch.body, shadowed))
                    && finally.as_ref().map_or(true, |finally| self.block(finally, shadowed))
            }
        }
    }

    fn expr(&self, expr: &Expr, shadowed: bool) -> bool {
        if self.is_reference(expr, shadowed) {
            return false;
        }
        match expr {
            Expr::MethodCall { select: Some(select), args, .. } if self.is_reference(select, shadowed) => {
                self.rule.plan(expr).is_some() && args.iter().all(|arg| self.expr(arg, shadowed))
            }
            Expr::MethodCall { select, args, .. } => {
                select.as_ref().map_or(true, |select| self.expr(select, shadowed))
                    && args.iter().all(|arg| self.expr(arg, shadowed))
            }
            Expr::FieldAccess { target, .. } => self.expr(target, shadowed),
            Expr::Binary { left, right, .. } => self.expr(left, shadowed) && self.expr(right, shadowed),
            Expr::NewClass { args, .. } => args.iter().all(|arg| self.expr(arg, shadowed)),
            Expr::NewArray { elements, .. } => elements.iter().all(|element| self.expr(element, shadowed)),
            Expr::Lambda { params, body } => {
                (shadowed || !params.iter().any(|param| param == self.name)) && self.block(body, shadowed)
            }
            Expr::Parens(inner) => self.expr(inner, shadowed),
            Expr::Literal(_) | Expr::Identifier { .. } | Expr::TypeRef { .. } | Expr::ClassLiteral { .. } => true,
        }
    }

    fn is_reference(&self, expr: &Expr, shadowed: bool) -> bool {
        match expr.unparenthesized() {
            Expr::Identifier { name, .. } => !shadowed && name == self.name,
            Expr::FieldAccess { target, name, .. } => {
                name == self.name && matches!(target.as_ref(), Expr::TypeRef { fqn } if fqn == self.owner)
            }
            _ => false,
        }
    }
}
