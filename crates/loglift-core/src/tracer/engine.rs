/*!
# RewriteEngine - Fixed-Point Rewrite Driver

Applies rules to a compilation unit bottom-up, cycle after cycle, until a
cycle changes nothing. The unit handed in is never touched: work happens on
an owned copy that is only returned once it has converged.
*/

use std::collections::HashMap;
use std::time::Instant;

use anyhow::Context;
use tracing::{debug, trace, warn};

use crate::ast::{ClassDecl, CompilationUnit, Expr, Statement};
use crate::config::LogliftConfig;
use crate::emit::Effects;
use crate::error::LogliftError;
use crate::logger_field::{ClassScope, LoggerFieldSpec};

use super::logging_rules;
use super::rules::{RewriteRule, RuleStats};
use super::{TransformResult, TransformationContext};

/// Rule-driven rewrite engine for compilation units
pub struct RewriteEngine {
    rules: Vec<Box<dyn RewriteRule>>,
    stats: HashMap<String, RuleStats>,
    max_cycles: usize,
}

/// A converged unit and what it took to get there.
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    pub unit: CompilationUnit,
    pub summary: TransformationSummary,
}

impl RewriteEngine {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            stats: HashMap::new(),
            max_cycles: 10,
        }
    }

    /// Engine with the rules and cycle budget named by `config`
    pub fn from_config(config: &LogliftConfig) -> crate::Result<Self> {
        let mut engine = Self::new().max_cycles(config.max_cycles);
        for rule in logging_rules::build_rules(config)? {
            engine.add_rule(rule);
        }
        engine.sort_rules_by_priority();
        Ok(engine)
    }

    /// Set maximum number of rewrite cycles per unit
    pub fn max_cycles(mut self, max: usize) -> Self {
        self.max_cycles = max;
        self
    }

    /// Add a rewrite rule
    pub fn add_rule(&mut self, rule: Box<dyn RewriteRule>) {
        let rule_name = rule.name().to_string();
        self.stats.insert(rule_name.clone(), RuleStats::new(rule_name));
        self.rules.push(rule);
    }

    /// Sort rules by priority (higher priority first)
    pub fn sort_rules_by_priority(&mut self) {
        self.rules.sort_by_key(|rule| std::cmp::Reverse(rule.priority()));
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Rewrite `unit` until no rule changes it.
    ///
    /// Fails with [`LogliftError::NonConvergence`] when the unit is still
    /// changing after the cycle budget; nothing is partially applied.
    pub fn transform_unit(&mut self, unit: &CompilationUnit) -> TransformResult<RewriteOutcome> {
        let unit_name = unit_name(unit);
        let mut working = unit.clone();
        let mut summary = TransformationSummary::new();

        for cycle in 1..=self.max_cycles {
            let rewrites = self.run_cycle(&mut working)?;
            trace!(unit = %unit_name, cycle, rewrites, "Rewrite cycle finished");
            if rewrites == 0 {
                summary.cycles = cycle;
                if working != *unit {
                    summary.units_changed = 1;
                }
                return Ok(RewriteOutcome { unit: working, summary });
            }
            summary.rewrites += rewrites as u64;
        }

        warn!(unit = %unit_name, cycles = self.max_cycles, "Rewrite did not converge");
        Err(LogliftError::NonConvergence {
            unit: unit_name,
            cycles: self.max_cycles,
        }
        .into())
    }

    /// One bottom-up pass over every class in the unit.
    fn run_cycle(&mut self, unit: &mut CompilationUnit) -> TransformResult<usize> {
        let mut context = TransformationContext::new();
        if let Some(path) = &unit.source_path {
            context = context.with_source_file(path.clone());
        }

        let mut pass = Pass {
            rules: &self.rules,
            stats: &mut self.stats,
            effects: Effects::new(),
            rewrites: 0,
        };
        for class in &mut unit.classes {
            let scope = ClassScope::of(class);
            pass.rewrite_class(class, &context, scope)?;
        }

        let Pass { effects, rewrites, .. } = pass;
        for import in &effects.add_imports {
            unit.add_import(import);
        }
        for import in &effects.remove_imports {
            unit.remove_import_if_unused(import);
        }
        Ok(rewrites)
    }

    /// Get rewrite statistics
    pub fn stats(&self) -> &HashMap<String, RuleStats> {
        &self.stats
    }
}

impl Default for RewriteEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// State of one rewrite cycle.
struct Pass<'a> {
    rules: &'a [Box<dyn RewriteRule>],
    stats: &'a mut HashMap<String, RuleStats>,
    /// Unit-level effects collected from every replacement
    effects: Effects,
    rewrites: usize,
}

impl Pass<'_> {
    fn rewrite_class(
        &mut self,
        class: &mut ClassDecl,
        outer: &TransformationContext,
        scope: ClassScope,
    ) -> TransformResult<()> {
        let mut context = outer.descend().with_scope(scope);
        let mut injected: Vec<LoggerFieldSpec> = Vec::new();

        for index in 0..class.fields.len() {
            for rule in self.rules {
                let started = Instant::now();
                let replacement = rule
                    .rewrite_field(&class.fields[index], class, &context)
                    .with_context(|| format!("rule {} failed on field {}", rule.name(), class.fields[index].name))?;
                let stats = stats_for(self.stats, rule.as_ref());
                stats.total_time_us += started.elapsed().as_micros() as u64;
                if let Some(replacement) = replacement {
                    stats.applications += 1;
                    if replacement.field != class.fields[index] {
                        stats.transformations += 1;
                        debug!(
                            rule = rule.name(),
                            file = context.source_file.as_deref().unwrap_or("-"),
                            field = %replacement.field.name,
                            "Rewrote field"
                        );
                        class.fields[index] = replacement.field;
                        self.rewrites += 1;
                        self.effects.merge(replacement.effects);
                    }
                }
            }
        }
        context.scope.fields = class.fields.clone();

        for field in &mut class.fields {
            if let Some(initializer) = &mut field.initializer {
                self.rewrite_expr(initializer, &mut context, &mut injected)?;
            }
        }
        for method in &mut class.methods {
            self.rewrite_block(&mut method.body, &mut context, &mut injected)?;
        }
        for nested in &mut class.nested {
            let scope = context.scope.nested(nested);
            self.rewrite_class(nested, &context, scope)?;
        }

        // Injected fields go first, in the order they were requested.
        for spec in injected.iter().rev() {
            if !class.fields.iter().any(|field| field.name == spec.field_name) {
                class.fields.insert(0, spec.to_field_decl());
            }
        }
        Ok(())
    }

    fn rewrite_block(
        &mut self,
        block: &mut Vec<Statement>,
        context: &mut TransformationContext,
        injected: &mut Vec<LoggerFieldSpec>,
    ) -> TransformResult<()> {
        // Block rules see statements before expression rules rewrite them.
        for rule in self.rules {
            let started = Instant::now();
            let replacement = rule
                .rewrite_block(block, context)
                .with_context(|| format!("rule {} failed on a statement block", rule.name()))?;
            let stats = stats_for(self.stats, rule.as_ref());
            stats.total_time_us += started.elapsed().as_micros() as u64;
            if let Some(replacement) = replacement {
                stats.applications += 1;
                if replacement.statements != *block {
                    stats.transformations += 1;
                    debug!(
                        rule = rule.name(),
                        file = context.source_file.as_deref().unwrap_or("-"),
                        "Rewrote statements"
                    );
                    *block = replacement.statements;
                    self.rewrites += 1;
                    self.absorb(replacement.effects, context, injected);
                }
            }
        }

        for statement in block.iter_mut() {
            self.rewrite_statement(statement, context, injected)?;
        }
        Ok(())
    }

    fn rewrite_statement(
        &mut self,
        statement: &mut Statement,
        context: &mut TransformationContext,
        injected: &mut Vec<LoggerFieldSpec>,
    ) -> TransformResult<()> {
        match statement {
            Statement::Expr(expr) | Statement::Return(Some(expr)) => self.rewrite_expr(expr, context, injected),
            Statement::Local { init, .. } => match init {
                Some(expr) => self.rewrite_expr(expr, context, injected),
                None => Ok(()),
            },
            Statement::Block(statements) => self.rewrite_block(statements, context, injected),
            Statement::If { condition, then_branch, else_branch } => {
                self.rewrite_expr(condition, context, injected)?;
                self.rewrite_block(then_branch, context, injected)?;
                if let Some(else_branch) = else_branch {
                    self.rewrite_block(else_branch, context, injected)?;
                }
                Ok(())
            }
            Statement::Try { body, catches, finally } => {
                self.rewrite_block(body, context, injected)?;
                for catch in catches {
                    self.rewrite_block(&mut catch.body, context, injected)?;
                }
                if let Some(finally) = finally {
                    self.rewrite_block(finally, context, injected)?;
                }
                Ok(())
            }
            Statement::Return(None) => Ok(()),
        }
    }

    /// Children first, then every rule against the node itself.
    fn rewrite_expr(
        &mut self,
        expr: &mut Expr,
        context: &mut TransformationContext,
        injected: &mut Vec<LoggerFieldSpec>,
    ) -> TransformResult<()> {
        if context.at_max_depth() {
            return Ok(());
        }

        context.current_depth += 1;
        let children = self.rewrite_children(expr, context, injected);
        context.current_depth -= 1;
        children?;

        for rule in self.rules {
            if !rule.matches(expr, context) {
                continue;
            }
            let started = Instant::now();
            let result = rule.try_rewrite(expr, context);
            let stats = stats_for(self.stats, rule.as_ref());
            stats.applications += 1;
            stats.total_time_us += started.elapsed().as_micros() as u64;

            match result {
                Ok(Some(replacement)) if replacement.expr != *expr => {
                    stats.transformations += 1;
                    debug!(
                        rule = rule.name(),
                        file = context.source_file.as_deref().unwrap_or("-"),
                        class = %context.scope.fqn,
                        "Rewrote expression"
                    );
                    *expr = replacement.expr;
                    self.rewrites += 1;
                    self.absorb(replacement.effects, context, injected);
                }
                Ok(_) => {}
                Err(error) => {
                    stats.errors += 1;
                    return Err(error.context(format!("rule {} failed in {}", rule.name(), context.scope.fqn)));
                }
            }
        }
        Ok(())
    }

    fn rewrite_children(
        &mut self,
        expr: &mut Expr,
        context: &mut TransformationContext,
        injected: &mut Vec<LoggerFieldSpec>,
    ) -> TransformResult<()> {
        match expr {
            Expr::FieldAccess { target, .. } => self.rewrite_expr(target, context, injected),
            Expr::MethodCall { select, args, .. } => {
                if let Some(select) = select {
                    self.rewrite_expr(select, context, injected)?;
                }
                for arg in args {
                    self.rewrite_expr(arg, context, injected)?;
                }
                Ok(())
            }
            Expr::Binary { left, right, .. } => {
                self.rewrite_expr(left, context, injected)?;
                self.rewrite_expr(right, context, injected)
            }
            Expr::NewClass { args, .. } => {
                for arg in args {
                    self.rewrite_expr(arg, context, injected)?;
                }
                Ok(())
            }
            Expr::NewArray { elements, .. } => {
                for element in elements {
                    self.rewrite_expr(element, context, injected)?;
                }
                Ok(())
            }
            Expr::Lambda { body, .. } => self.rewrite_block(body, context, injected),
            Expr::Parens(inner) => self.rewrite_expr(inner, context, injected),
            Expr::Literal(_) | Expr::Identifier { .. } | Expr::TypeRef { .. } | Expr::ClassLiteral { .. } => Ok(()),
        }
    }

    /// Fold a replacement's effects into the cycle. An injected field is
    /// visible to later rewrites in the same class straight away, so the
    /// class gets one field however many calls need it.
    fn absorb(&mut self, mut effects: Effects, context: &mut TransformationContext, injected: &mut Vec<LoggerFieldSpec>) {
        if let Some(spec) = effects.add_field.take() {
            if !context.scope.fields.iter().any(|field| field.name == spec.field_name) {
                context.scope.fields.insert(0, spec.to_field_decl());
                injected.push(spec);
            }
        }
        self.effects.merge(effects);
    }
}

fn stats_for<'s>(stats: &'s mut HashMap<String, RuleStats>, rule: &dyn RewriteRule) -> &'s mut RuleStats {
    stats
        .entry(rule.name().to_string())
        .or_insert_with(|| RuleStats::new(rule.name().to_string()))
}

fn unit_name(unit: &CompilationUnit) -> String {
    if let Some(path) = &unit.source_path {
        return path.clone();
    }
    unit.classes
        .first()
        .map(|class| class.fqn.clone())
        .unwrap_or_else(|| "<unnamed>".to_string())
}

/// Summary of rewrite results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformationSummary {
    pub units_changed: u64,
    pub rewrites: u64,
    /// Cycles run, including the final quiet one
    pub cycles: usize,
    pub errors: Vec<String>,
}

impl TransformationSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, other: TransformationSummary) {
        self.units_changed += other.units_changed;
        self.rewrites += other.rewrites;
        self.cycles = self.cycles.max(other.cycles);
        self.errors.extend(other.errors);
    }

    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{JavaType, MethodDecl, Modifiers};
    use crate::emit::Replacement;
    use crate::tracer::rules::TypedRule;

    fn unit_with(body: Vec<Statement>) -> CompilationUnit {
        let mut class = ClassDecl::new("com.example.Test");
        class.methods.push(MethodDecl {
            name: "run".to_string(),
            modifiers: Modifiers::default(),
            return_type: None,
            params: Vec::new(),
            body,
        });
        let mut unit = CompilationUnit::new();
        unit.package = Some("com.example".to_string());
        unit.classes.push(class);
        unit
    }

    fn flip(from: &'static str, to: &'static str) -> impl RewriteRule {
        TypedRule::new(
            "flip",
            "Renames one identifier",
            |expr| matches!(expr, Expr::Identifier { .. }),
            move |expr, _context| {
                Ok(match expr {
                    Expr::Identifier { name, ty } if name == from => Some(Replacement::new(Expr::Identifier {
                        name: to.to_string(),
                        ty: ty.clone(),
                    })),
                    _ => None,
                })
            },
        )
    }

    #[test]
    fn test_converges_and_counts_cycles() {
        let mut engine = RewriteEngine::new();
        engine.add_rule(Box::new(flip("a", "b")));
        let unit = unit_with(vec![Statement::Expr(Expr::ident("a", JavaType::int()))]);

        let outcome = engine.transform_unit(&unit).unwrap();
        assert_eq!(outcome.summary.rewrites, 1);
        assert_eq!(outcome.summary.cycles, 2);
        assert_eq!(outcome.summary.units_changed, 1);
        assert_eq!(engine.stats()["flip"].transformations, 1);

        let again = engine.transform_unit(&outcome.unit).unwrap();
        assert_eq!(again.unit, outcome.unit);
        assert_eq!(again.summary.rewrites, 0);
    }

    #[test]
    fn test_oscillating_rules_do_not_converge() {
        let mut engine = RewriteEngine::new().max_cycles(4);
        engine.add_rule(Box::new(flip("a", "b")));
        engine.add_rule(Box::new(TypedRule::new(
            "flop",
            "Renames it back",
            |expr| matches!(expr, Expr::Identifier { .. }),
            |expr, _context| {
                Ok(match expr {
                    Expr::Identifier { name, ty } if name == "b" => Some(Replacement::new(Expr::Identifier {
                        name: "a".to_string(),
                        ty: ty.clone(),
                    })),
                    _ => None,
                })
            },
        )));
        let unit = unit_with(vec![Statement::Expr(Expr::ident("a", JavaType::int()))]);

        let error = engine.transform_unit(&unit).unwrap_err();
        let error = error.downcast_ref::<LogliftError>().unwrap();
        assert!(matches!(error, LogliftError::NonConvergence { cycles: 4, .. }));
    }

    #[test]
    fn test_rule_errors_carry_context() {
        let mut engine = RewriteEngine::new();
        engine.add_rule(Box::new(TypedRule::new(
            "broken",
            "Always fails",
            |expr| matches!(expr, Expr::Identifier { .. }),
            |_expr, _context| Err(anyhow::anyhow!("boom")),
        )));
        let unit = unit_with(vec![Statement::Expr(Expr::ident("a", JavaType::int()))]);

        let error = engine.transform_unit(&unit).unwrap_err();
        assert!(format!("{error:#}").contains("rule broken failed"));
        assert_eq!(engine.stats()["broken"].errors, 1);
    }
}
