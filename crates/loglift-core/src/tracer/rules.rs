/*!
# Rewrite Rules

Core trait and utilities for defining rewrite rules.
*/

use crate::ast::{ClassDecl, Expr, FieldDecl, Statement};
use crate::emit::{Effects, Replacement};

use super::{TransformResult, TransformationContext};

/// Statements replacing a whole block, plus their unit-level effects.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockReplacement {
    pub statements: Vec<Statement>,
    pub effects: Effects,
}

/// A rewritten field declaration, plus its unit-level effects.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldReplacement {
    pub field: FieldDecl,
    pub effects: Effects,
}

/// Core trait for rewrite rules
///
/// Rules are pure: they look at a node and the enclosing class and describe
/// a replacement. The engine applies it. Returning `Ok(None)` declines.
pub trait RewriteRule: Send + Sync {
    /// Human-readable name for this rule
    fn name(&self) -> &'static str;

    /// Detailed description of what this rule does
    fn description(&self) -> &'static str;

    /// Priority for rule ordering (higher priority runs first)
    fn priority(&self) -> u32 {
        100
    }

    /// Cheap check whether `try_rewrite` could apply to the expression
    fn matches(&self, expr: &Expr, context: &TransformationContext) -> bool;

    /// Describe a replacement for the expression, or decline
    fn try_rewrite(&self, expr: &Expr, context: &TransformationContext) -> TransformResult<Option<Replacement>>;

    /// Rewrite a statement list as a whole, for patterns spanning statements
    fn rewrite_block(
        &self,
        block: &[Statement],
        context: &TransformationContext,
    ) -> TransformResult<Option<BlockReplacement>> {
        let _ = (block, context);
        Ok(None)
    }

    /// Rewrite a field declaration of `class`
    fn rewrite_field(
        &self,
        field: &FieldDecl,
        class: &ClassDecl,
        context: &TransformationContext,
    ) -> TransformResult<Option<FieldReplacement>> {
        let _ = (field, class, context);
        Ok(None)
    }
}

/// A composite rule that offers each node to its rules in order; the first
/// replacement wins.
pub struct CompositeRule {
    pub name: &'static str,
    pub description: &'static str,
    pub rules: Vec<Box<dyn RewriteRule>>,
}

impl CompositeRule {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            rules: Vec::new(),
        }
    }

    pub fn add_rule(mut self, rule: Box<dyn RewriteRule>) -> Self {
        self.rules.push(rule);
        self
    }
}

impl RewriteRule for CompositeRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn priority(&self) -> u32 {
        self.rules.iter().map(|rule| rule.priority()).max().unwrap_or(100)
    }

    fn matches(&self, expr: &Expr, context: &TransformationContext) -> bool {
        self.rules.iter().any(|rule| rule.matches(expr, context))
    }

    fn try_rewrite(&self, expr: &Expr, context: &TransformationContext) -> TransformResult<Option<Replacement>> {
        for rule in &self.rules {
            if rule.matches(expr, context) {
                if let Some(replacement) = rule.try_rewrite(expr, context)? {
                    return Ok(Some(replacement));
                }
            }
        }
        Ok(None)
    }

    fn rewrite_block(
        &self,
        block: &[Statement],
        context: &TransformationContext,
    ) -> TransformResult<Option<BlockReplacement>> {
        for rule in &self.rules {
            if let Some(replacement) = rule.rewrite_block(block, context)? {
                return Ok(Some(replacement));
            }
        }
        Ok(None)
    }

    fn rewrite_field(
        &self,
        field: &FieldDecl,
        class: &ClassDecl,
        context: &TransformationContext,
    ) -> TransformResult<Option<FieldReplacement>> {
        for rule in &self.rules {
            if let Some(replacement) = rule.rewrite_field(field, class, context)? {
                return Ok(Some(replacement));
            }
        }
        Ok(None)
    }
}

/// A rule built from a matcher function and a rewrite closure
#[cfg(test)]
pub(crate) struct TypedRule<F>
where
    F: Fn(&Expr, &TransformationContext) -> TransformResult<Option<Replacement>> + Send + Sync,
{
    name: &'static str,
    description: &'static str,
    matcher: fn(&Expr) -> bool,
    transformer: F,
}

#[cfg(test)]
impl<F> TypedRule<F>
where
    F: Fn(&Expr, &TransformationContext) -> TransformResult<Option<Replacement>> + Send + Sync,
{
    pub(crate) fn new(name: &'static str, description: &'static str, matcher: fn(&Expr) -> bool, transformer: F) -> Self {
        Self {
            name,
            description,
            matcher,
            transformer,
        }
    }
}

#[cfg(test)]
impl<F> RewriteRule for TypedRule<F>
where
    F: Fn(&Expr, &TransformationContext) -> TransformResult<Option<Replacement>> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn matches(&self, expr: &Expr, _context: &TransformationContext) -> bool {
        (self.matcher)(expr)
    }

    fn try_rewrite(&self, expr: &Expr, context: &TransformationContext) -> TransformResult<Option<Replacement>> {
        (self.transformer)(expr, context)
    }
}

/// Rule execution statistics
#[derive(Debug, Default, Clone)]
pub struct RuleStats {
    pub rule_name: String,
    pub applications: u64,
    pub transformations: u64,
    pub errors: u64,
    pub total_time_us: u64,
}

impl RuleStats {
    pub fn new(rule_name: String) -> Self {
        Self {
            rule_name,
            ..Self::default()
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.applications == 0 {
            0.0
        } else {
            (self.transformations as f64) / (self.applications as f64)
        }
    }

    pub fn average_time_us(&self) -> f64 {
        if self.applications == 0 {
            0.0
        } else {
            (self.total_time_us as f64) / (self.applications as f64)
        }
    }
}
