/*!
# Rewrite Engine

Rule-driven transformation of compilation units, run to a fixed point.

## Architecture

- `RewriteRule`: trait for expression, block and field rewrites
- `RewriteEngine`: applies rules bottom-up, cycle after cycle, until a
  cycle changes nothing
- `patterns`: expression matchers, including method patterns such as
  `org.slf4j.Logger info(..)`
- `logging_rules`: the logging normalization rules

## Example Usage

```rust,ignore
use loglift_core::tracer::RewriteEngine;
use loglift_core::LogliftConfig;

let mut engine = RewriteEngine::from_config(&LogliftConfig::default())?;
let outcome = engine.transform_unit(&unit)?;
println!("{}", outcome.unit.to_source());
```
*/

pub mod engine;
pub mod logging_rules;
pub mod patterns;
pub mod rules;

// Re-export main types
pub use engine::{RewriteEngine, RewriteOutcome, TransformationSummary};
pub use patterns::{ExprPattern, MethodMatcher, PatternMatcher};
pub use rules::{BlockReplacement, CompositeRule, FieldReplacement, RewriteRule, RuleStats};

use crate::logger_field::ClassScope;

// Common result type for transformations
pub type TransformResult<T> = anyhow::Result<T>;

#[derive(Debug, Clone)]
pub struct TransformationContext {
    pub source_file: Option<String>,
    /// Class the node being rewritten belongs to, including fields injected
    /// earlier in the same cycle.
    pub scope: ClassScope,
    pub current_depth: usize,
    pub max_depth: usize,
}

impl Default for TransformationContext {
    fn default() -> Self {
        Self {
            source_file: None,
            scope: ClassScope::default(),
            current_depth: 0,
            max_depth: 100,
        }
    }
}

impl TransformationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_file(mut self, file: String) -> Self {
        self.source_file = Some(file);
        self
    }

    pub fn with_scope(mut self, scope: ClassScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn descend(&self) -> Self {
        Self {
            source_file: self.source_file.clone(),
            scope: self.scope.clone(),
            current_depth: self.current_depth + 1,
            max_depth: self.max_depth,
        }
    }

    pub fn at_max_depth(&self) -> bool {
        self.current_depth >= self.max_depth
    }
}
