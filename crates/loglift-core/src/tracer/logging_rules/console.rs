/*!
# Console To Log

`System.out.println(..)` and `System.err.println(..)` become leveled log
calls. A `System.err` write immediately followed by `e.printStackTrace()`
is merged into a single error call carrying `e`.
*/

use crate::ast::{Expr, Statement};
use crate::callsite::{classify_call, classify_call_with, CallSiteRecord, CallSource, ClassifyOptions, ConsoleStream};
use crate::config::LogliftConfig;
use crate::emit::{Effects, Replacement};
use crate::framework::{LoggingFramework, SeverityPolicy};
use crate::logger_field::LoggerPolicy;
use crate::tracer::rules::{BlockReplacement, RewriteRule};
use crate::tracer::{TransformResult, TransformationContext};

use super::{classify_options, log_through_scope, logger_policy};

pub struct ConsoleToLog {
    target: LoggingFramework,
    logger_policy: LoggerPolicy,
    severity_policy: SeverityPolicy,
    options: ClassifyOptions,
}

impl ConsoleToLog {
    pub fn new(target: LoggingFramework) -> Self {
        Self {
            target,
            logger_policy: LoggerPolicy::default(),
            severity_policy: SeverityPolicy::default(),
            options: ClassifyOptions::default(),
        }
    }

    pub fn from_config(config: &LogliftConfig) -> Self {
        Self {
            logger_policy: logger_policy(config),
            severity_policy: config.severity_policy.clone(),
            options: classify_options(config),
            ..Self::new(config.target)
        }
    }

    fn console_record(&self, expr: &Expr) -> Option<CallSiteRecord> {
        classify_call_with(expr, &self.options).filter(|record| matches!(record.source, CallSource::Console(_)))
    }

    fn emit(&self, record: &CallSiteRecord, context: &TransformationContext) -> Option<Replacement> {
        log_through_scope(record, self.target, &self.logger_policy, &self.severity_policy, &context.scope)
    }

    /// `System.err.println(..)` followed by `e.printStackTrace()`, as one record.
    fn merged_record(&self, print: &Statement, stack_trace: &Statement) -> Option<CallSiteRecord> {
        let (Statement::Expr(print), Statement::Expr(stack_trace)) = (print, stack_trace) else {
            return None;
        };
        let mut record = self.console_record(print)?;
        if record.source != CallSource::Console(ConsoleStream::Err) {
            return None;
        }
        let trace = classify_call(stack_trace).filter(|trace| trace.source == CallSource::StackTrace)?;
        let error = trace.message.trailing_error?;
        match &record.message.trailing_error {
            None => record.message.trailing_error = Some(error),
            Some(existing) if *existing == error => {}
            Some(_) => return None,
        }
        Some(record)
    }
}

impl RewriteRule for ConsoleToLog {
    fn name(&self) -> &'static str {
        "console"
    }

    fn description(&self) -> &'static str {
        "Replaces System.out and System.err writes with log calls"
    }

    fn matches(&self, expr: &Expr, _context: &TransformationContext) -> bool {
        matches!(
            expr,
            Expr::MethodCall { name, method_type: Some(_), .. } if name == "println" || name == "print"
        )
    }

    fn try_rewrite(&self, expr: &Expr, context: &TransformationContext) -> TransformResult<Option<Replacement>> {
        Ok(self
            .console_record(expr)
            .and_then(|record| self.emit(&record, context)))
    }

    fn rewrite_block(
        &self,
        block: &[Statement],
        context: &TransformationContext,
    ) -> TransformResult<Option<BlockReplacement>> {
        let mut statements = Vec::with_capacity(block.len());
        let mut effects = Effects::new();
        let mut merged_any = false;
        let mut scope_context = context.clone();

        let mut index = 0;
        while index < block.len() {
            let merged = block
                .get(index + 1)
                .and_then(|next| self.merged_record(&block[index], next))
                .and_then(|record| self.emit(&record, &scope_context));
            match merged {
                Some(replacement) => {
                    // A field injected for the first merge serves the rest.
                    if let Some(spec) = &replacement.effects.add_field {
                        scope_context.scope.fields.push(spec.to_field_decl());
                    }
                    statements.push(Statement::Expr(replacement.expr));
                    effects.merge(replacement.effects);
                    merged_any = true;
                    index += 2;
                }
                None => {
                    statements.push(block[index].clone());
                    index += 1;
                }
            }
        }

        Ok(merged_any.then_some(BlockReplacement { statements, effects }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types;
    use crate::ast::{JavaType, ToSource};
    use crate::framework::Severity;
    use crate::tracer::logging_rules::test_support::{context, context_with_logger, error, print_stack_trace, println};
    use pretty_assertions::assert_eq;

    fn rewrite(rule: &ConsoleToLog, call: &Expr) -> Option<String> {
        rule.try_rewrite(call, &context_with_logger(LoggingFramework::Slf4j))
            .unwrap()
            .map(|replacement| replacement.expr.to_source())
    }

    #[test]
    fn test_out_and_err_levels() {
        let rule = ConsoleToLog::new(LoggingFramework::Slf4j);
        let name = Expr::ident("name", JavaType::string());
        let out = println("out", Expr::concat(Expr::string("Hello "), name));
        assert_eq!(rewrite(&rule, &out).unwrap(), "logger.info(\"Hello {}\", name)");

        let err = println("err", Expr::string("boom"));
        assert_eq!(rewrite(&rule, &err).unwrap(), "logger.error(\"boom\")");

        let debug = ConsoleToLog::from_config(&LogliftConfig {
            console_severity: Severity::Debug,
            ..LogliftConfig::default()
        });
        assert_eq!(
            rewrite(&debug, &println("out", Expr::string("x"))).unwrap(),
            "logger.debug(\"x\")"
        );
    }

    #[test]
    fn test_non_string_argument() {
        let rule = ConsoleToLog::new(LoggingFramework::Slf4j);
        let count = Expr::ident("count", JavaType::int());
        assert_eq!(rewrite(&rule, &println("out", count)).unwrap(), "logger.info(\"{}\", count)");
    }

    #[test]
    fn test_println_then_print_stack_trace_merge() {
        let rule = ConsoleToLog::new(LoggingFramework::Slf4j);
        let keep = Statement::Return(None);
        let block = vec![
            Statement::Expr(println("err", Expr::string("could not save"))),
            Statement::Expr(print_stack_trace(error())),
            keep.clone(),
        ];

        let replacement = rule.rewrite_block(&block, &context()).unwrap().unwrap();
        assert_eq!(replacement.statements.len(), 2);
        assert_eq!(
            replacement.statements[0].to_source(),
            "logger.error(\"could not save\", e);"
        );
        assert_eq!(replacement.statements[1], keep);
        assert!(replacement.effects.add_field.is_some());
    }

    #[test]
    fn test_no_merge_for_different_error_or_stdout() {
        let rule = ConsoleToLog::new(LoggingFramework::Slf4j);
        let other = Expr::ident("other", JavaType::Class(types::exception()));
        let block = vec![
            Statement::Expr(println("err", Expr::concat(Expr::string("failed: "), other))),
            Statement::Expr(print_stack_trace(error())),
            Statement::Expr(println("out", Expr::string("done"))),
            Statement::Expr(print_stack_trace(error())),
        ];
        assert!(rule.rewrite_block(&block, &context()).unwrap().is_none());
    }
}
