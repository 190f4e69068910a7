/*!
# Print Stack Trace To Log

`e.printStackTrace()` becomes `logger.error("Exception", e)`, injecting a
logger field into the class when it has none.
*/

use crate::ast::Expr;
use crate::callsite::{classify_call, CallSource};
use crate::config::LogliftConfig;
use crate::emit::Replacement;
use crate::framework::{LoggingFramework, SeverityPolicy};
use crate::logger_field::LoggerPolicy;
use crate::tracer::rules::RewriteRule;
use crate::tracer::{TransformResult, TransformationContext};

use super::{log_through_scope, logger_policy};

pub struct PrintStackTraceToLog {
    target: LoggingFramework,
    logger_policy: LoggerPolicy,
    severity_policy: SeverityPolicy,
}

impl PrintStackTraceToLog {
    pub fn new(target: LoggingFramework) -> Self {
        Self {
            target,
            logger_policy: LoggerPolicy::default(),
            severity_policy: SeverityPolicy::default(),
        }
    }

    pub fn from_config(config: &LogliftConfig) -> Self {
        Self::new(config.target)
            .with_logger_policy(logger_policy(config))
            .with_severity_policy(config.severity_policy.clone())
    }

    pub fn with_logger_policy(mut self, policy: LoggerPolicy) -> Self {
        self.logger_policy = policy;
        self
    }

    pub fn with_severity_policy(mut self, policy: SeverityPolicy) -> Self {
        self.severity_policy = policy;
        self
    }
}

impl RewriteRule for PrintStackTraceToLog {
    fn name(&self) -> &'static str {
        "print-stack-trace"
    }

    fn description(&self) -> &'static str {
        "Logs exceptions at error level instead of printing their stack traces"
    }

    fn matches(&self, expr: &Expr, _context: &TransformationContext) -> bool {
        matches!(expr, Expr::MethodCall { name, method_type: Some(_), .. } if name == "printStackTrace")
    }

    fn try_rewrite(&self, expr: &Expr, context: &TransformationContext) -> TransformResult<Option<Replacement>> {
        let Some(record) = classify_call(expr) else {
            return Ok(None);
        };
        if record.source != CallSource::StackTrace {
            return Ok(None);
        }
        Ok(log_through_scope(
            &record,
            self.target,
            &self.logger_policy,
            &self.severity_policy,
            &context.scope,
        ))
    }
}
