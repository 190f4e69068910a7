/*!
# Loggers To Private

Logger fields of concrete classes are made `private`. Interface fields are
implicitly public and abstract classes usually share their logger with
subclasses, so both are left alone.
*/

use tracing::debug;

use crate::ast::types::Visibility;
use crate::ast::{ClassDecl, ClassKind, Expr, FieldDecl, Modifiers};
use crate::emit::{Effects, Replacement};
use crate::framework::LoggingFramework;
use crate::tracer::rules::{FieldReplacement, RewriteRule};
use crate::tracer::{TransformResult, TransformationContext};

pub struct LoggersToPrivate;

impl LoggersToPrivate {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoggersToPrivate {
    fn default() -> Self {
        Self::new()
    }
}

impl RewriteRule for LoggersToPrivate {
    fn name(&self) -> &'static str {
        "private-loggers"
    }

    fn description(&self) -> &'static str {
        "Declares logger fields private"
    }

    fn matches(&self, _expr: &Expr, _context: &TransformationContext) -> bool {
        false
    }

    fn try_rewrite(&self, _expr: &Expr, _context: &TransformationContext) -> TransformResult<Option<Replacement>> {
        Ok(None)
    }

    fn rewrite_field(
        &self,
        field: &FieldDecl,
        class: &ClassDecl,
        _context: &TransformationContext,
    ) -> TransformResult<Option<FieldReplacement>> {
        if field.modifiers.visibility == Visibility::Private
            || LoggingFramework::from_logger_type(&field.ty.type_name()).is_none()
        {
            return Ok(None);
        }
        if class.kind == ClassKind::Interface || class.is_abstract {
            debug!(class = %class.fqn, field = %field.name, "Logger visibility kept");
            return Ok(None);
        }
        Ok(Some(FieldReplacement {
            field: FieldDecl {
                modifiers: Modifiers {
                    visibility: Visibility::Private,
                    ..field.modifiers
                },
                ..field.clone()
            },
            effects: Effects::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{JavaType, ToSource};
    use crate::tracer::logging_rules::test_support::{context, logger_field};
    use pretty_assertions::assert_eq;

    fn public_logger(framework: LoggingFramework) -> FieldDecl {
        let mut field = logger_field(framework);
        field.modifiers.visibility = Visibility::Public;
        field
    }

    fn rewrite(field: &FieldDecl, class: &ClassDecl) -> Option<String> {
        LoggersToPrivate::new()
            .rewrite_field(field, class, &context())
            .unwrap()
            .map(|replacement| replacement.field.to_source())
    }

    #[test]
    fn test_logger_fields_become_private() {
        let class = ClassDecl::new("com.example.Test");
        assert_eq!(
            rewrite(&public_logger(LoggingFramework::Slf4j), &class).unwrap(),
            "private static final Logger logger;"
        );

        let mut package = logger_field(LoggingFramework::Jul);
        package.modifiers.visibility = Visibility::Package;
        assert!(rewrite(&package, &class).unwrap().starts_with("private static final Logger"));

        assert_eq!(rewrite(&logger_field(LoggingFramework::Slf4j), &class), None);
    }

    #[test]
    fn test_other_fields_untouched() {
        let name = FieldDecl {
            name: "name".to_string(),
            ty: JavaType::string(),
            modifiers: Modifiers::default(),
            initializer: None,
        };
        assert_eq!(rewrite(&name, &ClassDecl::new("com.example.Test")), None);
    }

    #[test]
    fn test_interfaces_and_abstract_classes_keep_visibility() {
        let mut interface = ClassDecl::new("com.example.Api");
        interface.kind = ClassKind::Interface;
        assert_eq!(rewrite(&public_logger(LoggingFramework::Slf4j), &interface), None);

        let mut base = ClassDecl::new("com.example.Base");
        base.is_abstract = true;
        assert_eq!(rewrite(&public_logger(LoggingFramework::Log4j2), &base), None);
    }
}
