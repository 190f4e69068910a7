/*!
# Logger Field Resolution

Finds the logger a rewritten call should use, or describes the field to
inject when the enclosing class has none.
*/

use crate::ast::types::Visibility;
use crate::ast::{ClassDecl, ClassType, Expr, FieldDecl, JavaType, Modifiers};
use crate::callsite::FactoryKey;
use crate::emit::factory_call;
use crate::framework::LoggingFramework;

/// Field name Lombok's logging annotations generate.
pub const LOMBOK_FIELD: &str = "log";

/// What the resolver needs to know about the enclosing class.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassScope {
    pub name: String,
    pub fqn: String,
    pub annotations: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub supertype: Option<ClassType>,
    /// Classes this one is nested in, innermost first.
    pub enclosing: Vec<ClassScope>,
}

impl ClassScope {
    pub fn of(class: &ClassDecl) -> Self {
        Self {
            name: class.name.clone(),
            fqn: class.fqn.clone(),
            annotations: class.annotations.clone(),
            fields: class.fields.clone(),
            supertype: class.supertype.clone(),
            enclosing: Vec::new(),
        }
    }

    /// Scope of `class`, declared directly inside this one.
    pub fn nested(&self, class: &ClassDecl) -> Self {
        let mut parent = self.clone();
        let mut enclosing = std::mem::take(&mut parent.enclosing);
        enclosing.insert(0, parent);
        Self {
            enclosing,
            ..Self::of(class)
        }
    }

    /// Field a logger receiver such as `logger` or `Outer.logger` refers to,
    /// looking outward through enclosing classes.
    pub fn field_for(&self, receiver: &Expr) -> Option<&FieldDecl> {
        let scopes = || std::iter::once(self).chain(&self.enclosing);
        match receiver.unparenthesized() {
            Expr::Identifier { name, .. } => {
                scopes().find_map(|scope| scope.fields.iter().find(|field| field.name == *name))
            }
            Expr::FieldAccess { target, name, .. } => match target.as_ref() {
                Expr::TypeRef { fqn } => scopes()
                    .find(|scope| scope.fqn == *fqn)
                    .and_then(|scope| scope.fields.iter().find(|field| field.name == *name)),
                _ => None,
            },
            _ => None,
        }
    }

    fn has_member_named(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.name == name) || self.inherited_field(|field| field.name == name).is_some()
    }

    /// First visible field up the ancestor chain matching `predicate`.
    fn inherited_field(&self, predicate: impl Fn(&crate::ast::FieldType) -> bool) -> Option<String> {
        self.supertype.as_ref()?.ancestry().find_map(|ancestor| {
            ancestor
                .fields
                .iter()
                .find(|field| field.visibility != Visibility::Private && predicate(field))
                .map(|field| field.name.clone())
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggerFieldSpec {
    pub owner_type: String,
    pub field_name: String,
    pub is_static: bool,
    pub is_final: bool,
    pub framework: LoggingFramework,
}

impl LoggerFieldSpec {
    pub fn new(owner_type: impl Into<String>, field_name: impl Into<String>, framework: LoggingFramework) -> Self {
        Self {
            owner_type: owner_type.into(),
            field_name: field_name.into(),
            is_static: true,
            is_final: true,
            framework,
        }
    }

    pub fn field_type(&self) -> JavaType {
        JavaType::class(self.framework.logger_type())
    }

    pub fn receiver(&self) -> Expr {
        Expr::ident(self.field_name.clone(), self.field_type())
    }

    /// `private static final Logger logger = LoggerFactory.getLogger(Owner.class);`
    pub fn to_field_decl(&self) -> FieldDecl {
        FieldDecl {
            name: self.field_name.clone(),
            ty: self.field_type(),
            modifiers: Modifiers {
                visibility: Visibility::Private,
                is_static: self.is_static,
                is_final: self.is_final,
            },
            initializer: Some(factory_call(
                self.framework,
                &FactoryKey::Class(self.owner_type.clone()),
                &self.owner_type,
            )),
        }
    }

    pub fn imports(&self) -> Vec<String> {
        let mut imports = vec![self.framework.logger_type().to_string()];
        let factory = self.framework.factory_type();
        if factory != self.framework.logger_type() {
            imports.push(factory.to_string());
        }
        imports
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedLogger {
    Existing { name: String, framework: LoggingFramework },
    Injected(LoggerFieldSpec),
}

impl ResolvedLogger {
    pub fn receiver(&self) -> Expr {
        match self {
            ResolvedLogger::Existing { name, framework } => {
                Expr::ident(name.clone(), JavaType::class(framework.logger_type()))
            }
            ResolvedLogger::Injected(spec) => spec.receiver(),
        }
    }

    pub fn field_to_add(&self) -> Option<&LoggerFieldSpec> {
        match self {
            ResolvedLogger::Injected(spec) => Some(spec),
            ResolvedLogger::Existing { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggerPolicy {
    pub field_name: String,
    pub add_if_missing: bool,
}

impl Default for LoggerPolicy {
    fn default() -> Self {
        Self {
            field_name: "logger".to_string(),
            add_if_missing: true,
        }
    }
}

/// Resolve the logger for `framework` inside `scope`.
///
/// Declared fields win over inherited ones, static over instance. A field
/// is only injected when nothing usable exists and its name is free.
pub fn resolve(scope: &ClassScope, framework: LoggingFramework, policy: &LoggerPolicy) -> Option<ResolvedLogger> {
    let logger_type = framework.logger_type();

    if scope.annotations.iter().any(|a| a == framework.lombok_annotation()) {
        return Some(ResolvedLogger::Existing {
            name: LOMBOK_FIELD.to_string(),
            framework,
        });
    }

    let mut declared: Vec<&FieldDecl> = scope
        .fields
        .iter()
        .filter(|field| field.ty.is_assignable_to(logger_type))
        .collect();
    declared.sort_by_key(|field| !field.modifiers.is_static);
    if let Some(field) = declared.first() {
        return Some(ResolvedLogger::Existing {
            name: field.name.clone(),
            framework,
        });
    }

    if let Some(name) = scope.inherited_field(|field| field.type_name == logger_type) {
        return Some(ResolvedLogger::Existing { name, framework });
    }

    if !policy.add_if_missing || scope.has_member_named(&policy.field_name) {
        return None;
    }
    Some(ResolvedLogger::Injected(LoggerFieldSpec::new(
        scope.fqn.clone(),
        policy.field_name.clone(),
        framework,
    )))
}
