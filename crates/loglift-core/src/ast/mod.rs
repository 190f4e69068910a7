// Typed source tree consumed by the rewrite engine.
// The tree is produced by an external Java parser; this crate only reads it
// and replaces subtrees.

pub mod source_gen;
pub mod types;

pub use source_gen::ToSource;
pub use types::{ClassType, FieldType, JavaType, MethodType, Primitive, Visibility};

#[cfg(test)]
mod source_gen_tests;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Literal values. String and char literals keep their raw source text
/// (without the surrounding quotes) so escape sequences survive untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    Char(String),
    Number(String),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),

    /// Variable, parameter or field reference.
    Identifier {
        name: String,
        #[serde(default)]
        ty: Option<JavaType>,
    },

    /// Reference to a type by name, e.g. the `LoggerFactory` in
    /// `LoggerFactory.getLogger(..)`.
    TypeRef { fqn: String },

    FieldAccess {
        target: Box<Expr>,
        name: String,
        #[serde(default)]
        ty: Option<JavaType>,
    },

    MethodCall {
        #[serde(default)]
        select: Option<Box<Expr>>,
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        method_type: Option<MethodType>,
    },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        #[serde(default)]
        ty: Option<JavaType>,
    },

    NewClass {
        ty: JavaType,
        #[serde(default)]
        args: Vec<Expr>,
    },

    NewArray {
        element: JavaType,
        #[serde(default)]
        elements: Vec<Expr>,
    },

    /// `Foo.class`
    ClassLiteral { fqn: String },

    Lambda {
        params: Vec<String>,
        body: Vec<Statement>,
    },

    Parens(Box<Expr>),
}

impl Expr {
    /// String literal from raw source text (escape sequences as written).
    pub fn string(raw: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(raw.into()))
    }

    pub fn number(raw: impl Into<String>) -> Self {
        Expr::Literal(Literal::Number(raw.into()))
    }

    pub fn ident(name: impl Into<String>, ty: JavaType) -> Self {
        Expr::Identifier {
            name: name.into(),
            ty: Some(ty),
        }
    }

    /// Identifier whose type the parser could not attribute.
    pub fn untyped_ident(name: impl Into<String>) -> Self {
        Expr::Identifier {
            name: name.into(),
            ty: None,
        }
    }

    pub fn type_ref(fqn: impl Into<String>) -> Self {
        Expr::TypeRef { fqn: fqn.into() }
    }

    pub fn field(target: Expr, name: impl Into<String>, ty: JavaType) -> Self {
        Expr::FieldAccess {
            target: Box::new(target),
            name: name.into(),
            ty: Some(ty),
        }
    }

    pub fn call(select: Expr, name: impl Into<String>, args: Vec<Expr>, method_type: MethodType) -> Self {
        Expr::MethodCall {
            select: Some(Box::new(select)),
            name: name.into(),
            args,
            method_type: Some(method_type),
        }
    }

    /// `Type.method(args)` for a static method declared on `fqn`.
    pub fn static_call(fqn: &str, name: &str, args: Vec<Expr>, return_type: JavaType) -> Self {
        Expr::call(
            Expr::type_ref(fqn),
            name,
            args,
            MethodType::static_method(fqn, name).returning(return_type),
        )
    }

    /// String concatenation `left + right`.
    pub fn concat(left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op: BinaryOp::Add,
            left: Box::new(left),
            right: Box::new(right),
            ty: Some(JavaType::string()),
        }
    }

    /// Left-associative concatenation of all operands.
    pub fn concat_all(operands: impl IntoIterator<Item = Expr>) -> Option<Self> {
        operands.into_iter().reduce(Expr::concat)
    }

    pub fn class_literal(fqn: impl Into<String>) -> Self {
        Expr::ClassLiteral { fqn: fqn.into() }
    }

    pub fn object_array(elements: Vec<Expr>) -> Self {
        Expr::NewArray {
            element: JavaType::class(types::OBJECT),
            elements,
        }
    }

    /// Static type of the expression, when it can be determined.
    pub fn static_type(&self) -> Option<JavaType> {
        match self {
            Expr::Literal(Literal::String(_)) => Some(JavaType::string()),
            Expr::Literal(Literal::Char(_)) => Some(JavaType::Primitive(Primitive::Char)),
            Expr::Literal(Literal::Number(raw)) => Some(JavaType::Primitive(number_type(raw))),
            Expr::Literal(Literal::Boolean(_)) => Some(JavaType::Primitive(Primitive::Boolean)),
            Expr::Literal(Literal::Null) => Some(JavaType::Primitive(Primitive::Null)),
            Expr::Identifier { ty, .. } | Expr::FieldAccess { ty, .. } | Expr::Binary { ty, .. } => ty.clone(),
            Expr::TypeRef { .. } | Expr::Lambda { .. } => None,
            Expr::MethodCall { method_type, .. } => method_type.as_ref().and_then(|m| m.return_type.clone()),
            Expr::NewClass { ty, .. } => Some(ty.clone()),
            Expr::NewArray { element, .. } => Some(JavaType::Array(Box::new(element.clone()))),
            Expr::ClassLiteral { .. } => Some(JavaType::class(types::CLASS)),
            Expr::Parens(inner) => inner.static_type(),
        }
    }

    pub fn as_string_literal(&self) -> Option<&str> {
        match self {
            Expr::Literal(Literal::String(raw)) => Some(raw),
            _ => None,
        }
    }

    /// Peel any number of enclosing parentheses.
    pub fn unparenthesized(&self) -> &Expr {
        match self {
            Expr::Parens(inner) => inner.unparenthesized(),
            other => other,
        }
    }

    pub fn method_type(&self) -> Option<&MethodType> {
        match self {
            Expr::MethodCall { method_type, .. } => method_type.as_ref(),
            _ => None,
        }
    }
}

fn number_type(raw: &str) -> Primitive {
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("0x") {
        if lower.ends_with('l') {
            Primitive::Long
        } else {
            Primitive::Int
        }
    } else if lower.ends_with('l') {
        Primitive::Long
    } else if lower.ends_with('f') {
        Primitive::Float
    } else if lower.ends_with('d') || lower.contains('.') || lower.contains('e') {
        Primitive::Double
    } else {
        Primitive::Int
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    pub param: String,
    pub ty: JavaType,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Expr(Expr),
    Local {
        name: String,
        ty: JavaType,
        #[serde(default)]
        init: Option<Expr>,
    },
    Block(Vec<Statement>),
    If {
        condition: Expr,
        then_branch: Vec<Statement>,
        #[serde(default)]
        else_branch: Option<Vec<Statement>>,
    },
    Try {
        body: Vec<Statement>,
        #[serde(default)]
        catches: Vec<CatchClause>,
        #[serde(default)]
        finally: Option<Vec<Statement>>,
    },
    Return(Option<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_final: bool,
}

impl Modifiers {
    pub fn private_static_final() -> Self {
        Self {
            visibility: Visibility::Private,
            is_static: true,
            is_final: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: JavaType,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: JavaType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub return_type: Option<JavaType>,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    pub fqn: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub supertype: Option<ClassType>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub nested: Vec<ClassDecl>,
}

impl ClassDecl {
    pub fn new(fqn: impl Into<String>) -> Self {
        let fqn = fqn.into();
        Self {
            name: types::simple_name(&fqn).to_string(),
            fqn,
            kind: ClassKind::Class,
            is_abstract: false,
            annotations: Vec::new(),
            supertype: None,
            fields: Vec::new(),
            methods: Vec::new(),
            nested: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Import {
    pub type_name: String,
    #[serde(default)]
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    #[serde(default)]
    pub source_path: Option<String>,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
}

impl CompilationUnit {
    pub fn new() -> Self {
        Self {
            source_path: None,
            package: None,
            imports: Vec::new(),
            classes: Vec::new(),
        }
    }

    pub fn has_import(&self, type_name: &str) -> bool {
        self.imports.iter().any(|i| !i.is_static && i.type_name == type_name)
    }

    /// Add a type import unless it is implicit or already present.
    pub fn add_import(&mut self, type_name: &str) -> bool {
        if is_implicitly_imported(type_name, self.package.as_deref()) || self.has_import(type_name) {
            return false;
        }
        self.imports.push(Import {
            type_name: type_name.to_string(),
            is_static: false,
        });
        true
    }

    /// Remove a type import when nothing in the unit refers to the type any more.
    pub fn remove_import_if_unused(&mut self, type_name: &str) -> bool {
        if !self.has_import(type_name) || self.referenced_types().contains(type_name) {
            return false;
        }
        self.imports.retain(|i| i.is_static || i.type_name != type_name);
        true
    }

    /// Every type named in source somewhere in the unit.
    pub fn referenced_types(&self) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        for class in &self.classes {
            collect_class_types(class, &mut found);
        }
        found
    }
}

impl Default for CompilationUnit {
    fn default() -> Self {
        Self::new()
    }
}

fn is_implicitly_imported(type_name: &str, package: Option<&str>) -> bool {
    let owner = type_name.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("");
    owner == "java.lang" || Some(owner) == package
}

fn collect_named_type(ty: &JavaType, found: &mut BTreeSet<String>) {
    match ty {
        JavaType::Class(class) => {
            found.insert(class.fqn.clone());
        }
        JavaType::Array(inner) => collect_named_type(inner, found),
        JavaType::Primitive(_) => {}
    }
}

fn collect_class_types(class: &ClassDecl, found: &mut BTreeSet<String>) {
    found.extend(class.annotations.iter().cloned());
    if let Some(supertype) = &class.supertype {
        found.insert(supertype.fqn.clone());
    }
    for field in &class.fields {
        collect_named_type(&field.ty, found);
        if let Some(init) = &field.initializer {
            collect_expr_types(init, found);
        }
    }
    for method in &class.methods {
        if let Some(ret) = &method.return_type {
            collect_named_type(ret, found);
        }
        for param in &method.params {
            collect_named_type(&param.ty, found);
        }
        collect_block_types(&method.body, found);
    }
    for nested in &class.nested {
        collect_class_types(nested, found);
    }
}

fn collect_block_types(stmts: &[Statement], found: &mut BTreeSet<String>) {
    for stmt in stmts {
        match stmt {
            Statement::Expr(expr) => collect_expr_types(expr, found),
            Statement::Local { ty, init, .. } => {
                collect_named_type(ty, found);
                if let Some(init) = init {
                    collect_expr_types(init, found);
                }
            }
            Statement::Block(inner) => collect_block_types(inner, found),
            Statement::If { condition, then_branch, else_branch } => {
                collect_expr_types(condition, found);
                collect_block_types(then_branch, found);
                if let Some(else_branch) = else_branch {
                    collect_block_types(else_branch, found);
                }
            }
            Statement::Try { body, catches, finally } => {
                collect_block_types(body, found);
                for catch in catches {
                    collect_named_type(&catch.ty, found);
                    collect_block_types(&catch.body, found);
                }
                if let Some(finally) = finally {
                    collect_block_types(finally, found);
                }
            }
            Statement::Return(expr) => {
                if let Some(expr) = expr {
                    collect_expr_types(expr, found);
                }
            }
        }
    }
}

fn collect_expr_types(expr: &Expr, found: &mut BTreeSet<String>) {
    match expr {
        Expr::TypeRef { fqn } | Expr::ClassLiteral { fqn } => {
            found.insert(fqn.clone());
        }
        Expr::FieldAccess { target, .. } => collect_expr_types(target, found),
        Expr::MethodCall { select, args, .. } => {
            if let Some(select) = select {
                collect_expr_types(select, found);
            }
            for arg in args {
                collect_expr_types(arg, found);
            }
        }
        Expr::Binary { left, right, .. } => {
            collect_expr_types(left, found);
            collect_expr_types(right, found);
        }
        Expr::NewClass { ty, args } => {
            collect_named_type(ty, found);
            for arg in args {
                collect_expr_types(arg, found);
            }
        }
        Expr::NewArray { element, elements } => {
            collect_named_type(element, found);
            for element in elements {
                collect_expr_types(element, found);
            }
        }
        Expr::Lambda { body, .. } => collect_block_types(body, found),
        Expr::Parens(inner) => collect_expr_types(inner, found),
        Expr::Literal(_) | Expr::Identifier { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_all_is_left_associative() {
        let chain = Expr::concat_all(vec![
            Expr::string("a"),
            Expr::ident("x", JavaType::string()),
            Expr::string("b"),
        ])
        .unwrap();
        match chain {
            Expr::Binary { left, right, .. } => {
                assert!(matches!(*left, Expr::Binary { .. }));
                assert_eq!(right.as_string_literal(), Some("b"));
            }
            other => panic!("Expected Binary, got {:?}", other),
        }
    }

    #[test]
    fn test_number_literal_types() {
        assert_eq!(Expr::number("1").static_type(), Some(JavaType::int()));
        assert_eq!(Expr::number("1L").static_type(), Some(JavaType::Primitive(Primitive::Long)));
        assert_eq!(Expr::number("1.5").static_type(), Some(JavaType::Primitive(Primitive::Double)));
    }

    #[test]
    fn test_import_bookkeeping() {
        let mut unit = CompilationUnit::new();
        assert!(unit.add_import("org.slf4j.Logger"));
        assert!(!unit.add_import("org.slf4j.Logger"));
        assert!(!unit.add_import("java.lang.String"));

        // Nothing references the logger, so the import can go.
        assert!(unit.remove_import_if_unused("org.slf4j.Logger"));
        assert!(unit.imports.is_empty());
    }

    #[test]
    fn test_referenced_import_is_kept() {
        let mut unit = CompilationUnit::new();
        unit.add_import("org.slf4j.Logger");
        let mut class = ClassDecl::new("com.example.Test");
        class.fields.push(FieldDecl {
            name: "logger".to_string(),
            ty: JavaType::class("org.slf4j.Logger"),
            modifiers: Modifiers::private_static_final(),
            initializer: None,
        });
        unit.classes.push(class);

        assert!(!unit.remove_import_if_unused("org.slf4j.Logger"));
        assert!(unit.has_import("org.slf4j.Logger"));
    }
}
