// Static type model attached to tree nodes.
// Types are resolved by the parser; the rewrite engine only reads them.

use serde::{Deserialize, Serialize};

pub const STRING: &str = "java.lang.String";
pub const OBJECT: &str = "java.lang.Object";
pub const THROWABLE: &str = "java.lang.Throwable";
pub const EXCEPTION: &str = "java.lang.Exception";
pub const RUNTIME_EXCEPTION: &str = "java.lang.RuntimeException";
pub const CLASS: &str = "java.lang.Class";
pub const SYSTEM: &str = "java.lang.System";
pub const PRINT_STREAM: &str = "java.io.PrintStream";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    Null,
    Void,
}

impl Primitive {
    pub fn keyword(&self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::String => "String",
            Primitive::Null => "null",
            Primitive::Void => "void",
        }
    }
}

/// Visibility of a member, used when deciding whether a field is inherited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    #[default]
    Package,
    Private,
}

impl Visibility {
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Visibility::Public => Some("public"),
            Visibility::Protected => Some("protected"),
            Visibility::Package => None,
            Visibility::Private => Some("private"),
        }
    }
}

/// A field as seen through a class type (declared in source or on the classpath).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldType {
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
}

/// A class type with enough of its hierarchy to answer assignability and
/// inherited-field questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassType {
    pub fqn: String,
    #[serde(default)]
    pub supertype: Option<Box<ClassType>>,
    #[serde(default)]
    pub fields: Vec<FieldType>,
}

impl ClassType {
    pub fn new(fqn: impl Into<String>) -> Self {
        Self {
            fqn: fqn.into(),
            supertype: None,
            fields: Vec::new(),
        }
    }

    pub fn extending(mut self, supertype: ClassType) -> Self {
        self.supertype = Some(Box::new(supertype));
        self
    }

    pub fn with_field(mut self, field: FieldType) -> Self {
        self.fields.push(field);
        self
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.fqn)
    }

    /// Iterate this type and then each ancestor, nearest first.
    pub fn ancestry(&self) -> Ancestry<'_> {
        Ancestry { next: Some(self) }
    }

    pub fn is_assignable_to(&self, fqn: &str) -> bool {
        self.ancestry().any(|t| t.fqn == fqn)
    }
}

pub struct Ancestry<'a> {
    next: Option<&'a ClassType>,
}

impl<'a> Iterator for Ancestry<'a> {
    type Item = &'a ClassType;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.supertype.as_deref();
        Some(current)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JavaType {
    Primitive(Primitive),
    Class(ClassType),
    Array(Box<JavaType>),
}

impl JavaType {
    pub fn string() -> Self {
        JavaType::Primitive(Primitive::String)
    }

    pub fn int() -> Self {
        JavaType::Primitive(Primitive::Int)
    }

    pub fn class(fqn: impl Into<String>) -> Self {
        JavaType::Class(ClassType::new(fqn))
    }

    pub fn is_string(&self) -> bool {
        match self {
            JavaType::Primitive(Primitive::String) => true,
            JavaType::Class(class) => class.fqn == STRING,
            _ => false,
        }
    }

    pub fn is_assignable_to(&self, fqn: &str) -> bool {
        match self {
            JavaType::Class(class) => class.is_assignable_to(fqn),
            JavaType::Primitive(Primitive::String) => fqn == STRING || fqn == OBJECT,
            _ => false,
        }
    }

    pub fn is_throwable(&self) -> bool {
        self.is_assignable_to(THROWABLE)
    }

    /// Fully qualified name for class types, keyword for primitives.
    pub fn type_name(&self) -> String {
        match self {
            JavaType::Primitive(p) if *p == Primitive::String => STRING.to_string(),
            JavaType::Primitive(p) => p.keyword().to_string(),
            JavaType::Class(class) => class.fqn.clone(),
            JavaType::Array(inner) => format!("{}[]", inner.type_name()),
        }
    }

    /// Name as written in source, assuming the type is imported.
    pub fn simple_name(&self) -> String {
        match self {
            JavaType::Primitive(p) => p.keyword().to_string(),
            JavaType::Class(class) => class.simple_name().to_string(),
            JavaType::Array(inner) => format!("{}[]", inner.simple_name()),
        }
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            JavaType::Class(class) => Some(class),
            _ => None,
        }
    }
}

/// Resolved signature of a method invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodType {
    pub declaring_type: String,
    pub name: String,
    #[serde(default)]
    pub return_type: Option<JavaType>,
    #[serde(default)]
    pub is_static: bool,
}

impl MethodType {
    pub fn instance(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            return_type: Some(JavaType::Primitive(Primitive::Void)),
            is_static: false,
        }
    }

    pub fn static_method(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            is_static: true,
            ..Self::instance(declaring_type, name)
        }
    }

    pub fn returning(mut self, return_type: JavaType) -> Self {
        self.return_type = Some(return_type);
        self
    }
}

pub fn simple_name(fqn: &str) -> &str {
    fqn.rsplit('.').next().unwrap_or(fqn)
}

/// `java.lang.Throwable`
pub fn throwable() -> ClassType {
    ClassType::new(THROWABLE).extending(ClassType::new(OBJECT))
}

/// `java.lang.Exception`
pub fn exception() -> ClassType {
    ClassType::new(EXCEPTION).extending(throwable())
}

/// `java.lang.RuntimeException`
pub fn runtime_exception() -> ClassType {
    ClassType::new(RUNTIME_EXCEPTION).extending(exception())
}

/// A checked exception type extending `java.lang.Exception`.
pub fn checked_exception(fqn: impl Into<String>) -> JavaType {
    JavaType::Class(ClassType::new(fqn).extending(exception()))
}

/// An unchecked exception type extending `java.lang.RuntimeException`.
pub fn unchecked_exception(fqn: impl Into<String>) -> JavaType {
    JavaType::Class(ClassType::new(fqn).extending(runtime_exception()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_hierarchy_is_throwable() {
        let nfe = unchecked_exception("java.lang.NumberFormatException");
        assert!(nfe.is_throwable());
        assert!(nfe.is_assignable_to(EXCEPTION));
        assert!(!JavaType::string().is_throwable());
        assert!(!JavaType::class("java.util.List").is_throwable());
    }

    #[test]
    fn test_ancestry_nearest_first() {
        let ty = runtime_exception();
        let names: Vec<_> = ty.ancestry().map(|t| t.simple_name()).collect();
        assert_eq!(names, vec!["RuntimeException", "Exception", "Throwable", "Object"]);
    }

    #[test]
    fn test_string_type_names() {
        assert!(JavaType::class(STRING).is_string());
        assert_eq!(JavaType::string().type_name(), STRING);
        assert_eq!(JavaType::string().simple_name(), "String");
    }
}
