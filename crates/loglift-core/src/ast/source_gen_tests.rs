// Tests for source code generation

#[cfg(test)]
mod source_tests {
    use crate::ast::types::{self, MethodType};
    use crate::ast::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_string_literal_keeps_escapes() {
        let lit = Expr::string("use \\\"escape\\\" \\n");
        assert_eq!(lit.to_source(), "\"use \\\"escape\\\" \\n\"");
    }

    #[test]
    fn test_method_call_to_source() {
        let call = Expr::call(
            Expr::ident("logger", JavaType::class("org.slf4j.Logger")),
            "info",
            vec![Expr::string("Hello {}"), Expr::ident("name", JavaType::string())],
            MethodType::instance("org.slf4j.Logger", "info"),
        );
        assert_eq!(call.to_source(), "logger.info(\"Hello {}\", name)");
    }

    #[test]
    fn test_static_call_and_class_literal() {
        let call = Expr::static_call(
            "org.slf4j.LoggerFactory",
            "getLogger",
            vec![Expr::class_literal("com.example.Test")],
            JavaType::class("org.slf4j.Logger"),
        );
        assert_eq!(call.to_source(), "LoggerFactory.getLogger(Test.class)");
    }

    #[test]
    fn test_object_array_to_source() {
        let array = Expr::object_array(vec![
            Expr::ident("a", JavaType::string()),
            Expr::ident("b", JavaType::int()),
        ]);
        assert_eq!(array.to_source(), "new Object[]{a, b}");
    }

    #[test]
    fn test_class_kind_keywords() {
        let mut base = ClassDecl::new("com.example.Base");
        base.is_abstract = true;
        assert!(base.to_source().starts_with("abstract class Base {"));

        let mut api = ClassDecl::new("com.example.Api");
        api.kind = ClassKind::Interface;
        assert!(api.to_source().starts_with("interface Api {"));
    }

    #[test]
    fn test_compilation_unit_to_source() {
        let mut class = ClassDecl::new("com.example.Test");
        class.fields.push(FieldDecl {
            name: "logger".to_string(),
            ty: JavaType::class("org.slf4j.Logger"),
            modifiers: Modifiers::private_static_final(),
            initializer: Some(Expr::static_call(
                "org.slf4j.LoggerFactory",
                "getLogger",
                vec![Expr::class_literal("com.example.Test")],
                JavaType::class("org.slf4j.Logger"),
            )),
        });
        class.methods.push(MethodDecl {
            name: "run".to_string(),
            modifiers: Modifiers::default(),
            return_type: None,
            params: Vec::new(),
            body: vec![Statement::Try {
                body: Vec::new(),
                catches: vec![CatchClause {
                    param: "e".to_string(),
                    ty: JavaType::Class(types::exception()),
                    body: vec![Statement::Expr(Expr::call(
                        Expr::ident("e", JavaType::Class(types::exception())),
                        "printStackTrace",
                        Vec::new(),
                        MethodType::instance(types::THROWABLE, "printStackTrace"),
                    ))],
                }],
                finally: None,
            }],
        });

        let mut unit = CompilationUnit::new();
        unit.package = Some("com.example".to_string());
        unit.add_import("org.slf4j.Logger");
        unit.add_import("org.slf4j.LoggerFactory");
        unit.classes.push(class);

        let expected = "\
package com.example;

import org.slf4j.Logger;
import org.slf4j.LoggerFactory;

class Test {
    private static final Logger logger = LoggerFactory.getLogger(Test.class);

    void run() {
        try {
        } catch (Exception e) {
            e.printStackTrace();
        }
    }
}
";
        assert_eq!(unit.to_source(), expected);
    }
}
