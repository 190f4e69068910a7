// Source code generation from the tree.
// Renders Java-shaped source so rewritten units can be written back out and
// so tests can compare readable text instead of nested enums.

use super::*;

const INDENT: &str = "    ";

/// Trait for types that can generate their source code representation
pub trait ToSource {
    fn to_source(&self) -> String;
}

fn join_sources(items: &[Expr]) -> String {
    items
        .iter()
        .map(|item| item.to_source())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_modifiers(modifiers: &Modifiers) -> String {
    let mut parts = Vec::new();
    if let Some(keyword) = modifiers.visibility.keyword() {
        parts.push(keyword);
    }
    if modifiers.is_static {
        parts.push("static");
    }
    if modifiers.is_final {
        parts.push("final");
    }
    let mut result = parts.join(" ");
    if !result.is_empty() {
        result.push(' ');
    }
    result
}

impl ToSource for Literal {
    fn to_source(&self) -> String {
        match self {
            Literal::String(raw) => format!("\"{raw}\""),
            Literal::Char(raw) => format!("'{raw}'"),
            Literal::Number(raw) => raw.clone(),
            Literal::Boolean(b) => b.to_string(),
            Literal::Null => "null".to_string(),
        }
    }
}

impl ToSource for JavaType {
    fn to_source(&self) -> String {
        self.simple_name()
    }
}

impl ToSource for Expr {
    fn to_source(&self) -> String {
        match self {
            Expr::Literal(literal) => literal.to_source(),
            Expr::Identifier { name, .. } => name.clone(),
            Expr::TypeRef { fqn } => types::simple_name(fqn).to_string(),
            Expr::FieldAccess { target, name, .. } => format!("{}.{}", target.to_source(), name),
            Expr::MethodCall { select, name, args, .. } => match select {
                Some(select) => format!("{}.{}({})", select.to_source(), name, join_sources(args)),
                None => format!("{}({})", name, join_sources(args)),
            },
            Expr::Binary { op, left, right, .. } => {
                format!("{} {} {}", left.to_source(), op.symbol(), right.to_source())
            }
            Expr::NewClass { ty, args } => format!("new {}({})", ty.to_source(), join_sources(args)),
            Expr::NewArray { element, elements } => {
                format!("new {}[]{{{}}}", element.to_source(), join_sources(elements))
            }
            Expr::ClassLiteral { fqn } => format!("{}.class", types::simple_name(fqn)),
            Expr::Lambda { params, body } => {
                let head = match params.as_slice() {
                    [single] => single.clone(),
                    _ => format!("({})", params.join(", ")),
                };
                let stmts = body
                    .iter()
                    .map(|stmt| stmt.to_source())
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("{head} -> {{ {stmts} }}")
            }
            Expr::Parens(inner) => format!("({})", inner.to_source()),
        }
    }
}

fn write_block(stmts: &[Statement], depth: usize, out: &mut String) {
    for stmt in stmts {
        write_statement(stmt, depth, out);
    }
}

fn write_statement(stmt: &Statement, depth: usize, out: &mut String) {
    let pad = INDENT.repeat(depth);
    match stmt {
        Statement::Expr(expr) => {
            out.push_str(&format!("{pad}{};\n", expr.to_source()));
        }
        Statement::Local { name, ty, init } => match init {
            Some(init) => out.push_str(&format!("{pad}{} {} = {};\n", ty.to_source(), name, init.to_source())),
            None => out.push_str(&format!("{pad}{} {};\n", ty.to_source(), name)),
        },
        Statement::Block(inner) => {
            out.push_str(&format!("{pad}{{\n"));
            write_block(inner, depth + 1, out);
            out.push_str(&format!("{pad}}}\n"));
        }
        Statement::If { condition, then_branch, else_branch } => {
            out.push_str(&format!("{pad}if ({}) {{\n", condition.to_source()));
            write_block(then_branch, depth + 1, out);
            match else_branch {
                Some(else_branch) => {
                    out.push_str(&format!("{pad}}} else {{\n"));
                    write_block(else_branch, depth + 1, out);
                    out.push_str(&format!("{pad}}}\n"));
                }
                None => out.push_str(&format!("{pad}}}\n")),
            }
        }
        Statement::Try { body, catches, finally } => {
            out.push_str(&format!("{pad}try {{\n"));
            write_block(body, depth + 1, out);
            for catch in catches {
                out.push_str(&format!("{pad}}} catch ({} {}) {{\n", catch.ty.to_source(), catch.param));
                write_block(&catch.body, depth + 1, out);
            }
            if let Some(finally) = finally {
                out.push_str(&format!("{pad}}} finally {{\n"));
                write_block(finally, depth + 1, out);
            }
            out.push_str(&format!("{pad}}}\n"));
        }
        Statement::Return(expr) => match expr {
            Some(expr) => out.push_str(&format!("{pad}return {};\n", expr.to_source())),
            None => out.push_str(&format!("{pad}return;\n")),
        },
    }
}

impl ToSource for Statement {
    fn to_source(&self) -> String {
        let mut out = String::new();
        write_statement(self, 0, &mut out);
        // Single statements render inline, nested ones keep their newlines.
        out.trim_end().to_string()
    }
}

impl ToSource for FieldDecl {
    fn to_source(&self) -> String {
        match &self.initializer {
            Some(init) => format!(
                "{}{} {} = {};",
                format_modifiers(&self.modifiers),
                self.ty.to_source(),
                self.name,
                init.to_source()
            ),
            None => format!("{}{} {};", format_modifiers(&self.modifiers), self.ty.to_source(), self.name),
        }
    }
}

fn write_class(class: &ClassDecl, depth: usize, out: &mut String) {
    let pad = INDENT.repeat(depth);
    for annotation in &class.annotations {
        out.push_str(&format!("{pad}@{}\n", types::simple_name(annotation)));
    }
    let keyword = match (class.kind, class.is_abstract) {
        (ClassKind::Interface, _) => "interface",
        (ClassKind::Class, true) => "abstract class",
        (ClassKind::Class, false) => "class",
    };
    match &class.supertype {
        Some(supertype) if supertype.fqn != types::OBJECT => {
            out.push_str(&format!("{pad}{keyword} {} extends {} {{\n", class.name, supertype.simple_name()));
        }
        _ => out.push_str(&format!("{pad}{keyword} {} {{\n", class.name)),
    }

    let member_pad = INDENT.repeat(depth + 1);
    for field in &class.fields {
        out.push_str(&format!("{member_pad}{}\n", field.to_source()));
    }

    let mut first = class.fields.is_empty();
    for method in &class.methods {
        if !first {
            out.push('\n');
        }
        first = false;
        let params = method
            .params
            .iter()
            .map(|p| format!("{} {}", p.ty.to_source(), p.name))
            .collect::<Vec<_>>()
            .join(", ");
        let ret = method
            .return_type
            .as_ref()
            .map(|t| t.to_source())
            .unwrap_or_else(|| "void".to_string());
        out.push_str(&format!(
            "{member_pad}{}{} {}({}) {{\n",
            format_modifiers(&method.modifiers),
            ret,
            method.name,
            params
        ));
        write_block(&method.body, depth + 2, out);
        out.push_str(&format!("{member_pad}}}\n"));
    }

    for nested in &class.nested {
        if !first {
            out.push('\n');
        }
        first = false;
        write_class(nested, depth + 1, out);
    }
    out.push_str(&format!("{pad}}}\n"));
}

impl ToSource for ClassDecl {
    fn to_source(&self) -> String {
        let mut out = String::new();
        write_class(self, 0, &mut out);
        out
    }
}

impl ToSource for CompilationUnit {
    fn to_source(&self) -> String {
        let mut out = String::new();
        if let Some(package) = &self.package {
            out.push_str(&format!("package {package};\n\n"));
        }
        if !self.imports.is_empty() {
            for import in &self.imports {
                if import.is_static {
                    out.push_str(&format!("import static {};\n", import.type_name));
                } else {
                    out.push_str(&format!("import {};\n", import.type_name));
                }
            }
            out.push('\n');
        }
        for (i, class) in self.classes.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            write_class(class, 0, &mut out);
        }
        out
    }
}
