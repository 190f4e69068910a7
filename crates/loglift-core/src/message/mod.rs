/*!
# Message Normalization

Turns the message argument of a logging call into a canonical
`(template, arguments, trailing error)` triple.

- `classify`: decides what kind of expression a message operand is
- `flatten`: walks string concatenation chains into ordered segments
- `template`: compiles segments into a template and recognizes calls that
  are already parameterized
*/

pub mod classify;
pub mod flatten;
pub mod template;

pub use classify::{classify, ExprClass};
pub use flatten::flatten;
pub use template::{compile, compile_with, detect_canonical, placeholder_count, CompileOptions, TemplateStyle};

use crate::ast::Expr;

/// One piece of a flattened message, in evaluation order.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Raw source text of one or more merged string literals.
    Literal(String),
    Argument { expr: Expr, is_throwable: bool },
}

impl Segment {
    pub fn argument(expr: Expr) -> Self {
        let is_throwable = matches!(classify(&expr), ExprClass::Throwable);
        Segment::Argument { expr, is_throwable }
    }
}

/// A message in canonical form.
///
/// `template` is raw source text using anonymous `{}` placeholders, and always
/// holds exactly `arguments.len()` unescaped placeholders. `trailing_error` is
/// never mirrored by a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalMessage {
    pub template: String,
    pub arguments: Vec<Expr>,
    pub trailing_error: Option<Expr>,
}

impl CanonicalMessage {
    pub fn new(template: impl Into<String>, arguments: Vec<Expr>) -> Self {
        Self {
            template: template.into(),
            arguments,
            trailing_error: None,
        }
    }

    pub fn with_error(mut self, error: Expr) -> Self {
        self.trailing_error = Some(error);
        self
    }

    /// The template split around its placeholders, with escapes removed.
    /// Always yields `arguments.len() + 1` pieces.
    pub fn pieces(&self) -> Vec<String> {
        template::split_pieces(&self.template)
    }

    /// The message is a lone expression with nothing around it.
    pub fn as_single_expr(&self) -> Option<&Expr> {
        match self.arguments.as_slice() {
            [only] if self.template == "{}" => Some(only),
            _ => None,
        }
    }
}
