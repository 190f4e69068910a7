// Expression classification for message operands.
// Total over every expression; anything without a resolved type is `Other`.

use crate::ast::types::THROWABLE;
use crate::ast::{BinaryOp, Expr, JavaType, Literal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprClass {
    Literal,
    Concatenation,
    /// `e.getMessage()` or `e.getLocalizedMessage()` on a throwable.
    ErrorAccessor,
    Throwable,
    Other,
}

const ERROR_ACCESSORS: &[&str] = &["getMessage", "getLocalizedMessage"];

pub fn classify(expr: &Expr) -> ExprClass {
    let expr = expr.unparenthesized();
    match expr {
        Expr::Literal(Literal::String(_)) => ExprClass::Literal,
        Expr::Binary { op: BinaryOp::Add, ty: Some(ty), .. } if ty.is_string() => ExprClass::Concatenation,
        _ if error_accessor_receiver(expr).is_some() => ExprClass::ErrorAccessor,
        _ => match expr.static_type() {
            Some(ty) if is_throwable(&ty) => ExprClass::Throwable,
            _ => ExprClass::Other,
        },
    }
}

pub fn is_throwable(ty: &JavaType) -> bool {
    ty.is_throwable()
}

pub fn is_string(ty: &JavaType) -> bool {
    ty.is_string()
}

/// Receiver of an error accessor call, e.g. `e` in `e.getMessage()`.
pub fn error_accessor_receiver(expr: &Expr) -> Option<&Expr> {
    match expr.unparenthesized() {
        Expr::MethodCall { select: Some(select), name, args, method_type } if args.is_empty() => {
            if !ERROR_ACCESSORS.contains(&name.as_str()) {
                return None;
            }
            let declared_on_throwable = method_type.as_ref().is_some_and(|m| m.declaring_type == THROWABLE);
            let receiver_is_throwable = select.static_type().is_some_and(|ty| is_throwable(&ty));
            (declared_on_throwable || receiver_is_throwable).then_some(select.as_ref())
        }
        _ => None,
    }
}
