// Concatenation flattening.
// Walks a left-associative string `+` chain left operand first, so segments
// come out in evaluation order.

use super::classify::{classify, ExprClass};
use super::Segment;
use crate::ast::{BinaryOp, Expr};

pub fn flatten(expr: &Expr) -> Vec<Segment> {
    let mut segments = Vec::new();
    walk(expr, &mut segments);
    segments
}

fn walk(expr: &Expr, out: &mut Vec<Segment>) {
    match classify(expr) {
        ExprClass::Concatenation => {
            if let Expr::Binary { op: BinaryOp::Add, left, right, .. } = expr.unparenthesized() {
                walk(left, out);
                walk(right, out);
            }
        }
        ExprClass::Literal => {
            let text = expr.unparenthesized().as_string_literal().unwrap_or_default();
            push_literal(text, out);
        }
        _ => out.push(Segment::argument(expr.clone())),
    }
}

fn push_literal(text: &str, out: &mut Vec<Segment>) {
    if text.is_empty() {
        return;
    }
    match out.last_mut() {
        Some(Segment::Literal(previous)) => previous.push_str(text),
        _ => out.push(Segment::Literal(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::JavaType;

    fn lit(s: &str) -> Segment {
        Segment::Literal(s.to_string())
    }

    #[test]
    fn test_adjacent_literals_merge() {
        let x = Expr::ident("x", JavaType::int());
        let chain = Expr::concat_all(vec![Expr::string("a"), Expr::string("b"), x.clone()]).unwrap();
        assert_eq!(flatten(&chain), vec![lit("ab"), Segment::argument(x)]);
    }

    #[test]
    fn test_empty_literal_does_not_break_merge() {
        let chain = Expr::concat_all(vec![Expr::string("left"), Expr::string(""), Expr::string(" right")]).unwrap();
        assert_eq!(flatten(&chain), vec![lit("left right")]);
    }

    #[test]
    fn test_numeric_prefix_stays_one_argument() {
        let sum = Expr::Binary {
            op: BinaryOp::Add,
            left: Box::new(Expr::number("1")),
            right: Box::new(Expr::number("2")),
            ty: Some(JavaType::int()),
        };
        let chain = Expr::concat(sum.clone(), Expr::string("a"));
        assert_eq!(flatten(&chain), vec![Segment::argument(sum), lit("a")]);
    }

    #[test]
    fn test_parenthesized_concat_flattens_through() {
        let name = Expr::ident("name", JavaType::string());
        let inner = Expr::Parens(Box::new(Expr::concat(Expr::string("b"), name.clone())));
        let chain = Expr::concat(Expr::string("a"), inner);
        assert_eq!(flatten(&chain), vec![lit("ab"), Segment::argument(name)]);
    }
}
