/*!
# Expression Pattern Matching

Matchers for expression nodes, used by rules to pre-filter the nodes they
look at. `MethodMatcher` reads method patterns in the usual
`<declaring type> <method>(<arguments>)` form:

- `org.slf4j.Logger info(..)`: `info` with any arguments
- `org.slf4j.Logger *(String)`: any method taking one `String`
- `java.util.logging.Logger log(*, String, ..)`: at least two arguments
*/

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::Expr;
use crate::error::{LogliftError, Result};

static METHOD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([\w.$*]+)\s+([\w$*]+)\s*\(([^)]*)\)\s*$").expect("method pattern syntax must compile")
});

/// Pattern matcher for expression nodes
pub trait ExprPattern {
    /// Check if this pattern matches the given expression
    fn matches(&self, expr: &Expr) -> bool;
}

/// Pattern matcher utility
pub struct PatternMatcher;

impl PatternMatcher {
    /// Match invocations with a type-attributed method
    pub fn typed_method_call() -> impl ExprPattern {
        NodeTypeMatcher {
            predicate: |expr: &Expr| matches!(expr, Expr::MethodCall { method_type: Some(_), .. }),
        }
    }
}

/// Generic node type matcher
struct NodeTypeMatcher<F>
where
    F: Fn(&Expr) -> bool,
{
    predicate: F,
}

impl<F> ExprPattern for NodeTypeMatcher<F>
where
    F: Fn(&Expr) -> bool,
{
    fn matches(&self, expr: &Expr) -> bool {
        (self.predicate)(expr)
    }
}

#[derive(Debug, Clone)]
enum ArgumentPattern {
    /// `*`
    AnyOne,
    /// `..`, zero or more
    Rest,
    /// Simple or fully qualified type name.
    Type(String),
}

/// Matches invocations by declaring type, method name and argument types.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    source: String,
    declaring_type: Regex,
    method_name: Regex,
    arguments: Vec<ArgumentPattern>,
}

impl MethodMatcher {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = || LogliftError::Config(format!("invalid method pattern {pattern:?}"));
        let captures = METHOD_PATTERN.captures(pattern).ok_or_else(invalid)?;

        let arguments = captures[3]
            .split(',')
            .map(str::trim)
            .filter(|arg| !arg.is_empty())
            .map(|arg| match arg {
                "*" => ArgumentPattern::AnyOne,
                ".." => ArgumentPattern::Rest,
                other => ArgumentPattern::Type(other.to_string()),
            })
            .collect();

        Ok(Self {
            source: pattern.trim().to_string(),
            declaring_type: glob(&captures[1]).map_err(|_| invalid())?,
            method_name: glob(&captures[2]).map_err(|_| invalid())?,
            arguments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn matches_declaring_type(&self, declaring_type: &str, receiver: Option<&Expr>) -> bool {
        if self.declaring_type.is_match(declaring_type) {
            return true;
        }
        // Calls declared on a subtype still match a pattern naming the supertype.
        receiver
            .and_then(|receiver| receiver.static_type())
            .and_then(|ty| ty.as_class().cloned())
            .is_some_and(|class| class.ancestry().any(|ancestor| self.declaring_type.is_match(&ancestor.fqn)))
    }

    fn matches_arguments(&self, args: &[Expr]) -> bool {
        matches_arguments(&self.arguments, args)
    }
}

impl ExprPattern for MethodMatcher {
    fn matches(&self, expr: &Expr) -> bool {
        let Expr::MethodCall { select, name, args, method_type: Some(method_type) } = expr else {
            return false;
        };
        self.method_name.is_match(name)
            && self.matches_declaring_type(&method_type.declaring_type, select.as_deref())
            && self.matches_arguments(args)
    }
}

fn matches_arguments(patterns: &[ArgumentPattern], args: &[Expr]) -> bool {
    match patterns.split_first() {
        None => args.is_empty(),
        Some((ArgumentPattern::Rest, rest)) => {
            (0..=args.len()).any(|skip| matches_arguments(rest, &args[skip..]))
        }
        Some((pattern, rest)) => match args.split_first() {
            None => false,
            Some((arg, remaining)) => matches_argument(pattern, arg) && matches_arguments(rest, remaining),
        },
    }
}

fn matches_argument(pattern: &ArgumentPattern, arg: &Expr) -> bool {
    match pattern {
        ArgumentPattern::AnyOne | ArgumentPattern::Rest => true,
        ArgumentPattern::Type(name) => arg.static_type().is_some_and(|ty| {
            if name.contains('.') {
                ty.type_name() == *name || ty.is_assignable_to(name)
            } else {
                ty.simple_name() == *name
            }
        }),
    }
}

/// Anchored regex for a `*` glob over a Java name.
fn glob(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"[\w.$]*");
    Regex::new(&format!("^{body}$"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{JavaType, MethodType};

    fn info_call(args: Vec<Expr>) -> Expr {
        Expr::call(
            Expr::ident("logger", JavaType::class("org.slf4j.Logger")),
            "info",
            args,
            MethodType::instance("org.slf4j.Logger", "info"),
        )
    }

    #[test]
    fn test_any_arguments() {
        let matcher = MethodMatcher::parse("org.slf4j.Logger info(..)").unwrap();
        assert!(matcher.matches(&info_call(Vec::new())));
        assert!(matcher.matches(&info_call(vec![Expr::string("a"), Expr::number("1")])));
        assert!(!MethodMatcher::parse("org.slf4j.Logger debug(..)").unwrap().matches(&info_call(Vec::new())));
    }

    #[test]
    fn test_argument_types_and_wildcards() {
        let matcher = MethodMatcher::parse("org.slf4j.* *(String, ..)").unwrap();
        assert!(matcher.matches(&info_call(vec![Expr::string("a")])));
        assert!(!matcher.matches(&info_call(vec![Expr::number("1")])));

        let exact = MethodMatcher::parse("org.slf4j.Logger info(*)").unwrap();
        assert!(exact.matches(&info_call(vec![Expr::number("1")])));
        assert!(!exact.matches(&info_call(vec![Expr::number("1"), Expr::number("2")])));
    }

    #[test]
    fn test_malformed_pattern_is_config_error() {
        assert!(matches!(MethodMatcher::parse("info"), Err(LogliftError::Config(_))));
    }

    #[test]
    fn test_typed_method_call() {
        assert!(PatternMatcher::typed_method_call().matches(&info_call(Vec::new())));
        assert!(!PatternMatcher::typed_method_call().matches(&Expr::string("info")));
        assert!(MethodMatcher::parse("*.Logger info()").unwrap().matches(&info_call(Vec::new())));
    }
}
