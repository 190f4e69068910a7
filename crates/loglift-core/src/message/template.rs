// Template compilation.
//
// Templates are raw source text with anonymous `{}` placeholders. Escapes
// follow the runtime formatter: a single backslash before `{}` makes it
// literal text, two or more backslashes print one fewer backslash and leave
// the placeholder active.

use once_cell::sync::Lazy;
use regex::Regex;

use super::classify::{classify, error_accessor_receiver, is_throwable, ExprClass};
use super::flatten::flatten;
use super::{CanonicalMessage, Segment};
use crate::ast::Expr;

const PLACEHOLDER: &str = "{}";
const RAW_BACKSLASH: &str = "\\\\";

static INDEXED_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"''|'|\{(\d+)\}|\{").expect("indexed placeholder pattern must compile"));

/// How a framework spells a message that carries parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateStyle {
    /// `{}` placeholders (SLF4J, Log4j 2).
    Anonymous,
    /// `MessageFormat` `{0}` placeholders (java.util.logging).
    Indexed,
    /// No templates; messages are plain objects (Log4j 1, Commons Logging).
    Concatenation,
}

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// The call already carries this trailing error, so a throwable final
    /// segment stays a placeholder argument.
    pub explicit_error: Option<Expr>,
    /// Replace `e.getMessage()` segments with `e` when `e` is the trailing error.
    pub collapse_error_accessors: bool,
}

impl CompileOptions {
    pub fn with_explicit_error(mut self, error: Option<Expr>) -> Self {
        self.explicit_error = error;
        self
    }
}

/// A message pulled out of a call, plus whether the call already spells it
/// in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedMessage {
    pub message: CanonicalMessage,
    pub is_already_canonical: bool,
}

pub fn compile(segments: &[Segment]) -> CanonicalMessage {
    compile_with(segments, &CompileOptions::default())
}

pub fn compile_with(segments: &[Segment], options: &CompileOptions) -> CanonicalMessage {
    let mut segments = segments.to_vec();
    let mut trailing_error = options.explicit_error.clone();

    let ends_with_throwable = matches!(segments.last(), Some(Segment::Argument { is_throwable: true, .. }));
    if trailing_error.is_none() && ends_with_throwable {
        if let Some(Segment::Argument { expr, .. }) = segments.pop() {
            trailing_error = Some(expr);
        }
    }

    if options.collapse_error_accessors {
        if let Some(error) = &trailing_error {
            for segment in &mut segments {
                if let Segment::Argument { expr, is_throwable } = segment {
                    if error_accessor_receiver(expr) == Some(error) {
                        *expr = error.clone();
                        *is_throwable = true;
                    }
                }
            }
        }
    }

    let (template, arguments) = build_template(segments);
    CanonicalMessage {
        template,
        arguments,
        trailing_error,
    }
}

fn build_template(segments: Vec<Segment>) -> (String, Vec<Expr>) {
    let mut template = String::new();
    let mut arguments = Vec::new();
    for segment in segments {
        match segment {
            Segment::Literal(text) => template.push_str(&escape_literal(&text)),
            Segment::Argument { expr, .. } => {
                if backslash_run(&template) > 0 {
                    template.push_str(RAW_BACKSLASH);
                }
                template.push_str(PLACEHOLDER);
                arguments.push(expr);
            }
        }
    }
    (template, arguments)
}

/// Runtime backslashes at the end of `raw` (each written `\\` in source).
fn backslash_run(raw: &str) -> usize {
    raw.chars().rev().take_while(|c| *c == '\\').count() / 2
}

/// Escape `{}` markers in literal text so they print as written.
pub fn escape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last = 0;
    for (idx, _) in raw.match_indices(PLACEHOLDER) {
        out.push_str(&raw[last..idx]);
        if backslash_run(&out) == 0 {
            out.push_str(RAW_BACKSLASH);
        }
        out.push_str(PLACEHOLDER);
        last = idx + PLACEHOLDER.len();
    }
    out.push_str(&raw[last..]);
    out
}

/// Literal text can be carried into a template only when no `{}` in it
/// follows a backslash; the formatter has no spelling for that.
pub fn is_representable(raw: &str) -> bool {
    raw.match_indices(PLACEHOLDER)
        .all(|(idx, _)| backslash_run(&raw[..idx]) == 0)
}

pub fn placeholder_count(template: &str) -> usize {
    template
        .match_indices(PLACEHOLDER)
        .filter(|(idx, _)| backslash_run(&template[..*idx]) != 1)
        .count()
}

pub(crate) fn split_pieces(template: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut last = 0;
    for (idx, _) in template.match_indices(PLACEHOLDER) {
        current.push_str(&template[last..idx]);
        last = idx + PLACEHOLDER.len();
        let run = backslash_run(&current);
        if run > 0 {
            current.truncate(current.len() - RAW_BACKSLASH.len());
        }
        if run == 1 {
            current.push_str(PLACEHOLDER);
        } else {
            pieces.push(std::mem::take(&mut current));
        }
    }
    current.push_str(&template[last..]);
    pieces.push(current);
    pieces
}

/// Recognize a literal template that already lines up with the call's
/// remaining arguments.
pub fn detect_canonical(message: &Expr, trailing_args: &[Expr], style: TemplateStyle) -> Option<CanonicalMessage> {
    let raw = message.unparenthesized().as_string_literal()?;
    let last_is_throwable = trailing_args
        .last()
        .and_then(|arg| arg.static_type())
        .is_some_and(|ty| is_throwable(&ty));

    match style {
        TemplateStyle::Anonymous => {
            let count = placeholder_count(raw);
            // Plain messages are printed verbatim, so `{}` in them is text.
            let formatted = !(trailing_args.is_empty() || (trailing_args.len() == 1 && last_is_throwable));
            if !formatted {
                if !is_representable(raw) {
                    return None;
                }
                let message = CanonicalMessage::new(escape_literal(raw), Vec::new());
                return Some(match trailing_args.first() {
                    Some(error) => message.with_error(error.clone()),
                    None => message,
                });
            }
            if last_is_throwable && count == trailing_args.len() - 1 {
                let (error, args) = trailing_args.split_last()?;
                Some(CanonicalMessage::new(raw, args.to_vec()).with_error(error.clone()))
            } else if count == trailing_args.len() {
                Some(CanonicalMessage::new(raw, trailing_args.to_vec()))
            } else {
                None
            }
        }
        TemplateStyle::Indexed => match trailing_args {
            [] => is_representable(raw).then(|| CanonicalMessage::new(escape_literal(raw), Vec::new())),
            [error] if last_is_throwable => is_representable(raw)
                .then(|| CanonicalMessage::new(escape_literal(raw), Vec::new()).with_error(error.clone())),
            [Expr::NewArray { elements, .. }] => indexed_to_anonymous(raw, elements),
            [param] => indexed_to_anonymous(raw, std::slice::from_ref(param)),
            _ => None,
        },
        TemplateStyle::Concatenation => match trailing_args {
            [] => is_representable(raw).then(|| CanonicalMessage::new(escape_literal(raw), Vec::new())),
            [error] if last_is_throwable => is_representable(raw)
                .then(|| CanonicalMessage::new(escape_literal(raw), Vec::new()).with_error(error.clone())),
            _ => None,
        },
    }
}

/// Pull the canonical message out of a call's message operand and the
/// arguments that follow it. `None` when the call cannot be normalized
/// without guessing.
pub fn extract_message(
    message: &Expr,
    trailing_args: &[Expr],
    style: TemplateStyle,
    options: &CompileOptions,
) -> Option<ExtractedMessage> {
    let class = classify(message);
    if class == ExprClass::Literal {
        return detect_canonical(message, trailing_args, style).map(|message| ExtractedMessage {
            message,
            is_already_canonical: true,
        });
    }

    // Non-literal templates cannot carry extra parameters.
    let explicit_error = match trailing_args {
        [] => None,
        [error] if error.static_type().is_some_and(|ty| is_throwable(&ty)) => Some(error.clone()),
        _ => return None,
    };
    message.static_type()?;

    let segments = flatten(message);
    let representable = segments.iter().all(|segment| match segment {
        Segment::Literal(text) => is_representable(text),
        Segment::Argument { expr, .. } => expr.static_type().is_some(),
    });
    if !representable {
        return None;
    }

    let had_error = explicit_error.is_some();
    let compiled = compile_with(
        &segments,
        &options.clone().with_explicit_error(explicit_error),
    );
    let moved_error = !had_error && compiled.trailing_error.is_some();
    Some(ExtractedMessage {
        message: compiled,
        is_already_canonical: class != ExprClass::Concatenation && !moved_error,
    })
}

/// Convert a `MessageFormat` pattern and its parameters into anonymous form.
///
/// Parameters are reordered to follow their placeholders. Declines on format
/// elements such as `{0,number}`, on parameters that are never referenced, and
/// on reordering or repeating parameters whose evaluation could be observed.
pub fn indexed_to_anonymous(raw: &str, params: &[Expr]) -> Option<CanonicalMessage> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut order = Vec::new();
    let mut quoted = false;
    let mut last = 0;

    for caps in INDEXED_TOKEN.captures_iter(raw) {
        let token = caps.get(0)?;
        text.push_str(&raw[last..token.start()]);
        last = token.end();
        match token.as_str() {
            "''" => text.push('\''),
            "'" => quoted = !quoted,
            _ if quoted => text.push_str(token.as_str()),
            _ => {
                let index: usize = caps.get(1)?.as_str().parse().ok()?;
                let param = params.get(index)?;
                if !text.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut text)));
                }
                segments.push(Segment::argument(param.clone()));
                order.push(index);
            }
        }
    }
    text.push_str(&raw[last..]);
    if !text.is_empty() {
        segments.push(Segment::Literal(text));
    }

    if (0..params.len()).any(|index| !order.contains(&index)) {
        return None;
    }
    let in_order = order.iter().copied().eq(0..params.len());
    if !in_order && !params.iter().all(is_pure) {
        return None;
    }
    let representable = segments.iter().all(|segment| match segment {
        Segment::Literal(text) => is_representable(text),
        Segment::Argument { .. } => true,
    });
    if !representable {
        return None;
    }

    let (template, arguments) = build_template(segments);
    Some(CanonicalMessage {
        template,
        arguments,
        trailing_error: None,
    })
}

/// Render a canonical template as a `MessageFormat` pattern with `{0}`, `{1}`, ...
pub fn anonymous_to_indexed(message: &CanonicalMessage) -> String {
    let mut out = String::new();
    for (index, piece) in message.pieces().iter().enumerate() {
        if index > 0 {
            out.push_str(&format!("{{{}}}", index - 1));
        }
        out.push_str(&piece.replace('\'', "''").replace('{', "'{'"));
    }
    out
}

/// Evaluating the expression twice, or out of order, is unobservable.
fn is_pure(expr: &Expr) -> bool {
    match expr.unparenthesized() {
        Expr::Literal(_) | Expr::Identifier { .. } | Expr::ClassLiteral { .. } | Expr::TypeRef { .. } => true,
        Expr::FieldAccess { target, .. } => is_pure(target),
        _ => false,
    }
}

/// Render a canonical message back into a string concatenation, for
/// frameworks without templates.
pub fn to_concatenation(message: &CanonicalMessage) -> Expr {
    if let Some(only) = message.as_single_expr() {
        return only.clone();
    }

    let pieces = message.pieces();
    let mut operands = Vec::new();
    for (index, piece) in pieces.into_iter().enumerate() {
        if index > 0 {
            if let Some(arg) = message.arguments.get(index - 1) {
                operands.push(concat_operand(arg));
            }
        }
        if !piece.is_empty() {
            operands.push(Expr::string(piece));
        }
    }

    let starts_with_string = operands
        .first()
        .and_then(|first| first.static_type())
        .is_some_and(|ty| ty.is_string());
    if !starts_with_string && operands.len() > 1 {
        operands.insert(0, Expr::string(""));
    }
    Expr::concat_all(operands).unwrap_or_else(|| Expr::string(""))
}

fn concat_operand(arg: &Expr) -> Expr {
    match arg {
        Expr::Binary { .. } => Expr::Parens(Box::new(arg.clone())),
        _ => arg.clone(),
    }
}
