//! Expression and document-path grammar.
//!
//! The grammar is layered by operator precedence, loosest first: `OR`, `AND`,
//! `NOT`, the IS/IN/LIKE/BETWEEN/REGEXP suffixes, comparison, additive,
//! multiplicative, unary prefix, and finally primaries (literals,
//! parentheses, placeholders, function calls, identifiers). Each layer is a
//! method parsing one level and looping for left-associative chains; `NOT`
//! and the unary prefixes recurse for right association.
//!
//! The grammar commits at unambiguous points: after an infix operator, after
//! `IN`/`LIKE`/`BETWEEN`/`REGEXP`, and after the `(` of a function call.
//! Failures past a commit point surface directly instead of being masked by
//! a shallower alternative, so diagnostics point at the real problem.

use crate::ast::{Expr, Identifier, Placeholder, Scalar};
use crate::error::SyntaxError;
use crate::path::{DocumentPath, PathItem, is_reserved_word};
use crate::scan::{OrTry, ParseResult, Scan, many0, opt, sep_by1};

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Which identifier dialect the expression text uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Collection documents: identifiers are document paths.
    Document,
    /// Relational tables: identifiers are `[table.]column` references, with
    /// an optional `->'$...'` path into the column's document value.
    Table,
}

/// Parse `text` as a complete expression in the given mode.
///
/// The whole input must be consumed; trailing non-whitespace input is a
/// syntax error pointing at the first unconsumed character. Parsing holds no
/// state between calls.
///
/// # Errors
///
/// Returns [`SyntaxError`] carrying the furthest offset any alternative
/// reached and a description of the token expected there.
pub fn parse_expression(text: &str, mode: ParseMode) -> Result<Expr, SyntaxError> {
    let parser = ExprParser { mode };
    let (expr, rest) = parser.expr(Scan::new(text)).map_err(SyntaxError::from)?;
    ensure_consumed(rest)?;
    Ok(expr)
}

/// Parse `text` as a standalone document path, e.g. `$.items[0].name`.
///
/// The `$` root is optional and the empty path is valid: both address the
/// whole document. Whitespace is allowed around the path but never inside it.
///
/// # Errors
///
/// Returns [`SyntaxError`] if the text is not a valid path or leaves trailing
/// input.
pub fn parse_document_path(text: &str) -> Result<DocumentPath, SyntaxError> {
    let (path, rest) = document_path(Scan::new(text).skip_ws()).map_err(SyntaxError::from)?;
    ensure_consumed(rest)?;
    Ok(path)
}

fn ensure_consumed(scan: Scan<'_>) -> Result<(), SyntaxError> {
    let rest = scan.skip_ws();
    if rest.at_end() {
        Ok(())
    } else {
        Err(SyntaxError {
            offset: rest.offset(),
            expected: "end of input".to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Precedence chain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct ExprParser {
    mode: ParseMode,
}

impl ExprParser {
    fn expr<'a>(&self, scan: Scan<'a>) -> ParseResult<'a, Expr> {
        self.or_expr(scan)
    }

    fn or_expr<'a>(&self, scan: Scan<'a>) -> ParseResult<'a, Expr> {
        let (mut left, mut scan) = self.and_expr(scan)?;
        loop {
            let s = scan.skip_ws();
            let Ok(((), next)) = s.keyword("OR").or_try(s, |t| t.literal("||")) else {
                break;
            };
            let (right, next) = self.and_expr(next)?;
            left = op("OR", vec![left, right]);
            scan = next;
        }
        Ok((left, scan))
    }

    fn and_expr<'a>(&self, scan: Scan<'a>) -> ParseResult<'a, Expr> {
        let (mut left, mut scan) = self.not_expr(scan)?;
        loop {
            let s = scan.skip_ws();
            let Ok(((), next)) = s.keyword("AND").or_try(s, |t| t.literal("&&")) else {
                break;
            };
            let (right, next) = self.not_expr(next)?;
            left = op("AND", vec![left, right]);
            scan = next;
        }
        Ok((left, scan))
    }

    fn not_expr<'a>(&self, scan: Scan<'a>) -> ParseResult<'a, Expr> {
        let s = scan.skip_ws();
        if let Ok(((), next)) = s.keyword("NOT") {
            let (operand, next) = self.not_expr(next)?;
            return Ok((op("NOT", vec![operand]), next));
        }
        self.ilri_expr(scan)
    }

    /// The IS / IN / LIKE / BETWEEN / REGEXP suffix level, looped so chains
    /// like `a IS NOT NULL AND ...` associate left. Each suffix keyword commits
    /// its right-hand side.
    fn ilri_expr<'a>(&self, scan: Scan<'a>) -> ParseResult<'a, Expr> {
        let (mut left, mut scan) = self.comp_expr(scan)?;
        loop {
            let s = scan.skip_ws();

            if let Ok(((), next)) = s.keyword("IS") {
                let (negation, next) = opt(next, |t| t.skip_ws().keyword("NOT"));
                let (rhs, next) = self.is_operand(next)?;
                let name = if negation.is_some() { "IS_NOT" } else { "IS" };
                left = op(name, vec![left, rhs]);
                scan = next;
                continue;
            }

            let (negation, after_neg) = opt(s, |t| t.keyword("NOT"));
            let negated = negation.is_some();
            let t = after_neg.skip_ws();

            if let Ok(((), next)) = t.keyword("IN") {
                let (candidates, next) = self.in_candidates(next)?;
                let mut operands = vec![left];
                operands.extend(candidates);
                left = op(if negated { "NOT_IN" } else { "IN" }, operands);
                scan = next;
                continue;
            }
            if let Ok(((), next)) = t.keyword("LIKE") {
                let (pattern, mut next) = self.comp_expr(next)?;
                let mut operands = vec![left, pattern];
                if let Ok(((), after_escape)) = next.skip_ws().keyword("ESCAPE") {
                    let (escape, after) = self.comp_expr(after_escape)?;
                    operands.push(escape);
                    next = after;
                }
                left = op(if negated { "NOT_LIKE" } else { "LIKE" }, operands);
                scan = next;
                continue;
            }
            if let Ok(((), next)) = t.keyword("BETWEEN") {
                let (low, next) = self.comp_expr(next)?;
                let ((), next) = next.skip_ws().keyword("AND")?;
                let (high, next) = self.comp_expr(next)?;
                let name = if negated { "NOT_BETWEEN" } else { "BETWEEN" };
                left = op(name, vec![left, low, high]);
                scan = next;
                continue;
            }
            if let Ok(((), next)) = t.keyword("REGEXP") {
                let (pattern, next) = self.comp_expr(next)?;
                left = op(if negated { "NOT_REGEXP" } else { "REGEXP" }, vec![left, pattern]);
                scan = next;
                continue;
            }

            break;
        }
        Ok((left, scan))
    }

    /// The restricted right-hand side of `IS [NOT]`: NULL, TRUE, or FALSE.
    fn is_operand<'a>(&self, scan: Scan<'a>) -> ParseResult<'a, Expr> {
        let s = scan.skip_ws();
        keyword_literal(s).map_err(|_| s.expected("NULL, TRUE or FALSE"))
    }

    /// The parenthesized candidate list after `IN`; at least one candidate.
    fn in_candidates<'a>(&self, scan: Scan<'a>) -> ParseResult<'a, Vec<Expr>> {
        let ((), scan) = scan.skip_ws().literal("(")?;
        let (candidates, scan) = sep_by1(scan, ",", |s| self.expr(s))?;
        let ((), scan) = scan.skip_ws().literal(")")?;
        Ok((candidates, scan))
    }

    fn comp_expr<'a>(&self, scan: Scan<'a>) -> ParseResult<'a, Expr> {
        self.binary_chain(scan, comparison_op, Self::add_expr)
    }

    fn add_expr<'a>(&self, scan: Scan<'a>) -> ParseResult<'a, Expr> {
        self.binary_chain(scan, additive_op, Self::mul_expr)
    }

    fn mul_expr<'a>(&self, scan: Scan<'a>) -> ParseResult<'a, Expr> {
        self.binary_chain(scan, multiplicative_op, Self::unary_expr)
    }

    /// Left-associative chain of binary operators at one precedence level.
    /// Once an operator token is consumed its right operand is required.
    fn binary_chain<'a>(
        &self,
        scan: Scan<'a>,
        operator: impl Fn(Scan<'a>) -> Option<(&'static str, Scan<'a>)>,
        next_level: impl Fn(&Self, Scan<'a>) -> ParseResult<'a, Expr>,
    ) -> ParseResult<'a, Expr> {
        let (mut left, mut scan) = next_level(self, scan)?;
        loop {
            let s = scan.skip_ws();
            let Some((name, next)) = operator(s) else {
                break;
            };
            let (right, next) = next_level(self, next)?;
            left = op(name, vec![left, right]);
            scan = next;
        }
        Ok((left, scan))
    }

    fn unary_expr<'a>(&self, scan: Scan<'a>) -> ParseResult<'a, Expr> {
        let s = scan.skip_ws();
        for name in ["!", "+", "-"] {
            if let Ok(((), next)) = s.literal(name) {
                let (operand, next) = self.unary_expr(next)?;
                return Ok((op(name, vec![operand]), next));
            }
        }
        self.primary(scan)
    }

    fn primary<'a>(&self, scan: Scan<'a>) -> ParseResult<'a, Expr> {
        let s = scan.skip_ws();
        literal_value(s)
            .or_try(s, |t| self.parenthesized(t))
            .or_try(s, placeholder)
            .or_try(s, |t| self.call_or_identifier(t))
            .map_err(|failure| {
                // Nothing matched even one character: report the position as
                // missing an expression rather than naming one alternative.
                if failure.offset == s.offset() {
                    s.expected("expression")
                } else {
                    failure
                }
            })
    }

    /// Parenthesized sub-expression, recursing to the loosest level.
    fn parenthesized<'a>(&self, scan: Scan<'a>) -> ParseResult<'a, Expr> {
        let ((), scan) = scan.literal("(")?;
        let (inner, scan) = self.expr(scan)?;
        let ((), scan) = scan.skip_ws().literal(")")?;
        Ok((inner, scan))
    }

    // -----------------------------------------------------------------------
    // Identifiers and function calls
    // -----------------------------------------------------------------------

    /// A function call or a plain identifier. Once the opening parenthesis is
    /// seen the call is committed: a malformed argument list is a hard error,
    /// never a fallback to an identifier parse.
    fn call_or_identifier<'a>(&self, scan: Scan<'a>) -> ParseResult<'a, Expr> {
        if let Ok((name, after_name)) = ident(scan) {
            if let Ok(((), after_paren)) = after_name.skip_ws().literal("(") {
                return self.call_arguments(name, after_paren);
            }
        }
        self.identifier(scan)
    }

    fn call_arguments<'a>(&self, name: &str, scan: Scan<'a>) -> ParseResult<'a, Expr> {
        let s = scan.skip_ws();
        if let Ok(((), next)) = s.literal(")") {
            return Ok((
                Expr::FunctionCall {
                    name: name.to_owned(),
                    args: Vec::new(),
                },
                next,
            ));
        }
        let (args, scan) = sep_by1(scan, ",", |t| self.expr(t))?;
        let ((), scan) = scan.skip_ws().literal(")")?;
        Ok((
            Expr::FunctionCall {
                name: name.to_owned(),
                args,
            },
            scan,
        ))
    }

    fn identifier<'a>(&self, scan: Scan<'a>) -> ParseResult<'a, Expr> {
        match self.mode {
            ParseMode::Document => document_identifier(scan),
            ParseMode::Table => table_identifier(scan),
        }
    }
}

/// Document-mode identifier: a `$`-rooted path or a bare member followed by
/// further path items. Must consume input; a zero-length path is not an
/// expression primary.
fn document_identifier(scan: Scan<'_>) -> ParseResult<'_, Expr> {
    let (path, next) = document_path(scan)?;
    if next.offset() == scan.offset() {
        return Err(scan.expected("identifier"));
    }
    Ok((Expr::Identifier(Identifier::from_path(path)), next))
}

/// Table-mode identifier: `col` or `tbl.col`, optionally followed by a
/// path into the column's document value.
fn table_identifier(scan: Scan<'_>) -> ParseResult<'_, Expr> {
    let (first, mut scan) = ident(scan)?;
    let mut table = None;
    let mut name = first.to_owned();
    if let Ok(((), after_dot)) = scan.literal(".") {
        if let Ok((second, next)) = ident(after_dot) {
            table = Some(name);
            name = second.to_owned();
            scan = next;
        }
    }
    let (path, scan) = column_path(scan)?;
    Ok((
        Expr::Identifier(Identifier {
            path,
            name: Some(name),
            table,
        }),
        scan,
    ))
}

/// Optional document path after a column reference: `->'$...'` with the path
/// quoted, or an inline `$`-rooted path glued to the column (`col$.a.b`).
/// Committed once the arrow or the `$` is consumed.
fn column_path(scan: Scan<'_>) -> ParseResult<'_, DocumentPath> {
    if let Ok(((), after_dollar)) = scan.literal("$") {
        let (items, end) = path_items(after_dollar)?;
        return Ok((DocumentPath::from(items), end));
    }
    let Ok(((), after_arrow)) = scan.skip_ws().literal("->") else {
        return Ok((DocumentPath::root(), scan));
    };
    let s = after_arrow.skip_ws();
    let ((), after_quote) = s.literal("'")?;
    let ((), after_dollar) = after_quote.literal("$")?;
    let (items, after_items) = path_items(after_dollar)?;
    let ((), end) = after_items.literal("'")?;
    Ok((DocumentPath::from(items), end))
}

// ---------------------------------------------------------------------------
// Document paths
// ---------------------------------------------------------------------------

/// A document path: optional `$` root, optional leading bare member, then
/// path items. Matching nothing yields the root path.
fn document_path(scan: Scan<'_>) -> ParseResult<'_, DocumentPath> {
    let (dollar, scan) = opt(scan, |s| s.literal("$"));
    if dollar.is_some() {
        let (items, next) = path_items(scan)?;
        return Ok((DocumentPath::from(items), next));
    }
    match ident(scan) {
        Ok((first, after_first)) => {
            let (rest, next) = path_items(after_first)?;
            let mut items = vec![PathItem::Member(first.to_owned())];
            items.extend(rest);
            Ok((DocumentPath::from(items), next))
        }
        Err(_) => {
            let (items, next) = path_items(scan)?;
            Ok((DocumentPath::from(items), next))
        }
    }
}

/// Zero or more path items, with recursive descent forbidden as the final
/// item: `**` must be followed by something to descend into.
fn path_items(scan: Scan<'_>) -> ParseResult<'_, Vec<PathItem>> {
    let (items, next) = many0(scan, path_item)?;
    if matches!(items.last(), Some(PathItem::DoubleAsterisk)) {
        return Err(next.expected("path item after '**'"));
    }
    Ok((items, next))
}

/// One path item. Alternatives are tried in a fixed order so shared prefixes
/// resolve deterministically: `[*]`, then `[N]`, then `.*`, then `.member`,
/// then `**`.
fn path_item(scan: Scan<'_>) -> ParseResult<'_, PathItem> {
    array_index_asterisk(scan)
        .or_try(scan, array_index)
        .or_try(scan, member_asterisk)
        .or_try(scan, member)
        .or_try(scan, double_asterisk)
}

fn array_index_asterisk(scan: Scan<'_>) -> ParseResult<'_, PathItem> {
    let ((), next) = scan.literal("[*]")?;
    Ok((PathItem::ArrayIndexAsterisk, next))
}

/// `[N]` with an unsigned decimal index: no sign, no leading zeros except
/// for `0` itself, and the value must fit in 32 bits.
fn array_index(scan: Scan<'_>) -> ParseResult<'_, PathItem> {
    let ((), after_bracket) = scan.literal("[")?;
    let (digits, after_digits) = after_bracket.digits()?;
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(after_bracket.expected("array index without a leading zero"));
    }
    let Ok(index) = digits.parse::<u32>() else {
        return Err(after_bracket.expected("array index within 32 bits"));
    };
    let ((), next) = after_digits.literal("]")?;
    Ok((PathItem::ArrayIndex(index), next))
}

fn member_asterisk(scan: Scan<'_>) -> ParseResult<'_, PathItem> {
    let ((), next) = scan.literal(".*")?;
    Ok((PathItem::MemberAsterisk, next))
}

/// `.member` with a bare or quoted member name. Reserved words and names
/// with non-identifier characters must be quoted.
fn member(scan: Scan<'_>) -> ParseResult<'_, PathItem> {
    let ((), after_dot) = scan.literal(".")?;
    let (name, next) = member_name(after_dot)?;
    Ok((PathItem::Member(name), next))
}

fn member_name(scan: Scan<'_>) -> ParseResult<'_, String> {
    ident(scan)
        .map(|(name, next)| (name.to_owned(), next))
        .or_try(scan, quoted_string)
}

fn double_asterisk(scan: Scan<'_>) -> ParseResult<'_, PathItem> {
    let ((), next) = scan.literal("**")?;
    Ok((PathItem::DoubleAsterisk, next))
}

// ---------------------------------------------------------------------------
// Literals, placeholders, identifier tokens
// ---------------------------------------------------------------------------

fn literal_value(scan: Scan<'_>) -> ParseResult<'_, Expr> {
    keyword_literal(scan)
        .or_try(scan, number_literal)
        .or_try(scan, string_literal)
}

fn keyword_literal(scan: Scan<'_>) -> ParseResult<'_, Expr> {
    scan.keyword("NULL")
        .map(|((), next)| (Expr::Literal(Scalar::Null), next))
        .or_try(scan, |s| {
            s.keyword("TRUE")
                .map(|((), next)| (Expr::Literal(Scalar::Bool(true)), next))
        })
        .or_try(scan, |s| {
            s.keyword("FALSE")
                .map(|((), next)| (Expr::Literal(Scalar::Bool(false)), next))
        })
}

/// Unsigned decimal integer or floating-point literal. Integers reject
/// leading zeros (other than `0` itself) and values that do not fit in 64
/// bits; a fraction or exponent makes the literal a double.
fn number_literal(scan: Scan<'_>) -> ParseResult<'_, Expr> {
    let (int_digits, after_int) = scan.digits()?;
    if int_digits.len() > 1 && int_digits.starts_with('0') {
        return Err(scan.advance(1).expected("number without a leading zero"));
    }

    let mut end = after_int;
    let mut is_double = false;
    if let Ok(((), after_dot)) = end.literal(".") {
        if let Ok((_, after_frac)) = after_dot.digits() {
            end = after_frac;
            is_double = true;
        }
    }
    if let Ok(((), after_e)) = end.literal("e").or_try(end, |s| s.literal("E")) {
        let (_, after_sign) = opt(after_e, |s| s.literal("+").or_try(s, |t| t.literal("-")));
        if let Ok((_, after_exp)) = after_sign.digits() {
            end = after_exp;
            is_double = true;
        }
    }

    if is_double {
        let text = scan.span(&end);
        match text.parse::<f64>() {
            Ok(value) => Ok((Expr::Literal(Scalar::Double(value)), end)),
            Err(_) => Err(scan.expected("floating-point literal")),
        }
    } else {
        match int_digits.parse::<u64>() {
            Ok(value) => Ok((Expr::Literal(Scalar::UInt(value)), after_int)),
            Err(_) => Err(after_int.expected("integer within 64 bits")),
        }
    }
}

fn string_literal(scan: Scan<'_>) -> ParseResult<'_, Expr> {
    let (value, next) = quoted_string(scan)?;
    Ok((Expr::Literal(Scalar::String(value)), next))
}

/// String literal delimited by `'` or `"`. The recognized escapes are `\'`,
/// `\"`, and `\\`; any other backslash sequence is kept verbatim as the
/// backslash followed by the character.
fn quoted_string(scan: Scan<'_>) -> ParseResult<'_, String> {
    let rest = scan.rest();
    let mut chars = rest.char_indices();
    let Some((_, delimiter)) = chars.next().filter(|&(_, c)| c == '\'' || c == '"') else {
        return Err(scan.expected("string literal"));
    };
    let mut value = String::new();
    while let Some((idx, c)) = chars.next() {
        if c == delimiter {
            return Ok((value, scan.advance(idx + c.len_utf8())));
        }
        if c == '\\' {
            match chars.next() {
                Some((_, escaped @ ('\'' | '"' | '\\'))) => value.push(escaped),
                Some((_, other)) => {
                    value.push('\\');
                    value.push(other);
                }
                None => break,
            }
        } else {
            value.push(c);
        }
    }
    Err(scan
        .advance(rest.len())
        .expected(format!("closing {delimiter}")))
}

/// Named placeholder: `:name`.
fn placeholder(scan: Scan<'_>) -> ParseResult<'_, Expr> {
    let ((), after_colon) = scan.literal(":")?;
    let (name, next) = ident(after_colon)?;
    Ok((Expr::Placeholder(Placeholder::Named(name.to_owned())), next))
}

/// Bare identifier: a letter or underscore, then letters, digits, and
/// underscores. Reserved grammar keywords are rejected.
fn ident<'a>(scan: Scan<'a>) -> ParseResult<'a, &'a str> {
    if !scan.peek().is_some_and(is_ident_start) {
        return Err(scan.expected("identifier"));
    }
    let (word, next) = scan.take_while1("identifier", is_ident_continue)?;
    if is_reserved_word(word) {
        return Err(scan.expected("identifier"));
    }
    Ok((word, next))
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// ---------------------------------------------------------------------------
// Operator tokens
// ---------------------------------------------------------------------------

/// Longest-match comparison operator, normalized to its canonical spelling.
/// Two-character spellings come first so `>=` never matches as `>`.
fn comparison_op(scan: Scan<'_>) -> Option<(&'static str, Scan<'_>)> {
    match_op(
        scan,
        &[
            ("==", "="),
            ("!=", "!="),
            ("<>", "!="),
            (">=", ">="),
            ("<=", "<="),
            (">", ">"),
            ("<", "<"),
            ("=", "="),
        ],
    )
}

fn additive_op(scan: Scan<'_>) -> Option<(&'static str, Scan<'_>)> {
    match_op(scan, &[("+", "+"), ("-", "-")])
}

fn multiplicative_op(scan: Scan<'_>) -> Option<(&'static str, Scan<'_>)> {
    match_op(scan, &[("*", "*"), ("/", "/"), ("%", "%")])
}

fn match_op<'a>(
    scan: Scan<'a>,
    spellings: &[(&str, &'static str)],
) -> Option<(&'static str, Scan<'a>)> {
    for (spelling, canonical) in spellings {
        if let Ok(((), next)) = scan.literal(spelling) {
            return Some((canonical, next));
        }
    }
    None
}

/// Operator node for shapes the grammar itself guarantees; operand counts
/// here always satisfy the arity table.
fn op(name: &str, operands: Vec<Expr>) -> Expr {
    Expr::Operator {
        name: name.to_owned(),
        operands,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
