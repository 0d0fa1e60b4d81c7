//! Expression AST: scalar literals, identifiers, operators, function calls,
//! and placeholders.
//!
//! Operator nodes carry their operator as a canonical name string plus an
//! ordered operand list, so the node shape is uniform across unary, binary,
//! and n-ary operators. [`Expr::operator`] validates operand counts against
//! the arity table; the grammar produces only shapes that already satisfy it.

use std::fmt;

use crate::error::ArityError;
use crate::path::DocumentPath;

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// A literal value in an expression or a statement argument.
///
/// The grammar produces `Null`, `Bool`, `UInt`, `Double`, and `String`
/// literals. `Int` and `Bytes` exist for programmatically built values:
/// negative numbers and binary payloads bound by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// SQL NULL.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Unsigned 64-bit integer.
    UInt(u64),
    /// Signed 64-bit integer.
    Int(i64),
    /// IEEE-754 double.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Raw binary payload.
    Bytes(bytes::Bytes),
}

impl Scalar {
    /// Returns `true` if this is SQL NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the flag if this is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the value if this is a `UInt`.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the string if this is a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    /// Short type name used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BOOL",
            Self::UInt(_) => "UINT",
            Self::Int(_) => "SINT",
            Self::Double(_) => "DOUBLE",
            Self::String(_) => "STRING",
            Self::Bytes(_) => "BYTES",
        }
    }
}

/// Renders the literal the way the grammar spells it.
///
/// Values the grammar has no spelling for still render for diagnostics but
/// cannot be re-parsed: non-finite doubles (`NaN`, `inf`), negative integers
/// (the grammar reads `-5` as unary minus over `5`), and byte strings.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(true) => f.write_str("TRUE"),
            Self::Bool(false) => f.write_str("FALSE"),
            Self::UInt(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            // A whole-valued double keeps its decimal point so the rendering
            // re-parses as a double, not an integer.
            Self::Double(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{value:.1}")
            }
            Self::Double(value) => write!(f, "{value}"),
            Self::String(text) => {
                write!(f, "'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            Self::Bytes(data) => write!(f, "<{} bytes>", data.len()),
        }
    }
}

// ---------------------------------------------------------------------------
// Identifiers and placeholders
// ---------------------------------------------------------------------------

/// A column and/or document-path reference.
///
/// Document-mode identifiers carry only a path. Table-mode identifiers carry
/// a column `name`, an optional `table` qualifier, and optionally a path into
/// the column's document value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    /// Path into the addressed value; the empty path means the whole value.
    pub path: DocumentPath,
    /// Column name, when addressing a table column.
    pub name: Option<String>,
    /// Table qualifier for the column.
    pub table: Option<String>,
}

impl Identifier {
    /// Identifier addressing a document path.
    #[must_use]
    pub fn from_path(path: DocumentPath) -> Self {
        Self {
            path,
            name: None,
            table: None,
        }
    }

    /// Identifier addressing a table column.
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            path: DocumentPath::root(),
            name: Some(name.into()),
            table: None,
        }
    }

    /// Identifier addressing a table-qualified column.
    #[must_use]
    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: DocumentPath::root(),
            name: Some(name.into()),
            table: Some(table.into()),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.table, &self.name) {
            (Some(table), Some(name)) => {
                write!(f, "{table}.{name}")?;
            }
            (_, Some(name)) => {
                write!(f, "{name}")?;
            }
            _ => {}
        }
        if self.name.is_some() {
            if !self.path.is_root() {
                write!(f, "->'{}'", self.path)?;
            }
            Ok(())
        } else {
            write!(f, "{}", self.path)
        }
    }
}

/// A value bound at statement execution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// Named placeholder, spelled `:name` in source text.
    Named(String),
    /// Positional placeholder assigned programmatically.
    Position(u32),
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, ":{name}"),
            Self::Position(index) => write!(f, "?{index}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Expression nodes
// ---------------------------------------------------------------------------

/// One node of an expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal scalar value.
    Literal(Scalar),
    /// A column or document-path reference.
    Identifier(Identifier),
    /// An operator applied to ordered operands. The name is one of the
    /// canonical spellings listed in [`OPERATORS`].
    Operator {
        /// Canonical operator name.
        name: String,
        /// Ordered operands.
        operands: Vec<Expr>,
    },
    /// A function call with ordered arguments. Function names are not
    /// validated here; servers resolve them.
    FunctionCall {
        /// Function name.
        name: String,
        /// Ordered arguments.
        args: Vec<Expr>,
    },
    /// A value bound at execution time.
    Placeholder(Placeholder),
}

impl Expr {
    /// Build an operator node, validating the operand count against the
    /// operator's arity.
    ///
    /// # Errors
    ///
    /// Returns [`ArityError`] if `name` is not a canonical operator or the
    /// operand count falls outside its arity.
    pub fn operator(name: impl Into<String>, operands: Vec<Expr>) -> Result<Self, ArityError> {
        let name = name.into();
        let Some(arity) = operator_arity(&name) else {
            return Err(ArityError::UnknownOperator { name });
        };
        if !arity.accepts(operands.len()) {
            return Err(ArityError::WrongOperandCount {
                name,
                expected: arity,
                actual: operands.len(),
            });
        }
        Ok(Self::Operator { name, operands })
    }

    /// Returns the scalar if this node is a literal.
    #[must_use]
    pub fn as_literal(&self) -> Option<&Scalar> {
        match self {
            Self::Literal(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Returns the name and operands if this node is an operator.
    #[must_use]
    pub fn as_operator(&self) -> Option<(&str, &[Expr])> {
        match self {
            Self::Operator { name, operands } => Some((name, operands)),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(scalar) => write!(f, "{scalar}"),
            Self::Identifier(identifier) => write!(f, "{identifier}"),
            Self::Operator { name, operands } => write_operator(f, name, operands),
            Self::FunctionCall { name, args } => {
                write!(f, "{name}(")?;
                comma_list(f, args)?;
                f.write_str(")")
            }
            Self::Placeholder(placeholder) => write!(f, "{placeholder}"),
        }
    }
}

fn write_operator(f: &mut fmt::Formatter<'_>, name: &str, operands: &[Expr]) -> fmt::Result {
    match (name, operands) {
        ("BETWEEN" | "NOT_BETWEEN", [value, low, high]) => {
            write!(f, "({value} {} {low} AND {high})", keyword_spelling(name))
        }
        ("IN" | "NOT_IN", [probe, candidates @ ..]) => {
            write!(f, "({probe} {} (", keyword_spelling(name))?;
            comma_list(f, candidates)?;
            f.write_str("))")
        }
        ("LIKE" | "NOT_LIKE", [value, pattern, escape]) => {
            write!(f, "({value} {} {pattern} ESCAPE {escape})", keyword_spelling(name))
        }
        ("NOT", [operand]) => write!(f, "(NOT {operand})"),
        (_, [operand]) => write!(f, "({name}{operand})"),
        (_, [left, right]) => write!(f, "({left} {} {right})", keyword_spelling(name)),
        _ => {
            // Hand-built nodes outside the grammar's usual shapes.
            write!(f, "{name}(")?;
            comma_list(f, operands)?;
            f.write_str(")")
        }
    }
}

/// Multi-word operator names store an underscore (`IS_NOT`) but print with a
/// space (`IS NOT`).
fn keyword_spelling(name: &str) -> String {
    name.replace('_', " ")
}

fn comma_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Operator arity table
// ---------------------------------------------------------------------------

/// Canonical operator names known to the grammar and codec.
pub const OPERATORS: &[&str] = &[
    "OR", "AND", "NOT", "!", "IS", "IS_NOT", "IN", "NOT_IN", "LIKE", "NOT_LIKE", "BETWEEN",
    "NOT_BETWEEN", "REGEXP", "NOT_REGEXP", "=", "!=", ">", ">=", "<", "<=", "+", "-", "*", "/",
    "%",
];

/// Allowed operand count for an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many operands.
    Exact(usize),
    /// Either of two operand counts, e.g. unary and binary minus.
    Either(usize, usize),
    /// This many operands or more.
    AtLeast(usize),
}

impl Arity {
    /// Returns `true` if `count` operands satisfy this arity.
    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::Either(a, b) => count == a || count == b,
            Self::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "exactly {n}"),
            Self::Either(a, b) => write!(f, "{a} or {b}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Arity of a canonical operator name, or `None` for unknown names.
#[must_use]
pub fn operator_arity(name: &str) -> Option<Arity> {
    match name {
        "NOT" | "!" => Some(Arity::Exact(1)),
        "+" | "-" => Some(Arity::Either(1, 2)),
        "LIKE" | "NOT_LIKE" => Some(Arity::Either(2, 3)),
        "BETWEEN" | "NOT_BETWEEN" => Some(Arity::Exact(3)),
        "IN" | "NOT_IN" => Some(Arity::AtLeast(2)),
        "OR" | "AND" | "IS" | "IS_NOT" | "REGEXP" | "NOT_REGEXP" | "=" | "!=" | ">" | ">=" | "<"
        | "<=" | "*" | "/" | "%" => Some(Arity::Exact(2)),
        _ => None,
    }
}
