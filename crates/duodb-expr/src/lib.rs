//! Expression compiler for the DuoDB client: a backtracking grammar engine,
//! the SQL-subset expression grammar, and the typed AST it produces.
//!
//! The [`scan`] module is the grammar engine: a `Copy` cursor over borrowed
//! input plus alternation, optional, and repetition combinators with
//! furthest-failure diagnostics. The [`parser`] module layers the expression
//! grammar on top of it in two identifier dialects (document paths for
//! collections, column references for tables) and also parses standalone
//! document paths like `$.items[*].name`. The [`ast`] and [`path`] modules
//! hold the parse results; they are what the wire codec serializes.

pub mod ast;
pub mod error;
pub mod parser;
pub mod path;
pub mod scan;

pub use ast::{Arity, Expr, Identifier, OPERATORS, Placeholder, Scalar, operator_arity};
pub use error::{ArityError, SyntaxError};
pub use parser::{ParseMode, parse_document_path, parse_expression};
pub use path::{DocumentPath, PathItem};
