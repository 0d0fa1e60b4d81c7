//! Typed document paths addressing values inside stored documents.
//!
//! A path is an ordered list of [`PathItem`]s; the empty path addresses the
//! whole document. `Display` renders the canonical spelling (`$` root, bare
//! members where possible, quoted members otherwise), which re-parses to the
//! same path.

use std::fmt;

/// One addressing step in a document path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathItem {
    /// `.name`: access a named member.
    Member(String),
    /// `.*`: all members of a document.
    MemberAsterisk,
    /// `[N]`: access one array element by zero-based index.
    ArrayIndex(u32),
    /// `[*]`: all elements of an array.
    ArrayIndexAsterisk,
    /// `**`: recursive descent into every nested document.
    DoubleAsterisk,
}

impl fmt::Display for PathItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member(name) => {
                if is_bare_member(name) {
                    write!(f, ".{name}")
                } else {
                    write!(f, ".\"{}\"", escape_member(name))
                }
            }
            Self::MemberAsterisk => f.write_str(".*"),
            Self::ArrayIndex(index) => write!(f, "[{index}]"),
            Self::ArrayIndexAsterisk => f.write_str("[*]"),
            Self::DoubleAsterisk => f.write_str("**"),
        }
    }
}

/// An ordered document path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DocumentPath {
    /// The addressing steps, outermost first.
    pub items: Vec<PathItem>,
}

impl DocumentPath {
    /// The empty path addressing the whole document.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns `true` if this path addresses the document root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of addressing steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the path has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<Vec<PathItem>> for DocumentPath {
    fn from(items: Vec<PathItem>) -> Self {
        Self { items }
    }
}

impl fmt::Display for DocumentPath {
    /// Canonical rendering: `$` followed by each item's canonical spelling.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for item in &self.items {
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

/// Grammar keywords that cannot appear as bare identifiers or members; they
/// must be quoted to be used as member names.
pub(crate) const RESERVED_WORDS: &[&str] = &[
    "AND", "OR", "NOT", "IS", "IN", "LIKE", "BETWEEN", "REGEXP", "ESCAPE", "NULL", "TRUE", "FALSE",
];

pub(crate) fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.iter().any(|word| name.eq_ignore_ascii_case(word))
}

/// Returns `true` if `name` renders as a bare `.name` member: identifier
/// characters only and not a reserved word, so the rendering re-parses.
fn is_bare_member(name: &str) -> bool {
    let mut chars = name.chars();
    let head_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    head_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_reserved_word(name)
}

fn escape_member(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}
