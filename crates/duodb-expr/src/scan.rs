//! Grammar engine: a value-passing scanner and the combinators built on it.
//!
//! A [`Scan`] is a cheap `Copy` cursor over borrowed input. Rules take a
//! `Scan` by value and return [`ParseResult`]: the parsed value plus the
//! advanced cursor on success, or a [`Failure`] on failure. Because the
//! caller still holds the cursor it passed in, backtracking is simply reusing
//! that value; no rule ever mutates shared state.

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// A cursor into borrowed input text.
///
/// Copying a `Scan` is copying a reference and a byte offset, so alternation
/// saves the cursor before each branch and restores it for free when a branch
/// fails.
#[derive(Debug, Clone, Copy)]
pub struct Scan<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> Scan<'a> {
    /// Cursor at the start of `input`.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self { input, offset: 0 }
    }

    /// Byte offset of the cursor in the original input.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Remaining unconsumed input.
    #[must_use]
    pub fn rest(&self) -> &'a str {
        &self.input[self.offset..]
    }

    /// Returns `true` if no input remains.
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.offset >= self.input.len()
    }

    /// Next character without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// The input text between this cursor and `end`.
    #[must_use]
    pub fn span(&self, end: &Scan<'a>) -> &'a str {
        &self.input[self.offset..end.offset]
    }

    /// Cursor advanced by `n` bytes. `n` must land on a character boundary.
    #[must_use]
    pub(crate) fn advance(self, n: usize) -> Self {
        Self {
            input: self.input,
            offset: self.offset + n,
        }
    }

    /// Cursor past any leading ASCII whitespace.
    #[must_use]
    pub fn skip_ws(self) -> Self {
        let trimmed = self
            .rest()
            .trim_start_matches(|c: char| c.is_ascii_whitespace());
        let skipped = self.rest().len() - trimmed.len();
        self.advance(skipped)
    }

    /// A [`Failure`] at the current offset.
    #[must_use]
    pub fn expected(&self, what: impl Into<String>) -> Failure {
        Failure {
            offset: self.offset,
            expected: what.into(),
        }
    }

    // -----------------------------------------------------------------------
    // Primitive rules
    // -----------------------------------------------------------------------

    /// Match `text` exactly.
    ///
    /// # Errors
    ///
    /// Fails at the current offset if the remaining input does not start with
    /// `text`.
    pub fn literal(self, text: &str) -> ParseResult<'a, ()> {
        if self.rest().starts_with(text) {
            Ok(((), self.advance(text.len())))
        } else {
            Err(self.expected(format!("'{text}'")))
        }
    }

    /// Match `word` case-insensitively, requiring a word boundary after it so
    /// `OR` does not match the prefix of `ORDERS`.
    ///
    /// # Errors
    ///
    /// Fails at the current offset if `word` is not present or runs straight
    /// into an identifier character.
    pub fn keyword(self, word: &str) -> ParseResult<'a, ()> {
        let rest = self.rest();
        let head_matches = rest
            .get(..word.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(word));
        if head_matches {
            let next_char = rest[word.len()..].chars().next();
            if !next_char.is_some_and(is_word_char) {
                return Ok(((), self.advance(word.len())));
            }
        }
        Err(self.expected(word.to_owned()))
    }

    /// Take one or more leading characters satisfying `pred`. `what` names
    /// the expected token class for diagnostics.
    ///
    /// # Errors
    ///
    /// Fails at the current offset if the first character does not satisfy
    /// `pred`.
    pub fn take_while1(
        self,
        what: &str,
        pred: impl Fn(char) -> bool,
    ) -> ParseResult<'a, &'a str> {
        let rest = self.rest();
        let end = rest.find(|c| !pred(c)).unwrap_or(rest.len());
        if end == 0 {
            Err(self.expected(what.to_owned()))
        } else {
            Ok((&rest[..end], self.advance(end)))
        }
    }

    /// Take a run of ASCII digits.
    ///
    /// # Errors
    ///
    /// Fails at the current offset if no digit is present.
    pub fn digits(self) -> ParseResult<'a, &'a str> {
        self.take_while1("digit", |c| c.is_ascii_digit())
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// ---------------------------------------------------------------------------
// Results and failures
// ---------------------------------------------------------------------------

/// Parsed value plus the advanced cursor on success, or a [`Failure`].
pub type ParseResult<'a, T> = Result<(T, Scan<'a>), Failure>;

/// A rule failure: the offset a rule gave up at and what it expected there.
///
/// Failures are ordinary values consumed by alternation. Only the outermost
/// entry points turn one into a `SyntaxError`, after every alternative has
/// had its chance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Byte offset where the rule gave up.
    pub offset: usize,
    /// Description of the expected token.
    pub expected: String,
}

impl Failure {
    /// Keep whichever failure reached further into the input; ties keep
    /// `self`, so earlier alternatives win the diagnostic.
    #[must_use]
    pub fn prefer(self, other: Failure) -> Failure {
        if other.offset > self.offset {
            other
        } else {
            self
        }
    }
}

// ---------------------------------------------------------------------------
// Combinators
// ---------------------------------------------------------------------------

/// Ordered choice over rule results.
pub trait OrTry<'a, T> {
    /// If `self` failed, try `rule` from the saved cursor `scan`.
    ///
    /// Each alternative starts from the same cursor, so a failed branch
    /// leaves no partial consumption behind. Failed branches merge by
    /// furthest offset so the final diagnostic points at the deepest attempt.
    fn or_try(
        self,
        scan: Scan<'a>,
        rule: impl FnOnce(Scan<'a>) -> ParseResult<'a, T>,
    ) -> ParseResult<'a, T>;
}

impl<'a, T> OrTry<'a, T> for ParseResult<'a, T> {
    fn or_try(
        self,
        scan: Scan<'a>,
        rule: impl FnOnce(Scan<'a>) -> ParseResult<'a, T>,
    ) -> ParseResult<'a, T> {
        match self {
            Ok(success) => Ok(success),
            Err(failure) => rule(scan).map_err(|other| failure.prefer(other)),
        }
    }
}

/// Apply `rule`, treating failure as absence. The cursor is untouched when
/// the rule fails.
pub fn opt<'a, T>(
    scan: Scan<'a>,
    rule: impl FnOnce(Scan<'a>) -> ParseResult<'a, T>,
) -> (Option<T>, Scan<'a>) {
    match rule(scan) {
        Ok((value, next)) => (Some(value), next),
        Err(_) => (None, scan),
    }
}

/// Apply `rule` zero or more times, collecting the results.
///
/// An attempt that fails without consuming input ends the repetition cleanly.
/// An attempt that fails after consuming input had committed to an item, so
/// its failure surfaces instead of being discarded; diagnostics then point at
/// the deepest point reached. A rule that succeeds without advancing also
/// ends the loop, otherwise repetition could never terminate.
///
/// # Errors
///
/// Fails where a partially matched item failed.
pub fn many0<'a, T>(
    mut scan: Scan<'a>,
    mut rule: impl FnMut(Scan<'a>) -> ParseResult<'a, T>,
) -> ParseResult<'a, Vec<T>> {
    let mut items = Vec::new();
    loop {
        match rule(scan) {
            Ok((item, next)) => {
                if next.offset() == scan.offset() {
                    break;
                }
                items.push(item);
                scan = next;
            }
            Err(failure) if failure.offset > scan.offset() => return Err(failure),
            Err(_) => break,
        }
    }
    Ok((items, scan))
}

/// Parse one or more `rule` items separated by `separator`, with whitespace
/// allowed before each separator. Once a separator is consumed the next item
/// is required, so a trailing separator is a failure rather than a silent
/// stop.
///
/// # Errors
///
/// Fails where the first item fails, or where an item after a consumed
/// separator fails.
pub fn sep_by1<'a, T>(
    scan: Scan<'a>,
    separator: &str,
    mut rule: impl FnMut(Scan<'a>) -> ParseResult<'a, T>,
) -> ParseResult<'a, Vec<T>> {
    let (first, mut scan) = rule(scan)?;
    let mut items = vec![first];
    loop {
        let Ok(((), after_sep)) = scan.skip_ws().literal(separator) else {
            break;
        };
        let (item, next) = rule(after_sep)?;
        items.push(item);
        scan = next;
    }
    Ok((items, scan))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_match_literal_and_advance() {
        let scan = Scan::new("abc");
        let ((), next) = scan.literal("ab").unwrap();
        assert_eq!(next.offset(), 2);
        assert_eq!(next.rest(), "c");
    }

    #[test]
    fn test_should_fail_literal_at_current_offset() {
        let scan = Scan::new("abc").advance(1);
        let failure = scan.literal("xyz").unwrap_err();
        assert_eq!(failure.offset, 1);
        assert_eq!(failure.expected, "'xyz'");
    }

    #[test]
    fn test_should_match_keyword_case_insensitively() {
        let scan = Scan::new("aNd more");
        let ((), next) = scan.keyword("AND").unwrap();
        assert_eq!(next.rest(), " more");
    }

    #[test]
    fn test_should_reject_keyword_without_word_boundary() {
        let scan = Scan::new("ANDroid");
        assert!(scan.keyword("AND").is_err());
    }

    #[test]
    fn test_should_match_keyword_at_end_of_input() {
        let scan = Scan::new("not");
        assert!(scan.keyword("NOT").is_ok());
    }

    #[test]
    fn test_should_take_digit_run() {
        let scan = Scan::new("123abc");
        let (digits, next) = scan.digits().unwrap();
        assert_eq!(digits, "123");
        assert_eq!(next.rest(), "abc");
    }

    #[test]
    fn test_should_fail_take_while1_on_empty_match() {
        let scan = Scan::new("abc");
        let failure = scan.digits().unwrap_err();
        assert_eq!(failure.expected, "digit");
    }

    #[test]
    fn test_should_skip_ascii_whitespace() {
        let scan = Scan::new("  \t\nx");
        assert_eq!(scan.skip_ws().rest(), "x");
    }

    #[test]
    fn test_should_expose_span_between_cursors() {
        let start = Scan::new("hello world");
        let (_, end) = start.take_while1("letter", |c| c.is_ascii_alphabetic()).unwrap();
        assert_eq!(start.span(&end), "hello");
    }

    #[test]
    fn test_should_backtrack_through_or_try() {
        let scan = Scan::new("cde");
        let (matched, next) = scan
            .literal("ab")
            .map(|((), next)| ("ab", next))
            .or_try(scan, |s| s.literal("cd").map(|((), next)| ("cd", next)))
            .unwrap();
        assert_eq!(matched, "cd");
        assert_eq!(next.rest(), "e");
    }

    #[test]
    fn test_should_merge_failures_by_furthest_offset() {
        let scan = Scan::new("abc");
        let result: ParseResult<'_, ()> = scan
            .literal("ab")
            .and_then(|((), next)| next.literal("X"))
            .or_try(scan, |s| s.literal("zzz"));
        let failure = result.unwrap_err();
        assert_eq!(failure.offset, 2);
        assert_eq!(failure.expected, "'X'");
    }

    #[test]
    fn test_should_keep_first_failure_on_offset_tie() {
        let scan = Scan::new("abc");
        let result: ParseResult<'_, ()> = scan.literal("x").or_try(scan, |s| s.literal("y"));
        let failure = result.unwrap_err();
        assert_eq!(failure.offset, 0);
        assert_eq!(failure.expected, "'x'");
    }

    #[test]
    fn test_should_restore_cursor_through_opt() {
        let scan = Scan::new("abc");
        let (value, next) = opt(scan, |s| s.literal("x"));
        assert!(value.is_none());
        assert_eq!(next.offset(), 0);
    }

    #[test]
    fn test_should_collect_repeated_items_with_many0() {
        let scan = Scan::new("aaab");
        let (items, next) = many0(scan, |s| s.literal("a")).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(next.rest(), "b");
    }

    #[test]
    fn test_should_stop_many0_without_consuming_on_failure() {
        let scan = Scan::new("bbb");
        let (items, next) = many0(scan, |s| s.literal("a")).unwrap();
        assert!(items.is_empty());
        assert_eq!(next.offset(), 0);
    }

    #[test]
    fn test_should_surface_partially_matched_item_from_many0() {
        let scan = Scan::new("ababac");
        let failure = many0(scan, |s| {
            let ((), next) = s.literal("a")?;
            next.literal("b")
        })
        .unwrap_err();
        assert_eq!(failure.offset, 5);
        assert_eq!(failure.expected, "'b'");
    }

    #[test]
    fn test_should_parse_separated_items() {
        let scan = Scan::new("a, a ,a");
        let (items, next) = sep_by1(scan, ",", |s| s.skip_ws().literal("a")).unwrap();
        assert_eq!(items.len(), 3);
        assert!(next.at_end());
    }

    #[test]
    fn test_should_require_item_after_separator() {
        let scan = Scan::new("a,");
        let failure = sep_by1(scan, ",", |s| s.skip_ws().literal("a")).unwrap_err();
        assert_eq!(failure.offset, 2);
    }
}
