use crate::config::WhitespacePolicy;
use std::fmt;

/// Reserved words and punctuation of the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    LeftParen,
    RightParen,
    GreaterThanOrEqual,
    LessThanOrEqual,
    NotEqual,
    Comma,
    Equal,
    GreaterThan,
    LessThan,
    Select,
    InsertInto,
    Values,
    Update,
    DeleteFrom,
    Where,
    From,
    Set,
    As,
    CreateTable,
    Like,
    NotLike,
    In,
    NotIn,
}

/// Checked top to bottom, first match wins. Two-character operators sit
/// above their one-character prefixes and `INSERT INTO` above `IN`.
const RESERVED: &[(&str, Keyword)] = &[
    ("(", Keyword::LeftParen),
    (")", Keyword::RightParen),
    (">=", Keyword::GreaterThanOrEqual),
    ("<=", Keyword::LessThanOrEqual),
    ("!=", Keyword::NotEqual),
    (",", Keyword::Comma),
    ("=", Keyword::Equal),
    (">", Keyword::GreaterThan),
    ("<", Keyword::LessThan),
    ("SELECT", Keyword::Select),
    ("INSERT INTO", Keyword::InsertInto),
    ("VALUES", Keyword::Values),
    ("UPDATE", Keyword::Update),
    ("DELETE FROM", Keyword::DeleteFrom),
    ("WHERE", Keyword::Where),
    ("FROM", Keyword::From),
    ("SET", Keyword::Set),
    ("AS", Keyword::As),
    ("CREATE TABLE", Keyword::CreateTable),
    ("LIKE", Keyword::Like),
    ("NOT LIKE", Keyword::NotLike),
    ("IN", Keyword::In),
    ("NOT IN", Keyword::NotIn),
];

impl Keyword {
    pub fn as_str(self) -> &'static str {
        RESERVED
            .iter()
            .find(|(_, keyword)| *keyword == self)
            .map(|(word, _)| *word)
            .unwrap_or_default()
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Keyword(Keyword),
    /// Content between single quotes, escapes left as written.
    Quoted(&'a str),
    Ident(&'a str),
    /// End of input, an unterminated quote or a character no rule accepts.
    Empty,
}

impl<'a> Token<'a> {
    /// Bare identifiers that can name a field: at least one letter or
    /// underscore, so `*` and `42` do not qualify.
    pub fn is_identifier(&self) -> bool {
        matches!(self, Token::Ident(text) if text.chars().any(|c| c.is_ascii_alphabetic() || c == '_'))
    }

    pub fn identifier(&self) -> Option<&'a str> {
        match *self {
            Token::Ident(text) if self.is_identifier() => Some(text),
            _ => None,
        }
    }

    pub fn quoted(&self) -> Option<&'a str> {
        match *self {
            Token::Quoted(text) => Some(text),
            _ => None,
        }
    }

    /// Table names and column types may be bare or quoted but never empty.
    pub fn name(&self) -> Option<&'a str> {
        match *self {
            Token::Ident(text) | Token::Quoted(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        *self == Token::Keyword(keyword)
    }

    /// `AND` is not reserved; it is recognised where the grammar expects it.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Ident(text) if text.eq_ignore_ascii_case(word))
    }
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '*' || ch == '.'
}

/// Characters that continue a word after an alphabetic keyword. `*` is not
/// one of them, so `SELECT*` still lexes as `SELECT` followed by `*`.
fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

/// Alphabetic keywords only match on a word boundary, so `index` is a field
/// and not `IN` followed by `dex`.
fn lookup_reserved(rest: &str) -> Option<(Keyword, usize)> {
    RESERVED.iter().find_map(|&(word, keyword)| {
        let candidate = rest.get(..word.len())?;
        if !candidate.eq_ignore_ascii_case(word) {
            return None;
        }
        let alphabetic = word.ends_with(|c: char| c.is_ascii_alphabetic());
        if alphabetic && rest[word.len()..].starts_with(is_word_char) {
            return None;
        }
        Some((keyword, word.len()))
    })
}

fn lex_quoted(rest: &str) -> Option<(&str, usize)> {
    let body = rest.strip_prefix('\'')?;
    let mut previous = None;
    for (i, ch) in body.char_indices() {
        if ch == '\'' && previous != Some('\\') {
            return Some((&body[..i], i + 2));
        }
        previous = Some(ch);
    }
    None
}

fn lex_identifier(rest: &str) -> (&str, usize) {
    let len = rest
        .find(|c: char| !is_identifier_char(c))
        .unwrap_or(rest.len());
    (&rest[..len], len)
}

/// Pull-based tokenizer over one statement. Copying a lexer snapshots the
/// cursor, which is how the state machine threads it through each step.
#[derive(Debug, Clone, Copy)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    whitespace: WhitespacePolicy,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, whitespace: WhitespacePolicy) -> Self {
        Self {
            input,
            pos: 0,
            whitespace,
        }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Next token and its length in bytes, without consuming it.
    pub fn peek_with_length(&self) -> (Token<'a>, usize) {
        let rest = &self.input[self.pos..];
        if rest.is_empty() {
            return (Token::Empty, 0);
        }
        if let Some((keyword, len)) = lookup_reserved(rest) {
            return (Token::Keyword(keyword), len);
        }
        if rest.starts_with('\'') {
            return match lex_quoted(rest) {
                Some((text, len)) => (Token::Quoted(text), len),
                None => (Token::Empty, 0),
            };
        }
        match lex_identifier(rest) {
            (_, 0) => (Token::Empty, 0),
            (text, len) => (Token::Ident(text), len),
        }
    }

    pub fn peek(&self) -> Token<'a> {
        self.peek_with_length().0
    }

    pub fn pop(&mut self) -> Token<'a> {
        let (token, len) = self.peek_with_length();
        self.pos += len;
        self.skip_whitespace();
        token
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        let policy = self.whitespace;
        let trimmed = rest.trim_start_matches(|c: char| policy.is_insignificant(c));
        self.pos += rest.len() - trimmed.len();
    }
}
