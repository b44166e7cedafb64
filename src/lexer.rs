//! Module `lexer` implements the indentation‑aware tokenizer for Mython.
//!
//! The whole input is tokenized up front into a flat `Vec<Token>`; the
//! [`Lexer`] then acts as a cursor over that sequence for the parser.
//!
//! # Core Phases
//!
//! 1. **Line splitting**
//!    - Physical lines are located with `memchr`; a trailing `\r` is dropped.
//!
//! 2. **Indentation**
//!    - Leading spaces are counted.  Widths must be even (two spaces per level).
//!    - A deeper line emits a single `Indent`, a shallower line one `Dedent`
//!      per level closed.  Only blank lines are ignored; a comment line
//!      still moves the indentation.
//!
//! 3. **Token Recognition** (`RECOGNIZERS`)
//!    - Tried in order: keyword, comparison (`==`, `!=`, `<=`, `>=`), single
//!      character symbol, integer, string literal, identifier.
//!    - Keywords only count when followed by end of line, whitespace, `:` or
//!      `,`.  Otherwise the word lexes as an identifier.
//!    - `#` at a token boundary comments out the rest of the line.
//!
//! 4. **Termination**
//!    - Every line that produced a token ends in `Newline`.  At end of input the lexer
//!      closes all open blocks with `Dedent`s and appends exactly one `Eof`.
//!
//! # Example
//!
//! ```rust
//! use mython::lexer::Lexer;
//! use mython::token::Token;
//!
//! let lexer = Lexer::new("x = 10").unwrap();
//! assert_eq!(lexer.current_token(), &Token::Id("x".into()));
//! ```

use crate::error::LexError;
use crate::token::{Token, TokenKind};
use log::{debug, info};
use memchr::memchr_iter;
use phf::phf_map;

// ─────────────────────────────────────────────────────────────────────────────
// Static lookup tables (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static str, Token> = phf_map! {
    "class"  => Token::Class,
    "return" => Token::Return,
    "if"     => Token::If,
    "else"   => Token::Else,
    "def"    => Token::Def,
    "print"  => Token::Print,
    "and"    => Token::And,
    "or"     => Token::Or,
    "not"    => Token::Not,
    "None"   => Token::None,
    "True"   => Token::True,
    "False"  => Token::False,
};

static COMPARISONS: phf::Map<&'static str, Token> = phf_map! {
    "==" => Token::Eq,
    "!=" => Token::NotEq,
    "<=" => Token::LessOrEq,
    ">=" => Token::GreaterOrEq,
};

const SYMBOLS: &[u8] = b"<>=+-*/().,:";

/// Spaces per indentation level.
const INDENT_WIDTH: usize = 2;

/// A recognizer consumes one token from the front of `rest`, or leaves it
/// untouched and returns `None`.
type Recognizer = fn(&mut &str, usize) -> Result<Option<Token>, LexError>;

const RECOGNIZERS: [Recognizer; 6] = [
    lex_keyword,
    lex_comparison,
    lex_symbol,
    lex_number,
    lex_string,
    lex_identifier,
];

/// Tokenize `src` and return the complete token sequence.
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(src).map(Lexer::into_tokens)
}

/// Token cursor over a fully tokenized source.
#[derive(Debug, Clone)]
pub struct Lexer {
    tokens: Vec<Token>,
    lines: Vec<usize>, // 1‑based source line of each token
    current: usize,
}

impl Lexer {
    /// Tokenize `src` and position the cursor at the first token.
    pub fn new(src: &str) -> Result<Self, LexError> {
        info!("Lexer created over {} bytes", src.len());

        let mut lexer = Self {
            tokens: Vec::new(),
            lines: Vec::new(),
            current: 0,
        };

        let bytes: &[u8] = src.as_bytes();
        let mut start: usize = 0;
        let mut line: usize = 0;
        let mut prev_indent: usize = 0;

        for end in memchr_iter(b'\n', bytes).chain(std::iter::once(bytes.len())) {
            line += 1;

            let text: &str = &src[start..end];
            let text: &str = text.strip_suffix('\r').unwrap_or(text);
            start = end + 1;

            lexer.scan_line(text, line, &mut prev_indent)?;
        }

        for _ in 0..prev_indent / INDENT_WIDTH {
            lexer.push(Token::Dedent, line);
        }
        lexer.push(Token::Eof, line);

        info!("Tokenization produced {} tokens", lexer.tokens.len());

        Ok(lexer)
    }

    fn push(&mut self, token: Token, line: usize) {
        debug!("Scanned token {} on line {}", token, line);

        self.tokens.push(token);
        self.lines.push(line);
    }

    /// Tokenize a single physical line, updating the running indent width.
    fn scan_line(&mut self, text: &str, line: usize, prev_indent: &mut usize) -> Result<(), LexError> {
        let mut rest: &str = text.trim_start_matches(' ');
        let width: usize = text.len() - rest.len();

        // Blank lines never touch indentation.
        if rest.is_empty() {
            return Ok(());
        }

        if width % INDENT_WIDTH != 0 {
            return Err(LexError::BadIndent { line, width });
        }

        let first: usize = self.tokens.len();

        if width > *prev_indent {
            self.push(Token::Indent, line);
        } else {
            for _ in 0..(*prev_indent - width) / INDENT_WIDTH {
                self.push(Token::Dedent, line);
            }
        }
        *prev_indent = width;

        loop {
            rest = rest.trim_start_matches(' ');

            if rest.is_empty() || rest.starts_with('#') {
                break;
            }

            let token: Token = next_token(&mut rest, line)?;
            self.push(token, line);
        }

        // A comment line at unchanged depth produces nothing.
        if self.tokens.len() > first {
            self.push(Token::Newline, line);
        }

        Ok(())
    }

    // ───────────────────────────── cursor ─────────────────────────────────

    /// The token under the cursor (`Eof` once the stream is exhausted).
    pub fn current_token(&self) -> &Token {
        &self.tokens[self.current]
    }

    /// Advance and return the new current token.  Sticks at `Eof`.
    pub fn next_token(&mut self) -> &Token {
        if self.current + 1 < self.tokens.len() {
            self.current += 1;
        }

        self.current_token()
    }

    /// Source line of the current token, for diagnostics.
    pub fn current_line(&self) -> usize {
        self.lines[self.current]
    }

    /// Every token produced, `Eof` included.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    // ─────────────────────────── assertions ───────────────────────────────

    /// Fail unless the current token has the given kind.
    pub fn expect(&self, kind: TokenKind) -> Result<&Token, LexError> {
        let token: &Token = self.current_token();

        if !token.is(kind) {
            debug!("Expected {}, found {}", kind, token);

            return Err(LexError::UnexpectedToken {
                line: self.current_line(),
                expected: kind,
                found: token.clone(),
            });
        }

        Ok(token)
    }

    /// Fail unless the current token equals `expected`, payload included.
    /// Only valued tokens (number, identifier, char, string) can be checked.
    pub fn expect_value(&self, expected: &Token) -> Result<(), LexError> {
        let token: &Token = self.current_token();

        if !token.has_value() {
            return Err(LexError::UnexpectedToken {
                line: self.current_line(),
                expected: expected.kind(),
                found: token.clone(),
            });
        }

        self.expect(expected.kind())?;

        if token != expected {
            debug!("Expected {}, found {}", expected, token);

            return Err(LexError::UnexpectedValue {
                line: self.current_line(),
                expected: expected.clone(),
                found: token.clone(),
            });
        }

        Ok(())
    }

    /// Current token must be an identifier; return its name.
    pub fn expect_id(&self) -> Result<&str, LexError> {
        match self.expect(TokenKind::Id)? {
            Token::Id(name) => Ok(name),
            _ => unreachable!("expect(Id) returned a non-identifier"),
        }
    }

    /// Advance, then [`expect`](Self::expect).
    pub fn expect_next(&mut self, kind: TokenKind) -> Result<&Token, LexError> {
        self.next_token();
        self.expect(kind)
    }

    /// Advance, then [`expect_value`](Self::expect_value).
    pub fn expect_next_value(&mut self, expected: &Token) -> Result<(), LexError> {
        self.next_token();
        self.expect_value(expected)
    }

    /// Advance, then [`expect_id`](Self::expect_id).
    pub fn expect_next_id(&mut self) -> Result<&str, LexError> {
        self.next_token();
        self.expect_id()
    }
}

// ───────────────────────────── recognizers ──────────────────────────────────

fn next_token(rest: &mut &str, line: usize) -> Result<Token, LexError> {
    for recognize in RECOGNIZERS {
        if let Some(token) = recognize(rest, line)? {
            return Ok(token);
        }
    }

    // `rest` is non-empty whenever the caller asks for a token.
    let ch: char = rest.chars().next().unwrap_or('\0');

    Err(LexError::UnrecognizedToken { line, ch })
}

#[inline(always)]
fn is_id_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

#[inline(always)]
fn is_id_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn word_len(rest: &str) -> usize {
    rest.bytes().take_while(|b| is_id_continue(*b)).count()
}

fn lex_keyword(rest: &mut &str, _line: usize) -> Result<Option<Token>, LexError> {
    let len: usize = word_len(rest);

    let Some(token) = KEYWORDS.get(&rest[..len]) else {
        return Ok(None);
    };

    let terminated: bool = match rest.as_bytes().get(len) {
        None => true,
        Some(b) => b.is_ascii_whitespace() || *b == b':' || *b == b',',
    };

    if !terminated {
        return Ok(None);
    }

    *rest = &rest[len..];

    Ok(Some(token.clone()))
}

fn lex_comparison(rest: &mut &str, _line: usize) -> Result<Option<Token>, LexError> {
    let Some(token) = rest.get(..2).and_then(|op| COMPARISONS.get(op)) else {
        return Ok(None);
    };

    *rest = &rest[2..];

    Ok(Some(token.clone()))
}

fn lex_symbol(rest: &mut &str, _line: usize) -> Result<Option<Token>, LexError> {
    match rest.as_bytes().first() {
        Some(b) if SYMBOLS.contains(b) => {
            let symbol: char = *b as char;
            *rest = &rest[1..];

            Ok(Some(Token::Char(symbol)))
        }
        _ => Ok(None),
    }
}

fn lex_number(rest: &mut &str, line: usize) -> Result<Option<Token>, LexError> {
    let len: usize = rest.bytes().take_while(u8::is_ascii_digit).count();

    if len == 0 {
        return Ok(None);
    }

    let digits: &str = &rest[..len];
    let value: i64 = digits.parse().map_err(|_| LexError::NumberOutOfRange {
        line,
        literal: digits.to_owned(),
    })?;

    *rest = &rest[len..];

    Ok(Some(Token::Number(value)))
}

/// Quoted by `'` or `"`; the opening quote must be matched to close.  An
/// unterminated literal runs to the end of the line.
fn lex_string(rest: &mut &str, _line: usize) -> Result<Option<Token>, LexError> {
    let quote: char = match rest.chars().next() {
        Some(q @ ('\'' | '"')) => q,
        _ => return Ok(None),
    };

    let body: &str = &rest[1..];
    let mut value: String = String::new();
    let mut consumed: usize = body.len();
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, escaped)) => value.push(escaped),
                None => value.push('\\'),
            },
            c if c == quote => {
                consumed = i + 1;
                break;
            }
            c => value.push(c),
        }
    }

    *rest = &body[consumed..];

    Ok(Some(Token::String(value)))
}

fn lex_identifier(rest: &mut &str, _line: usize) -> Result<Option<Token>, LexError> {
    match rest.as_bytes().first() {
        Some(b) if is_id_start(*b) => {
            let len: usize = word_len(rest);
            let name: String = rest[..len].to_owned();
            *rest = &rest[len..];

            Ok(Some(Token::Id(name)))
        }
        _ => Ok(None),
    }
}
