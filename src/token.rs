use log::debug;
use serde::Serialize;
use std::fmt;

/// The tokens recognized by the Mython lexer.
///
/// `Number`, `Id`, `Char` and `String` carry a payload; every other variant is
/// a keyword, a structural marker synthesized from indentation, or a
/// two‑character comparison operator.  Equality compares variant **and**
/// payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Token {
    /// An integer literal
    Number(i64),

    /// A user‑defined identifier
    Id(String),

    /// A single punctuation character such as `=`, `.` or `:`
    Char(char),

    /// A string literal (contents without quotes, escapes resolved)
    String(String),

    /// 'class'
    Class,

    /// 'return'
    Return,

    /// 'if'
    If,

    /// 'else'
    Else,

    /// 'def'
    Def,

    /// 'print'
    Print,

    /// 'and'
    And,

    /// 'or'
    Or,

    /// 'not'
    Not,

    /// 'None'
    None,

    /// 'True'
    True,

    /// 'False'
    False,

    /// Indentation grew by one block level
    Indent,

    /// Indentation shrank by one block level
    Dedent,

    /// End of a logical line
    Newline,

    /// End‑of‑input marker
    Eof,

    /// '=='
    Eq,

    /// '!='
    NotEq,

    /// '<='
    LessOrEq,

    /// '>='
    GreaterOrEq,
}

/// Payload‑free tag of a [`Token`], used by the cursor's typed assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    Id,
    Char,
    String,
    Class,
    Return,
    If,
    Else,
    Def,
    Print,
    And,
    Or,
    Not,
    None,
    True,
    False,
    Indent,
    Dedent,
    Newline,
    Eof,
    Eq,
    NotEq,
    LessOrEq,
    GreaterOrEq,
}

impl Token {
    /// The tag of this token with any payload stripped.
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Number(_) => TokenKind::Number,
            Token::Id(_) => TokenKind::Id,
            Token::Char(_) => TokenKind::Char,
            Token::String(_) => TokenKind::String,
            Token::Class => TokenKind::Class,
            Token::Return => TokenKind::Return,
            Token::If => TokenKind::If,
            Token::Else => TokenKind::Else,
            Token::Def => TokenKind::Def,
            Token::Print => TokenKind::Print,
            Token::And => TokenKind::And,
            Token::Or => TokenKind::Or,
            Token::Not => TokenKind::Not,
            Token::None => TokenKind::None,
            Token::True => TokenKind::True,
            Token::False => TokenKind::False,
            Token::Indent => TokenKind::Indent,
            Token::Dedent => TokenKind::Dedent,
            Token::Newline => TokenKind::Newline,
            Token::Eof => TokenKind::Eof,
            Token::Eq => TokenKind::Eq,
            Token::NotEq => TokenKind::NotEq,
            Token::LessOrEq => TokenKind::LessOrEq,
            Token::GreaterOrEq => TokenKind::GreaterOrEq,
        }
    }

    /// Does this token carry a payload that `expect_value` can check?
    pub fn has_value(&self) -> bool {
        matches!(
            self,
            Token::Number(_) | Token::Id(_) | Token::Char(_) | Token::String(_)
        )
    }

    #[inline]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    #[inline]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self, Token::Char(ch) if *ch == c)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug already spells the bare variant name.
        write!(f, "{:?}", self)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug!("Formatting token: {:?}", self);

        match self {
            Token::Number(n) => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                write!(f, "Number{{{}}}", buf.format(*n))
            }
            Token::Id(s) => write!(f, "Id{{{}}}", s),
            Token::Char(c) => write!(f, "Char{{{}}}", c),
            Token::String(s) => write!(f, "String{{{}}}", s),
            other => write!(f, "{}", other.kind()),
        }
    }
}
