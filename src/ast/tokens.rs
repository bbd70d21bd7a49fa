use std::fmt;

use rust_decimal::Decimal;

/// Lexical tokens produced by the [`Lexer`](crate::lexer::Lexer).
///
/// Word operators (`and`, `bor`, `lte`, ...) are folded into the same tokens
/// as their symbolic spellings, so the parser never sees the difference.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Integer without suffix
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 0x1F
    /// ```
    Int(i64),

    /// Integer with an `L` suffix
    Long(i64),

    /// Integer with an `H` suffix
    ///
    /// # Examples
    /// ```text
    /// 170141183460469231731687303715884105727H
    /// ```
    BigInteger(i128),

    /// Real with an `F` suffix
    Float(f32),

    /// Real without suffix, or with a `D` suffix
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 2D
    /// ```
    Double(f64),

    /// Number with a `B` suffix
    ///
    /// # Examples
    /// ```text
    /// 1.10B
    /// ```
    BigDecimal(Decimal),

    /// Single-quoted, single character
    Char(char),

    /// Double-quoted string, or single-quoted text longer than one character
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'item #1'
    /// ```
    String(String),

    Boolean(bool),
    Null,

    /// Property, method or class name segment
    Identifier(String),

    // Punctuation
    /// `#`, introduces variables, `#this`, `#root` and maps
    Hash,
    /// `#{`
    HashBrace,
    /// `@`, delimits class names in static references
    At,
    /// `:[`, opens a lambda
    ColonBracket,
    Dot,
    /// `?.` or `.?`
    NullSafeDot,
    Comma,
    Colon,
    Question,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // Operators
    /// `=`
    Assign,
    /// `||` or `or`
    Or,
    /// `&&` or `and`
    And,
    /// `|` or `bor`
    BitOr,
    /// `^` or `xor`
    Caret,
    /// `&` or `band`
    BitAnd,
    /// `==` or `eq`
    Eq,
    /// `!=` or `neq`
    NotEq,
    /// `<` or `lt`
    Less,
    /// `>` or `gt`
    Greater,
    /// `<=` or `lte`
    LessEq,
    /// `>=` or `gte`
    GreaterEq,
    /// `<<` or `shl`
    ShiftLeft,
    /// `>>` or `shr`
    ShiftRight,
    /// `>>>` or `ushr`
    UnsignedShiftRight,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    /// `~`
    Tilde,
    /// `!`
    Bang,
    /// `$`, only meaningful as the select-last marker and `[$]`
    Dollar,

    // Keywords
    /// `not`, either unary negation or the first half of `not in`
    Not,
    In,
    Instanceof,
    New,

    Eof,
}

impl Token {
    /// Maps reserved words to their token; `None` for ordinary identifiers.
    pub fn keyword(word: &str) -> Option<Token> {
        let token = match word {
            "true" => Token::Boolean(true),
            "false" => Token::Boolean(false),
            "null" => Token::Null,
            "or" => Token::Or,
            "and" => Token::And,
            "bor" => Token::BitOr,
            "xor" => Token::Caret,
            "band" => Token::BitAnd,
            "eq" => Token::Eq,
            "neq" => Token::NotEq,
            "lt" => Token::Less,
            "gt" => Token::Greater,
            "lte" => Token::LessEq,
            "gte" => Token::GreaterEq,
            "shl" => Token::ShiftLeft,
            "shr" => Token::ShiftRight,
            "ushr" => Token::UnsignedShiftRight,
            "not" => Token::Not,
            "in" => Token::In,
            "instanceof" => Token::Instanceof,
            "new" => Token::New,
            _ => return None,
        };
        Some(token)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(n) => write!(f, "{}", n),
            Token::Long(n) => write!(f, "{}L", n),
            Token::BigInteger(n) => write!(f, "{}H", n),
            Token::Float(n) => write!(f, "{}F", n),
            Token::Double(n) => write!(f, "{}", n),
            Token::BigDecimal(n) => write!(f, "{}B", n),
            Token::Char(c) => write!(f, "'{}'", c),
            Token::String(s) => write!(f, "\"{}\"", s),
            Token::Boolean(b) => write!(f, "{}", b),
            Token::Null => write!(f, "null"),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Hash => write!(f, "#"),
            Token::HashBrace => write!(f, "#{{"),
            Token::At => write!(f, "@"),
            Token::ColonBracket => write!(f, ":["),
            Token::Dot => write!(f, "."),
            Token::NullSafeDot => write!(f, "?."),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Question => write!(f, "?"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Assign => write!(f, "="),
            Token::Or => write!(f, "||"),
            Token::And => write!(f, "&&"),
            Token::BitOr => write!(f, "|"),
            Token::Caret => write!(f, "^"),
            Token::BitAnd => write!(f, "&"),
            Token::Eq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Less => write!(f, "<"),
            Token::Greater => write!(f, ">"),
            Token::LessEq => write!(f, "<="),
            Token::GreaterEq => write!(f, ">="),
            Token::ShiftLeft => write!(f, "<<"),
            Token::ShiftRight => write!(f, ">>"),
            Token::UnsignedShiftRight => write!(f, ">>>"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Tilde => write!(f, "~"),
            Token::Bang => write!(f, "!"),
            Token::Dollar => write!(f, "$"),
            Token::Not => write!(f, "not"),
            Token::In => write!(f, "in"),
            Token::Instanceof => write!(f, "instanceof"),
            Token::New => write!(f, "new"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}
