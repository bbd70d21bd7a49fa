use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::ast::Token;

/// Character offset into the expression text.
pub type Position = usize;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: Position },

    #[error("unterminated literal starting at position {position}")]
    Unterminated { position: Position },

    #[error("invalid escape sequence '\\{ch}' at position {position}")]
    InvalidEscape { ch: char, position: Position },

    #[error("invalid number literal '{text}' at position {position}")]
    InvalidNumber { text: String, position: Position },
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    token_start: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            token_start: 0,
        }
    }

    /// Offset at which the most recently returned token starts.
    pub fn token_start(&self) -> Position {
        self.token_start
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_escape(&mut self) -> Result<char, LexError> {
        let position = self.position;
        self.advance(); // backslash
        let ch = self
            .current_char()
            .ok_or(LexError::Unterminated { position })?;
        self.advance();
        let escaped = match ch {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            '0' => '\0',
            '\'' | '"' | '\\' => ch,
            'u' => {
                let hex: String = (0..4).filter_map(|i| self.peek_char(i)).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or(LexError::InvalidEscape { ch, position })?;
                self.position += 4;
                code
            }
            other => return Err(LexError::InvalidEscape { ch: other, position }),
        };
        Ok(escaped)
    }

    /// Reads a quoted literal. Single quotes around exactly one character
    /// produce a char, anything else a string.
    fn read_quoted(&mut self, quote: char) -> Result<Token, LexError> {
        let start = self.position;
        self.advance(); // opening quote

        let mut result = String::new();
        loop {
            match self.current_char() {
                None => return Err(LexError::Unterminated { position: start }),
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => result.push(self.read_escape()?),
                Some(c) => {
                    result.push(c);
                    self.advance();
                }
            }
        }

        let mut chars = result.chars();
        match (quote, chars.next(), chars.next()) {
            ('\'', Some(c), None) => Ok(Token::Char(c)),
            _ => Ok(Token::String(result)),
        }
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position;

        if self.current_char() == Some('0') && matches!(self.peek_char(1), Some('x' | 'X')) {
            self.position += 2;
            let mut digits = String::new();
            while let Some(ch) = self.current_char().filter(char::is_ascii_hexdigit) {
                digits.push(ch);
                self.advance();
            }
            let invalid = || LexError::InvalidNumber {
                text: format!("0x{}", digits),
                position: start,
            };
            let n = i64::from_str_radix(&digits, 16).map_err(|_| invalid())?;
            return Ok(match self.current_char() {
                Some('l' | 'L') => {
                    self.advance();
                    Token::Long(n)
                }
                _ => Token::Int(n),
            });
        }

        let mut number = String::new();
        let mut is_real = false;
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.' && !is_real && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_real = true;
                number.push(ch);
                self.advance();
            } else if matches!(ch, 'e' | 'E')
                && (self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
                    || (matches!(self.peek_char(1), Some('+' | '-'))
                        && self.peek_char(2).is_some_and(|c| c.is_ascii_digit())))
            {
                is_real = true;
                number.push(ch);
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.current_char() {
                    number.push(sign);
                    self.advance();
                }
            } else {
                break;
            }
        }

        let invalid = |text: &str| LexError::InvalidNumber {
            text: text.to_string(),
            position: start,
        };
        let suffix = self.current_char().filter(|c| "lLhHbBfFdD".contains(*c));
        if suffix.is_some() {
            self.advance();
        }
        let token = match suffix {
            Some('l' | 'L') if !is_real => Token::Long(number.parse().map_err(|_| invalid(&number))?),
            Some('h' | 'H') if !is_real => {
                Token::BigInteger(number.parse().map_err(|_| invalid(&number))?)
            }
            Some('b' | 'B') => Token::BigDecimal(
                Decimal::from_str(&number)
                    .or_else(|_| Decimal::from_scientific(&number))
                    .map_err(|_| invalid(&number))?,
            ),
            Some('f' | 'F') => Token::Float(number.parse().map_err(|_| invalid(&number))?),
            Some('d' | 'D') => Token::Double(number.parse().map_err(|_| invalid(&number))?),
            Some(_) => return Err(invalid(&number)),
            None if is_real => Token::Double(number.parse().map_err(|_| invalid(&number))?),
            None => Token::Int(number.parse().map_err(|_| invalid(&number))?),
        };
        Ok(token)
    }

    /// Advances past one character and returns `token`.
    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    /// Consumes the current character, then `second` if it follows, picking
    /// between the two-character and one-character token.
    fn pair(&mut self, second: char, double: Token, single: Token) -> Token {
        self.advance();
        if self.current_char() == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        self.token_start = self.position;

        let token = match self.current_char() {
            None => Token::Eof,
            Some('(') => self.single(Token::LParen),
            Some(')') => self.single(Token::RParen),
            Some('[') => self.single(Token::LBracket),
            Some(']') => self.single(Token::RBracket),
            Some('{') => self.single(Token::LBrace),
            Some('}') => self.single(Token::RBrace),
            Some(',') => self.single(Token::Comma),
            Some('@') => self.single(Token::At),
            Some('$') => self.single(Token::Dollar),
            Some('~') => self.single(Token::Tilde),
            Some('+') => self.single(Token::Plus),
            Some('-') => self.single(Token::Minus),
            Some('*') => self.single(Token::Star),
            Some('/') => self.single(Token::Slash),
            Some('%') => self.single(Token::Percent),
            Some('^') => self.single(Token::Caret),
            Some('#') => self.pair('{', Token::HashBrace, Token::Hash),
            Some(':') => self.pair('[', Token::ColonBracket, Token::Colon),
            Some('=') => self.pair('=', Token::Eq, Token::Assign),
            Some('!') => self.pair('=', Token::NotEq, Token::Bang),
            Some('|') => self.pair('|', Token::Or, Token::BitOr),
            Some('&') => self.pair('&', Token::And, Token::BitAnd),
            Some('.') => self.pair('?', Token::NullSafeDot, Token::Dot),
            Some('?') => {
                if self.peek_char(1) == Some('.')
                    && !self.peek_char(2).is_some_and(|c| c.is_ascii_digit())
                {
                    self.position += 2;
                    Token::NullSafeDot
                } else {
                    self.single(Token::Question)
                }
            }
            Some('<') => match self.peek_char(1) {
                Some('<') => {
                    self.position += 2;
                    Token::ShiftLeft
                }
                Some('=') => {
                    self.position += 2;
                    Token::LessEq
                }
                _ => self.single(Token::Less),
            },
            Some('>') => match (self.peek_char(1), self.peek_char(2)) {
                (Some('>'), Some('>')) => {
                    self.position += 3;
                    Token::UnsignedShiftRight
                }
                (Some('>'), _) => {
                    self.position += 2;
                    Token::ShiftRight
                }
                (Some('='), _) => {
                    self.position += 2;
                    Token::GreaterEq
                }
                _ => self.single(Token::Greater),
            },
            Some(quote @ ('"' | '\'')) => self.read_quoted(quote)?,
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();
                Token::keyword(&ident).unwrap_or(Token::Identifier(ident))
            }
            Some(ch) => {
                return Err(LexError::UnexpectedChar {
                    ch,
                    position: self.position,
                });
            }
        };
        Ok(token)
    }

    /// Lexes the whole input, including the trailing [`Token::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[test]
fn test_keywords() {
    let tokens = Lexer::new("and or not in instanceof new true null shl").tokenize();
    assert_eq!(
        tokens,
        Ok(vec![
            Token::And,
            Token::Or,
            Token::Not,
            Token::In,
            Token::Instanceof,
            Token::New,
            Token::Boolean(true),
            Token::Null,
            Token::ShiftLeft,
            Token::Eof,
        ])
    );
}

#[test]
fn test_numeric_suffixes() {
    let tokens = Lexer::new("1 2L 3H 1.5F 2.5 4D 1.10B 0x1F 1e3").tokenize();
    assert_eq!(
        tokens,
        Ok(vec![
            Token::Int(1),
            Token::Long(2),
            Token::BigInteger(3),
            Token::Float(1.5),
            Token::Double(2.5),
            Token::Double(4.0),
            Token::BigDecimal(Decimal::new(110, 2)),
            Token::Int(31),
            Token::Double(1000.0),
            Token::Eof,
        ])
    );
}

#[test]
fn test_null_safe_and_subscripts() {
    let tokens = Lexer::new("a?.b.?c[$]").tokenize();
    assert_eq!(
        tokens,
        Ok(vec![
            Token::Identifier("a".into()),
            Token::NullSafeDot,
            Token::Identifier("b".into()),
            Token::NullSafeDot,
            Token::Identifier("c".into()),
            Token::LBracket,
            Token::Dollar,
            Token::RBracket,
            Token::Eof,
        ])
    );
}

#[test]
fn test_quotes() {
    let mut lexer = Lexer::new(r#"'c' 'cd' "e\n" 'A'"#);
    assert_eq!(lexer.next_token(), Ok(Token::Char('c')));
    assert_eq!(lexer.next_token(), Ok(Token::String("cd".into())));
    assert_eq!(lexer.next_token(), Ok(Token::String("e\n".into())));
    assert_eq!(lexer.next_token(), Ok(Token::Char('A')));
}

#[test]
fn test_errors_carry_position() {
    let mut lexer = Lexer::new("a ; b");
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("a".into())));
    assert_eq!(
        lexer.next_token(),
        Err(LexError::UnexpectedChar { ch: ';', position: 2 })
    );
    assert_eq!(
        Lexer::new("\"open").tokenize(),
        Err(LexError::Unterminated { position: 0 })
    );
}
