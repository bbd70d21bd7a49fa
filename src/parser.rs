use std::{mem, sync::Arc};

use thiserror::Error;

use crate::{
    ast::{
        BinaryOp, CompareOp, Expression, ExpressionBuilder, NodeId, NodeKind, Token, UnaryOp,
    },
    lexer::{LexError, Lexer, Position},
    value::{DynamicSubscript, Value},
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected}, found {found} at position {position}")]
    Unexpected {
        expected: String,
        found: String,
        position: Position,
    },
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    position: Position,
    builder: ExpressionBuilder,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token()?;
        Ok(Parser {
            position: lexer.token_start(),
            lexer,
            current_token,
            builder: ExpressionBuilder::new(),
        })
    }

    /// Parses the whole input as one expression.
    pub fn parse(mut self) -> Result<Expression, ParseError> {
        let root = self.parse_sequence()?;
        self.expect(Token::Eof)?;
        Ok(self.builder.finish(root))
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        self.position = self.lexer.token_start();
        Ok(())
    }

    fn unexpected<T>(&self, expected: &str) -> Result<T, ParseError> {
        Err(ParseError::Unexpected {
            expected: expected.to_string(),
            found: self.current_token.to_string(),
            position: self.position,
        })
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if self.current_token != expected {
            return self.unexpected(&format!("'{}'", expected));
        }
        self.advance()
    }

    fn check(&self, token: &Token) -> bool {
        &self.current_token == token
    }

    /// Consumes `token` if it is current.
    fn eat(&mut self, token: &Token) -> Result<bool, ParseError> {
        if self.check(token) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn identifier(&mut self) -> Result<String, ParseError> {
        match &self.current_token {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => self.unexpected("identifier"),
        }
    }

    fn class_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.identifier()?;
        while self.check(&Token::Dot) {
            self.advance()?;
            name.push('.');
            name.push_str(&self.identifier()?);
        }
        Ok(name)
    }

    fn constant(&mut self, value: Value) -> NodeId {
        self.builder.leaf(NodeKind::Const(value))
    }

    fn node(&mut self, kind: NodeKind, children: Vec<NodeId>) -> NodeId {
        self.builder.node(kind, children)
    }

    /// `a, b, c`
    fn parse_sequence(&mut self) -> Result<NodeId, ParseError> {
        let first = self.parse_assign()?;
        if !self.check(&Token::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&Token::Comma)? {
            items.push(self.parse_assign()?);
        }
        Ok(self.node(NodeKind::Sequence, items))
    }

    /// `lhs = rhs`, right associative
    fn parse_assign(&mut self) -> Result<NodeId, ParseError> {
        let lhs = self.parse_ternary()?;
        if self.eat(&Token::Assign)? {
            let rhs = self.parse_assign()?;
            return Ok(self.node(NodeKind::Assign, vec![lhs, rhs]));
        }
        Ok(lhs)
    }

    fn parse_ternary(&mut self) -> Result<NodeId, ParseError> {
        let cond = self.parse_or()?;
        if self.eat(&Token::Question)? {
            let then = self.parse_ternary()?;
            self.expect(Token::Colon)?;
            let otherwise = self.parse_ternary()?;
            return Ok(self.node(NodeKind::Test, vec![cond, then, otherwise]));
        }
        Ok(cond)
    }

    fn parse_or(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or)? {
            let right = self.parse_and()?;
            left = self.node(NodeKind::Or, vec![left, right]);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_bit_or()?;
        while self.eat(&Token::And)? {
            let right = self.parse_bit_or()?;
            left = self.node(NodeKind::And, vec![left, right]);
        }
        Ok(left)
    }

    fn parse_bit_or(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_xor()?;
        while self.eat(&Token::BitOr)? {
            let right = self.parse_xor()?;
            left = self.node(NodeKind::Binary(BinaryOp::BitOr), vec![left, right]);
        }
        Ok(left)
    }

    fn parse_xor(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_bit_and()?;
        while self.eat(&Token::Caret)? {
            let right = self.parse_bit_and()?;
            left = self.node(NodeKind::Binary(BinaryOp::Xor), vec![left, right]);
        }
        Ok(left)
    }

    fn parse_bit_and(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_equality()?;
        while self.eat(&Token::BitAnd)? {
            let right = self.parse_equality()?;
            left = self.node(NodeKind::Binary(BinaryOp::BitAnd), vec![left, right]);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.current_token {
                Token::Eq => CompareOp::Eq,
                Token::NotEq => CompareOp::NotEq,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_relational()?;
            left = self.node(NodeKind::Compare(op), vec![left, right]);
        }
    }

    fn parse_relational(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_shift()?;
        loop {
            let kind = match self.current_token {
                Token::Less => NodeKind::Compare(CompareOp::Less),
                Token::Greater => NodeKind::Compare(CompareOp::Greater),
                Token::LessEq => NodeKind::Compare(CompareOp::LessEq),
                Token::GreaterEq => NodeKind::Compare(CompareOp::GreaterEq),
                Token::In => NodeKind::In { negated: false },
                Token::Not => {
                    // only `not in` can follow a complete operand
                    self.advance()?;
                    if !self.check(&Token::In) {
                        return self.unexpected("'in' after 'not'");
                    }
                    NodeKind::In { negated: true }
                }
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_shift()?;
            left = self.node(kind, vec![left, right]);
        }
    }

    fn parse_shift(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current_token {
                Token::ShiftLeft => BinaryOp::ShiftLeft,
                Token::ShiftRight => BinaryOp::ShiftRight,
                Token::UnsignedShiftRight => BinaryOp::UnsignedShiftRight,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_additive()?;
            left = self.node(NodeKind::Binary(op), vec![left, right]);
        }
    }

    fn parse_additive(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current_token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Subtract,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = self.node(NodeKind::Binary(op), vec![left, right]);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current_token {
                Token::Star => BinaryOp::Multiply,
                Token::Slash => BinaryOp::Divide,
                Token::Percent => BinaryOp::Remainder,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = self.node(NodeKind::Binary(op), vec![left, right]);
        }
    }

    fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        let op = match self.current_token {
            Token::Minus => UnaryOp::Negate,
            Token::Tilde => UnaryOp::BitNegate,
            Token::Bang | Token::Not => UnaryOp::Not,
            Token::Plus => {
                self.advance()?;
                return self.parse_unary();
            }
            _ => {
                let operand = self.parse_chain()?;
                if self.eat(&Token::Instanceof)? {
                    let class_name = self.class_name()?;
                    return Ok(self.node(NodeKind::Instanceof { class_name }, vec![operand]));
                }
                return Ok(operand);
            }
        };
        self.advance()?;
        let operand = self.parse_unary()?;
        Ok(self.node(NodeKind::Unary(op), vec![operand]))
    }

    /// A primary followed by any number of navigation steps.
    fn parse_chain(&mut self) -> Result<NodeId, ParseError> {
        let mut steps = vec![self.parse_primary()?];
        let mut null_safe = false;
        loop {
            match self.current_token {
                Token::Dot | Token::NullSafeDot => {
                    null_safe |= self.check(&Token::NullSafeDot);
                    self.advance()?;
                    let step = match self.current_token {
                        Token::LBrace => self.parse_projection()?,
                        Token::LParen => {
                            self.advance()?;
                            let inner = self.parse_sequence()?;
                            self.expect(Token::RParen)?;
                            inner
                        }
                        _ => self.parse_primary()?,
                    };
                    steps.push(step);
                }
                Token::LBracket => steps.push(self.parse_index()?),
                _ => break,
            }
        }
        if steps.len() == 1 {
            return Ok(steps.remove(0));
        }
        Ok(self.node(NodeKind::Chain { null_safe }, steps))
    }

    /// `[expr]` or a dynamic subscript `[^]`, `[|]`, `[$]`, `[*]`.
    fn parse_index(&mut self) -> Result<NodeId, ParseError> {
        self.expect(Token::LBracket)?;
        let subscript = match self.current_token {
            Token::Caret => Some(DynamicSubscript::First),
            Token::BitOr => Some(DynamicSubscript::Mid),
            Token::Dollar => Some(DynamicSubscript::Last),
            Token::Star => Some(DynamicSubscript::All),
            _ => None,
        };
        let index = match subscript {
            Some(subscript) => {
                self.advance()?;
                self.constant(Value::Subscript(subscript))
            }
            None => self.parse_sequence()?,
        };
        self.expect(Token::RBracket)?;
        Ok(self.node(NodeKind::Property { indexed: true }, vec![index]))
    }

    /// `{ expr }`, `{? expr }`, `{^ expr }` or `{$ expr }` after a dot.
    fn parse_projection(&mut self) -> Result<NodeId, ParseError> {
        self.expect(Token::LBrace)?;
        let kind = match self.current_token {
            Token::Question => NodeKind::Select,
            Token::Caret => NodeKind::SelectFirst,
            Token::Dollar => NodeKind::SelectLast,
            _ => NodeKind::Project,
        };
        if kind != NodeKind::Project {
            self.advance()?;
        }
        let body = self.parse_sequence()?;
        self.expect(Token::RBrace)?;
        Ok(self.node(kind, vec![body]))
    }

    fn parse_args(&mut self) -> Result<Vec<NodeId>, ParseError> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if !self.check(&Token::RParen) {
            args.push(self.parse_assign()?);
            while self.eat(&Token::Comma)? {
                args.push(self.parse_assign()?);
            }
        }
        self.expect(Token::RParen)?;
        Ok(args)
    }

    /// `(arg)` following an expression-valued primary turns it into an evaluation.
    fn maybe_eval(&mut self, target: NodeId) -> Result<NodeId, ParseError> {
        if !self.check(&Token::LParen) {
            return Ok(target);
        }
        self.advance()?;
        let arg = self.parse_sequence()?;
        self.expect(Token::RParen)?;
        Ok(self.node(NodeKind::Eval, vec![target, arg]))
    }

    fn parse_list_items(&mut self, close: Token) -> Result<Vec<NodeId>, ParseError> {
        let mut items = Vec::new();
        if !self.check(&close) {
            items.push(self.parse_assign()?);
            while self.eat(&Token::Comma)? {
                items.push(self.parse_assign()?);
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    /// Entries of `#{ ... }` after the opening brace.
    fn parse_map_entries(&mut self, class_name: Option<String>) -> Result<NodeId, ParseError> {
        let mut entries = Vec::new();
        if !self.check(&Token::RBrace) {
            loop {
                let key = self.parse_ternary()?;
                let mut pair = vec![key];
                if self.eat(&Token::Colon)? {
                    pair.push(self.parse_assign()?);
                }
                entries.push(self.node(NodeKind::KeyValue, pair));
                if !self.eat(&Token::Comma)? {
                    break;
                }
            }
        }
        self.expect(Token::RBrace)?;
        Ok(self.node(NodeKind::Map { class_name }, entries))
    }

    fn parse_lambda(&mut self) -> Result<NodeId, ParseError> {
        self.expect(Token::ColonBracket)?;
        let outer = mem::take(&mut self.builder);
        let body = self.parse_sequence();
        let inner = mem::replace(&mut self.builder, outer);
        let body = body?;
        self.expect(Token::RBracket)?;
        let lambda = Arc::new(inner.finish(body));
        Ok(self.constant(Value::Lambda(lambda)))
    }

    fn parse_static(&mut self) -> Result<NodeId, ParseError> {
        self.expect(Token::At)?;
        let class_name = self.class_name()?;
        self.expect(Token::At)?;
        let member = self.identifier()?;
        if self.check(&Token::LParen) {
            let args = self.parse_args()?;
            return Ok(self.node(
                NodeKind::StaticMethod {
                    class_name,
                    method: member,
                },
                args,
            ));
        }
        Ok(self.builder.leaf(NodeKind::StaticField {
            class_name,
            field: member,
        }))
    }

    fn parse_new(&mut self) -> Result<NodeId, ParseError> {
        self.expect(Token::New)?;
        let class_name = self.class_name()?;
        if self.eat(&Token::LBracket)? {
            let init = if self.eat(&Token::RBracket)? {
                self.expect(Token::LBrace)?;
                let items = self.parse_list_items(Token::RBrace)?;
                self.node(NodeKind::List, items)
            } else {
                let size = self.parse_sequence()?;
                self.expect(Token::RBracket)?;
                size
            };
            return Ok(self.node(
                NodeKind::Ctor {
                    class_name,
                    array: true,
                },
                vec![init],
            ));
        }
        let args = self.parse_args()?;
        Ok(self.node(
            NodeKind::Ctor {
                class_name,
                array: false,
            },
            args,
        ))
    }

    /// `#this`, `#root`, `#name`, `#name(arg)` or a typed map `#@Class@{ ... }`.
    fn parse_hash(&mut self) -> Result<NodeId, ParseError> {
        self.expect(Token::Hash)?;
        if self.eat(&Token::At)? {
            let class_name = self.class_name()?;
            self.expect(Token::At)?;
            self.expect(Token::LBrace)?;
            return self.parse_map_entries(Some(class_name));
        }
        let name = self.identifier()?;
        let node = match name.as_str() {
            "this" => self.builder.leaf(NodeKind::ThisVarRef),
            "root" => self.builder.leaf(NodeKind::RootVarRef),
            _ => self.builder.leaf(NodeKind::VarRef { name }),
        };
        self.maybe_eval(node)
    }

    /// Parse primary expressions: literals, references, literals of
    /// collections, static access, constructors and bare names
    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let value = match mem::replace(&mut self.current_token, Token::Eof) {
            // Literals
            Token::Int(n) => match i32::try_from(n) {
                Ok(n) => Value::Int(n),
                Err(_) => Value::Long(n),
            },
            Token::Long(n) => Value::Long(n),
            Token::BigInteger(n) => Value::BigInteger(n),
            Token::Float(n) => Value::Float(n),
            Token::Double(n) => Value::Double(n),
            Token::BigDecimal(n) => Value::BigDecimal(n),
            Token::Char(c) => Value::Char(c),
            Token::String(s) => Value::from(s),
            Token::Boolean(b) => Value::Boolean(b),
            Token::Null => Value::Null,

            Token::Identifier(name) => {
                self.advance()?;
                if self.check(&Token::LParen) {
                    let args = self.parse_args()?;
                    return Ok(self.node(NodeKind::Method { name }, args));
                }
                let name = self.constant(Value::from(name));
                return Ok(self.node(NodeKind::Property { indexed: false }, vec![name]));
            }

            other => {
                self.current_token = other;
                return match self.current_token {
                    Token::Hash => self.parse_hash(),
                    Token::HashBrace => {
                        self.advance()?;
                        self.parse_map_entries(None)
                    }
                    Token::LBrace => {
                        self.advance()?;
                        let items = self.parse_list_items(Token::RBrace)?;
                        Ok(self.node(NodeKind::List, items))
                    }
                    Token::LBracket => self.parse_index(),
                    Token::ColonBracket => self.parse_lambda(),
                    Token::At => self.parse_static(),
                    Token::New => self.parse_new(),
                    Token::LParen => {
                        self.advance()?;
                        let inner = self.parse_sequence()?;
                        self.expect(Token::RParen)?;
                        self.maybe_eval(inner)
                    }
                    _ => self.unexpected("expression"),
                };
            }
        };
        self.advance()?;
        Ok(self.constant(value))
    }
}

/// Parses `input` into a closed expression tree.
pub fn parse(input: &str) -> Result<Expression, ParseError> {
    Parser::new(input)?.parse()
}
