//! # OGNL
//!
//! An object-graph navigation language: expressions such as
//! `customer.orders.{? #this.total > 100 }.size()` are parsed into an
//! immutable [`Expression`] tree and evaluated against a root object held
//! by a [`Context`].
//!
//! Every tree supports four operations:
//!
//! - [`Expression::get_value`] reads a value
//! - [`Expression::set_value`] assigns through the expression
//! - [`Expression::get_source`] / [`Expression::set_source`] render an
//!   equivalent accessor (see [`source`])
//!
//! Host objects are reached only through the collaborators bundled in a
//! [`Runtime`]; the defaults navigate the crate's own [`Value`] model.
//!
//! ```
//! use ognl::{Context, Value};
//!
//! let root = Value::map(vec![
//!     ("items".into(), Value::list(vec![Value::Int(10), Value::Int(20), Value::Int(30)])),
//! ]);
//! let expr = ognl::parse_expression("items[$] + items.{? #this < 25 }.size()").unwrap();
//! let mut ctx = Context::with_root(root);
//! assert_eq!(ognl::get_value(&expr, &mut ctx).unwrap(), Value::Int(32));
//! ```

pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod ops;
pub mod parser;
pub mod runtime;
pub mod source;
pub mod trace;
pub mod value;

pub use ast::{Expression, ExpressionBuilder, NodeKind, NodeRef, Token};
pub use config::Config;
pub use context::Context;
pub use error::{OgnlError, Result};
pub use lexer::{LexError, Lexer, Position};
pub use parser::{ParseError, Parser};
pub use runtime::{ClassDef, ClassRef, Runtime, RuntimeBuilder};
pub use source::Compiled;
pub use value::{DynamicSubscript, Value, ValueType};

/// Parses expression text into a tree.
pub fn parse_expression(text: &str) -> Result<Expression> {
    Ok(parser::parse(text)?)
}

/// Evaluates `expression` against the context root.
pub fn get_value(expression: &Expression, ctx: &mut Context) -> Result<Value> {
    let root = ctx.root().clone();
    expression.get_value(ctx, &root)
}

/// Assigns `value` through `expression` into the context root.
pub fn set_value(expression: &Expression, ctx: &mut Context, value: Value) -> Result<()> {
    let root = ctx.root().clone();
    expression.set_value(ctx, &root, value)
}

/// Parses and evaluates `text` against `root` with a fresh context.
pub fn eval(text: &str, root: Value) -> Result<Value> {
    let expression = parse_expression(text)?;
    let mut ctx = Context::with_root(root);
    get_value(&expression, &mut ctx)
}
