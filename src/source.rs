//! Source generation.
//!
//! Besides interpreting a tree, every node can render an equivalent
//! accessor expression. Fragments are Rust-flavoured text over four
//! bindings:
//!
//! | Binding  | Meaning                                                  |
//! |----------|----------------------------------------------------------|
//! | `ctx`    | the evaluation context                                   |
//! | `root`   | the context root                                         |
//! | `target` | the object the accessor is applied to                    |
//! | `$value` | the value being assigned (setter fragments only)         |
//!
//! Generation walks the tree against live values, so the context ends up in
//! the same state a `get_value` would leave it in. The sample is only read:
//! assignments are rendered, not performed, and operands a short circuit
//! skips are not evaluated. Shapes with no
//! straightforward rendering (map literals, projections, selections,
//! lambdas, evaluations, null-safe chains) fail with
//! [`OgnlError::UnsupportedCompilation`], which [`compile`] turns into an
//! interpreted fallback.

use std::fmt;

use log::debug;

use crate::{
    ast::Expression,
    context::{ChainState, Context, LocalReference, SourceBase},
    error::{OgnlError, Result},
    value::{Value, ValueType},
};

/// A generated fragment together with the value it evaluated to while it
/// was generated.
#[derive(Debug, Clone)]
pub(crate) struct Fragment {
    pub code: String,
    pub value: Value,
}

impl Fragment {
    pub fn new(code: impl Into<String>, value: Value) -> Self {
        Fragment {
            code: code.into(),
            value,
        }
    }

    pub fn value_type(&self) -> Option<ValueType> {
        self.value.value_type()
    }
}

/// Placeholder for the assigned value in setter fragments.
pub const VALUE_BINDING: &str = "$value";

/// Renders a literal with its type suffix.
pub fn literal(value: &Value) -> Result<String> {
    let code = match value {
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Byte(n) => format!("{}i8", n),
        Value::Char(c) => format!("{:?}", c),
        Value::Short(n) => format!("{}i16", n),
        Value::Int(n) => n.to_string(),
        Value::Long(n) => format!("{}i64", n),
        Value::BigInteger(n) => format!("{}i128", n),
        Value::Float(n) => format!("{:?}f32", n),
        Value::Double(n) => format!("{:?}", n),
        Value::BigDecimal(n) => format!("dec!({})", n),
        Value::String(s) => format!("{:?}", &**s),
        other => {
            return Err(OgnlError::unsupported(format!(
                "{} literal has no source form",
                other.type_name()
            )));
        }
    };
    Ok(code)
}

/// Whether `ty` replaces `last` as the widest operand type of an addition.
///
/// This is an approximation of the interpreted result type, kept for
/// compatibility with generated accessors rather than derived from the
/// lattice: the rules are checked in order and the first match wins, which
/// makes some pairs asymmetric (`float` then `int` yields `int`, `int` then
/// `float` yields `float`).
pub fn is_wider(ty: &ValueType, last: Option<&ValueType>) -> bool {
    let Some(last) = last else {
        return true;
    };
    let big = |t: &ValueType| matches!(t, ValueType::BigDecimal | ValueType::BigInteger);
    if *last == ValueType::String {
        return false;
    }
    if *ty == ValueType::String || big(ty) {
        return true;
    }
    if big(last) {
        return false;
    }
    if *ty == ValueType::Double {
        return true;
    }
    if *ty == ValueType::Int && *last == ValueType::Double {
        return false;
    }
    true
}

/// Wraps a navigation suffix with the binding it starts from when it is
/// not a continuation of a chain.
pub(crate) fn navigation(ctx: &Context, suffix: String) -> String {
    if ctx.chain().in_chain() {
        suffix
    } else {
        format!("{}{}", ctx.chain().base.binding(), suffix)
    }
}

/// Runs `generate` outside of any chain, with free-standing navigation
/// starting at `base`. The chain state is restored afterwards.
pub(crate) fn detached<T>(
    ctx: &mut Context,
    base: SourceBase,
    generate: impl FnOnce(&mut Context) -> Result<T>,
) -> Result<T> {
    let saved = std::mem::replace(
        ctx.chain_mut(),
        ChainState {
            current_chain: None,
            base,
            pending_index: None,
        },
    );
    let result = generate(ctx);
    *ctx.chain_mut() = saved;
    result
}

/// `a as T`, unless the operand already has type `T`.
pub(crate) fn cast(fragment: &Fragment, ty: &ValueType) -> String {
    match fragment.value_type() {
        Some(own) if own == *ty => fragment.code.clone(),
        _ if ty.source_name() == "Value" => fragment.code.clone(),
        _ => format!("{} as {}", fragment.code, ty.source_name()),
    }
}

/// Result of compiling an expression to source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compiled {
    Source {
        getter: String,
        /// `None` when the expression is not assignable
        setter: Option<String>,
        locals: Vec<LocalReference>,
    },
    /// The expression must be evaluated by walking the tree.
    Interpreted { reason: String },
}

impl fmt::Display for Compiled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compiled::Source {
                getter,
                setter,
                locals,
            } => {
                for local in locals {
                    writeln!(f, "{}", local)?;
                }
                writeln!(f, "get: {}", getter)?;
                match setter {
                    Some(setter) => write!(f, "set: {}", setter),
                    None => write!(f, "set: <not assignable>"),
                }
            }
            Compiled::Interpreted { reason } => write!(f, "interpreted: {}", reason),
        }
    }
}

/// Generates getter and setter source for `expression` against the
/// context root, falling back to [`Compiled::Interpreted`] when the tree
/// holds a shape that has no source form.
///
/// # Examples
///
/// ```
/// use ognl::{Context, Value, source::{self, Compiled}};
///
/// let expr: ognl::Expression = "name".parse().unwrap();
/// let root = Value::map(vec![(Value::string("name"), Value::string("Ada"))]);
/// let mut ctx = Context::with_root(root);
/// match source::compile(&expr, &mut ctx).unwrap() {
///     Compiled::Source { getter, setter, .. } => {
///         assert_eq!(getter, r#"target.key("name")"#);
///         assert_eq!(setter.as_deref(), Some(r#"target.set_key("name", $value)"#));
///     }
///     Compiled::Interpreted { reason } => panic!("{}", reason),
/// }
/// ```
pub fn compile(expression: &Expression, ctx: &mut Context) -> Result<Compiled> {
    let root = ctx.root().clone();
    ctx.take_locals();
    let getter = match expression.get_source(ctx, &root) {
        Ok(code) => code,
        Err(err) if err.is_unsupported() => {
            debug!("evaluating `{}` interpreted: {}", expression, err);
            return Ok(Compiled::Interpreted {
                reason: err.to_string(),
            });
        }
        Err(err) => return Err(err),
    };
    let setter = match expression.set_source(ctx, &root) {
        Ok(code) => Some(code),
        Err(OgnlError::InappropriateExpression(_)) => None,
        Err(err) if err.is_unsupported() => None,
        Err(err) => return Err(err),
    };
    Ok(Compiled::Source {
        getter,
        setter,
        locals: ctx.take_locals(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn literals_carry_suffixes() {
        assert_eq!(literal(&Value::Long(5)).unwrap(), "5i64");
        assert_eq!(literal(&Value::Float(1.5)).unwrap(), "1.5f32");
        assert_eq!(literal(&Value::Double(2.0)).unwrap(), "2.0");
        assert_eq!(literal(&Value::BigDecimal(Decimal::new(15, 1))).unwrap(), "dec!(1.5)");
        assert_eq!(literal(&Value::string("a\"b")).unwrap(), r#""a\"b""#);
        assert!(literal(&Value::list(vec![])).unwrap_err().is_unsupported());
    }

    #[test]
    fn strings_stay_widest() {
        assert!(is_wider(&ValueType::String, Some(&ValueType::Int)));
        assert!(!is_wider(&ValueType::Int, Some(&ValueType::String)));
        assert!(!is_wider(&ValueType::Double, Some(&ValueType::String)));
    }
}
