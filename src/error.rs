//! Errors raised while evaluating or compiling expressions.
//!
//! Navigation, coercion and compilation failures are all surfaced as
//! [`OgnlError`]. Structural problems in a tree (a ternary without three
//! children, an index into a missing child) are programming errors and panic
//! instead.

use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

use crate::parser::ParseError;

/// Errors that can occur while evaluating an expression tree.
#[derive(Debug, Clone, Error)]
pub enum OgnlError {
    /// The property could not be resolved on the target
    #[error("no such property '{name}' on {target}")]
    NoSuchProperty { target: String, name: String },

    /// A property step was applied to `null`
    #[error("source is null for getProperty(null, \"{name}\")")]
    NullTarget { name: String },

    /// The expression is not a valid assignment target
    #[error("inappropriate expression: '{0}' can not be assigned to")]
    InappropriateExpression(String),

    /// A method or constructor could not be resolved or its invocation failed
    #[error("method '{method}' failed: {reason}")]
    MethodFailed { method: String, reason: String },

    /// A value could not be converted to the type a target requires
    #[error("unable to convert '{value}' to {target}")]
    Coercion {
        value: String,
        target: String,
        #[source]
        cause: CoercionCause,
    },

    /// Source generation met a shape it cannot represent; evaluate interpreted instead
    #[error("unsupported compilation: {0}")]
    UnsupportedCompilation(String),

    /// Operands of an operator have incompatible types
    #[error("type error: {0}")]
    TypeError(String),

    /// Integral division or remainder by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Index outside of a list or array
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    /// A class name could not be resolved
    #[error("class not found: {0}")]
    ClassNotFound(String),

    /// The member access policy rejected the access
    #[error("access to member '{0}' denied")]
    AccessDenied(String),

    /// A string handed to an evaluation node did not parse
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Underlying failure behind an [`OgnlError::Coercion`].
#[derive(Debug, Clone, Error)]
pub enum CoercionCause {
    #[error(transparent)]
    Integer(#[from] ParseIntError),

    #[error(transparent)]
    Float(#[from] ParseFloatError),

    #[error(transparent)]
    Decimal(#[from] rust_decimal::Error),

    #[error("{0}")]
    Incompatible(String),
}

impl OgnlError {
    /// True for the "not representable as source" signal.
    ///
    /// Callers that try source generation first use this to fall back to
    /// interpreted evaluation without swallowing genuine failures.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, OgnlError::UnsupportedCompilation(_))
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        OgnlError::UnsupportedCompilation(msg.into())
    }

    pub(crate) fn method_failed(method: &str, reason: impl Into<String>) -> Self {
        OgnlError::MethodFailed {
            method: method.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn incompatible(value: &str, target: &str, reason: impl Into<String>) -> Self {
        OgnlError::Coercion {
            value: value.to_string(),
            target: target.to_string(),
            cause: CoercionCause::Incompatible(reason.into()),
        }
    }
}

pub type Result<T, E = OgnlError> = std::result::Result<T, E>;
