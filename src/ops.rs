//! Numeric operations over the widening lattice.
//!
//! Every binary operator combines two values by first finding the wider of
//! their [`NumericType`]s and then computing in that type. Booleans and
//! chars take part in widening as the two narrowest numeric types, but a
//! result that would stay boolean or char is materialized as an `int`.
//! Strings sit above every numeric type: `+` concatenates once either side
//! is a string, and the other operators parse the string as a number.

use std::{cmp::Ordering, str::FromStr};

use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::{
    ast::{BinaryOp, CompareOp, UnaryOp},
    error::{CoercionCause, OgnlError, Result},
    value::{ArrayRef, ListRef, MapRef, Value, ValueType},
};

/// Position on the numeric widening lattice, narrowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumericType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
    NonNumeric,
}

impl NumericType {
    pub const ALL_NUMERIC: [NumericType; 10] = [
        NumericType::Boolean,
        NumericType::Byte,
        NumericType::Char,
        NumericType::Short,
        NumericType::Int,
        NumericType::Long,
        NumericType::BigInteger,
        NumericType::Float,
        NumericType::Double,
        NumericType::BigDecimal,
    ];

    pub fn is_numeric(self) -> bool {
        self != NumericType::NonNumeric
    }

    pub fn is_integral(self) -> bool {
        self <= NumericType::BigInteger
    }

    pub fn is_real(self) -> bool {
        matches!(self, NumericType::Float | NumericType::Double)
    }

    /// The type a result of this kind is materialized as.
    pub fn result_type(self) -> NumericType {
        match self {
            NumericType::Boolean | NumericType::Char => NumericType::Int,
            other => other,
        }
    }

    pub fn value_type(self) -> ValueType {
        match self {
            NumericType::Boolean => ValueType::Boolean,
            NumericType::Byte => ValueType::Byte,
            NumericType::Char => ValueType::Char,
            NumericType::Short => ValueType::Short,
            NumericType::Int => ValueType::Int,
            NumericType::Long => ValueType::Long,
            NumericType::BigInteger => ValueType::BigInteger,
            NumericType::Float => ValueType::Float,
            NumericType::Double => ValueType::Double,
            NumericType::BigDecimal => ValueType::BigDecimal,
            NumericType::NonNumeric => ValueType::String,
        }
    }

    pub fn of_type(ty: &ValueType) -> NumericType {
        match ty {
            ValueType::Boolean => NumericType::Boolean,
            ValueType::Byte => NumericType::Byte,
            ValueType::Char => NumericType::Char,
            ValueType::Short => NumericType::Short,
            ValueType::Int => NumericType::Int,
            ValueType::Long => NumericType::Long,
            ValueType::BigInteger => NumericType::BigInteger,
            ValueType::Float => NumericType::Float,
            ValueType::Double => NumericType::Double,
            ValueType::BigDecimal => NumericType::BigDecimal,
            _ => NumericType::NonNumeric,
        }
    }
}

pub fn numeric_type(value: &Value) -> NumericType {
    match value {
        Value::Boolean(_) => NumericType::Boolean,
        Value::Byte(_) => NumericType::Byte,
        Value::Char(_) => NumericType::Char,
        Value::Short(_) => NumericType::Short,
        Value::Int(_) => NumericType::Int,
        Value::Long(_) => NumericType::Long,
        Value::BigInteger(_) => NumericType::BigInteger,
        Value::Float(_) => NumericType::Float,
        Value::Double(_) => NumericType::Double,
        Value::BigDecimal(_) => NumericType::BigDecimal,
        _ => NumericType::NonNumeric,
    }
}

/// Wider of two lattice positions. Non-numeric operands compute as doubles.
pub fn widen(t1: NumericType, t2: NumericType) -> NumericType {
    let t1 = if t1.is_numeric() { t1 } else { NumericType::Double };
    let t2 = if t2.is_numeric() { t2 } else { NumericType::Double };
    t1.max(t2)
}

/// Truthiness as used by `&&`, `||`, `!` and `?:`.
pub fn truthy(value: &Value) -> bool {
    value.is_truthy()
}

fn coercion(value: &Value, target: &str, cause: impl Into<CoercionCause>) -> OgnlError {
    OgnlError::Coercion {
        value: value.to_string(),
        target: target.to_string(),
        cause: cause.into(),
    }
}

/// Integral view of a value, truncating reals.
pub fn long_value(value: &Value) -> Result<i128> {
    let n = match value {
        Value::Null => 0,
        Value::Boolean(b) => i128::from(*b),
        Value::Byte(n) => i128::from(*n),
        Value::Char(c) => i128::from(u32::from(*c)),
        Value::Short(n) => i128::from(*n),
        Value::Int(n) => i128::from(*n),
        Value::Long(n) => i128::from(*n),
        Value::BigInteger(n) => *n,
        Value::Float(n) => *n as i128,
        Value::Double(n) => *n as i128,
        Value::BigDecimal(n) => n.trunc().to_i128().unwrap_or_default(),
        other => {
            let text = other.to_string();
            let text = text.trim();
            match text.parse::<i128>() {
                Ok(n) => n,
                Err(int_err) => match text.parse::<f64>() {
                    Ok(real) => real as i128,
                    Err(_) => return Err(coercion(other, "long", int_err)),
                },
            }
        }
    };
    Ok(n)
}

pub fn double_value(value: &Value) -> Result<f64> {
    let n = match value {
        Value::Null => 0.0,
        Value::Float(n) => f64::from(*n),
        Value::Double(n) => *n,
        Value::BigDecimal(n) => n.to_f64().unwrap_or(f64::NAN),
        Value::BigInteger(n) => *n as f64,
        v if numeric_type(v).is_integral() => long_value(v)? as f64,
        other => {
            let text = other.to_string();
            let text = text.trim();
            if text.is_empty() {
                return Ok(0.0);
            }
            text.parse::<f64>()
                .map_err(|err| coercion(other, "double", err))?
        }
    };
    Ok(n)
}

pub fn decimal_value(value: &Value) -> Result<Decimal> {
    match value {
        Value::BigDecimal(n) => Ok(*n),
        Value::Float(_) | Value::Double(_) => {
            Decimal::try_from(double_value(value)?).map_err(|err| coercion(value, "BigDecimal", err))
        }
        v if numeric_type(v).is_integral() || v.is_null() => {
            Decimal::try_from_i128_with_scale(long_value(v)?, 0)
                .map_err(|err| coercion(v, "BigDecimal", err))
        }
        other => {
            let text = other.to_string();
            let text = text.trim();
            Decimal::from_str(text)
                .or_else(|_| Decimal::from_scientific(text))
                .map_err(|err| coercion(other, "BigDecimal", err))
        }
    }
}

/// Index value for list, array and indexed-property access.
pub fn index_value(value: &Value) -> Result<i64> {
    match value {
        Value::String(s) => s.trim().parse::<i64>().map_err(|err| coercion(value, "index", err)),
        v if numeric_type(v).is_numeric() => Ok(long_value(v)? as i64),
        other => Err(OgnlError::TypeError(format!(
            "{} cannot be used as an index",
            other.type_name()
        ))),
    }
}

/// Materializes an integral result in the given lattice type. Narrow
/// types wrap on overflow.
fn integral(ty: NumericType, n: i128) -> Value {
    match ty {
        NumericType::Byte => Value::Byte(n as i8),
        NumericType::Short => Value::Short(n as i16),
        NumericType::Long => Value::Long(n as i64),
        NumericType::BigInteger => Value::BigInteger(n),
        _ => Value::Int(n as i32),
    }
}

fn real(ty: NumericType, n: f64) -> Value {
    match ty {
        NumericType::Float => Value::Float(n as f32),
        _ => Value::Double(n),
    }
}

fn overflow(op: BinaryOp) -> OgnlError {
    OgnlError::TypeError(format!("arithmetic overflow in '{}'", op))
}

/// `a + b`: concatenation when either side is a string, numeric addition otherwise.
pub fn add(a: &Value, b: &Value) -> Result<Value> {
    let concat = || Value::from(format!("{}{}", a, b));
    if matches!(a, Value::String(_)) || matches!(b, Value::String(_)) {
        return Ok(concat());
    }
    if a.is_null() || b.is_null() {
        return Err(OgnlError::TypeError(format!("can't add values {} and {}", a, b)));
    }
    if !numeric_type(a).is_numeric() || !numeric_type(b).is_numeric() {
        return Ok(concat());
    }
    arithmetic(BinaryOp::Add, a, b)
}

/// Arithmetic in the widened type of both operands.
fn arithmetic(op: BinaryOp, a: &Value, b: &Value) -> Result<Value> {
    let ty = widen(numeric_type(a), numeric_type(b)).result_type();
    match ty {
        NumericType::BigDecimal => {
            let (x, y) = (decimal_value(a)?, decimal_value(b)?);
            let result = match op {
                BinaryOp::Add => x.checked_add(y),
                BinaryOp::Subtract => x.checked_sub(y),
                BinaryOp::Multiply => x.checked_mul(y),
                BinaryOp::Divide | BinaryOp::Remainder if y.is_zero() => {
                    return Err(OgnlError::DivisionByZero);
                }
                BinaryOp::Divide => x.checked_div(y),
                BinaryOp::Remainder => x.checked_rem(y),
                _ => unreachable!("{} is not arithmetic", op),
            };
            result.map(Value::BigDecimal).ok_or_else(|| overflow(op))
        }
        NumericType::Float | NumericType::Double => {
            let (x, y) = (double_value(a)?, double_value(b)?);
            let result = match op {
                BinaryOp::Add => x + y,
                BinaryOp::Subtract => x - y,
                BinaryOp::Multiply => x * y,
                BinaryOp::Divide => x / y,
                BinaryOp::Remainder => x % y,
                _ => unreachable!("{} is not arithmetic", op),
            };
            Ok(real(ty, result))
        }
        _ => {
            let (x, y) = (long_value(a)?, long_value(b)?);
            let result = match op {
                BinaryOp::Add => x.checked_add(y),
                BinaryOp::Subtract => x.checked_sub(y),
                BinaryOp::Multiply => x.checked_mul(y),
                BinaryOp::Divide | BinaryOp::Remainder if y == 0 => {
                    return Err(OgnlError::DivisionByZero);
                }
                BinaryOp::Divide => Some(x.wrapping_div(y)),
                BinaryOp::Remainder => Some(x.wrapping_rem(y)),
                _ => unreachable!("{} is not arithmetic", op),
            };
            let result = match (result, ty) {
                (Some(n), _) => n,
                (None, NumericType::BigInteger) => return Err(overflow(op)),
                (None, _) => match op {
                    BinaryOp::Add => x.wrapping_add(y),
                    BinaryOp::Subtract => x.wrapping_sub(y),
                    _ => x.wrapping_mul(y),
                },
            };
            Ok(integral(ty, result))
        }
    }
}

/// `&`, `|` and `^` over the integral views of both operands.
fn bitwise(op: BinaryOp, a: &Value, b: &Value) -> Result<Value> {
    let ty = match widen(numeric_type(a), numeric_type(b)).result_type() {
        NumericType::BigInteger | NumericType::BigDecimal => NumericType::BigInteger,
        NumericType::Float | NumericType::Double => NumericType::Long,
        other => other,
    };
    let (x, y) = (long_value(a)?, long_value(b)?);
    let (x, y) = if ty == NumericType::BigInteger {
        (x, y)
    } else {
        (i128::from(x as i64), i128::from(y as i64))
    };
    let result = match op {
        BinaryOp::BitAnd => x & y,
        BinaryOp::BitOr => x | y,
        BinaryOp::Xor => x ^ y,
        _ => unreachable!("{} is not bitwise", op),
    };
    Ok(integral(ty, result))
}

/// Shifts keep the type of the left operand.
fn shift(op: BinaryOp, a: &Value, b: &Value) -> Result<Value> {
    let ty = match numeric_type(a).result_type() {
        NumericType::NonNumeric | NumericType::Float | NumericType::Double => NumericType::Long,
        NumericType::BigDecimal => NumericType::BigInteger,
        other => other,
    };
    let x = long_value(a)?;
    let by = long_value(b)? as u32;
    let value = match ty {
        NumericType::BigInteger => {
            let by = by.min(127);
            match op {
                BinaryOp::ShiftLeft => Value::BigInteger(x.wrapping_shl(by)),
                BinaryOp::ShiftRight => Value::BigInteger(x >> by),
                _ => {
                    return Err(OgnlError::TypeError(
                        "unsigned shift right is not defined for BigInteger".into(),
                    ));
                }
            }
        }
        NumericType::Long => {
            let x = x as i64;
            Value::Long(match op {
                BinaryOp::ShiftLeft => x.wrapping_shl(by),
                BinaryOp::ShiftRight => x.wrapping_shr(by),
                _ => (x as u64).wrapping_shr(by) as i64,
            })
        }
        _ => {
            let x = x as i32;
            let shifted = match op {
                BinaryOp::ShiftLeft => x.wrapping_shl(by),
                BinaryOp::ShiftRight => x.wrapping_shr(by),
                _ => (x as u32).wrapping_shr(by) as i32,
            };
            if op == BinaryOp::UnsignedShiftRight {
                Value::Int(shifted)
            } else {
                integral(ty, i128::from(shifted))
            }
        }
    };
    Ok(value)
}

/// Applies one binary operator to a pair of operands.
pub fn binary(op: BinaryOp, a: &Value, b: &Value) -> Result<Value> {
    match op {
        BinaryOp::Add => add(a, b),
        BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Remainder => {
            arithmetic(op, a, b)
        }
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::Xor => bitwise(op, a, b),
        BinaryOp::ShiftLeft | BinaryOp::ShiftRight | BinaryOp::UnsignedShiftRight => {
            shift(op, a, b)
        }
    }
}

/// Result type of `a op b`, without computing it.
pub fn binary_type(op: BinaryOp, a: NumericType, b: NumericType) -> NumericType {
    match op {
        BinaryOp::Add if !a.is_numeric() || !b.is_numeric() => NumericType::NonNumeric,
        BinaryOp::ShiftLeft | BinaryOp::ShiftRight | BinaryOp::UnsignedShiftRight => {
            match a.result_type() {
                NumericType::NonNumeric | NumericType::Float | NumericType::Double => {
                    NumericType::Long
                }
                NumericType::BigDecimal => NumericType::BigInteger,
                _ if op == BinaryOp::UnsignedShiftRight && a <= NumericType::Int => {
                    NumericType::Int
                }
                other => other,
            }
        }
        op if op.is_bitwise() => match widen(a, b).result_type() {
            NumericType::BigDecimal => NumericType::BigInteger,
            NumericType::Float | NumericType::Double => NumericType::Long,
            other => other,
        },
        _ => widen(a, b).result_type(),
    }
}

pub fn unary(op: UnaryOp, value: &Value) -> Result<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Boolean(!truthy(value))),
        UnaryOp::Negate => Ok(match value {
            Value::BigDecimal(n) => Value::BigDecimal(-*n),
            Value::BigInteger(n) => Value::BigInteger(n.wrapping_neg()),
            Value::Float(n) => Value::Float(-*n),
            Value::Double(n) => Value::Double(-*n),
            Value::Long(n) => Value::Long(n.wrapping_neg()),
            Value::Byte(n) => Value::Byte(n.wrapping_neg()),
            Value::Short(n) => Value::Short(n.wrapping_neg()),
            v if numeric_type(v).is_numeric() => Value::Int((long_value(v)? as i32).wrapping_neg()),
            other => Value::Double(-double_value(other)?),
        }),
        UnaryOp::BitNegate => {
            let ty = match numeric_type(value).result_type() {
                NumericType::BigDecimal | NumericType::BigInteger => NumericType::BigInteger,
                NumericType::Float | NumericType::Double | NumericType::NonNumeric => {
                    NumericType::Long
                }
                other => other,
            };
            Ok(integral(ty, !long_value(value)?))
        }
    }
}

/// Numeric comparison in the widened type; `None` when NaN is involved.
fn compare_numbers(a: &Value, b: &Value) -> Result<Option<Ordering>> {
    let ty = widen(numeric_type(a), numeric_type(b));
    let ordering = match ty {
        NumericType::BigDecimal => match (decimal_value(a), decimal_value(b)) {
            (Ok(x), Ok(y)) => Some(x.cmp(&y)),
            _ => double_value(a)?.partial_cmp(&double_value(b)?),
        },
        NumericType::Float | NumericType::Double => double_value(a)?.partial_cmp(&double_value(b)?),
        _ => Some(long_value(a)?.cmp(&long_value(b)?)),
    };
    Ok(ordering)
}

/// Equality that never fails.
///
/// Identical objects and null pairs are equal, numbers compare by value
/// across types, a number equals a string that parses to the same value,
/// and everything else compares structurally (beans by identity).
pub fn equal(a: &Value, b: &Value) -> bool {
    if a.same(b) {
        return true;
    }
    let (ta, tb) = (numeric_type(a), numeric_type(b));
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => false,
        _ if ta.is_numeric() && tb.is_numeric() => {
            matches!(compare_numbers(a, b), Ok(Some(Ordering::Equal)))
        }
        (Value::String(s), other) | (other, Value::String(s)) if numeric_type(other).is_numeric() => {
            match s.trim().parse::<f64>() {
                Ok(parsed) => double_value(other).is_ok_and(|n| n == parsed),
                Err(_) => false,
            }
        }
        (Value::List(_) | Value::Array(_), Value::List(_) | Value::Array(_)) => {
            match (a.sequence(), b.sequence()) {
                (Some(x), Some(y)) => {
                    x.len() == y.len() && x.iter().zip(&y).all(|(p, q)| equal(p, q))
                }
                _ => false,
            }
        }
        _ => a == b,
    }
}

/// Ordering used by `<`, `>`, `<=` and `>=`.
///
/// Numbers compare numerically (null counting as zero), strings compare
/// lexically, and a string against a number is parsed. Anything else is a
/// type error.
pub fn compare(a: &Value, b: &Value) -> Result<Option<Ordering>> {
    let (ta, tb) = (numeric_type(a), numeric_type(b));
    match (a, b) {
        (Value::Null, Value::Null) => Ok(Some(Ordering::Equal)),
        (Value::String(x), Value::String(y)) => Ok(Some(x.cmp(y))),
        _ if (ta.is_numeric() || a.is_null()) && (tb.is_numeric() || b.is_null()) => {
            compare_numbers(a, b)
        }
        (Value::String(_), _) | (_, Value::String(_))
            if ta.is_numeric() || tb.is_numeric() || a.is_null() || b.is_null() =>
        {
            Ok(double_value(a)?.partial_cmp(&double_value(b)?))
        }
        _ => Err(OgnlError::TypeError(format!(
            "invalid comparison: {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

pub fn comparison(op: CompareOp, a: &Value, b: &Value) -> Result<bool> {
    let result = match op {
        CompareOp::Eq => equal(a, b),
        CompareOp::NotEq => !equal(a, b),
        CompareOp::Less => compare(a, b)? == Some(Ordering::Less),
        CompareOp::Greater => compare(a, b)? == Some(Ordering::Greater),
        CompareOp::LessEq => matches!(compare(a, b)?, Some(Ordering::Less | Ordering::Equal)),
        CompareOp::GreaterEq => {
            matches!(compare(a, b)?, Some(Ordering::Greater | Ordering::Equal))
        }
    };
    Ok(result)
}

/// Zero value of a declared type; `null` for reference types.
pub fn default_value(ty: &ValueType) -> Value {
    match ty {
        ValueType::Boolean => Value::Boolean(false),
        ValueType::Byte => Value::Byte(0),
        ValueType::Char => Value::Char('\0'),
        ValueType::Short => Value::Short(0),
        ValueType::Int => Value::Int(0),
        ValueType::Long => Value::Long(0),
        ValueType::Float => Value::Float(0.0),
        ValueType::Double => Value::Double(0.0),
        _ => Value::Null,
    }
}

fn parse_strict<T: FromStr>(value: &Value, target: &ValueType) -> Result<T>
where
    T::Err: Into<CoercionCause>,
{
    let text = value.to_string();
    text.trim()
        .parse::<T>()
        .map_err(|err| coercion(value, &target.class_name(), err))
}

/// Converts `value` to the declared type `target`.
///
/// Numbers narrow with wrap-around, strings are parsed strictly and report
/// the underlying parse error, and `null` stays `null`.
pub fn convert_value(value: &Value, target: &ValueType) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    if value.value_type().as_ref() == Some(target) {
        return Ok(value.clone());
    }
    let incompatible = || {
        OgnlError::incompatible(
            &value.to_string(),
            &target.class_name(),
            format!("{} is not convertible", value.type_name()),
        )
    };
    let is_text = matches!(value, Value::String(_));
    let converted = match target {
        ValueType::Boolean => Value::Boolean(truthy(value)),
        ValueType::Char => match value {
            Value::String(s) if s.chars().count() == 1 => Value::Char(s.chars().next().unwrap_or('\0')),
            v if numeric_type(v).is_integral() => {
                char::from_u32(long_value(v)? as u32).map(Value::Char).ok_or_else(incompatible)?
            }
            _ => return Err(incompatible()),
        },
        ValueType::Byte if is_text => Value::Byte(parse_strict(value, target)?),
        ValueType::Short if is_text => Value::Short(parse_strict(value, target)?),
        ValueType::Int if is_text => Value::Int(parse_strict(value, target)?),
        ValueType::Long if is_text => Value::Long(parse_strict(value, target)?),
        ValueType::BigInteger if is_text => Value::BigInteger(parse_strict(value, target)?),
        ValueType::Float if is_text => Value::Float(parse_strict(value, target)?),
        ValueType::Double if is_text => Value::Double(parse_strict(value, target)?),
        ValueType::BigDecimal if is_text => Value::BigDecimal(parse_strict(value, target)?),
        ty if NumericType::of_type(ty).is_numeric() => {
            if !numeric_type(value).is_numeric() {
                return Err(incompatible());
            }
            match NumericType::of_type(ty) {
                NumericType::Float => Value::Float(double_value(value)? as f32),
                NumericType::Double => Value::Double(double_value(value)?),
                NumericType::BigDecimal => Value::BigDecimal(decimal_value(value)?),
                other => integral(other, long_value(value)?),
            }
        }
        ValueType::String => Value::from(value.to_string()),
        ValueType::List => match value.sequence() {
            Some(items) => Value::List(ListRef::new(items)),
            None => return Err(incompatible()),
        },
        ValueType::Array(component) => match value.sequence() {
            Some(items) => {
                let items = items
                    .iter()
                    .map(|item| convert_value(item, component))
                    .collect::<Result<Vec<_>>>()?;
                Value::Array(ArrayRef::new((**component).clone(), items))
            }
            None => return Err(incompatible()),
        },
        ValueType::Map => match value {
            Value::Map(m) => Value::Map(MapRef::new(m.read().clone())),
            _ => return Err(incompatible()),
        },
        ValueType::Object(name) if name == "java.lang.Object" => value.clone(),
        ValueType::Object(name) => match value {
            Value::Object(o) if o.class().is_a(name) => value.clone(),
            _ => return Err(incompatible()),
        },
        _ => return Err(incompatible()),
    };
    Ok(converted)
}
