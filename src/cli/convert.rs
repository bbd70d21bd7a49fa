//! JSON <-> Value conversion utilities

use serde_json::{Map, Number};

use crate::{
    value::{Value, ValueMap},
    Expression,
};

use super::CliError;

/// Convert a JSON document to a `Value`.
///
/// Objects become maps, integers become `Int` when they fit and `Long`
/// otherwise, and every other number becomes a `Double`.
pub fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => match i32::try_from(i) {
                Ok(i) => Value::Int(i),
                Err(_) => Value::Long(i),
            },
            None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::from(s),
        serde_json::Value::Array(arr) => Value::list(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => Value::Map(crate::value::MapRef::new(
            obj.into_iter()
                .map(|(k, v)| (Value::from(k), json_to_value(v)))
                .collect::<ValueMap>(),
        )),
    }
}

fn number(n: Option<Number>) -> serde_json::Value {
    n.map(serde_json::Value::Number).unwrap_or(serde_json::Value::Null)
}

fn lambda_text(body: &Expression) -> String {
    format!(":[{}]", body)
}

/// Convert a `Value` to JSON.
///
/// Maps keep their keys' string forms, beans render as objects of their
/// fields and classes as their names. Non-finite floats become `null`.
pub fn value_to_json(v: &Value) -> Result<serde_json::Value, CliError> {
    let json = match v {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Byte(n) => (*n).into(),
        Value::Short(n) => (*n).into(),
        Value::Int(n) => (*n).into(),
        Value::Long(n) => (*n).into(),
        Value::BigInteger(n) => match i64::try_from(*n) {
            Ok(n) => n.into(),
            Err(_) => serde_json::Value::String(n.to_string()),
        },
        Value::Float(n) => number(Number::from_f64(f64::from(*n))),
        Value::Double(n) => number(Number::from_f64(*n)),
        Value::BigDecimal(n) => serde_json::Value::String(n.to_string()),
        Value::Char(c) => serde_json::Value::String(c.to_string()),
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::List(_) | Value::Array(_) => serde_json::Value::Array(
            v.sequence()
                .unwrap_or_default()
                .iter()
                .map(value_to_json)
                .collect::<Result<_, _>>()?,
        ),
        Value::Map(m) => {
            let mut obj = Map::new();
            for (key, value) in m.read().iter() {
                obj.insert(key.to_string(), value_to_json(value)?);
            }
            serde_json::Value::Object(obj)
        }
        Value::Object(o) => {
            let mut obj = Map::new();
            for (key, value) in o.fields() {
                obj.insert(key, value_to_json(&value)?);
            }
            serde_json::Value::Object(obj)
        }
        Value::Class(c) => serde_json::Value::String(c.name().to_string()),
        Value::Lambda(body) => return Err(CliError::Unrepresentable(lambda_text(body))),
        Value::Subscript(s) => return Err(CliError::Unrepresentable(format!("[{}]", s.symbol()))),
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers_narrow_to_int_when_they_fit() {
        assert_eq!(json_to_value(json!(5)), Value::Int(5));
        assert_eq!(json_to_value(json!(5_000_000_000i64)), Value::Long(5_000_000_000));
        assert_eq!(json_to_value(json!(1.5)), Value::Double(1.5));
    }

    #[test]
    fn objects_become_maps() {
        let value = json_to_value(json!({"a": [1, true, null]}));
        assert_eq!(value.to_string(), "{a=[1, true, null]}");
        assert_eq!(value_to_json(&value).unwrap(), json!({"a": [1, true, null]}));
    }

    #[test]
    fn big_decimals_render_as_strings() {
        let value = Value::BigDecimal(rust_decimal::Decimal::new(125, 2));
        assert_eq!(value_to_json(&value).unwrap(), json!("1.25"));
    }
}
