use ognl::ast::BinaryOp;
use ognl::ops::{self, NumericType};
use ognl::{OgnlError, Value, ValueType};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

fn eval(text: &str) -> Value {
    ognl::eval(text, Value::Null).unwrap_or_else(|e| panic!("`{}` failed: {}", text, e))
}

/// One sample per lattice position, narrowest first.
fn samples() -> Vec<Value> {
    vec![
        Value::Boolean(true),
        Value::Byte(1),
        Value::Char('\u{2}'),
        Value::Short(3),
        Value::Int(4),
        Value::Long(5),
        Value::BigInteger(6),
        Value::Float(7.0),
        Value::Double(8.0),
        Value::BigDecimal(Decimal::from(9)),
    ]
}

fn lattice_type(position: usize) -> ValueType {
    match NumericType::ALL_NUMERIC[position] {
        NumericType::Boolean | NumericType::Char => ValueType::Int,
        other => other.value_type(),
    }
}

#[test]
fn test_every_pair_widens_to_the_wider_operand() {
    let values = samples();
    for (i, a) in values.iter().enumerate() {
        for (j, b) in values.iter().enumerate() {
            let expected = lattice_type(i.max(j));
            for op in [BinaryOp::Add, BinaryOp::Subtract, BinaryOp::Multiply] {
                let result = ops::binary(op, a, b).unwrap();
                assert_eq!(
                    result.value_type(),
                    Some(expected.clone()),
                    "{:?} {} {:?}",
                    a,
                    op,
                    b
                );
            }
        }
    }
}

#[test]
fn test_result_type_matches_computed_type() {
    let values = samples();
    for a in &values {
        for b in &values {
            let predicted = ops::binary_type(BinaryOp::Multiply, ops::numeric_type(a), ops::numeric_type(b));
            let result = ops::binary(BinaryOp::Multiply, a, b).unwrap();
            assert_eq!(Some(predicted.value_type()), result.value_type());
        }
    }
}

#[test]
fn test_widening_examples() {
    assert_eq!(eval("1 + 2L"), Value::Long(3));
    assert_eq!(eval("2 * 1.5F"), Value::Float(3.0));
    assert_eq!(eval("1.5F + 1.5"), Value::Double(3.0));
    assert_eq!(eval("1H * 3"), Value::BigInteger(3));
    assert_eq!(eval("1.10B + 2"), Value::BigDecimal(Decimal::new(310, 2)));
    assert_eq!(eval("true + true"), Value::Int(2));
    assert_eq!(eval("'a' + 1"), Value::Int(98));
}

#[test]
fn test_strings_poison_addition() {
    assert_eq!(eval("\"a\" + 1 + 2"), Value::string("a12"));
    assert_eq!(eval("1 + 2 + \"a\""), Value::string("3a"));
    assert_eq!(eval("\"x\" + null"), Value::string("xnull"));
    assert_eq!(eval("'a' + \"b\""), Value::string("ab"));
}

#[test]
fn test_strings_parse_for_other_operators() {
    assert_eq!(eval("\"6\" * 2"), Value::Double(12.0));
    assert_eq!(eval("\"10\" - \"4\""), Value::Double(6.0));
    let err = ognl::eval("\"x\" - 1", Value::Null).unwrap_err();
    assert!(matches!(err, OgnlError::Coercion { .. }), "{:?}", err);
}

#[test]
fn test_integer_division_truncates() {
    assert_eq!(eval("7 / 2"), Value::Int(3));
    assert_eq!(eval("-7 / 2"), Value::Int(-3));
    assert_eq!(eval("7 / 2.0"), Value::Double(3.5));
    assert_eq!(eval("7L % 4"), Value::Long(3));
}

#[test]
fn test_int_overflow_wraps() {
    assert_eq!(eval("2147483647 + 1"), Value::Int(i32::MIN));
    assert_eq!(eval("2147483647L + 1"), Value::Long(2_147_483_648));
}

#[test]
fn test_division_by_zero() {
    for text in ["1 / 0", "1 % 0", "1B / 0"] {
        let err = ognl::eval(text, Value::Null).unwrap_err();
        assert!(matches!(err, OgnlError::DivisionByZero), "{}", text);
    }
    assert_eq!(eval("1.0 / 0"), Value::Double(f64::INFINITY));
}

#[test]
fn test_bitwise_and_shifts() {
    assert_eq!(eval("6 & 3"), Value::Int(2));
    assert_eq!(eval("6 | 3"), Value::Int(7));
    assert_eq!(eval("6 ^ 3"), Value::Int(5));
    assert_eq!(eval("6 band 3"), Value::Int(2));
    assert_eq!(eval("~5"), Value::Int(-6));
    assert_eq!(eval("1 << 3"), Value::Int(8));
    assert_eq!(eval("1L shl 40"), Value::Long(1 << 40));
    assert_eq!(eval("-16 >> 2"), Value::Int(-4));
    assert_eq!(eval("-16 >>> 28"), Value::Int(15));
}

#[test]
fn test_unary_operators() {
    assert_eq!(eval("-(5L)"), Value::Long(-5));
    assert_eq!(eval("-1.5F"), Value::Float(-1.5));
    assert_eq!(eval("!0"), Value::Boolean(true));
    assert_eq!(eval("!\"x\""), Value::Boolean(false));
    assert_eq!(eval("+3"), Value::Int(3));
}

#[test]
fn test_comparisons_cross_types() {
    assert_eq!(eval("1 == 1.0"), Value::Boolean(true));
    assert_eq!(eval("\"10\" == 10"), Value::Boolean(true));
    assert_eq!(eval("1 < 2L"), Value::Boolean(true));
    assert_eq!(eval("2.5 gte 2"), Value::Boolean(true));
    assert_eq!(eval("\"b\" > \"a\""), Value::Boolean(true));
    assert_eq!(eval("null == null"), Value::Boolean(true));
    assert_eq!(eval("1 != 2"), Value::Boolean(true));
}

#[test]
fn test_truthiness() {
    assert_eq!(eval("\"\" ? 1 : 2"), Value::Int(2));
    assert_eq!(eval("0.0 ? 1 : 2"), Value::Int(2));
    assert_eq!(eval("null ? 1 : 2"), Value::Int(2));
    assert_eq!(eval("\"false\" ? 1 : 2"), Value::Int(1));
    assert_eq!(eval("{} ? 1 : 2"), Value::Int(1));
}
