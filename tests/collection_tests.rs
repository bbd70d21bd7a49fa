use ognl::{OgnlError, Value, ValueType};
use pretty_assertions::assert_eq;

fn eval(text: &str) -> Value {
    ognl::eval(text, Value::Null).unwrap_or_else(|e| panic!("`{}` failed: {}", text, e))
}

fn ints(values: &[i32]) -> Value {
    Value::list(values.iter().map(|n| Value::Int(*n)).collect())
}

fn inventory() -> Value {
    let item = |name: &str, stock: i32| {
        Value::map(vec![
            (Value::string("name"), Value::string(name)),
            (Value::string("stock"), Value::Int(stock)),
        ])
    };
    Value::map(vec![(
        Value::string("items"),
        Value::list(vec![item("bolt", 0), item("nut", 12), item("gear", 3)]),
    )])
}

// ============================================================================
// Selection
// ============================================================================

#[test]
fn test_select_all_matches() {
    assert_eq!(eval("{1, 2, 3, 4}.{? #this > 2 }"), ints(&[3, 4]));
    assert_eq!(eval("{1, 2, 3, 4}.{? #this > 9 }"), ints(&[]));
}

#[test]
fn test_select_first_and_last() {
    assert_eq!(eval("{1, 2, 3, 4}.{^ #this > 2 }"), ints(&[3]));
    assert_eq!(eval("{1, 2, 3, 4}.{$ #this > 2 }"), ints(&[4]));
    assert_eq!(eval("{1, 2}.{^ #this > 5 }"), ints(&[]));
}

#[test]
fn test_selection_over_root_objects() {
    let names = ognl::eval("items.{? stock > 0 }.{ name }", inventory()).unwrap();
    assert_eq!(names.to_string(), "[nut, gear]");
}

// ============================================================================
// Projection
// ============================================================================

#[test]
fn test_projection() {
    assert_eq!(eval("{1, 2, 3}.{ #this * 2 }"), ints(&[2, 4, 6]));
    let total = ognl::eval("items.{ stock }", inventory()).unwrap();
    assert_eq!(total, ints(&[0, 12, 3]));
}

#[test]
fn test_projection_over_map_values() {
    assert_eq!(eval("#{ \"a\" : 1, \"b\" : 2 }.{ #this + 10 }"), ints(&[11, 12]));
}

#[test]
fn test_projection_of_scalar_and_null() {
    assert_eq!(eval("5.{ #this + 1 }"), ints(&[6]));
    assert_eq!(eval("null.{ #this }"), ints(&[]));
}

// ============================================================================
// Literals and arrays
// ============================================================================

#[test]
fn test_list_literal_evaluates_members() {
    assert_eq!(eval("{ 1 + 1, \"x\", null }").to_string(), "[2, x, null]");
}

#[test]
fn test_map_literal_keeps_insertion_order() {
    let map = eval("#{ \"z\" : 1, \"a\" : 2, \"z\" : 3 }");
    assert_eq!(map.to_string(), "{z=3, a=2}");
    assert_eq!(eval("#{ \"k\" }").to_string(), "{k=null}");
}

#[test]
fn test_typed_map_literal() {
    match eval("#@java.util.HashMap@{ \"a\" : 1 }") {
        Value::Map(m) => assert_eq!(m.class_name(), Some("java.util.HashMap")),
        other => panic!("expected a map, got {:?}", other),
    }
    let err = ognl::eval("#@app.Nope@{ \"a\" : 1 }", Value::Null).unwrap_err();
    assert!(matches!(err, OgnlError::ClassNotFound(_)));
}

#[test]
fn test_array_initializer_converts_members() {
    assert_eq!(
        eval("new int[] { 1, \"2\", 3L }"),
        Value::array(ValueType::Int, vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
}

#[test]
fn test_sized_arrays_hold_defaults() {
    assert_eq!(
        eval("new int[3]"),
        Value::array(ValueType::Int, vec![Value::Int(0); 3])
    );
    assert_eq!(
        eval("new String[2]"),
        Value::array(ValueType::String, vec![Value::Null, Value::Null])
    );
    assert_eq!(eval("new double[2].length"), Value::Int(2));
}

#[test]
fn test_array_initializer_rejects_bad_members() {
    let err = ognl::eval("new int[] { \"x\" }", Value::Null).unwrap_err();
    assert!(matches!(err, OgnlError::Coercion { .. }), "{:?}", err);
}

// ============================================================================
// Membership
// ============================================================================

#[test]
fn test_in_list() {
    assert_eq!(eval("2 in {1, 2, 3}"), Value::Boolean(true));
    assert_eq!(eval("2L in {1, 2, 3}"), Value::Boolean(true));
    assert_eq!(eval("5 not in {1, 2, 3}"), Value::Boolean(true));
    assert_eq!(eval("1 in null"), Value::Boolean(false));
}

#[test]
fn test_in_scalar_and_map() {
    assert_eq!(eval("3 in 3"), Value::Boolean(true));
    assert_eq!(eval("\"a\" in \"abc\""), Value::Boolean(false));
    assert_eq!(eval("1 in #{ \"k\" : 1 }"), Value::Boolean(true));
    assert_eq!(eval("\"k\" in #{ \"k\" : 1 }"), Value::Boolean(false));
}
