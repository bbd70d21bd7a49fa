// tests/parser_tests.rs

use ognl::ast::{BinaryOp, CompareOp, NodeKind, UnaryOp};
use ognl::parser::{parse, ParseError};
use ognl::{DynamicSubscript, Expression, LexError, Value};
use pretty_assertions::assert_eq;

fn tree(text: &str) -> Expression {
    parse(text).unwrap_or_else(|e| panic!("failed to parse `{}`: {}", text, e))
}

// ============================================================================
// Operators and precedence
// ============================================================================

#[test]
fn test_comparison() {
    let expr = tree("price > 100");
    assert_eq!(expr.root().kind(), &NodeKind::Compare(CompareOp::Greater));
}

#[test]
fn test_multiplication_binds_tighter() {
    let expr = tree("1 + 2 * 3");
    let root = expr.root();
    assert_eq!(root.kind(), &NodeKind::Binary(BinaryOp::Add));
    assert_eq!(root.child(1).kind(), &NodeKind::Binary(BinaryOp::Multiply));
}

#[test]
fn test_parentheses() {
    let expr = tree("(1 + 2) * 3");
    let root = expr.root();
    assert_eq!(root.kind(), &NodeKind::Binary(BinaryOp::Multiply));
    assert_eq!(root.child(0).kind(), &NodeKind::Binary(BinaryOp::Add));
    assert_eq!(expr.to_string(), "(1 + 2) * 3");
}

#[test]
fn test_keyword_operators() {
    assert_eq!(tree("a and b").root().kind(), &NodeKind::And);
    assert_eq!(tree("a or b").root().kind(), &NodeKind::Or);
    assert_eq!(tree("not a").root().kind(), &NodeKind::Unary(UnaryOp::Not));
    assert_eq!(tree("a not in b").root().kind(), &NodeKind::In { negated: true });
    assert_eq!(tree("a in b").root().kind(), &NodeKind::In { negated: false });
}

#[test]
fn test_ternary_and_assignment() {
    let expr = tree("a = b ? 1 : 2");
    let root = expr.root();
    assert_eq!(root.kind(), &NodeKind::Assign);
    assert_eq!(root.child(1).kind(), &NodeKind::Test);

    let expr = tree("a = b = 1");
    assert_eq!(expr.root().child(1).kind(), &NodeKind::Assign);
}

// ============================================================================
// Flattening
// ============================================================================

#[test]
fn test_associative_operators_flatten() {
    assert_eq!(tree("1 + 2 + 3").root().child_count(), 3);
    assert_eq!(tree("a || b || c").root().child_count(), 3);
    assert_eq!(tree("a && b && c").root().child_count(), 3);
    assert_eq!(tree("a, b, c").root().child_count(), 3);
}

#[test]
fn test_non_associative_operators_nest() {
    let expr = tree("1 - 2 - 3");
    assert_eq!(expr.root().child_count(), 2);
    assert_eq!(expr.root().child(0).kind(), &NodeKind::Binary(BinaryOp::Subtract));
}

#[test]
fn test_chains_are_flat() {
    let expr = tree("a.b.c");
    let root = expr.root();
    assert_eq!(root.kind(), &NodeKind::Chain { null_safe: false });
    assert_eq!(root.child_count(), 3);
    let names: Vec<_> = root.children().filter_map(|c| c.property_name()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn test_null_safe_chain() {
    let expr = tree("a?.b.c");
    assert_eq!(expr.root().kind(), &NodeKind::Chain { null_safe: true });
    assert_eq!(expr.to_string(), "a?.b?.c");
}

#[test]
fn test_index_steps() {
    let expr = tree("items[0].name");
    let root = expr.root();
    assert_eq!(root.child_count(), 3);
    assert_eq!(root.child(1).kind(), &NodeKind::Property { indexed: true });
    assert_eq!(expr.to_string(), "items[0].name");
}

#[test]
fn test_dynamic_subscripts() {
    for (text, subscript) in [
        ("a[^]", DynamicSubscript::First),
        ("a[|]", DynamicSubscript::Mid),
        ("a[$]", DynamicSubscript::Last),
        ("a[*]", DynamicSubscript::All),
    ] {
        let expr = tree(text);
        let index = expr.root().child(1).child(0);
        assert_eq!(index.kind(), &NodeKind::Const(Value::Subscript(subscript)), "{}", text);
        assert_eq!(expr.to_string(), text);
    }
}

#[test]
fn test_method_call_arguments() {
    let expr = tree("name.substring(1, 3)");
    let method = expr.root().child(1);
    assert_eq!(
        method.kind(),
        &NodeKind::Method {
            name: "substring".into()
        }
    );
    assert_eq!(method.child_count(), 2);
}

#[test]
fn test_references() {
    assert_eq!(tree("#this").root().kind(), &NodeKind::ThisVarRef);
    assert_eq!(tree("#root").root().kind(), &NodeKind::RootVarRef);
    assert_eq!(tree("#count").root().kind(), &NodeKind::VarRef { name: "count".into() });
    assert_eq!(tree("#f(1)").root().kind(), &NodeKind::Eval);
}

#[test]
fn test_static_access() {
    let expr = tree("@java.lang.Math@max(1, 2)");
    assert_eq!(
        expr.root().kind(),
        &NodeKind::StaticMethod {
            class_name: "java.lang.Math".into(),
            method: "max".into()
        }
    );
    assert_eq!(expr.root().child_count(), 2);

    let expr = tree("@Integer@MAX_VALUE");
    assert_eq!(
        expr.root().kind(),
        &NodeKind::StaticField {
            class_name: "Integer".into(),
            field: "MAX_VALUE".into()
        }
    );
}

// ============================================================================
// Literals and collections
// ============================================================================

#[test]
fn test_numeric_literals() {
    let cases = [
        ("1", Value::Int(1)),
        ("3000000000", Value::Long(3_000_000_000)),
        ("2L", Value::Long(2)),
        ("5H", Value::BigInteger(5)),
        ("1.5F", Value::Float(1.5)),
        ("2.5", Value::Double(2.5)),
        ("0x1F", Value::Int(31)),
        ("'c'", Value::Char('c')),
        ("'text'", Value::string("text")),
    ];
    for (text, expected) in cases {
        assert_eq!(tree(text).root().kind(), &NodeKind::Const(expected), "{}", text);
    }
}

#[test]
fn test_list_and_map_literals() {
    let expr = tree("{ 1, 2, 3 }");
    assert_eq!(expr.root().kind(), &NodeKind::List);
    assert_eq!(expr.root().child_count(), 3);

    let expr = tree("#{ \"a\" : 1, \"b\" : 2 }");
    assert_eq!(expr.root().kind(), &NodeKind::Map { class_name: None });
    let entry = expr.root().child(0);
    assert_eq!(entry.kind(), &NodeKind::KeyValue);
    assert_eq!(entry.child_count(), 2);

    let expr = tree("#@java.util.HashMap@{ \"a\" : 1 }");
    assert_eq!(
        expr.root().kind(),
        &NodeKind::Map {
            class_name: Some("java.util.HashMap".into())
        }
    );
}

#[test]
fn test_projection_and_selection() {
    let expr = tree("items.{ #this * 2 }");
    assert_eq!(expr.root().child(1).kind(), &NodeKind::Project);
    assert_eq!(tree("items.{? #this > 1 }").root().child(1).kind(), &NodeKind::Select);
    assert_eq!(tree("items.{^ #this > 1 }").root().child(1).kind(), &NodeKind::SelectFirst);
    assert_eq!(tree("items.{$ #this > 1 }").root().child(1).kind(), &NodeKind::SelectLast);
}

#[test]
fn test_constructors() {
    let expr = tree("new int[3]");
    assert_eq!(
        expr.root().kind(),
        &NodeKind::Ctor {
            class_name: "int".into(),
            array: true
        }
    );
    let expr = tree("new int[] { 1, 2 }");
    assert_eq!(expr.root().child(0).kind(), &NodeKind::List);
    assert_eq!(expr.to_string(), "new int[] { 1, 2 }");

    let expr = tree("new java.util.ArrayList()");
    assert_eq!(
        expr.root().kind(),
        &NodeKind::Ctor {
            class_name: "java.util.ArrayList".into(),
            array: false
        }
    );
}

#[test]
fn test_lambda_body_is_a_separate_tree() {
    let expr = tree(":[ #this + 1 ]");
    match expr.root().kind() {
        NodeKind::Const(Value::Lambda(body)) => {
            assert_eq!(body.root().kind(), &NodeKind::Binary(BinaryOp::Add));
            assert_eq!(body.to_string(), "#this + 1");
        }
        other => panic!("expected a lambda, got {:?}", other),
    }
    assert_eq!(expr.len(), 1);
}

#[test]
fn test_instanceof() {
    let expr = tree("x instanceof java.lang.Number");
    assert_eq!(
        expr.root().kind(),
        &NodeKind::Instanceof {
            class_name: "java.lang.Number".into()
        }
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_incomplete_expression() {
    let err = parse("1 +").unwrap_err();
    assert!(matches!(err, ParseError::Unexpected { .. }), "{:?}", err);
}

#[test]
fn test_unterminated_string() {
    let err = parse("\"abc").unwrap_err();
    assert!(matches!(err, ParseError::Lex(LexError::Unterminated { .. })), "{:?}", err);
}

#[test]
fn test_trailing_tokens() {
    let err = parse("a b").unwrap_err();
    assert!(matches!(err, ParseError::Unexpected { .. }));
}

#[test]
fn test_not_requires_in() {
    assert!(parse("a not b").is_err());
}
