use std::sync::Arc;

use ognl::runtime::{DenyMembers, IndexedPropertyType, NullHandler};
use ognl::{config::Config, ClassDef, ClassRef, Context, OgnlError, Runtime, Value, ValueType};
use pretty_assertions::assert_eq;

fn object(pairs: Vec<(&str, Value)>) -> Value {
    Value::map(
        pairs
            .into_iter()
            .map(|(k, v)| (Value::string(k), v))
            .collect(),
    )
}

fn ints(values: &[i32]) -> Value {
    Value::list(values.iter().map(|n| Value::Int(*n)).collect())
}

fn get(ctx: &mut Context, text: &str) -> Result<Value, OgnlError> {
    let expr = ognl::parse_expression(text)?;
    ognl::get_value(&expr, ctx)
}

fn set(ctx: &mut Context, text: &str, value: Value) -> Result<(), OgnlError> {
    let expr = ognl::parse_expression(text)?;
    ognl::set_value(&expr, ctx, value)
}

fn context_with(config: Config, root: Value) -> Context {
    let runtime = Runtime::builder().config(config).build();
    Context::new(Arc::new(runtime), root)
}

// ============================================================================
// Null handling in chains
// ============================================================================

#[test]
fn test_null_safe_chain_yields_null() {
    let mut ctx = Context::with_root(object(vec![("a", Value::Null)]));
    assert_eq!(get(&mut ctx, "a?.b.c").unwrap(), Value::Null);
    assert_eq!(get(&mut ctx, "a?.size()").unwrap(), Value::Null);
}

#[test]
fn test_plain_chain_fails_on_null_intermediate() {
    let mut ctx = Context::with_root(object(vec![("a", Value::Null)]));
    let err = get(&mut ctx, "a.b").unwrap_err();
    assert!(matches!(err, OgnlError::NullTarget { .. }), "{:?}", err);
}

#[test]
fn test_null_root_short_circuits_leading_property() {
    let mut ctx = context_with(Config::default(), Value::Null);
    assert_eq!(get(&mut ctx, "a.b").unwrap(), Value::Null);
}

#[test]
fn test_null_root_method_call_still_fails() {
    let mut ctx = context_with(Config::default(), Value::Null);
    let err = get(&mut ctx, "size().b").unwrap_err();
    assert!(matches!(err, OgnlError::MethodFailed { .. }), "{:?}", err);
}

#[test]
fn test_short_circuit_can_be_disabled() {
    let mut ctx = context_with(Config::default().with_short_circuit(false), Value::Null);
    let err = get(&mut ctx, "a.b").unwrap_err();
    assert!(matches!(err, OgnlError::NullTarget { .. }), "{:?}", err);
}

#[test]
fn test_null_safe_set_skips_assignment() {
    let root = object(vec![("a", Value::Null)]);
    let mut ctx = Context::with_root(root.clone());
    set(&mut ctx, "a?.b", Value::Int(1)).unwrap();
    assert_eq!(root.to_string(), "{a=null}");

    let err = set(&mut ctx, "a.b", Value::Int(1)).unwrap_err();
    assert!(matches!(err, OgnlError::NullTarget { .. }));
}

struct Placeholder;

impl NullHandler for Placeholder {
    fn null_property_value(&self, _ctx: &mut Context, _target: &Value, key: &Value) -> Option<Value> {
        Some(Value::from(format!("<{}>", key)))
    }
}

#[test]
fn test_null_handler_substitutes_missing_values() {
    let runtime = Runtime::builder()
        .null_handler(Arc::new(Placeholder))
        .build();
    let mut ctx = Context::new(Arc::new(runtime), object(vec![]));
    assert_eq!(get(&mut ctx, "nickname").unwrap(), Value::string("<nickname>"));
}

// ============================================================================
// Dynamic subscripts
// ============================================================================

#[test]
fn test_subscripts_read_relative_positions() {
    let mut ctx = Context::with_root(object(vec![("arr", ints(&[10, 20, 30, 40, 50]))]));
    assert_eq!(get(&mut ctx, "arr[^]").unwrap(), Value::Int(10));
    assert_eq!(get(&mut ctx, "arr[|]").unwrap(), Value::Int(30));
    assert_eq!(get(&mut ctx, "arr[$]").unwrap(), Value::Int(50));
}

#[test]
fn test_subscripts_on_empty_sequences_yield_null() {
    let mut ctx = Context::with_root(object(vec![("arr", ints(&[]))]));
    assert_eq!(get(&mut ctx, "arr[$]").unwrap(), Value::Null);
}

#[test]
fn test_whole_sequence_read_is_a_copy() {
    let arr = ints(&[1, 2, 3]);
    let mut ctx = Context::with_root(object(vec![("arr", arr.clone())]));
    let copy = get(&mut ctx, "arr[*]").unwrap();
    assert_eq!(copy, arr);
    assert!(!copy.same(&arr));
}

#[test]
fn test_subscript_writes() {
    let arr = ints(&[1, 2, 3]);
    let mut ctx = Context::with_root(object(vec![("arr", arr.clone())]));
    set(&mut ctx, "arr[$]", Value::Int(99)).unwrap();
    set(&mut ctx, "arr[^]", Value::Int(-1)).unwrap();
    assert_eq!(arr, ints(&[-1, 2, 99]));

    set(&mut ctx, "arr[*]", ints(&[7, 8])).unwrap();
    assert_eq!(arr, ints(&[7, 8]));
}

#[test]
fn test_index_expressions_evaluate_against_root() {
    let root = object(vec![
        ("pos", Value::Int(1)),
        ("items", Value::list(vec![object(vec![("pos", Value::Int(0))]), object(vec![("pos", Value::Int(5))])])),
    ]);
    let mut ctx = Context::with_root(root);
    assert_eq!(get(&mut ctx, "items[pos].pos").unwrap(), Value::Int(5));
    assert_eq!(get(&mut ctx, "items[\"1\"].pos").unwrap(), Value::Int(5));
}

#[test]
fn test_out_of_range_index() {
    let mut ctx = Context::with_root(object(vec![("arr", ints(&[1]))]));
    let err = get(&mut ctx, "arr[3]").unwrap_err();
    assert!(matches!(err, OgnlError::IndexOutOfBounds { index: 3, len: 1 }), "{:?}", err);
}

// ============================================================================
// Indexed bean properties
// ============================================================================

fn shelf(ctx: &Context) -> ClassRef {
    ctx.runtime().register_class(
        ClassDef::new("app.Shelf")
            .indexed_property(
                "books",
                ValueType::Array(Box::new(ValueType::String)),
                IndexedPropertyType::Int,
            )
            .indexed_property("labels", ValueType::Map, IndexedPropertyType::Object),
    )
}

fn stocked_shelf() -> Context {
    let mut ctx = Context::with_root(Value::Null);
    let class = shelf(&ctx);
    let books = Value::array(
        ValueType::String,
        vec![Value::string("Emma"), Value::string("Dune"), Value::string("Ulysses")],
    );
    let labels = object(vec![("color", Value::string("red"))]);
    let bean = class.instance(vec![("books", books), ("labels", labels)]);
    ctx.set_root(bean);
    ctx
}

#[test]
fn test_int_indexed_property_reads() {
    let mut ctx = stocked_shelf();
    assert_eq!(get(&mut ctx, "books[1]").unwrap(), Value::string("Dune"));
    assert_eq!(get(&mut ctx, "books[$]").unwrap(), Value::string("Ulysses"));
    assert_eq!(get(&mut ctx, "books[*]").unwrap().to_string(), "[Emma, Dune, Ulysses]");
}

#[test]
fn test_int_indexed_property_writes_convert() {
    let mut ctx = stocked_shelf();
    set(&mut ctx, "books[0]", Value::Int(5)).unwrap();
    assert_eq!(get(&mut ctx, "books[0]").unwrap(), Value::string("5"));
    set(&mut ctx, "books[^]", Value::string("Persuasion")).unwrap();
    assert_eq!(get(&mut ctx, "books[0]").unwrap(), Value::string("Persuasion"));
}

#[test]
fn test_object_indexed_property() {
    let mut ctx = stocked_shelf();
    assert_eq!(get(&mut ctx, "labels[\"color\"]").unwrap(), Value::string("red"));
    set(&mut ctx, "labels[\"size\"]", Value::string("large")).unwrap();
    assert_eq!(get(&mut ctx, "labels[\"size\"]").unwrap(), Value::string("large"));

    let err = get(&mut ctx, "labels[^]").unwrap_err();
    match err {
        OgnlError::TypeError(message) => assert!(message.contains("DynamicSubscript"), "{}", message),
        other => panic!("expected a type error, got {:?}", other),
    }
}

// ============================================================================
// Methods, statics and access control
// ============================================================================

#[test]
fn test_method_arguments_evaluate_against_root() {
    let root = object(vec![
        ("start", Value::Int(1)),
        ("text", Value::string("héllo")),
    ]);
    let mut ctx = Context::with_root(root);
    assert_eq!(get(&mut ctx, "text.substring(start, 3)").unwrap(), Value::string("él"));
    assert_eq!(get(&mut ctx, "text.length()").unwrap(), Value::Int(5));
}

#[test]
fn test_unknown_static_member() {
    let mut ctx = Context::with_root(Value::Null);
    let err = get(&mut ctx, "@Integer@NOPE").unwrap_err();
    assert!(matches!(err, OgnlError::NoSuchProperty { .. }));
    let err = get(&mut ctx, "@app.Missing@X").unwrap_err();
    assert!(matches!(err, OgnlError::ClassNotFound(_)));
}

#[test]
fn test_class_pseudo_field() {
    let mut ctx = Context::with_root(Value::Null);
    assert_eq!(
        get(&mut ctx, "@Integer@class.getName()").unwrap(),
        Value::string("java.lang.Integer")
    );
}

#[test]
fn test_member_access_policy_denies_properties_and_methods() {
    let runtime = Runtime::builder()
        .member_access(Arc::new(DenyMembers(vec!["secret".into(), "max".into()])))
        .build();
    let root = object(vec![("secret", Value::Int(1)), ("open", Value::Int(2))]);
    let mut ctx = Context::new(Arc::new(runtime), root);

    assert_eq!(get(&mut ctx, "open").unwrap(), Value::Int(2));
    let err = get(&mut ctx, "secret").unwrap_err();
    assert!(matches!(err, OgnlError::AccessDenied(_)), "{:?}", err);
    let err = set(&mut ctx, "secret", Value::Int(3)).unwrap_err();
    assert!(matches!(err, OgnlError::AccessDenied(_)));
    let err = get(&mut ctx, "@Math@max(1, 2)").unwrap_err();
    assert!(matches!(err, OgnlError::AccessDenied(_)));
}
