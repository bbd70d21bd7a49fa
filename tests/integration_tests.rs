use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use ognl::{
    config::Config, ClassDef, Context, Expression, OgnlError, Runtime, Value, ValueType,
};
use pretty_assertions::assert_eq;

fn eval_expr(text: &str, root: Value) -> Result<Value, OgnlError> {
    ognl::eval(text, root)
}

fn json_object(pairs: Vec<(&str, Value)>) -> Value {
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

fn customer() -> Value {
    json_object(vec![
        ("name", Value::string("Ada")),
        (
            "orders",
            Value::list(vec![
                json_object(vec![("total", Value::Int(40)), ("paid", Value::Boolean(true))]),
                json_object(vec![("total", Value::Int(160)), ("paid", Value::Boolean(false))]),
                json_object(vec![("total", Value::Int(120)), ("paid", Value::Boolean(true))]),
            ]),
        ),
        ("address", json_object(vec![("city", Value::string("London"))])),
    ])
}

// ============================================================================
// Reading
// ============================================================================

#[test]
fn test_simple_property_access() {
    let result = eval_expr("name", customer()).unwrap();
    assert_eq!(result, Value::string("Ada"));
}

#[test]
fn test_nested_property_access() {
    let result = eval_expr("address.city", customer()).unwrap();
    assert_eq!(result, Value::string("London"));
}

#[test]
fn test_index_then_property() {
    let result = eval_expr("orders[1].total", customer()).unwrap();
    assert_eq!(result, Value::Int(160));
}

#[test]
fn test_selection_with_method_call() {
    let result = eval_expr("orders.{? #this.total > 100 }.size()", customer()).unwrap();
    assert_eq!(result, Value::Int(2));
}

#[test]
fn test_projection_sums_with_variables() {
    let result = eval_expr(
        "#sum = 0, orders.{ #sum = #sum + total }, #sum",
        customer(),
    )
    .unwrap();
    assert_eq!(result, Value::Int(320));
}

#[test]
fn test_string_concatenation() {
    let result = eval_expr("name + \" has \" + orders.size() + \" orders\"", customer()).unwrap();
    assert_eq!(result, Value::string("Ada has 3 orders"));
}

#[test]
fn test_sequence_yields_last_value() {
    let root = json_object(vec![("x", Value::Int(1))]);
    let result = eval_expr("#y = x + 1, #y * 10", root).unwrap();
    assert_eq!(result, Value::Int(20));
}

#[test]
fn test_conditional() {
    let result = eval_expr("orders[0].paid ? \"paid\" : \"due\"", customer()).unwrap();
    assert_eq!(result, Value::string("paid"));
    let result = eval_expr("orders[1].paid ? \"paid\" : \"due\"", customer()).unwrap();
    assert_eq!(result, Value::string("due"));
}

#[test]
fn test_logical_operators_yield_operands() {
    assert_eq!(eval_expr("\"\" || \"fallback\"", Value::Null).unwrap(), Value::string("fallback"));
    assert_eq!(eval_expr("0 && 5", Value::Null).unwrap(), Value::Int(0));
    assert_eq!(eval_expr("1 and 5", Value::Null).unwrap(), Value::Int(5));
    assert_eq!(eval_expr("not (1 == 2)", Value::Null).unwrap(), Value::Boolean(true));
}

#[test]
fn test_membership() {
    let root = json_object(vec![("tags", Value::list(vec![Value::string("a"), Value::string("b")]))]);
    assert_eq!(eval_expr("\"a\" in tags", root.clone()).unwrap(), Value::Boolean(true));
    assert_eq!(eval_expr("\"z\" not in tags", root).unwrap(), Value::Boolean(true));
}

#[test]
fn test_static_members() {
    assert_eq!(
        eval_expr("@java.lang.Integer@MAX_VALUE", Value::Null).unwrap(),
        Value::Int(i32::MAX)
    );
    assert_eq!(eval_expr("@Math@max(3, 4L)", Value::Null).unwrap(), Value::Long(4));
    assert_eq!(eval_expr("@Integer@parseInt(\"42\") + 1", Value::Null).unwrap(), Value::Int(43));
}

#[test]
fn test_constructors() {
    let result = eval_expr("new java.util.ArrayList()", Value::Null).unwrap();
    assert_eq!(result, Value::list(vec![]));
    let result = eval_expr("new Integer(\"7\")", Value::Null).unwrap();
    assert_eq!(result, Value::Int(7));
}

#[test]
fn test_instanceof() {
    assert_eq!(eval_expr("5 instanceof Number", Value::Null).unwrap(), Value::Boolean(true));
    assert_eq!(eval_expr("\"5\" instanceof Number", Value::Null).unwrap(), Value::Boolean(false));
    assert_eq!(
        eval_expr("name instanceof java.lang.CharSequence", customer()).unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn test_recursive_lambda() {
    let result = eval_expr(
        "#fact = :[ #this <= 1 ? 1 : #this * #fact(#this - 1) ], #fact(5)",
        Value::Null,
    )
    .unwrap();
    assert_eq!(result, Value::Int(120));
}

#[test]
fn test_evaluation_restores_root() {
    let root = json_object(vec![("x", Value::Int(1))]);
    let result = eval_expr("(\"#root\")(5) + x", root).unwrap();
    assert_eq!(result, Value::Int(6));
}

#[test]
fn test_nested_evaluation_from_registered_method_sees_root() {
    let runtime = Arc::new(Runtime::new());
    let helper = runtime.register_class(ClassDef::new("app.Helper").method(
        "lookup",
        |ctx, _target, args| {
            let text = args.first().map(|v| v.to_string()).unwrap_or_default();
            let expression = ognl::parse_expression(&text)?;
            let root = ctx.root().clone();
            expression.get_value(ctx, &root)
        },
    ));
    let root = json_object(vec![
        ("name", Value::string("Ada")),
        ("helper", Value::Object(helper.instantiate())),
    ]);
    let mut ctx = Context::new(runtime, root.clone());
    let expr = ognl::parse_expression("helper.lookup(\"#root.name\") + \"/\" + name").unwrap();
    let result = ognl::get_value(&expr, &mut ctx).unwrap();
    assert_eq!(result, Value::string("Ada/Ada"));
    assert!(ctx.root().same(&root));
}

#[test]
fn test_nested_evaluation_against_another_source_keeps_root() {
    let runtime = Arc::new(Runtime::new());
    let helper = runtime.register_class(ClassDef::new("app.Helper").method(
        "lookupIn",
        |ctx, _target, args| {
            let text = args.first().map(|v| v.to_string()).unwrap_or_default();
            let source = args.get(1).cloned().unwrap_or(Value::Null);
            let expression = ognl::parse_expression(&text)?;
            expression.get_value(ctx, &source)
        },
    ));
    let other = json_object(vec![("name", Value::string("Other"))]);
    let root = json_object(vec![
        ("name", Value::string("Ada")),
        ("other", other.clone()),
        ("helper", Value::Object(helper.instantiate())),
    ]);
    let mut ctx = Context::new(runtime, root.clone());

    let expr = ognl::parse_expression("helper.lookupIn(\"#root.name + '-' + name\", other)").unwrap();
    let result = ognl::get_value(&expr, &mut ctx).unwrap();
    assert_eq!(result, Value::string("Ada-Other"));
    assert!(ctx.root().same(&root));
    assert!(!ctx.root().same(&other));

    let after = ognl::parse_expression("#root.name").unwrap();
    assert_eq!(ognl::get_value(&after, &mut ctx).unwrap(), Value::string("Ada"));
}

// ============================================================================
// Writing
// ============================================================================

#[test]
fn test_set_nested_property() {
    let root = customer();
    let expr = ognl::parse_expression("address.city").unwrap();
    let mut ctx = Context::with_root(root.clone());
    ognl::set_value(&expr, &mut ctx, Value::string("Paris")).unwrap();
    assert_eq!(eval_expr("address.city", root).unwrap(), Value::string("Paris"));
}

#[test]
fn test_assignment_expression_returns_value() {
    let root = json_object(vec![("items", ints(&[1, 2, 3]))]);
    let result = eval_expr("items[0] = 5", root.clone()).unwrap();
    assert_eq!(result, Value::Int(5));
    assert_eq!(eval_expr("items", root).unwrap(), ints(&[5, 2, 3]));
}

#[test]
fn test_set_through_conditional() {
    let root = json_object(vec![
        ("useA", Value::Boolean(false)),
        ("a", Value::Int(0)),
        ("b", Value::Int(0)),
    ]);
    let expr = ognl::parse_expression("useA ? a : b").unwrap();
    let mut ctx = Context::with_root(root.clone());
    ognl::set_value(&expr, &mut ctx, Value::Int(9)).unwrap();
    assert_eq!(root.to_string(), "{useA=false, a=0, b=9}");
}

#[test]
fn test_set_root_and_variables() {
    let expr = ognl::parse_expression("#root").unwrap();
    let mut ctx = Context::with_root(Value::Int(1));
    ognl::set_value(&expr, &mut ctx, Value::Int(2)).unwrap();
    assert_eq!(ctx.root(), &Value::Int(2));

    let expr = ognl::parse_expression("#counter").unwrap();
    ognl::set_value(&expr, &mut ctx, Value::Int(3)).unwrap();
    assert_eq!(ctx.variable("counter"), Some(&Value::Int(3)));
}

#[test]
fn test_bean_property_writes_convert() {
    let runtime = Arc::new(Runtime::new());
    let class = runtime.register_class(
        ClassDef::new("app.Account")
            .property("balance", ValueType::Long)
            .property("owner", ValueType::String),
    );
    let account = Value::Object(class.instantiate());
    let mut ctx = Context::new(runtime, account.clone());
    let expr = ognl::parse_expression("balance").unwrap();
    ognl::set_value(&expr, &mut ctx, Value::string("250")).unwrap();
    assert_eq!(ognl::get_value(&expr, &mut ctx).unwrap(), Value::Long(250));
    assert_eq!(
        eval_in(&mut ctx, "getBalance() + 1"),
        Value::Long(251)
    );
}

fn eval_in(ctx: &mut Context, text: &str) -> Value {
    let expr = ognl::parse_expression(text).unwrap();
    ognl::get_value(&expr, ctx).unwrap()
}

// ============================================================================
// Short-circuiting
// ============================================================================

fn probe_context(calls: &Arc<AtomicUsize>) -> Context {
    let runtime = Arc::new(Runtime::new());
    let counter = Arc::clone(calls);
    let probe = runtime.register_class(ClassDef::new("app.Probe").method(
        "hit",
        move |_, _, args| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(args.first().cloned().unwrap_or(Value::Null))
        },
    ));
    Context::new(runtime, Value::Object(probe.instantiate()))
}

#[test]
fn test_and_stops_at_first_falsy_operand() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut ctx = probe_context(&calls);
    assert_eq!(eval_in(&mut ctx, "false && hit(true)"), Value::Boolean(false));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(eval_in(&mut ctx, "hit(0) && hit(5)"), Value::Int(0));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_or_stops_at_first_truthy_operand() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut ctx = probe_context(&calls);
    assert_eq!(eval_in(&mut ctx, "hit(1) || hit(2)"), Value::Int(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(eval_in(&mut ctx, "hit(0) || hit(\"\") || hit(3)"), Value::Int(3));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

// ============================================================================
// Errors and tracing
// ============================================================================

#[test]
fn test_null_intermediate_fails() {
    let err = eval_expr("missing.name", customer()).unwrap_err();
    assert!(matches!(err, OgnlError::NullTarget { .. }), "{:?}", err);
}

#[test]
fn test_literals_are_not_assignable() {
    let expr = ognl::parse_expression("1 + 2").unwrap();
    let mut ctx = Context::with_root(Value::Null);
    let err = ognl::set_value(&expr, &mut ctx, Value::Int(1)).unwrap_err();
    assert!(matches!(err, OgnlError::InappropriateExpression(_)));
}

#[test]
fn test_division_by_zero() {
    let err = eval_expr("orders[0].total / 0", customer()).unwrap_err();
    assert!(matches!(err, OgnlError::DivisionByZero));
}

#[test]
fn test_parse_errors_convert() {
    let err = eval_expr("name +", customer()).unwrap_err();
    assert!(matches!(err, OgnlError::Parse(_)));
}

#[test]
fn test_trace_records_nested_evaluations() {
    let runtime = Arc::new(
        Runtime::builder()
            .config(Config::default().with_tracing(true))
            .build(),
    );
    let mut ctx = Context::new(runtime, customer());
    let expr: Expression = "orders[0].total + 2".parse().unwrap();
    let result = ognl::get_value(&expr, &mut ctx).unwrap();
    assert_eq!(result, Value::Int(42));

    let trace = ctx.trace().to_string();
    assert!(trace.starts_with("get orders[0].total + 2"), "{}", trace);
    assert!(trace.contains("=> 42"), "{}", trace);
    assert!(trace.contains("  get orders[0].total"), "{}", trace);
}
