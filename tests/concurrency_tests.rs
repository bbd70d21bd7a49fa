use std::sync::Arc;
use std::thread;

use ognl::{Context, Runtime, Value};
use pretty_assertions::assert_eq;

const THREADS: usize = 8;

#[test]
fn test_constant_folding_publishes_one_value() {
    let expr = ognl::parse_expression("\"ab\" + \"cd\"").unwrap();
    let runtime = Arc::new(Runtime::new());

    let results: Vec<Value> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let expr = &expr;
                let runtime = Arc::clone(&runtime);
                scope.spawn(move || {
                    let mut ctx = Context::new(runtime, Value::Null);
                    ognl::get_value(expr, &mut ctx).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results[0], Value::string("abcd"));
    for result in &results[1..] {
        assert!(result.same(&results[0]), "{:?} was computed twice", result);
    }
}

#[test]
fn test_shared_tree_with_separate_roots() {
    let expr = ognl::parse_expression("items.{? #this % 2 == 0 }.size() + offset").unwrap();
    let runtime = Arc::new(Runtime::new());

    thread::scope(|scope| {
        for n in 0..THREADS {
            let expr = &expr;
            let runtime = Arc::clone(&runtime);
            scope.spawn(move || {
                let items = (0..n as i32).map(Value::Int).collect();
                let root = Value::map(vec![
                    (Value::string("items"), Value::list(items)),
                    (Value::string("offset"), Value::Int(100)),
                ]);
                let mut ctx = Context::new(runtime, root);
                let evens = n.div_ceil(2) as i32;
                assert_eq!(ognl::get_value(expr, &mut ctx).unwrap(), Value::Int(100 + evens));
            });
        }
    });
}

#[test]
fn test_shared_root_sees_every_write() {
    let list = Value::list(Vec::new());
    let root = Value::map(vec![(Value::string("log"), list.clone())]);
    let expr = ognl::parse_expression("log.add(#entry)").unwrap();
    let runtime = Arc::new(Runtime::new());

    thread::scope(|scope| {
        for n in 0..THREADS {
            let (expr, root) = (&expr, root.clone());
            let runtime = Arc::clone(&runtime);
            scope.spawn(move || {
                let mut ctx = Context::new(runtime, root);
                ctx.set_variable("entry", Value::Int(n as i32));
                ognl::get_value(expr, &mut ctx).unwrap();
            });
        }
    });

    let size = ognl::eval("log.size()", root).unwrap();
    assert_eq!(size, Value::Int(THREADS as i32));
}
