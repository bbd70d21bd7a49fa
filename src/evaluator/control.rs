//! Sequences, assignment, the ternary and evaluation nodes.

use std::sync::Arc;

use crate::{
    ast::{Expression, NodeKind, NodeRef},
    context::Context,
    error::{OgnlError, Result},
    ops, parser,
    source::{Fragment, VALUE_BINDING},
    value::Value,
};

use super::{
    generate_get, generate_skipped, get_value, set_source as child_set_source, set_value,
    skipped_set_source,
};

pub(super) fn sequence(node: NodeRef<'_>, ctx: &mut Context, source: &Value) -> Result<Value> {
    let mut result = Value::Null;
    for child in node.children() {
        result = get_value(child, ctx, source)?;
    }
    Ok(result)
}

pub(super) fn sequence_set(node: NodeRef<'_>, ctx: &mut Context, target: &Value, value: Value) -> Result<()> {
    let last = node.child_count() - 1;
    for child in node.children().take(last) {
        get_value(child, ctx, target)?;
    }
    set_value(node.child(last), ctx, target, value)
}

/// `lhs = rhs` yields the assigned value.
pub(super) fn assign(node: NodeRef<'_>, ctx: &mut Context, source: &Value) -> Result<Value> {
    let value = get_value(node.child(1), ctx, source)?;
    set_value(node.child(0), ctx, source, value.clone())?;
    Ok(value)
}

fn branch<'a>(node: NodeRef<'a>, condition: &Value) -> NodeRef<'a> {
    if ops::truthy(condition) {
        node.child(1)
    } else {
        node.child(2)
    }
}

pub(super) fn test(node: NodeRef<'_>, ctx: &mut Context, source: &Value) -> Result<Value> {
    let condition = get_value(node.child(0), ctx, source)?;
    get_value(branch(node, &condition), ctx, source)
}

pub(super) fn test_set(node: NodeRef<'_>, ctx: &mut Context, target: &Value, value: Value) -> Result<()> {
    let condition = get_value(node.child(0), ctx, target)?;
    set_value(branch(node, &condition), ctx, target, value)
}

/// The expression an evaluation node runs: a lambda body, or the parse of
/// a string.
fn expression_of(value: &Value) -> Result<Arc<Expression>> {
    match value {
        Value::Lambda(body) => Ok(Arc::clone(body)),
        Value::String(text) => Ok(Arc::new(parser::parse(text)?)),
        other => Err(OgnlError::TypeError(format!(
            "{} cannot be evaluated as an expression",
            other.type_name()
        ))),
    }
}

/// Runs `f` with `root` bound as the context root, restoring the previous
/// root afterwards whether or not `f` fails.
fn with_root<T>(ctx: &mut Context, root: Value, f: impl FnOnce(&mut Context) -> Result<T>) -> Result<T> {
    let saved = ctx.root().clone();
    ctx.set_root(root);
    let result = f(ctx);
    ctx.set_root(saved);
    result
}

/// `(expr)(arg)`: evaluates `expr` with `arg` as both root and `#this`.
pub(super) fn eval(node: NodeRef<'_>, ctx: &mut Context, source: &Value) -> Result<Value> {
    let expression = expression_of(&get_value(node.child(0), ctx, source)?)?;
    let arg = get_value(node.child(1), ctx, source)?;
    with_root(ctx, arg.clone(), |ctx| get_value(expression.root(), ctx, &arg))
}

pub(super) fn eval_set(node: NodeRef<'_>, ctx: &mut Context, target: &Value, value: Value) -> Result<()> {
    let expression = expression_of(&get_value(node.child(0), ctx, target)?)?;
    let arg = get_value(node.child(1), ctx, target)?;
    with_root(ctx, arg.clone(), |ctx| set_value(expression.root(), ctx, &arg, value))
}

pub(super) fn source(node: NodeRef<'_>, ctx: &mut Context, target: &Value) -> Result<Fragment> {
    match node.kind() {
        NodeKind::Sequence => {
            let parts = node
                .children()
                .map(|child| generate_get(child, ctx, target))
                .collect::<Result<Vec<_>>>()?;
            let value = parts.last().map(|p| p.value.clone()).unwrap_or(Value::Null);
            let codes: Vec<&str> = parts.iter().map(|p| p.code.as_str()).collect();
            Ok(Fragment::new(format!("{{ {} }}", codes.join("; ")), value))
        }
        // The sample root is only read: the assignment itself is rendered,
        // never performed.
        NodeKind::Assign => {
            let rhs = generate_get(node.child(1), ctx, target)?;
            let setter = child_set_source(node.child(0), ctx, target)?;
            Ok(Fragment::new(setter.replace(VALUE_BINDING, &rhs.code), rhs.value))
        }
        NodeKind::Test => {
            let condition = generate_get(node.child(0), ctx, target)?;
            let (then, otherwise) = if ops::truthy(&condition.value) {
                let then = generate_get(node.child(1), ctx, target)?;
                (then, generate_skipped(node.child(2), ctx, target)?)
            } else {
                let then = generate_skipped(node.child(1), ctx, target)?;
                (then, generate_get(node.child(2), ctx, target)?)
            };
            let value = if ops::truthy(&condition.value) {
                then.value
            } else {
                otherwise.value
            };
            let code = format!(
                "(if ops::truthy(&{}) {{ {} }} else {{ {} }})",
                condition.code, then.code, otherwise.code
            );
            Ok(Fragment::new(code, value))
        }
        other => unreachable!("{} is not a control node", other.name()),
    }
}

pub(super) fn set_source(node: NodeRef<'_>, ctx: &mut Context, target: &Value) -> Result<String> {
    match node.kind() {
        NodeKind::Sequence => {
            let last = node.child_count() - 1;
            let mut parts = Vec::with_capacity(node.child_count());
            for child in node.children().take(last) {
                parts.push(generate_get(child, ctx, target)?.code);
            }
            parts.push(child_set_source(node.child(last), ctx, target)?);
            Ok(format!("{{ {} }}", parts.join("; ")))
        }
        NodeKind::Test => {
            let condition = generate_get(node.child(0), ctx, target)?;
            let (then, otherwise) = if ops::truthy(&condition.value) {
                let then = child_set_source(node.child(1), ctx, target)?;
                (then, skipped_set_source(node.child(2), ctx, target)?)
            } else {
                let then = skipped_set_source(node.child(1), ctx, target)?;
                (then, child_set_source(node.child(2), ctx, target)?)
            };
            Ok(format!(
                "if ops::truthy(&({})) {{ {} }} else {{ {} }}",
                condition.code, then, otherwise
            ))
        }
        _ => Err(OgnlError::InappropriateExpression(node.to_string())),
    }
}
