//! `&&` and `||`.
//!
//! Both yield the deciding operand itself rather than a boolean:
//! `"" || "x"` is `"x"`, `0 && f()` is `0` and never calls `f`.

use crate::{
    ast::{NodeKind, NodeRef},
    context::Context,
    error::{OgnlError, Result},
    ops,
    source::Fragment,
    value::Value,
};

use super::{
    generate_get, generate_skipped, get_value, set_source as child_set_source, set_value,
    skipped_set_source,
};

pub(super) fn and(node: NodeRef<'_>, ctx: &mut Context, source: &Value) -> Result<Value> {
    short_circuit(node, ctx, source, false)
}

pub(super) fn or(node: NodeRef<'_>, ctx: &mut Context, source: &Value) -> Result<Value> {
    short_circuit(node, ctx, source, true)
}

/// Evaluates operands until one has truthiness `stop_on`.
fn short_circuit(node: NodeRef<'_>, ctx: &mut Context, source: &Value, stop_on: bool) -> Result<Value> {
    let mut result = Value::Null;
    for operand in node.children() {
        result = get_value(operand, ctx, source)?;
        if ops::truthy(&result) == stop_on {
            break;
        }
    }
    Ok(result)
}

/// `a && b = v` assigns through `b` only when `a` is truthy.
pub(super) fn and_set(node: NodeRef<'_>, ctx: &mut Context, target: &Value, value: Value) -> Result<()> {
    guarded_set(node, ctx, target, value, false)
}

/// `a || b = v` assigns through `b` only when `a` is falsy.
pub(super) fn or_set(node: NodeRef<'_>, ctx: &mut Context, target: &Value, value: Value) -> Result<()> {
    guarded_set(node, ctx, target, value, true)
}

fn guarded_set(
    node: NodeRef<'_>,
    ctx: &mut Context,
    target: &Value,
    value: Value,
    skip_on: bool,
) -> Result<()> {
    let last = node.child_count() - 1;
    for guard in node.children().take(last) {
        let guard = get_value(guard, ctx, target)?;
        if ops::truthy(&guard) == skip_on {
            return Ok(());
        }
    }
    set_value(node.child(last), ctx, target, value)
}

/// Every operand but the last is hoisted into a local so it is evaluated
/// once, then the operands nest right to left:
/// `a && b && c` becomes
/// `(if ops::truthy(&_local0) { (if ops::truthy(&_local1) { c } else { _local1 }) } else { _local0 })`.
///
/// Operands after the one that decides the result on the sample are not
/// evaluated, matching [`and`] and [`or`]; see [`generate_skipped`].
pub(super) fn source(node: NodeRef<'_>, ctx: &mut Context, target: &Value) -> Result<Fragment> {
    let is_or = matches!(node.kind(), NodeKind::Or);
    let mut operands = Vec::with_capacity(node.child_count());
    let mut decided = None;
    for child in node.children() {
        let operand = match decided {
            Some(_) => generate_skipped(child, ctx, target)?,
            None => generate_get(child, ctx, target)?,
        };
        if decided.is_none() && ops::truthy(&operand.value) == is_or {
            decided = Some(operand.value.clone());
        }
        operands.push(operand);
    }

    let value = decided
        .or_else(|| operands.last().map(|o| o.value.clone()))
        .unwrap_or(Value::Null);

    let (last, guards) = operands
        .split_last()
        .ok_or_else(|| OgnlError::TypeError("logical node without operands".into()))?;
    let locals: Vec<String> = guards
        .iter()
        .map(|o| ctx.add_local(o.code.clone(), o.value_type()))
        .collect();

    let mut code = last.code.clone();
    for local in locals.iter().rev() {
        code = if is_or {
            format!("(if ops::truthy(&{local}) {{ {local} }} else {{ {code} }})")
        } else {
            format!("(if ops::truthy(&{local}) {{ {code} }} else {{ {local} }})")
        };
    }
    Ok(Fragment::new(code, value))
}

pub(super) fn set_source(node: NodeRef<'_>, ctx: &mut Context, target: &Value) -> Result<String> {
    let is_or = matches!(node.kind(), NodeKind::Or);
    let last = node.child_count() - 1;
    let mut guards = Vec::with_capacity(last);
    let mut skipped = false;
    for guard in node.children().take(last) {
        let fragment = if skipped {
            generate_skipped(guard, ctx, target)?
        } else {
            generate_get(guard, ctx, target)?
        };
        skipped = skipped || ops::truthy(&fragment.value) == is_or;
        guards.push(fragment.code);
    }
    let mut code = if skipped {
        skipped_set_source(node.child(last), ctx, target)?
    } else {
        child_set_source(node.child(last), ctx, target)?
    };
    for guard in guards.iter().rev() {
        let test = if is_or {
            format!("!ops::truthy(&({}))", guard)
        } else {
            format!("ops::truthy(&({}))", guard)
        };
        code = format!("if {} {{ {} }}", test, code);
    }
    Ok(code)
}
