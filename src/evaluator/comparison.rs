//! Comparisons, membership and `instanceof`.

use crate::{
    ast::{CompareOp, NodeKind, NodeRef},
    context::Context,
    error::Result,
    ops,
    source::Fragment,
    value::Value,
};

use super::{generate_get, get_value};

pub(super) fn compare(node: NodeRef<'_>, ctx: &mut Context, source: &Value, op: CompareOp) -> Result<Value> {
    let left = get_value(node.child(0), ctx, source)?;
    let right = get_value(node.child(1), ctx, source)?;
    Ok(Value::Boolean(ops::comparison(op, &left, &right)?))
}

/// `a in b`: whether any element of `b` equals `a`.
pub(super) fn contains(node: NodeRef<'_>, ctx: &mut Context, source: &Value, negated: bool) -> Result<Value> {
    let needle = get_value(node.child(0), ctx, source)?;
    let haystack = get_value(node.child(1), ctx, source)?;
    let found = ctx
        .elements(&haystack)?
        .iter()
        .any(|element| ops::equal(element, &needle));
    Ok(Value::Boolean(found != negated))
}

pub(super) fn instance_of(
    node: NodeRef<'_>,
    ctx: &mut Context,
    source: &Value,
    class_name: &str,
) -> Result<Value> {
    let value = get_value(node.child(0), ctx, source)?;
    Ok(Value::Boolean(ctx.instance_of(&value, class_name)?))
}

pub(super) fn source(node: NodeRef<'_>, ctx: &mut Context, target: &Value) -> Result<Fragment> {
    let operands = node
        .children()
        .map(|child| generate_get(child, ctx, target))
        .collect::<Result<Vec<_>>>()?;
    match node.kind() {
        NodeKind::Compare(op) => {
            let (a, b) = (&operands[0], &operands[1]);
            let value = ops::comparison(*op, &a.value, &b.value)?;
            let code = format!("ops::comparison(CompareOp::{:?}, &({}), &({}))?", op, a.code, b.code);
            Ok(Fragment::new(code, Value::Boolean(value)))
        }
        NodeKind::In { negated } => {
            let (a, b) = (&operands[0], &operands[1]);
            let found = ctx
                .elements(&b.value)?
                .iter()
                .any(|element| ops::equal(element, &a.value));
            let code = format!(
                "{}ctx.elements(&({}))?.iter().any(|e| ops::equal(e, &({})))",
                if *negated { "!" } else { "" },
                b.code,
                a.code
            );
            Ok(Fragment::new(code, Value::Boolean(found != *negated)))
        }
        NodeKind::Instanceof { class_name } => {
            let operand = &operands[0];
            let value = ctx.instance_of(&operand.value, class_name)?;
            let code = format!("ctx.instance_of(&({}), {:?})?", operand.code, class_name);
            Ok(Fragment::new(code, Value::Boolean(value)))
        }
        other => unreachable!("{} is not a comparison", other.name()),
    }
}
