//! Unary and binary operator families.

use crate::{
    ast::{BinaryOp, NodeRef, UnaryOp},
    context::Context,
    error::Result,
    ops,
    source::{self, Fragment},
    value::{Value, ValueType},
};

use super::{generate_get, get_value};

pub(super) fn unary(node: NodeRef<'_>, ctx: &mut Context, source: &Value, op: UnaryOp) -> Result<Value> {
    let operand = get_value(node.child(0), ctx, source)?;
    ops::unary(op, &operand)
}

/// Folds the operands left to right: `a - b - c` is `(a - b) - c`.
pub(super) fn binary(node: NodeRef<'_>, ctx: &mut Context, source: &Value, op: BinaryOp) -> Result<Value> {
    let mut result = get_value(node.child(0), ctx, source)?;
    for operand in node.children().skip(1) {
        let value = get_value(operand, ctx, source)?;
        result = ops::binary(op, &result, &value)?;
    }
    Ok(result)
}

pub(super) fn unary_source(
    node: NodeRef<'_>,
    ctx: &mut Context,
    target: &Value,
    op: UnaryOp,
) -> Result<Fragment> {
    let operand = generate_get(node.child(0), ctx, target)?;
    let value = ops::unary(op, &operand.value)?;
    let code = match op {
        UnaryOp::Not => format!("!ops::truthy(&{})", operand.code),
        UnaryOp::Negate => format!("-({})", operand.code),
        UnaryOp::BitNegate => format!("!({})", operand.code),
    };
    Ok(Fragment::new(code, value))
}

/// Widest operand type of an addition, as far as generated source is
/// concerned. See [`source::is_wider`].
fn widest_addend(operands: &[Fragment]) -> Option<ValueType> {
    let mut widest = None;
    for ty in operands.iter().filter_map(Fragment::value_type) {
        if source::is_wider(&ty, widest.as_ref()) {
            widest = Some(ty);
        }
    }
    widest
}

/// `a op b op c` with every operand cast to `ty`.
fn infix(operands: &[Fragment], ty: Option<&ValueType>, op: BinaryOp) -> String {
    let parts: Vec<String> = operands
        .iter()
        .map(|o| match ty {
            Some(ty) => source::cast(o, ty),
            None => o.code.clone(),
        })
        .collect();
    format!("({})", parts.join(&format!(" {} ", op.symbol())))
}

/// The addends before the fold turns into concatenation stay a numeric sum:
/// `1 + 2 + "s"` renders `format!("{}{}", (1 + 2), "s")`.
fn concatenation(operands: &[Fragment], poisoned_at: usize) -> String {
    let (sum, rest) = operands.split_at(poisoned_at.max(1));
    let head = match sum {
        [single] => single.code.clone(),
        sum => infix(sum, widest_addend(sum).as_ref(), BinaryOp::Add),
    };
    let codes: Vec<&str> = std::iter::once(head.as_str())
        .chain(rest.iter().map(|o| o.code.as_str()))
        .collect();
    format!("format!(\"{}\", {})", "{}".repeat(codes.len()), codes.join(", "))
}

pub(super) fn binary_source(
    node: NodeRef<'_>,
    ctx: &mut Context,
    target: &Value,
    op: BinaryOp,
) -> Result<Fragment> {
    let operands = node
        .children()
        .map(|child| generate_get(child, ctx, target))
        .collect::<Result<Vec<_>>>()?;

    // Index of the operand after which the running value is a string.
    let mut poisoned_at = None;
    let mut value = operands[0].value.clone();
    if matches!(value, Value::String(_)) {
        poisoned_at = Some(0);
    }
    for (i, operand) in operands.iter().enumerate().skip(1) {
        value = ops::binary(op, &value, &operand.value)?;
        if poisoned_at.is_none() && matches!(value, Value::String(_)) {
            poisoned_at = Some(i);
        }
    }

    let code = match (op, poisoned_at) {
        (BinaryOp::Add, Some(at)) => concatenation(&operands, at),
        (BinaryOp::Add, None) => infix(&operands, widest_addend(&operands).as_ref(), op),
        _ => {
            let ty = operands
                .iter()
                .map(|o| ops::numeric_type(&o.value))
                .reduce(|a, b| ops::binary_type(op, a, b))
                .map(|t| t.value_type());
            infix(&operands, ty.as_ref(), op)
        }
    };
    Ok(Fragment::new(code, value))
}
