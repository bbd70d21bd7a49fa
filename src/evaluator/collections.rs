//! List, map and array construction; projection and selection.

use crate::{
    ast::{NodeKind, NodeRef},
    context::{Context, SourceBase},
    error::{OgnlError, Result},
    ops,
    source::{self, Fragment},
    value::{MapRef, Value, ValueMap, ValueType},
};

use super::{generate_get, get_value};

pub(super) fn list(node: NodeRef<'_>, ctx: &mut Context, source: &Value) -> Result<Value> {
    let items = node
        .children()
        .map(|child| get_value(child, ctx, source))
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::list(items))
}

/// `#{ k : v }`. A key without a value maps to null. `#@Class@{ ... }`
/// tags the map with the resolved class name.
pub(super) fn map(
    node: NodeRef<'_>,
    ctx: &mut Context,
    source: &Value,
    class_name: Option<&str>,
) -> Result<Value> {
    let mut entries = ValueMap::new();
    for entry in node.children() {
        let key = get_value(entry.child(0), ctx, source)?;
        let value = if entry.child_count() == 2 {
            get_value(entry.child(1), ctx, source)?
        } else {
            Value::Null
        };
        entries.insert(key, value);
    }
    let map = match class_name {
        Some(name) => {
            let class = ctx.class_for_name(name)?;
            MapRef::with_class(class.name(), entries)
        }
        None => MapRef::new(entries),
    };
    Ok(Value::Map(map))
}

fn component_type(ctx: &Context, name: &str) -> Result<ValueType> {
    if let Some(ty) = ValueType::from_component_name(name) {
        return Ok(ty);
    }
    let class = ctx.class_for_name(name)?;
    Ok(ValueType::Object(class.name().to_string()))
}

fn convert_member(value: &Value, component: &ValueType) -> Result<Value> {
    match component {
        ValueType::Object(_) => Ok(value.clone()),
        ty => ops::convert_value(value, ty),
    }
}

fn array_of(component: ValueType, items: &[Value]) -> Result<Value> {
    let items = items
        .iter()
        .map(|item| convert_member(item, &component))
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::array(component, items))
}

/// `new T[value]`: a sequence converts member by member, anything else
/// is a size and yields an array of default values.
fn array_from(component: ValueType, value: &Value) -> Result<Value> {
    if let Some(items) = value.sequence() {
        return array_of(component, &items);
    }
    let size = ops::index_value(value)?;
    let size = usize::try_from(size)
        .map_err(|_| OgnlError::TypeError(format!("negative array size {}", size)))?;
    let items = vec![ops::default_value(&component); size];
    Ok(Value::array(component, items))
}

pub(super) fn array(node: NodeRef<'_>, ctx: &mut Context, class_name: &str) -> Result<Value> {
    let component = component_type(ctx, class_name)?;
    let init = node.child(0);
    let root = ctx.root().clone();
    let value = if matches!(init.kind(), NodeKind::List) {
        let items = init
            .children()
            .map(|child| get_value(child, ctx, &root))
            .collect::<Result<Vec<_>>>()?;
        array_of(component, &items)?
    } else {
        let size = get_value(init, ctx, &root)?;
        array_from(component, &size)?
    };
    ctx.settle(&value);
    Ok(value)
}

/// `.{ expr }` evaluates `expr` once per element of the source.
pub(super) fn project(node: NodeRef<'_>, ctx: &mut Context, source: &Value) -> Result<Value> {
    let body = node.child(0);
    let elements = ctx.elements(source)?;
    let mut projected = Vec::with_capacity(elements.len());
    for element in &elements {
        projected.push(get_value(body, ctx, element)?);
    }
    Ok(Value::list(projected))
}

/// `.{? }` keeps every match, `.{^ }` the first and `.{$ }` the last, the
/// latter two as lists of at most one element.
pub(super) fn select(node: NodeRef<'_>, ctx: &mut Context, source: &Value) -> Result<Value> {
    let body = node.child(0);
    let elements = ctx.elements(source)?;
    let mut selected = Vec::new();
    for element in elements {
        if !ops::truthy(&get_value(body, ctx, &element)?) {
            continue;
        }
        match node.kind() {
            NodeKind::SelectFirst => {
                selected.push(element);
                break;
            }
            NodeKind::SelectLast => selected = vec![element],
            _ => selected.push(element),
        }
    }
    Ok(Value::list(selected))
}

pub(super) fn source(node: NodeRef<'_>, ctx: &mut Context, target: &Value) -> Result<Fragment> {
    match node.kind() {
        NodeKind::List => {
            let items = node
                .children()
                .map(|child| generate_get(child, ctx, target))
                .collect::<Result<Vec<_>>>()?;
            let codes: Vec<&str> = items.iter().map(|i| i.code.as_str()).collect();
            let value = Value::list(items.iter().map(|i| i.value.clone()).collect());
            Ok(Fragment::new(format!("vec![{}]", codes.join(", ")), value))
        }
        NodeKind::Ctor { class_name, .. } => {
            let component = component_type(ctx, class_name)?;
            let init = node.child(0);
            let root = ctx.root().clone();
            let (code, value) = if matches!(init.kind(), NodeKind::List) {
                let items = source::detached(ctx, SourceBase::Root, |ctx| {
                    init.children()
                        .map(|child| generate_get(child, ctx, &root))
                        .collect::<Result<Vec<_>>>()
                })?;
                let codes: Vec<&str> = items.iter().map(|i| i.code.as_str()).collect();
                let values: Vec<Value> = items.iter().map(|i| i.value.clone()).collect();
                (
                    format!("new_array({:?}, [{}])", class_name, codes.join(", ")),
                    array_of(component, &values)?,
                )
            } else {
                let size = source::detached(ctx, SourceBase::Root, |ctx| generate_get(init, ctx, &root))?;
                (
                    format!("new_array({:?}, {})", class_name, size.code),
                    array_from(component, &size.value)?,
                )
            };
            ctx.settle(&value);
            Ok(Fragment::new(code, value))
        }
        other => unreachable!("{} is not a collection constructor", other.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sized_arrays_hold_default_values() {
        let value = array_from(ValueType::Int, &Value::Int(2)).unwrap();
        assert_eq!(value, Value::array(ValueType::Int, vec![Value::Int(0), Value::Int(0)]));
        assert!(array_from(ValueType::Int, &Value::Int(-1)).is_err());
    }

    #[test]
    fn sequences_convert_to_the_component_type() {
        let source = Value::list(vec![Value::string("1"), Value::Long(2)]);
        let value = array_from(ValueType::Int, &source).unwrap();
        assert_eq!(value, Value::array(ValueType::Int, vec![Value::Int(1), Value::Int(2)]));
    }
}
