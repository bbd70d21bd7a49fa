//! Default property accessor over the crate's value model.

use crate::{
    context::Context,
    error::{OgnlError, Result},
    ops,
    runtime::{IndexedPropertyType, PropertyAccessor, PropertyKey},
    value::{ArrayRef, DynamicSubscript, ListRef, ObjectRef, Value, ValueType},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPropertyAccessor;

fn no_such_property(target: &Value, name: impl ToString) -> OgnlError {
    OgnlError::NoSuchProperty {
        target: target.class_name(),
        name: name.to_string(),
    }
}

/// Member count of a list, array, map or string.
pub(crate) fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::List(l) => Some(l.len()),
        Value::Array(a) => Some(a.len()),
        Value::Map(m) => Some(m.len()),
        Value::String(s) => Some(s.chars().count()),
        _ => None,
    }
}

fn out_of_bounds(index: i64, len: usize) -> OgnlError {
    OgnlError::IndexOutOfBounds { index, len }
}

fn position(index: &Value, len: usize) -> Result<usize> {
    let i = ops::index_value(index)?;
    usize::try_from(i)
        .ok()
        .filter(|i| *i < len)
        .ok_or_else(|| out_of_bounds(i, len))
}

/// Reads `items[index]`, resolving dynamic subscripts. `[*]` yields a copy
/// of the whole sequence.
pub(crate) fn read_sequence(target: &Value, index: &Value) -> Result<Value> {
    let items = match target {
        Value::List(l) => l.read(),
        Value::Array(a) => a.read(),
        other => {
            return Err(OgnlError::TypeError(format!(
                "{} is not indexable",
                other.type_name()
            )));
        }
    };
    let len = items.len();
    match index {
        Value::Subscript(DynamicSubscript::All) => Ok(match target {
            Value::Array(a) => Value::Array(ArrayRef::new(a.component().clone(), items.clone())),
            _ => Value::List(ListRef::new(items.clone())),
        }),
        Value::Subscript(s) => Ok(s
            .resolve(len)
            .and_then(|i| items.get(i).cloned())
            .unwrap_or(Value::Null)),
        index => Ok(items[position(index, len)?].clone()),
    }
}

/// Writes `items[index] = value`. `[*]` replaces the contents with the
/// members of `value`; arrays keep their length and component type.
pub(crate) fn write_sequence(target: &Value, index: &Value, value: Value) -> Result<()> {
    match target {
        Value::List(l) => match index {
            Value::Subscript(DynamicSubscript::All) => {
                let items = value.sequence().ok_or_else(|| {
                    OgnlError::TypeError(format!("cannot assign {} to [*]", value.type_name()))
                })?;
                *l.write() = items;
                Ok(())
            }
            index => {
                let mut items = l.write();
                let at = slot(index, items.len())?;
                items[at] = value;
                Ok(())
            }
        },
        Value::Array(a) => match index {
            Value::Subscript(DynamicSubscript::All) => {
                let source = value.sequence().ok_or_else(|| {
                    OgnlError::TypeError(format!("cannot assign {} to [*]", value.type_name()))
                })?;
                let converted = source
                    .iter()
                    .map(|item| ops::convert_value(item, a.component()))
                    .collect::<Result<Vec<_>>>()?;
                let mut items = a.write();
                for (slot, item) in items.iter_mut().zip(converted) {
                    *slot = item;
                }
                Ok(())
            }
            index => {
                let converted = ops::convert_value(&value, a.component())?;
                let mut items = a.write();
                let at = slot(index, items.len())?;
                items[at] = converted;
                Ok(())
            }
        },
        other => Err(OgnlError::TypeError(format!(
            "{} is not indexable",
            other.type_name()
        ))),
    }
}

fn slot(index: &Value, len: usize) -> Result<usize> {
    match index {
        Value::Subscript(s) => s.resolve(len).ok_or_else(|| out_of_bounds(-1, len)),
        index => position(index, len),
    }
}

fn is_numeric_index(value: &Value) -> bool {
    match value {
        Value::String(s) => s.trim().parse::<i64>().is_ok(),
        Value::Subscript(_) => true,
        other => ops::numeric_type(other).is_integral(),
    }
}

fn bean_get(ctx: &mut Context, bean: &ObjectRef, target: &Value, name: &str) -> Result<Value> {
    let class = bean.class().clone();
    if let Some(def) = class.property(name) {
        if def.indexed == IndexedPropertyType::Object {
            return Err(no_such_property(target, name));
        }
        return Ok(bean.field(name).unwrap_or(Value::Null));
    }
    if let Some(value) = bean.field(name) {
        return Ok(value);
    }
    let getter = accessor_name("get", name);
    let flag = accessor_name("is", name);
    match class.method(&getter).or_else(|| class.method(&flag)) {
        Some(f) => f(ctx, target, &[]),
        None => Err(no_such_property(target, name)),
    }
}

fn bean_set(ctx: &mut Context, bean: &ObjectRef, target: &Value, name: &str, value: Value) -> Result<()> {
    let class = bean.class().clone();
    match class.property(name) {
        Some(def) if !def.writable => Err(OgnlError::method_failed(
            &accessor_name("set", name),
            format!("property '{}' of {} is read-only", name, class.name()),
        )),
        Some(def) => {
            bean.set_field(name, ops::convert_value(&value, &def.ty)?);
            Ok(())
        }
        None => match class.method(&accessor_name("set", name)) {
            Some(f) => f(ctx, target, &[value]).map(drop),
            None if bean.has_field(name) => {
                bean.set_field(name, value);
                Ok(())
            }
            None => Err(no_such_property(target, name)),
        },
    }
}

/// `getName` for `name`.
pub(crate) fn accessor_name(prefix: &str, name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("{}{}{}", prefix, first.to_uppercase(), chars.as_str()),
        None => prefix.to_string(),
    }
}

impl PropertyAccessor for DefaultPropertyAccessor {
    fn get_property(&self, ctx: &mut Context, target: &Value, key: PropertyKey<'_>) -> Result<Value> {
        match target {
            Value::Null => Err(OgnlError::NullTarget {
                name: key.to_string(),
            }),
            Value::Map(m) => {
                let k = key.to_value();
                if let Some(value) = m.get(&k) {
                    return Ok(value);
                }
                Ok(match key.as_name() {
                    Some("size") => Value::Int(m.len() as i32),
                    Some("isEmpty") => Value::Boolean(m.is_empty()),
                    Some("keys") => Value::list(m.read().keys().cloned().collect()),
                    Some("values") => Value::list(m.read().values().cloned().collect()),
                    _ => Value::Null,
                })
            }
            Value::List(_) | Value::Array(_) => match key {
                PropertyKey::Index(index) if is_numeric_index(index) => read_sequence(target, index),
                key => match (key.as_name(), target) {
                    (Some("length"), Value::Array(a)) => Ok(Value::Int(a.len() as i32)),
                    (Some("size"), _) => Ok(Value::Int(length_of(target).unwrap_or(0) as i32)),
                    (Some("isEmpty"), _) => Ok(Value::Boolean(length_of(target) == Some(0))),
                    _ => Err(no_such_property(target, key)),
                },
            },
            Value::String(s) => match key {
                PropertyKey::Index(index) if is_numeric_index(index) => {
                    let chars: Vec<char> = s.chars().collect();
                    Ok(Value::Char(chars[slot(index, chars.len())?]))
                }
                key => match key.as_name() {
                    Some("length") => Ok(Value::Int(s.chars().count() as i32)),
                    Some("empty" | "isEmpty") => Ok(Value::Boolean(s.is_empty())),
                    _ => Err(no_such_property(target, key)),
                },
            },
            Value::Object(bean) => match key.as_name() {
                Some(name) => bean_get(ctx, bean, target, name),
                None => Err(no_such_property(target, key)),
            },
            Value::Class(class) => match key.as_name().and_then(|name| class.static_field(name)) {
                Some(field) => Ok(field.value.clone()),
                None => Err(no_such_property(target, key)),
            },
            other => Err(no_such_property(other, key)),
        }
    }

    fn set_property(
        &self,
        ctx: &mut Context,
        target: &Value,
        key: PropertyKey<'_>,
        value: Value,
    ) -> Result<()> {
        match target {
            Value::Null => Err(OgnlError::NullTarget {
                name: key.to_string(),
            }),
            Value::Map(m) => {
                m.insert(key.to_value(), value);
                Ok(())
            }
            Value::List(_) | Value::Array(_) => match key {
                PropertyKey::Index(index) if is_numeric_index(index) => {
                    write_sequence(target, index, value)
                }
                key => Err(no_such_property(target, key)),
            },
            Value::Object(bean) => match key.as_name() {
                Some(name) => bean_set(ctx, bean, target, name, value),
                None => Err(no_such_property(target, key)),
            },
            other => Err(no_such_property(other, key)),
        }
    }

    fn indexed_property_type(&self, _ctx: &Context, target: &Value, name: &str) -> IndexedPropertyType {
        match target {
            Value::Object(bean) => bean
                .class()
                .property(name)
                .map(|def| def.indexed)
                .unwrap_or_default(),
            _ => IndexedPropertyType::None,
        }
    }

    fn get_indexed_property(
        &self,
        ctx: &mut Context,
        target: &Value,
        name: &str,
        index: &Value,
    ) -> Result<Value> {
        let Value::Object(bean) = target else {
            let whole = self.get_property(ctx, target, PropertyKey::Name(name))?;
            return self.get_property(ctx, &whole, PropertyKey::Index(index));
        };
        let whole = bean.field(name).unwrap_or(Value::Null);
        match self.indexed_property_type(ctx, target, name) {
            IndexedPropertyType::Object => match whole {
                Value::Map(m) => Ok(m.get(index).unwrap_or(Value::Null)),
                Value::Null => Ok(Value::Null),
                other => Err(OgnlError::TypeError(format!(
                    "object indexed property '{}' holds {}",
                    name,
                    other.type_name()
                ))),
            },
            _ => read_sequence(&whole, index),
        }
    }

    fn set_indexed_property(
        &self,
        ctx: &mut Context,
        target: &Value,
        name: &str,
        index: &Value,
        value: Value,
    ) -> Result<()> {
        let Value::Object(bean) = target else {
            let whole = self.get_property(ctx, target, PropertyKey::Name(name))?;
            return self.set_property(ctx, &whole, PropertyKey::Index(index), value);
        };
        let def = bean
            .class()
            .property(name)
            .cloned()
            .ok_or_else(|| no_such_property(target, name))?;
        let whole = bean.field(name).unwrap_or(Value::Null);
        match def.indexed {
            IndexedPropertyType::Object => match whole {
                Value::Map(m) => {
                    m.insert(index.clone(), value);
                    Ok(())
                }
                _ => Err(OgnlError::NullTarget {
                    name: format!("{}[{}]", name, index),
                }),
            },
            _ => {
                let value = match &def.ty {
                    ValueType::Array(component) => ops::convert_value(&value, component)?,
                    _ => value,
                };
                write_sequence(&whole, index, value)
            }
        }
    }
}
