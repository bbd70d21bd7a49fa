//! Default method accessor: built-in methods of the value model plus the
//! closures registered on classes.

use std::{cmp::Ordering, sync::Arc};

use regex::Regex;

use crate::{
    context::Context,
    error::{OgnlError, Result},
    ops,
    runtime::{ClassRef, MethodAccessor, PropertyKey},
    value::{ListRef, MapRef, Value},
};

use super::properties::length_of;

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMethodAccessor;

/// Checks the argument count of a built-in method.
pub(crate) fn expect_args<'a, const N: usize>(method: &str, args: &'a [Value]) -> Result<&'a [Value; N]> {
    <&[Value; N]>::try_from(args).map_err(|_| {
        OgnlError::method_failed(
            method,
            format!("expected {} argument(s), got {}", N, args.len()),
        )
    })
}

fn no_such_method(target: &Value, name: &str, args: &[Value]) -> OgnlError {
    OgnlError::method_failed(
        name,
        format!("no method taking {} argument(s) on {}", args.len(), target.class_name()),
    )
}

fn int(n: usize) -> Value {
    Value::Int(n as i32)
}

fn index_arg(method: &str, value: &Value) -> Result<usize> {
    let i = ops::index_value(value)?;
    usize::try_from(i).map_err(|_| OgnlError::method_failed(method, format!("negative index {}", i)))
}

fn text(value: &Value) -> String {
    value.to_string()
}

/// Decapitalized property name behind `getX`/`isX`/`setX`, if `name` is one.
fn property_of(name: &str, prefix: &str) -> Option<String> {
    let rest = name.strip_prefix(prefix)?;
    let mut chars = rest.chars();
    let first = chars.next().filter(|c| c.is_uppercase())?;
    Some(format!("{}{}", first.to_lowercase(), chars.as_str()))
}

fn char_index(s: &str, index: usize) -> Option<usize> {
    s.char_indices().map(|(i, _)| i).chain(std::iter::once(s.len())).nth(index)
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Result<Option<Value>> {
    let value = match (name, args) {
        ("length", []) => int(s.chars().count()),
        ("isEmpty", []) => Value::Boolean(s.is_empty()),
        ("trim", []) => Value::string(s.trim()),
        ("toUpperCase", []) => Value::from(s.to_uppercase()),
        ("toLowerCase", []) => Value::from(s.to_lowercase()),
        ("charAt", [i]) => {
            let i = index_arg(name, i)?;
            s.chars()
                .nth(i)
                .map(Value::Char)
                .ok_or(OgnlError::IndexOutOfBounds {
                    index: i as i64,
                    len: s.chars().count(),
                })?
        }
        ("substring", [from]) | ("substring", [from, _]) => {
            let start = char_index(s, index_arg(name, from)?);
            let end = match args.get(1) {
                Some(to) => char_index(s, index_arg(name, to)?),
                None => Some(s.len()),
            };
            match (start, end) {
                (Some(start), Some(end)) if start <= end => Value::string(&s[start..end]),
                _ => {
                    return Err(OgnlError::method_failed(name, "substring range out of bounds"));
                }
            }
        }
        ("indexOf", [needle]) => match s.find(&text(needle)) {
            Some(at) => int(s[..at].chars().count()),
            None => Value::Int(-1),
        },
        ("lastIndexOf", [needle]) => match s.rfind(&text(needle)) {
            Some(at) => int(s[..at].chars().count()),
            None => Value::Int(-1),
        },
        ("contains", [needle]) => Value::Boolean(s.contains(&text(needle))),
        ("startsWith", [prefix]) => Value::Boolean(s.starts_with(&text(prefix))),
        ("endsWith", [suffix]) => Value::Boolean(s.ends_with(&text(suffix))),
        ("concat", [other]) => Value::from(format!("{}{}", s, other)),
        ("replace", [from, to]) => Value::from(s.replace(&text(from), &text(to))),
        ("equalsIgnoreCase", [other]) => Value::Boolean(s.eq_ignore_ascii_case(&text(other))),
        ("compareTo", [other]) => int_ordering(s.cmp(text(other).as_str())),
        ("matches", [pattern]) => {
            let re = compile_regex(name, &format!("^(?:{})$", pattern))?;
            Value::Boolean(re.is_match(s))
        }
        ("split", [pattern]) => {
            let re = compile_regex(name, &text(pattern))?;
            let mut parts: Vec<Value> = re.split(s).map(Value::string).collect();
            while parts.len() > 1 && parts.last() == Some(&Value::string("")) {
                parts.pop();
            }
            Value::list(parts)
        }
        ("replaceAll", [pattern, replacement]) => {
            let re = compile_regex(name, &text(pattern))?;
            Value::from(re.replace_all(s, text(replacement).as_str()).into_owned())
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn compile_regex(method: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|err| OgnlError::method_failed(method, err.to_string()))
}

fn int_ordering(ordering: Ordering) -> Value {
    Value::Int(match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    })
}

fn list_method(list: &ListRef, name: &str, args: &[Value]) -> Result<Option<Value>> {
    let value = match (name, args) {
        ("size", []) => int(list.len()),
        ("isEmpty", []) => Value::Boolean(list.is_empty()),
        ("get", [i]) => {
            let items = list.read();
            let at = index_arg(name, i)?;
            items.get(at).cloned().ok_or(OgnlError::IndexOutOfBounds {
                index: at as i64,
                len: items.len(),
            })?
        }
        ("contains", [needle]) => Value::Boolean(list.read().iter().any(|v| ops::equal(v, needle))),
        ("indexOf", [needle]) => match list.read().iter().position(|v| ops::equal(v, needle)) {
            Some(at) => int(at),
            None => Value::Int(-1),
        },
        ("add", [item]) => {
            list.write().push(item.clone());
            Value::Boolean(true)
        }
        ("add", [i, item]) => {
            let mut items = list.write();
            let at = index_arg(name, i)?;
            if at > items.len() {
                return Err(OgnlError::IndexOutOfBounds {
                    index: at as i64,
                    len: items.len(),
                });
            }
            items.insert(at, item.clone());
            Value::Null
        }
        ("addAll", [other]) => {
            let extra = other
                .sequence()
                .ok_or_else(|| OgnlError::method_failed(name, "argument is not a collection"))?;
            list.write().extend(extra);
            Value::Boolean(true)
        }
        ("set", [i, item]) => {
            let mut items = list.write();
            let at = index_arg(name, i)?;
            let len = items.len();
            let slot = items.get_mut(at).ok_or(OgnlError::IndexOutOfBounds {
                index: at as i64,
                len,
            })?;
            std::mem::replace(slot, item.clone())
        }
        ("remove", [i]) if ops::numeric_type(i).is_integral() => {
            let mut items = list.write();
            let at = index_arg(name, i)?;
            if at >= items.len() {
                return Err(OgnlError::IndexOutOfBounds {
                    index: at as i64,
                    len: items.len(),
                });
            }
            items.remove(at)
        }
        ("remove", [item]) => {
            let mut items = list.write();
            match items.iter().position(|v| ops::equal(v, item)) {
                Some(at) => {
                    items.remove(at);
                    Value::Boolean(true)
                }
                None => Value::Boolean(false),
            }
        }
        ("clear", []) => {
            list.write().clear();
            Value::Null
        }
        ("subList", [from, to]) => {
            let items = list.read();
            let (from, to) = (index_arg(name, from)?, index_arg(name, to)?);
            match items.get(from..to) {
                Some(slice) => Value::list(slice.to_vec()),
                None => return Err(OgnlError::method_failed(name, "range out of bounds")),
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn map_method(map: &MapRef, name: &str, args: &[Value]) -> Result<Option<Value>> {
    let value = match (name, args) {
        ("size", []) => int(map.len()),
        ("isEmpty", []) => Value::Boolean(map.is_empty()),
        ("get", [key]) => map.get(key).unwrap_or(Value::Null),
        ("put", [key, value]) => map.insert(key.clone(), value.clone()).unwrap_or(Value::Null),
        ("containsKey", [key]) => Value::Boolean(map.read().contains_key(key)),
        ("containsValue", [value]) => {
            Value::Boolean(map.read().values().any(|v| ops::equal(v, value)))
        }
        ("remove", [key]) => map.write().remove(key).unwrap_or(Value::Null),
        ("keySet", []) => Value::list(map.read().keys().cloned().collect()),
        ("values", []) => Value::list(map.read().values().cloned().collect()),
        ("clear", []) => {
            map.write().clear();
            Value::Null
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn number_method(target: &Value, name: &str, args: &[Value]) -> Result<Option<Value>> {
    use crate::value::ValueType;

    let ty = match name {
        "byteValue" => ValueType::Byte,
        "shortValue" => ValueType::Short,
        "intValue" => ValueType::Int,
        "longValue" => ValueType::Long,
        "floatValue" => ValueType::Float,
        "doubleValue" => ValueType::Double,
        "booleanValue" => ValueType::Boolean,
        "charValue" => ValueType::Char,
        "compareTo" => {
            let [other] = expect_args::<1>(name, args)?;
            return Ok(Some(int_ordering(
                ops::compare(target, other)?.unwrap_or(Ordering::Equal),
            )));
        }
        _ => return Ok(None),
    };
    expect_args::<0>(name, args)?;
    ops::convert_value(target, &ty).map(Some)
}

/// Methods every value answers.
fn universal_method(ctx: &Context, target: &Value, name: &str, args: &[Value]) -> Option<Value> {
    let value = match (name, args) {
        ("toString", []) => Value::from(target.to_string()),
        ("equals", [other]) => Value::Boolean(ops::equal(target, other)),
        ("getClass", []) => match target {
            Value::Object(o) => Value::Class(o.class().clone()),
            other => ctx
                .class_for_name(&other.class_name())
                .map(Value::Class)
                .unwrap_or(Value::Null),
        },
        _ => return None,
    };
    Some(value)
}

impl DefaultMethodAccessor {
    fn builtin(&self, ctx: &mut Context, target: &Value, name: &str, args: &[Value]) -> Result<Option<Value>> {
        match target {
            Value::String(s) => string_method(s, name, args),
            Value::List(l) => list_method(l, name, args),
            Value::Array(_) => Ok(match (name, args) {
                ("clone", []) => match target {
                    Value::Array(a) => Some(Value::Array(a.copy())),
                    _ => None,
                },
                ("size" | "length", []) => length_of(target).map(int),
                _ => None,
            }),
            Value::Map(m) => map_method(m, name, args),
            Value::Class(class) => match (name, args) {
                ("getName", []) => Ok(Some(Value::string(class.name()))),
                ("getSimpleName", []) => Ok(Some(Value::string(class.simple_name()))),
                _ if class.static_method(name).is_some() => {
                    self.call_static_method(ctx, class, name, args).map(Some)
                }
                _ => Ok(None),
            },
            v if ops::numeric_type(v).is_numeric() => number_method(v, name, args),
            _ => Ok(None),
        }
    }

    fn bean_method(&self, ctx: &mut Context, target: &Value, class: &ClassRef, name: &str, args: &[Value]) -> Result<Option<Value>> {
        if let Some(f) = class.method(name) {
            return f(ctx, target, args).map(Some);
        }
        let getter = property_of(name, "get").or_else(|| property_of(name, "is"));
        match (getter, property_of(name, "set"), args) {
            (Some(property), _, []) if class.property(&property).is_some() => {
                let runtime = Arc::clone(ctx.runtime());
                runtime
                    .properties()
                    .get_property(ctx, target, PropertyKey::Name(&property))
                    .map(Some)
            }
            (_, Some(property), [value]) if class.property(&property).is_some() => {
                let runtime = Arc::clone(ctx.runtime());
                runtime
                    .properties()
                    .set_property(ctx, target, PropertyKey::Name(&property), value.clone())?;
                Ok(Some(Value::Null))
            }
            _ => Ok(None),
        }
    }
}

impl MethodAccessor for DefaultMethodAccessor {
    fn call_method(&self, ctx: &mut Context, target: &Value, name: &str, args: &[Value]) -> Result<Value> {
        if target.is_null() {
            return Err(OgnlError::method_failed(name, "target is null"));
        }
        let found = match target {
            Value::Object(o) => {
                let class = o.class().clone();
                self.bean_method(ctx, target, &class, name, args)?
            }
            _ => self.builtin(ctx, target, name, args)?,
        };
        found
            .or_else(|| universal_method(ctx, target, name, args))
            .ok_or_else(|| no_such_method(target, name, args))
    }

    fn call_static_method(
        &self,
        ctx: &mut Context,
        class: &ClassRef,
        name: &str,
        args: &[Value],
    ) -> Result<Value> {
        match class.static_method(name) {
            Some(f) => {
                let f = Arc::clone(f);
                f(ctx, args)
            }
            None => Err(OgnlError::method_failed(
                name,
                format!("no static method '{}' on {}", name, class.name()),
            )),
        }
    }

    fn call_constructor(&self, ctx: &mut Context, class: &ClassRef, args: &[Value]) -> Result<Value> {
        match (class.constructor(), args) {
            (Some(f), _) => {
                let f = Arc::clone(f);
                f(ctx, args)
            }
            (None, []) => Ok(Value::Object(class.instantiate())),
            (None, _) => Err(OgnlError::method_failed(
                "<init>",
                format!("no constructor of {} takes {} argument(s)", class.name(), args.len()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(target: Value, name: &str, args: &[Value]) -> Result<Value> {
        let mut ctx = Context::with_root(Value::Null);
        DefaultMethodAccessor.call_method(&mut ctx, &target, name, args)
    }

    #[test]
    fn string_methods_count_chars() {
        assert_eq!(call(Value::string("héllo"), "length", &[]).unwrap(), Value::Int(5));
        assert_eq!(
            call(Value::string("héllo"), "substring", &[Value::Int(1), Value::Int(3)]).unwrap(),
            Value::string("él")
        );
        assert_eq!(
            call(Value::string("a1b2"), "matches", &[Value::string("[a-z0-9]+")]).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            call(Value::string("a1b2"), "matches", &[Value::string("[a-z]")]).unwrap(),
            Value::Boolean(false)
        );
    }

    #[test]
    fn list_methods_mutate_in_place() {
        let list = Value::list(vec![Value::Int(1)]);
        call(list.clone(), "add", &[Value::Int(2)]).unwrap();
        assert_eq!(call(list.clone(), "size", &[]).unwrap(), Value::Int(2));
        assert_eq!(call(list.clone(), "remove", &[Value::Int(0)]).unwrap(), Value::Int(1));
        assert_eq!(list, Value::list(vec![Value::Int(2)]));
    }

    #[test]
    fn unknown_methods_fail() {
        let err = call(Value::Int(1), "frobnicate", &[]).unwrap_err();
        assert!(matches!(err, OgnlError::MethodFailed { .. }));
        let err = call(Value::Null, "toString", &[]).unwrap_err();
        assert!(matches!(err, OgnlError::MethodFailed { .. }));
    }

    #[test]
    fn getter_names_map_to_properties() {
        assert_eq!(property_of("getName", "get").as_deref(), Some("name"));
        assert_eq!(property_of("isFlag", "is").as_deref(), Some("flag"));
        assert_eq!(property_of("getaway", "get"), None);
    }
}
