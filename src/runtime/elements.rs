use crate::{context::Context, error::Result, runtime::ElementsAccessor, value::Value};

/// Maps yield their values, lists and arrays their members, `null` nothing,
/// and any other value itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultElementsAccessor;

impl ElementsAccessor for DefaultElementsAccessor {
    fn elements(&self, _ctx: &mut Context, target: &Value) -> Result<Vec<Value>> {
        Ok(match target {
            Value::Null => Vec::new(),
            Value::Map(m) => m.read().values().cloned().collect(),
            Value::List(l) => l.snapshot(),
            Value::Array(a) => a.snapshot(),
            other => vec![other.clone()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_are_single_elements() {
        let mut ctx = Context::with_root(Value::Null);
        let accessor = DefaultElementsAccessor;
        assert!(accessor.elements(&mut ctx, &Value::Null).unwrap().is_empty());
        assert_eq!(accessor.elements(&mut ctx, &Value::Int(7)).unwrap(), vec![Value::Int(7)]);
        let map = Value::map(vec![(Value::string("a"), Value::Int(1))]);
        assert_eq!(accessor.elements(&mut ctx, &map).unwrap(), vec![Value::Int(1)]);
    }
}
