//! Property, method and static member access, variable references, and
//! chains of navigation steps.
//!
//! Every step that produces a new current object records it on the
//! context with `settle`, so the following step (and source generation)
//! sees its type. Index expressions and arguments are always evaluated
//! against the root.

use std::sync::Arc;

use log::trace;

use crate::{
    ast::{NodeKind, NodeRef},
    context::{Context, SourceBase},
    error::{OgnlError, Result},
    runtime::{properties::length_of, ClassRef, IndexedPropertyType, Member, PropertyKey},
    source::{self, Fragment},
    value::{DynamicSubscript, Value},
};

use super::{generate_get, get_value, root_arguments, set_source as step_set_source, set_value};

// -- interpreted ------------------------------------------------------------

pub(super) fn variable(ctx: &mut Context, name: &str) -> Result<Value> {
    let value = ctx.variable(name).cloned().unwrap_or(Value::Null);
    ctx.settle(&value);
    Ok(value)
}

/// Evaluates the key child of a property step against the root.
fn property_key(node: NodeRef<'_>, ctx: &mut Context) -> Result<Value> {
    let root = ctx.root().clone();
    get_value(node.child(0), ctx, &root)
}

fn is_indexed(node: NodeRef<'_>) -> bool {
    matches!(node.kind(), NodeKind::Property { indexed: true })
}

fn property_key_ref(key: &Value, indexed: bool) -> PropertyKey<'_> {
    match key {
        Value::String(name) if !indexed => PropertyKey::Name(name),
        key => PropertyKey::Index(key),
    }
}

fn read_property(ctx: &mut Context, source: &Value, key: &Value, indexed: bool) -> Result<Value> {
    let key_ref = property_key_ref(key, indexed);
    if let Some(name) = key_ref.as_name() {
        ctx.check_access(source, &Member::Property(name))?;
    }
    let runtime = Arc::clone(ctx.runtime());
    let mut value = runtime.properties().get_property(ctx, source, key_ref)?;
    if value.is_null() {
        value = runtime
            .null_handler()
            .null_property_value(ctx, source, key)
            .unwrap_or(Value::Null);
    }
    ctx.set_current_accessor(source.value_type());
    ctx.settle(&value);
    Ok(value)
}

fn write_property(ctx: &mut Context, target: &Value, key: &Value, indexed: bool, value: Value) -> Result<()> {
    let key_ref = property_key_ref(key, indexed);
    if let Some(name) = key_ref.as_name() {
        ctx.check_access(target, &Member::Property(name))?;
    }
    let runtime = Arc::clone(ctx.runtime());
    runtime.properties().set_property(ctx, target, key_ref, value)
}

pub(super) fn property(node: NodeRef<'_>, ctx: &mut Context, source: &Value) -> Result<Value> {
    let key = property_key(node, ctx)?;
    read_property(ctx, source, &key, is_indexed(node))
}

pub(super) fn property_set(node: NodeRef<'_>, ctx: &mut Context, target: &Value, value: Value) -> Result<()> {
    let key = property_key(node, ctx)?;
    write_property(ctx, target, &key, is_indexed(node), value)
}

fn invoke(ctx: &mut Context, source: &Value, name: &str, args: &[Value]) -> Result<Value> {
    ctx.check_access(source, &Member::Method(name))?;
    let runtime = Arc::clone(ctx.runtime());
    let mut value = runtime.methods().call_method(ctx, source, name, args)?;
    if value.is_null() {
        value = runtime
            .null_handler()
            .null_method_result(ctx, source, name, args)
            .unwrap_or(Value::Null);
    }
    ctx.set_current_accessor(source.value_type());
    ctx.settle(&value);
    Ok(value)
}

pub(super) fn method(node: NodeRef<'_>, ctx: &mut Context, source: &Value, name: &str) -> Result<Value> {
    let args = root_arguments(node, ctx)?;
    invoke(ctx, source, name, &args)
}

fn read_static_field(ctx: &mut Context, class: &ClassRef, field: &str) -> Result<Value> {
    let value = if field == "class" {
        Value::Class(class.clone())
    } else {
        let member = Member::StaticField {
            class: class.name(),
            field,
        };
        ctx.check_access(&Value::Class(class.clone()), &member)?;
        class
            .static_field(field)
            .map(|f| f.value.clone())
            .ok_or_else(|| OgnlError::NoSuchProperty {
                target: class.name().to_string(),
                name: field.to_string(),
            })?
    };
    ctx.settle(&value);
    Ok(value)
}

pub(super) fn static_field(ctx: &mut Context, class_name: &str, field: &str) -> Result<Value> {
    let class = ctx.class_for_name(class_name)?;
    read_static_field(ctx, &class, field)
}

fn invoke_static(ctx: &mut Context, class: &ClassRef, method: &str, args: &[Value]) -> Result<Value> {
    let member = Member::StaticMethod {
        class: class.name(),
        method,
    };
    ctx.check_access(&Value::Class(class.clone()), &member)?;
    let runtime = Arc::clone(ctx.runtime());
    let value = runtime.methods().call_static_method(ctx, class, method, args)?;
    ctx.settle(&value);
    Ok(value)
}

pub(super) fn static_method(
    node: NodeRef<'_>,
    ctx: &mut Context,
    class_name: &str,
    method: &str,
) -> Result<Value> {
    let args = root_arguments(node, ctx)?;
    let class = ctx.class_for_name(class_name)?;
    invoke_static(ctx, &class, method, &args)
}

fn instantiate(ctx: &mut Context, class: &ClassRef, args: &[Value]) -> Result<Value> {
    ctx.check_access(&Value::Class(class.clone()), &Member::Constructor(class.name()))?;
    let runtime = Arc::clone(ctx.runtime());
    let value = runtime.methods().call_constructor(ctx, class, args)?;
    ctx.settle(&value);
    Ok(value)
}

pub(super) fn construct(node: NodeRef<'_>, ctx: &mut Context, class_name: &str) -> Result<Value> {
    let args = root_arguments(node, ctx)?;
    let class = ctx.class_for_name(class_name)?;
    instantiate(ctx, &class, &args)
}

// -- indexed bean properties --------------------------------------------------

/// Indexing mode of `name` on `target`, when step `i` of `steps` names a
/// property and step `i + 1` indexes it. Such a pair is resolved with one
/// indexed access instead of reading the whole property first.
fn indexed_pair<'a>(
    ctx: &Context,
    steps: &[NodeRef<'a>],
    i: usize,
    limit: usize,
    target: &Value,
) -> Option<(&'a str, IndexedPropertyType)> {
    if i + 1 >= limit || !is_indexed(steps[i + 1]) {
        return None;
    }
    let name = steps[i].property_name()?;
    let ty = ctx
        .runtime()
        .properties()
        .indexed_property_type(ctx, target, name);
    (ty != IndexedPropertyType::None).then_some((name, ty))
}

fn subscript_not_allowed(subscript: &Value, name: &str) -> OgnlError {
    OgnlError::TypeError(format!(
        "DynamicSubscript '{}' not allowed for object indexed property '{}'",
        subscript, name
    ))
}

/// Position a relative subscript selects in the whole property, or `-1`
/// when the property is empty.
fn subscript_position(
    ctx: &mut Context,
    target: &Value,
    name: &str,
    subscript: DynamicSubscript,
) -> Result<Value> {
    let runtime = Arc::clone(ctx.runtime());
    let whole = runtime
        .properties()
        .get_property(ctx, target, PropertyKey::Name(name))?;
    let len = length_of(&whole).unwrap_or(0);
    let position = subscript.resolve(len).map(|i| i as i32).unwrap_or(-1);
    Ok(Value::Int(position))
}

fn indexed_read(
    ctx: &mut Context,
    target: &Value,
    name: &str,
    ty: IndexedPropertyType,
    index: &Value,
) -> Result<Value> {
    ctx.check_access(target, &Member::Property(name))?;
    let runtime = Arc::clone(ctx.runtime());
    let properties = runtime.properties();
    let value = match (ty, index) {
        (IndexedPropertyType::Int, Value::Subscript(DynamicSubscript::All)) => {
            let whole = properties.get_property(ctx, target, PropertyKey::Name(name))?;
            properties.get_property(ctx, &whole, PropertyKey::Index(index))?
        }
        (IndexedPropertyType::Int, Value::Subscript(subscript)) => {
            let position = subscript_position(ctx, target, name, *subscript)?;
            properties.get_indexed_property(ctx, target, name, &position)?
        }
        (IndexedPropertyType::Object, Value::Subscript(_)) => {
            return Err(subscript_not_allowed(index, name));
        }
        _ => properties.get_indexed_property(ctx, target, name, index)?,
    };
    ctx.set_current_accessor(target.value_type());
    ctx.settle(&value);
    Ok(value)
}

fn indexed_write(
    ctx: &mut Context,
    target: &Value,
    name: &str,
    ty: IndexedPropertyType,
    index: &Value,
    value: Value,
) -> Result<()> {
    ctx.check_access(target, &Member::Property(name))?;
    let runtime = Arc::clone(ctx.runtime());
    let properties = runtime.properties();
    match (ty, index) {
        (IndexedPropertyType::Int, Value::Subscript(DynamicSubscript::All)) => {
            properties.set_property(ctx, target, PropertyKey::Name(name), value)
        }
        (IndexedPropertyType::Int, Value::Subscript(subscript)) => {
            let position = subscript_position(ctx, target, name, *subscript)?;
            properties.set_indexed_property(ctx, target, name, &position, value)
        }
        (IndexedPropertyType::Object, Value::Subscript(_)) => Err(subscript_not_allowed(index, name)),
        _ => properties.set_indexed_property(ctx, target, name, index, value),
    }
}

// -- chains -------------------------------------------------------------------

/// Evaluates step `i`, or the indexed pair starting at `i`. Returns the
/// result and the number of steps consumed.
fn advance(
    ctx: &mut Context,
    steps: &[NodeRef<'_>],
    i: usize,
    limit: usize,
    source: &Value,
) -> Result<(Value, usize)> {
    if let Some((name, ty)) = indexed_pair(ctx, steps, i, limit, source) {
        trace!("indexed property pair `{}{}`", steps[i], steps[i + 1]);
        let index = property_key(steps[i + 1], ctx)?;
        return Ok((indexed_read(ctx, source, name, ty, &index)?, 2));
    }
    Ok((get_value(steps[i], ctx, source)?, 1))
}

pub(super) fn chain(node: NodeRef<'_>, ctx: &mut Context, source: &Value, null_safe: bool) -> Result<Value> {
    let steps: Vec<NodeRef<'_>> = node.children().collect();
    let mut result = source.clone();
    let mut i = 0;
    while i < steps.len() {
        // Without `?.`, a null start only short-circuits a leading property
        // step; a leading method call still fails.
        if i == 0
            && result.is_null()
            && ctx.config().short_circuit
            && matches!(steps[0].kind(), NodeKind::Property { .. })
        {
            return Ok(Value::Null);
        }
        let (value, consumed) = advance(ctx, &steps, i, steps.len(), &result)?;
        result = value;
        i += consumed;
        if null_safe && result.is_null() && i < steps.len() {
            return Ok(Value::Null);
        }
    }
    Ok(result)
}

/// Whether the last two steps are a named property followed by an index.
fn ends_with_pair(steps: &[NodeRef<'_>]) -> bool {
    let n = steps.len();
    n >= 2 && steps[n - 2].property_name().is_some() && is_indexed(steps[n - 1])
}

/// Navigates every step but the last and assigns through the last one.
/// A null intermediate in a null-safe chain skips the assignment.
pub(super) fn chain_set(
    node: NodeRef<'_>,
    ctx: &mut Context,
    target: &Value,
    value: Value,
    null_safe: bool,
) -> Result<()> {
    let steps: Vec<NodeRef<'_>> = node.children().collect();
    let n = steps.len();
    let pair = ends_with_pair(&steps);
    let limit = if pair { n - 2 } else { n - 1 };

    let mut current = target.clone();
    let mut i = 0;
    while i < limit {
        let (next, consumed) = advance(ctx, &steps, i, limit, &current)?;
        current = next;
        i += consumed;
        if null_safe && current.is_null() {
            return Ok(());
        }
    }

    if pair {
        if let Some((name, ty)) = indexed_pair(ctx, &steps, n - 2, n, &current) {
            let index = property_key(steps[n - 1], ctx)?;
            return indexed_write(ctx, &current, name, ty, &index, value);
        }
        current = get_value(steps[n - 2], ctx, &current)?;
        if null_safe && current.is_null() {
            return Ok(());
        }
    }
    set_value(steps[n - 1], ctx, &current, value)
}

// -- source generation --------------------------------------------------------

fn rust_path(class: &ClassRef) -> String {
    class.name().replace('.', "::")
}

fn argument_sources(node: NodeRef<'_>, ctx: &mut Context) -> Result<Vec<Fragment>> {
    let root = ctx.root().clone();
    source::detached(ctx, SourceBase::Root, |ctx| {
        node.children()
            .map(|child| generate_get(child, ctx, &root))
            .collect()
    })
}

fn key_source(node: NodeRef<'_>, ctx: &mut Context) -> Result<Fragment> {
    let root = ctx.root().clone();
    source::detached(ctx, SourceBase::Root, |ctx| generate_get(node.child(0), ctx, &root))
}

fn joined(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(|f| f.code.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn subscript_accessor(subscript: DynamicSubscript) -> &'static str {
    match subscript {
        DynamicSubscript::First => "first",
        DynamicSubscript::Mid => "mid",
        DynamicSubscript::Last => "last",
        DynamicSubscript::All => "all",
    }
}

/// Accessor method name and key argument for reading `key` from `target`.
fn accessor(target: &Value, key: &Fragment) -> (&'static str, Option<String>) {
    match (&key.value, target) {
        (Value::Subscript(subscript), _) => (subscript_accessor(*subscript), None),
        (_, Value::Map(_)) => ("key", Some(key.code.clone())),
        (Value::String(_), _) => ("prop", Some(key.code.clone())),
        _ => ("at", Some(key.code.clone())),
    }
}

pub(super) fn source(node: NodeRef<'_>, ctx: &mut Context, target: &Value) -> Result<Fragment> {
    match node.kind() {
        NodeKind::ThisVarRef => Ok(Fragment::new(ctx.chain().base.binding(), target.clone())),
        NodeKind::RootVarRef => Ok(Fragment::new("root", ctx.root().clone())),
        NodeKind::VarRef { name } => {
            let value = variable(ctx, name)?;
            Ok(Fragment::new(format!("ctx.var({:?})", name), value))
        }
        NodeKind::Property { indexed } => property_source(node, ctx, target, *indexed),
        NodeKind::Method { name } => {
            let args = argument_sources(node, ctx)?;
            let values: Vec<Value> = args.iter().map(|a| a.value.clone()).collect();
            let value = invoke(ctx, target, name, &values)?;
            let suffix = format!(".call({:?}, [{}])", name, joined(&args));
            Ok(Fragment::new(source::navigation(ctx, suffix), value))
        }
        NodeKind::StaticField { class_name, field } => {
            let class = ctx.class_for_name(class_name)?;
            let value = read_static_field(ctx, &class, field)?;
            let code = if field == "class" {
                format!("{}::class()", rust_path(&class))
            } else {
                format!("{}::{}", rust_path(&class), field)
            };
            Ok(Fragment::new(code, value))
        }
        NodeKind::StaticMethod { class_name, method } => {
            let args = argument_sources(node, ctx)?;
            let values: Vec<Value> = args.iter().map(|a| a.value.clone()).collect();
            let class = ctx.class_for_name(class_name)?;
            let value = invoke_static(ctx, &class, method, &values)?;
            let code = format!("{}::{}({})", rust_path(&class), method, joined(&args));
            Ok(Fragment::new(code, value))
        }
        NodeKind::Ctor { class_name, .. } => {
            let args = argument_sources(node, ctx)?;
            let values: Vec<Value> = args.iter().map(|a| a.value.clone()).collect();
            let class = ctx.class_for_name(class_name)?;
            let value = instantiate(ctx, &class, &values)?;
            let code = format!("{}::new({})", rust_path(&class), joined(&args));
            Ok(Fragment::new(code, value))
        }
        NodeKind::Chain { null_safe } => chain_source(node, ctx, target, *null_safe),
        other => unreachable!("{} is not a navigation node", other.name()),
    }
}

fn property_source(node: NodeRef<'_>, ctx: &mut Context, target: &Value, indexed: bool) -> Result<Fragment> {
    let key = key_source(node, ctx)?;
    if let Some(name) = ctx.chain_mut().pending_index.take() {
        let ty = ctx
            .runtime()
            .properties()
            .indexed_property_type(ctx, target, &name);
        let value = indexed_read(ctx, target, &name, ty, &key.value)?;
        let suffix = format!(".indexed({:?}, {})", name, key.code);
        return Ok(Fragment::new(source::navigation(ctx, suffix), value));
    }
    let value = read_property(ctx, target, &key.value, indexed)?;
    let suffix = match accessor(target, &key) {
        (method, Some(arg)) => format!(".{}({})", method, arg),
        (method, None) => format!(".{}()", method),
    };
    Ok(Fragment::new(source::navigation(ctx, suffix), value))
}

pub(super) fn property_set_source(node: NodeRef<'_>, ctx: &mut Context, target: &Value) -> Result<String> {
    let key = key_source(node, ctx)?;
    let value = source::VALUE_BINDING;
    if let Some(name) = ctx.chain_mut().pending_index.take() {
        let suffix = format!(".set_indexed({:?}, {}, {})", name, key.code, value);
        return Ok(source::navigation(ctx, suffix));
    }
    let suffix = match accessor(target, &key) {
        (method, Some(arg)) => format!(".set_{}({}, {})", method, arg, value),
        (method, None) => format!(".set_{}({})", method, value),
    };
    Ok(source::navigation(ctx, suffix))
}

pub(super) fn reference_set_source(node: NodeRef<'_>) -> Result<String> {
    let value = source::VALUE_BINDING;
    match node.kind() {
        NodeKind::VarRef { name } => Ok(format!("ctx.set_var({:?}, {})", name, value)),
        NodeKind::RootVarRef => Ok(format!("ctx.set_root({})", value)),
        _ => Err(OgnlError::InappropriateExpression(node.to_string())),
    }
}

fn is_navigation(step: NodeRef<'_>) -> bool {
    matches!(step.kind(), NodeKind::Property { .. } | NodeKind::Method { .. })
}

/// Generated code of a chain prefix, threaded step by step.
struct ChainSource {
    code: Option<String>,
    current: Value,
    base: SourceBase,
}

impl ChainSource {
    /// Appends `step`, generated by `generate` against the current value.
    ///
    /// The first step stands alone. Later navigation steps continue the
    /// chain text; any other step rebinds `target` to the text so far.
    fn push<T>(
        &mut self,
        ctx: &mut Context,
        step: NodeRef<'_>,
        generate: impl FnOnce(NodeRef<'_>, &mut Context, &Value) -> Result<T>,
        code_of: impl Fn(&T) -> String,
    ) -> Result<(String, T)> {
        let out = match self.code.take() {
            None => {
                let chain = ctx.chain_mut();
                chain.current_chain = None;
                chain.base = self.base;
                let out = generate(step, ctx, &self.current)?;
                (code_of(&out), out)
            }
            Some(prev) if is_navigation(step) => {
                ctx.chain_mut().current_chain = Some(prev.clone());
                let out = generate(step, ctx, &self.current)?;
                (format!("{}{}", prev, code_of(&out)), out)
            }
            Some(prev) => {
                let current = self.current.clone();
                let out = source::detached(ctx, SourceBase::Target, |ctx| generate(step, ctx, &current))?;
                (format!("{{ let target = {}; {} }}", prev, code_of(&out)), out)
            }
        };
        Ok(out)
    }

    /// Generates `steps[..limit]`, folding indexed pairs.
    fn prefix(&mut self, ctx: &mut Context, steps: &[NodeRef<'_>], limit: usize) -> Result<()> {
        let mut i = 0;
        while i < limit {
            if let Some((name, _)) = indexed_pair(ctx, steps, i, limit, &self.current) {
                ctx.chain_mut().pending_index = Some(name.to_string());
                i += 1;
            }
            let (code, fragment) = self.push(ctx, steps[i], generate_get, |f: &Fragment| f.code.clone())?;
            self.code = Some(code);
            self.current = fragment.value;
            i += 1;
        }
        Ok(())
    }
}

fn chain_source(node: NodeRef<'_>, ctx: &mut Context, target: &Value, null_safe: bool) -> Result<Fragment> {
    if null_safe {
        return Err(OgnlError::unsupported("null-safe chains"));
    }
    let saved = ctx.chain().clone();
    let steps: Vec<NodeRef<'_>> = node.children().collect();
    let mut walk = ChainSource {
        code: None,
        current: target.clone(),
        base: saved.base,
    };
    let result = walk.prefix(ctx, &steps, steps.len());
    *ctx.chain_mut() = saved;
    result?;
    Ok(Fragment::new(walk.code.unwrap_or_default(), walk.current))
}

pub(super) fn chain_set_source(
    node: NodeRef<'_>,
    ctx: &mut Context,
    target: &Value,
    null_safe: bool,
) -> Result<String> {
    if null_safe {
        return Err(OgnlError::unsupported("null-safe chains"));
    }
    let saved = ctx.chain().clone();
    let result = chain_setter(node, ctx, target, saved.base);
    *ctx.chain_mut() = saved;
    result
}

fn chain_setter(node: NodeRef<'_>, ctx: &mut Context, target: &Value, base: SourceBase) -> Result<String> {
    let steps: Vec<NodeRef<'_>> = node.children().collect();
    let n = steps.len();
    let pair = ends_with_pair(&steps);
    let mut walk = ChainSource {
        code: None,
        current: target.clone(),
        base,
    };
    walk.prefix(ctx, &steps, if pair { n - 2 } else { n - 1 })?;
    if pair {
        match indexed_pair(ctx, &steps, n - 2, n, &walk.current) {
            Some((name, _)) => ctx.chain_mut().pending_index = Some(name.to_string()),
            None => {
                let (code, fragment) =
                    walk.push(ctx, steps[n - 2], generate_get, |f: &Fragment| f.code.clone())?;
                walk.code = Some(code);
                walk.current = fragment.value;
            }
        }
    }
    let (code, _) = walk.push(ctx, steps[n - 1], step_set_source, String::clone)?;
    Ok(code)
}
