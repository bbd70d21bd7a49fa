//! Tree-walking evaluation.
//!
//! Four entry points mirror the node contract:
//!
//! - [`get_value`] reads a node against a source object
//! - [`set_value`] assigns through a node into a target object
//! - [`get_source`] / [`set_source`] render the equivalent accessor text
//!   (see [`crate::source`])
//!
//! Dispatch is a `match` over [`NodeKind`]; the per-family bodies live in
//! the submodules. Every read goes through [`get_value`], which wraps the
//! body with the optional evaluation trace and the constant-folding cache.

mod arithmetic;
mod collections;
mod comparison;
mod control;
mod logical;
mod navigation;

use log::{debug, trace};

use crate::{
    ast::{Expression, NodeKind, NodeRef},
    context::Context,
    error::{OgnlError, Result},
    source::Fragment,
    value::Value,
};

/// Evaluates `node` against `source`.
///
/// Index expressions and method arguments inside the subtree are evaluated
/// against the context root. The root itself is never rebound here, so
/// nested calls made with a different `source` leave `#root` intact.
pub fn get_value(node: NodeRef<'_>, ctx: &mut Context, source: &Value) -> Result<Value> {
    if !ctx.config().trace_evaluations {
        return evaluate_get(node, ctx, source);
    }
    ctx.trace_mut().push(node, source, false);
    let result = evaluate_get(node, ctx, source);
    let keep_last = ctx.config().keep_last_evaluation;
    ctx.trace_mut().pop(&result, keep_last);
    result
}

/// Assigns `value` through `node` into `target`.
///
/// Fails with [`OgnlError::InappropriateExpression`] when the node is not
/// an assignable shape.
pub fn set_value(node: NodeRef<'_>, ctx: &mut Context, target: &Value, value: Value) -> Result<()> {
    if !ctx.config().trace_evaluations {
        return evaluate_set(node, ctx, target, value);
    }
    ctx.trace_mut().push(node, target, true);
    let assigned = value.clone();
    let result = evaluate_set(node, ctx, target, value);
    let keep_last = ctx.config().keep_last_evaluation;
    ctx.trace_mut()
        .pop(&result.clone().map(|()| assigned), keep_last);
    result
}

/// Renders the getter accessor for `node` applied to `target`.
pub fn get_source(node: NodeRef<'_>, ctx: &mut Context, target: &Value) -> Result<String> {
    generate_get(node, ctx, target).map(|fragment| fragment.code)
}

/// Renders the setter accessor for `node` applied to `target`. The
/// assigned value appears as `$value`.
pub fn set_source(node: NodeRef<'_>, ctx: &mut Context, target: &Value) -> Result<String> {
    ctx.set_current_object(target.clone());
    ctx.set_current_node(node);
    trace!("set source {} `{}`", node.kind().name(), node);
    match node.kind() {
        NodeKind::Chain { null_safe } => navigation::chain_set_source(node, ctx, target, *null_safe),
        NodeKind::Property { .. } => navigation::property_set_source(node, ctx, target),
        NodeKind::VarRef { .. } | NodeKind::RootVarRef | NodeKind::ThisVarRef => {
            navigation::reference_set_source(node)
        }
        NodeKind::And | NodeKind::Or => logical::set_source(node, ctx, target),
        NodeKind::Sequence | NodeKind::Test => control::set_source(node, ctx, target),
        NodeKind::Eval => Err(OgnlError::unsupported("evaluation nodes")),
        _ => Err(OgnlError::InappropriateExpression(node.to_string())),
    }
}

fn evaluate_get(node: NodeRef<'_>, ctx: &mut Context, source: &Value) -> Result<Value> {
    ctx.set_current_object(source.clone());
    ctx.set_current_node(node);
    trace!("get {} `{}`", node.kind().name(), node);
    if !is_constant(node, ctx) {
        return evaluate_body(node, ctx, source);
    }
    let cache = node.constant_value();
    if let Some(value) = cache.get() {
        return Ok(value.clone());
    }
    let value = evaluate_body(node, ctx, source)?;
    // A racing evaluation may have published first; its value wins.
    let published = cache.get_or_init(|| value);
    debug!("folded constant `{}` = {}", node, published);
    Ok(published.clone())
}

/// Whether `node` evaluates to the same value regardless of source,
/// context and variables. Computed once per node.
pub(crate) fn is_constant(node: NodeRef<'_>, ctx: &Context) -> bool {
    *node
        .constant_flag()
        .get_or_init(|| compute_constant(node, ctx))
}

fn compute_constant(node: NodeRef<'_>, ctx: &Context) -> bool {
    match node.kind() {
        NodeKind::Const(_) => true,
        NodeKind::StaticField { class_name, field } => ctx
            .class_for_name(class_name)
            .ok()
            .and_then(|class| class.static_field(field).map(|f| f.constant))
            .unwrap_or(false),
        NodeKind::Unary(_)
        | NodeKind::Binary(_)
        | NodeKind::Compare(_)
        | NodeKind::Test
        | NodeKind::And
        | NodeKind::Or
        | NodeKind::Instanceof { .. } => node.children().all(|child| is_constant(child, ctx)),
        _ => false,
    }
}

fn evaluate_body(node: NodeRef<'_>, ctx: &mut Context, source: &Value) -> Result<Value> {
    match node.kind() {
        NodeKind::Const(value) => Ok(value.clone()),
        NodeKind::Sequence => control::sequence(node, ctx, source),
        NodeKind::Assign => control::assign(node, ctx, source),
        NodeKind::Test => control::test(node, ctx, source),
        NodeKind::And => logical::and(node, ctx, source),
        NodeKind::Or => logical::or(node, ctx, source),
        NodeKind::Unary(op) => arithmetic::unary(node, ctx, source, *op),
        NodeKind::Binary(op) => arithmetic::binary(node, ctx, source, *op),
        NodeKind::Compare(op) => comparison::compare(node, ctx, source, *op),
        NodeKind::In { negated } => comparison::contains(node, ctx, source, *negated),
        NodeKind::Instanceof { class_name } => comparison::instance_of(node, ctx, source, class_name),
        NodeKind::ThisVarRef => Ok(source.clone()),
        NodeKind::RootVarRef => Ok(ctx.root().clone()),
        NodeKind::VarRef { name } => navigation::variable(ctx, name),
        NodeKind::Property { .. } => navigation::property(node, ctx, source),
        NodeKind::Method { name } => navigation::method(node, ctx, source, name),
        NodeKind::StaticField { class_name, field } => navigation::static_field(ctx, class_name, field),
        NodeKind::StaticMethod { class_name, method } => {
            navigation::static_method(node, ctx, class_name, method)
        }
        NodeKind::Ctor {
            class_name,
            array: false,
        } => navigation::construct(node, ctx, class_name),
        NodeKind::Ctor {
            class_name,
            array: true,
        } => collections::array(node, ctx, class_name),
        NodeKind::Chain { null_safe } => navigation::chain(node, ctx, source, *null_safe),
        NodeKind::Eval => control::eval(node, ctx, source),
        NodeKind::List => collections::list(node, ctx, source),
        NodeKind::Map { class_name } => collections::map(node, ctx, source, class_name.as_deref()),
        NodeKind::KeyValue => Ok(Value::Null),
        NodeKind::Project => collections::project(node, ctx, source),
        NodeKind::Select | NodeKind::SelectFirst | NodeKind::SelectLast => {
            collections::select(node, ctx, source)
        }
    }
}

fn evaluate_set(node: NodeRef<'_>, ctx: &mut Context, target: &Value, value: Value) -> Result<()> {
    ctx.set_current_object(target.clone());
    ctx.set_current_node(node);
    trace!("set {} `{}`", node.kind().name(), node);
    match node.kind() {
        NodeKind::Chain { null_safe } => navigation::chain_set(node, ctx, target, value, *null_safe),
        NodeKind::Property { .. } => navigation::property_set(node, ctx, target, value),
        NodeKind::VarRef { name } => {
            ctx.set_variable(name.as_str(), value);
            Ok(())
        }
        NodeKind::RootVarRef => {
            ctx.set_root(value);
            Ok(())
        }
        NodeKind::And => logical::and_set(node, ctx, target, value),
        NodeKind::Or => logical::or_set(node, ctx, target, value),
        NodeKind::Sequence => control::sequence_set(node, ctx, target, value),
        NodeKind::Test => control::test_set(node, ctx, target, value),
        NodeKind::Eval => control::eval_set(node, ctx, target, value),
        _ => Err(OgnlError::InappropriateExpression(node.to_string())),
    }
}

/// Generates the getter fragment of `node`, leaving the context as
/// [`get_value`] would.
pub(crate) fn generate_get(node: NodeRef<'_>, ctx: &mut Context, target: &Value) -> Result<Fragment> {
    ctx.set_current_object(target.clone());
    ctx.set_current_node(node);
    trace!("get source {} `{}`", node.kind().name(), node);
    match node.kind() {
        NodeKind::Const(value) => Ok(Fragment::new(crate::source::literal(value)?, value.clone())),
        NodeKind::Sequence | NodeKind::Assign | NodeKind::Test => control::source(node, ctx, target),
        NodeKind::And | NodeKind::Or => logical::source(node, ctx, target),
        NodeKind::Unary(op) => arithmetic::unary_source(node, ctx, target, *op),
        NodeKind::Binary(op) => arithmetic::binary_source(node, ctx, target, *op),
        NodeKind::Compare(_) | NodeKind::In { .. } | NodeKind::Instanceof { .. } => {
            comparison::source(node, ctx, target)
        }
        NodeKind::ThisVarRef
        | NodeKind::RootVarRef
        | NodeKind::VarRef { .. }
        | NodeKind::Property { .. }
        | NodeKind::Method { .. }
        | NodeKind::StaticField { .. }
        | NodeKind::StaticMethod { .. }
        | NodeKind::Ctor { array: false, .. }
        | NodeKind::Chain { .. } => navigation::source(node, ctx, target),
        NodeKind::Ctor { array: true, .. } | NodeKind::List => collections::source(node, ctx, target),
        NodeKind::Eval => Err(OgnlError::unsupported("evaluation nodes")),
        NodeKind::Map { .. } | NodeKind::KeyValue => Err(OgnlError::unsupported("map literals")),
        NodeKind::Project => Err(OgnlError::unsupported("projections")),
        NodeKind::Select | NodeKind::SelectFirst | NodeKind::SelectLast => {
            Err(OgnlError::unsupported("selections"))
        }
    }
}

/// Getter fragment for an operand that [`get_value`] would skip on this
/// source, such as the right side of `false && x` or the untaken branch
/// of a ternary.
///
/// Only constants are rendered: anything else would have to be evaluated
/// against a sample it was never meant to see.
pub(crate) fn generate_skipped(node: NodeRef<'_>, ctx: &mut Context, target: &Value) -> Result<Fragment> {
    if is_constant(node, ctx) {
        return generate_get(node, ctx, target);
    }
    Err(OgnlError::unsupported(format!(
        "`{}` is short-circuited on the sample root",
        node
    )))
}

/// Setter for an assignment target that [`set_value`] would skip on this
/// source. Rendering may read the target's prefix; a failure there means
/// the sample cannot describe the branch, not that the expression is wrong.
pub(crate) fn skipped_set_source(node: NodeRef<'_>, ctx: &mut Context, target: &Value) -> Result<String> {
    set_source(node, ctx, target).map_err(|err| match err {
        OgnlError::InappropriateExpression(_) => err,
        err if err.is_unsupported() => err,
        err => OgnlError::unsupported(format!(
            "`{}` is short-circuited on the sample root: {}",
            node, err
        )),
    })
}

/// Evaluates every child of `node` against the context root.
fn root_arguments(node: NodeRef<'_>, ctx: &mut Context) -> Result<Vec<Value>> {
    let root = ctx.root().clone();
    node.children()
        .map(|child| get_value(child, ctx, &root))
        .collect()
}

impl Expression {
    /// Evaluates the expression against `source`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ognl::{Context, Expression, Value};
    ///
    /// let expr: Expression = "{1, 2, 3, 4}.{? #this > 2 }".parse().unwrap();
    /// let mut ctx = Context::with_root(Value::Null);
    /// let result = expr.get_value(&mut ctx, &Value::Null).unwrap();
    /// assert_eq!(result.to_string(), "[3, 4]");
    /// ```
    pub fn get_value(&self, ctx: &mut Context, source: &Value) -> Result<Value> {
        get_value(self.root(), ctx, source)
    }

    /// Assigns `value` through the expression into `target`.
    ///
    /// ```
    /// use ognl::{Context, Expression, Value};
    ///
    /// let root = Value::map(vec![]);
    /// let expr: Expression = "total".parse().unwrap();
    /// let mut ctx = Context::with_root(root.clone());
    /// expr.set_value(&mut ctx, &root, Value::Int(3)).unwrap();
    /// assert_eq!(root.to_string(), "{total=3}");
    /// ```
    pub fn set_value(&self, ctx: &mut Context, target: &Value, value: Value) -> Result<()> {
        set_value(self.root(), ctx, target, value)
    }

    pub fn get_source(&self, ctx: &mut Context, target: &Value) -> Result<String> {
        get_source(self.root(), ctx, target)
    }

    pub fn set_source(&self, ctx: &mut Context, target: &Value) -> Result<String> {
        set_source(self.root(), ctx, target)
    }

    /// Whether the whole expression folds to a constant.
    pub fn is_constant(&self, ctx: &Context) -> bool {
        is_constant(self.root(), ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn eval(text: &str) -> Result<Value> {
        let expr: Expression = text.parse()?;
        let mut ctx = Context::with_root(Value::Null);
        expr.get_value(&mut ctx, &Value::Null)
    }

    #[test]
    fn literal_arithmetic_folds() {
        let expr: Expression = "1 + 2 * 3".parse().unwrap();
        let mut ctx = Context::with_root(Value::Null);
        assert!(expr.is_constant(&ctx));
        assert_eq!(expr.get_value(&mut ctx, &Value::Null).unwrap(), Value::Int(7));
        assert_eq!(expr.root().constant_value().get(), Some(&Value::Int(7)));
    }

    #[test]
    fn variables_are_never_constant() {
        let expr: Expression = "#x + 1".parse().unwrap();
        let mut ctx = Context::with_root(Value::Null);
        assert!(!expr.is_constant(&ctx));
        ctx.set_variable("x", Value::Int(1));
        assert_eq!(expr.get_value(&mut ctx, &Value::Null).unwrap(), Value::Int(2));
        ctx.set_variable("x", Value::Int(5));
        assert_eq!(expr.get_value(&mut ctx, &Value::Null).unwrap(), Value::Int(6));
    }

    #[test]
    fn literals_are_not_assignable() {
        let expr: Expression = "3".parse().unwrap();
        let mut ctx = Context::with_root(Value::Null);
        let err = expr.set_value(&mut ctx, &Value::Null, Value::Int(1)).unwrap_err();
        assert!(matches!(err, OgnlError::InappropriateExpression(_)));
    }

    #[test]
    fn trace_records_errors_without_swallowing_them() {
        let expr: Expression = "1 + (2 / 0)".parse().unwrap();
        let mut ctx = Context::with_root(Value::Null);
        *ctx.config_mut() = Config::default().with_tracing(true);
        let err = expr.get_value(&mut ctx, &Value::Null).unwrap_err();
        assert!(matches!(err, OgnlError::DivisionByZero));
        let last = ctx.trace().last_evaluation().unwrap();
        let root = ctx.trace().get(last);
        assert!(matches!(root.error, Some(OgnlError::DivisionByZero)));
        assert_eq!(ctx.trace().children(last).count(), 2);
    }

    #[test]
    fn lambdas_recurse_through_variables() {
        let value = eval("#fact = :[#this <= 1 ? 1 : #this * #fact(#this - 1)], #fact(5)").unwrap();
        assert_eq!(value, Value::Int(120));
    }
}
