//! Per-evaluation state threaded through every node call.
//!
//! A [`Context`] is owned by one top-level evaluation at a time. Nested
//! evaluations started by lambdas, projections or registered methods reuse
//! the same context, so variables assigned inside are visible afterwards.
//! Nested calls keep the root, except `(expr)(root)` evaluation nodes,
//! which rebind it for the duration of the inner expression.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    ast::{NodeId, NodeRef},
    config::Config,
    error::{OgnlError, Result},
    runtime::{ClassRef, Runtime},
    trace::EvaluationPool,
    value::{Value, ValueType},
};

/// Which binding a generated navigation fragment starts from when it is
/// not a continuation of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceBase {
    /// The object the accessor is applied to
    #[default]
    Target,
    /// The context root; used for index and argument expressions
    Root,
}

impl SourceBase {
    pub fn binding(self) -> &'static str {
        match self {
            SourceBase::Target => "target",
            SourceBase::Root => "root",
        }
    }
}

/// Coordination state shared between a chain and its steps while source
/// is generated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainState {
    /// Fragment generated so far for the enclosing chain. `None` outside a
    /// chain, where steps render as complete expressions.
    pub current_chain: Option<String>,
    /// Binding that free-standing navigation fragments start from.
    pub base: SourceBase,
    /// Name of an indexed bean property waiting for its index step.
    pub pending_index: Option<String>,
}

impl ChainState {
    pub fn in_chain(&self) -> bool {
        self.current_chain.is_some()
    }
}

/// A hoisted subexpression of generated source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalReference {
    pub name: String,
    pub expression: String,
    pub ty: Option<ValueType>,
}

impl fmt::Display for LocalReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "let {} = {};", self.name, self.expression)
    }
}

pub struct Context {
    runtime: Arc<Runtime>,
    config: Config,
    root: Value,
    current_object: Value,
    current_node: Option<NodeId>,
    types: Vec<Option<ValueType>>,
    accessors: Vec<Option<ValueType>>,
    variables: HashMap<String, Value>,
    chain: ChainState,
    locals: Vec<LocalReference>,
    trace: EvaluationPool,
}

impl Context {
    pub fn new(runtime: Arc<Runtime>, root: Value) -> Self {
        let config = *runtime.config();
        Context {
            runtime,
            config,
            current_object: root.clone(),
            root,
            current_node: None,
            types: Vec::new(),
            accessors: Vec::new(),
            variables: HashMap::new(),
            chain: ChainState::default(),
            locals: Vec::new(),
            trace: EvaluationPool::new(),
        }
    }

    /// A context over a fresh default runtime.
    pub fn with_root(root: Value) -> Self {
        Context::new(Arc::new(Runtime::default()), root)
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Rebinds the root and resets the navigation stacks.
    pub fn set_root(&mut self, root: Value) {
        self.types.clear();
        self.accessors.clear();
        self.current_object = root.clone();
        self.root = root;
        if let Some(ty) = self.root.value_type() {
            self.types.push(Some(ty));
        }
    }

    pub fn current_object(&self) -> &Value {
        &self.current_object
    }

    pub fn set_current_object(&mut self, value: Value) {
        self.current_object = value;
    }

    pub fn current_node(&self) -> Option<NodeId> {
        self.current_node
    }

    pub fn set_current_node(&mut self, node: NodeRef<'_>) {
        self.current_node = Some(node.id());
    }

    // Type stack. Entries are only ever appended within one evaluation, so
    // "current" and "previous" are the last two pushes.

    pub fn current_type(&self) -> Option<&ValueType> {
        self.types.last().and_then(Option::as_ref)
    }

    pub fn previous_type(&self) -> Option<&ValueType> {
        let len = self.types.len();
        if len < 2 {
            return None;
        }
        self.types[len - 2].as_ref()
    }

    pub fn first_type(&self) -> Option<&ValueType> {
        self.types.first().and_then(Option::as_ref)
    }

    pub fn set_current_type(&mut self, ty: Option<ValueType>) {
        self.types.push(ty);
    }

    pub fn type_depth(&self) -> usize {
        self.types.len()
    }

    pub fn current_accessor(&self) -> Option<&ValueType> {
        self.accessors.last().and_then(Option::as_ref)
    }

    pub fn previous_accessor(&self) -> Option<&ValueType> {
        let len = self.accessors.len();
        if len < 2 {
            return None;
        }
        self.accessors[len - 2].as_ref()
    }

    pub fn set_current_accessor(&mut self, ty: Option<ValueType>) {
        self.accessors.push(ty);
    }

    /// Records `value` as the result of the current navigation step.
    pub(crate) fn settle(&mut self, value: &Value) {
        self.current_object = value.clone();
        self.types.push(value.value_type());
    }

    // Variables (`#name`)

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.variables.insert(name.into(), value)
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    pub fn chain(&self) -> &ChainState {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut ChainState {
        &mut self.chain
    }

    /// Hoists `expression` into a fresh `_localN` reference.
    pub fn add_local(&mut self, expression: impl Into<String>, ty: Option<ValueType>) -> String {
        let name = format!("_local{}", self.locals.len());
        self.locals.push(LocalReference {
            name: name.clone(),
            expression: expression.into(),
            ty,
        });
        name
    }

    pub fn locals(&self) -> &[LocalReference] {
        &self.locals
    }

    pub fn take_locals(&mut self) -> Vec<LocalReference> {
        std::mem::take(&mut self.locals)
    }

    pub fn trace(&self) -> &EvaluationPool {
        &self.trace
    }

    pub fn trace_mut(&mut self) -> &mut EvaluationPool {
        &mut self.trace
    }

    /// Resolves a class name through the runtime's resolver.
    pub fn class_for_name(&self, name: &str) -> Result<ClassRef> {
        self.runtime.class_resolver().class_for_name(name)
    }

    /// Members of `target` as seen by projection, selection and `in`.
    pub fn elements(&mut self, target: &Value) -> Result<Vec<Value>> {
        let runtime = Arc::clone(&self.runtime);
        runtime.elements().elements(self, target)
    }

    /// `value instanceof class_name`.
    pub fn instance_of(&self, value: &Value, class_name: &str) -> Result<bool> {
        let class = self.class_for_name(class_name)?;
        let actual = match value {
            Value::Null => return Ok(false),
            Value::Object(o) => return Ok(o.class().is_a(class.name())),
            Value::Class(_) => self.class_for_name("java.lang.Class").ok(),
            other => self.class_for_name(&other.class_name()).ok(),
        };
        Ok(match actual {
            Some(actual) => actual.is_a(class.name()),
            None => class.name() == "java.lang.Object" || class.name() == value.class_name(),
        })
    }

    /// Fails with [`OgnlError::AccessDenied`] unless the member access
    /// policy allows `member` on `target`.
    pub(crate) fn check_access(&self, target: &Value, member: &crate::runtime::Member<'_>) -> Result<()> {
        if self.runtime.member_access().is_accessible(self, target, member) {
            Ok(())
        } else {
            Err(OgnlError::AccessDenied(member.to_string()))
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.root)
            .field("current_object", &self.current_object)
            .field("current_type", &self.current_type())
            .field("variables", &self.variables)
            .field("chain", &self.chain)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_root_resets_stacks() {
        let mut ctx = Context::with_root(Value::Int(1));
        ctx.set_current_type(Some(ValueType::Long));
        ctx.set_current_type(Some(ValueType::String));
        assert_eq!(ctx.previous_type(), Some(&ValueType::Long));
        ctx.set_current_accessor(Some(ValueType::Map));

        ctx.set_root(Value::string("x"));
        assert_eq!(ctx.current_type(), Some(&ValueType::String));
        assert_eq!(ctx.type_depth(), 1);
        assert_eq!(ctx.current_accessor(), None);
        assert_eq!(ctx.current_object(), &Value::string("x"));
    }

    #[test]
    fn locals_are_numbered_in_order() {
        let mut ctx = Context::with_root(Value::Null);
        assert_eq!(ctx.add_local("a", None), "_local0");
        assert_eq!(ctx.add_local("b", Some(ValueType::Int)), "_local1");
        assert_eq!(ctx.locals()[1].to_string(), "let _local1 = b;");
        assert_eq!(ctx.take_locals().len(), 2);
        assert!(ctx.locals().is_empty());
    }

    #[test]
    fn instance_of_walks_supertypes() {
        let ctx = Context::with_root(Value::Null);
        assert!(ctx.instance_of(&Value::Int(3), "Number").unwrap());
        assert!(ctx.instance_of(&Value::Int(3), "java.lang.Integer").unwrap());
        assert!(!ctx.instance_of(&Value::Int(3), "String").unwrap());
        assert!(ctx.instance_of(&Value::list(vec![]), "java.util.List").unwrap());
        assert!(!ctx.instance_of(&Value::Null, "Object").unwrap());
        assert!(ctx.instance_of(&Value::Int(3), "NoSuchThing").is_err());
    }
}
