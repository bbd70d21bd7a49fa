//! Collaborators the evaluator relies on.
//!
//! Nodes never inspect host objects themselves. Property reads and writes,
//! method calls, element enumeration, null substitution, class lookup and
//! access checks all go through the trait objects bundled in a
//! [`Runtime`]. The defaults understand the crate's own [`Value`] model;
//! each one can be replaced through [`RuntimeBuilder`].

pub mod classes;
pub mod elements;
pub mod methods;
pub mod properties;

use std::{fmt, sync::Arc};

use crate::{config::Config, context::Context, error::Result, value::Value};

pub use classes::{
    ClassDef, ClassRef, ClassRegistry, IndexedPropertyType, MethodFn, PropertyDef, StaticField,
    StaticFn,
};
pub use elements::DefaultElementsAccessor;
pub use methods::DefaultMethodAccessor;
pub use properties::DefaultPropertyAccessor;

/// Key of a property access: a bare name (`a.name`) or an index value (`a[expr]`).
#[derive(Debug, Clone, Copy)]
pub enum PropertyKey<'a> {
    Name(&'a str),
    Index(&'a Value),
}

impl PropertyKey<'_> {
    /// The key as a name, when it is one or is a string index.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            PropertyKey::Name(name) => Some(name),
            PropertyKey::Index(Value::String(s)) => Some(s),
            PropertyKey::Index(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            PropertyKey::Name(name) => Value::string(name),
            PropertyKey::Index(value) => (*value).clone(),
        }
    }
}

impl fmt::Display for PropertyKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Name(name) => f.write_str(name),
            PropertyKey::Index(value) => write!(f, "[{}]", value),
        }
    }
}

/// Reads and writes properties of host values.
pub trait PropertyAccessor: Send + Sync {
    fn get_property(&self, ctx: &mut Context, target: &Value, key: PropertyKey<'_>) -> Result<Value>;

    fn set_property(
        &self,
        ctx: &mut Context,
        target: &Value,
        key: PropertyKey<'_>,
        value: Value,
    ) -> Result<()>;

    /// How the named property of `target` is indexed, if at all.
    fn indexed_property_type(&self, _ctx: &Context, _target: &Value, _name: &str) -> IndexedPropertyType {
        IndexedPropertyType::None
    }

    fn get_indexed_property(
        &self,
        ctx: &mut Context,
        target: &Value,
        name: &str,
        index: &Value,
    ) -> Result<Value>;

    fn set_indexed_property(
        &self,
        ctx: &mut Context,
        target: &Value,
        name: &str,
        index: &Value,
        value: Value,
    ) -> Result<()>;
}

/// Invokes instance methods, static methods and constructors.
pub trait MethodAccessor: Send + Sync {
    fn call_method(&self, ctx: &mut Context, target: &Value, name: &str, args: &[Value]) -> Result<Value>;

    fn call_static_method(
        &self,
        ctx: &mut Context,
        class: &ClassRef,
        name: &str,
        args: &[Value],
    ) -> Result<Value>;

    fn call_constructor(&self, ctx: &mut Context, class: &ClassRef, args: &[Value]) -> Result<Value>;
}

/// Logical members of a value, for projection, selection and `in`.
pub trait ElementsAccessor: Send + Sync {
    fn elements(&self, ctx: &mut Context, target: &Value) -> Result<Vec<Value>>;
}

/// Substitutes values for null property reads and null method results.
pub trait NullHandler: Send + Sync {
    fn null_property_value(&self, _ctx: &mut Context, _target: &Value, _key: &Value) -> Option<Value> {
        None
    }

    fn null_method_result(
        &self,
        _ctx: &mut Context,
        _target: &Value,
        _method: &str,
        _args: &[Value],
    ) -> Option<Value> {
        None
    }
}

/// Resolves class names.
pub trait ClassResolver: Send + Sync {
    fn class_for_name(&self, name: &str) -> Result<ClassRef>;
}

/// A member about to be accessed.
#[derive(Debug, Clone, Copy)]
pub enum Member<'a> {
    Property(&'a str),
    Method(&'a str),
    StaticField { class: &'a str, field: &'a str },
    StaticMethod { class: &'a str, method: &'a str },
    Constructor(&'a str),
}

impl fmt::Display for Member<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Property(name) => write!(f, "{}", name),
            Member::Method(name) => write!(f, "{}()", name),
            Member::StaticField { class, field } => write!(f, "@{}@{}", class, field),
            Member::StaticMethod { class, method } => write!(f, "@{}@{}()", class, method),
            Member::Constructor(class) => write!(f, "new {}()", class),
        }
    }
}

/// Access policy consulted before every member access.
pub trait MemberAccess: Send + Sync {
    fn is_accessible(&self, ctx: &Context, target: &Value, member: &Member<'_>) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNullHandler;

impl NullHandler for DefaultNullHandler {}

/// Allows every access.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl MemberAccess for AllowAll {
    fn is_accessible(&self, _ctx: &Context, _target: &Value, _member: &Member<'_>) -> bool {
        true
    }
}

/// Denies access to the listed member names.
#[derive(Debug, Clone, Default)]
pub struct DenyMembers(pub Vec<String>);

impl MemberAccess for DenyMembers {
    fn is_accessible(&self, _ctx: &Context, _target: &Value, member: &Member<'_>) -> bool {
        let name = match member {
            Member::Property(name) | Member::Method(name) | Member::Constructor(name) => *name,
            Member::StaticField { field, .. } => *field,
            Member::StaticMethod { method, .. } => *method,
        };
        !self.0.iter().any(|denied| denied == name)
    }
}

/// The bundle of collaborators plus the global [`Config`].
pub struct Runtime {
    config: Config,
    classes: Arc<ClassRegistry>,
    class_resolver: Arc<dyn ClassResolver>,
    properties: Arc<dyn PropertyAccessor>,
    methods: Arc<dyn MethodAccessor>,
    elements: Arc<dyn ElementsAccessor>,
    null_handler: Arc<dyn NullHandler>,
    member_access: Arc<dyn MemberAccess>,
}

impl Runtime {
    pub fn new() -> Self {
        RuntimeBuilder::default().build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registry backing the default class resolver.
    pub fn classes(&self) -> &Arc<ClassRegistry> {
        &self.classes
    }

    pub fn register_class(&self, class: ClassDef) -> ClassRef {
        self.classes.register(class)
    }

    pub fn class_resolver(&self) -> &dyn ClassResolver {
        self.class_resolver.as_ref()
    }

    pub fn properties(&self) -> &dyn PropertyAccessor {
        self.properties.as_ref()
    }

    pub fn methods(&self) -> &dyn MethodAccessor {
        self.methods.as_ref()
    }

    pub fn elements(&self) -> &dyn ElementsAccessor {
        self.elements.as_ref()
    }

    pub fn null_handler(&self) -> &dyn NullHandler {
        self.null_handler.as_ref()
    }

    pub fn member_access(&self) -> &dyn MemberAccess {
        self.member_access.as_ref()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("classes", &self.classes.len())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct RuntimeBuilder {
    config: Option<Config>,
    classes: Option<Arc<ClassRegistry>>,
    class_resolver: Option<Arc<dyn ClassResolver>>,
    properties: Option<Arc<dyn PropertyAccessor>>,
    methods: Option<Arc<dyn MethodAccessor>>,
    elements: Option<Arc<dyn ElementsAccessor>>,
    null_handler: Option<Arc<dyn NullHandler>>,
    member_access: Option<Arc<dyn MemberAccess>>,
}

impl RuntimeBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn classes(mut self, classes: Arc<ClassRegistry>) -> Self {
        self.classes = Some(classes);
        self
    }

    pub fn class(self, class: ClassDef) -> Self {
        let mut this = self;
        let registry = this
            .classes
            .get_or_insert_with(|| Arc::new(ClassRegistry::with_builtins()));
        registry.register(class);
        this
    }

    pub fn class_resolver(mut self, resolver: Arc<dyn ClassResolver>) -> Self {
        self.class_resolver = Some(resolver);
        self
    }

    pub fn property_accessor(mut self, accessor: Arc<dyn PropertyAccessor>) -> Self {
        self.properties = Some(accessor);
        self
    }

    pub fn method_accessor(mut self, accessor: Arc<dyn MethodAccessor>) -> Self {
        self.methods = Some(accessor);
        self
    }

    pub fn elements_accessor(mut self, accessor: Arc<dyn ElementsAccessor>) -> Self {
        self.elements = Some(accessor);
        self
    }

    pub fn null_handler(mut self, handler: Arc<dyn NullHandler>) -> Self {
        self.null_handler = Some(handler);
        self
    }

    pub fn member_access(mut self, access: Arc<dyn MemberAccess>) -> Self {
        self.member_access = Some(access);
        self
    }

    pub fn build(self) -> Runtime {
        let classes = self
            .classes
            .unwrap_or_else(|| Arc::new(ClassRegistry::with_builtins()));
        let class_resolver = self
            .class_resolver
            .unwrap_or_else(|| Arc::clone(&classes) as Arc<dyn ClassResolver>);
        Runtime {
            config: self.config.unwrap_or_else(Config::from_env),
            classes,
            class_resolver,
            properties: self
                .properties
                .unwrap_or_else(|| Arc::new(DefaultPropertyAccessor)),
            methods: self.methods.unwrap_or_else(|| Arc::new(DefaultMethodAccessor)),
            elements: self
                .elements
                .unwrap_or_else(|| Arc::new(DefaultElementsAccessor)),
            null_handler: self
                .null_handler
                .unwrap_or_else(|| Arc::new(DefaultNullHandler)),
            member_access: self.member_access.unwrap_or_else(|| Arc::new(AllowAll)),
        }
    }
}
