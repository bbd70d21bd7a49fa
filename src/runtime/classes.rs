//! Class definitions and the class registry.
//!
//! A [`ClassDef`] describes a host type: its declared bean properties,
//! static fields, and the closures backing its methods and constructor.
//! The registry resolves names, retrying bare names under `java.lang.`.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use log::debug;
use rust_decimal::Decimal;

use crate::{
    context::Context,
    error::{OgnlError, Result},
    ops::{self, NumericType},
    runtime::ClassResolver,
    value::{ListRef, MapRef, ObjectRef, Value, ValueMap, ValueType},
};

use super::methods::expect_args;

pub type MethodFn = Arc<dyn Fn(&mut Context, &Value, &[Value]) -> Result<Value> + Send + Sync>;
pub type StaticFn = Arc<dyn Fn(&mut Context, &[Value]) -> Result<Value> + Send + Sync>;

/// How a bean property is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexedPropertyType {
    /// A plain property
    #[default]
    None,
    /// Indexed by position; the property value is a list or array
    Int,
    /// Indexed by key; the property value is a map and is not readable whole
    Object,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub ty: ValueType,
    pub writable: bool,
    pub indexed: IndexedPropertyType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticField {
    pub value: Value,
    /// Final fields take part in constant folding.
    pub constant: bool,
}

pub struct ClassDef {
    name: String,
    supertypes: Vec<String>,
    properties: BTreeMap<String, PropertyDef>,
    static_fields: BTreeMap<String, StaticField>,
    methods: HashMap<String, MethodFn>,
    static_methods: HashMap<String, StaticFn>,
    constructor: Option<StaticFn>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        ClassDef {
            name: name.into(),
            supertypes: Vec::new(),
            properties: BTreeMap::new(),
            static_fields: BTreeMap::new(),
            methods: HashMap::new(),
            static_methods: HashMap::new(),
            constructor: None,
        }
    }

    /// Adds a superclass or interface. Members of registered supertypes are
    /// inherited when the class is registered.
    pub fn extends(mut self, name: impl Into<String>) -> Self {
        self.supertypes.push(name.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, ty: ValueType) -> Self {
        self.properties.insert(
            name.into(),
            PropertyDef {
                ty,
                writable: true,
                indexed: IndexedPropertyType::None,
            },
        );
        self
    }

    pub fn read_only_property(mut self, name: impl Into<String>, ty: ValueType) -> Self {
        self.properties.insert(
            name.into(),
            PropertyDef {
                ty,
                writable: false,
                indexed: IndexedPropertyType::None,
            },
        );
        self
    }

    /// An indexed property. `ty` is the type of the whole value (a list or
    /// array for [`IndexedPropertyType::Int`], a map for `Object`).
    pub fn indexed_property(
        mut self,
        name: impl Into<String>,
        ty: ValueType,
        indexed: IndexedPropertyType,
    ) -> Self {
        self.properties.insert(
            name.into(),
            PropertyDef {
                ty,
                writable: true,
                indexed,
            },
        );
        self
    }

    pub fn static_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.static_fields.insert(
            name.into(),
            StaticField {
                value: value.into(),
                constant: false,
            },
        );
        self
    }

    /// A final static field.
    pub fn constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.static_fields.insert(
            name.into(),
            StaticField {
                value: value.into(),
                constant: true,
            },
        );
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Context, &Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(f));
        self
    }

    pub fn static_method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Context, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.static_methods.insert(name.into(), Arc::new(f));
        self
    }

    pub fn constructor<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Context, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(f));
        self
    }

    fn inherit(&mut self, parent: &ClassRef) {
        for name in &parent.0.supertypes {
            if !self.supertypes.contains(name) {
                self.supertypes.push(name.clone());
            }
        }
        for (name, def) in &parent.0.properties {
            self.properties.entry(name.clone()).or_insert_with(|| def.clone());
        }
        for (name, f) in &parent.0.methods {
            self.methods.entry(name.clone()).or_insert_with(|| Arc::clone(f));
        }
    }
}

/// Shared handle to a registered class.
#[derive(Clone)]
pub struct ClassRef(Arc<ClassDef>);

impl ClassRef {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn simple_name(&self) -> &str {
        self.0.name.rsplit('.').next().unwrap_or(&self.0.name)
    }

    /// True when this class is `name` or has it as an ancestor.
    pub fn is_a(&self, name: &str) -> bool {
        self.0.name == name
            || name == "java.lang.Object"
            || self.0.supertypes.iter().any(|s| s == name)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.0.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyDef)> {
        self.0.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn static_field(&self, name: &str) -> Option<&StaticField> {
        self.0.static_fields.get(name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodFn> {
        self.0.methods.get(name)
    }

    pub fn static_method(&self, name: &str) -> Option<&StaticFn> {
        self.0.static_methods.get(name)
    }

    pub fn constructor(&self) -> Option<&StaticFn> {
        self.0.constructor.as_ref()
    }

    /// A new bean with every declared property at its default value.
    pub fn instantiate(&self) -> ObjectRef {
        let fields = self
            .properties()
            .map(|(name, def)| (name.to_string(), ops::default_value(&def.ty)))
            .collect();
        ObjectRef::new(self.clone(), fields)
    }

    /// A new bean with the given fields set on top of the defaults.
    pub fn instance<K, V>(&self, fields: impl IntoIterator<Item = (K, V)>) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let object = self.instantiate();
        for (name, value) in fields {
            object.set_field(&name.into(), value.into());
        }
        Value::Object(object)
    }

    pub fn ptr_eq(&self, other: &ClassRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassRef({})", self.0.name)
    }
}

/// Registered classes plus a cache of resolved names.
///
/// Both maps sit behind `RwLock`s. Racing lookups of the same missing name
/// may each resolve and insert it; the entries are identical, so the last
/// write wins harmlessly.
#[derive(Default)]
pub struct ClassRegistry {
    classes: RwLock<HashMap<String, ClassRef>>,
    resolved: RwLock<HashMap<String, ClassRef>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let registry = ClassRegistry::new();
        for class in builtin_classes() {
            registry.register(class);
        }
        registry
    }

    /// Registers `class`, inheriting members of its registered supertypes.
    pub fn register(&self, mut class: ClassDef) -> ClassRef {
        let parents: Vec<ClassRef> = class
            .supertypes
            .iter()
            .filter_map(|name| self.get(name))
            .collect();
        for parent in &parents {
            class.inherit(parent);
        }
        let class = ClassRef(Arc::new(class));
        self.classes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(class.name().to_string(), class.clone());
        self.resolved
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        class
    }

    pub fn get(&self, name: &str) -> Option<ClassRef> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.classes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl ClassResolver for ClassRegistry {
    fn class_for_name(&self, name: &str) -> Result<ClassRef> {
        if let Some(class) = self
            .resolved
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(class.clone());
        }
        let class = match self.get(name) {
            Some(class) => class,
            None if !name.contains('.') => {
                let qualified = format!("java.lang.{}", name);
                let class = self
                    .get(&qualified)
                    .ok_or_else(|| OgnlError::ClassNotFound(name.to_string()))?;
                debug!("resolved class '{}' as '{}'", name, qualified);
                class
            }
            None => return Err(OgnlError::ClassNotFound(name.to_string())),
        };
        self.resolved
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), class.clone());
        Ok(class)
    }
}

const NUMBER_SUPERTYPES: [&str; 3] = ["java.lang.Number", "java.lang.Comparable", "java.io.Serializable"];

fn number_class(name: &str, ty: ValueType, min: Value, max: Value, parse: &'static str) -> ClassDef {
    let mut class = ClassDef::new(name);
    for s in NUMBER_SUPERTYPES {
        class = class.extends(s);
    }
    let (parse_ty, value_of_ty, ctor_ty) = (ty.clone(), ty.clone(), ty);
    class
        .constant("MIN_VALUE", min)
        .constant("MAX_VALUE", max)
        .static_method(parse, move |_, args| {
            let [text] = expect_args::<1>(parse, args)?;
            ops::convert_value(&Value::from(text.to_string()), &parse_ty)
        })
        .static_method("valueOf", move |_, args| {
            let [value] = expect_args::<1>("valueOf", args)?;
            ops::convert_value(value, &value_of_ty)
        })
        .constructor(move |_, args| {
            let [value] = expect_args::<1>("<init>", args)?;
            ops::convert_value(value, &ctor_ty)
        })
}

/// `max`/`min` in the widened type of both arguments.
fn math_extreme(name: &'static str, want_greater: bool) -> impl Fn(&mut Context, &[Value]) -> Result<Value> {
    move |_, args| {
        let [a, b] = expect_args::<2>(name, args)?;
        let ty = ops::widen(ops::numeric_type(a), ops::numeric_type(b)).result_type();
        let greater = ops::comparison(crate::ast::CompareOp::Greater, a, b)?;
        let pick = if greater == want_greater { a } else { b };
        ops::convert_value(pick, &ty.value_type())
    }
}

fn math_unary(name: &'static str, f: fn(f64) -> f64) -> impl Fn(&mut Context, &[Value]) -> Result<Value> {
    move |_, args| {
        let [x] = expect_args::<1>(name, args)?;
        Ok(Value::Double(f(ops::double_value(x)?)))
    }
}

fn marker(name: &str, supertypes: &[&str]) -> ClassDef {
    supertypes
        .iter()
        .fold(ClassDef::new(name), |class, s| class.extends(*s))
}

fn list_constructor(_: &mut Context, args: &[Value]) -> Result<Value> {
    let items = match args {
        [] => Vec::new(),
        [Value::Int(_) | Value::Long(_)] => Vec::new(),
        [source] => match source.sequence() {
            Some(items) => items,
            None => match source {
                Value::Map(m) => m.read().values().cloned().collect(),
                _ => return Err(OgnlError::method_failed("<init>", "expected a collection")),
            },
        },
        _ => return Err(OgnlError::method_failed("<init>", "too many arguments")),
    };
    Ok(Value::List(ListRef::new(items)))
}

fn map_constructor(class: &'static str) -> impl Fn(&mut Context, &[Value]) -> Result<Value> {
    move |_, args| {
        let entries = match args {
            [] | [Value::Int(_)] => ValueMap::new(),
            [Value::Map(m)] => m.read().clone(),
            _ => return Err(OgnlError::method_failed("<init>", "expected a map")),
        };
        Ok(Value::Map(MapRef::with_class(class, entries)))
    }
}

/// Classes every registry starts with.
pub fn builtin_classes() -> Vec<ClassDef> {
    let decimal = |n: i64| Value::BigDecimal(Decimal::from(n));
    vec![
        ClassDef::new("java.lang.Object"),
        ClassDef::new("java.lang.Class"),
        marker("java.io.Serializable", &[]),
        marker("java.lang.Comparable", &[]),
        marker("java.lang.CharSequence", &[]),
        marker("java.lang.Number", &["java.io.Serializable"]),
        marker("java.lang.Iterable", &[]),
        marker("java.util.Collection", &["java.lang.Iterable"]),
        marker("java.util.List", &["java.util.Collection", "java.lang.Iterable"]),
        marker("java.util.Map", &[]),
        number_class("java.lang.Byte", ValueType::Byte, Value::Byte(i8::MIN), Value::Byte(i8::MAX), "parseByte"),
        number_class("java.lang.Short", ValueType::Short, Value::Short(i16::MIN), Value::Short(i16::MAX), "parseShort"),
        number_class("java.lang.Integer", ValueType::Int, Value::Int(i32::MIN), Value::Int(i32::MAX), "parseInt"),
        number_class("java.lang.Long", ValueType::Long, Value::Long(i64::MIN), Value::Long(i64::MAX), "parseLong"),
        number_class("java.lang.Float", ValueType::Float, Value::Float(f32::from_bits(1)), Value::Float(f32::MAX), "parseFloat"),
        number_class("java.lang.Double", ValueType::Double, Value::Double(f64::from_bits(1)), Value::Double(f64::MAX), "parseDouble"),
        number_class("java.math.BigInteger", ValueType::BigInteger, Value::BigInteger(i128::MIN), Value::BigInteger(i128::MAX), "parseBigInteger")
            .constant("ZERO", Value::BigInteger(0))
            .constant("ONE", Value::BigInteger(1))
            .constant("TEN", Value::BigInteger(10)),
        number_class("java.math.BigDecimal", ValueType::BigDecimal, Value::BigDecimal(Decimal::MIN), Value::BigDecimal(Decimal::MAX), "parseBigDecimal")
            .constant("ZERO", decimal(0))
            .constant("ONE", decimal(1))
            .constant("TEN", decimal(10)),
        ClassDef::new("java.lang.Boolean")
            .extends("java.lang.Comparable")
            .extends("java.io.Serializable")
            .constant("TRUE", true)
            .constant("FALSE", false)
            .static_method("parseBoolean", |_, args| {
                let [text] = expect_args::<1>("parseBoolean", args)?;
                Ok(Value::Boolean(text.to_string().eq_ignore_ascii_case("true")))
            })
            .static_method("valueOf", |_, args| {
                let [value] = expect_args::<1>("valueOf", args)?;
                Ok(Value::Boolean(match value {
                    Value::String(s) => s.eq_ignore_ascii_case("true"),
                    other => ops::truthy(other),
                }))
            }),
        ClassDef::new("java.lang.Character")
            .extends("java.lang.Comparable")
            .extends("java.io.Serializable")
            .constant("MIN_VALUE", '\0')
            .constant("MAX_VALUE", '\u{ffff}')
            .static_method("isDigit", |_, args| {
                let [c] = expect_args::<1>("isDigit", args)?;
                Ok(Value::Boolean(matches!(c, Value::Char(c) if c.is_ascii_digit())))
            })
            .static_method("isLetter", |_, args| {
                let [c] = expect_args::<1>("isLetter", args)?;
                Ok(Value::Boolean(matches!(c, Value::Char(c) if c.is_alphabetic())))
            })
            .static_method("isWhitespace", |_, args| {
                let [c] = expect_args::<1>("isWhitespace", args)?;
                Ok(Value::Boolean(matches!(c, Value::Char(c) if c.is_whitespace())))
            }),
        ClassDef::new("java.lang.String")
            .extends("java.lang.CharSequence")
            .extends("java.lang.Comparable")
            .extends("java.io.Serializable")
            .static_method("valueOf", |_, args| {
                let [value] = expect_args::<1>("valueOf", args)?;
                Ok(Value::from(value.to_string()))
            })
            .constructor(|_, args| match args {
                [] => Ok(Value::string("")),
                [value] => Ok(Value::from(value.to_string())),
                _ => Err(OgnlError::method_failed("<init>", "too many arguments")),
            }),
        ClassDef::new("java.lang.Math")
            .constant("PI", std::f64::consts::PI)
            .constant("E", std::f64::consts::E)
            .static_method("max", math_extreme("max", true))
            .static_method("min", math_extreme("min", false))
            .static_method("sqrt", math_unary("sqrt", f64::sqrt))
            .static_method("floor", math_unary("floor", f64::floor))
            .static_method("ceil", math_unary("ceil", f64::ceil))
            .static_method("abs", |_, args| {
                let [x] = expect_args::<1>("abs", args)?;
                let negative = ops::comparison(crate::ast::CompareOp::Less, x, &Value::Int(0))?;
                if negative {
                    ops::unary(crate::ast::UnaryOp::Negate, x)
                } else {
                    Ok(x.clone())
                }
            })
            .static_method("round", |_, args| {
                let [x] = expect_args::<1>("round", args)?;
                let rounded = (ops::double_value(x)? + 0.5).floor();
                Ok(match ops::numeric_type(x) {
                    NumericType::Float => Value::Int(rounded as i32),
                    _ => Value::Long(rounded as i64),
                })
            })
            .static_method("pow", |_, args| {
                let [base, exp] = expect_args::<2>("pow", args)?;
                Ok(Value::Double(ops::double_value(base)?.powf(ops::double_value(exp)?)))
            }),
        marker(
            "java.util.ArrayList",
            &["java.util.List", "java.util.Collection", "java.lang.Iterable", "java.io.Serializable"],
        )
        .constructor(list_constructor),
        marker("java.util.HashMap", &["java.util.Map", "java.io.Serializable"])
            .constructor(map_constructor("java.util.HashMap")),
        marker(
            "java.util.LinkedHashMap",
            &["java.util.HashMap", "java.util.Map", "java.io.Serializable"],
        )
        .constructor(map_constructor("java.util.LinkedHashMap")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_names_fall_back_to_java_lang() {
        let registry = ClassRegistry::with_builtins();
        let class = registry.class_for_name("Integer").unwrap();
        assert_eq!(class.name(), "java.lang.Integer");
        assert!(class.is_a("java.lang.Number"));
        assert!(matches!(
            registry.class_for_name("java.util.Nope"),
            Err(OgnlError::ClassNotFound(_))
        ));
    }

    #[test]
    fn registered_classes_inherit_members() {
        let registry = ClassRegistry::with_builtins();
        registry.register(
            ClassDef::new("app.Animal")
                .property("name", ValueType::String)
                .method("speak", |_, _, _| Ok(Value::string("..."))),
        );
        let dog = registry.register(ClassDef::new("app.Dog").extends("app.Animal"));
        assert!(dog.is_a("app.Animal"));
        assert!(dog.property("name").is_some());
        assert!(dog.method("speak").is_some());
        assert_eq!(dog.instantiate().field("name"), Some(Value::Null));
    }

    #[test]
    fn static_finals_are_constant() {
        let registry = ClassRegistry::with_builtins();
        let integer = registry.class_for_name("java.lang.Integer").unwrap();
        let max = integer.static_field("MAX_VALUE").unwrap();
        assert!(max.constant);
        assert_eq!(max.value, Value::Int(i32::MAX));
    }
}
