use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use rust_decimal::Decimal;

use crate::{ast::Expression, runtime::ClassRef};

/// A host value navigated and produced by expressions.
///
/// Scalars follow the numeric widening lattice
/// `Boolean < Byte < Char < Short < Int < Long < BigInteger < Float < Double < BigDecimal`,
/// with strings sitting above every numeric type. Containers and beans are
/// shared handles: cloning a `Value::List` clones the handle, so assignments
/// made through an expression are visible to every holder of the list.
///
/// # Examples
///
/// ```
/// use ognl::Value;
///
/// let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
/// let alias = list.clone();
/// if let Value::List(items) = &list {
///     items.write().push(Value::Int(3));
/// }
/// assert_eq!(alias.to_string(), "[1, 2, 3]");
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    BigInteger(i128),
    Float(f32),
    Double(f64),
    BigDecimal(Decimal),
    String(Arc<str>),
    List(ListRef),
    Array(ArrayRef),
    Map(MapRef),
    Object(ObjectRef),
    Class(ClassRef),
    /// A parsed `:[ ... ]` body, evaluated on demand
    Lambda(Arc<Expression>),
    /// `[^]`, `[|]`, `[$]` or `[*]`
    Subscript(DynamicSubscript),
}

/// Relative index tokens used inside `[...]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamicSubscript {
    /// `[^]`
    First,
    /// `[|]`
    Mid,
    /// `[$]`
    Last,
    /// `[*]`
    All,
}

impl DynamicSubscript {
    pub fn symbol(self) -> char {
        match self {
            DynamicSubscript::First => '^',
            DynamicSubscript::Mid => '|',
            DynamicSubscript::Last => '$',
            DynamicSubscript::All => '*',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '^' => Some(DynamicSubscript::First),
            '|' => Some(DynamicSubscript::Mid),
            '$' => Some(DynamicSubscript::Last),
            '*' => Some(DynamicSubscript::All),
            _ => None,
        }
    }

    /// Absolute position for a sequence of `len` members.
    ///
    /// `None` for an empty sequence and for [`DynamicSubscript::All`], which
    /// addresses the whole value rather than one member.
    pub fn resolve(self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        match self {
            DynamicSubscript::First => Some(0),
            DynamicSubscript::Mid => Some(len / 2),
            DynamicSubscript::Last => Some(len - 1),
            DynamicSubscript::All => None,
        }
    }
}

/// Declared (static) type of a value, tracked on the context type stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
    String,
    List,
    Array(Box<ValueType>),
    Map,
    /// A bean of the named class
    Object(String),
    Class,
    Lambda,
    Subscript,
}

impl ValueType {
    /// Fully qualified class name, as used by `instanceof` and class lookups.
    pub fn class_name(&self) -> String {
        match self {
            ValueType::Boolean => "java.lang.Boolean".into(),
            ValueType::Byte => "java.lang.Byte".into(),
            ValueType::Char => "java.lang.Character".into(),
            ValueType::Short => "java.lang.Short".into(),
            ValueType::Int => "java.lang.Integer".into(),
            ValueType::Long => "java.lang.Long".into(),
            ValueType::BigInteger => "java.math.BigInteger".into(),
            ValueType::Float => "java.lang.Float".into(),
            ValueType::Double => "java.lang.Double".into(),
            ValueType::BigDecimal => "java.math.BigDecimal".into(),
            ValueType::String => "java.lang.String".into(),
            ValueType::List => "java.util.ArrayList".into(),
            ValueType::Array(component) => format!("{}[]", component.class_name()),
            ValueType::Map => "java.util.LinkedHashMap".into(),
            ValueType::Object(name) => name.clone(),
            ValueType::Class => "java.lang.Class".into(),
            ValueType::Lambda => "ognl.Lambda".into(),
            ValueType::Subscript => "ognl.DynamicSubscript".into(),
        }
    }

    /// Type named by an array component keyword such as `int` or `String`.
    pub fn from_component_name(name: &str) -> Option<ValueType> {
        let ty = match name {
            "boolean" | "Boolean" | "java.lang.Boolean" => ValueType::Boolean,
            "byte" | "Byte" | "java.lang.Byte" => ValueType::Byte,
            "char" | "Character" | "java.lang.Character" => ValueType::Char,
            "short" | "Short" | "java.lang.Short" => ValueType::Short,
            "int" | "Integer" | "java.lang.Integer" => ValueType::Int,
            "long" | "Long" | "java.lang.Long" => ValueType::Long,
            "float" | "Float" | "java.lang.Float" => ValueType::Float,
            "double" | "Double" | "java.lang.Double" => ValueType::Double,
            "BigInteger" | "java.math.BigInteger" => ValueType::BigInteger,
            "BigDecimal" | "java.math.BigDecimal" => ValueType::BigDecimal,
            "String" | "java.lang.String" => ValueType::String,
            _ => return None,
        };
        Some(ty)
    }

    /// Name used for casts in generated source.
    pub fn source_name(&self) -> &'static str {
        match self {
            ValueType::Boolean => "bool",
            ValueType::Byte => "i8",
            ValueType::Char => "char",
            ValueType::Short => "i16",
            ValueType::Int => "i32",
            ValueType::Long => "i64",
            ValueType::BigInteger => "i128",
            ValueType::Float => "f32",
            ValueType::Double => "f64",
            ValueType::BigDecimal => "Decimal",
            ValueType::String => "String",
            _ => "Value",
        }
    }

    pub fn is_primitive_numeric(&self) -> bool {
        matches!(
            self,
            ValueType::Byte
                | ValueType::Char
                | ValueType::Short
                | ValueType::Int
                | ValueType::Long
                | ValueType::Float
                | ValueType::Double
        )
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Shared, growable list.
#[derive(Debug, Clone, Default)]
pub struct ListRef(Arc<RwLock<Vec<Value>>>);

impl ListRef {
    pub fn new(items: Vec<Value>) -> Self {
        ListRef(Arc::new(RwLock::new(items)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<Value>> {
        read_lock(&self.0)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<Value>> {
        write_lock(&self.0)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Value> {
        self.read().clone()
    }

    pub fn ptr_eq(&self, other: &ListRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Shared, fixed-length array with a declared component type.
#[derive(Debug, Clone)]
pub struct ArrayRef {
    component: ValueType,
    items: Arc<RwLock<Vec<Value>>>,
}

impl ArrayRef {
    pub fn new(component: ValueType, items: Vec<Value>) -> Self {
        ArrayRef {
            component,
            items: Arc::new(RwLock::new(items)),
        }
    }

    pub fn component(&self) -> &ValueType {
        &self.component
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<Value>> {
        read_lock(&self.items)
    }

    /// Write access to the members. Callers must keep the length unchanged.
    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<Value>> {
        write_lock(&self.items)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Value> {
        self.read().clone()
    }

    /// A new array with the same component type and members.
    pub fn copy(&self) -> ArrayRef {
        ArrayRef::new(self.component.clone(), self.snapshot())
    }

    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

/// Insertion-ordered map with arbitrary keys.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Inserts or replaces, returning the previous value.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl FromIterator<(Value, Value)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Shared map handle, optionally tagged with the class it was created as.
#[derive(Debug, Clone, Default)]
pub struct MapRef {
    class_name: Option<Arc<str>>,
    entries: Arc<RwLock<ValueMap>>,
}

impl MapRef {
    pub fn new(entries: ValueMap) -> Self {
        MapRef {
            class_name: None,
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    pub fn with_class(class_name: &str, entries: ValueMap) -> Self {
        MapRef {
            class_name: Some(Arc::from(class_name)),
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ValueMap> {
        read_lock(&self.entries)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ValueMap> {
        write_lock(&self.entries)
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.read().get(key).cloned()
    }

    pub fn insert(&self, key: Value, value: Value) -> Option<Value> {
        self.write().insert(key, value)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn ptr_eq(&self, other: &MapRef) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

/// Instance of a registered class: the class plus its mutable fields.
pub struct Bean {
    class: ClassRef,
    fields: RwLock<BTreeMap<String, Value>>,
}

/// Shared bean handle. Equality is identity.
#[derive(Clone)]
pub struct ObjectRef(Arc<Bean>);

impl ObjectRef {
    pub fn new(class: ClassRef, fields: BTreeMap<String, Value>) -> Self {
        ObjectRef(Arc::new(Bean {
            class,
            fields: RwLock::new(fields),
        }))
    }

    pub fn class(&self) -> &ClassRef {
        &self.0.class
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        read_lock(&self.0.fields).get(name).cloned()
    }

    pub fn has_field(&self, name: &str) -> bool {
        read_lock(&self.0.fields).contains_key(name)
    }

    pub fn set_field(&self, name: &str, value: Value) {
        write_lock(&self.0.fields).insert(name.to_string(), value);
    }

    pub fn fields(&self) -> BTreeMap<String, Value> {
        read_lock(&self.0.fields).clone()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.class().name())
            .field("fields", &*read_lock(&self.0.fields))
            .finish()
    }
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Value {
        Value::String(Arc::from(s.as_ref()))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(ListRef::new(items))
    }

    pub fn array(component: ValueType, items: Vec<Value>) -> Value {
        Value::Array(ArrayRef::new(component, items))
    }

    pub fn map(entries: Vec<(Value, Value)>) -> Value {
        Value::Map(MapRef::new(entries.into_iter().collect()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Declared type of this value; `None` for `null`.
    pub fn value_type(&self) -> Option<ValueType> {
        let ty = match self {
            Value::Null => return None,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Byte(_) => ValueType::Byte,
            Value::Char(_) => ValueType::Char,
            Value::Short(_) => ValueType::Short,
            Value::Int(_) => ValueType::Int,
            Value::Long(_) => ValueType::Long,
            Value::BigInteger(_) => ValueType::BigInteger,
            Value::Float(_) => ValueType::Float,
            Value::Double(_) => ValueType::Double,
            Value::BigDecimal(_) => ValueType::BigDecimal,
            Value::String(_) => ValueType::String,
            Value::List(_) => ValueType::List,
            Value::Array(a) => ValueType::Array(Box::new(a.component().clone())),
            Value::Map(_) => ValueType::Map,
            Value::Object(o) => ValueType::Object(o.class().name().to_string()),
            Value::Class(_) => ValueType::Class,
            Value::Lambda(_) => ValueType::Lambda,
            Value::Subscript(_) => ValueType::Subscript,
        };
        Some(ty)
    }

    /// Fully qualified class name of the value, `"null"` for null.
    pub fn class_name(&self) -> String {
        match self {
            Value::Map(m) => m
                .class_name()
                .map(str::to_string)
                .unwrap_or_else(|| ValueType::Map.class_name()),
            other => other
                .value_type()
                .map(|t| t.class_name())
                .unwrap_or_else(|| "null".to_string()),
        }
    }

    /// Short, human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Char(_) => "char",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::BigInteger(_) => "BigInteger",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::BigDecimal(_) => "BigDecimal",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Class(_) => "class",
            Value::Lambda(_) => "lambda",
            Value::Subscript(_) => "subscript",
        }
    }

    /// Loose truthiness: null, zero, `'\0'` and the empty string are false,
    /// every other value is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Byte(n) => *n != 0,
            Value::Char(c) => *c != '\0',
            Value::Short(n) => *n != 0,
            Value::Int(n) => *n != 0,
            Value::Long(n) => *n != 0,
            Value::BigInteger(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Double(n) => *n != 0.0,
            Value::BigDecimal(n) => !n.is_zero(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Members of a list or array, copied out of the lock.
    pub fn sequence(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(l) => Some(l.snapshot()),
            Value::Array(a) => Some(a.snapshot()),
            _ => None,
        }
    }

    /// True when both values are the same shared object (or equal scalars).
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Arc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Lambda(a), Value::Lambda(b)) => Arc::ptr_eq(a, b),
            (a, b) => a == b,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (BigInteger(a), BigInteger(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (BigDecimal(a), BigDecimal(b)) => a == b,
            (String(a), String(b)) => a == b,
            (List(a), List(b)) => a.ptr_eq(b) || *a.read() == *b.read(),
            (Array(a), Array(b)) => {
                a.ptr_eq(b) || (a.component() == b.component() && *a.read() == *b.read())
            }
            (Map(a), Map(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let (a, b) = (a.read(), b.read());
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            (Object(a), Object(b)) => a.ptr_eq(b),
            (Class(a), Class(b)) => a.name() == b.name(),
            (Lambda(a), Lambda(b)) => Arc::ptr_eq(a, b),
            (Subscript(a), Subscript(b)) => a == b,
            _ => false,
        }
    }
}

fn write_joined<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Byte(n) => write!(f, "{}", n),
            Value::Char(c) => write!(f, "{}", c),
            Value::Short(n) => write!(f, "{}", n),
            Value::Int(n) => write!(f, "{}", n),
            Value::Long(n) => write!(f, "{}", n),
            Value::BigInteger(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{:?}", n),
            Value::Double(n) => write!(f, "{:?}", n),
            Value::BigDecimal(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::List(l) => {
                write!(f, "[")?;
                write_joined(f, l.read().iter())?;
                write!(f, "]")
            }
            Value::Array(a) => {
                write!(f, "[")?;
                write_joined(f, a.read().iter())?;
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Object(o) => {
                write!(f, "{}{{", o.class().simple_name())?;
                for (i, (k, v)) in o.fields().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Class(c) => write!(f, "class {}", c.name()),
            Value::Lambda(body) => write!(f, ":[{}]", body),
            Value::Subscript(s) => write!(f, "{}", s.symbol()),
        }
    }
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v)
            }
        })*
    };
}

impl_from! {
    bool => Boolean,
    i8 => Byte,
    char => Char,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    i128 => BigInteger,
    f32 => Float,
    f64 => Double,
    Decimal => BigDecimal,
    ObjectRef => Object,
    ClassRef => Class,
    DynamicSubscript => Subscript,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_follows_loose_rules() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Double(0.0).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(!Value::Char('\0').is_truthy());
        assert!(Value::string("false").is_truthy());
        assert!(Value::list(vec![]).is_truthy());
        assert!(Value::BigDecimal(Decimal::new(1, 2)).is_truthy());
    }

    #[test]
    fn list_handles_share_storage() {
        let list = Value::list(vec![Value::Int(1)]);
        let alias = list.clone();
        if let Value::List(l) = &list {
            l.write().push(Value::Int(2));
        }
        assert_eq!(alias, Value::list(vec![Value::Int(1), Value::Int(2)]));
        assert!(list.same(&alias));
        assert!(!list.same(&Value::list(vec![Value::Int(1), Value::Int(2)])));
    }

    #[test]
    fn map_equality_ignores_order() {
        let a = Value::map(vec![("x".into(), Value::Int(1)), ("y".into(), Value::Int(2))]);
        let b = Value::map(vec![("y".into(), Value::Int(2)), ("x".into(), Value::Int(1))]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "{x=1, y=2}");
    }

    #[test]
    fn numeric_variants_are_distinct() {
        assert_ne!(Value::Int(1), Value::Long(1));
        assert_eq!(Value::Long(1), Value::from(1i64));
    }

    #[test]
    fn dynamic_subscripts_resolve_relative_positions() {
        assert_eq!(DynamicSubscript::First.resolve(3), Some(0));
        assert_eq!(DynamicSubscript::Mid.resolve(3), Some(1));
        assert_eq!(DynamicSubscript::Last.resolve(3), Some(2));
        assert_eq!(DynamicSubscript::All.resolve(3), None);
        assert_eq!(DynamicSubscript::Last.resolve(0), None);
    }
}
