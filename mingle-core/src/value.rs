use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::{CoreType, Identifier, ListTypeRef, ModelError, QualifiedTypeName, TypeRef};

/// An instance of the mingle data model.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `null`
    Null,
    /// A boolean.
    Boolean(bool),
    /// Raw bytes.
    Buffer(Vec<u8>),
    /// Text.
    String(String),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 32-bit integer.
    Uint32(u32),
    /// Unsigned 64-bit integer.
    Uint64(u64),
    /// 32-bit float.
    Float32(f32),
    /// 64-bit float.
    Float64(f64),
    /// A point in time.
    Timestamp(OffsetDateTime),
    /// One value of an enum type.
    Enum(EnumValue),
    /// An untyped, ordered map of fields.
    SymbolMap(SymbolMap),
    /// A typed list.
    List(List),
    /// A typed struct.
    Struct(Struct),
}

impl Value {
    /// The runtime type of this value. Lists report their own list type,
    /// structs and enums the atomic type they are tagged with.
    pub fn type_of(&self) -> TypeRef {
        match self {
            Value::Null => TypeRef::core(CoreType::Null),
            Value::Boolean(_) => TypeRef::core(CoreType::Boolean),
            Value::Buffer(_) => TypeRef::core(CoreType::Buffer),
            Value::String(_) => TypeRef::core(CoreType::String),
            Value::Int32(_) => TypeRef::core(CoreType::Int32),
            Value::Int64(_) => TypeRef::core(CoreType::Int64),
            Value::Uint32(_) => TypeRef::core(CoreType::Uint32),
            Value::Uint64(_) => TypeRef::core(CoreType::Uint64),
            Value::Float32(_) => TypeRef::core(CoreType::Float32),
            Value::Float64(_) => TypeRef::core(CoreType::Float64),
            Value::Timestamp(_) => TypeRef::core(CoreType::Timestamp),
            Value::Enum(e) => TypeRef::atomic(e.type_name().clone()),
            Value::SymbolMap(_) => TypeRef::core(CoreType::SymbolMap),
            Value::List(l) => TypeRef::List(l.list_type().clone()),
            Value::Struct(s) => TypeRef::atomic(s.type_name().clone()),
        }
    }

    /// True for the values carried by a single `Value` event, as opposed to
    /// maps, lists and structs which stream as start/end pairs.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::SymbolMap(_) | Value::List(_) | Value::Struct(_))
    }

    /// Orders two values of the same numeric, string or timestamp kind.
    /// Values of different kinds, and NaN, do not compare.
    pub fn compare_scalar(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (Value::Uint32(a), Value::Uint32(b)) => Some(a.cmp(b)),
            (Value::Uint64(a), Value::Uint64(b)) => Some(a.cmp(b)),
            (Value::Float32(a), Value::Float32(b)) => a.partial_cmp(b),
            (Value::Float64(a), Value::Float64(b)) => a.partial_cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Buffer(buf) => {
                f.write_str("buf[")?;
                for b in buf {
                    write!(f, "{b:02x}")?;
                }
                f.write_str("]")
            }
            Value::String(s) => write!(f, "{s:?}"),
            Value::Int32(n) => write!(f, "{n}"),
            Value::Int64(n) => write!(f, "{n}"),
            Value::Uint32(n) => write!(f, "{n}"),
            Value::Uint64(n) => write!(f, "{n}"),
            Value::Float32(n) => write!(f, "{n}"),
            Value::Float64(n) => write!(f, "{n}"),
            Value::Timestamp(t) => match t.format(&Rfc3339) {
                Ok(s) => write!(f, "{s}"),
                Err(_) => write!(f, "<invalid timestamp>"),
            },
            Value::Enum(e) => e.fmt(f),
            Value::SymbolMap(m) => m.fmt(f),
            Value::List(l) => l.fmt(f),
            Value::Struct(s) => s.fmt(f),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Uint32(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint64(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float32(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float64(n)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(t: OffsetDateTime) -> Self {
        Value::Timestamp(t)
    }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self {
        Value::Enum(e)
    }
}

impl From<SymbolMap> for Value {
    fn from(m: SymbolMap) -> Self {
        Value::SymbolMap(m)
    }
}

impl From<List> for Value {
    fn from(l: List) -> Self {
        Value::List(l)
    }
}

impl From<Struct> for Value {
    fn from(s: Struct) -> Self {
        Value::Struct(s)
    }
}

/// A value of an enum type, e.g. `ns1@v1/Color.red`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumValue {
    type_name: QualifiedTypeName,
    value: Identifier,
}

impl EnumValue {
    /// `type_name.value`
    pub fn new(type_name: QualifiedTypeName, value: Identifier) -> Self {
        Self { type_name, value }
    }

    /// The enum type.
    pub fn type_name(&self) -> &QualifiedTypeName {
        &self.type_name
    }

    /// The chosen enum value.
    pub fn value(&self) -> &Identifier {
        &self.value
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.value)
    }
}

/// Fields in insertion order. Keys are unique.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SymbolMap {
    entries: Vec<(Identifier, Value)>,
}

impl SymbolMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from pairs, failing on the first repeated key.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (Identifier, Value)>,
    {
        let mut map = Self::new();
        for (k, v) in pairs {
            map.try_insert(k, v)?;
        }
        Ok(map)
    }

    /// Appends a field, failing if the key is already present.
    pub fn try_insert(&mut self, key: Identifier, value: Value) -> Result<(), ModelError> {
        if self.contains_key(&key) {
            return Err(ModelError::DuplicateKey(key.to_string()));
        }
        self.entries.push((key, value));
        Ok(())
    }

    /// The value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &Identifier) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Identifier> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for SymbolMap {
    type Item = (Identifier, Value);
    type IntoIter = alloc::vec::IntoIter<(Identifier, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Display for SymbolMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}:{v}")?;
        }
        f.write_str("}")
    }
}

/// Values of one list type.
#[derive(Clone, Debug, PartialEq)]
pub struct List {
    list_type: ListTypeRef,
    values: Vec<Value>,
}

impl List {
    /// A list of `values` typed as `list_type`.
    pub fn new(list_type: ListTypeRef, values: Vec<Value>) -> Self {
        Self { list_type, values }
    }

    /// A `Value*` list.
    pub fn opaque(values: Vec<Value>) -> Self {
        Self::new(ListTypeRef::opaque(), values)
    }

    /// The list's declared type.
    pub fn list_type(&self) -> &ListTypeRef {
        &self.list_type
    }

    /// The elements.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str("]")
    }
}

/// A symbol map tagged with a struct type.
#[derive(Clone, Debug, PartialEq)]
pub struct Struct {
    type_name: QualifiedTypeName,
    fields: SymbolMap,
}

impl Struct {
    /// A `type_name` struct holding `fields`.
    pub fn new(type_name: QualifiedTypeName, fields: SymbolMap) -> Self {
        Self { type_name, fields }
    }

    /// The struct type.
    pub fn type_name(&self) -> &QualifiedTypeName {
        &self.type_name
    }

    /// The fields, in insertion order.
    pub fn fields(&self) -> &SymbolMap {
        &self.fields
    }
}

impl fmt::Display for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.type_name, self.fields)
    }
}
