use alloc::boxed::Box;
use core::fmt;

use crate::{QualifiedTypeName, Restriction};

/// The built-in atomic types, all declared in [`crate::CORE_NAMESPACE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CoreType {
    /// The universal top type: every value is a `Value`.
    Value,
    /// The type of `null`.
    Null,
    /// `true` or `false`.
    Boolean,
    /// Raw bytes.
    Buffer,
    /// UTF-8 text.
    String,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 32-bit integer.
    Uint32,
    /// Unsigned 64-bit integer.
    Uint64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// A point in time with an offset.
    Timestamp,
    /// An untyped map from identifiers to values.
    SymbolMap,
}

impl CoreType {
    /// Every core type, in declaration order.
    pub const ALL: [CoreType; 13] = [
        CoreType::Value,
        CoreType::Null,
        CoreType::Boolean,
        CoreType::Buffer,
        CoreType::String,
        CoreType::Int32,
        CoreType::Int64,
        CoreType::Uint32,
        CoreType::Uint64,
        CoreType::Float32,
        CoreType::Float64,
        CoreType::Timestamp,
        CoreType::SymbolMap,
    ];

    /// The unqualified type name, e.g. `Int32`.
    pub const fn name(self) -> &'static str {
        match self {
            CoreType::Value => "Value",
            CoreType::Null => "Null",
            CoreType::Boolean => "Boolean",
            CoreType::Buffer => "Buffer",
            CoreType::String => "String",
            CoreType::Int32 => "Int32",
            CoreType::Int64 => "Int64",
            CoreType::Uint32 => "Uint32",
            CoreType::Uint64 => "Uint64",
            CoreType::Float32 => "Float32",
            CoreType::Float64 => "Float64",
            CoreType::Timestamp => "Timestamp",
            CoreType::SymbolMap => "SymbolMap",
        }
    }

    /// The qualified name of this type.
    pub fn qname(self) -> QualifiedTypeName {
        QualifiedTypeName::core(self.name())
    }

    /// Maps a qualified name back onto a core type.
    pub fn from_qname(qn: &QualifiedTypeName) -> Option<CoreType> {
        if qn.namespace() != crate::CORE_NAMESPACE {
            return None;
        }
        CoreType::ALL.into_iter().find(|ct| ct.name() == qn.name())
    }

    /// True for the four integer types.
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            CoreType::Int32 | CoreType::Int64 | CoreType::Uint32 | CoreType::Uint64
        )
    }

    /// True for the integer and float types.
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || matches!(self, CoreType::Float32 | CoreType::Float64)
    }
}

impl fmt::Display for CoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", crate::CORE_NAMESPACE, self.name())
    }
}

/// A named type, optionally narrowed by a restriction.
#[derive(Clone, Debug, PartialEq)]
pub struct AtomicTypeRef {
    name: QualifiedTypeName,
    restriction: Option<Restriction>,
}

impl AtomicTypeRef {
    /// An unrestricted reference to `name`.
    pub fn new(name: QualifiedTypeName) -> Self {
        Self {
            name,
            restriction: None,
        }
    }

    /// A reference to `name` narrowed by `restriction`.
    pub fn restricted(name: QualifiedTypeName, restriction: Restriction) -> Self {
        Self {
            name,
            restriction: Some(restriction),
        }
    }

    /// The referenced type's name.
    pub fn name(&self) -> &QualifiedTypeName {
        &self.name
    }

    /// The restriction, if any.
    pub fn restriction(&self) -> Option<&Restriction> {
        self.restriction.as_ref()
    }

    /// The core type this names, if it names one.
    pub fn core_type(&self) -> Option<CoreType> {
        CoreType::from_qname(&self.name)
    }
}

impl fmt::Display for AtomicTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(r) = &self.restriction {
            write!(f, "~{r}")?;
        }
        Ok(())
    }
}

/// A list of elements of one type.
#[derive(Clone, Debug, PartialEq)]
pub struct ListTypeRef {
    element: Box<TypeRef>,
    allows_empty: bool,
}

impl ListTypeRef {
    /// A list of `element`; `allows_empty` is false for `T+` lists.
    pub fn new(element: TypeRef, allows_empty: bool) -> Self {
        Self {
            element: Box::new(element),
            allows_empty,
        }
    }

    /// `Value*`, the list that admits anything.
    pub fn opaque() -> Self {
        Self::new(TypeRef::value(), true)
    }

    /// The element type.
    pub fn element(&self) -> &TypeRef {
        &self.element
    }

    /// Whether a list of this type may have no elements.
    pub fn allows_empty(&self) -> bool {
        self.allows_empty
    }
}

impl fmt::Display for ListTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = if self.allows_empty { '*' } else { '+' };
        write!(f, "{}{suffix}", self.element)
    }
}

/// A type that also admits `null`.
#[derive(Clone, Debug, PartialEq)]
pub struct NullableTypeRef {
    inner: Box<TypeRef>,
}

impl NullableTypeRef {
    /// `inner?`
    pub fn new(inner: TypeRef) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    /// The wrapped type.
    pub fn inner(&self) -> &TypeRef {
        &self.inner
    }
}

impl fmt::Display for NullableTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?", self.inner)
    }
}

/// A type tree, as produced by the type system for fields, lists and call
/// sites.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeRef {
    /// A named type, possibly restricted.
    Atomic(AtomicTypeRef),
    /// `T*` or `T+`.
    List(ListTypeRef),
    /// `T?`
    Nullable(NullableTypeRef),
}

impl TypeRef {
    /// An unrestricted reference to a core type.
    pub fn core(ct: CoreType) -> Self {
        TypeRef::Atomic(AtomicTypeRef::new(ct.qname()))
    }

    /// The universal top type, `mingle:core@v1/Value`.
    pub fn value() -> Self {
        Self::core(CoreType::Value)
    }

    /// `mingle:core@v1/Value*`
    pub fn opaque_list() -> Self {
        TypeRef::List(ListTypeRef::opaque())
    }

    /// An unrestricted reference to `name`.
    pub fn atomic(name: QualifiedTypeName) -> Self {
        TypeRef::Atomic(AtomicTypeRef::new(name))
    }

    /// A list of `element`.
    pub fn list_of(element: TypeRef, allows_empty: bool) -> Self {
        TypeRef::List(ListTypeRef::new(element, allows_empty))
    }

    /// `inner?`
    pub fn nullable(inner: TypeRef) -> Self {
        TypeRef::Nullable(NullableTypeRef::new(inner))
    }

    /// The core type this names, if it is an atomic reference to one.
    pub fn core_type(&self) -> Option<CoreType> {
        match self {
            TypeRef::Atomic(at) => at.core_type(),
            _ => None,
        }
    }

    /// True for the universal top type.
    pub fn is_value(&self) -> bool {
        self.core_type() == Some(CoreType::Value)
    }

    /// True for `mingle:core@v1/SymbolMap`.
    pub fn is_symbol_map(&self) -> bool {
        self.core_type() == Some(CoreType::SymbolMap)
    }

    /// Strips any number of `?` wrappers.
    pub fn unwrap_nullable(&self) -> &TypeRef {
        let mut t = self;
        while let TypeRef::Nullable(nt) = t {
            t = nt.inner();
        }
        t
    }
}

impl From<AtomicTypeRef> for TypeRef {
    fn from(at: AtomicTypeRef) -> Self {
        TypeRef::Atomic(at)
    }
}

impl From<ListTypeRef> for TypeRef {
    fn from(lt: ListTypeRef) -> Self {
        TypeRef::List(lt)
    }
}

impl From<CoreType> for TypeRef {
    fn from(ct: CoreType) -> Self {
        TypeRef::core(ct)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Atomic(at) => at.fmt(f),
            TypeRef::List(lt) => lt.fmt(f),
            TypeRef::Nullable(nt) => nt.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegexRestriction;
    use mingle_testhelpers::test;

    #[test]
    fn core_types_round_trip_through_qualified_names() {
        for ct in CoreType::ALL {
            assert_eq!(CoreType::from_qname(&ct.qname()), Some(ct));
        }
        let other = QualifiedTypeName::parse("ns1@v1/String")?;
        assert_eq!(CoreType::from_qname(&other), None);
    }

    #[test]
    fn type_refs_display_external_forms() {
        let s = TypeRef::core(CoreType::String);
        assert_eq!(s.to_string(), "mingle:core@v1/String");
        assert_eq!(
            TypeRef::list_of(s.clone(), false).to_string(),
            "mingle:core@v1/String+"
        );
        assert_eq!(
            TypeRef::list_of(TypeRef::nullable(s.clone()), true).to_string(),
            "mingle:core@v1/String?*"
        );
        assert_eq!(TypeRef::opaque_list().to_string(), "mingle:core@v1/Value*");

        let re = Restriction::Regex(RegexRestriction::new("^a+$")?);
        let restricted = AtomicTypeRef::restricted(CoreType::String.qname(), re);
        assert_eq!(restricted.to_string(), "mingle:core@v1/String~\"^a+$\"");
    }

    #[test]
    fn unwrap_nullable_strips_every_layer() {
        let t = TypeRef::nullable(TypeRef::nullable(TypeRef::core(CoreType::Int32)));
        assert_eq!(t.unwrap_nullable(), &TypeRef::core(CoreType::Int32));
        assert!(!t.is_value());
        assert!(TypeRef::value().is_value());
        assert!(TypeRef::core(CoreType::SymbolMap).is_symbol_map());
    }

    #[test]
    fn regex_restrictions_compare_by_pattern() {
        let a = TypeRef::from(AtomicTypeRef::restricted(
            CoreType::String.qname(),
            Restriction::Regex(RegexRestriction::new("^a+$")?),
        ));
        let b = TypeRef::from(AtomicTypeRef::restricted(
            CoreType::String.qname(),
            Restriction::Regex(RegexRestriction::new("^a+$")?),
        ));
        assert_eq!(a, b);
        assert_ne!(a, TypeRef::core(CoreType::String));
    }
}
