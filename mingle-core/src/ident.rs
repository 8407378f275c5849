use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::fmt;

use crate::ModelError;

/// Names a field of a struct or symbol map, or the value of an enum.
///
/// Identifiers start with an ASCII lowercase letter and continue with ASCII
/// alphanumerics, `-` or `_` (`f1`, `field-name`, `some_field`). Cloning is
/// cheap: the text is shared.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Arc<str>);

impl Identifier {
    /// Validates `s` and wraps it as an identifier.
    pub fn new(s: &str) -> Result<Self, ModelError> {
        let mut chars = s.chars();
        match chars.next() {
            None => return Err(ModelError::InvalidIdentifier(s.to_string())),
            Some(c) if !c.is_ascii_lowercase() => {
                return Err(ModelError::InvalidIdentifier(s.to_string()));
            }
            Some(_) => {}
        }
        if chars.any(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_')) {
            return Err(ModelError::InvalidIdentifier(s.to_string()));
        }
        Ok(Self(Arc::from(s)))
    }

    /// The identifier as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.0)
    }
}

impl TryFrom<&str> for Identifier {
    type Error = ModelError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Identifier::new(s)
    }
}

/// The namespace every built-in type lives in.
pub const CORE_NAMESPACE: &str = "mingle:core@v1";

/// A type name together with the namespace declaring it, e.g.
/// `mingle:core@v1/String` or `ns1@v1/Struct1`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedTypeName {
    namespace: Arc<str>,
    name: Arc<str>,
}

impl QualifiedTypeName {
    /// Builds a name from its parts, validating both.
    pub fn new(namespace: &str, name: &str) -> Result<Self, ModelError> {
        let namespace_ok = !namespace.is_empty()
            && namespace.contains('@')
            && !namespace.contains('/')
            && !namespace.chars().any(char::is_whitespace);
        let mut name_chars = name.chars();
        let name_ok = name_chars.next().is_some_and(|c| c.is_ascii_uppercase())
            && name_chars.all(|c| c.is_ascii_alphanumeric());
        if !(namespace_ok && name_ok) {
            return Err(ModelError::InvalidTypeName(alloc::format!(
                "{namespace}/{name}"
            )));
        }
        Ok(Self {
            namespace: Arc::from(namespace),
            name: Arc::from(name),
        })
    }

    /// Parses the external form `namespace/Name`.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s.rsplit_once('/') {
            Some((ns, name)) => Self::new(ns, name),
            None => Err(ModelError::InvalidTypeName(s.to_string())),
        }
    }

    /// A name in [`CORE_NAMESPACE`]. Only used for names known to be valid.
    pub(crate) fn core(name: &'static str) -> Self {
        Self {
            namespace: Arc::from(CORE_NAMESPACE),
            name: Arc::from(name),
        }
    }

    /// The declaring namespace, e.g. `mingle:core@v1`.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The unqualified name, e.g. `String`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The external form, `namespace/Name`.
    pub fn external_form(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QualifiedTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl fmt::Debug for QualifiedTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QualifiedTypeName({self})")
    }
}
