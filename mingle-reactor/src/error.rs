use alloc::string::String;
use core::fmt;

use mingle_core::{IdPath, TypeRef};

/// A failure reported by a reactor, located at the path where processing
/// stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactorError {
    /// Where in the value the error occurred.
    pub path: IdPath,

    /// What went wrong.
    pub kind: ReactorErrorKind,
}

/// The kinds of [`ReactorError`].
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ReactorErrorKind {
    /// The event sequence itself is malformed: a duplicate field, a value
    /// where none may appear, a start without its end.
    Structural(String),

    /// A value or composite of one type arrived where another was expected.
    TypeCast {
        /// The type the reactor expected at this position.
        expected: TypeRef,
        /// The runtime type it saw.
        actual: TypeRef,
    },

    /// `null` arrived where the expected type does not admit it.
    NullValue,

    /// The value has an acceptable type but invalid content: bad base64, a
    /// malformed number, a restriction violation, an empty list.
    Value(String),
}

impl ReactorError {
    /// An error of `kind` at `path`.
    pub fn new(path: IdPath, kind: ReactorErrorKind) -> Self {
        Self { path, kind }
    }

    /// A [`ReactorErrorKind::Structural`] error.
    pub fn structural(path: IdPath, msg: impl Into<String>) -> Self {
        Self::new(path, ReactorErrorKind::Structural(msg.into()))
    }

    /// A [`ReactorErrorKind::TypeCast`] error.
    pub fn type_cast(path: IdPath, expected: TypeRef, actual: TypeRef) -> Self {
        Self::new(path, ReactorErrorKind::TypeCast { expected, actual })
    }

    /// A [`ReactorErrorKind::NullValue`] error.
    pub fn null_value(path: IdPath) -> Self {
        Self::new(path, ReactorErrorKind::NullValue)
    }

    /// A [`ReactorErrorKind::Value`] error.
    pub fn value(path: IdPath, msg: impl Into<String>) -> Self {
        Self::new(path, ReactorErrorKind::Value(msg.into()))
    }

    /// True for malformed event sequences.
    pub fn is_structural(&self) -> bool {
        matches!(self.kind, ReactorErrorKind::Structural(_))
    }

    /// True for expected/actual type mismatches.
    pub fn is_type_cast(&self) -> bool {
        matches!(self.kind, ReactorErrorKind::TypeCast { .. })
    }

    /// True for content errors, including disallowed nulls.
    pub fn is_value(&self) -> bool {
        matches!(
            self.kind,
            ReactorErrorKind::Value(_) | ReactorErrorKind::NullValue
        )
    }

    /// The message without the path.
    pub fn message(&self) -> String {
        alloc::format!("{}", self.kind)
    }
}

impl fmt::Display for ReactorErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactorErrorKind::Structural(msg) | ReactorErrorKind::Value(msg) => f.write_str(msg),
            ReactorErrorKind::TypeCast { expected, actual } => {
                write!(f, "Expected value of type {expected} but found {actual}")
            }
            ReactorErrorKind::NullValue => f.write_str("Value is null"),
        }
    }
}

impl fmt::Display for ReactorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.path, self.kind)
        }
    }
}

impl core::error::Error for ReactorError {}
