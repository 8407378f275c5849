use alloc::string::String;

/// Errors raised while building model values by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModelError {
    /// The text is not a valid field or enum identifier.
    InvalidIdentifier(String),

    /// The text is not a valid `namespace/Name` qualified type name.
    InvalidTypeName(String),

    /// A regex restriction failed to compile.
    InvalidRegex {
        /// The pattern as written.
        pattern: String,
        /// What the regex compiler reported.
        reason: String,
    },

    /// A symbol map was given the same key twice.
    DuplicateKey(String),
}

impl core::fmt::Display for ModelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ModelError::InvalidIdentifier(s) => write!(f, "Invalid identifier: {s:?}"),
            ModelError::InvalidTypeName(s) => write!(f, "Invalid qualified type name: {s:?}"),
            ModelError::InvalidRegex { pattern, reason } => {
                write!(f, "Invalid regex restriction {pattern:?}: {reason}")
            }
            ModelError::DuplicateKey(key) => write!(f, "Duplicate symbol map key: {key}"),
        }
    }
}

impl core::error::Error for ModelError {}
