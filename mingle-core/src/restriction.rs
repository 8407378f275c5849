use alloc::string::ToString;
use core::cmp::Ordering;
use core::fmt;

use regex::Regex;

use crate::{ModelError, Value};

/// A value-level constraint attached to an atomic type.
#[derive(Clone, Debug, PartialEq)]
pub enum Restriction {
    /// The value must be a string matched by the regex.
    Regex(RegexRestriction),
    /// The value must fall within the range.
    Range(RangeRestriction),
}

impl Restriction {
    /// Whether `v` satisfies this restriction.
    pub fn accepts_value(&self, v: &Value) -> bool {
        match self {
            Restriction::Regex(r) => r.accepts_value(v),
            Restriction::Range(r) => r.accepts_value(v),
        }
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Restriction::Regex(r) => r.fmt(f),
            Restriction::Range(r) => r.fmt(f),
        }
    }
}

/// A string restriction; equality compares pattern sources.
#[derive(Clone, Debug)]
pub struct RegexRestriction {
    regex: Regex,
}

impl RegexRestriction {
    /// Compiles `pattern`.
    pub fn new(pattern: &str) -> Result<Self, ModelError> {
        Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|e| ModelError::InvalidRegex {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// The pattern as written.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Strings the regex matches anywhere are accepted; anything else is not.
    pub fn accepts_value(&self, v: &Value) -> bool {
        match v {
            Value::String(s) => self.regex.is_match(s),
            _ => false,
        }
    }
}

impl PartialEq for RegexRestriction {
    fn eq(&self, other: &Self) -> bool {
        self.pattern() == other.pattern()
    }
}

impl fmt::Display for RegexRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.pattern())
    }
}

/// An interval over numbers, timestamps or strings. A missing bound is
/// unbounded on that side.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeRestriction {
    min: Option<Value>,
    min_closed: bool,
    max: Option<Value>,
    max_closed: bool,
}

impl RangeRestriction {
    /// `[min,max]`, `(min,max)` and the mixed forms, per the `*_closed` flags.
    pub fn new(min: Option<Value>, min_closed: bool, max: Option<Value>, max_closed: bool) -> Self {
        Self {
            min,
            min_closed,
            max,
            max_closed,
        }
    }

    /// The lower bound, if any.
    pub fn min(&self) -> Option<&Value> {
        self.min.as_ref()
    }

    /// Whether the lower bound is inclusive.
    pub fn min_closed(&self) -> bool {
        self.min_closed
    }

    /// The upper bound, if any.
    pub fn max(&self) -> Option<&Value> {
        self.max.as_ref()
    }

    /// Whether the upper bound is inclusive.
    pub fn max_closed(&self) -> bool {
        self.max_closed
    }

    /// A value of a kind the bounds cannot be compared with is rejected.
    pub fn accepts_value(&self, v: &Value) -> bool {
        if let Some(min) = &self.min {
            match v.compare_scalar(min) {
                Some(Ordering::Greater) => {}
                Some(Ordering::Equal) if self.min_closed => {}
                _ => return false,
            }
        }
        if let Some(max) = &self.max {
            match v.compare_scalar(max) {
                Some(Ordering::Less) => {}
                Some(Ordering::Equal) if self.max_closed => {}
                _ => return false,
            }
        }
        true
    }
}

impl fmt::Display for RangeRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.min_closed { "[" } else { "(" })?;
        if let Some(min) = &self.min {
            write!(f, "{min}")?;
        }
        f.write_str(",")?;
        if let Some(max) = &self.max {
            write!(f, "{max}")?;
        }
        f.write_str(if self.max_closed { "]" } else { ")" })
    }
}
