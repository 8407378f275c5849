//! The built-in table of atomic casts.

use alloc::format;
use alloc::string::{String, ToString};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mingle_core::{AtomicTypeRef, CoreType, IdPath, TypeRef, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::ReactorError;

fn type_cast_error(call_type: &TypeRef, v: &Value, path: &IdPath) -> ReactorError {
    ReactorError::type_cast(path.clone(), call_type.clone(), v.type_of())
}

fn cast_boolean(v: &Value, call_type: &TypeRef, path: &IdPath) -> Result<Value, ReactorError> {
    match v {
        Value::Boolean(_) => Ok(v.clone()),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err(ReactorError::value(
                path.clone(),
                format!("Invalid boolean value: {v}"),
            )),
        },
        _ => Err(type_cast_error(call_type, v, path)),
    }
}

fn cast_buffer(v: &Value, call_type: &TypeRef, path: &IdPath) -> Result<Value, ReactorError> {
    match v {
        Value::Buffer(_) => Ok(v.clone()),
        Value::String(s) => STANDARD.decode(s).map(Value::Buffer).map_err(|e| {
            ReactorError::value(path.clone(), format!("Invalid base64 string: {e}"))
        }),
        _ => Err(type_cast_error(call_type, v, path)),
    }
}

fn cast_string(v: &Value, call_type: &TypeRef, path: &IdPath) -> Result<Value, ReactorError> {
    let s: String = match v {
        Value::String(_) => return Ok(v.clone()),
        Value::Boolean(b) => b.to_string(),
        Value::Int32(n) => n.to_string(),
        Value::Int64(n) => n.to_string(),
        Value::Uint32(n) => n.to_string(),
        Value::Uint64(n) => n.to_string(),
        Value::Float32(n) => n.to_string(),
        Value::Float64(n) => n.to_string(),
        Value::Timestamp(t) => t.format(&Rfc3339).map_err(|e| {
            ReactorError::value(path.clone(), format!("Unformattable timestamp: {e}"))
        })?,
        Value::Buffer(buf) => STANDARD.encode(buf),
        Value::Enum(e) => e.value().to_string(),
        _ => return Err(type_cast_error(call_type, v, path)),
    };
    Ok(Value::String(s))
}

fn number_error(s: &str, ct: CoreType, path: &IdPath) -> ReactorError {
    ReactorError::value(path.clone(), format!("Invalid {} value: {s:?}", ct.name()))
}

/// Parses `s` as a number of type `ct`. A string with a decimal point or
/// exponent headed for an integer type is parsed as a float and then
/// converted with `as`: truncated toward zero, saturated at the target's
/// bounds, NaN to zero.
fn parse_number_for_cast(s: &str, ct: CoreType, path: &IdPath) -> Result<Value, ReactorError> {
    let err = || number_error(s, ct, path);
    if ct.is_integer() && s.contains(['.', 'e', 'E']) {
        let f: f64 = s.parse().map_err(|_| err())?;
        return Ok(match ct {
            CoreType::Int32 => Value::Int32(f as i32),
            CoreType::Int64 => Value::Int64(f as i64),
            CoreType::Uint32 => Value::Uint32(f as u32),
            _ => Value::Uint64(f as u64),
        });
    }
    match ct {
        CoreType::Int32 => s.parse().map(Value::Int32).map_err(|_| err()),
        CoreType::Int64 => s.parse().map(Value::Int64).map_err(|_| err()),
        CoreType::Uint32 => s.parse().map(Value::Uint32).map_err(|_| err()),
        CoreType::Uint64 => s.parse().map(Value::Uint64).map_err(|_| err()),
        CoreType::Float32 => s.parse().map(Value::Float32).map_err(|_| err()),
        CoreType::Float64 => s.parse().map(Value::Float64).map_err(|_| err()),
        _ => unreachable!("{ct} is not numeric"),
    }
}

// Numeric sources convert with `as`: integers wrap to the target width,
// floats truncate toward zero and saturate at the target's bounds.
macro_rules! numeric_cast {
    ($fn_name:ident, $variant:ident, $ty:ty, $ct:expr) => {
        #[allow(clippy::unnecessary_cast)]
        fn $fn_name(v: &Value, call_type: &TypeRef, path: &IdPath) -> Result<Value, ReactorError> {
            let n = match v {
                Value::Int32(n) => *n as $ty,
                Value::Int64(n) => *n as $ty,
                Value::Uint32(n) => *n as $ty,
                Value::Uint64(n) => *n as $ty,
                Value::Float32(n) => *n as $ty,
                Value::Float64(n) => *n as $ty,
                Value::String(s) => return parse_number_for_cast(s, $ct, path),
                _ => return Err(type_cast_error(call_type, v, path)),
            };
            Ok(Value::$variant(n))
        }
    };
}

numeric_cast!(cast_int32, Int32, i32, CoreType::Int32);
numeric_cast!(cast_int64, Int64, i64, CoreType::Int64);
numeric_cast!(cast_uint32, Uint32, u32, CoreType::Uint32);
numeric_cast!(cast_uint64, Uint64, u64, CoreType::Uint64);
numeric_cast!(cast_float32, Float32, f32, CoreType::Float32);
numeric_cast!(cast_float64, Float64, f64, CoreType::Float64);

fn cast_timestamp(v: &Value, call_type: &TypeRef, path: &IdPath) -> Result<Value, ReactorError> {
    match v {
        Value::Timestamp(_) => Ok(v.clone()),
        Value::String(s) => OffsetDateTime::parse(s, &Rfc3339)
            .map(Value::Timestamp)
            .map_err(|e| ReactorError::value(path.clone(), format!("Invalid timestamp: {e}"))),
        _ => Err(type_cast_error(call_type, v, path)),
    }
}

fn cast_symbol_map(v: &Value, call_type: &TypeRef, path: &IdPath) -> Result<Value, ReactorError> {
    match v {
        Value::SymbolMap(_) => Ok(v.clone()),
        _ => Err(type_cast_error(call_type, v, path)),
    }
}

/// Casts `v` to the type named by `at`, ignoring any restriction.
/// `call_type` is the type reported as expected if the cast fails; it is
/// `at` itself, or the nullable or list slot `at` was reached through.
pub fn cast_atomic_unrestricted(
    v: &Value,
    at: &AtomicTypeRef,
    call_type: &TypeRef,
    path: &IdPath,
) -> Result<Value, ReactorError> {
    let core = at.core_type();
    if let Value::Null = v {
        return match core {
            Some(CoreType::Null) => Ok(Value::Null),
            _ => Err(ReactorError::null_value(path.clone())),
        };
    }
    match core {
        Some(CoreType::Value) => Ok(v.clone()),
        Some(CoreType::Boolean) => cast_boolean(v, call_type, path),
        Some(CoreType::Buffer) => cast_buffer(v, call_type, path),
        Some(CoreType::String) => cast_string(v, call_type, path),
        Some(CoreType::Int32) => cast_int32(v, call_type, path),
        Some(CoreType::Int64) => cast_int64(v, call_type, path),
        Some(CoreType::Uint32) => cast_uint32(v, call_type, path),
        Some(CoreType::Uint64) => cast_uint64(v, call_type, path),
        Some(CoreType::Float32) => cast_float32(v, call_type, path),
        Some(CoreType::Float64) => cast_float64(v, call_type, path),
        Some(CoreType::Timestamp) => cast_timestamp(v, call_type, path),
        Some(CoreType::SymbolMap) => cast_symbol_map(v, call_type, path),
        Some(CoreType::Null) | None => match v {
            Value::Enum(e) if e.type_name() == at.name() => Ok(v.clone()),
            _ => Err(type_cast_error(call_type, v, path)),
        },
    }
}

/// Fails with a value error unless `v` satisfies `at`'s restriction.
pub fn check_restriction(v: &Value, at: &AtomicTypeRef, path: &IdPath) -> Result<(), ReactorError> {
    match at.restriction() {
        Some(r) if !r.accepts_value(v) => Err(ReactorError::value(
            path.clone(),
            format!("Value {v} does not satisfy restriction {r}"),
        )),
        _ => Ok(()),
    }
}

/// Casts `v` to `at`, then checks `at`'s restriction against the result.
pub fn cast_atomic(
    v: &Value,
    at: &AtomicTypeRef,
    call_type: &TypeRef,
    path: &IdPath,
) -> Result<Value, ReactorError> {
    let res = cast_atomic_unrestricted(v, at, call_type, path)?;
    check_restriction(&res, at, path)?;
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use mingle_core::{
        EnumValue, Identifier, QualifiedTypeName, RangeRestriction, RegexRestriction, Restriction,
    };
    use mingle_testhelpers::test;
    use time::macros::datetime;

    fn cast(v: Value, ct: CoreType) -> Result<Value, ReactorError> {
        let at = AtomicTypeRef::new(ct.qname());
        cast_atomic(&v, &at, &TypeRef::core(ct), &IdPath::root())
    }

    #[test]
    fn numeric_casts_truncate_and_wrap() {
        assert_eq!(cast(Value::Float64(3.9), CoreType::Int32)?, Value::Int32(3));
        assert_eq!(cast(Value::Float64(-3.9), CoreType::Int32)?, Value::Int32(-3));
        assert_eq!(cast(Value::Uint64(u64::MAX), CoreType::Int32)?, Value::Int32(-1));
        assert_eq!(cast(Value::Int32(-1), CoreType::Uint32)?, Value::Uint32(u32::MAX));
        assert_eq!(cast(Value::Int32(7), CoreType::Float64)?, Value::Float64(7.0));
        assert_eq!(cast(Value::Int64(1 << 40), CoreType::Int32)?, Value::Int32(0));
    }

    #[test]
    fn float_to_integer_saturates() {
        assert_eq!(cast(Value::from("1e20"), CoreType::Int32)?, Value::Int32(i32::MAX));
        assert_eq!(cast(Value::from("-1e20"), CoreType::Int32)?, Value::Int32(i32::MIN));
        assert_eq!(cast(Value::from("-5.5"), CoreType::Uint32)?, Value::Uint32(0));
        assert_eq!(cast(Value::Float64(1e300), CoreType::Uint64)?, Value::Uint64(u64::MAX));
        assert_eq!(cast(Value::Float64(f64::NAN), CoreType::Int64)?, Value::Int64(0));
        assert_eq!(cast(Value::Float32(f32::INFINITY), CoreType::Int32)?, Value::Int32(i32::MAX));
    }

    #[test]
    fn numeric_strings_parse_per_target() {
        assert_eq!(cast(Value::from("12"), CoreType::Int64)?, Value::Int64(12));
        assert_eq!(cast(Value::from("1.5e1"), CoreType::Int32)?, Value::Int32(15));
        assert_eq!(cast(Value::from("-2.7"), CoreType::Int64)?, Value::Int64(-2));
        assert_eq!(cast(Value::from("2.5"), CoreType::Float32)?, Value::Float32(2.5));

        let err = cast(Value::from("abc"), CoreType::Uint32).expect_err("not a number");
        assert!(err.is_value());
        assert_eq!(err.message(), "Invalid Uint32 value: \"abc\"");

        let err = cast(Value::from("-1"), CoreType::Uint64).expect_err("negative unsigned");
        assert!(err.is_value());
    }

    #[test]
    fn booleans_from_strings_ignore_case() {
        assert_eq!(cast(Value::from("TRUE"), CoreType::Boolean)?, Value::Boolean(true));
        assert_eq!(cast(Value::from("False"), CoreType::Boolean)?, Value::Boolean(false));
        let err = cast(Value::from("yes"), CoreType::Boolean).expect_err("not a boolean");
        assert_eq!(err.message(), "Invalid boolean value: \"yes\"");
        let err = cast(Value::Int32(1), CoreType::Boolean).expect_err("ints are not booleans");
        assert!(err.is_type_cast());
    }

    #[test]
    fn buffers_and_base64() {
        assert_eq!(
            cast(Value::from("AAEC"), CoreType::Buffer)?,
            Value::Buffer(vec![0, 1, 2])
        );
        assert_eq!(
            cast(Value::Buffer(vec![0, 1, 2]), CoreType::String)?,
            Value::from("AAEC")
        );
        let err = cast(Value::from("not base64!"), CoreType::Buffer).expect_err("bad base64");
        assert!(err.is_value());
    }

    #[test]
    fn strings_from_everything_textual() {
        assert_eq!(cast(Value::Boolean(true), CoreType::String)?, Value::from("true"));
        assert_eq!(cast(Value::Float64(1.5), CoreType::String)?, Value::from("1.5"));
        assert_eq!(cast(Value::Uint64(u64::MAX), CoreType::String)?, Value::from("18446744073709551615"));
        assert_eq!(
            cast(Value::from(datetime!(2012-01-02 03:04:05.123 UTC)), CoreType::String)?,
            Value::from("2012-01-02T03:04:05.123Z")
        );
        let e = EnumValue::new(QualifiedTypeName::parse("ns1@v1/Color")?, Identifier::new("red")?);
        assert_eq!(cast(Value::from(e), CoreType::String)?, Value::from("red"));
    }

    #[test]
    fn timestamps_parse_rfc3339() {
        assert_eq!(
            cast(Value::from("2012-01-02T03:04:05Z"), CoreType::Timestamp)?,
            Value::from(datetime!(2012-01-02 03:04:05 UTC))
        );
        let err = cast(Value::from("yesterday"), CoreType::Timestamp).expect_err("bad timestamp");
        assert!(err.is_value());
        let err = cast(Value::Int32(1), CoreType::Timestamp).expect_err("wrong type");
        assert!(err.is_type_cast());
    }

    #[test]
    fn nulls_only_cast_to_null() {
        assert_eq!(cast(Value::Null, CoreType::Null)?, Value::Null);
        let err = cast(Value::Null, CoreType::String).expect_err("null string");
        assert_eq!(err.message(), "Value is null");
    }

    #[test]
    fn enums_need_their_own_type() {
        let color = QualifiedTypeName::parse("ns1@v1/Color")?;
        let shape = QualifiedTypeName::parse("ns1@v1/Shape")?;
        let red = Value::from(EnumValue::new(color.clone(), Identifier::new("red")?));
        let path = IdPath::root();

        let at = AtomicTypeRef::new(color);
        assert_eq!(cast_atomic(&red, &at, &TypeRef::Atomic(at.clone()), &path)?, red);

        let at = AtomicTypeRef::new(shape);
        let err = cast_atomic(&red, &at, &TypeRef::Atomic(at.clone()), &path).expect_err("wrong enum");
        assert!(err.is_type_cast());

        let err = cast_atomic(&Value::from("red"), &at, &TypeRef::Atomic(at.clone()), &path)
            .expect_err("strings are not enums");
        assert!(err.is_type_cast());
    }

    #[test]
    fn restrictions_apply_after_the_cast() {
        let re = Restriction::Regex(RegexRestriction::new("^a+$")?);
        let at = AtomicTypeRef::restricted(CoreType::String.qname(), re);
        let call = TypeRef::Atomic(at.clone());
        let path = IdPath::root();

        assert_eq!(cast_atomic(&Value::from("aaaa"), &at, &call, &path)?, Value::from("aaaa"));
        let err = cast_atomic(&Value::from("zzzz"), &at, &call, &path).expect_err("restricted");
        assert_eq!(
            err.message(),
            "Value \"zzzz\" does not satisfy restriction \"^a+$\""
        );

        let range = Restriction::Range(RangeRestriction::new(
            Some(Value::Int32(0)),
            true,
            Some(Value::Int32(10)),
            true,
        ));
        let at = AtomicTypeRef::restricted(CoreType::Int32.qname(), range);
        let call = TypeRef::Atomic(at.clone());
        assert_eq!(cast_atomic(&Value::from("7"), &at, &call, &path)?, Value::Int32(7));
        let err = cast_atomic(&Value::Int64(11), &at, &call, &path).expect_err("out of range");
        assert!(err.is_value());
    }
}
