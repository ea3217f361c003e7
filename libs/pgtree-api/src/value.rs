use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Dynamic value tree produced by marshaling.
///
/// Every variant is either a scalar or a reference into the `Arena` the value
/// was built in, so values are `Copy` and never outlive their arena.
///
/// - Integers keep the width of the wire type; `int8` decodes to `BigInt`.
/// - `Date` is milliseconds since the Unix epoch, UTC.
/// - `Object` keeps insertion order (column order for rows).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    BigInt(i64),
    BigUint(u64),
    Float32(f32),
    Float64(f64),
    Text(&'a str),
    Binary(&'a [u8]),
    Date(i64),
    Array(&'a [Value<'a>]),
    Object(&'a [(&'a str, Value<'a>)]),
}

impl<'a> Value<'a> {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Field lookup on an `Object`. Duplicate names resolve to the last field,
    /// as a JSON reader would.
    pub fn get(&self, name: &str) -> Option<Value<'a>> {
        match self {
            Value::Object(fields) => fields
                .iter()
                .rev()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| *v),
            _ => None,
        }
    }

    /// Element lookup on an `Array`.
    pub fn at(&self, index: usize) -> Option<Value<'a>> {
        match self {
            Value::Array(items) => items.get(index).copied(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&'a [Value<'a>]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&'a [(&'a str, Value<'a>)]> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Any signed integer variant, widened.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int16(v) => Some(i64::from(*v)),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) | Value::BigInt(v) => Some(*v),
            Value::BigUint(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(v) => Some(f64::from(*v)),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Variant name, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::BigInt(_) => "bigint",
            Value::BigUint(_) => "biguint",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::Text(_) => "text",
            Value::Binary(_) => "binary",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

/// Lowercase hex rendering of a byte slice.
pub struct Hex<'b>(pub &'b [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Host-agnostic serialization: binary as lowercase hex, dates as epoch millis,
/// objects as maps in field order.
impl Serialize for Value<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int16(v) => serializer.serialize_i16(*v),
            Value::Int32(v) => serializer.serialize_i32(*v),
            Value::Int64(v) | Value::BigInt(v) | Value::Date(v) => serializer.serialize_i64(*v),
            Value::BigUint(v) => serializer.serialize_u64(*v),
            Value::Float32(v) => serializer.serialize_f32(*v),
            Value::Float64(v) => serializer.serialize_f64(*v),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Binary(bytes) => serializer.collect_str(&Hex(bytes)),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in *items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, value) in *fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase() {
        assert_eq!(Hex(&[0x48, 0x65, 0x6c, 0x6c, 0x6f]).to_string(), "48656c6c6f");
        assert_eq!(Hex(&[0x00, 0xAB, 0xff]).to_string(), "00abff");
        assert_eq!(Hex(&[]).to_string(), "");
    }

    #[test]
    fn serializes_in_field_order() {
        let tags = [Value::Text("x"), Value::Null];
        let fields = [
            ("z", Value::BigInt(9_007_199_254_740_993)),
            ("a", Value::Binary(&[0xde, 0xad])),
            ("m", Value::Array(&tags)),
        ];
        let json = serde_json::to_string(&Value::Object(&fields)).unwrap();
        assert_eq!(json, r#"{"z":9007199254740993,"a":"dead","m":["x",null]}"#);
    }

    #[test]
    fn accessors_match_variants() {
        let fields = [("n", Value::Int16(-3)), ("n", Value::Int16(4))];
        let row = Value::Object(&fields);
        assert_eq!(row.get("n").and_then(|v| v.as_i64()), Some(4));
        assert_eq!(row.get("missing"), None);
        assert_eq!(Value::Float32(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::BigUint(u64::MAX).as_i64(), None);
        assert_eq!(Value::Date(0).kind_name(), "date");
        assert!(Value::Null.is_null());
    }
}
