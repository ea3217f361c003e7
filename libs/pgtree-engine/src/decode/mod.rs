//! Per-type cell decoders for both wire modes.
//!
//! Each decoder reads one non-null cell and builds its value in the arena.
//! Null cells never reach a decoder.

pub mod binary;
pub mod text;

use pgtree_api::arena::Arena;
use pgtree_api::error::DecodeError;
use pgtree_api::value::Value;

/// Decoder for one cell of one type in one wire mode.
pub type DecodeFn = for<'a> fn(&'a Arena, &[u8]) -> Result<Value<'a>, DecodeError>;

fn utf8(bytes: &[u8]) -> Result<&str, DecodeError> {
    Ok(std::str::from_utf8(bytes)?)
}

/// JSON document into the value tree; key order is kept.
fn json_document<'a>(arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    let document: serde_json::Value = serde_json::from_slice(bytes)?;
    Ok(json_value(arena, &document))
}

fn json_value<'a>(arena: &'a Arena, value: &serde_json::Value) -> Value<'a> {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Value::Int64(v)
            } else if let Some(v) = n.as_u64() {
                Value::BigUint(v)
            } else {
                Value::Float64(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::Text(arena.alloc_str(s)),
        serde_json::Value::Array(items) => {
            arena.array(items.iter().map(|item| json_value(arena, item)))
        }
        serde_json::Value::Object(fields) => arena.object(
            fields
                .iter()
                .map(|(name, field)| (arena.alloc_str(name), json_value(arena, field))),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_keeps_key_order_and_number_kinds() {
        let arena = Arena::new();
        let value =
            json_document(&arena, br#"{"z":1,"a":[1.5,18446744073709551615,-2],"m":null}"#)
                .unwrap();

        let names: Vec<&str> = value.as_object().unwrap().iter().map(|(k, _)| *k).collect();
        assert_eq!(names, ["z", "a", "m"]);

        let a = value.get("a").unwrap();
        assert_eq!(a.at(0), Some(Value::Float64(1.5)));
        assert_eq!(a.at(1), Some(Value::BigUint(u64::MAX)));
        assert_eq!(a.at(2), Some(Value::Int64(-2)));
        assert_eq!(value.get("m"), Some(Value::Null));
    }

    #[test]
    fn malformed_json_is_an_invalid_literal() {
        let arena = Arena::new();
        let err = json_document(&arena, b"{\"a\":").unwrap_err();
        assert_eq!(err.kind(), pgtree_api::error::ErrorKind::InvalidLiteral);
    }
}
