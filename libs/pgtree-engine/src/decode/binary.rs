//! Binary wire mode: fixed-width numbers in network order, raw bytes otherwise.

use pgtree_api::arena::Arena;
use pgtree_api::error::DecodeError;
use pgtree_api::value::Value;

use super::{json_document, utf8};
use crate::buffer::{BufferView, ByteOrder, Word};

/// Read a cell that must hold exactly one `W`.
fn word<W: Word>(bytes: &[u8]) -> Result<W, DecodeError> {
    if bytes.len() > W::WIDTH {
        return Err(DecodeError::invalid_literal(format!(
            "expected {} bytes, got {}",
            W::WIDTH,
            bytes.len()
        )));
    }
    BufferView::new(bytes).get(0, ByteOrder::Network)
}

pub fn passthru<'a>(arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    Ok(Value::Binary(arena.alloc_bytes(bytes)))
}

pub fn boolean<'a>(_arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    if bytes.len() > 1 {
        return Err(DecodeError::invalid_literal(format!(
            "expected 1 bytes, got {}",
            bytes.len()
        )));
    }
    BufferView::new(bytes).get_u8(0).map(|b| Value::Bool(b != 0))
}

pub fn bytea<'a>(arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    passthru(arena, bytes)
}

pub fn float4<'a>(_arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    word::<u32>(bytes).map(|bits| Value::Float32(f32::from_bits(bits)))
}

pub fn float8<'a>(_arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    word::<u64>(bytes).map(|bits| Value::Float64(f64::from_bits(bits)))
}

pub fn int2<'a>(_arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    word(bytes).map(Value::Int16)
}

pub fn int4<'a>(_arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    word(bytes).map(Value::Int32)
}

pub fn int8<'a>(_arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    word(bytes).map(Value::BigInt)
}

pub fn text<'a>(arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    Ok(Value::Text(arena.alloc_str(utf8(bytes)?)))
}

pub fn json<'a>(arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    json_document(arena, bytes)
}

/// Types whose binary layout is not decoded: timestamps, `int2vector` and
/// every array type.
pub fn unsupported<'a>(_arena: &'a Arena, _bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    Err(DecodeError::unsupported_mode(
        "binary decoding is not implemented for this type",
    ))
}

#[cfg(test)]
mod tests {
    use pgtree_api::error::ErrorKind;

    use super::*;

    #[test]
    fn integers_are_network_order() {
        let arena = Arena::new();
        assert_eq!(int4(&arena, &[0, 0, 0, 123]).unwrap(), Value::Int32(123));
        assert_eq!(int2(&arena, &[0xff, 0xfe]).unwrap(), Value::Int16(-2));
        assert_eq!(
            int8(&arena, &[0, 0, 0, 0, 0, 0, 0x01, 0x00]).unwrap(),
            Value::BigInt(256)
        );
    }

    #[test]
    fn cell_width_must_match() {
        let arena = Arena::new();
        assert_eq!(int4(&arena, &[0, 123]).unwrap_err().kind(), ErrorKind::Bounds);
        assert_eq!(
            int2(&arena, &[0, 0, 1]).unwrap_err().kind(),
            ErrorKind::InvalidLiteral
        );
        assert_eq!(boolean(&arena, &[]).unwrap_err().kind(), ErrorKind::Bounds);
        assert_eq!(
            boolean(&arena, &[0, 0, 0, 1]).unwrap_err().kind(),
            ErrorKind::InvalidLiteral
        );
        assert_eq!(boolean(&arena, &[1]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn floats_reinterpret_bits() {
        let arena = Arena::new();
        assert_eq!(
            float4(&arena, &1.5f32.to_be_bytes()).unwrap(),
            Value::Float32(1.5)
        );
        assert_eq!(
            float8(&arena, &(-0.25f64).to_be_bytes()).unwrap(),
            Value::Float64(-0.25)
        );
    }

    #[test]
    fn raw_and_text_payloads() {
        let arena = Arena::new();
        assert_eq!(boolean(&arena, &[1]).unwrap(), Value::Bool(true));
        assert_eq!(boolean(&arena, &[0]).unwrap(), Value::Bool(false));
        assert_eq!(bytea(&arena, &[0xde, 0xad]).unwrap(), Value::Binary(&[0xde, 0xad]));
        assert_eq!(text(&arena, b"abc").unwrap(), Value::Text("abc"));
        assert_eq!(json(&arena, b"[true]").unwrap().at(0), Some(Value::Bool(true)));
    }

    #[test]
    fn unimplemented_layouts_are_reported() {
        let arena = Arena::new();
        let err = unsupported(&arena, &[0; 8]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedMode);
    }
}
