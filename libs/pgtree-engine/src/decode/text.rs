//! Text wire mode: cells are the server's textual literals.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime};
use pgtree_api::arena::Arena;
use pgtree_api::error::DecodeError;
use pgtree_api::value::Value;

use super::{DecodeFn, json_document, utf8};
use crate::array::ArrayTextParser;
use crate::buffer::decode_hex_into;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub fn passthru<'a>(arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    Ok(Value::Text(arena.alloc_str(utf8(bytes)?)))
}

pub fn boolean<'a>(_arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    match utf8(bytes)? {
        "t" | "true" => Ok(Value::Bool(true)),
        "f" | "false" => Ok(Value::Bool(false)),
        other => Err(DecodeError::invalid_literal(format!(
            "invalid boolean literal {other:?}"
        ))),
    }
}

/// `\x` hex form, or the legacy escape form (`\\` and `\ooo` octal).
pub fn bytea<'a>(arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    if let Some(hex) = bytes.strip_prefix(b"\\x") {
        let out = arena.alloc_zeroed(hex.len() / 2);
        decode_hex_into(hex, out);
        return Ok(Value::Binary(out));
    }

    let mut out = arena.vec();
    let mut rest = bytes;
    while let Some((&byte, tail)) = rest.split_first() {
        if byte != b'\\' {
            out.push(byte);
            rest = tail;
            continue;
        }
        match tail {
            [b'\\', tail @ ..] => {
                out.push(b'\\');
                rest = tail;
            }
            [a @ b'0'..=b'3', b @ b'0'..=b'7', c @ b'0'..=b'7', tail @ ..] => {
                out.push((a - b'0') << 6 | (b - b'0') << 3 | (c - b'0'));
                rest = tail;
            }
            _ => {
                return Err(DecodeError::invalid_literal(
                    "invalid escape sequence in bytea literal",
                ));
            }
        }
    }
    Ok(Value::Binary(out.into_bump_slice()))
}

fn number<T>(bytes: &[u8], wire: &str) -> Result<T, DecodeError>
where
    T: FromStr,
    T::Err: Display,
{
    let text = utf8(bytes)?;
    text.parse()
        .map_err(|e| DecodeError::invalid_literal(format!("invalid {wire} literal {text:?}: {e}")))
}

pub fn float4<'a>(_arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    number(bytes, "float4").map(Value::Float32)
}

pub fn float8<'a>(_arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    number(bytes, "float8").map(Value::Float64)
}

pub fn int2<'a>(_arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    number(bytes, "int2").map(Value::Int16)
}

pub fn int4<'a>(_arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    number(bytes, "int4").map(Value::Int32)
}

pub fn int8<'a>(_arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    number(bytes, "int8").map(Value::BigInt)
}

/// Space-separated `int2` list, e.g. `"1 2 3"`.
pub fn int2vector<'a>(arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    let mut items = arena.vec();
    for word in utf8(bytes)?.split_ascii_whitespace() {
        items.push(int2(arena, word.as_bytes())?);
    }
    Ok(Value::Array(items.into_bump_slice()))
}

pub fn json<'a>(arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    json_document(arena, bytes)
}

/// Timestamp without time zone, read as UTC.
pub fn timestamp<'a>(_arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
    let text = utf8(bytes)?;
    match text {
        "infinity" => return Ok(Value::Date(i64::MAX)),
        "-infinity" => return Ok(Value::Date(i64::MIN)),
        _ => {}
    }
    let parsed = match text.strip_suffix(" BC") {
        None => NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).map_err(|e| {
            DecodeError::invalid_literal(format!("invalid timestamp literal {text:?}: {e}"))
        })?,
        Some(era) => before_christ(era).ok_or_else(|| {
            DecodeError::invalid_literal(format!("invalid timestamp literal {text:?}"))
        })?,
    };
    Ok(Value::Date(parsed.and_utc().timestamp_millis()))
}

/// `YYYY-MM-DD ...` counted backwards from 1 BC, which is astronomical year 0.
///
/// The calendar part is parsed against a leap year so that leap days of
/// BC years survive until the real year is applied.
fn before_christ(era: &str) -> Option<NaiveDateTime> {
    let (year, rest) = era.split_once('-')?;
    let year: i32 = year.parse().ok().filter(|year| *year >= 1)?;
    NaiveDateTime::parse_from_str(&format!("2000-{rest}"), TIMESTAMP_FORMAT)
        .ok()?
        .with_year(1 - year)
}

/// Split an array literal and decode each element with `element`.
fn array_of<'a>(
    arena: &'a Arena,
    bytes: &[u8],
    element: DecodeFn,
) -> Result<Value<'a>, DecodeError> {
    let elements = ArrayTextParser::parse_elements(arena, utf8(bytes)?)?;
    let mut items = arena.vec();
    for (index, item) in elements.iter().enumerate() {
        if item.is_null() {
            items.push(Value::Null);
        } else {
            let value = element(arena, item.text.as_bytes())
                .map_err(|e| e.with_context(format!("element {index}")))?;
            items.push(value);
        }
    }
    Ok(Value::Array(items.into_bump_slice()))
}

macro_rules! array_decoders {
    ($($name:ident => $element:ident),* $(,)?) => {
        $(
            pub fn $name<'a>(arena: &'a Arena, bytes: &[u8]) -> Result<Value<'a>, DecodeError> {
                array_of(arena, bytes, $element)
            }
        )*
    };
}

array_decoders! {
    bool_array => boolean,
    bytea_array => bytea,
    float4_array => float4,
    float8_array => float8,
    int2_array => int2,
    int4_array => int4,
    int8_array => int8,
    json_array => json,
    text_array => passthru,
    timestamp_array => timestamp,
}
