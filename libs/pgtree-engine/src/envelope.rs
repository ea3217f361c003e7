//! Status envelope around a marshaled query result.

use pgtree_api::arena::Arena;
use pgtree_api::result::{DecodeMode, ResultSet};
use pgtree_api::value::Value;
use serde::Deserialize;

use crate::error::EngineError;
use crate::marshal::{Marshaled, ResultMarshaler};

pub const EMPTY_RESULT_MESSAGE: &str = "Empty Result";
pub const OK_MESSAGE: &str = "ok";

/// What the server answered to one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome<'r> {
    /// Rows were returned.
    Tuples(ResultSet<'r>),
    /// A command completed without returning rows.
    Command,
    /// The server reported an error.
    Failed(String),
}

/// Identity of the database server, echoed in every envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerInfo {
    pub dbms_name: String,
    pub dbms_version: u32,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            dbms_name: "postgres".to_string(),
            dbms_version: 12,
        }
    }
}

/// Build `{ ok, message, dbmsName, dbmsVersion, fields?, rows? }`.
///
/// `fields` and `rows` are present only for `Tuples`. A marshaling failure is
/// returned as `Err`, never as an envelope with `ok = false`.
pub fn envelope<'a>(
    arena: &'a Arena,
    marshaler: &ResultMarshaler<'_>,
    server: &ServerInfo,
    outcome: &QueryOutcome<'_>,
    mode: DecodeMode,
) -> Result<Value<'a>, EngineError> {
    let dbms_name = Value::Text(arena.alloc_str(&server.dbms_name));
    let dbms_version = Value::Int64(i64::from(server.dbms_version));

    let value = match outcome {
        QueryOutcome::Tuples(result) => {
            let Marshaled { fields, rows } = marshaler.marshal_parts(arena, result, mode)?;
            arena.object([
                ("ok", Value::Bool(true)),
                ("message", Value::Text(OK_MESSAGE)),
                ("dbmsName", dbms_name),
                ("dbmsVersion", dbms_version),
                ("fields", fields),
                ("rows", rows),
            ])
        }
        QueryOutcome::Command => arena.object([
            ("ok", Value::Bool(true)),
            ("message", Value::Text(EMPTY_RESULT_MESSAGE)),
            ("dbmsName", dbms_name),
            ("dbmsVersion", dbms_version),
        ]),
        QueryOutcome::Failed(message) => {
            tracing::debug!(%message, "query failed on server");
            arena.object([
                ("ok", Value::Bool(false)),
                ("message", Value::Text(arena.alloc_str(message))),
                ("dbmsName", dbms_name),
                ("dbmsVersion", dbms_version),
            ])
        }
    };
    Ok(value)
}
