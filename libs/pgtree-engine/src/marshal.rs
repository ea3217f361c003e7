use pgtree_api::arena::Arena;
use pgtree_api::result::{DecodeMode, ResultSet};
use pgtree_api::value::Value;

use crate::error::EngineError;
use crate::registry::{TypeEntry, TypeRegistry};

/// Turns a `ResultSet` into
/// `{ fields: { <name>: {...} }, rows: [ { <name>: value } ] }`.
///
/// Column types are resolved once, before the row loop. The first failing
/// cell aborts the call; no partial tree is returned.
///
/// Columns sharing a name (`SELECT 1, 2` yields two `?column?`) map to one
/// key at the position of the first such column, holding the last column's
/// value and description.
#[derive(Debug, Clone, Copy)]
pub struct ResultMarshaler<'r> {
    registry: &'r TypeRegistry,
}

/// The two halves of a marshaled result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marshaled<'a> {
    pub fields: Value<'a>,
    pub rows: Value<'a>,
}

impl<'r> ResultMarshaler<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    pub fn marshal<'a>(
        &self,
        arena: &'a Arena,
        result: &ResultSet<'_>,
        mode: DecodeMode,
    ) -> Result<Value<'a>, EngineError> {
        let Marshaled { fields, rows } = self.marshal_parts(arena, result, mode)?;
        Ok(arena.object([("fields", fields), ("rows", rows)]))
    }

    pub fn marshal_parts<'a>(
        &self,
        arena: &'a Arena,
        result: &ResultSet<'_>,
        mode: DecodeMode,
    ) -> Result<Marshaled<'a>, EngineError> {
        let columns = result.columns();

        // Output keys: one per distinct column name, at its first position.
        let mut names = arena.vec();
        let mut resolved = arena.vec();
        for column in columns {
            let entry: TypeEntry = *self.registry.lookup(column.type_id);
            tracing::trace!(
                column = %column.name,
                type_id = column.type_id,
                wire_type = entry.wire_name,
                "column type resolved"
            );
            let slot = match names.iter().position(|name: &&str| *name == column.name) {
                Some(slot) => slot,
                None => {
                    names.push(arena.alloc_str(&column.name));
                    names.len() - 1
                }
            };
            resolved.push((slot, entry));
        }
        let names: &'a [&'a str] = names.into_bump_slice();
        let resolved = resolved.into_bump_slice();
        if names.len() < columns.len() {
            tracing::debug!(
                columns = columns.len(),
                keys = names.len(),
                "duplicate column names collapsed, last column wins"
            );
        }

        let mut described = arena.vec();
        described.extend(names.iter().map(|_| Value::Null));
        for &(slot, entry) in resolved {
            described[slot] = arena.object([
                ("fieldName", Value::Text(names[slot])),
                ("wireTypeName", Value::Text(entry.wire_name)),
                ("canonicalTypeName", Value::Text(entry.canonical_name)),
                ("isArrayType", Value::Bool(entry.is_array_type)),
            ]);
        }
        let fields = arena.object(names.iter().copied().zip(described.iter().copied()));

        let mut rows = arena.vec();
        for (row_index, row) in result.rows().iter().enumerate() {
            let mut cells = arena.vec();
            cells.extend(names.iter().map(|&name| (name, Value::Null)));
            for ((cell, &(slot, entry)), column) in row.iter().zip(resolved).zip(columns) {
                let value = if cell.is_null {
                    Value::Null
                } else {
                    entry
                        .decode(arena, cell.bytes, mode)
                        .map_err(|source| EngineError::Decode {
                            row: row_index,
                            column: column.name.clone(),
                            type_id: column.type_id,
                            wire_type: entry.wire_name,
                            source,
                        })?
                };
                cells[slot].1 = value;
            }
            rows.push(Value::Object(cells.into_bump_slice()));
        }

        tracing::debug!(
            columns = columns.len(),
            rows = result.row_count(),
            %mode,
            nodes = arena.nodes(),
            "result marshaled"
        );
        Ok(Marshaled {
            fields,
            rows: Value::Array(rows.into_bump_slice()),
        })
    }
}

#[cfg(test)]
mod tests {
    use pgtree_api::error::ErrorKind;
    use pgtree_api::result::{ColumnDescriptor, RawCell};

    use super::*;

    fn single_column<'r>(type_id: u32, cells: &[Option<&'r str>]) -> ResultSet<'r> {
        ResultSet::new(
            vec![ColumnDescriptor::new("c", type_id)],
            cells
                .iter()
                .map(|cell| vec![cell.map_or_else(RawCell::null, RawCell::text)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn fields_describe_resolved_types() {
        let registry = TypeRegistry::builtin();
        let arena = Arena::new();
        let result = single_column(1009, &[]);
        let tree = ResultMarshaler::new(&registry)
            .marshal(&arena, &result, DecodeMode::Text)
            .unwrap();

        let field = tree.get("fields").and_then(|f| f.get("c")).unwrap();
        assert_eq!(field.get("fieldName"), Some(Value::Text("c")));
        assert_eq!(field.get("wireTypeName"), Some(Value::Text("_text")));
        assert_eq!(field.get("canonicalTypeName"), Some(Value::Text("TextArray")));
        assert_eq!(field.get("isArrayType"), Some(Value::Bool(true)));
        assert_eq!(tree.get("rows"), Some(Value::Array(&[])));
    }

    #[test]
    fn unknown_types_pass_through_as_text() {
        let registry = TypeRegistry::builtin();
        let arena = Arena::new();
        let result = single_column(650, &[Some("10.0.0.0/8")]);
        let tree = ResultMarshaler::new(&registry)
            .marshal(&arena, &result, DecodeMode::Text)
            .unwrap();

        let rows = tree.get("rows").unwrap();
        assert_eq!(rows.at(0).and_then(|r| r.get("c")), Some(Value::Text("10.0.0.0/8")));
        let field = tree.get("fields").and_then(|f| f.get("c")).unwrap();
        assert_eq!(field.get("wireTypeName"), Some(Value::Text("passthru")));
    }

    #[test]
    fn first_bad_cell_aborts() {
        let registry = TypeRegistry::builtin();
        let arena = Arena::new();
        let result = single_column(16, &[Some("t"), None, Some("maybe")]);
        let err = ResultMarshaler::new(&registry)
            .marshal(&arena, &result, DecodeMode::Text)
            .unwrap_err();

        match err {
            EngineError::Decode {
                row,
                column,
                type_id,
                wire_type,
                source,
            } => {
                assert_eq!(row, 2);
                assert_eq!(column, "c");
                assert_eq!(type_id, 16);
                assert_eq!(wire_type, "bool");
                assert_eq!(source.kind(), ErrorKind::InvalidLiteral);
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
