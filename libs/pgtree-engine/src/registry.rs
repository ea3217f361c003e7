//! Type id → decoder table.
//!
//! A `TypeRegistry` is assembled once through `TypeRegistryBuilder` and is
//! immutable afterwards, so one instance can be shared by reference across
//! threads. Lookups by id never fail: unknown ids resolve to the passthru
//! entry, which keeps the cell as opaque text.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use pgtree_api::arena::Arena;
use pgtree_api::error::DecodeError;
use pgtree_api::result::DecodeMode;
use pgtree_api::value::Value;

use crate::decode::{DecodeFn, binary, text};
use crate::error::EngineError;

pub const PASSTHRU_TYPE_ID: u32 = 0;

/// Decoders and names for one type id.
#[derive(Clone, Copy)]
pub struct TypeEntry {
    pub type_id: u32,
    /// Name the server uses for the type (`int4`, `_text`, ...).
    pub wire_name: &'static str,
    /// Host-agnostic name (`Int32`, `TextArray`, ...).
    pub canonical_name: &'static str,
    pub is_array_type: bool,
    pub decode_text: DecodeFn,
    pub decode_binary: DecodeFn,
}

impl TypeEntry {
    /// Decode one non-null cell. Errors carry the wire type name.
    pub fn decode<'a>(
        &self,
        arena: &'a Arena,
        bytes: &[u8],
        mode: DecodeMode,
    ) -> Result<Value<'a>, DecodeError> {
        let decode = match mode {
            DecodeMode::Text => self.decode_text,
            DecodeMode::Binary => self.decode_binary,
        };
        decode(arena, bytes).map_err(|e| e.with_context(self.wire_name))
    }
}

impl fmt::Debug for TypeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeEntry")
            .field("type_id", &self.type_id)
            .field("wire_name", &self.wire_name)
            .field("canonical_name", &self.canonical_name)
            .field("is_array_type", &self.is_array_type)
            .finish_non_exhaustive()
    }
}

const fn scalar(
    type_id: u32,
    wire_name: &'static str,
    canonical_name: &'static str,
    decode_text: DecodeFn,
    decode_binary: DecodeFn,
) -> TypeEntry {
    TypeEntry {
        type_id,
        wire_name,
        canonical_name,
        is_array_type: false,
        decode_text,
        decode_binary,
    }
}

const fn array(
    type_id: u32,
    wire_name: &'static str,
    canonical_name: &'static str,
    decode_text: DecodeFn,
) -> TypeEntry {
    TypeEntry {
        type_id,
        wire_name,
        canonical_name,
        is_array_type: true,
        decode_text,
        decode_binary: binary::unsupported,
    }
}

const PASSTHRU: TypeEntry = scalar(
    PASSTHRU_TYPE_ID,
    "passthru",
    "Text",
    text::passthru,
    binary::passthru,
);

/// Built-in types, in registration order.
const BUILTIN: [TypeEntry; 25] = [
    PASSTHRU,
    scalar(16, "bool", "Boolean", text::boolean, binary::boolean),
    scalar(17, "bytea", "Binary", text::bytea, binary::bytea),
    scalar(700, "float4", "Float32", text::float4, binary::float4),
    scalar(701, "float8", "Float64", text::float8, binary::float8),
    scalar(21, "int2", "Int16", text::int2, binary::int2),
    scalar(22, "int2vector", "Int16Array", text::int2vector, binary::unsupported),
    scalar(23, "int4", "Int32", text::int4, binary::int4),
    scalar(20, "int8", "Int64", text::int8, binary::int8),
    scalar(114, "json", "Json", text::json, binary::json),
    scalar(19, "text", "Text", text::passthru, binary::text),
    scalar(25, "text", "Text", text::passthru, binary::text),
    scalar(1114, "timestamp", "TimeStamp", text::timestamp, binary::unsupported),
    scalar(1043, "varchar", "Varchar", text::passthru, binary::text),
    array(1000, "_bool", "BooleanArray", text::bool_array),
    array(1001, "_bytea", "BinaryArray", text::bytea_array),
    array(1021, "_float4", "Float32Array", text::float4_array),
    array(1022, "_float8", "Float64Array", text::float8_array),
    array(1005, "_int2", "Int16Array", text::int2_array),
    array(1007, "_int4", "Int32Array", text::int4_array),
    array(1016, "_int8", "Int64Array", text::int8_array),
    array(199, "_json", "JsonArray", text::json_array),
    array(1009, "_text", "TextArray", text::text_array),
    array(1115, "_timestamp", "TimeStampArray", text::timestamp_array),
    array(1015, "_varchar", "VarcharArray", text::text_array),
];

/// Mutable staging area for a `TypeRegistry`.
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    entries: BTreeMap<u32, TypeEntry>,
    /// Ids in first-registration order; overwriting keeps the position.
    order: Vec<u32>,
}

impl TypeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut builder = Self::new();
        for entry in BUILTIN {
            builder.register(entry);
        }
        builder
    }

    /// Insert by `type_id`. An existing entry is replaced and returned.
    pub fn register(&mut self, entry: TypeEntry) -> Option<TypeEntry> {
        let previous = self.entries.insert(entry.type_id, entry);
        if previous.is_none() {
            self.order.push(entry.type_id);
        }
        previous
    }

    /// Insert by `type_id`, refusing to replace an existing entry.
    pub fn register_strict(&mut self, entry: TypeEntry) -> Result<(), EngineError> {
        if self.entries.contains_key(&entry.type_id) {
            return Err(EngineError::DuplicateType(entry.type_id));
        }
        self.register(entry);
        Ok(())
    }

    /// Register `type_id` as another id for the type named `wire_name`.
    ///
    /// The new entry shares names and decoders with the first registered
    /// entry of that wire name.
    pub fn alias_entry(&self, type_id: u32, wire_name: &str) -> Result<TypeEntry, EngineError> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .find(|entry| entry.wire_name == wire_name)
            .map(|entry| TypeEntry { type_id, ..*entry })
            .ok_or_else(|| EngineError::UnknownAlias {
                type_id,
                wire_name: wire_name.to_string(),
            })
    }

    pub fn alias(&mut self, type_id: u32, wire_name: &str) -> Result<Option<TypeEntry>, EngineError> {
        let entry = self.alias_entry(type_id, wire_name)?;
        Ok(self.register(entry))
    }

    pub fn build(mut self) -> TypeRegistry {
        if !self.entries.contains_key(&PASSTHRU_TYPE_ID) {
            self.register(PASSTHRU);
        }
        let passthru = self.entries.get(&PASSTHRU_TYPE_ID).copied().unwrap_or(PASSTHRU);

        let mut by_wire_name = HashMap::new();
        let mut by_canonical_name = HashMap::new();
        for id in &self.order {
            if let Some(entry) = self.entries.get(id) {
                by_wire_name.entry(entry.wire_name).or_insert(*id);
                by_canonical_name.entry(entry.canonical_name).or_insert(*id);
            }
        }

        tracing::info!(types = self.entries.len(), "type registry built");
        TypeRegistry {
            entries: self.entries,
            by_wire_name,
            by_canonical_name,
            passthru,
        }
    }
}

/// Immutable, shareable type table.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    entries: BTreeMap<u32, TypeEntry>,
    by_wire_name: HashMap<&'static str, u32>,
    by_canonical_name: HashMap<&'static str, u32>,
    passthru: TypeEntry,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::new()
    }

    /// The built-in PostgreSQL type table.
    pub fn builtin() -> Self {
        TypeRegistryBuilder::with_builtins().build()
    }

    /// Entry for `type_id`, or the passthru entry when absent.
    pub fn lookup(&self, type_id: u32) -> &TypeEntry {
        match self.entries.get(&type_id) {
            Some(entry) => entry,
            None => {
                tracing::debug!(type_id, "unknown type id, using passthru");
                &self.passthru
            }
        }
    }

    pub fn get(&self, type_id: u32) -> Option<&TypeEntry> {
        self.entries.get(&type_id)
    }

    /// First registered entry with this wire name.
    pub fn lookup_wire_name(&self, name: &str) -> Option<&TypeEntry> {
        self.by_wire_name.get(name).and_then(|id| self.entries.get(id))
    }

    /// First registered entry with this canonical name.
    pub fn lookup_canonical_name(&self, name: &str) -> Option<&TypeEntry> {
        self.by_canonical_name
            .get(name)
            .and_then(|id| self.entries.get(id))
    }

    /// All entries in ascending id order.
    pub fn entries(&self) -> impl Iterator<Item = &TypeEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use pgtree_api::error::ErrorKind;

    use super::*;

    fn assert_shareable<T: Send + Sync>() {}

    #[test]
    fn registry_is_shareable() {
        assert_shareable::<TypeRegistry>();
    }

    #[test]
    fn builtin_table_is_complete() {
        let registry = TypeRegistry::builtin();
        assert_eq!(registry.len(), 25);

        let int4 = registry.lookup(23);
        assert_eq!(int4.wire_name, "int4");
        assert_eq!(int4.canonical_name, "Int32");
        assert!(!int4.is_array_type);

        let arrays: Vec<u32> = registry
            .entries()
            .filter(|e| e.is_array_type)
            .map(|e| e.type_id)
            .collect();
        assert_eq!(
            arrays,
            [199, 1000, 1001, 1005, 1007, 1009, 1015, 1016, 1021, 1022, 1115]
        );
    }

    #[test]
    fn unknown_ids_fall_back_to_passthru() {
        let registry = TypeRegistry::builtin();
        let entry = registry.lookup(99999);
        assert_eq!(entry.type_id, PASSTHRU_TYPE_ID);
        assert_eq!(entry.canonical_name, "Text");
        assert!(registry.get(99999).is_none());
    }

    #[test]
    fn register_overwrites_and_returns_previous() {
        let mut builder = TypeRegistryBuilder::with_builtins();
        let custom = TypeEntry {
            canonical_name: "Counter",
            ..BUILTIN[7]
        };
        let previous = builder.register(custom).unwrap();
        assert_eq!(previous.canonical_name, "Int32");

        let registry = builder.build();
        assert_eq!(registry.lookup(23).canonical_name, "Counter");
    }

    #[test]
    fn strict_registration_rejects_duplicates() {
        let mut builder = TypeRegistryBuilder::with_builtins();
        let err = builder.register_strict(BUILTIN[1]).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateType(16)));
    }

    #[test]
    fn name_lookups_prefer_first_registration() {
        let registry = TypeRegistry::builtin();
        assert_eq!(registry.lookup_wire_name("text").map(|e| e.type_id), Some(19));
        assert_eq!(registry.lookup_canonical_name("Text").map(|e| e.type_id), Some(0));
        assert_eq!(
            registry.lookup_canonical_name("Int16Array").map(|e| e.type_id),
            Some(22)
        );
        assert!(registry.lookup_wire_name("jsonb").is_none());
    }

    #[test]
    fn aliases_share_decoders() {
        let mut builder = TypeRegistryBuilder::with_builtins();
        assert!(builder.alias(3802, "json").unwrap().is_none());
        assert!(matches!(
            builder.alias(4000, "nope"),
            Err(EngineError::UnknownAlias { type_id: 4000, .. })
        ));
        let registry = builder.build();

        let arena = Arena::new();
        let value = registry
            .lookup(3802)
            .decode(&arena, br#"{"k":1}"#, DecodeMode::Text)
            .unwrap();
        assert_eq!(value.get("k"), Some(Value::Int64(1)));
        assert_eq!(registry.lookup_wire_name("json").map(|e| e.type_id), Some(114));
    }

    #[test]
    fn empty_builder_still_has_passthru() {
        let registry = TypeRegistry::builder().build();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup(23).wire_name, "passthru");
    }

    #[test]
    fn decode_errors_name_the_wire_type() {
        let registry = TypeRegistry::builtin();
        let arena = Arena::new();
        let err = registry
            .lookup(1007)
            .decode(&arena, &[0; 4], DecodeMode::Binary)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedMode);
        assert!(err.message().starts_with("_int4: "));
    }
}
