use pgtree_api::result::DecodeMode;
use serde::Deserialize;

use crate::envelope::ServerInfo;
use crate::error::EngineError;
use crate::registry::{TypeRegistry, TypeRegistryBuilder};

/// Root configuration, parsed from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PgTreeConfig {
    /// Wire mode of the cells handed to the marshaler.
    #[serde(default)]
    pub mode: DecodeMode,

    /// What to do when an alias reuses an already registered type id.
    #[serde(default)]
    pub duplicate_types: DuplicatePolicy,

    /// Extra type ids decoded like a built-in wire type.
    #[serde(default)]
    pub aliases: Vec<TypeAlias>,

    #[serde(default = "default_dbms_name")]
    pub dbms_name: String,

    #[serde(default = "default_dbms_version")]
    pub dbms_version: u32,
}

fn default_dbms_name() -> String {
    ServerInfo::default().dbms_name
}

fn default_dbms_version() -> u32 {
    ServerInfo::default().dbms_version
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Last registration wins.
    #[default]
    Overwrite,
    /// Building the registry fails.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TypeAlias {
    pub type_id: u32,
    /// Built-in wire type to decode as, e.g. `json` for `jsonb`.
    pub wire_name: String,
}

impl Default for PgTreeConfig {
    fn default() -> Self {
        Self {
            mode: DecodeMode::default(),
            duplicate_types: DuplicatePolicy::default(),
            aliases: Vec::new(),
            dbms_name: default_dbms_name(),
            dbms_version: default_dbms_version(),
        }
    }
}

impl PgTreeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(format!("{path}: {e}")))?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Built-in types plus the configured aliases.
    pub fn registry(&self) -> Result<TypeRegistry, EngineError> {
        let mut builder = TypeRegistryBuilder::with_builtins();
        for alias in &self.aliases {
            match self.duplicate_types {
                DuplicatePolicy::Overwrite => {
                    if let Some(previous) = builder.alias(alias.type_id, &alias.wire_name)? {
                        tracing::warn!(
                            type_id = alias.type_id,
                            replaced = previous.wire_name,
                            wire_name = %alias.wire_name,
                            "alias replaces registered type"
                        );
                    }
                }
                DuplicatePolicy::Reject => {
                    let entry = builder.alias_entry(alias.type_id, &alias.wire_name)?;
                    builder.register_strict(entry)?;
                }
            }
        }
        Ok(builder.build())
    }

    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            dbms_name: self.dbms_name.clone(),
            dbms_version: self.dbms_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = PgTreeConfig::parse("").unwrap();
        assert_eq!(config, PgTreeConfig::default());
        assert_eq!(config.mode, DecodeMode::Text);
        assert_eq!(config.server_info(), ServerInfo::default());
        assert_eq!(config.registry().unwrap().len(), 25);
    }

    #[test]
    fn parses_all_sections() {
        let config = PgTreeConfig::parse(
            r#"
            mode = "binary"
            duplicate_types = "reject"
            dbms_name = "postgres"
            dbms_version = 16

            [[aliases]]
            type_id = 3802
            wire_name = "json"

            [[aliases]]
            type_id = 3807
            wire_name = "_json"
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, DecodeMode::Binary);
        assert_eq!(config.duplicate_types, DuplicatePolicy::Reject);
        assert_eq!(config.dbms_version, 16);
        assert_eq!(config.aliases.len(), 2);

        let registry = config.registry().unwrap();
        assert_eq!(registry.lookup(3802).canonical_name, "Json");
        assert!(registry.lookup(3807).is_array_type);
    }

    #[test]
    fn duplicate_policy_decides_collisions() {
        let toml = r#"
            [[aliases]]
            type_id = 25
            wire_name = "json"
        "#;

        let config = PgTreeConfig::parse(toml).unwrap();
        assert_eq!(config.registry().unwrap().lookup(25).wire_name, "json");

        let config = PgTreeConfig {
            duplicate_types: DuplicatePolicy::Reject,
            ..config
        };
        assert!(matches!(
            config.registry(),
            Err(EngineError::DuplicateType(25))
        ));
    }

    #[test]
    fn bad_input_is_a_config_error() {
        assert!(matches!(
            PgTreeConfig::parse("mode = \"csv\""),
            Err(EngineError::Config(_))
        ));

        let err = PgTreeConfig::load("/nonexistent/pgtree.toml").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
        assert!(err.to_string().contains("/nonexistent/pgtree.toml"));

        let config = PgTreeConfig::parse("[[aliases]]\ntype_id = 1\nwire_name = \"money\"").unwrap();
        assert!(matches!(
            config.registry(),
            Err(EngineError::UnknownAlias { type_id: 1, .. })
        ));
    }
}
