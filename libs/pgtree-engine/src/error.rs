use pgtree_api::error::DecodeError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("type id {0} is already registered")]
    DuplicateType(u32),

    #[error("cannot alias type id {type_id} to unknown wire type '{wire_name}'")]
    UnknownAlias { type_id: u32, wire_name: String },

    #[error("row {row}, column '{column}' (type id {type_id}, {wire_type}): {source}")]
    Decode {
        row: usize,
        column: String,
        type_id: u32,
        wire_type: &'static str,
        #[source]
        source: DecodeError,
    },

    #[error("malformed result set: {0}")]
    Shape(DecodeError),
}

impl EngineError {
    /// Add context to the error.
    ///
    /// For `Decode` and `Shape`, context is added to the inner `DecodeError`.
    /// For `Config`, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            EngineError::Shape(e) => EngineError::Shape(e.with_context(ctx)),
            EngineError::Decode {
                row,
                column,
                type_id,
                wire_type,
                source,
            } => EngineError::Decode {
                row,
                column,
                type_id,
                wire_type,
                source: source.with_context(ctx),
            },
            other => other,
        }
    }

    /// Kind of the underlying decode failure, if any.
    pub fn decode_kind(&self) -> Option<pgtree_api::error::ErrorKind> {
        match self {
            EngineError::Decode { source, .. } | EngineError::Shape(source) => Some(source.kind()),
            _ => None,
        }
    }
}
