use pgtree_engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("capture ({context}): {detail}")]
    Capture { context: String, detail: String },

    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
