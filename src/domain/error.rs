use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid value for field '{field}': expected {expected}, got {value}")]
    InvalidValue {
        field: String,
        expected: &'static str,
        value: String,
    },

    #[error("Missing attribute '{field}' on {model}: it was excluded by the query projection")]
    MissingAttribute { model: String, field: String },

    #[error("Unknown attribute '{field}' for {model}")]
    UnknownAttribute { model: String, field: String },

    #[error("Attribute '{field}' of a persisted {model} cannot be changed")]
    ImmutableAttribute { model: String, field: String },

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Document not found in {collection} for selector {selector}")]
    NotFound { collection: String, selector: String },
}
