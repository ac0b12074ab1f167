// Error types for engine operations

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Failed to register table '{name}': {message}")]
    Registration { name: String, message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Invalid CSV option: {message}")]
    CsvOption { message: String },
}

impl EngineError {
    /// Build a query failure from any message (used by non-DataFusion engines)
    pub fn query<S: Into<String>>(message: S) -> Self {
        EngineError::Query {
            message: message.into(),
        }
    }

    pub fn registration<N: Into<String>, S: Into<String>>(name: N, message: S) -> Self {
        EngineError::Registration {
            name: name.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
