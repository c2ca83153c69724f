use collection::CollectionError;
use schema::SchemaError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from file: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    #[error("Collection '{name}' is declared incorrectly: {source}")]
    SchemaError {
        name: String,
        #[source]
        source: SchemaError,
    },

    #[error("Collection '{name}' could not be built: {source}")]
    CollectionError {
        name: String,
        #[source]
        source: CollectionError,
    },
}
