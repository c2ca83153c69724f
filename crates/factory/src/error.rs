use collection::CollectionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalcError {
    #[error("Invalid calc settings: {0}")]
    InvalidSettings(String),

    #[error("Missing calc setting '{0}'")]
    MissingSetting(String),

    #[error("Calc result is not a record: {0}")]
    NotARecord(String),

    #[error("Calculation failed: {0}")]
    Failed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("Factory expected an input of {expected}, found {found}")]
    InputMismatch { expected: String, found: String },

    #[error("Factory expected {expected} input collection(s), got {found}")]
    InputCount { expected: usize, found: usize },

    #[error("No input collection loaded for {0}")]
    MissingInput(String),

    #[error("The processor produced no results for {0}")]
    ProcessorFailure(String),

    #[error("A validation error occurred while creating {collection}")]
    CreateValidation {
        collection: String,
        #[source]
        source: CollectionError,
    },

    #[error(transparent)]
    Calc(#[from] CalcError),

    #[error(transparent)]
    Collection(#[from] CollectionError),
}
