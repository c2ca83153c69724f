use collection::CollectionError;
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("The collection {0} has already been registered. Use a different name for your collection")]
    AlreadyRegistered(String),

    #[error("The collection {0} was not found in the registry")]
    NotFound(String),
}

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Adapter {adapter} cannot adapt from {found}, it expects {expected}")]
    InputMismatch {
        adapter: String,
        expected: String,
        found: String,
    },

    #[error("Adapter {adapter} returned {found}, it must return {expected}")]
    OutputMismatch {
        adapter: String,
        expected: String,
        found: String,
    },

    #[error("{from} could not be found on the adapter chain for {to}")]
    NoPath { from: String, to: String },

    #[error("An error occurred in step {step} of the adapter chain ({adapter})")]
    Chain {
        step: usize,
        adapter: String,
        #[source]
        source: Box<AdapterError>,
    },

    #[error("Adapter failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error("Frame error: {0}")]
    Frame(#[from] PolarsError),
}
