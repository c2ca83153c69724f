use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Argument '{field}' not valid for {kind}")]
    UnknownField { field: String, kind: String },
}
