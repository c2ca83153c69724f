//! # Binx Core Types
//!
//! Layer 0 of the workspace. Holds the value model shared by every other crate:
//! the validated `Value`, the native `Record` a collection stores, the
//! `RecordKind` that guards record construction, and the JSON-side aliases
//! `RawRecord` and `Context`.

pub mod error;
pub mod record;
pub mod value;

// Re-export the core types to provide a clean public API.
pub use error::CoreError;
pub use record::{Context, RawRecord, Record, RecordKind};
pub use value::{ISO_DATE, ISO_DATETIME, Value};
