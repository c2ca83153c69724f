//! # Binx Collection
//!
//! Layer 2 of the workspace. A `Collection` is a schema-validated, in-memory list
//! of records that can be loaded from and rendered to JSON, serde objects and
//! polars frames through one surface.
//!
//! Definitions are declared once with `CollectionBuilder` and shared as
//! `Arc<CollectionDef>`; any number of `Collection` values may hold records of
//! the same definition.

pub mod builder;
pub mod collection;
pub mod error;
pub mod frame;
pub mod records;
pub mod source;

pub use builder::CollectionBuilder;
pub use collection::{Collection, CollectionDef};
pub use error::{CollectionError, SourceError};
pub use frame::{format_temporal_columns, frame_to_records, nan_to_null, records_to_frame};
pub use records::{Row, columns_to_records, date_to_string, records_to_columns, replace_nan_with_none};
pub use source::IntoRecords;
