//! # Binx Schema
//!
//! Declares the shape of a collection's records and moves records between their
//! JSON form and their validated native form.
//!
//! - `Schema` / `Field` / `FieldKind`: the typed declaration, built in code with
//!   `Schema::builder` or from configuration through `SchemaDecl`.
//! - `Schema::load_many` validates a batch and reports every problem at once as
//!   `ValidationErrors`, keyed by record index and field.
//! - `Schema::frame_dtypes` tells the collection layer which column type each
//!   field becomes in a frame.

pub mod decl;
pub mod error;
pub mod field;
pub mod schema;

pub use decl::{FieldDecl, FormatDefaults, KindDecl, SchemaDecl};
pub use error::{FieldErrors, SchemaError, ValidationErrors};
pub use field::{Field, FieldKind};
pub use schema::{Schema, SchemaBuilder};
