use crate::io::{read_into, write_collection};
use anyhow::{Context, Result};
use collection::{Collection, CollectionError};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL};
use configuration::Config;
use schema::ValidationErrors;
use std::path::Path;

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(|h| Cell::new(*h)));
    table
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "" }
}

/// One row per declared field of every collection.
pub fn describe(config: &Config) -> Result<Table> {
    let defs = config.build_collections()?;
    let mut table = table(&["Collection", "Field", "Kind", "Frame dtype", "Required", "Nullable", "Unique"]);
    for def in &defs {
        for field in def.schema().fields() {
            let unique = def.unique_fields().iter().any(|f| f == field.name());
            table.add_row(vec![
                def.qualified_name(),
                field.name().to_string(),
                field.kind().label(),
                field.kind().frame_dtype().to_string(),
                yes_no(field.is_required()).to_string(),
                yes_no(field.allows_none()).to_string(),
                yes_no(unique).to_string(),
            ]);
        }
    }
    Ok(table)
}

/// The result of checking an input file against a collection.
#[derive(Debug)]
pub enum Validation {
    Valid { collection: String, records: usize },
    Invalid { collection: String, errors: ValidationErrors },
}

/// Loads `input` into the named collection.
///
/// Schema violations are reported as `Validation::Invalid`; unreadable input
/// and other failures are errors.
pub fn validate(config: &Config, name: &str, input: &Path) -> Result<Validation> {
    let def = config.collection(name)?;
    let mut collection = Collection::new(def);
    match read_into(&mut collection, input) {
        Ok(()) => Ok(Validation::Valid {
            collection: collection.def().qualified_name(),
            records: collection.len(),
        }),
        Err(err) => match err.downcast::<CollectionError>() {
            Ok(CollectionError::Validation { collection, errors }) => {
                Ok(Validation::Invalid { collection, errors })
            }
            Ok(other) => Err(other.into()),
            Err(err) => Err(err),
        },
    }
}

/// One row per invalid field of every invalid record.
pub fn errors_table(errors: &ValidationErrors) -> Table {
    let mut table = table(&["Record", "Field", "Messages"]);
    for (index, fields) in errors.iter() {
        for (field, messages) in fields {
            table.add_row(vec![index.to_string(), field.clone(), messages.join(" ")]);
        }
    }
    table
}

/// Validates `input` against the named collection and writes it to `output`.
/// Returns the number of records written.
pub fn convert(config: &Config, name: &str, input: &Path, output: &Path) -> Result<usize> {
    let def = config.collection(name)?;
    let mut collection = Collection::new(def);
    read_into(&mut collection, input)
        .with_context(|| format!("Failed to load {:?} into {}", input, name))?;
    write_collection(&collection, output)?;
    tracing::info!(
        collection = %collection.def().qualified_name(),
        records = collection.len(),
        input = %input.display(),
        output = %output.display(),
        "converted"
    );
    Ok(collection.len())
}
