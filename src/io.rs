//! Reading collections from and writing them to files.

use anyhow::{Context, Result, bail};
use collection::{Collection, format_temporal_columns};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;

/// File formats understood by the command-line tool, picked by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Csv,
    Parquet,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Format::Json),
            Some("csv") => Ok(Format::Csv),
            Some("parquet") | Some("pq") => Ok(Format::Parquet),
            _ => bail!(
                "Cannot infer a file format from {:?}; use .json, .csv or .parquet",
                path
            ),
        }
    }
}

/// Loads the records in `path` into `collection`.
pub fn read_into(collection: &mut Collection, path: &Path) -> Result<()> {
    match Format::from_path(path)? {
        Format::Json => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            collection.load_json(&text)?;
        }
        Format::Csv => {
            // Every column is read as text; the schema parses each cell.
            let df = CsvReader::from_path(path)
                .with_context(|| format!("Failed to open {:?}", path))?
                .has_header(true)
                .infer_schema(Some(0))
                .finish()?;
            collection.load_data(&df)?;
        }
        Format::Parquet => {
            let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
            let df = ParquetReader::new(file).finish()?;
            collection.load_data(&df)?;
        }
    }
    tracing::debug!(path = %path.display(), records = collection.len(), "read input file");
    Ok(())
}

/// Writes the records of `collection` to `path`.
pub fn write_collection(collection: &Collection, path: &Path) -> Result<()> {
    match Format::from_path(path)? {
        Format::Json => {
            let text = serde_json::to_string_pretty(&collection.data())?;
            fs::write(path, text).with_context(|| format!("Failed to write {:?}", path))?;
        }
        Format::Csv => {
            let mut df = format_temporal_columns(&collection.to_dataframe()?, collection.schema())?;
            let mut output_file = create(path)?;
            CsvWriter::new(&mut output_file)
                .include_header(true)
                .finish(&mut df)?;
        }
        Format::Parquet => {
            let mut df = collection.to_dataframe()?;
            let mut output_file = create(path)?;
            ParquetWriter::new(&mut output_file).finish(&mut df)?;
        }
    }
    tracing::debug!(path = %path.display(), records = collection.len(), "wrote output file");
    Ok(())
}

fn create(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("Failed to create output file at {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::from_path(Path::new("a.json")).unwrap(), Format::Json);
        assert_eq!(Format::from_path(Path::new("a.CSV")).unwrap(), Format::Csv);
        assert_eq!(Format::from_path(Path::new("a.parquet")).unwrap(), Format::Parquet);
        assert!(Format::from_path(&PathBuf::from("a.txt")).is_err());
        assert!(Format::from_path(Path::new("noext")).is_err());
    }
}
