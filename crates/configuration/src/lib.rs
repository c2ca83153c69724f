use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{CollectionDecl, Config, Logging};

/// Prefix of environment variables that override file values, e.g.
/// `BINX__LOGGING__LEVEL=debug`.
pub const ENV_PREFIX: &str = "BINX";

/// Loads the application configuration from `path` and the environment.
///
/// The file is read first; `BINX__`-prefixed variables are layered on top. The
/// result is validated before it is returned.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    tracing::debug!(path = %path.display(), collections = config.collections.len(), "loaded configuration");

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::FieldKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const BUILDINGS: &str = r#"
[logging]
level = "debug"

[conversion]
date_format = "%m/%d/%Y"

[[collections]]
name = "Meter"

[[collections.fields]]
name = "serial"
kind = "string"
required = true

[[collections]]
name = "Building"
namespace = "bem"
unique_fields = ["bdbid"]

[[collections.fields]]
name = "bdbid"
kind = "integer"
required = true

[[collections.fields]]
name = "opened"
kind = "date"

[[collections.fields]]
name = "meters"
kind = "list"
items = "nested"
schema = "Meter"
allow_none = true
"#;

    #[test]
    fn loads_sections_and_defaults() {
        let file = write_config(BUILDINGS);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.directory.is_none());
        assert_eq!(config.conversion.date_format, "%m/%d/%Y");
        assert_eq!(config.conversion.datetime_format, "%Y-%m-%dT%H:%M:%S%.f");
        assert_eq!(config.collections.len(), 2);
    }

    #[test]
    fn builds_collections_in_order() {
        let file = write_config(BUILDINGS);
        let defs = load_config(file.path()).unwrap().build_collections().unwrap();

        assert_eq!(defs[0].qualified_name(), "MeterCollection");
        let building = &defs[1];
        assert_eq!(building.qualified_name(), "bem.BuildingCollection");
        assert_eq!(building.unique_fields(), ["bdbid"]);
        assert_eq!(
            building.schema().field("opened").unwrap().kind(),
            &FieldKind::Date {
                format: "%m/%d/%Y".into()
            }
        );
        assert_eq!(
            building.schema().field("meters").unwrap().kind().label(),
            "list<nested<Meter>>"
        );
    }

    #[test]
    fn finds_a_collection_by_any_of_its_names() {
        let file = write_config(BUILDINGS);
        let config = load_config(file.path()).unwrap();
        for name in ["Building", "BuildingCollection", "bem.BuildingCollection"] {
            assert_eq!(config.collection(name).unwrap().name(), "BuildingCollection");
        }
        assert!(config.collection("Nope").is_err());
    }

    #[test]
    fn rejects_duplicate_collection_names() {
        let file = write_config(
            r#"
[[collections]]
name = "A"
fields = []

[[collections]]
name = "A"
fields = []
"#,
        );
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn forward_references_fail() {
        let file = write_config(
            r#"
[[collections]]
name = "Site"

[[collections.fields]]
name = "meter"
kind = "nested"
schema = "Meter"

[[collections]]
name = "Meter"

[[collections.fields]]
name = "serial"
kind = "string"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert!(matches!(
            config.build_collections(),
            Err(ConfigError::SchemaError { .. })
        ));
    }

    #[test]
    fn unknown_unique_field_fails() {
        let file = write_config(
            r#"
[[collections]]
name = "Meter"
unique_fields = ["id"]

[[collections.fields]]
name = "serial"
kind = "string"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert!(matches!(
            config.build_collections(),
            Err(ConfigError::CollectionError { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(load_config(&missing), Err(ConfigError::LoadError(_))));
    }
}
