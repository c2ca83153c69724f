use crate::error::ConfigError;
use collection::{CollectionBuilder, CollectionDef};
use schema::{FieldDecl, FormatDefaults, Schema, SchemaDecl};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

/// The root configuration structure for the application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: Logging,
    /// Date layouts for declared fields that do not set their own.
    #[serde(default)]
    pub conversion: FormatDefaults,
    #[serde(default)]
    pub collections: Vec<CollectionDecl>,
}

/// Where and how verbosely to log.
#[derive(Debug, Clone, Deserialize)]
pub struct Logging {
    /// An `EnvFilter` directive such as `info` or `binx=debug,collection=trace`.
    #[serde(default = "default_level")]
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_file_prefix() -> String {
    "binx.log".to_string()
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: None,
            file_prefix: default_file_prefix(),
        }
    }
}

/// A collection declared in the configuration file.
///
/// ```toml
/// [[collections]]
/// name = "Building"
/// unique_fields = ["bdbid"]
///
/// [[collections.fields]]
/// name = "bdbid"
/// kind = "integer"
/// required = true
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionDecl {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub unique_fields: Vec<String>,
    pub fields: Vec<FieldDecl>,
}

impl CollectionDecl {
    fn schema_decl(&self) -> SchemaDecl {
        SchemaDecl {
            name: self.name.clone(),
            fields: self.fields.clone(),
        }
    }
}

impl Config {
    /// Checks collection names before anything is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for decl in &self.collections {
            if decl.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "collection names must not be empty".into(),
                ));
            }
            if !seen.insert(decl.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "collection '{}' is declared more than once",
                    decl.name
                )));
            }
        }
        Ok(())
    }

    /// Builds every declared collection in file order.
    ///
    /// A `nested` field may reference any collection declared above it.
    pub fn build_collections(&self) -> Result<Vec<Arc<CollectionDef>>, ConfigError> {
        self.validate()?;

        let mut schemas: BTreeMap<String, Arc<Schema>> = BTreeMap::new();
        let mut defs = Vec::with_capacity(self.collections.len());
        for decl in &self.collections {
            let schema = decl
                .schema_decl()
                .build(&self.conversion, |name| schemas.get(name).cloned())
                .map_err(|source| ConfigError::SchemaError {
                    name: decl.name.clone(),
                    source,
                })?;
            let schema = Arc::new(schema);

            let mut builder = CollectionBuilder::new(decl.name.clone())
                .unique_fields(decl.unique_fields.iter().cloned());
            if let Some(namespace) = &decl.namespace {
                builder = builder.namespace(namespace.clone());
            }
            let def = builder
                .build(Arc::clone(&schema))
                .map_err(|source| ConfigError::CollectionError {
                    name: decl.name.clone(),
                    source,
                })?;

            tracing::debug!(collection = %def.qualified_name(), fields = schema.fields().len(), "built declared collection");
            schemas.insert(decl.name.clone(), schema);
            defs.push(def);
        }
        Ok(defs)
    }

    /// Builds the declared collections and returns the one named `name`.
    ///
    /// `name` may be the declared name (`Building`), the collection name
    /// (`BuildingCollection`) or the qualified name (`ns.BuildingCollection`).
    pub fn collection(&self, name: &str) -> Result<Arc<CollectionDef>, ConfigError> {
        self.build_collections()?
            .into_iter()
            .find(|def| {
                def.qualified_name() == name
                    || def.name() == name
                    || def.schema().name() == name
            })
            .ok_or_else(|| {
                ConfigError::ValidationError(format!("no collection named '{name}' is declared"))
            })
    }
}
