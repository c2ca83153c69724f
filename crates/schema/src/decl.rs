use crate::error::SchemaError;
use crate::field::{Field, FieldKind};
use crate::schema::Schema;
use core_types::{ISO_DATE, ISO_DATETIME};
use serde::Deserialize;
use std::sync::Arc;

/// Date layouts applied to declared fields that do not name their own `format`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FormatDefaults {
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default = "default_datetime_format")]
    pub datetime_format: String,
}

fn default_date_format() -> String {
    ISO_DATE.to_string()
}

fn default_datetime_format() -> String {
    ISO_DATETIME.to_string()
}

impl Default for FormatDefaults {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            datetime_format: default_datetime_format(),
        }
    }
}

/// The kind names accepted in declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindDecl {
    #[serde(alias = "int")]
    Integer,
    Float,
    Decimal,
    #[serde(alias = "str")]
    String,
    #[serde(alias = "boolean")]
    Bool,
    Date,
    Datetime,
    List,
    Dict,
    Nested,
}

/// One field as written in a configuration file.
///
/// ```toml
/// [[collections.fields]]
/// name = "readings"
/// kind = "list"
/// items = "float"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub kind: KindDecl,
    /// Item kind of a `list` field.
    #[serde(default)]
    pub items: Option<KindDecl>,
    /// Name of an earlier declared schema, for `nested` fields and `list` items.
    #[serde(default)]
    pub schema: Option<String>,
    /// strftime layout for `date` and `datetime` fields.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub allow_none: bool,
    #[serde(default)]
    pub required: bool,
}

/// A schema as written in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

impl SchemaDecl {
    /// Resolves the declaration into a `Schema`.
    ///
    /// `resolve` looks up schemas referenced by `nested` fields.
    pub fn build<F>(&self, defaults: &FormatDefaults, resolve: F) -> Result<Schema, SchemaError>
    where
        F: Fn(&str) -> Option<Arc<Schema>>,
    {
        let mut builder = Schema::builder(self.name.clone());
        for decl in &self.fields {
            let kind = match decl.kind {
                KindDecl::List => {
                    let item = decl.items.ok_or_else(|| {
                        SchemaError::Declaration(format!(
                            "list field '{}' must declare `items`",
                            decl.name
                        ))
                    })?;
                    FieldKind::list(scalar_kind(item, decl, defaults, &resolve)?)
                }
                other => scalar_kind(other, decl, defaults, &resolve)?,
            };

            let mut field = Field::new(decl.name.clone(), kind);
            if decl.allow_none {
                field = field.allow_none();
            }
            if decl.required {
                field = field.required();
            }
            builder = builder.field(field);
        }
        builder.build()
    }
}

fn scalar_kind<F>(
    kind: KindDecl,
    decl: &FieldDecl,
    defaults: &FormatDefaults,
    resolve: &F,
) -> Result<FieldKind, SchemaError>
where
    F: Fn(&str) -> Option<Arc<Schema>>,
{
    Ok(match kind {
        KindDecl::Integer => FieldKind::Integer,
        KindDecl::Float => FieldKind::Float,
        KindDecl::Decimal => FieldKind::Decimal,
        KindDecl::String => FieldKind::Str,
        KindDecl::Bool => FieldKind::Bool,
        KindDecl::Date => FieldKind::Date {
            format: decl.format.clone().unwrap_or_else(|| defaults.date_format.clone()),
        },
        KindDecl::Datetime => FieldKind::DateTime {
            format: decl
                .format
                .clone()
                .unwrap_or_else(|| defaults.datetime_format.clone()),
        },
        KindDecl::Dict => FieldKind::Dict,
        KindDecl::Nested => {
            let name = decl.schema.as_deref().ok_or_else(|| {
                SchemaError::Declaration(format!(
                    "nested field '{}' must name a `schema`",
                    decl.name
                ))
            })?;
            let schema = resolve(name).ok_or_else(|| {
                SchemaError::Declaration(format!(
                    "field '{}' references unknown schema '{}'",
                    decl.name, name
                ))
            })?;
            FieldKind::Nested(schema)
        }
        KindDecl::List => {
            return Err(SchemaError::Declaration(format!(
                "list field '{}' cannot hold lists",
                decl.name
            )));
        }
    })
}
