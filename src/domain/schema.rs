//! Versioned questionnaire schemas.
//!
//! [`Schema`] carries the fields shared by every schema flavour; the
//! registration and file-metadata flavours wrap it. Version selection works
//! on any slice of schemas through [`latest_version`] and [`latest_versions`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::SchemaId;
use super::url::SiteUrls;

/// Name of the preregistration challenge schema.
pub const PREREG_SCHEMA_NAME: &str = "Prereg Challenge";

/// Version of the preregistration challenge schema in use.
pub const PREREG_SCHEMA_VERSION: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    Registration,
    FileMetadata,
}

/// Fields shared by every schema flavour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub id: SchemaId,
    pub name: String,
    /// Question pages (or atomic blocks) describing the questionnaire.
    pub schema: Value,
    pub category: Option<String>,
    /// Whether the schema accepts submissions.
    pub active: bool,
    /// Whether the schema is visible in the API and registries search.
    pub visible: bool,
    /// Bumped whenever questions or responses change.
    pub schema_version: i32,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Schema {
    pub fn new(name: impl Into<String>, schema_version: i32, schema: Value) -> Self {
        let now = Utc::now();
        Self {
            id: SchemaId::generate(),
            name: name.into(),
            schema,
            category: None,
            active: true,
            visible: true,
            schema_version,
            created: now,
            modified: now,
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(name={}, schema_version={}, id={})",
            self.name, self.schema_version, self.id
        )
    }
}

impl AsRef<Schema> for Schema {
    fn as_ref(&self) -> &Schema {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationSchema {
    #[serde(flatten)]
    pub base: Schema,
    pub config: Value,
    pub description: Option<String>,
}

impl RegistrationSchema {
    pub fn new(name: impl Into<String>, schema_version: i32, schema: Value) -> Self {
        Self {
            base: Schema::new(name, schema_version, schema),
            config: Value::Object(Map::new()),
            description: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &SchemaId {
        &self.base.id
    }

    /// Configuration block: `schema.config`, falling back to the config column.
    fn config_block(&self) -> Option<&Map<String, Value>> {
        self.base
            .schema
            .get("config")
            .and_then(Value::as_object)
            .or_else(|| self.config.as_object())
    }

    fn config_flag(&self, key: &str) -> bool {
        self.config_block()
            .and_then(|c| c.get(key))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    #[must_use]
    pub fn requires_approval(&self) -> bool {
        self.config_flag("requiresApproval")
    }

    #[must_use]
    pub fn requires_consent(&self) -> bool {
        self.config_flag("requiresConsent")
    }

    #[must_use]
    pub fn has_files(&self) -> bool {
        self.config_flag("hasFiles")
    }

    /// Requirements this schema fulfills, e.g. `["Open Science Framework"]`.
    #[must_use]
    pub fn fulfills(&self) -> Vec<String> {
        self.config_block()
            .and_then(|c| c.get("fulfills"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Custom UI messages keyed by message name.
    #[must_use]
    pub fn messages(&self) -> BTreeMap<String, Value> {
        self.config_block()
            .and_then(|c| c.get("messages"))
            .and_then(Value::as_object)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn absolute_api_v2_url(&self, urls: &SiteUrls) -> String {
        urls.api_v2(&format!("/schemas/registrations/{}/", self.base.id))
    }
}

impl AsRef<Schema> for RegistrationSchema {
    fn as_ref(&self) -> &Schema {
        &self.base
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadataSchema {
    #[serde(flatten)]
    pub base: Schema,
}

impl FileMetadataSchema {
    pub fn new(name: impl Into<String>, schema_version: i32, schema: Value) -> Self {
        Self {
            base: Schema::new(name, schema_version, schema),
        }
    }

    #[must_use]
    pub fn absolute_api_v2_url(&self, urls: &SiteUrls) -> String {
        urls.api_v2(&format!("/schemas/files/{}/", self.base.id))
    }
}

impl AsRef<Schema> for FileMetadataSchema {
    fn as_ref(&self) -> &Schema {
        &self.base
    }
}

/// Latest version of the schema called `name`.
///
/// With `only_active` inactive versions are ignored.
pub fn latest_version<'a, S: AsRef<Schema>>(
    schemas: &'a [S],
    name: &str,
    only_active: bool,
) -> Option<&'a S> {
    schemas
        .iter()
        .filter(|s| {
            let s = s.as_ref();
            s.name == name && (!only_active || s.active)
        })
        .max_by_key(|s| s.as_ref().schema_version)
}

/// Latest visible version of every schema, ordered by name.
///
/// With `only_active` inactive versions are ignored.
pub fn latest_versions<S: AsRef<Schema>>(schemas: &[S], only_active: bool) -> Vec<&S> {
    let mut latest: BTreeMap<&str, &S> = BTreeMap::new();
    for schema in schemas {
        let base = schema.as_ref();
        if !base.visible || (only_active && !base.active) {
            continue;
        }
        let newer = latest
            .get(base.name.as_str())
            .map_or(true, |current| {
                current.as_ref().schema_version < base.schema_version
            });
        if newer {
            latest.insert(base.name.as_str(), schema);
        }
    }
    latest.into_values().collect()
}
