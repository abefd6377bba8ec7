//! Registration schema use cases: import, version lookup and validation.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::domain::metaschema::jsonschema_from_metaschema;
use crate::domain::schema::{self, PREREG_SCHEMA_NAME, PREREG_SCHEMA_VERSION};
use crate::domain::schema_block::{blocks_from_specs, BlockSpec};
use crate::domain::{FileMetadataSchema, RegistrationSchema, SchemaBlock, SchemaId, SchemaKind};
use crate::error::{Error, Result};
use crate::port::outbound::store::{SchemaStore, Transactional};

/// A schema document as shipped in JSON files.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDocument {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub config: Option<Value>,
    /// Atomic blocks; absent for page-based schemas.
    #[serde(default)]
    pub blocks: Option<Vec<BlockSpec>>,
    /// The whole document, stored as the schema body.
    #[serde(skip)]
    pub raw: Value,
}

const fn default_version() -> i32 {
    1
}

impl SchemaDocument {
    /// Parse a schema document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationValue`] when required fields are missing.
    pub fn parse(raw: Value) -> Result<Self> {
        let mut doc: Self = serde_json::from_value(raw.clone())
            .map_err(|e| Error::ValidationValue(format!("schema document: {e}")))?;
        if doc.name.trim().is_empty() {
            return Err(Error::ValidationValue("schema name must not be empty".into()));
        }
        doc.raw = raw;
        Ok(doc)
    }
}

/// Outcome of importing one schema document.
#[derive(Debug, Clone)]
pub struct ImportedSchema {
    pub kind: SchemaKind,
    pub id: SchemaId,
    pub name: String,
    pub schema_version: i32,
    pub blocks: usize,
    /// `false` when an existing (name, version) was updated in place.
    pub created: bool,
}

/// Orchestrates schema storage and validation.
pub struct SchemaService<S> {
    store: Arc<S>,
}

impl<S: SchemaStore + Transactional> SchemaService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create or update a registration schema from its document.
    ///
    /// Page-based documents must compile to a JSON schema; atomic documents
    /// have their `blocks` list turned into schema blocks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationValue`] for malformed documents and a
    /// domain error for bad blocks. The schema and its blocks are written in
    /// one transaction, so a failed import stores nothing.
    pub async fn import_registration_schema(&self, raw: Value) -> Result<ImportedSchema> {
        let doc = SchemaDocument::parse(raw)?;

        if doc.raw.get("pages").is_some() {
            jsonschema_from_metaschema(&doc.raw, true, false)?;
        }

        let existing = self
            .store
            .registration_schema_version(&doc.name, doc.version)
            .await?;
        let created = existing.is_none();

        let mut schema = existing.unwrap_or_else(|| {
            RegistrationSchema::new(doc.name.clone(), doc.version, Value::Null)
        });
        schema.base.schema = doc.raw.clone();
        schema.base.category = doc.category.clone();
        schema.base.active = doc.active.unwrap_or(true);
        schema.base.visible = doc.visible.unwrap_or(true);
        schema.base.modified = chrono::Utc::now();
        schema.description = doc.description.clone();
        schema.config = doc.config.clone().unwrap_or_else(|| Value::Object(Map::new()));

        let blocks = match &doc.blocks {
            Some(specs) => blocks_from_specs(schema.id(), specs)?,
            None => Vec::new(),
        };

        let tx = self.store.begin().await?;
        tx.save_registration_schema(&schema).await?;
        tx.replace_blocks(schema.id(), &blocks).await?;
        tx.commit().await?;

        info!(
            schema = %schema.base,
            blocks = blocks.len(),
            created,
            "Registration schema imported"
        );

        Ok(ImportedSchema {
            kind: SchemaKind::Registration,
            id: schema.id().clone(),
            name: schema.base.name,
            schema_version: schema.base.schema_version,
            blocks: blocks.len(),
            created,
        })
    }

    /// Create or update a file-metadata schema from its document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationValue`] for malformed documents.
    pub async fn import_file_metadata_schema(&self, raw: Value) -> Result<ImportedSchema> {
        let doc = SchemaDocument::parse(raw)?;

        let existing = self
            .store
            .file_metadata_schemas()
            .await?
            .into_iter()
            .find(|s| s.base.name == doc.name && s.base.schema_version == doc.version);
        let created = existing.is_none();

        let mut schema = existing
            .unwrap_or_else(|| FileMetadataSchema::new(doc.name.clone(), doc.version, Value::Null));
        schema.base.schema = doc.raw;
        schema.base.category = doc.category;
        schema.base.active = doc.active.unwrap_or(true);
        schema.base.visible = doc.visible.unwrap_or(true);
        schema.base.modified = chrono::Utc::now();

        self.store.save_file_metadata_schema(&schema).await?;
        info!(schema = %schema.base, created, "File metadata schema imported");

        Ok(ImportedSchema {
            kind: SchemaKind::FileMetadata,
            id: schema.base.id.clone(),
            name: schema.base.name,
            schema_version: schema.base.schema_version,
            blocks: 0,
            created,
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub async fn get(&self, id: &SchemaId) -> Result<RegistrationSchema> {
        self.store
            .registration_schema(id)
            .await?
            .ok_or_else(|| Error::not_found("schema", id))
    }

    /// Blocks of a schema in display order.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the blocks cannot be read.
    pub async fn blocks(&self, id: &SchemaId) -> Result<Vec<SchemaBlock>> {
        self.store.blocks(id).await
    }

    /// Latest version of the schema called `name`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the schemas cannot be read.
    pub async fn latest_version(
        &self,
        name: &str,
        only_active: bool,
    ) -> Result<Option<RegistrationSchema>> {
        let schemas = self.store.registration_schemas().await?;
        Ok(schema::latest_version(&schemas, name, only_active).cloned())
    }

    /// Latest visible version of every schema, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the schemas cannot be read.
    pub async fn latest_versions(&self, only_active: bool) -> Result<Vec<RegistrationSchema>> {
        let schemas = self.store.registration_schemas().await?;
        Ok(schema::latest_versions(&schemas, only_active)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Every stored version of every registration schema.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the schemas cannot be read.
    pub async fn all(&self) -> Result<Vec<RegistrationSchema>> {
        self.store.registration_schemas().await
    }

    /// Latest visible version of every file-metadata schema.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the schemas cannot be read.
    pub async fn latest_file_metadata_versions(
        &self,
        only_active: bool,
    ) -> Result<Vec<FileMetadataSchema>> {
        let schemas = self.store.file_metadata_schemas().await?;
        Ok(schema::latest_versions(&schemas, only_active)
            .into_iter()
            .cloned()
            .collect())
    }

    /// The preregistration challenge schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if it has not been imported.
    pub async fn prereg_schema(&self) -> Result<RegistrationSchema> {
        self.store
            .registration_schema_version(PREREG_SCHEMA_NAME, PREREG_SCHEMA_VERSION)
            .await?
            .ok_or_else(|| {
                Error::not_found(
                    "schema",
                    format!("{PREREG_SCHEMA_NAME} v{PREREG_SCHEMA_VERSION}"),
                )
            })
    }

    /// Validate nested registration metadata against schema `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] with a user-facing message on failure.
    pub async fn validate_metadata(
        &self,
        id: &SchemaId,
        metadata: &Value,
        reviewer: bool,
        required_fields: bool,
    ) -> Result<()> {
        let schema = self.get(id).await?;
        let result = schema.validate_metadata(metadata, reviewer, required_fields);
        match &result {
            Ok(()) => debug!(schema = %schema.base, "Metadata valid"),
            Err(e) => warn!(schema = %schema.base, error = %e, "Metadata rejected"),
        }
        result
    }

    /// Validate flat registration responses against schema `id`'s blocks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] with a user-facing message on failure.
    pub async fn validate_registration_responses(
        &self,
        id: &SchemaId,
        responses: &Value,
        required_fields: bool,
    ) -> Result<bool> {
        let schema = self.get(id).await?;
        let blocks = self.store.blocks(id).await?;
        let result = schema.validate_registration_responses(&blocks, responses, required_fields);
        if let Err(e) = &result {
            warn!(schema = %schema.base, error = %e, "Registration responses rejected");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::adapter::outbound::sqlite::SqliteStore;
    use crate::domain::DomainError;
    use crate::testkit::store::memory_store;

    fn service() -> SchemaService<SqliteStore> {
        SchemaService::new(Arc::new(memory_store()))
    }

    fn atomic(version: i32) -> Value {
        json!({
            "name": "Open-Ended",
            "version": version,
            "description": "Describe anything",
            "blocks": [
                {"block_type": "page-heading", "display_text": "Summary"},
                {"block_type": "question-label", "display_text": "Summary"},
                {"block_type": "long-text-input", "registration_response_key": "summary", "required": true}
            ]
        })
    }

    #[tokio::test]
    async fn import_creates_then_updates_in_place() {
        let svc = service();
        let first = svc.import_registration_schema(atomic(1)).await.unwrap();
        assert!(first.created);
        assert_eq!(first.blocks, 3);

        let again = svc.import_registration_schema(atomic(1)).await.unwrap();
        assert!(!again.created);
        assert_eq!(again.id, first.id);
        assert_eq!(svc.blocks(&first.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn latest_version_picks_highest_active() {
        let svc = service();
        svc.import_registration_schema(atomic(1)).await.unwrap();
        svc.import_registration_schema(atomic(2)).await.unwrap();
        let mut inactive = atomic(3);
        inactive["active"] = json!(false);
        svc.import_registration_schema(inactive).await.unwrap();

        let latest = svc.latest_version("Open-Ended", true).await.unwrap().unwrap();
        assert_eq!(latest.base.schema_version, 2);
        let any = svc.latest_version("Open-Ended", false).await.unwrap().unwrap();
        assert_eq!(any.base.schema_version, 3);
        assert_eq!(svc.latest_versions(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn responses_validate_against_stored_blocks() {
        let svc = service();
        let imported = svc.import_registration_schema(atomic(1)).await.unwrap();

        assert!(svc
            .validate_registration_responses(&imported.id, &json!({"summary": "text"}), true)
            .await
            .unwrap());
        let err = svc
            .validate_registration_responses(&imported.id, &json!({"summary": ""}), true)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "For your registration, your response to the 'Summary' field is invalid. \"\" is shorter than 1 character"
        );
    }

    #[tokio::test]
    async fn malformed_page_schema_is_rejected() {
        let svc = service();
        let doc = json!({"name": "Broken", "pages": [{"questions": [{"title": "no qid"}]}]});
        assert!(matches!(
            svc.import_registration_schema(doc).await,
            Err(Error::ValidationValue(_))
        ));
    }

    #[tokio::test]
    async fn failed_import_stores_nothing() {
        let svc = service();
        let doc = json!({
            "name": "Dup",
            "blocks": [
                {"block_type": "short-text-input", "registration_response_key": "k"},
                {"block_type": "long-text-input", "registration_response_key": "k"}
            ]
        });
        let err = svc.import_registration_schema(doc).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Domain(DomainError::DuplicateResponseKey(ref key)) if key == "k"
        ));
        assert!(svc.latest_version("Dup", false).await.unwrap().is_none());
        assert!(svc.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn prereg_schema_must_exist() {
        let svc = service();
        assert!(matches!(svc.prereg_schema().await, Err(Error::NotFound { .. })));

        svc.import_registration_schema(json!({
            "name": PREREG_SCHEMA_NAME,
            "version": PREREG_SCHEMA_VERSION,
            "pages": []
        }))
        .await
        .unwrap();
        assert_eq!(svc.prereg_schema().await.unwrap().base.name, PREREG_SCHEMA_NAME);
    }

    #[tokio::test]
    async fn file_metadata_import() {
        let svc = service();
        let imported = svc
            .import_file_metadata_schema(json!({"name": "datacite", "version": 1}))
            .await
            .unwrap();
        assert_eq!(imported.kind, SchemaKind::FileMetadata);
        assert_eq!(svc.latest_file_metadata_versions(true).await.unwrap().len(), 1);
    }
}
