use diesel::prelude::*;

use super::{from_json, parse_timestamp, timestamp, to_json, SqliteStore};
use crate::adapter::outbound::sqlite::database::model::{
    FileMetadataSchemaRow, RegistrationSchemaRow, SchemaBlockRow,
};
use crate::adapter::outbound::sqlite::database::schema::{
    file_metadata_schemas, registration_schema_blocks, registration_schemas,
};
use crate::domain::{
    BlockId, FileMetadataSchema, RegistrationSchema, Schema, SchemaBlock, SchemaId,
};
use crate::error::{Error, Result};
use crate::port::outbound::store::SchemaStore;

fn registration_to_row(schema: &RegistrationSchema) -> Result<RegistrationSchemaRow> {
    let base = &schema.base;
    Ok(RegistrationSchemaRow {
        id: base.id.to_string(),
        name: base.name.clone(),
        schema: to_json(&base.schema)?,
        category: base.category.clone(),
        active: base.active,
        visible: base.visible,
        schema_version: base.schema_version,
        config: to_json(&schema.config)?,
        description: schema.description.clone(),
        created: timestamp(&base.created),
        modified: timestamp(&base.modified),
    })
}

fn registration_from_row(row: RegistrationSchemaRow) -> Result<RegistrationSchema> {
    Ok(RegistrationSchema {
        base: Schema {
            id: SchemaId::from(row.id),
            name: row.name,
            schema: from_json(&row.schema)?,
            category: row.category,
            active: row.active,
            visible: row.visible,
            schema_version: row.schema_version,
            created: parse_timestamp(&row.created)?,
            modified: parse_timestamp(&row.modified)?,
        },
        config: from_json(&row.config)?,
        description: row.description,
    })
}

fn file_metadata_from_row(row: FileMetadataSchemaRow) -> Result<FileMetadataSchema> {
    Ok(FileMetadataSchema {
        base: Schema {
            id: SchemaId::from(row.id),
            name: row.name,
            schema: from_json(&row.schema)?,
            category: row.category,
            active: row.active,
            visible: row.visible,
            schema_version: row.schema_version,
            created: parse_timestamp(&row.created)?,
            modified: parse_timestamp(&row.modified)?,
        },
    })
}

fn block_to_row(block: &SchemaBlock) -> SchemaBlockRow {
    SchemaBlockRow {
        id: block.id.to_string(),
        schema_id: block.schema_id.to_string(),
        position: block.position,
        help_text: block.help_text.clone(),
        example_text: block.example_text.clone(),
        registration_response_key: block.registration_response_key.clone(),
        schema_block_group_key: block.schema_block_group_key.clone(),
        block_type: block.block_type.as_str().to_string(),
        display_text: block.display_text.clone(),
        required: block.required,
    }
}

fn block_from_row(row: SchemaBlockRow) -> Result<SchemaBlock> {
    Ok(SchemaBlock {
        id: BlockId::from(row.id),
        schema_id: SchemaId::from(row.schema_id),
        position: row.position,
        help_text: row.help_text,
        example_text: row.example_text,
        registration_response_key: row.registration_response_key,
        schema_block_group_key: row.schema_block_group_key,
        block_type: row.block_type.parse()?,
        display_text: row.display_text,
        required: row.required,
    })
}

impl SchemaStore for SqliteStore {
    async fn save_registration_schema(&self, schema: &RegistrationSchema) -> Result<()> {
        let row = registration_to_row(schema)?;
        let mut conn = self.conn()?;

        diesel::insert_into(registration_schemas::table)
            .values(&row)
            .on_conflict(registration_schemas::id)
            .do_update()
            .set(&row)
            .execute(&mut *conn)?;

        Ok(())
    }

    async fn registration_schema(&self, id: &SchemaId) -> Result<Option<RegistrationSchema>> {
        let mut conn = self.conn()?;

        let row: Option<RegistrationSchemaRow> = registration_schemas::table
            .find(id.as_str())
            .first(&mut *conn)
            .optional()?;

        row.map(registration_from_row).transpose()
    }

    async fn registration_schema_version(
        &self,
        name: &str,
        version: i32,
    ) -> Result<Option<RegistrationSchema>> {
        let mut conn = self.conn()?;

        let row: Option<RegistrationSchemaRow> = registration_schemas::table
            .filter(registration_schemas::name.eq(name))
            .filter(registration_schemas::schema_version.eq(version))
            .first(&mut *conn)
            .optional()?;

        row.map(registration_from_row).transpose()
    }

    async fn registration_schemas(&self) -> Result<Vec<RegistrationSchema>> {
        let mut conn = self.conn()?;

        let rows: Vec<RegistrationSchemaRow> = registration_schemas::table
            .order((
                registration_schemas::name.asc(),
                registration_schemas::schema_version.asc(),
            ))
            .load(&mut *conn)?;

        rows.into_iter().map(registration_from_row).collect()
    }

    async fn save_file_metadata_schema(&self, schema: &FileMetadataSchema) -> Result<()> {
        let base = &schema.base;
        let row = FileMetadataSchemaRow {
            id: base.id.to_string(),
            name: base.name.clone(),
            schema: to_json(&base.schema)?,
            category: base.category.clone(),
            active: base.active,
            visible: base.visible,
            schema_version: base.schema_version,
            created: timestamp(&base.created),
            modified: timestamp(&base.modified),
        };
        let mut conn = self.conn()?;

        diesel::insert_into(file_metadata_schemas::table)
            .values(&row)
            .on_conflict(file_metadata_schemas::id)
            .do_update()
            .set(&row)
            .execute(&mut *conn)?;

        Ok(())
    }

    async fn file_metadata_schemas(&self) -> Result<Vec<FileMetadataSchema>> {
        let mut conn = self.conn()?;

        let rows: Vec<FileMetadataSchemaRow> = file_metadata_schemas::table
            .order((
                file_metadata_schemas::name.asc(),
                file_metadata_schemas::schema_version.asc(),
            ))
            .load(&mut *conn)?;

        rows.into_iter().map(file_metadata_from_row).collect()
    }

    async fn replace_blocks(&self, schema_id: &SchemaId, blocks: &[SchemaBlock]) -> Result<()> {
        let rows: Vec<SchemaBlockRow> = blocks.iter().map(block_to_row).collect();
        let mut conn = self.conn()?;

        conn.transaction::<_, Error, _>(|conn| {
            diesel::delete(
                registration_schema_blocks::table
                    .filter(registration_schema_blocks::schema_id.eq(schema_id.as_str())),
            )
            .execute(conn)?;
            diesel::insert_into(registration_schema_blocks::table)
                .values(&rows)
                .execute(conn)?;
            Ok(())
        })
    }

    async fn blocks(&self, schema_id: &SchemaId) -> Result<Vec<SchemaBlock>> {
        let mut conn = self.conn()?;

        let rows: Vec<SchemaBlockRow> = registration_schema_blocks::table
            .filter(registration_schema_blocks::schema_id.eq(schema_id.as_str()))
            .order(registration_schema_blocks::position.asc())
            .load(&mut *conn)?;

        rows.into_iter().map(block_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::testkit::store::memory_store;
    use super::*;
    use crate::domain::schema_block::{blocks_from_specs, BlockSpec};

    #[tokio::test]
    async fn registration_schema_roundtrip() {
        let store = memory_store();
        let mut schema = RegistrationSchema::new("Prereg", 2, json!({"pages": []}));
        schema.config = json!({"hasFiles": true});
        schema.description = Some("Preregistration".into());
        store.save_registration_schema(&schema).await.unwrap();

        let loaded = store.registration_schema(schema.id()).await.unwrap().unwrap();
        assert_eq!(loaded, schema);
        assert!(loaded.has_files());

        let by_version = store
            .registration_schema_version("Prereg", 2)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_version.id(), schema.id());
        assert!(store
            .registration_schema_version("Prereg", 3)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn name_and_version_are_unique() {
        let store = memory_store();
        store
            .save_registration_schema(&RegistrationSchema::new("Prereg", 1, json!({})))
            .await
            .unwrap();
        let duplicate = RegistrationSchema::new("Prereg", 1, json!({}));
        assert!(matches!(
            store.save_registration_schema(&duplicate).await,
            Err(Error::Database(_))
        ));
    }

    #[tokio::test]
    async fn blocks_replace_and_order_by_position() {
        let store = memory_store();
        let schema = RegistrationSchema::new("Atomic", 1, json!({}));
        store.save_registration_schema(&schema).await.unwrap();

        let spec = |t: &str, key: Option<&str>| BlockSpec {
            block_type: t.into(),
            registration_response_key: key.map(str::to_string),
            ..BlockSpec::default()
        };
        let blocks = blocks_from_specs(
            schema.id(),
            &[
                spec("page-heading", None),
                spec("question-label", None),
                spec("short-text-input", Some("q1")),
                spec("paragraph", Some("")),
                spec("paragraph", Some("")),
            ],
        )
        .unwrap();
        store.replace_blocks(schema.id(), &blocks).await.unwrap();
        store.replace_blocks(schema.id(), &blocks).await.unwrap();

        let loaded = store.blocks(schema.id()).await.unwrap();
        assert_eq!(loaded.len(), 5);
        assert_eq!(loaded, blocks);
    }

    #[tokio::test]
    async fn duplicate_response_keys_are_rejected() {
        let store = memory_store();
        let schema = RegistrationSchema::new("Atomic", 1, json!({}));
        store.save_registration_schema(&schema).await.unwrap();

        let mut first = SchemaBlock::new(schema.id().clone(), crate::domain::BlockType::ShortTextInput, "");
        first.registration_response_key = Some("q1".into());
        let mut second = first.clone();
        second.id = BlockId::generate();

        assert!(store.replace_blocks(schema.id(), &[first, second]).await.is_err());
        // The failed replace leaves nothing behind.
        assert!(store.blocks(schema.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_metadata_schemas_are_listed() {
        let store = memory_store();
        store
            .save_file_metadata_schema(&FileMetadataSchema::new("datacite", 1, json!({})))
            .await
            .unwrap();
        let listed = store.file_metadata_schemas().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].base.name, "datacite");
    }
}
