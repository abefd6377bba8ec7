//! Handlers for the `schema` command group.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::{SchemaCommand, SchemaListArgs, SchemaValidateArgs};
use crate::adapter::inbound::cli::output;
use crate::application::schema::ImportedSchema;
use crate::domain::{Schema, SchemaId};
use crate::error::{Error, Result};
use crate::infrastructure::bootstrap::Services;

#[derive(Tabled)]
struct SchemaRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: i32,
    #[tabled(rename = "Active")]
    active: bool,
    #[tabled(rename = "Visible")]
    visible: bool,
}

impl From<&Schema> for SchemaRow {
    fn from(schema: &Schema) -> Self {
        Self {
            id: schema.id.to_string(),
            name: schema.name.clone(),
            version: schema.schema_version,
            active: schema.active,
            visible: schema.visible,
        }
    }
}

#[derive(Tabled)]
struct BlockRow {
    #[tabled(rename = "#")]
    position: i32,
    #[tabled(rename = "Type")]
    block_type: &'static str,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Required")]
    required: bool,
    #[tabled(rename = "Text")]
    text: String,
}

pub async fn execute(services: &Services, command: SchemaCommand) -> Result<()> {
    match command {
        SchemaCommand::Import(args) => import(services, &args.files, args.file_metadata).await,
        SchemaCommand::List(args) => list(services, &args).await,
        SchemaCommand::Show(args) => show(services, &args.id).await,
        SchemaCommand::Validate(args) => validate(services, &args).await,
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| Error::Parse(format!("{}: {e}", path.display())))
}

fn imported_json(imported: &ImportedSchema) -> Value {
    json!({
        "kind": imported.kind,
        "id": imported.id,
        "name": imported.name,
        "schema_version": imported.schema_version,
        "blocks": imported.blocks,
        "created": imported.created,
    })
}

async fn import(services: &Services, files: &[PathBuf], file_metadata: bool) -> Result<()> {
    let mut imported = Vec::with_capacity(files.len());
    for path in files {
        let raw = read_json(path)?;
        let result = if file_metadata {
            services.schemas.import_file_metadata_schema(raw).await?
        } else {
            services.schemas.import_registration_schema(raw).await?
        };

        if !output::is_json() {
            let verb = if result.created { "Imported" } else { "Updated" };
            output::success(&format!(
                "{verb} {} v{} ({} blocks)",
                result.name, result.schema_version, result.blocks
            ));
        }
        imported.push(result);
    }

    if output::is_json() {
        let schemas: Vec<Value> = imported.iter().map(imported_json).collect();
        output::json_output(json!({ "command": "schema.import", "schemas": schemas }));
    }
    Ok(())
}

async fn list(services: &Services, args: &SchemaListArgs) -> Result<()> {
    let only_active = !args.inactive;
    let (schemas, urls): (Vec<Schema>, Vec<String>) = if args.file_metadata {
        services
            .schemas
            .latest_file_metadata_versions(only_active)
            .await?
            .into_iter()
            .map(|s| {
                let url = s.absolute_api_v2_url(&services.urls);
                (s.base, url)
            })
            .unzip()
    } else {
        let schemas = if args.all {
            services.schemas.all().await?
        } else {
            services.schemas.latest_versions(only_active).await?
        };
        schemas
            .into_iter()
            .filter(|s| !only_active || s.base.active)
            .map(|s| {
                let url = s.absolute_api_v2_url(&services.urls);
                (s.base, url)
            })
            .unzip()
    };

    if output::is_json() {
        let entries: Vec<Value> = schemas
            .iter()
            .zip(&urls)
            .map(|(s, url)| {
                json!({
                    "id": s.id,
                    "name": s.name,
                    "schema_version": s.schema_version,
                    "active": s.active,
                    "visible": s.visible,
                    "url": url,
                })
            })
            .collect();
        output::json_output(json!({ "command": "schema.list", "schemas": entries }));
        return Ok(());
    }

    if schemas.is_empty() {
        output::note("No schemas imported");
        output::hint("osfcore schema import <file.json>");
        return Ok(());
    }
    let rows: Vec<SchemaRow> = schemas.iter().map(SchemaRow::from).collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}

async fn show(services: &Services, id: &str) -> Result<()> {
    let id = SchemaId::new(id);
    let schema = services.schemas.get(&id).await?;
    let blocks = services.schemas.blocks(&id).await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "schema.show",
            "schema": schema,
            "url": schema.absolute_api_v2_url(&services.urls),
            "blocks": blocks,
        }));
        return Ok(());
    }

    output::section(&schema.base.name);
    output::field("Id", &schema.base.id);
    output::field("Version", schema.base.schema_version);
    output::field("Active", schema.base.active);
    output::field("URL", schema.absolute_api_v2_url(&services.urls));
    if let Some(description) = &schema.description {
        output::field("About", description);
    }
    output::field("Approval", schema.requires_approval());
    output::field("Consent", schema.requires_consent());
    output::field("Files", schema.has_files());
    let fulfills = schema.fulfills();
    if !fulfills.is_empty() {
        output::field("Fulfills", fulfills.join(", "));
    }

    if blocks.is_empty() {
        return Ok(());
    }
    output::section("Blocks");
    let rows: Vec<BlockRow> = blocks
        .iter()
        .map(|b| BlockRow {
            position: b.position,
            block_type: b.block_type.as_str(),
            key: b
                .registration_response_key
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            required: b.required,
            text: b.display_text.clone(),
        })
        .collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}

async fn validate(services: &Services, args: &SchemaValidateArgs) -> Result<()> {
    let id = SchemaId::new(args.id.as_str());
    let document = read_json(&args.responses)?;
    let required = !args.draft;

    if args.metadata {
        services
            .schemas
            .validate_metadata(&id, &document, false, required)
            .await?;
    } else {
        services
            .schemas
            .validate_registration_responses(&id, &document, required)
            .await?;
    }

    if output::is_json() {
        output::json_output(json!({ "command": "schema.validate", "schema": id, "valid": true }));
    } else {
        output::success("Responses are valid");
    }
    Ok(())
}
