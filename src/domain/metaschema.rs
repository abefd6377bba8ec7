//! Compile registration schemas into JSON schemas and validate responses.
//!
//! Two shapes exist. Legacy *metadata* is nested per question
//! (`{qid: {value, comments, extra}}`) and is checked against a schema built
//! from the page/question description. Flat *registration responses*
//! (`{response_key: value}`) are checked against a schema built from the
//! schema blocks.

use serde_json::{json, Map, Value};

use super::jsonschema::{self, Violation};
use super::schema::RegistrationSchema;
use super::schema_block::{BlockType, SchemaBlock};
use crate::error::{Error, Result};

fn comments_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "seenBy": {"type": "array"},
                "canDelete": {"type": "boolean"},
                "created": {"type": "string"},
                "lastModified": {"type": "string"},
                "author": {"type": "string"},
                "value": {"type": "string"},
                "isOwner": {"type": "boolean"},
                "getAuthor": {"type": "string"},
                "user": {
                    "type": "object",
                    "additionalProperties": true,
                    "properties": {
                        "fullname": {"type": "string"},
                        "id": {"type": "integer"}
                    }
                },
                "saved": {"type": "boolean"},
                "canEdit": {"type": "boolean"},
                "isDeleted": {"type": "boolean"}
            }
        }
    })
}

fn upload_extra_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "additionalProperties": true,
            "properties": {
                "data": {"type": "object"},
                "nodeId": {"type": "string"},
                "selectedFileName": {"type": "string"},
                "sha256": {"type": "string"},
                "viewUrl": {"type": "string"}
            }
        }
    })
}

/// A question counts as required when it, or any nested property, is.
fn question_required(question: &Value) -> bool {
    if question.get("required").and_then(Value::as_bool) == Some(true) {
        return true;
    }
    question
        .get("properties")
        .and_then(Value::as_array)
        .is_some_and(|props| {
            props
                .iter()
                .any(|p| p.get("required").and_then(Value::as_bool) == Some(true))
        })
}

/// Draft 4 wants enum entries unique and at least one of them; an empty
/// option list leaves the value unconstrained.
fn options_enum(options: &[Value], required: bool) -> Value {
    let mut choices: Vec<Value> = Vec::with_capacity(options.len() + 1);
    for option in options {
        let choice = match option.get("text") {
            Some(text) if option.is_object() && text.as_str().is_some_and(|t| !t.is_empty()) => {
                text.clone()
            }
            _ => option.clone(),
        };
        if !choices.contains(&choice) {
            choices.push(choice);
        }
    }
    let empty = Value::String(String::new());
    if !required && !choices.is_empty() && !choices.contains(&empty) {
        choices.push(empty);
    }
    if choices.is_empty() {
        return json!({});
    }
    json!({ "enum": choices })
}

fn object_schema(
    question: &Value,
    required_fields: bool,
    is_reviewer: bool,
    is_required: bool,
) -> Result<Value> {
    let mut properties = Map::new();
    let mut required = Vec::new();

    if let Some(props) = question.get("properties").and_then(Value::as_array) {
        for prop in props {
            let id = prop
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::ValidationValue("nested property without an id".into()))?;
            if required_fields && prop.get("required").and_then(Value::as_bool) == Some(true) {
                required.push(Value::String(id.to_string()));
            }
            let prop_required = prop.get("required").and_then(Value::as_bool) == Some(true);
            let mut entry = json!({
                "type": "object",
                "additionalProperties": false,
                "properties": question_values(prop, required_fields, is_reviewer, prop_required)?,
            });
            if required_fields && prop_required {
                entry["required"] = json!(["value"]);
            }
            properties.insert(id.to_string(), entry);
        }
    }

    let mut schema = json!({
        "type": "object",
        "additionalProperties": false,
        "properties": properties,
    });
    if required_fields && is_required {
        schema["required"] = Value::Array(required);
    }
    Ok(schema)
}

fn question_values(
    question: &Value,
    required_fields: bool,
    is_reviewer: bool,
    is_required: bool,
) -> Result<Value> {
    let mut values = Map::new();
    values.insert("value".into(), json!({"type": "string"}));
    values.insert("comments".into(), comments_schema());
    values.insert("extra".into(), json!({"type": "array"}));

    let kind = question.get("type").and_then(Value::as_str);
    match kind {
        Some("object") => {
            values.insert(
                "value".into(),
                object_schema(question, required_fields, is_reviewer, is_required)?,
            );
        }
        Some("choose") => {
            if let Some(options) = question.get("options").and_then(Value::as_array) {
                if !options.is_empty() {
                    let choices = options_enum(options, is_required);
                    match question.get("format").and_then(Value::as_str) {
                        Some("singleselect") => {
                            values.insert("value".into(), choices);
                        }
                        Some("multiselect") => {
                            values.insert("value".into(), json!({"type": "array", "items": choices}));
                        }
                        _ => {}
                    }
                }
            }
        }
        Some("osf-upload") => {
            values.insert("extra".into(), upload_extra_schema());
        }
        _ => {}
    }

    if is_reviewer {
        values.remove("extra");
        if kind != Some("object") {
            values.remove("value");
        }
    }

    Ok(Value::Object(values))
}

/// Every question of a page-based metaschema, in page order.
fn questions(metaschema: &Value) -> Result<Vec<&Value>> {
    let pages = metaschema
        .get("pages")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::ValidationValue("schema has no pages".into()))?;
    let mut out = Vec::new();
    for page in pages {
        if let Some(qs) = page.get("questions").and_then(Value::as_array) {
            out.extend(qs.iter());
        }
    }
    Ok(out)
}

fn qid(question: &Value) -> Result<&str> {
    question
        .get("qid")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::ValidationValue("question without a qid".into()))
}

/// Build the JSON schema for nested registration metadata.
///
/// # Errors
///
/// Returns [`Error::ValidationValue`] when the metaschema is malformed.
pub fn jsonschema_from_metaschema(
    metaschema: &Value,
    required_fields: bool,
    is_reviewer: bool,
) -> Result<Value> {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for question in questions(metaschema)? {
        let id = qid(question)?;
        let is_required = question_required(question);
        if is_required && required_fields {
            required.push(Value::String(id.to_string()));
        }
        let mut entry = json!({
            "type": "object",
            "additionalProperties": false,
            "properties": question_values(question, required_fields, is_reviewer, is_required)?,
        });
        if required_fields && is_required {
            entry["required"] = json!(["value"]);
        }
        properties.insert(id.to_string(), entry);
    }

    let mut schema = json!({
        "type": "object",
        "additionalProperties": false,
        "properties": properties,
    });
    for key in ["description", "title"] {
        if let Some(text) = metaschema.get(key).filter(|v| v.is_string()) {
            schema[key] = text.clone();
        }
    }
    if !required.is_empty() {
        schema["required"] = Value::Array(required);
    }
    Ok(schema)
}

fn file_reference_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": true,
        "properties": {
            "file_id": {"type": "string"},
            "file_name": {"type": "string"},
            "file_urls": {"type": "object"},
            "file_hashes": {"type": "object"}
        }
    })
}

/// Build the flat JSON schema for `registration_responses` from blocks.
///
/// Each input block with a response key becomes a property whose
/// `description` carries the question title.
#[must_use]
pub fn flattened_jsonschema<'a>(blocks: &'a [SchemaBlock], required_fields: bool) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    let group_blocks = |group: Option<&'a String>| {
        blocks
            .iter()
            .filter(move |b| group.is_some() && b.schema_block_group_key.as_ref() == group)
    };

    for block in blocks.iter().filter(|b| b.block_type.is_input()) {
        let Some(key) = block.registration_response_key.as_deref() else {
            continue;
        };
        let group = block.schema_block_group_key.as_ref();
        let title = group_blocks(group)
            .find(|b| b.block_type == BlockType::QuestionLabel)
            .map(|b| b.display_text.clone())
            .unwrap_or_default();
        let options: Vec<Value> = group_blocks(group)
            .filter(|b| b.block_type.is_option())
            .map(|b| Value::String(b.display_text.clone()))
            .collect();
        let is_required = required_fields && block.required;

        let mut property = match block.block_type {
            BlockType::SingleSelectInput => {
                let mut p = options_enum(&options, block.required);
                p["type"] = json!("string");
                p
            }
            BlockType::MultiSelectInput => {
                json!({"type": "array", "items": options_enum(&options, true)})
            }
            BlockType::FileInput => {
                json!({"type": "array", "items": file_reference_schema()})
            }
            _ => json!({"type": "string"}),
        };
        property["description"] = Value::String(title);
        if is_required {
            if property["type"] == "array" {
                property["minItems"] = json!(1);
            } else {
                property["minLength"] = json!(1);
            }
            required.push(Value::String(key.to_string()));
        }
        properties.insert(key.to_string(), property);
    }

    let mut schema = json!({
        "type": "object",
        "properties": properties,
        "additionalProperties": false,
    });
    if !required.is_empty() {
        schema["required"] = Value::Array(required);
    }
    schema
}

fn check(schema: &Value, instance: &Value) -> Result<std::result::Result<(), Violation>> {
    jsonschema::validate(schema, instance).map_err(Error::ValidationValue)
}

impl RegistrationSchema {
    /// Validate nested registration metadata against this schema's pages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] with a user-facing message naming the
    /// offending question, or [`Error::ValidationValue`] when the schema
    /// itself is malformed.
    pub fn validate_metadata(
        &self,
        metadata: &Value,
        reviewer: bool,
        required_fields: bool,
    ) -> Result<()> {
        let schema = jsonschema_from_metaschema(&self.base.schema, required_fields, reviewer)?;
        let Err(violation) = check(&schema, metadata)? else {
            return Ok(());
        };

        let questions = questions(&self.base.schema)?;
        let title_of = |id: &str| {
            questions
                .iter()
                .find(|q| q.get("qid").and_then(Value::as_str) == Some(id))
                .and_then(|q| q.get("title").and_then(Value::as_str))
                .unwrap_or(id)
                .to_string()
        };
        let at_root = violation.instance_path.is_empty();
        let first_name = violation.names.first().map(String::as_str).unwrap_or_default();

        match violation.schema_path.first().map(String::as_str) {
            Some("required") if at_root => {
                return Err(Error::Validation(format!(
                    "For your registration the '{}' field is required",
                    title_of(first_name)
                )));
            }
            Some("additionalProperties") if at_root => {
                return Err(Error::Validation(format!(
                    "For your registration the '{first_name}' field is extraneous and not permitted in your response."
                )));
            }
            _ => {}
        }

        let question_id = violation.instance_path.first().map(String::as_str);
        if let Some(question) = question_id.and_then(|id| {
            questions
                .iter()
                .find(|q| q.get("qid").and_then(Value::as_str) == Some(id))
        }) {
            let title = question
                .get("title")
                .and_then(Value::as_str)
                .or(question_id)
                .unwrap_or_default();
            if question.get("options").is_some() {
                return Err(Error::Validation(format!(
                    "For your registration your response to the '{title}' field is invalid, your response must be one of the provided options."
                )));
            }
            return Err(Error::Validation(format!(
                "For your registration your response to the '{title}' field is invalid."
            )));
        }

        Err(Error::Validation(violation.message))
    }

    /// Validate flat registration responses against the schema built from
    /// this schema's `blocks`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the offending question, or
    /// [`Error::ValidationValue`] when the compiled schema is malformed.
    pub fn validate_registration_responses(
        &self,
        blocks: &[SchemaBlock],
        responses: &Value,
        required_fields: bool,
    ) -> Result<bool> {
        let schema = flattened_jsonschema(blocks, required_fields);
        let Err(violation) = check(&schema, responses)? else {
            return Ok(true);
        };

        let question_id = violation
            .instance_path
            .first()
            .map(String::as_str)
            .unwrap_or_default();
        let property = schema
            .get("properties")
            .and_then(|p| p.get(question_id))
            .filter(|_| !question_id.is_empty());

        let Some(property) = property else {
            return Err(Error::Validation(violation.message));
        };

        let title = property
            .get("description")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .unwrap_or(question_id);

        if violation.schema_path.first().map(String::as_str) == Some("required") {
            return Err(Error::Validation(format!(
                "For your registration the '{title}' field is required"
            )));
        }
        if property.get("enum").is_some() {
            return Err(Error::Validation(format!(
                "For your registration, your response to the '{title}' field is invalid, your response must be one of the provided options."
            )));
        }
        Err(Error::Validation(format!(
            "For your registration, your response to the '{title}' field is invalid. {}",
            violation.message
        )))
    }
}
