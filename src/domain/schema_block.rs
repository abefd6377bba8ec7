//! Rendered sub-units of a registration schema.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{object_id, BlockId, SchemaId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    PageHeading,
    SectionHeading,
    SubsectionHeading,
    Paragraph,
    QuestionLabel,
    ShortTextInput,
    LongTextInput,
    FileInput,
    ContributorsInput,
    SingleSelectInput,
    MultiSelectInput,
    SelectInputOption,
    SelectOtherOption,
}

impl BlockType {
    pub const ALL: [BlockType; 13] = [
        BlockType::PageHeading,
        BlockType::SectionHeading,
        BlockType::SubsectionHeading,
        BlockType::Paragraph,
        BlockType::QuestionLabel,
        BlockType::ShortTextInput,
        BlockType::LongTextInput,
        BlockType::FileInput,
        BlockType::ContributorsInput,
        BlockType::SingleSelectInput,
        BlockType::MultiSelectInput,
        BlockType::SelectInputOption,
        BlockType::SelectOtherOption,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PageHeading => "page-heading",
            Self::SectionHeading => "section-heading",
            Self::SubsectionHeading => "subsection-heading",
            Self::Paragraph => "paragraph",
            Self::QuestionLabel => "question-label",
            Self::ShortTextInput => "short-text-input",
            Self::LongTextInput => "long-text-input",
            Self::FileInput => "file-input",
            Self::ContributorsInput => "contributors-input",
            Self::SingleSelectInput => "single-select-input",
            Self::MultiSelectInput => "multi-select-input",
            Self::SelectInputOption => "select-input-option",
            Self::SelectOtherOption => "select-other-option",
        }
    }

    /// Blocks that collect a response under a registration response key.
    #[must_use]
    pub const fn is_input(self) -> bool {
        matches!(
            self,
            Self::ShortTextInput
                | Self::LongTextInput
                | Self::FileInput
                | Self::ContributorsInput
                | Self::SingleSelectInput
                | Self::MultiSelectInput
        )
    }

    #[must_use]
    pub const fn is_option(self) -> bool {
        matches!(self, Self::SelectInputOption | Self::SelectOtherOption)
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::InvalidBlockType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaBlock {
    pub id: BlockId,
    pub schema_id: SchemaId,
    /// Position relative to the other blocks of the same schema.
    pub position: i32,
    pub help_text: String,
    pub example_text: Option<String>,
    /// Key in a draft's `registration_responses` map.
    pub registration_response_key: Option<String>,
    /// Links the blocks that render one question.
    pub schema_block_group_key: Option<String>,
    pub block_type: BlockType,
    pub display_text: String,
    pub required: bool,
}

impl SchemaBlock {
    pub fn new(schema_id: SchemaId, block_type: BlockType, display_text: impl Into<String>) -> Self {
        Self {
            id: BlockId::generate(),
            schema_id,
            position: 0,
            help_text: String::new(),
            example_text: None,
            registration_response_key: None,
            schema_block_group_key: None,
            block_type,
            display_text: display_text.into(),
            required: false,
        }
    }

    /// Store empty response keys as `None` so `(schema, key)` uniqueness
    /// only applies to real keys.
    pub fn normalize(&mut self) {
        if self
            .registration_response_key
            .as_deref()
            .is_some_and(str::is_empty)
        {
            self.registration_response_key = None;
        }
    }

    #[must_use]
    pub fn absolute_api_v2_url(&self, schema_url: &str) -> String {
        format!(
            "{}/schema_blocks/{}/",
            schema_url.trim_end_matches('/'),
            self.id
        )
    }
}

/// One entry of an atomic schema's `blocks` list.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BlockSpec {
    pub block_type: String,
    #[serde(default)]
    pub display_text: String,
    #[serde(default)]
    pub help_text: String,
    #[serde(default)]
    pub example_text: Option<String>,
    #[serde(default)]
    pub registration_response_key: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// Turn an ordered list of block specs into blocks for `schema_id`.
///
/// A question label opens a new group; an input that is not preceded by a
/// label in the current group opens one too; options join the current group.
/// Headings and paragraphs belong to no group.
///
/// # Errors
///
/// Returns [`DomainError::InvalidBlockType`] for an unknown block type and
/// [`DomainError::DuplicateResponseKey`] when a response key repeats.
pub fn blocks_from_specs(
    schema_id: &SchemaId,
    specs: &[BlockSpec],
) -> Result<Vec<SchemaBlock>, DomainError> {
    let mut blocks = Vec::with_capacity(specs.len());
    let mut group: Option<String> = None;
    let mut group_has_input = false;
    let mut keys = HashSet::new();

    for (position, spec) in specs.iter().enumerate() {
        let block_type: BlockType = spec.block_type.parse()?;

        let group_key = if block_type == BlockType::QuestionLabel {
            group = Some(object_id());
            group_has_input = false;
            group.clone()
        } else if block_type.is_input() {
            if group.is_none() || group_has_input {
                group = Some(object_id());
            }
            group_has_input = true;
            group.clone()
        } else if block_type.is_option() {
            group.clone()
        } else {
            group = None;
            group_has_input = false;
            None
        };

        let mut block = SchemaBlock::new(schema_id.clone(), block_type, spec.display_text.clone());
        block.position = i32::try_from(position).unwrap_or(i32::MAX);
        block.help_text = spec.help_text.clone();
        block.example_text = spec.example_text.clone();
        block.registration_response_key = spec.registration_response_key.clone();
        block.schema_block_group_key = group_key;
        block.required = spec.required;
        block.normalize();
        if let Some(key) = &block.registration_response_key {
            if !keys.insert(key.clone()) {
                return Err(DomainError::DuplicateResponseKey(key.clone()));
            }
        }
        blocks.push(block);
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(block_type: &str, key: Option<&str>) -> BlockSpec {
        BlockSpec {
            block_type: block_type.to_string(),
            display_text: block_type.to_string(),
            registration_response_key: key.map(str::to_string),
            ..BlockSpec::default()
        }
    }

    #[test]
    fn block_types_parse_from_kebab_case() {
        for t in BlockType::ALL {
            assert_eq!(t.as_str().parse::<BlockType>().unwrap(), t);
        }
        assert!("radio".parse::<BlockType>().is_err());
    }

    #[test]
    fn normalize_turns_empty_key_into_none() {
        let mut block = SchemaBlock::new(SchemaId::new("s"), BlockType::Paragraph, "text");
        block.registration_response_key = Some(String::new());
        block.normalize();
        assert!(block.registration_response_key.is_none());

        block.registration_response_key = Some("q1".into());
        block.normalize();
        assert_eq!(block.registration_response_key.as_deref(), Some("q1"));
    }

    #[test]
    fn groups_follow_question_labels() {
        let schema_id = SchemaId::new("s");
        let blocks = blocks_from_specs(
            &schema_id,
            &[
                spec("page-heading", None),
                spec("question-label", None),
                spec("single-select-input", Some("q1")),
                spec("select-input-option", None),
                spec("select-input-option", None),
                spec("short-text-input", Some("q2")),
                spec("paragraph", None),
            ],
        )
        .unwrap();

        assert!(blocks[0].schema_block_group_key.is_none());
        let q1_group = blocks[1].schema_block_group_key.clone().unwrap();
        assert_eq!(q1_group.len(), 24);
        assert_eq!(blocks[2].schema_block_group_key.as_ref(), Some(&q1_group));
        assert_eq!(blocks[4].schema_block_group_key.as_ref(), Some(&q1_group));
        // Second input in the same group starts its own question.
        assert_ne!(blocks[5].schema_block_group_key.as_ref(), Some(&q1_group));
        assert!(blocks[6].schema_block_group_key.is_none());
        assert_eq!(blocks[6].position, 6);
    }

    #[test]
    fn repeated_response_keys_are_rejected() {
        let err = blocks_from_specs(
            &SchemaId::new("s"),
            &[
                spec("short-text-input", Some("k")),
                spec("paragraph", Some("")),
                spec("long-text-input", Some("k")),
            ],
        )
        .unwrap_err();
        assert_eq!(err, DomainError::DuplicateResponseKey("k".into()));

        // empty keys are not keys
        assert!(blocks_from_specs(
            &SchemaId::new("s"),
            &[spec("paragraph", Some("")), spec("paragraph", Some(""))],
        )
        .is_ok());
    }

    #[test]
    fn block_url_nests_under_schema_url() {
        let mut block = SchemaBlock::new(SchemaId::new("s"), BlockType::Paragraph, "");
        block.id = BlockId::new("b1");
        assert_eq!(
            block.absolute_api_v2_url("https://api.osf.io/v2/schemas/registrations/s/"),
            "https://api.osf.io/v2/schemas/registrations/s/schema_blocks/b1/"
        );
    }
}
