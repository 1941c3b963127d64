//! The closed catalogue of block kinds in the content tree.
//!
//! Block types travel in kebab-case on the wire (`RichText` is
//! `"rich-text"`). A few kinds are query-only: the mutation api does not
//! accept them yet.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    Document,
    Text,
    RichText,
    Number,
    Boolean,
    Date,
    Select,
    Reference,
    Media,
    List,
    Component,
    Instance,
    Color,
    Icon,
    CodeSnippet,
    OgImage,
    Event,
    Workflow,
}

impl BlockType {
    pub const ALL: [BlockType; 18] = [
        BlockType::Document,
        BlockType::Text,
        BlockType::RichText,
        BlockType::Number,
        BlockType::Boolean,
        BlockType::Date,
        BlockType::Select,
        BlockType::Reference,
        BlockType::Media,
        BlockType::List,
        BlockType::Component,
        BlockType::Instance,
        BlockType::Color,
        BlockType::Icon,
        BlockType::CodeSnippet,
        BlockType::OgImage,
        BlockType::Event,
        BlockType::Workflow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Document => "document",
            BlockType::Text => "text",
            BlockType::RichText => "rich-text",
            BlockType::Number => "number",
            BlockType::Boolean => "boolean",
            BlockType::Date => "date",
            BlockType::Select => "select",
            BlockType::Reference => "reference",
            BlockType::Media => "media",
            BlockType::List => "list",
            BlockType::Component => "component",
            BlockType::Instance => "instance",
            BlockType::Color => "color",
            BlockType::Icon => "icon",
            BlockType::CodeSnippet => "code-snippet",
            BlockType::OgImage => "og-image",
            BlockType::Event => "event",
            BlockType::Workflow => "workflow",
        }
    }

    /// Whether the mutation api accepts create/update values for this kind.
    /// og-image, event and workflow blocks are query-only.
    pub fn supports_mutation(&self) -> bool {
        !matches!(
            self,
            BlockType::OgImage | BlockType::Event | BlockType::Workflow
        )
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference document served by the `get_block_types` tool and linked from
/// structure responses. Kept as markdown so agents can consume it directly.
pub const BLOCK_TYPE_REFERENCE: &str = r##"IMPORTANT: block types in mutations are written in kebab-case. E.g: RichText is written as 'rich-text'.

# Canopy Block Types

## document
Container for other blocks. Access directly by field name.
- Value Type: defined by its children (array of blocks).
- Mutation Usage: `fieldName: { ... }` with the values for the children blocks.
- Query Usage: `fieldName { childFieldName, _sys { id } }`

## text
Simple text field.
- Value Type: `string`
- Mutation Usage: `"some string"`
- Query Usage: `fieldName`

## rich-text
Rich text with multiple output formats.
- Mutation Value Type: `{ format: "markdown" | "html", value: string }` or `{ format: "json", value: any }`
- Mutation Usage: `{ format: "markdown", value: "# Hello" }`
- Query Usage: `fieldName { html }`, `fieldName { markdown }`, `fieldName { json { content, toc } }`, `fieldName { plainText }`, `fieldName { readingTime(wpm: 200) }`

## number
Numeric value.
- Value Type: `number`
- Mutation Usage: `123`
- Query Usage: `fieldName`

## boolean
True/false value.
- Value Type: `boolean`
- Mutation Usage: `true`
- Query Usage: `fieldName`

## date
Date, optionally with time.
- Value Type: `string` (ISO date string)
- Mutation Usage: `"2023-01-01T00:00:00.000Z"`
- Query Usage: `fieldName`

## select
Single or multiple choice from a set of options.
- Value Type: `string`, `string[]` or `null`
- Mutation Usage: `"option1"` or `["option1", "option2"]`
- Query Usage: `fieldName`

## reference
Reference to other blocks.
- Mutation Value Type: a block id string, `{ type: "instance", ... }`, or an array of either.
- Mutation Usage: `"block-id"`
- Query Usage: `fieldName { ... on ReferencedType { fieldName } }`

## media
File upload (image, video, audio or generic file). Resolves to a union of Image, Video, Audio and File.
- Mutation Value Type: `{ url: string, fileName?: string, altText?: string, duration?: number }`
- Mutation Usage: `{ url: "...", fileName: "..." }`
- Query Usage: `fieldName { ... on BlockImage { url(width: 200) alt } ... on BlockVideo { url duration } }`

## list (Collection)
Array of blocks of a specific type.
- Mutation Value Type: `{ template: string | Array<{ type: string, ... }>, rows?: Array<{ type: "instance", ... }> }`
- Query Usage: `fieldName(first: 10) { items { ... } _meta { totalCount } }`

## component
Reusable block with custom display options.
- Value Type: `Array<{ type: string, ... }>`
- Mutation Usage: `{ ... }` with the component's field values.
- Query Usage: `fieldName { childFieldName }`

## instance
Instance of a component block.
- Value Type: `{ mainComponentId?: string, value?: Record<string, unknown> | null }`
- Mutation Usage: `{ mainComponentId: "...", value: { ... } }`
- Query Usage: `fieldName { ... on ComponentType { childFieldName } }`

## color
Color value.
- Value Type: `string` (e.g. "#RRGGBB")
- Mutation Usage: `"#FF5733"`
- Query Usage: `fieldName { hex rgb hsl }`

## icon
Icon value.
- Value Type: `string`
- Mutation Usage: `"icon-name"`
- Query Usage: `fieldName`

## code-snippet
Code with language.
- Mutation Value Type: `{ code: string, language?: string | null }`
- Mutation Usage: `{ code: "...", language: "..." }`
- Query Usage: `fieldName { code language html }`

## og-image
Open Graph image.
- Mutation Usage: not supported for mutations.
- Query Usage: `fieldName { url width height }`

## event
Analytics event tracking.
- Mutation Usage: not supported for mutations.
- Query Usage: `fieldName { ingestKey, adminKey, schema }`. The `adminKey` should not be exposed publicly.

## workflow
Custom workflows.
- Mutation Usage: not supported for mutations.
- Query Usage: `fieldName { webhookSecret }`
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case_wire_names() {
        assert_eq!(
            serde_json::to_value(BlockType::RichText).unwrap(),
            serde_json::json!("rich-text")
        );
        assert_eq!(
            serde_json::to_value(BlockType::CodeSnippet).unwrap(),
            serde_json::json!("code-snippet")
        );
        let parsed: BlockType = serde_json::from_str("\"og-image\"").unwrap();
        assert_eq!(parsed, BlockType::OgImage);
    }

    #[test]
    fn test_as_str_matches_serde() {
        for block_type in BlockType::ALL {
            let wire = serde_json::to_value(block_type).unwrap();
            assert_eq!(wire, serde_json::json!(block_type.as_str()));
        }
    }

    #[test]
    fn test_query_only_kinds() {
        assert!(!BlockType::OgImage.supports_mutation());
        assert!(!BlockType::Event.supports_mutation());
        assert!(!BlockType::Workflow.supports_mutation());
        assert!(BlockType::Document.supports_mutation());
        assert!(BlockType::RichText.supports_mutation());
    }

    #[test]
    fn test_reference_covers_every_kind() {
        for block_type in BlockType::ALL {
            assert!(
                BLOCK_TYPE_REFERENCE.contains(&format!("## {}", block_type.as_str())),
                "missing section for {}",
                block_type
            );
        }
    }
}
