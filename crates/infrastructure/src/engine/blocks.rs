//! Block definitions in Blockly's JSON shape.

use std::collections::HashMap;

use blockgen_application::EngineError;
use serde::Deserialize;

use crate::serialization::from_json;

#[derive(Debug, Deserialize)]
struct RawBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    args0: Vec<RawArg>,
}

#[derive(Debug, Deserialize)]
struct RawArg {
    #[serde(rename = "type")]
    arg_type: String,
    #[serde(default)]
    name: Option<String>,
}

/// A block type and the names of its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDefinition {
    block_type: String,
    fields: Vec<String>,
}

impl BlockDefinition {
    /// Returns the block type name.
    #[must_use]
    pub fn block_type(&self) -> &str {
        &self.block_type
    }

    /// Returns the field names in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Parses a JSON array of block definitions.
    ///
    /// Only `field_*` arguments count as fields; inputs are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Rejected`] for malformed JSON or an entry with
    /// an empty type.
    pub fn parse_all(source: &str) -> Result<Vec<Self>, EngineError> {
        let raw: Vec<RawBlock> =
            from_json(source).map_err(|e| EngineError::Rejected(e.to_string()))?;

        raw.into_iter()
            .map(|block| {
                if block.block_type.trim().is_empty() {
                    return Err(EngineError::Rejected(
                        "block definition without a type".to_string(),
                    ));
                }
                let fields = block
                    .args0
                    .into_iter()
                    .filter(|arg| arg.arg_type.starts_with("field_"))
                    .filter_map(|arg| arg.name)
                    .collect();
                Ok(Self {
                    block_type: block.block_type,
                    fields,
                })
            })
            .collect()
    }
}

/// Every block type loaded into one engine session.
#[derive(Debug, Default)]
pub struct BlockCatalog {
    blocks: HashMap<String, BlockDefinition>,
}

impl BlockCatalog {
    /// Adds definitions. A later definition of the same type replaces the
    /// earlier one.
    pub fn extend(&mut self, definitions: impl IntoIterator<Item = BlockDefinition>) {
        for definition in definitions {
            self.blocks.insert(definition.block_type.clone(), definition);
        }
    }

    /// Looks up a block type.
    #[must_use]
    pub fn get(&self, block_type: &str) -> Option<&BlockDefinition> {
        self.blocks.get(block_type)
    }

    /// Returns the number of known block types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if no block type is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TEXT_BLOCK: &str = r#"[
        {
            "type": "text",
            "message0": "\" %1 \"",
            "args0": [{ "type": "field_input", "name": "TEXT", "text": "" }],
            "output": "String",
            "colour": 160
        },
        {
            "type": "text_print",
            "message0": "print %1",
            "args0": [{ "type": "input_value", "name": "TEXT" }]
        }
    ]"#;

    #[test]
    fn test_parse_collects_field_names() {
        let definitions = BlockDefinition::parse_all(TEXT_BLOCK).expect("parse");
        assert_eq!(definitions.len(), 2);
        assert_eq!(definitions[0].block_type(), "text");
        assert_eq!(definitions[0].fields(), ["TEXT".to_string()]);
        assert!(definitions[1].fields().is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            BlockDefinition::parse_all("syntax error"),
            Err(EngineError::Rejected(_))
        ));
        assert!(matches!(
            BlockDefinition::parse_all(r#"[{ "type": "" }]"#),
            Err(EngineError::Rejected(_))
        ));
        assert!(BlockDefinition::parse_all(r#"[{ "args0": [] }]"#).is_err());
    }

    #[test]
    fn test_catalog_replaces_redefined_types() {
        let mut catalog = BlockCatalog::default();
        assert!(catalog.is_empty());

        catalog.extend(BlockDefinition::parse_all(TEXT_BLOCK).expect("parse"));
        catalog.extend(
            BlockDefinition::parse_all(
                r#"[{ "type": "text", "args0": [{ "type": "field_input", "name": "VALUE" }] }]"#,
            )
            .expect("parse"),
        );

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.get("text").map(BlockDefinition::fields),
            Some(&["VALUE".to_string()][..])
        );
        assert!(catalog.get("math_number").is_none());
    }
}
