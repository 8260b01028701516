//! Workspace markup reader.
//!
//! Reads the serialized workspace a command carries:
//!
//! ```xml
//! <xml xmlns="https://developers.google.com/blockly/xml">
//!   <block type="text"><field name="TEXT">test</field></block>
//! </xml>
//! ```
//!
//! Only top-level blocks are generated. Blocks and shadows nested inside
//! them are skipped together with their fields.

use std::sync::LazyLock;

use blockgen_application::EngineError;
use regex::{Captures, Regex};

#[allow(clippy::expect_used)]
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<(block|shadow)\b([^>]*?)(/?)>|</(?:block|shadow)\s*>|<field\b([^>]*?)/>|<field\b([^>]*?)>(.*?)</field\s*>"#,
    )
    .expect("valid regex")
});

#[allow(clippy::expect_used)]
static TYPE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\btype\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});

#[allow(clippy::expect_used)]
static NAME_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bname\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});

#[allow(clippy::expect_used)]
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#x[0-9A-Fa-f]+|#[0-9]+|[A-Za-z]+);").expect("valid regex"));

/// A top-level block read from workspace markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceBlock {
    block_type: String,
    fields: Vec<(String, String)>,
}

impl WorkspaceBlock {
    /// Returns the block type name.
    #[must_use]
    pub fn block_type(&self) -> &str {
        &self.block_type
    }

    /// Returns a field value by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns all fields in document order.
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Reads the top-level blocks of a workspace, in document order.
///
/// # Errors
///
/// Returns [`EngineError::Script`] if block tags are unbalanced or a block
/// has no type.
pub fn read_workspace(markup: &str) -> Result<Vec<WorkspaceBlock>, EngineError> {
    let mut blocks = Vec::new();
    let mut current: Option<WorkspaceBlock> = None;
    let mut depth = 0usize;

    for token in TOKEN.captures_iter(markup) {
        if let Some(tag) = token.get(1) {
            let attributes = token.get(2).map_or("", |m| m.as_str());
            let self_closing = token.get(3).is_some_and(|m| !m.as_str().is_empty());
            let top_level_block = depth == 0 && tag.as_str() == "block";

            if top_level_block {
                let block_type = attribute(&TYPE_ATTR, attributes)
                    .filter(|value| !value.is_empty())
                    .ok_or_else(|| EngineError::Script("block without a type".to_string()))?;
                let block = WorkspaceBlock {
                    block_type,
                    fields: Vec::new(),
                };
                if self_closing {
                    blocks.push(block);
                } else {
                    current = Some(block);
                }
            }
            if !self_closing {
                depth += 1;
            }
        } else if let Some(attributes) = token.get(4).or_else(|| token.get(5)) {
            if depth != 1 {
                continue;
            }
            let Some(block) = current.as_mut() else {
                continue;
            };
            let Some(name) = attribute(&NAME_ATTR, attributes.as_str()) else {
                continue;
            };
            let value = token.get(6).map_or(String::new(), |m| unescape(m.as_str()));
            block.fields.push((name, value));
        } else {
            depth = depth
                .checked_sub(1)
                .ok_or_else(|| EngineError::Script("unbalanced closing block tag".to_string()))?;
            if depth == 0 {
                blocks.extend(current.take());
            }
        }
    }

    if depth != 0 {
        return Err(EngineError::Script("unclosed block tag".to_string()));
    }
    Ok(blocks)
}

fn attribute(pattern: &Regex, attributes: &str) -> Option<String> {
    let captures = pattern.captures(attributes)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| unescape(m.as_str()))
}

/// Replaces XML character and entity references. Unknown entities are kept.
fn unescape(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                    .and_then(Result::ok)
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
