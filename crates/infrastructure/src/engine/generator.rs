//! Declarative generator definitions.
//!
//! A generator definition turns workspace blocks into code for one
//! generator namespace:
//!
//! ```json
//! {
//!   "namespace": "Blockly.Dart",
//!   "statement": "{code};",
//!   "program": "main() {\n{body}\n}",
//!   "indent": "  ",
//!   "blocks": { "text": "{TEXT|quote}" }
//! }
//! ```
//!
//! Block templates reference fields as `{NAME}` (verbatim) or `{NAME|quote}`
//! (a string literal in the definition's quote style). Each rendered block
//! is wrapped by `statement`, the statements are joined with newlines and
//! indented, and the body is wrapped by `program`.

use std::collections::HashMap;
use std::sync::LazyLock;

use blockgen_application::EngineError;
use regex::{Captures, Regex};
use serde::Deserialize;

use super::blocks::BlockCatalog;
use super::workspace::WorkspaceBlock;
use crate::serialization::from_json;

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)(\|quote)?\}").expect("valid regex"));

const CODE_SLOT: &str = "{code}";
const BODY_SLOT: &str = "{body}";

fn default_quote() -> char {
    '\''
}

fn default_statement() -> String {
    CODE_SLOT.to_string()
}

fn default_program() -> String {
    BODY_SLOT.to_string()
}

/// Code templates for one generator namespace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratorDefinition {
    namespace: String,
    #[serde(default = "default_quote")]
    quote: char,
    #[serde(default = "default_statement")]
    statement: String,
    #[serde(default = "default_program")]
    program: String,
    #[serde(default)]
    indent: String,
    #[serde(default)]
    blocks: HashMap<String, String>,
}

impl GeneratorDefinition {
    /// Parses a generator definition.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Rejected`] for malformed JSON or an empty
    /// namespace.
    pub fn parse(source: &str) -> Result<Self, EngineError> {
        let definition: Self =
            from_json(source).map_err(|e| EngineError::Rejected(e.to_string()))?;
        if definition.namespace.trim().is_empty() {
            return Err(EngineError::Rejected(
                "generator definition without a namespace".to_string(),
            ));
        }
        Ok(definition)
    }

    /// Returns the generator namespace this definition serves.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Renders top-level workspace blocks into a program.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Script`] if a block type was never defined or
    /// this generator has no template for it.
    pub fn render(
        &self,
        workspace: &[WorkspaceBlock],
        catalog: &BlockCatalog,
    ) -> Result<String, EngineError> {
        let statements = workspace
            .iter()
            .map(|block| {
                let code = self.render_block(block, catalog)?;
                Ok(self.statement.replace(CODE_SLOT, &code))
            })
            .collect::<Result<Vec<_>, EngineError>>()?;

        let body = statements
            .join("\n")
            .lines()
            .map(|line| {
                if line.is_empty() {
                    String::new()
                } else {
                    format!("{}{line}", self.indent)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(self.program.replace(BODY_SLOT, &body))
    }

    fn render_block(
        &self,
        block: &WorkspaceBlock,
        catalog: &BlockCatalog,
    ) -> Result<String, EngineError> {
        let block_type = block.block_type();
        if catalog.get(block_type).is_none() {
            return Err(EngineError::Script(format!(
                "unknown block type `{block_type}`"
            )));
        }
        let template = self.blocks.get(block_type).ok_or_else(|| {
            EngineError::Script(format!(
                "{} has no generator for block type `{block_type}`",
                self.namespace
            ))
        })?;

        let code = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
            let value = block.field(&caps[1]).unwrap_or_default();
            if caps.get(2).is_some() {
                self.quote_literal(value)
            } else {
                value.to_string()
            }
        });
        Ok(code.into_owned())
    }

    fn quote_literal(&self, value: &str) -> String {
        let mut literal = String::with_capacity(value.len() + 2);
        literal.push(self.quote);
        for c in value.chars() {
            match c {
                '\\' => literal.push_str("\\\\"),
                '\n' => literal.push_str("\\n"),
                c if c == self.quote => {
                    literal.push('\\');
                    literal.push(c);
                }
                c => literal.push(c),
            }
        }
        literal.push(self.quote);
        literal
    }
}
