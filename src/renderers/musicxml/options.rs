use serde::{Deserialize, Serialize};

/// Output options for serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializeOptions {
    /// Spaces per depth level
    pub indent: usize,

    /// Emit the `<?xml ...?>` declaration before the root
    pub xml_declaration: bool,

    /// Emit the score-partwise DOCTYPE after the declaration
    pub doctype: bool,

    /// Report the smallest choice alternative in missing-children errors
    pub intelligent_choice: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            xml_declaration: true,
            doctype: false,
            intelligent_choice: false,
        }
    }
}
