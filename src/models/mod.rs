//! Document models
//!
//! This module contains the externally visible tree types: scalar values and
//! the schema-governed document node.

pub mod node;
pub mod value;

// Re-export commonly used types
pub use node::{ChildValue, DocumentNode};
pub use value::Value;
