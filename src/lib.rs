//! MusicXML Object Model
//!
//! Build MusicXML documents element by element while the schema's content
//! models (which children, in what order, how often) and value constraints
//! (enumerations, ranges, patterns, unions) are enforced, then render the
//! tree as text.
//!
//! ```no_run
//! use musicxml_model::{Schema, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::musicxml()?;
//! let mut pitch = schema.element("pitch")?;
//! pitch.set_child("octave", Value::from(4))?;
//! pitch.set_child("step", Value::from("C"))?;
//! println!("{}", pitch.to_xml()?); // step before octave
//! # Ok(())
//! # }
//! ```
//!
//! # Module Structure
//!
//! - **schema**: catalog loading, type arena, content-model prototypes
//! - **validate**: scalar value validation against simple types
//! - **content**: per-node content-model state (placement, removal, requirements)
//! - **models**: `Value` and the `DocumentNode` facade
//! - **renderers**: text output
//! - **converters**: XML text input
//! - **error**: error taxonomy

pub mod content;
pub mod converters;
pub mod error;
pub mod models;
pub mod renderers;
pub mod schema;
pub mod validate;

pub use content::{ChildKey, ContentInstance, SlotRef};
pub use converters::{parse_musicxml, ParseError, ParseOptions};
pub use error::{ModelError, RejectionReason, SchemaError, Violation};
pub use models::{ChildValue, DocumentNode, Value};
pub use renderers::SerializeOptions;
pub use schema::{ElementKind, Schema};
