//! MusicXML text output
//!
//! - **options**: `SerializeOptions` (indentation, declaration, DOCTYPE)
//! - **writer**: depth-indented element writer; strict nodes are checked first

pub mod options;
pub mod writer;

pub use options::SerializeOptions;
pub use writer::{write_document, write_fragment, PARTWISE_DOCTYPE, XML_DECLARATION};
