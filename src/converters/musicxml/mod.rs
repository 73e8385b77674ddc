//! MusicXML input
//!
//! - **parser**: roxmltree walk feeding the node operations, `ParseOptions`
//! - **errors**: `ParseError`

pub mod errors;
pub mod parser;

pub use errors::ParseError;
pub use parser::{parse_musicxml, ParseOptions};
