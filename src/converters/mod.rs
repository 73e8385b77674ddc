//! Format converters
//!
//! Readers that turn external notation text into document trees.

pub mod musicxml;

pub use musicxml::{parse_musicxml, ParseError, ParseOptions};
