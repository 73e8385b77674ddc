//! Renderers
//!
//! Output formats for document trees.

pub mod musicxml;

pub use musicxml::{write_document, write_fragment, SerializeOptions};
