//! Error types for reading MusicXML text

use thiserror::Error;

use crate::error::ModelError;

/// Failure while turning XML text into a document tree
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// XML is not well-formed
    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    /// The document does not fit the catalog
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ParseError {
    pub fn as_model_error(&self) -> Option<&ModelError> {
        match self {
            ParseError::Model(err) => Some(err),
            ParseError::InvalidXml(_) => None,
        }
    }
}
