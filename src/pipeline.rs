//! Parse Pipeline - Single Entry Point
//!
//! Decode then extract. A failure at either stage returns no metadata.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ParserConfig;
use crate::decoder::{decode_with, FormatError};
use crate::hashing::document_fingerprint;
use crate::metadata::{extract, Metadata, SchemaError};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ParseError {
    pub fn reason(&self) -> &'static str {
        match self {
            ParseError::Format(e) => e.reason(),
            ParseError::Schema(e) => e.reason(),
        }
    }
}

/// Metadata plus a fingerprint of the decoded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedBlueprint {
    pub metadata: Metadata,
    pub fingerprint: String,
}

/// Stateless; one parser may be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct BlueprintParser {
    config: ParserConfig,
}

impl BlueprintParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Decode a blueprint string into its JSON document.
    pub fn decode(&self, raw: &str) -> Result<serde_json::Value, FormatError> {
        decode_with(raw, &self.config)
    }

    /// Decode and extract metadata in one call.
    pub fn parse(&self, raw: &str) -> Result<Metadata, ParseError> {
        let document = self.decode(raw)?;
        Ok(extract(&document)?)
    }

    /// Like [`parse`](Self::parse), also fingerprinting the decoded document.
    pub fn parse_report(&self, raw: &str) -> Result<ParsedBlueprint, ParseError> {
        let document = self.decode(raw)?;
        let metadata = extract(&document)?;
        Ok(ParsedBlueprint {
            metadata,
            fingerprint: document_fingerprint(&document),
        })
    }
}
