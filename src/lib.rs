//! Blueprint Core - Blueprint String Decoder
//!
//! # Wire Format
//! `raw := "0" + base64std(zlib(utf8_json(document)))`
//!
//! # Stages
//! 1. Decode: marker, text encoding, decompression, JSON parse
//! 2. Extract: classify blueprint or book, derive histogram, dimensions and version
//!
//! Both stages are pure functions of their input.

pub mod config;
pub mod decoder;
pub mod fields;
pub mod metadata;
pub mod hashing;
pub mod pipeline;

pub use config::{ConfigError, ParserConfig};
pub use decoder::{decode, decode_with, encode, EncodeError, FormatError};
pub use metadata::{
    calculate_dimensions, decode_version, extract, BlueprintMetadata, BookMetadata, Dimensions,
    Metadata, SchemaError, Version,
};
pub use hashing::document_fingerprint;
pub use pipeline::{BlueprintParser, ParseError, ParsedBlueprint};

/// The only wire-format version marker currently defined.
pub const FORMAT_MARKER: char = '0';
