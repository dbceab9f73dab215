//! Metadata Extraction
//!
//! Classifies a decoded document as a single blueprint or a blueprint book
//! and derives the metadata record stored alongside the raw string.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::debug;

use crate::fields::Fields;

pub const BLUEPRINT_KEY: &str = "blueprint";
pub const BOOK_KEY: &str = "blueprint_book";

pub const DEFAULT_BLUEPRINT_NAME: &str = "Untitled Blueprint";
pub const DEFAULT_BOOK_NAME: &str = "Untitled Blueprint Book";
pub const UNKNOWN_ENTITY: &str = "unknown";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Invalid blueprint data: missing blueprint or blueprint_book key")]
    MissingKind,

    #[error("Invalid blueprint data: {key} is not an object")]
    NotAnObject { key: &'static str },
}

impl SchemaError {
    pub fn reason(&self) -> &'static str {
        match self {
            SchemaError::MissingKind => "missing blueprint or blueprint_book key",
            SchemaError::NotAnObject { .. } => "blueprint data is not an object",
        }
    }
}

/// Metadata record, tagged by `type` when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Metadata {
    Blueprint(BlueprintMetadata),
    #[serde(rename = "blueprint_book")]
    Book(BookMetadata),
}

impl Metadata {
    pub fn name(&self) -> &str {
        match self {
            Metadata::Blueprint(bp) => &bp.name,
            Metadata::Book(book) => &book.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Metadata::Blueprint(bp) => &bp.description,
            Metadata::Book(book) => &book.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintMetadata {
    pub name: String,
    pub description: String,
    pub entity_count: u64,
    pub entity_counts: BTreeMap<String, u64>,
    pub width: u64,
    pub height: u64,
    pub version_major: u16,
    pub version_minor: u16,
    pub version_patch: u16,
}

impl BlueprintMetadata {
    pub fn version(&self) -> Version {
        Version {
            major: self.version_major,
            minor: self.version_minor,
            patch: self.version_patch,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions { width: self.width, height: self.height }
    }

    /// One `(entity_name, entity_count)` row per distinct entity, sorted by name.
    pub fn entity_rows(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.entity_counts.iter().map(|(name, count)| (name.as_str(), *count))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMetadata {
    pub name: String,
    pub description: String,
    pub blueprint_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u64,
    pub height: u64,
}

/// Major, minor and patch of a packed 64-bit game version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl From<Version> for semver::Version {
    fn from(v: Version) -> Self {
        semver::Version::new(v.major.into(), v.minor.into(), v.patch.into())
    }
}

/// Extract metadata from a decoded document.
///
/// `blueprint` wins over `blueprint_book` when both keys exist.
pub fn extract(doc: &Value) -> Result<Metadata, SchemaError> {
    if let Some(bp) = doc.get(BLUEPRINT_KEY) {
        let bp = bp.as_object().ok_or(SchemaError::NotAnObject { key: BLUEPRINT_KEY })?;
        debug!("classified as blueprint");
        return Ok(Metadata::Blueprint(extract_blueprint(bp)));
    }

    if let Some(book) = doc.get(BOOK_KEY) {
        let book = book.as_object().ok_or(SchemaError::NotAnObject { key: BOOK_KEY })?;
        debug!("classified as blueprint book");
        return Ok(Metadata::Book(extract_book(book)));
    }

    Err(SchemaError::MissingKind)
}

fn extract_book(book: &Map<String, Value>) -> BookMetadata {
    // Nested entries are counted, not unpacked.
    let blueprints: &[Value] = book.field("blueprints").unwrap_or_default();

    BookMetadata {
        name: book.field_or("label", DEFAULT_BOOK_NAME).to_string(),
        description: book.field_or("description", "").to_string(),
        blueprint_count: blueprints.len() as u64,
    }
}

fn extract_blueprint(bp: &Map<String, Value>) -> BlueprintMetadata {
    let entities: &[Value] = bp.field("entities").unwrap_or_default();

    let mut entity_counts = BTreeMap::new();
    for entity in entities {
        let name = entity.field_or("name", UNKNOWN_ENTITY);
        *entity_counts.entry(name.to_string()).or_insert(0u64) += 1;
    }

    let dims = calculate_dimensions(entities);
    // A negative version keeps its two's-complement bits.
    let packed = bp
        .field::<u64>("version")
        .or_else(|| bp.field::<i64>("version").map(|v| v as u64))
        .unwrap_or(0);
    let version = decode_version(packed);
    debug!(entities = entities.len(), %version, width = dims.width, height = dims.height, "blueprint extracted");

    BlueprintMetadata {
        name: bp.field_or("label", DEFAULT_BLUEPRINT_NAME).to_string(),
        description: bp.field_or("description", "").to_string(),
        entity_count: entities.len() as u64,
        entity_counts,
        width: dims.width,
        height: dims.height,
        version_major: version.major,
        version_minor: version.minor,
        version_patch: version.patch,
    }
}

/// Approximate footprint from the bounding box of entity positions.
///
/// Each axis collects coordinates independently, so an entity whose position
/// has only `x` widens the box without affecting its height. If either axis
/// has no coordinates both dimensions are zero.
pub fn calculate_dimensions(entities: &[Value]) -> Dimensions {
    let positions: Vec<&Map<String, Value>> = entities
        .iter()
        .filter_map(|e| e.field("position"))
        .collect();

    let xs: Vec<&Number> = positions.iter().filter_map(|p| p.field("x")).collect();
    let ys: Vec<&Number> = positions.iter().filter_map(|p| p.field("y")).collect();

    match (axis_span(&xs), axis_span(&ys)) {
        (Some(width), Some(height)) => Dimensions { width, height },
        _ => Dimensions::default(),
    }
}

/// Extent of one axis plus the occupied cell, `None` when the axis is empty.
///
/// All-integer axes are measured exactly. Any fractional coordinate moves the
/// whole axis to `f64`, truncating the span toward zero.
fn axis_span(coords: &[&Number]) -> Option<u64> {
    let ints: Option<Vec<i64>> = coords.iter().map(|n| n.as_i64()).collect();

    let span = match ints {
        Some(ints) => {
            let lo = *ints.iter().min()?;
            let hi = *ints.iter().max()?;
            (i128::from(hi) - i128::from(lo)) as u64
        }
        None => {
            let (lo, hi) = coords
                .iter()
                .filter_map(|n| n.as_f64())
                .fold(None, |range, v| match range {
                    None => Some((v, v)),
                    Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
                })?;
            (hi - lo) as u64
        }
    };

    Some(span.saturating_add(1))
}

/// Decode a packed version: 16 bits each of major, minor, patch, build.
/// The build component is discarded.
pub fn decode_version(packed: u64) -> Version {
    if packed == 0 {
        return Version::default();
    }

    Version {
        major: ((packed >> 48) & 0xFFFF) as u16,
        minor: ((packed >> 32) & 0xFFFF) as u16,
        patch: ((packed >> 16) & 0xFFFF) as u16,
    }
}
