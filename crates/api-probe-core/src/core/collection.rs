// crates/api-probe-core/src/core/collection.rs
// ============================================================================
// Module: Collection Definition
// Description: Loader for Postman collection files.
// Purpose: Read and sanity-check the collection before a runner is started.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! A collection is kept as parsed JSON: runners interpret the item tree
//! themselves. Loading only guarantees the file is bounded in size, is UTF-8
//! JSON, and has the top-level shape of a Postman collection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum collection file size in bytes.
pub const MAX_COLLECTION_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Collection loading errors.
#[derive(Debug, Error)]
pub enum CollectionLoadError {
    /// The file could not be read.
    #[error("collection io error: {0}")]
    Io(String),
    /// The file exceeds [`MAX_COLLECTION_BYTES`].
    #[error("collection file exceeds size limit ({actual} > {limit})")]
    TooLarge {
        /// Actual size in bytes.
        actual: usize,
        /// Maximum size in bytes.
        limit: usize,
    },
    /// The file is not valid JSON.
    #[error("collection parse error: {0}")]
    Parse(String),
    /// The JSON does not look like a Postman collection.
    #[error("invalid collection: {0}")]
    Invalid(String),
}

/// A parsed Postman collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    /// Source path.
    pub path: PathBuf,
    /// Collection name (`info.name`), or the file name when absent.
    pub name: String,
    /// Parsed collection JSON.
    pub document: Value,
}

impl Collection {
    /// Loads a collection from disk.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionLoadError`] when the file is unreadable, too large,
    /// not JSON, or lacks an `item` array.
    pub fn load(path: &Path) -> Result<Self, CollectionLoadError> {
        let bytes = fs::read(path)
            .map_err(|err| CollectionLoadError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_COLLECTION_BYTES {
            return Err(CollectionLoadError::TooLarge {
                actual: bytes.len(),
                limit: MAX_COLLECTION_BYTES,
            });
        }
        let document: Value = serde_json::from_slice(&bytes)
            .map_err(|err| CollectionLoadError::Parse(err.to_string()))?;
        Self::from_value(path.to_path_buf(), document)
    }

    /// Wraps an already parsed collection document.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionLoadError::Invalid`] when the document lacks an `item` array.
    pub fn from_value(path: PathBuf, document: Value) -> Result<Self, CollectionLoadError> {
        if !document.is_object() {
            return Err(CollectionLoadError::Invalid("top level must be an object".to_string()));
        }
        if !document.get("item").is_some_and(Value::is_array) {
            return Err(CollectionLoadError::Invalid("missing item array".to_string()));
        }
        let name = document
            .pointer("/info/name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| path.file_name().map(|name| name.to_string_lossy().into_owned()))
            .unwrap_or_default();
        Ok(Self {
            path,
            name,
            document,
        })
    }
}
