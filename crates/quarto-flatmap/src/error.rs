/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for flattening and rehydration.

use thiserror::Error;

/// Errors that can occur while converting between values and flat maps.
#[derive(Debug, Error)]
pub enum FlatMapError {
    /// A leaf has no string form that would survive a round trip.
    #[error("Unsupported value kind '{kind}' at path '{path}'")]
    UnsupportedValueKind { path: String, kind: &'static str },

    /// Two keys disagree about the kind of node living at a path.
    #[error("Path conflict at segment '{segment}' while processing key '{key}'")]
    PathConflict { key: String, segment: String },

    /// A key could not be split into valid segments.
    #[error("Malformed path '{key}': {reason}")]
    MalformedPath { key: String, reason: String },

    /// The value could not be turned into a tree.
    #[error("Serialization failed: {source}")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    /// The rebuilt tree was rejected by the deserializer.
    #[error("Failed to deserialize rebuilt tree into '{target}': {source}")]
    Deserialization {
        target: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl FlatMapError {
    pub(crate) fn conflict(key: &str, segment: &str) -> Self {
        FlatMapError::PathConflict {
            key: key.to_string(),
            segment: segment.to_string(),
        }
    }

    pub(crate) fn malformed(key: &str, reason: impl Into<String>) -> Self {
        FlatMapError::MalformedPath {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for flat map operations.
pub type FlatMapResult<T> = Result<T, FlatMapError>;
