//! Error types for shape path parsing.

use thiserror::Error;

/// Errors that can occur while parsing a Renderer path string.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    /// The path string is empty
    #[error("Empty path")]
    Empty,

    /// The path does not start with a move command
    #[error("Path must start with a move command: {path:?}")]
    MissingMove {
        /// The offending path
        path: String,
    },

    /// A segment is not an `x,y` pair
    #[error("Invalid segment {segment:?}")]
    InvalidSegment {
        /// The segment text
        segment: String,
    },

    /// A coordinate is not a finite number
    #[error("Invalid coordinate {value:?}")]
    InvalidCoordinate {
        /// The coordinate text
        value: String,
    },

    /// Too few vertices to form a closed ring
    #[error("Ring needs at least {required} vertices, found {found}")]
    TooFewVertices {
        /// Minimum vertex count
        required: usize,
        /// Vertices parsed
        found: usize,
    },
}

impl PathError {
    /// Create an invalid segment error.
    pub fn invalid_segment(segment: impl Into<String>) -> Self {
        Self::InvalidSegment {
            segment: segment.into(),
        }
    }

    /// Create an invalid coordinate error.
    pub fn invalid_coordinate(value: impl Into<String>) -> Self {
        Self::InvalidCoordinate {
            value: value.into(),
        }
    }
}
