//! Error taxonomy of the labeling session.
//!
//! Every operation on the session returns `Result<Vec<Effect>, SessionError>`.
//! `handlers::handle_event` catches these at the operation boundary and turns
//! them into alerts; none of them bring the session down.

use thiserror::Error;

use crate::format::PathError;
use crate::model::RoiId;
use crate::service::ServiceError;

/// Errors raised by session operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// A call to the labeling server failed. Nothing was changed.
    #[error("Network error during {operation}: {source}")]
    Network {
        /// Operation that issued the call
        operation: &'static str,
        source: ServiceError,
    },

    /// Human labels disagree with the classifier on some ROIs.
    #[error("{count} ROI label(s) disagree with the classifier")]
    Validation { count: usize },

    /// A click landed outside the current region.
    #[error("Click at ({x}, {y}) is outside the region")]
    OutOfBounds { x: f32, y: f32 },

    /// A region load is already in flight.
    #[error("A region is already loading")]
    ConcurrentLoad,

    /// The region could not be loaded, or none are left.
    #[error("Could not load region: {message}")]
    RegionLoad { message: String },

    /// A shape path reported by the Renderer could not be parsed.
    #[error("Malformed shape geometry: {0}")]
    GeometryParse(#[from] PathError),

    /// No region is installed.
    #[error("No region is loaded")]
    NoRegion,

    /// The region is installed but its ROIs have not arrived yet.
    #[error("ROIs for the region are still loading")]
    NotReady,

    /// An operation named an ROI that is not in the registry.
    #[error("Unknown ROI {0}")]
    UnknownRoi(RoiId),

    /// An earlier geometry error left the session untrustworthy.
    #[error("Session state is inconsistent, reload the region")]
    Inconsistent,
}

impl SessionError {
    /// Create a network error for an operation.
    pub fn network(operation: &'static str, source: ServiceError) -> Self {
        Self::Network { operation, source }
    }

    /// Create a region load error with a message.
    pub fn region_load(message: impl Into<String>) -> Self {
        Self::RegionLoad {
            message: message.into(),
        }
    }

    /// Fatal errors mean the session no longer matches what the user sees.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::GeometryParse(_) | Self::Inconsistent)
    }
}
