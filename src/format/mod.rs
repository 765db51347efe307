//! Geometry encoding and server wire formats.
//!
//! - [`svg_path`]: the path-string encoding used by the Renderer
//! - [`wire`]: JSON bodies exchanged with the labeling server

mod error;
pub mod svg_path;
pub mod wire;

pub use error::PathError;
pub use svg_path::{parse_ring, point_marker_path, ring_to_path};
pub use wire::{
    ContourEntry, HitTestRequest, LabelEntry, LabelStats, RegionResponse, RoiExtraEntry,
    SavedLabels, SubmissionPayload, UserAddedRoi,
};
