//! Data models for the labeling session.

mod region;
mod roi;
mod store;

pub use region::{FovBounds, Region, RegionId};
pub use roi::{Geometry, Label, Point, RED, Rgb, Ring, Roi, RoiId, RoiKind, Vertex, WHITE};
pub use store::RoiStore;
