//! Region of a field of view: the unit of work labeled and submitted together.

use serde::{Deserialize, Serialize};

use super::roi::Point;

/// Server identifier of a region.
pub type RegionId = i64;

/// Rectangular sub-area of a field of view. Immutable for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub experiment_id: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    /// Inclusive containment test against the region rectangle.
    pub fn contains(&self, point: Point) -> bool {
        let (x0, y0) = (self.x as f32, self.y as f32);
        point.x >= x0
            && point.x <= x0 + self.width as f32
            && point.y >= y0
            && point.y <= y0 + self.height as f32
    }
}

/// Plot bounds for displaying a region, as `[lo, hi]` per axis.
///
/// The server may send the y range reversed (image origin is top-left);
/// [`FovBounds::normalized`] puts both ranges in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FovBounds {
    pub x: [f32; 2],
    pub y: [f32; 2],
}

impl FovBounds {
    pub fn normalized(self) -> Self {
        let order = |[a, b]: [f32; 2]| if a <= b { [a, b] } else { [b, a] };
        Self {
            x: order(self.x),
            y: order(self.y),
        }
    }

    /// Bounds covering exactly the region rectangle.
    pub fn from_region(region: &Region) -> Self {
        Self {
            x: [region.x as f32, (region.x + region.width) as f32],
            y: [region.y as f32, (region.y + region.height) as f32],
        }
    }
}
