//! Global constants for the labeling session

/// Minimum number of vertices for a drawn ring to be a polygon
pub const MIN_RING_VERTICES: usize = 3;

/// Clicks within this distance of a point ROI hit that point (FOV pixels)
pub const DEFAULT_POINT_HIT_RADIUS: f32 = 4.0;

/// Hand-drawn ROI ids are the current maximum id plus this offset
pub const DEFAULT_USER_ADDED_ID_OFFSET: i64 = 100;

/// Classifier score at or above which the classifier calls an ROI a cell
pub const DEFAULT_CLASSIFIER_THRESHOLD: f32 = 0.5;

/// Outline width for unselected shapes
pub const DEFAULT_LINE_WIDTH: f32 = 1.0;

/// Outline width for the selected shape
pub const SELECTED_LINE_WIDTH: f32 = 3.0;

/// Half the side length of the square marker drawn for point ROIs
pub const POINT_MARKER_HALF_SIZE: f32 = 1.5;

/// Default lower quantile for contrast clipping
pub const DEFAULT_LOW_QUANTILE: f32 = 0.0;

/// Default upper quantile for contrast clipping
pub const DEFAULT_HIGH_QUANTILE: f32 = 0.999;
