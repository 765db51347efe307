//! ROI data model: identifiers, labels and geometry.
//!
//! An ROI carries exactly one kind of geometry. Segmented and hand-drawn ROIs
//! are polygon rings, ephemeral clicks are a single point. The kind is fixed
//! when the ROI is created; only the rings of a polygon ROI may be replaced.

use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB display color.
pub type Rgb = [u8; 3];

/// Color of an unconfirmed point ROI.
pub const WHITE: Rgb = [255, 255, 255];

/// Color of a confirmed point ROI and of the selected outline.
pub const RED: Rgb = [255, 0, 0];

/// A polygon vertex in field-of-view pixel coordinates.
pub type Vertex = [i32; 2];

/// An ordered polygon ring. The last vertex implicitly joins the first.
pub type Ring = Vec<Vertex>;

/// Identifier of an ROI within a region.
///
/// Server-segmented and hand-drawn ROIs use integer ids. Point ROIs are keyed
/// by the `"x,y"` coordinate they were created at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoiId {
    Number(i64),
    Coord(String),
}

impl RoiId {
    /// Id for a point ROI created by a click at `point`.
    pub fn for_point(point: Point) -> Self {
        RoiId::Coord(format!("{},{}", point.x, point.y))
    }

    /// The integer value, if this is a numeric id.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            RoiId::Number(n) => Some(*n),
            RoiId::Coord(_) => None,
        }
    }
}

impl From<i64> for RoiId {
    fn from(value: i64) -> Self {
        RoiId::Number(value)
    }
}

impl fmt::Display for RoiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoiId::Number(n) => write!(f, "{}", n),
            RoiId::Coord(s) => f.write_str(s),
        }
    }
}

/// Human label for an ROI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Label {
    #[serde(rename = "cell")]
    Cell,
    #[default]
    #[serde(rename = "not cell")]
    NotCell,
}

impl Label {
    /// The opposite label.
    pub fn toggled(self) -> Self {
        match self {
            Label::Cell => Label::NotCell,
            Label::NotCell => Label::Cell,
        }
    }

    pub fn is_cell(self) -> bool {
        matches!(self, Label::Cell)
    }

    /// Display name for side panels and alerts.
    pub fn name(self) -> &'static str {
        match self {
            Label::Cell => "Cell",
            Label::NotCell => "Not cell",
        }
    }
}

/// A 2D point in field-of-view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point.
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Geometry of an ROI: polygon rings or a single point, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    Contours(Vec<Ring>),
    Point(Point),
}

/// How an ROI came to exist; decides its interaction semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoiKind {
    /// Server-segmented polygon with a classifier score.
    Segmented,
    /// Hand-drawn polygon.
    UserAdded,
    /// Click on a blank area.
    Point,
}

/// A candidate region of interest awaiting a cell/not-cell label.
#[derive(Debug, Clone, PartialEq)]
pub struct Roi {
    /// Identifier, unique within the region.
    pub id: RoiId,
    /// Experiment the ROI belongs to.
    pub experiment_id: String,
    /// Classifier probability of cell. `None` for user-created ROIs.
    classifier_score: Option<f32>,
    /// Display color.
    pub color: Rgb,
    /// Current human label.
    pub label: Label,
    geometry: Geometry,
    is_user_added: bool,
}

impl Roi {
    /// Create a server-segmented ROI. Labels start as `NotCell`.
    pub fn segmented(
        id: i64,
        experiment_id: impl Into<String>,
        classifier_score: f32,
        color: Rgb,
        contours: Vec<Ring>,
    ) -> Self {
        Self {
            id: RoiId::Number(id),
            experiment_id: experiment_id.into(),
            classifier_score: Some(classifier_score),
            color,
            label: Label::NotCell,
            geometry: Geometry::Contours(contours),
            is_user_added: false,
        }
    }

    /// Create a hand-drawn ROI. Drawing a shape is a statement that it is a cell.
    pub fn user_added(id: RoiId, experiment_id: impl Into<String>, contours: Vec<Ring>) -> Self {
        Self {
            id,
            experiment_id: experiment_id.into(),
            classifier_score: None,
            color: RED,
            label: Label::Cell,
            geometry: Geometry::Contours(contours),
            is_user_added: true,
        }
    }

    /// Create an unconfirmed point ROI at a clicked location.
    pub fn ephemeral(point: Point, experiment_id: impl Into<String>) -> Self {
        Self {
            id: RoiId::for_point(point),
            experiment_id: experiment_id.into(),
            classifier_score: None,
            color: WHITE,
            label: Label::NotCell,
            geometry: Geometry::Point(point),
            is_user_added: false,
        }
    }

    pub fn classifier_score(&self) -> Option<f32> {
        self.classifier_score
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn is_user_added(&self) -> bool {
        self.is_user_added
    }

    /// Polygon rings, if this ROI has polygon geometry.
    pub fn contours(&self) -> Option<&[Ring]> {
        match &self.geometry {
            Geometry::Contours(rings) => Some(rings),
            Geometry::Point(_) => None,
        }
    }

    /// Point location, if this ROI has point geometry.
    pub fn point(&self) -> Option<Point> {
        match &self.geometry {
            Geometry::Point(p) => Some(*p),
            Geometry::Contours(_) => None,
        }
    }

    pub fn kind(&self) -> RoiKind {
        match (&self.geometry, self.is_user_added) {
            (Geometry::Point(_), _) => RoiKind::Point,
            (Geometry::Contours(_), true) => RoiKind::UserAdded,
            (Geometry::Contours(_), false) => RoiKind::Segmented,
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self.geometry, Geometry::Point(_))
    }

    /// A point ROI the user has not confirmed as a cell.
    /// These are never reported and disappear once selection moves on.
    pub fn is_unconfirmed_point(&self) -> bool {
        self.is_point() && self.label == Label::NotCell
    }

    /// Replace the polygon rings. Returns false (and changes nothing) for point ROIs.
    pub fn replace_contours(&mut self, contours: Vec<Ring>) -> bool {
        match &mut self.geometry {
            Geometry::Contours(rings) => {
                *rings = contours;
                true
            }
            Geometry::Point(_) => false,
        }
    }

    /// Set the label. Point ROIs show their state through their color.
    pub fn set_label(&mut self, label: Label) {
        self.label = label;
        if self.is_point() {
            self.color = if label.is_cell() { RED } else { WHITE };
        }
    }

    /// Flip the label and return the new value.
    pub fn toggle_label(&mut self) -> Label {
        let label = self.label.toggled();
        self.set_label(label);
        label
    }
}
