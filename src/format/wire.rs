//! Request and response bodies exchanged with the labeling server.
//!
//! Field names follow the server's JSON (snake_case keys such as
//! `region_id` and `roi_extra`).

use serde::{Deserialize, Serialize};

use crate::model::{Label, Point, Region, RegionId, Rgb, Ring, RoiId};

/// Response to a region request. `region` is `None` when nothing is left to label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionResponse {
    #[serde(default)]
    pub experiment_id: Option<String>,
    #[serde(default)]
    pub region: Option<Region>,
}

/// One segmented ROI as returned by the contour endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourEntry {
    pub id: i64,
    pub experiment_id: String,
    pub color: Rgb,
    pub classifier_score: f32,
    pub contours: Vec<Ring>,
}

/// A hand-drawn ROI sent along with a hit test so the server can test it too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAddedRoi {
    pub id: RoiId,
    pub contours: Vec<Ring>,
}

/// Body of a find-ROI-at-coordinates request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitTestRequest {
    pub current_region_id: RegionId,
    /// Candidate ids: segmented and hand-drawn ROIs.
    pub roi_ids: Vec<RoiId>,
    pub coordinates: [f32; 2],
    #[serde(default)]
    pub user_added_rois: Vec<UserAddedRoi>,
}

/// Label record for a single ROI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub roi_id: RoiId,
    pub is_user_added: bool,
    /// Rings of a hand-drawn ROI; `None` for everything else.
    #[serde(default)]
    pub contours: Option<Vec<Ring>>,
    /// Location of a confirmed point ROI; `None` for polygons.
    #[serde(default)]
    pub point: Option<Point>,
    pub label: Label,
}

/// Free-text notes for an ROI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoiExtraEntry {
    pub roi_id: RoiId,
    pub notes: String,
}

/// Everything submitted for a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub region_id: RegionId,
    pub labels: Vec<LabelEntry>,
    pub roi_extra: Vec<RoiExtraEntry>,
    /// Seconds spent labeling the region.
    pub duration: f64,
}

/// Labels previously submitted by the current user for a region.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SavedLabels {
    pub labels: Vec<LabelEntry>,
    #[serde(default)]
    pub roi_extra: Vec<RoiExtraEntry>,
}

/// Progress counters for the labeling job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelStats {
    pub n_user_has_labeled: usize,
    pub n_total: usize,
    pub n_completed: usize,
    pub n_completed_by_others: usize,
    #[serde(default)]
    pub num_labelers_required_per_region: Option<usize>,
}

impl LabelStats {
    /// Short progress line for the status bar.
    pub fn progress_text(&self) -> String {
        let mut text = format!(
            "Labeled {} of {} regions ({} complete",
            self.n_user_has_labeled, self.n_total, self.n_completed
        );
        if self.n_completed_by_others > 0 {
            text.push_str(&format!(", {} by others", self.n_completed_by_others));
        }
        if let Some(required) = self.num_labelers_required_per_region {
            text.push_str(&format!(", {} labeler(s) per region", required));
        }
        text.push(')');
        text
    }
}
