//! Background requests issued by the session and their tagged results.
//!
//! A request carries the region it was issued for. When its result comes
//! back the session compares that tag with the region it is showing now and
//! drops anything that belongs to a region the user already left.

use crate::format::{ContourEntry, LabelStats, SavedLabels};
use crate::model::{FovBounds, Region, RegionId};
use crate::service::{DataService, ServiceError};

/// Region a background request was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTag {
    pub region_id: RegionId,
    pub experiment_id: String,
}

impl FetchTag {
    pub fn for_region(region: &Region) -> Self {
        Self {
            region_id: region.id,
            experiment_id: region.experiment_id.clone(),
        }
    }

    pub fn matches(&self, region: &Region) -> bool {
        self.region_id == region.id && self.experiment_id == region.experiment_id
    }
}

/// What to fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchKind {
    FovBounds(Region),
    RoiContours,
    SavedLabels,
    LabelStats { job_id: i64 },
}

impl FetchKind {
    pub fn name(&self) -> &'static str {
        match self {
            FetchKind::FovBounds(_) => "FOV bounds",
            FetchKind::RoiContours => "ROI contours",
            FetchKind::SavedLabels => "saved labels",
            FetchKind::LabelStats { .. } => "label stats",
        }
    }
}

/// A background request. `id` is unique within a session.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub id: u64,
    pub tag: FetchTag,
    pub kind: FetchKind,
}

/// Successful payload of a background request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    FovBounds(FovBounds),
    RoiContours(Vec<ContourEntry>),
    SavedLabels(SavedLabels),
    LabelStats(LabelStats),
}

/// Completion of a background request, carrying the request's tag.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub id: u64,
    pub tag: FetchTag,
    pub kind: &'static str,
    pub outcome: Result<FetchOutcome, ServiceError>,
}

impl FetchRequest {
    /// Run the request against a service, blocking until it answers.
    pub fn execute(&self, service: &dyn DataService) -> FetchResult {
        let outcome = match &self.kind {
            FetchKind::FovBounds(region) => {
                service.load_fov_bounds(region).map(FetchOutcome::FovBounds)
            }
            FetchKind::RoiContours => service
                .load_roi_contours(&self.tag.experiment_id, self.tag.region_id)
                .map(FetchOutcome::RoiContours),
            FetchKind::SavedLabels => service
                .load_labels_for_region(self.tag.region_id)
                .map(FetchOutcome::SavedLabels),
            FetchKind::LabelStats { job_id } => service
                .load_label_stats(*job_id)
                .map(FetchOutcome::LabelStats),
        };

        FetchResult {
            id: self.id,
            tag: self.tag.clone(),
            kind: self.kind.name(),
            outcome,
        }
    }
}
