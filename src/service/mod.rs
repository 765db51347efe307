//! External collaborators reached over request/response calls.
//!
//! The session never talks to the network directly. Everything it needs from
//! the labeling server goes through [`DataService`]; persisted UI preferences
//! go through [`PreferenceStore`].

mod fixture;
mod preferences;

pub use fixture::{FixtureData, FixtureRegion, FixtureService};
pub use preferences::{JsonFilePreferenceStore, MemoryPreferenceStore, PreferenceError, PreferenceStore};

use thiserror::Error;

use crate::format::{
    ContourEntry, HitTestRequest, LabelStats, RegionResponse, SavedLabels, SubmissionPayload,
};
use crate::model::{FovBounds, Region, RegionId, RoiId};

/// Failure of a call to the labeling server.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The request did not complete
    #[error("Request failed: {0}")]
    Transport(String),

    /// The server answered with an error status
    #[error("Server returned status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The response body could not be decoded
    #[error("Could not decode response: {0}")]
    Decode(String),

    /// The requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ServiceError {
    /// Create a transport error with a message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

/// Request/response surface of the labeling server.
pub trait DataService {
    /// Next region to label in a job, chosen by the server.
    fn load_random_region(&self, job_id: i64) -> Result<RegionResponse, ServiceError>;

    /// A specific region.
    fn load_region_by_id(&self, region_id: RegionId) -> Result<RegionResponse, ServiceError>;

    /// Plot bounds that keep every ROI of the region in view.
    fn load_fov_bounds(&self, region: &Region) -> Result<FovBounds, ServiceError>;

    /// Segmented ROIs intersecting the region.
    fn load_roi_contours(
        &self,
        experiment_id: &str,
        region_id: RegionId,
    ) -> Result<Vec<ContourEntry>, ServiceError>;

    /// Id of the candidate ROI under the given coordinates, if any.
    fn find_roi_at_coordinates(
        &self,
        request: &HitTestRequest,
    ) -> Result<Option<RoiId>, ServiceError>;

    /// Record labels for a region labeled for the first time.
    fn submit_region(&self, payload: &SubmissionPayload) -> Result<(), ServiceError>;

    /// Replace labels for a region the user already submitted.
    fn update_region_labels(&self, payload: &SubmissionPayload) -> Result<(), ServiceError>;

    /// Labels the current user previously submitted for a region.
    fn load_labels_for_region(&self, region_id: RegionId) -> Result<SavedLabels, ServiceError>;

    /// Progress counters for a job.
    fn load_label_stats(&self, job_id: i64) -> Result<LabelStats, ServiceError>;
}
