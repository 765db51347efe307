//! In-memory [`DataService`] backed by a fixture dataset.
//!
//! Serves regions and contours from JSON, answers hit tests with a ray-casting
//! test against each candidate's first ring, and records every submission so
//! callers can inspect what would have been sent. Used by the replay binary
//! and by tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::{DataService, ServiceError};
use crate::format::{
    ContourEntry, HitTestRequest, LabelStats, RegionResponse, SavedLabels, SubmissionPayload,
};
use crate::model::{FovBounds, Point, Region, RegionId, Ring, RoiId};

/// One region of a fixture dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureRegion {
    pub region: Region,
    /// Explicit plot bounds. Computed from the contours when absent.
    #[serde(default)]
    pub fov_bounds: Option<FovBounds>,
    #[serde(default)]
    pub contours: Vec<ContourEntry>,
    /// Labels already submitted for this region before the session started.
    #[serde(default)]
    pub saved_labels: Option<SavedLabels>,
}

/// A fixture dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureData {
    #[serde(default)]
    pub regions: Vec<FixtureRegion>,
}

#[derive(Debug, Default)]
struct FixtureInner {
    offline: bool,
    submitted: Vec<SubmissionPayload>,
    updated: Vec<SubmissionPayload>,
    saved: BTreeMap<RegionId, SavedLabels>,
    hit_tests: usize,
}

/// Fixture-backed data service.
#[derive(Debug, Default)]
pub struct FixtureService {
    data: FixtureData,
    inner: Mutex<FixtureInner>,
}

impl FixtureService {
    pub fn new(data: FixtureData) -> Self {
        let saved = data
            .regions
            .iter()
            .filter_map(|r| r.saved_labels.clone().map(|labels| (r.region.id, labels)))
            .collect();
        Self {
            data,
            inner: Mutex::new(FixtureInner {
                saved,
                ..Default::default()
            }),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Make every call fail with a transport error until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Payloads received through `submit_region`.
    pub fn submitted(&self) -> Vec<SubmissionPayload> {
        self.lock().submitted.clone()
    }

    /// Payloads received through `update_region_labels`.
    pub fn updated(&self) -> Vec<SubmissionPayload> {
        self.lock().updated.clone()
    }

    /// Number of hit tests answered.
    pub fn hit_test_count(&self) -> usize {
        self.lock().hit_tests
    }

    fn lock(&self) -> MutexGuard<'_, FixtureInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn online(&self) -> Result<MutexGuard<'_, FixtureInner>, ServiceError> {
        let inner = self.lock();
        if inner.offline {
            return Err(ServiceError::transport("fixture service is offline"));
        }
        Ok(inner)
    }

    fn region(&self, region_id: RegionId) -> Result<&FixtureRegion, ServiceError> {
        self.data
            .regions
            .iter()
            .find(|r| r.region.id == region_id)
            .ok_or_else(|| ServiceError::NotFound(format!("region {}", region_id)))
    }
}

/// Ray-casting point-in-polygon test.
fn ring_contains(ring: &[[i32; 2]], point: Point) -> bool {
    let Some(&last) = ring.last() else {
        return false;
    };
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut prev = last;
    for &vertex in ring {
        let (xi, yi) = (vertex[0] as f32, vertex[1] as f32);
        let (xj, yj) = (prev[0] as f32, prev[1] as f32);
        if ((yi > point.y) != (yj > point.y))
            && (point.x < (xj - xi) * (point.y - yi) / (yj - yi) + xi)
        {
            inside = !inside;
        }
        prev = vertex;
    }
    inside
}

fn first_ring(contours: &[Ring]) -> &[[i32; 2]] {
    contours.first().map(Vec::as_slice).unwrap_or(&[])
}

impl DataService for FixtureService {
    fn load_random_region(&self, _job_id: i64) -> Result<RegionResponse, ServiceError> {
        let inner = self.online()?;
        let next = self
            .data
            .regions
            .iter()
            .find(|r| !inner.saved.contains_key(&r.region.id));
        Ok(match next {
            Some(r) => RegionResponse {
                experiment_id: Some(r.region.experiment_id.clone()),
                region: Some(r.region.clone()),
            },
            None => RegionResponse {
                experiment_id: None,
                region: None,
            },
        })
    }

    fn load_region_by_id(&self, region_id: RegionId) -> Result<RegionResponse, ServiceError> {
        let _inner = self.online()?;
        let r = self.region(region_id)?;
        Ok(RegionResponse {
            experiment_id: Some(r.region.experiment_id.clone()),
            region: Some(r.region.clone()),
        })
    }

    fn load_fov_bounds(&self, region: &Region) -> Result<FovBounds, ServiceError> {
        let _inner = self.online()?;
        let r = self.region(region.id)?;
        if let Some(bounds) = r.fov_bounds {
            return Ok(bounds);
        }

        let mut bounds = FovBounds::from_region(region);
        for [x, y] in r.contours.iter().flat_map(|c| c.contours.iter().flatten()) {
            bounds.x = [bounds.x[0].min(*x as f32), bounds.x[1].max(*x as f32)];
            bounds.y = [bounds.y[0].min(*y as f32), bounds.y[1].max(*y as f32)];
        }
        Ok(bounds)
    }

    fn load_roi_contours(
        &self,
        experiment_id: &str,
        region_id: RegionId,
    ) -> Result<Vec<ContourEntry>, ServiceError> {
        let _inner = self.online()?;
        let r = self.region(region_id)?;
        Ok(r.contours
            .iter()
            .filter(|c| c.experiment_id == experiment_id)
            .cloned()
            .collect())
    }

    fn find_roi_at_coordinates(
        &self,
        request: &HitTestRequest,
    ) -> Result<Option<RoiId>, ServiceError> {
        let mut inner = self.online()?;
        inner.hit_tests += 1;
        drop(inner);

        let r = self.region(request.current_region_id)?;
        let point = Point::new(request.coordinates[0], request.coordinates[1]);

        let segmented = r
            .contours
            .iter()
            .map(|c| (RoiId::Number(c.id), first_ring(&c.contours)))
            .filter(|(id, _)| request.roi_ids.contains(id));
        let drawn = request
            .user_added_rois
            .iter()
            .map(|u| (u.id.clone(), first_ring(&u.contours)));

        Ok(segmented
            .chain(drawn)
            .find(|(_, ring)| ring_contains(ring, point))
            .map(|(id, _)| id))
    }

    fn submit_region(&self, payload: &SubmissionPayload) -> Result<(), ServiceError> {
        let mut inner = self.online()?;
        inner.submitted.push(payload.clone());
        inner.saved.insert(
            payload.region_id,
            SavedLabels {
                labels: payload.labels.clone(),
                roi_extra: payload.roi_extra.clone(),
            },
        );
        Ok(())
    }

    fn update_region_labels(&self, payload: &SubmissionPayload) -> Result<(), ServiceError> {
        let mut inner = self.online()?;
        if !inner.saved.contains_key(&payload.region_id) {
            return Err(ServiceError::NotFound(format!(
                "labels for region {}",
                payload.region_id
            )));
        }
        inner.updated.push(payload.clone());
        inner.saved.insert(
            payload.region_id,
            SavedLabels {
                labels: payload.labels.clone(),
                roi_extra: payload.roi_extra.clone(),
            },
        );
        Ok(())
    }

    fn load_labels_for_region(&self, region_id: RegionId) -> Result<SavedLabels, ServiceError> {
        let inner = self.online()?;
        inner
            .saved
            .get(&region_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("labels for region {}", region_id)))
    }

    fn load_label_stats(&self, _job_id: i64) -> Result<LabelStats, ServiceError> {
        let inner = self.online()?;
        Ok(LabelStats {
            n_user_has_labeled: inner.saved.len(),
            n_total: self.data.regions.len(),
            n_completed: inner.saved.len(),
            n_completed_by_others: 0,
            num_labelers_required_per_region: Some(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::UserAddedRoi;

    fn data() -> FixtureData {
        FixtureData {
            regions: vec![FixtureRegion {
                region: Region {
                    id: 1,
                    experiment_id: "exp".to_string(),
                    x: 0,
                    y: 0,
                    width: 100,
                    height: 100,
                },
                fov_bounds: None,
                contours: vec![ContourEntry {
                    id: 5,
                    experiment_id: "exp".to_string(),
                    color: [0, 0, 0],
                    classifier_score: 0.7,
                    contours: vec![vec![[10, 10], [20, 10], [20, 20], [10, 20]]],
                }],
                saved_labels: None,
            }],
        }
    }

    fn hit(service: &FixtureService, x: f32, y: f32, user: Vec<UserAddedRoi>) -> Option<RoiId> {
        service
            .find_roi_at_coordinates(&HitTestRequest {
                current_region_id: 1,
                roi_ids: vec![RoiId::Number(5)],
                coordinates: [x, y],
                user_added_rois: user,
            })
            .unwrap()
    }

    #[test]
    fn test_hit_test() {
        let service = FixtureService::new(data());
        assert_eq!(hit(&service, 15.0, 15.0, vec![]), Some(RoiId::Number(5)));
        assert_eq!(hit(&service, 50.0, 50.0, vec![]), None);

        let drawn = UserAddedRoi {
            id: RoiId::Number(105),
            contours: vec![vec![[40, 40], [60, 40], [60, 60], [40, 60]]],
        };
        assert_eq!(hit(&service, 50.0, 50.0, vec![drawn]), Some(RoiId::Number(105)));
        assert_eq!(service.hit_test_count(), 3);
    }

    #[test]
    fn test_regions_exhaust_after_submit() {
        let service = FixtureService::new(data());
        let first = service.load_random_region(1).unwrap();
        assert_eq!(first.region.map(|r| r.id), Some(1));

        service
            .submit_region(&SubmissionPayload {
                region_id: 1,
                labels: vec![],
                roi_extra: vec![],
                duration: 1.0,
            })
            .unwrap();
        assert!(service.load_random_region(1).unwrap().region.is_none());
        assert_eq!(service.load_label_stats(1).unwrap().n_user_has_labeled, 1);
    }

    #[test]
    fn test_offline() {
        let service = FixtureService::new(data());
        service.set_offline(true);
        assert!(matches!(
            service.load_random_region(1),
            Err(ServiceError::Transport(_))
        ));
        service.set_offline(false);
        assert!(service.load_random_region(1).is_ok());
    }

    #[test]
    fn test_fov_bounds_cover_region() {
        let service = FixtureService::new(data());
        let region = service.load_region_by_id(1).unwrap().region.unwrap();
        let bounds = service.load_fov_bounds(&region).unwrap();
        assert_eq!(bounds.x, [0.0, 100.0]);
        assert_eq!(bounds.y, [0.0, 100.0]);
    }

    #[test]
    fn test_update_requires_prior_submit() {
        let service = FixtureService::new(data());
        let payload = SubmissionPayload {
            region_id: 1,
            labels: vec![],
            roi_extra: vec![],
            duration: 0.0,
        };
        assert!(matches!(
            service.update_region_labels(&payload),
            Err(ServiceError::NotFound(_))
        ));
    }
}
