//! Shared fixtures for session tests.

use crate::config::AppConfig;
use crate::format::ContourEntry;
use crate::handlers::{Collaborators, dispatch_sync};
use crate::message::{AlertLevel, Effect, Event};
use crate::model::{Region, RegionId, Ring, RoiId};
use crate::service::{FixtureData, FixtureRegion, FixtureService, MemoryPreferenceStore};
use crate::state::{LoadTarget, SessionState};

/// Axis-aligned square ring with its top-left corner at `(x, y)`.
pub fn square(x: i32, y: i32, size: i32) -> Ring {
    vec![[x, y], [x + size, y], [x + size, y + size], [x, y + size]]
}

pub fn contour(id: i64, score: f32, ring: Ring) -> ContourEntry {
    ContourEntry {
        id,
        experiment_id: "exp".to_string(),
        color: [0, 200, 0],
        classifier_score: score,
        contours: vec![ring],
    }
}

pub fn fixture_region(id: RegionId, contours: Vec<ContourEntry>) -> FixtureRegion {
    FixtureRegion {
        region: Region {
            id,
            experiment_id: "exp".to_string(),
            x: 10,
            y: 10,
            width: 90,
            height: 90,
        },
        fov_bounds: None,
        contours,
        saved_labels: None,
    }
}

/// Two regions. Region 1 holds a likely cell (id 1) and a likely non-cell
/// (id 2) with blank space between them.
pub fn two_region_fixture() -> FixtureService {
    FixtureService::new(FixtureData {
        regions: vec![
            fixture_region(
                1,
                vec![
                    contour(1, 0.9, square(20, 20, 10)),
                    contour(2, 0.2, square(75, 75, 10)),
                ],
            ),
            fixture_region(2, vec![contour(7, 0.6, square(40, 40, 10))]),
        ],
    })
}

/// A session wired to a fixture service, running fetches inline.
pub struct Harness {
    pub state: SessionState,
    pub service: FixtureService,
    pub preferences: MemoryPreferenceStore,
}

impl Harness {
    pub fn new(service: FixtureService) -> Self {
        Self {
            state: SessionState::new(&AppConfig::new()),
            service,
            preferences: MemoryPreferenceStore::new(),
        }
    }

    /// Harness with region 1 of [`two_region_fixture`] loaded.
    pub fn loaded() -> Self {
        let mut harness = Self::new(two_region_fixture());
        harness.send(Event::LoadRegion {
            target: LoadTarget::Region(1),
        });
        harness
    }

    pub fn send(&mut self, event: Event) -> Vec<Effect> {
        let mut collaborators = Collaborators {
            service: &self.service,
            preferences: &mut self.preferences,
        };
        dispatch_sync(&mut self.state, event, &mut collaborators)
    }

    pub fn click(&mut self, x: f32, y: f32) -> Vec<Effect> {
        self.send(Event::Click { x, y })
    }

    pub fn submit(&mut self, bypass_validation: bool) -> Vec<Effect> {
        self.send(Event::Submit { bypass_validation })
    }

    pub fn roi_count(&self) -> usize {
        self.state.rois().map_or(0, |rois| rois.len())
    }

    pub fn selected_id(&self) -> Option<RoiId> {
        self.state.selected().map(|roi| roi.id.clone())
    }
}

/// Messages of all alerts at the given level.
pub fn alerts(effects: &[Effect], level: AlertLevel) -> Vec<String> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Alert { level: l, message } if *l == level => Some(message.clone()),
            _ => None,
        })
        .collect()
}
