//! Session state for the region under review.
//!
//! `SessionState` owns everything that belongs to one region: the region
//! itself, its ROI registry and selection, the notes, the last-saved
//! snapshot, the review gate and the background requests issued for it.
//! Loading a new region replaces all of it at once.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use web_time::Instant;

use super::fetch::{FetchKind, FetchOutcome, FetchRequest, FetchResult, FetchTag};
use super::snapshot::LabelSnapshot;
use crate::config::{AppConfig, RenderSettings, SessionSettings};
use crate::contrast::ProjectionType;
use crate::error::SessionError;
use crate::format::{ContourEntry, LabelStats, RegionResponse, SavedLabels};
use crate::message::{Control, Effect, SelectionSummary};
use crate::model::{FovBounds, Region, RegionId, Roi, RoiId, RoiStore};
use crate::service::{DataService, ServiceError};
use crate::validation::ReviewGate;

/// Which region to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadTarget {
    /// Next region the server hands out
    Next,
    /// A specific region, labeled from scratch
    Region(RegionId),
    /// A region the user already submitted, reopened for editing
    Submitted(RegionId),
}

/// How the next submission is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitMode {
    /// First submission for the region
    #[default]
    Submit,
    /// Replace labels submitted earlier
    Update,
}

/// Proof that a load is in flight. Consumed by [`SessionState::complete_load`].
#[derive(Debug)]
#[must_use]
pub struct LoadTicket {
    target: LoadTarget,
}

impl LoadTicket {
    pub fn target(&self) -> LoadTarget {
        self.target
    }
}

/// State of a labeling session.
#[derive(Debug)]
pub struct SessionState {
    job_id: i64,
    pub(crate) settings: SessionSettings,
    pub(crate) render: RenderSettings,
    pub(crate) projection: ProjectionType,

    /// A region load is in flight
    loading: bool,
    region: Option<Region>,
    fov_bounds: Option<FovBounds>,
    /// `None` until the contour payload for the region arrives
    pub(crate) rois: Option<RoiStore>,
    pub(crate) notes: BTreeMap<RoiId, String>,
    snapshot: LabelSnapshot,
    pub(crate) review: ReviewGate,
    mode: SubmitMode,

    /// Ids of background requests issued for the current region
    pending: BTreeSet<u64>,
    next_fetch_id: u64,
    /// Saved labels that arrived before the contours
    deferred_labels: Option<SavedLabels>,
    /// A reopened region's saved labels have not been applied yet
    saved_labels_pending: bool,
    label_stats: Option<LabelStats>,
    /// When the ROIs were installed, for the labeling duration
    started_at: Option<Instant>,
    inconsistent: bool,
}

impl SessionState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            job_id: config.job_id,
            settings: config.session.clone(),
            render: config.render.clone(),
            projection: ProjectionType::default(),
            loading: false,
            region: None,
            fov_bounds: None,
            rois: None,
            notes: BTreeMap::new(),
            snapshot: LabelSnapshot::default(),
            review: ReviewGate::default(),
            mode: SubmitMode::default(),
            pending: BTreeSet::new(),
            next_fetch_id: 0,
            deferred_labels: None,
            saved_labels_pending: false,
            label_stats: None,
            started_at: None,
            inconsistent: false,
        }
    }

    // Region loading

    /// Start loading a region. Only one load may be in flight.
    pub fn begin_load(&mut self, target: LoadTarget) -> Result<LoadTicket, SessionError> {
        if self.loading {
            log::warn!("Rejecting load of {:?}: a region is already loading", target);
            return Err(SessionError::ConcurrentLoad);
        }
        self.loading = true;
        log::debug!("Loading region {:?}", target);
        Ok(LoadTicket { target })
    }

    /// Finish a load with the server's answer.
    ///
    /// On success every per-region field is reset and background requests
    /// for the new region are returned as `Effect::Fetch`. On failure the
    /// previous region stays in place.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        response: Result<RegionResponse, ServiceError>,
    ) -> Result<Vec<Effect>, SessionError> {
        self.loading = false;

        let response = response.map_err(|e| {
            log::warn!("Region load failed: {}", e);
            SessionError::region_load(e.to_string())
        })?;
        let Some(mut region) = response.region else {
            log::info!("No regions left to label");
            return Err(SessionError::region_load("no regions left to label"));
        };
        if region.experiment_id.is_empty()
            && let Some(experiment_id) = response.experiment_id
        {
            region.experiment_id = experiment_id;
        }

        let was_reviewing = self.review.is_active();
        self.install_region(region, ticket.target);

        let mut effects = vec![
            Effect::SetControlEnabled {
                control: Control::Submit,
                enabled: false,
            },
            Effect::ShowSelection(None),
            Effect::Redraw,
        ];
        if was_reviewing {
            effects.push(Effect::ReviewModeChanged {
                active: false,
                count: 0,
            });
        }
        effects.extend(self.issue_region_fetches().into_iter().map(Effect::Fetch));
        Ok(effects)
    }

    /// Load a region against a blocking service.
    pub fn load_region(
        &mut self,
        target: LoadTarget,
        service: &dyn DataService,
    ) -> Result<Vec<Effect>, SessionError> {
        let ticket = self.begin_load(target)?;
        let response = match target {
            LoadTarget::Next => service.load_random_region(self.job_id),
            LoadTarget::Region(id) | LoadTarget::Submitted(id) => service.load_region_by_id(id),
        };
        self.complete_load(ticket, response)
    }

    fn install_region(&mut self, region: Region, target: LoadTarget) {
        log::info!(
            "Installed region {} of experiment {} ({}x{} at {},{})",
            region.id,
            region.experiment_id,
            region.width,
            region.height,
            region.x,
            region.y
        );
        self.region = Some(region);
        self.fov_bounds = None;
        self.rois = None;
        self.notes.clear();
        self.snapshot = LabelSnapshot::default();
        self.review.clear();
        self.mode = match target {
            LoadTarget::Submitted(_) => SubmitMode::Update,
            LoadTarget::Next | LoadTarget::Region(_) => SubmitMode::Submit,
        };
        self.saved_labels_pending = self.mode == SubmitMode::Update;
        self.pending.clear();
        self.deferred_labels = None;
        self.started_at = None;
        self.inconsistent = false;
    }

    fn issue_region_fetches(&mut self) -> Vec<FetchRequest> {
        let Some(region) = self.region.clone() else {
            return vec![];
        };
        let mut kinds = vec![
            FetchKind::FovBounds(region),
            FetchKind::RoiContours,
            FetchKind::LabelStats {
                job_id: self.job_id,
            },
        ];
        if self.mode == SubmitMode::Update {
            kinds.push(FetchKind::SavedLabels);
        }
        kinds
            .into_iter()
            .filter_map(|kind| self.issue_fetch(kind))
            .collect()
    }

    /// Tag a request with the current region and mark it pending.
    pub(crate) fn issue_fetch(&mut self, kind: FetchKind) -> Option<FetchRequest> {
        let tag = FetchTag::for_region(self.region.as_ref()?);
        let id = self.next_fetch_id;
        self.next_fetch_id += 1;
        self.pending.insert(id);
        Some(FetchRequest { id, tag, kind })
    }

    // Background results

    /// Apply a finished background request.
    ///
    /// Results issued for another region, or already superseded by a reload,
    /// are dropped without touching the session.
    pub fn apply_fetch(&mut self, result: FetchResult) -> Result<Vec<Effect>, SessionError> {
        let current = self.region.as_ref().is_some_and(|r| result.tag.matches(r));
        if !current || !self.pending.remove(&result.id) {
            log::debug!(
                "Discarding stale {} for region {} (request {})",
                result.kind,
                result.tag.region_id,
                result.id
            );
            return Ok(vec![]);
        }

        let outcome = result
            .outcome
            .map_err(|e| SessionError::network(result.kind, e))?;

        match outcome {
            FetchOutcome::FovBounds(bounds) => {
                let bounds = bounds.normalized();
                self.fov_bounds = Some(bounds);
                Ok(vec![Effect::SetFovBounds(bounds)])
            }
            FetchOutcome::RoiContours(entries) => Ok(self.install_rois(entries)),
            FetchOutcome::SavedLabels(saved) => {
                if self.rois.is_some() {
                    self.apply_saved_labels(saved);
                    self.refresh_snapshot();
                    Ok(vec![
                        Effect::SetControlEnabled {
                            control: Control::Submit,
                            enabled: self.can_submit(),
                        },
                        Effect::ShowSelection(None),
                        Effect::Redraw,
                    ])
                } else {
                    log::debug!("Saved labels arrived before contours, deferring");
                    self.deferred_labels = Some(saved);
                    Ok(vec![])
                }
            }
            FetchOutcome::LabelStats(stats) => {
                let text = stats.progress_text();
                self.label_stats = Some(stats);
                Ok(vec![Effect::ShowProgress(text)])
            }
        }
    }

    fn install_rois(&mut self, entries: Vec<ContourEntry>) -> Vec<Effect> {
        let rois = RoiStore::from_rois(entries.into_iter().map(|entry| {
            Roi::segmented(
                entry.id,
                entry.experiment_id,
                entry.classifier_score,
                entry.color,
                entry.contours,
            )
        }));
        log::info!("Installed {} ROIs", rois.len());
        self.rois = Some(rois);
        self.started_at = Some(Instant::now());

        if let Some(saved) = self.deferred_labels.take() {
            self.apply_saved_labels(saved);
        }
        self.refresh_snapshot();

        vec![
            Effect::SetControlEnabled {
                control: Control::Submit,
                enabled: self.can_submit(),
            },
            Effect::ShowSelection(None),
            Effect::Redraw,
        ]
    }

    /// Restore labels, hand-drawn shapes, confirmed points and notes saved earlier.
    fn apply_saved_labels(&mut self, saved: SavedLabels) {
        let Some(rois) = self.rois.as_mut() else {
            return;
        };
        let experiment_id = self
            .region
            .as_ref()
            .map(|r| r.experiment_id.clone())
            .unwrap_or_default();

        for entry in saved.labels {
            if let Some(roi) = rois.get_mut(&entry.roi_id) {
                roi.set_label(entry.label);
                continue;
            }

            let restored = match (entry.is_user_added, entry.contours, entry.point) {
                (true, Some(contours), _) => {
                    let mut roi = Roi::user_added(entry.roi_id, experiment_id.clone(), contours);
                    roi.set_label(entry.label);
                    Some(roi)
                }
                (false, _, Some(point)) => {
                    let mut roi = Roi::ephemeral(point, experiment_id.clone());
                    roi.id = entry.roi_id;
                    roi.set_label(entry.label);
                    Some(roi)
                }
                _ => {
                    log::warn!("Saved label for unknown ROI {} ignored", entry.roi_id);
                    None
                }
            };
            if let Some(roi) = restored {
                rois.insert(roi);
            }
        }

        for extra in saved.roi_extra {
            if !extra.notes.trim().is_empty() {
                self.notes.insert(extra.roi_id, extra.notes);
            }
        }
        self.saved_labels_pending = false;
    }

    // Notes

    /// Set the free-text note of an ROI. Empty text removes the note.
    pub fn set_note(&mut self, id: &RoiId, text: &str) -> Result<Vec<Effect>, SessionError> {
        let rois = self.require_rois()?;
        if !rois.contains(id) {
            return Err(SessionError::UnknownRoi(id.clone()));
        }
        let is_selected = rois.selected_id() == Some(id);

        if text.trim().is_empty() {
            self.notes.remove(id);
        } else {
            self.notes.insert(id.clone(), text.to_string());
        }
        log::debug!("Note for ROI {} set to {:?}", id, text);

        if is_selected {
            Ok(vec![Effect::ShowSelection(self.selection_summary())])
        } else {
            Ok(vec![])
        }
    }

    // Helpers for the operation modules

    /// The installed region and its ROIs.
    ///
    /// A reopened region is not ready until its saved labels are applied;
    /// edits made before that would be overwritten or sent without them.
    pub(crate) fn require_ready(&self) -> Result<(&Region, &RoiStore), SessionError> {
        let region = self.region.as_ref().ok_or(SessionError::NoRegion)?;
        let rois = self.rois.as_ref().ok_or(SessionError::NotReady)?;
        if self.saved_labels_pending {
            return Err(SessionError::NotReady);
        }
        Ok((region, rois))
    }

    pub(crate) fn require_rois(&self) -> Result<&RoiStore, SessionError> {
        self.require_ready().map(|(_, rois)| rois)
    }

    pub(crate) fn require_rois_mut(&mut self) -> Result<&mut RoiStore, SessionError> {
        if self.region.is_none() {
            return Err(SessionError::NoRegion);
        }
        if self.saved_labels_pending {
            return Err(SessionError::NotReady);
        }
        self.rois.as_mut().ok_or(SessionError::NotReady)
    }

    /// Drop the selected ROI if it is an unconfirmed point and `next` is a different ROI.
    pub(crate) fn evict_unconfirmed_selection(&mut self, next: &RoiId) {
        let Some(rois) = self.rois.as_mut() else {
            return;
        };
        let stale = rois
            .selected()
            .filter(|roi| roi.is_unconfirmed_point() && &roi.id != next)
            .map(|roi| roi.id.clone());
        if let Some(id) = stale {
            rois.remove(&id);
            self.notes.remove(&id);
            log::debug!("Discarded unconfirmed point ROI {}", id);
        }
    }

    pub(crate) fn refresh_snapshot(&mut self) {
        self.snapshot = match &self.rois {
            Some(rois) => LabelSnapshot::capture(rois, &self.notes),
            None => LabelSnapshot::default(),
        };
    }

    /// Record a successful submission or update.
    pub(crate) fn mark_saved(&mut self) {
        self.refresh_snapshot();
        self.review.clear();
        self.mode = SubmitMode::Update;
    }

    pub(crate) fn mark_inconsistent(&mut self) {
        self.inconsistent = true;
    }

    /// Side-panel projection of the selected ROI.
    pub fn selection_summary(&self) -> Option<SelectionSummary> {
        let roi = self.rois.as_ref()?.selected()?;
        Some(SelectionSummary {
            id: roi.id.clone(),
            kind: roi.kind(),
            label: roi.label,
            classifier_score: roi.classifier_score(),
            notes: self.notes.get(&roi.id).cloned(),
        })
    }

    // Accessors

    pub fn job_id(&self) -> i64 {
        self.job_id
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn render_settings(&self) -> &RenderSettings {
        &self.render
    }

    pub fn projection(&self) -> ProjectionType {
        self.projection
    }

    /// A region load is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// A region is installed but its ROIs have not arrived.
    pub fn is_awaiting_rois(&self) -> bool {
        self.region.is_some() && self.rois.is_none()
    }

    /// A reopened region is waiting for the labels submitted earlier.
    pub fn is_awaiting_saved_labels(&self) -> bool {
        self.saved_labels_pending
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        self.rois.is_some() && !self.saved_labels_pending && !self.inconsistent
    }

    pub fn pending_fetch_count(&self) -> usize {
        self.pending.len()
    }

    pub fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }

    pub fn fov_bounds(&self) -> Option<FovBounds> {
        self.fov_bounds
    }

    pub fn rois(&self) -> Option<&RoiStore> {
        self.rois.as_ref()
    }

    pub fn roi(&self, id: &RoiId) -> Option<&Roi> {
        self.rois.as_ref()?.get(id)
    }

    pub fn selected(&self) -> Option<&Roi> {
        self.rois.as_ref()?.selected()
    }

    pub fn note(&self, id: &RoiId) -> Option<&str> {
        self.notes.get(id).map(String::as_str)
    }

    pub fn notes(&self) -> &BTreeMap<RoiId, String> {
        &self.notes
    }

    pub fn snapshot(&self) -> &LabelSnapshot {
        &self.snapshot
    }

    pub fn review(&self) -> &ReviewGate {
        &self.review
    }

    pub fn submit_mode(&self) -> SubmitMode {
        self.mode
    }

    pub fn label_stats(&self) -> Option<&LabelStats> {
        self.label_stats.as_ref()
    }

    pub fn is_inconsistent(&self) -> bool {
        self.inconsistent
    }

    /// Seconds since the ROIs of the region were installed.
    pub fn elapsed_seconds(&self) -> f64 {
        self.started_at
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}
