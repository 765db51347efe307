//! Classifier agreement check and the discrepancy review gate.
//!
//! Before a region is submitted, every scored ROI's human label is compared
//! with what the classifier would say. Disagreements put the session into
//! review mode, which narrows the drawn and clickable ROIs to the disputed
//! ones (plus hand-drawn shapes) until they are resolved or the user submits
//! again with the bypass flag.

use std::collections::BTreeSet;

use crate::message::{AlertLevel, Effect};
use crate::model::{Label, Roi, RoiId};
use crate::state::SessionState;

/// Result of checking labels against classifier scores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid { disagreements: Vec<RoiId> },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }
}

/// True if the ROI has a score and its label contradicts it.
pub fn disagrees(roi: &Roi, threshold: f32) -> bool {
    match roi.classifier_score() {
        Some(score) => {
            (score >= threshold && roi.label != Label::Cell)
                || (score < threshold && roi.label == Label::Cell)
        }
        None => false,
    }
}

/// Collect every scored ROI whose label disagrees with its classifier score.
pub fn validate<'a>(rois: impl IntoIterator<Item = &'a Roi>, threshold: f32) -> Validation {
    let disagreements: Vec<RoiId> = rois
        .into_iter()
        .filter(|roi| disagrees(roi, threshold))
        .map(|roi| roi.id.clone())
        .collect();

    if disagreements.is_empty() {
        Validation::Valid
    } else {
        Validation::Invalid { disagreements }
    }
}

/// Review mode state for the current region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewGate {
    active: bool,
    disagreements: BTreeSet<RoiId>,
    /// One bypass is granted per failed validation.
    bypass_available: bool,
}

impl ReviewGate {
    /// Enter review mode for a set of disputed ROIs and grant one bypass.
    pub fn enter(&mut self, disagreements: impl IntoIterator<Item = RoiId>) {
        self.active = true;
        self.disagreements = disagreements.into_iter().collect();
        self.bypass_available = true;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn bypass_available(&self) -> bool {
        self.bypass_available
    }

    /// Number of ROIs under review.
    pub fn count(&self) -> usize {
        self.disagreements.len()
    }

    /// Whether an ROI is drawn and clickable. Everything is outside review mode.
    ///
    /// Point ROIs are not part of the subset, but `render::build_shapes` still
    /// draws them so confirmed points stay visible during review.
    pub fn includes(&self, roi: &Roi) -> bool {
        !self.active || roi.is_user_added() || self.disagreements.contains(&roi.id)
    }
}

/// Leave review mode once no disputed ROI disagrees any more.
pub fn refresh_review(state: &mut SessionState) -> Vec<Effect> {
    if !state.review.is_active() {
        return vec![];
    }
    let Some(rois) = state.rois.as_ref() else {
        return vec![];
    };

    let threshold = state.settings.classifier_threshold;
    if validate(rois.iter(), threshold).is_valid() {
        log::info!("All discrepancies resolved, leaving review mode");
        state.review.clear();
        vec![
            Effect::ReviewModeChanged {
                active: false,
                count: 0,
            },
            Effect::alert(AlertLevel::Info, "All discrepancies resolved"),
            Effect::Redraw,
        ]
    } else {
        vec![]
    }
}
