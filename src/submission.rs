//! Submission payload, unsaved-changes check and the submit/update flow.

use crate::error::SessionError;
use crate::format::{LabelEntry, RoiExtraEntry, SubmissionPayload};
use crate::message::{AlertLevel, Control, Effect, Navigation};
use crate::service::DataService;
use crate::state::{FetchKind, LabelSnapshot, SessionState, SubmitMode};
use crate::validation::{Validation, validate};

/// Build the labels and notes for the current region.
///
/// Point ROIs still labeled not-cell are never reported. Rings are sent only
/// for hand-drawn ROIs; the server already knows the segmented ones.
pub fn build_payload(state: &SessionState) -> Result<SubmissionPayload, SessionError> {
    let (region, rois) = state.require_ready()?;

    let reported: Vec<_> = rois.iter().filter(|roi| !roi.is_unconfirmed_point()).collect();
    let labels = reported
        .iter()
        .map(|roi| LabelEntry {
            roi_id: roi.id.clone(),
            is_user_added: roi.is_user_added(),
            contours: if roi.is_user_added() {
                roi.contours().map(<[_]>::to_vec)
            } else {
                None
            },
            point: roi.point(),
            label: roi.label,
        })
        .collect();
    let roi_extra = reported
        .iter()
        .filter_map(|roi| {
            state.note(&roi.id).map(|notes| RoiExtraEntry {
                roi_id: roi.id.clone(),
                notes: notes.to_string(),
            })
        })
        .collect();

    Ok(SubmissionPayload {
        region_id: region.id,
        labels,
        roi_extra,
        duration: state.elapsed_seconds(),
    })
}

/// True if labels or notes changed since the region was loaded or last saved.
pub fn is_unsaved_changes(state: &SessionState) -> bool {
    match state.rois() {
        Some(rois) => LabelSnapshot::capture(rois, state.notes()).differs_from(state.snapshot()),
        None => false,
    }
}

/// Validate, then submit or update the region's labels.
///
/// Validation failure enters review mode and grants one bypass, which the
/// next call with `bypass_validation` consumes. A failed call leaves the
/// session untouched.
pub fn submit(
    state: &mut SessionState,
    service: &dyn DataService,
    bypass_validation: bool,
) -> Result<Vec<Effect>, SessionError> {
    state.require_ready()?;
    if state.is_inconsistent() {
        return Err(SessionError::Inconsistent);
    }

    let bypassed = bypass_validation && state.review.bypass_available();
    if state.settings.validate_before_submit && !bypassed {
        let rois = state.require_rois()?;
        if let Validation::Invalid { disagreements } =
            validate(rois.iter(), state.settings.classifier_threshold)
        {
            let count = disagreements.len();
            log::info!("{} label(s) disagree with the classifier, entering review", count);
            state.review.enter(disagreements);
            return Err(SessionError::Validation { count });
        }
    }
    if bypassed {
        log::info!("Submitting with validation bypassed");
    }

    let payload = build_payload(state)?;
    let mode = state.submit_mode();
    let sent = match mode {
        SubmitMode::Submit => service.submit_region(&payload),
        SubmitMode::Update => service.update_region_labels(&payload),
    };
    sent.map_err(|e| SessionError::network("submit", e))?;

    let was_reviewing = state.review.is_active();
    state.mark_saved();
    log::info!(
        "✅ {} {} label(s) for region {} after {:.1}s",
        if mode == SubmitMode::Submit { "Submitted" } else { "Updated" },
        payload.labels.len(),
        payload.region_id,
        payload.duration
    );

    let mut effects = Vec::new();
    if was_reviewing {
        effects.push(Effect::ReviewModeChanged {
            active: false,
            count: 0,
        });
    }
    effects.push(Effect::SetControlEnabled {
        control: Control::Submit,
        enabled: true,
    });
    if let Some(request) = state.issue_fetch(FetchKind::LabelStats {
        job_id: state.job_id(),
    }) {
        effects.push(Effect::Fetch(request));
    }
    match mode {
        SubmitMode::Submit => {
            effects.push(Effect::alert(AlertLevel::Info, "Labels submitted"));
            effects.push(Effect::Navigate(Navigation::NextRegion));
        }
        SubmitMode::Update => {
            effects.push(Effect::alert(AlertLevel::Info, "Labels updated"));
            effects.push(Effect::Redraw);
        }
    }
    Ok(effects)
}
