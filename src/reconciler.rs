//! Applies shape-layer edits reported by the Renderer to the ROI registry.
//!
//! The Renderer owns the editable shapes the user draws, erases and drags.
//! After each edit it reports what happened; this module mirrors the change
//! into the registry. Reports may be repeated, so each handler leaves the
//! registry unchanged when the report matches what is already there.

use crate::error::SessionError;
use crate::format::{PathError, parse_ring};
use crate::message::Effect;
use crate::model::{Ring, Roi, RoiId};
use crate::state::SessionState;

/// Parse a Renderer path. A failure means the Renderer broke its contract,
/// so the session is marked inconsistent.
fn parse_reported_path(state: &mut SessionState, path: &str) -> Result<Ring, SessionError> {
    parse_ring(path).map_err(|e: PathError| {
        log::error!("Renderer reported an unparseable path {:?}: {}", path, e);
        state.mark_inconsistent();
        SessionError::GeometryParse(e)
    })
}

/// A closed path was drawn: create a hand-drawn ROI and select it.
pub fn shape_added(state: &mut SessionState, path: &str) -> Result<Vec<Effect>, SessionError> {
    state.require_rois()?;
    let ring = parse_reported_path(state, path)?;

    let rois = state.require_rois()?;
    let duplicate = rois
        .selected()
        .filter(|roi| roi.is_user_added())
        .and_then(|roi| roi.contours())
        .is_some_and(|rings| rings.len() == 1 && rings[0] == ring);
    if duplicate {
        log::debug!("Ignoring repeated add of the selected shape");
        return Ok(vec![]);
    }

    let id = RoiId::Number(rois.max_numeric_id().unwrap_or(0) + state.settings.user_added_id_offset);
    let experiment_id = state
        .region()
        .map(|r| r.experiment_id.clone())
        .unwrap_or_default();

    state.evict_unconfirmed_selection(&id);
    let rois = state.require_rois_mut()?;
    rois.insert(Roi::user_added(id.clone(), experiment_id, vec![ring]));
    rois.select(Some(id.clone()));
    log::debug!("✏️ Added hand-drawn ROI {}", id);

    Ok(vec![
        Effect::ShowSelection(state.selection_summary()),
        Effect::Redraw,
    ])
}

/// Editable shapes were erased. `rendered` lists the ids the Renderer still
/// draws; every hand-drawn ROI missing from it is deleted.
pub fn shapes_removed(
    state: &mut SessionState,
    rendered: &[RoiId],
) -> Result<Vec<Effect>, SessionError> {
    let rois = state.require_rois_mut()?;
    let erased: Vec<RoiId> = rois
        .iter()
        .filter(|roi| roi.is_user_added() && !rendered.contains(&roi.id))
        .map(|roi| roi.id.clone())
        .collect();
    if erased.is_empty() {
        return Ok(vec![]);
    }

    for id in &erased {
        rois.remove(id);
    }
    for id in &erased {
        state.notes.remove(id);
        log::debug!("🗑️ Removed hand-drawn ROI {}", id);
    }

    Ok(vec![
        Effect::ShowSelection(state.selection_summary()),
        Effect::Redraw,
    ])
}

/// An editable shape was reshaped. Only the selected ROI is updated.
pub fn shape_modified(
    state: &mut SessionState,
    id: &RoiId,
    path: &str,
) -> Result<Vec<Effect>, SessionError> {
    if state.require_rois()?.selected_id() != Some(id) {
        log::debug!("Ignoring modify of unselected shape {}", id);
        return Ok(vec![]);
    }
    let ring = parse_reported_path(state, path)?;

    let rois = state.require_rois_mut()?;
    let Some(roi) = rois.get_mut(id) else {
        return Err(SessionError::UnknownRoi(id.clone()));
    };
    if roi.contours() == Some(std::slice::from_ref(&ring)) {
        return Ok(vec![]);
    }
    if !roi.replace_contours(vec![ring]) {
        log::warn!("Point ROI {} cannot be reshaped", id);
        return Ok(vec![]);
    }
    log::debug!("🔧 Reshaped ROI {}", id);

    Ok(vec![Effect::Redraw])
}
