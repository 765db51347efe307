//! Click handling: hit-test dispatch and label toggling.
//!
//! A click inside the region is first offered to the server's hit test. A hit
//! selects the ROI, or toggles it if it was already selected. A miss goes to
//! the point path, which toggles a nearby point ROI or creates a new one.

use crate::error::SessionError;
use crate::format::{HitTestRequest, UserAddedRoi};
use crate::message::Effect;
use crate::model::{Point, Roi, RoiId};
use crate::service::DataService;
use crate::state::SessionState;
use crate::validation::refresh_review;

/// Handle a click at `(x, y)` in FOV coordinates.
pub fn handle_click(
    state: &mut SessionState,
    service: &dyn DataService,
    x: f32,
    y: f32,
) -> Result<Vec<Effect>, SessionError> {
    let point = Point::new(x, y);
    let request = {
        let (region, rois) = state.require_ready()?;
        if !region.contains(point) {
            log::debug!("🚫 Click at ({:.1}, {:.1}) outside region {}", x, y, region.id);
            return Err(SessionError::OutOfBounds { x, y });
        }

        let candidates: Vec<&Roi> = rois
            .iter()
            .filter(|roi| !roi.is_point() && state.review.includes(roi))
            .collect();
        HitTestRequest {
            current_region_id: region.id,
            roi_ids: candidates.iter().map(|roi| roi.id.clone()).collect(),
            coordinates: [x, y],
            user_added_rois: candidates
                .iter()
                .filter(|roi| roi.is_user_added())
                .map(|roi| UserAddedRoi {
                    id: roi.id.clone(),
                    contours: roi.contours().map(<[_]>::to_vec).unwrap_or_default(),
                })
                .collect(),
        }
    };

    let hit = service
        .find_roi_at_coordinates(&request)
        .map_err(|e| SessionError::network("hit test", e))?;

    match hit {
        Some(id) => click_roi(state, id)?,
        None => click_blank(state, point)?,
    }
    let mut effects = refresh_review(state);
    effects.push(Effect::ShowSelection(state.selection_summary()));
    effects.push(Effect::Redraw);
    Ok(effects)
}

/// Segmented or hand-drawn ROI under the cursor.
fn click_roi(state: &mut SessionState, id: RoiId) -> Result<(), SessionError> {
    let rois = state.require_rois_mut()?;
    if !rois.contains(&id) {
        log::warn!("Hit test returned unknown ROI {}, ignoring click", id);
        return Ok(());
    }

    if rois.selected_id() == Some(&id) {
        if let Some(roi) = rois.get_mut(&id) {
            if roi.is_user_added() {
                log::debug!("🔁 Reselected hand-drawn ROI {}", id);
            } else {
                let label = roi.toggle_label();
                log::debug!("🏷️ ROI {} toggled to {}", id, label.name());
            }
        }
        return Ok(());
    }

    state.evict_unconfirmed_selection(&id);
    state.require_rois_mut()?.select(Some(id.clone()));
    log::debug!("👆 Selected ROI {}", id);
    Ok(())
}

/// Nothing under the cursor: toggle a nearby point ROI or drop a new one.
fn click_blank(state: &mut SessionState, point: Point) -> Result<(), SessionError> {
    let radius = state.settings.point_hit_radius;
    let experiment_id = state
        .region()
        .map(|r| r.experiment_id.clone())
        .unwrap_or_default();

    let nearest = state
        .require_rois()?
        .iter()
        .filter_map(|roi| roi.point().map(|p| (roi, p.distance_to(&point))))
        .filter(|(_, distance)| *distance <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(roi, _)| roi.id.clone());

    match nearest {
        Some(id) => {
            state.evict_unconfirmed_selection(&id);
            let rois = state.require_rois_mut()?;
            if let Some(roi) = rois.get_mut(&id) {
                let label = roi.toggle_label();
                log::debug!("📍 Point ROI {} toggled to {}", id, label.name());
            }
            rois.select(Some(id));
        }
        None => {
            let roi = Roi::ephemeral(point, experiment_id);
            let id = roi.id.clone();
            state.evict_unconfirmed_selection(&id);
            let rois = state.require_rois_mut()?;
            rois.insert(roi);
            rois.select(Some(id.clone()));
            log::debug!("📍 Created point ROI {}", id);
        }
    }
    Ok(())
}
