//! Builds the shape list handed to the Renderer.

use crate::format::{point_marker_path, ring_to_path};
use crate::model::{Geometry, RED, Rgb, Roi, RoiId};
use crate::state::SessionState;

/// One shape for the Renderer's shape layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeSpec {
    /// Closed path, one `M ... Z` subpath per ring
    pub path: String,
    pub color: Rgb,
    pub line_width: f32,
    /// Hidden shapes stay in the layer so the Renderer can still report them
    pub visible: bool,
    /// Hand-drawn shapes may be reshaped and erased
    pub editable: bool,
    pub roi_id: RoiId,
}

fn shape_path(roi: &Roi, marker_half_size: f32) -> String {
    match roi.geometry() {
        Geometry::Contours(rings) => rings
            .iter()
            .map(|ring| ring_to_path(ring))
            .collect::<Vec<_>>()
            .join(" "),
        Geometry::Point(point) => point_marker_path(*point, marker_half_size),
    }
}

/// Shapes for the current region, in registry order.
///
/// In review mode only disputed ROIs, hand-drawn ROIs and point ROIs are
/// drawn. The selected ROI is drawn in red with a wider line when the
/// current outline is shown; other ROIs are drawn only when all outlines
/// are shown.
///
/// Hand-drawn ROIs are always part of the list, hidden ones with
/// `visible: false`. The Renderer answers an erase with the ids it still
/// holds, and any hand-drawn ROI missing from that answer is deleted.
pub fn build_shapes(state: &SessionState) -> Vec<ShapeSpec> {
    let Some(rois) = state.rois() else {
        return vec![];
    };
    let settings = state.render_settings();
    let review = state.review();
    let selected = rois.selected_id();

    rois.iter()
        .filter(|roi| review.includes(roi) || roi.is_point())
        .filter_map(|roi| {
            let is_selected = selected == Some(&roi.id);
            let (color, line_width, visible) = if is_selected && settings.show_current_outline {
                (RED, settings.selected_line_width, true)
            } else if settings.show_all_outlines {
                (roi.color, settings.line_width, true)
            } else if roi.is_user_added() {
                (roi.color, settings.line_width, false)
            } else {
                return None;
            };

            Some(ShapeSpec {
                path: shape_path(roi, settings.point_marker_half_size),
                color,
                line_width,
                visible,
                editable: roi.is_user_added(),
                roi_id: roi.id.clone(),
            })
        })
        .collect()
}
