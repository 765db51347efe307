//! End-to-end labeling scenarios on a loaded region.

use super::support::{Harness, alerts};
use crate::error::SessionError;
use crate::message::{AlertLevel, Effect, Event, Navigation};
use crate::model::{Geometry, Label, RED, RoiId, WHITE};
use crate::selection::handle_click;
use crate::submission::{build_payload, is_unsaved_changes};
use crate::validation::{Validation, validate};

fn label_of(harness: &Harness, id: &RoiId) -> Option<Label> {
    harness.state.roi(id).map(|roi| roi.label)
}

#[test]
fn test_region_loads_with_not_cell_labels() {
    let harness = Harness::loaded();
    assert_eq!(harness.roi_count(), 2);
    assert!(harness.selected_id().is_none());
    assert_eq!(label_of(&harness, &RoiId::Number(1)), Some(Label::NotCell));
    assert_eq!(label_of(&harness, &RoiId::Number(2)), Some(Label::NotCell));
    assert!(harness.state.fov_bounds().is_some());
    assert!(!is_unsaved_changes(&harness.state));
}

#[test]
fn test_scenario_a_select_then_toggle() {
    let mut harness = Harness::loaded();

    harness.click(25.0, 25.0);
    assert_eq!(harness.selected_id(), Some(RoiId::Number(1)));
    assert_eq!(label_of(&harness, &RoiId::Number(1)), Some(Label::NotCell));

    harness.click(25.0, 25.0);
    assert_eq!(label_of(&harness, &RoiId::Number(1)), Some(Label::Cell));

    let rois = harness.state.rois().unwrap();
    assert_eq!(validate(rois.iter(), 0.5), Validation::Valid);
}

#[test]
fn test_reclick_toggles_back_and_forth() {
    let mut harness = Harness::loaded();
    harness.click(80.0, 80.0);
    harness.click(80.0, 80.0);
    assert_eq!(label_of(&harness, &RoiId::Number(2)), Some(Label::Cell));
    harness.click(80.0, 80.0);
    assert_eq!(label_of(&harness, &RoiId::Number(2)), Some(Label::NotCell));
    assert!(!is_unsaved_changes(&harness.state));
}

#[test]
fn test_scenario_b_drawn_roi_is_a_cell_without_score() {
    let mut harness = Harness::loaded();
    harness.send(Event::ShapeAdded {
        path: "M40,40L55,40L55,55L40,55Z".to_string(),
    });

    let id = RoiId::Number(102);
    let roi = harness.state.roi(&id).unwrap();
    assert!(roi.is_user_added());
    assert_eq!(roi.label, Label::Cell);
    assert!(roi.classifier_score().is_none());
    assert_eq!(harness.selected_id(), Some(id.clone()));

    match validate(harness.state.rois().unwrap().iter(), 0.5) {
        Validation::Invalid { disagreements } => {
            assert_eq!(disagreements, vec![RoiId::Number(1)]);
        }
        Validation::Valid => panic!("ROI 1 should disagree"),
    }
}

#[test]
fn test_scenario_c_click_outside_region() {
    let mut harness = Harness::loaded();
    let before = harness.roi_count();

    let err = handle_click(&mut harness.state, &harness.service, 5.0, 5.0).unwrap_err();
    assert_eq!(err, SessionError::OutOfBounds { x: 5.0, y: 5.0 });
    assert_eq!(harness.roi_count(), before);
    assert_eq!(harness.service.hit_test_count(), 0);

    let effects = harness.click(5.0, 5.0);
    assert_eq!(alerts(&effects, AlertLevel::Info).len(), 1);
    assert_eq!(harness.roi_count(), before);
}

#[test]
fn test_scenario_d_blank_clicks_replace_unconfirmed_points() {
    let mut harness = Harness::loaded();

    harness.click(50.0, 50.0);
    let first = RoiId::Coord("50,50".to_string());
    let roi = harness.state.roi(&first).unwrap();
    assert_eq!(roi.label, Label::NotCell);
    assert_eq!(roi.color, WHITE);
    assert_eq!(harness.roi_count(), 3);

    harness.click(60.0, 60.0);
    assert!(harness.state.roi(&first).is_none());
    assert_eq!(harness.selected_id(), Some(RoiId::Coord("60,60".to_string())));
    assert_eq!(harness.roi_count(), 3);
}

#[test]
fn test_unconfirmed_point_evicted_when_roi_selected() {
    let mut harness = Harness::loaded();
    harness.click(50.0, 50.0);
    harness.click(25.0, 25.0);

    assert!(harness.state.roi(&RoiId::Coord("50,50".to_string())).is_none());
    assert_eq!(harness.selected_id(), Some(RoiId::Number(1)));
}

#[test]
fn test_nearby_click_confirms_point() {
    let mut harness = Harness::loaded();
    harness.click(50.0, 50.0);
    harness.click(52.0, 52.0);

    let id = RoiId::Coord("50,50".to_string());
    let roi = harness.state.roi(&id).unwrap();
    assert_eq!(roi.label, Label::Cell);
    assert_eq!(roi.color, RED);
    assert_eq!(harness.roi_count(), 3);

    // Confirmed points survive a selection change and are reported.
    harness.click(25.0, 25.0);
    assert!(harness.state.roi(&id).is_some());
    let payload = build_payload(&harness.state).unwrap();
    let entry = payload.labels.iter().find(|l| l.roi_id == id).unwrap();
    assert_eq!(entry.label, Label::Cell);
    assert!(entry.point.is_some());
    assert!(entry.contours.is_none());
}

#[test]
fn test_payload_never_reports_unconfirmed_points() {
    let mut harness = Harness::loaded();
    harness.click(50.0, 50.0);

    let payload = build_payload(&harness.state).unwrap();
    assert_eq!(payload.region_id, 1);
    assert_eq!(payload.labels.len(), 2);
    assert!(payload.labels.iter().all(|l| l.point.is_none()));
    assert!(!is_unsaved_changes(&harness.state));
}

#[test]
fn test_payload_sends_rings_only_for_drawn_rois() {
    let mut harness = Harness::loaded();
    harness.send(Event::ShapeAdded {
        path: "M40,40L55,40L55,55Z".to_string(),
    });

    let payload = build_payload(&harness.state).unwrap();
    for entry in &payload.labels {
        assert_eq!(entry.contours.is_some(), entry.is_user_added);
    }
    assert!(payload.duration >= 0.0);
}

#[test]
fn test_geometry_is_exclusive_for_every_roi() {
    let mut harness = Harness::loaded();
    harness.click(50.0, 50.0);
    harness.click(52.0, 52.0);
    harness.send(Event::ShapeAdded {
        path: "M40,60L55,60L55,70Z".to_string(),
    });

    for roi in harness.state.rois().unwrap().iter() {
        match roi.geometry() {
            Geometry::Contours(rings) => assert!(!rings.is_empty() && roi.point().is_none()),
            Geometry::Point(_) => assert!(roi.contours().is_none()),
        }
        assert_eq!(
            roi.classifier_score().is_none(),
            roi.is_user_added() || roi.is_point()
        );
    }
}

#[test]
fn test_ids_stay_unique() {
    let mut harness = Harness::loaded();
    harness.click(50.0, 50.0);
    harness.click(52.0, 52.0);
    for path in ["M40,60L55,60L55,70Z", "M12,40L18,40L18,48Z"] {
        harness.send(Event::ShapeAdded {
            path: path.to_string(),
        });
    }

    let mut ids: Vec<RoiId> = harness
        .state
        .rois()
        .unwrap()
        .iter()
        .map(|roi| roi.id.clone())
        .collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
    assert!(harness.state.roi(&RoiId::Number(102)).is_some());
    assert!(harness.state.roi(&RoiId::Number(202)).is_some());
}

#[test]
fn test_unsaved_changes_track_labels_and_notes() {
    let mut harness = Harness::loaded();
    assert!(!is_unsaved_changes(&harness.state));

    harness.send(Event::SetNote {
        id: RoiId::Number(2),
        text: "out of focus".to_string(),
    });
    assert!(is_unsaved_changes(&harness.state));
    harness.send(Event::SetNote {
        id: RoiId::Number(2),
        text: String::new(),
    });
    assert!(!is_unsaved_changes(&harness.state));

    harness.click(25.0, 25.0);
    harness.click(25.0, 25.0);
    assert!(is_unsaved_changes(&harness.state));

    let effects = harness.submit(false);
    assert!(effects.contains(&Effect::Navigate(Navigation::NextRegion)));
    assert!(!is_unsaved_changes(&harness.state));
}

#[test]
fn test_selection_summary_shown_after_click() {
    let mut harness = Harness::loaded();
    let effects = harness.click(25.0, 25.0);

    let summary = effects.iter().find_map(|effect| match effect {
        Effect::ShowSelection(Some(summary)) => Some(summary.clone()),
        _ => None,
    });
    let summary = summary.unwrap();
    assert_eq!(summary.id, RoiId::Number(1));
    assert_eq!(summary.classifier_score, Some(0.9));
    assert!(effects.iter().any(|e| matches!(e, Effect::DrawShapes(_))));
    assert!(!effects.contains(&Effect::Redraw));
}
