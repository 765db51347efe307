//! Event handlers for the labeling session.
//!
//! `handle_event` is the single entry point the host calls. It routes each
//! event to its operation, converts any `SessionError` into alert effects,
//! and resolves `Effect::Redraw` into a concrete `Effect::DrawShapes`.

use std::collections::VecDeque;

use crate::contrast::{ContrastSettings, load_contrast, save_contrast};
use crate::error::SessionError;
use crate::message::{AlertLevel, Control, Effect, Event, Navigation};
use crate::reconciler::{shape_added, shape_modified, shapes_removed};
use crate::render::build_shapes;
use crate::selection::handle_click;
use crate::service::{DataService, PreferenceStore};
use crate::state::SessionState;
use crate::submission::submit;

/// External collaborators reached while handling events.
pub struct Collaborators<'a> {
    pub service: &'a dyn DataService,
    pub preferences: &'a mut dyn PreferenceStore,
}

/// Handle one event and return the effects for the host to perform.
pub fn handle_event(
    state: &mut SessionState,
    event: Event,
    collaborators: &mut Collaborators<'_>,
) -> Vec<Effect> {
    let result = match event {
        Event::LoadRegion { target } => {
            log::debug!("🧭 Load region {:?}", target);
            state.load_region(target, collaborators.service)
        }
        Event::Click { x, y } => handle_click(state, collaborators.service, x, y),
        Event::ShapeAdded { path } => shape_added(state, &path),
        Event::ShapeRemoved { rendered } => shapes_removed(state, &rendered),
        Event::ShapeModified { id, path } => shape_modified(state, &id, &path),
        Event::SetNote { id, text } => state.set_note(&id, &text),
        Event::Submit { bypass_validation } => {
            log::debug!("📤 Submit (bypass: {})", bypass_validation);
            submit(state, collaborators.service, bypass_validation)
        }
        Event::ProjectionSelected { projection } => {
            state.projection = projection;
            let settings = load_contrast(&*collaborators.preferences, projection);
            log::debug!("🖼️ Projection {} with {:?}", projection.name(), settings);
            Ok(vec![Effect::ApplyContrast {
                projection,
                settings,
            }])
        }
        Event::ContrastChanged { settings } => Ok(handle_contrast_change(
            state,
            settings,
            &mut *collaborators.preferences,
        )),
        Event::ShowAllOutlines { enabled } => {
            state.render.show_all_outlines = enabled;
            Ok(vec![Effect::Redraw])
        }
        Event::ShowCurrentOutline { enabled } => {
            state.render.show_current_outline = enabled;
            Ok(vec![Effect::Redraw])
        }
        Event::FetchCompleted(result) => state.apply_fetch(result),
    };

    let effects = match result {
        Ok(effects) => effects,
        Err(e) => error_effects(state, e),
    };
    resolve_redraws(state, effects)
}

fn handle_contrast_change(
    state: &SessionState,
    settings: ContrastSettings,
    preferences: &mut dyn PreferenceStore,
) -> Vec<Effect> {
    if !settings.is_valid() {
        log::warn!("Rejecting contrast {:?}", settings);
        return vec![Effect::alert(
            AlertLevel::Warning,
            "Contrast range must satisfy 0 <= low < high <= 1",
        )];
    }

    let projection = state.projection();
    let mut effects = vec![Effect::ApplyContrast {
        projection,
        settings,
    }];
    if let Err(e) = save_contrast(preferences, projection, settings) {
        log::warn!("Failed to save contrast for {}: {}", projection.name(), e);
        effects.push(Effect::alert(
            AlertLevel::Warning,
            format!("Could not save contrast settings: {}", e),
        ));
    }
    effects
}

/// Turn an operation error into user-visible effects.
fn error_effects(state: &SessionState, error: SessionError) -> Vec<Effect> {
    let message = error.to_string();
    if error.is_fatal() {
        log::error!("{}", message);
        return vec![
            Effect::alert(AlertLevel::Error, message),
            Effect::SetControlEnabled {
                control: Control::Submit,
                enabled: false,
            },
        ];
    }

    match &error {
        SessionError::Network { .. } => {
            log::warn!("{}", message);
            vec![
                Effect::alert(AlertLevel::Warning, message),
                Effect::SetControlEnabled {
                    control: Control::Submit,
                    enabled: state.can_submit(),
                },
            ]
        }
        SessionError::Validation { count } => vec![
            Effect::alert(
                AlertLevel::Warning,
                format!(
                    "{}. Review the highlighted ROIs or submit again to keep your labels",
                    message
                ),
            ),
            Effect::ReviewModeChanged {
                active: true,
                count: *count,
            },
            Effect::Redraw,
        ],
        SessionError::RegionLoad { .. } => {
            log::warn!("{}", message);
            vec![
                Effect::alert(AlertLevel::Error, message),
                Effect::Navigate(Navigation::Done),
            ]
        }
        SessionError::UnknownRoi(_) => {
            log::warn!("{}", message);
            vec![Effect::alert(AlertLevel::Warning, message)]
        }
        _ => {
            log::debug!("{}", message);
            vec![Effect::alert(AlertLevel::Info, message)]
        }
    }
}

/// Replace `Redraw` markers with one `DrawShapes` at the position of the last marker.
fn resolve_redraws(state: &SessionState, effects: Vec<Effect>) -> Vec<Effect> {
    let Some(last) = effects.iter().rposition(|e| *e == Effect::Redraw) else {
        return effects;
    };
    effects
        .into_iter()
        .enumerate()
        .filter_map(|(i, effect)| match effect {
            Effect::Redraw if i == last => Some(Effect::DrawShapes(build_shapes(state))),
            Effect::Redraw => None,
            other => Some(other),
        })
        .collect()
}

/// Handle an event and run every background request it triggers inline.
///
/// Fetch results are fed back as `Event::FetchCompleted` until none remain.
/// The returned effects contain no `Effect::Fetch`.
pub fn dispatch_sync(
    state: &mut SessionState,
    event: Event,
    collaborators: &mut Collaborators<'_>,
) -> Vec<Effect> {
    let mut queue = VecDeque::from([event]);
    let mut out = Vec::new();

    while let Some(event) = queue.pop_front() {
        for effect in handle_event(state, event, collaborators) {
            match effect {
                Effect::Fetch(request) => {
                    let result = request.execute(collaborators.service);
                    queue.push_back(Event::FetchCompleted(result));
                }
                other => out.push(other),
            }
        }
    }
    out
}
