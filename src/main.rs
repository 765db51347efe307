//! Replays a scripted labeling session against a fixture dataset.
//!
//! Usage: `cell-labeler-replay <fixture.json> [events.json]`
//!
//! The fixture is served by an in-memory data service, background requests
//! run on a fetch worker thread, and the effects of every event are logged.
//! The labels that would be submitted for the final region are printed as
//! JSON.

#[cfg(not(target_arch = "wasm32"))]
mod replay {
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use cell_labeler::message::Navigation;
    use cell_labeler::service::{
        FixtureService, JsonFilePreferenceStore, MemoryPreferenceStore, PreferenceStore,
    };
    use cell_labeler::state::{FetchWorker, SharedService};
    use cell_labeler::submission::build_payload;
    use cell_labeler::{
        AppConfig, Collaborators, Effect, Event, LoadTarget, SessionState, handle_event,
    };

    /// How long to wait for a background request before calling it stalled.
    const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

    #[derive(Debug, thiserror::Error)]
    pub enum ReplayError {
        #[error("usage: cell-labeler-replay <fixture.json> [events.json]")]
        Usage,

        #[error("could not read {path:?}: {source}")]
        Io {
            path: PathBuf,
            source: std::io::Error,
        },

        #[error("invalid JSON in {path:?}: {source}")]
        Json {
            path: PathBuf,
            source: serde_json::Error,
        },

        #[error("{0}")]
        Worker(String),
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T, ReplayError> {
        let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ReplayError::Json {
            path: path.clone(),
            source,
        })
    }

    fn open_preferences() -> Box<dyn PreferenceStore> {
        let Some(dir) = AppConfig::config_dir() else {
            return Box::new(MemoryPreferenceStore::new());
        };
        match JsonFilePreferenceStore::open(dir.join("preferences.json")) {
            Ok(store) => {
                log::debug!("Preferences stored in {:?}", store.path());
                Box::new(store)
            }
            Err(e) => {
                log::warn!("Using in-memory preferences: {}", e);
                Box::new(MemoryPreferenceStore::new())
            }
        }
    }

    /// Write the defaults on first run so there is a file to edit.
    /// An existing file that failed to parse is left alone.
    fn write_default_config(config: &AppConfig) {
        let missing = AppConfig::default_path().is_some_and(|path| !path.exists());
        if !missing {
            return;
        }
        if let Err(e) = config.save_to_default_path() {
            log::warn!("Could not write default configuration: {}", e);
        }
    }

    pub fn run() -> Result<(), ReplayError> {
        let config = AppConfig::load_from_default_path().unwrap_or_default();
        env_logger::Builder::new()
            .filter_level(config.log_level.to_level_filter())
            .parse_default_env()
            .init();
        write_default_config(&config);

        let mut args = std::env::args().skip(1).map(PathBuf::from);
        let fixture_path = args.next().ok_or(ReplayError::Usage)?;
        let events: Vec<Event> = match args.next() {
            Some(path) => read_json(&path)?,
            None => vec![Event::LoadRegion {
                target: LoadTarget::Next,
            }],
        };

        let service = Arc::new(FixtureService::new(read_json(&fixture_path)?));
        let mut worker =
            FetchWorker::spawn(service.clone() as SharedService).map_err(ReplayError::Worker)?;
        let mut preferences = open_preferences();
        let mut collaborators = Collaborators {
            service: service.as_ref(),
            preferences: preferences.as_mut(),
        };
        let mut state = SessionState::new(&config);

        let mut queue: VecDeque<Event> = events.into();
        'events: while let Some(event) = queue.pop_front() {
            log::info!("▶️ {:?}", event);
            let mut effects = handle_event(&mut state, event, &mut collaborators);

            loop {
                for effect in effects.drain(..) {
                    match effect {
                        Effect::Fetch(request) => worker.request(request),
                        Effect::Navigate(Navigation::NextRegion) => {
                            queue.push_front(Event::LoadRegion {
                                target: LoadTarget::Next,
                            });
                        }
                        Effect::Navigate(Navigation::Done) => {
                            log::info!("🏁 Nothing left to label");
                            break 'events;
                        }
                        other => log::info!("   {:?}", other),
                    }
                }

                if worker.pending_count() == 0 {
                    break;
                }
                match worker.wait_result(FETCH_TIMEOUT) {
                    Some(result) => {
                        effects =
                            handle_event(&mut state, Event::FetchCompleted(result), &mut collaborators);
                    }
                    None => {
                        log::warn!(
                            "{} background request(s) stalled, continuing without them",
                            worker.pending_count()
                        );
                        break;
                    }
                }
            }
        }

        log::info!(
            "Submitted {} region(s), updated {}",
            service.submitted().len(),
            service.updated().len()
        );
        match build_payload(&state) {
            Ok(payload) => match serde_json::to_string_pretty(&payload) {
                Ok(json) => println!("{}", json),
                Err(e) => log::error!("Could not encode payload: {}", e),
            },
            Err(e) => log::info!("No payload for the final region: {}", e),
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = replay::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// The replay tool has no browser counterpart
#[cfg(target_arch = "wasm32")]
fn main() {}
