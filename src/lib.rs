//! cell-labeler - ROI annotation session engine
//!
//! Tracks the region under review, the candidate ROIs inside it and the
//! human cell/not-cell label of each, and reconciles clicks and shape edits
//! against the server's baseline. The host drives it with [`Event`]s through
//! [`handle_event`] and carries out the returned [`Effect`]s.
//!
//! Module map:
//! - [`model`]: ROI, region and registry types
//! - [`state`]: session state, loading, tagged background fetches
//! - [`selection`], [`reconciler`]: click handling and shape-edit reconciliation
//! - [`validation`], [`submission`]: classifier review gate and submit flow
//! - [`render`]: shapes for the Renderer
//! - [`service`]: server and preference collaborators

pub mod config;
pub mod constants;
pub mod contrast;
pub mod error;
pub mod format;
pub mod handlers;
pub mod message;
pub mod model;
pub mod reconciler;
pub mod render;
pub mod selection;
pub mod service;
pub mod state;
pub mod submission;
pub mod validation;

#[cfg(test)]
mod tests;

pub use config::AppConfig;
pub use error::SessionError;
pub use handlers::{Collaborators, dispatch_sync, handle_event};
pub use message::{Effect, Event};
pub use state::{LoadTarget, SessionState};
