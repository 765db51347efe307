//! Events fed into the session and effects it asks the host to carry out.
//!
//! The host (a browser shell, the replay binary, a test) owns the Renderer,
//! the notification area and the network. It turns user input and finished
//! requests into [`Event`]s, passes them to `handlers::handle_event`, and
//! performs the returned [`Effect`]s in order.

use serde::{Deserialize, Serialize};

use crate::contrast::{ContrastSettings, ProjectionType};
use crate::model::{FovBounds, Label, RoiId, RoiKind};
use crate::render::ShapeSpec;
use crate::state::{FetchRequest, FetchResult, LoadTarget};

/// Input to the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Navigate to a region
    LoadRegion { target: LoadTarget },
    /// Click on the plot, in FOV coordinates
    Click { x: f32, y: f32 },
    /// A closed path was drawn on the shape layer
    ShapeAdded { path: String },
    /// Editable shapes were erased; `rendered` lists the ids still drawn
    ShapeRemoved { rendered: Vec<RoiId> },
    /// An editable shape was reshaped
    ShapeModified { id: RoiId, path: String },
    /// Note text edited in the side panel
    SetNote { id: RoiId, text: String },
    /// Submit button pressed
    Submit {
        #[serde(default)]
        bypass_validation: bool,
    },
    /// Projection dropdown changed
    ProjectionSelected { projection: ProjectionType },
    /// Contrast sliders released
    ContrastChanged { settings: ContrastSettings },
    /// "Show all outlines" checkbox toggled
    ShowAllOutlines { enabled: bool },
    /// "Show current outline" checkbox toggled
    ShowCurrentOutline { enabled: bool },
    /// A background request finished
    #[serde(skip)]
    FetchCompleted(FetchResult),
}

/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
}

/// UI controls the session enables and disables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Submit,
}

/// Where the host should navigate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Load the next region to label
    NextRegion,
    /// Nothing left to label, or the job cannot continue
    Done,
}

/// Side-panel projection of the selected ROI.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSummary {
    pub id: RoiId,
    pub kind: RoiKind,
    pub label: Label,
    pub classifier_score: Option<f32>,
    pub notes: Option<String>,
}

/// Side effect requested by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Shapes changed; resolved into `DrawShapes` before reaching the host
    Redraw,
    /// Replace the Renderer's shape layer
    DrawShapes(Vec<ShapeSpec>),
    /// Set the plot axes
    SetFovBounds(FovBounds),
    /// Update the side panel
    ShowSelection(Option<SelectionSummary>),
    /// Show a transient notification
    Alert { level: AlertLevel, message: String },
    SetControlEnabled { control: Control, enabled: bool },
    /// Run a background request and feed the result back
    Fetch(FetchRequest),
    /// Restretch the background image
    ApplyContrast {
        projection: ProjectionType,
        settings: ContrastSettings,
    },
    /// Update the progress line
    ShowProgress(String),
    Navigate(Navigation),
    /// Discrepancy review started or ended
    ReviewModeChanged { active: bool, count: usize },
}

impl Effect {
    pub fn alert(level: AlertLevel, message: impl Into<String>) -> Self {
        Effect::Alert {
            level,
            message: message.into(),
        }
    }
}
