//! Per-projection contrast preferences.
//!
//! The stretch itself happens in the image widget; the session only remembers
//! which quantiles the user picked for each projection type.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HIGH_QUANTILE, DEFAULT_LOW_QUANTILE};
use crate::service::{PreferenceError, PreferenceStore};

/// Field-of-view projection shown behind the ROI outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionType {
    #[default]
    Max,
    Average,
    Correlation,
}

impl ProjectionType {
    pub fn name(&self) -> &'static str {
        match self {
            ProjectionType::Max => "max",
            ProjectionType::Average => "average",
            ProjectionType::Correlation => "correlation",
        }
    }

    /// Key the settings for this projection are stored under.
    pub fn preference_key(&self) -> String {
        format!("contrast_{}", self.name())
    }
}

/// Quantile clipping range for the contrast stretch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContrastSettings {
    pub low_quantile: f32,
    pub high_quantile: f32,
}

impl Default for ContrastSettings {
    fn default() -> Self {
        Self {
            low_quantile: DEFAULT_LOW_QUANTILE,
            high_quantile: DEFAULT_HIGH_QUANTILE,
        }
    }
}

impl ContrastSettings {
    /// `0 <= low < high <= 1`
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.low_quantile)
            && (0.0..=1.0).contains(&self.high_quantile)
            && self.low_quantile < self.high_quantile
    }
}

/// Stored settings for a projection, or the defaults.
pub fn load_contrast(store: &dyn PreferenceStore, projection: ProjectionType) -> ContrastSettings {
    let key = projection.preference_key();
    let Some(raw) = store.get(&key) else {
        return ContrastSettings::default();
    };

    match serde_json::from_str::<ContrastSettings>(&raw) {
        Ok(settings) if settings.is_valid() => settings,
        Ok(settings) => {
            log::warn!("Ignoring out-of-range contrast {:?} for {}", settings, key);
            ContrastSettings::default()
        }
        Err(e) => {
            log::warn!("Ignoring unreadable contrast preference {}: {}", key, e);
            ContrastSettings::default()
        }
    }
}

pub fn save_contrast(
    store: &mut dyn PreferenceStore,
    projection: ProjectionType,
    settings: ContrastSettings,
) -> Result<(), PreferenceError> {
    let json = serde_json::to_string(&settings)?;
    store.set(&projection.preference_key(), &json)
}
