//! Registry of the ROIs in the current region, plus the selection pointer.

use super::roi::{Roi, RoiId};

/// Storage for the ROIs of a single region.
///
/// Keeps insertion order, which is also draw order. Ids are unique: inserting
/// an ROI whose id is already present is refused.
#[derive(Debug, Clone, Default)]
pub struct RoiStore {
    rois: Vec<Roi>,
    /// Currently selected ROI id. At most one ROI is selected.
    selected_id: Option<RoiId>,
}

impl RoiStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from server ROIs, dropping any duplicate ids.
    pub fn from_rois(rois: impl IntoIterator<Item = Roi>) -> Self {
        let mut store = Self::new();
        for roi in rois {
            let id = roi.id.clone();
            if !store.insert(roi) {
                log::warn!("Dropping duplicate ROI id {} from contour payload", id);
            }
        }
        store
    }

    /// Add an ROI. Returns false if the id is already taken.
    pub fn insert(&mut self, roi: Roi) -> bool {
        if self.contains(&roi.id) {
            return false;
        }
        self.rois.push(roi);
        true
    }

    /// Remove an ROI by ID. Clears the selection if it pointed at the ROI.
    pub fn remove(&mut self, id: &RoiId) -> Option<Roi> {
        let index = self.rois.iter().position(|r| &r.id == id)?;
        if self.selected_id.as_ref() == Some(id) {
            self.selected_id = None;
        }
        Some(self.rois.remove(index))
    }

    pub fn get(&self, id: &RoiId) -> Option<&Roi> {
        self.rois.iter().find(|r| &r.id == id)
    }

    pub fn get_mut(&mut self, id: &RoiId) -> Option<&mut Roi> {
        self.rois.iter_mut().find(|r| &r.id == id)
    }

    pub fn contains(&self, id: &RoiId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Roi> {
        self.rois.iter()
    }

    pub fn len(&self) -> usize {
        self.rois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rois.is_empty()
    }

    /// Largest numeric id in the store, if any.
    pub fn max_numeric_id(&self) -> Option<i64> {
        self.rois.iter().filter_map(|r| r.id.as_number()).max()
    }

    /// Select an ROI. Selecting an id that is not in the store clears the selection.
    pub fn select(&mut self, id: Option<RoiId>) {
        self.selected_id = id.filter(|id| self.contains(id));
    }

    /// Get the selected ROI ID.
    pub fn selected_id(&self) -> Option<&RoiId> {
        self.selected_id.as_ref()
    }

    pub fn selected(&self) -> Option<&Roi> {
        self.selected_id.as_ref().and_then(|id| self.get(id))
    }

    pub fn selected_mut(&mut self) -> Option<&mut Roi> {
        let id = self.selected_id.clone()?;
        self.get_mut(&id)
    }
}
