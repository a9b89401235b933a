use crate::data::aggregate::{build_views, DashboardViews};
use crate::data::filter::{filtered_indices, init_filter_state, FilterState};
use crate::data::model::AccidentDataset;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// `views` is the cached output of the pure pipeline
/// `(dataset, filters) → DashboardViews`; it is `None` both before a dataset
/// is loaded and when the current selection filters everything out (the
/// "no data for current selection" state).
pub struct AppState {
    /// Loaded dataset (None until a file is loaded). Immutable once set.
    pub dataset: Option<AccidentDataset>,

    /// Year / province selections.
    pub filters: FilterState,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Aggregated views over `visible_indices`; `None` when that set is empty.
    pub views: Option<DashboardViews>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            filters: FilterState::default(),
            visible_indices: Vec::new(),
            views: None,
            status_message: None,
            loading: false,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset: select everything, compute views.
    pub fn set_dataset(&mut self, dataset: AccidentDataset) {
        self.filters = init_filter_state(&dataset);
        self.dataset = Some(dataset);
        self.status_message = None;
        self.loading = false;
        self.refilter();
    }

    /// Recompute `visible_indices` and the aggregated views after any
    /// filter change. The whole pipeline reruns; nothing is updated
    /// incrementally.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            self.visible_indices.clear();
            self.views = None;
            return;
        };
        self.visible_indices = filtered_indices(ds, &self.filters);
        self.views = if self.visible_indices.is_empty() {
            None
        } else {
            Some(build_views(ds, &self.visible_indices))
        };
    }

    /// Toggle one year in the filter selection.
    pub fn toggle_year(&mut self, year: i32) {
        if !self.filters.years.remove(&year) {
            self.filters.years.insert(year);
        }
        self.refilter();
    }

    /// Toggle one province in the filter selection.
    pub fn toggle_province(&mut self, province: &str) {
        if !self.filters.provinces.remove(province) {
            self.filters.provinces.insert(province.to_string());
        }
        self.refilter();
    }

    /// Select all years.
    pub fn select_all_years(&mut self) {
        if let Some(ds) = &self.dataset {
            self.filters.years = ds.years.clone();
            self.refilter();
        }
    }

    /// Deselect all years.
    pub fn select_no_years(&mut self) {
        self.filters.years.clear();
        self.refilter();
    }

    /// Select all provinces.
    pub fn select_all_provinces(&mut self) {
        if let Some(ds) = &self.dataset {
            self.filters.provinces = ds.provinces.clone();
            self.refilter();
        }
    }

    /// Deselect all provinces.
    pub fn select_no_provinces(&mut self) {
        self.filters.provinces.clear();
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    fn record(year: i32, month: u32, province: &str) -> Record {
        Record {
            year: Some(year),
            month: Some(month),
            province: Some(province.to_string()),
            ..Record::default()
        }
    }

    fn loaded_state() -> AppState {
        let mut state = AppState::default();
        state.set_dataset(AccidentDataset::from_records(
            vec![
                record(2019, 3, "Córdoba"),
                record(2019, 3, "Córdoba"),
                record(2020, 1, "Chaco"),
            ],
            true,
        ));
        state
    }

    #[test]
    fn loading_selects_everything_and_builds_views() {
        let state = loaded_state();
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        let views = state.views.as_ref().expect("views for non-empty selection");
        assert_eq!(views.kpis.total_victims, 3);
    }

    #[test]
    fn empty_selection_halts_aggregation() {
        let mut state = loaded_state();
        state.select_no_years();
        assert!(state.visible_indices.is_empty());
        assert!(state.views.is_none());

        state.select_all_years();
        assert_eq!(state.views.as_ref().unwrap().kpis.total_victims, 3);
    }

    #[test]
    fn toggling_a_year_reruns_the_pipeline() {
        let mut state = loaded_state();
        state.toggle_year(2020);
        assert_eq!(state.visible_indices, vec![0, 1]);
        assert_eq!(state.views.as_ref().unwrap().kpis.total_victims, 2);

        state.toggle_year(2020);
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn toggling_a_province_reruns_the_pipeline() {
        let mut state = loaded_state();
        state.toggle_province("Córdoba");
        assert_eq!(state.visible_indices, vec![2]);
        assert_eq!(
            state.views.as_ref().unwrap().top_provinces,
            vec![("Chaco".to_string(), 1)]
        );
    }
}
