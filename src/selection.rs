//! Dashboard selection state and its transitions.
//!
//! This is the only mutable state in the crate. Each transition returns
//! whether it changed anything; the caller recomputes every derived view
//! after a change.
use crate::table::{SortDirection, TableQuery, DEFAULT_PAGE_SIZE};
use log::{debug, warn};
use serde::Serialize;

/// Most crops that can be overlaid in comparison mode.
pub const MAX_COMPARED_CROPS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// Comparison mode off, cap reached, or removing the last compared crop.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TableState {
    pub search_term: String,
    pub sort_column: Option<String>,
    pub sort_direction: SortDirection,
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    active_crop: String,
    active_crops: Vec<String>,
    year_min: i32,
    year_max: i32,
    /// Years the selectors may offer, from the loaded data.
    available: (i32, i32),
    comparison_mode: bool,
    table: TableState,
}

impl SelectionState {
    /// Start on `crop` with the full available year range selected.
    pub fn new(crop: impl Into<String>, available: (i32, i32)) -> Self {
        let (lo, hi) = if available.0 <= available.1 {
            available
        } else {
            (available.1, available.0)
        };
        SelectionState {
            active_crop: crop.into(),
            active_crops: Vec::new(),
            year_min: lo,
            year_max: hi,
            available: (lo, hi),
            comparison_mode: false,
            table: TableState {
                page: 1,
                ..TableState::default()
            },
        }
    }

    pub fn active_crop(&self) -> &str {
        &self.active_crop
    }

    pub fn active_crops(&self) -> &[String] {
        &self.active_crops
    }

    pub fn year_range(&self) -> (i32, i32) {
        (self.year_min, self.year_max)
    }

    pub fn comparison_mode(&self) -> bool {
        self.comparison_mode
    }

    pub fn table(&self) -> &TableState {
        &self.table
    }

    /// Query for [`crate::table::table_view`] built from the table state.
    pub fn table_query(&self) -> TableQuery<'_> {
        TableQuery {
            search: &self.table.search_term,
            sort_column: self.table.sort_column.as_deref(),
            sort_direction: self.table.sort_direction,
            page: self.table.page,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    fn reset_page(&mut self) {
        self.table.page = 1;
    }

    /// Replace the single active crop.
    pub fn select_crop(&mut self, code: impl Into<String>) -> bool {
        let code = code.into();
        if code == self.active_crop {
            return false;
        }
        debug!("active crop {} -> {}", self.active_crop, code);
        self.active_crop = code;
        self.reset_page();
        true
    }

    /// Whether another crop may join the comparison set; a UI disables the
    /// remaining crop buttons when this is false.
    pub fn can_add_crop(&self) -> bool {
        self.active_crops.len() < MAX_COMPARED_CROPS
    }

    /// Add or remove a crop from the comparison set. Only allowed in
    /// comparison mode.
    pub fn toggle_crop(&mut self, code: &str) -> ToggleOutcome {
        if !self.comparison_mode {
            warn!("ignoring toggle of {}: comparison mode is off", code);
            return ToggleOutcome::Rejected;
        }
        if let Some(pos) = self.active_crops.iter().position(|c| c == code) {
            if self.comparison_mode && self.active_crops.len() == 1 {
                warn!("keeping {}: comparison needs at least one crop", code);
                return ToggleOutcome::Rejected;
            }
            self.active_crops.remove(pos);
            self.reset_page();
            return ToggleOutcome::Removed;
        }
        if !self.can_add_crop() {
            warn!(
                "cannot compare {}: already {} crops selected",
                code, MAX_COMPARED_CROPS
            );
            return ToggleOutcome::Rejected;
        }
        self.active_crops.push(code.to_string());
        self.reset_page();
        ToggleOutcome::Added
    }

    /// Flip comparison mode. Both crop selections survive the flip; entering
    /// comparison with an empty set seeds it with the active crop.
    pub fn toggle_comparison_mode(&mut self) -> bool {
        self.comparison_mode = !self.comparison_mode;
        if self.comparison_mode && self.active_crops.is_empty() {
            self.active_crops.push(self.active_crop.clone());
        }
        self.comparison_mode
    }

    /// Years offered by the "from" selector.
    pub fn year_min_options(&self) -> Vec<i32> {
        (self.available.0..=self.year_max).collect()
    }

    /// Years offered by the "to" selector.
    pub fn year_max_options(&self) -> Vec<i32> {
        (self.year_min..=self.available.1).collect()
    }

    /// Set the lower bound; years the selector would not offer are rejected.
    pub fn set_year_min(&mut self, year: i32) -> bool {
        if year < self.available.0 || year > self.year_max {
            warn!(
                "rejected start year {} (allowed {}..={})",
                year, self.available.0, self.year_max
            );
            return false;
        }
        if year != self.year_min {
            self.year_min = year;
            self.reset_page();
        }
        true
    }

    /// Set the upper bound; years the selector would not offer are rejected.
    pub fn set_year_max(&mut self, year: i32) -> bool {
        if year > self.available.1 || year < self.year_min {
            warn!(
                "rejected end year {} (allowed {}..={})",
                year, self.year_min, self.available.1
            );
            return false;
        }
        if year != self.year_max {
            self.year_max = year;
            self.reset_page();
        }
        true
    }

    /// Number of years in the selected range.
    pub fn year_span(&self) -> usize {
        (i64::from(self.year_max) - i64::from(self.year_min) + 1).max(0) as usize
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.table.search_term = term.into();
        self.reset_page();
    }

    /// Header click: the same column flips direction, a new column starts
    /// ascending.
    pub fn sort_by(&mut self, column: &str) {
        if self.table.sort_column.as_deref() == Some(column) {
            self.table.sort_direction = self.table.sort_direction.toggled();
        } else {
            self.table.sort_column = Some(column.to_string());
            self.table.sort_direction = SortDirection::Ascending;
        }
        self.reset_page();
    }

    pub fn set_sort(&mut self, column: Option<String>, direction: SortDirection) {
        self.table.sort_column = column;
        self.table.sort_direction = direction;
        self.reset_page();
    }

    /// Jump to a page; pages below 1 are clamped to 1.
    pub fn set_page(&mut self, page: usize) {
        self.table.page = page.max(1);
    }

    pub fn next_page(&mut self, total_pages: usize) -> bool {
        if self.table.page >= total_pages {
            return false;
        }
        self.table.page += 1;
        true
    }

    pub fn previous_page(&mut self) -> bool {
        if self.table.page <= 1 {
            return false;
        }
        self.table.page -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SelectionState {
        SelectionState::new("Wheat", (2010, 2023))
    }

    #[test]
    fn starts_on_full_range_page_one() {
        let s = state();
        assert_eq!(s.year_range(), (2010, 2023));
        assert_eq!(s.table().page, 1);
        assert!(!s.comparison_mode());
        assert_eq!(s.year_span(), 14);
    }

    #[test]
    fn selecting_a_crop_only_touches_crop_and_page() {
        let mut s = state();
        s.set_year_min(2015);
        s.set_search("blé");
        s.set_page(3);
        assert!(s.select_crop("Barley"));
        assert_eq!(s.active_crop(), "Barley");
        assert_eq!(s.year_range(), (2015, 2023));
        assert_eq!(s.table().search_term, "blé");
        assert_eq!(s.table().page, 1);
        assert!(!s.select_crop("Barley"));
    }

    #[test]
    fn fifth_crop_is_rejected() {
        let mut s = state();
        s.toggle_comparison_mode();
        for crop in ["Barley", "Olives", "Tomatoes"] {
            assert_eq!(s.toggle_crop(crop), ToggleOutcome::Added);
        }
        assert_eq!(s.active_crops().len(), 4);
        assert!(!s.can_add_crop());
        let before = s.active_crops().to_vec();
        assert_eq!(s.toggle_crop("Citrus Fruit"), ToggleOutcome::Rejected);
        assert_eq!(s.active_crops(), before.as_slice());
    }

    #[test]
    fn toggling_outside_comparison_mode_is_rejected() {
        let mut s = state();
        assert_eq!(s.toggle_crop("Barley"), ToggleOutcome::Rejected);
        assert!(s.active_crops().is_empty());
    }

    #[test]
    fn span_of_extreme_years_does_not_overflow() {
        let s = SelectionState::new("Wheat", (i32::MIN, i32::MAX));
        assert_eq!(s.year_span() as u64, 1u64 << 32);
    }

    #[test]
    fn toggling_removes_a_present_crop() {
        let mut s = state();
        s.toggle_comparison_mode();
        s.toggle_crop("Barley");
        assert_eq!(s.toggle_crop("Wheat"), ToggleOutcome::Removed);
        assert_eq!(s.active_crops(), ["Barley".to_string()]);
        assert_eq!(s.toggle_crop("Barley"), ToggleOutcome::Rejected);
    }

    #[test]
    fn comparison_toggle_is_lossless() {
        let mut s = state();
        s.toggle_comparison_mode();
        s.toggle_crop("Olives");
        s.toggle_comparison_mode();
        assert_eq!(s.active_crop(), "Wheat");
        assert_eq!(s.active_crops().len(), 2);
        s.toggle_comparison_mode();
        assert_eq!(
            s.active_crops(),
            ["Wheat".to_string(), "Olives".to_string()]
        );
    }

    #[test]
    fn year_selectors_reject_values_they_do_not_offer() {
        let mut s = state();
        assert!(s.set_year_max(2016));
        assert!(!s.set_year_min(2017));
        assert_eq!(s.year_range(), (2010, 2016));
        assert!(s.set_year_min(2016));
        assert!(!s.set_year_max(2015));
        assert!(!s.set_year_max(2030));
        assert!(!s.set_year_min(2005));
        assert_eq!(s.year_range(), (2016, 2016));
        assert_eq!(s.year_min_options(), (2010..=2016).collect::<Vec<_>>());
        assert_eq!(s.year_max_options(), (2016..=2023).collect::<Vec<_>>());
    }

    #[test]
    fn table_changes_reset_the_page() {
        let mut s = state();
        s.set_page(4);
        s.sort_by("year");
        assert_eq!(s.table().page, 1);
        assert_eq!(s.table().sort_direction, SortDirection::Ascending);
        s.set_page(2);
        s.sort_by("year");
        assert_eq!(s.table().sort_direction, SortDirection::Descending);
        assert_eq!(s.table().page, 1);
        s.sort_by("production_kt");
        assert_eq!(s.table().sort_direction, SortDirection::Ascending);
        s.set_page(5);
        s.set_year_max(2020);
        assert_eq!(s.table().page, 1);
    }

    #[test]
    fn comparison_toggle_keeps_the_page() {
        let mut s = state();
        s.set_page(2);
        s.toggle_comparison_mode();
        assert_eq!(s.table().page, 2);
    }

    #[test]
    fn paging_stays_in_bounds() {
        let mut s = state();
        assert!(!s.previous_page());
        assert!(s.next_page(2));
        assert!(!s.next_page(2));
        assert_eq!(s.table().page, 2);
        s.set_page(0);
        assert_eq!(s.table().page, 1);
    }
}
