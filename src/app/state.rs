use indexmap::IndexSet;
use strum::IntoEnumIterator;

use crate::config::ThemeName;
use crate::feed::{FeedSnapshot, FeedStatus};
use crate::highlight::world_matches;
use crate::records::{shape, RunRecord, SplitColumn};

/// Sortable table columns. Splits reuse [`SplitColumn`] so the sort key
/// and the exclude-empty filter always agree on which field they read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Date,
    Igt,
    Rta,
    Split(SplitColumn),
}

impl SortColumn {
    pub fn title(self) -> &'static str {
        match self {
            SortColumn::Date => "Date",
            SortColumn::Igt => "IGT",
            SortColumn::Rta => "RTA",
            SortColumn::Split(column) => column.title(),
        }
    }

    /// Cycle order mirrors the table layout: IGT, the six splits, RTA,
    /// then date.
    pub fn next(self) -> Self {
        let order = Self::cycle_order();
        let index = order.iter().position(|c| *c == self).unwrap_or(0);
        order[(index + 1) % order.len()]
    }

    fn cycle_order() -> Vec<SortColumn> {
        let mut order = vec![SortColumn::Igt];
        order.extend(SplitColumn::iter().map(SortColumn::Split));
        order.push(SortColumn::Rta);
        order.push(SortColumn::Date);
        order
    }

    fn key(self, record: &RunRecord) -> i64 {
        match self {
            SortColumn::Date => record.date,
            SortColumn::Igt => record.final_igt,
            SortColumn::Rta => record.final_rta,
            SortColumn::Split(column) => record.split(column),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub active: bool,
    pub query: String,
}

/// Presentation-side state layered over feed snapshots: selection,
/// sorting, filters and search. Reads snapshots, never mutates the feed.
#[derive(Debug, Clone)]
pub struct AppState {
    pub snapshot: FeedSnapshot,
    pub selected: usize,
    pub sort: SortColumn,
    pub direction: SortDirection,
    /// Split columns with the exclude-empty filter switched on. Each
    /// column filters independently; active columns combine.
    pub excluded_empty: IndexSet<SplitColumn>,
    /// Distinct mc_version values in first-seen order, feeding the
    /// version filter cycle.
    versions: IndexSet<String>,
    pub version_filter: Option<String>,
    pub search: SearchState,
    pub status_message: Option<String>,
    pub theme: ThemeName,
}

impl AppState {
    pub fn new(snapshot: FeedSnapshot, theme: ThemeName) -> Self {
        let mut state = Self {
            snapshot,
            selected: 0,
            sort: SortColumn::Date,
            direction: SortDirection::Descending,
            excluded_empty: IndexSet::new(),
            versions: IndexSet::new(),
            version_filter: None,
            search: SearchState::default(),
            status_message: None,
            theme,
        };
        state.collect_versions();
        state
    }

    /// Takes a fresh feed snapshot and reconciles the view state with it.
    pub fn absorb(&mut self, snapshot: FeedSnapshot) {
        self.snapshot = snapshot;
        self.collect_versions();
        self.normalize_selection();
    }

    fn collect_versions(&mut self) {
        for record in self.snapshot.records.iter() {
            if !record.mc_version.is_empty() && !self.versions.contains(&record.mc_version) {
                self.versions.insert(record.mc_version.clone());
            }
        }
    }

    /// Rows surviving search, version and exclude-empty filters, in the
    /// current sort order.
    pub fn visible_rows(&self) -> Vec<&RunRecord> {
        let query = self.search.query.trim();
        let mut rows: Vec<&RunRecord> = self
            .snapshot
            .records
            .iter()
            .filter(|record| query.is_empty() || world_matches(&record.world_name, query))
            .filter(|record| {
                self.version_filter
                    .as_deref()
                    .map_or(true, |version| record.mc_version == version)
            })
            .filter(|record| {
                self.excluded_empty
                    .iter()
                    .all(|column| shape::split_reached(record, *column))
            })
            .collect();

        rows.sort_by(|a, b| {
            let (a, b) = (self.sort.key(a), self.sort.key(b));
            match self.direction {
                SortDirection::Ascending => a.cmp(&b),
                SortDirection::Descending => b.cmp(&a),
            }
        });
        rows
    }

    pub fn selected_record(&self) -> Option<&RunRecord> {
        self.visible_rows().get(self.selected).copied()
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.visible_rows().len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let next = (self.selected as isize + delta).clamp(0, len as isize - 1);
        self.selected = next as usize;
    }

    fn normalize_selection(&mut self) {
        let len = self.visible_rows().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        self.normalize_selection();
    }

    pub fn toggle_sort_direction(&mut self) {
        self.direction = self.direction.toggled();
    }

    /// Toggles exclude-empty on the sorted column. Only split columns
    /// carry the filter; IGT, RTA and date always have values.
    pub fn toggle_exclude_empty(&mut self) -> Option<bool> {
        let SortColumn::Split(column) = self.sort else {
            return None;
        };
        let enabled = if self.excluded_empty.shift_remove(&column) {
            false
        } else {
            self.excluded_empty.insert(column);
            true
        };
        self.normalize_selection();
        Some(enabled)
    }

    /// Advances the version filter: all versions, then each distinct
    /// version in first-seen order, then back to all.
    pub fn cycle_version_filter(&mut self) {
        let next = match &self.version_filter {
            None => self.versions.first().cloned(),
            Some(current) => {
                let index = self.versions.get_index_of(current);
                index
                    .and_then(|i| self.versions.get_index(i + 1))
                    .cloned()
            }
        };
        self.version_filter = next;
        self.normalize_selection();
    }

    pub fn begin_search(&mut self) {
        self.search.active = true;
    }

    pub fn cancel_search(&mut self) {
        self.search.active = false;
        self.search.query.clear();
        self.normalize_selection();
    }

    pub fn finish_search(&mut self) {
        self.search.active = false;
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.search.query.push(ch);
        self.selected = 0;
        self.normalize_selection();
    }

    pub fn pop_search_char(&mut self) {
        self.search.query.pop();
        self.normalize_selection();
    }

    pub fn toggle_theme(&mut self) -> ThemeName {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.snapshot.status, FeedStatus::Loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Period;
    use std::sync::Arc;

    fn record(world_name: &str, date: i64, igt: i64, nether: i64, version: &str) -> RunRecord {
        RunRecord {
            world_name: world_name.to_string(),
            mc_version: version.to_string(),
            date,
            final_igt: igt,
            enter_nether: nether,
            ..RunRecord::default()
        }
    }

    fn snapshot(records: Vec<RunRecord>) -> FeedSnapshot {
        FeedSnapshot {
            status: FeedStatus::Success,
            period: Period::Today,
            records: Arc::new(records),
            error: None,
            revision: 1,
        }
    }

    fn state() -> AppState {
        AppState::new(
            snapshot(vec![
                record("Alpha", 300, 700_000, 120_000, "1.16.1"),
                record("Beta", 200, 650_000, 0, "1.16.1"),
                record("Gamma", 100, 800_000, 90_000, "1.15.2"),
            ]),
            ThemeName::Dark,
        )
    }

    #[test]
    fn default_sort_is_date_descending() {
        let state = state();
        let names: Vec<&str> = state
            .visible_rows()
            .iter()
            .map(|r| r.world_name.as_str())
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn sorting_by_igt_descending_reorders_rows() {
        let mut state = state();
        state.sort = SortColumn::Igt;
        let names: Vec<&str> = state
            .visible_rows()
            .iter()
            .map(|r| r.world_name.as_str())
            .collect();
        assert_eq!(names, vec!["Gamma", "Alpha", "Beta"]);

        state.toggle_sort_direction();
        let names: Vec<&str> = state
            .visible_rows()
            .iter()
            .map(|r| r.world_name.as_str())
            .collect();
        assert_eq!(names, vec!["Beta", "Alpha", "Gamma"]);
    }

    #[test]
    fn exclude_empty_drops_unreached_splits_only_for_active_columns() {
        let mut state = state();
        state.sort = SortColumn::Split(SplitColumn::EnterNether);
        assert_eq!(state.toggle_exclude_empty(), Some(true));
        let names: Vec<&str> = state
            .visible_rows()
            .iter()
            .map(|r| r.world_name.as_str())
            .collect();
        assert!(!names.contains(&"Beta"));

        assert_eq!(state.toggle_exclude_empty(), Some(false));
        assert_eq!(state.visible_rows().len(), 3);
    }

    #[test]
    fn exclude_empty_is_unavailable_on_non_split_columns() {
        let mut state = state();
        state.sort = SortColumn::Date;
        assert_eq!(state.toggle_exclude_empty(), None);
    }

    #[test]
    fn version_filter_cycles_through_seen_versions() {
        let mut state = state();
        assert_eq!(state.version_filter, None);

        state.cycle_version_filter();
        assert_eq!(state.version_filter.as_deref(), Some("1.16.1"));
        assert_eq!(state.visible_rows().len(), 2);

        state.cycle_version_filter();
        assert_eq!(state.version_filter.as_deref(), Some("1.15.2"));
        assert_eq!(state.visible_rows().len(), 1);

        state.cycle_version_filter();
        assert_eq!(state.version_filter, None);
        assert_eq!(state.visible_rows().len(), 3);
    }

    #[test]
    fn search_narrows_rows_and_resets_selection() {
        let mut state = state();
        state.selected = 2;
        state.begin_search();
        for ch in "gam".chars() {
            state.push_search_char(ch);
        }
        let rows = state.visible_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].world_name, "Gamma");
        assert_eq!(state.selected, 0);

        state.cancel_search();
        assert_eq!(state.visible_rows().len(), 3);
    }

    #[test]
    fn absorbing_a_smaller_snapshot_clamps_the_selection() {
        let mut state = state();
        state.selected = 2;
        state.absorb(snapshot(vec![record("Solo", 1, 700_000, 0, "1.16.1")]));
        assert_eq!(state.selected, 0);
        assert_eq!(state.selected_record().map(|r| r.world_name.as_str()), Some("Solo"));
    }

    #[test]
    fn versions_accumulate_across_snapshots() {
        let mut state = state();
        state.absorb(snapshot(vec![record("New", 1, 700_000, 0, "1.20.0")]));
        state.cycle_version_filter();
        assert_eq!(state.version_filter.as_deref(), Some("1.16.1"));
        state.cycle_version_filter();
        assert_eq!(state.version_filter.as_deref(), Some("1.15.2"));
        state.cycle_version_filter();
        assert_eq!(state.version_filter.as_deref(), Some("1.20.0"));
    }

    #[test]
    fn sort_cycle_visits_igt_splits_rta_and_date() {
        let mut column = SortColumn::Igt;
        let mut seen = vec![column];
        for _ in 0..9 {
            column = column.next();
            seen.push(column);
        }
        assert_eq!(seen.first(), Some(&SortColumn::Igt));
        assert!(seen.contains(&SortColumn::Split(SplitColumn::EnterEnd)));
        assert!(seen.contains(&SortColumn::Rta));
        assert!(seen.contains(&SortColumn::Date));
        assert_eq!(seen.last(), Some(&SortColumn::Igt));
    }
}
