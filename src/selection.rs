//! Which jobs the grid shows.
//!
//! The persisted [`SelectionMap`] is reconciled against every freshly fetched job list by
//! [`reconcile_selection`]. Edits happen on a [`SelectionDraft`] opened by the selection
//! overlay; only [`SelectionDraft::commit`] produces a new map, so closing the overlay
//! without applying leaves the persisted selection untouched.

use crate::model::Job;
use std::collections::BTreeMap;

/// `job_id -> selected`. An absent key means "not selected".
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SelectionMap(BTreeMap<String, bool>);

impl SelectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, job_id: &str) -> bool {
        self.0.get(job_id).copied().unwrap_or(false)
    }

    pub fn set(&mut self, job_id: impl Into<String>, selected: bool) {
        self.0.insert(job_id.into(), selected);
    }

    pub fn selected_count(&self) -> usize {
        self.0.values().filter(|v| **v).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for SelectionMap {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Jobs to display for a persisted selection.
///
/// A never-initialized selection shows everything. A selection that matches none of
/// `all_jobs` (all cleared, or every selected job vanished) also shows everything.
pub fn reconcile_selection<'a>(
    all_jobs: &'a [Job],
    selection: Option<&SelectionMap>,
) -> Vec<&'a Job> {
    let Some(selection) = selection else {
        return all_jobs.iter().collect();
    };
    let selected: Vec<&Job> = all_jobs
        .iter()
        .filter(|job| selection.is_selected(&job.job_id))
        .collect();
    if selected.is_empty() {
        all_jobs.iter().collect()
    } else {
        selected
    }
}

/// Case-insensitive substring match against each job's display name, input order kept.
pub fn filter_by_name<'a>(jobs: &'a [Job], query: &str) -> Vec<&'a Job> {
    let needle = query.to_lowercase();
    jobs.iter()
        .filter(|job| job.display_name().to_lowercase().contains(&needle))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DraftFocus {
    #[default]
    List,
    Search,
}

/// In-memory copy of the selection edited by the overlay.
#[derive(Debug, Clone)]
pub struct SelectionDraft {
    jobs: Vec<Job>,
    entries: BTreeMap<String, bool>,
    pub query: String,
    pub cursor: usize,
    pub focus: DraftFocus,
}

impl SelectionDraft {
    pub fn open(jobs: &[Job], persisted: Option<&SelectionMap>) -> Self {
        let entries = jobs
            .iter()
            .map(|job| {
                let selected = persisted.is_some_and(|s| s.is_selected(&job.job_id));
                (job.job_id.clone(), selected)
            })
            .collect();
        Self {
            jobs: jobs.to_vec(),
            entries,
            query: String::new(),
            cursor: 0,
            focus: DraftFocus::List,
        }
    }

    /// Rows matching the current search query, as `(job, checked)`.
    pub fn visible_rows(&self) -> Vec<(&Job, bool)> {
        filter_by_name(&self.jobs, &self.query)
            .into_iter()
            .map(|job| (job, self.is_checked(&job.job_id)))
            .collect()
    }

    pub fn is_checked(&self, job_id: &str) -> bool {
        self.entries.get(job_id).copied().unwrap_or(false)
    }

    pub fn checked_count(&self) -> usize {
        self.entries.values().filter(|v| **v).count()
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn toggle(&mut self, job_id: &str) {
        if let Some(checked) = self.entries.get_mut(job_id) {
            *checked = !*checked;
        }
    }

    pub fn toggle_current(&mut self) {
        let job_id = self
            .visible_rows()
            .get(self.cursor)
            .map(|(job, _)| job.job_id.clone());
        if let Some(job_id) = job_id {
            self.toggle(&job_id);
        }
    }

    /// Sets every entry, including rows hidden by the search query.
    pub fn set_all(&mut self, selected: bool) {
        for checked in self.entries.values_mut() {
            *checked = selected;
        }
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let len = self.visible_rows().len();
        if len > 0 && self.cursor < len - 1 {
            self.cursor += 1;
        }
    }

    pub fn push_query(&mut self, c: char) {
        self.query.push(c);
        self.clamp_cursor();
    }

    pub fn pop_query(&mut self) {
        self.query.pop();
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        let len = self.visible_rows().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }

    pub fn commit(self) -> SelectionMap {
        SelectionMap(self.entries)
    }
}
