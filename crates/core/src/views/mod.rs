//! List views: fetch, hold, filter.
//!
//! Every list view has the same shape. It fetches one collection scoped to the current
//! institution, replaces its rows with the result, and derives the visible subset from the
//! search term and the select-box filter on every read.
//!
//! Fetch failures are logged and otherwise ignored: the view keeps whatever rows it had, which
//! for a freshly opened view means the empty state.
//!
//! A fetch is split into [`ListView::begin_fetch`] and [`ListView::complete`] so that a host
//! running fetches concurrently can hand results back in any order. Only the most recently
//! issued [`FetchTicket`] may replace the rows; older responses are dropped.

pub mod details;
pub mod patients;
pub mod staff;
pub mod summaries;

use crate::constants::ADJUST_SEARCH_HINT;
use crate::error::WardResult;
use crate::filter::{self, Categorized, EqualityFilter, Searchable};

pub use details::PatientDetails;
pub use patients::PatientList;
pub use staff::StaffList;
pub use summaries::{SummaryActions, SummaryList, SummaryWithPatient};

/// Identifies one fetch issued by a [`ListView`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use = "pass the ticket back to `complete`"]
pub struct FetchTicket(u64);

#[derive(Debug)]
pub struct ListView<T: Categorized> {
    name: &'static str,
    rows: Vec<T>,
    loading: bool,
    issued: u64,
    search: String,
    filter: EqualityFilter<T::Category>,
}

impl<T: Searchable + Categorized> ListView<T> {
    /// An empty view. It reports `loading` until its first fetch completes.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rows: Vec::new(),
            loading: true,
            issued: 0,
            search: String::new(),
            filter: EqualityFilter::All,
        }
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        self.loading = true;
        FetchTicket(self.issued)
    }

    /// Applies a fetch result. Returns false if the ticket was superseded and nothing changed.
    pub fn complete(&mut self, ticket: FetchTicket, result: WardResult<Vec<T>>) -> bool {
        if ticket.0 != self.issued {
            tracing::debug!(
                view = self.name,
                ticket = ticket.0,
                latest = self.issued,
                "discarding superseded response"
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(rows) => self.rows = rows,
            Err(e) => tracing::error!("Error fetching {}: {}", self.name, e),
        }
        true
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    pub fn filter(&self) -> &EqualityFilter<T::Category> {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: EqualityFilter<T::Category>) {
        self.filter = filter;
    }

    pub fn visible(&self) -> Vec<&T> {
        filter::visible(&self.rows, &self.search, &self.filter)
    }

    /// Hint for an empty visible subset; `None` while something is visible.
    pub fn empty_hint(&self, get_started: &'static str) -> Option<&'static str> {
        if !self.visible().is_empty() {
            return None;
        }
        Some(if self.search.is_empty() {
            get_started
        } else {
            ADJUST_SEARCH_HINT
        })
    }

    pub fn prepend(&mut self, row: T) {
        self.rows.insert(0, row);
    }
}
