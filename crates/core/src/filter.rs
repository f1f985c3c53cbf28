//! Client-side derivation of a list view's visible rows.
//!
//! A row is visible when the search term is a case-insensitive substring of any of its
//! searchable fields AND its category passes the equality filter. Both checks are pure, so
//! applying them repeatedly or in either order gives the same subset.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Equality filter chosen from a select box: everything, or one value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EqualityFilter<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> EqualityFilter<T> {
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            EqualityFilter::All => true,
            EqualityFilter::Only(wanted) => wanted == value,
        }
    }
}

impl<T: FromStr> FromStr for EqualityFilter<T> {
    type Err = T::Err;

    /// `"all"` and the empty string mean no filtering; anything else must parse as `T`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(EqualityFilter::All),
            value => value.parse().map(EqualityFilter::Only),
        }
    }
}

/// Rows that can be found by the search box.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

/// Rows that can be narrowed by the status/role select box.
pub trait Categorized {
    type Category: PartialEq + Copy + std::fmt::Debug;

    fn category(&self) -> Self::Category;
}

pub fn matches_search(query: &str, fields: &[&str]) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

pub fn search<'a, T: Searchable>(rows: impl IntoIterator<Item = &'a T>, query: &str) -> Vec<&'a T> {
    rows.into_iter()
        .filter(|row| matches_search(query, &row.search_fields()))
        .collect()
}

pub fn filter_by<'a, T: Categorized>(
    rows: impl IntoIterator<Item = &'a T>,
    filter: &EqualityFilter<T::Category>,
) -> Vec<&'a T> {
    rows.into_iter()
        .filter(|row| filter.accepts(&row.category()))
        .collect()
}

/// The visible subset, in the original row order.
pub fn visible<'a, T: Searchable + Categorized>(
    rows: &'a [T],
    query: &str,
    filter: &EqualityFilter<T::Category>,
) -> Vec<&'a T> {
    rows.iter()
        .filter(|row| {
            matches_search(query, &row.search_fields()) && filter.accepts(&row.category())
        })
        .collect()
}
