//! # OpenRoom Core
//!
//! View models for the OpenRoom ward dashboard.
//!
//! This crate holds everything a front end needs to render the dashboard:
//! - the auth gate and the role-filtered navigation menu
//! - list views for patients, discharge summaries and staff, with client-side search and filters
//! - the dashboard aggregation and the creation forms
//! - the backend client boundary, plus an in-memory backend loaded from a YAML dataset
//!
//! **No API concerns**: HTTP servers and terminal output belong in `api-rest` and `cli`.

pub mod app;
pub mod auth;
pub mod backend;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod forms;
pub mod model;
pub mod navigation;
pub mod views;

#[cfg(test)]
pub(crate) mod test_support;

pub use app::{App, Screen};
pub use auth::{AuthContext, AuthState};
pub use backend::{BackendClient, Direction, MemoryBackend};
pub use config::{CoreConfig, StayPolicy};
pub use error::{AuthError, BackendError, WardError, WardResult};
pub use filter::EqualityFilter;
pub use model::{
    DashboardStats, DischargeSummary, Document, Institution, Patient, PatientStatus, Role,
    SummaryStatus, User,
};
pub use navigation::{MenuEntry, Page};

use std::sync::Arc;

/// Builds the backend client described by `cfg`.
///
/// With a dataset path the in-memory backend is loaded from that file (and writes back to it
/// when persistence is on). Without one it starts empty.
pub fn open_backend(cfg: &CoreConfig) -> WardResult<BackendClient> {
    let backend = match cfg.dataset_path() {
        Some(path) => {
            tracing::info!("loading dataset from {}", path.display());
            MemoryBackend::open(path, cfg.persist())?
        }
        None => MemoryBackend::default(),
    };
    Ok(BackendClient::new(Arc::new(backend)))
}
