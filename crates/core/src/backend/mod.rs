//! Backend client boundary.
//!
//! All persistence, authentication and query execution belong to a hosted backend. The
//! application talks to it through two object-safe traits:
//!
//! - [`WardBackend`]: select rows with equality filters and an ordering, insert rows.
//! - [`AuthBackend`]: password sign-in, sign-out, session lookup, credential creation and a
//!   session-change subscription.
//!
//! [`BackendClient`] wraps a shared backend handle and adds a typed query builder in the style
//! of hosted row stores:
//!
//! ```text
//! client.from::<Patient>()
//!     .eq("institution_id", institution_id)
//!     .order("created_at", Direction::Descending)
//!     .execute()
//! ```
//!
//! Rows cross the boundary as JSON objects; the typed layer converts them with serde.

pub mod memory;

use crate::error::{AuthError, BackendError, BackendResult};
use crate::model::{Record, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

pub use memory::{Credential, Dataset, MemoryBackend};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A select request: every filter must match, then rows are sorted by `order` if present.
///
/// Filter values are compared as text, the way they travel in a query string.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectQuery {
    pub table: Table,
    pub filters: Vec<(String, String)>,
    pub order: Option<(String, Direction)>,
}

impl SelectQuery {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: None,
        }
    }
}

/// An authenticated session issued by the auth subsystem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user_id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Session-change notifications.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut { access_token: String },
}

pub trait AuthBackend: Send + Sync {
    fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// Looks up a live session. `Ok(None)` means the token is not (or no longer) signed in.
    fn get_session(&self, access_token: &str) -> Result<Option<Session>, AuthError>;

    /// Registers sign-in credentials and returns the new user id.
    fn create_user(&self, email: &str, password: &str) -> Result<Uuid, AuthError>;

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

pub trait WardBackend: Send + Sync {
    fn select(&self, query: &SelectQuery) -> BackendResult<Vec<Value>>;

    /// Inserts rows and returns them as stored, including backend-filled defaults.
    fn insert(&self, table: Table, rows: Vec<Value>) -> BackendResult<Vec<Value>>;

    fn auth(&self) -> &dyn AuthBackend;
}

/// Cloneable handle to the configured backend.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<dyn WardBackend>,
}

impl fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendClient").finish_non_exhaustive()
    }
}

impl BackendClient {
    pub fn new(inner: Arc<dyn WardBackend>) -> Self {
        Self { inner }
    }

    /// Starts a select on the table holding `R`.
    pub fn from<R: Record>(&self) -> Select<R> {
        Select {
            client: self.clone(),
            query: SelectQuery::new(R::TABLE),
            _row: PhantomData,
        }
    }

    /// Inserts one row into the table holding `R` and returns the stored row.
    ///
    /// `payload` may omit columns the backend fills in (`id` and timestamps).
    pub fn insert<R: Record>(&self, payload: &impl Serialize) -> BackendResult<R> {
        let value = serde_json::to_value(payload).map_err(BackendError::Serialization)?;
        tracing::debug!(table = %R::TABLE, "insert");
        let stored = self.inner.insert(R::TABLE, vec![value])?;
        let row = stored.into_iter().next().ok_or_else(|| {
            BackendError::Unavailable(format!("insert into {} returned no rows", R::TABLE))
        })?;
        serde_json::from_value(row).map_err(BackendError::Deserialization)
    }

    pub fn auth(&self) -> &dyn AuthBackend {
        self.inner.auth()
    }
}

/// Typed select builder returned by [`BackendClient::from`].
pub struct Select<R> {
    client: BackendClient,
    query: SelectQuery,
    _row: PhantomData<fn() -> R>,
}

impl<R: Record> Select<R> {
    pub fn eq(mut self, column: &str, value: impl fmt::Display) -> Self {
        self.query
            .filters
            .push((column.to_string(), value.to_string()));
        self
    }

    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.query.order = Some((column.to_string(), direction));
        self
    }

    pub fn query(&self) -> &SelectQuery {
        &self.query
    }

    pub fn execute(self) -> BackendResult<Vec<R>> {
        tracing::debug!(table = %self.query.table, filters = ?self.query.filters, "select");
        self.client
            .inner
            .select(&self.query)?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(BackendError::Deserialization))
            .collect()
    }
}
