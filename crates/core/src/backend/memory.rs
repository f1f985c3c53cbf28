//! In-memory backend.
//!
//! Stands in for the hosted backend during development, demos and tests. Tables live in a
//! [`Dataset`] guarded by a lock; the dataset can be loaded from a YAML file and, when
//! persistence is enabled, every successful mutation writes the whole dataset back to it.
//!
//! Passwords are never stored in clear: credentials keep a hex SHA-256 digest.
//!
//! The backend can be switched offline with [`MemoryBackend::set_offline`], after which every
//! call fails with [`BackendError::Unavailable`]. Views use this to exercise their
//! stale-on-error behaviour.

use crate::backend::{AuthBackend, AuthEvent, Direction, SelectQuery, Session, WardBackend};
use crate::constants::{AUTH_EVENT_CAPACITY, MIN_PASSWORD_LEN};
use crate::error::{AuthError, BackendError, BackendResult};
use crate::model::{DischargeSummary, Document, Institution, Patient, Table, User};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::RwLock;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Sign-in credentials for one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub user_id: Uuid,
    pub email: String,
    pub password_sha256: String,
}

impl Credential {
    pub fn new(user_id: Uuid, email: impl Into<String>, password: &str) -> Self {
        Self {
            user_id,
            email: email.into(),
            password_sha256: password_digest(password),
        }
    }

    fn matches(&self, email: &str, password: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
            && self.password_sha256 == password_digest(password)
    }
}

fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Every table the backend holds, in the layout of the dataset YAML file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub institutions: Vec<Institution>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub patients: Vec<Patient>,
    #[serde(default)]
    pub discharge_summaries: Vec<DischargeSummary>,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub credentials: Vec<Credential>,
}

impl Dataset {
    pub fn load(path: &Path) -> BackendResult<Self> {
        let raw = fs::read_to_string(path).map_err(BackendError::FileRead)?;
        serde_yaml::from_str(&raw).map_err(BackendError::YamlDeserialization)
    }

    pub fn save(&self, path: &Path) -> BackendResult<()> {
        let raw = serde_yaml::to_string(self).map_err(BackendError::YamlSerialization)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(BackendError::FileWrite)?;
        }
        fs::write(path, raw).map_err(BackendError::FileWrite)
    }

    fn rows(&self, table: Table) -> BackendResult<Vec<Value>> {
        match table {
            Table::Institutions => to_rows(&self.institutions),
            Table::Users => to_rows(&self.users),
            Table::Patients => to_rows(&self.patients),
            Table::DischargeSummaries => to_rows(&self.discharge_summaries),
            Table::Documents => to_rows(&self.documents),
        }
    }

    fn push(&mut self, table: Table, row: Value) -> BackendResult<Value> {
        match table {
            Table::Institutions => push_row(table, &mut self.institutions, row),
            Table::Users => push_row(table, &mut self.users, row),
            Table::Patients => push_row(table, &mut self.patients, row),
            Table::DischargeSummaries => push_row(table, &mut self.discharge_summaries, row),
            Table::Documents => push_row(table, &mut self.documents, row),
        }
    }
}

fn to_rows<T: Serialize>(rows: &[T]) -> BackendResult<Vec<Value>> {
    rows.iter()
        .map(|row| serde_json::to_value(row).map_err(BackendError::Serialization))
        .collect()
}

fn push_row<T: Serialize + DeserializeOwned>(
    table: Table,
    rows: &mut Vec<T>,
    row: Value,
) -> BackendResult<Value> {
    let typed: T =
        serde_json::from_value(row).map_err(|source| BackendError::InvalidRow { table, source })?;
    let stored = serde_json::to_value(&typed).map_err(BackendError::Serialization)?;
    rows.push(typed);
    Ok(stored)
}

/// Fills the columns a database would default: `id` and the table's insert timestamps.
fn fill_defaults(table: Table, row: Value, now: DateTime<Utc>) -> BackendResult<Value> {
    let Value::Object(mut map) = row else {
        return Err(BackendError::InvalidRow {
            table,
            source: <serde_json::Error as serde::de::Error>::custom("row must be a JSON object"),
        });
    };

    map.entry("id")
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    for column in table.default_timestamp_columns() {
        map.entry(*column)
            .or_insert_with(|| Value::String(now.to_rfc3339()));
    }

    Ok(Value::Object(map))
}

fn column_matches(row: &Value, column: &str, expected: &str) -> bool {
    match row.get(column) {
        Some(Value::String(actual)) => actual == expected,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == expected,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (a, b) => is_present(a).cmp(&is_present(b)),
    }
}

fn is_present(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null))
}

pub struct MemoryBackend {
    data: RwLock<Dataset>,
    sessions: RwLock<HashMap<String, Session>>,
    events: broadcast::Sender<AuthEvent>,
    offline: AtomicBool,
    persist_to: Option<PathBuf>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(Dataset::default())
    }
}

impl MemoryBackend {
    pub fn new(dataset: Dataset) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            data: RwLock::new(dataset),
            sessions: RwLock::new(HashMap::new()),
            events,
            offline: AtomicBool::new(false),
            persist_to: None,
        }
    }

    /// Loads the dataset at `path`.
    ///
    /// With `persist` set, a missing file starts an empty dataset and every mutation is written
    /// back to `path`. Without it, the file must exist and is never modified.
    pub fn open(path: &Path, persist: bool) -> BackendResult<Self> {
        let dataset = if persist && !path.exists() {
            tracing::info!("dataset {} not found, starting empty", path.display());
            Dataset::default()
        } else {
            Dataset::load(path)?
        };

        let backend = Self::new(dataset);
        Ok(if persist {
            backend.with_persistence(path.to_path_buf())
        } else {
            backend
        })
    }

    pub fn with_persistence(mut self, path: PathBuf) -> Self {
        self.persist_to = Some(path);
        self
    }

    /// Simulates losing the network connection to the backend.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    /// A copy of every table.
    pub fn snapshot(&self) -> BackendResult<Dataset> {
        Ok(self
            .data
            .read()
            .map_err(|_| BackendError::LockPoisoned)?
            .clone())
    }

    fn check_online(&self) -> BackendResult<()> {
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(BackendError::Unavailable("network request failed".into()));
        }
        Ok(())
    }

    fn persist(&self, data: &Dataset) -> BackendResult<()> {
        match &self.persist_to {
            Some(path) => data.save(path),
            None => Ok(()),
        }
    }

    /// Applies `change` to a copy of the dataset and swaps it in only once the copy is saved.
    ///
    /// A failed change or a failed write leaves the live tables untouched.
    fn commit<T, E>(&self, change: impl FnOnce(&mut Dataset) -> Result<T, E>) -> Result<T, E>
    where
        E: From<BackendError>,
    {
        let mut data = self.data.write().map_err(|_| BackendError::LockPoisoned)?;
        let mut staged = data.clone();
        let out = change(&mut staged)?;
        self.persist(&staged)?;
        *data = staged;
        Ok(out)
    }

    fn check_column(table: Table, column: &str) -> BackendResult<()> {
        if table.has_column(column) {
            Ok(())
        } else {
            Err(BackendError::UnknownColumn {
                table,
                column: column.to_string(),
            })
        }
    }
}

impl WardBackend for MemoryBackend {
    fn select(&self, query: &SelectQuery) -> BackendResult<Vec<Value>> {
        self.check_online()?;
        for (column, _) in &query.filters {
            Self::check_column(query.table, column)?;
        }
        if let Some((column, _)) = &query.order {
            Self::check_column(query.table, column)?;
        }

        let data = self.data.read().map_err(|_| BackendError::LockPoisoned)?;
        let mut rows: Vec<Value> = data
            .rows(query.table)?
            .into_iter()
            .filter(|row| {
                query
                    .filters
                    .iter()
                    .all(|(column, expected)| column_matches(row, column, expected))
            })
            .collect();

        if let Some((column, direction)) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(column), b.get(column));
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        Ok(rows)
    }

    fn insert(&self, table: Table, rows: Vec<Value>) -> BackendResult<Vec<Value>> {
        self.check_online()?;
        let now = Utc::now();

        self.commit(|data| {
            rows.into_iter()
                .map(|row| {
                    let row = fill_defaults(table, row, now)?;
                    data.push(table, row)
                })
                .collect::<BackendResult<Vec<_>>>()
        })
    }

    fn auth(&self) -> &dyn AuthBackend {
        self
    }
}

impl AuthBackend for MemoryBackend {
    fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.check_online()?;

        let user_id = {
            let data = self.data.read().map_err(|_| BackendError::LockPoisoned)?;
            data.credentials
                .iter()
                .find(|c| c.matches(email, password))
                .map(|c| c.user_id)
                .ok_or(AuthError::InvalidCredentials)?
        };

        let session = Session {
            access_token: Uuid::new_v4().simple().to_string(),
            user_id,
            email: email.trim().to_string(),
            created_at: Utc::now(),
        };
        self.sessions
            .write()
            .map_err(|_| BackendError::LockPoisoned)?
            .insert(session.access_token.clone(), session.clone());

        tracing::info!(%user_id, "signed in");
        // No subscribers is not an error.
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));

        Ok(session)
    }

    fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.check_online()?;

        let removed = self
            .sessions
            .write()
            .map_err(|_| BackendError::LockPoisoned)?
            .remove(access_token);
        let session = removed.ok_or(AuthError::SessionNotFound)?;

        tracing::info!(user_id = %session.user_id, "signed out");
        let _ = self.events.send(AuthEvent::SignedOut {
            access_token: session.access_token,
        });

        Ok(())
    }

    fn get_session(&self, access_token: &str) -> Result<Option<Session>, AuthError> {
        self.check_online()?;

        Ok(self
            .sessions
            .read()
            .map_err(|_| BackendError::LockPoisoned)?
            .get(access_token)
            .cloned())
    }

    fn create_user(&self, email: &str, password: &str) -> Result<Uuid, AuthError> {
        self.check_online()?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword(MIN_PASSWORD_LEN));
        }

        let email = email.trim();
        self.commit(|data| {
            if data
                .credentials
                .iter()
                .any(|c| c.email.eq_ignore_ascii_case(email))
            {
                return Err(AuthError::EmailTaken);
            }

            let user_id = Uuid::new_v4();
            data.credentials
                .push(Credential::new(user_id, email, password));
            Ok(user_id)
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PatientStatus, Role};
    use chrono::{Duration, NaiveDate};
    use tempfile::TempDir;

    fn patient(institution_id: Uuid, name: &str, created_at: DateTime<Utc>) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1960, 3, 1).unwrap(),
            date_of_admission: created_at.date_naive(),
            bed_number: "A".into(),
            room_number: "301".into(),
            status: PatientStatus::Active,
            institution_id,
            created_by: Uuid::new_v4(),
            created_at,
            updated_at: created_at,
        }
    }

    fn user(institution_id: Uuid, email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            role: Role::Doctor,
            institution_id,
            created_at: Utc::now(),
            is_active: true,
        }
    }

    #[test]
    fn select_filters_and_orders_rows() {
        let ward = Uuid::new_v4();
        let other = Uuid::new_v4();
        let t0 = Utc::now() - Duration::hours(3);
        let dataset = Dataset {
            patients: vec![
                patient(ward, "Oldest", t0),
                patient(other, "Elsewhere", t0 + Duration::hours(1)),
                patient(ward, "Newest", t0 + Duration::hours(2)),
            ],
            ..Dataset::default()
        };
        let backend = MemoryBackend::new(dataset);

        let mut query = SelectQuery::new(Table::Patients);
        query.filters.push(("institution_id".into(), ward.to_string()));
        query.order = Some(("created_at".into(), Direction::Descending));
        let rows = backend.select(&query).unwrap();

        let names: Vec<_> = rows
            .iter()
            .map(|r| r["full_name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Newest", "Oldest"]);
    }

    #[test]
    fn order_uses_timestamps_not_text() {
        // "…:00Z" sorts after "…:00.500Z" as text but before it as a time.
        let ward = Uuid::new_v4();
        let whole = DateTime::parse_from_rfc3339("2026-10-16T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let fractional = whole + Duration::milliseconds(500);
        let backend = MemoryBackend::new(Dataset {
            patients: vec![patient(ward, "Whole", whole), patient(ward, "Half", fractional)],
            ..Dataset::default()
        });

        let mut query = SelectQuery::new(Table::Patients);
        query.order = Some(("created_at".into(), Direction::Ascending));
        let rows = backend.select(&query).unwrap();
        assert_eq!(rows[0]["full_name"], "Whole");
        assert_eq!(rows[1]["full_name"], "Half");
    }

    #[test]
    fn select_rejects_unknown_column() {
        let backend = MemoryBackend::default();
        let mut query = SelectQuery::new(Table::Patients);
        query.filters.push(("ward".into(), "x".into()));
        let err = backend.select(&query).unwrap_err();
        assert!(matches!(err, BackendError::UnknownColumn { .. }));
    }

    #[test]
    fn insert_fills_id_and_timestamps() {
        let backend = MemoryBackend::default();
        let row = serde_json::json!({
            "full_name": "Ada Lovelace",
            "date_of_birth": "1815-12-10",
            "date_of_admission": "2026-10-16",
            "bed_number": "B",
            "room_number": "12",
            "status": "ACTIVE",
            "institution_id": Uuid::new_v4(),
            "created_by": Uuid::new_v4(),
        });

        let stored = backend.insert(Table::Patients, vec![row]).unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0]["id"].is_string());
        assert!(stored[0]["created_at"].is_string());
        assert_eq!(backend.snapshot().unwrap().patients.len(), 1);
    }

    #[test]
    fn insert_rejects_incomplete_row() {
        let backend = MemoryBackend::default();
        let err = backend
            .insert(Table::Patients, vec![serde_json::json!({"full_name": "No Dates"})])
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidRow { .. }));
        assert!(backend.snapshot().unwrap().patients.is_empty());
    }

    #[test]
    fn offline_backend_fails_every_call() {
        let backend = MemoryBackend::default();
        backend.set_offline(true);
        assert!(matches!(
            backend.select(&SelectQuery::new(Table::Users)),
            Err(BackendError::Unavailable(_))
        ));
        assert!(matches!(
            backend.sign_in_with_password("a@b.c", "secret1"),
            Err(AuthError::Backend(BackendError::Unavailable(_)))
        ));
    }

    #[test]
    fn sign_in_checks_password_digest() {
        let ward = Uuid::new_v4();
        let doctor = user(ward, "doctor@demo.com");
        let backend = MemoryBackend::new(Dataset {
            credentials: vec![Credential::new(doctor.id, "doctor@demo.com", "demo123")],
            users: vec![doctor.clone()],
            ..Dataset::default()
        });

        let session = backend
            .sign_in_with_password("Doctor@Demo.com", "demo123")
            .expect("valid credentials");
        assert_eq!(session.user_id, doctor.id);
        assert_eq!(
            backend.get_session(&session.access_token).unwrap(),
            Some(session.clone())
        );

        let err = backend
            .sign_in_with_password("doctor@demo.com", "wrong")
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[test]
    fn session_changes_are_broadcast() {
        let ward = Uuid::new_v4();
        let nurse = user(ward, "nurse@demo.com");
        let backend = MemoryBackend::new(Dataset {
            credentials: vec![Credential::new(nurse.id, "nurse@demo.com", "demo123")],
            users: vec![nurse],
            ..Dataset::default()
        });
        let mut events = backend.subscribe();

        let session = backend
            .sign_in_with_password("nurse@demo.com", "demo123")
            .unwrap();
        backend.sign_out(&session.access_token).unwrap();

        assert_eq!(events.try_recv().unwrap(), AuthEvent::SignedIn(session.clone()));
        assert_eq!(
            events.try_recv().unwrap(),
            AuthEvent::SignedOut {
                access_token: session.access_token.clone()
            }
        );
        assert_eq!(backend.get_session(&session.access_token).unwrap(), None);
        assert!(matches!(
            backend.sign_out(&session.access_token),
            Err(AuthError::SessionNotFound)
        ));
    }

    #[test]
    fn create_user_rejects_duplicates_and_short_passwords() {
        let backend = MemoryBackend::default();
        backend.create_user("new@demo.com", "secret1").unwrap();
        assert!(matches!(
            backend.create_user("NEW@demo.com", "secret2"),
            Err(AuthError::EmailTaken)
        ));
        assert!(matches!(
            backend.create_user("other@demo.com", "123"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn persisted_inserts_survive_reopen() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("ward.yaml");

        let backend = MemoryBackend::open(&path, true).expect("open should start empty");
        let user_id = backend.create_user("staff@demo.com", "secret1").unwrap();
        let ward = Uuid::new_v4();
        let row = serde_json::to_value(user(ward, "staff@demo.com")).unwrap();
        backend.insert(Table::Users, vec![row]).unwrap();

        let reopened = MemoryBackend::open(&path, false).expect("reopen should load file");
        let dataset = reopened.snapshot().unwrap();
        assert_eq!(dataset.users.len(), 1);
        assert_eq!(dataset.credentials[0].user_id, user_id);
        assert_ne!(dataset.credentials[0].password_sha256, "secret1");
    }

    fn unwritable_backend(temp_dir: &TempDir) -> MemoryBackend {
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").expect("Failed to create blocking file");
        MemoryBackend::open(&blocker.join("ward.yaml"), true).expect("open should start empty")
    }

    #[test]
    fn failed_write_leaves_credentials_unchanged() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let backend = unwritable_backend(&temp_dir);

        let err = backend.create_user("staff@demo.com", "secret1").unwrap_err();
        assert!(matches!(err, AuthError::Backend(BackendError::FileWrite(_))));
        assert!(backend.snapshot().unwrap().credentials.is_empty());

        // A retry hits the same write error, not a duplicate-email rejection.
        assert!(matches!(
            backend.create_user("staff@demo.com", "secret1"),
            Err(AuthError::Backend(BackendError::FileWrite(_)))
        ));
    }

    #[test]
    fn failed_write_leaves_rows_unchanged() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let backend = unwritable_backend(&temp_dir);
        let row = serde_json::to_value(user(Uuid::new_v4(), "staff@demo.com")).unwrap();

        let err = backend.insert(Table::Users, vec![row]).unwrap_err();
        assert!(matches!(err, BackendError::FileWrite(_)));
        assert!(backend.snapshot().unwrap().users.is_empty());
    }

    #[test]
    fn multi_row_insert_is_all_or_nothing() {
        let backend = MemoryBackend::default();
        let good = serde_json::to_value(user(Uuid::new_v4(), "ok@demo.com")).unwrap();
        let bad = serde_json::json!({ "email": "broken@demo.com" });

        let err = backend.insert(Table::Users, vec![good, bad]).unwrap_err();
        assert!(matches!(err, BackendError::InvalidRow { .. }));
        assert!(backend.snapshot().unwrap().users.is_empty());
    }

    #[test]
    fn open_without_persist_requires_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let err = MemoryBackend::open(&temp_dir.path().join("missing.yaml"), false)
            .err()
            .expect("missing file should fail");
        assert!(matches!(err, BackendError::FileRead(_)));
    }
}
