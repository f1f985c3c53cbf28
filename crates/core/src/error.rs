use crate::model::Table;

/// Failures raised by a backend while running a query or mutation.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: Table, column: String },
    #[error("invalid row for table '{table}': {source}")]
    InvalidRow {
        table: Table,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize row: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize row: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to read dataset file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write dataset file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("backend state lock poisoned")]
    LockPoisoned,
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Failures raised by the backend's auth subsystem.
///
/// The display strings are what the login form shows to the user.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,
    #[error("User already registered")]
    EmailTaken,
    #[error("Password should be at least {0} characters")]
    WeakPassword(usize),
    #[error("Auth session missing!")]
    SessionNotFound,
    #[error("{0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, thiserror::Error)]
pub enum WardError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid input: {0}")]
    Text(#[from] openroom_types::TextError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("not signed in")]
    NotAuthenticated,
    #[error("{0} is not permitted for this role")]
    Forbidden(&'static str),
    #[error("not found: {0}")]
    NotFound(String),
}

pub type WardResult<T> = std::result::Result<T, WardError>;
