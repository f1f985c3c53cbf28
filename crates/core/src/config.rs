//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Environment variables are read by the binaries only; the helpers here parse the raw values.

use crate::{WardError, WardResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How the average length of stay measures a discharged patient.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StayPolicy {
    /// Every patient is measured from admission to now.
    #[default]
    SinceAdmission,
    /// Discharged patients are measured from admission to their last update.
    EndAtDischarge,
}

impl FromStr for StayPolicy {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "since-admission" => Ok(Self::SinceAdmission),
            "end-at-discharge" => Ok(Self::EndAtDischarge),
            other => Err(WardError::InvalidInput(format!(
                "unknown stay policy '{other}' (expected since-admission or end-at-discharge)"
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug, Default)]
pub struct CoreConfig {
    dataset_path: Option<PathBuf>,
    persist: bool,
    stay_policy: StayPolicy,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// Persisting inserts requires a dataset path to write back to.
    pub fn new(
        dataset_path: Option<PathBuf>,
        persist: bool,
        stay_policy: StayPolicy,
    ) -> WardResult<Self> {
        if persist && dataset_path.is_none() {
            return Err(WardError::InvalidInput(
                "persisting requires a dataset path".into(),
            ));
        }

        Ok(Self {
            dataset_path,
            persist,
            stay_policy,
        })
    }

    pub fn dataset_path(&self) -> Option<&Path> {
        self.dataset_path.as_deref()
    }

    pub fn persist(&self) -> bool {
        self.persist
    }

    pub fn stay_policy(&self) -> StayPolicy {
        self.stay_policy
    }
}

/// Parse the stay policy from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default policy.
pub fn stay_policy_from_env_value(value: Option<String>) -> WardResult<StayPolicy> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<StayPolicy>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Parse a boolean flag such as `OPENROOM_PERSIST`. Missing or empty means `false`.
pub fn flag_from_env_value(name: &str, value: Option<String>) -> WardResult<bool> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(WardError::InvalidInput(format!(
            "{name} must be true or false, got '{other}'"
        ))),
    }
}
