//! Rows held by the backend and their enumerations.
//!
//! The application only ever holds transient copies of these rows. Field names match the
//! backend's column names, and enum values travel as SCREAMING_SNAKE_CASE strings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::WardError;

/// Tables exposed by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Institutions,
    Users,
    Patients,
    DischargeSummaries,
    Documents,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Institutions => "institutions",
            Table::Users => "users",
            Table::Patients => "patients",
            Table::DischargeSummaries => "discharge_summaries",
            Table::Documents => "documents",
        }
    }

    /// Columns that may be filtered or ordered on.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Institutions => &["id", "name", "address", "contact_info", "created_at"],
            Table::Users => &[
                "id",
                "email",
                "first_name",
                "last_name",
                "role",
                "institution_id",
                "created_at",
                "is_active",
            ],
            Table::Patients => &[
                "id",
                "full_name",
                "date_of_birth",
                "date_of_admission",
                "bed_number",
                "room_number",
                "status",
                "institution_id",
                "created_by",
                "created_at",
                "updated_at",
            ],
            Table::DischargeSummaries => &[
                "id",
                "patient_id",
                "content",
                "status",
                "generated_by",
                "approved_by",
                "generated_at",
                "approved_at",
                "version_number",
            ],
            Table::Documents => &[
                "id",
                "patient_id",
                "file_name",
                "file_path",
                "file_type",
                "uploaded_by",
                "upload_date",
                "file_size",
            ],
        }
    }

    pub fn has_column(self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    /// Timestamp columns the backend fills with the insert time when a row omits them.
    pub fn default_timestamp_columns(self) -> &'static [&'static str] {
        match self {
            Table::Institutions | Table::Users => &["created_at"],
            Table::Patients => &["created_at", "updated_at"],
            Table::DischargeSummaries => &["generated_at"],
            Table::Documents => &["upload_date"],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A row type stored in one backend table.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + 'static {
    const TABLE: Table;
}

/// Human label for an enum value: the first underscore becomes a space and each word is
/// title-cased, so `REVIEW_PENDING` reads "Review Pending".
pub fn display_label(raw: &str) -> String {
    let lowered = raw.replacen('_', " ", 1).to_lowercase();
    let mut label = String::with_capacity(lowered.len());
    let mut at_word_start = true;
    for c in lowered.chars() {
        if at_word_start && c.is_alphanumeric() {
            label.extend(c.to_uppercase());
        } else {
            label.push(c);
        }
        at_word_start = !(c.is_alphanumeric() || c == '_');
    }
    label
}

macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            pub fn label(self) -> String {
                display_label(self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = WardError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(WardError::InvalidInput(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Doctor,
    Nurse,
    JuniorDoctor,
}

wire_enum!(Role {
    Doctor => "DOCTOR",
    Nurse => "NURSE",
    JuniorDoctor => "JUNIOR_DOCTOR",
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatientStatus {
    Active,
    ReviewPending,
    Discharged,
}

wire_enum!(PatientStatus {
    Active => "ACTIVE",
    ReviewPending => "REVIEW_PENDING",
    Discharged => "DISCHARGED",
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SummaryStatus {
    Draft,
    ReviewPending,
    Approved,
}

wire_enum!(SummaryStatus {
    Draft => "DRAFT",
    ReviewPending => "REVIEW_PENDING",
    Approved => "APPROVED",
});

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub institution_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Record for User {
    const TABLE: Table = Table::Users;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Institution {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub contact_info: String,
    pub created_at: DateTime<Utc>,
}

impl Record for Institution {
    const TABLE: Table = Table::Institutions;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Patient {
    pub id: Uuid,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub date_of_admission: NaiveDate,
    pub bed_number: String,
    pub room_number: String,
    pub status: PatientStatus,
    pub institution_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Patient {
    const TABLE: Table = Table::Patients;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DischargeSummary {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub content: String,
    pub status: SummaryStatus,
    pub generated_by: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<Uuid>,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default = "first_version")]
    pub version_number: u32,
}

fn first_version() -> u32 {
    1
}

impl Record for DischargeSummary {
    const TABLE: Table = Table::DischargeSummaries;
}

/// File metadata attached to a patient. Upload and retrieval are not handled here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub uploaded_by: Uuid,
    pub upload_date: DateTime<Utc>,
    pub file_size: u64,
}

impl Record for Document {
    const TABLE: Table = Table::Documents;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub patients_admitted_today: usize,
    pub patients_discharged_today: usize,
    /// Whole days.
    pub average_length_of_stay: i64,
    pub pending_summaries: usize,
    pub active_patients: usize,
    pub total_staff: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_dashboard_wording() {
        assert_eq!(PatientStatus::ReviewPending.label(), "Review Pending");
        assert_eq!(Role::JuniorDoctor.label(), "Junior Doctor");
        assert_eq!(SummaryStatus::Approved.label(), "Approved");
    }

    #[test]
    fn label_only_replaces_first_underscore() {
        assert_eq!(display_label("A_B_C"), "A B_c");
    }

    #[test]
    fn enums_round_trip_through_wire_strings() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), *role);
            let json = serde_json::to_string(role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
        assert!("SURGEON".parse::<Role>().is_err());
    }

    #[test]
    fn summary_version_defaults_to_one() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "patient_id": Uuid::new_v4(),
            "content": "Stable on discharge.",
            "status": "DRAFT",
            "generated_by": Uuid::new_v4(),
            "generated_at": "2026-10-16T08:00:00Z",
        });
        let summary: DischargeSummary = serde_json::from_value(json).unwrap();
        assert_eq!(summary.version_number, 1);
        assert!(summary.approved_by.is_none());
    }

    #[test]
    fn every_table_knows_its_id_column() {
        for table in [
            Table::Institutions,
            Table::Users,
            Table::Patients,
            Table::DischargeSummaries,
            Table::Documents,
        ] {
            assert!(table.has_column("id"), "{table} should have an id column");
            for column in table.default_timestamp_columns() {
                assert!(table.has_column(column));
            }
        }
    }
}
