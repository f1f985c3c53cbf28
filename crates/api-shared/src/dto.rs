//! Request and response bodies.
//!
//! Responses are built from the core view models, so the REST API and the CLI's JSON output
//! render exactly what a view shows: the visible rows after search and filtering, plus the
//! empty-state hint when nothing is visible.

use openroom_core::dashboard::{Dashboard, QuickAction};
use openroom_core::views::{PatientDetails, PatientList, StaffList, SummaryList};
use openroom_core::{
    DashboardStats, DischargeSummary, Document, MenuEntry, Page, Patient, Role, User,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SignInReq {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SignInRes {
    pub access_token: String,
    pub user: User,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MenuEntryRes {
    pub page: Page,
    pub label: String,
}

impl From<&MenuEntry> for MenuEntryRes {
    fn from(entry: &MenuEntry) -> Self {
        Self {
            page: entry.page,
            label: entry.label.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct NavigationRes {
    pub role: Role,
    pub entries: Vec<MenuEntryRes>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuickActionRes {
    pub label: String,
    pub page: Page,
}

impl From<&QuickAction> for QuickActionRes {
    fn from(action: &QuickAction) -> Self {
        Self {
            label: action.label.to_string(),
            page: action.page,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardRes {
    pub greeting: String,
    pub stats: DashboardStats,
    pub quick_actions: Vec<QuickActionRes>,
}

impl From<&Dashboard> for DashboardRes {
    fn from(dashboard: &Dashboard) -> Self {
        Self {
            greeting: dashboard.greeting().to_string(),
            stats: *dashboard.stats(),
            quick_actions: dashboard.quick_actions().iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientsRes {
    pub patients: Vec<Patient>,
    pub empty_hint: Option<String>,
}

impl From<&PatientList> for PatientsRes {
    fn from(list: &PatientList) -> Self {
        Self {
            patients: list.visible().into_iter().cloned().collect(),
            empty_hint: list.empty_hint().map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientDetailsRes {
    pub patient: Patient,
    pub summaries: Vec<DischargeSummary>,
    pub documents: Vec<Document>,
}

impl From<PatientDetails> for PatientDetailsRes {
    fn from(details: PatientDetails) -> Self {
        Self {
            patient: details.patient,
            summaries: details.summaries,
            documents: details.documents,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SummaryRowRes {
    pub summary: DischargeSummary,
    pub patient: Patient,
    pub can_approve: bool,
    pub can_edit: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SummariesRes {
    pub summaries: Vec<SummaryRowRes>,
    pub empty_hint: Option<String>,
}

impl From<&SummaryList> for SummariesRes {
    fn from(list: &SummaryList) -> Self {
        Self {
            summaries: list
                .visible()
                .into_iter()
                .map(|row| {
                    let actions = list.actions(row);
                    SummaryRowRes {
                        summary: row.summary.clone(),
                        patient: row.patient.clone(),
                        can_approve: actions.can_approve,
                        can_edit: actions.can_edit,
                    }
                })
                .collect(),
            empty_hint: list.empty_hint().map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StaffMemberRes {
    pub member: User,
    /// False for the viewer's own row.
    pub removable: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StaffRes {
    pub staff: Vec<StaffMemberRes>,
    pub empty_hint: Option<String>,
}

impl From<&StaffList> for StaffRes {
    fn from(list: &StaffList) -> Self {
        Self {
            staff: list
                .visible()
                .into_iter()
                .map(|member| StaffMemberRes {
                    removable: list.is_removable(member),
                    member: member.clone(),
                })
                .collect(),
            empty_hint: list.empty_hint().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openroom_core::navigation::menu_for;

    #[test]
    fn menu_entries_serialize_with_page_ids() {
        let entries: Vec<MenuEntryRes> = menu_for(Some(Role::Nurse))
            .into_iter()
            .map(Into::into)
            .collect();
        let json = serde_json::to_value(&entries).unwrap();
        assert_eq!(json[0]["page"], "dashboard");
        assert_eq!(json[3]["label"], "Room Management");
    }

    #[test]
    fn error_body_shape() {
        let json = serde_json::to_value(ErrorRes {
            error: "Invalid login credentials".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Invalid login credentials" }));
    }
}
