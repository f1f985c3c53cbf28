//! The discharge summaries page.
//!
//! Summaries carry no institution column of their own. They are scoped through their patient:
//! the view loads the institution's patients, then keeps only summaries whose patient is one of
//! them, so a summary of another institution's patient is never shown.

use crate::backend::{BackendClient, Direction};
use crate::constants::NO_SUMMARIES_HINT;
use crate::error::WardResult;
use crate::filter::{Categorized, EqualityFilter, Searchable};
use crate::model::{DischargeSummary, Patient, Role, SummaryStatus, User};
use crate::views::ListView;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// A summary joined with the patient it describes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryWithPatient {
    pub summary: DischargeSummary,
    pub patient: Patient,
}

impl Searchable for SummaryWithPatient {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.patient.full_name.as_str()]
    }
}

impl Categorized for SummaryWithPatient {
    type Category = SummaryStatus;

    fn category(&self) -> SummaryStatus {
        self.summary.status
    }
}

/// Which row actions a viewer is offered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SummaryActions {
    pub can_approve: bool,
    pub can_edit: bool,
}

impl SummaryActions {
    pub fn for_viewer(summary: &DischargeSummary, role: Role) -> Self {
        Self {
            can_approve: summary.status == SummaryStatus::ReviewPending && role == Role::Doctor,
            can_edit: summary.status != SummaryStatus::Approved,
        }
    }
}

/// Keeps summaries whose patient is in `patients`, preserving summary order.
pub fn join_with_patients(
    summaries: Vec<DischargeSummary>,
    patients: Vec<Patient>,
) -> Vec<SummaryWithPatient> {
    let by_id: HashMap<Uuid, Patient> = patients.into_iter().map(|p| (p.id, p)).collect();
    summaries
        .into_iter()
        .filter_map(|summary| {
            by_id.get(&summary.patient_id).map(|patient| SummaryWithPatient {
                patient: patient.clone(),
                summary,
            })
        })
        .collect()
}

/// Summaries of the institution's patients, most recently generated first.
pub fn fetch_summaries(
    client: &BackendClient,
    institution_id: Uuid,
) -> WardResult<Vec<SummaryWithPatient>> {
    let patients = client
        .from::<Patient>()
        .eq("institution_id", institution_id)
        .execute()?;
    let summaries = client
        .from::<DischargeSummary>()
        .order("generated_at", Direction::Descending)
        .execute()?;

    Ok(join_with_patients(summaries, patients))
}

pub struct SummaryList {
    client: BackendClient,
    institution_id: Uuid,
    viewer_role: Role,
    view: ListView<SummaryWithPatient>,
}

impl SummaryList {
    pub fn open(client: BackendClient, viewer: &User) -> Self {
        let mut list = Self {
            client,
            institution_id: viewer.institution_id,
            viewer_role: viewer.role,
            view: ListView::new("summaries"),
        };
        list.refresh();
        list
    }

    pub fn refresh(&mut self) {
        let ticket = self.view.begin_fetch();
        let result = fetch_summaries(&self.client, self.institution_id);
        self.view.complete(ticket, result);
    }

    pub fn view(&self) -> &ListView<SummaryWithPatient> {
        &self.view
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.view.set_search(query);
    }

    pub fn set_status(&mut self, status: EqualityFilter<SummaryStatus>) {
        self.view.set_filter(status);
    }

    pub fn visible(&self) -> Vec<&SummaryWithPatient> {
        self.view.visible()
    }

    pub fn actions(&self, row: &SummaryWithPatient) -> SummaryActions {
        SummaryActions::for_viewer(&row.summary, self.viewer_role)
    }

    pub fn empty_hint(&self) -> Option<&'static str> {
        self.view.empty_hint(NO_SUMMARIES_HINT)
    }
}
