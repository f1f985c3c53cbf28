use crate::backend::{BackendClient, Direction};
use crate::constants::NO_PATIENTS_HINT;
use crate::error::WardResult;
use crate::filter::{Categorized, EqualityFilter, Searchable};
use crate::model::{Patient, PatientStatus, User};
use crate::views::ListView;
use uuid::Uuid;

impl Searchable for Patient {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.full_name.as_str()]
    }
}

impl Categorized for Patient {
    type Category = PatientStatus;

    fn category(&self) -> PatientStatus {
        self.status
    }
}

/// All patients of an institution, newest first.
pub fn fetch_patients(client: &BackendClient, institution_id: Uuid) -> WardResult<Vec<Patient>> {
    Ok(client
        .from::<Patient>()
        .eq("institution_id", institution_id)
        .order("created_at", Direction::Descending)
        .execute()?)
}

/// One patient, only if it belongs to the institution.
pub fn find_patient(
    client: &BackendClient,
    institution_id: Uuid,
    patient_id: Uuid,
) -> WardResult<Option<Patient>> {
    let rows = client
        .from::<Patient>()
        .eq("id", patient_id)
        .eq("institution_id", institution_id)
        .execute()?;
    Ok(rows.into_iter().next())
}

/// The patients page.
pub struct PatientList {
    client: BackendClient,
    institution_id: Uuid,
    view: ListView<Patient>,
}

impl PatientList {
    /// Opens the page for `viewer` and runs the first fetch.
    pub fn open(client: BackendClient, viewer: &User) -> Self {
        let mut list = Self {
            client,
            institution_id: viewer.institution_id,
            view: ListView::new("patients"),
        };
        list.refresh();
        list
    }

    pub fn refresh(&mut self) {
        let ticket = self.view.begin_fetch();
        let result = fetch_patients(&self.client, self.institution_id);
        self.view.complete(ticket, result);
    }

    pub fn view(&self) -> &ListView<Patient> {
        &self.view
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.view.set_search(query);
    }

    pub fn set_status(&mut self, status: EqualityFilter<PatientStatus>) {
        self.view.set_filter(status);
    }

    pub fn visible(&self) -> Vec<&Patient> {
        self.view.visible()
    }

    pub fn empty_hint(&self) -> Option<&'static str> {
        self.view.empty_hint(NO_PATIENTS_HINT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ADJUST_SEARCH_HINT;
    use crate::test_support::Ward;

    #[test]
    fn lists_only_own_institution_newest_first() {
        let ward = Ward::seeded();
        let list = PatientList::open(ward.client(), &ward.doctor);

        assert!(!list.view().is_loading());
        assert!(list
            .view()
            .rows()
            .iter()
            .all(|p| p.institution_id == ward.institution.id));
        assert_eq!(list.view().rows().len(), ward.own_patient_count());

        let created: Vec<_> = list.view().rows().iter().map(|p| p.created_at).collect();
        let mut sorted = created.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(created, sorted);
    }

    #[test]
    fn search_and_status_narrow_visible_rows() {
        let ward = Ward::seeded();
        let mut list = PatientList::open(ward.client(), &ward.nurse);

        list.set_search("DOE");
        assert!(list
            .visible()
            .iter()
            .all(|p| p.full_name.to_lowercase().contains("doe")));

        list.set_search("");
        list.set_status(EqualityFilter::Only(PatientStatus::Discharged));
        assert!(list
            .visible()
            .iter()
            .all(|p| p.status == PatientStatus::Discharged));
    }

    #[test]
    fn empty_hint_reflects_search() {
        let ward = Ward::seeded();
        let mut list = PatientList::open(ward.client(), &ward.doctor);
        assert_eq!(list.empty_hint(), None);

        list.set_search("no such patient");
        assert_eq!(list.empty_hint(), Some(ADJUST_SEARCH_HINT));
    }

    #[test]
    fn refresh_failure_keeps_rows() {
        let ward = Ward::seeded();
        let mut list = PatientList::open(ward.client(), &ward.doctor);
        let before = list.view().rows().to_vec();

        ward.backend.set_offline(true);
        list.refresh();
        assert_eq!(list.view().rows(), before.as_slice());
    }

    #[test]
    fn opening_while_offline_shows_empty_state() {
        let ward = Ward::seeded();
        ward.backend.set_offline(true);
        let list = PatientList::open(ward.client(), &ward.doctor);
        assert!(list.visible().is_empty());
        assert_eq!(list.empty_hint(), Some(NO_PATIENTS_HINT));
    }

    #[test]
    fn find_patient_is_scoped_to_institution() {
        let ward = Ward::seeded();
        let foreign = ward.foreign_patient.id;
        assert!(find_patient(&ward.client(), ward.institution.id, foreign)
            .unwrap()
            .is_none());
        assert!(find_patient(&ward.client(), ward.other_institution.id, foreign)
            .unwrap()
            .is_some());
    }
}
