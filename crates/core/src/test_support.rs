//! A small two-institution ward shared by the unit tests.

use crate::backend::{BackendClient, Credential, Dataset, MemoryBackend};
use crate::model::{
    DischargeSummary, Document, Institution, Patient, PatientStatus, Role, SummaryStatus, User,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub struct Ward {
    pub backend: Arc<MemoryBackend>,
    pub now: DateTime<Utc>,
    pub institution: Institution,
    pub other_institution: Institution,
    pub doctor: User,
    pub nurse: User,
    pub junior: User,
    pub foreign_doctor: User,
    /// REVIEW_PENDING, admitted three days ago, two summaries and one document.
    pub jane: Patient,
    pub foreign_patient: Patient,
    /// Jane's summary awaiting review.
    pub pending_summary: DischargeSummary,
    dataset: Dataset,
}

fn new_institution(name: &str, created_at: DateTime<Utc>) -> Institution {
    Institution {
        id: Uuid::new_v4(),
        name: name.into(),
        address: "1 Hospital Road".into(),
        contact_info: "+44 20 0000 0000".into(),
        created_at,
    }
}

fn user(
    institution: &Institution,
    email: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
    created_at: DateTime<Utc>,
) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.into(),
        first_name: first_name.into(),
        last_name: last_name.into(),
        role,
        institution_id: institution.id,
        created_at,
        is_active: true,
    }
}

fn patient(
    institution: &Institution,
    created_by: &User,
    full_name: &str,
    admitted: NaiveDate,
    status: PatientStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Patient {
    Patient {
        id: Uuid::new_v4(),
        full_name: full_name.into(),
        date_of_birth: NaiveDate::from_ymd_opt(1958, 4, 12).expect("valid date"),
        date_of_admission: admitted,
        bed_number: "A".into(),
        room_number: "301".into(),
        status,
        institution_id: institution.id,
        created_by: created_by.id,
        created_at,
        updated_at,
    }
}

fn summary(
    patient: &Patient,
    author: &User,
    status: SummaryStatus,
    generated_at: DateTime<Utc>,
) -> DischargeSummary {
    DischargeSummary {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        content: format!("Discharge summary for {}.", patient.full_name),
        status,
        generated_by: author.id,
        approved_by: None,
        generated_at,
        approved_at: None,
        version_number: 1,
    }
}

impl Ward {
    pub const PASSWORD: &'static str = "demo123";

    pub fn seeded() -> Self {
        let now = Utc::now();
        let today = now.date_naive();
        let long_ago = now - Duration::days(30);

        let institution = new_institution("St. Mary's", long_ago);
        let other_institution = new_institution("General Hospital", long_ago);

        let doctor = user(
            &institution,
            "doctor@demo.com",
            "Sarah",
            "Johnson",
            Role::Doctor,
            long_ago,
        );
        let nurse = user(
            &institution,
            "nurse@demo.com",
            "Emily",
            "Doe",
            Role::Nurse,
            long_ago + Duration::days(1),
        );
        let junior = user(
            &institution,
            "junior@demo.com",
            "Tom",
            "Nguyen",
            Role::JuniorDoctor,
            long_ago + Duration::days(2),
        );
        let foreign_doctor = user(
            &other_institution,
            "doctor@general.org",
            "Mark",
            "Doe",
            Role::Doctor,
            long_ago,
        );

        let jane = patient(
            &institution,
            &doctor,
            "Jane Doe",
            today - Duration::days(3),
            PatientStatus::ReviewPending,
            now - Duration::days(3),
            now - Duration::days(1),
        );
        let john = patient(
            &institution,
            &nurse,
            "John Doe",
            today,
            PatientStatus::Active,
            now - Duration::minutes(30),
            now - Duration::minutes(30),
        );
        let robert = patient(
            &institution,
            &doctor,
            "Robert Brown",
            today - Duration::days(5),
            PatientStatus::Discharged,
            now - Duration::days(5),
            now,
        );
        let foreign_patient = patient(
            &other_institution,
            &foreign_doctor,
            "Mary Doe",
            today,
            PatientStatus::Active,
            now - Duration::hours(2),
            now - Duration::hours(2),
        );

        let pending_summary = summary(
            &jane,
            &junior,
            SummaryStatus::ReviewPending,
            now - Duration::hours(1),
        );
        let draft = summary(&jane, &junior, SummaryStatus::Draft, now - Duration::days(2));
        let approved = DischargeSummary {
            approved_by: Some(doctor.id),
            approved_at: Some(now - Duration::hours(3)),
            ..summary(&robert, &doctor, SummaryStatus::Approved, now - Duration::hours(4))
        };
        let foreign_pending = summary(
            &foreign_patient,
            &foreign_doctor,
            SummaryStatus::ReviewPending,
            now - Duration::minutes(10),
        );

        let document = Document {
            id: Uuid::new_v4(),
            patient_id: jane.id,
            file_name: "bloods.pdf".into(),
            file_path: format!("patients/{}/bloods.pdf", jane.id),
            file_type: "application/pdf".into(),
            uploaded_by: nurse.id,
            upload_date: now - Duration::days(2),
            file_size: 48_213,
        };

        let credentials = [&doctor, &nurse, &junior, &foreign_doctor]
            .into_iter()
            .map(|u| Credential::new(u.id, u.email.clone(), Self::PASSWORD))
            .collect();

        let dataset = Dataset {
            institutions: vec![institution.clone(), other_institution.clone()],
            users: vec![
                doctor.clone(),
                nurse.clone(),
                junior.clone(),
                foreign_doctor.clone(),
            ],
            patients: vec![jane.clone(), john, robert, foreign_patient.clone()],
            discharge_summaries: vec![draft, pending_summary.clone(), approved, foreign_pending],
            documents: vec![document],
            credentials,
        };

        Self {
            backend: Arc::new(MemoryBackend::new(dataset.clone())),
            now,
            institution,
            other_institution,
            doctor,
            nurse,
            junior,
            foreign_doctor,
            jane,
            foreign_patient,
            pending_summary,
            dataset,
        }
    }

    pub fn client(&self) -> BackendClient {
        BackendClient::new(self.backend.clone())
    }

    /// Patients seeded for the first institution.
    pub fn own_patient_count(&self) -> usize {
        self.dataset
            .patients
            .iter()
            .filter(|p| p.institution_id == self.institution.id)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_ward_has_two_distinct_institutions() {
        let ward = Ward::seeded();
        assert_eq!(ward.institution.name, "St. Mary's");
        assert_eq!(ward.other_institution.name, "General Hospital");
        assert_ne!(ward.institution.id, ward.other_institution.id);
        assert_eq!(ward.foreign_patient.institution_id, ward.other_institution.id);
    }
}
