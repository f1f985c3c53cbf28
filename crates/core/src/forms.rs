//! Creation and login forms.
//!
//! Each form holds the raw field values as typed by the user. Validation only checks that
//! required fields are filled in, that emails look like emails and that dates parse as
//! `YYYY-MM-DD`. Submitting issues one insert; on success the fields reset, on failure the
//! error is logged and the fields are kept for another attempt.

use crate::auth::AuthContext;
use crate::backend::BackendClient;
use crate::constants::{DATE_FORMAT, UNEXPECTED_ERROR_MESSAGE};
use crate::error::{WardError, WardResult};
use crate::model::{Patient, PatientStatus, Role, User};
use crate::views::staff::require_staff_manager;
use chrono::NaiveDate;
use openroom_types::{EmailAddress, NonEmptyText, TextError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

fn required(field: &str, value: &str) -> WardResult<NonEmptyText> {
    NonEmptyText::new(value).map_err(|_| WardError::InvalidInput(format!("{field} is required")))
}

fn email(value: &str) -> WardResult<EmailAddress> {
    EmailAddress::parse(value).map_err(|e| match e {
        TextError::Empty => WardError::InvalidInput("email is required".into()),
        other => other.into(),
    })
}

fn date(field: &str, value: &str) -> WardResult<NaiveDate> {
    let value = required(field, value)?;
    NaiveDate::parse_from_str(value.as_str(), DATE_FORMAT).map_err(|_| {
        WardError::InvalidInput(format!("{field} must be a date in YYYY-MM-DD form"))
    })
}

#[derive(Clone, Debug, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    error: Option<String>,
    submitting: bool,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Signs in through `auth`. Returns true on success; otherwise [`Self::error`] holds the
    /// message to show.
    pub fn submit(&mut self, auth: &mut AuthContext) -> bool {
        self.submitting = true;
        self.error = None;

        let result = match (email(&self.email), required("password", &self.password)) {
            (Ok(email), Ok(password)) => {
                auth.sign_in(email.as_str(), password.as_str()).map(|_| ())
            }
            (Err(e), _) | (_, Err(e)) => Err(e),
        };

        self.submitting = false;
        match result {
            Ok(()) => true,
            Err(e) => {
                self.error = Some(login_message(&e));
                false
            }
        }
    }
}

/// The message a failed sign-in shows.
pub fn login_message(error: &WardError) -> String {
    match error {
        WardError::Auth(e) => e.to_string(),
        WardError::InvalidInput(_) | WardError::Text(_) => error.to_string(),
        _ => UNEXPECTED_ERROR_MESSAGE.to_string(),
    }
}

/// Fields of the add-patient form. Dates are `YYYY-MM-DD`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PatientFields {
    pub full_name: String,
    pub date_of_birth: String,
    pub date_of_admission: String,
    pub bed_number: String,
    pub room_number: String,
}

impl PatientFields {
    /// Blank fields with admission preset to `today`.
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            full_name: String::new(),
            date_of_birth: String::new(),
            date_of_admission: today.format(DATE_FORMAT).to_string(),
            bed_number: String::new(),
            room_number: String::new(),
        }
    }
}

#[derive(Serialize)]
struct NewPatient {
    full_name: NonEmptyText,
    date_of_birth: NaiveDate,
    date_of_admission: NaiveDate,
    bed_number: NonEmptyText,
    room_number: NonEmptyText,
    status: PatientStatus,
    institution_id: Uuid,
    created_by: Uuid,
}

impl NewPatient {
    fn validate(fields: &PatientFields, viewer: &User) -> WardResult<Self> {
        Ok(Self {
            full_name: required("full_name", &fields.full_name)?,
            date_of_birth: date("date_of_birth", &fields.date_of_birth)?,
            date_of_admission: date("date_of_admission", &fields.date_of_admission)?,
            bed_number: required("bed_number", &fields.bed_number)?,
            room_number: required("room_number", &fields.room_number)?,
            status: PatientStatus::Active,
            institution_id: viewer.institution_id,
            created_by: viewer.id,
        })
    }
}

/// Inserts a new ACTIVE patient into the viewer's institution.
pub fn add_patient(
    client: &BackendClient,
    viewer: &User,
    fields: &PatientFields,
) -> WardResult<Patient> {
    let row = NewPatient::validate(fields, viewer)?;
    let patient = client.insert::<Patient>(&row)?;
    tracing::info!(patient_id = %patient.id, "patient added");
    Ok(patient)
}

#[derive(Clone, Debug)]
pub struct AddPatientForm {
    pub fields: PatientFields,
    today: NaiveDate,
}

impl AddPatientForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            fields: PatientFields::blank(today),
            today,
        }
    }

    pub fn submit(&mut self, client: &BackendClient, viewer: &User) -> WardResult<Patient> {
        match add_patient(client, viewer, &self.fields) {
            Ok(patient) => {
                self.fields = PatientFields::blank(self.today);
                Ok(patient)
            }
            Err(e) => {
                tracing::error!("Error adding patient: {}", e);
                Err(e)
            }
        }
    }
}

fn default_staff_role() -> Role {
    Role::Nurse
}

/// Fields of the add-staff form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StaffFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default = "default_staff_role")]
    pub role: Role,
    pub temp_password: String,
}

impl Default for StaffFields {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            role: default_staff_role(),
            temp_password: String::new(),
        }
    }
}

#[derive(Serialize)]
struct NewStaff {
    id: Uuid,
    email: EmailAddress,
    first_name: NonEmptyText,
    last_name: NonEmptyText,
    role: Role,
    institution_id: Uuid,
    is_active: bool,
}

/// Creates sign-in credentials and the profile row for a new NURSE or JUNIOR_DOCTOR.
///
/// Only doctors may add staff. Credentials are created first; if the profile insert then
/// fails the credentials remain without a profile and cannot sign in.
pub fn add_staff(client: &BackendClient, viewer: &User, fields: &StaffFields) -> WardResult<User> {
    require_staff_manager(viewer)?;

    let first_name = required("first_name", &fields.first_name)?;
    let last_name = required("last_name", &fields.last_name)?;
    let address = email(&fields.email)?;
    let password = required("temp_password", &fields.temp_password)?;
    if !matches!(fields.role, Role::Nurse | Role::JuniorDoctor) {
        return Err(WardError::InvalidInput(format!(
            "role must be NURSE or JUNIOR_DOCTOR, got {}",
            fields.role
        )));
    }

    let user_id = client
        .auth()
        .create_user(address.as_str(), password.as_str())?;

    let member = client.insert::<User>(&NewStaff {
        id: user_id,
        email: address,
        first_name,
        last_name,
        role: fields.role,
        institution_id: viewer.institution_id,
        is_active: true,
    })?;
    tracing::info!(user_id = %member.id, role = %member.role, "staff member added");
    Ok(member)
}

#[derive(Clone, Debug, Default)]
pub struct AddStaffForm {
    pub fields: StaffFields,
}

impl AddStaffForm {
    pub fn submit(&mut self, client: &BackendClient, viewer: &User) -> WardResult<User> {
        match add_staff(client, viewer, &self.fields) {
            Ok(member) => {
                self.fields = StaffFields::default();
                Ok(member)
            }
            Err(e) => {
                tracing::error!("Error adding staff member: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthState;
    use crate::test_support::Ward;
    use crate::views::{PatientList, StaffList};

    fn patient_fields() -> PatientFields {
        PatientFields {
            full_name: "Alan Turing".into(),
            date_of_birth: "1912-06-23".into(),
            bed_number: "B".into(),
            room_number: "204".into(),
            ..PatientFields::blank(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
        }
    }

    fn staff_fields() -> StaffFields {
        StaffFields {
            first_name: "Rosalind".into(),
            last_name: "Franklin".into(),
            email: "rosalind@demo.com".into(),
            role: Role::JuniorDoctor,
            temp_password: "welcome1".into(),
        }
    }

    #[test]
    fn login_form_shows_auth_message() {
        let ward = Ward::seeded();
        let mut auth = AuthContext::new(ward.client());
        auth.restore(None);

        let mut form = LoginForm {
            email: ward.doctor.email.clone(),
            password: "wrong-password".into(),
            ..LoginForm::default()
        };
        assert!(!form.submit(&mut auth));
        assert_eq!(form.error(), Some("Invalid login credentials"));
        assert!(!form.is_submitting());

        form.password = Ward::PASSWORD.into();
        assert!(form.submit(&mut auth));
        assert_eq!(form.error(), None);
        assert!(matches!(auth.state(), AuthState::Authenticated(_)));
    }

    #[test]
    fn login_form_reports_service_errors_and_hides_others() {
        let ward = Ward::seeded();
        let mut auth = AuthContext::new(ward.client());
        auth.restore(None);
        ward.backend.set_offline(true);

        let err = WardError::NotAuthenticated;
        assert_eq!(login_message(&err), UNEXPECTED_ERROR_MESSAGE);

        let mut form = LoginForm {
            email: ward.doctor.email.clone(),
            password: Ward::PASSWORD.into(),
            ..LoginForm::default()
        };
        assert!(!form.submit(&mut auth));
        assert_eq!(form.error(), Some("backend unavailable: network request failed"));
    }

    #[test]
    fn login_form_requires_both_fields() {
        let ward = Ward::seeded();
        let mut auth = AuthContext::new(ward.client());
        auth.restore(None);

        let mut form = LoginForm::default();
        assert!(!form.submit(&mut auth));
        assert_eq!(form.error(), Some("invalid input: email is required"));
    }

    #[test]
    fn added_patient_is_active_and_listed() {
        let ward = Ward::seeded();
        let mut form = AddPatientForm::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        form.fields = patient_fields();

        let patient = form.submit(&ward.client(), &ward.nurse).unwrap();
        assert_eq!(patient.status, PatientStatus::Active);
        assert_eq!(patient.institution_id, ward.institution.id);
        assert_eq!(patient.created_by, ward.nurse.id);
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(form.fields, PatientFields::blank(today));

        let list = PatientList::open(ward.client(), &ward.doctor);
        assert_eq!(list.view().rows()[0].id, patient.id);
    }

    #[test]
    fn admission_date_defaults_to_today() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(AddPatientForm::new(today).fields.date_of_admission, "2026-10-16");
    }

    #[test]
    fn invalid_patient_keeps_fields() {
        let ward = Ward::seeded();
        let mut form = AddPatientForm::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        form.fields = PatientFields {
            date_of_birth: "23/06/1912".into(),
            ..patient_fields()
        };

        assert!(matches!(
            form.submit(&ward.client(), &ward.nurse),
            Err(WardError::InvalidInput(_))
        ));
        assert_eq!(form.fields.full_name, "Alan Turing");
    }

    #[test]
    fn added_staff_can_sign_in_and_is_prepended() {
        let ward = Ward::seeded();
        let mut list = StaffList::open(ward.client(), &ward.doctor).unwrap();
        let mut form = AddStaffForm {
            fields: staff_fields(),
        };

        let member = form.submit(&ward.client(), &ward.doctor).unwrap();
        assert_eq!(member.role, Role::JuniorDoctor);
        assert_eq!(member.institution_id, ward.institution.id);
        assert!(member.is_active);
        assert_eq!(form.fields, StaffFields::default());

        list.add_member(member.clone());
        assert_eq!(list.view().rows()[0], member);

        let mut auth = AuthContext::new(ward.client());
        auth.restore(None);
        assert_eq!(auth.sign_in("rosalind@demo.com", "welcome1").unwrap(), &member);
    }

    #[test]
    fn only_doctors_add_staff() {
        let ward = Ward::seeded();
        assert!(matches!(
            add_staff(&ward.client(), &ward.nurse, &staff_fields()),
            Err(WardError::Forbidden(_))
        ));
    }

    #[test]
    fn staff_role_cannot_be_doctor() {
        let ward = Ward::seeded();
        let fields = StaffFields {
            role: Role::Doctor,
            ..staff_fields()
        };
        assert!(matches!(
            add_staff(&ward.client(), &ward.doctor, &fields),
            Err(WardError::InvalidInput(_))
        ));
    }

    #[test]
    fn duplicate_staff_email_surfaces_auth_error() {
        let ward = Ward::seeded();
        let fields = StaffFields {
            email: ward.nurse.email.clone(),
            ..staff_fields()
        };
        let err = add_staff(&ward.client(), &ward.doctor, &fields).unwrap_err();
        assert_eq!(err.to_string(), "User already registered");
    }
}
