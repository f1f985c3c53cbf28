//! The application shell.
//!
//! [`App`] owns the auth context and the little routing state there is: the current page and
//! an optional selected patient. [`App::screen`] decides what to render from those. Page view
//! models are built fresh by the `open_*` methods, so every navigation refetches from empty.

use crate::auth::{AuthContext, AuthState};
use crate::backend::BackendClient;
use crate::config::CoreConfig;
use crate::dashboard::Dashboard;
use crate::error::{WardError, WardResult};
use crate::forms::{AddPatientForm, LoginForm};
use crate::model::{Patient, Role, User};
use crate::navigation::{menu_for, MenuEntry, Page};
use crate::views::{PatientDetails, PatientList, StaffList, SummaryList};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

/// What the shell renders.
#[derive(Clone, Debug, PartialEq)]
pub enum Screen {
    Loading,
    Login,
    /// A menu page that has no content yet.
    ComingSoon(Page),
    AccessDenied(Page),
    Page(Page),
    PatientDetails(Patient),
}

pub struct App {
    cfg: Arc<CoreConfig>,
    auth: AuthContext,
    current_page: Page,
    selected_patient: Option<Patient>,
    login: LoginForm,
    add_patient: Option<AddPatientForm>,
}

impl App {
    pub fn new(client: BackendClient, cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            auth: AuthContext::new(client),
            current_page: Page::default(),
            selected_patient: None,
            login: LoginForm::default(),
            add_patient: None,
        }
    }

    /// Resolves the loading state from a stored access token, if any.
    pub fn start(&mut self, access_token: Option<&str>) -> &AuthState {
        self.auth.restore(access_token)
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn user(&self) -> Option<&User> {
        self.auth.user()
    }

    pub fn current_page(&self) -> Page {
        self.current_page
    }

    pub fn login_form(&self) -> &LoginForm {
        &self.login
    }

    pub fn login_form_mut(&mut self) -> &mut LoginForm {
        &mut self.login
    }

    /// Submits the login form. Returns true once signed in.
    pub fn submit_login(&mut self) -> bool {
        let signed_in = self.login.submit(&mut self.auth);
        if signed_in {
            self.login = LoginForm::default();
        }
        signed_in
    }

    pub fn sign_out(&mut self) -> WardResult<()> {
        self.reset_routing();
        self.auth.sign_out()
    }

    /// Applies session changes from the backend. Returns true if the auth state changed.
    pub fn pump_events(&mut self) -> bool {
        let changed = self.auth.pump_events();
        if changed && self.auth.user().is_none() {
            self.reset_routing();
        }
        changed
    }

    /// Menu entries for the signed-in user's role.
    pub fn menu(&self) -> Vec<&'static MenuEntry> {
        menu_for(self.auth.user().map(|u| u.role))
    }

    /// Switches page by id. Unknown ids land on the dashboard.
    pub fn navigate(&mut self, page_id: &str) -> Page {
        self.current_page = Page::from_id_or_default(page_id);
        self.selected_patient = None;
        self.current_page
    }

    pub fn select_patient(&mut self, patient: Patient) {
        self.selected_patient = Some(patient);
    }

    /// Leaves patient details for the patient list.
    pub fn back_to_patients(&mut self) {
        self.selected_patient = None;
        self.current_page = Page::Patients;
    }

    pub fn screen(&self) -> Screen {
        let user = match self.auth.state() {
            AuthState::Loading => return Screen::Loading,
            AuthState::Unauthenticated => return Screen::Login,
            AuthState::Authenticated(user) => user,
        };

        if let Some(patient) = &self.selected_patient {
            return Screen::PatientDetails(patient.clone());
        }

        let page = self.current_page;
        if page.is_placeholder() {
            Screen::ComingSoon(page)
        } else if page == Page::Staff && user.role != Role::Doctor {
            Screen::AccessDenied(page)
        } else {
            Screen::Page(page)
        }
    }

    fn viewer(&self) -> WardResult<&User> {
        self.auth.user().ok_or(WardError::NotAuthenticated)
    }

    fn client(&self) -> BackendClient {
        self.auth.client().clone()
    }

    pub fn open_dashboard(&self, now: DateTime<Utc>) -> WardResult<Dashboard> {
        let viewer = self.viewer()?;
        Ok(Dashboard::open(self.client(), viewer, self.cfg.stay_policy(), now))
    }

    pub fn open_patients(&self) -> WardResult<PatientList> {
        Ok(PatientList::open(self.client(), self.viewer()?))
    }

    pub fn open_summaries(&self) -> WardResult<SummaryList> {
        Ok(SummaryList::open(self.client(), self.viewer()?))
    }

    pub fn open_staff(&self) -> WardResult<StaffList> {
        StaffList::open(self.client(), self.viewer()?)
    }

    pub fn open_patient_details(&self) -> WardResult<Option<PatientDetails>> {
        self.viewer()?;
        Ok(self
            .selected_patient
            .clone()
            .map(|patient| PatientDetails::open(self.auth.client(), patient)))
    }

    pub fn open_add_patient(&mut self, today: NaiveDate) -> &mut AddPatientForm {
        self.add_patient.insert(AddPatientForm::new(today))
    }

    pub fn add_patient_form(&mut self) -> Option<&mut AddPatientForm> {
        self.add_patient.as_mut()
    }

    pub fn close_add_patient(&mut self) {
        self.add_patient = None;
    }

    /// Submits the open add-patient form. On success the form closes and `list` refetches.
    pub fn submit_add_patient(&mut self, list: &mut PatientList) -> WardResult<Patient> {
        let client = self.client();
        let viewer = self.viewer()?.clone();
        let form = self
            .add_patient
            .as_mut()
            .ok_or_else(|| WardError::InvalidInput("add patient form is not open".into()))?;

        let patient = form.submit(&client, &viewer)?;
        self.add_patient = None;
        list.refresh();
        Ok(patient)
    }

    fn reset_routing(&mut self) {
        self.current_page = Page::default();
        self.selected_patient = None;
        self.add_patient = None;
    }
}
