//! Dashboard aggregation.
//!
//! Three collections are fetched for the viewer's institution (patients, summaries awaiting
//! review, staff) and reduced to [`DashboardStats`] on the client. Pending summaries are counted
//! through their patient, so another institution's reviews never inflate the number.
//!
//! Dates are compared in UTC.

use crate::backend::BackendClient;
use crate::config::StayPolicy;
use crate::error::WardResult;
use crate::model::{
    DashboardStats, DischargeSummary, Patient, PatientStatus, Role, SummaryStatus, User,
};
use crate::navigation::Page;
use crate::views::summaries::join_with_patients;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Whole days a patient has stayed, rounded up. Admission counts from 00:00 UTC.
pub fn length_of_stay_days(patient: &Patient, now: DateTime<Utc>, policy: StayPolicy) -> i64 {
    let admitted = Utc.from_utc_datetime(&patient.date_of_admission.and_time(NaiveTime::MIN));
    let end = match policy {
        StayPolicy::EndAtDischarge if patient.status == PatientStatus::Discharged => {
            patient.updated_at
        }
        _ => now,
    };
    let ms = (end - admitted).num_milliseconds();
    -((-ms).div_euclid(DAY_MS))
}

/// Mean stay rounded half-up; 0 for no patients.
pub fn average_length_of_stay(patients: &[Patient], now: DateTime<Utc>, policy: StayPolicy) -> i64 {
    if patients.is_empty() {
        return 0;
    }
    let total: i64 = patients
        .iter()
        .map(|p| length_of_stay_days(p, now, policy))
        .sum();
    let mean = total as f64 / patients.len() as f64;
    (mean + 0.5).floor() as i64
}

pub fn compute_stats(
    patients: &[Patient],
    pending_summaries: usize,
    total_staff: usize,
    now: DateTime<Utc>,
    policy: StayPolicy,
) -> DashboardStats {
    let today = now.date_naive();

    DashboardStats {
        patients_admitted_today: patients
            .iter()
            .filter(|p| p.date_of_admission == today)
            .count(),
        patients_discharged_today: patients
            .iter()
            .filter(|p| p.status == PatientStatus::Discharged && p.updated_at.date_naive() == today)
            .count(),
        average_length_of_stay: average_length_of_stay(patients, now, policy),
        pending_summaries,
        active_patients: patients
            .iter()
            .filter(|p| p.status == PatientStatus::Active)
            .count(),
        total_staff,
    }
}

/// A shortcut button on the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct QuickAction {
    pub label: &'static str,
    pub page: Page,
}

pub fn quick_actions(role: Role) -> Vec<QuickAction> {
    let mut actions = vec![
        QuickAction {
            label: "Add New Patient",
            page: Page::Patients,
        },
        QuickAction {
            label: "Generate Summary",
            page: Page::Summaries,
        },
    ];
    if role == Role::Doctor {
        actions.push(QuickAction {
            label: "Review Summaries",
            page: Page::Summaries,
        });
    }
    actions
}

pub fn greeting(user: &User) -> String {
    format!("Welcome back, Dr. {}", user.last_name)
}

fn fetch_stats(
    client: &BackendClient,
    institution_id: Uuid,
    now: DateTime<Utc>,
    policy: StayPolicy,
) -> WardResult<DashboardStats> {
    let patients = client
        .from::<Patient>()
        .eq("institution_id", institution_id)
        .execute()?;
    let pending = client
        .from::<DischargeSummary>()
        .eq("status", SummaryStatus::ReviewPending)
        .execute()?;
    let staff = client
        .from::<User>()
        .eq("institution_id", institution_id)
        .execute()?;

    let pending_summaries = join_with_patients(pending, patients.clone()).len();

    Ok(compute_stats(
        &patients,
        pending_summaries,
        staff.len(),
        now,
        policy,
    ))
}

pub struct Dashboard {
    client: BackendClient,
    institution_id: Uuid,
    policy: StayPolicy,
    stats: DashboardStats,
    greeting: String,
    quick_actions: Vec<QuickAction>,
}

impl Dashboard {
    pub fn open(
        client: BackendClient,
        viewer: &User,
        policy: StayPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        let mut dashboard = Self {
            client,
            institution_id: viewer.institution_id,
            policy,
            stats: DashboardStats::default(),
            greeting: greeting(viewer),
            quick_actions: quick_actions(viewer.role),
        };
        dashboard.refresh(now);
        dashboard
    }

    /// Recomputes the stats. On failure the previous stats stay.
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        match fetch_stats(&self.client, self.institution_id, now, self.policy) {
            Ok(stats) => self.stats = stats,
            Err(e) => tracing::error!("Error fetching dashboard stats: {}", e),
        }
    }

    pub fn stats(&self) -> &DashboardStats {
        &self.stats
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    pub fn quick_actions(&self) -> &[QuickAction] {
        &self.quick_actions
    }
}
