//! Patient details: one patient with their discharge summaries and document metadata.
//!
//! The patient itself comes from the list the user clicked, so only the two child
//! collections are fetched. Either fetch failing is logged and leaves that collection empty.

use crate::backend::{BackendClient, Direction};
use crate::model::{DischargeSummary, Document, Patient};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatientDetails {
    pub patient: Patient,
    pub summaries: Vec<DischargeSummary>,
    pub documents: Vec<Document>,
}

impl PatientDetails {
    pub fn open(client: &BackendClient, patient: Patient) -> Self {
        let summaries = client
            .from::<DischargeSummary>()
            .eq("patient_id", patient.id)
            .order("generated_at", Direction::Descending)
            .execute()
            .unwrap_or_else(|e| {
                tracing::error!("Error fetching summaries: {}", e);
                Vec::new()
            });

        let documents = client
            .from::<Document>()
            .eq("patient_id", patient.id)
            .order("upload_date", Direction::Descending)
            .execute()
            .unwrap_or_else(|e| {
                tracing::error!("Error fetching documents: {}", e);
                Vec::new()
            });

        Self {
            patient,
            summaries,
            documents,
        }
    }
}
