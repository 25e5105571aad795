//! Patient — the owning entity of the register.
//!
//! A patient owns its case histories and follow-up tests; deleting a patient
//! removes them in the same transaction. The clinic's external identifier is
//! the medical record number (MRN), unique across all patients.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{case::NewCaseHistory, titer::TiterReading};

/// A registered patient. `treatment_status` is deliberately absent: status
/// is a read-time projection of the titer history (see
/// [`crate::summary::summarize`]), never stored truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
  pub patient_id:            Uuid,
  /// Clinic-assigned external identifier. Unique; duplicates are a
  /// conflict, not a server error.
  pub medical_record_number: String,
  pub name:                  Option<String>,
  pub date_of_birth:         Option<NaiveDate>,
  /// National taxpayer number; unique when present.
  pub taxpayer_number:       Option<String>,
  /// Date of the initial syphilis diagnosis, if known at registration.
  pub diagnosis_date:        Option<NaiveDate>,
  pub created_at:            DateTime<Utc>,
  pub updated_at:            Option<DateTime<Utc>>,
}

/// Input to [`crate::store::CaseStore::create_patient`].
/// `patient_id` and `created_at` are always assigned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPatient {
  pub medical_record_number: String,
  pub name:                  Option<String>,
  pub date_of_birth:         Option<NaiveDate>,
  pub taxpayer_number:       Option<String>,
  pub diagnosis_date:        Option<NaiveDate>,
  /// Intake shortcut: record the first case history (initial titer and
  /// diagnosis date) in the same transaction as the patient.
  pub initial_case:          Option<IntakeCase>,
}

/// The case-history fields accepted at intake, before a patient id exists.
#[derive(Debug, Clone, Deserialize)]
pub struct IntakeCase {
  pub titer_result:   TiterReading,
  pub diagnosis_date: NaiveDate,
  pub notes:          Option<String>,
}

impl IntakeCase {
  pub fn into_new_case(self, patient_id: Uuid) -> NewCaseHistory {
    NewCaseHistory {
      patient_id,
      titer_result: self.titer_result,
      diagnosis_date: self.diagnosis_date,
      treatments: Vec::new(),
      notes: self.notes,
    }
  }
}

/// Partial update for a patient. Absent fields are left untouched; there is
/// no way to null out a field through this type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientUpdate {
  pub medical_record_number: Option<String>,
  pub name:                  Option<String>,
  pub date_of_birth:         Option<NaiveDate>,
  pub taxpayer_number:       Option<String>,
  pub diagnosis_date:        Option<NaiveDate>,
}

impl PatientUpdate {
  pub fn is_empty(&self) -> bool {
    self.medical_record_number.is_none()
      && self.name.is_none()
      && self.date_of_birth.is_none()
      && self.taxpayer_number.is_none()
      && self.diagnosis_date.is_none()
  }

  /// Apply the provided fields to `patient`, in place.
  pub fn apply(&self, patient: &mut Patient) {
    if let Some(mrn) = &self.medical_record_number {
      patient.medical_record_number = mrn.clone();
    }
    if let Some(name) = &self.name {
      patient.name = Some(name.clone());
    }
    if let Some(dob) = self.date_of_birth {
      patient.date_of_birth = Some(dob);
    }
    if let Some(tin) = &self.taxpayer_number {
      patient.taxpayer_number = Some(tin.clone());
    }
    if let Some(date) = self.diagnosis_date {
      patient.diagnosis_date = Some(date);
    }
  }
}
