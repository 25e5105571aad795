//! Case histories and follow-up lab tests.
//!
//! A case history record is one exam entry in a patient's timeline: the
//! titer measured, the diagnosis date, and the treatment courses given.
//! Follow-up tests are the individual lab results (VDRL/RPR etc.) taken
//! after treatment, optionally linked to a case.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::titer::{Reactivity, TiterReading};

// ─── Case history ────────────────────────────────────────────────────────────

/// One medication course within a case history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentCourse {
  pub medication:      String,
  pub administered_on: NaiveDate,
  pub dosage:          Option<String>,
}

/// One entry in a patient's case timeline. Owned by exactly one patient;
/// deleted only via patient cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseHistoryRecord {
  pub case_id:        Uuid,
  pub patient_id:     Uuid,
  pub titer_result:   TiterReading,
  pub diagnosis_date: NaiveDate,
  /// Ordered list of medication courses, oldest first.
  pub treatments:     Vec<TreatmentCourse>,
  pub notes:          Option<String>,
  /// Server-assigned; breaks ties between records sharing a diagnosis date.
  pub created_at:     DateTime<Utc>,
  pub updated_at:     Option<DateTime<Utc>>,
}

impl CaseHistoryRecord {
  /// The most recent treatment date recorded on this case, if any.
  pub fn last_treatment_date(&self) -> Option<NaiveDate> {
    self.treatments.iter().map(|t| t.administered_on).max()
  }
}

/// Input to [`crate::store::CaseStore::record_case`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewCaseHistory {
  pub patient_id:     Uuid,
  pub titer_result:   TiterReading,
  pub diagnosis_date: NaiveDate,
  #[serde(default)]
  pub treatments:     Vec<TreatmentCourse>,
  pub notes:          Option<String>,
}

/// Partial update for a case history. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseHistoryUpdate {
  pub titer_result:   Option<TiterReading>,
  pub diagnosis_date: Option<NaiveDate>,
  /// Replaces the whole treatment list when present.
  pub treatments:     Option<Vec<TreatmentCourse>>,
  pub notes:          Option<String>,
}

impl CaseHistoryUpdate {
  pub fn is_empty(&self) -> bool {
    self.titer_result.is_none()
      && self.diagnosis_date.is_none()
      && self.treatments.is_none()
      && self.notes.is_none()
  }

  /// Apply the provided fields to `record`, in place. The caller stamps
  /// `updated_at`.
  pub fn apply(&self, record: &mut CaseHistoryRecord) {
    if let Some(titer) = self.titer_result {
      record.titer_result = titer;
    }
    if let Some(date) = self.diagnosis_date {
      record.diagnosis_date = date;
    }
    if let Some(treatments) = &self.treatments {
      record.treatments = treatments.clone();
    }
    if let Some(notes) = &self.notes {
      record.notes = Some(notes.clone());
    }
  }
}

// ─── Follow-up tests ─────────────────────────────────────────────────────────

/// A follow-up lab test taken after diagnosis or treatment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpTest {
  pub test_id:    Uuid,
  pub patient_id: Uuid,
  /// The case this test follows up on, when known.
  pub case_id:    Option<Uuid>,
  pub test_date:  NaiveDate,
  /// Assay name, e.g. "VDRL" or "RPR".
  pub test_type:  String,
  pub result:     Reactivity,
  pub titer:      Option<TiterReading>,
  pub notes:      Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::CaseStore::record_follow_up`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewFollowUpTest {
  pub patient_id: Uuid,
  pub case_id:    Option<Uuid>,
  pub test_date:  NaiveDate,
  pub test_type:  String,
  pub result:     Reactivity,
  pub titer:      Option<TiterReading>,
  pub notes:      Option<String>,
}
