//! The case history aggregator — a patient's computed read model.
//!
//! Like the individual record statuses, the summary is never stored; it is
//! derived on every read from a consistent snapshot of the patient's
//! records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  case::CaseHistoryRecord,
  patient::Patient,
  status::{TreatmentStatus, classify_reading, classify_trend},
};

// ─── Read model ──────────────────────────────────────────────────────────────

/// A case history record bundled with its own single-reading status, so a
/// timeline shows status-at-the-time for each entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseHistoryEntry {
  pub record: CaseHistoryRecord,
  pub status: TreatmentStatus,
}

/// The computed patient-level rollup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSummary {
  pub patient_id:            Uuid,
  pub medical_record_number: String,
  /// Earliest diagnosis date across all records.
  pub first_exam_date:       Option<NaiveDate>,
  /// Latest diagnosis date across all records.
  pub last_exam_date:        Option<NaiveDate>,
  /// Equal to `last_exam_date`, except null for a cured patient — a cured
  /// patient has no active case.
  pub last_case_date:        Option<NaiveDate>,
  pub status:                TreatmentStatus,
  /// Full timeline, newest first by `(diagnosis_date, created_at)`.
  pub history:               Vec<CaseHistoryEntry>,
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

/// Derive the patient-level summary from a snapshot of the patient's
/// records. Pure; storage order of `records` is irrelevant.
pub fn summarize(
  patient: &Patient,
  records: &[CaseHistoryRecord],
) -> PatientSummary {
  let mut sorted: Vec<CaseHistoryRecord> = records.to_vec();
  sorted.sort_by(|a, b| {
    (b.diagnosis_date, b.created_at).cmp(&(a.diagnosis_date, a.created_at))
  });

  let Some(latest) = sorted.first() else {
    return PatientSummary {
      patient_id: patient.patient_id,
      medical_record_number: patient.medical_record_number.clone(),
      first_exam_date: None,
      last_exam_date: None,
      last_case_date: None,
      status: TreatmentStatus::Unknown,
      history: Vec::new(),
    };
  };

  let first_exam_date = sorted.iter().map(|r| r.diagnosis_date).min();
  let last_exam_date = sorted.iter().map(|r| r.diagnosis_date).max();

  let status = rollup_status(latest, sorted.get(1), &sorted);

  let last_case_date = if status == TreatmentStatus::Cured {
    None
  } else {
    last_exam_date
  };

  let history = sorted
    .into_iter()
    .map(|record| {
      let status = classify_reading(&record.titer_result);
      CaseHistoryEntry { record, status }
    })
    .collect();

  PatientSummary {
    patient_id: patient.patient_id,
    medical_record_number: patient.medical_record_number.clone(),
    first_exam_date,
    last_exam_date,
    last_case_date,
    status,
    history,
  }
}

/// Trend classification over the two newest readings when a baseline
/// exists; single-reading banding of the latest otherwise (including when
/// the trend is indeterminate).
fn rollup_status(
  latest: &CaseHistoryRecord,
  previous: Option<&CaseHistoryRecord>,
  all: &[CaseHistoryRecord],
) -> TreatmentStatus {
  if let Some(prev) = previous {
    let days = days_since_last_treatment(latest, all);
    if let Some(status) = classify_trend(
      &prev.titer_result,
      &latest.titer_result,
      latest.titer_result.reactivity(),
      days,
    ) {
      return status;
    }
  }
  classify_reading(&latest.titer_result)
}

/// Days from the most recent treatment course (across the whole record set)
/// to the latest reading's date. `None` when no treatment is on file.
fn days_since_last_treatment(
  latest: &CaseHistoryRecord,
  all: &[CaseHistoryRecord],
) -> Option<i64> {
  let last_treatment = all
    .iter()
    .filter_map(CaseHistoryRecord::last_treatment_date)
    .max()?;
  Some((latest.diagnosis_date - last_treatment).num_days())
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::{case::TreatmentCourse, titer::TiterReading};

  fn patient() -> Patient {
    Patient {
      patient_id:            Uuid::new_v4(),
      medical_record_number: "MRN-001".into(),
      name:                  None,
      date_of_birth:         None,
      taxpayer_number:       None,
      diagnosis_date:        None,
      created_at:            Utc::now(),
      updated_at:            None,
    }
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn record(titer: &str, diagnosis: NaiveDate, seq: i64) -> CaseHistoryRecord {
    CaseHistoryRecord {
      case_id:        Uuid::new_v4(),
      patient_id:     Uuid::new_v4(),
      titer_result:   titer.parse::<TiterReading>().unwrap(),
      diagnosis_date: diagnosis,
      treatments:     Vec::new(),
      notes:          None,
      created_at:     Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        + Duration::seconds(seq),
      updated_at:     None,
    }
  }

  #[test]
  fn empty_history_is_unknown() {
    let s = summarize(&patient(), &[]);
    assert_eq!(s.status, TreatmentStatus::Unknown);
    assert!(s.first_exam_date.is_none());
    assert!(s.last_exam_date.is_none());
    assert!(s.last_case_date.is_none());
    assert!(s.history.is_empty());
  }

  #[test]
  fn exam_dates_are_min_and_max() {
    let records = vec![
      record("1:8", date(2024, 3, 1), 0),
      record("1:16", date(2024, 1, 15), 1),
      record("1:32", date(2024, 6, 1), 2),
    ];
    let s = summarize(&patient(), &records);
    assert_eq!(s.first_exam_date, Some(date(2024, 1, 15)));
    assert_eq!(s.last_exam_date, Some(date(2024, 6, 1)));
  }

  #[test]
  fn single_record_uses_band_classification() {
    let records = vec![record("1:64", date(2024, 2, 1), 0)];
    let s = summarize(&patient(), &records);
    assert_eq!(s.status, TreatmentStatus::ActiveInfection);
    assert_eq!(s.last_case_date, Some(date(2024, 2, 1)));
  }

  #[test]
  fn cured_patient_has_no_last_case_date() {
    let records = vec![record("Non-reactive", date(2024, 2, 1), 0)];
    let s = summarize(&patient(), &records);
    assert_eq!(s.status, TreatmentStatus::Cured);
    assert!(s.last_case_date.is_none());
    assert_eq!(s.last_exam_date, Some(date(2024, 2, 1)));
  }

  #[test]
  fn trend_applies_with_two_records() {
    // 1:64 then 1:16 — a 4-fold drop while still reactive.
    let records = vec![
      record("1:64", date(2024, 1, 1), 0),
      record("1:16", date(2024, 4, 1), 1),
    ];
    let s = summarize(&patient(), &records);
    assert_eq!(s.status, TreatmentStatus::MonitoringCure);
  }

  #[test]
  fn rising_trend_is_reinfection() {
    let records = vec![
      record("1:8", date(2024, 1, 1), 0),
      record("1:32", date(2024, 4, 1), 1),
    ];
    let s = summarize(&patient(), &records);
    assert_eq!(s.status, TreatmentStatus::Reinfection);
  }

  #[test]
  fn late_plateau_with_treatment_on_file_is_failure() {
    let mut older = record("1:16", date(2024, 1, 1), 0);
    older.treatments = vec![TreatmentCourse {
      medication:      "Benzathine penicillin G".into(),
      administered_on: date(2024, 1, 2),
      dosage:          Some("2.4 MU IM".into()),
    }];
    let newer = record("1:16", date(2024, 6, 1), 1);

    let s = summarize(&patient(), &[older, newer]);
    assert_eq!(s.status, TreatmentStatus::TreatmentFailure);
  }

  #[test]
  fn recent_plateau_falls_back_to_band() {
    let mut older = record("1:16", date(2024, 1, 1), 0);
    older.treatments = vec![TreatmentCourse {
      medication:      "Benzathine penicillin G".into(),
      administered_on: date(2024, 1, 2),
      dosage:          None,
    }];
    let newer = record("1:16", date(2024, 2, 1), 1);

    // Plateau only 30 days after treatment: indeterminate, so the latest
    // reading's own band stands.
    let s = summarize(&patient(), &[older, newer]);
    assert_eq!(s.status, TreatmentStatus::UnderTreatment);
  }

  #[test]
  fn history_is_sorted_newest_first() {
    let records = vec![
      record("1:8", date(2024, 3, 1), 0),
      record("1:16", date(2024, 1, 15), 1),
      record("1:32", date(2024, 6, 1), 2),
    ];
    let s = summarize(&patient(), &records);
    let dates: Vec<NaiveDate> =
      s.history.iter().map(|e| e.record.diagnosis_date).collect();
    assert_eq!(
      dates,
      vec![date(2024, 6, 1), date(2024, 3, 1), date(2024, 1, 15)]
    );
    // Monotonically non-increasing in (diagnosis_date, created_at).
    for pair in s.history.windows(2) {
      let a = (pair[0].record.diagnosis_date, pair[0].record.created_at);
      let b = (pair[1].record.diagnosis_date, pair[1].record.created_at);
      assert!(a >= b);
    }
  }

  #[test]
  fn equal_dates_break_ties_by_creation_time() {
    let day = date(2024, 5, 1);
    let records = vec![
      record("1:32", day, 0), // created first
      record("1:4", day, 10), // created later — this one is "latest"
    ];
    let s = summarize(&patient(), &records);
    assert_eq!(
      s.history[0].record.titer_result,
      "1:4".parse::<TiterReading>().unwrap()
    );
    // 1:32 → 1:4 is a favorable 8-fold drop, still reactive.
    assert_eq!(s.status, TreatmentStatus::MonitoringCure);
  }

  #[test]
  fn per_record_status_is_attached() {
    let records = vec![
      record("1:64", date(2024, 1, 1), 0),
      record("Non-reactive", date(2024, 6, 1), 1),
    ];
    let s = summarize(&patient(), &records);
    assert_eq!(s.history[0].status, TreatmentStatus::Cured);
    assert_eq!(s.history[1].status, TreatmentStatus::ActiveInfection);
  }
}
