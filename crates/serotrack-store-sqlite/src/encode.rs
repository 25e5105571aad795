//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings and calendar dates as
//! `YYYY-MM-DD`. Titers are stored in their canonical string form, treatment
//! lists as compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use serotrack_core::{
  case::{CaseHistoryRecord, FollowUpTest, TreatmentCourse},
  patient::Patient,
  titer::{Reactivity, TiterReading},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── TiterReading ────────────────────────────────────────────────────────────

pub fn encode_titer(t: TiterReading) -> String { t.to_string() }

pub fn decode_titer(s: &str) -> Result<TiterReading> {
  s.parse::<TiterReading>().map_err(Error::Core)
}

// ─── Reactivity ──────────────────────────────────────────────────────────────

pub fn encode_reactivity(r: Reactivity) -> &'static str {
  match r {
    Reactivity::Reactive => "reactive",
    Reactivity::NonReactive => "non_reactive",
    Reactivity::Inconclusive => "inconclusive",
  }
}

pub fn decode_reactivity(s: &str) -> Result<Reactivity> {
  match s {
    "reactive" => Ok(Reactivity::Reactive),
    "non_reactive" => Ok(Reactivity::NonReactive),
    "inconclusive" => Ok(Reactivity::Inconclusive),
    other => Err(Error::Corrupt(format!("unknown reactivity: {other:?}"))),
  }
}

// ─── Treatments ──────────────────────────────────────────────────────────────

pub fn encode_treatments(courses: &[TreatmentCourse]) -> Result<String> {
  Ok(serde_json::to_string(courses)?)
}

pub fn decode_treatments(s: &str) -> Result<Vec<TreatmentCourse>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `patients` row.
pub struct RawPatient {
  pub patient_id:            String,
  pub medical_record_number: String,
  pub name:                  Option<String>,
  pub date_of_birth:         Option<String>,
  pub taxpayer_number:       Option<String>,
  pub diagnosis_date:        Option<String>,
  pub created_at:            String,
  pub updated_at:            Option<String>,
}

impl RawPatient {
  pub const COLUMNS: &'static str = "patient_id, medical_record_number, name, \
     date_of_birth, taxpayer_number, diagnosis_date, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      patient_id:            row.get(0)?,
      medical_record_number: row.get(1)?,
      name:                  row.get(2)?,
      date_of_birth:         row.get(3)?,
      taxpayer_number:       row.get(4)?,
      diagnosis_date:        row.get(5)?,
      created_at:            row.get(6)?,
      updated_at:            row.get(7)?,
    })
  }

  pub fn into_patient(self) -> Result<Patient> {
    Ok(Patient {
      patient_id:            decode_uuid(&self.patient_id)?,
      medical_record_number: self.medical_record_number,
      name:                  self.name,
      date_of_birth:         self
        .date_of_birth
        .as_deref()
        .map(decode_date)
        .transpose()?,
      taxpayer_number:       self.taxpayer_number,
      diagnosis_date:        self
        .diagnosis_date
        .as_deref()
        .map(decode_date)
        .transpose()?,
      created_at:            decode_dt(&self.created_at)?,
      updated_at:            self.updated_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from a `case_histories` row.
pub struct RawCaseHistory {
  pub case_id:        String,
  pub patient_id:     String,
  pub titer_result:   String,
  pub diagnosis_date: String,
  pub treatments:     String,
  pub notes:          Option<String>,
  pub created_at:     String,
  pub updated_at:     Option<String>,
}

impl RawCaseHistory {
  pub const COLUMNS: &'static str = "case_id, patient_id, titer_result, \
     diagnosis_date, treatments, notes, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      case_id:        row.get(0)?,
      patient_id:     row.get(1)?,
      titer_result:   row.get(2)?,
      diagnosis_date: row.get(3)?,
      treatments:     row.get(4)?,
      notes:          row.get(5)?,
      created_at:     row.get(6)?,
      updated_at:     row.get(7)?,
    })
  }

  pub fn into_record(self) -> Result<CaseHistoryRecord> {
    Ok(CaseHistoryRecord {
      case_id:        decode_uuid(&self.case_id)?,
      patient_id:     decode_uuid(&self.patient_id)?,
      titer_result:   decode_titer(&self.titer_result)?,
      diagnosis_date: decode_date(&self.diagnosis_date)?,
      treatments:     decode_treatments(&self.treatments)?,
      notes:          self.notes,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     self.updated_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from a `follow_up_tests` row.
pub struct RawFollowUpTest {
  pub test_id:    String,
  pub patient_id: String,
  pub case_id:    Option<String>,
  pub test_date:  String,
  pub test_type:  String,
  pub result:     String,
  pub titer:      Option<String>,
  pub notes:      Option<String>,
  pub created_at: String,
}

impl RawFollowUpTest {
  pub const COLUMNS: &'static str = "test_id, patient_id, case_id, test_date, \
     test_type, result, titer, notes, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      test_id:    row.get(0)?,
      patient_id: row.get(1)?,
      case_id:    row.get(2)?,
      test_date:  row.get(3)?,
      test_type:  row.get(4)?,
      result:     row.get(5)?,
      titer:      row.get(6)?,
      notes:      row.get(7)?,
      created_at: row.get(8)?,
    })
  }

  pub fn into_test(self) -> Result<FollowUpTest> {
    Ok(FollowUpTest {
      test_id:    decode_uuid(&self.test_id)?,
      patient_id: decode_uuid(&self.patient_id)?,
      case_id:    self.case_id.as_deref().map(decode_uuid).transpose()?,
      test_date:  decode_date(&self.test_date)?,
      test_type:  self.test_type,
      result:     decode_reactivity(&self.result)?,
      titer:      self.titer.as_deref().map(decode_titer).transpose()?,
      notes:      self.notes,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
