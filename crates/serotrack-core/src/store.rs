//! The `CaseStore` trait.
//!
//! Implemented by storage backends (e.g. `serotrack-store-sqlite`). Higher
//! layers (`serotrack-api`, the server binary) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  case::{
    CaseHistoryRecord, CaseHistoryUpdate, FollowUpTest, NewCaseHistory,
    NewFollowUpTest,
  },
  patient::{NewPatient, Patient, PatientUpdate},
};

// ─── Error classification ────────────────────────────────────────────────────

/// Coarse classification of a backend error, used by callers (e.g. the HTTP
/// layer) to distinguish not-found and conflict outcomes from generic
/// storage failures without depending on a concrete backend's error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
  /// A referenced patient/case/test does not exist.
  NotFound,
  /// A uniqueness constraint (MRN, taxpayer number) was violated.
  Conflict,
  /// Anything else: transient backend failure, corrupt row, etc.
  Other,
}

/// Implemented by backend error types so their taxonomy survives the
/// [`CaseStore`] abstraction.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> StoreErrorKind;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a case-register storage backend.
///
/// Writes are plain CRUD; there is no status column to keep consistent,
/// because clinical status is always derived at read time by the core.
/// Uniqueness violations (MRN, taxpayer number) surface as distinct conflict
/// errors, never as generic storage failures.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CaseStore: Send + Sync {
  type Error: StoreError;

  // ── Patients ──────────────────────────────────────────────────────────

  /// Create and persist a new patient; when `input.initial_case` is set,
  /// the intake case history is recorded in the same transaction.
  ///
  /// Errors with a conflict if the MRN or taxpayer number is taken.
  fn create_patient(
    &self,
    input: NewPatient,
  ) -> impl Future<Output = Result<Patient, Self::Error>> + Send + '_;

  /// Retrieve a patient by UUID. Returns `None` if not found.
  fn get_patient(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Patient>, Self::Error>> + Send + '_;

  /// Look up a patient by medical record number.
  fn find_patient_by_mrn<'a>(
    &'a self,
    mrn: &'a str,
  ) -> impl Future<Output = Result<Option<Patient>, Self::Error>> + Send + 'a;

  /// List all patients, ordered by creation time.
  fn list_patients(
    &self,
  ) -> impl Future<Output = Result<Vec<Patient>, Self::Error>> + Send + '_;

  /// Partial update: only fields present in `update` change. Uniqueness of
  /// MRN and taxpayer number is re-checked when either changes.
  fn update_patient(
    &self,
    id: Uuid,
    update: PatientUpdate,
  ) -> impl Future<Output = Result<Patient, Self::Error>> + Send + '_;

  /// Delete a patient and, in the same transaction, every case history and
  /// follow-up test the patient owns.
  fn delete_patient(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Case histories ────────────────────────────────────────────────────

  /// Record a case history entry. The patient must exist.
  fn record_case(
    &self,
    input: NewCaseHistory,
  ) -> impl Future<Output = Result<CaseHistoryRecord, Self::Error>> + Send + '_;

  /// Retrieve a single case history record.
  fn get_case(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<CaseHistoryRecord>, Self::Error>> + Send + '_;

  /// All case history records for a patient, newest first by
  /// `(diagnosis_date, created_at)`.
  fn list_cases(
    &self,
    patient_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CaseHistoryRecord>, Self::Error>> + Send + '_;

  /// Partial update: only fields present in `update` change. Stamps
  /// `updated_at`.
  fn update_case(
    &self,
    id: Uuid,
    update: CaseHistoryUpdate,
  ) -> impl Future<Output = Result<CaseHistoryRecord, Self::Error>> + Send + '_;

  // ── Follow-up tests ───────────────────────────────────────────────────

  /// Record a follow-up lab test. The patient (and case, when given) must
  /// exist.
  fn record_follow_up(
    &self,
    input: NewFollowUpTest,
  ) -> impl Future<Output = Result<FollowUpTest, Self::Error>> + Send + '_;

  /// Retrieve a single follow-up test.
  fn get_follow_up(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<FollowUpTest>, Self::Error>> + Send + '_;

  /// All follow-up tests for a patient, newest first by
  /// `(test_date, created_at)`.
  fn list_follow_ups(
    &self,
    patient_id: Uuid,
  ) -> impl Future<Output = Result<Vec<FollowUpTest>, Self::Error>> + Send + '_;

  /// Delete a single follow-up test.
  fn delete_follow_up(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
