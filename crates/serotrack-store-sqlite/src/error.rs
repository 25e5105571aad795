//! Error type for `serotrack-store-sqlite`.

use serotrack_core::store::{StoreError, StoreErrorKind};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] serotrack_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value that should be impossible given the schema and the
  /// encoders, e.g. an unknown reactivity label.
  #[error("corrupt row: {0}")]
  Corrupt(String),

  #[error("patient not found: {0}")]
  PatientNotFound(Uuid),

  #[error("case history not found: {0}")]
  CaseNotFound(Uuid),

  #[error("follow-up test not found: {0}")]
  TestNotFound(Uuid),

  /// Uniqueness conflict on the medical record number.
  #[error("a patient with medical record number {0:?} already exists")]
  DuplicateMrn(String),

  /// Uniqueness conflict on the taxpayer number.
  #[error("a patient with taxpayer number {0:?} already exists")]
  DuplicateTaxpayerNumber(String),
}

impl StoreError for Error {
  fn kind(&self) -> StoreErrorKind {
    match self {
      Self::PatientNotFound(_) | Self::CaseNotFound(_) | Self::TestNotFound(_) => {
        StoreErrorKind::NotFound
      }
      Self::DuplicateMrn(_) | Self::DuplicateTaxpayerNumber(_) => {
        StoreErrorKind::Conflict
      }
      _ => StoreErrorKind::Other,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

