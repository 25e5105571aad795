//! Handlers for `/patients` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/patients` | Summary rows; optional `?mrn=` exact match |
//! | `POST` | `/patients` | Body: [`NewPatient`]; 409 on duplicate MRN |
//! | `GET`  | `/patients/:id` | Patient record; 404 if not found |
//! | `PATCH` | `/patients/:id` | Partial update via [`PatientUpdate`] |
//! | `DELETE` | `/patients/:id` | 204; cascades to cases and follow-ups |
//! | `GET`  | `/patients/:id/summary` | Derived [`PatientSummary`] |

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serotrack_core::{
  patient::{NewPatient, Patient, PatientUpdate},
  store::CaseStore,
  summary::{PatientSummary, summarize},
};
use uuid::Uuid;

use crate::{error::ApiError, extract::Json};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Exact-match filter on the medical record number.
  pub mrn: Option<String>,
}

/// `GET /patients[?mrn=<mrn>]` — one derived summary row per patient.
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<PatientSummary>>, ApiError>
where
  S: CaseStore,
{
  let patients = match params.mrn {
    Some(mrn) => store
      .find_patient_by_mrn(&mrn)
      .await
      .map_err(ApiError::from_store)?
      .into_iter()
      .collect(),
    None => store.list_patients().await.map_err(ApiError::from_store)?,
  };

  let mut rows = Vec::with_capacity(patients.len());
  for patient in &patients {
    let records = store
      .list_cases(patient.patient_id)
      .await
      .map_err(ApiError::from_store)?;
    rows.push(summarize(patient, &records));
  }
  Ok(Json(rows))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /patients` — body: [`NewPatient`] (optionally with an intake case).
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewPatient>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
{
  if body.medical_record_number.trim().is_empty() {
    return Err(ApiError::Validation(
      "medical_record_number must not be empty".into(),
    ));
  }

  let patient = store
    .create_patient(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(patient)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /patients/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Patient>, ApiError>
where
  S: CaseStore,
{
  let patient = store
    .get_patient(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("patient {id} not found")))?;
  Ok(Json(patient))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PATCH /patients/:id` — only fields present in the body change.
pub async fn update_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<PatientUpdate>,
) -> Result<Json<Patient>, ApiError>
where
  S: CaseStore,
{
  let patient = store
    .update_patient(id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(patient))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /patients/:id` — removes the patient and everything it owns.
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: CaseStore,
{
  store
    .delete_patient(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// `GET /patients/:id/summary` — the aggregator's derived read model.
pub async fn summary<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<PatientSummary>, ApiError>
where
  S: CaseStore,
{
  let patient = store
    .get_patient(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("patient {id} not found")))?;

  let records = store
    .list_cases(id)
    .await
    .map_err(ApiError::from_store)?;

  Ok(Json(summarize(&patient, &records)))
}
