//! Handlers for `/cases` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/cases` | `?patient_id` required; newest-first timeline |
//! | `POST` | `/cases` | Body: [`NewCaseHistory`]; returns 201 + record |
//! | `GET`  | `/cases/:id` | Record plus its derived status |
//! | `PATCH` | `/cases/:id` | Partial update via [`CaseHistoryUpdate`] |
//!
//! Responses carry the record's single-reading status alongside the data;
//! status is derived here at read time, never read from storage.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serotrack_core::{
  case::{CaseHistoryUpdate, NewCaseHistory},
  status::classify_reading,
  store::CaseStore,
  summary::CaseHistoryEntry,
};
use uuid::Uuid;

use crate::{error::ApiError, extract::Json};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Required: the patient whose timeline to return.
  pub patient_id: Uuid,
}

/// `GET /cases?patient_id=<id>` — newest first by
/// `(diagnosis_date, created_at)`.
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<CaseHistoryEntry>>, ApiError>
where
  S: CaseStore,
{
  let records = store
    .list_cases(params.patient_id)
    .await
    .map_err(ApiError::from_store)?;

  let timeline = records
    .into_iter()
    .map(|record| {
      let status = classify_reading(&record.titer_result);
      CaseHistoryEntry { record, status }
    })
    .collect();
  Ok(Json(timeline))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /cases` — returns 201 + the stored record. A malformed titer in the
/// body is rejected by deserialisation before anything touches storage.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewCaseHistory>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
{
  let record = store
    .record_case(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /cases/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<CaseHistoryEntry>, ApiError>
where
  S: CaseStore,
{
  let record = store
    .get_case(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("case {id} not found")))?;

  let status = classify_reading(&record.titer_result);
  Ok(Json(CaseHistoryEntry { record, status }))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PATCH /cases/:id` — only fields present in the body change.
pub async fn update_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<CaseHistoryUpdate>,
) -> Result<Json<CaseHistoryEntry>, ApiError>
where
  S: CaseStore,
{
  let record = store
    .update_case(id, body)
    .await
    .map_err(ApiError::from_store)?;

  let status = classify_reading(&record.titer_result);
  Ok(Json(CaseHistoryEntry { record, status }))
}
