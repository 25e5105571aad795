//! Handlers for `/follow-ups` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/follow-ups` | `?patient_id` required; newest first |
//! | `POST` | `/follow-ups` | Body: [`NewFollowUpTest`]; 201 + stored test |
//! | `GET`  | `/follow-ups/:id` | Test plus its derived status |
//! | `DELETE` | `/follow-ups/:id` | 204 |

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serotrack_core::{
  case::{FollowUpTest, NewFollowUpTest},
  status::{TreatmentStatus, classify_reading},
  store::CaseStore,
};
use uuid::Uuid;

use crate::{error::ApiError, extract::Json};

/// A follow-up test bundled with the status its titer implies on its own.
/// Tests without a dilution read as `Unknown`.
#[derive(Debug, Clone, Serialize)]
pub struct FollowUpDetail {
  pub test:   FollowUpTest,
  pub status: TreatmentStatus,
}

impl FollowUpDetail {
  fn derive(test: FollowUpTest) -> Self {
    let status = test
      .titer
      .as_ref()
      .map(classify_reading)
      .unwrap_or(TreatmentStatus::Unknown);
    Self { test, status }
  }
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Required: the patient whose tests to return.
  pub patient_id: Uuid,
}

/// `GET /follow-ups?patient_id=<id>` — newest first by
/// `(test_date, created_at)`.
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<FollowUpDetail>>, ApiError>
where
  S: CaseStore,
{
  let tests = store
    .list_follow_ups(params.patient_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(tests.into_iter().map(FollowUpDetail::derive).collect()))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /follow-ups` — returns 201 + the stored test.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewFollowUpTest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
{
  if body.test_type.trim().is_empty() {
    return Err(ApiError::Validation("test_type must not be empty".into()));
  }

  let test = store
    .record_follow_up(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(test)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /follow-ups/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<FollowUpDetail>, ApiError>
where
  S: CaseStore,
{
  let test = store
    .get_follow_up(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("follow-up test {id} not found")))?;
  Ok(Json(FollowUpDetail::derive(test)))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /follow-ups/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: CaseStore,
{
  store
    .delete_follow_up(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
