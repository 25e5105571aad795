//! Router-level integration tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use serotrack_store_sqlite::SqliteStore;
use tower::ServiceExt as _;

use crate::api_router;

async fn make_router() -> Router<()> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(store))
}

async fn oneshot_json(
  router: &Router<()>,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> axum::response::Response {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let req = builder.body(body).unwrap();
  router.clone().oneshot(req).await.unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
  let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

// ── Validation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_titer_in_case_body_returns_400_json() {
  let router = make_router().await;

  // 37 is not a power of two, so deserialisation must reject the body
  // before anything reaches storage.
  let resp = oneshot_json(
    &router,
    "POST",
    "/cases",
    Some(json!({
      "patient_id": "00000000-0000-0000-0000-000000000000",
      "titer_result": "1:37",
      "diagnosis_date": "2024-03-01",
    })),
  )
  .await;

  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let ct = resp
    .headers()
    .get(header::CONTENT_TYPE)
    .unwrap()
    .to_str()
    .unwrap()
    .to_owned();
  assert!(ct.starts_with("application/json"), "content-type: {ct}");

  let body = body_json(resp).await;
  assert!(body.get("error").is_some(), "body: {body}");
}

#[tokio::test]
async fn syntactically_broken_body_returns_400_json() {
  let router = make_router().await;

  let req = Request::builder()
    .method("POST")
    .uri("/patients")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{not json"))
    .unwrap();
  let resp = router.clone().oneshot(req).await.unwrap();

  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = body_json(resp).await;
  assert!(body.get("error").is_some(), "body: {body}");
}

// ── Conflicts and not-found ──────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_mrn_returns_409() {
  let router = make_router().await;
  let body = json!({ "medical_record_number": "MRN-001" });

  let first = oneshot_json(&router, "POST", "/patients", Some(body.clone())).await;
  assert_eq!(first.status(), StatusCode::CREATED);

  let second = oneshot_json(&router, "POST", "/patients", Some(body)).await;
  assert_eq!(second.status(), StatusCode::CONFLICT);
  let body = body_json(second).await;
  assert!(body.get("error").is_some(), "body: {body}");
}

#[tokio::test]
async fn summary_for_unknown_patient_returns_404() {
  let router = make_router().await;
  let resp = oneshot_json(
    &router,
    "GET",
    "/patients/00000000-0000-0000-0000-000000000000/summary",
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn intake_create_then_summary_reads_active_infection() {
  let router = make_router().await;

  let resp = oneshot_json(
    &router,
    "POST",
    "/patients",
    Some(json!({
      "medical_record_number": "MRN-002",
      "name": "Jo Example",
      "initial_case": {
        "titer_result": "1:64",
        "diagnosis_date": "2024-03-01",
      },
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let patient = body_json(resp).await;
  let id = patient["patient_id"].as_str().unwrap().to_owned();

  let resp =
    oneshot_json(&router, "GET", &format!("/patients/{id}/summary"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let summary = body_json(resp).await;
  assert_eq!(summary["status"], "active_infection");
  assert_eq!(summary["last_exam_date"], "2024-03-01");
  assert_eq!(summary["history"].as_array().unwrap().len(), 1);
}
