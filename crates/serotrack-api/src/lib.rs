//! JSON REST API for the Serotrack case register.
//!
//! Exposes an axum [`Router`] backed by any
//! [`serotrack_core::store::CaseStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", serotrack_api::api_router(store.clone()))
//! ```

pub mod cases;
pub mod error;
pub mod extract;
pub mod follow_ups;
pub mod patients;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{Router, routing::get};
use serotrack_core::store::CaseStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CaseStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Patients
    .route(
      "/patients",
      get(patients::list::<S>).post(patients::create::<S>),
    )
    .route(
      "/patients/{id}",
      get(patients::get_one::<S>)
        .patch(patients::update_one::<S>)
        .delete(patients::delete_one::<S>),
    )
    .route("/patients/{id}/summary", get(patients::summary::<S>))
    // Case histories
    .route("/cases", get(cases::list::<S>).post(cases::create::<S>))
    .route(
      "/cases/{id}",
      get(cases::get_one::<S>).patch(cases::update_one::<S>),
    )
    // Follow-up tests
    .route(
      "/follow-ups",
      get(follow_ups::list::<S>).post(follow_ups::create::<S>),
    )
    .route(
      "/follow-ups/{id}",
      get(follow_ups::get_one::<S>).delete(follow_ups::delete_one::<S>),
    )
    .with_state(store)
}
