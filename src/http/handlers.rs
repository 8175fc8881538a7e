//! Endpoint handlers.
//!
//! | route            | method | success body             |
//! |------------------|--------|--------------------------|
//! | `/hash`          | POST   | decimal submission id    |
//! | `/hash/{id}`     | GET    | stored digest            |
//! | `/stats`         | GET    | `{"total":N,"average":M}`|
//! | `/shutdown`      | any    | empty, 200               |

use axum::{
    extract::{rejection::FormRejection, Request, State},
    http::{Method, StatusCode, Uri},
    middleware::Next,
    response::Response,
    Form, Json,
};
use serde::Deserialize;

use crate::error::{ServiceError, ServiceResult};
use crate::http::server::AppState;
use crate::lifecycle::tracker::{WorkKind, WorkTracker};
use crate::observability::stats::StatsSnapshot;

/// Form body of `POST /hash`, kept as raw pairs so a repeated field is not
/// a decode error.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct SubmitForm(Vec<(String, String)>);

impl SubmitForm {
    /// First `password` value, empty when absent.
    pub fn password(self) -> String {
        self.0
            .into_iter()
            .find(|(key, _)| key == "password")
            .map(|(_, value)| value)
            .unwrap_or_default()
    }
}

pub async fn submit_hash(
    State(state): State<AppState>,
    form: Result<Form<SubmitForm>, FormRejection>,
) -> ServiceResult<String> {
    let password = match form {
        Ok(Form(form)) => form.password(),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable form body");
            String::new()
        }
    };

    let id = state.hashing.submit(&password)?;
    tracing::debug!(job_id = %id, "Submission accepted");
    Ok(id.to_string())
}

pub async fn retrieve_hash(State(state): State<AppState>, uri: Uri) -> ServiceResult<String> {
    state.hashing.retrieve_path(uri.path())
}

pub async fn hash_method_not_supported(
    State(state): State<AppState>,
    method: Method,
) -> ServiceError {
    state.hashing.reject_method(method)
}

pub async fn get_stats(State(state): State<AppState>) -> ServiceResult<Json<StatsSnapshot>> {
    state.stats.report().map(Json)
}

pub async fn stats_method_not_supported(
    State(state): State<AppState>,
    method: Method,
) -> ServiceError {
    state.stats.reject_method(method)
}

/// Disable the service, then answer without waiting for the drain.
pub async fn trigger_shutdown(State(state): State<AppState>) -> StatusCode {
    tracing::info!("Shutdown requested");
    let coordinator = state.coordinator.clone();
    coordinator.disable_all();
    tokio::spawn(async move {
        coordinator.shutdown().await;
    });
    StatusCode::OK
}

/// Count the wrapped request as outstanding work until its response is ready.
pub async fn track_in_flight(
    State(tracker): State<WorkTracker>,
    request: Request,
    next: Next,
) -> Response {
    let _guard = tracker.track(WorkKind::Request);
    next.run(request).await
}
