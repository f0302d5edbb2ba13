pub mod schedule;
pub mod students;

use axum::handler::Handler;
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;

use crate::err::{handler404, Error};
use crate::gateway::SharedGateway;
use crate::models::RecordId;

/// JSON answer with an explicit status code.
pub type Payload<T> = Result<(StatusCode, Json<T>), Error>;

/// Plain-text confirmation.
pub type Notice = Result<String, Error>;

pub fn proceeds<V>(value: V) -> Payload<V>
where
    V: Serialize,
{
    Ok((StatusCode::OK, Json(value)))
}

pub fn created<V>(value: V) -> Payload<V>
where
    V: Serialize,
{
    Ok((StatusCode::CREATED, Json(value)))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulePolicy {
    /// When false, `POST /schedule` needs at least one class.
    pub allow_empty: bool,
}

pub fn router(gateway: SharedGateway, policy: SchedulePolicy) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/students", get(students::list).post(students::create))
        .route(
            "/students/:id",
            get(students::get_by_id)
                .put(students::update_by_id)
                .delete(students::delete_by_id),
        )
        .route("/schedule", get(schedule::list).post(schedule::create))
        .route(
            "/schedule/:id",
            get(schedule::get_by_id)
                .put(schedule::update_by_id)
                .delete(schedule::delete_by_id),
        )
        .fallback(handler404.into_service())
        .layer(middleware::from_fn(access_log))
        .layer(Extension(gateway))
        .layer(Extension(policy))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Logs one line per request and turns the router's bare 405 into the
/// JSON error body every other failure uses.
async fn access_log<B>(req: Request<B>, next: Next<B>) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let mut response = next.run(req).await;
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        response = Error::MethodNotAllowed {
            message: format!("Invalid request method {} for {}", method, path),
        }
        .into_response();
    }

    log::info!(
        "{} {} -> {} in {:?}",
        method,
        path,
        response.status(),
        started.elapsed()
    );
    response
}

pub(crate) fn decode<T>(body: &[u8]) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    serde_json::from_slice(body).map_err(|err| Error::malformed(format!("Invalid JSON: {}", err)))
}

pub(crate) fn parse_id(raw: &str) -> Result<RecordId, Error> {
    raw.parse()
}
