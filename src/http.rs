use crate::backend::ReservationBackend;
use crate::calendar::{AvailabilityQuery, CalendarProjector};
use crate::catalog::CatalogError;
use crate::configuration::Configuration;
use crate::error::BookingError;
use crate::reservations::ReservationService;
use crate::schedule::{BookingSchedule, SharedClock};
use crate::status::StatusLifecycle;
use crate::types::{BookingConfirmation, BookingRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, Request};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::{Redirect, Response};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Form, Json};
use axum::{
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";
/// Set by the authentication layer in front of this service for signed-in users.
pub const LINKED_IDENTITY_HEADER: &str = "x-user-id";

const BOOKING_RECEIVED: &str = "Booking request received. We'll confirm shortly.";

#[derive(Clone)]
pub struct AppState<B> {
    pub projector: CalendarProjector<B>,
    pub reservations: ReservationService<B>,
    pub lifecycle: StatusLifecycle<B>,
    pub admin_password: Option<Arc<str>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreated {
    pub message: String,
    pub booking: BookingConfirmation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct StatusForm {
    status: String,
    internal_notes: String,
    page: String,
}

pub fn create_app<B: ReservationBackend, C: Configuration>(
    backend: B,
    configuration: C,
    clock: SharedClock,
) -> Result<Router, CatalogError> {
    let schedule = Arc::new(BookingSchedule::from_configuration(&configuration)?);
    let state = AppState {
        projector: CalendarProjector::new(backend.clone(), schedule.clone(), clock.clone()),
        reservations: ReservationService::new(backend.clone(), schedule.clone(), clock.clone()),
        lifecycle: StatusLifecycle::new(backend, schedule, clock),
        admin_password: configuration.admin_password().map(Arc::from),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/api/bookings/availability", get(get_availability::<B>))
        .route("/api/bookings", post(create_booking::<B>));

    let admin = Router::new()
        .route("/admin/bookings/stats", get(get_booking_stats::<B>))
        .route("/admin/bookings/:id", get(get_booking::<B>))
        .route("/admin/bookings/:id/status", post(update_booking_status::<B>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth::<B>,
        ));

    Ok(Router::new()
        .merge(public)
        .merge(admin)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}

async fn admin_auth<B: ReservationBackend>(
    State(state): State<AppState<B>>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let Some(password) = state.admin_password.as_deref() else {
        return Err((
            StatusCode::UNAUTHORIZED,
            "Admin access is not configured".to_string(),
        ));
    };

    match request.headers().get(ADMIN_PASSWORD_HEADER) {
        Some(provided) if provided.as_bytes() == password.as_bytes() => Ok(next.run(request).await),
        Some(_) => Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string())),
        None => Err((StatusCode::UNAUTHORIZED, "Missing credentials".to_string())),
    }
}

/// Storage calls block, keep them off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, BookingError>
where
    F: FnOnce() -> Result<T, BookingError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| BookingError::Storage(format!("blocking task failed: {err}")))?
}

fn status_code(err: &BookingError) -> StatusCode {
    match err {
        BookingError::Validation(_) => StatusCode::BAD_REQUEST,
        BookingError::Conflict(_) => StatusCode::CONFLICT,
        BookingError::NotFound(_) => StatusCode::NOT_FOUND,
        BookingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Storage details are logged, never sent to the client.
fn client_message(err: &BookingError, storage_message: &str) -> String {
    match err {
        BookingError::Validation(validation) => validation.to_string(),
        BookingError::Conflict(_) => {
            "That time has just been taken. Choose a different slot.".to_string()
        }
        BookingError::NotFound(_) => "Booking not found".to_string(),
        BookingError::Storage(detail) => {
            error!(%detail, "{storage_message}");
            storage_message.to_string()
        }
    }
}

fn json_error(err: BookingError, storage_message: &str) -> Response {
    (
        status_code(&err),
        Json(json!({ "error": client_message(&err, storage_message) })),
    )
        .into_response()
}

fn admin_error(err: BookingError) -> (StatusCode, String) {
    (
        status_code(&err),
        client_message(&err, "Failed to update booking"),
    )
}

async fn get_availability<B: ReservationBackend>(
    State(state): State<AppState<B>>,
    Query(query): Query<AvailabilityQuery>,
) -> Response {
    let projector = state.projector.clone();
    let availability = blocking(move || {
        let (start, days) = projector.resolve_window(&query);
        projector.availability(start, days)
    })
    .await;

    match availability {
        Ok(availability) => Json(availability).into_response(),
        Err(err) => json_error(err, "Unable to load availability"),
    }
}

async fn create_booking<B: ReservationBackend>(
    State(state): State<AppState<B>>,
    headers: HeaderMap,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = body else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid request body" })),
        )
            .into_response();
    };
    let linked_user_id = headers
        .get(LINKED_IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(String::from);

    let reservations = state.reservations.clone();
    match blocking(move || reservations.create_reservation(request, linked_user_id)).await {
        Ok(booking) => (
            StatusCode::CREATED,
            Json(BookingCreated {
                message: BOOKING_RECEIVED.to_string(),
                booking,
            }),
        )
            .into_response(),
        Err(err) => json_error(err, "Unable to save booking"),
    }
}

fn parse_id(raw: &str) -> Result<i64, (StatusCode, String)> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid booking ID".to_string()))
}

async fn update_booking_status<B: ReservationBackend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, (StatusCode, String)> {
    let id = parse_id(&id)?;
    let page = form
        .page
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|page| *page > 0);

    let lifecycle = state.lifecycle.clone();
    blocking(move || lifecycle.set_status(id, &form.status, &form.internal_notes))
        .await
        .map_err(admin_error)?;

    Ok(match page {
        Some(page) => Redirect::to(&format!("/admin/bookings?page={page}")),
        None => Redirect::to("/admin/bookings"),
    })
}

async fn get_booking<B: ReservationBackend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let id = parse_id(&id)?;
    let lifecycle = state.lifecycle.clone();
    let view = blocking(move || lifecycle.reservation(id))
        .await
        .map_err(admin_error)?;
    Ok(Json(view))
}

async fn get_booking_stats<B: ReservationBackend>(
    State(state): State<AppState<B>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let lifecycle = state.lifecycle.clone();
    let stats = blocking(move || lifecycle.stats())
        .await
        .map_err(admin_error)?;
    Ok(Json(stats))
}
