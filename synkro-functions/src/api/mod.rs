//! API routes for synkro-functions

pub mod appointment;
pub mod health;
pub mod notification;
pub mod subscription;

use axum::routing::{get, post};
use axum::{Json, Router};
use http::{HeaderName, HeaderValue};
use shared::TenantId;
use shared::models::Barbershop;
use synkro_client::{ClientError, Collection, Filter, RemoteGateway};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::{FunctionError, FunctionResult};
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, FunctionError>;

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The three functions, served both at the root and under `/functions/v1`
fn functions() -> Router<AppState> {
    Router::new()
        .route("/check-subscription", post(subscription::check_subscription))
        .route("/create-notification", post(notification::create_notification))
        .route(
            "/notify-new-appointment",
            post(appointment::notify_new_appointment),
        )
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(functions())
        .nest("/functions/v1", functions())
        // CORS - browsers call the functions directly
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .with_state(state)
}

/// The event's barbershop
pub(crate) async fn fetch_barbershop(
    backend: &dyn RemoteGateway,
    tenant: TenantId,
) -> FunctionResult<Barbershop> {
    let row = backend
        .query(Collection::Barbershops, &Filter::new().eq("id", tenant), None)
        .await?
        .into_iter()
        .next()
        .ok_or(FunctionError::BarbershopNotFound)?;
    Ok(serde_json::from_value(row).map_err(ClientError::from)?)
}
