//! Request-scoped middleware
//!
//! Every route is wrapped, outermost first, in:
//!
//! 1. request-id tagging (`X-Request-Id`, kept when the client sent one)
//! 2. access logging, which buffers the body so handlers can still read it
//! 3. panic recovery, turning a handler panic into a 500

use std::any::Any;
use std::net::{IpAddr, SocketAddr};
use std::time::Instant;

use axum::{
    body::Body,
    extract::{connect_info::ConnectInfo, MatchedPath, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use rand::{distributions::Alphanumeric, Rng};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
};

use crate::{error::ApiError, state::AppState};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const REQUEST_ID_LENGTH: usize = 24;

/// Random `[A-Za-z0-9]{24}` request ids
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeAlphanumericRequestId;

impl MakeRequestId for MakeAlphanumericRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&generate_request_id())
            .ok()
            .map(RequestId::new)
    }
}

pub fn generate_request_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REQUEST_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Wrap every route of `router` in the middleware chain.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(
                request_id.clone(),
                MakeAlphanumericRequestId,
            ))
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(middleware::from_fn_with_state(state, access_log))
            .layer(CatchPanicLayer::custom(handle_panic)),
    )
}

pub async fn access_log(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = extract_client_ip(&request);
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(request_id = %request_id, error = %err, "failed to buffer request body");
            return ApiError::internal("Failed to read request body").into_response();
        }
    };
    let request = Request::from_parts(parts, Body::from(body.clone()));

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();

    tracing::info!(
        latency_ms = elapsed.as_secs_f64() * 1000.0,
        request_id = %request_id,
        client_ip = %client_ip,
        method = %method,
        uri = %uri,
        status,
        body = %String::from_utf8_lossy(&body),
        "request completed"
    );
    state
        .metrics
        .observe_http(method.as_str(), &path, status, elapsed.as_secs_f64());

    response
}

pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };

    tracing::error!(panic = detail, "handler panicked");
    ApiError::internal("An unexpected error occurred").into_response()
}

fn extract_client_ip<B>(request: &axum::http::Request<B>) -> String {
    if let Some(ip) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(parse_x_forwarded_for)
    {
        return ip.to_string();
    }

    if let Some(ip) = request
        .headers()
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .and_then(parse_ip_addr)
    {
        return ip.to_string();
    }

    if let Some(connect_info) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return connect_info.0.ip().to_string();
    }

    "unknown".to_string()
}

fn parse_x_forwarded_for(raw: &str) -> Option<IpAddr> {
    raw.split(',').map(str::trim).find_map(parse_ip_addr)
}

fn parse_ip_addr(raw: &str) -> Option<IpAddr> {
    raw.trim().parse().ok()
}
