use axum::{
    routing::{get, post, MethodRouter},
    Router,
};

use crate::{handlers, middleware, state::AppState};

// Known paths answer unsupported methods with 404 instead of 405.
fn known(methods: MethodRouter<AppState>) -> MethodRouter<AppState> {
    methods.fallback(handlers::route_not_found)
}

pub fn observability_routes() -> Router<AppState> {
    Router::new().route("/metrics", known(get(handlers::metrics_endpoint)))
}

pub fn gateway_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/gateway", known(get(handlers::route_not_found)))
        .route(
            "/v1/gateway/player",
            known(
                get(handlers::get_player_info)
                    .post(handlers::add_player_info)
                    .patch(handlers::update_player_info),
            ),
        )
        .route(
            "/v1/gateway/player/login",
            known(post(handlers::handle_player_login)),
        )
        .route(
            "/v1/gateway/ip",
            known(get(handlers::get_ip_info).post(handlers::add_ip_info)),
        )
        .route(
            "/v1/gateway/session",
            known(get(handlers::get_session_id).post(handlers::update_login_session)),
        )
}

pub fn network_routes() -> Router<AppState> {
    Router::new().route("/v1/network", known(get(handlers::route_not_found)))
}

/// The complete application: every route group, the 404 fallback and the
/// request middleware chain.
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .merge(gateway_routes())
        .merge(network_routes())
        .merge(observability_routes())
        .fallback(handlers::route_not_found);

    middleware::apply(router, state.clone()).with_state(state)
}
