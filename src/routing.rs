//! Application router configuration.

use axum::{Router, middleware, routing::get};
use tower_http::services::ServeDir;

use crate::{
    AppState, endpoints,
    gate::access_gate,
    sign_out::get_sign_out,
    views::{
        get_404_not_found, get_account_page, get_dashboard_page, get_landing_page,
        get_new_transaction_page, get_sign_in_page, get_sign_up_page,
    },
};

/// Return a router with all the app's routes.
///
/// The access gate wraps the whole router, fallback included, so the route
/// policy alone decides what needs a session.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_landing_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::ACCOUNT_VIEW, get(get_account_page))
        .route(endpoints::NEW_TRANSACTION_VIEW, get(get_new_transaction_page))
        .route(endpoints::SIGN_IN_VIEW, get(get_sign_in_page))
        .route(endpoints::SIGN_UP_VIEW, get(get_sign_up_page))
        .route(endpoints::SIGN_OUT, get(get_sign_out))
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn_with_state(state.clone(), access_gate))
        .with_state(state)
}
