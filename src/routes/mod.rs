pub mod auth;
pub mod candidates;
pub mod health;
pub mod invitations;
pub mod openapi;
pub mod questionnaires;
pub mod settings;
pub mod users;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::middleware::{
    auth::{require_admin, require_bearer_auth, require_manager, require_staff},
    cors::frontend_cors,
    rate_limit::{rps_middleware, RateLimiter},
};
use crate::AppState;

/// The full HTTP surface: `/health` plus everything under `/api/v1`.
pub fn build_router(state: AppState) -> Result<Router> {
    let public_api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route(
            "/questionnaires/token/:token",
            get(questionnaires::get_by_token).post(questionnaires::save_by_token),
        )
        .route(
            "/questionnaires/token/:token/submit",
            post(questionnaires::submit_by_token),
        )
        .layer(from_fn_with_state(
            RateLimiter::new(state.config.public_rps),
            rps_middleware,
        ));

    let signed_in = Router::new()
        .route("/auth/profile", get(auth::profile))
        .route(
            "/users/me/settings",
            get(users::get_my_settings).patch(users::update_my_settings),
        )
        .route_layer(from_fn_with_state(state.clone(), require_bearer_auth));

    let staff = Router::new()
        .route("/candidates", get(candidates::list_candidates))
        .route("/candidates/:id", get(candidates::get_candidate))
        .route("/questionnaires", get(questionnaires::list_questionnaires))
        .route("/questionnaires/:id", get(questionnaires::get_questionnaire))
        .route("/questionnaires/:id/pdf", get(questionnaires::download_pdf))
        .route_layer(from_fn_with_state(state.clone(), require_staff));

    let managers = Router::new()
        .route(
            "/candidates/:id",
            axum::routing::patch(candidates::update_candidate).delete(candidates::delete_candidate),
        )
        .route(
            "/invitations",
            get(invitations::list_invitations).post(invitations::create_invitation),
        )
        .route("/invitations/:id", get(invitations::get_invitation))
        .route("/invitations/:id/resend", post(invitations::resend_invitation))
        .route("/invitations/:id/revoke", post(invitations::revoke_invitation))
        .route_layer(from_fn_with_state(state.clone(), require_manager));

    let admins = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/settings",
            get(settings::get_settings).patch(settings::update_settings),
        )
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let private_api = Router::new()
        .merge(signed_in)
        .merge(staff)
        .merge(managers)
        .merge(admins)
        .layer(from_fn_with_state(
            RateLimiter::new(state.config.api_rps),
            rps_middleware,
        ));

    let api = Router::new()
        .route("/health", get(health::health))
        .route("/openapi.json", get(openapi::openapi_json))
        .merge(public_api)
        .merge(private_api);

    let cors = frontend_cors(&state.config.frontend_url)?;

    Ok(Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}
