use axum::{middleware, Router};
use std::sync::Arc;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use crate::auth::middleware::JwtSecret;
use crate::auth::register;
use crate::packs::routes as pack_routes;
use crate::profile::routes as profile_routes;
use crate::state::AppState;

/// Inject the JWT secret into request extensions so the Claims extractor can find it.
async fn inject_jwt_secret(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    req.extensions_mut()
        .insert(JwtSecret(state.jwt_secret.clone()));
    next.run(req).await
}

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    // Rate limiting: 5 requests per minute per IP on registration
    // Uses PeerIpKeyExtractor which reads from ConnectInfo<SocketAddr>
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(12) // 1 token every 12 seconds = 5 per minute
            .burst_size(5)  // Allow burst of 5
            .finish()
            .expect("Failed to build governor config"),
    );
    let governor_limiter = governor_config.limiter().clone();

    // Spawn background task to clean up rate limiter state
    let limiter_for_cleanup = governor_limiter.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            limiter_for_cleanup.retain_recent();
        }
    });

    let auth_routes = Router::new()
        .route(
            "/api/auth/register",
            axum::routing::post(register::register),
        )
        .layer(GovernorLayer {
            config: governor_config,
        });

    Router::new()
        .merge(auth_routes)
        .route(
            "/api/profile/me",
            axum::routing::get(profile_routes::get_me),
        )
        .route(
            "/api/packs",
            axum::routing::post(pack_routes::upload_pack)
                .get(pack_routes::list_packs)
                // Raise axum's default 2 MB body limit to the configured
                // pack size cap; the handler enforces the exact limit.
                .layer(axum::extract::DefaultBodyLimit::max(
                    state.max_upload_size_mb as usize * 1024 * 1024 + 1024,
                )),
        )
        .route(
            "/api/packs/{id}/download",
            axum::routing::get(pack_routes::download_pack),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            inject_jwt_secret,
        ))
        .with_state(state)
}
