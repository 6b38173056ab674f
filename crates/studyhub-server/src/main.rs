use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use studyhub_api::auth::{self, AppState, AppStateInner};
use studyhub_api::middleware::require_auth;
use studyhub_api::{comments, elements, feed, files, groups, search, tabs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studyhub=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("STUDYHUB_JWT_SECRET").unwrap_or_else(|_| "studyhub-dev-secret".into());
    let db_path = std::env::var("STUDYHUB_DB_PATH").unwrap_or_else(|_| "studyhub.db".into());
    let upload_dir = std::env::var("STUDYHUB_UPLOAD_DIR").unwrap_or_else(|_| "uploads".into());
    let host = std::env::var("STUDYHUB_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("STUDYHUB_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = studyhub_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        upload_dir: PathBuf::from(upload_dir),
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/feed", get(feed::get_feed))
        .route("/groups", get(groups::my_groups))
        .route("/groups", post(groups::create_group))
        .route("/groups/search", get(search::search_groups))
        .route("/groups/{group_id}", get(groups::group_detail))
        .route("/groups/{group_id}", put(groups::update_group))
        .route("/groups/{group_id}", delete(groups::delete_group))
        .route("/groups/{group_id}/join", post(groups::join_group))
        .route("/groups/{group_id}/leave", post(groups::leave_group))
        .route("/groups/{group_id}/tabs", post(tabs::create_tab))
        .route("/tabs/{tab_id}", get(tabs::tab_detail))
        .route("/tabs/{tab_id}", put(tabs::update_tab))
        .route("/tabs/{tab_id}", delete(tabs::delete_tab))
        .route("/tabs/{tab_id}/elements", post(elements::create_element))
        .route("/elements/{element_id}", get(elements::element_detail))
        .route("/elements/{element_id}", put(elements::update_element))
        .route("/elements/{element_id}", delete(elements::delete_element))
        .route("/elements/{element_id}/comments", post(comments::create_comment))
        .route("/comments/{comment_id}", delete(comments::delete_comment))
        .route("/files", post(files::upload_file))
        .route("/files/{file_id}", get(files::download_file))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("studyhub listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
