use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use dotenvy::dotenv;
use http::header::{HeaderValue, CACHE_CONTROL};
use std::env;
use std::net::SocketAddr;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use shift_coordinator::database::schema;
use shift_coordinator::events::EventBus;
use shift_coordinator::web::middleware::auth as auth_middleware;
use shift_coordinator::web::routes::{checkin, shifts};
use shift_coordinator::web::{AppConfig, AppState};

#[tokio::main]
async fn main() {
    dotenv().ok();

    // 1. Start logging
    tracing_subscriber::fmt::init();

    // 2. Connect to the database and apply the schema
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = schema::open_pool(&db_url)
        .await
        .expect("Cannot connect to DB");

    let config = AppConfig {
        checkin_base_url: env::var("CHECKIN_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        checkin_token_ttl_hours: env::var("CHECKIN_TOKEN_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8),
    };
    let state = AppState {
        pool,
        events: EventBus::default(),
        config,
    };

    // 3. Protected routes under one middleware layer
    let protected_routes = Router::new()
        .route("/shifts/:shift_id", get(shifts::shift_detail_handler))
        .route("/shifts/:shift_id/roster", get(shifts::roster_handler))
        .route("/shifts/:shift_id/rsvp", post(shifts::rsvp_handler))
        .route("/shifts/:shift_id/cancel", post(shifts::cancel_handler))
        .route(
            "/shifts/:shift_id/attendance",
            post(shifts::attendance_handler),
        )
        .route(
            "/shifts/:shift_id/checkin-token",
            post(checkin::issue_token_handler),
        )
        .route("/checkin/redeem", post(checkin::redeem_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    // 4. Build the whole application
    let app = Router::new()
        // Public: the check-in page probes validity before the user logs in
        .route("/checkin/validate", get(checkin::validate_handler))
        // Protected routes
        .merge(protected_routes)
        // Layers
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        // State
        .with_state(state);

    // 5. Start the server (with fallback port)
    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Cannot parse host/port");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!(
                "⚠️  Could not bind on {}: {}. Trying fallback {}:{}",
                addr,
                e,
                host,
                port + 1
            );
            let fallback: SocketAddr = format!("{}:{}", host, port + 1)
                .parse()
                .expect("Cannot parse fallback address");
            tokio::net::TcpListener::bind(fallback)
                .await
                .expect("Cannot bind on fallback port")
        }
    };

    let bound_addr = listener.local_addr().unwrap();
    println!("🚀 Coordinator running on http://{}", bound_addr);

    axum::serve(listener, app).await.unwrap();
}
