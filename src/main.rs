use std::net::SocketAddr;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use worklist::config::Config;
use worklist::{AppState, app, database};

#[tokio::main]
async fn main() {
    // Begin logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).unwrap();

    let config = Config::load_or_default("worklist.toml");

    // Create the CORS layer, which essentially sets a guideline that requests must follow
    // Allow GET, POST, PUT, DELETE, and OPTIONS methods
    // Allow Auth and content-type headers
    // Allow requests from any origin
    // Expose the role headers the session layer stamps on each response
    // (of which are used to let the frontend know what to display)
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_origin(AllowOrigin::any())
        .expose_headers([
            CONTENT_TYPE,
            HeaderName::from_lowercase(b"admin").unwrap(),
            HeaderName::from_lowercase(b"teacher").unwrap(),
            HeaderName::from_lowercase(b"student").unwrap(),
        ]);

    // Initialize the database, aborting start-up if an error occurs
    let pool = match database::connect(&config.database_url).await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("{}", e);
            return;
        }
    };

    if let Err(e) = database::init_database(&pool).await {
        tracing::error!("{}", e);
        return;
    }

    info!("Database initialized");

    let state = AppState {
        pool,
        public_url: config.public_url.clone(),
    };

    let app = app(state).layer(cors);

    // Serve the application
    let addr = config.bind_addr.parse::<SocketAddr>().unwrap();
    let server = axum_server::bind(addr);
    server.serve(app.into_make_service()).await.unwrap();
}
