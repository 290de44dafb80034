use axum::{Router, routing::get};
use beacon_server::{AppState, RoomRegistry, SignalingService, ws_handler};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{Level, info};

#[derive(Parser)]
#[command(name = "beacon-server", about = "Room signaling server for beacon peers")]
struct Args {
    /// Address to bind the signaling endpoint to.
    #[arg(long, default_value = "0.0.0.0:8083")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let args = Args::parse();

    info!("Initializing signaling server...");

    let service = SignalingService::new();
    let registry = Arc::new(RoomRegistry::new(Arc::new(service.clone())));

    let state = Arc::new(AppState { service, registry });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ws/{user_id}", get(ws_handler))
        .layer(cors)
        .with_state(state);

    info!("Signaling server listening on http://{}", args.addr);

    let listener = tokio::net::TcpListener::bind(args.addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
