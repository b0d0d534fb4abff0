mod commands;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use commands::{design_update, handle_command};
use futures::{sink::SinkExt, stream::StreamExt};
use laminate_core::config::KernelConfig;
use laminate_core::design::Design;
use laminate_core::layers::{Layer, LayerDefinition};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

// Application State
struct AppState {
    design: Arc<RwLock<Design>>,
}

/// A fresh session starts with a single-layer stack.
fn initial_design(config: KernelConfig) -> Design {
    let def = LayerDefinition::new(vec![Layer::new("default", 1.0, "default")]).unwrap_or_default();
    Design::new("untitled", def).with_config(config)
}

fn load_config() -> KernelConfig {
    match std::env::args().nth(1) {
        Some(path) => match KernelConfig::load(&path) {
            Ok(config) => {
                info!("Loaded kernel config from {}", path);
                config
            }
            Err(e) => {
                warn!("Ignoring config {}: {}", path, e);
                KernelConfig::default()
            }
        },
        None => KernelConfig::default(),
    }
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let shared_state = Arc::new(AppState {
        design: Arc::new(RwLock::new(initial_design(load_config()))),
    });

    let app = Router::new()
        .route("/", get(root))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state);

    let addr_text = std::env::var("LAMINATE_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let addr: SocketAddr = match addr_text.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid LAMINATE_ADDR '{}': {}", addr_text, e);
            return;
        }
    };

    info!("listening on {}", addr);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Cannot bind {}: {}", addr, e);
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server stopped: {}", e);
    }
}

async fn root() -> &'static str {
    "Laminate design service"
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("Client connected");
    let (mut sender, mut receiver) = socket.split();

    let initial = {
        let design = state.design.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        design_update(&design)
    };
    if sender.send(Message::Text(initial)).await.is_err() {
        return;
    }

    while let Some(msg) = receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };
        info!("Received command: {}", text.split(':').next().unwrap_or(""));

        // The lock is held for exactly one command.
        let replies = {
            let mut design = state.design.write().unwrap_or_else(|poisoned| poisoned.into_inner());
            handle_command(&mut design, &text)
        };

        for frame in replies {
            if sender.send(Message::Text(frame)).await.is_err() {
                warn!("Client went away mid-reply");
                return;
            }
        }
    }

    info!("Client disconnected");
}
