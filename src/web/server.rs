use axum::{routing::delete, routing::get, routing::post, routing::put, Router};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::Config;
use crate::connectivity::SimulatedNetwork;
use crate::controller::{Controller, ControllerStatus, WallClock};
use crate::position::{FixSource, ReplaySource};
use crate::store::YamlFileStore;
use crate::track::DiskFs;

use super::api::control as control_handlers;
use super::api::tracks as track_handlers;
use super::api_doc::ApiDoc;
use super::state::AppState;

type LiveController = Controller<DiskFs, YamlFileStore, SimulatedNetwork>;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/home", post(control_handlers::set_home))
        .route("/api/tracking/toggle", post(control_handlers::toggle_tracking))
        .route(
            "/api/tracking/auto/toggle",
            post(control_handlers::toggle_auto_tracking),
        )
        .route("/api/credentials", put(control_handlers::update_credentials))
        .route("/api/status", get(control_handlers::status))
        .route("/api/session", get(control_handlers::session))
        .route("/api/connectivity", get(control_handlers::connectivity))
        .route("/api/tracks", get(track_handlers::list))
        .route("/api/tracks/{name}", delete(track_handlers::delete))
        .route(
            "/api-doc/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the control loop on its own task and serves the HTTP API until
/// ctrl-c, then closes any open track.
pub async fn run_server(config: Config, source: ReplaySource) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();
    let interval = config.control.cycle_interval;
    let tracks_dir = config.tracking.tracks_dir.clone();
    std::fs::create_dir_all(&tracks_dir)?;

    let store = YamlFileStore::open(config.store.path.clone())
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let controller = Controller::new(
        config.tracking_policy(),
        config.connectivity_policy(),
        DiskFs::new(tracks_dir.clone()),
        store,
        SimulatedNetwork::new(
            config.simulation.client_reachable,
            config.simulation.connect_delay,
        ),
        WallClock::System,
        Instant::now(),
    );

    let status = Arc::new(Mutex::new(controller.status(Instant::now())));
    let state = AppState {
        commands: controller.commands(),
        status: status.clone(),
        tracks: Arc::new(DiskFs::new(tracks_dir)),
    };

    let (stop_tx, stop_rx) = oneshot::channel();
    let control = tokio::spawn(control_loop(controller, source, interval, status, stop_rx));

    log::info!("Starting server on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for ctrl-c: {}", e);
            }
            log::info!("Shutting down");
        })
        .await;

    let _ = stop_tx.send(());
    if let Err(e) = control.await {
        log::error!("Control loop panicked: {}", e);
    }
    served
}

async fn control_loop(
    mut controller: LiveController,
    mut source: ReplaySource,
    period: Duration,
    status: Arc<Mutex<ControllerStatus>>,
    mut stop: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut announced_end = false;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                let fix = source.poll(now);
                controller.cycle(now, fix);
                *status.lock().unwrap() = controller.status(now);
                if source.exhausted() && !announced_end {
                    log::info!("Fix log exhausted, holding last position");
                    announced_end = true;
                }
            }
            _ = &mut stop => break,
        }
    }
    controller.shutdown();
}
