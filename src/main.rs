// Main entry point - Replays recorded telemetry through the map engine on a headless surface
use std::time::Duration;

use anyhow::Context;
use geo_track_map::application::map_widget::{MapCallbacks, MapWidget};
use geo_track_map::infrastructure::config::load_map_config;
use geo_track_map::infrastructure::replay_feed::ReplayFeed;
use geo_track_map::infrastructure::scene_surface::{SceneSurface, SurfaceOptions};
use geo_track_map::presentation::event_loop::{MapEvent, run_event_loop, spawn_feed};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const DEFAULT_REPLAY_FILE: &str = "data/replay.json";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_map_config().context("Failed to load map configuration")?;
    let replay_file = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("GEOMAP_REPLAY").ok())
        .unwrap_or_else(|| DEFAULT_REPLAY_FILE.to_string());
    let interval_ms = std::env::var("GEOMAP_REPLAY_INTERVAL_MS")
        .ok()
        .and_then(|ms| ms.parse().ok())
        .unwrap_or(0);

    // Surface and widget
    let mut surface = SceneSurface::new(SurfaceOptions::from_config(&config));
    let ready = surface.mark_ready();
    tracing::info!("Using {} surface (ready: {})", config.provider.as_str(), ready);

    let mut widget = MapWidget::from_config(surface, &config);
    widget.set_callbacks(MapCallbacks {
        on_location_click: Box::new(|location| {
            tracing::info!("Location {} clicked (datasource {})", location.index, location.ds_index);
        }),
    });

    // Feed
    let feed = ReplayFeed::load(&replay_file)
        .await?
        .with_interval(Duration::from_millis(interval_ms));
    let (tx, rx) = mpsc::channel(100);
    tx.send(MapEvent::Ready).await.context("Event loop closed before start")?;
    let feed_task = spawn_feed(feed, tx);

    let handled = run_event_loop(&mut widget, rx).await;
    feed_task.await.context("Replay task panicked")??;

    let surface = widget.surface();
    tracing::info!(
        "Replayed {} events: {} locations, {} live markers, {} live routes, {} fits",
        handled,
        widget.locations().len(),
        surface.live_markers(),
        surface.live_polylines(),
        surface.fits().len()
    );
    tracing::info!("Surface mutations: {:?}", surface.counters());

    Ok(())
}
