// Event loop - runs host events against the map widget, one at a time
use crate::application::feed::{FeedEvent, SnapshotFeed};
use crate::application::map_surface::MapSurface;
use crate::application::map_widget::MapWidget;
use crate::application::pattern::PatternProvider;
use crate::domain::snapshot::SampleSnapshot;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The map provider finished initializing.
    Ready,
    /// The subscription delivered new samples.
    Refresh(SampleSnapshot),
    /// The viewport changed size.
    Resize,
}

impl From<FeedEvent> for MapEvent {
    fn from(event: FeedEvent) -> Self {
        match event {
            FeedEvent::Data(snapshot) => MapEvent::Refresh(snapshot),
            FeedEvent::Resize => MapEvent::Resize,
        }
    }
}

/// Drain `events` into the widget until every sender is dropped. Each event
/// runs to completion before the next is received. Returns the number of
/// events handled.
pub async fn run_event_loop<S: MapSurface, P: PatternProvider>(
    widget: &mut MapWidget<S, P>,
    mut events: mpsc::Receiver<MapEvent>,
) -> usize {
    let mut handled = 0;
    while let Some(event) = events.recv().await {
        match event {
            MapEvent::Ready => widget.on_map_ready(),
            MapEvent::Refresh(snapshot) => widget.on_data_updated(snapshot),
            MapEvent::Resize => widget.resize(),
        }
        handled += 1;
    }
    tracing::debug!("Event loop finished after {} events", handled);
    handled
}

/// Forward every event of `feed` into the channel on a background task.
pub fn spawn_feed<F>(mut feed: F, tx: mpsc::Sender<MapEvent>) -> JoinHandle<anyhow::Result<()>>
where
    F: SnapshotFeed + 'static,
{
    tokio::spawn(async move {
        while let Some(event) = feed.next_event().await? {
            if tx.send(event.into()).await.is_err() {
                tracing::debug!("Event loop closed, stopping feed");
                break;
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::{DataColumn, DataKey, Datasource};
    use crate::domain::telemetry::TimeSeriesPoint;
    use crate::infrastructure::config::MapWidgetConfig;
    use crate::infrastructure::replay_feed::ReplayFeed;
    use crate::infrastructure::scene_surface::{SceneSurface, SurfaceOptions};

    fn snapshot(lat: f64, lng: f64) -> SampleSnapshot {
        SampleSnapshot::new(
            vec![Datasource::new("Fleet", "Truck 1")],
            vec![
                DataColumn::new(0, DataKey::new("latitude"), vec![TimeSeriesPoint::new(0, lat)]),
                DataColumn::new(0, DataKey::new("longitude"), vec![TimeSeriesPoint::new(0, lng)]),
            ],
        )
    }

    fn widget() -> MapWidget<SceneSurface> {
        let config = MapWidgetConfig::default();
        let mut surface = SceneSurface::new(SurfaceOptions::from_config(&config));
        surface.mark_ready();
        MapWidget::from_config(surface, &config)
    }

    #[tokio::test]
    async fn test_events_run_in_order() {
        let mut widget = widget();
        let (tx, rx) = mpsc::channel(8);
        tx.send(MapEvent::Refresh(snapshot(10.0, 20.0))).await.unwrap();
        tx.send(MapEvent::Refresh(snapshot(10.0, 20.0))).await.unwrap();
        tx.send(MapEvent::Refresh(snapshot(11.0, 21.0))).await.unwrap();
        tx.send(MapEvent::Resize).await.unwrap();
        drop(tx);

        assert_eq!(run_event_loop(&mut widget, rx).await, 4);
        let counters = widget.surface().counters();
        assert_eq!(counters.markers_created, 1);
        assert_eq!(counters.marker_moves, 1);
        assert_eq!(counters.size_invalidations, 1);
        // Initial load, the move and the resize.
        assert_eq!(counters.fits, 3);
    }

    #[tokio::test]
    async fn test_feed_drives_widget() {
        let frames = r#"[
            { "datasources": [{ "name": "Fleet", "entity_name": "Truck 1" }],
              "columns": [
                { "datasource": 0, "key": "latitude", "samples": [[0, 10.0]] },
                { "datasource": 0, "key": "longitude", "samples": [[0, 20.0]] }
              ] },
            { "resize": true }
        ]"#;
        let feed = ReplayFeed::from_json(frames).unwrap();
        let mut widget = widget();
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_feed(feed, tx);

        assert_eq!(run_event_loop(&mut widget, rx).await, 2);
        handle.await.unwrap().unwrap();
        assert_eq!(widget.locations().len(), 1);
        assert_eq!(widget.surface().counters().size_invalidations, 1);
    }
}
