// Location reconciler - turns samples into marker/route geometry, mutating the surface only on change
use crate::application::location::{Location, Visual};
use crate::application::map_surface::{ClickHandler, MapSurface};
use crate::domain::geo::LatLng;
use crate::domain::snapshot::{DataColumn, SampleSnapshot};

/// Position from the last sample of each coordinate series.
pub fn latest_position<S: MapSurface>(surface: &S, lat: &DataColumn, lng: &DataColumn) -> Option<LatLng> {
    let lat = lat.latest()?.as_f64()?;
    let lng = lng.latest()?.as_f64()?;
    Some(surface.create_lat_lng(lat, lng))
}

/// Chronological path through the coordinate series, walked pairwise.
/// Consecutive duplicates are collapsed so the path has no zero-length
/// segments.
pub fn route_points<S: MapSurface>(surface: &S, lat: &DataColumn, lng: &DataColumn) -> Vec<LatLng> {
    let mut points: Vec<LatLng> = Vec::with_capacity(lat.data.len().min(lng.data.len()));
    for (lat, lng) in lat.data.iter().zip(&lng.data) {
        let (Some(lat), Some(lng)) = (lat.value.as_f64(), lng.value.as_f64()) else {
            continue;
        };
        let point = surface.create_lat_lng(lat, lng);
        if points.last() != Some(&point) {
            points.push(point);
        }
    }
    points
}

fn move_marker<S: MapSurface>(surface: &mut S, marker: &S::Marker, position: LatLng) -> bool {
    if surface.marker_position(marker) == position {
        return false;
    }
    surface.set_marker_position(marker, position);
    true
}

fn reconcile_point<S: MapSurface>(
    surface: &mut S,
    location: &mut Location<S::Marker, S::Polyline>,
    position: LatLng,
    on_click: impl FnOnce() -> ClickHandler,
) -> bool {
    if let Some(marker) = location.visual.marker() {
        return move_marker(surface, marker, position);
    }

    let marker = surface.create_marker(position, &location.style, on_click());
    location.visual = Visual::Point { marker };
    true
}

fn reconcile_route<S: MapSurface>(
    surface: &mut S,
    location: &mut Location<S::Marker, S::Polyline>,
    points: Vec<LatLng>,
    on_click: impl FnOnce() -> ClickHandler,
) -> bool {
    let Some(head) = points.last().copied() else {
        return false;
    };

    if matches!(location.visual, Visual::Uninitialized) {
        let marker = surface.create_marker(head, &location.style, on_click());
        let path = surface.create_polyline(&points, &location.style);
        location.visual = Visual::Route { marker, path };
        return true;
    }

    match &location.visual {
        Visual::Route { marker, path } => {
            let mut changed = move_marker(surface, marker, head);
            if surface.polyline_lat_lngs(path) != points {
                surface.set_polyline_lat_lngs(path, &points);
                changed = true;
            }
            changed
        }
        Visual::Point { marker } => move_marker(surface, marker, head),
        Visual::Uninitialized => false,
    }
}

/// Reconcile one Location's geometry against the snapshot. Returns true
/// when the drawn geometry changed. Locations whose coordinate series are
/// missing or empty are skipped.
pub fn reconcile_location<S: MapSurface>(
    surface: &mut S,
    location: &mut Location<S::Marker, S::Polyline>,
    snapshot: &SampleSnapshot,
    draw_routes: bool,
    on_click: impl FnOnce() -> ClickHandler,
) -> bool {
    let (Some(lat), Some(lng)) = (snapshot.column(location.lat_index), snapshot.column(location.lng_index)) else {
        return false;
    };
    if lat.data.is_empty() || lng.data.is_empty() {
        return false;
    }

    if draw_routes {
        let points = route_points(surface, lat, lng);
        reconcile_route(surface, location, points, on_click)
    } else {
        match latest_position(surface, lat, lng) {
            Some(position) => reconcile_point(surface, location, position, on_click),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::location::LocationStyle;
    use crate::application::location_index::CoordinatePair;
    use crate::application::style::StyleConfig;
    use crate::domain::snapshot::{DataKey, Datasource};
    use crate::domain::telemetry::TimeSeriesPoint;
    use crate::infrastructure::config::MapWidgetConfig;
    use crate::infrastructure::rules::RuleEngine;
    use crate::infrastructure::scene_surface::{
        MarkerId, MutationCounters, PolylineId, SceneSurface, SurfaceOptions,
    };
    use std::rc::Rc;

    fn series(values: &[f64]) -> Vec<TimeSeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| TimeSeriesPoint::new(i as i64 * 1000, *v))
            .collect()
    }

    fn snapshot(lat: &[f64], lng: &[f64]) -> SampleSnapshot {
        SampleSnapshot::new(
            vec![Datasource::new("Fleet", "Truck 1")],
            vec![
                DataColumn::new(0, DataKey::new("latitude"), series(lat)),
                DataColumn::new(0, DataKey::new("longitude"), series(lng)),
            ],
        )
    }

    fn setup(draw_routes: bool) -> (SceneSurface, Location<MarkerId, PolylineId>) {
        let config = MapWidgetConfig {
            draw_routes,
            ..Default::default()
        };
        let style = LocationStyle {
            config: Rc::new(StyleConfig::from_config(&config, &RuleEngine::new())),
            label: "Truck 1".to_string(),
            label_info: Default::default(),
            tooltip_pattern: String::new(),
            tooltip_info: Default::default(),
        };
        let mut surface = SceneSurface::new(SurfaceOptions::from_config(&config));
        surface.mark_ready();
        let pair = CoordinatePair { lat_index: 0, lng_index: 1, ds_ordinal: 0, datasource: 0 };
        (surface, Location::new(0, &pair, style))
    }

    fn reconcile(
        surface: &mut SceneSurface,
        location: &mut Location<MarkerId, PolylineId>,
        snap: &SampleSnapshot,
        routes: bool,
    ) -> bool {
        reconcile_location(surface, location, snap, routes, || Box::new(|| {}))
    }

    #[test]
    fn test_point_marker_created_at_last_sample() {
        let (mut surface, mut location) = setup(false);
        let snap = snapshot(&[1.0, 10.0], &[2.0, 20.0]);

        assert!(reconcile(&mut surface, &mut location, &snap, false));
        let marker = location.visual.marker().copied().unwrap();
        assert_eq!(surface.marker_position(&marker), LatLng::new(10.0, 20.0));
        assert_eq!(surface.counters().markers_created, 1);
    }

    #[test]
    fn test_point_reconcile_is_idempotent() {
        let (mut surface, mut location) = setup(false);
        let snap = snapshot(&[10.0], &[20.0]);

        assert!(reconcile(&mut surface, &mut location, &snap, false));
        surface.reset_counters();

        assert!(!reconcile(&mut surface, &mut location, &snap, false));
        assert_eq!(surface.counters().geometry(), 0);
    }

    #[test]
    fn test_point_moves_only_on_change() {
        let (mut surface, mut location) = setup(false);
        reconcile(&mut surface, &mut location, &snapshot(&[10.0], &[20.0]), false);

        assert!(reconcile(&mut surface, &mut location, &snapshot(&[10.0, 11.0], &[20.0, 21.0]), false));
        assert_eq!(surface.counters().marker_moves, 1);
        let marker = location.visual.marker().copied().unwrap();
        assert_eq!(surface.marker_position(&marker), LatLng::new(11.0, 21.0));
    }

    #[test]
    fn test_empty_series_is_skipped() {
        let (mut surface, mut location) = setup(false);
        assert!(!reconcile(&mut surface, &mut location, &snapshot(&[], &[20.0]), false));
        assert!(matches!(location.visual, Visual::Uninitialized));
        assert_eq!(surface.counters(), MutationCounters::default());
    }

    #[test]
    fn test_route_collapses_consecutive_duplicates() {
        let (mut surface, mut location) = setup(true);
        let snap = snapshot(&[1.0, 1.0, 2.0], &[1.0, 1.0, 2.0]);

        assert!(reconcile(&mut surface, &mut location, &snap, true));
        let Visual::Route { marker, path } = &location.visual else {
            panic!("expected route visual");
        };
        assert_eq!(
            surface.polyline_lat_lngs(path),
            vec![LatLng::new(1.0, 1.0), LatLng::new(2.0, 2.0)]
        );
        assert_eq!(surface.marker_position(marker), LatLng::new(2.0, 2.0));
    }

    #[test]
    fn test_route_revisits_are_kept() {
        let (surface, _) = setup(true);
        let snap = snapshot(&[1.0, 2.0, 2.0, 1.0], &[1.0, 2.0, 2.0, 1.0]);
        let points = route_points(&surface, &snap.data[0], &snap.data[1]);
        assert_eq!(
            points,
            vec![LatLng::new(1.0, 1.0), LatLng::new(2.0, 2.0), LatLng::new(1.0, 1.0)]
        );
    }

    #[test]
    fn test_route_grows_and_is_idempotent() {
        let (mut surface, mut location) = setup(true);
        reconcile(&mut surface, &mut location, &snapshot(&[1.0], &[1.0]), true);
        surface.reset_counters();

        let grown = snapshot(&[1.0, 2.0], &[1.0, 3.0]);
        assert!(reconcile(&mut surface, &mut location, &grown, true));
        assert_eq!(surface.counters().polyline_updates, 1);
        assert_eq!(surface.counters().marker_moves, 1);

        surface.reset_counters();
        assert!(!reconcile(&mut surface, &mut location, &grown, true));
        assert_eq!(surface.counters().geometry(), 0);
    }

    #[test]
    fn test_route_walks_shorter_series_and_skips_non_numeric() {
        let (surface, _) = setup(true);
        let mut snap = snapshot(&[1.0, 2.0, 3.0], &[1.0, 2.0]);
        snap.data[0].data[1] = TimeSeriesPoint::new(1000, "n/a");

        let points = route_points(&surface, &snap.data[0], &snap.data[1]);
        assert_eq!(points, vec![LatLng::new(1.0, 1.0)]);
    }

    #[test]
    fn test_nan_coordinates_do_not_cause_redraws() {
        let (mut surface, mut location) = setup(false);
        let mut snap = snapshot(&[10.0], &[20.0]);
        snap.data[0].data[0] = TimeSeriesPoint::new(0, "NaN");

        assert!(!reconcile(&mut surface, &mut location, &snap, false));
        assert!(!reconcile(&mut surface, &mut location, &snap, false));
        assert!(matches!(location.visual, Visual::Uninitialized));
        assert_eq!(surface.counters().geometry(), 0);

        let (mut surface, mut location) = setup(true);
        let mut snap = snapshot(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        snap.data[0].data[1] = TimeSeriesPoint::new(1000, "NaN");
        snap.data[1].data[2] = TimeSeriesPoint::new(2000, "inf");

        assert!(reconcile(&mut surface, &mut location, &snap, true));
        let path = location.visual.path().copied().unwrap();
        assert_eq!(surface.polyline_lat_lngs(&path), vec![LatLng::new(1.0, 1.0)]);
        surface.reset_counters();

        assert!(!reconcile(&mut surface, &mut location, &snap, true));
        assert_eq!(surface.counters().geometry(), 0);
    }

    #[test]
    fn test_click_handler_registered_on_create() {
        use std::cell::Cell;

        let (mut surface, mut location) = setup(false);
        let clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&clicks);
        reconcile_location(&mut surface, &mut location, &snapshot(&[1.0], &[1.0]), false, move || {
            Box::new(move || counter.set(counter.get() + 1))
        });

        let marker = location.visual.marker().copied().unwrap();
        surface.click_marker(&marker);
        surface.click_marker(&marker);
        assert_eq!(clicks.get(), 2);
    }
}
