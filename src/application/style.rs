// Style evaluator - label, color and marker image reconciliation per Location
use crate::application::location::Location;
use crate::application::map_surface::MapSurface;
use crate::application::pattern::PatternProvider;
use crate::domain::geo::IconDescriptor;
use crate::domain::pattern::LabelValueMap;
use crate::domain::snapshot::SampleSnapshot;
use crate::infrastructure::color::normalize_color;
use crate::infrastructure::config::{self, MapWidgetConfig};
use crate::infrastructure::rules::{RuleEngine, RuleKind, ScoringRule};

/// Route stroke styling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub weight: f64,
    pub opacity: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            weight: config::DEFAULT_STROKE_WEIGHT,
            opacity: config::DEFAULT_STROKE_OPACITY,
        }
    }
}

/// Immutable styling configuration, resolved once from the widget config.
/// Rules are compiled here and never re-parsed.
#[derive(Debug)]
pub struct StyleConfig {
    pub lat_key_name: String,
    pub lng_key_name: String,
    pub show_label: bool,
    pub label: String,
    pub label_color: String,
    pub display_tooltip: bool,
    pub tooltip_pattern: String,
    /// Normalized static color.
    pub color: String,
    pub color_rule: Option<ScoringRule>,
    pub marker_image_rule: Option<ScoringRule>,
    pub marker_images: Vec<String>,
    /// Static custom marker image; when set, color updates leave the marker alone.
    pub marker_image: Option<IconDescriptor>,
    pub marker_image_size: f64,
    /// Present in route mode only.
    pub stroke: Option<StrokeStyle>,
}

/// Applied when a color rule fails.
pub fn default_color() -> String {
    normalize_color(config::DEFAULT_COLOR).unwrap_or_else(|| config::DEFAULT_COLOR.to_lowercase())
}

fn compile_rule(rules: &RuleEngine, kind: RuleKind, source: Option<&str>) -> Option<ScoringRule> {
    let source = source?;
    match rules.compile(kind, source) {
        Ok(rule) => Some(rule),
        Err(e) => {
            tracing::warn!("Ignoring {} rule: {}", kind, e);
            None
        }
    }
}

impl StyleConfig {
    pub fn from_config(config: &MapWidgetConfig, rules: &RuleEngine) -> Self {
        let color = normalize_color(config.color()).unwrap_or_else(default_color);

        Self {
            lat_key_name: config.lat_key_name().to_string(),
            lng_key_name: config.lng_key_name().to_string(),
            show_label: config.show_label(),
            label: config.label().to_string(),
            label_color: config.label_color().to_string(),
            display_tooltip: true,
            tooltip_pattern: config.tooltip_pattern(),
            color,
            color_rule: compile_rule(rules, RuleKind::Color, config.color_rule_source()),
            marker_image_rule: compile_rule(rules, RuleKind::MarkerImage, config.marker_image_rule_source()),
            marker_images: config.marker_images.clone(),
            marker_image: config
                .static_marker_image()
                .map(|url| IconDescriptor::new(url, config.marker_image_size())),
            marker_image_size: config.marker_image_size(),
            stroke: config.draw_routes.then(|| StrokeStyle {
                weight: config.stroke_weight(),
                opacity: config.stroke_opacity(),
            }),
        }
    }
}

/// Current color of a Location: rule output when a rule is configured,
/// falling back to the default color on any failure; otherwise the static
/// configured color.
pub fn calculate_color<M, P>(location: &Location<M, P>, labels: &LabelValueMap) -> String {
    let config = &location.style.config;
    let Some(rule) = &config.color_rule else {
        return config.color.clone();
    };

    match rule.color(labels, location.ds_index) {
        Ok(raw) => normalize_color(&raw).unwrap_or_else(|| {
            tracing::trace!("Color rule returned unrecognized color {:?}", raw);
            default_color()
        }),
        Err(e) => {
            tracing::trace!("Location {} color rule: {}", location.index, e);
            default_color()
        }
    }
}

/// Current marker image of a Location, or `None` when no rule is configured
/// or the rule failed or chose nothing.
pub fn calculate_marker_image<M, P>(location: &Location<M, P>, labels: &LabelValueMap) -> Option<IconDescriptor> {
    let config = &location.style.config;
    let rule = config.marker_image_rule.as_ref()?;

    match rule.marker_image(labels, &config.marker_images, location.ds_index, config.marker_image_size) {
        Ok(icon) => icon,
        Err(e) => {
            tracing::trace!("Location {} marker image rule: {}", location.index, e);
            None
        }
    }
}

fn update_label<S: MapSurface, P: PatternProvider>(
    surface: &mut S,
    patterns: &P,
    location: &Location<S::Marker, S::Polyline>,
    snapshot: &SampleSnapshot,
) {
    let style = &location.style;
    if !style.config.show_label || style.label_info.is_static() {
        return;
    }
    if let Some(marker) = location.visual.marker() {
        let text = patterns.fill_pattern(&style.label, &style.label_info, snapshot);
        surface.update_marker_label(marker, style, &text);
    }
}

fn update_color<S: MapSurface>(
    surface: &mut S,
    location: &mut Location<S::Marker, S::Polyline>,
    labels: &LabelValueMap,
) {
    let color = calculate_color(location, labels);
    if location.cache.color.as_deref() == Some(color.as_str()) {
        return;
    }

    if location.style.config.marker_image.is_none() {
        if let Some(marker) = location.visual.marker() {
            surface.update_marker_color(marker, &color);
        }
    }
    if let Some(path) = location.visual.path() {
        surface.update_polyline_color(path, &location.style, &color);
    }
    location.cache.color = Some(color);
}

fn update_marker_image<S: MapSurface>(
    surface: &mut S,
    location: &mut Location<S::Marker, S::Polyline>,
    labels: &LabelValueMap,
) {
    let Some(icon) = calculate_marker_image(location, labels) else {
        return;
    };
    if location.cache.icon.as_ref() == Some(&icon) {
        return;
    }

    if let Some(marker) = location.visual.marker() {
        surface.update_marker_image(marker, &location.style, &icon);
    }
    location.cache.icon = Some(icon);
}

/// Apply label, color and marker image to a drawn Location, pushing only
/// values that differ from the last applied ones. Rule failures never
/// escape: they degrade to the documented fallbacks.
pub fn update_location_style<S: MapSurface, P: PatternProvider>(
    surface: &mut S,
    patterns: &P,
    location: &mut Location<S::Marker, S::Polyline>,
    snapshot: &SampleSnapshot,
    labels: &LabelValueMap,
) {
    if location.visual.marker().is_none() {
        return;
    }
    update_label(surface, patterns, location, snapshot);
    update_color(surface, location, labels);
    update_marker_image(surface, location, labels);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::location::{LocationStyle, Visual};
    use crate::application::location_index::CoordinatePair;
    use crate::domain::geo::LatLng;
    use crate::domain::snapshot::{DataColumn, DataKey, Datasource};
    use crate::domain::telemetry::TimeSeriesPoint;
    use crate::infrastructure::pattern::TemplatePatterns;
    use crate::infrastructure::scene_surface::{MarkerId, PolylineId, SceneSurface, SurfaceOptions};
    use std::rc::Rc;

    fn snapshot(speed: f64) -> SampleSnapshot {
        SampleSnapshot::new(
            vec![Datasource::new("Fleet", "Truck 1")],
            vec![
                DataColumn::new(0, DataKey::new("latitude"), vec![TimeSeriesPoint::new(0, 10.0)]),
                DataColumn::new(0, DataKey::new("longitude"), vec![TimeSeriesPoint::new(0, 20.0)]),
                DataColumn::new(0, DataKey::new("speed"), vec![TimeSeriesPoint::new(0, speed)]),
            ],
        )
    }

    fn setup(
        config: MapWidgetConfig,
        snap: &SampleSnapshot,
    ) -> (SceneSurface, Location<MarkerId, PolylineId>) {
        let rules = RuleEngine::new();
        let style_config = Rc::new(StyleConfig::from_config(&config, &rules));
        let patterns = TemplatePatterns::new();
        let label = patterns.label_from_datasource(&snap.datasources[0], &style_config.label);
        let style = LocationStyle {
            label_info: patterns.process_pattern(&label, snap, 0),
            label,
            tooltip_pattern: style_config.tooltip_pattern.clone(),
            tooltip_info: Default::default(),
            config: style_config,
        };

        let mut surface = SceneSurface::new(SurfaceOptions::from_config(&config));
        surface.mark_ready();
        let pair = CoordinatePair { lat_index: 0, lng_index: 1, ds_ordinal: 0, datasource: 0 };
        let mut location = Location::new(0, &pair, style);
        let marker = surface.create_marker(LatLng::new(10.0, 20.0), &location.style, Box::new(|| {}));
        location.visual = Visual::Point { marker };
        (surface, location)
    }

    fn run(surface: &mut SceneSurface, location: &mut Location<MarkerId, PolylineId>, snap: &SampleSnapshot) {
        let patterns = TemplatePatterns::new();
        let labels = patterns.to_label_value_map(snap);
        update_location_style(surface, &patterns, location, snap, &labels);
    }

    #[test]
    fn test_static_color_applied_once() {
        let snap = snapshot(10.0);
        let (mut surface, mut location) = setup(MapWidgetConfig::default(), &snap);

        run(&mut surface, &mut location, &snap);
        run(&mut surface, &mut location, &snap);

        assert_eq!(surface.counters().color_updates, 1);
        assert_eq!(location.cache.color.as_deref(), Some("#fe7569"));
        // `${entityName}` is resolved up front, so the label never re-renders.
        assert_eq!(surface.counters().label_updates, 0);
    }

    #[test]
    fn test_color_rule_applied_once() {
        let snap = snapshot(10.0);
        let config = MapWidgetConfig {
            use_color_function: true,
            color_function: Some(r##"return "#00ff00";"##.to_string()),
            ..Default::default()
        };
        let (mut surface, mut location) = setup(config, &snap);

        run(&mut surface, &mut location, &snap);
        let marker = location.visual.marker().copied().unwrap();
        assert_eq!(surface.marker(&marker).unwrap().color, "#00ff00");
        assert_eq!(surface.counters().color_updates, 1);

        run(&mut surface, &mut location, &snap);
        assert_eq!(surface.counters().color_updates, 1);
    }

    #[test]
    fn test_throwing_color_rule_falls_back_every_time() {
        let config = MapWidgetConfig {
            use_color_function: true,
            color_function: Some(r#"throw "no colors today";"#.to_string()),
            ..Default::default()
        };
        let (mut surface, mut location) = setup(config, &snapshot(1.0));

        for speed in [1.0, 50.0, 120.0] {
            let snap = snapshot(speed);
            run(&mut surface, &mut location, &snap);
            assert_eq!(location.cache.color.as_deref(), Some("#fe7569"));
        }
        assert_eq!(surface.counters().color_updates, 1);
    }

    #[test]
    fn test_color_rule_tracks_data() {
        let config = MapWidgetConfig {
            use_color_function: true,
            color_function: Some(r#"if data.speed > 60.0 { "red" } else { "green" }"#.to_string()),
            ..Default::default()
        };
        let (mut surface, mut location) = setup(config, &snapshot(10.0));

        run(&mut surface, &mut location, &snapshot(10.0));
        run(&mut surface, &mut location, &snapshot(90.0));
        run(&mut surface, &mut location, &snapshot(95.0));

        assert_eq!(location.cache.color.as_deref(), Some("#ff0000"));
        assert_eq!(surface.counters().color_updates, 2);
    }

    #[test]
    fn test_unparseable_color_rule_uses_static_color() {
        let config = MapWidgetConfig {
            color: Some("blue".to_string()),
            use_color_function: true,
            color_function: Some("return (;".to_string()),
            ..Default::default()
        };
        let snap = snapshot(10.0);
        let (mut surface, mut location) = setup(config, &snap);
        assert!(location.style.config.color_rule.is_none());

        run(&mut surface, &mut location, &snap);
        assert_eq!(location.cache.color.as_deref(), Some("#0000ff"));
    }

    #[test]
    fn test_static_marker_image_keeps_marker_color() {
        let config = MapWidgetConfig {
            marker_image: Some("truck.png".to_string()),
            ..Default::default()
        };
        let snap = snapshot(10.0);
        let (mut surface, mut location) = setup(config, &snap);

        run(&mut surface, &mut location, &snap);
        assert_eq!(surface.counters().color_updates, 0);
        assert_eq!(location.cache.color.as_deref(), Some("#fe7569"));
    }

    #[test]
    fn test_marker_image_updates_only_on_change() {
        let config = MapWidgetConfig {
            use_marker_image_function: true,
            marker_image_function: Some(
                r#"if data.speed > 60.0 { #{ url: images[1], size: 40 } } else { #{ url: images[0], size: 30 } }"#
                    .to_string(),
            ),
            marker_images: vec!["slow.png".to_string(), "fast.png".to_string()],
            ..Default::default()
        };
        let (mut surface, mut location) = setup(config, &snapshot(10.0));

        run(&mut surface, &mut location, &snapshot(10.0));
        run(&mut surface, &mut location, &snapshot(20.0));
        assert_eq!(surface.counters().image_updates, 1);

        run(&mut surface, &mut location, &snapshot(90.0));
        assert_eq!(surface.counters().image_updates, 2);
        assert_eq!(location.cache.icon, Some(IconDescriptor::new("fast.png", 40.0)));
    }

    #[test]
    fn test_failing_marker_image_rule_keeps_last_icon() {
        let config = MapWidgetConfig {
            use_marker_image_function: true,
            marker_image_function: Some(
                r#"if data.speed > 60.0 { throw "bad"; } #{ url: images[0] }"#.to_string(),
            ),
            marker_images: vec!["slow.png".to_string()],
            ..Default::default()
        };
        let (mut surface, mut location) = setup(config, &snapshot(10.0));

        run(&mut surface, &mut location, &snapshot(10.0));
        run(&mut surface, &mut location, &snapshot(90.0));

        assert_eq!(surface.counters().image_updates, 1);
        assert_eq!(location.cache.icon, Some(IconDescriptor::new("slow.png", 34.0)));
    }

    #[test]
    fn test_label_with_live_variable_rerenders() {
        let config = MapWidgetConfig {
            label: Some("${entityName}: ${speed:0} km/h".to_string()),
            ..Default::default()
        };
        let (mut surface, mut location) = setup(config, &snapshot(10.0));

        run(&mut surface, &mut location, &snapshot(42.0));
        let marker = location.visual.marker().copied().unwrap();
        assert_eq!(surface.marker(&marker).unwrap().label.as_deref(), Some("Truck 1: 42 km/h"));
        assert_eq!(surface.counters().label_updates, 1);
    }
}
