// Map widget - host-facing engine driving index build, reconciliation, styling and bounds
use crate::application::bounds::BoundsCoordinator;
use crate::application::location::{Location, LocationRef, LocationStyle};
use crate::application::location_index::find_coordinate_pairs;
use crate::application::map_surface::{ClickHandler, MapSurface};
use crate::application::pattern::PatternProvider;
use crate::application::reconciler::reconcile_location;
use crate::application::style::{StyleConfig, update_location_style};
use crate::domain::pattern::LabelValueMap;
use crate::domain::snapshot::SampleSnapshot;
use crate::infrastructure::config::{MapProvider, MapWidgetConfig};
use crate::infrastructure::pattern::TemplatePatterns;
use crate::infrastructure::rules::RuleEngine;
use crate::infrastructure::schema;
use std::cell::RefCell;
use std::rc::Rc;

pub type LocationClickHook = Box<dyn Fn(&LocationRef)>;

/// Host hooks. Markers look the hook up at click time, so replacing it
/// affects markers that already exist.
pub struct MapCallbacks {
    pub on_location_click: LocationClickHook,
}

impl Default for MapCallbacks {
    fn default() -> Self {
        Self {
            on_location_click: Box::new(|_| {}),
        }
    }
}

pub struct MapWidget<S: MapSurface, P: PatternProvider = TemplatePatterns> {
    surface: S,
    patterns: P,
    style: Rc<StyleConfig>,
    draw_routes: bool,
    bounds: BoundsCoordinator,
    callbacks: Rc<RefCell<MapCallbacks>>,
    subscription: Option<Rc<SampleSnapshot>>,
    locations: Option<Vec<Location<S::Marker, S::Polyline>>>,
}

impl<S: MapSurface> MapWidget<S, TemplatePatterns> {
    pub fn from_config(surface: S, config: &MapWidgetConfig) -> Self {
        let rules = RuleEngine::new();
        let style = StyleConfig::from_config(config, &rules);
        MapWidget::new(surface, TemplatePatterns::new(), style, config.draw_routes, config.fit_map_bounds())
    }
}

impl<S: MapSurface, P: PatternProvider> MapWidget<S, P> {
    pub fn new(surface: S, patterns: P, style: StyleConfig, draw_routes: bool, fit_map_bounds: bool) -> Self {
        Self {
            surface,
            patterns,
            style: Rc::new(style),
            draw_routes,
            bounds: BoundsCoordinator::new(fit_map_bounds),
            callbacks: Rc::new(RefCell::new(MapCallbacks::default())),
            subscription: None,
            locations: None,
        }
    }

    /// Settings schema for a provider: its own settings merged with the
    /// common map settings.
    pub fn settings_schema(provider: MapProvider) -> serde_json::Value {
        schema::settings_schema(provider)
    }

    pub fn set_callbacks(&mut self, callbacks: MapCallbacks) {
        *self.callbacks.borrow_mut() = callbacks;
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn draw_routes(&self) -> bool {
        self.draw_routes
    }

    pub fn locations(&self) -> &[Location<S::Marker, S::Polyline>] {
        self.locations.as_deref().unwrap_or(&[])
    }

    /// Bind new samples with the same column layout; Locations are kept.
    pub fn set_subscription(&mut self, snapshot: SampleSnapshot) {
        self.subscription = Some(Rc::new(snapshot));
    }

    /// Bind a structurally different subscription. The whole Location set
    /// and its visuals are discarded; the next update rebuilds them.
    pub fn rebind(&mut self, snapshot: SampleSnapshot) {
        if let Some(locations) = self.locations.take() {
            for location in &locations {
                if let Some(marker) = location.visual.marker() {
                    self.surface.remove_marker(marker);
                }
                if let Some(path) = location.visual.path() {
                    self.surface.remove_polyline(path);
                }
            }
            tracing::debug!("Discarded {} locations on rebind", locations.len());
        }
        self.subscription = Some(Rc::new(snapshot));
    }

    /// Bind a snapshot from the feed, rebinding when its layout changed,
    /// then run an update pass.
    pub fn on_data_updated(&mut self, snapshot: SampleSnapshot) {
        let same_layout = self
            .subscription
            .as_ref()
            .is_some_and(|current| current.same_layout(&snapshot));
        if same_layout {
            self.set_subscription(snapshot);
        } else {
            self.rebind(snapshot);
        }
        self.update();
    }

    /// Provider finished initializing.
    pub fn on_map_ready(&mut self) {
        self.update();
        self.resize();
    }

    /// Run one reconciliation pass over the bound subscription. A no-op
    /// until the surface is ready and data is bound.
    pub fn update(&mut self) {
        if !self.surface.inited() {
            return;
        }
        let Some(snapshot) = self.subscription.clone() else {
            return;
        };
        if snapshot.data.is_empty() {
            return;
        }

        let labels = self.patterns.to_label_value_map(&snapshot);
        if self.locations.is_none() {
            self.load_locations(&snapshot, &labels);
        } else {
            self.update_locations(&snapshot, &labels);
        }
        self.refresh_tooltips(&snapshot);
    }

    /// Re-fit the view after a viewport size change.
    pub fn resize(&mut self) {
        if !self.surface.inited() {
            return;
        }
        self.surface.invalidate_size();
        if let Some(locations) = &self.locations {
            self.bounds.fit_on_resize(&mut self.surface, locations);
        }
    }

    fn location_style(&self, snapshot: &SampleSnapshot, datasource: usize) -> LocationStyle {
        let config = Rc::clone(&self.style);
        let ds = snapshot.datasource(datasource).cloned().unwrap_or_default();

        let (label, label_info) = if config.show_label {
            let label = self.patterns.label_from_datasource(&ds, &config.label);
            let info = self.patterns.process_pattern(&label, snapshot, datasource);
            (label, info)
        } else {
            (config.label.clone(), Default::default())
        };

        let (tooltip_pattern, tooltip_info) = if config.display_tooltip {
            let pattern = self.patterns.label_from_datasource(&ds, &config.tooltip_pattern);
            let info = self.patterns.process_pattern(&pattern, snapshot, datasource);
            (pattern, info)
        } else {
            (config.tooltip_pattern.clone(), Default::default())
        };

        LocationStyle {
            config,
            label,
            label_info,
            tooltip_pattern,
            tooltip_info,
        }
    }

    fn click_handler(callbacks: &Rc<RefCell<MapCallbacks>>, location: LocationRef) -> ClickHandler {
        let callbacks = Rc::clone(callbacks);
        Box::new(move || (callbacks.borrow().on_location_click)(&location))
    }

    fn update_location(
        &mut self,
        location: &mut Location<S::Marker, S::Polyline>,
        snapshot: &SampleSnapshot,
        labels: &LabelValueMap,
    ) -> bool {
        let reference = location.reference();
        let callbacks = &self.callbacks;
        let changed = reconcile_location(&mut self.surface, location, snapshot, self.draw_routes, || {
            Self::click_handler(callbacks, reference)
        });
        update_location_style(&mut self.surface, &self.patterns, location, snapshot, labels);
        changed
    }

    fn load_locations(&mut self, snapshot: &SampleSnapshot, labels: &LabelValueMap) {
        let pairs = find_coordinate_pairs(&snapshot.data, &self.style.lat_key_name, &self.style.lng_key_name);
        let mut locations = Vec::with_capacity(pairs.len());

        for (index, pair) in pairs.iter().enumerate() {
            let style = self.location_style(snapshot, pair.datasource);
            let mut location = Location::new(index, pair, style);
            self.update_location(&mut location, snapshot, labels);
            locations.push(location);
        }

        tracing::debug!("Built {} locations from {} columns", locations.len(), snapshot.data.len());
        self.bounds.fit_all(&mut self.surface, &locations);
        self.locations = Some(locations);
    }

    fn update_locations(&mut self, snapshot: &SampleSnapshot, labels: &LabelValueMap) {
        let Some(mut locations) = self.locations.take() else {
            return;
        };

        let mut changed = false;
        for location in locations.iter_mut() {
            changed |= self.update_location(location, snapshot, labels);
        }

        if self.bounds.fit_if_changed(&mut self.surface, &locations, changed) {
            tracing::debug!("Location geometry changed, view re-fitted");
        }
        self.locations = Some(locations);
    }

    fn refresh_tooltips(&mut self, snapshot: &SampleSnapshot) {
        for tooltip in self.surface.tooltips() {
            let text = self
                .patterns
                .fill_pattern(&tooltip.pattern, &tooltip.replace_info, snapshot);
            self.surface.set_tooltip_content(tooltip.id, &text);
        }
    }
}
