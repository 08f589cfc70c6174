// Headless scene surface - in-memory MapSurface for hosts without a renderer and for tests
use crate::application::location::LocationStyle;
use crate::application::map_surface::{ClickHandler, MapSurface, OpenTooltip, TooltipId};
use crate::domain::geo::{IconDescriptor, LatLng};
use crate::domain::pattern::ReplaceInfo;
use crate::infrastructure::config::{MapProvider, MapWidgetConfig};
use geo_types::{Coord, Rect};

/// Construction options for a map surface, derived from the widget config.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceOptions {
    pub provider: MapProvider,
    pub default_zoom: Option<u8>,
    pub fit_map_bounds: bool,
    /// Highest zoom a bounds fit may reach.
    pub min_zoom_level: u8,
    pub gm_api_key: Option<String>,
    pub gm_default_map_type: String,
}

impl SurfaceOptions {
    pub fn from_config(config: &MapWidgetConfig) -> Self {
        Self {
            provider: config.provider,
            default_zoom: config.zoom_level(),
            fit_map_bounds: config.fit_map_bounds(),
            min_zoom_level: config.min_zoom_level(),
            gm_api_key: config.gm_api_key.clone().filter(|k| !k.is_empty()),
            gm_default_map_type: config.gm_default_map_type().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolylineId(usize);

pub struct SceneMarker {
    pub position: LatLng,
    pub label: Option<String>,
    pub label_color: String,
    pub color: String,
    pub icon: Option<IconDescriptor>,
    pub tooltip: Option<(String, ReplaceInfo)>,
    pub removed: bool,
    on_click: ClickHandler,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenePolyline {
    pub points: Vec<LatLng>,
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub removed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneBounds(Option<Rect<f64>>);

impl SceneBounds {
    fn extend(&mut self, position: LatLng) {
        let c: Coord<f64> = position.into();
        self.0 = Some(match self.0 {
            None => Rect::new(c, c),
            Some(rect) => Rect::new(
                Coord {
                    x: rect.min().x.min(c.x),
                    y: rect.min().y.min(c.y),
                },
                Coord {
                    x: rect.max().x.max(c.x),
                    y: rect.max().y.max(c.y),
                },
            ),
        });
    }

    pub fn rect(&self) -> Option<Rect<f64>> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitRequest {
    pub bounds: Option<Rect<f64>>,
    pub max_zoom: u8,
}

/// Count of every surface mutation, per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationCounters {
    pub markers_created: usize,
    pub marker_moves: usize,
    pub label_updates: usize,
    pub color_updates: usize,
    pub image_updates: usize,
    pub polylines_created: usize,
    pub polyline_updates: usize,
    pub polyline_color_updates: usize,
    pub removals: usize,
    pub fits: usize,
    pub size_invalidations: usize,
}

impl MutationCounters {
    /// Geometry-affecting mutations only.
    pub fn geometry(&self) -> usize {
        self.markers_created + self.marker_moves + self.polylines_created + self.polyline_updates
    }
}

struct SceneTooltip {
    id: TooltipId,
    marker: MarkerId,
    pattern: String,
    replace_info: ReplaceInfo,
    content: String,
}

pub struct SceneSurface {
    options: SurfaceOptions,
    ready: bool,
    markers: Vec<SceneMarker>,
    polylines: Vec<ScenePolyline>,
    tooltips: Vec<SceneTooltip>,
    next_tooltip: usize,
    fits: Vec<FitRequest>,
    counters: MutationCounters,
}

impl SceneSurface {
    pub fn new(options: SurfaceOptions) -> Self {
        Self {
            options,
            ready: false,
            markers: Vec::new(),
            polylines: Vec::new(),
            tooltips: Vec::new(),
            next_tooltip: 0,
            fits: Vec::new(),
            counters: MutationCounters::default(),
        }
    }

    /// Finish provider initialization. A Google surface needs an API key.
    pub fn mark_ready(&mut self) -> bool {
        self.ready = match self.options.provider {
            MapProvider::GoogleMap => self.options.gm_api_key.is_some(),
            MapProvider::OpenStreetMap => true,
        };
        self.ready
    }

    pub fn options(&self) -> &SurfaceOptions {
        &self.options
    }

    pub fn counters(&self) -> MutationCounters {
        self.counters
    }

    pub fn reset_counters(&mut self) {
        self.counters = MutationCounters::default();
    }

    pub fn marker(&self, id: &MarkerId) -> Option<&SceneMarker> {
        self.markers.get(id.0).filter(|m| !m.removed)
    }

    pub fn polyline(&self, id: &PolylineId) -> Option<&ScenePolyline> {
        self.polylines.get(id.0).filter(|p| !p.removed)
    }

    pub fn live_markers(&self) -> usize {
        self.markers.iter().filter(|m| !m.removed).count()
    }

    pub fn live_polylines(&self) -> usize {
        self.polylines.iter().filter(|p| !p.removed).count()
    }

    pub fn fits(&self) -> &[FitRequest] {
        &self.fits
    }

    /// Open the tooltip popup of a marker, as a user click would.
    pub fn open_tooltip(&mut self, marker: &MarkerId) -> Option<TooltipId> {
        let (pattern, replace_info) = self.marker(marker)?.tooltip.clone()?;
        let id = TooltipId(self.next_tooltip);
        self.next_tooltip += 1;
        self.tooltips.push(SceneTooltip {
            id,
            marker: *marker,
            content: pattern.clone(),
            pattern,
            replace_info,
        });
        Some(id)
    }

    pub fn close_tooltip(&mut self, id: TooltipId) {
        self.tooltips.retain(|t| t.id != id);
    }

    pub fn tooltip_content(&self, id: TooltipId) -> Option<&str> {
        self.tooltips.iter().find(|t| t.id == id).map(|t| t.content.as_str())
    }

    pub fn click_marker(&self, marker: &MarkerId) {
        if let Some(m) = self.marker(marker) {
            (m.on_click)();
        }
    }

    fn marker_mut(&mut self, id: &MarkerId) -> Option<&mut SceneMarker> {
        self.markers.get_mut(id.0).filter(|m| !m.removed)
    }

    fn polyline_mut(&mut self, id: &PolylineId) -> Option<&mut ScenePolyline> {
        self.polylines.get_mut(id.0).filter(|p| !p.removed)
    }
}

impl MapSurface for SceneSurface {
    type Marker = MarkerId;
    type Polyline = PolylineId;
    type Bounds = SceneBounds;

    fn inited(&self) -> bool {
        self.ready
    }

    fn create_marker(&mut self, position: LatLng, style: &LocationStyle, on_click: ClickHandler) -> MarkerId {
        let config = &style.config;
        self.markers.push(SceneMarker {
            position,
            label: config.show_label.then(|| style.label.clone()),
            label_color: config.label_color.clone(),
            color: config.color.clone(),
            icon: config.marker_image.clone(),
            tooltip: config
                .display_tooltip
                .then(|| (style.tooltip_pattern.clone(), style.tooltip_info.clone())),
            removed: false,
            on_click,
        });
        self.counters.markers_created += 1;
        MarkerId(self.markers.len() - 1)
    }

    fn set_marker_position(&mut self, marker: &MarkerId, position: LatLng) {
        if let Some(m) = self.marker_mut(marker) {
            m.position = position;
            self.counters.marker_moves += 1;
        }
    }

    fn marker_position(&self, marker: &MarkerId) -> LatLng {
        self.markers[marker.0].position
    }

    fn update_marker_label(&mut self, marker: &MarkerId, _style: &LocationStyle, text: &str) {
        if let Some(m) = self.marker_mut(marker) {
            m.label = Some(text.to_string());
            self.counters.label_updates += 1;
        }
    }

    fn update_marker_color(&mut self, marker: &MarkerId, color: &str) {
        if let Some(m) = self.marker_mut(marker) {
            m.color = color.to_string();
            self.counters.color_updates += 1;
        }
    }

    fn update_marker_image(&mut self, marker: &MarkerId, _style: &LocationStyle, icon: &IconDescriptor) {
        if let Some(m) = self.marker_mut(marker) {
            m.icon = Some(icon.clone());
            self.counters.image_updates += 1;
        }
    }

    fn remove_marker(&mut self, marker: &MarkerId) {
        if let Some(m) = self.marker_mut(marker) {
            m.removed = true;
            self.counters.removals += 1;
        }
        self.tooltips.retain(|t| t.marker != *marker);
    }

    fn create_polyline(&mut self, points: &[LatLng], style: &LocationStyle) -> PolylineId {
        let config = &style.config;
        let stroke = config.stroke.unwrap_or_default();
        self.polylines.push(ScenePolyline {
            points: points.to_vec(),
            color: config.color.clone(),
            weight: stroke.weight,
            opacity: stroke.opacity,
            removed: false,
        });
        self.counters.polylines_created += 1;
        PolylineId(self.polylines.len() - 1)
    }

    fn set_polyline_lat_lngs(&mut self, polyline: &PolylineId, points: &[LatLng]) {
        if let Some(p) = self.polyline_mut(polyline) {
            p.points = points.to_vec();
            self.counters.polyline_updates += 1;
        }
    }

    fn polyline_lat_lngs(&self, polyline: &PolylineId) -> Vec<LatLng> {
        self.polylines[polyline.0].points.clone()
    }

    fn update_polyline_color(&mut self, polyline: &PolylineId, _style: &LocationStyle, color: &str) {
        if let Some(p) = self.polyline_mut(polyline) {
            p.color = color.to_string();
            self.counters.polyline_color_updates += 1;
        }
    }

    fn remove_polyline(&mut self, polyline: &PolylineId) {
        if let Some(p) = self.polyline_mut(polyline) {
            p.removed = true;
            self.counters.removals += 1;
        }
    }

    fn create_bounds(&self) -> SceneBounds {
        SceneBounds::default()
    }

    fn extend_bounds(&self, bounds: &mut SceneBounds, polyline: &PolylineId) {
        if let Some(p) = self.polyline(polyline) {
            for point in &p.points {
                bounds.extend(*point);
            }
        }
    }

    fn extend_bounds_with_marker(&self, bounds: &mut SceneBounds, marker: &MarkerId) {
        if let Some(m) = self.marker(marker) {
            bounds.extend(m.position);
        }
    }

    fn fit_bounds(&mut self, bounds: &SceneBounds) {
        self.fits.push(FitRequest {
            bounds: bounds.rect(),
            max_zoom: self.options.min_zoom_level,
        });
        self.counters.fits += 1;
    }

    fn invalidate_size(&mut self) {
        self.counters.size_invalidations += 1;
    }

    fn tooltips(&self) -> Vec<OpenTooltip> {
        self.tooltips
            .iter()
            .map(|t| OpenTooltip {
                id: t.id,
                pattern: t.pattern.clone(),
                replace_info: t.replace_info.clone(),
            })
            .collect()
    }

    fn set_tooltip_content(&mut self, tooltip: TooltipId, content: &str) {
        if let Some(t) = self.tooltips.iter_mut().find(|t| t.id == tooltip) {
            t.content = content.to_string();
        }
    }
}
