// Map surface trait - the drawing primitives a map provider exposes to the engine
use crate::application::location::LocationStyle;
use crate::domain::geo::{IconDescriptor, LatLng};
use crate::domain::pattern::ReplaceInfo;

/// Invoked when a marker is clicked.
pub type ClickHandler = Box<dyn Fn()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TooltipId(pub usize);

/// A tooltip popup currently open on the surface, with the template it was
/// opened from.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenTooltip {
    pub id: TooltipId,
    pub pattern: String,
    pub replace_info: ReplaceInfo,
}

/// One implementation per map provider. Every mutating call is assumed to
/// cost real rendering work, so the engine only calls them on change.
pub trait MapSurface {
    type Marker: Clone;
    type Polyline: Clone;
    type Bounds;

    /// Readiness check; the engine does nothing until it returns true.
    fn inited(&self) -> bool;

    fn create_lat_lng(&self, lat: f64, lng: f64) -> LatLng {
        LatLng::new(lat, lng)
    }

    fn create_marker(&mut self, position: LatLng, style: &LocationStyle, on_click: ClickHandler) -> Self::Marker;
    fn set_marker_position(&mut self, marker: &Self::Marker, position: LatLng);
    fn marker_position(&self, marker: &Self::Marker) -> LatLng;
    fn update_marker_label(&mut self, marker: &Self::Marker, style: &LocationStyle, text: &str);
    fn update_marker_color(&mut self, marker: &Self::Marker, color: &str);
    fn update_marker_image(&mut self, marker: &Self::Marker, style: &LocationStyle, icon: &IconDescriptor);
    fn remove_marker(&mut self, marker: &Self::Marker);

    fn create_polyline(&mut self, points: &[LatLng], style: &LocationStyle) -> Self::Polyline;
    fn set_polyline_lat_lngs(&mut self, polyline: &Self::Polyline, points: &[LatLng]);
    fn polyline_lat_lngs(&self, polyline: &Self::Polyline) -> Vec<LatLng>;
    fn update_polyline_color(&mut self, polyline: &Self::Polyline, style: &LocationStyle, color: &str);
    fn remove_polyline(&mut self, polyline: &Self::Polyline);

    fn create_bounds(&self) -> Self::Bounds;
    fn extend_bounds(&self, bounds: &mut Self::Bounds, polyline: &Self::Polyline);
    fn extend_bounds_with_marker(&self, bounds: &mut Self::Bounds, marker: &Self::Marker);
    fn fit_bounds(&mut self, bounds: &Self::Bounds);
    fn invalidate_size(&mut self);

    fn tooltips(&self) -> Vec<OpenTooltip>;
    fn set_tooltip_content(&mut self, tooltip: TooltipId, content: &str);
}
