// Bounds coordinator - aggregate bounds over drawn Locations and view fitting
use crate::application::location::{Location, Visual};
use crate::application::map_surface::MapSurface;

/// Extend `bounds` with a Location's current geometry: its path in route
/// mode, its marker in point mode.
pub fn extend_with_location<S: MapSurface>(
    surface: &S,
    bounds: &mut S::Bounds,
    location: &Location<S::Marker, S::Polyline>,
) {
    match &location.visual {
        Visual::Route { path, .. } => surface.extend_bounds(bounds, path),
        Visual::Point { marker } => surface.extend_bounds_with_marker(bounds, marker),
        Visual::Uninitialized => {}
    }
}

pub fn locations_bounds<S: MapSurface>(surface: &S, locations: &[Location<S::Marker, S::Polyline>]) -> S::Bounds {
    let mut bounds = surface.create_bounds();
    for location in locations {
        extend_with_location(surface, &mut bounds, location);
    }
    bounds
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundsCoordinator {
    auto_fit: bool,
}

impl BoundsCoordinator {
    pub fn new(auto_fit: bool) -> Self {
        Self { auto_fit }
    }

    pub fn auto_fit(&self) -> bool {
        self.auto_fit
    }

    /// Fit the view to every Location, regardless of what changed. Returns
    /// whether a fit was requested.
    pub fn fit_all<S: MapSurface>(&self, surface: &mut S, locations: &[Location<S::Marker, S::Polyline>]) -> bool {
        if !self.auto_fit {
            return false;
        }
        let bounds = locations_bounds(surface, locations);
        surface.fit_bounds(&bounds);
        tracing::debug!("Fitted view to {} locations", locations.len());
        true
    }

    /// Fit after an update pass, only when some geometry changed.
    pub fn fit_if_changed<S: MapSurface>(
        &self,
        surface: &mut S,
        locations: &[Location<S::Marker, S::Polyline>],
        changed: bool,
    ) -> bool {
        changed && self.fit_all(surface, locations)
    }

    /// Re-fit after a viewport resize, provided there is anything to show.
    pub fn fit_on_resize<S: MapSurface>(&self, surface: &mut S, locations: &[Location<S::Marker, S::Polyline>]) -> bool {
        !locations.is_empty() && self.fit_all(surface, locations)
    }
}
