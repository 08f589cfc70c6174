// Geographic value types shared by the engine and map surfaces
use geo_types::Coord;

/// A WGS84 position. Equality is exact, matching what a map surface reports
/// back for a position it was given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<LatLng> for Coord<f64> {
    fn from(position: LatLng) -> Self {
        Coord {
            x: position.lng,
            y: position.lat,
        }
    }
}

/// Marker image produced by an icon rule or configured statically.
#[derive(Debug, Clone, PartialEq)]
pub struct IconDescriptor {
    pub url: String,
    pub size: f64,
}

impl IconDescriptor {
    pub fn new(url: impl Into<String>, size: f64) -> Self {
        Self {
            url: url.into(),
            size,
        }
    }
}
