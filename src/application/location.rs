// Location entity - one tracked position derived from a lat/lng column pair
use crate::application::location_index::CoordinatePair;
use crate::application::style::StyleConfig;
use crate::domain::geo::IconDescriptor;
use crate::domain::pattern::ReplaceInfo;
use std::rc::Rc;

/// Static per-Location styling: the shared configuration plus the label and
/// tooltip templates resolved against the Location's datasource.
#[derive(Debug, Clone)]
pub struct LocationStyle {
    pub config: Rc<StyleConfig>,
    pub label: String,
    pub label_info: ReplaceInfo,
    pub tooltip_pattern: String,
    pub tooltip_info: ReplaceInfo,
}

/// Last style values pushed to the surface. Empty until first computed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleCache {
    pub color: Option<String>,
    pub icon: Option<IconDescriptor>,
}

/// Visual entities owned by a Location. The mode never changes once set:
/// it follows the engine-wide route setting.
#[derive(Debug, Clone)]
pub enum Visual<M, P> {
    Uninitialized,
    Point { marker: M },
    Route { marker: M, path: P },
}

impl<M, P> Visual<M, P> {
    pub fn marker(&self) -> Option<&M> {
        match self {
            Visual::Uninitialized => None,
            Visual::Point { marker } | Visual::Route { marker, .. } => Some(marker),
        }
    }

    pub fn path(&self) -> Option<&P> {
        match self {
            Visual::Route { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Identity handed to the location click hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRef {
    pub index: usize,
    pub ds_index: usize,
    pub lat_index: usize,
    pub lng_index: usize,
}

#[derive(Debug)]
pub struct Location<M, P> {
    /// Position in the engine's Location list.
    pub index: usize,
    pub lat_index: usize,
    pub lng_index: usize,
    /// Ordinal of the datasource run the pair was found in.
    pub ds_index: usize,
    /// Index into the snapshot's datasource list.
    pub datasource: usize,
    pub style: LocationStyle,
    pub cache: StyleCache,
    pub visual: Visual<M, P>,
}

impl<M, P> Location<M, P> {
    pub fn new(index: usize, pair: &CoordinatePair, style: LocationStyle) -> Self {
        Self {
            index,
            lat_index: pair.lat_index,
            lng_index: pair.lng_index,
            ds_index: pair.ds_ordinal,
            datasource: pair.datasource,
            style,
            cache: StyleCache::default(),
            visual: Visual::Uninitialized,
        }
    }

    pub fn reference(&self) -> LocationRef {
        LocationRef {
            index: self.index,
            ds_index: self.ds_index,
            lat_index: self.lat_index,
            lng_index: self.lng_index,
        }
    }
}
