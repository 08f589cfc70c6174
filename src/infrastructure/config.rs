// Configuration loading - map widget settings from file and environment
use serde::Deserialize;

pub const DEFAULT_LAT_KEY_NAME: &str = "latitude";
pub const DEFAULT_LNG_KEY_NAME: &str = "longitude";
pub const DEFAULT_LABEL: &str = "${entityName}";
pub const DEFAULT_LABEL_COLOR: &str = "#000000";
pub const DEFAULT_COLOR: &str = "#FE7569";
pub const DEFAULT_MARKER_IMAGE_SIZE: f64 = 34.0;
pub const DEFAULT_STROKE_WEIGHT: f64 = 2.0;
pub const DEFAULT_STROKE_OPACITY: f64 = 1.0;
pub const DEFAULT_GOOGLE_MAP_TYPE: &str = "roadmap";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapProvider {
    #[serde(rename = "google-map")]
    GoogleMap,
    #[default]
    #[serde(rename = "openstreet-map")]
    OpenStreetMap,
}

impl MapProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            MapProvider::GoogleMap => "google-map",
            MapProvider::OpenStreetMap => "openstreet-map",
        }
    }
}

/// Widget settings as authored in the map configuration form. Optional
/// values fall back to the defaults above through the accessor methods;
/// empty strings count as unset.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MapWidgetConfig {
    pub provider: MapProvider,
    pub draw_routes: bool,
    pub default_zoom_level: Option<f64>,
    pub fit_map_bounds: Option<bool>,
    pub lat_key_name: Option<String>,
    pub lng_key_name: Option<String>,
    pub show_label: Option<bool>,
    pub label: Option<String>,
    pub label_color: Option<String>,
    pub tooltip_pattern: Option<String>,
    pub color: Option<String>,
    pub use_color_function: bool,
    pub color_function: Option<String>,
    pub use_marker_image_function: bool,
    pub marker_image_function: Option<String>,
    pub marker_image: Option<String>,
    pub marker_image_size: Option<f64>,
    pub marker_images: Vec<String>,
    pub stroke_weight: Option<f64>,
    pub stroke_opacity: Option<f64>,
    pub gm_api_key: Option<String>,
    pub gm_default_map_type: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn non_zero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && v.is_finite())
}

impl MapWidgetConfig {
    pub fn lat_key_name(&self) -> &str {
        non_empty(&self.lat_key_name).unwrap_or(DEFAULT_LAT_KEY_NAME)
    }

    pub fn lng_key_name(&self) -> &str {
        non_empty(&self.lng_key_name).unwrap_or(DEFAULT_LNG_KEY_NAME)
    }

    pub fn fit_map_bounds(&self) -> bool {
        self.fit_map_bounds != Some(false)
    }

    pub fn show_label(&self) -> bool {
        self.show_label != Some(false)
    }

    pub fn label(&self) -> &str {
        non_empty(&self.label).unwrap_or(DEFAULT_LABEL)
    }

    pub fn label_color(&self) -> &str {
        non_empty(&self.label_color).unwrap_or(DEFAULT_LABEL_COLOR)
    }

    pub fn tooltip_pattern(&self) -> String {
        match non_empty(&self.tooltip_pattern) {
            Some(pattern) => pattern.to_string(),
            None => format!(
                "<b>${{entityName}}</b><br/><br/><b>Latitude:</b> ${{{}:7}}<br/><b>Longitude:</b> ${{{}:7}}",
                self.lat_key_name(),
                self.lng_key_name()
            ),
        }
    }

    pub fn color(&self) -> &str {
        non_empty(&self.color).unwrap_or(DEFAULT_COLOR)
    }

    /// Rule source, present only when the rule toggle is on.
    pub fn color_rule_source(&self) -> Option<&str> {
        if self.use_color_function {
            non_empty(&self.color_function)
        } else {
            None
        }
    }

    pub fn marker_image_rule_source(&self) -> Option<&str> {
        if self.use_marker_image_function {
            non_empty(&self.marker_image_function)
        } else {
            None
        }
    }

    /// Static custom marker image. Ignored while an icon rule is toggled on.
    pub fn static_marker_image(&self) -> Option<&str> {
        if self.use_marker_image_function {
            None
        } else {
            non_empty(&self.marker_image)
        }
    }

    pub fn marker_image_size(&self) -> f64 {
        non_zero(self.marker_image_size).unwrap_or(DEFAULT_MARKER_IMAGE_SIZE)
    }

    pub fn stroke_weight(&self) -> f64 {
        non_zero(self.stroke_weight).unwrap_or(DEFAULT_STROKE_WEIGHT)
    }

    pub fn stroke_opacity(&self) -> f64 {
        non_zero(self.stroke_opacity).unwrap_or(DEFAULT_STROKE_OPACITY)
    }

    /// Default zoom, floored and clamped to 1..=20. Non-positive values
    /// leave the zoom to the provider.
    pub fn zoom_level(&self) -> Option<u8> {
        self.default_zoom_level
            .filter(|z| z.is_finite() && *z > 0.0)
            .map(|z| z.floor().clamp(1.0, 20.0) as u8)
    }

    /// Highest zoom a bounds fit may reach.
    pub fn min_zoom_level(&self) -> u8 {
        if self.draw_routes { 18 } else { 15 }
    }

    pub fn gm_default_map_type(&self) -> &str {
        non_empty(&self.gm_default_map_type).unwrap_or(DEFAULT_GOOGLE_MAP_TYPE)
    }
}

pub fn load_map_config() -> anyhow::Result<MapWidgetConfig> {
    load_map_config_from("config/map")
}

/// Layers an optional settings file with `GEOMAP_*` environment overrides.
pub fn load_map_config_from(path: &str) -> anyhow::Result<MapWidgetConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("GEOMAP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
