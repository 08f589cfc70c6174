// Settings schema - JSON form descriptions of the map widget settings per provider
use crate::infrastructure::config::{
    DEFAULT_COLOR, DEFAULT_GOOGLE_MAP_TYPE, DEFAULT_LABEL, DEFAULT_LABEL_COLOR, DEFAULT_LAT_KEY_NAME, DEFAULT_LNG_KEY_NAME,
    DEFAULT_MARKER_IMAGE_SIZE, DEFAULT_STROKE_OPACITY, DEFAULT_STROKE_WEIGHT, MapProvider,
};
use serde_json::{Value, json};

fn google_map_schema() -> Value {
    json!({
        "schema": {
            "title": "Google Map Configuration",
            "type": "object",
            "properties": {
                "gm_api_key": {
                    "title": "Google Maps API Key",
                    "type": "string"
                },
                "gm_default_map_type": {
                    "title": "Default map type",
                    "type": "string",
                    "default": DEFAULT_GOOGLE_MAP_TYPE
                }
            },
            "required": ["gm_api_key"]
        },
        "form": [
            "gm_api_key",
            {
                "key": "gm_default_map_type",
                "type": "select",
                "multiple": false,
                "items": [
                    { "value": "roadmap", "label": "Roadmap" },
                    { "value": "satellite", "label": "Satellite" },
                    { "value": "hybrid", "label": "Hybrid" },
                    { "value": "terrain", "label": "Terrain" }
                ]
            }
        ]
    })
}

fn openstreet_map_schema() -> Value {
    json!({
        "schema": {
            "title": "OpenStreetMap Configuration",
            "type": "object",
            "properties": {},
            "required": []
        },
        "form": []
    })
}

fn common_map_schema() -> Value {
    let tooltip = format!(
        "<b>${{entityName}}</b><br/><br/><b>Latitude:</b> ${{{}:7}}<br/><b>Longitude:</b> ${{{}:7}}",
        DEFAULT_LAT_KEY_NAME, DEFAULT_LNG_KEY_NAME
    );

    json!({
        "schema": {
            "title": "Map Configuration",
            "type": "object",
            "properties": {
                "default_zoom_level": {
                    "title": "Default map zoom level (1 - 20)",
                    "type": "number"
                },
                "fit_map_bounds": {
                    "title": "Fit map bounds to cover all markers",
                    "type": "boolean",
                    "default": true
                },
                "lat_key_name": {
                    "title": "Latitude key name",
                    "type": "string",
                    "default": DEFAULT_LAT_KEY_NAME
                },
                "lng_key_name": {
                    "title": "Longitude key name",
                    "type": "string",
                    "default": DEFAULT_LNG_KEY_NAME
                },
                "show_label": {
                    "title": "Show label",
                    "type": "boolean",
                    "default": true
                },
                "label": {
                    "title": "Label",
                    "type": "string",
                    "default": DEFAULT_LABEL
                },
                "label_color": {
                    "title": "Label color",
                    "type": "string",
                    "default": DEFAULT_LABEL_COLOR
                },
                "tooltip_pattern": {
                    "title": "Pattern ( for ex. 'Text ${keyName} units.' or '${#<key index>} units' )",
                    "type": "string",
                    "default": tooltip
                },
                "color": {
                    "title": "Color",
                    "type": "string",
                    "default": DEFAULT_COLOR
                },
                "use_color_function": {
                    "title": "Use color function",
                    "type": "boolean",
                    "default": false
                },
                "color_function": {
                    "title": "Color function: f(data, dsData, dsIndex)",
                    "type": "string"
                },
                "marker_image": {
                    "title": "Custom marker image",
                    "type": "string"
                },
                "marker_image_size": {
                    "title": "Custom marker image size (px)",
                    "type": "number",
                    "default": DEFAULT_MARKER_IMAGE_SIZE
                },
                "use_marker_image_function": {
                    "title": "Use marker image function",
                    "type": "boolean",
                    "default": false
                },
                "marker_image_function": {
                    "title": "Marker image function: f(data, images, dsData, dsIndex)",
                    "type": "string"
                },
                "marker_images": {
                    "title": "Marker images",
                    "type": "array",
                    "items": {
                        "title": "Marker image",
                        "type": "string"
                    }
                },
                "stroke_weight": {
                    "title": "Route stroke weight",
                    "type": "number",
                    "default": DEFAULT_STROKE_WEIGHT
                },
                "stroke_opacity": {
                    "title": "Route stroke opacity",
                    "type": "number",
                    "default": DEFAULT_STROKE_OPACITY
                }
            },
            "required": []
        },
        "form": [
            "default_zoom_level",
            "fit_map_bounds",
            "lat_key_name",
            "lng_key_name",
            "show_label",
            "label",
            { "key": "label_color", "type": "color" },
            "tooltip_pattern",
            { "key": "color", "type": "color" },
            "use_color_function",
            { "key": "color_function", "type": "rhai" },
            { "key": "marker_image", "type": "image" },
            "marker_image_size",
            "use_marker_image_function",
            { "key": "marker_image_function", "type": "rhai" },
            {
                "key": "marker_images",
                "items": [
                    { "key": "marker_images[]", "type": "image" }
                ]
            },
            "stroke_weight",
            "stroke_opacity"
        ]
    })
}

fn append(target: &mut Value, source: &Value) {
    if let (Some(target), Some(source)) = (target.as_array_mut(), source.as_array()) {
        target.extend(source.iter().cloned());
    }
}

/// Provider schema merged with the common map schema: properties are
/// merged, `required` and `form` are concatenated.
pub fn settings_schema(provider: MapProvider) -> Value {
    let mut schema = match provider {
        MapProvider::GoogleMap => google_map_schema(),
        MapProvider::OpenStreetMap => openstreet_map_schema(),
    };
    let common = common_map_schema();

    if let (Some(properties), Some(common_properties)) = (
        schema["schema"]["properties"].as_object_mut(),
        common["schema"]["properties"].as_object(),
    ) {
        for (key, value) in common_properties {
            properties.insert(key.clone(), value.clone());
        }
    }
    append(&mut schema["schema"]["required"], &common["schema"]["required"]);
    append(&mut schema["form"], &common["form"]);
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_schema_merges_common() {
        let schema = settings_schema(MapProvider::GoogleMap);
        let properties = schema["schema"]["properties"].as_object().unwrap();

        assert!(properties.contains_key("gm_api_key"));
        assert!(properties.contains_key("color_function"));
        assert_eq!(schema["schema"]["required"], json!(["gm_api_key"]));
        assert_eq!(schema["form"][0], "gm_api_key");
        assert_eq!(schema["form"][2], "default_zoom_level");
    }

    #[test]
    fn test_openstreet_schema_is_common_only() {
        let schema = settings_schema(MapProvider::OpenStreetMap);
        let properties = schema["schema"]["properties"].as_object().unwrap();

        assert!(!properties.contains_key("gm_api_key"));
        assert_eq!(properties["marker_image_size"]["default"], 34.0);
        assert_eq!(
            properties["tooltip_pattern"]["default"],
            "<b>${entityName}</b><br/><br/><b>Latitude:</b> ${latitude:7}<br/><b>Longitude:</b> ${longitude:7}"
        );
        assert_eq!(schema["form"], common_map_schema()["form"]);
    }
}
