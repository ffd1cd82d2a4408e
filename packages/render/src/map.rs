//! Standalone Leaflet page with one circle marker per incident.

use campus_safety_incident_models::IncidentTable;
use serde::{Deserialize, Serialize};

use crate::{GeoRenderer, RenderError};

const LEAFLET_VERSION: &str = "1.9.4";

/// Map appearance, read from the `[map]` section of the analysis config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapStyle {
    pub zoom: u8,
    pub marker_radius: f64,
    pub marker_color: String,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            zoom: 14,
            marker_radius: 5.0,
            marker_color: "red".to_string(),
        }
    }
}

/// Default [`GeoRenderer`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafletMapRenderer {
    pub style: MapStyle,
}

impl LeafletMapRenderer {
    #[must_use]
    pub const fn new(style: MapStyle) -> Self {
        Self { style }
    }
}

#[derive(Serialize)]
struct Marker {
    lat: f64,
    lon: f64,
    popup: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapData<'a> {
    center: [f64; 2],
    zoom: u8,
    radius: f64,
    color: &'a str,
    markers: Vec<Marker>,
}

/// Escapes text for use inside HTML element content or attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Mean coordinate of the table, or the origin when it is empty.
#[allow(clippy::cast_precision_loss)]
fn center(table: &IncidentTable) -> [f64; 2] {
    if table.is_empty() {
        return [0.0, 0.0];
    }
    let n = table.len() as f64;
    let lat = table.iter().map(|r| r.lat).sum::<f64>() / n;
    let lon = table.iter().map(|r| r.lon).sum::<f64>() / n;
    [lat, lon]
}

impl GeoRenderer for LeafletMapRenderer {
    fn incident_map(&self, table: &IncidentTable) -> Result<String, RenderError> {
        let markers = table
            .iter()
            .map(|r| Marker {
                lat: r.lat,
                lon: r.lon,
                popup: format!(
                    "Location: {}<br>Type: {}<br>Severity: {}",
                    escape_html(&r.location),
                    escape_html(&r.incident_type),
                    r.severity.value()
                ),
            })
            .collect();

        let data = MapData {
            center: center(table),
            zoom: self.style.zoom,
            radius: self.style.marker_radius,
            color: &self.style.marker_color,
            markers,
        };
        // keep "</script>" inside string values from closing the script block
        let json = serde_json::to_string(&data)?.replace("</", "<\\/");

        log::debug!("Rendered incident map with {} markers", table.len());

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Campus incident map</title>
<meta name="viewport" content="width=device-width, initial-scale=1">
<link rel="stylesheet" href="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
const data = {json};
const map = L.map("map").setView(data.center, data.zoom);
L.tileLayer("https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
  attribution: "&copy; OpenStreetMap contributors"
}}).addTo(map);
for (const m of data.markers) {{
  L.circleMarker([m.lat, m.lon], {{ radius: data.radius, color: data.color, fill: true }})
    .bindPopup(m.popup)
    .addTo(map);
}}
</script>
</body>
</html>
"#
        ))
    }
}

#[cfg(test)]
mod tests {
    use campus_safety_incident_models::{IncidentRecord, IncidentSeverity};
    use chrono::NaiveDate;

    use super::*;

    fn record(location: &str, incident_type: &str, lat: f64, lon: f64) -> IncidentRecord {
        IncidentRecord {
            occurred_at: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            location: location.to_string(),
            incident_type: incident_type.to_string(),
            severity: IncidentSeverity::High,
            lat,
            lon,
        }
    }

    #[test]
    fn one_marker_per_record_with_popup() {
        let table: IncidentTable = vec![
            record("Library", "theft", 40.0, -74.0),
            record("Gym", "fighting", 42.0, -72.0),
        ]
        .into_iter()
        .collect();

        let html = LeafletMapRenderer::default().incident_map(&table).unwrap();
        assert_eq!(html.matches("\"popup\":").count(), 2);
        assert!(html.contains("Location: Library<br>Type: theft<br>Severity: 4"));
        assert!(html.contains("\"center\":[41.0,-73.0]"));
        assert!(html.contains("\"zoom\":14"));
    }

    #[test]
    fn popup_values_are_escaped() {
        let table: IncidentTable = vec![record("<b>Hall</b>", "a&b", 1.0, 1.0)]
            .into_iter()
            .collect();
        let html = LeafletMapRenderer::default().incident_map(&table).unwrap();
        assert!(html.contains("&lt;b&gt;Hall&lt;/b&gt;"));
        assert!(html.contains("a&amp;b"));
        assert!(!html.contains("<b>Hall"));
    }

    #[test]
    fn script_close_tags_cannot_break_out() {
        let table: IncidentTable = vec![record("x", "</script><script>", 1.0, 1.0)]
            .into_iter()
            .collect();
        let html = LeafletMapRenderer::default().incident_map(&table).unwrap();
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn style_deserialises_camel_case() {
        let style: MapStyle = toml::from_str("markerRadius = 8.0\nmarkerColor = \"blue\"").unwrap();
        assert_eq!(style.zoom, 14);
        assert!((style.marker_radius - 8.0).abs() < f64::EPSILON);
        assert_eq!(style.marker_color, "blue");
    }

    #[test]
    fn empty_table_renders_at_origin() {
        let html = LeafletMapRenderer::default()
            .incident_map(&IncidentTable::default())
            .unwrap();
        assert!(html.contains("\"markers\":[]"));
        assert!(html.contains("\"center\":[0.0,0.0]"));
    }
}
