//! Structured popup summaries. Field lists are explicit per-layer tables,
//! and unit scaling is recomputed from the raw property values every call —
//! nothing here caches display strings.

use super::feature::{GeoFeature, Village};

/// A label/value row in a popup.
#[derive(Clone, Debug, PartialEq)]
pub struct PopupRow {
    pub label: String,
    pub value: String,
}

impl PopupRow {
    fn new(label: &str, value: String) -> Self {
        Self { label: label.to_string(), value }
    }
}

/// Layer-specific summary of one feature's attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct PopupContent {
    pub title: String,
    pub badge: Option<String>,
    pub rows: Vec<PopupRow>,
}

/// Population scaled for state-level readability.
fn format_millions(raw: f64) -> String {
    format!("{:.1}M", raw / 1_000_000.0)
}

/// Population scaled for district/village-level readability.
fn format_thousands(raw: f64) -> String {
    format!("{:.1}K", raw / 1_000.0)
}

fn format_percent(raw: f64) -> String {
    format!("{raw:.1}%")
}

/// Acronym segments that keep their casing when humanized.
const ACRONYMS: [&str; 3] = ["fra", "id", "gps"];

/// Turn a camelCase property key into a display label
/// ("tribalPercentage" -> "Tribal Percentage", "fraClaimsCount" ->
/// "FRA Claims Count").
fn humanize_key(key: &str) -> String {
    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();
    for ch in key.chars() {
        if ch.is_uppercase() && !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
        .iter()
        .map(|segment| {
            let lower = segment.to_lowercase();
            if ACRONYMS.contains(&lower.as_str()) {
                lower.to_uppercase()
            } else {
                let mut out = String::with_capacity(segment.len());
                let mut chars = segment.chars();
                if let Some(first) = chars.next() {
                    out.extend(first.to_uppercase());
                }
                out.push_str(chars.as_str());
                out
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the popup for a feature on a layer.
pub fn build(feature: &GeoFeature, layer_id: &str) -> PopupContent {
    let title = feature.name().to_string();

    match layer_id {
        "state_boundaries" => {
            let mut rows = vec![
                PopupRow::new(
                    "Population",
                    format_millions(feature.prop_f64("population").unwrap_or(0.0)),
                ),
                PopupRow::new(
                    "Tribal Population",
                    format_millions(feature.prop_f64("tribalPopulation").unwrap_or(0.0)),
                ),
                PopupRow::new(
                    "Tribal %",
                    format_percent(feature.prop_f64("tribalPercentage").unwrap_or(0.0)),
                ),
                PopupRow::new(
                    "Forest Cover",
                    format_percent(feature.prop_f64("forestCover").unwrap_or(0.0)),
                ),
                PopupRow::new(
                    "Districts",
                    format!("{}", feature.prop_f64("districts").unwrap_or(0.0) as u64),
                ),
            ];
            rows.push(PopupRow::new(
                "FRA Priority",
                feature.prop_str("priority").unwrap_or("low").to_string(),
            ));
            PopupContent {
                title,
                badge: feature.prop_str("code").map(str::to_string),
                rows,
            }
        }
        "district_boundaries" => PopupContent {
            title,
            badge: feature.prop_str("state").map(str::to_string),
            rows: vec![
                PopupRow::new(
                    "Population",
                    format_thousands(feature.prop_f64("population").unwrap_or(0.0)),
                ),
                PopupRow::new(
                    "Tribal %",
                    format_percent(feature.prop_f64("tribalPercentage").unwrap_or(0.0)),
                ),
                PopupRow::new(
                    "Forest Cover",
                    format_percent(feature.prop_f64("forestCover").unwrap_or(0.0)),
                ),
                PopupRow::new(
                    "FRA Claims",
                    format!("{}", feature.prop_f64("fraClaimsCount").unwrap_or(0.0) as u64),
                ),
            ],
        },
        // Unknown layers surface every property except the name, humanized
        _ => PopupContent {
            title,
            badge: feature.prop_str("village").map(str::to_string),
            rows: feature
                .properties
                .iter()
                .filter(|(key, _)| key.as_str() != "name")
                .map(|(key, value)| PopupRow::new(&humanize_key(key), value.to_string()))
                .collect(),
        },
    }
}

/// Summary panel for the selected village (WebGIS info panel fields).
pub fn build_village(village: &Village) -> PopupContent {
    let tribal_share = if village.population > 0 {
        village.tribal_population as f64 / village.population as f64 * 100.0
    } else {
        0.0
    };
    PopupContent {
        title: village.name.clone(),
        badge: Some(format!("{}, {}", village.district, village.state)),
        rows: vec![
            PopupRow::new("Population", format!("{}", village.population)),
            PopupRow::new("Tribal Population", format!("{}", village.tribal_population)),
            PopupRow::new("Tribal Share", format_percent(tribal_share)),
            PopupRow::new("Forest Cover", format_percent(village.forest_cover)),
            PopupRow::new(
                "Water Index",
                format!(
                    "{:.0} ({})",
                    village.water_index,
                    if village.water_index > 60.0 { "Good" } else { "Needs Improvement" }
                ),
            ),
            PopupRow::new(
                "Forest Status",
                if village.forest_cover > 70.0 { "High" } else { "Moderate" }.to_string(),
            ),
            PopupRow::new(
                "Coordinates",
                format!("{:.4}°N, {:.4}°E", village.position.lat, village.position.lng),
            ),
        ],
    }
}
