//! Marker names and sizes for the icon cluster layer's atlas.

use crate::data::model::Properties;

pub const ICON_ATLAS: &str = "location-icon-atlas.png";

/// Crash markers present in the atlas: casualty type, optionally followed by
/// `-f` (fatal) or `-s` (serious).
const CRASH_MARKERS: [&str; 12] = [
    "marker-dr-f",
    "marker-pe-f",
    "marker-cy-f",
    "marker-fam-f",
    "marker-dr",
    "marker-pe",
    "marker-cy",
    "marker-fam",
    "marker-dr-s",
    "marker-pe-s",
    "marker-cy-s",
    "marker-fam-s",
];

/// Marker for a cluster of `size` points: exact up to 9, then by tens, capped
/// at 100.
pub fn cluster_icon_name(size: usize) -> String {
    match size {
        0 => String::new(),
        1..=9 => format!("marker-{size}"),
        10..=99 => format!("marker-{}0", size / 10),
        _ => "marker-100".to_string(),
    }
}

/// Scale factor for a cluster marker, between 1 and 2.
pub fn cluster_icon_size(size: usize) -> f64 {
    size.min(100) as f64 / 100.0 + 1.0
}

/// Marker for a single crash from its `casualty_type` and
/// `accident_severity`; the plain single-point marker when the atlas has no
/// matching icon.
pub fn crash_icon_name(properties: &Properties) -> String {
    let casualty = properties
        .get("casualty_type")
        .and_then(|v| v.as_str())
        .map(|s| s.chars().take(2).collect::<String>().to_lowercase());
    let severity = properties
        .get("accident_severity")
        .and_then(|v| v.as_str())
        .filter(|s| *s != "Slight")
        .and_then(|s| s.chars().next())
        .map(|c| c.to_lowercase().to_string());

    if let Some(casualty) = casualty {
        let name = match severity {
            Some(sev) => format!("marker-{casualty}-{sev}"),
            None => format!("marker-{casualty}"),
        };
        if CRASH_MARKERS.contains(&name.as_str()) {
            return name;
        }
    }
    cluster_icon_name(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::PropertyValue;

    #[test]
    fn test_cluster_icons() {
        assert_eq!(cluster_icon_name(0), "");
        assert_eq!(cluster_icon_name(7), "marker-7");
        assert_eq!(cluster_icon_name(54), "marker-50");
        assert_eq!(cluster_icon_name(2500), "marker-100");
        assert_eq!(cluster_icon_size(1), 1.01);
        assert_eq!(cluster_icon_size(500), 2.0);
    }

    #[test]
    fn test_crash_icons() {
        let props = |ct: &str, sev: &str| -> Properties {
            [
                ("casualty_type", PropertyValue::from(ct)),
                ("accident_severity", PropertyValue::from(sev)),
            ]
            .into_iter()
            .collect()
        };
        assert_eq!(crash_icon_name(&props("Pedestrian", "Slight")), "marker-pe");
        assert_eq!(crash_icon_name(&props("Cyclist", "Fatal")), "marker-cy-f");
        assert_eq!(crash_icon_name(&props("Driver", "Serious")), "marker-dr-s");
        assert_eq!(crash_icon_name(&props("Horse rider", "Slight")), "marker-1");
        assert_eq!(crash_icon_name(&Properties::new()), "marker-1");
    }
}
