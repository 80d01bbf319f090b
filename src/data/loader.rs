use std::path::Path;

use anyhow::{Context, Result, bail};
use geojson::GeoJson;
use serde_json::Value as JsonValue;

use super::model::{Feature, FeatureCollection, Geometry, Position, Properties, PropertyValue};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a feature collection from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.geojson` / `.json` – a GeoJSON `FeatureCollection` or single `Feature`
/// * anything else       – CSV with latitude / longitude columns
pub fn load_file(path: &Path) -> Result<FeatureCollection> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    load_str(name, &text)
}

/// Parse in-memory file content, picking the format from the file name.
pub fn load_str(name: &str, text: &str) -> Result<FeatureCollection> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if ext.contains("geo") || ext.contains("json") {
        parse_geojson(text)
    } else {
        parse_csv(text)
    }
}

// ---------------------------------------------------------------------------
// GeoJSON
// ---------------------------------------------------------------------------

/// Parse GeoJSON text (RFC 7946). A bare `Feature` is accepted as a
/// collection of one.
pub fn parse_geojson(text: &str) -> Result<FeatureCollection> {
    let geojson: GeoJson = text.parse().context("parsing GeoJSON")?;
    from_geojson(geojson)
}

/// Convert an already parsed GeoJSON document.
pub fn from_geojson(geojson: GeoJson) -> Result<FeatureCollection> {
    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => {
            bail!("Expected a Feature or FeatureCollection, got a bare geometry")
        }
    };

    let features = features
        .into_iter()
        .enumerate()
        .map(|(i, f)| convert_feature(f).with_context(|| format!("Feature {i}")))
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureCollection::from_features(features))
}

fn convert_feature(feature: geojson::Feature) -> Result<Feature> {
    let geometry = feature
        .geometry
        .map(|g| convert_geometry(&g.value))
        .transpose()?;

    let properties = feature
        .properties
        .map(|props| {
            props
                .iter()
                .map(|(k, v)| (k.clone(), json_to_property(v)))
                .collect::<Properties>()
        })
        .unwrap_or_default();

    Ok(Feature {
        geometry,
        properties,
    })
}

fn convert_geometry(value: &geojson::Value) -> Result<Geometry> {
    use geojson::Value;

    Ok(match value {
        Value::Point(p) => Geometry::Point(position(p)?),
        Value::MultiPoint(ps) => Geometry::MultiPoint(positions(ps)?),
        Value::LineString(ps) => Geometry::LineString(positions(ps)?),
        Value::MultiLineString(lines) => Geometry::MultiLineString(
            lines.iter().map(|l| positions(l)).collect::<Result<Vec<_>>>()?,
        ),
        Value::Polygon(rings) => {
            Geometry::Polygon(rings.iter().map(|r| positions(r)).collect::<Result<Vec<_>>>()?)
        }
        Value::MultiPolygon(polys) => Geometry::MultiPolygon(
            polys
                .iter()
                .map(|rings| rings.iter().map(|r| positions(r)).collect::<Result<Vec<_>>>())
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::GeometryCollection(_) => bail!("GeometryCollection is not supported"),
    })
}

/// Longitude and latitude of a GeoJSON position; altitude is dropped.
fn position(p: &[f64]) -> Result<Position> {
    match p {
        [x, y, ..] => Ok([*x, *y]),
        _ => bail!("Position has {} values, expected at least 2", p.len()),
    }
}

fn positions(ps: &[Vec<f64>]) -> Result<Vec<Position>> {
    ps.iter().map(|p| position(p)).collect()
}

fn json_to_property(val: &JsonValue) -> PropertyValue {
    match val {
        JsonValue::String(s) => PropertyValue::String(s.clone()),
        JsonValue::Number(n) => match n.as_f64() {
            Some(f) => PropertyValue::Number(f),
            None => PropertyValue::String(n.to_string()),
        },
        JsonValue::Bool(b) => PropertyValue::Bool(*b),
        JsonValue::Null => PropertyValue::Null,
        other => PropertyValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV → Point features
// ---------------------------------------------------------------------------

const LAT_NAMES: [&str; 2] = ["latitude", "lat"];
const LON_NAMES: [&str; 3] = ["longitude", "lon", "lng"];

/// CSV layout: header row with column names, one Point feature per row.
/// Latitude and longitude columns are guessed from the headers; every column
/// (coordinates included) becomes a property.
pub fn parse_csv(text: &str) -> Result<FeatureCollection> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let lat_idx = guess_header(&headers, &LAT_NAMES).context("CSV has no latitude column")?;
    let lon_idx = guess_header(&headers, &LON_NAMES).context("CSV has no longitude column")?;

    let mut features = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let lat = parse_coordinate(record.get(lat_idx).unwrap_or(""), row_no, &headers[lat_idx])?;
        let lon = parse_coordinate(record.get(lon_idx).unwrap_or(""), row_no, &headers[lon_idx])?;

        let properties: Properties = headers
            .iter()
            .zip(record.iter())
            .map(|(col, value)| (col.clone(), guess_property_type(value)))
            .collect();

        features.push(Feature::new(Geometry::Point([lon, lat]), properties));
    }

    log::debug!(
        "CSV converted to {} points using '{}' / '{}'",
        features.len(),
        headers[lat_idx],
        headers[lon_idx]
    );
    Ok(FeatureCollection::from_features(features))
}

/// Pick the header that best matches one of `names`: the one where the match
/// covers the largest share of the header text.
fn guess_header(headers: &[String], names: &[&str]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, header) in headers.iter().enumerate() {
        let lower = header.to_ascii_lowercase();
        let Some(len) = names
            .iter()
            .filter(|n| lower.contains(*n))
            .map(|n| n.len())
            .max()
        else {
            continue;
        };
        let score = len as f64 / header.len() as f64;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

fn parse_coordinate(s: &str, row: usize, col: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .with_context(|| format!("Row {row}, {col}: '{s}' is not a number"))
}

fn guess_property_type(s: &str) -> PropertyValue {
    if s.is_empty() {
        return PropertyValue::Null;
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() {
            return PropertyValue::Number(f);
        }
    }
    if s == "true" || s == "false" {
        return PropertyValue::Bool(s == "true");
    }
    PropertyValue::String(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::GeometryType;

    const SAMPLE: &str = r#"{ "type": "FeatureCollection",
      "features": [
        { "type": "Feature",
          "geometry": {"type": "Point", "coordinates": [102.0, 0.5]},
          "properties": {"prop0": "value0", "prop1": -1}
        },
        { "type": "Feature",
          "geometry": {
            "type": "LineString",
            "coordinates": [[102.0, 0.0], [103.0, 1.0], [104.0, 0.0], [105.0, 1.0]]
          },
          "properties": {"prop0": "value1", "prop1": 0.0}
        },
        { "type": "Feature",
          "geometry": {
            "type": "Polygon",
            "coordinates": [[[100.0, 0.0], [101.0, 0.0], [101.0, 1.0], [100.0, 1.0], [100.0, 0.0]]]
          },
          "properties": {"prop0": "value0", "prop1": 1.0}
        }
      ]
    }"#;

    #[test]
    fn test_parse_geojson() {
        let fc = parse_geojson(SAMPLE).unwrap();
        assert_eq!(fc.len(), 3);
        assert_eq!(fc.geometry_type(), Some(GeometryType::Point));
        assert_eq!(fc.features[1].geometry_type(), Some(GeometryType::LineString));
        assert_eq!(fc.features[0].property("prop1"), &PropertyValue::Number(-1.0));
        assert_eq!(fc.column_names, vec!["prop0", "prop1"]);
    }

    #[test]
    fn test_property_order_is_preserved() {
        let text = r#"{"type": "Feature", "geometry": null,
            "properties": {"zz": 1, "GEOGRAPHY_CODE": "E01", "aa": 2}}"#;
        let fc = parse_geojson(text).unwrap();
        let keys: Vec<&str> = fc.features[0].properties.keys().collect();
        assert_eq!(keys, vec!["zz", "GEOGRAPHY_CODE", "aa"]);
        assert!(fc.features[0].geometry.is_none());
    }

    #[test]
    fn test_malformed_geojson_is_an_error() {
        assert!(parse_geojson("{ not json").is_err());
        assert!(parse_geojson(r#"{"type": "Point", "coordinates": [1, 2]}"#).is_err());
    }

    #[test]
    fn test_csv_guesses_coordinate_columns() {
        let text = "id,Latitude,Longitude,accident_severity\n1,53.8,-1.5,Slight\n2,53.9,-1.6,\n";
        let fc = parse_csv(text).unwrap();
        assert_eq!(fc.len(), 2);
        assert_eq!(fc.features[0].geometry, Some(Geometry::Point([-1.5, 53.8])));
        assert_eq!(fc.features[0].property("accident_severity"), &PropertyValue::from("Slight"));
        assert_eq!(fc.features[1].property("accident_severity"), &PropertyValue::Null);
        assert_eq!(fc.features[0].property("id"), &PropertyValue::Number(1.0));
    }

    #[test]
    fn test_csv_prefers_exact_header() {
        let headers: Vec<String> = ["lat_source", "lat", "lng"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(guess_header(&headers, &LAT_NAMES), Some(1));
        assert_eq!(guess_header(&headers, &LON_NAMES), Some(2));
    }

    #[test]
    fn test_csv_without_coordinates_fails() {
        assert!(parse_csv("a,b\n1,2\n").is_err());
        assert!(parse_csv("lat,lon\nx,2\n").is_err());
    }

    #[test]
    fn test_load_str_dispatches_on_name() {
        assert_eq!(load_str("crashes.geojson", SAMPLE).unwrap().len(), 3);
        assert_eq!(load_str("points.csv", "lat,lon\n1,2\n").unwrap().len(), 1);
    }
}
