use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// PropertyValue – a single scalar in a feature's properties
// ---------------------------------------------------------------------------

/// A dynamically-typed property value as found in GeoJSON properties.
/// Using `BTreeMap` / `BTreeSet` downstream so `PropertyValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put PropertyValue in BTreeSet --

impl Eq for PropertyValue {}

impl PartialOrd for PropertyValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PropertyValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use PropertyValue::*;
        fn discriminant(v: &PropertyValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Number(_) => 2,
                String(_) => 3,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Number(a), Number(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for PropertyValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            PropertyValue::String(s) => s.hash(state),
            PropertyValue::Number(f) => f.to_bits().hash(state),
            PropertyValue::Bool(b) => b.hash(state),
            PropertyValue::Null => {}
        }
    }
}

/// Prints values the way the dashboard compares them: `1` rather than `1.0`,
/// `null` for missing data.
impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "{s}"),
            PropertyValue::Number(v) if v.is_infinite() => {
                write!(f, "{}Infinity", if *v < 0.0 { "-" } else { "" })
            }
            PropertyValue::Number(v) => write!(f, "{v}"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Null => write!(f, "null"),
        }
    }
}

impl PropertyValue {
    /// Try to interpret the value as an `f64` for numeric colour mapping.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, PropertyValue::Number(_))
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Number(v)
    }
}

// ---------------------------------------------------------------------------
// Properties – ordered name → value pairs
// ---------------------------------------------------------------------------

/// Feature properties in document order. "First property" and "property at
/// index N" refer to this order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, PropertyValue)>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: PropertyValue) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Name of the property at `index`.
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(|(k, _)| k.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, PropertyValue)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, PropertyValue)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Longitude, latitude.
pub type Position = [f64; 2];

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

/// Simple-features geometry type, used to dispatch layer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
}

impl GeometryType {
    /// The GeoJSON type name.
    pub fn sf_type(self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::LineString => "LineString",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPolygon => "MultiPolygon",
        }
    }

    /// Case-insensitive parse of a GeoJSON type name.
    pub fn from_sf_type(name: &str) -> Option<Self> {
        [
            GeometryType::Point,
            GeometryType::MultiPoint,
            GeometryType::LineString,
            GeometryType::MultiLineString,
            GeometryType::Polygon,
            GeometryType::MultiPolygon,
        ]
        .into_iter()
        .find(|t| t.sf_type().eq_ignore_ascii_case(name))
    }

    pub fn is_point(self) -> bool {
        self == GeometryType::Point
    }

    pub fn is_polygonal(self) -> bool {
        matches!(self, GeometryType::Polygon | GeometryType::MultiPolygon)
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sf_type())
    }
}

impl Geometry {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point(_) => GeometryType::Point,
            Geometry::MultiPoint(_) => GeometryType::MultiPoint,
            Geometry::LineString(_) => GeometryType::LineString,
            Geometry::MultiLineString(_) => GeometryType::MultiLineString,
            Geometry::Polygon(_) => GeometryType::Polygon,
            Geometry::MultiPolygon(_) => GeometryType::MultiPolygon,
        }
    }

    /// Every vertex, in document order.
    pub fn positions(&self) -> Vec<Position> {
        match self {
            Geometry::Point(p) => vec![*p],
            Geometry::MultiPoint(ps) | Geometry::LineString(ps) => ps.clone(),
            Geometry::MultiLineString(rings) | Geometry::Polygon(rings) => {
                rings.iter().flatten().copied().collect()
            }
            Geometry::MultiPolygon(polys) => polys.iter().flatten().flatten().copied().collect(),
        }
    }

    /// All coordinate scalars, flattened: `[x0, y0, x1, y1, ...]`.
    pub fn flat_coordinates(&self) -> Vec<f64> {
        self.positions().into_iter().flatten().collect()
    }

    pub fn first_position(&self) -> Option<Position> {
        match self {
            Geometry::Point(p) => Some(*p),
            Geometry::MultiPoint(ps) | Geometry::LineString(ps) => ps.first().copied(),
            Geometry::MultiLineString(rings) | Geometry::Polygon(rings) => {
                rings.iter().flatten().next().copied()
            }
            Geometry::MultiPolygon(polys) => polys.iter().flatten().flatten().next().copied(),
        }
    }

    pub fn last_position(&self) -> Option<Position> {
        match self {
            Geometry::Point(p) => Some(*p),
            Geometry::MultiPoint(ps) | Geometry::LineString(ps) => ps.last().copied(),
            Geometry::MultiLineString(rings) | Geometry::Polygon(rings) => {
                rings.iter().flatten().next_back().copied()
            }
            Geometry::MultiPolygon(polys) => {
                polys.iter().flatten().flatten().next_back().copied()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Feature – one geometry + properties record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// `None` when the source feature had a null geometry.
    pub geometry: Option<Geometry>,
    pub properties: Properties,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Properties) -> Self {
        Feature {
            geometry: Some(geometry),
            properties,
        }
    }

    pub fn geometry_type(&self) -> Option<GeometryType> {
        self.geometry.as_ref().map(Geometry::geometry_type)
    }

    /// Property value, `Null` when absent.
    pub fn property(&self, key: &str) -> &PropertyValue {
        self.properties.get(key).unwrap_or(&PropertyValue::Null)
    }
}

// ---------------------------------------------------------------------------
// FeatureCollection – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed collection with pre-computed column indices.
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    /// All features (rows), in source order.
    pub features: Vec<Feature>,
    /// Property names in first-seen order.
    pub column_names: Vec<String>,
    /// For each property the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<PropertyValue>>,
}

impl FeatureCollection {
    /// Build column indices from the loaded features.
    pub fn from_features(features: Vec<Feature>) -> Self {
        let mut column_names: Vec<String> = Vec::new();
        let mut unique_values: BTreeMap<String, BTreeSet<PropertyValue>> = BTreeMap::new();

        for feature in &features {
            for (col, val) in feature.properties.iter() {
                if !unique_values.contains_key(col) {
                    column_names.push(col.to_string());
                }
                unique_values
                    .entry(col.to_string())
                    .or_default()
                    .insert(val.clone());
            }
        }
        FeatureCollection {
            features,
            column_names,
            unique_values,
        }
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Geometry type of the whole collection, taken from its first feature.
    pub fn geometry_type(&self) -> Option<GeometryType> {
        self.features.first().and_then(Feature::geometry_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_dashboard_strings() {
        assert_eq!(PropertyValue::Number(1.0).to_string(), "1");
        assert_eq!(PropertyValue::Number(1.5).to_string(), "1.5");
        assert_eq!(PropertyValue::Number(-3.0).to_string(), "-3");
        assert_eq!(PropertyValue::Null.to_string(), "null");
        assert_eq!(PropertyValue::Bool(true).to_string(), "true");
        assert_eq!(PropertyValue::from("Slight").to_string(), "Slight");
    }

    #[test]
    fn test_properties_keep_document_order() {
        let props: Properties = [
            ("zeta", PropertyValue::Number(1.0)),
            ("alpha", PropertyValue::Null),
        ]
        .into_iter()
        .collect();
        assert_eq!(props.key_at(0), Some("zeta"));
        assert_eq!(props.key_at(1), Some("alpha"));
        assert_eq!(props.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_flat_coordinates() {
        let line = Geometry::LineString(vec![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(line.flat_coordinates(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(line.first_position(), Some([1.0, 2.0]));
        assert_eq!(line.last_position(), Some([3.0, 4.0]));

        let poly = Geometry::Polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]]]);
        assert_eq!(poly.positions().len(), 3);
    }

    #[test]
    fn test_endpoints_span_rings_and_parts() {
        let multi = Geometry::MultiPolygon(vec![
            vec![vec![[0.0, 0.0], [1.0, 0.0]], vec![]],
            vec![vec![], vec![[5.0, 5.0], [6.0, 7.0]]],
        ]);
        assert_eq!(multi.first_position(), Some([0.0, 0.0]));
        assert_eq!(multi.last_position(), Some([6.0, 7.0]));

        let lines = Geometry::MultiLineString(vec![
            vec![[1.0, 1.0]],
            vec![[2.0, 3.0], [4.0, 5.0]],
            vec![],
        ]);
        assert_eq!(lines.first_position(), Some([1.0, 1.0]));
        assert_eq!(lines.last_position(), Some([4.0, 5.0]));

        assert_eq!(Geometry::LineString(Vec::new()).first_position(), None);
        assert_eq!(Geometry::Point([9.0, 8.0]).last_position(), Some([9.0, 8.0]));
    }

    #[test]
    fn test_sf_type_is_case_insensitive() {
        assert_eq!(
            GeometryType::from_sf_type("linestring"),
            Some(GeometryType::LineString)
        );
        assert_eq!(GeometryType::from_sf_type("POINT"), Some(GeometryType::Point));
        assert_eq!(GeometryType::from_sf_type("GeometryCollection"), None);
    }

    #[test]
    fn test_collection_indices() {
        let f = |sev: &str, n: f64| {
            Feature::new(
                Geometry::Point([0.0, 0.0]),
                [
                    ("accident_severity", PropertyValue::from(sev)),
                    ("number_of_vehicles", PropertyValue::Number(n)),
                ]
                .into_iter()
                .collect(),
            )
        };
        let fc = FeatureCollection::from_features(vec![f("Slight", 1.0), f("Serious", 1.0)]);
        assert_eq!(fc.column_names, vec!["accident_severity", "number_of_vehicles"]);
        assert_eq!(fc.unique_values["accident_severity"].len(), 2);
        assert_eq!(fc.unique_values["number_of_vehicles"].len(), 1);
        assert_eq!(fc.geometry_type(), Some(GeometryType::Point));
    }
}
