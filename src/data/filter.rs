use std::collections::{BTreeMap, BTreeSet};

use super::model::{Feature, PropertyValue};
use super::summary::date_year;

// ---------------------------------------------------------------------------
// Multi-value selection: which string values are accepted per property
// ---------------------------------------------------------------------------

/// Per-property selection state: maps property name → set of accepted values.
/// Values are compared as strings, the way the sidebar hands them over.
pub type MultiVarSelection = BTreeMap<String, BTreeSet<String>>;

/// The property whose values are compared by year only.
pub const DATE_COLUMN: &str = "date";

/// Build a selection accepting a single value for a single property.
pub fn select_one(column: &str, value: &str) -> MultiVarSelection {
    let mut selection = MultiVarSelection::new();
    selection.insert(column.to_string(), BTreeSet::from([value.to_string()]));
    selection
}

/// The string a feature's property is compared under.
///
/// * `date` values are truncated to their year.
/// * Every other value is stringified (`1`, `1.5`, `null`, `true`).
pub fn comparable_value(feature: &Feature, column: &str) -> String {
    let value = feature.property(column);
    if column == DATE_COLUMN {
        if let PropertyValue::String(s) = value {
            return date_year(s).unwrap_or(s.as_str()).to_string();
        }
    }
    value.to_string()
}

/// Whether a feature passes every active key of the selection.
///
/// An empty accepted set hides everything; an empty selection accepts
/// everything.
pub fn matches_selection(feature: &Feature, selection: &MultiVarSelection) -> bool {
    selection
        .iter()
        .all(|(column, accepted)| accepted.contains(&comparable_value(feature, column)))
}

// ---------------------------------------------------------------------------
// Coordinate filter
// ---------------------------------------------------------------------------

/// Exact coordinate match: the symmetric difference between `target` and the
/// feature's flattened coordinate scalars must be empty.
pub fn matches_coordinates(feature: &Feature, target: &[f64]) -> bool {
    let Some(geometry) = &feature.geometry else {
        return target.is_empty();
    };
    let own: BTreeSet<u64> = geometry
        .flat_coordinates()
        .into_iter()
        .map(coordinate_key)
        .collect();
    let wanted: BTreeSet<u64> = target.iter().copied().map(coordinate_key).collect();
    own.symmetric_difference(&wanted).next().is_none()
}

/// `0.0` and `-0.0` compare equal, so normalise before taking the bits.
fn coordinate_key(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

// ---------------------------------------------------------------------------
// Percent subset
// ---------------------------------------------------------------------------

/// Deterministic prefix holding `percent` % of the features (not a sample).
pub fn percent_subset(features: &[Feature], percent: f64) -> &[Feature] {
    let percent = if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    };
    let keep = (percent / 100.0 * features.len() as f64).floor() as usize;
    &features[..keep.min(features.len())]
}

/// Return the features that pass the selection and, when given, the
/// coordinate filter, in their original order.
pub fn apply_filters(
    features: &[Feature],
    selection: &MultiVarSelection,
    coordinates: Option<&[f64]>,
) -> Vec<Feature> {
    features
        .iter()
        .filter(|f| matches_selection(f, selection))
        .filter(|f| coordinates.map_or(true, |target| matches_coordinates(f, target)))
        .cloned()
        .collect()
}
