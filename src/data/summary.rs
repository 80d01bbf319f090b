use std::collections::BTreeMap;

use super::model::{Feature, PropertyValue};

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Year part of a date string.
///
/// Both layouts served by the statistics API are understood:
/// `yyyy-mm-dd` and `dd/mm/yyyy`.
pub fn date_year(date: &str) -> Option<&str> {
    let date = date.trim();
    if date.contains('/') {
        return date.split('/').nth(2).filter(|y| !y.is_empty());
    }
    if date.contains('-') {
        return date.split('-').next().filter(|y| !y.is_empty());
    }
    None
}

// ---------------------------------------------------------------------------
// Frequency counts
// ---------------------------------------------------------------------------

/// Count how often each value of `column` occurs.
///
/// `dd/mm/yyyy` strings are counted by year, missing and null values are
/// skipped. Keys come out in first-seen order, or ascending when numeric.
pub fn value_counts(features: &[Feature], column: &str) -> Vec<(PropertyValue, usize)> {
    let mut order: Vec<PropertyValue> = Vec::new();
    let mut counts: BTreeMap<PropertyValue, usize> = BTreeMap::new();

    for feature in features {
        let value = match feature.properties.get(column) {
            None | Some(PropertyValue::Null) => continue,
            Some(PropertyValue::String(s)) if s.split('/').count() >= 3 => {
                match date_year(s) {
                    Some(year) => PropertyValue::String(year.to_string()),
                    None => PropertyValue::String(s.clone()),
                }
            }
            Some(v) => v.clone(),
        };
        let count = counts.entry(value.clone()).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    if order.first().is_some_and(PropertyValue::is_number) {
        order.sort();
    }
    order
        .into_iter()
        .map(|v| {
            let n = counts[&v];
            (v, n)
        })
        .collect()
}

/// Two-way count: for each year of `date_column`, how often each value of
/// `column` occurs. Features without a parseable year are skipped.
pub fn counts_by_year(
    features: &[Feature],
    column: &str,
    date_column: &str,
) -> BTreeMap<i32, BTreeMap<String, usize>> {
    let mut table: BTreeMap<i32, BTreeMap<String, usize>> = BTreeMap::new();
    for feature in features {
        let Some(year) = feature
            .property(date_column)
            .as_str()
            .and_then(date_year)
            .and_then(|y| y.parse::<i32>().ok())
        else {
            continue;
        };
        let value = match feature.property(column) {
            PropertyValue::Null => continue,
            v => v.to_string(),
        };
        *table.entry(year).or_default().entry(value).or_insert(0) += 1;
    }
    table
}

// ---------------------------------------------------------------------------
// Numeric columns
// ---------------------------------------------------------------------------

/// Minimum and maximum of the numeric values of `column`.
pub fn numeric_range(features: &[Feature], column: &str) -> Option<(f64, f64)> {
    features
        .iter()
        .filter_map(|f| f.property(column).as_f64())
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Unique values of `column` in first-seen order; sorted ascending when every
/// value is numeric.
pub fn column_domain(features: &[Feature], column: &str) -> Vec<PropertyValue> {
    let mut seen = std::collections::HashSet::new();
    let mut domain: Vec<PropertyValue> = features
        .iter()
        .map(|f| f.property(column).clone())
        .filter(|v| seen.insert(v.clone()))
        .collect();
    if domain.iter().all(PropertyValue::is_number) {
        domain.sort();
    }
    domain
}

// ---------------------------------------------------------------------------
// Sidebar control hint
// ---------------------------------------------------------------------------

/// Which kind of filter control suits a column with `n` unique values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlHint {
    Checkbox,
    Radio,
    ButtonGroups,
    Dropdown,
    Slider,
}

impl ControlHint {
    pub fn for_count(n: usize) -> Self {
        match n {
            0 => ControlHint::Radio,
            1 => ControlHint::Checkbox,
            2 | 3 => ControlHint::ButtonGroups,
            4..=6 => ControlHint::Radio,
            10..=14 => ControlHint::Dropdown,
            _ => ControlHint::Slider,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ControlHint::Checkbox => "checkbox",
            ControlHint::Radio => "radio",
            ControlHint::ButtonGroups => "buttongroups",
            ControlHint::Dropdown => "dropdown",
            ControlHint::Slider => "slider",
        }
    }
}
