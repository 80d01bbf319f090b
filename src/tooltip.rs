//! Summaries shown when hovering features, clusters or grid cells.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::filter::DATE_COLUMN;
use crate::data::model::{Feature, PropertyValue};
use crate::data::summary::{counts_by_year, date_year, value_counts};
use crate::format::humanize;

pub const SEVERITY_COLUMN: &str = "accident_severity";

/// What the pointer is over.
#[derive(Debug, Clone, Copy)]
pub enum Hovered<'a> {
    Feature(&'a Feature),
    /// An icon cluster; only its size is known.
    Cluster { point_count: usize },
    /// The points aggregated into one hexagon or grid cell.
    Points(&'a [Feature]),
}

/// Property names and values, one row per property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TooltipSummary {
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertyTable>,
    /// Crashes per severity, in first-seen order.
    pub severity_counts: Vec<(String, usize)>,
    pub crashes_by_year: BTreeMap<i32, usize>,
    /// Per severity, the yearly counts.
    pub severity_by_year: BTreeMap<String, Vec<(i32, usize)>>,
}

impl TooltipSummary {
    pub fn new(hovered: Hovered<'_>) -> Self {
        match hovered {
            Hovered::Feature(feature) => TooltipSummary {
                total: 1,
                properties: Some(property_table(std::slice::from_ref(feature))),
                ..Default::default()
            },
            Hovered::Cluster { point_count } => TooltipSummary {
                total: point_count,
                ..Default::default()
            },
            Hovered::Points(points) => points_summary(points),
        }
    }

    /// Whether a multi-line chart (one line per severity) is worth drawing.
    pub fn has_severity_series(&self) -> bool {
        self.severity_by_year.len() > 1
    }
}

fn points_summary(points: &[Feature]) -> TooltipSummary {
    let severity_counts = value_counts(points, SEVERITY_COLUMN)
        .into_iter()
        .map(|(v, n)| (v.to_string(), n))
        .collect();

    let mut crashes_by_year: BTreeMap<i32, usize> = BTreeMap::new();
    for year in points.iter().filter_map(year_of) {
        *crashes_by_year.entry(year).or_insert(0) += 1;
    }

    let mut severity_by_year: BTreeMap<String, Vec<(i32, usize)>> = BTreeMap::new();
    for (year, counts) in counts_by_year(points, SEVERITY_COLUMN, DATE_COLUMN) {
        for (severity, n) in counts {
            severity_by_year.entry(severity).or_default().push((year, n));
        }
    }

    TooltipSummary {
        total: points.len(),
        properties: (!points.is_empty() && points.len() <= 2).then(|| property_table(points)),
        severity_counts,
        crashes_by_year,
        severity_by_year,
    }
}

fn year_of(feature: &Feature) -> Option<i32> {
    feature
        .property(DATE_COLUMN)
        .as_str()
        .and_then(date_year)
        .and_then(|y| y.parse().ok())
}

/// Rows keyed by the first feature's properties, one value column per
/// feature.
fn property_table(features: &[Feature]) -> PropertyTable {
    let columns = match features.len() {
        2 => vec!["Property", "Value p1", "Value p2"],
        _ => vec!["Property", "Value"],
    };
    let rows: Vec<Vec<String>> = features
        .first()
        .map(|first| {
            first
                .properties
                .keys()
                .map(|key| {
                    std::iter::once(humanize(key))
                        .chain(features.iter().map(|f| cell(f.property(key))))
                        .collect::<Vec<String>>()
                })
                .collect()
        })
        .unwrap_or_default();
    PropertyTable {
        columns: columns.into_iter().map(String::from).collect(),
        rows,
    }
}

fn cell(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Null => String::new(),
        v => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Geometry, Properties};

    fn crash(severity: &str, date: &str) -> Feature {
        Feature::new(
            Geometry::Point([-1.5, 53.8]),
            [
                ("accident_severity", PropertyValue::from(severity)),
                ("date", PropertyValue::from(date)),
            ]
            .into_iter()
            .collect::<Properties>(),
        )
    }

    #[test]
    fn test_single_feature_lists_properties() {
        let f = crash("Fatal", "01/02/2015");
        let s = TooltipSummary::new(Hovered::Feature(&f));
        assert_eq!(s.total, 1);
        let table = s.properties.unwrap();
        assert_eq!(table.columns, vec!["Property", "Value"]);
        assert_eq!(table.rows[0], vec!["Accident Severity", "Fatal"]);
        assert_eq!(table.rows[1], vec!["Date", "01/02/2015"]);
    }

    #[test]
    fn test_cluster_only_counts() {
        let s = TooltipSummary::new(Hovered::Cluster { point_count: 54 });
        assert_eq!(s.total, 54);
        assert!(s.properties.is_none());
        assert!(s.crashes_by_year.is_empty());
    }

    #[test]
    fn test_two_points_side_by_side() {
        let points = vec![crash("Slight", "01/02/2015"), crash("Serious", "03/04/2016")];
        let s = TooltipSummary::new(Hovered::Points(&points));
        let table = s.properties.unwrap();
        assert_eq!(table.columns, vec!["Property", "Value p1", "Value p2"]);
        assert_eq!(table.rows[0], vec!["Accident Severity", "Slight", "Serious"]);
    }

    #[test]
    fn test_points_aggregate_by_year_and_severity() {
        let points = vec![
            crash("Slight", "01/02/2015"),
            crash("Slight", "05/06/2015"),
            crash("Serious", "03/04/2016"),
        ];
        let s = TooltipSummary::new(Hovered::Points(&points));
        assert_eq!(s.total, 3);
        assert!(s.properties.is_none());
        assert_eq!(
            s.severity_counts,
            vec![("Slight".to_string(), 2), ("Serious".to_string(), 1)]
        );
        assert_eq!(s.crashes_by_year, BTreeMap::from([(2015, 2), (2016, 1)]));
        assert_eq!(s.severity_by_year["Slight"], vec![(2015, 2)]);
        assert_eq!(s.severity_by_year["Serious"], vec![(2016, 1)]);
        assert!(s.has_severity_series());
    }
}
