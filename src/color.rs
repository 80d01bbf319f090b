use std::collections::HashMap;

use palette::Srgb;
use serde::Serialize;

use crate::data::model::{Feature, PropertyValue};
use crate::data::summary::value_counts;
use crate::format::humanize;

pub type Rgb = [u8; 3];
pub type Rgba = [u8; 4];

/// Alpha applied to colour-scale fills.
pub const FILL_ALPHA: u8 = 180;

/// Travel-time column whose seconds are bucketed into 5 minute bands.
pub const TRAVEL_TIME_COLUMN: &str = "Mean.Travel.Time..Seconds.";
const TRAVEL_TIME_BUCKET: f64 = 300.0;

// ---------------------------------------------------------------------------
// Named colour ramps (aggregation layers)
// ---------------------------------------------------------------------------

pub const COLOR_RAMP_NAMES: [&str; 6] = [
    "inverseDefault",
    "yellowblue",
    "greens",
    "oranges",
    "diverge",
    "default",
];

/// Six-stop colour ramp used by grid / hex / heatmap layers.
pub fn color_ramp(name: &str) -> Option<[Rgb; 6]> {
    let ramp = match name {
        "yellowblue" => [
            [255, 255, 204],
            [199, 233, 180],
            [127, 205, 187],
            [65, 182, 196],
            [44, 127, 184],
            [37, 52, 148],
        ],
        "greens" => [
            [237, 248, 233],
            [199, 233, 192],
            [161, 217, 155],
            [116, 196, 118],
            [49, 163, 84],
            [0, 109, 44],
        ],
        "oranges" => [
            [254, 237, 222],
            [253, 208, 162],
            [253, 174, 107],
            [253, 141, 60],
            [230, 85, 13],
            [166, 54, 3],
        ],
        "diverge" => [
            [140, 81, 10],
            [216, 179, 101],
            [246, 232, 195],
            [199, 234, 229],
            [90, 180, 172],
            [1, 102, 94],
        ],
        "inverseDefault" => [
            [189, 0, 38],
            [240, 59, 32],
            [253, 141, 60],
            [254, 178, 76],
            [254, 217, 118],
            [255, 255, 178],
        ],
        "default" => [
            [255, 255, 178],
            [254, 217, 118],
            [254, 178, 76],
            [253, 141, 60],
            [240, 59, 32],
            [189, 0, 38],
        ],
        _ => return None,
    };
    Some(ramp)
}

// ---------------------------------------------------------------------------
// Sequential orange-red scheme
// ---------------------------------------------------------------------------

const OR_RD: [Rgb; 9] = [
    [255, 247, 236],
    [254, 232, 200],
    [253, 212, 158],
    [253, 187, 132],
    [252, 141, 89],
    [239, 101, 72],
    [215, 48, 31],
    [179, 0, 0],
    [127, 0, 0],
];

/// Sample the orange-red scheme at `t` ∈ [0, 1] (clamped).
///
/// The nine stops are the control points of a uniform cubic B-spline per sRGB
/// channel, so the curve passes through the end stops and smooths past the
/// inner ones.
pub fn interpolate_or_rd(t: f64) -> Rgb {
    let t = (if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }) as f32;
    let stops: Vec<Srgb<f32>> = OR_RD
        .iter()
        .map(|&[r, g, b]| Srgb::new(r, g, b).into_format())
        .collect();
    let channel = |get: fn(&Srgb<f32>) -> f32| -> f32 {
        let values: Vec<f32> = stops.iter().map(get).collect();
        basis_spline(&values, t)
    };
    let out: Srgb<u8> = Srgb::new(
        channel(|c| c.red),
        channel(|c| c.green),
        channel(|c| c.blue),
    )
    .into_format();
    [out.red, out.green, out.blue]
}

/// Uniform cubic B-spline through `values`, with the end segments extended
/// linearly so `t = 0` and `t = 1` land on the first and last value.
fn basis_spline(values: &[f32], t: f32) -> f32 {
    let n = values.len() - 1;
    let i = if t >= 1.0 {
        n - 1
    } else {
        ((t * n as f32).floor() as usize).min(n - 1)
    };
    let v1 = values[i];
    let v2 = values[i + 1];
    let v0 = if i > 0 { values[i - 1] } else { 2.0 * v1 - v2 };
    let v3 = if i + 2 <= n { values[i + 2] } else { 2.0 * v2 - v1 };

    let t1 = (t - i as f32 / n as f32) * n as f32;
    let t2 = t1 * t1;
    let t3 = t2 * t1;
    ((1.0 - 3.0 * t1 + 3.0 * t2 - t3) * v0
        + (4.0 - 6.0 * t2 + 3.0 * t3) * v1
        + (1.0 + 3.0 * t1 + 3.0 * t2 - 3.0 * t3) * v2
        + t3 * v3)
        / 6.0
}

// ---------------------------------------------------------------------------
// Colour scale: property value → fill colour
// ---------------------------------------------------------------------------

/// Maps the unique values of a column onto the orange-red scheme by their
/// position in the (sorted when numeric) domain.
#[derive(Debug, Clone)]
pub struct ColorScale {
    pub column: String,
    domain: Vec<PropertyValue>,
    index: HashMap<PropertyValue, usize>,
}

impl ColorScale {
    /// Build a colour scale for `column` from the values present in `features`.
    pub fn new(features: &[Feature], column: &str) -> Self {
        let mut domain: Vec<PropertyValue> = Vec::new();
        let mut index: HashMap<PropertyValue, usize> = HashMap::new();
        for feature in features {
            let key = domain_key(column, feature.property(column));
            if !index.contains_key(&key) {
                index.insert(key.clone(), domain.len());
                domain.push(key);
            }
        }
        if domain.iter().all(PropertyValue::is_number) {
            domain.sort();
            index = domain
                .iter()
                .enumerate()
                .map(|(i, v)| (v.clone(), i))
                .collect();
        }
        ColorScale {
            column: column.to_string(),
            domain,
            index,
        }
    }

    pub fn domain(&self) -> &[PropertyValue] {
        &self.domain
    }

    /// Fill colour for a feature; values outside the domain get the lightest
    /// colour.
    pub fn color_for(&self, feature: &Feature) -> Rgba {
        let key = domain_key(&self.column, feature.property(&self.column));
        let position = self.index.get(&key).copied().unwrap_or(0);
        let [r, g, b] = interpolate_or_rd(position as f64 / self.domain.len().max(1) as f64);
        [r, g, b, FILL_ALPHA]
    }

    /// Return the legend entries (value label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Rgba)> {
        let n = self.domain.len().max(1) as f64;
        self.domain
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let [r, g, b] = interpolate_or_rd(i as f64 / n);
                (v.to_string(), [r, g, b, FILL_ALPHA])
            })
            .collect()
    }
}

fn domain_key(column: &str, value: &PropertyValue) -> PropertyValue {
    match value {
        PropertyValue::Number(v) if column == TRAVEL_TIME_COLUMN => {
            PropertyValue::Number((v / TRAVEL_TIME_BUCKET).floor())
        }
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Continuous legend for numeric columns
// ---------------------------------------------------------------------------

const LEGEND_STEPS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: String,
    pub min: f64,
    pub max: f64,
    pub swatches: Vec<Rgb>,
}

impl Legend {
    /// Ten-swatch legend for a numeric column, `None` when the column's
    /// values are not numeric.
    pub fn for_column(features: &[Feature], column: &str) -> Option<Legend> {
        let counts = value_counts(features, column);
        let min = counts.first()?.0.as_f64()?;
        let max = counts.last()?.0.as_f64()?;
        let scale = if column == TRAVEL_TIME_COLUMN {
            TRAVEL_TIME_BUCKET
        } else {
            1.0
        };
        Some(Legend {
            title: humanize(column),
            min: min / scale,
            max: max / scale,
            swatches: (0..LEGEND_STEPS)
                .map(|i| interpolate_or_rd(i as f64 / LEGEND_STEPS as f64))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Geometry, Properties};

    fn area(value: PropertyValue) -> Feature {
        Feature::new(
            Geometry::Point([0.0, 0.0]),
            [("value", value)].into_iter().collect::<Properties>(),
        )
    }

    #[test]
    fn test_named_ramps() {
        for name in COLOR_RAMP_NAMES {
            assert!(color_ramp(name).is_some(), "{name}");
        }
        assert_eq!(color_ramp("default").unwrap()[0], [255, 255, 178]);
        assert!(color_ramp("nope").is_none());
    }

    #[test]
    fn test_or_rd_endpoints() {
        assert_eq!(interpolate_or_rd(0.0), OR_RD[0]);
        assert_eq!(interpolate_or_rd(1.0), OR_RD[8]);
        assert_eq!(interpolate_or_rd(-3.0), OR_RD[0]);
        // Inner stops are smoothed by their neighbours: (v3 + 4 v4 + v5) / 6.
        assert_eq!(interpolate_or_rd(0.5), [250, 142, 93]);
    }

    #[test]
    fn test_numeric_scale_sorts_domain() {
        let data = vec![area(30.0.into()), area(10.0.into()), area(20.0.into())];
        let scale = ColorScale::new(&data, "value");
        assert_eq!(
            scale.domain(),
            &[
                PropertyValue::Number(10.0),
                PropertyValue::Number(20.0),
                PropertyValue::Number(30.0)
            ]
        );
        // Smallest value takes the first colour, with fill alpha.
        let [r, g, b, a] = scale.color_for(&data[1]);
        assert_eq!([r, g, b], OR_RD[0]);
        assert_eq!(a, FILL_ALPHA);
        assert_ne!(scale.color_for(&data[0]), scale.color_for(&data[1]));
    }

    #[test]
    fn test_categorical_scale_keeps_first_seen_order() {
        let data = vec![area("b".into()), area("a".into()), area("b".into())];
        let scale = ColorScale::new(&data, "value");
        assert_eq!(scale.domain(), &[PropertyValue::from("b"), PropertyValue::from("a")]);
        assert_eq!(scale.legend_entries()[0].0, "b");
        assert_eq!(scale.color_for(&data[0]), scale.color_for(&data[2]));
    }

    #[test]
    fn test_travel_time_is_bucketed() {
        let data = vec![
            Feature::new(
                Geometry::Point([0.0, 0.0]),
                [(TRAVEL_TIME_COLUMN, PropertyValue::Number(310.0))].into_iter().collect(),
            ),
            Feature::new(
                Geometry::Point([0.0, 0.0]),
                [(TRAVEL_TIME_COLUMN, PropertyValue::Number(590.0))].into_iter().collect(),
            ),
        ];
        let scale = ColorScale::new(&data, TRAVEL_TIME_COLUMN);
        assert_eq!(scale.domain(), &[PropertyValue::Number(1.0)]);
    }

    #[test]
    fn test_legend_for_numeric_column() {
        let data = vec![area(5.0.into()), area(1.0.into())];
        let legend = Legend::for_column(&data, "value").unwrap();
        assert_eq!(legend.title, "Value");
        assert_eq!((legend.min, legend.max), (1.0, 5.0));
        assert_eq!(legend.swatches.len(), 10);
        assert!(Legend::for_column(&[area("x".into())], "value").is_none());
    }
}
