use serde::Serialize;

use crate::color::{color_ramp, ColorScale, Rgb, Rgba};
use crate::data::model::{Feature, Geometry, GeometryType, Position};
use crate::data::summary::numeric_range;

use super::icon::crash_icon_name;
use super::LayerStyle;

// ---------------------------------------------------------------------------
// Option record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightSettings {
    pub lights_position: [f64; 6],
    pub ambient_ratio: f64,
    pub diffuse_ratio: f64,
    pub specular_ratio: f64,
    pub lights_strength: [f64; 4],
    pub number_of_lights: u8,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            lights_position: [-0.144528, 49.739968, 8000.0, -3.807751, 54.104682, 8000.0],
            ambient_ratio: 0.4,
            diffuse_ratio: 0.6,
            specular_ratio: 0.2,
            lights_strength: [0.8, 0.0, 0.8, 0.0],
            number_of_lights: 2,
        }
    }
}

/// Rendering options handed to the drawing surface.
///
/// Per-feature accessors are precomputed: every `Vec` is aligned with the
/// layer's data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOptions {
    pub radius: f64,
    pub cell_size: f64,
    pub elevation_scale: f64,
    pub light_settings: LightSettings,
    pub color_range: Option<[Rgb; 6]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_colors: Option<Vec<Rgba>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<Position>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<Vec<Position>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_positions: Option<Vec<Position>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_positions: Option<Vec<Position>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widths: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevations: Option<Vec<Option<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icons: Option<Vec<String>>,
    /// Clicking a feature selects it with a coordinate filter.
    pub select_on_click: bool,
}

impl RenderOptions {
    /// Options every layer gets.
    pub fn base(radius: f64, elevation: f64, colour_name: &str) -> Self {
        RenderOptions {
            radius,
            cell_size: radius,
            elevation_scale: elevation,
            light_settings: LightSettings::default(),
            color_range: color_ramp(colour_name),
            fill_colors: None,
            positions: None,
            color: None,
            paths: None,
            source_positions: None,
            target_positions: None,
            widths: None,
            elevations: None,
            icons: None,
            select_on_click: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Column references
// ---------------------------------------------------------------------------

/// A property chosen by name, or by position in the feature's properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Name(String),
    Index(usize),
}

impl ColumnRef {
    /// Property name this reference points to on `feature`.
    pub fn resolve<'a>(&'a self, feature: &'a Feature) -> Option<&'a str> {
        match self {
            ColumnRef::Name(name) => Some(name.as_str()),
            ColumnRef::Index(i) => feature.properties.key_at(*i),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Everything a handler may look at.
pub struct OptionContext<'a> {
    pub features: &'a [Feature],
    pub style: LayerStyle,
    /// Column picked in the sidebar, if any.
    pub column: Option<&'a str>,
}

type Handler = fn(&mut RenderOptions, &OptionContext<'_>);

/// Second property name of the statistical-area (census) datasets.
pub const STATISTICAL_AREA_CODE: &str = "GEOGRAPHY_CODE";
/// Column never used for extrusion in statistical-area datasets.
const YEAR_COLUMN: &str = "YEAR";
/// Above this many features line widths use the thin range.
const DENSE_LINE_COUNT: usize = 100_000;
const LINE_COLOR: Rgb = [235, 170, 20];

/// Fill in style- and geometry-specific options. Style handlers run first so
/// that geometry handlers can override them.
pub fn build_options(
    mut options: RenderOptions,
    geometry: GeometryType,
    ctx: &OptionContext<'_>,
) -> RenderOptions {
    style_handler(ctx.style)(&mut options, ctx);
    geometry_handler(geometry)(&mut options, ctx);
    options
}

fn style_handler(style: LayerStyle) -> Handler {
    match style {
        LayerStyle::Geojson => geojson_fill,
        LayerStyle::Heatmap => heatmap_positions,
        LayerStyle::Icon => crash_icons,
        LayerStyle::Grid
        | LayerStyle::Hex
        | LayerStyle::Sgrid
        | LayerStyle::Line
        | LayerStyle::Arc
        | LayerStyle::Path
        | LayerStyle::Scatterplot
        | LayerStyle::Text => no_options,
    }
}

fn geometry_handler(geometry: GeometryType) -> Handler {
    match geometry {
        GeometryType::LineString => line_options,
        GeometryType::Polygon | GeometryType::MultiPolygon => polygon_options,
        GeometryType::Point | GeometryType::MultiPoint | GeometryType::MultiLineString => {
            no_options
        }
    }
}

fn no_options(_: &mut RenderOptions, _: &OptionContext<'_>) {}

/// Fill by the first property.
fn geojson_fill(options: &mut RenderOptions, ctx: &OptionContext<'_>) {
    options.fill_colors = fill_colors(ctx.features, &ColumnRef::Index(0));
}

fn heatmap_positions(options: &mut RenderOptions, ctx: &OptionContext<'_>) {
    options.positions = Some(
        ctx.features
            .iter()
            .map(|f| {
                f.geometry
                    .as_ref()
                    .and_then(|g| g.first_position())
                    .unwrap_or([0.0, 0.0])
            })
            .collect(),
    );
}

fn crash_icons(options: &mut RenderOptions, ctx: &OptionContext<'_>) {
    options.icons = Some(
        ctx.features
            .iter()
            .map(|f| crash_icon_name(&f.properties))
            .collect(),
    );
}

fn line_options(options: &mut RenderOptions, ctx: &OptionContext<'_>) {
    let endpoint = |f: &Feature, pick: fn(&Geometry) -> Option<Position>| {
        f.geometry.as_ref().and_then(pick).unwrap_or([0.0, 0.0])
    };

    options.color = Some(LINE_COLOR);
    options.select_on_click = true;
    options.source_positions = Some(
        ctx.features
            .iter()
            .map(|f| endpoint(f, Geometry::first_position))
            .collect(),
    );
    options.target_positions = Some(
        ctx.features
            .iter()
            .map(|f| endpoint(f, Geometry::last_position))
            .collect(),
    );
    options.paths = Some(
        ctx.features
            .iter()
            .map(|f| f.geometry.as_ref().map(Geometry::positions).unwrap_or_default())
            .collect(),
    );

    // Default to the second property when no column is picked.
    let column_ref = match ctx.column {
        Some(name) => ColumnRef::Name(name.to_string()),
        None => ColumnRef::Index(1),
    };
    let Some(first) = ctx.features.first() else {
        return;
    };
    let Some(column) = column_ref.resolve(first) else {
        return;
    };
    if !first.property(column).is_number() {
        return;
    }
    let Some((min, max)) = numeric_range(ctx.features, column) else {
        return;
    };
    let (new_min, new_max) = if ctx.features.len() > DENSE_LINE_COUNT {
        (0.005, 0.5)
    } else {
        (0.1, 10.0)
    };
    let range = ValueRange {
        old_min: min,
        old_max: max,
        new_min,
        new_max,
    };
    options.widths = Some(
        ctx.features
            .iter()
            .map(|f| match f.property(column).as_f64() {
                Some(v) => convert_range(v, &range),
                None => new_min,
            })
            .collect(),
    );
}

fn polygon_options(options: &mut RenderOptions, ctx: &OptionContext<'_>) {
    let Some(first) = ctx.features.first() else {
        return;
    };
    let statistical_area = first.properties.key_at(1) == Some(STATISTICAL_AREA_CODE);

    if statistical_area {
        if let Some(column) = ctx.column {
            options.elevations = Some(
                ctx.features
                    .iter()
                    .map(|f| {
                        f.property(column)
                            .as_f64()
                            .filter(|v| column != YEAR_COLUMN && *v != 0.0 && !v.is_nan())
                    })
                    .collect(),
            );
        }
    }

    let column_ref = match ctx.column {
        Some(name) => ColumnRef::Name(name.to_string()),
        None if statistical_area => ColumnRef::Index(1),
        None => ColumnRef::Index(0),
    };
    options.fill_colors = fill_colors(ctx.features, &column_ref);
}

fn fill_colors(features: &[Feature], column: &ColumnRef) -> Option<Vec<Rgba>> {
    let first = features.first()?;
    let name = column.resolve(first)?;
    let scale = ColorScale::new(features, name);
    Some(features.iter().map(|f| scale.color_for(f)).collect())
}

// ---------------------------------------------------------------------------
// Range conversion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub old_min: f64,
    pub old_max: f64,
    pub new_min: f64,
    pub new_max: f64,
}

/// Map `value` linearly from the old range onto the new one, rounded to two
/// decimals. A degenerate old range maps everything to `new_min`.
pub fn convert_range(value: f64, range: &ValueRange) -> f64 {
    let old_span = range.old_max - range.old_min;
    if old_span == 0.0 || !old_span.is_finite() {
        return range.new_min;
    }
    let v = (value - range.old_min) * (range.new_max - range.new_min) / old_span + range.new_min;
    (v * 100.0).round() / 100.0
}
