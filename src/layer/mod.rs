//! Layer descriptions handed to the rendering surface.
//!
//! ```text
//!   style name ──► LayerStyle ──► StyleProps (fixed per style)
//!                                 RenderOptions (per data)  ──► Layer
//! ```

pub mod icon;
pub mod options;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::color::Rgba;
use crate::data::model::Feature;

use self::icon::ICON_ATLAS;
use self::options::RenderOptions;

// ---------------------------------------------------------------------------
// Layer styles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerStyle {
    Grid,
    Heatmap,
    Hex,
    Icon,
    Sgrid,
    Geojson,
    Line,
    Arc,
    Path,
    Scatterplot,
    Text,
}

impl LayerStyle {
    /// Styles offered in the sidebar for point data.
    pub const SELECTABLE: [LayerStyle; 5] = [
        LayerStyle::Grid,
        LayerStyle::Heatmap,
        LayerStyle::Hex,
        LayerStyle::Icon,
        LayerStyle::Sgrid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayerStyle::Grid => "grid",
            LayerStyle::Heatmap => "heatmap",
            LayerStyle::Hex => "hex",
            LayerStyle::Icon => "icon",
            LayerStyle::Sgrid => "sgrid",
            LayerStyle::Geojson => "geojson",
            LayerStyle::Line => "line",
            LayerStyle::Arc => "arc",
            LayerStyle::Path => "path",
            LayerStyle::Scatterplot => "scatterplot",
            LayerStyle::Text => "text",
        }
    }
}

impl fmt::Display for LayerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown layer style: {0}")]
pub struct UnknownStyle(pub String);

impl FromStr for LayerStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "grid" => LayerStyle::Grid,
            "heatmap" => LayerStyle::Heatmap,
            "hex" => LayerStyle::Hex,
            "icon" => LayerStyle::Icon,
            "sgrid" => LayerStyle::Sgrid,
            "geojson" => LayerStyle::Geojson,
            "line" => LayerStyle::Line,
            "arc" => LayerStyle::Arc,
            "path" => LayerStyle::Path,
            "scatterplot" => LayerStyle::Scatterplot,
            "text" => LayerStyle::Text,
            other => return Err(UnknownStyle(other.to_string())),
        })
    }
}

// ---------------------------------------------------------------------------
// Fixed per-style properties
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StyleProps {
    Hexagon {
        extruded: bool,
    },
    GeoJson {
        stroked: bool,
        filled: bool,
        extruded: bool,
        line_width_scale: f64,
        line_width_min_pixels: f64,
        fill_color: Rgba,
        line_color: Rgba,
    },
    IconCluster {
        icon_atlas: &'static str,
        size_scale: f64,
        wrap_longitude: bool,
    },
    ScreenGrid {
        cell_size_pixels: f64,
    },
    Grid {
        extruded: bool,
    },
    Scatterplot {
        opacity: f64,
    },
    Plain,
}

impl StyleProps {
    pub fn for_style(style: LayerStyle) -> Self {
        match style {
            LayerStyle::Hex => StyleProps::Hexagon { extruded: true },
            LayerStyle::Geojson => StyleProps::GeoJson {
                stroked: false,
                filled: true,
                extruded: true,
                line_width_scale: 20.0,
                line_width_min_pixels: 2.0,
                fill_color: [160, 160, 180, 200],
                line_color: [255, 160, 180, 200],
            },
            LayerStyle::Icon => StyleProps::IconCluster {
                icon_atlas: ICON_ATLAS,
                size_scale: 60.0,
                wrap_longitude: true,
            },
            LayerStyle::Sgrid => StyleProps::ScreenGrid {
                cell_size_pixels: 4.0,
            },
            LayerStyle::Grid => StyleProps::Grid { extruded: true },
            LayerStyle::Scatterplot => StyleProps::Scatterplot { opacity: 0.3 },
            LayerStyle::Heatmap
            | LayerStyle::Line
            | LayerStyle::Arc
            | LayerStyle::Path
            | LayerStyle::Text => StyleProps::Plain,
        }
    }
}

// ---------------------------------------------------------------------------
// Layer
// ---------------------------------------------------------------------------

/// One drawable layer: style, its data and rendering options.
#[derive(Debug, Clone, Serialize)]
pub struct Layer {
    pub style: LayerStyle,
    pub id: String,
    pub pickable: bool,
    #[serde(skip)]
    pub data: Arc<Vec<Feature>>,
    pub props: StyleProps,
    pub options: RenderOptions,
}

impl Layer {
    pub fn new(style: LayerStyle, data: Arc<Vec<Feature>>, options: RenderOptions) -> Self {
        Layer {
            style,
            id: format!("{style}-layer"),
            pickable: true,
            data,
            props: StyleProps::for_style(style),
            options,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Build the layer for `style_name`; unknown names give no layer.
pub fn build_layer(
    style_name: &str,
    data: Arc<Vec<Feature>>,
    options: RenderOptions,
) -> Option<Layer> {
    match style_name.parse::<LayerStyle>() {
        Ok(style) => Some(Layer::new(style, data, options)),
        Err(e) => {
            log::warn!("{e}");
            None
        }
    }
}
