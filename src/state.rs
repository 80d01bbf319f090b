use std::sync::Arc;

use crate::config::Settings;
use crate::data::filter::MultiVarSelection;
use crate::data::model::Feature;

// ---------------------------------------------------------------------------
// Base map style
// ---------------------------------------------------------------------------

/// Name of the map style choice that hides the base map.
pub const NO_MAP: &str = "No map";

/// Raster style used when no map access token is configured.
pub const OSM_TILES: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapStyle {
    /// A hosted vector style.
    Url(String),
    /// No base map.
    Blank,
    /// OpenStreetMap raster tiles.
    OsmTiles,
}

impl MapStyle {
    pub fn for_selection(name: &str, has_token: bool) -> Self {
        if name == NO_MAP {
            MapStyle::Blank
        } else if !has_token {
            MapStyle::OsmTiles
        } else {
            MapStyle::Url(format!("mapbox://styles/mapbox/{name}-v9"))
        }
    }

    /// Style shown before the user picks one.
    pub fn initial(dark: bool, has_token: bool) -> Self {
        Self::for_selection(if dark { "dark" } else { "streets" }, has_token)
    }

    /// What the style layer of the renderer is given.
    pub fn descriptor(&self) -> &str {
        match self {
            MapStyle::Url(url) => url,
            MapStyle::Blank => "",
            MapStyle::OsmTiles => OSM_TILES,
        }
    }
}

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// One user interaction, carrying what was selected.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCriterion {
    Column(String),
    Percent(f64),
    MultiSelect(MultiVarSelection),
    Coordinates(Vec<f64>),
    MapStyle(String),
    LayerStyle(String),
}

impl FilterCriterion {
    /// Criterion that keeps only features sharing `feature`'s coordinates,
    /// as produced by clicking it on the map.
    pub fn coordinates_of(feature: &Feature) -> Option<Self> {
        feature
            .geometry
            .as_ref()
            .map(|g| FilterCriterion::Coordinates(g.flat_coordinates()))
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Filter and display state carried between calls. Never mutated: every
/// update returns a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    radius: f64,
    elevation: f64,
    colour_name: String,
    column: Option<String>,
    layer_style: Option<String>,
    multi_select: Option<MultiVarSelection>,
    coordinates: Option<Vec<f64>>,
    filtered: Option<Arc<Vec<Feature>>>,
    map_style: MapStyle,
    icon_limit: usize,
    has_token: bool,
}

impl Session {
    pub fn new(settings: &Settings) -> Self {
        Session {
            radius: settings.radius,
            elevation: settings.elevation,
            colour_name: settings.colour_name.clone(),
            column: None,
            layer_style: None,
            multi_select: None,
            coordinates: None,
            filtered: None,
            map_style: MapStyle::initial(settings.dark, settings.has_access_token()),
            icon_limit: settings.icon_limit,
            has_token: settings.has_access_token(),
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    pub fn colour_name(&self) -> &str {
        &self.colour_name
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn layer_style(&self) -> Option<&str> {
        self.layer_style.as_deref()
    }

    pub fn multi_select(&self) -> Option<&MultiVarSelection> {
        self.multi_select.as_ref()
    }

    pub fn coordinates(&self) -> Option<&[f64]> {
        self.coordinates.as_deref()
    }

    /// Result of the previous filtering call.
    pub fn filtered(&self) -> Option<&Arc<Vec<Feature>>> {
        self.filtered.as_ref()
    }

    pub fn map_style(&self) -> &MapStyle {
        &self.map_style
    }

    pub fn icon_limit(&self) -> usize {
        self.icon_limit
    }

    pub fn has_token(&self) -> bool {
        self.has_token
    }

    pub fn with_radius(self, radius: f64) -> Self {
        Session { radius, ..self }
    }

    pub fn with_elevation(self, elevation: f64) -> Self {
        Session { elevation, ..self }
    }

    pub fn with_colour_name(self, colour_name: impl Into<String>) -> Self {
        Session {
            colour_name: colour_name.into(),
            ..self
        }
    }

    pub fn with_column(self, column: Option<String>) -> Self {
        Session { column, ..self }
    }

    pub fn with_layer_style(self, layer_style: impl Into<String>) -> Self {
        Session {
            layer_style: Some(layer_style.into()),
            ..self
        }
    }

    pub fn with_multi_select(self, selection: MultiVarSelection) -> Self {
        Session {
            multi_select: Some(selection),
            ..self
        }
    }

    pub fn with_coordinates(self, coordinates: Option<Vec<f64>>) -> Self {
        Session {
            coordinates,
            ..self
        }
    }

    pub fn with_filtered(self, filtered: Arc<Vec<Feature>>) -> Self {
        Session {
            filtered: Some(filtered),
            ..self
        }
    }

    pub fn with_map_style(self, map_style: MapStyle) -> Self {
        Session { map_style, ..self }
    }

    /// Drop the multi-value selection and the coordinate filter.
    pub fn without_filters(self) -> Self {
        Session {
            multi_select: None,
            coordinates: None,
            filtered: None,
            ..self
        }
    }

    /// Drop only the coordinate filter, as when the selected feature's popup
    /// is closed.
    pub fn cleared_coordinates(self) -> Self {
        Session {
            coordinates: None,
            filtered: None,
            ..self
        }
    }

    /// State for a freshly loaded collection: filters, column and layer
    /// style are forgotten; display settings and the base map stay.
    pub fn reset_for_new_data(self) -> Self {
        Session {
            column: None,
            layer_style: None,
            ..self.without_filters()
        }
    }
}
