//! Feature filter and layer selector.
//!
//! [`derive_layer`] takes the loaded collection, one user interaction and the
//! session, and returns the filtered features, the layer to draw and the next
//! session value.

use std::sync::Arc;

use crate::data::filter::{apply_filters, percent_subset, MultiVarSelection};
use crate::data::model::{Feature, FeatureCollection, GeometryType};
use crate::error::Alert;
use crate::layer::options::{build_options, OptionContext, RenderOptions};
use crate::layer::{build_layer, Layer, LayerStyle};
use crate::state::{FilterCriterion, MapStyle, Session};

pub const ICON_SWITCH_MESSAGE: &str = "Switched to icon mode. ";

// ---------------------------------------------------------------------------
// Request / result
// ---------------------------------------------------------------------------

/// One call's input besides the data and the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    /// `None` recomputes with the session's filters.
    pub criterion: Option<FilterCriterion>,
    pub radius: Option<f64>,
    pub elevation: Option<f64>,
    pub colour_name: Option<String>,
}

impl Request {
    /// Recolour/redraw with the current filters.
    pub fn redraw() -> Self {
        Request::default()
    }

    pub fn filter(criterion: FilterCriterion) -> Self {
        Request {
            criterion: Some(criterion),
            ..Request::default()
        }
    }

    pub fn with_radius(self, radius: f64) -> Self {
        Request {
            radius: Some(radius),
            ..self
        }
    }

    pub fn with_elevation(self, elevation: f64) -> Self {
        Request {
            elevation: Some(elevation),
            ..self
        }
    }

    pub fn with_colour_name(self, colour_name: impl Into<String>) -> Self {
        Request {
            colour_name: Some(colour_name.into()),
            ..self
        }
    }

    fn layer_style(&self) -> Option<&str> {
        match &self.criterion {
            Some(FilterCriterion::LayerStyle(name)) => Some(name.as_str()),
            _ => None,
        }
    }
}

/// A freshly drawn layer.
#[derive(Debug, Clone)]
pub struct Drawn {
    pub filtered: Arc<Vec<Feature>>,
    /// `None` when the style name has no layer.
    pub layer: Option<Layer>,
    pub alert: Option<Alert>,
    pub geometry_type: GeometryType,
    pub session: Session,
}

#[derive(Debug, Clone)]
pub enum Derived {
    /// Nothing to draw; the session is unchanged.
    Skipped(Session),
    /// Only the base map changed.
    BaseMap(Session),
    Drawn(Drawn),
}

impl Derived {
    pub fn session(&self) -> &Session {
        match self {
            Derived::Skipped(s) | Derived::BaseMap(s) => s,
            Derived::Drawn(d) => &d.session,
        }
    }

    pub fn into_session(self) -> Session {
        match self {
            Derived::Skipped(s) | Derived::BaseMap(s) => s,
            Derived::Drawn(d) => d.session,
        }
    }

    pub fn drawn(&self) -> Option<&Drawn> {
        match self {
            Derived::Drawn(d) => Some(d),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Filter `collection` and choose the layer for it.
pub fn derive_layer(
    collection: &FeatureCollection,
    request: &Request,
    session: &Session,
) -> Derived {
    let criterion = request.criterion.as_ref();

    if let Some(FilterCriterion::MapStyle(name)) = criterion {
        let style = MapStyle::for_selection(name, session.has_token());
        log::debug!("Base map style: {style:?}");
        return Derived::BaseMap(session.clone().with_map_style(style));
    }

    if collection.is_empty() {
        return Derived::Skipped(session.clone());
    }
    let Some(geometry) = collection.geometry_type() else {
        log::warn!("First feature has no geometry, nothing drawn");
        return Derived::Skipped(session.clone());
    };

    let column = match criterion {
        Some(FilterCriterion::Column(name)) => Some(name.clone()),
        _ => session.column().map(str::to_string),
    };

    // Starting set: percent prefix of the full data, unless a coordinate
    // filter is active, in which case the previous result is refined.
    let mut source: &[Feature] = &collection.features;
    if let Some(FilterCriterion::Percent(p)) = criterion {
        source = percent_subset(source, *p);
    }
    if session.coordinates().is_some() {
        if let Some(previous) = session.filtered() {
            source = previous.as_slice();
        }
    }

    let empty = MultiVarSelection::new();
    let selection = match criterion {
        Some(FilterCriterion::MultiSelect(selection)) => selection,
        _ => session.multi_select().unwrap_or(&empty),
    };
    let coordinates = match criterion {
        Some(FilterCriterion::Coordinates(c)) => Some(c.as_slice()),
        _ => session.coordinates(),
    };
    let filtered = Arc::new(apply_filters(source, selection, coordinates));

    let (style_name, alert) = choose_style(request, session, geometry, filtered.len());

    let radius = request.radius.unwrap_or(session.radius());
    let elevation = request.elevation.unwrap_or(session.elevation());
    let colour_name = request
        .colour_name
        .clone()
        .unwrap_or_else(|| session.colour_name().to_string());

    let options = match style_name.parse::<LayerStyle>() {
        Ok(style) => build_options(
            RenderOptions::base(radius, elevation, &colour_name),
            geometry,
            &OptionContext {
                features: &filtered,
                style,
                column: column.as_deref(),
            },
        ),
        Err(_) => RenderOptions::base(radius, elevation, &colour_name),
    };
    let layer = build_layer(&style_name, Arc::clone(&filtered), options);
    log::info!(
        "{} of {} features drawn as {style_name}",
        filtered.len(),
        collection.len()
    );

    let mut next = session
        .clone()
        .with_column(column)
        .with_colour_name(colour_name)
        .with_radius(radius)
        .with_elevation(elevation)
        .with_filtered(Arc::clone(&filtered));
    match criterion {
        Some(FilterCriterion::LayerStyle(name)) => next = next.with_layer_style(name.clone()),
        Some(FilterCriterion::MultiSelect(selection)) => {
            next = next.with_multi_select(selection.clone())
        }
        Some(FilterCriterion::Coordinates(c)) => next = next.with_coordinates(Some(c.clone())),
        _ => {}
    }

    Derived::Drawn(Drawn {
        filtered,
        layer,
        alert,
        geometry_type: geometry,
        session: next,
    })
}

/// Style name for this call, plus the alert when icons were switched on.
fn choose_style(
    request: &Request,
    session: &Session,
    geometry: GeometryType,
    count: usize,
) -> (String, Option<Alert>) {
    let explicit = request.layer_style();
    let mut style = explicit
        .or(session.layer_style())
        .unwrap_or(LayerStyle::Grid.as_str())
        .to_string();
    if !geometry.is_point() {
        style = LayerStyle::Geojson.to_string();
    }

    let switch_to_icon = geometry == GeometryType::Point
        && count < session.icon_limit()
        && session.layer_style().is_none()
        && explicit.is_none();
    let mut alert = None;
    if switch_to_icon {
        style = LayerStyle::Icon.to_string();
        alert = Some(Alert::new(ICON_SWITCH_MESSAGE));
    }

    if geometry == GeometryType::LineString {
        style = LayerStyle::Line.to_string();
    }
    (style, alert)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::data::filter::select_one;
    use crate::data::model::{Geometry, Properties, PropertyValue};

    fn crash(i: usize) -> Feature {
        let severity = if i % 3 == 0 { "Serious" } else { "Slight" };
        Feature::new(
            Geometry::Point([-1.5 + i as f64 * 0.001, 53.8]),
            [
                ("accident_severity", PropertyValue::from(severity)),
                ("date", PropertyValue::from(format!("201{}-03-04", i % 2).as_str())),
                ("speed_limit", PropertyValue::Number(30.0)),
            ]
            .into_iter()
            .collect(),
        )
    }

    fn crashes(n: usize) -> FeatureCollection {
        FeatureCollection::from_features((0..n).map(crash).collect())
    }

    fn session() -> Session {
        Session::new(&Settings::default())
    }

    fn drawn(derived: Derived) -> Drawn {
        match derived {
            Derived::Drawn(d) => d,
            other => panic!("expected a drawn layer, got {other:?}"),
        }
    }

    fn style_of(d: &Drawn) -> LayerStyle {
        d.layer.as_ref().map(|l| l.style).unwrap()
    }

    #[test]
    fn test_multi_select_keeps_subset() {
        let data = crashes(30);
        let criterion = FilterCriterion::MultiSelect(select_one("accident_severity", "Serious"));
        let d = drawn(derive_layer(&data, &Request::filter(criterion), &session()));
        assert_eq!(d.filtered.len(), 10);
        assert!(d.filtered.iter().all(|f| {
            f.property("accident_severity") == &PropertyValue::from("Serious")
                && data.features.contains(f)
        }));
        assert!(d.session.multi_select().is_some());
    }

    #[test]
    fn test_date_selection_compares_year() {
        let data = crashes(10);
        let criterion = FilterCriterion::MultiSelect(select_one("date", "2011"));
        let d = drawn(derive_layer(&data, &Request::filter(criterion), &session()));
        assert_eq!(d.filtered.len(), 5);
    }

    #[test]
    fn test_persisted_selection_survives_redraw() {
        let data = crashes(30);
        let first = derive_layer(
            &data,
            &Request::filter(FilterCriterion::MultiSelect(select_one(
                "accident_severity",
                "Serious",
            ))),
            &session(),
        );
        let d = drawn(derive_layer(
            &data,
            &Request::redraw().with_radius(500.0),
            first.session(),
        ));
        assert_eq!(d.filtered.len(), 10);
        assert_eq!(d.session.radius(), 500.0);
        let options = &d.layer.unwrap().options;
        assert_eq!(options.cell_size, 500.0);
    }

    #[test]
    fn test_percent_keeps_prefix() {
        let data = crashes(10);
        let d = drawn(derive_layer(
            &data,
            &Request::filter(FilterCriterion::Percent(50.0)),
            &session(),
        ));
        assert_eq!(d.filtered.as_slice(), &data.features[..5]);
    }

    #[test]
    fn test_coordinate_self_match() {
        let data = crashes(10);
        let target = &data.features[4];
        let criterion = FilterCriterion::coordinates_of(target).unwrap();
        let d = drawn(derive_layer(&data, &Request::filter(criterion), &session()));
        assert_eq!(d.filtered.as_slice(), std::slice::from_ref(target));
        assert!(d.session.coordinates().is_some());

        // With a coordinate filter active, later calls refine the previous
        // result instead of the full data.
        let next = drawn(derive_layer(&data, &Request::redraw(), &d.session));
        assert_eq!(next.filtered.len(), 1);
    }

    #[test]
    fn test_linestring_always_line() {
        let road = |i: usize| {
            Feature::new(
                Geometry::LineString(vec![[i as f64, 0.0], [i as f64, 1.0]]),
                [
                    ("name", PropertyValue::from("A61")),
                    ("flow", PropertyValue::Number(i as f64)),
                ]
                .into_iter()
                .collect(),
            )
        };
        let data = FeatureCollection::from_features((0..4).map(road).collect());
        let persisted = session().with_layer_style("hex");
        let d = drawn(derive_layer(&data, &Request::redraw(), &persisted));
        assert_eq!(style_of(&d), LayerStyle::Line);
        assert!(d.alert.is_none());
        let widths = d.layer.unwrap().options.widths.unwrap();
        assert_eq!(widths, vec![0.1, 3.4, 6.7, 10.0]);
    }

    #[test]
    fn test_icon_switch_for_small_point_sets() {
        let d = drawn(derive_layer(&crashes(10), &Request::redraw(), &session()));
        assert_eq!(style_of(&d), LayerStyle::Icon);
        assert_eq!(d.alert, Some(Alert::new(ICON_SWITCH_MESSAGE)));
        // Auto-switching does not persist a style.
        assert!(d.session.layer_style().is_none());

        let d = drawn(derive_layer(&crashes(1000), &Request::redraw(), &session()));
        assert_eq!(style_of(&d), LayerStyle::Grid);
        assert!(d.alert.is_none());
    }

    #[test]
    fn test_explicit_style_wins_and_persists() {
        let data = crashes(10);
        let d = drawn(derive_layer(
            &data,
            &Request::filter(FilterCriterion::LayerStyle("heatmap".into())),
            &session(),
        ));
        assert_eq!(style_of(&d), LayerStyle::Heatmap);
        assert!(d.alert.is_none());
        assert_eq!(d.session.layer_style(), Some("heatmap"));
        assert_eq!(d.layer.unwrap().options.positions.map(|p| p.len()), Some(10));

        let again = drawn(derive_layer(&data, &Request::redraw(), &d.session));
        assert_eq!(style_of(&again), LayerStyle::Heatmap);
        assert!(again.alert.is_none());
    }

    #[test]
    fn test_unknown_style_yields_no_layer() {
        let d = drawn(derive_layer(
            &crashes(1000),
            &Request::filter(FilterCriterion::LayerStyle("choropleth".into())),
            &session(),
        ));
        assert!(d.layer.is_none());
        assert_eq!(d.filtered.len(), 1000);
    }

    #[test]
    fn test_polygons_forced_to_geojson() {
        let zone = |code: &str, n: f64| {
            Feature::new(
                Geometry::Polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]),
                [
                    ("YEAR", PropertyValue::Number(2011.0)),
                    ("GEOGRAPHY_CODE", PropertyValue::from(code)),
                    ("population", PropertyValue::Number(n)),
                ]
                .into_iter()
                .collect(),
            )
        };
        let data = FeatureCollection::from_features(vec![zone("E01", 10.0), zone("E02", 0.0)]);
        let d = drawn(derive_layer(
            &data,
            &Request::filter(FilterCriterion::Column("population".into())),
            &session().with_layer_style("hex"),
        ));
        assert_eq!(style_of(&d), LayerStyle::Geojson);
        assert_eq!(d.session.column(), Some("population"));
        let options = d.layer.unwrap().options;
        assert_eq!(options.elevations, Some(vec![Some(10.0), None]));
        assert!(options.fill_colors.is_some());
    }

    #[test]
    fn test_reset_matches_fresh_session() {
        let data = crashes(30);
        let fresh = drawn(derive_layer(&data, &Request::redraw(), &session()));

        let filtered = derive_layer(
            &data,
            &Request::filter(FilterCriterion::MultiSelect(select_one(
                "accident_severity",
                "Serious",
            ))),
            &session(),
        );
        let reset = filtered.into_session().reset_for_new_data();
        let again = drawn(derive_layer(&data, &Request::redraw(), &reset));

        assert_eq!(again.filtered, fresh.filtered);
        assert_eq!(style_of(&again), style_of(&fresh));
        assert_eq!(again.alert, fresh.alert);
    }

    #[test]
    fn test_clearing_filters_after_coordinate_click_matches_fresh_session() {
        let data = crashes(600);
        let fresh = drawn(derive_layer(&data, &Request::redraw(), &session()));

        let click = FilterCriterion::coordinates_of(&data.features[3]).unwrap();
        let clicked = drawn(derive_layer(&data, &Request::filter(click), &session()));
        let serious = FilterCriterion::MultiSelect(select_one("accident_severity", "Serious"));
        let narrowed = drawn(derive_layer(
            &data,
            &Request::filter(serious),
            &clicked.session,
        ));
        assert_eq!(narrowed.filtered.as_slice(), &data.features[3..4]);

        let cleared = narrowed.session.without_filters();
        assert!(cleared.multi_select().is_none());
        assert!(cleared.coordinates().is_none());
        let again = drawn(derive_layer(&data, &Request::redraw(), &cleared));
        assert_eq!(again.filtered.len(), 600);
        assert_eq!(again.filtered, fresh.filtered);
        assert_eq!(style_of(&again), style_of(&fresh));
        assert_eq!(again.alert, fresh.alert);
    }

    #[test]
    fn test_closing_selection_keeps_value_filter_on_full_data() {
        let data = crashes(600);
        let click = FilterCriterion::coordinates_of(&data.features[3]).unwrap();
        let clicked = drawn(derive_layer(&data, &Request::filter(click), &session()));
        let serious = FilterCriterion::MultiSelect(select_one("accident_severity", "Serious"));
        let narrowed = drawn(derive_layer(
            &data,
            &Request::filter(serious),
            &clicked.session,
        ));
        assert_eq!(narrowed.filtered.len(), 1);

        let closed = narrowed.session.cleared_coordinates();
        assert!(closed.multi_select().is_some());
        let again = drawn(derive_layer(&data, &Request::redraw(), &closed));
        // Every third crash is serious; the previous single-feature result
        // no longer restricts the search.
        assert_eq!(again.filtered.len(), 200);
        assert!(again
            .filtered
            .iter()
            .all(|f| f.property("accident_severity") == &PropertyValue::from("Serious")));
        assert!(again.session.coordinates().is_none());
    }

    #[test]
    fn test_map_style_leaves_data_alone() {
        let s = session().with_layer_style("hex");
        let derived = derive_layer(
            &crashes(10),
            &Request::filter(FilterCriterion::MapStyle("No map".into())),
            &s,
        );
        assert!(matches!(derived, Derived::BaseMap(_)));
        assert_eq!(derived.session().map_style(), &MapStyle::Blank);
        assert_eq!(derived.session().layer_style(), Some("hex"));
        assert!(derived.session().filtered().is_none());
    }

    #[test]
    fn test_empty_or_geometry_less_input_is_skipped() {
        let s = session();
        let derived = derive_layer(&FeatureCollection::default(), &Request::redraw(), &s);
        assert!(matches!(&derived, Derived::Skipped(out) if *out == s));

        let bare = FeatureCollection::from_features(vec![Feature {
            geometry: None,
            properties: Properties::new(),
        }]);
        assert!(matches!(
            derive_layer(&bare, &Request::redraw(), &s),
            Derived::Skipped(_)
        ));
    }
}
