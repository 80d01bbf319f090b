use geojson::GeoJson;
use reqwest::blocking::Client;
use serde_json::Value as JsonValue;

use crate::config::Settings;
use crate::data::loader;
use crate::data::model::FeatureCollection;
use crate::error::{Alert, LoadError};
use crate::geo::BoundingBox;

// ---------------------------------------------------------------------------
// Datasets and endpoints
// ---------------------------------------------------------------------------

/// Datasets the sidebar can switch between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Casualties,
    Walking,
}

impl Dataset {
    pub const ALL: [Dataset; 2] = [Dataset::Casualties, Dataset::Walking];

    pub fn label(self) -> &'static str {
        match self {
            Dataset::Casualties => "Casualties",
            Dataset::Walking => "Walking",
        }
    }

    /// Path segment after `/api/`.
    pub fn path(self) -> &'static str {
        match self {
            Dataset::Casualties => "stats19",
            Dataset::Walking => "walking",
        }
    }
}

/// `{base}/api/{dataset}/{xmin}/{ymin}/{xmax}/{ymax}`, no trailing slash.
/// Without a box the API's `0/0/0/0` default extent is requested.
pub fn dataset_url(base_url: &str, dataset: &str, bbox: Option<&BoundingBox>) -> String {
    let base = base_url.trim_end_matches('/');
    match bbox {
        Some(b) => format!(
            "{base}/api/{dataset}/{}/{}/{}/{}",
            b.xmin, b.ymin, b.xmax, b.ymax
        ),
        None => format!("{base}/api/{dataset}/0/0/0/0"),
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Turn a response body into a collection.
///
/// The API answers errors with a JSON object carrying a `message` instead of
/// `features`; that message becomes the parse error.
pub fn parse_response(text: &str) -> Result<FeatureCollection, LoadError> {
    let value: JsonValue =
        serde_json::from_str(text).map_err(|e| LoadError::Parse(e.to_string()))?;

    if value.get("features").is_none() && value.get("type").is_none() {
        let message = value
            .get("message")
            .and_then(JsonValue::as_str)
            .unwrap_or("response holds no features");
        return Err(LoadError::Parse(message.to_string()));
    }

    let geojson = GeoJson::from_json_value(value).map_err(|e| LoadError::Parse(e.to_string()))?;
    let collection = loader::from_geojson(geojson).map_err(LoadError::parse)?;
    if collection.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(collection)
}

/// A freshly loaded collection plus anything the user should be told.
#[derive(Debug)]
pub struct Loaded {
    pub collection: FeatureCollection,
    pub alert: Option<Alert>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking client for the statistics API. No retries; the last request to
/// finish is the one the caller keeps.
pub struct ApiClient {
    http: Client,
    base_url: String,
    dataset: String,
}

impl ApiClient {
    pub fn new(settings: &Settings) -> Result<Self, LoadError> {
        let http = Client::builder().build().map_err(|e| LoadError::Fetch {
            url: settings.base_url().to_string(),
            reason: e.to_string(),
        })?;
        Ok(ApiClient {
            http,
            base_url: settings.base_url().to_string(),
            dataset: settings.dataset.clone(),
        })
    }

    pub fn with_dataset(mut self, dataset: Dataset) -> Self {
        self.dataset = dataset.path().to_string();
        self
    }

    pub fn default_url(&self) -> String {
        dataset_url(&self.base_url, &self.dataset, None)
    }

    /// URL for the data under a map viewport, trimmed by the query margin.
    pub fn viewport_url(&self, viewport: &BoundingBox) -> String {
        dataset_url(&self.base_url, &self.dataset, Some(&viewport.shrunk_for_query()))
    }

    /// GET `url` and parse the body.
    pub fn fetch(&self, url: &str) -> Result<FeatureCollection, LoadError> {
        log::info!("Fetching {url}");
        let fetch_error = |reason: String| LoadError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {status}")));
        }
        let body = response.text().map_err(|e| fetch_error(e.to_string()))?;

        let collection = parse_response(&body)?;
        log::info!("Loaded {} features from {url}", collection.len());
        Ok(collection)
    }

    pub fn fetch_default(&self) -> Result<FeatureCollection, LoadError> {
        self.fetch(&self.default_url())
    }

    pub fn fetch_viewport(&self, viewport: &BoundingBox) -> Result<FeatureCollection, LoadError> {
        self.fetch(&self.viewport_url(viewport))
    }

    /// Load user-supplied file content, falling back to the default dataset.
    pub fn import_or_default(&self, name: &str, text: &str) -> Result<Loaded, LoadError> {
        import_with_fallback(name, text, || self.fetch_default())
    }
}

/// Parse an imported file. When it cannot be parsed, `fallback` supplies the
/// collection instead and the parse failure rides along as the alert.
pub fn import_with_fallback<F>(name: &str, text: &str, fallback: F) -> Result<Loaded, LoadError>
where
    F: FnOnce() -> Result<FeatureCollection, LoadError>,
{
    match loader::load_str(name, text) {
        Ok(collection) if collection.is_empty() => Err(LoadError::Empty),
        Ok(collection) => Ok(Loaded {
            collection,
            alert: None,
        }),
        Err(e) => {
            let failure = LoadError::parse(e);
            log::warn!("Import of {name} failed, reloading default data: {failure}");
            let collection = fallback()?;
            Ok(Loaded {
                collection,
                alert: failure.alert(),
            })
        }
    }
}
