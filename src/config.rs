use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Deployment the front end talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("development") {
            Environment::Development
        } else {
            Environment::Production
        }
    }

    /// Base URL of the statistics API.
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Development => "http://localhost:8000",
            Environment::Production => "https://map.saferactive.org",
        }
    }
}

/// Display and data defaults. Values can be overridden through environment
/// variables or a JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub radius: f64,
    pub elevation: f64,
    pub colour_name: String,
    /// Point collections smaller than this are drawn as icons.
    pub icon_limit: usize,
    pub environment: Environment,
    /// Overrides the environment's base URL.
    pub base_url: Option<String>,
    pub access_token: Option<String>,
    pub dataset: String,
    pub dark: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            radius: 250.0,
            elevation: 4.0,
            colour_name: "default".to_string(),
            icon_limit: 500,
            environment: Environment::Production,
            base_url: None,
            access_token: None,
            dataset: "stats19".to_string(),
            dark: false,
        }
    }
}

impl Settings {
    /// Defaults overridden by `CRASHMAP_*` variables and `MAPBOX_ACCESS_TOKEN`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let environment = std::env::var("CRASHMAP_ENV")
            .map(|v| Environment::from_name(&v))
            .unwrap_or(defaults.environment);
        let radius = std::env::var("CRASHMAP_RADIUS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.radius);
        let elevation = std::env::var("CRASHMAP_ELEVATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.elevation);
        let icon_limit = std::env::var("CRASHMAP_ICON_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.icon_limit);
        let base_url = std::env::var("CRASHMAP_BASE_URL").ok();
        let access_token = std::env::var("MAPBOX_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        Self {
            radius,
            elevation,
            icon_limit,
            environment,
            base_url,
            access_token,
            ..defaults
        }
    }

    /// Load settings from a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        serde_json::from_str(&text).context("parsing settings JSON")
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
            .trim_end_matches('/')
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }
}
