use serde::Serialize;

/// A dismissible message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub content: String,
}

impl Alert {
    pub fn new(content: impl Into<String>) -> Self {
        Alert {
            content: content.into(),
        }
    }
}

/// Why a dataset could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Network failure or a non-2xx response.
    #[error("could not reach {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Malformed JSON, GeoJSON or CSV, or an API error message.
    #[error("{0}")]
    Parse(String),

    /// The source held no features.
    #[error("no features to show")]
    Empty,
}

impl LoadError {
    pub fn parse(err: anyhow::Error) -> Self {
        LoadError::Parse(format!("{err:#}"))
    }

    /// The alert to surface, if any. Empty results are not an error for the
    /// user.
    pub fn alert(&self) -> Option<Alert> {
        match self {
            LoadError::Fetch { url, .. } => Some(Alert::new(format!("Could not reach: {url}"))),
            LoadError::Parse(message) => Some(Alert::new(message.clone())),
            LoadError::Empty => None,
        }
    }
}
