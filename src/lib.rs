//! Crash map back end: load road-safety GeoJSON, filter it by the user's
//! selections and describe the map layer that shows the result.

pub mod api;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod format;
pub mod geo;
pub mod layer;
pub mod selector;
pub mod state;
pub mod tooltip;
