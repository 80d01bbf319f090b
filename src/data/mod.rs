/// Data layer: core types, loading, filtering and summaries.
///
/// Architecture:
/// ```text
///  API / .geojson / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse text → FeatureCollection
///   └──────────┘
///        │
///        ▼
///   ┌───────────────────┐
///   │ FeatureCollection │  Vec<Feature>, column index
///   └───────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  percent prefix, value selection, coordinates
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ summary   │  counts, domains, ranges for legends and tooltips
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
pub mod summary;
