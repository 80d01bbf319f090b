use serde::Serialize;

use crate::data::model::{Feature, Position};

// ---------------------------------------------------------------------------
// Bounding boxes
// ---------------------------------------------------------------------------

/// Axis-aligned box in longitude / latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

/// Margin trimmed off the viewport before asking the API for data.
const QUERY_MARGIN: f64 = 0.05;

impl BoundingBox {
    /// Box spanned by two corners given in any order, e.g. a map viewport's
    /// south-west and north-east corners after wrapping.
    pub fn from_corners(a: Position, b: Position) -> Self {
        BoundingBox {
            xmin: a[0].min(b[0]),
            ymin: a[1].min(b[1]),
            xmax: a[0].max(b[0]),
            ymax: a[1].max(b[1]),
        }
    }

    /// Box enclosing every vertex of `features`; `None` when there are none.
    pub fn of_features(features: &[Feature]) -> Option<Self> {
        features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .flat_map(|g| g.positions())
            .fold(None, |acc: Option<BoundingBox>, [x, y]| {
                Some(match acc {
                    None => BoundingBox {
                        xmin: x,
                        ymin: y,
                        xmax: x,
                        ymax: y,
                    },
                    Some(b) => BoundingBox {
                        xmin: b.xmin.min(x),
                        ymin: b.ymin.min(y),
                        xmax: b.xmax.max(x),
                        ymax: b.ymax.max(y),
                    },
                })
            })
    }

    /// The viewport box shrunk so data is not requested right at the screen
    /// edges. Small boxes are used as-is.
    pub fn shrunk_for_query(&self) -> Self {
        let r = if self.xmax - self.xmin < 3.0 * QUERY_MARGIN
            || self.ymax - self.ymin < 3.0 * QUERY_MARGIN
        {
            0.0
        } else {
            QUERY_MARGIN
        };
        BoundingBox {
            xmin: self.xmin + r,
            ymin: self.ymin + r / 2.0,
            xmax: self.xmax - r,
            ymax: self.ymax - r / 2.0,
        }
    }

    pub fn center(&self) -> Position {
        [(self.xmin + self.xmax) / 2.0, (self.ymin + self.ymax) / 2.0]
    }
}

// ---------------------------------------------------------------------------
// Centroids
// ---------------------------------------------------------------------------

/// Mean of `coords` rounded to street level (3 decimals), returned as
/// `[latitude, longitude]` for display.
pub fn centroid(coords: &[Position]) -> Option<[f64; 2]> {
    if coords.is_empty() {
        return None;
    }
    let n = coords.len() as f64;
    let (x, y) = coords
        .iter()
        .fold((0.0, 0.0), |(x, y), p| (x + p[0] / n, y + p[1] / n));
    Some([round3(y), round3(x)])
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Where the map should move to show a collection: the bounds to fit and the
/// vertex-mean centre as `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewFit {
    pub bounds: BoundingBox,
    pub center: Position,
}

impl ViewFit {
    pub fn for_features(features: &[Feature]) -> Option<Self> {
        let bounds = BoundingBox::of_features(features)?;
        let vertices: Vec<Position> = features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .flat_map(|g| g.positions())
            .collect();
        let n = vertices.len() as f64;
        let center = vertices
            .iter()
            .fold([0.0, 0.0], |acc, p| [acc[0] + p[0] / n, acc[1] + p[1] / n]);
        Some(ViewFit { bounds, center })
    }
}
