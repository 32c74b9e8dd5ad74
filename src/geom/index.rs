use geo::{BoundingRect, Contains, Intersects, MultiPolygon, Point};
use rstar::{RTree, AABB};
use serde::{Deserialize, Serialize};

use super::bbox::BoundingBox;

/// How points lying exactly on a polygon boundary are classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryRule {
    /// Boundary points (edges and vertices) count as contained.
    #[default]
    Inclusive,
    /// Only points strictly inside the interior count.
    Exclusive,
}

/// Containment index over a set of multi-polygons.
///
/// An R-tree of bounding boxes prunes candidates; the exact point-in-polygon
/// test on each candidate is authoritative.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
}

impl SpatialIndex {
    /// Build an index over `polygons`; the i-th shape is reported as index `i`.
    /// Shapes without a bounding box (empty) are never reported.
    pub fn new(polygons: &[MultiPolygon<f64>]) -> Self {
        Self {
            rtree: RTree::bulk_load(
                polygons.iter().enumerate()
                    .filter_map(|(i, polygon)| polygon.bounding_rect().map(|rect| BoundingBox::new(i, rect)))
                    .collect()
            ),
            shapes: polygons.to_vec(),
        }
    }

    /// Get the number of indexed shapes.
    #[inline] pub fn len(&self) -> usize { self.shapes.len() }

    /// Check if there are no shapes.
    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    /// Get a reference to the list of shapes.
    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    /// Indices of shapes whose bounding box covers `point` (edges included).
    #[inline]
    pub fn candidates(&self, point: &Point<f64>) -> impl Iterator<Item = usize> + '_ {
        self.rtree
            .locate_in_envelope_intersecting(&AABB::from_point([point.x(), point.y()]))
            .map(|bbox| bbox.idx())
    }

    /// Exact containment test of `point` against shape `idx`.
    /// `false` when `idx` is out of range.
    #[inline]
    pub fn contains(&self, idx: usize, point: &Point<f64>, rule: BoundaryRule) -> bool {
        let Some(shape) = self.shapes.get(idx) else { return false };
        match rule {
            BoundaryRule::Inclusive => shape.intersects(point),
            BoundaryRule::Exclusive => shape.contains(point),
        }
    }

    /// Indices of every shape containing `point`, in ascending order.
    pub fn containing(&self, point: &Point<f64>, rule: BoundaryRule) -> Vec<usize> {
        let mut hits = self.candidates(point)
            .filter(|&idx| self.contains(idx, point, rule))
            .collect::<Vec<_>>();
        hits.sort_unstable();
        hits
    }
}
