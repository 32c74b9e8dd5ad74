use ahash::AHashSet;
use geo::{Area, BoundingRect, Coord, Intersects, Line, LineString, Polygon};
use rstar::{RTree, AABB};

use crate::types::Boundary;
use super::bbox::BoundingBox;

/// Check that every part of a fragment boundary is a usable polygon.
///
/// Rejects rings with non-finite coordinates, rings with fewer than three
/// distinct vertices, self-intersecting rings and zero-area parts. Returns
/// a human-readable reason on failure.
pub(crate) fn validate_boundary(boundary: &Boundary) -> Result<(), String> {
    let mut parts = 0;
    for (i, polygon) in boundary.polygons().enumerate() {
        validate_polygon(polygon).map_err(|reason| format!("part {i}: {reason}"))?;
        parts += 1;
    }
    if parts == 0 {
        return Err("boundary has no polygon parts".into());
    }
    Ok(())
}

fn validate_polygon(polygon: &Polygon<f64>) -> Result<(), String> {
    validate_ring(polygon.exterior()).map_err(|reason| format!("exterior ring {reason}"))?;
    for (i, hole) in polygon.interiors().iter().enumerate() {
        validate_ring(hole).map_err(|reason| format!("hole {i} {reason}"))?;
    }
    if polygon.unsigned_area() <= 0.0 {
        return Err("has zero area".into());
    }
    Ok(())
}

fn validate_ring(ring: &LineString<f64>) -> Result<(), String> {
    if let Some(c) = ring.coords().find(|c| !(c.x.is_finite() && c.y.is_finite())) {
        return Err(format!("has a non-finite coordinate ({}, {})", c.x, c.y));
    }

    // Drop repeated consecutive vertices so zero-length edges don't read as crossings.
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len() + 1);
    for &c in ring.coords() {
        if coords.last() != Some(&c) { coords.push(c) }
    }
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }

    let distinct = coords.iter()
        .map(|c| (c.x.to_bits(), c.y.to_bits()))
        .collect::<AHashSet<_>>()
        .len();
    if distinct < 3 {
        return Err(format!("has {distinct} distinct vertices (need at least 3)"));
    }

    if let Some((i, j)) = first_self_intersection(&coords) {
        return Err(format!("self-intersects between edges {i} and {j}"));
    }
    Ok(())
}

/// Find a pair of non-adjacent edges of a closed ring that touch or cross.
/// `coords` is the open vertex list; the closing edge is implied.
fn first_self_intersection(coords: &[Coord<f64>]) -> Option<(usize, usize)> {
    let n = coords.len();
    let edges: Vec<Line<f64>> = (0..n)
        .map(|i| Line::new(coords[i], coords[(i + 1) % n]))
        .collect();

    let rtree = RTree::bulk_load(
        edges.iter().enumerate()
            .map(|(i, edge)| BoundingBox::new(i, edge.bounding_rect()))
            .collect()
    );

    for (i, edge) in edges.iter().enumerate() {
        let rect = edge.bounding_rect();
        let search = AABB::from_corners(rect.min().into(), rect.max().into());
        for cand in rtree.locate_in_envelope_intersecting(&search) {
            let j = cand.idx();
            if j <= i { continue }

            // Consecutive edges always share a vertex.
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                // ...but a collinear fold back along the previous edge is still a fault.
                if is_fold(&edges[i], &edges[j]) { return Some((i, j)) }
                continue;
            }
            if edge.intersects(&edges[j]) {
                return Some((i, j));
            }
        }
    }
    None
}

/// Two edges sharing an endpoint overlap along a segment (a zero-width spike).
fn is_fold(a: &Line<f64>, b: &Line<f64>) -> bool {
    let cross = |u: Coord<f64>, v: Coord<f64>| u.x * v.y - u.y * v.x;
    let dot = |u: Coord<f64>, v: Coord<f64>| u.x * v.x + u.y * v.y;

    // Orient both edges away from their shared vertex.
    let (shared, p, q) = if a.end == b.start { (a.end, a.start, b.end) }
        else if a.start == b.end { (a.start, a.end, b.start) }
        else { return false };

    let u = p - shared;
    let v = q - shared;
    cross(u, v) == 0.0 && dot(u, v) > 0.0
}
