use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Point, Polygon};
use serde_json::{json, Map, Value};

use crate::{
    config::StatsConfig,
    types::{coerce_weight, Boundary, CanonicalPolygon, PointFeature, PolygonFragment},
};

/// Read polygon fragments from GeoJSON FeatureCollection bytes.
///
/// `Polygon` and `MultiPolygon` features become fragments; features with
/// other geometry types, no usable id, or malformed coordinates are skipped.
pub fn read_fragments_geojson(bytes: &[u8], config: &StatsConfig) -> Result<Vec<PolygonFragment>> {
    let mut skipped = 0;
    let mut fragments = Vec::new();

    for feature in features(bytes)? {
        match parse_fragment(feature, config) {
            Ok(Some(fragment)) => fragments.push(fragment),
            Ok(None) => skipped += 1,
            Err(e) => {
                log::warn!("[io::geojson] Skipping malformed fragment: {e:#}");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        log::warn!("[io::geojson] Skipped {skipped} features that are not polygon fragments");
    }
    Ok(fragments)
}

/// Read point features from GeoJSON FeatureCollection bytes.
///
/// The weight comes from the configured property, coerced with
/// [`coerce_weight`]; non-`Point` features are skipped.
pub fn read_points_geojson(bytes: &[u8], config: &StatsConfig) -> Result<Vec<PointFeature>> {
    let mut skipped = 0;
    let mut points = Vec::new();

    for feature in features(bytes)? {
        match parse_point(feature, config) {
            Ok(Some(point)) => points.push(point),
            Ok(None) => skipped += 1,
            Err(e) => {
                log::warn!("[io::geojson] Skipping malformed point: {e:#}");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        log::warn!("[io::geojson] Skipped {skipped} features that are not points");
    }
    Ok(points)
}

/// Write canonical parks as a GeoJSON FeatureCollection of MultiPolygons.
pub fn write_parks_geojson(parks: &[CanonicalPolygon]) -> Result<Vec<u8>> {
    let features: Vec<Value> = parks.iter().map(|park| json!({
        "type": "Feature",
        "id": park.id,
        "geometry": {
            "type": "MultiPolygon",
            "coordinates": multipolygon_coords(&park.boundary),
        },
        "properties": {
            "osm_id": park.id,
            "name": park.label.as_deref(),
        },
    })).collect();

    feature_collection_bytes(features)
}

/// Write point features as a GeoJSON FeatureCollection of Points.
pub fn write_points_geojson(points: &[PointFeature]) -> Result<Vec<u8>> {
    let features: Vec<Value> = points.iter().map(|point| json!({
        "type": "Feature",
        "id": point.id,
        "geometry": {
            "type": "Point",
            "coordinates": [point.position.x(), point.position.y()],
        },
        "properties": {
            "name": point.label.as_deref(),
            "capacity": point.weight,
        },
    })).collect();

    feature_collection_bytes(features)
}

/// Write the two tiling layers (`parks.geojson`, `benches.geojson`) into `dir`.
pub fn write_layers_geojson(dir: &Path, parks: &[CanonicalPolygon], points: &[PointFeature]) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("[io::geojson] Failed to create output directory: {}", dir.display()))?;

    for (name, bytes) in [("parks", write_parks_geojson(parks)?), ("benches", write_points_geojson(points)?)] {
        let path = dir.join(format!("{name}.geojson"));
        fs::write(&path, bytes)
            .with_context(|| format!("[io::geojson] Failed to write layer file: {}", path.display()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse FeatureCollection bytes and return its features.
fn features(bytes: &[u8]) -> Result<Vec<Value>> {
    let mut value: Value = serde_json::from_slice(bytes)
        .context("[io::geojson] Failed to parse GeoJSON bytes")?;
    match value.get_mut("features").map(Value::take) {
        Some(Value::Array(features)) => Ok(features),
        Some(Value::Null) => Ok(Vec::new()), // jsonb_agg over zero rows
        _ => bail!("[io::geojson] Expected a FeatureCollection with a `features` array"),
    }
}

fn parse_fragment(feature: Value, config: &StatsConfig) -> Result<Option<PolygonFragment>> {
    let geometry = &feature["geometry"];
    let boundary = match geometry["type"].as_str() {
        Some("Polygon") => Boundary::Polygon(parse_polygon_coords(&geometry["coordinates"])?),
        Some("MultiPolygon") => Boundary::MultiPolygon(parse_multipolygon_coords(&geometry["coordinates"])?),
        _ => return Ok(None),
    };
    let properties = properties(&feature);
    let id = feature_id(&feature, properties)?;
    let label = properties.and_then(|p| p.get(&config.label_attribute)).and_then(Value::as_str);
    Ok(Some(PolygonFragment::new(id, label, boundary)))
}

fn parse_point(feature: Value, config: &StatsConfig) -> Result<Option<PointFeature>> {
    let geometry = &feature["geometry"];
    if geometry["type"].as_str() != Some("Point") {
        return Ok(None);
    }
    let position = Point(parse_coord(&geometry["coordinates"])?);
    let properties = properties(&feature);
    let id = feature_id(&feature, properties)?;

    let mut point = PointFeature::new(id, position)
        .with_weight(coerce_weight(properties.and_then(|p| p.get(&config.weight_attribute))));
    if let Some(label) = properties.and_then(|p| p.get(&config.label_attribute)).and_then(Value::as_str) {
        point = point.with_label(label);
    }
    Ok(Some(point))
}

#[inline]
fn properties(feature: &Value) -> Option<&Map<String, Value>> {
    feature.get("properties").and_then(Value::as_object)
}

/// Feature identity: top-level `id`, falling back to an `osm_id` property.
fn feature_id(feature: &Value, properties: Option<&Map<String, Value>>) -> Result<i64> {
    let as_id = |value: &Value| match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    feature.get("id").and_then(as_id)
        .or_else(|| properties.and_then(|p| p.get("osm_id")).and_then(as_id))
        .ok_or_else(|| anyhow!("feature has no integer id"))
}

/// Parse GeoJSON MultiPolygon coordinates: `[polygon, ...]`.
fn parse_multipolygon_coords(coords: &Value) -> Result<MultiPolygon<f64>> {
    coords.as_array()
        .ok_or_else(|| anyhow!("MultiPolygon coordinates must be an array"))?
        .iter()
        .map(parse_polygon_coords)
        .collect::<Result<Vec<_>>>()
        .map(MultiPolygon)
}

/// Parse GeoJSON Polygon coordinates: `[exterior, hole, hole, ...]`.
fn parse_polygon_coords(coords: &Value) -> Result<Polygon<f64>> {
    let mut rings = coords.as_array()
        .ok_or_else(|| anyhow!("Polygon coordinates must be an array of rings"))?
        .iter()
        .map(parse_ring_coords);

    let exterior = rings.next()
        .ok_or_else(|| anyhow!("Polygon is missing its exterior ring"))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Parse a ring `[[x, y], ...]`, closing it if needed.
fn parse_ring_coords(coords: &Value) -> Result<LineString<f64>> {
    let mut points = coords.as_array()
        .ok_or_else(|| anyhow!("ring must be an array of positions"))?
        .iter()
        .map(parse_coord)
        .collect::<Result<Vec<_>>>()?;

    // Ensure ring is closed (first point == last point)
    if !points.is_empty() && points[0] != points[points.len() - 1] {
        points.push(points[0]);
    }

    Ok(LineString(points))
}

/// Parse a position `[x, y, ...]`; extra ordinates are ignored.
fn parse_coord(value: &Value) -> Result<Coord<f64>> {
    let position = value.as_array()
        .filter(|a| a.len() >= 2)
        .ok_or_else(|| anyhow!("position must be an array of at least two numbers"))?;
    let x = position[0].as_f64().ok_or_else(|| anyhow!("Invalid coordinate: x must be a number"))?;
    let y = position[1].as_f64().ok_or_else(|| anyhow!("Invalid coordinate: y must be a number"))?;
    Ok(Coord { x, y })
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn multipolygon_coords(shape: &MultiPolygon<f64>) -> Value {
    let ring = |ls: &LineString<f64>| ls.coords().map(|c| json!([c.x, c.y])).collect::<Vec<_>>();
    shape.0.iter()
        .map(|polygon| std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(ring)
            .collect::<Vec<_>>())
        .collect::<Vec<_>>()
        .into()
}

fn feature_collection_bytes(features: Vec<Value>) -> Result<Vec<u8>> {
    let feature_collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    serde_json::to_vec(&feature_collection).context("[io::geojson] Failed to serialize GeoJSON to bytes")
}
