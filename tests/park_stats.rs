// End-to-end checks of the merge -> index -> join -> derive pipeline through
// the public API: identity merging, left-join completeness, weight handling,
// boundary classification and frame checks.

use geo::{point, polygon, Area, CoordsIter, Intersects, MultiPolygon, Point, Polygon};
use parkstats::{
    compute_park_stats, merge_fragments, read_fragments_geojson, read_points_geojson, BoundaryRule,
    FeatureSet, PointFeature, PolygonFragment, ReferenceFrame, StatsConfig, StatsError, Warning,
};

fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
    polygon![(x: x, y: y), (x: x + size, y: y), (x: x + size, y: y + size), (x: x, y: y + size)]
}

fn parks(features: Vec<PolygonFragment>) -> FeatureSet<PolygonFragment> {
    FeatureSet::new(ReferenceFrame::WEB_MERCATOR, features)
}

fn benches(features: Vec<PointFeature>) -> FeatureSet<PointFeature> {
    FeatureSet::new(ReferenceFrame::WEB_MERCATOR, features)
}

fn sequential() -> StatsConfig {
    StatsConfig { parallel: false, ..Default::default() }
}

/// A mixed fragment set: overlaps, disjoint parts, shared ids with different labels.
fn fixture() -> Vec<PolygonFragment> {
    vec![
        PolygonFragment::new(7, Some("Plaza"), square(0.0, 0.0, 4.0)),
        PolygonFragment::new(7, Some("Plaza"), square(2.0, 2.0, 4.0)),
        PolygonFragment::new(7, Some("Plaza"), square(20.0, 0.0, 1.0)),
        PolygonFragment::new(8, None, square(10.0, 10.0, 3.0)),
        PolygonFragment::new(8, Some("Annex"), square(14.0, 10.0, 1.0)),
        PolygonFragment::new(9, Some("Green"), MultiPolygon(vec![square(30.0, 0.0, 2.0), square(33.0, 0.0, 2.0)])),
        PolygonFragment::new(9, Some("Green"), square(31.0, 0.0, 3.0)),
    ]
}

#[test]
fn one_canonical_polygon_per_distinct_key() {
    let bowtie = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0), (x: 0.0, y: 2.0)];
    let mut fragments = fixture();
    fragments.push(PolygonFragment::new(100, Some("Broken"), bowtie));

    let (polygons, report) = merge_fragments(fragments, true);
    assert_eq!(polygons.len(), 4); // (7,Plaza) (8,None) (8,Annex) (9,Green); (100,Broken) dropped
    assert_eq!(report.fragments_skipped, 1);
    assert!(polygons.iter().all(|p| !p.boundary.0.is_empty()));
}

#[test]
fn merging_is_order_independent() {
    let (reference, _) = merge_fragments(fixture(), false);
    let samples = (0..40)
        .flat_map(|x| (0..16).map(move |y| point!(x: x as f64 + 0.5, y: y as f64 + 0.5)))
        .collect::<Vec<Point<f64>>>();

    let n = fixture().len();
    for shift in 1..n {
        let mut permuted = fixture();
        permuted.rotate_left(shift);
        if shift % 2 == 0 { permuted.reverse() }

        let (merged, _) = merge_fragments(permuted, shift % 3 == 0);
        assert_eq!(merged.len(), reference.len());
        for (a, b) in reference.iter().zip(&merged) {
            assert_eq!(a.key(), b.key());
            assert!((a.boundary.unsigned_area() - b.boundary.unsigned_area()).abs() < 1e-6);
            for p in &samples {
                assert_eq!(a.boundary.intersects(p), b.boundary.intersects(p), "{} at {p:?}", a.key());
            }
        }
    }
}

#[test]
fn overlapping_plaza_fragments() {
    let a = square(0.0, 0.0, 4.0);
    let b = square(2.0, 2.0, 4.0);
    let (merged, _) = merge_fragments(vec![
        PolygonFragment::new(7, Some("Plaza"), a.clone()),
        PolygonFragment::new(7, Some("Plaza"), b.clone()),
    ], false);

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].boundary.0.len(), 1);
    let area = merged[0].boundary.unsigned_area();
    assert!(area < a.unsigned_area() + b.unsigned_area());
    assert!(area >= a.unsigned_area().max(b.unsigned_area()));
}

#[test]
fn every_park_gets_a_record() {
    let stats = compute_park_stats(
        parks(fixture()),
        benches(vec![PointFeature::new(1, point!(x: 1.0, y: 1.0)).with_weight(2)]),
        &sequential(),
    ).unwrap();

    assert_eq!(stats.records.len(), stats.parks.len());
    assert_eq!(stats.records.len(), 4);
    let mut keys = stats.records.iter().map(|r| r.key()).collect::<Vec<_>>();
    keys.dedup();
    assert_eq!(keys.len(), 4);

    let plaza = stats.records.iter().find(|r| r.id == 7).unwrap();
    assert_eq!((plaza.count, plaza.total_weight), (1, 2));
    for other in stats.records.iter().filter(|r| r.id != 7) {
        assert_eq!((other.count, other.total_weight), (0, 0));
    }
}

#[test]
fn three_benches_with_missing_capacity() {
    let points = br#"{"type":"FeatureCollection","features":[
        {"type":"Feature","id":1,"geometry":{"type":"Point","coordinates":[1,1]},"properties":{"capacity":1}},
        {"type":"Feature","id":2,"geometry":{"type":"Point","coordinates":[2,2]},"properties":{"capacity":"2"}},
        {"type":"Feature","id":3,"geometry":{"type":"Point","coordinates":[3,3]},"properties":{"capacity":null}}
    ]}"#;
    let config = sequential();
    let points = read_points_geojson(points, &config).unwrap();

    let stats = compute_park_stats(
        parks(vec![PolygonFragment::new(1, Some("Park"), square(0.0, 0.0, 10.0))]),
        benches(points),
        &config,
    ).unwrap();

    assert_eq!(stats.records.len(), 1);
    assert_eq!(stats.records[0].count, 3);
    assert_eq!(stats.records[0].total_weight, 4);
}

#[test]
fn empty_point_source() {
    let stats = compute_park_stats(
        parks(vec![PolygonFragment::new(1, None, square(0.0, 0.0, 1.0))]),
        benches(vec![]),
        &sequential(),
    ).unwrap();

    assert_eq!(stats.records.len(), 1);
    assert_eq!((stats.records[0].count, stats.records[0].total_weight), (0, 0));
    assert!(stats.report.warnings.contains(&Warning::EmptyPoints));
}

#[test]
fn vertex_point_is_deterministic() {
    let vertex = PointFeature::new(1, point!(x: 4.0, y: 4.0));
    for parallel in [false, true, false, true] {
        let inclusive = StatsConfig { parallel, ..Default::default() };
        let stats = compute_park_stats(
            parks(vec![PolygonFragment::new(1, None, square(0.0, 0.0, 4.0))]),
            benches(vec![vertex.clone()]),
            &inclusive,
        ).unwrap();
        assert_eq!(stats.records[0].count, 1);

        let exclusive = StatsConfig { parallel, boundary_rule: BoundaryRule::Exclusive, ..Default::default() };
        let stats = compute_park_stats(
            parks(vec![PolygonFragment::new(1, None, square(0.0, 0.0, 4.0))]),
            benches(vec![vertex.clone()]),
            &exclusive,
        ).unwrap();
        assert_eq!(stats.records[0].count, 0);
    }
}

#[test]
fn counts_match_brute_force_containment() {
    let points = (0..500)
        .map(|i| PointFeature::new(i, point!(x: (i % 37) as f64 * 0.97, y: (i % 19) as f64 * 0.83)).with_weight((i % 5) as u64))
        .collect::<Vec<_>>();
    let stats = compute_park_stats(parks(fixture()), benches(points.clone()), &StatsConfig::default()).unwrap();

    for record in &stats.records {
        let inside = points.iter().filter(|p| record.boundary.intersects(&p.position)).collect::<Vec<_>>();
        assert_eq!(record.count, inside.len() as u64, "{}", record.key());
        assert_eq!(record.total_weight, inside.iter().map(|p| p.weight).sum::<u64>(), "{}", record.key());
    }
}

#[test]
fn envelope_contains_boundary_and_area_is_non_negative() {
    let stats = compute_park_stats(parks(fixture()), benches(vec![]), &sequential()).unwrap();
    for record in &stats.records {
        assert!(record.area >= 0.0);
        assert!((record.area - record.boundary.unsigned_area()).abs() < 1e-9);
        let (min, max) = (record.envelope.min(), record.envelope.max());
        for c in record.boundary.coords_iter() {
            assert!(min.x <= c.x && c.x <= max.x && min.y <= c.y && c.y <= max.y);
        }
    }
}

#[test]
fn frame_mismatch_aborts_before_output() {
    let result = compute_park_stats(
        FeatureSet::new(ReferenceFrame::WGS84, vec![PolygonFragment::new(1, None, square(0.0, 0.0, 1.0))]),
        benches(vec![PointFeature::new(1, point!(x: 0.5, y: 0.5))]),
        &sequential(),
    );
    assert!(matches!(result, Err(StatsError::ReferenceFrameMismatch { .. })));
}

#[test]
fn geojson_sources_end_to_end() {
    let parks_json = br#"{"type":"FeatureCollection","features":[
        {"type":"Feature","id":7,"geometry":{"type":"Polygon","coordinates":[[[0,0],[4,0],[4,4],[0,4],[0,0]]]},"properties":{"name":"Plaza"}},
        {"type":"Feature","id":7,"geometry":{"type":"Polygon","coordinates":[[[2,2],[6,2],[6,6],[2,6],[2,2]]]},"properties":{"name":"Plaza"}},
        {"type":"Feature","id":8,"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,1],[1,0],[0,1],[0,0]]]},"properties":{"name":"Bowtie"}}
    ]}"#;
    let benches_json = br#"{"type":"FeatureCollection","features":[
        {"type":"Feature","id":1,"geometry":{"type":"Point","coordinates":[5,5]},"properties":{"capacity":3}},
        {"type":"Feature","id":2,"geometry":{"type":"Point","coordinates":[9,9]},"properties":{}}
    ]}"#;

    let config = sequential();
    let fragments = read_fragments_geojson(parks_json, &config).unwrap();
    let points = read_points_geojson(benches_json, &config).unwrap();
    let stats = compute_park_stats(parks(fragments), benches(points), &config).unwrap();

    assert_eq!(stats.records.len(), 1);
    assert_eq!(stats.records[0].label.as_deref(), Some("Plaza"));
    assert_eq!((stats.records[0].count, stats.records[0].total_weight), (1, 3));
    assert!((stats.records[0].area - 28.0).abs() < 1e-6);
    assert_eq!(stats.report.fragments_in, 3);
    assert_eq!(stats.report.fragments_skipped, 1);
    assert_eq!(stats.report.points_in, 2);
}

#[test]
fn maximal_capacities_do_not_overflow() {
    let benches_json = br#"{"type":"FeatureCollection","features":[
        {"type":"Feature","id":1,"geometry":{"type":"Point","coordinates":[0.25,0.25]},"properties":{"capacity":"18446744073709551615"}},
        {"type":"Feature","id":2,"geometry":{"type":"Point","coordinates":[0.75,0.75]},"properties":{"capacity":18446744073709551615}}
    ]}"#;
    for parallel in [false, true] {
        let config = StatsConfig { parallel, ..Default::default() };
        let points = read_points_geojson(benches_json, &config).unwrap();
        assert!(points.iter().all(|p| p.weight == u64::MAX));

        let stats = compute_park_stats(
            parks(vec![PolygonFragment::new(1, None, square(0.0, 0.0, 1.0))]),
            benches(points),
            &config,
        ).unwrap();
        assert_eq!((stats.records[0].count, stats.records[0].total_weight), (2, u64::MAX));
    }
}
