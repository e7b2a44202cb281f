// Integration tests for the union of single multipolygon pairs:
//   the documented scenarios, topology edge cases (shared edges, touching
//   corners, holes), algebraic properties, and the geographic domain.

use geo::{coord, polygon, Area, Coord, LineString, MultiPolygon, Polygon, Relate, Validation, Winding};
use polyunion::geom::{Kernel, Spherical};
use polyunion::{union, Domain, UnionConfig, UnionError};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
}

fn with_hole(outer: Polygon<f64>, hole: Polygon<f64>) -> Polygon<f64> {
    let (exterior, _) = outer.into_inner();
    let (hole, _) = hole.into_inner();
    Polygon::new(exterior, vec![hole])
}

fn mp(polygons: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    MultiPolygon::new(polygons)
}

fn cartesian(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    union(Domain::Cartesian, a, b, &UnionConfig::default()).unwrap()
}

fn geographic(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> polyunion::Result<MultiPolygon<f64>> {
    union(Domain::Geographic, a, b, &UnionConfig::default())
}

/// OGC validity checks the union guarantees: closed, correctly oriented
/// rings, polygons with disjoint interiors, holes inside their exterior.
fn assert_valid(result: &MultiPolygon<f64>) {
    for polygon in &result.0 {
        assert!(polygon.exterior().is_closed());
        assert!(polygon.exterior().is_ccw(), "exterior not counter-clockwise: {polygon:?}");
        let shell = Polygon::new(polygon.exterior().clone(), vec![]);
        for hole in polygon.interiors() {
            assert!(hole.is_closed());
            assert!(hole.is_cw(), "hole not clockwise: {hole:?}");
            let hole = Polygon::new(hole.clone(), vec![]);
            assert!(shell.relate(&hole).is_contains());
        }
    }
    for (i, a) in result.0.iter().enumerate() {
        for b in &result.0[i + 1..] {
            let m = a.relate(b);
            assert!(!m.is_intersects() || m.is_touches(), "overlapping output polygons");
        }
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn overlapping_squares_merge() {
    let a = mp(vec![rect(0.0, 0.0, 2.0, 2.0)]);
    let b = mp(vec![rect(1.0, 1.0, 3.0, 3.0)]);
    let result = cartesian(&a, &b);
    assert_valid(&result);
    assert_eq!(result.0.len(), 1);
    assert!(result.0[0].interiors().is_empty());
    assert_eq!(result.0[0].exterior().0.len(), 9);
    assert_close(result.unsigned_area(), 7.0);
}

#[test]
fn disjoint_squares_stay_separate() {
    let a = mp(vec![rect(0.0, 0.0, 2.0, 2.0)]);
    let b = mp(vec![rect(10.0, 10.0, 12.0, 12.0)]);
    let result = cartesian(&a, &b);
    assert_valid(&result);
    assert_eq!(result.0.len(), 2);
    assert_close(result.unsigned_area(), 8.0);
    assert_eq!(result.0[0].exterior().0[0], coord! { x: 0.0, y: 0.0 });
    assert_eq!(result.0[1].exterior().0[0], coord! { x: 10.0, y: 10.0 });
}

#[test]
fn filling_a_hole_removes_it() {
    let a = mp(vec![with_hole(rect(0.0, 0.0, 4.0, 4.0), rect(1.0, 1.0, 3.0, 3.0))]);
    let b = mp(vec![rect(1.0, 1.0, 3.0, 3.0)]);
    let result = cartesian(&a, &b);
    assert_valid(&result);
    assert_eq!(result.0.len(), 1);
    assert!(result.0[0].interiors().is_empty());
    assert_close(result.unsigned_area(), 16.0);
}

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

#[test]
fn shared_edge_dissolves() {
    let result = cartesian(&mp(vec![rect(0.0, 0.0, 1.0, 1.0)]), &mp(vec![rect(1.0, 0.0, 2.0, 1.0)]));
    assert_valid(&result);
    assert_eq!(result.0.len(), 1);
    assert!(result.0[0].interiors().is_empty());
    assert_close(result.unsigned_area(), 2.0);
}

#[test]
fn partially_shared_edge_connects() {
    let result = cartesian(&mp(vec![rect(0.0, 0.0, 2.0, 2.0)]), &mp(vec![rect(2.0, 1.0, 4.0, 5.0)]));
    assert_valid(&result);
    assert_eq!(result.0.len(), 1);
    assert_close(result.unsigned_area(), 12.0);
}

#[test]
fn corner_touch_gives_two_polygons() {
    let result = cartesian(&mp(vec![rect(0.0, 0.0, 1.0, 1.0)]), &mp(vec![rect(1.0, 1.0, 2.0, 2.0)]));
    assert_valid(&result);
    assert_eq!(result.0.len(), 2);
    assert_close(result.unsigned_area(), 2.0);
}

#[test]
fn contained_operand_is_absorbed() {
    let a = mp(vec![rect(0.0, 0.0, 10.0, 10.0)]);
    let b = mp(vec![rect(2.0, 3.0, 4.0, 5.0)]);
    let result = cartesian(&a, &b);
    assert_valid(&result);
    assert_eq!(result.0.len(), 1);
    assert_eq!(result.0[0].exterior().0.len(), 5);
    assert_close(result.unsigned_area(), 100.0);
}

#[test]
fn island_in_hole_is_its_own_polygon() {
    let a = mp(vec![with_hole(rect(0.0, 0.0, 10.0, 10.0), rect(2.0, 2.0, 8.0, 8.0))]);
    let b = mp(vec![rect(4.0, 4.0, 6.0, 6.0)]);
    let result = cartesian(&a, &b);
    assert_valid(&result);
    assert_eq!(result.0.len(), 2);
    assert_eq!(result.0[0].interiors().len(), 1);
    assert!(result.0[1].interiors().is_empty());
    assert_close(result.unsigned_area(), 68.0);
}

#[test]
fn partial_hole_fill_shrinks_hole() {
    let a = mp(vec![with_hole(rect(0.0, 0.0, 10.0, 10.0), rect(2.0, 2.0, 8.0, 8.0))]);
    let b = mp(vec![rect(1.0, 1.0, 5.0, 5.0)]);
    let result = cartesian(&a, &b);
    assert_valid(&result);
    assert_eq!(result.0.len(), 1);
    assert_eq!(result.0[0].interiors().len(), 1);
    assert_close(result.unsigned_area(), 73.0);
}

#[test]
fn crossing_bars_form_a_plus() {
    let a = mp(vec![rect(0.0, 1.0, 3.0, 2.0)]);
    let b = mp(vec![rect(1.0, 0.0, 2.0, 3.0)]);
    let result = cartesian(&a, &b);
    assert_valid(&result);
    assert_eq!(result.0.len(), 1);
    assert_eq!(result.0[0].exterior().0.len(), 13);
    assert_close(result.unsigned_area(), 5.0);
}

#[test]
fn ring_of_operands_encloses_a_hole() {
    // A "U" and a lid together enclose a hole.
    let u = mp(vec![rect(0.0, 0.0, 1.0, 3.0), rect(1.0, 0.0, 2.0, 1.0), rect(2.0, 0.0, 3.0, 3.0)]);
    let lid = mp(vec![rect(0.0, 2.0, 3.0, 3.0)]);
    let result = cartesian(&u, &lid);
    assert_valid(&result);
    assert_eq!(result.0.len(), 1);
    assert_eq!(result.0[0].interiors().len(), 1);
    assert_close(result.unsigned_area(), 8.0);
}

#[test]
fn diagonal_edges_cross_exactly_once() {
    let a = mp(vec![polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 2.0, y: 4.0)]]);
    let b = mp(vec![polygon![(x: 0.0, y: 3.0), (x: 2.0, y: -1.0), (x: 4.0, y: 3.0)]]);
    let result = cartesian(&a, &b);
    assert_valid(&result);
    assert_eq!(result.0.len(), 1);
    let area_a = a.unsigned_area();
    let area_b = b.unsigned_area();
    assert!(result.unsigned_area() > area_a.max(area_b));
    assert!(result.unsigned_area() < area_a + area_b);
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

#[test]
fn orientation_and_closure_of_input_do_not_matter() {
    let clockwise_open = Polygon::new(
        LineString::from(vec![(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)]),
        vec![],
    );
    let a = mp(vec![clockwise_open]);
    let b = mp(vec![rect(1.0, 1.0, 3.0, 3.0)]);
    assert_eq!(cartesian(&a, &b), cartesian(&mp(vec![rect(0.0, 0.0, 2.0, 2.0)]), &b));
}

#[test]
fn empty_operands() {
    let a = mp(vec![rect(0.0, 0.0, 1.0, 1.0)]);
    let empty = MultiPolygon::new(vec![]);
    assert!(cartesian(&empty, &empty).0.is_empty());
    assert_close(cartesian(&a, &empty).unsigned_area(), 1.0);
    assert_close(cartesian(&empty, &a).unsigned_area(), 1.0);
}

#[test]
fn overlapping_polygons_of_one_operand_merge_without_a_partner() {
    let a = mp(vec![rect(0.0, 0.0, 2.0, 2.0), rect(1.0, 1.0, 3.0, 3.0)]);
    let empty = MultiPolygon::new(vec![]);
    for result in [cartesian(&a, &empty), cartesian(&empty, &a), cartesian(&a, &a)] {
        assert_valid(&result);
        assert!(result.is_valid(), "{:?}", result.validation_errors());
        assert_eq!(result.0.len(), 1);
        assert_close(result.unsigned_area(), 7.0);
    }
}

#[test]
fn degenerate_input_rings_are_ignored() {
    let spike = mp(vec![polygon![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0), (x: 0.0, y: 0.0)]]);
    let a = mp(vec![rect(0.0, 0.0, 1.0, 1.0)]);
    let result = cartesian(&spike, &a);
    assert_eq!(result.0.len(), 1);
    assert_close(result.unsigned_area(), 1.0);
}

#[test]
fn coordinates_too_large_to_square_fail() {
    let scaled = |k: f64| {
        let a = mp(vec![rect(0.0, 0.0, 2.0 * k, 2.0 * k)]);
        let b = mp(vec![rect(k, k, 3.0 * k, 3.0 * k)]);
        union(Domain::Cartesian, &a, &b, &UnionConfig::default())
    };
    assert!(matches!(scaled(1e160), Err(UnionError::Numeric(_))));

    let large = scaled(1e140).unwrap();
    assert_eq!(large.0.len(), 1);
    assert!((large.unsigned_area() / 7e280 - 1.0).abs() < 1e-12);
}

#[test]
fn non_finite_coordinates_fail() {
    let bad = mp(vec![polygon![(x: 0.0, y: 0.0), (x: f64::INFINITY, y: 0.0), (x: 1.0, y: 1.0)]]);
    let a = mp(vec![rect(0.0, 0.0, 1.0, 1.0)]);
    let err = union(Domain::Cartesian, &a, &bad, &UnionConfig::default()).unwrap_err();
    assert!(matches!(err, UnionError::Numeric(_)));
}

#[test]
fn strict_mode_rejects_self_intersection() {
    let bowtie = mp(vec![polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 4.0), (x: 4.0, y: 0.0), (x: 0.0, y: 2.0)]]);
    let a = mp(vec![rect(10.0, 10.0, 11.0, 11.0)]);
    let strict = UnionConfig { strict: true, ..UnionConfig::default() };
    let err = union(Domain::Cartesian, &a, &bowtie, &strict).unwrap_err();
    assert!(matches!(err, UnionError::GeometryValidity(_)));
    assert!(union(Domain::Cartesian, &a, &bowtie, &UnionConfig::default()).is_ok());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn union_with_itself_is_identity() {
    let a = mp(vec![with_hole(rect(0.0, 0.0, 4.0, 4.0), rect(1.0, 1.0, 2.0, 2.0))]);
    let result = cartesian(&a, &a);
    assert_valid(&result);
    assert_close(result.unsigned_area(), a.unsigned_area());
}

#[test]
fn union_is_commutative_and_idempotent() {
    let a = mp(vec![rect(0.0, 0.0, 3.0, 2.0), rect(5.0, 0.0, 6.0, 1.0)]);
    let b = mp(vec![rect(2.0, 1.0, 5.5, 4.0)]);
    let ab = cartesian(&a, &b);
    let ba = cartesian(&b, &a);
    assert_eq!(ab, ba);

    let again = cartesian(&ab, &b);
    assert_close(again.unsigned_area(), ab.unsigned_area());
    assert_eq!(again.0.len(), ab.0.len());
}

#[test]
fn nearly_coincident_vertices_snap_together() {
    let a = mp(vec![rect(0.0, 0.0, 1.0, 1.0)]);
    let b = mp(vec![rect(1.0 + 1e-12, 0.0, 2.0, 1.0 - 1e-12)]);
    let result = cartesian(&a, &b);
    assert_valid(&result);
    assert_eq!(result.0.len(), 1);
    assert!((result.unsigned_area() - 2.0).abs() < 1e-9);
}

/// Nine-pointed lattice star with every vertex moved by up to `jitter`,
/// deterministically from `seed`.
fn jittered_star(cx: f64, cy: f64, radii: [f64; 9], seed: u64, jitter: f64) -> MultiPolygon<f64> {
    let mut state = seed;
    let mut next = || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
    };
    let mut ring: Vec<Coord<f64>> = radii.iter().enumerate()
        .map(|(k, r)| {
            let theta = (k as f64 * 40.0).to_radians();
            coord! {
                x: cx + (r * theta.cos()).round() + jitter * next(),
                y: cy + (r * theta.sin()).round() + jitter * next(),
            }
        })
        .collect();
    ring.push(ring[0]);
    mp(vec![Polygon::new(LineString::new(ring), vec![])])
}

#[test]
fn jittered_lattice_stars_union_cleanly() {
    let pairs = [
        ((0.0, 0.0), [3.0, 5.0, 4.0, 3.0, 5.0, 4.0, 3.0, 5.0, 4.0], (1.0, 2.0), [5.0, 3.0, 3.0, 4.0, 5.0, 3.0, 4.0, 5.0, 3.0]),
        ((2.0, 2.0), [4.0, 4.0, 3.0, 5.0, 3.0, 5.0, 4.0, 3.0, 5.0], (2.0, 2.0), [4.0, 3.0, 5.0, 4.0, 4.0, 3.0, 5.0, 5.0, 3.0]),
        ((5.0, 1.0), [5.0, 5.0, 5.0, 3.0, 3.0, 3.0, 4.0, 4.0, 4.0], (3.0, 4.0), [3.0, 4.0, 5.0, 3.0, 4.0, 5.0, 3.0, 4.0, 5.0]),
    ];
    for (seed, ((ax, ay), ar, (bx, by), br)) in pairs.into_iter().enumerate() {
        let seed = seed as u64;
        let a = jittered_star(ax, ay, ar, 2 * seed + 1, 1e-8);
        let b = jittered_star(bx, by, br, 2 * seed + 2, 1e-8);
        assert!(a.is_valid() && b.is_valid());

        let result = cartesian(&a, &b);
        assert!(result.is_valid(), "{:?}", result.validation_errors());
        let (area_a, area_b, area_u) = (a.unsigned_area(), b.unsigned_area(), result.unsigned_area());
        assert!(area_u >= area_a.max(area_b) - 1e-6, "{area_u} vs {area_a}, {area_b}");
        assert!(area_u <= area_a + area_b + 1e-6, "{area_u} vs {area_a}, {area_b}");
    }
}

// ---------------------------------------------------------------------------
// Geographic
// ---------------------------------------------------------------------------

fn sphere_area(mp: &MultiPolygon<f64>) -> f64 {
    mp.0.iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        .map(|ring| Spherical.signed_area(&ring.0))
        .sum()
}

#[test]
fn geographic_overlap_merges() {
    let a = mp(vec![rect(0.0, 0.0, 10.0, 10.0)]);
    let b = mp(vec![rect(5.0, 5.0, 15.0, 15.0)]);
    let result = geographic(&a, &b).unwrap();
    assert_eq!(result.0.len(), 1);
    let (area_a, area_b, area_u) = (sphere_area(&a), sphere_area(&b), sphere_area(&result));
    assert!(area_u > area_a.max(area_b));
    assert!(area_u < area_a + area_b);
}

#[test]
fn geographic_union_across_antimeridian_matches_rotated_union() {
    let config = |dx: f64| {
        let a = mp(vec![rect(-10.0 + dx, 0.0, 10.0 + dx, 10.0)]);
        let b = mp(vec![rect(-5.0 + dx, 5.0, 5.0 + dx, 15.0)]);
        (a, b)
    };
    let wrap = |p: &Coord<f64>| coord! { x: if p.x > 180.0 { p.x - 360.0 } else { p.x }, y: p.y };

    let (a, b) = config(0.0);
    let centred = geographic(&a, &b).unwrap();

    let (a, b) = config(180.0);
    let a = mp(a.0.iter().map(|p| Polygon::new(p.exterior().0.iter().map(wrap).collect(), vec![])).collect());
    let b = mp(b.0.iter().map(|p| Polygon::new(p.exterior().0.iter().map(wrap).collect(), vec![])).collect());
    let seam = geographic(&a, &b).unwrap();

    assert_eq!(centred.0.len(), 1);
    assert_eq!(seam.0.len(), 1);
    for c in &seam.0[0].exterior().0 {
        assert!((-180.0..=180.0).contains(&c.x));
    }

    // Same vertices, rotated by 180°, apart from the seam vertices.
    let mut expected: Vec<Coord<f64>> = centred.0[0].exterior().0[1..].to_vec();
    let mut actual: Vec<Coord<f64>> = seam.0[0].exterior().0[1..].iter()
        .filter(|c| c.x.abs() != 180.0)
        .map(|c| coord! { x: if c.x < 0.0 { c.x + 180.0 } else { c.x - 180.0 }, y: c.y })
        .collect();
    let key = |c: &Coord<f64>| ((c.x * 1e6).round() as i64, (c.y * 1e6).round() as i64);
    expected.sort_by_key(key);
    actual.sort_by_key(key);
    assert_eq!(expected.len(), actual.len());
    for (e, a) in expected.iter().zip(&actual) {
        assert!((e.x - a.x).abs() < 1e-9 && (e.y - a.y).abs() < 1e-9, "{e:?} vs {a:?}");
    }
}

#[test]
fn geographic_bands_apart_in_latitude_may_reach_every_longitude() {
    // Between them the bands cover every longitude, but they never meet.
    let a = mp(vec![polygon![
        (x: -175.0, y: 0.0), (x: -82.5, y: 0.0), (x: 10.0, y: 0.0),
        (x: 10.0, y: 10.0), (x: -82.5, y: 10.0), (x: -175.0, y: 10.0),
    ]]);
    let b = mp(vec![polygon![
        (x: 0.0, y: 40.0), (x: 95.0, y: 40.0), (x: -170.0, y: 40.0),
        (x: -170.0, y: 50.0), (x: 95.0, y: 50.0), (x: 0.0, y: 50.0),
    ]]);
    let result = geographic(&a, &b).unwrap();
    assert_eq!(result.0.len(), 2);
    for polygon in &result.0 {
        assert!(polygon.interiors().is_empty());
        for c in &polygon.exterior().0 {
            assert!((-180.0..=180.0).contains(&c.x), "{c:?}");
        }
    }
    let (area_a, area_b, area_u) = (sphere_area(&a), sphere_area(&b), sphere_area(&result));
    assert!(area_a > 0.0 && area_b > 0.0);
    assert!((area_u / (area_a + area_b) - 1.0).abs() < 1e-9, "{area_u} vs {area_a} + {area_b}");
}

#[test]
fn geographic_belt_around_the_globe_fails() {
    let band = |lon: f64| polygon![
        (x: lon, y: 0.0), (x: lon + 100.0, y: 0.0), (x: lon + 100.0, y: 10.0), (x: lon, y: 10.0)
    ];
    let a = mp(vec![band(-180.0), band(0.0)]);
    let b = mp(vec![band(-90.0), band(90.0)]);
    assert!(matches!(geographic(&a, &b), Err(UnionError::GeometryValidity(_))));
}

#[test]
fn geographic_pole_cases_fail() {
    let cap = mp(vec![polygon![(x: 0.0, y: 80.0), (x: 120.0, y: 80.0), (x: -120.0, y: 80.0)]]);
    let a = mp(vec![rect(0.0, 0.0, 1.0, 1.0)]);
    assert!(matches!(geographic(&a, &cap), Err(UnionError::GeometryValidity(_))));

    let touching = mp(vec![polygon![(x: 0.0, y: 80.0), (x: 10.0, y: 90.0), (x: 20.0, y: 80.0)]]);
    assert!(matches!(geographic(&touching, &a), Err(UnionError::GeometryValidity(_))));

    let beyond = mp(vec![polygon![(x: 0.0, y: 80.0), (x: 10.0, y: 95.0), (x: 20.0, y: 80.0)]]);
    assert!(matches!(geographic(&beyond, &a), Err(UnionError::GeometryValidity(_))));
}
