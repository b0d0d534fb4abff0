//! Tolerant 2D point and segment predicates.
//!
//! Every predicate takes an explicit absolute `tolerance` in internal units;
//! there is no built-in epsilon. Comparisons are inclusive (`<=`), so a
//! tolerance of zero accepts exact matches.

use super::{Point, Segment};
use tracing::trace;

// =============================================================================
// Point Operations
// =============================================================================

/// Compute squared distance between two 2D points.
#[inline]
pub fn distance_squared(p1: Point, p2: Point) -> f64 {
    let dx = p2[0] - p1[0];
    let dy = p2[1] - p1[1];
    dx * dx + dy * dy
}

/// Compute distance between two 2D points.
#[inline]
pub fn distance(p1: Point, p2: Point) -> f64 {
    distance_squared(p1, p2).sqrt()
}

/// Linear interpolation between two 2D points.
#[inline]
pub fn lerp(p1: Point, p2: Point, t: f64) -> Point {
    [p1[0] + t * (p2[0] - p1[0]), p1[1] + t * (p2[1] - p1[1])]
}

/// Midpoint between two 2D points.
#[inline]
pub fn midpoint(p1: Point, p2: Point) -> Point {
    lerp(p1, p2, 0.5)
}

/// True when the two points are no further apart than `tolerance`.
#[inline]
pub fn coincident(p1: Point, p2: Point, tolerance: f64) -> bool {
    distance(p1, p2) <= tolerance
}

// =============================================================================
// Vector Operations
// =============================================================================

#[inline]
pub fn sub(a: Point, b: Point) -> [f64; 2] {
    [a[0] - b[0], a[1] - b[1]]
}

/// 2D cross product (z-component of 3D cross product).
/// Positive if v2 is counter-clockwise from v1.
#[inline]
pub fn cross_2d(v1: [f64; 2], v2: [f64; 2]) -> f64 {
    v1[0] * v2[1] - v1[1] * v2[0]
}

/// 2D dot product.
#[inline]
pub fn dot_2d(v1: [f64; 2], v2: [f64; 2]) -> f64 {
    v1[0] * v2[0] + v1[1] * v2[1]
}

#[inline]
pub fn length(v: [f64; 2]) -> f64 {
    dot_2d(v, v).sqrt()
}

// =============================================================================
// Segment Predicates
// =============================================================================

/// Perpendicular distance from `point` to the infinite line through `line`.
///
/// Uses the triangle-area identity `|v × w| / |v|`. A zero-length line has no
/// direction, so the distance to its (single) point is returned instead.
pub fn distance_point_to_line(point: Point, line: Segment) -> f64 {
    let v = sub(line[1], line[0]);
    let len = length(v);
    if len == 0.0 {
        return distance(line[0], point);
    }
    cross_2d(v, sub(point, line[0])).abs() / len
}

/// True when `point` lies within `tolerance` of the infinite line through `line`.
pub fn point_on_line(point: Point, line: Segment, tolerance: f64) -> bool {
    distance_point_to_line(point, line) <= tolerance
}

/// Both endpoints of `b` lie on the infinite line through `a`.
pub fn collinear(a: Segment, b: Segment, tolerance: f64) -> bool {
    point_on_line(b[0], a, tolerance) && point_on_line(b[1], a, tolerance)
}

/// True when `point` lies strictly inside `segment`.
///
/// Three tests must all hold: the point is on the same side of the start as
/// the end (positive dot product), it is closer to the start than the end is,
/// and it sits within `tolerance` of the supporting line. Both endpoints are
/// excluded: a point coincident with either end is *not* within the segment.
pub fn point_within_segment(point: Point, segment: Segment, tolerance: f64) -> bool {
    let v = sub(segment[1], segment[0]);
    let w = sub(point, segment[0]);
    let same_orientation = dot_2d(v, w) > 0.0;
    let within = length(w) < length(v);
    let on_line = distance_point_to_line(point, segment) <= tolerance;
    same_orientation && within && on_line
}

/// Segments are collinear and at least one end of `b` falls strictly inside `a`.
pub fn shared_edge(a: Segment, b: Segment, tolerance: f64) -> bool {
    collinear(a, b, tolerance)
        && (point_within_segment(b[0], a, tolerance) || point_within_segment(b[1], a, tolerance))
}

/// Midpoint of every segment, in order.
pub fn segment_midpoints(segments: &[Segment]) -> Vec<Point> {
    segments.iter().map(|s| midpoint(s[0], s[1])).collect()
}

/// Linearize an unordered cloud of points lying along one polyline.
///
/// Starting from `seed`, each vertex is first tried as an extension past
/// either end of the chain, then as an insertion between any adjacent pair
/// it falls within. Vertices coincident with one already in the chain are
/// skipped. The caller guarantees the points form a single chain; a vertex
/// that fits nowhere is dropped.
pub fn order_vertices(vertices: &[Point], seed: Segment, tolerance: f64) -> Vec<Point> {
    let mut ordering = vec![seed[0], seed[1]];

    for &candidate in vertices {
        if ordering.iter().any(|&p| coincident(p, candidate, tolerance)) {
            continue;
        }

        let first = ordering[0];
        let last = ordering[ordering.len() - 1];

        if point_within_segment(first, [candidate, last], tolerance) {
            ordering.insert(0, candidate);
        } else if point_within_segment(last, [first, candidate], tolerance) {
            ordering.push(candidate);
        } else if let Some(index) = ordering
            .windows(2)
            .position(|pair| point_within_segment(candidate, [pair[0], pair[1]], tolerance))
        {
            ordering.insert(index + 1, candidate);
        } else {
            trace!("order_vertices: {:?} is not on the chain, dropped", candidate);
        }
    }

    ordering
}

// =============================================================================
// Intersection
// =============================================================================

/// True when the two segments cross at a single interior point of both.
/// Touching at an endpoint and collinear overlap do not count.
pub fn segments_cross(a: Segment, b: Segment) -> bool {
    let d1 = cross_2d(sub(a[1], a[0]), sub(b[0], a[0]));
    let d2 = cross_2d(sub(a[1], a[0]), sub(b[1], a[0]));
    let d3 = cross_2d(sub(b[1], b[0]), sub(a[0], b[0]));
    let d4 = cross_2d(sub(b[1], b[0]), sub(a[1], b[0]));
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

/// Check whether a closed ring crosses itself. The ring may or may not
/// repeat its first point at the end.
pub fn ring_self_intersects(ring: &[Point]) -> bool {
    let mut points = ring.to_vec();
    if points.len() > 1 && points[0] == points[points.len() - 1] {
        points.pop();
    }
    let n = points.len();
    if n < 4 {
        return false;
    }

    let edge = |i: usize| -> Segment { [points[i], points[(i + 1) % n]] };
    for i in 0..n {
        for j in (i + 2)..n {
            // First and last edges share a vertex.
            if i == 0 && j == n - 1 {
                continue;
            }
            if segments_cross(edge(i), edge(j)) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coincident_with_itself_for_any_tolerance() {
        for p in [[0.0, 0.0], [1.5, -2.25], [1e9, -1e-9]] {
            assert!(coincident(p, p, 0.0));
            assert!(coincident(p, p, 1e-12));
            assert!(coincident(p, p, 10.0));
        }
    }

    #[test]
    fn test_coincident_respects_tolerance() {
        assert!(coincident([0.0, 0.0], [0.0, 0.5], 0.5));
        assert!(!coincident([0.0, 0.0], [0.0, 0.5], 0.49));
    }

    #[test]
    fn test_midpoint_is_on_line() {
        let segments: [Segment; 3] = [
            [[0.0, 0.0], [4.0, 2.0]],
            [[-3.0, 1.0], [5.0, 7.0]],
            [[2.0, 2.0], [2.0, -6.0]],
        ];
        for s in segments {
            let m = midpoint(s[0], s[1]);
            assert!(point_on_line(m, s, 0.0));
            assert!(point_on_line(m, s, 1e-3));
        }
    }

    #[test]
    fn test_point_on_line_is_infinite() {
        // Beyond the segment end, still on the supporting line.
        assert!(point_on_line([10.0, 10.0], [[0.0, 0.0], [1.0, 1.0]], 1e-9));
        assert!(!point_on_line([10.0, 10.5], [[0.0, 0.0], [1.0, 1.0]], 1e-3));
    }

    #[test]
    fn test_point_on_zero_length_line() {
        let line = [[1.0, 1.0], [1.0, 1.0]];
        assert!(point_on_line([1.0, 1.0], line, 0.0));
        assert!(!point_on_line([2.0, 1.0], line, 0.5));
    }

    #[test]
    fn test_collinear() {
        let a = [[0.0, 0.0], [1.0, 1.0]];
        assert!(collinear(a, [[0.1, 0.1 + 0.5e-3], [0.9, 0.9]], 1e-3));
        assert!(collinear(a, [[-0.1, -0.1], [-0.9, -0.9]], 1e-3));
        assert!(!collinear(a, [[0.0, 1.0], [1.0, 2.0]], 1e-3));
    }

    #[test]
    fn test_point_within_segment_interior() {
        let s = [[0.0, 0.0], [3.0, 0.0]];
        assert!(point_within_segment([1.0, 0.0], s, 1e-9));
        assert!(point_within_segment([2.999, 0.0], s, 1e-9));
        assert!(!point_within_segment([4.0, 0.0], s, 1e-9));
        assert!(!point_within_segment([-1.0, 0.0], s, 1e-9));
        assert!(!point_within_segment([1.0, 0.1], s, 1e-3));
    }

    #[test]
    fn test_point_within_segment_excludes_endpoints() {
        let s = [[0.0, 0.0], [3.0, 0.0]];
        assert!(!point_within_segment([0.0, 0.0], s, 1e-6));
        assert!(!point_within_segment([3.0, 0.0], s, 1e-6));
    }

    #[test]
    fn test_shared_edge() {
        let a = [[0.0, 0.0], [2.0, 0.0]];
        assert!(shared_edge(a, [[1.0, 0.0], [5.0, 0.0]], 1e-9));
        assert!(!shared_edge(a, [[2.0, 0.0], [5.0, 0.0]], 1e-9));
        assert!(!shared_edge(a, [[1.0, 1.0], [5.0, 1.0]], 1e-9));
    }

    #[test]
    fn test_order_vertices_chain() {
        let vertices = [[2.0, 0.0], [0.0, 0.0], [1.0, 0.0], [3.0, 0.0]];
        let ordered = order_vertices(&vertices, [[0.0, 0.0], [3.0, 0.0]], 1e-6);
        assert_eq!(ordered, vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]]);
    }

    #[test]
    fn test_order_vertices_extends_both_ends() {
        let vertices = [[4.0, 0.0], [-1.0, 0.0], [0.5, 0.0]];
        let ordered = order_vertices(&vertices, [[0.0, 0.0], [1.0, 0.0]], 1e-6);
        assert_eq!(
            ordered,
            vec![[-1.0, 0.0], [0.0, 0.0], [0.5, 0.0], [1.0, 0.0], [4.0, 0.0]]
        );
    }

    #[test]
    fn test_segment_midpoints() {
        let mids = segment_midpoints(&[[[0.0, 0.0], [2.0, 2.0]], [[1.0, 0.0], [1.0, 4.0]]]);
        assert_eq!(mids, vec![[1.0, 1.0], [1.0, 2.0]]);
    }

    #[test]
    fn test_bowtie_self_intersects() {
        let bowtie = [[0.0, 0.0], [2.0, 2.0], [2.0, 0.0], [0.0, 2.0], [0.0, 0.0]];
        assert!(ring_self_intersects(&bowtie));
        let square = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]];
        assert!(!ring_self_intersects(&square));
    }
}
