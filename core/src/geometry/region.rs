//! Multi-part polygon-with-holes regions backed by `geo`.

use super::transform::Affine2;
use super::utils_2d::ring_self_intersects;
use super::Point;
use crate::error::{LaminateError, LaminateResult};
use geo::orient::{Direction, Orient};
use geo::{
    AffineOps, Area, BooleanOps, BoundingRect, Buffer, Coord, Intersects, LineString,
    MultiLineString, MultiPolygon, Polygon,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A possibly multi-part planar region with holes.
///
/// The empty region is a multi-polygon with no parts. Boolean operations
/// always produce normalized output from the overlay engine, so a region
/// built through them never carries self-intersecting rings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanarRegion(MultiPolygon<f64>);

impl Default for PlanarRegion {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<MultiPolygon<f64>> for PlanarRegion {
    fn from(mp: MultiPolygon<f64>) -> Self {
        Self(mp)
    }
}

impl From<Polygon<f64>> for PlanarRegion {
    fn from(polygon: Polygon<f64>) -> Self {
        Self(MultiPolygon::new(vec![polygon]))
    }
}

fn to_coord(p: &Point) -> Coord<f64> {
    Coord { x: p[0], y: p[1] }
}

fn to_line_string(points: &[Point]) -> LineString<f64> {
    LineString::new(points.iter().map(to_coord).collect())
}

fn ring_points(ring: &LineString<f64>) -> Vec<Point> {
    ring.coords().map(|c| [c.x, c.y]).collect()
}

impl PlanarRegion {
    pub fn empty() -> Self {
        Self(MultiPolygon::new(Vec::new()))
    }

    /// Build a region from one exterior ring and any number of holes.
    /// Rings need not be closed. Self-intersecting rings are repaired.
    pub fn polygon(exterior: &[Point], interiors: &[Vec<Point>]) -> LaminateResult<Self> {
        let polygon = Polygon::new(
            to_line_string(exterior),
            interiors.iter().map(|r| to_line_string(r)).collect(),
        );
        let polygon = sanitize_polygon(polygon)?;
        Ok(Self(repair(polygon)))
    }

    /// Axis-aligned rectangle spanned by two opposite corners.
    pub fn rectangle(c1: Point, c2: Point) -> LaminateResult<Self> {
        let (x0, x1) = (c1[0].min(c2[0]), c1[0].max(c2[0]));
        let (y0, y1) = (c1[1].min(c2[1]), c1[1].max(c2[1]));
        Self::polygon(&[[x0, y0], [x1, y0], [x1, y1], [x0, y1]], &[])
    }

    /// Regular `segments`-gon inscribed in the circle.
    pub fn disc(center: Point, radius: f64, segments: usize) -> LaminateResult<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(LaminateError::GeometryDegenerate(format!(
                "circle radius must be positive, got {}",
                radius
            )));
        }
        if segments < 3 {
            return Err(LaminateError::InvalidParameter(format!(
                "a circle needs at least 3 segments, got {}",
                segments
            )));
        }
        let ring: Vec<Point> = (0..segments)
            .map(|k| {
                let theta = std::f64::consts::TAU * k as f64 / segments as f64;
                [center[0] + radius * theta.cos(), center[1] + radius * theta.sin()]
            })
            .collect();
        Self::polygon(&ring, &[])
    }

    pub fn as_multi_polygon(&self) -> &MultiPolygon<f64> {
        &self.0
    }

    pub fn into_multi_polygon(self) -> MultiPolygon<f64> {
        self.0
    }

    pub fn polygons(&self) -> &[Polygon<f64>] {
        &self.0 .0
    }

    /// Each part as its own region.
    pub fn parts(&self) -> Vec<PlanarRegion> {
        self.0 .0.iter().cloned().map(PlanarRegion::from).collect()
    }

    /// No parts, or only parts of zero area.
    pub fn is_empty(&self) -> bool {
        self.0 .0.is_empty() || self.area() == 0.0
    }

    pub fn area(&self) -> f64 {
        self.0.unsigned_area()
    }

    pub fn union(&self, other: &PlanarRegion) -> PlanarRegion {
        if self.0 .0.is_empty() {
            return other.clone();
        }
        if other.0 .0.is_empty() {
            return self.clone();
        }
        Self(self.0.union(&other.0))
    }

    pub fn intersection(&self, other: &PlanarRegion) -> PlanarRegion {
        if self.0 .0.is_empty() || other.0 .0.is_empty() {
            return Self::empty();
        }
        Self(self.0.intersection(&other.0))
    }

    pub fn difference(&self, other: &PlanarRegion) -> PlanarRegion {
        if self.0 .0.is_empty() {
            return Self::empty();
        }
        if other.0 .0.is_empty() {
            return self.clone();
        }
        Self(self.0.difference(&other.0))
    }

    pub fn symmetric_difference(&self, other: &PlanarRegion) -> PlanarRegion {
        if self.0 .0.is_empty() {
            return other.clone();
        }
        if other.0 .0.is_empty() {
            return self.clone();
        }
        Self(self.0.xor(&other.0))
    }

    /// Offset the boundary outward (positive) or inward (negative).
    pub fn buffer(&self, distance: f64) -> PlanarRegion {
        if self.0 .0.is_empty() || distance == 0.0 {
            return self.clone();
        }
        Self(self.0.buffer(distance))
    }

    pub fn intersects(&self, other: &PlanarRegion) -> bool {
        !self.0 .0.is_empty() && !other.0 .0.is_empty() && self.0.intersects(&other.0)
    }

    /// `(min, max)` corners of the bounding box, `None` when empty.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        self.0
            .bounding_rect()
            .map(|r| ([r.min().x, r.min().y], [r.max().x, r.max().y]))
    }

    pub fn min_corner(&self) -> Option<Point> {
        self.bounds().map(|(min, _)| min)
    }

    pub fn transformed(&self, transform: &Affine2) -> PlanarRegion {
        Self(self.0.affine_transform(&transform.to_geo()))
    }

    pub fn translated(&self, dx: f64, dy: f64) -> PlanarRegion {
        self.transformed(&Affine2::translation(dx, dy))
    }

    /// Portions of the open `path` lying inside this region.
    pub fn clip_path(&self, path: &[Point]) -> Vec<Vec<Point>> {
        if self.0 .0.is_empty() || path.len() < 2 {
            return Vec::new();
        }
        let lines = MultiLineString::new(vec![to_line_string(path)]);
        self.0
            .clip(&lines, false)
            .0
            .iter()
            .map(ring_points)
            .filter(|piece| piece.len() >= 2)
            .collect()
    }

    /// Exterior ring and hole rings of every part, closing point included.
    pub fn rings(&self) -> Vec<(Vec<Point>, Vec<Vec<Point>>)> {
        self.0 .0
            .iter()
            .map(|p| {
                (
                    ring_points(p.exterior()),
                    p.interiors().iter().map(ring_points).collect(),
                )
            })
            .collect()
    }

    /// Triangulate every part with ear clipping.
    pub fn triangulate(&self) -> LaminateResult<Vec<[Point; 3]>> {
        let mut triangles = Vec::new();
        for polygon in &self.0 .0 {
            let mut data: Vec<f64> = Vec::new();
            let mut holes: Vec<usize> = Vec::new();

            push_open_ring(&mut data, polygon.exterior());
            for interior in polygon.interiors() {
                holes.push(data.len() / 2);
                push_open_ring(&mut data, interior);
            }

            let indices = earcutr::earcut(&data, &holes, 2).map_err(|e| {
                LaminateError::GeometryDegenerate(format!("triangulation failed: {:?}", e))
            })?;

            let vertex = |i: usize| -> Point { [data[2 * i], data[2 * i + 1]] };
            for tri in indices.chunks_exact(3) {
                triangles.push([vertex(tri[0]), vertex(tri[1]), vertex(tri[2])]);
            }
        }
        Ok(triangles)
    }
}

fn push_open_ring(data: &mut Vec<f64>, ring: &LineString<f64>) {
    let coords = &ring.0;
    let n = if coords.len() > 1 && coords.first() == coords.last() {
        coords.len() - 1
    } else {
        coords.len()
    };
    for c in &coords[..n] {
        data.push(c.x);
        data.push(c.y);
    }
}

/// Thicken an open path into a region of the given half-width.
pub fn stroke(path: &[Point], half_width: f64) -> LaminateResult<PlanarRegion> {
    if path.len() < 2 {
        return Err(LaminateError::GeometryDegenerate(
            "a stroke needs at least two points".to_string(),
        ));
    }
    if !(half_width.is_finite() && half_width > 0.0) {
        return Err(LaminateError::InvalidParameter(format!(
            "stroke width must be positive, got {}",
            half_width * 2.0
        )));
    }
    Ok(PlanarRegion(to_line_string(path).buffer(half_width)))
}

/// Union any number of regions without failing on bad input.
///
/// Each part is sanitized first: non-finite coordinates, rings with fewer
/// than three distinct points and zero-area rings are dropped with a
/// warning. Self-intersecting parts are repaired by passing them through
/// the overlay engine alone (a no-op dilation) before the union proper.
pub fn unary_safe_union<'a>(regions: impl IntoIterator<Item = &'a PlanarRegion>) -> PlanarRegion {
    let mut polygons: Vec<Polygon<f64>> = Vec::new();
    for region in regions {
        for polygon in region.polygons() {
            match sanitize_polygon(polygon.clone()) {
                Ok(clean) => polygons.extend(repair(clean).0),
                Err(e) => warn!("Dropping polygon from union: {}", e),
            }
        }
    }

    if polygons.is_empty() {
        return PlanarRegion::empty();
    }
    PlanarRegion(geo::unary_union(polygons.iter()))
}

fn clean_ring(ring: &LineString<f64>) -> LaminateResult<LineString<f64>> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    for c in ring.coords() {
        if !(c.x.is_finite() && c.y.is_finite()) {
            return Err(LaminateError::GeometryDegenerate(
                "non-finite coordinate".to_string(),
            ));
        }
        if coords.last() != Some(c) {
            coords.push(*c);
        }
    }
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    if coords.len() < 3 {
        return Err(LaminateError::GeometryDegenerate(format!(
            "ring has {} distinct points",
            coords.len()
        )));
    }
    let ring = LineString::new(coords);
    // A crossing ring can have zero signed area and still enclose space.
    let crossing = ring_self_intersects(&ring_points(&ring));
    if !crossing && Polygon::new(ring.clone(), vec![]).unsigned_area() == 0.0 {
        return Err(LaminateError::GeometryDegenerate("zero-area ring".to_string()));
    }
    Ok(ring)
}

fn sanitize_polygon(polygon: Polygon<f64>) -> LaminateResult<Polygon<f64>> {
    let exterior = clean_ring(polygon.exterior())?;
    let interiors = polygon
        .interiors()
        .iter()
        .filter_map(|hole| match clean_ring(hole) {
            Ok(h) => Some(h),
            Err(e) => {
                debug!("Dropping degenerate hole: {}", e);
                None
            }
        })
        .collect();
    // Exterior counter-clockwise, holes clockwise, whatever the input winding.
    Ok(Polygon::new(exterior, interiors).orient(Direction::Default))
}

fn repair(polygon: Polygon<f64>) -> MultiPolygon<f64> {
    let crossing = ring_self_intersects(&ring_points(polygon.exterior()))
        || polygon
            .interiors()
            .iter()
            .any(|r| ring_self_intersects(&ring_points(r)));
    let single = MultiPolygon::new(vec![polygon]);
    if !crossing {
        return single;
    }
    debug!("Repairing self-intersecting polygon");
    single.union(&MultiPolygon::<f64>::new(Vec::new()))
}
