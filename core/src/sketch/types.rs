use crate::error::{LaminateError, LaminateResult};
use crate::geometry::{utils_2d, Point, Segment};
use crate::id::EntityId;
use serde::{Deserialize, Serialize};

/// A control point owned by exactly one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeVertex {
    pub id: EntityId,
    pub position: Point,
}

impl ShapeVertex {
    pub fn new(position: Point) -> Self {
        Self {
            id: EntityId::new(),
            position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Line,
    Polyline,
    Polygon,
    /// Exterior holds `[center, edge point]`.
    Circle,
    /// Exterior holds two opposite corners.
    TwoPointRect,
}

impl ShapeKind {
    /// Open shapes bound no area.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Line | Self::Polyline)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericShape {
    pub id: EntityId,
    pub kind: ShapeKind,
    pub exterior: Vec<ShapeVertex>,
    #[serde(default)]
    pub interiors: Vec<Vec<ShapeVertex>>,
    /// Authoring aid only; never converted to area.
    #[serde(default)]
    pub construction: bool,
}

fn vertices(points: &[Point]) -> Vec<ShapeVertex> {
    points.iter().map(|p| ShapeVertex::new(*p)).collect()
}

impl GenericShape {
    pub fn new(kind: ShapeKind, exterior: &[Point], interiors: &[Vec<Point>]) -> Self {
        Self {
            id: EntityId::new(),
            kind,
            exterior: vertices(exterior),
            interiors: interiors.iter().map(|r| vertices(r)).collect(),
            construction: false,
        }
    }

    pub fn line(start: Point, end: Point) -> Self {
        Self::new(ShapeKind::Line, &[start, end], &[])
    }

    pub fn polyline(points: &[Point]) -> Self {
        Self::new(ShapeKind::Polyline, points, &[])
    }

    pub fn polygon(exterior: &[Point], interiors: &[Vec<Point>]) -> Self {
        Self::new(ShapeKind::Polygon, exterior, interiors)
    }

    pub fn circle(center: Point, edge: Point) -> Self {
        Self::new(ShapeKind::Circle, &[center, edge], &[])
    }

    pub fn circle_with_radius(center: Point, radius: f64) -> Self {
        Self::circle(center, [center[0] + radius, center[1]])
    }

    pub fn two_point_rect(corner1: Point, corner2: Point) -> Self {
        Self::new(ShapeKind::TwoPointRect, &[corner1, corner2], &[])
    }

    pub fn as_construction(mut self) -> Self {
        self.construction = true;
        self
    }

    /// Check the vertex count the kind requires.
    pub fn validate(&self) -> LaminateResult<()> {
        let n = self.exterior.len();
        let ok = match self.kind {
            ShapeKind::Line => n == 2,
            ShapeKind::Polyline => n >= 2,
            ShapeKind::Polygon => n >= 3,
            ShapeKind::Circle | ShapeKind::TwoPointRect => n == 2,
        };
        if !ok {
            return Err(LaminateError::GeometryDegenerate(format!(
                "{:?} {} has {} exterior vertices",
                self.kind, self.id, n
            )));
        }
        if self.exterior.iter().any(|v| !(v.position[0].is_finite() && v.position[1].is_finite())) {
            return Err(LaminateError::GeometryDegenerate(format!(
                "{:?} {} has a non-finite vertex",
                self.kind, self.id
            )));
        }
        Ok(())
    }

    pub fn exterior_points(&self) -> Vec<Point> {
        self.exterior.iter().map(|v| v.position).collect()
    }

    pub fn interior_points(&self) -> Vec<Vec<Point>> {
        self.interiors
            .iter()
            .map(|ring| ring.iter().map(|v| v.position).collect())
            .collect()
    }

    /// Distance from center to edge point for circles.
    pub fn radius(&self) -> Option<f64> {
        match (self.kind, self.exterior.as_slice()) {
            (ShapeKind::Circle, [center, edge]) => {
                Some(utils_2d::distance(center.position, edge.position))
            }
            _ => None,
        }
    }

    /// Edges of the exterior: an open chain for lines and polylines, a
    /// closed ring for polygons. Circles and rectangles report the ring of
    /// their control points.
    pub fn segments(&self) -> Vec<Segment> {
        let points = self.exterior_points();
        if points.len() < 2 {
            return Vec::new();
        }
        let mut segments: Vec<Segment> = points.windows(2).map(|w| [w[0], w[1]]).collect();
        if !self.kind.is_open() && points.len() > 2 {
            segments.push([points[points.len() - 1], points[0]]);
        }
        segments
    }

    fn with_kind(&self, kind: ShapeKind, identical: bool) -> Self {
        if identical {
            return Self {
                kind,
                ..self.clone()
            };
        }
        Self {
            id: EntityId::new(),
            kind,
            exterior: vertices(&self.exterior_points()),
            interiors: self.interior_points().iter().map(|r| vertices(r)).collect(),
            construction: self.construction,
        }
    }

    /// Close a polyline into a polygon. `identical` keeps every id.
    pub fn fill(&self, identical: bool) -> Self {
        self.with_kind(ShapeKind::Polygon, identical)
    }

    /// Open a polygon into a polyline. Holes are discarded.
    pub fn hollow(&self, identical: bool) -> Self {
        let mut shape = self.with_kind(ShapeKind::Polyline, identical);
        shape.interiors.clear();
        shape
    }

    pub fn vertex(&self, id: EntityId) -> Option<&ShapeVertex> {
        self.exterior
            .iter()
            .chain(self.interiors.iter().flatten())
            .find(|v| v.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sketch {
    pub id: EntityId,
    pub name: String,
    pub shapes: Vec<GenericShape>,
}

impl Sketch {
    pub fn new(name: &str) -> Self {
        Self::with_id(EntityId::new(), name)
    }

    pub fn with_id(id: EntityId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            shapes: Vec::new(),
        }
    }

    pub fn add_shape(&mut self, shape: GenericShape) -> EntityId {
        let id = shape.id;
        self.shapes.push(shape);
        id
    }

    pub fn shape(&self, id: EntityId) -> Option<&GenericShape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Find a vertex by id across all shapes.
    pub fn vertex(&self, id: EntityId) -> Option<&ShapeVertex> {
        self.shapes.iter().find_map(|s| s.vertex(id))
    }

    /// Non-construction open shapes as point chains.
    pub fn paths(&self) -> Vec<Vec<Point>> {
        self.shapes
            .iter()
            .filter(|s| !s.construction && s.kind.is_open())
            .map(GenericShape::exterior_points)
            .filter(|p| p.len() >= 2)
            .collect()
    }

    /// The first `Line` shape, construction or not.
    pub fn first_line(&self) -> Option<Segment> {
        self.shapes.iter().find_map(|s| match (s.kind, s.exterior.as_slice()) {
            (ShapeKind::Line, [a, b]) => Some([a.position, b.position]),
            _ => None,
        })
    }
}
