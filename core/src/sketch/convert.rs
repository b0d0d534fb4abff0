//! Sketch-to-region conversion.

use super::types::{GenericShape, ShapeKind, Sketch};
use crate::config::KernelConfig;
use crate::error::LaminateResult;
use crate::geometry::{unary_safe_union, PlanarRegion};
use tracing::{debug, warn};

/// Turns the closed shapes of a sketch into a single region.
///
/// Construction shapes are ignored. Lines and polylines bound no area and
/// contribute nothing; they are available through [`Sketch::paths`]. A shape
/// that fails to convert aborts the sketch in strict mode and is skipped
/// with a warning otherwise.
#[derive(Debug, Clone)]
pub struct RegionConverter {
    strict: bool,
    circle_segments: usize,
}

impl RegionConverter {
    pub fn new(config: &KernelConfig) -> Self {
        Self {
            strict: config.strict,
            circle_segments: config.circle_segments,
        }
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Region for one shape, `None` for open shapes.
    pub fn shape_region(&self, shape: &GenericShape) -> LaminateResult<Option<PlanarRegion>> {
        shape.validate()?;
        let points = shape.exterior_points();
        let region = match shape.kind {
            ShapeKind::Line | ShapeKind::Polyline => return Ok(None),
            ShapeKind::Polygon => PlanarRegion::polygon(&points, &shape.interior_points())?,
            ShapeKind::Circle => {
                let radius = shape.radius().unwrap_or(0.0);
                PlanarRegion::disc(points[0], radius, self.circle_segments)?
            }
            ShapeKind::TwoPointRect => PlanarRegion::rectangle(points[0], points[1])?,
        };
        Ok(Some(region))
    }

    pub fn convert(&self, sketch: &Sketch) -> LaminateResult<PlanarRegion> {
        let mut regions = Vec::with_capacity(sketch.shapes.len());
        for shape in sketch.shapes.iter().filter(|s| !s.construction) {
            match self.shape_region(shape) {
                Ok(Some(region)) => regions.push(region),
                Ok(None) => {}
                Err(e) if self.strict => return Err(e),
                Err(e) => warn!("Skipping shape {} in sketch '{}': {}", shape.id, sketch.name, e),
            }
        }
        debug!("Sketch '{}': {} closed shapes", sketch.name, regions.len());
        Ok(unary_safe_union(regions.iter()))
    }
}
