//! Ingestion of foreign CAD geometry.
//!
//! A reader for an interchange format (DXF or similar) produces
//! [`ImportedLayer`]s; [`import_layers`] turns each one into a sketch and a
//! sketch operation placing it on the layer of the same name.

use crate::design::Design;
use crate::error::{LaminateError, LaminateResult};
use crate::geometry::Point;
use crate::id::EntityId;
use crate::operations::OperationNode;
use crate::sketch::{GenericShape, Sketch};
use crate::units::LengthUnit;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImportedEntity {
    Circle { center: Point, radius: f64 },
    Line { start: Point, end: Point },
    Polyline { points: Vec<Point>, closed: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedLayer {
    pub name: String,
    pub entities: Vec<ImportedEntity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Unit the foreign coordinates are written in.
    pub source_unit: LengthUnit,
}

impl ImportedEntity {
    fn to_shape(&self, scale: &impl Fn(f64) -> f64) -> GenericShape {
        let p = |pt: &Point| [scale(pt[0]), scale(pt[1])];
        match self {
            Self::Circle { center, radius } => {
                GenericShape::circle_with_radius(p(center), scale(*radius))
            }
            Self::Line { start, end } => GenericShape::line(p(start), p(end)),
            Self::Polyline { points, closed } => {
                let points: Vec<Point> = points.iter().map(p).collect();
                if *closed {
                    GenericShape::polygon(&points, &[])
                } else {
                    GenericShape::polyline(&points)
                }
            }
        }
    }
}

/// Stable id for an imported sketch, so re-importing the same layer
/// updates the sketch instead of duplicating it.
fn sketch_id(layer: &str) -> EntityId {
    EntityId::new_deterministic(&format!("import/{}/sketch", layer))
}

fn operation_id(layer: &str) -> EntityId {
    EntityId::new_deterministic(&format!("import/{}/operation", layer))
}

/// Bring `layers` into `design`. Returns the ids of the operations placing
/// each imported layer, in input order. Layers without entities are skipped.
pub fn import_layers(
    design: &mut Design,
    layers: &[ImportedLayer],
    options: &ImportOptions,
) -> LaminateResult<Vec<EntityId>> {
    let target_unit = design.config().unit;
    let strict = design.config().strict;
    let scale = |v: f64| options.source_unit.convert(v, target_unit);

    // Resolve every name before touching the design.
    let mut targets = Vec::with_capacity(layers.len());
    for layer in layers {
        let id = design
            .layer_def()
            .by_name(&layer.name)
            .map(|l| l.id)
            .ok_or_else(|| LaminateError::UnknownLayerName(layer.name.clone()))?;
        targets.push(id);
    }

    let mut operations = Vec::new();
    for (layer, target) in layers.iter().zip(targets) {
        if layer.entities.is_empty() {
            debug!("Layer '{}' has nothing to import", layer.name);
            continue;
        }

        let mut sketch = Sketch::with_id(sketch_id(&layer.name), &layer.name);
        for entity in &layer.entities {
            let shape = entity.to_shape(&scale);
            match shape.validate() {
                Ok(()) => {
                    sketch.add_shape(shape);
                }
                Err(e) if strict => return Err(e),
                Err(e) => warn!("Skipping imported entity on layer '{}': {}", layer.name, e),
            }
        }

        let sketch_exists = design.sketch(sketch.id).is_ok();
        let sketch = if sketch_exists {
            let id = sketch.id;
            design.replace_sketch(sketch)?;
            id
        } else {
            design.add_sketch(sketch)?
        };

        let op = operation_id(&layer.name);
        if design.operation(op).is_err() {
            let name = format!("import {}", layer.name);
            let node = OperationNode::sketch_operation(&name, sketch, vec![target]).with_id(op);
            design.add_operation(node)?;
        }
        operations.push(op);
    }

    info!("Imported {} layer(s) into '{}'", operations.len(), design.name);
    Ok(operations)
}
