//! Profile cut through a laminate along a sketched line.

use crate::config::KernelConfig;
use crate::error::{LaminateError, LaminateResult};
use crate::geometry::{transform_from_two_lines, unary_safe_union, PlanarRegion, Point};
use crate::laminate::Laminate;
use crate::layers::LayerDefinition;
use crate::manufacturing::layer_stack;
use crate::sketch::Sketch;
use tracing::debug;

/// Slice `source` along the first line of `sketch`.
///
/// The line is rotated onto the x-axis with its start at the origin. Every
/// stretch of the line inside a layer's region becomes a rectangle whose
/// x-extent is the stretch and whose y-extent is the layer's z-range
/// multiplied by `scale`. Only the stacking direction is scaled, so thin
/// laminates can be exaggerated while lengths along the cut stay true.
/// Each output layer holds that layer's slices.
pub fn cross_section(
    source: &Laminate,
    def: &LayerDefinition,
    sketch: &Sketch,
    scale: f64,
    config: &KernelConfig,
) -> LaminateResult<Laminate> {
    let line = sketch
        .first_line()
        .ok_or(LaminateError::MissingSectionLine(sketch.id))?;
    if !(scale.is_finite() && scale > 0.0) {
        return Err(LaminateError::InvalidParameter(format!(
            "cross-section scale must be positive, got {}",
            scale
        )));
    }

    let transform = transform_from_two_lines(line, [[0.0, 0.0], [1.0, 0.0]], Some(1.0), Some(1.0))?;
    let path = [line[0], line[1]];

    let mut result = Laminate::new(def);
    for (id, region) in layer_stack(source, def)? {
        let thickness = def.layer(id).map(|l| l.thickness).unwrap_or(0.0);
        let height = config.scaled(thickness) * scale;
        let z = config.scaled(def.z_value(id)?) * scale;

        let mut slices = Vec::new();
        for piece in region.clip_path(&path) {
            let xs: Vec<f64> = piece.iter().map(|p: &Point| transform.apply(*p)[0]).collect();
            let x0 = xs.iter().copied().fold(f64::INFINITY, f64::min);
            let x1 = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            match PlanarRegion::rectangle([x0, z], [x1, z + height]) {
                Ok(slice) => slices.push(slice),
                Err(e) => debug!("Skipping degenerate slice on layer {}: {}", id, e),
            }
        }
        if !slices.is_empty() {
            result.replace_layer_geometry(id, unary_safe_union(slices.iter()))?;
        }
    }
    Ok(result)
}
