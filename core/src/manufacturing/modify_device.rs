//! Hand-drawn supports attached to a device laminate.

use super::{assemble, layer_stack};
use crate::error::{LaminateError, LaminateResult};
use crate::geometry::{stroke, unary_safe_union, PlanarRegion, Point};
use crate::laminate::Laminate;
use crate::layers::{LayerDefinition, LayerId};

/// Custom-support dimensions, already in internal units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomSupportParams {
    pub support_width: f64,
    /// How far past the device boundary a support may reach.
    pub support_out: f64,
    pub hole_radius: f64,
    pub cut_width: f64,
    pub circle_segments: usize,
}

impl CustomSupportParams {
    fn validate(&self) -> LaminateResult<()> {
        let values = [
            ("support width", self.support_width),
            ("support out", self.support_out),
            ("hole radius", self.hole_radius),
            ("cut width", self.cut_width),
        ];
        for (name, value) in values {
            if !(value.is_finite() && value >= 0.0) {
                return Err(LaminateError::InvalidParameter(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModifiedDevice {
    /// Device with supports fused on.
    pub device: Laminate,
    pub supports: Laminate,
    pub cuts: Laminate,
}

/// Thicken the support sketch and fuse it to `device` on `layers`.
///
/// `paths` are open support strokes, `area` any closed support shapes. On
/// each selected layer:
/// - supports = (strokes ∩ device grown by `support_out`) − device
/// - cuts = ((device grown by `cut_width`) − device − supports) ∪ relief
///   holes at stroke ends, minus the device
/// - device = device ∪ supports
///
/// Layers not selected pass through unchanged and get no supports or cuts.
pub fn modify_device(
    device: &Laminate,
    def: &LayerDefinition,
    paths: &[Vec<Point>],
    area: &PlanarRegion,
    layers: &[LayerId],
    params: &CustomSupportParams,
) -> LaminateResult<ModifiedDevice> {
    params.validate()?;
    for id in layers {
        def.require(*id)?;
    }

    let mut pieces = vec![area.clone()];
    let mut holes = Vec::new();
    for path in paths {
        if params.support_width > 0.0 {
            pieces.push(stroke(path, params.support_width / 2.0)?);
        }
        if params.hole_radius > 0.0 {
            for end in [path.first(), path.last()].into_iter().flatten() {
                holes.push(PlanarRegion::disc(*end, params.hole_radius, params.circle_segments)?);
            }
        }
    }
    let strokes = unary_safe_union(pieces.iter());
    let holes = unary_safe_union(holes.iter());

    let mut modified = Vec::new();
    let mut supports = Vec::new();
    let mut cuts = Vec::new();
    for (id, region) in layer_stack(device, def)? {
        if !layers.contains(&id) {
            modified.push((id, region));
            continue;
        }
        let support = strokes
            .intersection(&region.buffer(params.support_out))
            .difference(&region);
        let band = region
            .buffer(params.cut_width)
            .difference(&region)
            .difference(&support);
        let cut = band.union(&holes).difference(&region);

        modified.push((id, region.union(&support)));
        supports.push((id, support));
        cuts.push((id, cut));
    }

    Ok(ModifiedDevice {
        device: assemble(def, modified)?,
        supports: assemble(def, supports)?,
        cuts: assemble(def, cuts)?,
    })
}
