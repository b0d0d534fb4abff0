use super::{assemble, layer_stack, sweep_down, sweep_up, KeepoutType};
use crate::error::{LaminateError, LaminateResult};
use crate::geometry::{unary_safe_union, PlanarRegion};
use crate::laminate::Laminate;
use crate::layers::LayerDefinition;

/// Area on each layer a tool of the given kind passes through while cutting
/// the laminate.
pub fn keepout(
    laminate: &Laminate,
    def: &LayerDefinition,
    kind: KeepoutType,
) -> LaminateResult<Laminate> {
    let stack = layer_stack(laminate, def)?;
    let (ids, regions): (Vec<_>, Vec<_>) = stack.into_iter().unzip();

    let per_layer: Vec<PlanarRegion> = match kind {
        KeepoutType::LaserKeepout => {
            let all = unary_safe_union(regions.iter());
            vec![all; regions.len()]
        }
        KeepoutType::MillKeepout => sweep_up(&regions),
        KeepoutType::MillFlipKeepout => {
            let up = sweep_up(&regions);
            let down = sweep_down(&regions);
            up.iter().zip(down.iter()).map(|(u, d)| u.intersection(d)).collect()
        }
    };

    assemble(def, ids.into_iter().zip(per_layer))
}

/// Keep-out grown by `clearance` on every layer. Growing the clearance never
/// shrinks the result.
pub fn buffered_keepout(
    laminate: &Laminate,
    def: &LayerDefinition,
    kind: KeepoutType,
    clearance: f64,
) -> LaminateResult<Laminate> {
    if !(clearance.is_finite() && clearance >= 0.0) {
        return Err(LaminateError::InvalidParameter(format!(
            "keep-out clearance must be non-negative, got {}",
            clearance
        )));
    }
    Ok(keepout(laminate, def, kind)?.buffer(clearance))
}
