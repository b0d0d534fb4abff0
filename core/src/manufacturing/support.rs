use super::{assemble, keepout, layer_stack, KeepoutType};
use crate::error::{LaminateError, LaminateResult};
use crate::laminate::{BinaryOperation, Laminate};
use crate::layers::LayerDefinition;

/// Support web around a device: on every layer, the device projection grown
/// by `support_gap + keepout_distance`, minus the keep-out grown by
/// `keepout_distance`.
pub fn autosupport(
    laminate: &Laminate,
    keepout: &Laminate,
    def: &LayerDefinition,
    support_gap: f64,
    keepout_distance: f64,
) -> LaminateResult<Laminate> {
    for (name, value) in [("support gap", support_gap), ("keep-out distance", keepout_distance)] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(LaminateError::InvalidParameter(format!(
                "{} must be non-negative, got {}",
                name, value
            )));
        }
    }

    let outer = laminate.projection().buffer(support_gap + keepout_distance);
    let stack = layer_stack(keepout, def)?;
    assemble(
        def,
        stack
            .into_iter()
            .map(|(id, k)| (id, outer.difference(&k.buffer(keepout_distance)))),
    )
}

/// Outputs of a support-candidate analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportCandidate {
    pub support: Laminate,
    /// The keep-out itself; its boundary is where the device is cut free.
    pub cut_line: Laminate,
    /// Thin band of width `band` just outside the keep-out.
    pub cut_area: Laminate,
}

pub fn support_candidate(
    laminate: &Laminate,
    def: &LayerDefinition,
    kind: KeepoutType,
    support_gap: f64,
    keepout_distance: f64,
    band: f64,
) -> LaminateResult<SupportCandidate> {
    let keepout = keepout(laminate, def, kind)?;
    let support = autosupport(laminate, &keepout, def, support_gap, keepout_distance)?;
    let cut_area = keepout
        .buffer(band)
        .binary_operation(&keepout, BinaryOperation::Difference);
    Ok(SupportCandidate {
        support,
        cut_line: keepout,
        cut_area,
    })
}
