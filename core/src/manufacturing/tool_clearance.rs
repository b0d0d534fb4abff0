use super::{keepout, KeepoutType};
use crate::error::LaminateResult;
use crate::laminate::{BinaryOperation, Laminate};
use crate::layers::LayerDefinition;

/// Material the tool removes around the laminate: the keep-out minus the
/// laminate itself, per layer.
pub fn tool_clearance(
    laminate: &Laminate,
    def: &LayerDefinition,
    kind: KeepoutType,
) -> LaminateResult<Laminate> {
    let keepout = keepout(laminate, def, kind)?;
    Ok(keepout.binary_operation(laminate, BinaryOperation::Difference))
}
