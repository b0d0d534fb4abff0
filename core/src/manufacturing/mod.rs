//! Manufacturing analyses over laminates.
//!
//! Layers are indexed bottom (0) to top (n-1). `up(i)` is the union of
//! layers `i..n` and `down(i)` the union of layers `0..=i`; every keep-out
//! and removability rule below is expressed through those two sweeps.

pub mod body_detection;
pub mod keepout;
pub mod modify_device;
pub mod removability;
pub mod support;
pub mod tool_clearance;

pub use body_detection::find_bodies;
pub use keepout::{buffered_keepout, keepout};
pub use modify_device::{modify_device, CustomSupportParams, ModifiedDevice};
pub use removability::removability;
pub use support::{autosupport, support_candidate, SupportCandidate};
pub use tool_clearance::tool_clearance;

use crate::error::LaminateResult;
use crate::geometry::PlanarRegion;
use crate::laminate::Laminate;
use crate::layers::{LayerDefinition, LayerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepoutType {
    /// A laser cuts through the whole stack.
    LaserKeepout,
    /// A mill plunges from the top down to the layer.
    MillKeepout,
    /// Milled from both faces.
    MillFlipKeepout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovabilityMode {
    OneWayUp,
    OneWayDown,
    TwoWay,
}

/// Regions of `laminate` in stack order of `def`, bottom first.
pub(crate) fn layer_stack(
    laminate: &Laminate,
    def: &LayerDefinition,
) -> LaminateResult<Vec<(LayerId, PlanarRegion)>> {
    for id in laminate.layer_ids() {
        def.require(*id)?;
    }
    Ok(def
        .ids()
        .into_iter()
        .map(|id| (id, laminate.region(id).cloned().unwrap_or_default()))
        .collect())
}

/// Rebuild a laminate over `def` from per-layer regions.
pub(crate) fn assemble(
    def: &LayerDefinition,
    regions: impl IntoIterator<Item = (LayerId, PlanarRegion)>,
) -> LaminateResult<Laminate> {
    let mut laminate = Laminate::new(def);
    for (id, region) in regions {
        if !region.polygons().is_empty() {
            laminate.replace_layer_geometry(id, region)?;
        }
    }
    Ok(laminate)
}

/// `up[i]` = union of layers `i..n`.
pub(crate) fn sweep_up(regions: &[PlanarRegion]) -> Vec<PlanarRegion> {
    let mut out = vec![PlanarRegion::empty(); regions.len()];
    let mut acc = PlanarRegion::empty();
    for (i, region) in regions.iter().enumerate().rev() {
        acc = acc.union(region);
        out[i] = acc.clone();
    }
    out
}

/// `down[i]` = union of layers `0..=i`.
pub(crate) fn sweep_down(regions: &[PlanarRegion]) -> Vec<PlanarRegion> {
    let mut acc = PlanarRegion::empty();
    regions
        .iter()
        .map(|region| {
            acc = acc.union(region);
            acc.clone()
        })
        .collect()
}
