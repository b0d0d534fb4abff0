//! Layer-by-layer planar geometry.
//!
//! A [`Laminate`] maps each layer of one stack to a [`PlanarRegion`]. A layer
//! with no entry is empty. Every operation builds a new laminate; nothing in
//! here mutates a laminate that another node may hold.

use crate::error::{LaminateError, LaminateResult};
use crate::geometry::{unary_safe_union, PlanarRegion};
use crate::layers::{LayerDefinition, LayerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOperation {
    Union,
    Intersection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOperation {
    Difference,
    SymmetricDifference,
}

/// Boolean function applied by a laminate-combine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaminateFunction {
    Union,
    Intersection,
    Difference,
    SymmetricDifference,
}

impl LaminateFunction {
    pub fn is_unary(&self) -> bool {
        matches!(self, Self::Union | Self::Intersection)
    }
}

impl UnaryOperation {
    fn apply(&self, a: &PlanarRegion, b: &PlanarRegion) -> PlanarRegion {
        match self {
            Self::Union => a.union(b),
            Self::Intersection => a.intersection(b),
        }
    }
}

impl BinaryOperation {
    fn apply(&self, a: &PlanarRegion, b: &PlanarRegion) -> PlanarRegion {
        match self {
            Self::Difference => a.difference(b),
            Self::SymmetricDifference => a.symmetric_difference(b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Laminate {
    /// Layers this laminate is scoped to, bottom to top.
    layer_ids: Vec<LayerId>,
    geometry: BTreeMap<LayerId, PlanarRegion>,
}

impl Laminate {
    /// An empty laminate over every layer of `def`.
    pub fn new(def: &LayerDefinition) -> Self {
        Self::with_layers(def.ids())
    }

    pub fn with_layers(layer_ids: Vec<LayerId>) -> Self {
        Self {
            layer_ids,
            geometry: BTreeMap::new(),
        }
    }

    pub fn layer_ids(&self) -> &[LayerId] {
        &self.layer_ids
    }

    pub fn has_layer(&self, id: LayerId) -> bool {
        self.layer_ids.contains(&id)
    }

    fn require(&self, id: LayerId) -> LaminateResult<()> {
        if self.has_layer(id) {
            Ok(())
        } else {
            Err(LaminateError::LayerMismatch(id))
        }
    }

    /// Region on `id`; an empty region when the layer holds nothing.
    pub fn layer_geometry(&self, id: LayerId) -> LaminateResult<PlanarRegion> {
        self.require(id)?;
        Ok(self.region(id).cloned().unwrap_or_default())
    }

    /// Stored region on `id`, if any.
    pub fn region(&self, id: LayerId) -> Option<&PlanarRegion> {
        self.geometry.get(&id)
    }

    pub fn replace_layer_geometry(
        &mut self,
        id: LayerId,
        region: PlanarRegion,
    ) -> LaminateResult<()> {
        self.require(id)?;
        self.geometry.insert(id, region);
        Ok(())
    }

    /// Union `regions` into whatever already sits on `id`.
    pub fn insert_layer_geometry(
        &mut self,
        id: LayerId,
        regions: &[PlanarRegion],
    ) -> LaminateResult<()> {
        self.require(id)?;
        let existing = self.geometry.remove(&id).unwrap_or_default();
        let merged = unary_safe_union(std::iter::once(&existing).chain(regions.iter()));
        self.geometry.insert(id, merged);
        Ok(())
    }

    /// Every scoped layer with its region, bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = (LayerId, PlanarRegion)> + '_ {
        self.layer_ids
            .iter()
            .map(|id| (*id, self.region(*id).cloned().unwrap_or_default()))
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.values().all(PlanarRegion::is_empty)
    }

    /// Fold `laminates` layer by layer with `op`. An empty list yields an
    /// empty laminate over `def`; a single laminate is returned unchanged.
    pub fn unary_operation(
        def: &LayerDefinition,
        laminates: &[Laminate],
        op: UnaryOperation,
    ) -> LaminateResult<Laminate> {
        for laminate in laminates {
            for id in &laminate.layer_ids {
                def.require(*id)?;
            }
        }

        let (first, rest) = match laminates.split_first() {
            Some(split) => split,
            None => return Ok(Laminate::new(def)),
        };
        if rest.is_empty() {
            return Ok(first.clone());
        }

        let mut result = Laminate::new(def);
        for id in def.ids() {
            let mut acc = first.region(id).cloned().unwrap_or_default();
            for laminate in rest {
                let operand = laminate.region(id).cloned().unwrap_or_default();
                acc = op.apply(&acc, &operand);
            }
            if !acc.polygons().is_empty() {
                result.geometry.insert(id, acc);
            }
        }
        Ok(result)
    }

    /// Combine with `other` layer by layer. A layer present on only one side
    /// meets an empty region on the other.
    pub fn binary_operation(&self, other: &Laminate, op: BinaryOperation) -> Laminate {
        let mut layer_ids = self.layer_ids.clone();
        for id in &other.layer_ids {
            if !layer_ids.contains(id) {
                layer_ids.push(*id);
            }
        }

        let mut result = Laminate::with_layers(layer_ids.clone());
        for id in layer_ids {
            let a = self.region(id).cloned().unwrap_or_default();
            let b = other.region(id).cloned().unwrap_or_default();
            let region = op.apply(&a, &b);
            if !region.polygons().is_empty() {
                result.geometry.insert(id, region);
            }
        }
        result
    }

    /// Apply `f` to every scoped layer, keeping the scope.
    pub fn map_layers<F>(&self, mut f: F) -> LaminateResult<Laminate>
    where
        F: FnMut(LayerId, &PlanarRegion) -> LaminateResult<PlanarRegion>,
    {
        let mut result = Laminate::with_layers(self.layer_ids.clone());
        for (id, region) in self.iter() {
            let mapped = f(id, &region)?;
            if !mapped.polygons().is_empty() {
                result.geometry.insert(id, mapped);
            }
        }
        Ok(result)
    }

    pub fn buffer(&self, distance: f64) -> Laminate {
        let mut result = Laminate::with_layers(self.layer_ids.clone());
        for (id, region) in &self.geometry {
            result.geometry.insert(*id, region.buffer(distance));
        }
        result
    }

    /// Union of every layer flattened into one region.
    pub fn projection(&self) -> PlanarRegion {
        unary_safe_union(self.geometry.values())
    }

    pub fn area(&self) -> f64 {
        self.geometry.values().map(PlanarRegion::area).sum()
    }
}
