//! Physical layer stack.
//!
//! Layers are ordered bottom (index 0) to top. Each layer sits directly on
//! the one below it, so a layer's z-value is the summed thickness of every
//! layer under it and its only physical neighbors are the adjacent indices.

use crate::error::{LaminateError, LaminateResult};
use crate::id::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

pub type LayerId = EntityId;

/// Old-to-new layer identity table used when a design switches stacks.
pub type LayerMap = BTreeMap<LayerId, LayerId>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub thickness: f64,
    pub material: String,
}

impl Layer {
    pub fn new(name: &str, thickness: f64, material: &str) -> Self {
        Self {
            id: EntityId::new(),
            name: name.to_string(),
            thickness,
            material: material.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerDefinition {
    layers: Vec<Layer>,
}

impl LayerDefinition {
    /// Build a stack from bottom to top. Duplicate ids are rejected.
    pub fn new(layers: Vec<Layer>) -> LaminateResult<Self> {
        let definition = Self { layers };
        definition.validate()?;
        Ok(definition)
    }

    pub fn validate(&self) -> LaminateResult<()> {
        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(layer.id) {
                return Err(LaminateError::DuplicateLayer(layer.id));
            }
            if !(layer.thickness.is_finite() && layer.thickness >= 0.0) {
                return Err(LaminateError::InvalidParameter(format!(
                    "layer '{}' has thickness {}",
                    layer.name, layer.thickness
                )));
            }
        }
        Ok(())
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|l| l.id).collect()
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Fail with `LayerMismatch` unless `id` belongs to this stack.
    pub fn require(&self, id: LayerId) -> LaminateResult<usize> {
        self.index_of(id).ok_or(LaminateError::LayerMismatch(id))
    }

    /// Height of the bottom face of the layer above the bottom of the stack.
    pub fn z_value(&self, id: LayerId) -> LaminateResult<f64> {
        let index = self.require(id)?;
        Ok(self.layers[..index].iter().map(|l| l.thickness).sum())
    }

    /// Total stack thickness.
    pub fn thickness(&self) -> f64 {
        self.layers.iter().map(|l| l.thickness).sum()
    }

    /// Layers physically touching `id`: the one directly below and the one
    /// directly above, when present.
    pub fn connected_neighbors(&self, id: LayerId) -> LaminateResult<Vec<LayerId>> {
        let index = self.require(id)?;
        let mut neighbors = Vec::with_capacity(2);
        if index > 0 {
            neighbors.push(self.layers[index - 1].id);
        }
        if let Some(above) = self.layers.get(index + 1) {
            neighbors.push(above.id);
        }
        Ok(neighbors)
    }

    /// Map every layer of `old` onto the layer of `new` with the same name.
    /// Layers whose name does not exist in `new` are left out of the table.
    pub fn mapping_by_name(old: &LayerDefinition, new: &LayerDefinition) -> LayerMap {
        let mut map = LayerMap::new();
        for layer in &old.layers {
            match new.by_name(&layer.name) {
                Some(target) => {
                    map.insert(layer.id, target.id);
                }
                None => debug!("Layer '{}' has no counterpart in the new stack", layer.name),
            }
        }
        map
    }
}
