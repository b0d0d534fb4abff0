//! The design: the one mutable root owning the layer stack, the sketches and
//! the ordered operation list.

use crate::config::KernelConfig;
use crate::error::{LaminateError, LaminateResult, ReferenceError};
use crate::id::EntityId;
use crate::laminate::Laminate;
use crate::layers::{LayerDefinition, LayerMap};
use crate::operations::{NodeState, OperationNode, OperationOutput, OperationRef};
use crate::sketch::Sketch;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

#[cfg(test)]
mod tests_design;

/// Summary of one regeneration pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegenReport {
    /// Operations computed during this pass, in order.
    pub computed: Vec<EntityId>,
    /// Operations whose cached outputs were still valid.
    pub reused: usize,
}

/// Equality covers the persisted document only; the kernel config and
/// cached outputs are session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Design {
    pub id: EntityId,
    pub name: String,
    layer_def: LayerDefinition,
    #[serde(default)]
    sketches: BTreeMap<EntityId, Sketch>,
    #[serde(default)]
    operations: Vec<OperationNode>,
    #[serde(skip)]
    config: KernelConfig,
}

impl PartialEq for Design {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.layer_def == other.layer_def
            && self.sketches == other.sketches
            && self.operations == other.operations
    }
}

impl Design {
    pub fn new(name: &str, layer_def: LayerDefinition) -> Self {
        Self {
            id: EntityId::new(),
            name: name.to_string(),
            layer_def,
            sketches: BTreeMap::new(),
            operations: Vec::new(),
            config: KernelConfig::default(),
        }
    }

    pub fn with_config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Replace the kernel configuration. Every cached output is dropped.
    pub fn set_config(&mut self, config: KernelConfig) {
        self.config = config;
        for node in &mut self.operations {
            node.mark_stale();
        }
    }

    pub fn layer_def(&self) -> &LayerDefinition {
        &self.layer_def
    }

    pub fn sketches(&self) -> &BTreeMap<EntityId, Sketch> {
        &self.sketches
    }

    pub fn operations(&self) -> &[OperationNode] {
        &self.operations
    }

    // =========================================================================
    // Sketches
    // =========================================================================

    pub fn sketch(&self, id: EntityId) -> LaminateResult<&Sketch> {
        self.sketches
            .get(&id)
            .ok_or_else(|| ReferenceError::NoSketch(id).into())
    }

    pub fn add_sketch(&mut self, sketch: Sketch) -> LaminateResult<EntityId> {
        let id = sketch.id;
        if self.sketches.contains_key(&id) {
            return Err(LaminateError::InvalidParameter(format!(
                "a sketch with id {} already exists",
                id
            )));
        }
        self.sketches.insert(id, sketch);
        Ok(id)
    }

    /// Swap in a new version of an existing sketch and invalidate every
    /// operation that reads it, directly or downstream.
    pub fn replace_sketch(&mut self, sketch: Sketch) -> LaminateResult<()> {
        let id = sketch.id;
        if !self.sketches.contains_key(&id) {
            return Err(ReferenceError::NoSketch(id).into());
        }
        self.sketches.insert(id, sketch);

        let readers: Vec<EntityId> = self
            .operations
            .iter()
            .filter(|node| node.uses_sketch(id))
            .map(|node| node.id)
            .collect();
        for reader in readers {
            self.invalidate(reader)?;
        }
        Ok(())
    }

    // =========================================================================
    // Operations
    // =========================================================================

    pub fn operation_index(&self, id: EntityId) -> LaminateResult<usize> {
        self.operations
            .iter()
            .position(|node| node.id == id)
            .ok_or_else(|| ReferenceError::NoOperation(id).into())
    }

    pub fn operation(&self, id: EntityId) -> LaminateResult<&OperationNode> {
        Ok(&self.operations[self.operation_index(id)?])
    }

    /// The operations strictly before `id` in the list: the only ones it
    /// may reference.
    pub fn prior_operations(&self, id: EntityId) -> LaminateResult<&[OperationNode]> {
        let index = self.operation_index(id)?;
        Ok(&self.operations[..index])
    }

    /// Check that `node` would be valid at position `index`.
    fn check_links(&self, node: &OperationNode, index: usize) -> LaminateResult<()> {
        for reference in node.parent_refs() {
            let forward = ReferenceError::ForwardReference {
                requester: node.id,
                referenced: reference.operation,
            };
            if reference.operation == node.id {
                return Err(forward.into());
            }
            let target = self
                .operations
                .iter()
                .position(|n| n.id == reference.operation)
                .ok_or(ReferenceError::NoOperation(reference.operation))?;
            if target >= index {
                return Err(forward.into());
            }
        }
        for sketch in node.sketch_ids() {
            self.sketch(sketch)?;
        }
        if let Some(layers) = node.kind.layers() {
            for layer in layers {
                self.layer_def.require(*layer)?;
            }
        }
        Ok(())
    }

    /// Append an operation. Its references must point at existing
    /// operations, which are necessarily before it.
    pub fn add_operation(&mut self, node: OperationNode) -> LaminateResult<EntityId> {
        if self.operations.iter().any(|n| n.id == node.id) {
            return Err(ReferenceError::DuplicateOperation(node.id).into());
        }
        self.check_links(&node, self.operations.len())?;
        let id = node.id;
        debug!("Adding operation '{}' ({})", node.name, node.kind.type_name());
        self.operations.push(node);
        Ok(id)
    }

    /// Replace an existing operation in place, keeping its position.
    pub fn update_operation(&mut self, node: OperationNode) -> LaminateResult<()> {
        let index = self.operation_index(node.id)?;
        self.check_links(&node, index)?;
        let id = node.id;
        self.operations[index] = node;
        self.invalidate(id)
    }

    /// Remove an operation. Dependents stay in the list and will fail with
    /// `NoOperation` on their next evaluation until they are relinked.
    pub fn remove_operation(&mut self, id: EntityId) -> LaminateResult<OperationNode> {
        self.invalidate(id)?;
        let index = self.operation_index(id)?;
        Ok(self.operations.remove(index))
    }

    /// Ids of every operation that depends on `id`, directly or through
    /// other operations, in list order.
    pub fn dependents(&self, id: EntityId) -> Vec<EntityId> {
        let mut affected: HashSet<EntityId> = HashSet::from([id]);
        let mut result = Vec::new();
        for node in &self.operations {
            if node.parent_refs().iter().any(|r| affected.contains(&r.operation)) {
                affected.insert(node.id);
                result.push(node.id);
            }
        }
        result
    }

    /// Drop the cached outputs of `id` and everything downstream of it.
    pub fn invalidate(&mut self, id: EntityId) -> LaminateResult<()> {
        let index = self.operation_index(id)?;
        self.operations[index].mark_stale();
        let downstream: HashSet<EntityId> = self.dependents(id).into_iter().collect();
        for node in &mut self.operations {
            if downstream.contains(&node.id) {
                node.mark_stale();
            }
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Laminate behind `reference`, as seen by operation `requester`.
    ///
    /// The target must exist, precede the requester and be computed, and
    /// the output index must be in range. A requester that is not part of
    /// the design may reference any operation.
    pub fn resolve_reference(
        &self,
        requester: EntityId,
        reference: OperationRef,
    ) -> LaminateResult<&Laminate> {
        let limit = self
            .operations
            .iter()
            .position(|n| n.id == requester)
            .unwrap_or(self.operations.len());
        let target = self.operation_index(reference.operation)?;
        if target >= limit {
            return Err(ReferenceError::ForwardReference {
                requester,
                referenced: reference.operation,
            }
            .into());
        }
        let node = &self.operations[target];
        if node.state() != NodeState::Computed {
            return Err(ReferenceError::Uncomputed(node.id).into());
        }
        node.output(reference.output)
            .map(|o| &o.laminate)
            .ok_or_else(|| {
                ReferenceError::NoOutput {
                    operation: node.id,
                    index: reference.output,
                }
                .into()
            })
    }

    /// Cached outputs of an operation.
    pub fn outputs_of(&self, id: EntityId) -> LaminateResult<&[OperationOutput]> {
        let node = self.operation(id)?;
        if node.state() != NodeState::Computed {
            return Err(ReferenceError::Uncomputed(id).into());
        }
        Ok(node.outputs())
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Compute every operation up to and including position `last` whose
    /// outputs are missing. Stops at the first failure.
    fn regenerate_through(&mut self, last: usize) -> LaminateResult<RegenReport> {
        let mut report = RegenReport::default();
        for index in 0..=last {
            if self.operations[index].state() == NodeState::Computed {
                report.reused += 1;
                continue;
            }
            let outputs = {
                let node = &self.operations[index];
                debug!("Operating '{}' ({})", node.name, node.kind.type_name());
                node.operate(self)?
            };
            let node = &mut self.operations[index];
            node.set_outputs(outputs);
            report.computed.push(node.id);
        }
        Ok(report)
    }

    /// Bring every operation up to date, in list order.
    pub fn regenerate(&mut self) -> LaminateResult<RegenReport> {
        if self.operations.is_empty() {
            return Ok(RegenReport::default());
        }
        let report = self.regenerate_through(self.operations.len() - 1)?;
        info!(
            "Regenerated '{}': {} computed, {} reused",
            self.name,
            report.computed.len(),
            report.reused
        );
        Ok(report)
    }

    /// Compute `id` and whatever precedes it, then return its outputs.
    pub fn evaluate(&mut self, id: EntityId) -> LaminateResult<&[OperationOutput]> {
        let index = self.operation_index(id)?;
        self.regenerate_through(index)?;
        Ok(self.operations[index].outputs())
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Move the design onto a new layer stack. Each operation's layer
    /// selection is carried through `map`; unmapped layers are dropped.
    pub fn switch_layer_defs(
        &mut self,
        new_def: LayerDefinition,
        map: &LayerMap,
    ) -> LaminateResult<()> {
        new_def.validate()?;
        for target in map.values() {
            new_def.require(*target)?;
        }
        self.operations = self
            .operations
            .iter()
            .map(|node| node.switch_layer_defs(map))
            .collect();
        self.layer_def = new_def;
        info!("Switched '{}' to a {}-layer stack", self.name, self.layer_def.len());
        Ok(())
    }

    /// Structural check of a whole design, typically after loading.
    pub fn validate(&self) -> LaminateResult<()> {
        self.layer_def.validate()?;
        let mut seen = HashSet::new();
        for (index, node) in self.operations.iter().enumerate() {
            if !seen.insert(node.id) {
                return Err(ReferenceError::DuplicateOperation(node.id).into());
            }
            self.check_links(node, index)?;
        }
        Ok(())
    }
}
