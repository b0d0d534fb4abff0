//! Operation nodes of the design graph.
//!
//! A node never holds a pointer to another node. Parents are named through
//! `operation_links` as `(operation id, output index)` pairs and sketches
//! through `sketch_links`, both keyed by role. The graph is acyclic because
//! a node may only reference operations that precede it in the design's
//! list.

pub mod cross_section;
mod operate;

use crate::id::EntityId;
use crate::laminate::{Laminate, LaminateFunction};
use crate::layers::{LayerId, LayerMap};
use crate::manufacturing::{KeepoutType, RemovabilityMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Link role names.
pub mod roles {
    pub const UNARY: &str = "unary";
    pub const BINARY: &str = "binary";
    pub const SOURCE: &str = "source";
    pub const CROSS_SECTION: &str = "cross_section";
    pub const DEVICE: &str = "device";
    pub const PARENT: &str = "parent";
    pub const SKETCH: &str = "sketch";
}

/// One output of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationRef {
    pub operation: EntityId,
    pub output: usize,
}

impl OperationRef {
    pub fn new(operation: EntityId, output: usize) -> Self {
        Self { operation, output }
    }

    /// The first output of `operation`.
    pub fn first(operation: EntityId) -> Self {
        Self::new(operation, 0)
    }
}

pub type OperationLinks = BTreeMap<String, Vec<OperationRef>>;
pub type SketchLinks = BTreeMap<String, Vec<EntityId>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutput {
    pub laminate: Laminate,
    pub label: String,
    pub owner: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeState {
    #[default]
    Uninitialized,
    Computed,
    /// Computed once, invalidated by an upstream edit.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OperationKind {
    /// Place the sketch region on the selected layers.
    SketchOperation { layers: Vec<LayerId> },
    /// Place the sketch region on every layer.
    LocateOperation,
    LaminateOperation { function: LaminateFunction },
    CrossSection { scale: f64 },
    CustomSupport {
        layers: Vec<LayerId>,
        support_width: f64,
        support_out: f64,
        hole_radius: f64,
        cut_width: f64,
    },
    SupportCandidate {
        keepout: KeepoutType,
        support_gap: f64,
        keepout_distance: f64,
    },
    Removability { mode: RemovabilityMode },
    ToolClearance { keepout: KeepoutType },
    IdentifyBodies,
}

impl OperationKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SketchOperation { .. } => "SketchOperation",
            Self::LocateOperation => "LocateOperation",
            Self::LaminateOperation { .. } => "LaminateOperation",
            Self::CrossSection { .. } => "CrossSection",
            Self::CustomSupport { .. } => "CustomSupport",
            Self::SupportCandidate { .. } => "SupportCandidate",
            Self::Removability { .. } => "Removability",
            Self::ToolClearance { .. } => "ToolClearance",
            Self::IdentifyBodies => "IdentifyBodies",
        }
    }

    /// Layer selection, for kinds that carry one.
    pub fn layers(&self) -> Option<&[LayerId]> {
        match self {
            Self::SketchOperation { layers } | Self::CustomSupport { layers, .. } => Some(layers),
            _ => None,
        }
    }

    fn layers_mut(&mut self) -> Option<&mut Vec<LayerId>> {
        match self {
            Self::SketchOperation { layers } | Self::CustomSupport { layers, .. } => Some(layers),
            _ => None,
        }
    }
}

/// A node in the design's operation list. Two nodes are equal when their
/// persisted fields match; the evaluation state and cached outputs are not
/// compared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationNode {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub operation_links: OperationLinks,
    #[serde(default)]
    pub sketch_links: SketchLinks,
    pub kind: OperationKind,
    #[serde(skip)]
    state: NodeState,
    #[serde(skip)]
    output: Vec<OperationOutput>,
}

impl PartialEq for OperationNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.operation_links == other.operation_links
            && self.sketch_links == other.sketch_links
            && self.kind == other.kind
    }
}

impl OperationNode {
    pub fn new(name: &str, kind: OperationKind) -> Self {
        Self {
            id: EntityId::new(),
            name: name.to_string(),
            operation_links: OperationLinks::new(),
            sketch_links: SketchLinks::new(),
            kind,
            state: NodeState::Uninitialized,
            output: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self
    }

    pub fn with_operation_link(mut self, role: &str, refs: Vec<OperationRef>) -> Self {
        self.operation_links.insert(role.to_string(), refs);
        self
    }

    pub fn with_sketch_link(mut self, role: &str, sketches: Vec<EntityId>) -> Self {
        self.sketch_links.insert(role.to_string(), sketches);
        self
    }

    pub fn sketch_operation(name: &str, sketch: EntityId, layers: Vec<LayerId>) -> Self {
        Self::new(name, OperationKind::SketchOperation { layers })
            .with_sketch_link(roles::SKETCH, vec![sketch])
    }

    pub fn locate(name: &str, sketch: EntityId) -> Self {
        Self::new(name, OperationKind::LocateOperation)
            .with_sketch_link(roles::SKETCH, vec![sketch])
    }

    /// Unary functions combine `unary`; binary functions take the union of
    /// `unary` as the left operand and the union of `binary` as the right.
    pub fn laminate_operation(
        name: &str,
        function: LaminateFunction,
        unary: Vec<OperationRef>,
        binary: Vec<OperationRef>,
    ) -> Self {
        Self::new(name, OperationKind::LaminateOperation { function })
            .with_operation_link(roles::UNARY, unary)
            .with_operation_link(roles::BINARY, binary)
    }

    pub fn cross_section(name: &str, source: OperationRef, sketch: EntityId, scale: f64) -> Self {
        Self::new(name, OperationKind::CrossSection { scale })
            .with_operation_link(roles::SOURCE, vec![source])
            .with_sketch_link(roles::CROSS_SECTION, vec![sketch])
    }

    #[allow(clippy::too_many_arguments)]
    pub fn custom_support(
        name: &str,
        device: OperationRef,
        sketch: EntityId,
        layers: Vec<LayerId>,
        support_width: f64,
        support_out: f64,
        hole_radius: f64,
        cut_width: f64,
    ) -> Self {
        Self::new(
            name,
            OperationKind::CustomSupport {
                layers,
                support_width,
                support_out,
                hole_radius,
                cut_width,
            },
        )
        .with_operation_link(roles::DEVICE, vec![device])
        .with_sketch_link(roles::SKETCH, vec![sketch])
    }

    pub fn support_candidate(
        name: &str,
        parent: OperationRef,
        keepout: KeepoutType,
        support_gap: f64,
        keepout_distance: f64,
    ) -> Self {
        Self::new(
            name,
            OperationKind::SupportCandidate {
                keepout,
                support_gap,
                keepout_distance,
            },
        )
        .with_operation_link(roles::PARENT, vec![parent])
    }

    pub fn removability(name: &str, parent: OperationRef, mode: RemovabilityMode) -> Self {
        Self::new(name, OperationKind::Removability { mode })
            .with_operation_link(roles::PARENT, vec![parent])
    }

    pub fn tool_clearance(name: &str, parent: OperationRef, keepout: KeepoutType) -> Self {
        Self::new(name, OperationKind::ToolClearance { keepout })
            .with_operation_link(roles::PARENT, vec![parent])
    }

    pub fn identify_bodies(name: &str, parent: OperationRef) -> Self {
        Self::new(name, OperationKind::IdentifyBodies)
            .with_operation_link(roles::PARENT, vec![parent])
    }

    /// Every operation output this node reads, across all roles.
    pub fn parent_refs(&self) -> Vec<OperationRef> {
        self.operation_links.values().flatten().copied().collect()
    }

    /// Every sketch this node reads, across all roles.
    pub fn sketch_ids(&self) -> Vec<EntityId> {
        self.sketch_links.values().flatten().copied().collect()
    }

    pub fn depends_on(&self, operation: EntityId) -> bool {
        self.parent_refs().iter().any(|r| r.operation == operation)
    }

    pub fn uses_sketch(&self, sketch: EntityId) -> bool {
        self.sketch_links.values().flatten().any(|id| *id == sketch)
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn outputs(&self) -> &[OperationOutput] {
        &self.output
    }

    pub fn output(&self, index: usize) -> Option<&OperationOutput> {
        self.output.get(index)
    }

    pub(crate) fn set_outputs(&mut self, outputs: Vec<OperationOutput>) {
        self.output = outputs;
        self.state = NodeState::Computed;
    }

    /// Drop cached outputs after an upstream edit.
    pub(crate) fn mark_stale(&mut self) {
        if self.state == NodeState::Computed {
            self.state = NodeState::Stale;
        }
        self.output.clear();
    }

    /// Copy of this node with its layer selection carried through `map`.
    /// Layers with no entry are dropped.
    pub fn switch_layer_defs(&self, map: &LayerMap) -> OperationNode {
        let mut node = self.clone();
        if let Some(layers) = node.kind.layers_mut() {
            let before = layers.len();
            layers.retain(|id| map.contains_key(id));
            if layers.len() < before {
                warn!(
                    "Operation '{}' lost {} layer link(s) in the new layer definition",
                    self.name,
                    before - layers.len()
                );
            }
            for id in layers.iter_mut() {
                if let Some(mapped) = map.get(id) {
                    *id = *mapped;
                }
            }
        }
        node.mark_stale();
        node
    }

    fn single_output(&self, laminate: Laminate) -> Vec<OperationOutput> {
        vec![self.labeled_output(laminate, "default")]
    }

    fn labeled_output(&self, laminate: Laminate, label: &str) -> OperationOutput {
        OperationOutput {
            laminate,
            label: label.to_string(),
            owner: self.id,
        }
    }
}
