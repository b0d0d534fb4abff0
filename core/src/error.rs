//! Error types shared by the geometric kernel and the operation graph.

use crate::id::EntityId;
use crate::layers::LayerId;
use thiserror::Error;

/// Failures resolving a cross-reference between graph nodes or sketches.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReferenceError {
    #[error("no operation with id {0}")]
    NoOperation(EntityId),

    #[error("operation {requester} references {referenced}, which does not precede it")]
    ForwardReference {
        requester: EntityId,
        referenced: EntityId,
    },

    #[error("operation {operation} has no output at index {index}")]
    NoOutput { operation: EntityId, index: usize },

    #[error("operation {0} has not been computed")]
    Uncomputed(EntityId),

    #[error("no sketch with id {0}")]
    NoSketch(EntityId),

    #[error("operation {operation} has no '{role}' link")]
    MissingLink { operation: EntityId, role: String },

    #[error("an operation with id {0} already exists")]
    DuplicateOperation(EntityId),
}

/// Errors that can occur anywhere in the laminate kernel.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LaminateError {
    #[error("Degenerate geometry: {0}")]
    GeometryDegenerate(String),

    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),

    #[error("Layer {0} is not part of the active layer definition")]
    LayerMismatch(LayerId),

    #[error("Layer {0} appears more than once in the layer definition")]
    DuplicateLayer(LayerId),

    #[error("No layer named '{0}'")]
    UnknownLayerName(String),

    #[error("No upgrade path for {kind} version {version}")]
    SchemaUpgradeFailure { kind: String, version: u32 },

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Cross-section sketch {0} contains no line")]
    MissingSectionLine(EntityId),
}

/// Result type for kernel operations.
pub type LaminateResult<T> = Result<T, LaminateError>;

impl From<serde_json::Error> for LaminateError {
    fn from(err: serde_json::Error) -> Self {
        LaminateError::Serialization(err.to_string())
    }
}
