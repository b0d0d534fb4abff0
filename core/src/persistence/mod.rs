//! Versioned records for everything that is saved to disk.
//!
//! Each entity is wrapped in a [`Record`] carrying its kind and schema
//! version. Loading runs the record through the migration table in
//! [`migrations`] until it reaches the current version, then decodes it.

pub mod migrations;

use crate::design::Design;
use crate::error::{LaminateError, LaminateResult};
use crate::laminate::Laminate;
use crate::layers::LayerDefinition;
use crate::operations::OperationNode;
use crate::sketch::Sketch;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Sketch,
    Operation,
    Laminate,
    LayerDefinition,
    Design,
}

impl EntityKind {
    /// Schema version written by this build.
    pub fn current_version(self) -> u32 {
        match self {
            Self::Sketch => 2,
            Self::Operation => 2,
            Self::Laminate => 1,
            Self::LayerDefinition => 1,
            Self::Design => 1,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sketch => "sketch",
            Self::Operation => "operation",
            Self::Laminate => "laminate",
            Self::LayerDefinition => "layer_definition",
            Self::Design => "design",
        };
        f.write_str(name)
    }
}

/// A serialized entity together with the schema version it was written in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub kind: EntityKind,
    pub version: u32,
    pub data: Value,
}

impl Record {
    pub fn to_json(&self) -> LaminateResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> LaminateResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_current(&self) -> bool {
        self.version == self.kind.current_version()
    }
}

/// Types that can be written as a [`Record`].
pub trait Persist: Serialize + DeserializeOwned {
    const KIND: EntityKind;
}

impl Persist for Sketch {
    const KIND: EntityKind = EntityKind::Sketch;
}

impl Persist for OperationNode {
    const KIND: EntityKind = EntityKind::Operation;
}

impl Persist for Laminate {
    const KIND: EntityKind = EntityKind::Laminate;
}

impl Persist for LayerDefinition {
    const KIND: EntityKind = EntityKind::LayerDefinition;
}

impl Persist for Design {
    const KIND: EntityKind = EntityKind::Design;
}

pub fn serialize<T: Persist>(value: &T) -> LaminateResult<Record> {
    Ok(Record {
        kind: T::KIND,
        version: T::KIND.current_version(),
        data: serde_json::to_value(value)?,
    })
}

/// Upgrade `record` if needed and decode it as `T`.
pub fn deserialize<T: Persist>(record: Record) -> LaminateResult<T> {
    if record.kind != T::KIND {
        return Err(LaminateError::Serialization(format!(
            "expected a {} record, found {}",
            T::KIND,
            record.kind
        )));
    }
    let record = upgrade(record)?;
    Ok(serde_json::from_value(record.data)?)
}

/// Apply migrations until `record` is at its kind's current version.
///
/// Never edits the input in place; every step yields a new value.
pub fn upgrade(record: Record) -> LaminateResult<Record> {
    let target = record.kind.current_version();
    let Record { kind, mut version, mut data } = record;

    if version > target {
        return Err(upgrade_failure(kind, version));
    }
    while version < target {
        let step = migrations::lookup(kind, version).ok_or_else(|| upgrade_failure(kind, version))?;
        data = step(data)?;
        debug!("Upgraded {} record from version {} to {}", kind, version, version + 1);
        version += 1;
    }
    Ok(Record { kind, version, data })
}

fn upgrade_failure(kind: EntityKind, version: u32) -> LaminateError {
    LaminateError::SchemaUpgradeFailure {
        kind: kind.to_string(),
        version,
    }
}

/// Write a design as pretty JSON.
pub fn save_design(design: &Design) -> LaminateResult<String> {
    serialize(design)?.to_json()
}

/// Read a design written by [`save_design`] and check its structure.
/// Outputs are not stored, so every operation comes back uncomputed.
pub fn load_design(json: &str) -> LaminateResult<Design> {
    let design: Design = deserialize(Record::from_json(json)?)?;
    design.validate()?;
    Ok(design)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PlanarRegion;
    use crate::layers::Layer;
    use crate::sketch::GenericShape;
    use serde_json::json;

    fn two_layers() -> LayerDefinition {
        LayerDefinition::new(vec![Layer::new("a", 1.0, "m"), Layer::new("b", 2.0, "n")]).unwrap()
    }

    #[test]
    fn test_sketch_roundtrip() {
        let mut sketch = Sketch::new("s");
        sketch.add_shape(GenericShape::polygon(
            &[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0]],
            &[],
        ));
        sketch.add_shape(GenericShape::line([0.0, 0.0], [1.0, 1.0]).as_construction());
        let back: Sketch = deserialize(serialize(&sketch).unwrap()).unwrap();
        assert_eq!(back, sketch);
    }

    #[test]
    fn test_laminate_and_layers_roundtrip() {
        let def = two_layers();
        let mut lam = Laminate::new(&def);
        let region = PlanarRegion::rectangle([0.1, 0.2], [3.3, 4.4]).unwrap();
        lam.replace_layer_geometry(def.ids()[1], region).unwrap();

        let json = serialize(&lam).unwrap().to_json().unwrap();
        let back: Laminate = deserialize(Record::from_json(&json).unwrap()).unwrap();
        assert_eq!(back, lam);

        let back: LayerDefinition = deserialize(serialize(&def).unwrap()).unwrap();
        assert_eq!(back, def);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let record = serialize(&two_layers()).unwrap();
        let result: LaminateResult<Sketch> = deserialize(record);
        assert!(matches!(result, Err(LaminateError::Serialization(_))));
    }

    #[test]
    fn test_newer_version_rejected() {
        let record = Record {
            kind: EntityKind::Sketch,
            version: 9,
            data: json!({}),
        };
        assert_eq!(
            upgrade(record).unwrap_err(),
            LaminateError::SchemaUpgradeFailure {
                kind: "sketch".to_string(),
                version: 9
            }
        );
    }

    #[test]
    fn test_version_without_path_rejected() {
        let record = Record {
            kind: EntityKind::Operation,
            version: 0,
            data: json!({}),
        };
        assert_eq!(
            upgrade(record).unwrap_err(),
            LaminateError::SchemaUpgradeFailure {
                kind: "operation".to_string(),
                version: 0
            }
        );
    }

    #[test]
    fn test_current_record_passes_through() {
        let record = serialize(&two_layers()).unwrap();
        assert!(record.is_current());
        assert_eq!(upgrade(record.clone()).unwrap(), record);
    }
}
