//! Schema migrations, one step per `(kind, version)`.
//!
//! A step takes the data of a record at `version` and returns the data at
//! `version + 1`. Steps are pure functions over JSON values.

use super::EntityKind;
use crate::error::{LaminateError, LaminateResult};
use crate::sketch::GenericShape;
use serde_json::{json, Map, Value};
use tracing::warn;

pub type Migration = fn(Value) -> LaminateResult<Value>;

/// The migration that moves `kind` off `version`, if one exists.
pub fn lookup(kind: EntityKind, version: u32) -> Option<Migration> {
    match (kind, version) {
        (EntityKind::Operation, 1) => Some(operation_v1_to_v2),
        (EntityKind::Sketch, 1) => Some(sketch_v1_to_v2),
        _ => None,
    }
}

fn into_object(data: Value, what: &str) -> LaminateResult<Map<String, Value>> {
    match data {
        Value::Object(map) => Ok(map),
        other => Err(LaminateError::Serialization(format!(
            "{} record must be an object, found {}",
            what, other
        ))),
    }
}

/// Version 1 links are `[id, output]` pairs.
fn convert_links(links: Value) -> LaminateResult<Value> {
    let Value::Array(pairs) = links else {
        return Err(LaminateError::Serialization(format!(
            "operation links must be a list, found {}",
            links
        )));
    };
    pairs
        .into_iter()
        .map(|pair| match pair {
            Value::Array(items) if items.len() == 2 => Ok(json!({
                "operation": items[0],
                "output": items[1],
            })),
            // Already in the keyed form.
            Value::Object(map) => Ok(Value::Object(map)),
            other => Err(LaminateError::Serialization(format!(
                "malformed operation link {}",
                other
            ))),
        })
        .collect::<LaminateResult<Vec<_>>>()
        .map(Value::Array)
}

fn convert_link_roles(roles: Value) -> LaminateResult<Value> {
    let roles = into_object(roles, "operation_links")?;
    let mut out = Map::new();
    for (role, links) in roles {
        out.insert(role, convert_links(links)?);
    }
    Ok(Value::Object(out))
}

/// Operation 1 → 2.
///
/// Version 1 stored the kind tag and every parameter at the top level.
/// Laminate operations kept their operands in `operation_links1` and
/// `operation_links2`; locate operations named their sketch in `sketchid`.
/// Version 2 nests the tag and parameters under `kind` and keys all links
/// by role.
fn operation_v1_to_v2(data: Value) -> LaminateResult<Value> {
    let mut old = into_object(data, "operation")?;

    let id = old
        .remove("id")
        .ok_or_else(|| LaminateError::Serialization("operation record has no id".to_string()))?;
    let kind_tag = old
        .remove("type")
        .ok_or_else(|| LaminateError::Serialization("operation record has no type".to_string()))?;
    let name = old
        .remove("customname")
        .or_else(|| old.remove("name"))
        .unwrap_or_else(|| kind_tag.clone());
    old.remove("name");

    let mut operation_links = match old.remove("operation_links") {
        Some(links) => into_object(convert_link_roles(links)?, "operation_links")?,
        None => Map::new(),
    };
    let mut sketch_links = match old.remove("sketch_links") {
        Some(links) => into_object(links, "sketch_links")?,
        None => Map::new(),
    };

    if let Some(unary) = old.remove("operation_links1") {
        operation_links.insert("unary".to_string(), convert_links(unary)?);
    }
    if let Some(binary) = old.remove("operation_links2") {
        operation_links.insert("binary".to_string(), convert_links(binary)?);
    }
    if let Some(sketch) = old.remove("sketchid") {
        sketch_links.insert("sketch".to_string(), json!([sketch]));
    }

    // Whatever remains is a parameter of the kind.
    let mut kind = Map::new();
    kind.insert("type".to_string(), kind_tag);
    kind.extend(old);

    Ok(json!({
        "id": id,
        "name": name,
        "operation_links": operation_links,
        "sketch_links": sketch_links,
        "kind": kind,
    }))
}

/// Sketch 1 → 2.
///
/// Version 1 kept shapes under `operationgeometry` and had no construction
/// flag. Shapes that fail validation are dropped.
fn sketch_v1_to_v2(data: Value) -> LaminateResult<Value> {
    let mut old = into_object(data, "sketch")?;
    let shapes = match old.remove("operationgeometry") {
        Some(Value::Array(shapes)) => shapes,
        Some(other) => {
            return Err(LaminateError::Serialization(format!(
                "operationgeometry must be a list, found {}",
                other
            )))
        }
        None => Vec::new(),
    };

    let mut kept = Vec::with_capacity(shapes.len());
    for raw in shapes {
        let mut raw = into_object(raw, "shape")?;
        raw.entry("construction").or_insert(Value::Bool(false));
        raw.entry("interiors").or_insert_with(|| json!([]));
        let shape: GenericShape = serde_json::from_value(Value::Object(raw))?;
        match shape.validate() {
            Ok(()) => kept.push(serde_json::to_value(&shape)?),
            Err(e) => warn!("Dropping invalid shape during sketch upgrade: {}", e),
        }
    }

    old.entry("name").or_insert_with(|| json!("sketch"));
    old.insert("shapes".to_string(), Value::Array(kept));
    Ok(Value::Object(old))
}
