//! Text command protocol spoken over the WebSocket.
//!
//! Each inbound frame is `VERB` or `VERB:payload`; each reply is
//! `KIND_UPDATE:json`. Handling is synchronous and touches only the design
//! it is given, so the socket loop holds the lock for one command at a time.

use laminate_core::design::Design;
use laminate_core::error::{LaminateError, ReferenceError};
use laminate_core::id::EntityId;
use laminate_core::operations::OperationNode;
use laminate_core::persistence;
use laminate_core::sketch::Sketch;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Format a kernel error as a JSON message for the frontend
pub fn format_error(code: &str, message: &str, severity: &str) -> String {
    format!(
        "ERROR_UPDATE:{}",
        json!({
            "code": code,
            "message": message,
            "severity": severity
        })
    )
}

fn error_code(err: &LaminateError) -> &'static str {
    match err {
        LaminateError::GeometryDegenerate(_) => "GEOMETRY_DEGENERATE",
        LaminateError::Reference(ReferenceError::NoOperation(_)) => "NO_OPERATION",
        LaminateError::Reference(ReferenceError::ForwardReference { .. }) => "FORWARD_REFERENCE",
        LaminateError::Reference(_) => "REFERENCE",
        LaminateError::LayerMismatch(_)
        | LaminateError::DuplicateLayer(_)
        | LaminateError::UnknownLayerName(_) => "LAYER_MISMATCH",
        LaminateError::SchemaUpgradeFailure { .. } => "SCHEMA_UPGRADE",
        LaminateError::Serialization(_) => "SERIALIZATION",
        LaminateError::InvalidParameter(_) => "INVALID_PARAMETER",
        LaminateError::MissingSectionLine(_) => "MISSING_SECTION_LINE",
    }
}

fn kernel_error(context: &str, err: &LaminateError) -> String {
    warn!("{} failed: {}", context, err);
    format_error(error_code(err), &format!("{} failed: {}", context, err), "error")
}

pub fn design_update(design: &Design) -> String {
    let json = serde_json::to_string(design).unwrap_or_else(|_| "{}".to_string());
    format!("DESIGN_UPDATE:{}", json)
}

fn parse_id(text: &str) -> Result<EntityId, String> {
    uuid::Uuid::parse_str(text.trim())
        .map(EntityId::from_uuid)
        .map_err(|_| format_error("INVALID_ID", &format!("Invalid UUID: {}", text), "warning"))
}

/// Per-layer render data for one operation output: triangles plus the
/// layer's z-range.
fn output_payload(design: &Design, id: EntityId) -> Result<Value, LaminateError> {
    let def = design.layer_def();
    let outputs = design.outputs_of(id)?;
    let mut rendered = Vec::with_capacity(outputs.len());
    for output in outputs {
        let mut layers = Vec::new();
        for (layer, region) in output.laminate.iter() {
            let thickness = def.layer(layer).map(|l| l.thickness).unwrap_or(0.0);
            layers.push(json!({
                "layer": layer,
                "z": def.z_value(layer)?,
                "thickness": thickness,
                "area": region.area(),
                "triangles": region.triangulate()?,
            }));
        }
        rendered.push(json!({ "label": output.label, "layers": layers }));
    }
    Ok(json!({ "operation": id, "outputs": rendered }))
}

/// Apply one command to `design` and return the frames to send back.
pub fn handle_command(design: &mut Design, text: &str) -> Vec<String> {
    let (verb, payload) = match text.split_once(':') {
        Some((verb, payload)) => (verb, payload),
        None => (text, ""),
    };

    match verb {
        "DESIGN" => vec![design_update(design)],

        "REGEN" => match design.regenerate() {
            Ok(report) => {
                info!("Regeneration computed {} operation(s)", report.computed.len());
                let json = serde_json::to_string(&report).unwrap_or_else(|_| "{}".to_string());
                vec![format!("REGEN_REPORT:{}", json)]
            }
            Err(e) => vec![kernel_error("Regeneration", &e)],
        },

        "ADD_SKETCH" | "REPLACE_SKETCH" => {
            let sketch: Sketch = match serde_json::from_str(payload) {
                Ok(s) => s,
                Err(e) => {
                    let message = format!("Invalid sketch: {}", e);
                    return vec![format_error("PARSE_FAILED", &message, "warning")];
                }
            };
            let result = if verb == "ADD_SKETCH" {
                design.add_sketch(sketch).map(|_| ())
            } else {
                design.replace_sketch(sketch)
            };
            match result {
                Ok(()) => vec![design_update(design)],
                Err(e) => vec![kernel_error("Sketch update", &e)],
            }
        }

        "ADD_OPERATION" => {
            let node: OperationNode = match serde_json::from_str(payload) {
                Ok(n) => n,
                Err(e) => {
                    let message = format!("Invalid operation: {}", e);
                    return vec![format_error("PARSE_FAILED", &message, "warning")];
                }
            };
            match design.add_operation(node) {
                Ok(id) => {
                    info!("Added operation {}", id);
                    vec![design_update(design)]
                }
                Err(e) => vec![kernel_error("Add operation", &e)],
            }
        }

        "REMOVE_OPERATION" => {
            let id = match parse_id(payload) {
                Ok(id) => id,
                Err(frame) => return vec![frame],
            };
            match design.remove_operation(id) {
                Ok(node) => {
                    info!("Removed operation '{}'", node.name);
                    vec![design_update(design)]
                }
                Err(e) => vec![kernel_error("Remove operation", &e)],
            }
        }

        "PRIOR_OPERATIONS" => {
            let id = match parse_id(payload) {
                Ok(id) => id,
                Err(frame) => return vec![frame],
            };
            match design.prior_operations(id) {
                Ok(prior) => {
                    let entries: Vec<Value> = prior
                        .iter()
                        .map(|n| json!({ "id": n.id, "name": n.name, "type": n.kind.type_name() }))
                        .collect();
                    vec![format!("PRIOR_UPDATE:{}", Value::Array(entries))]
                }
                Err(e) => vec![kernel_error("Prior operations", &e)],
            }
        }

        "OUTPUTS" => {
            let id = match parse_id(payload) {
                Ok(id) => id,
                Err(frame) => return vec![frame],
            };
            if let Err(e) = design.evaluate(id) {
                return vec![kernel_error("Evaluation", &e)];
            }
            match output_payload(design, id) {
                Ok(payload) => vec![format!("OUTPUT_UPDATE:{}", payload)],
                Err(e) => vec![kernel_error("Output export", &e)],
            }
        }

        "SAVE" => match persistence::save_design(design) {
            Ok(json) => vec![format!("SAVE_UPDATE:{}", json)],
            Err(e) => vec![kernel_error("Save", &e)],
        },

        "LOAD" => match persistence::load_design(payload) {
            Ok(loaded) => {
                let config = design.config().clone();
                *design = loaded.with_config(config);
                info!("Loaded design '{}'", design.name);
                vec![design_update(design)]
            }
            Err(e) => vec![kernel_error("Load", &e)],
        },

        _ => {
            warn!("Unknown command: {}", verb);
            vec![format_error("UNKNOWN_COMMAND", &format!("Unknown command: {}", verb), "warning")]
        }
    }
}
