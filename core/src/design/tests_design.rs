use super::*;
use crate::error::LaminateError;
use crate::laminate::LaminateFunction;
use crate::layers::{Layer, LayerId};
use crate::operations::OperationRef;
use crate::sketch::GenericShape;

fn three_layers() -> LayerDefinition {
    LayerDefinition::new(vec![
        Layer::new("bottom", 1.0, "kapton"),
        Layer::new("mid", 0.5, "adhesive"),
        Layer::new("top", 1.0, "fr4"),
    ])
    .unwrap()
}

fn layer(design: &Design, name: &str) -> LayerId {
    design.layer_def().by_name(name).unwrap().id
}

fn square_sketch(name: &str, x0: f64, y0: f64, size: f64) -> Sketch {
    let mut sketch = Sketch::new(name);
    sketch.add_shape(GenericShape::two_point_rect([x0, y0], [x0 + size, y0 + size]));
    sketch
}

/// A design with one square sketch placed on `mid`.
fn placed_square() -> (Design, EntityId, EntityId) {
    let mut design = Design::new("scenario", three_layers());
    let sketch = design.add_sketch(square_sketch("square", 0.0, 0.0, 10.0)).unwrap();
    let mid = layer(&design, "mid");
    let op = design
        .add_operation(OperationNode::sketch_operation("place", sketch, vec![mid]))
        .unwrap();
    (design, sketch, op)
}

#[test]
fn test_sketch_on_selected_layer() {
    let (mut design, _, op) = placed_square();
    let outputs = design.evaluate(op).unwrap().to_vec();
    assert_eq!(outputs.len(), 1);

    let laminate = &outputs[0].laminate;
    let mid = layer(&design, "mid");
    assert!((laminate.layer_geometry(mid).unwrap().area() - 100.0).abs() < 1e-6);
    for name in ["top", "bottom"] {
        let region = laminate.layer_geometry(layer(&design, name)).unwrap();
        assert!(region.is_empty(), "{} should be empty", name);
    }
}

#[test]
fn test_chained_boolean_matches_direct_computation() {
    let mut design = Design::new("booleans", three_layers());
    let mid = layer(&design, "mid");
    let a = square_sketch("a", 0.0, 0.0, 10.0);
    let b = square_sketch("b", 5.0, 5.0, 10.0);
    let c = square_sketch("c", 8.0, -2.0, 4.0);

    let config = design.config().clone();
    let converter = crate::sketch::RegionConverter::new(&config);
    let direct = converter
        .convert(&a)
        .unwrap()
        .union(&converter.convert(&b).unwrap())
        .difference(&converter.convert(&c).unwrap());

    let mut refs = Vec::new();
    for sketch in [a, b, c] {
        let id = design.add_sketch(sketch).unwrap();
        let op = design
            .add_operation(OperationNode::sketch_operation("place", id, vec![mid]))
            .unwrap();
        refs.push(OperationRef::first(op));
    }
    let node1 = design
        .add_operation(OperationNode::laminate_operation(
            "a or b",
            LaminateFunction::Union,
            vec![refs[0], refs[1]],
            vec![],
        ))
        .unwrap();
    let node2 = design
        .add_operation(OperationNode::laminate_operation(
            "minus c",
            LaminateFunction::Difference,
            vec![OperationRef::first(node1)],
            vec![refs[2]],
        ))
        .unwrap();

    let report = design.regenerate().unwrap();
    assert_eq!(report.computed.len(), 5);

    let result = design.outputs_of(node2).unwrap()[0].laminate.layer_geometry(mid).unwrap();
    assert!((result.area() - direct.area()).abs() < 1e-6);
    assert!(result.symmetric_difference(&direct).area() < 1e-6);
}

#[test]
fn test_binary_with_empty_right_operand_is_left_union() {
    let (mut design, _, op) = placed_square();
    let diff = design
        .add_operation(OperationNode::laminate_operation(
            "nothing removed",
            LaminateFunction::Difference,
            vec![OperationRef::first(op)],
            vec![],
        ))
        .unwrap();
    design.regenerate().unwrap();
    let mid = layer(&design, "mid");
    let area = design.outputs_of(diff).unwrap()[0].laminate.layer_geometry(mid).unwrap().area();
    assert!((area - 100.0).abs() < 1e-6);
}

#[test]
fn test_missing_reference_rejected() {
    let (mut design, _, _) = placed_square();
    let ghost = EntityId::new();
    let err = design
        .add_operation(OperationNode::identify_bodies("bodies", OperationRef::first(ghost)))
        .unwrap_err();
    assert_eq!(err, LaminateError::Reference(ReferenceError::NoOperation(ghost)));
}

#[test]
fn test_self_reference_rejected() {
    let (mut design, _, _) = placed_square();
    let id = EntityId::new();
    let node = OperationNode::identify_bodies("loop", OperationRef::first(id)).with_id(id);
    let err = design.add_operation(node).unwrap_err();
    assert_eq!(
        err,
        LaminateError::Reference(ReferenceError::ForwardReference {
            requester: id,
            referenced: id
        })
    );
}

#[test]
fn test_update_cannot_point_forward() {
    let (mut design, _, first) = placed_square();
    let second = design
        .add_operation(OperationNode::identify_bodies("bodies", OperationRef::first(first)))
        .unwrap();
    let rewired = OperationNode::laminate_operation(
        "rewired",
        LaminateFunction::Union,
        vec![OperationRef::first(second)],
        vec![],
    )
    .with_id(first);
    let err = design.update_operation(rewired).unwrap_err();
    assert!(matches!(
        err,
        LaminateError::Reference(ReferenceError::ForwardReference { .. })
    ));
}

#[test]
fn test_prior_operations_is_strict_prefix() {
    let (mut design, _, first) = placed_square();
    let second = design
        .add_operation(OperationNode::identify_bodies("bodies", OperationRef::first(first)))
        .unwrap();
    assert!(design.prior_operations(first).unwrap().is_empty());
    let prior: Vec<EntityId> = design
        .prior_operations(second)
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(prior, vec![first]);
}

#[test]
fn test_resolve_out_of_range_output() {
    let (mut design, _, op) = placed_square();
    design.regenerate().unwrap();
    let outside = EntityId::new();
    let err = design.resolve_reference(outside, OperationRef::new(op, 3)).unwrap_err();
    assert_eq!(
        err,
        LaminateError::Reference(ReferenceError::NoOutput { operation: op, index: 3 })
    );
}

#[test]
fn test_uncomputed_outputs_are_not_served() {
    let (design, _, op) = placed_square();
    assert_eq!(
        design.outputs_of(op).unwrap_err(),
        LaminateError::Reference(ReferenceError::Uncomputed(op))
    );
}

#[test]
fn test_replace_sketch_marks_downstream_stale() {
    let (mut design, sketch, op) = placed_square();
    let bodies = design
        .add_operation(OperationNode::identify_bodies("bodies", OperationRef::first(op)))
        .unwrap();
    design.regenerate().unwrap();
    assert_eq!(design.operation(bodies).unwrap().state(), NodeState::Computed);

    let mut bigger = square_sketch("square", 0.0, 0.0, 20.0);
    bigger.id = sketch;
    design.replace_sketch(bigger).unwrap();
    assert_eq!(design.operation(op).unwrap().state(), NodeState::Stale);
    assert_eq!(design.operation(bodies).unwrap().state(), NodeState::Stale);

    let report = design.regenerate().unwrap();
    assert_eq!(report.computed, vec![op, bodies]);
    let mid = layer(&design, "mid");
    let area = design.outputs_of(op).unwrap()[0].laminate.layer_geometry(mid).unwrap().area();
    assert!((area - 400.0).abs() < 1e-6);
}

#[test]
fn test_regenerate_reuses_computed_nodes() {
    let (mut design, _, _) = placed_square();
    design.regenerate().unwrap();
    let report = design.regenerate().unwrap();
    assert!(report.computed.is_empty());
    assert_eq!(report.reused, 1);
}

#[test]
fn test_removed_parent_fails_dependent() {
    let (mut design, _, op) = placed_square();
    let bodies = design
        .add_operation(OperationNode::identify_bodies("bodies", OperationRef::first(op)))
        .unwrap();
    design.regenerate().unwrap();
    design.remove_operation(op).unwrap();

    assert_eq!(design.operation(bodies).unwrap().state(), NodeState::Stale);
    let err = design.regenerate().unwrap_err();
    assert_eq!(err, LaminateError::Reference(ReferenceError::NoOperation(op)));
}

#[test]
fn test_layer_outside_definition_rejected() {
    let (mut design, sketch, _) = placed_square();
    let stranger = EntityId::new();
    let err = design
        .add_operation(OperationNode::sketch_operation("lost", sketch, vec![stranger]))
        .unwrap_err();
    assert_eq!(err, LaminateError::LayerMismatch(stranger));
}

#[test]
fn test_switch_layer_defs_drops_unmapped_layers() {
    let named = |prefix: &str, count: usize| {
        let layers = (1..=count).map(|i| Layer::new(&format!("{}{}", prefix, i), 1.0, "m"));
        LayerDefinition::new(layers.collect()).unwrap()
    };
    let old = named("L", 5);
    let new = named("N", 3);
    let o = old.ids();
    let n = new.ids();

    let mut design = Design::new("remap", old);
    let sketch = design.add_sketch(square_sketch("s", 0.0, 0.0, 1.0)).unwrap();
    let op = design
        .add_operation(OperationNode::sketch_operation("on two", sketch, vec![o[0], o[1], o[4]]))
        .unwrap();
    design.regenerate().unwrap();

    let map: LayerMap = [(o[0], n[0]), (o[2], n[1]), (o[4], n[2])].into_iter().collect();
    design.switch_layer_defs(new, &map).unwrap();

    let node = design.operation(op).unwrap();
    assert_eq!(node.kind.layers(), Some(&[n[0], n[2]][..]));
    assert_eq!(node.state(), NodeState::Stale);
    design.validate().unwrap();
    design.regenerate().unwrap();
}

#[test]
fn test_design_serde_keeps_structure_not_outputs() {
    let (mut design, _, op) = placed_square();
    design.regenerate().unwrap();
    let json = serde_json::to_string(&design).unwrap();
    let back: Design = serde_json::from_str(&json).unwrap();
    assert_eq!(back.operations().len(), 1);
    assert_eq!(back.operation(op).unwrap().state(), NodeState::Uninitialized);
    assert_eq!(back.sketches(), design.sketches());
    back.validate().unwrap();

    // Evaluated nodes compare equal to their reloaded copies.
    assert!(!design.operation(op).unwrap().outputs().is_empty());
    assert_eq!(back.operation(op).unwrap(), design.operation(op).unwrap());
    assert_eq!(back, design);
}

#[test]
fn test_empty_union_node_yields_empty_laminate() {
    let mut design = Design::new("empty", three_layers());
    let node =
        OperationNode::laminate_operation("nothing", LaminateFunction::Union, vec![], vec![]);
    let op = design.add_operation(node).unwrap();
    let outputs = design.evaluate(op).unwrap();
    assert!(outputs[0].laminate.is_empty());
}
