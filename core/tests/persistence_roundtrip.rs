use approx::assert_abs_diff_eq;
use laminate_core::design::Design;
use laminate_core::laminate::LaminateFunction;
use laminate_core::layers::{Layer, LayerDefinition};
use laminate_core::manufacturing::KeepoutType;
use laminate_core::operations::{NodeState, OperationNode, OperationRef};
use laminate_core::persistence::{self, EntityKind, Record};
use laminate_core::sketch::{GenericShape, Sketch};
use laminate_core::LaminateError;
use serde_json::json;

fn sample_design() -> Design {
    let def = LayerDefinition::new(vec![
        Layer::new("base", 0.5, "fr4"),
        Layer::new("top", 0.25, "pi"),
    ])
    .unwrap();
    let base = def.ids()[0];
    let mut design = Design::new("saved", def);

    let mut sketch = Sketch::new("outline");
    sketch.add_shape(GenericShape::polygon(
        &[[0.0, 0.0], [8.0, 0.0], [8.0, 6.0], [0.0, 6.0]],
        &[vec![[2.0, 2.0], [4.0, 2.0], [4.0, 4.0], [2.0, 4.0]]],
    ));
    let sketch = design.add_sketch(sketch).unwrap();
    let placed = design
        .add_operation(OperationNode::sketch_operation("outline", sketch, vec![base]))
        .unwrap();
    let located = design.add_operation(OperationNode::locate("everywhere", sketch)).unwrap();
    design
        .add_operation(OperationNode::laminate_operation(
            "xor",
            LaminateFunction::SymmetricDifference,
            vec![OperationRef::first(placed)],
            vec![OperationRef::first(located)],
        ))
        .unwrap();
    design
}

#[test]
fn test_design_survives_save_and_load() {
    let mut design = sample_design();
    design.regenerate().unwrap();

    let json = persistence::save_design(&design).unwrap();
    let mut loaded = persistence::load_design(&json).unwrap();

    assert_eq!(loaded.id, design.id);
    assert_eq!(loaded.layer_def(), design.layer_def());
    assert_eq!(loaded.sketches(), design.sketches());
    assert!(loaded.operations().iter().all(|n| n.state() == NodeState::Uninitialized));

    // Recomputing the loaded copy gives the same geometry.
    loaded.regenerate().unwrap();
    for (a, b) in design.operations().iter().zip(loaded.operations()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.outputs(), b.outputs());
    }
}

#[test]
fn test_symmetric_difference_against_locate() {
    let mut design = sample_design();
    design.regenerate().unwrap();
    let xor = design.operations()[2].id;
    let top = design.layer_def().ids()[1];
    let base = design.layer_def().ids()[0];
    let outputs = design.outputs_of(xor).unwrap();
    // Same outline on base cancels out; only the located copy on top remains.
    assert!(outputs[0].laminate.layer_geometry(base).unwrap().area() < 1e-6);
    let located = outputs[0].laminate.layer_geometry(top).unwrap();
    assert_abs_diff_eq!(located.area(), 44.0, epsilon = 1e-6);
}

#[test]
fn test_legacy_operation_loads_into_design() {
    let mut design = sample_design();
    let parent = design.operations()[0].id;
    let legacy = Record {
        kind: EntityKind::Operation,
        version: 1,
        data: json!({
            "id": laminate_core::id::EntityId::new(),
            "customname": "old union",
            "type": "LaminateOperation",
            "function": "union",
            "operation_links1": [[parent, 0]],
            "operation_links2": [],
        }),
    };
    let node: OperationNode = persistence::deserialize(legacy).unwrap();
    let id = design.add_operation(node).unwrap();
    design.regenerate().unwrap();

    let base = design.layer_def().ids()[0];
    let area = design.outputs_of(id).unwrap()[0].laminate.layer_geometry(base).unwrap().area();
    assert_abs_diff_eq!(area, 44.0, epsilon = 1e-6);
}

#[test]
fn test_legacy_link_to_cut_line_keeps_its_index() {
    let mut design = sample_design();
    let placed = design.operations()[0].id;
    let candidate = design
        .add_operation(OperationNode::support_candidate(
            "candidate",
            OperationRef::first(placed),
            KeepoutType::MillKeepout,
            1.0,
            0.5,
        ))
        .unwrap();
    let legacy = Record {
        kind: EntityKind::Operation,
        version: 1,
        data: json!({
            "id": laminate_core::id::EntityId::new(),
            "type": "LaminateOperation",
            "function": "union",
            "operation_links1": [[candidate, 2]],
            "operation_links2": [],
        }),
    };
    let node: OperationNode = persistence::deserialize(legacy).unwrap();
    let copy = design.add_operation(node).unwrap();
    design.regenerate().unwrap();

    let cut_line = &design.outputs_of(candidate).unwrap()[2];
    assert_eq!(cut_line.label, "cut line");
    let copied = &design.outputs_of(copy).unwrap()[0].laminate;
    for id in design.layer_def().ids() {
        let expected = cut_line.laminate.layer_geometry(id).unwrap();
        let actual = copied.layer_geometry(id).unwrap();
        assert!(expected.symmetric_difference(&actual).area() < 1e-6);
    }
    let base = design.layer_def().ids()[0];
    assert!(copied.layer_geometry(base).unwrap().area() > 0.0);
}

#[test]
fn test_broken_reference_rejected_on_load() {
    let design = sample_design();
    let mut record = persistence::serialize(&design).unwrap();
    // Drop the first operation; the xor node now points at nothing.
    if let Some(ops) = record.data["operations"].as_array_mut() {
        ops.remove(0);
    }
    let json = record.to_json().unwrap();
    let err = persistence::load_design(&json).unwrap_err();
    assert!(matches!(err, LaminateError::Reference(_)));
}

#[test]
fn test_future_record_rejected() {
    let mut record = persistence::serialize(&sample_design()).unwrap();
    record.version = 7;
    let err = persistence::load_design(&record.to_json().unwrap()).unwrap_err();
    assert_eq!(
        err,
        LaminateError::SchemaUpgradeFailure {
            kind: "design".to_string(),
            version: 7
        }
    );
}
