use crate::config::KernelConfig;
use crate::error::LaminateError;
use crate::sketch::convert::RegionConverter;
use crate::sketch::types::{GenericShape, Sketch};

fn converter() -> RegionConverter {
    RegionConverter::new(&KernelConfig::default())
}

#[test]
fn test_square_converts_to_area() {
    let mut sketch = Sketch::new("square");
    sketch.add_shape(GenericShape::polygon(
        &[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
        &[],
    ));
    let region = converter().convert(&sketch).unwrap();
    assert!((region.area() - 100.0).abs() < 1e-6);
}

#[test]
fn test_construction_shapes_are_ignored() {
    let mut sketch = Sketch::new("s");
    sketch.add_shape(GenericShape::two_point_rect([0.0, 0.0], [2.0, 2.0]));
    sketch.add_shape(GenericShape::two_point_rect([10.0, 0.0], [20.0, 10.0]).as_construction());
    let region = converter().convert(&sketch).unwrap();
    assert!((region.area() - 4.0).abs() < 1e-6);
}

#[test]
fn test_lines_contribute_no_area() {
    let mut sketch = Sketch::new("s");
    sketch.add_shape(GenericShape::line([0.0, 0.0], [5.0, 5.0]));
    sketch.add_shape(GenericShape::polyline(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]));
    let region = converter().convert(&sketch).unwrap();
    assert!(region.is_empty());
}

#[test]
fn test_overlapping_shapes_are_unioned() {
    let mut sketch = Sketch::new("s");
    sketch.add_shape(GenericShape::two_point_rect([0.0, 0.0], [4.0, 4.0]));
    sketch.add_shape(GenericShape::two_point_rect([2.0, 0.0], [6.0, 4.0]));
    let region = converter().convert(&sketch).unwrap();
    assert!((region.area() - 24.0).abs() < 1e-6);
    assert_eq!(region.polygons().len(), 1);
}

#[test]
fn test_polygon_with_hole() {
    let mut sketch = Sketch::new("s");
    sketch.add_shape(GenericShape::polygon(
        &[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
        &[vec![[2.0, 2.0], [4.0, 2.0], [4.0, 4.0], [2.0, 4.0]]],
    ));
    let region = converter().convert(&sketch).unwrap();
    assert!((region.area() - 96.0).abs() < 1e-6);
}

#[test]
fn test_hole_winding_does_not_matter() {
    let outer = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
    let hole = vec![[2.0, 2.0], [4.0, 2.0], [4.0, 4.0], [2.0, 4.0]];
    let reversed: Vec<[f64; 2]> = hole.iter().rev().cloned().collect();

    for ring in [hole, reversed] {
        let mut sketch = Sketch::new("s");
        sketch.add_shape(GenericShape::polygon(&outer, &[ring]));
        let region = converter().convert(&sketch).unwrap();
        assert!((region.area() - 96.0).abs() < 1e-6);
    }
}

#[test]
fn test_circle_disc() {
    let mut sketch = Sketch::new("s");
    sketch.add_shape(GenericShape::circle([0.0, 0.0], [0.0, 3.0]));
    let region = converter().convert(&sketch).unwrap();
    let exact = std::f64::consts::PI * 9.0;
    // 64-gon inscribed in the circle.
    assert!(region.area() < exact);
    assert!(region.area() > exact * 0.99);
}

fn sketch_with_bad_shape() -> Sketch {
    let mut sketch = Sketch::new("mixed");
    sketch.add_shape(GenericShape::two_point_rect([0.0, 0.0], [3.0, 3.0]));
    // Zero-radius circle.
    sketch.add_shape(GenericShape::circle([5.0, 5.0], [5.0, 5.0]));
    sketch
}

#[test]
fn test_permissive_mode_skips_bad_shapes() {
    let region = converter().convert(&sketch_with_bad_shape()).unwrap();
    assert!((region.area() - 9.0).abs() < 1e-6);
}

#[test]
fn test_strict_mode_propagates() {
    let config = KernelConfig {
        strict: true,
        ..Default::default()
    };
    let result = RegionConverter::new(&config).convert(&sketch_with_bad_shape());
    assert!(matches!(result, Err(LaminateError::GeometryDegenerate(_))));
}

#[test]
fn test_empty_sketch_is_empty_region() {
    let region = converter().convert(&Sketch::new("empty")).unwrap();
    assert!(region.is_empty());
}
