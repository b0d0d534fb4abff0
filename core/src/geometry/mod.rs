//! Planar geometry: tolerant point/segment predicates, 2D affine transforms and
//! the polygon-with-holes region type every laminate layer is made of.

/// A point in sketch/laminate space.
pub type Point = [f64; 2];

/// An ordered pair of points. Used transiently; never stored on its own.
pub type Segment = [Point; 2];

pub mod utils_2d;
pub use utils_2d::{
    coincident, collinear, order_vertices, point_on_line, point_within_segment, shared_edge,
};

pub mod transform;
pub use transform::{angle_between_lines, transform_from_two_lines, Affine2};

pub mod region;
pub use region::{stroke, unary_safe_union, PlanarRegion};
