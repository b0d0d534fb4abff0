pub mod types;
pub mod convert;

pub use convert::RegionConverter;
pub use types::{GenericShape, ShapeKind, ShapeVertex, Sketch};

#[cfg(test)]
mod tests_convert;
