pub mod config;
pub mod design;
pub mod error;
pub mod geometry;
pub mod id;
pub mod import;
pub mod laminate;
pub mod layers;
pub mod manufacturing;
pub mod operations;
pub mod persistence;
pub mod sketch;
pub mod units;

pub use design::Design;
pub use error::{LaminateError, LaminateResult, ReferenceError};
