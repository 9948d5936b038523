//! Scalar values: typed primitives and PolyStrings.

mod poly_string;
mod primitive;

pub use poly_string::{DefaultNormalizer, Normalizer, PolyString};
pub use primitive::PrimitiveValue;
