//! Concrete encodings of XNode trees.

pub mod json;

pub use json::JsonCodec;
