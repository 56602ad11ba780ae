/// Canvas, color and layout primitives.
pub mod core;
/// Crate error type.
pub mod error;
