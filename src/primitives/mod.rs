//! Core compute primitives.
//!
//! The `Matrix` type is the working representation for featurized
//! trajectories: one row per sample, one column per feature.

mod matrix;

pub use matrix::Matrix;
