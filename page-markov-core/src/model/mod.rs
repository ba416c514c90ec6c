//! Top-level module for the page transition model.
//!
//! - Dense first-order transition matrix (`TransitionModel`)
//! - Conversion of caller-supplied signed indices (`index`)
//! - Access-stream driver with hit accounting (`Prefetcher`)

/// Dense N×N transition matrix with incremental row normalization.
///
/// Handles transition recording, arg-max prediction,
/// weighted sampling and text rendering.
pub mod transition_model;

/// Signed index checks and the `-1` "no prediction" sentinel.
pub mod index;

/// High-level driver turning page accesses into transitions and predictions.
pub mod prefetcher;
