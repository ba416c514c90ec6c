//! First-order page transition model.
//!
//! This crate provides an empirical Markov model over a fixed set of pages:
//! - A dense transition matrix updated one observation at a time
//! - Arg-max next-page prediction with a deterministic tie-break
//! - Weighted sampling of the next page
//! - A prefetcher that drives the model from a raw access stream
//!
//! The model holds no lock. Callers sharing it across threads must
//! serialize access themselves.

/// Error type shared by every fallible operation.
pub mod error;

/// Transition matrix, signed-index boundary and access-stream prefetcher.
pub mod model;

pub use error::ModelError;
pub use model::index::{NOT_FOUND, state_index};
pub use model::prefetcher::{PrefetchStats, Prefetcher};
pub use model::transition_model::TransitionModel;
