use serde::{Deserialize, Serialize};
use tracing::debug;

use super::transition_model::TransitionModel;
use crate::error::ModelError;

/// Running prediction counters of a [`Prefetcher`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrefetchStats {
	/// Accepted page accesses.
	pub accesses: u64,
	/// Accesses that produced a prediction for the following access.
	pub predictions: u64,
	/// Predictions confirmed by the next access.
	pub hits: u64,
	/// Predictions contradicted by the next access.
	pub misses: u64,
}

impl PrefetchStats {
	/// Share of scored predictions that were hits, `0.0` before any scoring.
	pub fn hit_ratio(&self) -> f64 {
		let scored = self.hits + self.misses;
		if scored == 0 {
			0.0
		} else {
			self.hits as f64 / scored as f64
		}
	}
}

/// Drives a [`TransitionModel`] from a raw stream of page accesses.
///
/// # Responsibilities
/// - Turn consecutive accesses into recorded transitions
/// - Predict the page following each access
/// - Score every prediction against the access that actually follows
///
/// # Invariants
/// - `last` is always a valid page of `model`
/// - `pending` is the prediction made at the previous access, if any
#[derive(Clone, Debug)]
pub struct Prefetcher {
	model: TransitionModel,
	last: Option<usize>,
	pending: Option<usize>,
	stats: PrefetchStats,
}

impl Prefetcher {
	/// Creates a prefetcher with an empty model over `pages` pages.
	pub fn new(pages: usize) -> Result<Self, ModelError> {
		Ok(Self::with_model(TransitionModel::new(pages)?))
	}

	/// Wraps an existing model. History and counters start empty.
	pub fn with_model(model: TransitionModel) -> Self {
		Self {
			model,
			last: None,
			pending: None,
			stats: PrefetchStats::default(),
		}
	}

	/// Feeds one page access and returns the predicted next page.
	///
	/// The previous prediction is scored first, then the transition from
	/// the previous access is recorded, then the model is queried for `page`.
	///
	/// # Errors
	/// Returns `ModelError::InvalidIndex` if `page` is out of range.
	/// Counters, history and model are unchanged in that case.
	pub fn access(&mut self, page: usize) -> Result<Option<usize>, ModelError> {
		// Validates `page` before anything is mutated
		self.model.row(page)?;

		if let Some(expected) = self.pending {
			if expected == page {
				self.stats.hits += 1;
			} else {
				self.stats.misses += 1;
			}
		}
		if let Some(last) = self.last {
			self.model.record_transition(last, page)?;
		}

		let predicted = self.model.predict_next(page)?;
		self.last = Some(page);
		self.pending = predicted;
		self.stats.accesses += 1;
		if predicted.is_some() {
			self.stats.predictions += 1;
		}

		debug!(page, ?predicted, "page access");
		Ok(predicted)
	}

	/// Records a transition directly, bypassing the access history.
	pub fn record_transition(&mut self, from: usize, to: usize) -> Result<(), ModelError> {
		self.model.record_transition(from, to)
	}

	/// Returns the page predicted at the last access.
	pub fn pending(&self) -> Option<usize> {
		self.pending
	}

	/// Returns the running counters.
	pub fn stats(&self) -> PrefetchStats {
		self.stats
	}

	/// Read access to the underlying model.
	pub fn model(&self) -> &TransitionModel {
		&self.model
	}

	/// Forgets history, counters and every recorded transition.
	pub fn reset(&mut self) {
		self.model.clear();
		self.last = None;
		self.pending = None;
		self.stats = PrefetchStats::default();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_access_has_no_prediction() {
		let mut prefetcher = Prefetcher::new(4).unwrap();
		assert_eq!(prefetcher.access(0), Ok(None));
		assert_eq!(prefetcher.stats().accesses, 1);
		assert_eq!(prefetcher.stats().predictions, 0);
	}

	#[test]
	fn cyclic_scan_is_learned() {
		let mut prefetcher = Prefetcher::new(3).unwrap();
		for page in [0, 1, 2] {
			prefetcher.access(page).unwrap();
		}
		// 0->1 and 1->2 are known, 2->0 is not yet
		assert_eq!(prefetcher.access(0), Ok(Some(1)));
		assert_eq!(prefetcher.access(1), Ok(Some(2)));
		assert_eq!(prefetcher.access(2), Ok(Some(0)));

		let stats = prefetcher.stats();
		assert_eq!(stats.hits, 2);
		assert_eq!(stats.misses, 0);
		assert_eq!(stats.predictions, 3);
	}

	#[test]
	fn wrong_prediction_is_a_miss() {
		let mut prefetcher = Prefetcher::new(3).unwrap();
		prefetcher.access(0).unwrap();
		prefetcher.access(1).unwrap();
		assert_eq!(prefetcher.access(0), Ok(Some(1)));
		prefetcher.access(2).unwrap();
		assert_eq!(prefetcher.stats().misses, 1);
		assert_eq!(prefetcher.stats().hits, 0);
		assert_eq!(prefetcher.stats().hit_ratio(), 0.0);
	}

	#[test]
	fn invalid_access_changes_nothing() {
		let mut prefetcher = Prefetcher::new(2).unwrap();
		prefetcher.access(0).unwrap();
		let model_before = prefetcher.model().clone();
		let stats_before = prefetcher.stats();

		assert_eq!(
			prefetcher.access(2),
			Err(ModelError::InvalidIndex { index: 2, size: 2 })
		);
		assert_eq!(prefetcher.model(), &model_before);
		assert_eq!(prefetcher.stats(), stats_before);

		// History still points at page 0
		prefetcher.access(1).unwrap();
		assert_eq!(prefetcher.model().weight(0, 1), Ok(1.0));
	}

	#[test]
	fn direct_records_feed_predictions() {
		let mut prefetcher = Prefetcher::new(3).unwrap();
		prefetcher.record_transition(1, 2).unwrap();
		assert_eq!(prefetcher.access(1), Ok(Some(2)));
		assert_eq!(prefetcher.pending(), Some(2));
	}

	#[test]
	fn reset_forgets_everything() {
		let mut prefetcher = Prefetcher::new(3).unwrap();
		for page in [0, 1, 0, 1] {
			prefetcher.access(page).unwrap();
		}
		prefetcher.reset();
		assert_eq!(prefetcher.stats(), PrefetchStats::default());
		assert_eq!(prefetcher.pending(), None);
		assert_eq!(prefetcher.access(0), Ok(None));
	}

	#[test]
	fn hit_ratio() {
		let stats = PrefetchStats { accesses: 5, predictions: 4, hits: 3, misses: 1 };
		assert!((stats.hit_ratio() - 0.75).abs() < 1e-12);
		assert_eq!(PrefetchStats::default().hit_ratio(), 0.0);
	}
}
