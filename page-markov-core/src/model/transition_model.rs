use std::fmt;

use rand::Rng;
use tracing::{debug, trace, warn};

use super::index::{NOT_FOUND, state_index};
use crate::error::ModelError;

/// Tolerance used when checking that a row sums to 1.
const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Dense first-order transition model over a fixed number of pages.
///
/// `weights` is a flat `size * size` buffer where the cell at
/// `row * size + col` holds the weight of moving from page `row` to
/// page `col`. Each row is either untouched (all zero) or normalized
/// (sums to 1).
///
/// # Update rule
/// Recording `from -> to` adds `1.0` to the *stored* weight, which is
/// already a probability once the row has been touched, then divides
/// the whole row by its new sum. Recent transitions therefore weigh
/// more than older ones: `(A->B), (A->C), (A->B)` leaves row `A` at
/// `[.., 0.75, 0.25]` and not at the frequency estimate `[.., 2/3, 1/3]`.
///
/// # Invariants
/// - `size >= 1` and never changes after construction
/// - every row is all zero or sums to 1 within `1e-6`
/// - a failed call never modifies the matrix
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionModel {
	/// Number of pages (matrix dimension).
	size: usize,

	/// Row-major transition weights.
	weights: Vec<f64>,
}

impl TransitionModel {
	/// Creates a model for `size` pages with every weight set to zero.
	///
	/// The matrix is reserved in a single allocation, so it either
	/// exists in full or not at all.
	///
	/// # Errors
	/// - `ModelError::InvalidSize` if `size` is zero.
	/// - `ModelError::Allocation` if `size * size` cells cannot be reserved.
	pub fn new(size: usize) -> Result<Self, ModelError> {
		if size == 0 {
			return Err(ModelError::InvalidSize);
		}

		let cells = size.checked_mul(size).ok_or(ModelError::Allocation { size })?;
		let mut weights = Vec::new();
		weights
			.try_reserve_exact(cells)
			.map_err(|_| ModelError::Allocation { size })?;
		weights.resize(cells, 0.0);

		debug!(size, "created transition model");
		Ok(Self { size, weights })
	}

	/// Returns the number of pages tracked by the model.
	pub fn size(&self) -> usize {
		self.size
	}

	/// Returns the outgoing weights of page `from`.
	pub fn row(&self, from: usize) -> Result<&[f64], ModelError> {
		self.check(from)?;
		Ok(self.row_unchecked(from))
	}

	/// Returns the weight of the transition `from -> to`.
	pub fn weight(&self, from: usize, to: usize) -> Result<f64, ModelError> {
		self.check(from)?;
		self.check(to)?;
		Ok(self.weights[from * self.size + to])
	}

	/// Returns `true` once at least one transition out of `from` was recorded.
	pub fn is_observed(&self, from: usize) -> Result<bool, ModelError> {
		Ok(self.row(from)?.iter().any(|w| *w > 0.0))
	}

	/// Records an observed transition and renormalizes row `from`.
	///
	/// Only row `from` is modified.
	///
	/// # Errors
	/// Returns `ModelError::InvalidIndex` if either index is out of range.
	/// The model is left untouched in that case.
	pub fn record_transition(&mut self, from: usize, to: usize) -> Result<(), ModelError> {
		self.check(from)?;
		self.check(to)?;
		self.apply(from, to);
		Ok(())
	}

	/// Records every consecutive pair of `pages` as a transition, in order.
	///
	/// All indices are checked before the first update, so a bad index
	/// anywhere in the sequence leaves the model unchanged.
	pub fn record_sequence(&mut self, pages: &[usize]) -> Result<(), ModelError> {
		for &page in pages {
			self.check(page)?;
		}
		for pair in pages.windows(2) {
			self.apply(pair[0], pair[1]);
		}
		Ok(())
	}

	/// Predicts the most likely page to follow `current`.
	///
	/// Scans the row in ascending order and keeps the first strictly
	/// greater weight, so ties go to the lowest page. The running best
	/// starts at `0.0`: an untouched row yields `None`.
	///
	/// # Errors
	/// Returns `ModelError::InvalidIndex` if `current` is out of range.
	pub fn predict_next(&self, current: usize) -> Result<Option<usize>, ModelError> {
		self.check(current)?;
		Ok(arg_max(self.row_unchecked(current)))
	}

	/// Sentinel flavour of [`predict_next`](Self::predict_next) for signed callers.
	///
	/// Returns the predicted page, or [`NOT_FOUND`] when the row is untouched
	/// or `current` is not a valid page (the rejection is logged).
	pub fn predict_next_or_sentinel(&self, current: i64) -> i64 {
		let predicted = state_index(current, self.size).and_then(|c| self.predict_next(c));
		match predicted {
			Ok(Some(page)) => i64::try_from(page).unwrap_or(NOT_FOUND),
			_ => NOT_FOUND,
		}
	}

	/// Draws the next page at random, weighted by row `current`.
	///
	/// Returns `None` if no transition out of `current` was ever recorded.
	pub fn sample_next(&self, current: usize, rng: &mut impl Rng) -> Result<Option<usize>, ModelError> {
		self.check(current)?;
		let row = self.row_unchecked(current);

		let total: f64 = row.iter().sum();
		if total <= 0.0 {
			return Ok(None);
		}

		let u = rng.random::<f64>() * total;
		let mut cumulative = 0.0;
		let mut last_non_zero = None;
		for (page, &w) in row.iter().enumerate() {
			if w <= 0.0 {
				continue;
			}
			cumulative += w;
			last_non_zero = Some(page);
			if u < cumulative {
				return Ok(Some(page));
			}
		}

		// Only reached through floating-point rounding
		Ok(last_non_zero)
	}

	/// Returns row `from` to the untouched state.
	pub fn reset_row(&mut self, from: usize) -> Result<(), ModelError> {
		self.check(from)?;
		let size = self.size;
		self.weights[from * size..(from + 1) * size].fill(0.0);
		Ok(())
	}

	/// Returns every row to the untouched state.
	pub fn clear(&mut self) {
		self.weights.fill(0.0);
	}

	/// Checks that every row is either all zero or a probability distribution.
	///
	/// # Errors
	/// Returns `ModelError::Corrupted` for the first row holding a negative or
	/// non-finite weight, or summing to something other than 0 or 1.
	pub fn validate(&self) -> Result<(), ModelError> {
		for (row, weights) in self.weights.chunks(self.size).enumerate() {
			let sum: f64 = weights.iter().sum();
			let well_formed = weights.iter().all(|w| w.is_finite() && *w >= 0.0);
			if !well_formed || (sum != 0.0 && (sum - 1.0).abs() > ROW_SUM_TOLERANCE) {
				return Err(ModelError::Corrupted { row, sum });
			}
		}
		Ok(())
	}

	/// Renders the matrix as text, two decimals per cell.
	///
	/// Same output as the `Display` implementation.
	pub fn render(&self) -> String {
		self.to_string()
	}

	fn check(&self, index: usize) -> Result<(), ModelError> {
		if index < self.size {
			Ok(())
		} else {
			warn!(index, size = self.size, "rejected state index");
			Err(ModelError::invalid_index(index, self.size))
		}
	}

	fn row_unchecked(&self, from: usize) -> &[f64] {
		&self.weights[from * self.size..(from + 1) * self.size]
	}

	/// Increment then renormalize. Indices must already be checked.
	fn apply(&mut self, from: usize, to: usize) {
		let size = self.size;
		let row = &mut self.weights[from * size..(from + 1) * size];
		row[to] += 1.0;
		normalize_row(row);
		trace!(from, to, "recorded transition");
	}
}

impl fmt::Display for TransitionModel {
	/// One line per row, cells as `{:.2}` separated by spaces,
	/// followed by an empty line.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for row in self.weights.chunks(self.size) {
			let line = row
				.iter()
				.map(|w| format!("{w:.2}"))
				.collect::<Vec<_>>()
				.join(" ");
			writeln!(f, "{line}")?;
		}
		writeln!(f)
	}
}

/// Divides every cell by the row sum. A zero row is left as is.
fn normalize_row(row: &mut [f64]) {
	let sum: f64 = row.iter().sum();
	if sum > 0.0 {
		for w in row.iter_mut() {
			*w /= sum;
		}
	}
}

/// Index of the first strictly largest positive value.
fn arg_max(row: &[f64]) -> Option<usize> {
	let mut best = None;
	let mut max = 0.0;
	for (page, &w) in row.iter().enumerate() {
		if w > max {
			max = w;
			best = Some(page);
		}
	}
	best
}
