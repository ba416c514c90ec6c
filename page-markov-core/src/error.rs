/// Error type for all fallible operations on a transition model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
	/// Returned when a model is requested with zero states.
	#[error("model size must be at least 1")]
	InvalidSize,

	/// Returned when storage for the matrix could not be obtained.
	#[error("failed to allocate a {size}x{size} transition matrix")]
	Allocation {
		/// Requested number of states.
		size: usize,
	},

	/// Returned when a state index lies outside `[0, size)`.
	#[error("invalid state index {index} (must be in 0..{size})")]
	InvalidIndex {
		/// The rejected index, as supplied by the caller.
		index: i64,
		/// Number of states in the model.
		size: usize,
	},

	/// Returned by `validate` when a row is neither all zero nor normalized.
	#[error("row {row} is not a valid distribution (sum = {sum})")]
	Corrupted {
		/// Offending row.
		row: usize,
		/// Its current sum.
		sum: f64,
	},
}

impl ModelError {
	/// Builds an `InvalidIndex` error from an unsigned index.
	pub(crate) fn invalid_index(index: usize, size: usize) -> Self {
		Self::InvalidIndex {
			index: i64::try_from(index).unwrap_or(i64::MAX),
			size,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn error_invalid_size() {
		assert_eq!(ModelError::InvalidSize.to_string(), "model size must be at least 1");
	}

	#[test]
	fn error_allocation() {
		let e = ModelError::Allocation { size: 7 };
		assert_eq!(e.to_string(), "failed to allocate a 7x7 transition matrix");
	}

	#[test]
	fn error_invalid_index() {
		let e = ModelError::InvalidIndex { index: -1, size: 4 };
		assert_eq!(e.to_string(), "invalid state index -1 (must be in 0..4)");
	}

	#[test]
	fn error_invalid_index_saturates() {
		let e = ModelError::invalid_index(usize::MAX, 4);
		assert_eq!(e, ModelError::InvalidIndex { index: i64::MAX, size: 4 });
	}

	#[test]
	fn error_corrupted() {
		let e = ModelError::Corrupted { row: 2, sum: 1.5 };
		assert_eq!(e.to_string(), "row 2 is not a valid distribution (sum = 1.5)");
	}

	#[test]
	fn error_is_send_and_sync() {
		fn assert_impl<T: Send + Sync + std::error::Error>() {}
		assert_impl::<ModelError>();
	}
}
