use tracing::warn;

use crate::error::ModelError;

/// Value returned by sentinel-style queries when no next page is known.
pub const NOT_FOUND: i64 = -1;

/// Converts a caller-supplied signed index into a checked state index.
///
/// Network and command-line callers speak in signed integers, so `-1`
/// and other negatives must be rejected the same way as `size` and above.
///
/// # Errors
/// Returns `ModelError::InvalidIndex` if `raw` is outside `[0, size)`.
pub fn state_index(raw: i64, size: usize) -> Result<usize, ModelError> {
	match usize::try_from(raw) {
		Ok(index) if index < size => Ok(index),
		_ => {
			warn!(index = raw, size, "rejected state index");
			Err(ModelError::InvalidIndex { index: raw, size })
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn accepts_in_range() {
		assert_eq!(state_index(0, 4), Ok(0));
		assert_eq!(state_index(3, 4), Ok(3));
	}

	#[test]
	fn rejects_negative() {
		assert_eq!(
			state_index(-1, 4),
			Err(ModelError::InvalidIndex { index: -1, size: 4 })
		);
		assert!(state_index(i64::MIN, 4).is_err());
	}

	#[test]
	fn rejects_size_and_above() {
		assert_eq!(
			state_index(4, 4),
			Err(ModelError::InvalidIndex { index: 4, size: 4 })
		);
		assert!(state_index(i64::MAX, 4).is_err());
	}
}
