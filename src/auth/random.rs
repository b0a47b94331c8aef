//! Alphanumeric random values for CSRF `state` and replay-resistance `nonce` parameters.

// crates.io
use rand::{Rng, SeedableRng, distr::Alphanumeric, rngs::StdRng};
// self
use crate::_prelude::*;

/// The operating system's random source failed.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Secure random source failed: {message}.")]
pub struct RandomError {
	/// Description reported by the random source.
	pub message: String,
}

/// Generates `len` characters drawn uniformly from `[A-Za-z0-9]`, seeded from the OS CSPRNG.
pub fn random_string(len: usize) -> Result<String, RandomError> {
	let rng = StdRng::try_from_os_rng().map_err(|e| RandomError { message: e.to_string() })?;

	Ok(rng.sample_iter(Alphanumeric).take(len).map(char::from).collect())
}
