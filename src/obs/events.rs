// self
use crate::{
	_prelude::*,
	auth::IdentityKey,
	flows::{CallbackRejection, CallbackState},
	profile::EnrichmentFailure,
	store::StoreError,
};

/// Logs a callback state transition.
pub fn record_callback_stage(stage: CallbackState) {
	#[cfg(feature = "tracing")]
	tracing::debug!(stage = stage.as_str(), "Redirect callback advanced.");

	#[cfg(not(feature = "tracing"))]
	let _ = stage;
}

/// Logs why a callback was rejected. Only the reason is recorded, never token material.
pub fn record_callback_rejection(rejection: &CallbackRejection) {
	#[cfg(feature = "tracing")]
	tracing::warn!(reason = rejection.reason(), "Redirect callback rejected: {rejection}");

	#[cfg(not(feature = "tracing"))]
	let _ = rejection;
}

/// Logs a persisted identity that could not be deserialized and was dropped.
pub fn record_discarded_identity(error: &dyn Display) {
	#[cfg(feature = "tracing")]
	tracing::warn!("Discarding unreadable persisted identity: {error}");

	#[cfg(not(feature = "tracing"))]
	let _ = error;
}

/// Logs a freshly published identity by its key.
pub fn record_identity_published(key: &IdentityKey) {
	#[cfg(feature = "tracing")]
	tracing::debug!(identity = %key, "Session identity published.");

	#[cfg(not(feature = "tracing"))]
	let _ = key;
}

/// Logs a swallowed profile-enrichment failure.
pub fn record_enrichment_failure(failure: &EnrichmentFailure) {
	#[cfg(feature = "tracing")]
	tracing::debug!("Profile enrichment skipped: {failure}");

	#[cfg(not(feature = "tracing"))]
	let _ = failure;
}

/// Logs a storage operation that failed where the caller cannot propagate.
pub fn record_storage_failure(key: &'static str, error: &StoreError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(key, "Storage operation failed: {error}");

	#[cfg(not(feature = "tracing"))]
	let _ = (key, error);
}
