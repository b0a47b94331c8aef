//! Optional observability helpers for sign-in flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_implicit.flow` with the `flow` and
//!   `stage` fields, plus warn/debug events for swallowed failures.
//! - Enable `metrics` to increment the `oauth2_implicit_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod events;
mod metrics;
mod tracing;

pub use events::*;
pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Building the authorization URL and navigating away.
	SignIn,
	/// Processing the redirect fragment on page load.
	Callback,
	/// Fetching Microsoft Graph profile data.
	Enrichment,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::SignIn => "sign_in",
			FlowKind::Callback => "callback",
			FlowKind::Enrichment => "enrichment",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure, whether propagated or swallowed.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
