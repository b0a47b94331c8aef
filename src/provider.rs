//! Provider-facing descriptors (data) and claim mapping (behavior).
//!
//! `descriptor` exposes validated metadata ([`ProviderDescriptor`]) covering the HTTPS-only
//! authorization endpoint, default scopes, and redirect quirks (`response_type` ordering,
//! `response_mode`, account-selection prompt). `mapping` turns decoded identity-token claims
//! into a provider-agnostic [`Identity`](crate::auth::Identity), selected by the
//! [`IdentityProvider`](crate::auth::IdentityProvider) tag.

pub mod descriptor;
pub mod mapping;

pub use descriptor::*;
pub use mapping::*;
