//! Browser location seam.
//!
//! Navigating to a provider is a hard process boundary: after [`Location::assign`] the page is
//! gone and the callback runs on the next load. [`Location::replace`] only rewrites the
//! address bar (`history.replaceState`).

// self
use crate::_prelude::*;

/// Access to the current page address.
pub trait Location
where
	Self: Debug + Send + Sync,
{
	/// Returns the full current URL, including any fragment.
	fn href(&self) -> Url;

	/// Navigates away to `url`.
	fn assign(&self, url: &Url);

	/// Rewrites the visible URL without navigating.
	fn replace(&self, url: &Url);
}

/// In-memory [`Location`] that records navigations for inspection.
#[derive(Debug)]
pub struct MemoryLocation {
	current: RwLock<Url>,
	navigations: Mutex<Vec<Url>>,
}
impl MemoryLocation {
	/// Starts at `url`.
	pub fn new(url: Url) -> Self {
		Self { current: RwLock::new(url), navigations: Mutex::new(Vec::new()) }
	}

	/// URLs passed to [`Location::assign`], oldest first.
	pub fn navigations(&self) -> Vec<Url> {
		self.navigations.lock().clone()
	}

	/// The most recent navigation target, if any.
	pub fn last_navigation(&self) -> Option<Url> {
		self.navigations.lock().last().cloned()
	}
}
impl Location for MemoryLocation {
	fn href(&self) -> Url {
		self.current.read().clone()
	}

	fn assign(&self, url: &Url) {
		self.navigations.lock().push(url.clone());
		*self.current.write() = url.clone();
	}

	fn replace(&self, url: &Url) {
		*self.current.write() = url.clone();
	}
}
