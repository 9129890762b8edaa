//! Object URLs created for image previews
//!
//! Every registered URL is revoked exactly once: explicitly, through
//! [`ObjectUrlRegistry::revoke_all`], or when the registry is dropped.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

pub type Revoker = Arc<dyn Fn(&str) + Send + Sync>;

pub struct ObjectUrlRegistry {
	urls: Mutex<Vec<String>>,
	revoker: Revoker,
}

impl ObjectUrlRegistry {
	/// Registry calling `revoker` for each URL it releases.
	pub fn new(revoker: Revoker) -> Self {
		Self {
			urls: Mutex::new(Vec::new()),
			revoker,
		}
	}

	/// Registry backed by `URL.revokeObjectURL`.
	#[cfg(target_arch = "wasm32")]
	pub fn browser() -> Self {
		Self::new(Arc::new(|url: &str| {
			if let Err(e) = web_sys::Url::revoke_object_url(url) {
				tracing::warn!(url, error = ?e, "failed to revoke object URL");
			}
		}))
	}

	/// Track a URL. Registering the same URL twice is a no-op.
	pub fn register(&self, url: impl Into<String>) {
		let url = url.into();
		let mut urls = self.urls.lock();
		if !urls.contains(&url) {
			urls.push(url);
		}
	}

	/// Revoke one URL now. Returns `false` if it was not tracked.
	pub fn revoke(&self, url: &str) -> bool {
		let removed = {
			let mut urls = self.urls.lock();
			let before = urls.len();
			urls.retain(|u| u != url);
			urls.len() != before
		};
		if removed {
			(self.revoker)(url);
		}
		removed
	}

	/// Revoke everything still tracked and return how many URLs were released.
	pub fn revoke_all(&self) -> usize {
		let urls = std::mem::take(&mut *self.urls.lock());
		for url in &urls {
			(self.revoker)(url);
		}
		if !urls.is_empty() {
			tracing::debug!(count = urls.len(), "revoked object URLs");
		}
		urls.len()
	}

	pub fn len(&self) -> usize {
		self.urls.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.urls.lock().is_empty()
	}
}

impl Drop for ObjectUrlRegistry {
	fn drop(&mut self) {
		self.revoke_all();
	}
}

impl fmt::Debug for ObjectUrlRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ObjectUrlRegistry")
			.field("urls", &*self.urls.lock())
			.finish_non_exhaustive()
	}
}
