//! Per-type-pair compiled mapper cache.
//!
//! # Concurrency
//!
//! - The slot map sits behind a `parking_lot::RwLock`; hits only take the read lock.
//! - A miss takes the write lock just long enough to insert an empty slot. The
//!   lock is released before compiling.
//! - Each slot is a `OnceLock`, so exactly one caller runs the compilation for a
//!   key while concurrent callers for the same key block on that slot. Other keys
//!   are unaffected.
//! - Failures are stored like successes. Every later caller for the key receives
//!   the same error; there is no retry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::backend::CompiledMapperEntry;
use crate::error::Result;
use crate::key::TypeKey;

#[cfg(test)]
mod tests;

type Slot = Arc<OnceLock<Result<Arc<CompiledMapperEntry>>>>;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
	/// Compilations run (successful or not).
	pub compilations: u64,
	/// Compilations that failed.
	pub failures: u64,
	/// Lookups answered from an already compiled slot.
	pub hits: u64,
	/// Keys with a slot.
	pub entries: usize,
}

/// Lazily compiled, shared [`CompiledMapperEntry`]s keyed by [`TypeKey`].
#[derive(Default)]
pub struct CompiledMapperCache {
	slots: RwLock<FxHashMap<TypeKey, Slot>>,
	compilations: AtomicU64,
	failures: AtomicU64,
	hits: AtomicU64,
}

impl CompiledMapperCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the entry for `key`, running `compile` if no caller has yet.
	///
	/// `compile` runs at most once per key for the lifetime of the cache, and must
	/// not call back into the cache for the same key.
	pub fn get_or_compile<F>(&self, key: &TypeKey, compile: F) -> Result<Arc<CompiledMapperEntry>>
	where
		F: FnOnce() -> Result<CompiledMapperEntry>,
	{
		let slot = self.slot(key);
		if let Some(done) = slot.get() {
			self.hits.fetch_add(1, Ordering::Relaxed);
			tracing::trace!(domain = "mapper", %key, "compiled mapper cache hit");
			return done.clone();
		}

		let mut ran = false;
		let result = slot.get_or_init(|| {
			ran = true;
			self.compilations.fetch_add(1, Ordering::Relaxed);
			let result = compile().map(Arc::new);
			if let Err(error) = &result {
				self.failures.fetch_add(1, Ordering::Relaxed);
				tracing::warn!(domain = "mapper", %key, %error, "mapper compilation failed; error cached");
			}
			result
		});
		if !ran {
			self.hits.fetch_add(1, Ordering::Relaxed);
		}
		result.clone()
	}

	/// Returns the entry for `key` if it has been compiled successfully.
	pub fn get(&self, key: &TypeKey) -> Option<Arc<CompiledMapperEntry>> {
		let slots = self.slots.read();
		slots.get(key)?.get()?.as_ref().ok().cloned()
	}

	/// Returns true if `key` has a finished slot (compiled or failed).
	pub fn contains(&self, key: &TypeKey) -> bool {
		self.slots.read().get(key).is_some_and(|slot| slot.get().is_some())
	}

	pub fn stats(&self) -> CacheStats {
		CacheStats {
			compilations: self.compilations.load(Ordering::Relaxed),
			failures: self.failures.load(Ordering::Relaxed),
			hits: self.hits.load(Ordering::Relaxed),
			entries: self.slots.read().len(),
		}
	}

	fn slot(&self, key: &TypeKey) -> Slot {
		if let Some(slot) = self.slots.read().get(key) {
			return slot.clone();
		}
		self.slots.write().entry(key.clone()).or_default().clone()
	}
}

impl std::fmt::Debug for CompiledMapperCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CompiledMapperCache").field("stats", &self.stats()).finish()
	}
}
