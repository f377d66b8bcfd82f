use std::sync::Barrier;
use std::sync::atomic::AtomicUsize;

use super::*;
use crate::backend::{CompilationBackend, InterpretedBackend};
use crate::config::MapperSettings;
use crate::converter::ConverterResolver;
use crate::error::MapError;
use crate::handler::MappingRequest;
use crate::key::{MapRequest, Profile};
use crate::Mappable;

#[derive(Clone, Default, Mappable)]
struct Source {
	id: u32,
}

#[derive(Clone, Default, Mappable)]
struct Target {
	id: u32,
}

fn request(profile: Option<&str>) -> MapRequest {
	MapRequest::of::<Source, Target>(profile.map(Profile::from))
}

fn compile(request: &MapRequest) -> Result<CompiledMapperEntry> {
	let converters = ConverterResolver::new();
	let settings = MapperSettings::default();
	let option = MappingRequest::new(request, &converters, &settings).by_convention("test")?;
	InterpretedBackend.compile(&Arc::new(option))
}

#[test]
fn test_compiles_once() {
	let cache = CompiledMapperCache::new();
	let request = request(None);
	let runs = AtomicUsize::new(0);

	for _ in 0..3 {
		let entry = cache
			.get_or_compile(request.key(), || {
				runs.fetch_add(1, Ordering::SeqCst);
				compile(&request)
			})
			.unwrap();
		assert_eq!(entry.key(), request.key());
	}

	assert_eq!(runs.load(Ordering::SeqCst), 1);
	let stats = cache.stats();
	assert_eq!(stats.compilations, 1);
	assert_eq!(stats.hits, 2);
	assert_eq!(stats.entries, 1);
	assert!(cache.contains(request.key()));
	assert!(cache.get(request.key()).is_some());
}

#[test]
fn test_returns_shared_entry() {
	let cache = CompiledMapperCache::new();
	let request = request(None);
	let a = cache.get_or_compile(request.key(), || compile(&request)).unwrap();
	let b = cache
		.get_or_compile(request.key(), || panic!("recompiled"))
		.unwrap();
	assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_failure_is_cached() {
	let cache = CompiledMapperCache::new();
	let request = request(None);
	let key = request.key().clone();

	let first = cache
		.get_or_compile(&key, || Err(MapError::MappingNotConfigured { key: key.clone() }))
		.unwrap_err();
	let second = cache
		.get_or_compile(&key, || panic!("failed compilation retried"))
		.unwrap_err();

	assert_eq!(first.to_string(), second.to_string());
	assert!(matches!(second, MapError::MappingNotConfigured { .. }));
	assert_eq!(cache.stats().failures, 1);
	assert!(cache.contains(&key));
	assert!(cache.get(&key).is_none());
}

#[test]
fn test_profiles_are_distinct_keys() {
	let cache = CompiledMapperCache::new();
	let plain = request(None);
	let scoped = request(Some("api"));

	cache.get_or_compile(plain.key(), || compile(&plain)).unwrap();
	cache.get_or_compile(scoped.key(), || compile(&scoped)).unwrap();

	let stats = cache.stats();
	assert_eq!(stats.compilations, 2);
	assert_eq!(stats.entries, 2);
}

#[test]
fn test_concurrent_first_use_compiles_once() {
	const THREADS: usize = 32;
	let cache = CompiledMapperCache::new();
	let request = request(None);
	let runs = AtomicUsize::new(0);
	let barrier = Barrier::new(THREADS);

	std::thread::scope(|s| {
		for _ in 0..THREADS {
			s.spawn(|| {
				barrier.wait();
				cache
					.get_or_compile(request.key(), || {
						runs.fetch_add(1, Ordering::SeqCst);
						std::thread::sleep(std::time::Duration::from_millis(5));
						compile(&request)
					})
					.unwrap();
			});
		}
	});

	assert_eq!(runs.load(Ordering::SeqCst), 1);
	let stats = cache.stats();
	assert_eq!(stats.compilations, 1);
	assert_eq!(stats.hits, THREADS as u64 - 1);
}
