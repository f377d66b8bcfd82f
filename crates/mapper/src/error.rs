//! Error types for mapper configuration, resolution, and invocation.

use std::sync::Arc;

use thiserror::Error;

use crate::key::{TypeHandle, TypeKey};

/// Boxed error returned by user-supplied converters, resolvers, actions, and factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shared form of a user error, so cached failures can be handed to every caller.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while configuring a mapper or mapping values.
///
/// Configuration errors ([`InvalidMemberBinding`], [`ConflictingBinding`],
/// [`ConfigurationFrozen`]) are returned by the call that caused them. Resolution
/// errors ([`MappingNotConfigured`], [`ConversionNotSupported`], [`CyclicMapping`],
/// [`UnmappableMember`]) surface at the first use of a type pair and are cached
/// for that pair.
///
/// [`InvalidMemberBinding`]: MapError::InvalidMemberBinding
/// [`ConflictingBinding`]: MapError::ConflictingBinding
/// [`ConfigurationFrozen`]: MapError::ConfigurationFrozen
/// [`MappingNotConfigured`]: MapError::MappingNotConfigured
/// [`ConversionNotSupported`]: MapError::ConversionNotSupported
/// [`CyclicMapping`]: MapError::CyclicMapping
/// [`UnmappableMember`]: MapError::UnmappableMember
#[derive(Debug, Clone, Error)]
pub enum MapError {
	/// No converter could be resolved between two member value types.
	#[error("no conversion from `{from}` to `{to}`")]
	ConversionNotSupported {
		/// Source value type.
		from: TypeHandle,
		/// Destination value type.
		to: TypeHandle,
	},

	/// Neither an explicit map nor any missing-map handler produced an option.
	#[error("no mapping configured for {key}")]
	MappingNotConfigured {
		/// The unresolved type pair.
		key: TypeKey,
	},

	/// A binding names a member that does not exist (or cannot be read/written).
	#[error("invalid member binding `{member}` on {key}{}", suggestion.as_ref().map(|s| format!(" (did you mean `{s}`?)")).unwrap_or_default())]
	InvalidMemberBinding {
		/// Type pair being configured.
		key: TypeKey,
		/// The offending member name.
		member: String,
		/// Closest known member name, if one is similar enough.
		suggestion: Option<String>,
	},

	/// Two bindings target the same destination member.
	#[error("member `{member}` on {key} is already bound by `{existing}`, cannot bind `{incoming}`")]
	ConflictingBinding {
		/// Type pair being configured.
		key: TypeKey,
		/// Destination member name.
		member: String,
		/// Kind of the binding already present.
		existing: &'static str,
		/// Kind of the rejected binding.
		incoming: &'static str,
	},

	/// A mutation was attempted after [`MapperConfig::build`](crate::MapperConfig::build).
	#[error("mapper configuration is frozen")]
	ConfigurationFrozen,

	/// A mapping sub-maps (directly or transitively) into its own type pair.
	#[error("cyclic mapping: {}", format_path(path))]
	CyclicMapping {
		/// Keys along the cycle, starting and ending with the repeated key.
		path: Vec<TypeKey>,
	},

	/// A runtime call had the wrong shape for the resolved mapping.
	#[error("invalid map arguments for {key}: {reason}")]
	InvalidMapArguments {
		/// The type pair being mapped.
		key: TypeKey,
		/// What was wrong with the call.
		reason: &'static str,
	},

	/// Strict mode is on and a destination member could not be mapped.
	#[error("unmappable member `{member}` on {key}: {reason}")]
	UnmappableMember {
		/// The type pair being resolved.
		key: TypeKey,
		/// Destination member name.
		member: String,
		/// Why no binding could be produced.
		reason: String,
	},

	/// A user-supplied converter, resolver, or factory failed for a member.
	#[error("mapping {key} failed at member `{member}`: {error}")]
	Member {
		/// The type pair being mapped.
		key: TypeKey,
		/// Destination member (or hook name) that failed.
		member: String,
		/// The underlying user error.
		#[source]
		error: SharedError,
	},

	/// A type-erased value did not have the expected runtime type.
	#[error("value type mismatch: expected `{expected}`")]
	ValueTypeMismatch {
		/// The type the value should have had.
		expected: TypeHandle,
	},
}

impl MapError {
	/// Wraps a user error with the type pair and member it occurred in.
	///
	/// A [`MapError`] raised from a nested mapping is passed through unchanged, since
	/// it already names its own type pair.
	pub fn member(key: &TypeKey, member: &str, error: BoxError) -> Self {
		match error.downcast::<MapError>() {
			Ok(inner) => *inner,
			Err(error) => MapError::Member {
				key: key.clone(),
				member: member.to_string(),
				error: Arc::from(error),
			},
		}
	}

	/// Returns a mismatch error for an expected type.
	pub fn mismatch<T: ?Sized + 'static>() -> Self {
		MapError::ValueTypeMismatch {
			expected: TypeHandle::of::<T>(),
		}
	}
}

fn format_path(path: &[TypeKey]) -> String {
	path.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join(" => ")
}

/// Result type for mapper operations.
pub type Result<T> = std::result::Result<T, MapError>;
