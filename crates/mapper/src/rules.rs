//! Untyped draft of the explicit rules for one type pair.
//!
//! [`MapRules`] collects what a `create_map` call (or a handler) says about a type
//! pair before the converter table is final. Member names are validated against the
//! shapes as rules are added; conversions are resolved later, when the draft is
//! assembled into a [`MappingOption`](crate::MappingOption).

use std::fmt;

use crate::error::{MapError, Result};
use crate::key::{MapRequest, TypeKey};
use crate::option::{Action, Factory, Producer};
use crate::shape::{Member, Shape};

/// Explicit rule for one destination member.
#[derive(Clone)]
pub(crate) enum MemberRule {
	MapFrom(&'static Member),
	Computed(Producer),
	Ignore,
}

impl MemberRule {
	fn kind(&self) -> &'static str {
		match self {
			MemberRule::MapFrom(_) => "map_from",
			MemberRule::Computed(producer) => producer.kind(),
			MemberRule::Ignore => "ignore",
		}
	}
}

/// Explicit handling of a `None` source value for one destination member.
#[derive(Clone)]
pub(crate) enum NullRule {
	Substitute(Producer),
	Ignore,
}

impl NullRule {
	fn kind(&self) -> &'static str {
		match self {
			NullRule::Substitute(_) => "null_if",
			NullRule::Ignore => "null_ignore",
		}
	}
}

/// Explicit rules for one type pair, keyed by destination member name.
#[derive(Clone)]
pub struct MapRules {
	key: TypeKey,
	source: &'static Shape,
	destination: &'static Shape,
	members: Vec<(&'static str, MemberRule)>,
	nulls: Vec<(&'static str, NullRule)>,
	null_ignore_all: bool,
	strict: Option<bool>,
	before: Vec<Action>,
	after: Vec<Action>,
	factory: Option<Factory>,
}

impl MapRules {
	/// Creates an empty draft for a type pair.
	pub fn new(request: &MapRequest) -> Self {
		Self {
			key: request.key().clone(),
			source: request.source(),
			destination: request.destination(),
			members: Vec::new(),
			nulls: Vec::new(),
			null_ignore_all: false,
			strict: None,
			before: Vec::new(),
			after: Vec::new(),
			factory: None,
		}
	}

	pub fn key(&self) -> &TypeKey {
		&self.key
	}

	pub fn source(&self) -> &'static Shape {
		self.source
	}

	pub fn destination(&self) -> &'static Shape {
		self.destination
	}

	/// Binds `destination` to the source member named `source`.
	///
	/// # Errors
	///
	/// [`MapError::InvalidMemberBinding`] if either name is unknown, the destination
	/// is read-only, or the source is write-only; [`MapError::ConflictingBinding`] if
	/// the destination already has a rule.
	pub fn map_from(&mut self, destination: &str, source: &str) -> Result<&mut Self> {
		let source = self.source_member(source)?;
		self.bind(destination, MemberRule::MapFrom(source))?;
		Ok(self)
	}

	/// Excludes `destination` from mapping.
	pub fn ignore(&mut self, destination: &str) -> Result<&mut Self> {
		self.bind(destination, MemberRule::Ignore)?;
		Ok(self)
	}

	/// Leaves `destination` untouched when its source value is `None`.
	pub fn null_ignore(&mut self, destination: &str) -> Result<&mut Self> {
		self.null(destination, NullRule::Ignore)?;
		Ok(self)
	}

	/// Leaves every destination member untouched when its source value is `None`.
	pub fn null_ignore_all(&mut self) -> &mut Self {
		self.null_ignore_all = true;
		self
	}

	/// Overrides the global strict setting for this type pair.
	pub fn strict(&mut self, strict: bool) -> &mut Self {
		self.strict = Some(strict);
		self
	}

	/// Returns true if no rule of any kind has been added.
	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
			&& self.nulls.is_empty()
			&& !self.null_ignore_all
			&& self.strict.is_none()
			&& self.before.is_empty()
			&& self.after.is_empty()
			&& self.factory.is_none()
	}

	pub(crate) fn bind(&mut self, destination: &str, rule: MemberRule) -> Result<()> {
		let member = self.destination_member(destination)?;
		if let Some((_, existing)) = self.members.iter().find(|(name, _)| *name == member.name()) {
			return Err(self.conflict(member.name(), existing.kind(), rule.kind()));
		}
		// Null rules need a source value; computed members have none.
		if let MemberRule::Computed(_) = rule
			&& let Some(null) = self.null_rule(member.name())
		{
			return Err(self.conflict(member.name(), null.kind(), rule.kind()));
		}
		self.members.push((member.name(), rule));
		Ok(())
	}

	pub(crate) fn null(&mut self, destination: &str, rule: NullRule) -> Result<()> {
		let member = self.destination_member(destination)?;
		if let Some((_, existing)) = self.nulls.iter().find(|(name, _)| *name == member.name()) {
			return Err(self.conflict(member.name(), existing.kind(), rule.kind()));
		}
		if let Some(computed @ MemberRule::Computed(_)) = self.rule(member.name()) {
			return Err(self.conflict(member.name(), computed.kind(), rule.kind()));
		}
		self.nulls.push((member.name(), rule));
		Ok(())
	}

	pub(crate) fn push_before(&mut self, action: Action) {
		self.before.push(action);
	}

	pub(crate) fn push_after(&mut self, action: Action) {
		self.after.push(action);
	}

	pub(crate) fn set_factory(&mut self, factory: Factory) -> Result<()> {
		if self.factory.is_some() {
			return Err(self.conflict("<construct>", "construct_using", "construct_using"));
		}
		self.factory = Some(factory);
		Ok(())
	}

	pub(crate) fn rule(&self, destination: &str) -> Option<&MemberRule> {
		self.members.iter().find(|(name, _)| *name == destination).map(|(_, rule)| rule)
	}

	pub(crate) fn null_rule(&self, destination: &str) -> Option<&NullRule> {
		self.nulls.iter().find(|(name, _)| *name == destination).map(|(_, rule)| rule)
	}

	pub(crate) fn strict_override(&self) -> Option<bool> {
		self.strict
	}

	pub(crate) fn ignores_all_nulls(&self) -> bool {
		self.null_ignore_all
	}

	pub(crate) fn before(&self) -> &[Action] {
		&self.before
	}

	pub(crate) fn after(&self) -> &[Action] {
		&self.after
	}

	pub(crate) fn factory(&self) -> Option<&Factory> {
		self.factory.as_ref()
	}

	fn destination_member(&self, name: &str) -> Result<&'static Member> {
		match self.destination.member(name) {
			Some(member) if member.is_writable() => Ok(member),
			Some(_) => Err(self.invalid(name, None)),
			None => Err(self.invalid(name, self.destination.suggest(name))),
		}
	}

	fn source_member(&self, name: &str) -> Result<&'static Member> {
		match self.source.member(name) {
			Some(member) if member.is_readable() => Ok(member),
			Some(_) => Err(self.invalid(name, None)),
			None => Err(self.invalid(name, self.source.suggest(name))),
		}
	}

	fn invalid(&self, member: &str, suggestion: Option<&str>) -> MapError {
		MapError::InvalidMemberBinding {
			key: self.key.clone(),
			member: member.to_string(),
			suggestion: suggestion.map(str::to_string),
		}
	}

	fn conflict(&self, member: &str, existing: &'static str, incoming: &'static str) -> MapError {
		MapError::ConflictingBinding {
			key: self.key.clone(),
			member: member.to_string(),
			existing,
			incoming,
		}
	}
}

impl fmt::Debug for MapRules {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let members: Vec<_> = self.members.iter().map(|(name, rule)| (*name, rule.kind())).collect();
		let nulls: Vec<_> = self.nulls.iter().map(|(name, rule)| (*name, rule.kind())).collect();
		f.debug_struct("MapRules")
			.field("key", &self.key)
			.field("members", &members)
			.field("nulls", &nulls)
			.field("null_ignore_all", &self.null_ignore_all)
			.field("strict", &self.strict)
			.finish()
	}
}
