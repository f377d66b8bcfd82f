//! Configurable, cached mapping between independently defined types.
//!
//! Types describe their members through `#[derive(Mappable)]`. A [`MapperConfig`]
//! collects explicit type-pair maps, member value converters, and fallback
//! handlers; [`MapperConfig::build`] freezes it into a [`Mapper`], which compiles
//! each type pair once on first use and reuses it from any thread.
//!
//! ```ignore
//! use graft_mapper::{Mappable, MapperConfig};
//!
//! #[derive(Clone, Default, Mappable)]
//! struct User { id: u64, name: String, age: Option<u32> }
//!
//! #[derive(Clone, Default, Mappable)]
//! struct UserDto { id: u64, name: String, age: u32, label: String }
//!
//! let mut config = MapperConfig::new();
//! config
//!     .create_map::<User, UserDto>()?
//!     .convert_using("label", |u: &User| Ok(format!("#{} {}", u.id, u.name)))?
//!     .null_if("age", 0u32)?;
//! let mapper = config.build()?;
//! let dto: UserDto = mapper.map(&user)?;
//! ```
//!
//! # Modules
//!
//! - [`value`] / [`shape`] - runtime descriptions of member types and structs
//! - [`converter`] - member value conversion with `Option` fallback rules
//! - [`option`] - the resolved per-pair mapping description
//! - [`handler`] - fallbacks for pairs without an explicit map
//! - [`backend`] - turning descriptions into callable mappers
//! - [`cache`] - compile-once storage of callable mappers

extern crate self as graft_mapper;

pub mod backend;
pub mod cache;
pub mod capability;
pub mod config;
pub mod converter;
mod error;
pub mod handler;
mod key;
mod mapper;
pub mod option;
pub mod registry;
mod rules;
pub mod shape;
pub mod value;

pub use backend::{CompilationBackend, CompiledMapperEntry, InterpretedBackend, NestedMapper};
pub use cache::{CacheStats, CompiledMapperCache};
pub use capability::{MapContext, MappingAction, ObjectFactory, ValueConverter, ValueResolver};
pub use config::{MapperConfig, MapperSettings, NameMatching, TypeMapBuilder};
pub use converter::{ConversionPath, ConverterResolver, ResolvedConverter};
pub use error::{BoxError, MapError, Result, SharedError};
pub use graft_macros::Mappable;
pub use handler::{DefaultMemberHandler, MappingRequest, MissingHandler, MissingHandlerChain};
pub use key::{MapRequest, Profile, TypeHandle, TypeKey};
pub use mapper::{Mapper, ProfiledMapper};
pub use option::{MappingOption, OptionOrigin};
pub use registry::Registry;
pub use rules::MapRules;
pub use shape::{Mappable, Member, Shape};
pub use value::{DynValue, ValueKind, ValueType};
