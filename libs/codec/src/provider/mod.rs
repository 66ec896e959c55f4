//! # Type Providers
//!
//! ## Purpose
//!
//! A provider is a stateless strategy that recognises a family of
//! descriptors and emits the routine pair for one of them. Providers never
//! call each other: nested values are requested from the [`Composer`], which
//! resolves, caches and null-wraps them.
//!
//! ## Resolution
//!
//! The [`ProviderRegistry`] asks each provider in priority order whether it
//! can handle a descriptor; the first yes wins. The order is fixed when the
//! registry is built, so resolution is lock-free and deterministic:
//!
//! ```text
//! custom providers (builder order)
//!   → Primitive → Buffer → Decimal → OpaqueString<Version>
//!   → Tuple → Union → List → Map → Record
//! ```

mod buffer;
mod decimal;
mod list;
mod map;
mod opaque;
mod primitive;
mod record;
mod tuple;
mod union;

pub use buffer::BufferProvider;
pub use decimal::DecimalProvider;
pub use list::ListProvider;
pub use map::MapProvider;
pub use opaque::{CanonicalString, OpaqueStringProvider};
pub use primitive::PrimitiveProvider;
pub use record::RecordProvider;
pub use tuple::{TupleProvider, MAX_TUPLE_ARITY};
pub use union::UnionProvider;

use std::fmt;

use packwright_types::{TypeCatalog, TypeDescriptor, Version};

use crate::codec::{DeserialiseFn, SerialiseFn};
use crate::compose::Composer;
use crate::error::{CompileError, CompileResult};

/// Encoding strategy for a family of types
pub trait TypeProvider: Send + Sync {
    /// Short name used in logs and diagnostics
    fn name(&self) -> &'static str;

    /// Whether this provider handles `descriptor`
    fn can_provide(&self, descriptor: &TypeDescriptor, catalog: &TypeCatalog) -> bool;

    /// Whether `Nullable(descriptor)` should be handled by the composer's
    /// generic nil wrapper. Providers returning `false` either encode
    /// nullability themselves or do not support it.
    fn uses_default_null_handling(&self, _descriptor: &TypeDescriptor) -> bool {
        true
    }

    fn emit_serialiser(
        &self,
        descriptor: &TypeDescriptor,
        composer: &mut Composer<'_>,
    ) -> CompileResult<SerialiseFn>;

    fn emit_deserialiser(
        &self,
        descriptor: &TypeDescriptor,
        composer: &mut Composer<'_>,
    ) -> CompileResult<DeserialiseFn>;
}

/// Immutable, ordered provider list
pub struct ProviderRegistry {
    providers: Vec<Box<dyn TypeProvider>>,
}

impl ProviderRegistry {
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder { custom: Vec::new(), include_builtins: true }
    }

    /// First provider accepting `descriptor`
    pub fn resolve(
        &self,
        descriptor: &TypeDescriptor,
        catalog: &TypeCatalog,
    ) -> CompileResult<&dyn TypeProvider> {
        self.providers
            .iter()
            .find(|provider| provider.can_provide(descriptor, catalog))
            .map(|provider| provider.as_ref())
            .ok_or_else(|| CompileError::unsupported(descriptor))
    }

    /// Provider names in priority order
    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self { providers: builtin_providers() }
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Built-in providers in default priority order
pub fn builtin_providers() -> Vec<Box<dyn TypeProvider>> {
    vec![
        Box::new(PrimitiveProvider),
        Box::new(BufferProvider),
        Box::new(DecimalProvider),
        Box::new(OpaqueStringProvider::<Version>::new()),
        Box::new(TupleProvider),
        Box::new(UnionProvider),
        Box::new(ListProvider),
        Box::new(MapProvider),
        Box::new(RecordProvider),
    ]
}

pub struct ProviderRegistryBuilder {
    custom: Vec<Box<dyn TypeProvider>>,
    include_builtins: bool,
}

impl ProviderRegistryBuilder {
    /// Register a provider ahead of the built-ins
    pub fn with_provider(mut self, provider: impl TypeProvider + 'static) -> Self {
        self.custom.push(Box::new(provider));
        self
    }

    /// Leave out the built-in providers entirely
    pub fn without_builtins(mut self) -> Self {
        self.include_builtins = false;
        self
    }

    pub fn build(self) -> ProviderRegistry {
        let mut providers = self.custom;
        if self.include_builtins {
            providers.extend(builtin_providers());
        }
        ProviderRegistry { providers }
    }
}
