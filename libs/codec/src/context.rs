//! # Codec Context
//!
//! ## Purpose
//!
//! Process-scoped cache of compiled codecs for one serialization domain:
//! one provider registry, one record catalog, one configuration. Each
//! descriptor compiles at most once per context.
//!
//! ## Concurrency
//!
//! ```text
//! get_or_compile(T)
//!   ├─ table hit ───────────────► handle          (lock-free read)
//!   └─ miss → compile lock
//!         ├─ table hit (raced) ─► handle
//!         └─ Composer session ──► publish all ──► handle
//! ```
//!
//! Compilation is single-writer: concurrent requests for uncompiled types
//! wait on the compile lock and re-check the table before compiling, so a
//! type compiled by another thread is observed rather than rebuilt. A failed
//! session publishes nothing.
//!
//! There is one compile lock per context, not per root type, so first use of
//! two unrelated types from different threads compiles them one after the
//! other. Sessions also publish nested types that other roots share, and a
//! single writer keeps those publications free of duplicate compilations.
//! Only first use pays for this: requests for published codecs never take the
//! lock, and neither do reads or writes through a [`Codec`] handle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use packwright_types::{TypeCatalog, TypeDescriptor};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::behaviour::UnexpectedFieldBehaviour;
use crate::codec::{Codec, CompiledCodec};
use crate::compose::Composer;
use crate::config::CodecConfig;
use crate::error::CompileResult;
use crate::provider::ProviderRegistry;

/// Published codecs keyed by descriptor
pub(crate) type CodecTable = DashMap<TypeDescriptor, Arc<CompiledCodec>>;

#[derive(Debug, Default)]
pub(crate) struct CompileCounters {
    pub compilations: AtomicU64,
    pub cache_hits: AtomicU64,
    pub deferred_references: AtomicU64,
    pub failed_compilations: AtomicU64,
}

/// Point-in-time copy of a context's compile counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStatistics {
    /// Codecs compiled and published, nested types included
    pub compilations: u64,
    /// Top-level requests served from the table
    pub cache_hits: u64,
    /// Back edges emitted for self-referential types
    pub deferred_references: u64,
    /// Top-level requests that failed to compile
    pub failed_compilations: u64,
}

/// Compiled-codec cache for one registry, catalog and configuration
pub struct CodecContext {
    registry: ProviderRegistry,
    catalog: TypeCatalog,
    config: CodecConfig,
    table: Arc<CodecTable>,
    compile_lock: Mutex<()>,
    counters: CompileCounters,
}

impl CodecContext {
    /// Context with the built-in providers and default configuration
    pub fn new(catalog: TypeCatalog) -> Self {
        Self::builder().catalog(catalog).build()
    }

    pub fn builder() -> CodecContextBuilder {
        CodecContextBuilder::default()
    }

    /// Codec for `descriptor`, compiling it and every nested type on first
    /// request
    pub fn get_or_compile(
        &self,
        descriptor: &TypeDescriptor,
        behaviour: UnexpectedFieldBehaviour,
    ) -> CompileResult<Codec> {
        if let Some(compiled) = self.lookup(descriptor) {
            return Ok(self.cache_hit(compiled, behaviour));
        }

        let _guard = self.compile_lock.lock();
        if let Some(compiled) = self.lookup(descriptor) {
            return Ok(self.cache_hit(compiled, behaviour));
        }

        debug!(descriptor = %descriptor, "Compile session started");
        let composer = Composer::new(
            &self.registry,
            &self.catalog,
            &self.table,
            &self.counters,
            self.config.max_compile_depth,
        );

        match composer.compile(descriptor) {
            Ok(session) => {
                let count = session.finished.len();
                for compiled in session.finished {
                    self.table.insert(compiled.descriptor().clone(), compiled);
                }
                self.counters.compilations.fetch_add(count as u64, Ordering::Relaxed);
                debug!(descriptor = %descriptor, published = count, "Compile session finished");
                Ok(self.handle(session.root, behaviour))
            }
            Err(error) => {
                self.counters.failed_compilations.fetch_add(1, Ordering::Relaxed);
                warn!(descriptor = %descriptor, %error, "Compile session failed");
                Err(error)
            }
        }
    }

    /// [`get_or_compile`](Self::get_or_compile) with the configured default
    /// behaviour
    pub fn codec(&self, descriptor: &TypeDescriptor) -> CompileResult<Codec> {
        self.get_or_compile(descriptor, self.config.default_behaviour)
    }

    pub fn is_compiled(&self, descriptor: &TypeDescriptor) -> bool {
        self.table.contains_key(descriptor)
    }

    /// Number of published codecs
    pub fn compiled_count(&self) -> usize {
        self.table.len()
    }

    pub fn statistics(&self) -> CompileStatistics {
        CompileStatistics {
            compilations: self.counters.compilations.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            deferred_references: self.counters.deferred_references.load(Ordering::Relaxed),
            failed_compilations: self.counters.failed_compilations.load(Ordering::Relaxed),
        }
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn lookup(&self, descriptor: &TypeDescriptor) -> Option<Arc<CompiledCodec>> {
        self.table.get(descriptor).map(|entry| entry.value().clone())
    }

    fn cache_hit(
        &self,
        compiled: Arc<CompiledCodec>,
        behaviour: UnexpectedFieldBehaviour,
    ) -> Codec {
        self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
        trace!(descriptor = %compiled.descriptor(), "Codec cache hit");
        self.handle(compiled, behaviour)
    }

    fn handle(&self, compiled: Arc<CompiledCodec>, behaviour: UnexpectedFieldBehaviour) -> Codec {
        Codec::new(compiled, behaviour, self.config.max_depth, Arc::clone(&self.table))
    }
}

impl std::fmt::Debug for CodecContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecContext")
            .field("registry", &self.registry)
            .field("records", &self.catalog.len())
            .field("config", &self.config)
            .field("compiled", &self.table.len())
            .finish()
    }
}

#[derive(Default)]
pub struct CodecContextBuilder {
    registry: Option<ProviderRegistry>,
    catalog: TypeCatalog,
    config: CodecConfig,
}

impl CodecContextBuilder {
    pub fn catalog(mut self, catalog: TypeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the default registry
    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> CodecContext {
        CodecContext {
            registry: self.registry.unwrap_or_default(),
            catalog: self.catalog,
            config: self.config,
            table: Arc::new(DashMap::new()),
            compile_lock: Mutex::new(()),
            counters: CompileCounters::default(),
        }
    }
}
