//! # Composition Engine
//!
//! ## Purpose
//!
//! Recursive glue between providers. A compile session starts at one root
//! descriptor; whenever a provider needs the routines of a nested type it
//! asks the [`Composer`], which:
//!
//! 1. reuses a codec already published in the context table or finished
//!    earlier in this session
//! 2. hands out a deferred edge when the nested type is still being compiled
//!    further up the stack and an indirection point lies between the two
//! 3. otherwise resolves a provider, applies null handling and emits the
//!    nested routines
//!
//! Failures never stop emission. Each one is recorded as a [`Diagnostic`]
//! and the failing edge becomes a poisoned routine, so one session reports
//! every problem in the type graph at once. A session with any diagnostic
//! publishes nothing.
//!
//! ## Indirection Points
//!
//! An edge is an indirection when the nested value may be absent or
//! repeated zero times: sequence elements, mapping keys and values, nullable
//! inners and union alternatives. A type that reaches itself only through
//! direct edges (record fields, tuple items) has no finite values and is
//! rejected with [`CompileError::UnresolvableRecursiveType`].

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::{Arc, OnceLock};

use packwright_types::{TypeCatalog, TypeDescriptor, Value};
use tracing::{debug, trace};

use crate::codec::{
    deserialiser, serialiser, CodecRef, CompiledCodec, DeferredSlot, DeserialiseFn, SerialiseFn,
};
use crate::context::{CodecTable, CompileCounters};
use crate::error::{CompileError, CompileResult, Diagnostic};
use crate::provider::{ProviderRegistry, TypeProvider};

/// Provider name recorded on codecs built by the generic nil wrapper
pub const NULL_HANDLING: &str = "NullHandling";

enum SessionEntry {
    Compiling(DeferredSlot),
    Finished(Arc<CompiledCodec>),
    Failed,
}

struct Frame {
    descriptor: TypeDescriptor,
    // edge from the parent frame into this one
    through_indirection: bool,
}

enum Emitter<'p> {
    Provider(&'p dyn TypeProvider),
    DefaultNull(TypeDescriptor),
}

/// Codecs produced by a successful session, ready to publish
pub(crate) struct CompiledSession {
    pub root: Arc<CompiledCodec>,
    /// Every codec finished in the session, dependencies first
    pub finished: Vec<Arc<CompiledCodec>>,
}

/// Per-session composition state handed to providers while they emit
pub struct Composer<'ctx> {
    registry: &'ctx ProviderRegistry,
    catalog: &'ctx TypeCatalog,
    table: &'ctx CodecTable,
    counters: &'ctx CompileCounters,
    max_compile_depth: usize,
    session: HashMap<TypeDescriptor, SessionEntry>,
    stack: Vec<Frame>,
    finished: Vec<Arc<CompiledCodec>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'ctx> Composer<'ctx> {
    pub(crate) fn new(
        registry: &'ctx ProviderRegistry,
        catalog: &'ctx TypeCatalog,
        table: &'ctx CodecTable,
        counters: &'ctx CompileCounters,
        max_compile_depth: usize,
    ) -> Self {
        Self {
            registry,
            catalog,
            table,
            counters,
            max_compile_depth,
            session: HashMap::new(),
            stack: Vec::new(),
            finished: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Record catalog the session compiles against
    pub fn catalog(&self) -> &'ctx TypeCatalog {
        self.catalog
    }

    /// Routines for a nested value reached through a direct edge, such as a
    /// record field or tuple item
    pub fn element(&mut self, descriptor: &TypeDescriptor) -> CodecRef {
        self.edge(descriptor, false)
    }

    /// Routines for a nested value reached through an indirection point
    pub fn indirect_element(&mut self, descriptor: &TypeDescriptor) -> CodecRef {
        self.edge(descriptor, true)
    }

    /// Record a problem with the type currently being emitted
    pub fn report(&mut self, error: CompileError) {
        let chain = self.stack.iter().map(|f| f.descriptor.clone()).collect();
        self.push_diagnostic(Diagnostic { chain, error });
    }

    /// Number of problems recorded so far in this session
    pub fn diagnostic_count(&self) -> usize {
        self.diagnostics.len()
    }

    fn report_nested(&mut self, descriptor: &TypeDescriptor, error: CompileError) {
        let mut chain: Vec<TypeDescriptor> =
            self.stack.iter().map(|f| f.descriptor.clone()).collect();
        chain.push(descriptor.clone());
        self.push_diagnostic(Diagnostic { chain, error });
    }

    fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        // serialiser and deserialiser emission can hit the same problem
        if self.diagnostics.iter().any(|d| d.error == diagnostic.error) {
            return;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Compile `descriptor` and everything it reaches
    pub(crate) fn compile(mut self, descriptor: &TypeDescriptor) -> CompileResult<CompiledSession> {
        let root = self.compile_type(descriptor, false);

        match root {
            Some(root) if self.diagnostics.is_empty() => {
                Ok(CompiledSession { root, finished: self.finished })
            }
            _ => Err(self.into_error(descriptor)),
        }
    }

    fn into_error(mut self, descriptor: &TypeDescriptor) -> CompileError {
        match self.diagnostics.len() {
            0 => CompileError::unsupported(descriptor),
            1 => self.diagnostics.remove(0).error,
            _ => CompileError::Composition {
                descriptor: descriptor.clone(),
                diagnostics: self.diagnostics,
            },
        }
    }

    fn edge(&mut self, descriptor: &TypeDescriptor, indirect: bool) -> CodecRef {
        if let Some(codec) = self.table.get(descriptor) {
            return CodecRef::Ready(codec.value().clone());
        }

        match self.session.get(descriptor) {
            Some(SessionEntry::Finished(codec)) => return CodecRef::Ready(codec.clone()),
            Some(SessionEntry::Failed) => return CodecRef::Poisoned(descriptor.clone()),
            Some(SessionEntry::Compiling(slot)) => {
                let slot = slot.clone();
                return self.reenter(descriptor, slot, indirect);
            }
            None => {}
        }

        match self.compile_type(descriptor, indirect) {
            Some(codec) => CodecRef::Ready(codec),
            None => CodecRef::Poisoned(descriptor.clone()),
        }
    }

    /// Edge back to a type compiling further up the stack
    fn reenter(
        &mut self,
        descriptor: &TypeDescriptor,
        slot: DeferredSlot,
        indirect: bool,
    ) -> CodecRef {
        let start = self
            .stack
            .iter()
            .rposition(|frame| &frame.descriptor == descriptor)
            .unwrap_or(0);
        let cycle = &self.stack[start..];
        let breakable = indirect || cycle.iter().skip(1).any(|frame| frame.through_indirection);

        if breakable {
            self.counters.deferred_references.fetch_add(1, Ordering::Relaxed);
            trace!(descriptor = %descriptor, "Deferred reference to type under compilation");
            return CodecRef::Deferred { descriptor: descriptor.clone(), slot };
        }

        let mut chain: Vec<TypeDescriptor> = cycle.iter().map(|f| f.descriptor.clone()).collect();
        chain.push(descriptor.clone());
        self.report_nested(
            descriptor,
            CompileError::UnresolvableRecursiveType { descriptor: descriptor.clone(), chain },
        );
        CodecRef::Poisoned(descriptor.clone())
    }

    fn select_emitter(&self, descriptor: &TypeDescriptor) -> CompileResult<Emitter<'ctx>> {
        let registry = self.registry;

        if let TypeDescriptor::Nullable(inner) = descriptor {
            // an unsupported inner is reported by the nested compile
            let wraps = registry
                .resolve(inner, self.catalog)
                .map_or(true, |provider| provider.uses_default_null_handling(inner));
            if wraps {
                return Ok(Emitter::DefaultNull(inner.as_ref().clone()));
            }
        }

        registry.resolve(descriptor, self.catalog).map(Emitter::Provider)
    }

    fn compile_type(
        &mut self,
        descriptor: &TypeDescriptor,
        indirect: bool,
    ) -> Option<Arc<CompiledCodec>> {
        if self.stack.len() >= self.max_compile_depth {
            let error = CompileError::DepthLimitExceeded {
                descriptor: descriptor.clone(),
                limit: self.max_compile_depth,
            };
            self.report_nested(descriptor, error);
            self.session.insert(descriptor.clone(), SessionEntry::Failed);
            return None;
        }

        let emitter = match self.select_emitter(descriptor) {
            Ok(emitter) => emitter,
            Err(error) => {
                self.report_nested(descriptor, error);
                self.session.insert(descriptor.clone(), SessionEntry::Failed);
                return None;
            }
        };

        let slot: DeferredSlot = Arc::new(OnceLock::new());
        self.session.insert(descriptor.clone(), SessionEntry::Compiling(slot.clone()));
        self.stack.push(Frame { descriptor: descriptor.clone(), through_indirection: indirect });
        let before = self.diagnostics.len();

        let (provider, routines) = match emitter {
            Emitter::Provider(provider) => {
                debug!(descriptor = %descriptor, provider = provider.name(), "Compiling codec");
                let routines = provider
                    .emit_serialiser(descriptor, self)
                    .and_then(|s| provider.emit_deserialiser(descriptor, self).map(|d| (s, d)));
                (provider.name(), routines)
            }
            Emitter::DefaultNull(inner) => {
                let inner = self.indirect_element(&inner);
                (NULL_HANDLING, Ok(null_handling(inner)))
            }
        };

        let routines = match routines {
            Ok(routines) => Some(routines),
            Err(error) => {
                self.report(error);
                None
            }
        };
        self.stack.pop();

        match routines {
            Some((serialise, deserialise)) if self.diagnostics.len() == before => {
                let compiled =
                    CompiledCodec::new(descriptor.clone(), provider, serialise, deserialise);
                let codec = Arc::new(compiled);
                // the slot only ever receives this one codec
                let _ = slot.set(Arc::downgrade(&codec));
                self.session.insert(descriptor.clone(), SessionEntry::Finished(codec.clone()));
                self.finished.push(codec.clone());
                debug!(descriptor = %descriptor, provider, "Compiled codec");
                Some(codec)
            }
            _ => {
                self.session.insert(descriptor.clone(), SessionEntry::Failed);
                None
            }
        }
    }
}

/// Wrap `inner` so `nil` stands for [`Value::Null`]
fn null_handling(inner: CodecRef) -> (SerialiseFn, DeserialiseFn) {
    let write_inner = inner.clone();
    let serialise = serialiser(move |value, packer| match value {
        Value::Null => Ok(packer.write_nil()?),
        other => write_inner.serialise(other, packer),
    });
    let deserialise = deserialiser(move |unpacker, scope| {
        if unpacker.try_read_nil() {
            Ok(Value::Null)
        } else {
            inner.deserialise(unpacker, scope)
        }
    });
    (serialise, deserialise)
}
