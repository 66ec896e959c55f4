//! # Compiled Codecs
//!
//! ## Purpose
//!
//! A compiled codec is a pair of closures built once per descriptor and then
//! shared by every caller. Container routines hold [`CodecRef`]s to their
//! element routines, so the compiled graph mirrors the type's structure:
//!
//! ```text
//! Codec (handle) ──► CompiledCodec(Acme.Node) ──Ready──► CompiledCodec(i32)
//!                          │
//!                          └──Ready──► CompiledCodec(list<Acme.Node>)
//!                                           │
//!                                           └──Deferred (weak)──► Acme.Node
//! ```
//!
//! Self-references are the only back edges and they are weak, so the graph
//! never leaks. The handle keeps the owning table alive, which keeps every
//! weak target alive for as long as any handle exists.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use packwright_types::{TypeDescriptor, Value};

use crate::behaviour::UnexpectedFieldBehaviour;
use crate::context::CodecTable;
use crate::error::{CodecError, CodecResult, DeserialiseError, DeserialiseErrorKind, InternalError};
use crate::wire::{Packer, Unpacker};

/// Compiled serialise routine
pub type SerialiseFn = Arc<dyn Fn(&Value, &mut Packer) -> CodecResult<()> + Send + Sync>;

/// Compiled deserialise routine
pub type DeserialiseFn =
    Arc<dyn Fn(&mut Unpacker<'_>, &ReadScope<'_>) -> CodecResult<Value> + Send + Sync>;

/// Box a closure as a [`SerialiseFn`]
pub fn serialiser<F>(routine: F) -> SerialiseFn
where
    F: Fn(&Value, &mut Packer) -> CodecResult<()> + Send + Sync + 'static,
{
    Arc::new(routine)
}

/// Box a closure as a [`DeserialiseFn`]
pub fn deserialiser<F>(routine: F) -> DeserialiseFn
where
    F: Fn(&mut Unpacker<'_>, &ReadScope<'_>) -> CodecResult<Value> + Send + Sync + 'static,
{
    Arc::new(routine)
}

/// Per-call state threaded through deserialise routines
#[derive(Debug, Clone, Copy)]
pub struct ReadScope<'s> {
    name: &'s str,
    behaviour: UnexpectedFieldBehaviour,
    depth: usize,
    max_depth: usize,
}

impl<'s> ReadScope<'s> {
    pub const ROOT_NAME: &'static str = "<root>";

    pub fn root(behaviour: UnexpectedFieldBehaviour, max_depth: usize) -> ReadScope<'static> {
        ReadScope { name: ReadScope::ROOT_NAME, behaviour, depth: 0, max_depth }
    }

    /// Scope for a nested value one level down
    pub fn child<'c>(&self, name: &'c str) -> ReadScope<'c> {
        ReadScope {
            name,
            behaviour: self.behaviour,
            depth: self.depth + 1,
            max_depth: self.max_depth,
        }
    }

    /// Field or value name being read
    pub fn name(&self) -> &'s str {
        self.name
    }

    pub fn behaviour(&self) -> UnexpectedFieldBehaviour {
        self.behaviour
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Error for the value this scope is reading
    pub fn fail(&self, target: &TypeDescriptor, kind: DeserialiseErrorKind) -> CodecError {
        DeserialiseError::new(self.name, target.clone(), kind).into()
    }
}

/// Immutable routine pair for one descriptor
pub struct CompiledCodec {
    descriptor: TypeDescriptor,
    provider: &'static str,
    serialise: SerialiseFn,
    deserialise: DeserialiseFn,
}

impl CompiledCodec {
    pub fn new(
        descriptor: TypeDescriptor,
        provider: &'static str,
        serialise: SerialiseFn,
        deserialise: DeserialiseFn,
    ) -> Self {
        Self { descriptor, provider, serialise, deserialise }
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Name of the provider that emitted the routines
    pub fn provider(&self) -> &'static str {
        self.provider
    }

    pub fn serialise_value(&self, value: &Value, packer: &mut Packer) -> CodecResult<()> {
        (self.serialise)(value, packer)
    }

    pub fn deserialise_value(
        &self,
        unpacker: &mut Unpacker<'_>,
        scope: &ReadScope<'_>,
    ) -> CodecResult<Value> {
        if scope.depth > scope.max_depth {
            return Err(scope.fail(
                &self.descriptor,
                DeserialiseErrorKind::DepthLimitExceeded { limit: scope.max_depth },
            ));
        }
        (self.deserialise)(unpacker, scope)
    }
}

impl fmt::Debug for CompiledCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledCodec")
            .field("descriptor", &self.descriptor)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

/// Slot a deferred reference resolves through once its codec is published
pub(crate) type DeferredSlot = Arc<OnceLock<Weak<CompiledCodec>>>;

/// Edge from a routine to a nested routine
#[derive(Clone)]
pub enum CodecRef {
    /// Finished codec, owned strongly
    Ready(Arc<CompiledCodec>),
    /// Back edge to a codec still being compiled when the edge was emitted
    Deferred {
        descriptor: TypeDescriptor,
        slot: DeferredSlot,
    },
    /// Stand-in for a nested type that failed to compile
    Poisoned(TypeDescriptor),
}

impl CodecRef {
    pub fn descriptor(&self) -> &TypeDescriptor {
        match self {
            CodecRef::Ready(codec) => codec.descriptor(),
            CodecRef::Deferred { descriptor, .. } | CodecRef::Poisoned(descriptor) => descriptor,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, CodecRef::Deferred { .. })
    }

    fn upgrade(
        descriptor: &TypeDescriptor,
        slot: &DeferredSlot,
    ) -> CodecResult<Arc<CompiledCodec>> {
        slot.get().and_then(Weak::upgrade).ok_or_else(|| {
            InternalError::UnresolvedDeferredCodec { descriptor: descriptor.clone() }.into()
        })
    }

    pub fn serialise(&self, value: &Value, packer: &mut Packer) -> CodecResult<()> {
        match self {
            CodecRef::Ready(codec) => codec.serialise_value(value, packer),
            CodecRef::Deferred { descriptor, slot } => {
                Self::upgrade(descriptor, slot)?.serialise_value(value, packer)
            }
            CodecRef::Poisoned(descriptor) => {
                Err(InternalError::PoisonedRoutine { descriptor: descriptor.clone() }.into())
            }
        }
    }

    pub fn deserialise(
        &self,
        unpacker: &mut Unpacker<'_>,
        scope: &ReadScope<'_>,
    ) -> CodecResult<Value> {
        match self {
            CodecRef::Ready(codec) => codec.deserialise_value(unpacker, scope),
            CodecRef::Deferred { descriptor, slot } => {
                Self::upgrade(descriptor, slot)?.deserialise_value(unpacker, scope)
            }
            CodecRef::Poisoned(descriptor) => {
                Err(InternalError::PoisonedRoutine { descriptor: descriptor.clone() }.into())
            }
        }
    }
}

impl fmt::Debug for CodecRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecRef::Ready(codec) => f.debug_tuple("Ready").field(codec.descriptor()).finish(),
            CodecRef::Deferred { descriptor, slot } => f
                .debug_struct("Deferred")
                .field("descriptor", descriptor)
                .field("resolved", &slot.get().is_some())
                .finish(),
            CodecRef::Poisoned(descriptor) => f.debug_tuple("Poisoned").field(descriptor).finish(),
        }
    }
}

/// Shared, read-only handle to a published codec
///
/// Cheap to clone. Carries the unexpected-field behaviour it was requested
/// with; [`deserialise_with`](Self::deserialise_with) overrides it per call.
#[derive(Clone)]
pub struct Codec {
    compiled: Arc<CompiledCodec>,
    behaviour: UnexpectedFieldBehaviour,
    max_depth: usize,
    _table: Arc<CodecTable>,
}

impl Codec {
    pub(crate) fn new(
        compiled: Arc<CompiledCodec>,
        behaviour: UnexpectedFieldBehaviour,
        max_depth: usize,
        table: Arc<CodecTable>,
    ) -> Self {
        Self { compiled, behaviour, max_depth, _table: table }
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        self.compiled.descriptor()
    }

    pub fn provider(&self) -> &'static str {
        self.compiled.provider()
    }

    pub fn behaviour(&self) -> UnexpectedFieldBehaviour {
        self.behaviour
    }

    /// Same compiled routines, different default behaviour
    pub fn with_behaviour(mut self, behaviour: UnexpectedFieldBehaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    /// Both handles share one compiled codec instance
    pub fn same_codec(&self, other: &Codec) -> bool {
        Arc::ptr_eq(&self.compiled, &other.compiled)
    }

    pub fn serialise(&self, value: &Value, packer: &mut Packer) -> CodecResult<()> {
        self.compiled.serialise_value(value, packer)
    }

    pub fn serialise_to_vec(&self, value: &Value) -> CodecResult<Vec<u8>> {
        let mut packer = Packer::new();
        self.serialise(value, &mut packer)?;
        Ok(packer.into_bytes())
    }

    /// Read one value, leaving any following bytes in `unpacker`
    pub fn deserialise(&self, unpacker: &mut Unpacker<'_>) -> CodecResult<Value> {
        self.deserialise_with(unpacker, self.behaviour)
    }

    pub fn deserialise_with(
        &self,
        unpacker: &mut Unpacker<'_>,
        behaviour: UnexpectedFieldBehaviour,
    ) -> CodecResult<Value> {
        let scope = ReadScope::root(behaviour, self.max_depth);
        self.compiled.deserialise_value(unpacker, &scope)
    }

    /// Read exactly one value; trailing bytes are an error
    pub fn deserialise_slice(&self, bytes: &[u8]) -> CodecResult<Value> {
        let mut unpacker = Unpacker::new(bytes);
        let value = self.deserialise(&mut unpacker)?;
        if !unpacker.is_empty() {
            let scope = ReadScope::root(self.behaviour, self.max_depth);
            return Err(scope.fail(
                self.descriptor(),
                DeserialiseErrorKind::TrailingBytes { remaining: unpacker.remaining() },
            ));
        }
        Ok(value)
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("descriptor", self.descriptor())
            .field("provider", &self.provider())
            .field("behaviour", &self.behaviour)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(descriptor: TypeDescriptor, value: Value) -> Arc<CompiledCodec> {
        Arc::new(CompiledCodec::new(
            descriptor,
            "Constant",
            serialiser(|_, packer| Ok(packer.write_nil()?)),
            deserialiser(move |unpacker, _| {
                unpacker.try_read_nil();
                Ok(value.clone())
            }),
        ))
    }

    #[test]
    fn test_child_scope_inherits_behaviour() {
        let root = ReadScope::root(UnexpectedFieldBehaviour::Ignore, 8);
        let child = root.child("Item1");
        assert_eq!(child.name(), "Item1");
        assert_eq!(child.depth(), 1);
        assert_eq!(child.behaviour(), UnexpectedFieldBehaviour::Ignore);
    }

    #[test]
    fn test_depth_limit() {
        let codec = constant(TypeDescriptor::bool(), Value::Bool(true));
        let root = ReadScope::root(UnexpectedFieldBehaviour::Throw, 1);
        let too_deep = root.child("a").child("b");

        let mut unpacker = Unpacker::new(&[0xc0]);
        let err = codec.deserialise_value(&mut unpacker, &too_deep).unwrap_err();
        assert!(matches!(
            err.as_deserialise().map(|e| &e.kind),
            Some(DeserialiseErrorKind::DepthLimitExceeded { limit: 1 })
        ));
    }

    #[test]
    fn test_unresolved_deferred_is_internal() {
        let slot: DeferredSlot = Arc::new(OnceLock::new());
        let edge = CodecRef::Deferred {
            descriptor: TypeDescriptor::record("Acme.Node"),
            slot: slot.clone(),
        };

        let mut packer = Packer::new();
        let err = edge.serialise(&Value::Null, &mut packer).unwrap_err();
        assert!(err.is_internal());

        let codec = constant(TypeDescriptor::record("Acme.Node"), Value::Null);
        slot.set(Arc::downgrade(&codec)).unwrap();
        edge.serialise(&Value::Null, &mut packer).unwrap();
        assert_eq!(packer.as_bytes(), &[0xc0]);
    }

    #[test]
    fn test_poisoned_routine_fails() {
        let edge = CodecRef::Poisoned(TypeDescriptor::Decimal);
        let root = ReadScope::root(UnexpectedFieldBehaviour::Throw, 8);
        let err = edge.deserialise(&mut Unpacker::new(&[0xc0]), &root).unwrap_err();
        let expected = InternalError::PoisonedRoutine { descriptor: TypeDescriptor::Decimal };
        assert_eq!(err, CodecError::Internal(expected));
    }
}
