//! Tagged unions as `[tag, value]` arrays
//!
//! The tag is the canonical type tag of the held alternative (see
//! [`type_tag`]). The provider encodes its own nullability: a nullable union
//! is `nil` when absent, and under [`UnexpectedFieldBehaviour::Ignore`] an
//! unrecognised tag reads as absent instead of failing.

use packwright_types::{TypeCatalog, TypeDescriptor, Value};
use tracing::warn;

use super::TypeProvider;
use crate::behaviour::UnexpectedFieldBehaviour;
use crate::codec::{deserialiser, serialiser, CodecRef, DeserialiseFn, SerialiseFn};
use crate::compose::Composer;
use crate::error::{
    CompileError, CompileResult, DeserialiseErrorKind, InternalError, SerialiseError,
};
use crate::path::PathSegment;
use crate::tag::type_tag;

pub struct UnionProvider;

const UNION_ARITY: u32 = 2;

/// Declared alternatives and whether the union itself is nullable
fn shape(descriptor: &TypeDescriptor) -> Option<(&[TypeDescriptor], bool)> {
    match descriptor {
        TypeDescriptor::Union(alternatives) => Some((alternatives, false)),
        TypeDescriptor::Nullable(inner) => match inner.as_ref() {
            TypeDescriptor::Union(alternatives) => Some((alternatives, true)),
            _ => None,
        },
        _ => None,
    }
}

struct Alternative {
    descriptor: TypeDescriptor,
    tag: String,
    codec: CodecRef,
}

impl UnionProvider {
    fn alternatives(
        &self,
        descriptor: &TypeDescriptor,
        composer: &mut Composer<'_>,
    ) -> CompileResult<(Vec<Alternative>, bool)> {
        let (declared, nullable) =
            shape(descriptor).ok_or_else(|| CompileError::unsupported(descriptor))?;
        let alternatives = declared
            .iter()
            .map(|alternative| Alternative {
                descriptor: alternative.clone(),
                tag: type_tag(alternative),
                codec: composer.indirect_element(alternative),
            })
            .collect();
        Ok((alternatives, nullable))
    }
}

impl TypeProvider for UnionProvider {
    fn name(&self) -> &'static str {
        "Union"
    }

    fn can_provide(&self, descriptor: &TypeDescriptor, _catalog: &TypeCatalog) -> bool {
        shape(descriptor).is_some_and(|(alternatives, _)| alternatives.len() >= 2)
    }

    fn uses_default_null_handling(&self, _descriptor: &TypeDescriptor) -> bool {
        false
    }

    fn emit_serialiser(
        &self,
        descriptor: &TypeDescriptor,
        composer: &mut Composer<'_>,
    ) -> CompileResult<SerialiseFn> {
        let (alternatives, nullable) = self.alternatives(descriptor, composer)?;
        let descriptor = descriptor.clone();

        Ok(serialiser(move |value, packer| {
            let union = match value {
                Value::Null if nullable => return Ok(packer.write_nil()?),
                Value::Union(union) => union,
                other => return Err(SerialiseError::mismatch(&descriptor, other).into()),
            };

            let Some(alternative) =
                alternatives.iter().find(|a| &a.descriptor == union.alternative())
            else {
                return Err(InternalError::UnionAlternativeNotDeclared {
                    union: descriptor.clone(),
                    alternative: union.alternative().clone(),
                }
                .into());
            };

            packer.write_array_header(UNION_ARITY as usize)?;
            packer.write_string(&alternative.tag)?;
            alternative
                .codec
                .serialise(union.value(), packer)
                .map_err(|err| err.at(PathSegment::Alternative(alternative.tag.clone())))
        }))
    }

    fn emit_deserialiser(
        &self,
        descriptor: &TypeDescriptor,
        composer: &mut Composer<'_>,
    ) -> CompileResult<DeserialiseFn> {
        let (alternatives, nullable) = self.alternatives(descriptor, composer)?;
        let descriptor = descriptor.clone();

        Ok(deserialiser(move |unpacker, scope| {
            if nullable && unpacker.try_read_nil() {
                return Ok(Value::Null);
            }

            let actual = unpacker.peek_format();
            let Some(count) = unpacker.try_read_array_header() else {
                let kind = DeserialiseErrorKind::ExpectedUnionArray { actual };
                return Err(scope.fail(&descriptor, kind));
            };
            if count != UNION_ARITY {
                let kind = DeserialiseErrorKind::UnionArityMismatch { actual: count };
                return Err(scope.fail(&descriptor, kind));
            }

            let actual = unpacker.peek_format();
            let Some(tag) = unpacker.try_read_string() else {
                let kind = DeserialiseErrorKind::UnionTagNotString { actual };
                return Err(scope.fail(&descriptor, kind));
            };

            match alternatives.iter().find(|a| a.tag == tag) {
                Some(alternative) => {
                    let value = alternative
                        .codec
                        .deserialise(unpacker, &scope.child(scope.name()))
                        .map_err(|err| err.at(PathSegment::Alternative(alternative.tag.clone())))?;
                    Ok(Value::union(alternative.descriptor.clone(), value))
                }
                None if nullable && scope.behaviour() == UnexpectedFieldBehaviour::Ignore => {
                    warn!(
                        name = scope.name(),
                        union = %descriptor,
                        tag,
                        "Ignoring unrecognised union tag"
                    );
                    unpacker.skip_value().map_err(|err| {
                        let kind = DeserialiseErrorKind::Malformed { reason: err.to_string() };
                        scope.fail(&descriptor, kind)
                    })?;
                    Ok(Value::Null)
                }
                None => Err(scope.fail(
                    &descriptor,
                    DeserialiseErrorKind::UnmatchedUnionTag { received: tag.to_owned() },
                )),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{Packer, WireFormat};
    use crate::CodecContext;

    fn int_or_string() -> TypeDescriptor {
        TypeDescriptor::union([TypeDescriptor::i32(), TypeDescriptor::string()])
    }

    fn read_kind(descriptor: &TypeDescriptor, bytes: &[u8]) -> DeserialiseErrorKind {
        let context = CodecContext::new(TypeCatalog::new());
        let err = context.codec(descriptor).unwrap().deserialise_slice(bytes).unwrap_err();
        err.as_deserialise().unwrap().kind.clone()
    }

    #[test]
    fn test_needs_two_alternatives() {
        let catalog = TypeCatalog::new();
        let single = TypeDescriptor::union([TypeDescriptor::i32()]);
        assert!(!UnionProvider.can_provide(&single, &catalog));
        assert!(UnionProvider.can_provide(&int_or_string(), &catalog));
        assert!(UnionProvider.can_provide(&TypeDescriptor::nullable(int_or_string()), &catalog));
    }

    #[test]
    fn test_shape_errors() {
        let ty = int_or_string();
        assert_eq!(
            read_kind(&ty, &[0x07]),
            DeserialiseErrorKind::ExpectedUnionArray { actual: WireFormat::Integer }
        );
        assert_eq!(
            read_kind(&ty, &[0x91, 0x07]),
            DeserialiseErrorKind::UnionArityMismatch { actual: 1 }
        );
        assert_eq!(
            read_kind(&ty, &[0x92, 0x07, 0x07]),
            DeserialiseErrorKind::UnionTagNotString { actual: WireFormat::Integer }
        );
    }

    #[test]
    fn test_undeclared_alternative_is_internal() {
        let context = CodecContext::new(TypeCatalog::new());
        let codec = context.codec(&int_or_string()).unwrap();
        let err = codec.serialise_to_vec(&Value::union(TypeDescriptor::bool(), true)).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_nullable_union_ignores_unknown_tag() {
        let context = CodecContext::new(TypeCatalog::new());
        let ty = TypeDescriptor::nullable(int_or_string());
        let codec = context.get_or_compile(&ty, UnexpectedFieldBehaviour::Ignore).unwrap();

        let mut packer = Packer::new();
        packer.write_array_header(2).unwrap();
        packer.write_string("Acme.Future").unwrap();
        packer.write_map_header(1).unwrap();
        packer.write_string("x").unwrap();
        packer.write_int(1).unwrap();

        assert_eq!(codec.deserialise_slice(packer.as_bytes()).unwrap(), Value::Null);
        assert_eq!(codec.serialise_to_vec(&Value::Null).unwrap(), vec![0xc0]);
    }
}
