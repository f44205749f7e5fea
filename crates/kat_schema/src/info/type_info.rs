use alloc::sync::Arc;
use core::any::TypeId;
use core::fmt;

use crate::codec::{Codec, SchemaCodec};
use crate::error::SchemaError;
use crate::registry::Registry;
use crate::schema::Describe;

/// Builds the codec of a type the first time a registry needs it.
pub type Synthesize = fn(&Registry) -> Result<Arc<dyn Codec>, SchemaError>;

// -----------------------------------------------------------------------------
// TypeKind

/// Coarse classification of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Read and written as a single token.
    Scalar,
    /// Described by a schema.
    Structure,
    /// An ordered collection.
    Sequence,
    /// A collection keyed by name.
    Map,
    /// `Option<T>`.
    Optional,
    /// `Box<dyn Object>`: the concrete type is only known at runtime.
    Dynamic,
}

// -----------------------------------------------------------------------------
// TypeInfo

/// Compile-time information of a type.
///
/// Created once per type through [`Typed::type_info`](crate::info::Typed::type_info)
/// and never mutated afterwards.
pub struct TypeInfo {
    type_id: TypeId,
    type_path: &'static str,
    type_name: &'static str,
    kind: TypeKind,
    spaces: &'static [&'static str],
    parents: &'static [fn() -> &'static TypeInfo],
    synthesize: Option<Synthesize>,
}

impl TypeInfo {
    /// Creates the info of `T` with no spaces, parents or codec.
    pub fn new<T: ?Sized + 'static>(type_name: &'static str, kind: TypeKind) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_path: core::any::type_name::<T>(),
            type_name,
            kind,
            spaces: &[],
            parents: &[],
            synthesize: None,
        }
    }

    /// Creates the info of a described structure, whose codec is built from
    /// its [`Schema`](crate::schema::Schema).
    pub fn structure<T: Describe>(type_name: &'static str) -> Self {
        Self::new::<T>(type_name, TypeKind::Structure).with_synthesize(SchemaCodec::<T>::synthesize)
    }

    /// Sets the alias names the type is also known by.
    ///
    /// The first space is written as the discriminator of dynamic values.
    #[inline]
    pub fn with_spaces(mut self, spaces: &'static [&'static str]) -> Self {
        self.spaces = spaces;
        self
    }

    /// Sets the types this type may stand in for.
    #[inline]
    pub fn with_parents(mut self, parents: &'static [fn() -> &'static TypeInfo]) -> Self {
        self.parents = parents;
        self
    }

    /// Sets the hook building the type's codec.
    #[inline]
    pub fn with_synthesize(mut self, synthesize: Synthesize) -> Self {
        self.synthesize = Some(synthesize);
        self
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Full path, as given by [`core::any::type_name`].
    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.type_path
    }

    /// Short name, such as `Vec` or `User`.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[inline]
    pub fn spaces(&self) -> &'static [&'static str] {
        self.spaces
    }

    /// The canonical discriminator: the first space, or the short name.
    #[inline]
    pub fn space(&self) -> &'static str {
        self.spaces.first().copied().unwrap_or(self.type_name)
    }

    #[inline]
    pub fn parents(&self) -> impl Iterator<Item = &'static TypeInfo> {
        self.parents.iter().map(|parent| parent())
    }

    #[inline]
    pub fn synthesize(&self) -> Option<Synthesize> {
        self.synthesize
    }

    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.kind == TypeKind::Dynamic
    }

    /// Returns `true` if a value of this type can be stored where `other`
    /// is expected.
    ///
    /// Holds for the type itself, any ancestor through its parents, and
    /// for every type when `other` is dynamic.
    pub fn is_subtype_of(&self, other: &TypeInfo) -> bool {
        other.is_dynamic()
            || self.type_id == other.type_id
            || self.parents().any(|parent| parent.is_subtype_of(other))
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("type_path", &self.type_path)
            .field("kind", &self.kind)
            .field("spaces", &self.spaces)
            .finish_non_exhaustive()
    }
}

impl PartialEq for TypeInfo {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeInfo {}
