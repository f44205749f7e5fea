use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::access::Accessor;
use crate::codec::Codec;

// -----------------------------------------------------------------------------
// Expose

/// How a property is exposed.
///
/// | option                          | default |
/// |---------------------------------|---------|
/// | [`index`](Self::index)          | `-1`, natural order |
/// | [`alias`](Self::alias)          | none    |
/// | [`not_null`](Self::not_null)    | nulls are written |
/// | [`unwrapped`](Self::unwrapped)  | nested  |
/// | [`hidden`](Self::hidden)        | written |
/// | [`required`](Self::required)    | zero fallback on bad tokens |
/// | [`codec`](Self::codec)          | resolved from the declared type |
#[derive(Clone)]
pub struct Expose {
    pub(crate) index: i32,
    pub(crate) aliases: Vec<Box<str>>,
    pub(crate) nullable: bool,
    pub(crate) unwrapped: bool,
    pub(crate) hidden: bool,
    pub(crate) required: bool,
    pub(crate) codec: Option<Arc<dyn Codec>>,
}

impl Expose {
    #[inline]
    pub fn new() -> Self {
        Self {
            index: -1,
            aliases: Vec::new(),
            nullable: true,
            unwrapped: false,
            hidden: false,
            required: false,
            codec: None,
        }
    }

    /// Explicit position. Negative values below `-1` place the property
    /// after every other one.
    #[inline]
    pub fn index(mut self, index: i32) -> Self {
        self.index = index;
        self
    }

    /// Places the property after every other one.
    #[inline]
    pub fn last(self) -> Self {
        self.index(-2)
    }

    /// Another name accepted when reading.
    #[inline]
    pub fn alias(mut self, alias: impl Into<Box<str>>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Omits the property when its value is null.
    #[inline]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Writes the value's entries into the enclosing structure.
    #[inline]
    pub fn unwrapped(mut self) -> Self {
        self.unwrapped = true;
        self
    }

    /// Reads the property but never writes it.
    #[inline]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Fails the read when a token cannot be coerced.
    #[inline]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Uses `codec` instead of the declared type's.
    #[inline]
    pub fn codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = Some(codec);
        self
    }
}

impl Default for Expose {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Expose {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Expose")
            .field("index", &self.index)
            .field("aliases", &self.aliases)
            .field("nullable", &self.nullable)
            .field("unwrapped", &self.unwrapped)
            .field("hidden", &self.hidden)
            .field("required", &self.required)
            .field("codec", &self.codec.as_ref().map(|codec| codec.info().type_path()))
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Property

/// A written property of a [`Schema`](crate::schema::Schema).
pub struct Property {
    pub(crate) name: Box<str>,
    pub(crate) aliases: Box<[Box<str>]>,
    pub(crate) index: i32,
    pub(crate) grade: u32,
    pub(crate) nullable: bool,
    pub(crate) unwrapped: bool,
    pub(crate) required: bool,
    pub(crate) accessor: Arc<dyn Accessor>,
}

impl Property {
    /// The canonical name, used when writing.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn aliases(&self) -> &[Box<str>] {
        &self.aliases
    }

    #[inline]
    pub fn index(&self) -> i32 {
        self.index
    }

    /// Inheritance depth of the declaring type, `0` for the type itself.
    #[inline]
    pub fn grade(&self) -> u32 {
        self.grade
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[inline]
    pub fn is_unwrapped(&self) -> bool {
        self.unwrapped
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The accessor reading the property.
    #[inline]
    pub fn accessor(&self) -> &Arc<dyn Accessor> {
        &self.accessor
    }
}

impl core::fmt::Debug for Property {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("grade", &self.grade)
            .field("type", &self.accessor.info().type_path())
            .finish_non_exhaustive()
    }
}
