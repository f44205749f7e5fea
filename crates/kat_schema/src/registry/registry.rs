use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp::Reverse;
use core::fmt;
use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use kat_utils::TypeIdMap;
use kat_utils::hash::HashMap;

use crate::builder::{Context, Driver, Lease};
use crate::codec::Codec;
use crate::error::{ResolutionError, SchemaError};
use crate::info::{TypeInfo, TypeKind};
use crate::registry::{DefaultProvider, Lookup, Provider};
use crate::{Flags, Pool};

#[inline]
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

#[inline]
fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

// -----------------------------------------------------------------------------
// Registry

/// Maps types to their codecs.
///
/// Codecs are built on the first lookup of a type, by the first provider
/// answering [`Lookup::Hit`], and cached until [`revoke`](Self::revoke)d.
/// Lookups of cached codecs only take a read lock. Providers run with no
/// lock held, so two threads may build the same codec at once, in which
/// case the last one is kept.
///
/// A type whose provider failed is poisoned: it keeps failing with the
/// same [`SchemaError`] until [`retry`](Self::retry).
///
/// # Examples
///
/// ```
/// use kat_schema::info::Typed;
/// use kat_schema::registry::RegistryBuilder;
///
/// let registry = RegistryBuilder::new().build();
/// let codec = registry.resolve(<Vec<String>>::type_info()).unwrap();
///
/// assert!(codec.info().is::<Vec<String>>());
/// assert!(registry.contains(<Vec<String>>::type_info()));
/// ```
pub struct Registry {
    major: RwLock<TypeIdMap<Arc<dyn Codec>>>,
    minor: RwLock<HashMap<Box<str>, &'static TypeInfo>>,
    poisoned: RwLock<TypeIdMap<SchemaError>>,
    providers: Box<[Arc<dyn Provider>]>,
    drivers: Pool<Driver>,
}

impl Registry {
    fn with_providers(providers: Box<[Arc<dyn Provider>]>) -> Self {
        Self {
            major: RwLock::new(TypeIdMap::new()),
            minor: RwLock::new(HashMap::default()),
            poisoned: RwLock::new(TypeIdMap::new()),
            providers,
            drivers: Pool::new(),
        }
    }

    /// The process-wide registry, built with [`RegistryBuilder::new`] on
    /// first use.
    pub fn global() -> &'static Arc<Registry> {
        static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(RegistryBuilder::new().build()))
    }

    /// Returns the codec of `info`, building it on first use.
    #[inline]
    pub fn try_resolve(&self, info: &'static TypeInfo) -> Result<Arc<dyn Codec>, ResolutionError> {
        self.lookup(info, None)
    }

    /// Like [`try_resolve`](Self::try_resolve), with the discriminator a
    /// value was read with.
    ///
    /// When `hint` names a subtype of `info`, the subtype is resolved
    /// instead. Any other hint is ignored.
    pub fn try_resolve_with(
        &self,
        info: &'static TypeInfo,
        hint: Option<&str>,
    ) -> Result<Arc<dyn Codec>, ResolutionError> {
        if let Some(space) = hint
            && let Some(subtype) = self.subtype(info, space)
            && subtype != info
        {
            return self.lookup(subtype, hint);
        }
        self.lookup(info, hint)
    }

    /// Returns the codec of `info`, or `None` on any failure.
    #[inline]
    pub fn resolve(&self, info: &'static TypeInfo) -> Option<Arc<dyn Codec>> {
        self.try_resolve(info).ok()
    }

    #[inline]
    pub fn resolve_with(&self, info: &'static TypeInfo, hint: Option<&str>) -> Option<Arc<dyn Codec>> {
        self.try_resolve_with(info, hint).ok()
    }

    fn lookup(&self, info: &'static TypeInfo, hint: Option<&str>) -> Result<Arc<dyn Codec>, ResolutionError> {
        let id = info.type_id();
        let ty = info.type_path();

        if let Some(codec) = read(&self.major).get(&id) {
            return Ok(codec.clone());
        }
        if let Some(error) = read(&self.poisoned).get(&id) {
            return Err(ResolutionError::Schema {
                ty,
                error: error.clone(),
            });
        }

        for provider in self.providers.iter() {
            match provider.try_resolve(info, hint, self) {
                Ok(Lookup::Hit(codec)) => {
                    log::debug!("synthesized the codec of `{ty}`");
                    self.insert(info, codec.clone());
                    return Ok(codec);
                }
                Ok(Lookup::Miss) => {}
                Ok(Lookup::Veto) => {
                    log::debug!("codec lookup for `{ty}` vetoed");
                    return Err(ResolutionError::Vetoed(ty));
                }
                Err(error) => {
                    log::warn!("failed to build the schema of `{ty}`: {error}");
                    write(&self.poisoned).insert(id, error.clone());
                    return Err(ResolutionError::Schema { ty, error });
                }
            }
        }

        Err(ResolutionError::NotFound(ty))
    }

    fn insert(&self, info: &'static TypeInfo, codec: Arc<dyn Codec>) -> Option<Arc<dyn Codec>> {
        if info.kind() == TypeKind::Structure {
            let mut minor = write(&self.minor);
            minor.entry(info.space().into()).or_insert(info);
            for space in info.spaces() {
                minor.entry((*space).into()).or_insert(info);
            }
        }
        write(&self.major).insert(info.type_id(), codec)
    }

    /// Returns the type named `space` if it may stand in for `info`.
    pub fn subtype(&self, info: &TypeInfo, space: &str) -> Option<&'static TypeInfo> {
        let subtype = *read(&self.minor).get(space)?;
        subtype.is_subtype_of(info).then_some(subtype)
    }

    /// Binds `codec` to `info`, returning the previous binding.
    ///
    /// Also clears a poisoned build of `info`.
    pub fn register(&self, info: &'static TypeInfo, codec: Arc<dyn Codec>) -> Option<Arc<dyn Codec>> {
        write(&self.poisoned).remove(&info.type_id());
        log::debug!("registered a codec for `{}`", info.type_path());
        self.insert(info, codec)
    }

    /// Removes the codec of `info`.
    ///
    /// With `expected`, the codec is only removed if it is that very codec.
    pub fn revoke(&self, info: &TypeInfo, expected: Option<&Arc<dyn Codec>>) -> Option<Arc<dyn Codec>> {
        let id = info.type_id();
        let mut major = write(&self.major);
        let removed = match expected {
            Some(expected) => major.remove_if(&id, |codec| {
                core::ptr::addr_eq(Arc::as_ptr(codec), Arc::as_ptr(expected))
            }),
            None => major.remove(&id),
        };
        if removed.is_some() {
            log::debug!("revoked the codec of `{}`", info.type_path());
        }
        removed
    }

    /// Makes `name` a discriminator of `info`, returning the type it named
    /// before.
    pub fn embed(&self, name: &str, info: &'static TypeInfo) -> Option<&'static TypeInfo> {
        write(&self.minor).insert(name.into(), info)
    }

    /// Clears a poisoned build of `info`, returning `true` if it was.
    pub fn retry(&self, info: &TypeInfo) -> bool {
        write(&self.poisoned).remove(&info.type_id()).is_some()
    }

    /// Returns `true` if a codec of `info` is cached.
    #[inline]
    pub fn contains(&self, info: &TypeInfo) -> bool {
        read(&self.major).contains(&info.type_id())
    }

    /// Number of cached codecs.
    #[inline]
    pub fn cached_len(&self) -> usize {
        read(&self.major).len()
    }

    /// Borrows a driver ready to parse with `flags`.
    ///
    /// The registry keeps one driver around. While it is borrowed, further
    /// calls return a freshly allocated driver.
    pub fn driver(self: &Arc<Self>, flags: Flags) -> Lease<'_> {
        let context = Context::new(self.clone(), flags);
        match self.drivers.acquire() {
            Some(mut driver) => {
                driver.reset(Some(context));
                Lease::Pooled(driver)
            }
            None => {
                log::debug!("pooled driver is busy, allocating one");
                Lease::Fresh(Driver::new(context))
            }
        }
    }
}

impl Default for Registry {
    /// See [`RegistryBuilder::new`].
    #[inline]
    fn default() -> Self {
        RegistryBuilder::new().build()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("cached", &self.cached_len())
            .field("providers", &self.providers.len())
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// RegistryBuilder

/// Assembles a [`Registry`].
///
/// By default the registry asks the given providers, then those submitted
/// with [`submit_provider!`](crate::submit_provider), then the
/// [`DefaultProvider`]. Providers with equal grades keep that order.
pub struct RegistryBuilder {
    providers: Vec<Arc<dyn Provider>>,
    spaces: Vec<(Box<str>, &'static TypeInfo)>,
    default_provider: bool,
    #[cfg_attr(not(feature = "auto_register"), allow(dead_code))]
    auto_register: bool,
}

impl RegistryBuilder {
    #[inline]
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            spaces: Vec::new(),
            default_provider: true,
            auto_register: true,
        }
    }

    #[inline]
    pub fn provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// See [`Registry::embed`].
    #[inline]
    pub fn embed(mut self, name: &str, info: &'static TypeInfo) -> Self {
        self.spaces.push((name.into(), info));
        self
    }

    /// Leaves out the [`DefaultProvider`], so only the given providers
    /// build codecs.
    #[inline]
    pub fn without_default_provider(mut self) -> Self {
        self.default_provider = false;
        self
    }

    /// Ignores providers and types submitted through `inventory`.
    #[inline]
    pub fn without_auto_register(mut self) -> Self {
        self.auto_register = false;
        self
    }

    pub fn build(self) -> Registry {
        let mut providers = self.providers;

        #[cfg(feature = "auto_register")]
        if self.auto_register {
            use crate::registry::ProviderEntry;
            providers.extend(inventory::iter::<ProviderEntry>.into_iter().map(|entry| (entry.0)()));
        }

        if self.default_provider {
            providers.push(Arc::new(DefaultProvider));
        }
        providers.retain(|provider| provider.alive());
        providers.sort_by_key(|provider| Reverse(provider.grade()));

        let registry = Registry::with_providers(providers.into_boxed_slice());

        #[cfg(feature = "auto_register")]
        if self.auto_register {
            use crate::registry::TypeEntry;
            for entry in inventory::iter::<TypeEntry> {
                let info = (entry.0)();
                registry.embed(info.space(), info);
                for space in info.spaces() {
                    registry.embed(space, info);
                }
            }
        }

        for (name, info) in self.spaces {
            registry.embed(&name, info);
        }
        registry
    }
}

impl Default for RegistryBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("providers", &self.providers.len())
            .field("default_provider", &self.default_provider)
            .field("auto_register", &self.auto_register)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::sync::Arc;
    use alloc::vec::Vec;

    use super::{Registry, RegistryBuilder};
    use crate::codec::{Codec, ScalarCodec, Shape};
    use crate::error::{ResolutionError, SchemaError};
    use crate::info::{Object, TypeInfo, Typed};
    use crate::registry::{Lookup, Provider};
    use crate::schema::{Describe, Expose, SchemaBuilder};

    #[derive(Default)]
    struct Gauge {
        id: i64,
    }

    crate::impls::impl_structure!(Gauge, "Gauge");

    impl Describe for Gauge {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .field("id", |p| &p.id, |p| &mut p.id, Expose::new())
                .default_with(Gauge::default);
        }
    }

    #[derive(Default)]
    struct Shape2D;

    crate::impls::impl_structure!(Shape2D, "Shape2D", spaces = ["shape"]);

    impl Describe for Shape2D {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema.default_with(Shape2D::default);
        }
    }

    #[derive(Default)]
    struct Circle;

    crate::impls::impl_structure!(Circle, "Circle", spaces = ["circle"], parents = [Shape2D]);

    impl Describe for Circle {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema.default_with(Circle::default);
        }
    }

    struct Broken;

    crate::impls::impl_structure!(Broken, "Broken");

    impl Describe for Broken {
        fn describe(_: &mut SchemaBuilder<Self>) {}
    }

    fn isolated() -> Registry {
        RegistryBuilder::new().without_auto_register().build()
    }

    #[test]
    fn concurrent_resolution() {
        let registry = isolated();
        let info = Gauge::type_info();

        let codecs: Vec<Arc<dyn Codec>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| registry.try_resolve(info))).collect();
            handles.into_iter().map(|handle| handle.join().unwrap().unwrap()).collect()
        });

        assert_eq!(codecs.len(), 8);
        for codec in &codecs {
            assert!(codec.info().is::<Gauge>());
            assert_eq!(codec.shape(), Shape::Object);
        }
        assert_eq!(registry.cached_len(), 1);
    }

    #[test]
    fn revoke_compares_identity() {
        let registry = isolated();
        let info = i64::type_info();

        let first: Arc<dyn Codec> = Arc::new(ScalarCodec::<i64>::new());
        let other: Arc<dyn Codec> = Arc::new(ScalarCodec::<i64>::new());
        assert!(registry.register(info, first.clone()).is_none());

        assert!(registry.revoke(info, Some(&other)).is_none());
        assert!(registry.contains(info));
        assert!(registry.revoke(info, Some(&first)).is_some());
        assert!(!registry.contains(info));
        assert!(registry.revoke(info, None).is_none());
    }

    struct Picky;

    impl Provider for Picky {
        fn grade(&self) -> i32 {
            5
        }

        fn try_resolve(&self, info: &'static TypeInfo, _: Option<&str>, _: &Registry) -> Result<Lookup, SchemaError> {
            if info.is::<u8>() {
                Ok(Lookup::Veto)
            } else if info.is::<i64>() {
                Ok(Lookup::Hit(Arc::new(ScalarCodec::<i64>::new())))
            } else {
                Ok(Lookup::Miss)
            }
        }
    }

    struct Dead;

    impl Provider for Dead {
        fn alive(&self) -> bool {
            false
        }

        fn try_resolve(&self, _: &'static TypeInfo, _: Option<&str>, _: &Registry) -> Result<Lookup, SchemaError> {
            Ok(Lookup::Veto)
        }
    }

    #[test]
    fn provider_chain() {
        let registry = RegistryBuilder::new()
            .provider(Arc::new(Dead))
            .provider(Arc::new(Picky))
            .without_auto_register()
            .build();

        assert_eq!(
            registry.try_resolve(u8::type_info()).err(),
            Some(ResolutionError::Vetoed(u8::type_info().type_path()))
        );
        assert!(registry.resolve(i64::type_info()).is_some());
        assert!(registry.resolve(bool::type_info()).is_some());

        let bare = RegistryBuilder::new()
            .without_default_provider()
            .without_auto_register()
            .build();
        assert_eq!(
            bare.try_resolve(bool::type_info()).err(),
            Some(ResolutionError::NotFound(bool::type_info().type_path()))
        );
    }

    #[test]
    fn hint_selects_subtype() {
        let registry = isolated();
        registry.embed("circle", Circle::type_info());
        registry.embed("gauge", Gauge::type_info());

        let codec = registry.try_resolve_with(Shape2D::type_info(), Some("circle")).unwrap();
        assert!(codec.info().is::<Circle>());

        // Not a subtype, the hint is ignored.
        let codec = registry.try_resolve_with(Shape2D::type_info(), Some("gauge")).unwrap();
        assert!(codec.info().is::<Shape2D>());

        let codec = registry.try_resolve_with(<Box<dyn Object>>::type_info(), Some("gauge")).unwrap();
        assert!(codec.info().is::<Gauge>());

        assert!(registry.subtype(Shape2D::type_info(), "missing").is_none());
    }

    #[test]
    fn resolution_embeds_spaces() {
        let registry = isolated();
        assert!(registry.subtype(Shape2D::type_info(), "shape").is_none());

        registry.resolve(Shape2D::type_info()).unwrap();
        assert_eq!(registry.subtype(Shape2D::type_info(), "shape"), Some(Shape2D::type_info()));
    }

    #[test]
    fn poison_and_retry() {
        let registry = isolated();
        let info = Broken::type_info();
        let expected = ResolutionError::Schema {
            ty: info.type_path(),
            error: SchemaError::NoConstructor(info.type_path()),
        };

        assert_eq!(registry.try_resolve(info).err(), Some(expected.clone()));
        assert_eq!(registry.try_resolve(info).err(), Some(expected));

        assert!(registry.retry(info));
        assert!(!registry.retry(info));
        assert!(registry.resolve(info).is_none());
    }

    #[test]
    fn pooled_driver() {
        let registry = Arc::new(isolated());

        let first = registry.driver(Default::default());
        assert!(matches!(first, crate::builder::Lease::Pooled(_)));
        let second = registry.driver(Default::default());
        assert!(matches!(second, crate::builder::Lease::Fresh(_)));

        drop(first);
        drop(second);
        assert!(matches!(registry.driver(Default::default()), crate::builder::Lease::Pooled(_)));
    }
}
