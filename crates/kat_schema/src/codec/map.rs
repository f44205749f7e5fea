use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::hash::BuildHasher;
use core::marker::PhantomData;
use std::collections::HashMap;

use crate::access::ElementCodec;
use crate::builder::{Assembly, Builder, Context};
use crate::chan::Chan;
use crate::codec::{Codec, Shape, Token, downcast, nested, read_or_zero, write_entry};
use crate::error::{CodecError, ProtocolError, SchemaError};
use crate::info::{Object, TypeInfo, Typed};
use crate::registry::Registry;

// -----------------------------------------------------------------------------
// StringMap

/// A map keyed by `String`, read and written as an object.
pub trait StringMap: Typed + Send + Sync + Default {
    type Value: Typed + Send + Sync;

    fn insert_entry(&mut self, key: String, value: Self::Value);

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &Self::Value)> + '_>;
}

impl<V, S> StringMap for HashMap<String, V, S>
where
    V: Typed + Send + Sync,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    type Value = V;

    #[inline]
    fn insert_entry(&mut self, key: String, value: V) {
        self.insert(key, value);
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &V)> + '_> {
        Box::new(self.iter().map(|(key, value)| (key.as_str(), value)))
    }
}

impl<V: Typed + Send + Sync> StringMap for BTreeMap<String, V> {
    type Value = V;

    #[inline]
    fn insert_entry(&mut self, key: String, value: V) {
        self.insert(key, value);
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &V)> + '_> {
        Box::new(self.iter().map(|(key, value)| (key.as_str(), value)))
    }
}

// -----------------------------------------------------------------------------
// MapCodec

/// The codec of a [`StringMap`].
pub struct MapCodec<M> {
    element: ElementCodec,
    _marker: PhantomData<fn() -> M>,
}

impl<M: StringMap> MapCodec<M> {
    #[inline]
    pub fn new(element: Option<Arc<dyn Codec>>) -> Self {
        Self {
            element: ElementCodec::new(element),
            _marker: PhantomData,
        }
    }

    pub fn synthesize(_: &Registry) -> Result<Arc<dyn Codec>, SchemaError> {
        Ok(Arc::new(Self::new(None)))
    }
}

impl<M: StringMap> Codec for MapCodec<M> {
    #[inline]
    fn info(&self) -> &'static TypeInfo {
        M::type_info()
    }

    #[inline]
    fn shape(&self) -> Shape {
        Shape::Object
    }

    fn builder(&self, cx: &Context) -> Result<Builder, CodecError> {
        let element = self.element.resolve(cx.registry(), M::Value::type_info())?;
        Ok(Builder::new(MapAssembly::<M> {
            element: element.clone(),
            map: M::default(),
            pending: None,
        }))
    }

    fn write(&self, chan: &mut dyn Chan, value: &dyn Object) -> Result<(), CodecError> {
        let map = downcast::<M>(value)?;
        let element = self.element.resolve(chan.registry(), M::Value::type_info())?;

        chan.open(Shape::Object)?;
        for (key, value) in map.entries() {
            write_entry(chan, Some(key), Some(element), value)?;
        }
        chan.close()
    }

    #[inline]
    fn zero(&self) -> Option<Box<dyn Object>> {
        Some(Box::new(M::default()))
    }
}

// -----------------------------------------------------------------------------
// MapAssembly

struct MapAssembly<M> {
    element: Arc<dyn Codec>,
    map: M,
    pending: Option<String>,
}

fn key(alias: Option<&str>, index: Option<usize>) -> Result<String, CodecError> {
    match (alias, index) {
        (Some(alias), _) => Ok(alias.into()),
        (None, Some(index)) => Ok(index.to_string()),
        (None, None) => Err(CodecError::Custom("map entry without a key".into())),
    }
}

impl<M: StringMap> Assembly for MapAssembly<M> {
    fn on_emit(
        &mut self,
        cx: &Context,
        alias: Option<&str>,
        index: Option<usize>,
        token: Token<'_>,
    ) -> Result<(), CodecError> {
        let key = key(alias, index)?;
        if let Some(value) = read_or_zero(&*self.element, cx, token, false)? {
            self.map.insert_entry(key, M::Value::take(value)?);
        }
        Ok(())
    }

    fn on_open(
        &mut self,
        cx: &Context,
        alias: Option<&str>,
        index: Option<usize>,
        space: Option<&str>,
    ) -> Result<Option<Builder>, CodecError> {
        let key = key(alias, index)?;
        let child = nested(cx, &self.element, space)?;
        if child.is_some() {
            self.pending = Some(key);
        }
        Ok(child)
    }

    fn on_child(&mut self, _: &Context, value: Box<dyn Object>) -> Result<(), CodecError> {
        let key = self.pending.take().ok_or(ProtocolError::NotOpen)?;
        self.map.insert_entry(key, M::Value::take(value)?);
        Ok(())
    }

    fn build(self: Box<Self>, _: &Context) -> Result<Box<dyn Object>, CodecError> {
        Ok(Box::new(self.map))
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use std::collections::HashMap;

    use crate::Flags;
    use crate::chan::{Event, Tape};
    use crate::info::Typed;
    use crate::registry::Registry;

    #[test]
    fn btree_round_trip() {
        let registry = Registry::global();
        let mut value = BTreeMap::new();
        value.insert(String::from("b"), 2_i64);
        value.insert(String::from("a"), 1_i64);

        let tape = Tape::record(registry, Flags::empty(), &value).unwrap();
        assert_eq!(tape.aliases(), ["a", "b"]);

        let codec = registry.resolve(<BTreeMap<String, i64>>::type_info()).unwrap();
        let mut driver = registry.driver(Flags::empty());
        let read = tape.replay(&mut driver, &*codec).unwrap();
        assert_eq!(read.downcast_ref::<BTreeMap<String, i64>>(), Some(&value));
    }

    #[test]
    fn hash_map_of_lists() {
        let registry = Registry::global();
        let mut value: HashMap<String, Vec<u8>> = HashMap::new();
        value.insert(String::from("k"), vec![1, 2]);

        let tape = Tape::record(registry, Flags::empty(), &value).unwrap();
        assert!(matches!(tape.events()[1], Event::Open { ref alias, .. } if alias.as_deref() == Some("k")));

        let codec = registry.resolve(<HashMap<String, Vec<u8>>>::type_info()).unwrap();
        let mut driver = registry.driver(Flags::empty());
        let read = tape.replay(&mut driver, &*codec).unwrap();
        assert_eq!(read.downcast_ref::<HashMap<String, Vec<u8>>>(), Some(&value));
    }
}
