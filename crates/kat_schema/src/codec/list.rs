use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::access::ElementCodec;
use crate::builder::{Assembly, Builder, Context};
use crate::chan::Chan;
use crate::codec::{Codec, Shape, Token, downcast, nested, read_or_zero, write_entry};
use crate::error::{CodecError, SchemaError};
use crate::info::{Object, TypeInfo, Typed};
use crate::registry::Registry;

// -----------------------------------------------------------------------------
// ListCodec

/// The codec of `Vec<X>`.
pub struct ListCodec<X> {
    element: ElementCodec,
    _marker: PhantomData<fn() -> X>,
}

impl<X: Typed + Send + Sync> ListCodec<X> {
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

impl<X: Typed + Send + Sync> Codec for ListCodec<X> {
    #[inline]
    fn info(&self) -> &'static TypeInfo {
        <Vec<X>>::type_info()
    }

    #[inline]
    fn shape(&self) -> Shape {
        Shape::Sequence
    }

    fn builder(&self, cx: &Context) -> Result<Builder, CodecError> {
        let element = self.element.resolve(cx.registry(), X::type_info())?;
        Ok(Builder::new(ListAssembly::<X> {
            element: element.clone(),
            items: Vec::new(),
        }))
    }

    fn write(&self, chan: &mut dyn Chan, value: &dyn Object) -> Result<(), CodecError> {
        let items = downcast::<Vec<X>>(value)?;
        let element = self.element.resolve(chan.registry(), X::type_info())?;

        chan.open(Shape::Sequence)?;
        for item in items {
            write_entry(chan, None, Some(element), item)?;
        }
        chan.close()
    }

    #[inline]
    fn zero(&self) -> Option<Box<dyn Object>> {
        Some(Box::new(Vec::<X>::new()))
    }
}

// -----------------------------------------------------------------------------
// ListAssembly

struct ListAssembly<X> {
    element: Arc<dyn Codec>,
    items: Vec<X>,
}

impl<X: Typed + Send + Sync> Assembly for ListAssembly<X> {
    fn on_emit(
        &mut self,
        cx: &Context,
        _: Option<&str>,
        _: Option<usize>,
        token: Token<'_>,
    ) -> Result<(), CodecError> {
        if let Some(value) = read_or_zero(&*self.element, cx, token, false)? {
            self.items.push(X::take(value)?);
        }
        Ok(())
    }

    fn on_open(
        &mut self,
        cx: &Context,
        _: Option<&str>,
        _: Option<usize>,
        space: Option<&str>,
    ) -> Result<Option<Builder>, CodecError> {
        nested(cx, &self.element, space)
    }

    fn on_child(&mut self, _: &Context, value: Box<dyn Object>) -> Result<(), CodecError> {
        self.items.push(X::take(value)?);
        Ok(())
    }

    fn build(self: Box<Self>, _: &Context) -> Result<Box<dyn Object>, CodecError> {
        Ok(Box::new(self.items))
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::Flags;
    use crate::chan::Tape;
    use crate::info::Typed;
    use crate::registry::Registry;

    #[test]
    fn round_trip() {
        let registry = Registry::global();
        let value = vec![vec![String::from("a")], Vec::new(), vec![String::from("b"), String::from("c")]];

        let tape = Tape::record(registry, Flags::empty(), &value).unwrap();
        let codec = registry.resolve(<Vec<Vec<String>>>::type_info()).unwrap();
        let mut driver = registry.driver(Flags::empty());
        let read = tape.replay(&mut driver, &*codec).unwrap();

        assert_eq!(read.downcast_ref::<Vec<Vec<String>>>(), Some(&value));
    }

    #[test]
    fn bad_elements_are_zero() {
        let registry = Registry::global();
        let codec = registry.resolve(<Vec<u8>>::type_info()).unwrap();

        let mut driver = registry.driver(Flags::empty());
        driver.begin(&*codec).unwrap();
        driver.emit(None, Some(0), crate::codec::Token::str("x")).unwrap();
        driver.emit(None, Some(1), crate::codec::Token::UInt(9)).unwrap();
        driver.close().unwrap();

        assert_eq!(driver.finish_as::<Vec<u8>>().unwrap(), [0, 9]);
    }

    #[test]
    fn options() {
        let registry = Registry::global();
        let value = vec![Some(1_i32), None, Some(3)];

        let tape = Tape::record(registry, Flags::empty(), &value).unwrap();
        let codec = registry.resolve(<Vec<Option<i32>>>::type_info()).unwrap();
        let mut driver = registry.driver(Flags::empty());
        let read = tape.replay(&mut driver, &*codec).unwrap();

        assert_eq!(read.downcast_ref::<Vec<Option<i32>>>(), Some(&value));
    }
}
