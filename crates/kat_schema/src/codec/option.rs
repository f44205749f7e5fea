use alloc::boxed::Box;
use alloc::sync::Arc;
use core::marker::PhantomData;

use crate::access::ElementCodec;
use crate::builder::{Builder, Context};
use crate::chan::Chan;
use crate::codec::{Codec, Token, downcast};
use crate::error::{CodecError, SchemaError};
use crate::info::{Object, TypeInfo, Typed};
use crate::registry::Registry;

/// The codec of `Option<X>`: null is `None`, anything else is read by
/// `X`'s codec.
///
/// Values built by `X`'s builder are `X`s; [`Typed::take`] of `Option<X>`
/// wraps them.
pub struct OptionCodec<X> {
    element: ElementCodec,
    _marker: PhantomData<fn() -> X>,
}

impl<X: Typed + Send + Sync> OptionCodec<X> {
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

    #[inline]
    fn element(&self, registry: &Registry) -> Result<&Arc<dyn Codec>, CodecError> {
        Ok(self.element.resolve(registry, X::type_info())?)
    }
}

impl<X: Typed + Send + Sync> Codec for OptionCodec<X> {
    #[inline]
    fn info(&self) -> &'static TypeInfo {
        <Option<X>>::type_info()
    }

    fn read(&self, cx: &Context, token: Token<'_>) -> Result<Box<dyn Object>, CodecError> {
        if token.is_null() {
            return Ok(Box::new(None::<X>));
        }
        let value = self.element(cx.registry())?.read(cx, token)?;
        Ok(Box::new(Some(X::take(value)?)))
    }

    fn builder(&self, cx: &Context) -> Result<Builder, CodecError> {
        self.element(cx.registry())?.builder(cx)
    }

    fn write(&self, chan: &mut dyn Chan, value: &dyn Object) -> Result<(), CodecError> {
        match downcast::<Option<X>>(value)? {
            Some(inner) => {
                let element = self.element(chan.registry())?;
                element.write(chan, inner)
            }
            None => chan.emit(Token::Null),
        }
    }

    #[inline]
    fn zero(&self) -> Option<Box<dyn Object>> {
        Some(Box::new(None::<X>))
    }
}
