use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::builder::{Assembly, Builder, Context};
use crate::chan::Chan;
use crate::codec::{Codec, Shape, Token, nested, runtime};
use crate::error::{CodecError, SchemaError};
use crate::info::{Object, TypeInfo, Typed};
use crate::registry::Registry;

// -----------------------------------------------------------------------------
// ObjectCodec

/// The codec of `Box<dyn Object>`.
///
/// Writing delegates to the codec of the value's runtime type. Reading
/// without a discriminator maps tokens to their natural type:
///
/// | input          | value                               |
/// |----------------|-------------------------------------|
/// | null           | `()`                                |
/// | bool           | `bool`                              |
/// | integer        | `i64`, or `u64` past `i64::MAX`     |
/// | float          | `f64`                               |
/// | char           | `char`                              |
/// | string         | `String`                            |
/// | named entries  | `BTreeMap<String, Box<dyn Object>>` |
/// | other entries  | `Vec<Box<dyn Object>>`              |
#[derive(Debug, Default)]
pub struct ObjectCodec;

impl ObjectCodec {
    pub fn synthesize(_: &Registry) -> Result<Arc<dyn Codec>, SchemaError> {
        Ok(Arc::new(Self))
    }

    fn natural(token: Token<'_>) -> Box<dyn Object> {
        match token {
            Token::Null => Box::new(()),
            Token::Bool(v) => Box::new(v),
            Token::Int(v) => Box::new(v),
            Token::UInt(v) => match i64::try_from(v) {
                Ok(v) => Box::new(v),
                Err(_) => Box::new(v),
            },
            Token::Float(v) => Box::new(v),
            Token::Char(v) => Box::new(v),
            Token::Str(v) => Box::new(v.into_owned()),
        }
    }
}

impl Codec for ObjectCodec {
    #[inline]
    fn info(&self) -> &'static TypeInfo {
        <Box<dyn Object>>::type_info()
    }

    #[inline]
    fn shape(&self) -> Shape {
        Shape::Object
    }

    fn read(&self, _: &Context, token: Token<'_>) -> Result<Box<dyn Object>, CodecError> {
        Ok(Self::natural(token))
    }

    fn builder(&self, cx: &Context) -> Result<Builder, CodecError> {
        let codec = cx.registry().try_resolve(self.info())?;
        Ok(Builder::new(DynamicAssembly {
            codec,
            entries: Vec::new(),
            pending: None,
        }))
    }

    fn write(&self, chan: &mut dyn Chan, value: &dyn Object) -> Result<(), CodecError> {
        let (codec, value) = runtime(chan.registry(), value)?;
        if codec.info().is_dynamic() {
            return Err(CodecError::unsupported(value.object_info().type_path(), "writes"));
        }
        codec.write(chan, value)
    }
}

// -----------------------------------------------------------------------------
// DynamicAssembly

struct DynamicAssembly {
    // Codec of nested untyped values.
    codec: Arc<dyn Codec>,
    entries: Vec<(Option<Box<str>>, Box<dyn Object>)>,
    pending: Option<Box<str>>,
}

impl Assembly for DynamicAssembly {
    fn on_emit(
        &mut self,
        _: &Context,
        alias: Option<&str>,
        _: Option<usize>,
        token: Token<'_>,
    ) -> Result<(), CodecError> {
        self.entries.push((alias.map(Into::into), ObjectCodec::natural(token)));
        Ok(())
    }

    fn on_open(
        &mut self,
        cx: &Context,
        alias: Option<&str>,
        _: Option<usize>,
        space: Option<&str>,
    ) -> Result<Option<Builder>, CodecError> {
        let child = nested(cx, &self.codec, space)?;
        if child.is_some() {
            self.pending = alias.map(Into::into);
        }
        Ok(child)
    }

    fn on_child(&mut self, _: &Context, value: Box<dyn Object>) -> Result<(), CodecError> {
        self.entries.push((self.pending.take(), value));
        Ok(())
    }

    fn build(self: Box<Self>, _: &Context) -> Result<Box<dyn Object>, CodecError> {
        if self.entries.iter().all(|(alias, _)| alias.is_some()) {
            let map: BTreeMap<String, Box<dyn Object>> = self
                .entries
                .into_iter()
                .filter_map(|(alias, value)| Some((String::from(alias?), value)))
                .collect();
            return Ok(Box::new(map));
        }
        let list: Vec<Box<dyn Object>> = self.entries.into_iter().map(|(_, value)| value).collect();
        Ok(Box::new(list))
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::vec::Vec;

    use crate::Flags;
    use crate::codec::Token;
    use crate::info::{Object, Typed};
    use crate::registry::Registry;

    #[test]
    fn natural_mapping() {
        let registry = Registry::global();
        let codec = registry.resolve(<Box<dyn Object>>::type_info()).unwrap();

        let mut driver = registry.driver(Flags::empty());
        driver.begin(&*codec).unwrap();
        driver.emit(Some("n"), None, Token::Int(1)).unwrap();
        driver.emit(Some("s"), None, Token::str("kat")).unwrap();
        assert!(driver.open(Some("list"), None, None).unwrap());
        driver.emit(None, Some(0), Token::Bool(true)).unwrap();
        driver.close().unwrap();
        driver.close().unwrap();

        let value = driver.finish_as::<Box<dyn Object>>().unwrap();
        let map = value.downcast_ref::<BTreeMap<String, Box<dyn Object>>>().unwrap();
        assert_eq!(map["n"].downcast_ref::<i64>(), Some(&1));
        assert_eq!(map["s"].downcast_ref::<String>().map(String::as_str), Some("kat"));

        let list = map["list"].downcast_ref::<Vec<Box<dyn Object>>>().unwrap();
        assert_eq!(list[0].downcast_ref::<bool>(), Some(&true));
    }
}
