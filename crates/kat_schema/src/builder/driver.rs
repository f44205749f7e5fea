use alloc::boxed::Box;
use alloc::string::ToString;
use core::ops::{Deref, DerefMut};

use crate::Pooled;
use crate::builder::{Builder, Closed, Context};
use crate::codec::{Codec, Token};
use crate::error::{CodecError, ProtocolError};
use crate::info::{Object, Typed};

// -----------------------------------------------------------------------------
// Driver

/// Owns the builder chain of one parse.
///
/// A parser translates its events into calls on the driver:
///
/// | parser event                 | driver call                         |
/// |------------------------------|-------------------------------------|
/// | root value starts            | [`begin`](Self::begin)              |
/// | nested value starts          | [`open`](Self::open)                |
/// | scalar entry                 | [`emit`](Self::emit)                |
/// | value ends                   | [`close`](Self::close)              |
/// | parse fails                  | [`abandon`](Self::abandon)          |
///
/// When [`open`](Self::open) returns `false` the parser must skip the
/// nested value, including its end.
///
/// # Examples
///
/// ```
/// use kat_schema::builder::Driver;
/// use kat_schema::codec::Token;
/// use kat_schema::registry::Registry;
/// use kat_schema::info::Typed;
///
/// let registry = Registry::global();
/// let codec = registry.resolve(<Vec<i32>>::type_info()).unwrap();
///
/// let mut driver = registry.driver(Default::default());
/// driver.begin(&*codec).unwrap();
/// driver.emit(None, Some(0), Token::Int(1)).unwrap();
/// driver.emit(None, Some(1), Token::str("2")).unwrap();
/// driver.close().unwrap();
///
/// assert_eq!(driver.finish_as::<Vec<i32>>().unwrap(), vec![1, 2]);
/// ```
#[derive(Debug, Default)]
pub struct Driver {
    context: Option<Context>,
    head: Option<Box<Builder>>,
    output: Option<Box<dyn Object>>,
    finished: bool,
    inits: usize,
    closes: usize,
}

impl Driver {
    #[inline]
    pub fn new(context: Context) -> Self {
        Self {
            context: Some(context),
            ..Self::default()
        }
    }

    /// Drops any state of a previous parse and installs `context`.
    pub fn reset(&mut self, context: Option<Context>) {
        self.abandon();
        *self = Self {
            context,
            ..Self::default()
        };
    }

    #[inline]
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Number of builders opened so far.
    #[inline]
    pub fn inits(&self) -> usize {
        self.inits
    }

    /// Number of builders closed so far.
    #[inline]
    pub fn closes(&self) -> usize {
        self.closes
    }

    /// Number of open builders.
    #[inline]
    pub fn depth(&self) -> usize {
        self.inits - self.closes
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Opens the root builder of `codec`.
    pub fn begin(&mut self, codec: &dyn Codec) -> Result<(), CodecError> {
        if self.head.is_some() || self.finished {
            return Err(ProtocolError::AlreadyOpen.into());
        }
        let context = self.context.clone().ok_or(ProtocolError::Idle)?;

        let mut root = codec.builder(&context)?;
        root.init(None, context)?;
        self.inits += 1;
        self.head = Some(Box::new(root));
        Ok(())
    }

    /// Begins a nested value. Returns `false` when it must be skipped.
    pub fn open(
        &mut self,
        alias: Option<&str>,
        index: Option<usize>,
        space: Option<&str>,
    ) -> Result<bool, CodecError> {
        let mut head = self.head.take().ok_or(ProtocolError::Idle)?;
        match head.on_open(alias, index, space) {
            Ok(Some(child)) => {
                self.head = Some(head.descend(child)?);
                self.inits += 1;
                Ok(true)
            }
            Ok(None) => {
                self.head = Some(head);
                Ok(false)
            }
            Err(error) => {
                self.head = Some(head);
                Err(error)
            }
        }
    }

    /// Applies a scalar entry to the innermost open value.
    pub fn emit(
        &mut self,
        alias: Option<&str>,
        index: Option<usize>,
        token: Token<'_>,
    ) -> Result<(), CodecError> {
        match self.head.as_deref_mut() {
            Some(head) => head.on_emit(alias, index, token),
            None => Err(ProtocolError::Idle.into()),
        }
    }

    /// Closes the innermost open value and commits it to its parent.
    pub fn close(&mut self) -> Result<(), CodecError> {
        let head = self.head.take().ok_or(ProtocolError::Idle)?;
        let strict = self.context.as_ref().is_some_and(Context::is_strict);

        self.closes += 1;
        match head.close(true, strict)? {
            Closed::Holder(holder) => self.head = Some(holder),
            Closed::Root(value) => {
                self.output = value;
                self.finished = true;
            }
        }
        Ok(())
    }

    /// Closes every open builder without committing.
    pub fn abandon(&mut self) {
        while let Some(head) = self.head.take() {
            self.closes += 1;
            if let Ok(Closed::Holder(holder)) = head.close(false, false) {
                self.head = Some(holder);
            }
        }
    }

    /// Takes the root value once the root closed.
    pub fn finish(&mut self) -> Result<Box<dyn Object>, CodecError> {
        if !self.finished {
            return Err(ProtocolError::Unfinished.into());
        }
        self.output
            .take()
            .ok_or_else(|| CodecError::Custom("the root value was discarded".to_string()))
    }

    /// [`finish`](Self::finish), then recovers the concrete type.
    #[inline]
    pub fn finish_as<T: Typed>(&mut self) -> Result<T, CodecError> {
        Ok(T::take(self.finish()?)?)
    }
}

// -----------------------------------------------------------------------------
// Lease

/// A driver borrowed from a registry's pool, or a fresh one when the pooled
/// driver was busy.
pub enum Lease<'a> {
    Pooled(Pooled<'a, Driver>),
    Fresh(Driver),
}

impl Deref for Lease<'_> {
    type Target = Driver;

    #[inline]
    fn deref(&self) -> &Driver {
        match self {
            Self::Pooled(pooled) => pooled,
            Self::Fresh(driver) => driver,
        }
    }
}

impl DerefMut for Lease<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Driver {
        match self {
            Self::Pooled(pooled) => pooled,
            Self::Fresh(driver) => driver,
        }
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        // A pooled driver must not keep its registry alive.
        if let Self::Pooled(pooled) = self {
            pooled.reset(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec::Vec;

    use crate::builder::{Assembly, Builder, Closed, Context};
    use crate::codec::Token;
    use crate::error::{CodecError, ProtocolError};
    use crate::info::Object;
    use crate::registry::Registry;

    struct Count(i64);

    impl Assembly for Count {
        fn on_emit(&mut self, _: &Context, _: Option<&str>, _: Option<usize>, _: Token<'_>) -> Result<(), CodecError> {
            self.0 += 1;
            Ok(())
        }

        fn on_open(
            &mut self,
            _: &Context,
            _: Option<&str>,
            _: Option<usize>,
            _: Option<&str>,
        ) -> Result<Option<Builder>, CodecError> {
            Ok(Some(Builder::new(Count(0))))
        }

        fn on_child(&mut self, _: &Context, value: Box<dyn Object>) -> Result<(), CodecError> {
            self.0 += value.downcast_ref::<i64>().copied().unwrap_or_default();
            Ok(())
        }

        fn build(self: Box<Self>, _: &Context) -> Result<Box<dyn Object>, CodecError> {
            Ok(Box::new(self.0))
        }
    }

    fn context() -> Context {
        Context::new(Registry::global().clone(), Default::default())
    }

    #[test]
    fn double_init() {
        let mut builder = Builder::new(Count(0));
        builder.init(None, context()).unwrap();
        assert_eq!(
            builder.init(None, context()),
            Err(CodecError::Protocol(ProtocolError::AlreadyOpen))
        );
    }

    #[test]
    fn emit_before_init() {
        let mut builder = Builder::new(Count(0));
        assert_eq!(
            builder.on_emit(None, None, Token::Null),
            Err(CodecError::Protocol(ProtocolError::NotOpen))
        );
    }

    #[test]
    fn child_routes_to_parent() {
        let mut root = Box::new(Builder::new(Count(0)));
        root.init(None, context()).unwrap();
        root.on_emit(None, None, Token::Int(1)).unwrap();

        let child = root.on_open(Some("x"), None, None).unwrap().unwrap();
        let mut child = root.descend(child).unwrap();
        assert!(child.is_open());
        child.on_emit(None, None, Token::Int(1)).unwrap();
        child.on_emit(None, None, Token::Int(1)).unwrap();

        let root = child.close(true, true).unwrap().into_holder().unwrap();
        match root.close(true, true).unwrap() {
            Closed::Root(Some(value)) => assert_eq!(value.downcast_ref::<i64>(), Some(&3)),
            _ => panic!("expected the root value"),
        }
    }

    #[test]
    fn lifecycle_balance() {
        let mut driver = super::Driver::new(context());
        let codec = Registry::global()
            .resolve(<Vec<Vec<i32>> as crate::info::Typed>::type_info())
            .unwrap();

        driver.begin(&*codec).unwrap();
        for _ in 0..3 {
            assert!(driver.open(None, None, None).unwrap());
            driver.emit(None, None, Token::Int(7)).unwrap();
            driver.close().unwrap();
        }
        driver.close().unwrap();

        assert_eq!(driver.inits(), driver.closes());
        assert_eq!(driver.inits(), 4);
        let value: Vec<Vec<i32>> = driver.finish_as().unwrap();
        assert_eq!(value, [[7], [7], [7]]);
    }

    #[test]
    fn abandon_discards() {
        let mut driver = super::Driver::new(context());
        let codec = Registry::global()
            .resolve(<Vec<Vec<i32>> as crate::info::Typed>::type_info())
            .unwrap();

        driver.begin(&*codec).unwrap();
        driver.open(None, None, None).unwrap();
        driver.abandon();

        assert_eq!(driver.depth(), 0);
        assert_eq!(
            driver.finish().unwrap_err(),
            CodecError::Protocol(ProtocolError::Unfinished)
        );
    }
}
