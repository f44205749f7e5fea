use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

use crate::access::{Accessor, Caps, ElementCodec, Peek, instance, instance_mut};
use crate::codec::Codec;
use crate::error::AccessError;
use crate::info::{Object, TypeInfo, Typed};

// -----------------------------------------------------------------------------
// FieldAccessor

/// Reads and writes a field of type `F` in a `T`.
///
/// A null is never applied.
pub struct FieldAccessor<T, F> {
    get: fn(&T) -> &F,
    get_mut: fn(&mut T) -> &mut F,
    element: ElementCodec,
}

impl<T, F> FieldAccessor<T, F> {
    #[inline]
    pub fn new(get: fn(&T) -> &F, get_mut: fn(&mut T) -> &mut F) -> Self {
        Self::with_codec(get, get_mut, None)
    }

    #[inline]
    pub fn with_codec(get: fn(&T) -> &F, get_mut: fn(&mut T) -> &mut F, codec: Option<Arc<dyn Codec>>) -> Self {
        Self {
            get,
            get_mut,
            element: ElementCodec::new(codec),
        }
    }
}

impl<T, F> Accessor for FieldAccessor<T, F>
where
    T: 'static,
    F: Typed + Send + Sync,
{
    #[inline]
    fn caps(&self) -> Caps {
        Caps::READ | Caps::WRITE
    }

    #[inline]
    fn info(&self) -> &'static TypeInfo {
        F::type_info()
    }

    #[inline]
    fn element(&self) -> &ElementCodec {
        &self.element
    }

    fn get<'a>(&self, target: &'a dyn Any) -> Result<Option<Peek<'a>>, AccessError> {
        let target = instance::<T>(target)?;
        Ok(Some(Peek::Ref((self.get)(target))))
    }

    fn set(&self, target: &mut dyn Any, value: Option<Box<dyn Object>>) -> Result<bool, AccessError> {
        let target = instance_mut::<T>(target)?;
        match value {
            Some(value) => {
                *(self.get_mut)(target) = F::take(value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// -----------------------------------------------------------------------------
// OptionAccessor

/// Reads and writes an `Option<F>` field of a `T`.
///
/// The declared type, and so the element codec, is `F`: `None` is the
/// property's null.
pub struct OptionAccessor<T, F> {
    get: fn(&T) -> &Option<F>,
    get_mut: fn(&mut T) -> &mut Option<F>,
    element: ElementCodec,
}

impl<T, F> OptionAccessor<T, F> {
    #[inline]
    pub fn new(get: fn(&T) -> &Option<F>, get_mut: fn(&mut T) -> &mut Option<F>) -> Self {
        Self::with_codec(get, get_mut, None)
    }

    #[inline]
    pub fn with_codec(
        get: fn(&T) -> &Option<F>,
        get_mut: fn(&mut T) -> &mut Option<F>,
        codec: Option<Arc<dyn Codec>>,
    ) -> Self {
        Self {
            get,
            get_mut,
            element: ElementCodec::new(codec),
        }
    }
}

impl<T, F> Accessor for OptionAccessor<T, F>
where
    T: 'static,
    F: Typed + Send + Sync,
{
    #[inline]
    fn caps(&self) -> Caps {
        Caps::READ | Caps::WRITE
    }

    #[inline]
    fn info(&self) -> &'static TypeInfo {
        F::type_info()
    }

    #[inline]
    fn element(&self) -> &ElementCodec {
        &self.element
    }

    fn get<'a>(&self, target: &'a dyn Any) -> Result<Option<Peek<'a>>, AccessError> {
        let target = instance::<T>(target)?;
        Ok((self.get)(target).as_ref().map(|value| Peek::Ref(value)))
    }

    fn set(&self, target: &mut dyn Any, value: Option<Box<dyn Object>>) -> Result<bool, AccessError> {
        let target = instance_mut::<T>(target)?;
        *(self.get_mut)(target) = value.map(F::take).transpose()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;

    use super::{FieldAccessor, OptionAccessor};
    use crate::access::{Accessor, Caps};
    use crate::error::AccessError;
    use crate::schema::{Describe, SchemaBuilder};

    #[derive(Default)]
    struct User {
        id: i64,
        nick: Option<String>,
    }

    crate::impls::impl_structure!(User, "User");

    impl Describe for User {
        fn describe(_: &mut SchemaBuilder<Self>) {}
    }

    #[test]
    fn field_reads_and_writes() {
        let accessor = FieldAccessor::<User, i64>::new(|u| &u.id, |u| &mut u.id);
        assert_eq!(accessor.caps(), Caps::READ | Caps::WRITE);

        let mut user = User::default();
        assert!(accessor.set(&mut user, Some(Box::new(7_i64))).unwrap());
        assert!(!accessor.set(&mut user, None).unwrap());
        assert_eq!(user.id, 7);

        let peek = accessor.get(&user).unwrap().unwrap();
        assert_eq!(peek.as_object().downcast_ref::<i64>(), Some(&7));
    }

    #[test]
    fn field_rejects_mismatches() {
        let accessor = FieldAccessor::<User, i64>::new(|u| &u.id, |u| &mut u.id);

        let mut wrong = 0_u8;
        assert!(matches!(
            accessor.set(&mut wrong, Some(Box::new(1_i64))),
            Err(AccessError::Instance { .. })
        ));

        let mut user = User::default();
        assert!(matches!(
            accessor.set(&mut user, Some(Box::new(String::new()))),
            Err(AccessError::Value { .. })
        ));
        assert_eq!(accessor.put(&mut Default::default(), None), Err(AccessError::NotPositional));
    }

    #[test]
    fn option_null() {
        let accessor = OptionAccessor::<User, String>::new(|u| &u.nick, |u| &mut u.nick);

        let mut user = User::default();
        assert!(accessor.get(&user).unwrap().is_none());

        accessor.set(&mut user, Some(Box::new(String::from("kat")))).unwrap();
        assert_eq!(user.nick.as_deref(), Some("kat"));

        assert!(accessor.set(&mut user, None).unwrap());
        assert_eq!(user.nick, None);
    }
}
