use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::marker::PhantomData;

use crate::builder::Context;
use crate::chan::Chan;
use crate::codec::{Codec, Token, downcast};
use crate::error::{CodecError, CoercionError, SchemaError};
use crate::info::{Object, TypeInfo, Typed};
use crate::registry::Registry;

// -----------------------------------------------------------------------------
// Scalar

/// A type read and written as a single [`Token`].
pub trait Scalar: Typed + Send + Sync + Sized {
    /// Converts a raw token, accepting every lossless representation.
    fn coerce(token: Token<'_>) -> Result<Self, CoercionError>;

    fn token(&self) -> Token<'_>;

    /// The value used when a token cannot be coerced.
    fn zero() -> Self;
}

#[inline]
fn mismatch<T: Typed>(token: &Token<'_>) -> CoercionError {
    CoercionError {
        expected: T::type_info().type_name(),
        found: token.to_string(),
    }
}

macro_rules! impl_integer {
    ($($ty:ty => $token:ident),* $(,)?) => {$(
        impl Scalar for $ty {
            fn coerce(token: Token<'_>) -> Result<Self, CoercionError> {
                let value = match &token {
                    Token::Int(v) => <$ty>::try_from(*v).ok(),
                    Token::UInt(v) => <$ty>::try_from(*v).ok(),
                    Token::Float(v) if (*v as i128) as f64 == *v => <$ty>::try_from(*v as i128).ok(),
                    Token::Bool(v) => Some(<$ty>::from(*v)),
                    Token::Str(v) => v.trim().parse().ok(),
                    _ => None,
                };
                value.ok_or_else(|| mismatch::<Self>(&token))
            }

            #[inline]
            fn token(&self) -> Token<'_> {
                Token::$token((*self).try_into().unwrap_or_default())
            }

            #[inline]
            fn zero() -> Self {
                0
            }
        }
    )*};
}

impl_integer! {
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    isize => Int,
    u8 => UInt,
    u16 => UInt,
    u32 => UInt,
    u64 => UInt,
    usize => UInt,
}

macro_rules! impl_float {
    ($($ty:ty),*) => {$(
        impl Scalar for $ty {
            fn coerce(token: Token<'_>) -> Result<Self, CoercionError> {
                match &token {
                    Token::Float(v) => Ok(*v as $ty),
                    Token::Int(v) => Ok(*v as $ty),
                    Token::UInt(v) => Ok(*v as $ty),
                    Token::Str(v) => v.trim().parse().map_err(|_| mismatch::<Self>(&token)),
                    _ => Err(mismatch::<Self>(&token)),
                }
            }

            #[inline]
            fn token(&self) -> Token<'_> {
                Token::Float(f64::from(*self))
            }

            #[inline]
            fn zero() -> Self {
                0.0
            }
        }
    )*};
}

impl_float!(f32, f64);

impl Scalar for bool {
    fn coerce(token: Token<'_>) -> Result<Self, CoercionError> {
        match &token {
            Token::Bool(v) => Ok(*v),
            Token::Int(v) => Ok(*v != 0),
            Token::UInt(v) => Ok(*v != 0),
            Token::Str(v) => match v.trim() {
                s if s.eq_ignore_ascii_case("true") || s == "1" => Ok(true),
                s if s.eq_ignore_ascii_case("false") || s == "0" => Ok(false),
                _ => Err(mismatch::<Self>(&token)),
            },
            _ => Err(mismatch::<Self>(&token)),
        }
    }

    #[inline]
    fn token(&self) -> Token<'_> {
        Token::Bool(*self)
    }

    #[inline]
    fn zero() -> Self {
        false
    }
}

impl Scalar for char {
    fn coerce(token: Token<'_>) -> Result<Self, CoercionError> {
        let value = match &token {
            Token::Char(v) => Some(*v),
            Token::Str(v) => {
                let mut chars = v.chars();
                chars.next().filter(|_| chars.next().is_none())
            }
            Token::UInt(v) => u32::try_from(*v).ok().and_then(char::from_u32),
            Token::Int(v) => u32::try_from(*v).ok().and_then(char::from_u32),
            _ => None,
        };
        value.ok_or_else(|| mismatch::<Self>(&token))
    }

    #[inline]
    fn token(&self) -> Token<'_> {
        Token::Char(*self)
    }

    #[inline]
    fn zero() -> Self {
        '\0'
    }
}

impl Scalar for String {
    fn coerce(token: Token<'_>) -> Result<Self, CoercionError> {
        match token {
            Token::Str(v) => Ok(v.into_owned()),
            Token::Int(v) => Ok(v.to_string()),
            Token::UInt(v) => Ok(v.to_string()),
            Token::Float(v) => Ok(v.to_string()),
            Token::Bool(v) => Ok(v.to_string()),
            Token::Char(v) => Ok(v.to_string()),
            Token::Null => Err(mismatch::<Self>(&Token::Null)),
        }
    }

    #[inline]
    fn token(&self) -> Token<'_> {
        Token::str(self)
    }

    #[inline]
    fn zero() -> Self {
        String::new()
    }
}

impl Scalar for () {
    #[inline]
    fn coerce(_: Token<'_>) -> Result<Self, CoercionError> {
        Ok(())
    }

    #[inline]
    fn token(&self) -> Token<'_> {
        Token::Null
    }

    #[inline]
    fn zero() -> Self {}
}

// -----------------------------------------------------------------------------
// ScalarCodec

/// The codec of a [`Scalar`] type.
pub struct ScalarCodec<T>(PhantomData<fn() -> T>);

impl<T: Scalar> ScalarCodec<T> {
    #[inline]
    pub const fn new() -> Self {
        Self(PhantomData)
    }

    /// [`Synthesize`](crate::info::Synthesize) hook of scalar types.
    pub fn synthesize(_: &Registry) -> Result<Arc<dyn Codec>, SchemaError> {
        Ok(Arc::new(Self::new()))
    }
}

impl<T: Scalar> Codec for ScalarCodec<T> {
    #[inline]
    fn info(&self) -> &'static TypeInfo {
        T::type_info()
    }

    fn read(&self, _: &Context, token: Token<'_>) -> Result<Box<dyn Object>, CodecError> {
        Ok(Box::new(T::coerce(token)?))
    }

    fn write(&self, chan: &mut dyn Chan, value: &dyn Object) -> Result<(), CodecError> {
        chan.emit(downcast::<T>(value)?.token())
    }

    #[inline]
    fn zero(&self) -> Option<Box<dyn Object>> {
        Some(Box::new(T::zero()))
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::Scalar;
    use crate::codec::Token;

    #[test]
    fn integers() {
        assert_eq!(i32::coerce(Token::Int(-3)), Ok(-3));
        assert_eq!(u8::coerce(Token::str(" 255 ")), Ok(255));
        assert_eq!(i64::coerce(Token::Float(4.0)), Ok(4));
        assert_eq!(u16::coerce(Token::Bool(true)), Ok(1));
        assert!(u8::coerce(Token::Int(256)).is_err());
        assert!(u32::coerce(Token::Int(-1)).is_err());
        assert!(i64::coerce(Token::Float(0.5)).is_err());

        let error = i64::coerce(Token::str("abc")).unwrap_err();
        assert_eq!(error.expected, "i64");
    }

    #[test]
    fn others() {
        assert_eq!(f64::coerce(Token::Int(2)), Ok(2.0));
        assert_eq!(bool::coerce(Token::str("TRUE")), Ok(true));
        assert_eq!(char::coerce(Token::str("k")), Ok('k'));
        assert!(char::coerce(Token::str("kat")).is_err());
        assert_eq!(String::coerce(Token::UInt(7)), Ok(String::from("7")));
        assert!(String::coerce(Token::Null).is_err());
    }

    #[test]
    fn tokens() {
        assert_eq!(7_u16.token(), Token::UInt(7));
        assert_eq!((-7_i8).token(), Token::Int(-7));
        assert_eq!(1.5_f32.token(), Token::Float(1.5));
        assert_eq!(String::from("kat").token(), Token::str("kat"));
        assert_eq!(().token(), Token::Null);
    }
}
