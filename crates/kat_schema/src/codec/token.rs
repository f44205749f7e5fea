use alloc::borrow::Cow;
use alloc::string::String;
use core::fmt;

/// A raw scalar as delivered by a parser or written by a scalar codec.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    Str(Cow<'a, str>),
}

impl<'a> Token<'a> {
    #[inline]
    pub fn str(value: &'a str) -> Self {
        Self::Str(Cow::Borrowed(value))
    }

    #[inline]
    pub fn string(value: String) -> Self {
        Self::Str(Cow::Owned(value))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Detaches the token from the buffer it borrows.
    pub fn into_owned(self) -> Token<'static> {
        match self {
            Self::Null => Token::Null,
            Self::Bool(v) => Token::Bool(v),
            Self::Int(v) => Token::Int(v),
            Self::UInt(v) => Token::UInt(v),
            Self::Float(v) => Token::Float(v),
            Self::Char(v) => Token::Char(v),
            Self::Str(v) => Token::Str(Cow::Owned(v.into_owned())),
        }
    }

    /// Reborrows the token.
    pub fn by_ref(&self) -> Token<'_> {
        match self {
            Self::Str(v) => Token::Str(Cow::Borrowed(v)),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "bool `{v}`"),
            Self::Int(v) => write!(f, "integer `{v}`"),
            Self::UInt(v) => write!(f, "integer `{v}`"),
            Self::Float(v) => write!(f, "float `{v}`"),
            Self::Char(v) => write!(f, "char `{v}`"),
            Self::Str(v) => write!(f, "string {v:?}"),
        }
    }
}
